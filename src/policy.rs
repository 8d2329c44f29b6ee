//! Pluggable sample selection.
//!
//! The sequencer is agnostic to how the next sample of a viewer position is
//! chosen; it only requires that the policy return an identifier.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::SequencerError;
use crate::ids::SampleId;

/// Chooses the next sample for a viewer position at each cycle boundary.
pub trait SamplePolicy {
    /// Pick the sample to load next for `position`. `active` holds the samples
    /// currently bound to every viewer position, in position order.
    fn next_sample(&mut self, position: usize, active: &[SampleId]) -> SampleId;
}

/// Deterministic policy cycling through a fixed roster, with an independent
/// cursor per viewer position.
#[derive(Debug, Clone)]
pub struct FixedOrderPolicy {
    roster: Vec<SampleId>,
    cursors: HashMap<usize, usize>,
}

impl FixedOrderPolicy {
    /// Create a policy over a nonempty roster.
    pub fn new(roster: Vec<SampleId>) -> Result<Self, SequencerError> {
        if roster.is_empty() {
            return Err(SequencerError::EmptyRoster);
        }
        Ok(Self {
            roster,
            cursors: HashMap::new(),
        })
    }
}

impl SamplePolicy for FixedOrderPolicy {
    fn next_sample(&mut self, position: usize, _active: &[SampleId]) -> SampleId {
        let cursor = self.cursors.entry(position).or_insert(0);
        let sample = self.roster[*cursor % self.roster.len()].clone();
        *cursor += 1;
        sample
    }
}

/// Randomized policy picking a roster entry distinct from every currently
/// active sample when possible.
#[derive(Debug)]
pub struct RandomDistinctPolicy {
    roster: Vec<SampleId>,
    rng: StdRng,
}

impl RandomDistinctPolicy {
    /// Create a policy over a nonempty roster, seeded from entropy.
    pub fn new(roster: Vec<SampleId>) -> Result<Self, SequencerError> {
        Self::with_rng(roster, StdRng::from_entropy())
    }

    /// Create a policy with a fixed seed, for reproducible runs.
    pub fn with_seed(roster: Vec<SampleId>, seed: u64) -> Result<Self, SequencerError> {
        Self::with_rng(roster, StdRng::seed_from_u64(seed))
    }

    fn with_rng(roster: Vec<SampleId>, rng: StdRng) -> Result<Self, SequencerError> {
        if roster.is_empty() {
            return Err(SequencerError::EmptyRoster);
        }
        Ok(Self { roster, rng })
    }
}

impl SamplePolicy for RandomDistinctPolicy {
    fn next_sample(&mut self, _position: usize, active: &[SampleId]) -> SampleId {
        let candidates: Vec<usize> = self
            .roster
            .iter()
            .enumerate()
            .filter(|(_, sample)| !active.contains(*sample))
            .map(|(i, _)| i)
            .collect();

        // Roster smaller than the active set: distinctness is impossible, any
        // entry is acceptable.
        let index = if candidates.is_empty() {
            self.rng.gen_range(0..self.roster.len())
        } else {
            candidates[self.rng.gen_range(0..candidates.len())]
        };
        self.roster[index].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(ids: &[&str]) -> Vec<SampleId> {
        ids.iter().map(|id| SampleId::from(*id)).collect()
    }

    #[test]
    fn empty_roster_is_rejected() {
        assert_eq!(
            FixedOrderPolicy::new(Vec::new()).unwrap_err(),
            SequencerError::EmptyRoster
        );
        assert_eq!(
            RandomDistinctPolicy::new(Vec::new()).unwrap_err(),
            SequencerError::EmptyRoster
        );
    }

    #[test]
    fn fixed_order_cycles_per_position() {
        let mut policy = FixedOrderPolicy::new(roster(&["a", "b", "c"])).unwrap();
        assert_eq!(policy.next_sample(0, &[]), SampleId::from("a"));
        assert_eq!(policy.next_sample(0, &[]), SampleId::from("b"));
        // each position has its own cursor
        assert_eq!(policy.next_sample(1, &[]), SampleId::from("a"));
        assert_eq!(policy.next_sample(0, &[]), SampleId::from("c"));
        assert_eq!(policy.next_sample(0, &[]), SampleId::from("a"));
    }

    #[test]
    fn random_distinct_avoids_active_samples() {
        let mut policy = RandomDistinctPolicy::with_seed(roster(&["a", "b", "c"]), 7).unwrap();
        let active = roster(&["a", "b"]);
        for _ in 0..32 {
            assert_eq!(policy.next_sample(0, &active), SampleId::from("c"));
        }
    }

    #[test]
    fn random_distinct_falls_back_when_roster_is_exhausted() {
        let mut policy = RandomDistinctPolicy::with_seed(roster(&["a"]), 7).unwrap();
        let active = roster(&["a"]);
        assert_eq!(policy.next_sample(0, &active), SampleId::from("a"));
    }
}
