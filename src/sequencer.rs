//! Playback driver: the timer loop that advances the global frame counter,
//! swaps frame visibility and periodically reloads new samples.
//!
//! All state lives behind a single `Rc<RefCell<_>>` shared with the local tasks
//! the driver spawns; there is no parallelism, only cooperative scheduling on
//! the current thread. Every timer and load captures the session token it was
//! started under and re-checks it before mutating anything, so completions that
//! outlive a reset or teardown become silent no-ops. No borrow of the shared
//! state is ever held across an await.
//!
//! Methods that spawn work ([`Sequencer::start`], and transitively the tick
//! loop) must be called from within a [`tokio::task::LocalSet`] running on a
//! current-thread runtime.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::config::SequencerConfig;
use crate::error::SequencerError;
use crate::ids::{SampleId, SubjectId};
use crate::mapper::{cycle_length, map_global_index, PlaybackMode};
use crate::metrics::SequencerMetrics;
use crate::policy::SamplePolicy;
use crate::scene::{FrameSource, SceneBackend};
use crate::session::{SessionCounter, SessionToken};
use crate::viewer::{LoadedSample, ViewerState};
use crate::Result;

/// Playback state of the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No subject selected yet
    Idle,
    /// The timer loop is running
    Playing,
    /// The timer loop is suspended; counter and visibility are frozen
    Paused,
    /// Torn down; all representations released, no further playback
    TornDown,
}

impl PlaybackState {
    /// Get the name of this playback state.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::TornDown => "torn-down",
        }
    }

    /// Check if the driver is actively playing.
    #[inline]
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Check if the driver can be paused.
    #[inline]
    pub fn can_pause(&self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }

    /// Check if the driver can be resumed.
    #[inline]
    pub fn can_resume(&self) -> bool {
        matches!(self, Self::Paused | Self::Playing)
    }
}

struct Inner<B: SceneBackend, P> {
    config: SequencerConfig,
    backend: B,
    policy: P,
    sessions: SessionCounter,
    state: PlaybackState,
    mode: PlaybackMode,
    /// Mode requested mid-cycle, applied at the next cycle boundary.
    pending_mode: Option<PlaybackMode>,
    subject: Option<SubjectId>,
    viewers: Vec<ViewerState<B::Handle>>,
    global_index: usize,
    /// Global index whose representations are currently visible.
    shown_index: Option<usize>,
    /// Pending tick timer; aborted on pause, reset and teardown.
    timer: Option<JoinHandle<()>>,
    /// A cycle-end prefetch/swap is in flight.
    cycle_pending: bool,
    /// Samples that finished their cycle-end load while paused, held until
    /// resume so the swap never mutates a frozen counter or visibility.
    deferred_swap: Option<Vec<(usize, LoadedSample<B::Handle>)>>,
    metrics: SequencerMetrics,
}

/// Animation sequencer for a set of point-cloud viewers driven in lockstep.
///
/// Owns the discrete global frame counter, maps it to original or interpolated
/// frame slots per viewer, and drives the timer loop that advances it. Frame
/// data comes from a [`FrameSource`], representations live in a
/// [`SceneBackend`], and new samples are chosen by a [`SamplePolicy`].
pub struct Sequencer<B, S, P>
where
    B: SceneBackend + 'static,
    S: FrameSource + 'static,
    P: SamplePolicy + 'static,
{
    inner: Rc<RefCell<Inner<B, P>>>,
    source: Rc<S>,
}

impl<B, S, P> Sequencer<B, S, P>
where
    B: SceneBackend + 'static,
    S: FrameSource + 'static,
    P: SamplePolicy + 'static,
{
    /// Create a sequencer. Fails if the configuration is invalid.
    pub fn new(config: SequencerConfig, backend: B, source: S, policy: P) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inner: Rc::new(RefCell::new(Inner {
                config,
                backend,
                policy,
                sessions: SessionCounter::new(),
                state: PlaybackState::Idle,
                mode: PlaybackMode::Normal,
                pending_mode: None,
                subject: None,
                viewers: Vec::new(),
                global_index: 0,
                shown_index: None,
                timer: None,
                cycle_pending: false,
                deferred_swap: None,
                metrics: SequencerMetrics::new(),
            })),
            source: Rc::new(source),
        })
    }

    /// Begin playback of `subject` from frame zero.
    ///
    /// Starting over a live session is a reset: the session token is bumped
    /// (orphaning every pending timer and load), all held representations are
    /// released and fresh viewers are created with policy-chosen samples. The
    /// first tick fires immediately and defers itself until the initial loads
    /// finish.
    pub fn start(&self, subject: SubjectId) -> Result<()> {
        let token;
        let picks;
        {
            let mut st = self.inner.borrow_mut();
            if st.state == PlaybackState::TornDown {
                return Err(SequencerError::TornDown);
            }
            token = st.sessions.bump();
            if let Some(timer) = st.timer.take() {
                timer.abort();
            }
            st.cycle_pending = false;
            Self::dispose_viewers(&mut st);
            if let Some(mode) = st.pending_mode.take() {
                st.mode = mode;
            }
            st.state = PlaybackState::Playing;
            st.subject = Some(subject.clone());
            st.global_index = 0;
            st.shown_index = None;

            let frame_count = st.config.frame_count;
            let positions = st.config.viewer_positions;
            let mut active: Vec<SampleId> = Vec::with_capacity(positions);
            let mut chosen = Vec::with_capacity(positions);
            for position in 0..positions {
                let sample = st.policy.next_sample(position, &active);
                active.push(sample.clone());
                st.viewers
                    .push(ViewerState::new(position, sample.clone(), token, frame_count));
                chosen.push((position, sample));
            }
            picks = chosen;
            log::debug!("session {token}: starting subject {subject}");
        }

        for (position, sample) in picks {
            self.spawn_initial_load(token, subject.clone(), position, sample);
        }
        Self::schedule_tick(&self.inner, &self.source, token, Duration::ZERO);
        Ok(())
    }

    /// Suspend the timer loop. The counter and current visibility are left
    /// untouched. Pausing while already paused is a no-op.
    pub fn pause(&self) -> Result<()> {
        let mut st = self.inner.borrow_mut();
        match st.state {
            PlaybackState::Playing => {
                if let Some(timer) = st.timer.take() {
                    timer.abort();
                }
                st.state = PlaybackState::Paused;
                Ok(())
            }
            PlaybackState::Paused => Ok(()),
            other => Err(SequencerError::InvalidTransition {
                from: other.name().to_string(),
                to: PlaybackState::Paused.name().to_string(),
            }),
        }
    }

    /// Resume the timer loop from the current counter, without resetting it.
    /// A sample swap that completed while paused is applied here.
    pub fn resume(&self) -> Result<()> {
        let mut st = self.inner.borrow_mut();
        match st.state {
            PlaybackState::Paused => {
                st.state = PlaybackState::Playing;
                let token = st.sessions.current();
                let delay = st.config.frame_interval;
                if let Some(pending) = st.deferred_swap.take() {
                    Self::complete_swap(&mut st, pending);
                    drop(st);
                    Self::schedule_tick(&self.inner, &self.source, token, delay);
                    return Ok(());
                }
                let cycle_pending = st.cycle_pending;
                drop(st);
                // A still-loading cycle-end swap schedules the next tick itself.
                if !cycle_pending {
                    Self::schedule_tick(&self.inner, &self.source, token, delay);
                }
                Ok(())
            }
            PlaybackState::Playing => Ok(()),
            other => Err(SequencerError::InvalidTransition {
                from: other.name().to_string(),
                to: PlaybackState::Playing.name().to_string(),
            }),
        }
    }

    /// Tear the sequencer down: invalidate the session, cancel the pending
    /// timer, release every held representation and clear all viewer records.
    /// Idempotent; also runs on drop.
    pub fn teardown(&self) {
        let mut st = self.inner.borrow_mut();
        if st.state == PlaybackState::TornDown {
            return;
        }
        let token = st.sessions.bump();
        if let Some(timer) = st.timer.take() {
            timer.abort();
        }
        Self::dispose_viewers(&mut st);
        st.subject = None;
        st.cycle_pending = false;
        st.global_index = 0;
        st.shown_index = None;
        st.state = PlaybackState::TornDown;
        log::debug!("torn down; session {token} orphans all pending timers and loads");
    }

    /// Toggle slow (interpolated) playback. The cycle length changes at the
    /// next cycle boundary, never mid-cycle; with no playback active the mode
    /// applies immediately.
    pub fn set_slow_mode(&self, enabled: bool) {
        let mut st = self.inner.borrow_mut();
        let mode = if enabled {
            PlaybackMode::Slow
        } else {
            PlaybackMode::Normal
        };
        if st.viewers.is_empty() {
            st.mode = mode;
            st.pending_mode = None;
        } else if st.mode == mode {
            st.pending_mode = None;
        } else {
            st.pending_mode = Some(mode);
        }
    }

    /// Current playback state.
    pub fn state(&self) -> PlaybackState {
        self.inner.borrow().state
    }

    /// Current playback mode.
    pub fn mode(&self) -> PlaybackMode {
        self.inner.borrow().mode
    }

    /// Current global frame index.
    pub fn global_index(&self) -> usize {
        self.inner.borrow().global_index
    }

    /// Length of the current cycle in global steps.
    pub fn cycle_len(&self) -> usize {
        let st = self.inner.borrow();
        cycle_length(st.config.frame_count, st.mode)
    }

    /// The live session token.
    pub fn session(&self) -> SessionToken {
        self.inner.borrow().sessions.current()
    }

    /// Samples currently bound to the viewers, in position order.
    pub fn active_samples(&self) -> Vec<SampleId> {
        self.inner
            .borrow()
            .viewers
            .iter()
            .map(|viewer| viewer.sample().clone())
            .collect()
    }

    /// Snapshot of the playback counters.
    pub fn metrics(&self) -> SequencerMetrics {
        self.inner.borrow().metrics.clone()
    }

    fn dispose_viewers(st: &mut Inner<B, P>) {
        let Inner {
            viewers,
            backend,
            deferred_swap,
            ..
        } = st;
        for viewer in viewers.drain(..) {
            viewer.dispose_all(backend);
        }
        if let Some(pending) = deferred_swap.take() {
            for (_, loaded) in pending {
                loaded.dispose(backend);
            }
        }
    }

    /// Install freshly loaded samples into their viewers and reset the counter
    /// for the new cycle.
    fn complete_swap(st: &mut Inner<B, P>, pending: Vec<(usize, LoadedSample<B::Handle>)>) {
        {
            let Inner {
                viewers, backend, ..
            } = &mut *st;
            for (position, loaded) in pending {
                match viewers.iter_mut().find(|v| v.position() == position) {
                    Some(viewer) => viewer.install(backend, loaded),
                    None => loaded.dispose(backend),
                }
            }
        }
        st.global_index = 0;
        st.shown_index = None;
        if let Some(mode) = st.pending_mode.take() {
            st.mode = mode;
        }
        st.cycle_pending = false;
        st.metrics.cycles_completed += 1;
    }

    fn spawn_initial_load(
        &self,
        token: SessionToken,
        subject: SubjectId,
        position: usize,
        sample: SampleId,
    ) {
        let inner = Rc::clone(&self.inner);
        let source = Rc::clone(&self.source);
        tokio::task::spawn_local(async move {
            let frame_count = inner.borrow().config.frame_count;
            let Some(loaded) =
                Self::load_sample(&inner, &source, token, &subject, &sample, frame_count).await
            else {
                return;
            };
            // No await since the last token check inside load_sample, so the
            // session is still current here.
            let mut st = inner.borrow_mut();
            let Inner {
                viewers, backend, ..
            } = &mut *st;
            match viewers.iter_mut().find(|v| v.position() == position) {
                Some(viewer) => viewer.install(backend, loaded),
                None => loaded.dispose(backend),
            }
        });
    }

    /// Load every step of `sample` in order, creating hidden representations as
    /// data arrives. A failed step leaves its slot empty; a stale session
    /// disposes everything created so far and yields `None`.
    async fn load_sample(
        inner: &Rc<RefCell<Inner<B, P>>>,
        source: &Rc<S>,
        token: SessionToken,
        subject: &SubjectId,
        sample: &SampleId,
        frame_count: usize,
    ) -> Option<LoadedSample<B::Handle>> {
        let mut slots: Vec<Option<B::Handle>> = Vec::with_capacity(frame_count);
        let mut frames = Vec::with_capacity(frame_count);
        for step in 0..frame_count {
            let data = source.load_frame(subject, sample, step).await;
            let mut st = inner.borrow_mut();
            if !st.sessions.is_current(token) {
                log::debug!("session {token} stale; discarding load of sample {sample}");
                st.metrics.stale_results_discarded += 1;
                let Inner { backend, .. } = &mut *st;
                for handle in slots.into_iter().flatten() {
                    backend.dispose(handle);
                }
                return None;
            }
            match data {
                Some(frame) => {
                    let handle = st
                        .backend
                        .create_representation(&frame.positions, frame.colors.as_deref());
                    st.backend.set_visible(&handle, false);
                    slots.push(Some(handle));
                    frames.push(Some(frame));
                }
                None => {
                    log::warn!("no data for step {step} of sample {sample}; slot left empty");
                    st.metrics.load_failures += 1;
                    slots.push(None);
                    frames.push(None);
                }
            }
        }
        Some(LoadedSample {
            sample: sample.clone(),
            slots,
            frames,
        })
    }

    fn schedule_tick(
        inner: &Rc<RefCell<Inner<B, P>>>,
        source: &Rc<S>,
        token: SessionToken,
        delay: Duration,
    ) {
        let inner_task = Rc::clone(inner);
        let source_task = Rc::clone(source);
        let timer = tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            Self::tick(&inner_task, &source_task, token);
        });
        inner.borrow_mut().timer = Some(timer);
    }

    /// One step of the timer loop: hide the previously visible frame, show the
    /// frame at the current global index, then either schedule the next tick or
    /// kick off the cycle-end prefetch.
    fn tick(inner: &Rc<RefCell<Inner<B, P>>>, source: &Rc<S>, token: SessionToken) {
        let mut st = inner.borrow_mut();
        if !st.sessions.is_current(token) || st.state != PlaybackState::Playing {
            return;
        }
        st.timer = None;
        st.metrics.ticks += 1;

        if st.viewers.iter().any(|viewer| !viewer.is_loaded()) {
            // Prerequisite data still loading: keep the counter where it is and
            // try again shortly.
            st.metrics.ticks_deferred += 1;
            let delay = st.config.retry_delay;
            drop(st);
            Self::schedule_tick(inner, source, token, delay);
            return;
        }

        let g = st.global_index;
        let frame_count = st.config.frame_count;
        let mode = st.mode;
        let cycle = cycle_length(frame_count, mode);

        {
            let Inner {
                viewers,
                backend,
                metrics,
                shown_index,
                ..
            } = &mut *st;
            if let Some(prev) = shown_index.take() {
                let prev_frame = map_global_index(prev, frame_count, mode);
                for viewer in viewers.iter_mut() {
                    viewer.set_frame_visible(backend, prev, prev_frame, false);
                }
            }
            let frame = map_global_index(g, frame_count, mode);
            for viewer in viewers.iter_mut() {
                if viewer.show_frame(backend, g, frame) {
                    metrics.interpolations_synthesized += 1;
                }
            }
            *shown_index = Some(g);
            metrics.frames_shown += 1;
        }

        if g + 1 < cycle {
            st.global_index = g + 1;
            let delay = st.config.frame_interval;
            drop(st);
            Self::schedule_tick(inner, source, token, delay);
        } else {
            st.cycle_pending = true;
            drop(st);
            Self::spawn_cycle_end(inner, source, token);
        }
    }

    /// Cycle boundary: prefetch the next sample for every viewer (viewers load
    /// independently, steps of one sample strictly in order), linger on the
    /// final frame, then atomically swap the new samples in. A stale session
    /// disposes everything loaded and mutates no state; a paused one holds the
    /// loaded samples for [`Sequencer::resume`] to install, keeping the counter
    /// and visibility frozen.
    fn spawn_cycle_end(inner: &Rc<RefCell<Inner<B, P>>>, source: &Rc<S>, token: SessionToken) {
        let inner = Rc::clone(inner);
        let source = Rc::clone(source);
        tokio::task::spawn_local(async move {
            let (subject, picks, frame_count, pause) = {
                let mut st = inner.borrow_mut();
                if !st.sessions.is_current(token) {
                    return;
                }
                let Some(subject) = st.subject.clone() else {
                    return;
                };
                let active: Vec<SampleId> = st
                    .viewers
                    .iter()
                    .map(|viewer| viewer.sample().clone())
                    .collect();
                let Inner {
                    viewers, policy, ..
                } = &mut *st;
                let mut picks = Vec::with_capacity(viewers.len());
                for viewer in viewers.iter() {
                    let position = viewer.position();
                    picks.push((position, policy.next_sample(position, &active)));
                }
                (subject, picks, st.config.frame_count, st.config.cycle_pause)
            };

            let mut tasks = Vec::with_capacity(picks.len());
            for (position, sample) in picks {
                let inner_task = Rc::clone(&inner);
                let source_task = Rc::clone(&source);
                let subject_task = subject.clone();
                tasks.push(tokio::task::spawn_local(async move {
                    Self::load_sample(
                        &inner_task,
                        &source_task,
                        token,
                        &subject_task,
                        &sample,
                        frame_count,
                    )
                    .await
                    .map(|loaded| (position, loaded))
                }));
            }
            let mut pending = Vec::new();
            for task in tasks {
                if let Ok(Some(result)) = task.await {
                    pending.push(result);
                }
            }

            tokio::time::sleep(pause).await;

            let mut st = inner.borrow_mut();
            if !st.sessions.is_current(token) {
                log::debug!("session {token} stale; abandoning sample swap");
                st.metrics.stale_results_discarded += 1;
                let Inner { backend, .. } = &mut *st;
                for (_, loaded) in pending {
                    loaded.dispose(backend);
                }
                return;
            }
            if st.state == PlaybackState::Paused {
                // Frozen: resume() installs these and restarts the loop.
                st.deferred_swap = Some(pending);
                return;
            }

            Self::complete_swap(&mut st, pending);
            let resume = st.state == PlaybackState::Playing;
            let delay = st.config.frame_interval;
            drop(st);
            if resume {
                Self::schedule_tick(&inner, &source, token, delay);
            }
        });
    }
}

impl<B, S, P> Drop for Sequencer<B, S, P>
where
    B: SceneBackend + 'static,
    S: FrameSource + 'static,
    P: SamplePolicy + 'static,
{
    fn drop(&mut self) {
        self.teardown();
    }
}
