//! Per-viewer playback state: frame slots, raw positions and the cache of
//! synthesized in-between frames.

use std::collections::HashMap;

use crate::frame::FrameData;
use crate::ids::SampleId;
use crate::mapper::FrameRef;
use crate::scene::SceneBackend;
use crate::session::SessionToken;

/// Cache key of one lazily synthesized in-between frame.
///
/// The sample component of the key is implicit: the cache lives inside the
/// viewer and is destroyed whenever the viewer's sample changes, so entries can
/// never outlive the sample they were synthesized from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterpolationKey {
    /// Lower original slot index (`i0`).
    pub lower: usize,
    /// Upper original slot index (`i1`, clamped to the last slot).
    pub upper: usize,
    /// Global frame index the entry was synthesized for.
    pub global_index: usize,
}

/// A fully loaded sample, ready to be installed into a viewer.
///
/// Slots hold hidden representations; `None` marks a step whose load failed.
#[derive(Debug)]
pub struct LoadedSample<H> {
    pub sample: SampleId,
    pub slots: Vec<Option<H>>,
    pub frames: Vec<Option<FrameData>>,
}

impl<H> LoadedSample<H> {
    /// Release every representation this load created, without installing it.
    pub fn dispose<B: SceneBackend<Handle = H>>(self, backend: &mut B) {
        for handle in self.slots.into_iter().flatten() {
            backend.dispose(handle);
        }
    }
}

/// State of one animated viewer position.
#[derive(Debug)]
pub struct ViewerState<H> {
    position: usize,
    sample: SampleId,
    token: SessionToken,
    loaded: bool,
    slots: Vec<Option<H>>,
    frames: Vec<Option<FrameData>>,
    interpolated: HashMap<InterpolationKey, Option<H>>,
}

impl<H> ViewerState<H> {
    /// Create an empty viewer bound to `sample`, awaiting its initial load.
    pub fn new(
        position: usize,
        sample: SampleId,
        token: SessionToken,
        frame_count: usize,
    ) -> Self {
        Self {
            position,
            sample,
            token,
            loaded: false,
            slots: (0..frame_count).map(|_| None).collect(),
            frames: (0..frame_count).map(|_| None).collect(),
            interpolated: HashMap::new(),
        }
    }

    /// Viewer position index this state is bound to.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Sample currently bound to this viewer.
    #[inline]
    pub fn sample(&self) -> &SampleId {
        &self.sample
    }

    /// Session token this viewer was created under.
    #[inline]
    pub fn token(&self) -> SessionToken {
        self.token
    }

    /// Whether every step of the bound sample has resolved (loaded or failed).
    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Number of frame slots (`F`).
    #[inline]
    pub fn frame_count(&self) -> usize {
        self.slots.len()
    }

    /// Install a loaded sample, disposing whatever the viewer held before:
    /// all original slots and every cached in-between representation.
    pub fn install<B: SceneBackend<Handle = H>>(&mut self, backend: &mut B, loaded: LoadedSample<H>) {
        for handle in self.slots.drain(..).flatten() {
            backend.dispose(handle);
        }
        for (_, cached) in self.interpolated.drain() {
            if let Some(handle) = cached {
                backend.dispose(handle);
            }
        }
        self.sample = loaded.sample;
        self.slots = loaded.slots;
        self.frames = loaded.frames;
        self.loaded = true;
    }

    /// Release every representation this viewer holds.
    pub fn dispose_all<B: SceneBackend<Handle = H>>(mut self, backend: &mut B) {
        for handle in self.slots.drain(..).flatten() {
            backend.dispose(handle);
        }
        for (_, cached) in self.interpolated.drain() {
            if let Some(handle) = cached {
                backend.dispose(handle);
            }
        }
    }

    /// Toggle visibility of the representation at `frame`, if one exists.
    /// Empty slots and impossible interpolations are silently skipped.
    pub fn set_frame_visible<B: SceneBackend<Handle = H>>(
        &mut self,
        backend: &mut B,
        global_index: usize,
        frame: FrameRef,
        visible: bool,
    ) {
        match frame {
            FrameRef::Original { index } => {
                if let Some(Some(handle)) = self.slots.get(index) {
                    backend.set_visible(handle, visible);
                }
            }
            FrameRef::Interpolated { lower, upper, .. } => {
                let key = InterpolationKey {
                    lower,
                    upper,
                    global_index,
                };
                if let Some(Some(handle)) = self.interpolated.get(&key) {
                    backend.set_visible(handle, visible);
                }
            }
        }
    }

    /// Show the representation at `frame`, synthesizing and caching the
    /// in-between representation on first use. Returns `true` when a new
    /// in-between frame was synthesized.
    ///
    /// If either source frame of an interpolation is absent there is nothing to
    /// show; the miss is cached so the pair is not retried every cycle.
    pub fn show_frame<B: SceneBackend<Handle = H>>(
        &mut self,
        backend: &mut B,
        global_index: usize,
        frame: FrameRef,
    ) -> bool {
        let mut synthesized = false;
        if let FrameRef::Interpolated { lower, upper, .. } = frame {
            let key = InterpolationKey {
                lower,
                upper,
                global_index,
            };
            if !self.interpolated.contains_key(&key) {
                let lower_frame = self.frames.get(lower).and_then(|f| f.as_ref());
                let upper_frame = self.frames.get(upper).and_then(|f| f.as_ref());
                let handle = match (lower_frame, upper_frame) {
                    (Some(a), Some(b)) => {
                        let mid = a.midpoint(b);
                        let handle =
                            backend.create_representation(&mid.positions, mid.colors.as_deref());
                        backend.set_visible(&handle, false);
                        synthesized = true;
                        Some(handle)
                    }
                    _ => None,
                };
                self.interpolated.insert(key, handle);
            }
        }
        self.set_frame_visible(backend, global_index, frame, true);
        synthesized
    }
}
