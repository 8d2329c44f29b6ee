//! Traits the sequencer uses to talk to its host: the scene that renders frame
//! representations and the source that loads raw frame data.

use async_trait::async_trait;
use nalgebra::Point3;

use crate::frame::FrameData;
use crate::ids::{SampleId, SubjectId};

/// Host-side scene operations on frame representations.
///
/// Handles are opaque to the sequencer; it only creates them, toggles their
/// visibility and disposes them. Every handle a backend hands out is disposed
/// exactly once, at sample swap or teardown time.
pub trait SceneBackend {
    /// Opaque handle to one frame representation in the host's scene.
    type Handle: 'static;

    /// Create a representation for the given points. Visibility is set
    /// explicitly by the sequencer right after creation.
    fn create_representation(
        &mut self,
        positions: &[Point3<f32>],
        colors: Option<&[[f32; 3]]>,
    ) -> Self::Handle;

    /// Show or hide a representation.
    fn set_visible(&mut self, handle: &Self::Handle, visible: bool);

    /// Release a representation.
    fn dispose(&mut self, handle: Self::Handle);
}

/// Asynchronous source of raw frame data.
///
/// A failed or missing step resolves as `None` rather than an error; the
/// sequencer leaves that slot blank and keeps playing. Implementations should
/// log the cause themselves if they have one.
#[async_trait(?Send)]
pub trait FrameSource {
    /// Load the positions (and optional colors) of one animation step.
    async fn load_frame(
        &self,
        subject: &SubjectId,
        sample: &SampleId,
        step: usize,
    ) -> Option<FrameData>;
}
