//! Point-Cloud Animation Sequencer
//!
//! A playback driver for streamed point-cloud frame animations. The sequencer
//! owns a discrete global frame counter, maps it to original or synthesized
//! in-between frame slots per viewer, and drives a cooperative timer loop that
//! advances the counter, swaps visibility of precomputed frame representations
//! and periodically reloads fresh data samples. A monotonically increasing
//! session token invalidates stale timers and in-flight loads after a reset or
//! teardown.
//!
//! Rendering and data transport stay on the host's side of two small traits:
//! [`SceneBackend`] (create/show/dispose representations) and [`FrameSource`]
//! (load one step's points). Scheduling runs on a current-thread tokio runtime
//! inside a [`tokio::task::LocalSet`]; there is no parallelism, only
//! cooperative suspension between ticks and loads.

pub mod config;
pub mod error;
pub mod frame;
pub mod ids;
pub mod mapper;
pub mod metrics;
pub mod policy;
pub mod scene;
pub mod sequencer;
pub mod session;
pub mod sources;
pub mod viewer;

// Re-export common types for convenience
pub use config::SequencerConfig;
pub use error::SequencerError;
pub use frame::FrameData;
pub use ids::{SampleId, SubjectId};
pub use mapper::{cycle_length, map_global_index, FrameRef, PlaybackMode};
pub use metrics::SequencerMetrics;
pub use policy::{FixedOrderPolicy, RandomDistinctPolicy, SamplePolicy};
pub use scene::{FrameSource, SceneBackend};
pub use sequencer::{PlaybackState, Sequencer};
pub use session::{SessionCounter, SessionToken};
pub use sources::DirectorySource;
pub use viewer::{InterpolationKey, LoadedSample, ViewerState};

/// Sequencer result type
pub type Result<T> = core::result::Result<T, SequencerError>;
