//! File-backed frame source.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::frame::FrameData;
use crate::ids::{SampleId, SubjectId};
use crate::scene::FrameSource;

/// Frame source reading one JSON [`FrameData`] per animation step from a
/// directory tree laid out as `<root>/<subject>/<sample>/step_<n>.json`.
///
/// Missing or unparsable files resolve as `None` (a blank slot), matching the
/// contract of [`FrameSource`]; the cause is logged.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// Create a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn step_path(&self, subject: &SubjectId, sample: &SampleId, step: usize) -> PathBuf {
        self.root
            .join(subject.as_str())
            .join(sample.as_str())
            .join(format!("step_{step}.json"))
    }
}

#[async_trait(?Send)]
impl FrameSource for DirectorySource {
    async fn load_frame(
        &self,
        subject: &SubjectId,
        sample: &SampleId,
        step: usize,
    ) -> Option<FrameData> {
        let path = self.step_path(subject, sample, step);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                log::warn!("failed to read {}: {err}", path.display());
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(frame) => Some(frame),
            Err(err) => {
                log::warn!("failed to parse {}: {err}", path.display());
                None
            }
        }
    }
}
