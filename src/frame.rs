//! Raw per-frame point cloud data and in-between frame synthesis.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Positions (and optional per-point colors) of one animation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameData {
    /// Per-point 3D positions.
    pub positions: Vec<Point3<f32>>,
    /// Per-point RGB colors, if the source provides them.
    pub colors: Option<Vec<[f32; 3]>>,
}

impl FrameData {
    /// Create frame data without colors.
    #[inline]
    pub fn new(positions: Vec<Point3<f32>>) -> Self {
        Self {
            positions,
            colors: None,
        }
    }

    /// Create frame data with per-point colors.
    #[inline]
    pub fn with_colors(positions: Vec<Point3<f32>>, colors: Vec<[f32; 3]>) -> Self {
        Self {
            positions,
            colors: Some(colors),
        }
    }

    /// Number of points in this frame.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether this frame has no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Synthesize the in-between frame halfway to `next`.
    ///
    /// Per-point positions are the arithmetic midpoint of the two inputs; colors
    /// are copied from `self` unconditionally, never blended. When the endpoints
    /// are the same frame the result equals that frame, which is what the final
    /// half-step of a slow cycle relies on.
    pub fn midpoint(&self, next: &FrameData) -> FrameData {
        let positions = self
            .positions
            .iter()
            .zip(next.positions.iter())
            .map(|(a, b)| nalgebra::center(a, b))
            .collect();
        FrameData {
            positions,
            colors: self.colors.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn midpoint_averages_positions() {
        let a = FrameData::with_colors(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 2.0, 2.0)],
            vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        );
        let b = FrameData::with_colors(
            vec![Point3::new(1.0, 3.0, 5.0), Point3::new(4.0, 0.0, 0.0)],
            vec![[0.0, 0.0, 1.0], [0.0, 0.0, 1.0]],
        );

        let mid = a.midpoint(&b);
        assert_relative_eq!(mid.positions[0].x, 0.5);
        assert_relative_eq!(mid.positions[0].y, 1.5);
        assert_relative_eq!(mid.positions[0].z, 2.5);
        assert_relative_eq!(mid.positions[1].x, 3.0);

        // colors come from the first endpoint, never blended
        assert_eq!(mid.colors, a.colors);
    }

    #[test]
    fn midpoint_of_frame_with_itself_is_identity() {
        let a = FrameData::new(vec![Point3::new(1.0, -2.0, 3.5)]);
        let mid = a.midpoint(&a);
        assert_eq!(mid, a);
    }
}
