//! Renderer-facing mesh geometry.

use serde::{Deserialize, Serialize};

/// An indexed triangle list ready to hand to a renderer.
///
/// `indices` always has a length divisible by three and every index is a
/// valid position in `positions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderableGeometry {
    /// Name of the OBJ object or group the geometry came from, if any.
    pub name: Option<String>,
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl RenderableGeometry {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned bounding box as `(min, max)`, or `None` for an empty mesh.
    pub fn bounding_box(&self) -> Option<([f32; 3], [f32; 3])> {
        let first = *self.positions.first()?;
        let bounds = self
            .positions
            .iter()
            .fold((first, first), |(mut min, mut max), p| {
                for axis in 0..3 {
                    min[axis] = min[axis].min(p[axis]);
                    max[axis] = max[axis].max(p[axis]);
                }
                (min, max)
            });
        Some(bounds)
    }

    /// Summary of the geometry for reports.
    pub fn summary(&self) -> MeshSummary {
        MeshSummary {
            name: self.name.clone(),
            vertex_count: self.vertex_count(),
            triangle_count: self.triangle_count(),
            bounding_box: self.bounding_box(),
        }
    }
}

/// Size and extent of a normalized mesh, shown in place of the 3D view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshSummary {
    pub name: Option<String>,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub bounding_box: Option<([f32; 3], [f32; 3])>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box() {
        let geometry = RenderableGeometry {
            name: None,
            positions: vec![[0.0, -1.0, 2.0], [3.0, 1.0, -2.0], [1.0, 0.5, 0.0]],
            indices: vec![0, 1, 2],
        };

        let (min, max) = geometry.bounding_box().unwrap();
        assert_eq!(min, [0.0, -1.0, -2.0]);
        assert_eq!(max, [3.0, 1.0, 2.0]);
        assert_eq!(geometry.triangle_count(), 1);
    }

    #[test]
    fn test_empty_geometry_has_no_bounds() {
        let geometry = RenderableGeometry {
            name: Some("empty".into()),
            positions: Vec::new(),
            indices: Vec::new(),
        };
        assert!(geometry.bounding_box().is_none());
        assert_eq!(geometry.summary().vertex_count, 0);
    }
}
