//! Per-element attribute layers carried alongside mesh geometry

use glam::Vec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per-face-corner texture coordinates
///
/// `uvs[f][c]` is the coordinate of corner `c` of face `f`. Triangles leave
/// the fourth slot unused.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct UvLayer {
    /// Layer name (used to match layers across meshes)
    pub name: String,
    /// Corner coordinates, parallel to the mesh face list
    pub uvs: Vec<[Vec2; 4]>,
}

impl UvLayer {
    /// Create a layer with `face_count` zeroed entries
    pub fn new(name: impl Into<String>, face_count: usize) -> Self {
        Self {
            name: name.into(),
            uvs: vec![[Vec2::ZERO; 4]; face_count],
        }
    }

    /// Coordinate halfway between two corners of a face
    #[inline]
    pub fn corner_midpoint(&self, face: usize, a: usize, b: usize) -> Vec2 {
        let uv = &self.uvs[face];
        uv[a].lerp(uv[b], 0.5)
    }
}

/// Per-vertex scalar weights (deform weights)
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct VertexGroup {
    /// Group name
    pub name: String,
    /// Weights, parallel to the mesh vertex list
    pub weights: Vec<f32>,
}

impl VertexGroup {
    /// Create a group with `vertex_count` zero weights
    pub fn new(name: impl Into<String>, vertex_count: usize) -> Self {
        Self {
            name: name.into(),
            weights: vec![0.0; vertex_count],
        }
    }

    /// Weight of a vertex, 0.0 when out of range
    #[inline]
    pub fn weight(&self, vertex: usize) -> f32 {
        self.weights.get(vertex).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_midpoint() {
        let mut layer = UvLayer::new("uv", 1);
        layer.uvs[0] = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];

        assert_eq!(layer.corner_midpoint(0, 0, 2), Vec2::new(0.5, 0.5));
        assert_eq!(layer.corner_midpoint(0, 1, 2), Vec2::new(1.0, 0.5));
    }

    #[test]
    fn test_weight_out_of_range() {
        let group = VertexGroup::new("g", 2);
        assert_eq!(group.weight(1), 0.0);
        assert_eq!(group.weight(99), 0.0);
    }
}
