//! Polygon mesh used by both fragmentation transforms
//!
//! Faces are triangles or quads. Larger polygons (Voronoi cell faces) are
//! tessellated on insertion. Attribute layers are kept parallel to the
//! vertex and face lists and follow elements when they are copied between
//! meshes.

mod layers;

pub use layers::{UvLayer, VertexGroup};

use glam::{Mat4, Vec2, Vec3};
use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{FractureError, Result};

/// A triangle or quad referencing mesh vertices
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Face {
    /// Corner vertex indices; only the first three are used by triangles
    pub verts: [u32; 4],
    /// Whether the fourth corner is used
    pub quad: bool,
    /// Material slot index
    pub material: u16,
}

impl Face {
    /// Create a triangle
    pub fn tri(a: u32, b: u32, c: u32) -> Self {
        Self {
            verts: [a, b, c, 0],
            quad: false,
            material: 0,
        }
    }

    /// Create a quad
    pub fn quad(a: u32, b: u32, c: u32, d: u32) -> Self {
        Self {
            verts: [a, b, c, d],
            quad: true,
            material: 0,
        }
    }

    /// Set the material index
    pub fn with_material(mut self, material: u16) -> Self {
        self.material = material;
        self
    }

    /// Number of corners (3 or 4)
    #[inline]
    pub fn corner_count(&self) -> usize {
        if self.quad {
            4
        } else {
            3
        }
    }

    /// Corner vertex indices
    #[inline]
    pub fn corners(&self) -> &[u32] {
        &self.verts[..self.corner_count()]
    }

    /// Reverse the winding order
    pub fn flipped(mut self) -> Self {
        let n = self.corner_count();
        self.verts[..n].reverse();
        self
    }
}

/// Axis-aligned bounding box
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Aabb {
    /// Smallest box containing all points, `None` for no points
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec3>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    /// Grow every side by `theta`
    pub fn expanded(self, theta: f32) -> Self {
        Self {
            min: self.min - Vec3::splat(theta),
            max: self.max + Vec3::splat(theta),
        }
    }

    /// Box around the eight transformed corners
    pub fn transformed(self, matrix: &Mat4) -> Self {
        let corners = (0..8).map(|i| {
            let pick = |bit: usize, lo: f32, hi: f32| if i & bit == 0 { lo } else { hi };
            matrix.transform_point3(Vec3::new(
                pick(1, self.min.x, self.max.x),
                pick(2, self.min.y, self.max.y),
                pick(4, self.min.z, self.max.z),
            ))
        });
        // eight corners are always present
        Self::from_points(corners).unwrap_or(self)
    }

    /// Box extents
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Engine-agnostic polygon mesh
///
/// # Example
///
/// ```
/// use particle_fracture::{Face, Mesh};
/// use glam::Vec3;
///
/// let mesh = Mesh::from_parts(
///     vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y],
///     vec![Face::quad(0, 1, 2, 3)],
/// );
///
/// assert_eq!(mesh.vertex_count(), 4);
/// assert_eq!(mesh.edges().len(), 4);
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    /// Vertex positions (object space)
    pub positions: Vec<Vec3>,
    /// Triangles and quads
    pub faces: Vec<Face>,
    /// Per-face-corner UV layers
    pub uv_layers: Vec<UvLayer>,
    /// Per-vertex weight groups
    pub vertex_groups: Vec<VertexGroup>,
}

impl Mesh {
    /// Create an empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh from positions and faces without attribute layers
    pub fn from_parts(positions: Vec<Vec3>, faces: Vec<Face>) -> Self {
        Self {
            positions,
            faces,
            ..Default::default()
        }
    }

    /// Empty mesh carrying the same attribute layers as `self`
    pub fn template(&self) -> Self {
        Self {
            positions: Vec::new(),
            faces: Vec::new(),
            uv_layers: self
                .uv_layers
                .iter()
                .map(|l| UvLayer::new(l.name.clone(), 0))
                .collect(),
            vertex_groups: self
                .vertex_groups
                .iter()
                .map(|g| VertexGroup::new(g.name.clone(), 0))
                .collect(),
        }
    }

    /// Get the number of vertices
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Get the number of faces
    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if mesh is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Add a UV layer (zeroed for existing faces) and return its index
    pub fn add_uv_layer(&mut self, name: impl Into<String>) -> usize {
        self.uv_layers.push(UvLayer::new(name, self.faces.len()));
        self.uv_layers.len() - 1
    }

    /// Add a vertex group (zero weights) and return its index
    pub fn add_vertex_group(&mut self, name: impl Into<String>) -> usize {
        self.vertex_groups
            .push(VertexGroup::new(name, self.positions.len()));
        self.vertex_groups.len() - 1
    }

    /// Find a UV layer by name
    pub fn uv_layer_index(&self, name: &str) -> Option<usize> {
        self.uv_layers.iter().position(|l| l.name == name)
    }

    /// Find a vertex group by name
    pub fn vertex_group(&self, name: &str) -> Option<&VertexGroup> {
        self.vertex_groups.iter().find(|g| g.name == name)
    }

    /// Append a vertex with zero weights and return its index
    pub fn add_vertex(&mut self, position: Vec3) -> u32 {
        self.positions.push(position);
        for group in &mut self.vertex_groups {
            group.weights.push(0.0);
        }
        (self.positions.len() - 1) as u32
    }

    /// Append a copy of vertex `index` of `src` (position and weights)
    ///
    /// Both meshes must share the same vertex group layout, which holds for
    /// meshes created through [`Mesh::template`].
    pub fn copy_vertex(&mut self, src: &Mesh, index: usize) -> u32 {
        self.positions.push(src.positions[index]);
        for (dst, group) in self.vertex_groups.iter_mut().zip(&src.vertex_groups) {
            dst.weights.push(group.weight(index));
        }
        (self.positions.len() - 1) as u32
    }

    /// Append a face with zeroed UVs and return its index
    pub fn add_face(&mut self, face: Face) -> usize {
        self.faces.push(face);
        for layer in &mut self.uv_layers {
            layer.uvs.push([Vec2::ZERO; 4]);
        }
        self.faces.len() - 1
    }

    /// Append a face whose non-positional data (material, UVs) is copied from
    /// face `index` of `src`; `verts`/`quad` come from `face`
    pub fn copy_face(&mut self, src: &Mesh, index: usize, face: Face) -> usize {
        let material = src.faces[index].material;
        self.faces.push(Face { material, ..face });
        for (dst, layer) in self.uv_layers.iter_mut().zip(&src.uv_layers) {
            dst.uvs.push(layer.uvs[index]);
        }
        self.faces.len() - 1
    }

    /// Append a polygon, tessellating anything larger than a quad as a fan
    ///
    /// Returns the number of faces added (0 for degenerate polygons).
    pub fn add_polygon(&mut self, corners: &[u32], material: u16, flip: bool) -> usize {
        let mut ring: Vec<u32> = corners.to_vec();
        if flip {
            ring.reverse();
        }

        match ring.len() {
            0..=2 => 0,
            3 => {
                self.add_face(Face::tri(ring[0], ring[1], ring[2]).with_material(material));
                1
            }
            4 => {
                self.add_face(Face::quad(ring[0], ring[1], ring[2], ring[3]).with_material(material));
                1
            }
            n => {
                for i in 1..n - 1 {
                    self.add_face(Face::tri(ring[0], ring[i], ring[i + 1]).with_material(material));
                }
                n - 2
            }
        }
    }

    /// Append all geometry of `other`, matching attribute layers by name
    ///
    /// Layers present only in `other` are added to `self` (zero-filled for
    /// existing elements). Returns the index of the first appended vertex.
    pub fn append(&mut self, other: &Mesh) -> u32 {
        for layer in &other.uv_layers {
            if self.uv_layer_index(&layer.name).is_none() {
                self.add_uv_layer(layer.name.clone());
            }
        }
        for group in &other.vertex_groups {
            if self.vertex_group(&group.name).is_none() {
                self.add_vertex_group(group.name.clone());
            }
        }

        let base = self.positions.len() as u32;
        self.positions.extend_from_slice(&other.positions);
        for group in &mut self.vertex_groups {
            match other.vertex_group(&group.name) {
                Some(src) => group
                    .weights
                    .extend((0..other.positions.len()).map(|v| src.weight(v))),
                None => group
                    .weights
                    .resize(group.weights.len() + other.positions.len(), 0.0),
            }
        }

        self.faces.extend(other.faces.iter().map(|f| {
            let mut face = *f;
            for v in &mut face.verts[..f.corner_count()] {
                *v += base;
            }
            face
        }));
        for layer in &mut self.uv_layers {
            match other.uv_layers.iter().find(|l| l.name == layer.name) {
                Some(src) => layer.uvs.extend_from_slice(&src.uvs),
                None => layer
                    .uvs
                    .resize(layer.uvs.len() + other.faces.len(), [Vec2::ZERO; 4]),
            }
        }

        base
    }

    /// Average of a face's corner positions
    pub fn face_center(&self, face: usize) -> Vec3 {
        let corners = self.faces[face].corners();
        let sum: Vec3 = corners.iter().map(|&v| self.positions[v as usize]).sum();
        sum / corners.len() as f32
    }

    /// Bounding box of all vertices
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.positions.iter().copied())
    }

    /// Unique undirected edges, each stored as `[low, high]`, in face order
    pub fn edges(&self) -> Vec<[u32; 2]> {
        let mut seen = HashSet::new();
        let mut edges = Vec::new();
        for face in &self.faces {
            let corners = face.corners();
            for (i, &a) in corners.iter().enumerate() {
                let b = corners[(i + 1) % corners.len()];
                let key = [a.min(b), a.max(b)];
                if seen.insert(key) {
                    edges.push(key);
                }
            }
        }
        edges
    }

    /// Triangulate quads and return `(triangles, source face of each triangle)`
    pub fn triangles(&self) -> (Vec<[u32; 3]>, Vec<usize>) {
        let mut tris = Vec::with_capacity(self.faces.len() * 2);
        let mut owners = Vec::with_capacity(self.faces.len() * 2);
        for (i, face) in self.faces.iter().enumerate() {
            let [a, b, c, d] = face.verts;
            tris.push([a, b, c]);
            owners.push(i);
            if face.quad {
                tris.push([a, c, d]);
                owners.push(i);
            }
        }
        (tris, owners)
    }

    /// Apply an affine transform to every vertex
    pub fn transform(&mut self, matrix: &Mat4) {
        for p in &mut self.positions {
            *p = matrix.transform_point3(*p);
        }
    }

    /// Check index ranges and layer lengths
    pub fn validate(&self) -> Result<()> {
        let n = self.positions.len() as u32;
        for (i, face) in self.faces.iter().enumerate() {
            if let Some(&v) = face.corners().iter().find(|&&v| v >= n) {
                return Err(FractureError::InvalidMesh(format!(
                    "face {} references vertex {} of {}",
                    i, v, n
                )));
            }
        }
        if let Some(layer) = self.uv_layers.iter().find(|l| l.uvs.len() != self.faces.len()) {
            return Err(FractureError::InvalidMesh(format!(
                "uv layer '{}' has {} entries for {} faces",
                layer.name,
                layer.uvs.len(),
                self.faces.len()
            )));
        }
        if let Some(group) = self
            .vertex_groups
            .iter()
            .find(|g| g.weights.len() != self.positions.len())
        {
            return Err(FractureError::InvalidMesh(format!(
                "vertex group '{}' has {} weights for {} vertices",
                group.name,
                group.weights.len(),
                self.positions.len()
            )));
        }
        Ok(())
    }
}
