//! Voronoi cell records
//!
//! The merged fracture mesh owns all geometry. A cell only remembers which
//! vertices of that mesh it owns and where they were at build time.

use glam::Vec3;

use crate::mesh::Mesh;

/// One fracture cell
#[derive(Debug, Clone, PartialEq)]
pub struct VoronoiCell {
    vertices: Vec<u32>,
    vertco: Vec<Vec3>,
    /// Cell centroid (object space)
    pub centroid: Vec3,
    /// Particle the cell follows, `None` while unbound
    pub particle: Option<usize>,
    /// Clipped cell geometry; only present when boolean clipping succeeded
    pub cell_mesh: Option<Mesh>,
}

impl VoronoiCell {
    /// Create an unbound cell without vertices
    pub fn new(centroid: Vec3) -> Self {
        Self {
            vertices: Vec::new(),
            vertco: Vec::new(),
            centroid,
            particle: None,
            cell_mesh: None,
        }
    }

    /// Record ownership of a merged-mesh vertex together with its rest position
    pub fn push_vertex(&mut self, index: u32, rest: Vec3) {
        self.vertices.push(index);
        self.vertco.push(rest);
    }

    /// Indices of the cell's vertices in the merged mesh
    #[inline]
    pub fn vertices(&self) -> &[u32] {
        &self.vertices
    }

    /// Rest positions (object space), index-aligned with [`Self::vertices`]
    #[inline]
    pub fn vertco(&self) -> &[Vec3] {
        &self.vertco
    }

    /// Owned vertex indices paired with their rest positions
    pub fn rest_vertices(&self) -> impl Iterator<Item = (u32, Vec3)> + '_ {
        self.vertices.iter().copied().zip(self.vertco.iter().copied())
    }

    /// Number of owned vertices
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the cell follows a particle
    #[inline]
    pub fn is_bound(&self) -> bool {
        self.particle.is_some()
    }
}

/// All cells of one fracture result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoronoiCellSet {
    cells: Vec<VoronoiCell>,
}

impl VoronoiCellSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cells
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if there are no cells
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Add a cell
    pub fn push(&mut self, cell: VoronoiCell) {
        self.cells.push(cell);
    }

    /// Get a cell by index
    #[inline]
    pub fn get(&self, index: usize) -> Option<&VoronoiCell> {
        self.cells.get(index)
    }

    /// Iterate over cells
    pub fn iter(&self) -> std::slice::Iter<'_, VoronoiCell> {
        self.cells.iter()
    }

    /// Iterate mutably over cells
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, VoronoiCell> {
        self.cells.iter_mut()
    }

    /// Unbind every cell
    pub fn reset_bindings(&mut self) {
        for cell in &mut self.cells {
            cell.particle = None;
        }
    }

    /// Sum of owned vertex counts over all cells
    pub fn total_vertex_count(&self) -> usize {
        self.cells.iter().map(|c| c.vertex_count()).sum()
    }
}

impl<'a> IntoIterator for &'a VoronoiCellSet {
    type Item = &'a VoronoiCell;
    type IntoIter = std::slice::Iter<'a, VoronoiCell>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertices_and_vertco_aligned() {
        let mut cell = VoronoiCell::new(Vec3::ZERO);
        cell.push_vertex(4, Vec3::X);
        cell.push_vertex(5, Vec3::Y);

        assert_eq!(cell.vertex_count(), 2);
        assert_eq!(cell.vertices(), &[4, 5]);
        assert_eq!(cell.vertco(), &[Vec3::X, Vec3::Y]);
        assert_eq!(
            cell.rest_vertices().collect::<Vec<_>>(),
            vec![(4, Vec3::X), (5, Vec3::Y)]
        );
    }

    #[test]
    fn test_reset_bindings() {
        let mut set = VoronoiCellSet::new();
        let mut a = VoronoiCell::new(Vec3::ZERO);
        a.particle = Some(3);
        set.push(a);
        set.push(VoronoiCell::new(Vec3::ONE));

        assert!(set.get(0).unwrap().is_bound());
        set.reset_bindings();
        assert!(set.iter().all(|c| !c.is_bound()));
    }
}
