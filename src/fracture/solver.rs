//! Voronoi solver seam
//!
//! The diagram itself is computed by an external solver. It receives the
//! world-space container box and the seed points and writes one line per
//! cell:
//!
//! ```text
//! (x,y,z) (x,y,z) ... v (i,j,k) (i,j,k,l) ... f cx cy cz
//! ```
//!
//! Vertex positions and the centroid are world space; face entries index the
//! vertex list of the same cell.

use std::io::{self, Write};

use glam::Vec3;

use crate::mesh::Aabb;

/// External Voronoi diagram solver
pub trait VoronoiSolver {
    /// Compute the cells of `seeds` clipped to `bounds`
    ///
    /// `cell_hint` is the number of cells the caller expects (the number of
    /// seeds); solvers may use it to size their containers.
    fn compute(
        &self,
        bounds: &Aabb,
        cell_hint: usize,
        seeds: &[Vec3],
        out: &mut dyn Write,
    ) -> io::Result<()>;
}

impl<F> VoronoiSolver for F
where
    F: Fn(&Aabb, usize, &[Vec3], &mut dyn Write) -> io::Result<()>,
{
    fn compute(
        &self,
        bounds: &Aabb,
        cell_hint: usize,
        seeds: &[Vec3],
        out: &mut dyn Write,
    ) -> io::Result<()> {
        self(bounds, cell_hint, seeds, out)
    }
}

/// Write one cell in the solver protocol
///
/// Helper for solver implementations.
pub fn write_cell(
    out: &mut dyn Write,
    vertices: &[Vec3],
    faces: &[Vec<u32>],
    centroid: Vec3,
) -> io::Result<()> {
    for v in vertices {
        write!(out, "({},{},{}) ", v.x, v.y, v.z)?;
    }
    write!(out, "v ")?;
    for face in faces {
        let indices: Vec<String> = face.iter().map(|i| i.to_string()).collect();
        write!(out, "({}) ", indices.join(","))?;
    }
    writeln!(out, "f {} {} {}", centroid.x, centroid.y, centroid.z)
}
