//! Voronoi cell builder
//!
//! Gathers seeds, runs the external solver, parses its output, optionally
//! clips every cell against the source mesh, and merges all cells into one
//! mesh while recording per-cell vertex ownership.

use glam::{Mat4, Vec3};
use tracing::{debug, warn};

use super::boolean::MeshIntersector;
use super::cell::{VoronoiCell, VoronoiCellSet};
use super::parse::{CellParser, RawCell};
use super::seeds::{gather_seeds, SeedSources};
use super::solver::VoronoiSolver;
use crate::config::{ExplodeConfig, PointSource};
use crate::error::{FractureError, Result};
use crate::mesh::{Aabb, Mesh};
use crate::particles::ParticleSystem;

/// Container growth applied when cell and source faces would coincide
pub const CONTAINER_MARGIN: f32 = 0.01;

/// Inputs of a fracture build
#[derive(Debug, Clone, Copy)]
pub struct BuildInput<'a> {
    /// Source mesh (object space)
    pub mesh: &'a Mesh,
    /// Object-to-world matrix
    pub object_matrix: &'a Mat4,
    /// The object's own particle system
    pub particles: Option<&'a ParticleSystem>,
    /// Child objects and strokes
    pub sources: &'a SeedSources,
}

/// Result of a fracture build
#[derive(Debug, Clone)]
pub struct FractureBuild {
    /// All cell geometry merged into one mesh
    pub mesh: Mesh,
    /// Cells with their vertex ownership
    pub cells: VoronoiCellSet,
    /// Number of seed points handed to the solver
    pub requested: usize,
}

impl FractureBuild {
    /// Build result that leaves the source mesh untouched
    pub fn passthrough(mesh: &Mesh) -> Self {
        Self {
            mesh: mesh.clone(),
            cells: VoronoiCellSet::new(),
            requested: 0,
        }
    }

    /// Cells the solver was asked for but did not deliver
    pub fn missing(&self) -> usize {
        self.requested.saturating_sub(self.cells.len())
    }
}

/// World-space container box handed to the solver
///
/// The mesh extents are grown by [`CONTAINER_MARGIN`] when clipping with
/// flipped normals, or when the object's own vertices are the only seed
/// source and no clipping happens.
pub fn container_bounds(mesh: &Mesh, object_matrix: &Mat4, config: &ExplodeConfig) -> Option<Aabb> {
    let margin = if (config.use_boolean && config.flip_normal)
        || (!config.use_boolean && config.point_source == PointSource::OWN_VERTS)
    {
        CONTAINER_MARGIN
    } else {
        0.0
    };
    Some(mesh.bounds()?.transformed(object_matrix).expanded(margin))
}

/// Turn one parsed cell into object-space geometry
fn cell_geometry(raw: &RawCell, world_to_object: &Mat4, config: &ExplodeConfig) -> Mesh {
    let material = if config.use_boolean {
        config.inner_material.unwrap_or(0)
    } else {
        0
    };

    let mut geometry = Mesh::new();
    for &v in &raw.vertices {
        geometry.add_vertex(world_to_object.transform_point3(v));
    }
    for ring in &raw.faces {
        geometry.add_polygon(ring, material, config.flip_normal);
    }
    geometry
}

/// Run a full fracture build
///
/// Zero seed points (or an empty source mesh) give a passthrough result
/// without calling the solver, and so does a solver that yields no cells. Solver failures are errors; clipping failures
/// and malformed or truncated solver output only drop or degrade the
/// affected cells.
pub fn build_cells(
    input: BuildInput<'_>,
    config: &ExplodeConfig,
    solver: &dyn VoronoiSolver,
    intersector: &dyn MeshIntersector,
) -> Result<FractureBuild> {
    let seeds = gather_seeds(
        config.point_source,
        config.refracture,
        input.mesh,
        input.object_matrix,
        input.particles,
        input.sources,
    );
    if seeds.is_empty() {
        debug!("No seed points, leaving mesh unfractured");
        return Ok(FractureBuild::passthrough(input.mesh));
    }
    let Some(bounds) = container_bounds(input.mesh, input.object_matrix, config) else {
        return Ok(FractureBuild::passthrough(input.mesh));
    };

    let mut output = Vec::new();
    solver
        .compute(&bounds, seeds.len(), &seeds, &mut output)
        .map_err(|e| FractureError::Solver(e.to_string()))?;
    let text = String::from_utf8(output).map_err(|e| FractureError::Solver(e.to_string()))?;

    let world_to_object = input.object_matrix.inverse();
    let mut merged = input.mesh.template();
    let mut cells = VoronoiCellSet::new();
    let mut parser = CellParser::new(&text);

    for item in parser.by_ref() {
        let raw = match item {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Stopped reading solver output: {}", e);
                break;
            }
        };

        let geometry = cell_geometry(&raw, &world_to_object, config);
        let mut cell = VoronoiCell::new(world_to_object.transform_point3(raw.centroid));

        let clipped = if config.use_boolean {
            match intersector.intersect(&geometry, input.mesh) {
                Ok(clipped) => Some(clipped),
                Err(e) => {
                    warn!("Cell {}: {}, using unclipped geometry", cells.len(), e);
                    None
                }
            }
        } else {
            None
        };

        let used = clipped.as_ref().unwrap_or(&geometry);
        let base = merged.append(used);
        for (i, &p) in used.positions.iter().enumerate() {
            cell.push_vertex(base + i as u32, p);
        }
        cell.cell_mesh = clipped;
        cells.push(cell);
    }

    if parser.truncated() {
        debug!("Solver output ended inside a cell");
    }
    if cells.is_empty() {
        warn!("Solver produced no cells for {} seeds, leaving mesh unfractured", seeds.len());
        return Ok(FractureBuild {
            requested: seeds.len(),
            ..FractureBuild::passthrough(input.mesh)
        });
    }

    let build = FractureBuild {
        mesh: merged,
        cells,
        requested: seeds.len(),
    };
    if build.missing() > 0 {
        warn!("{} cells missing", build.missing());
    }
    debug!(
        "Built {} cells, {} vertices, {} faces",
        build.cells.len(),
        build.mesh.vertex_count(),
        build.mesh.face_count()
    );

    Ok(build)
}

/// Centroid of a set of points, used by tests and simple solvers
pub fn centroid(points: &[Vec3]) -> Vec3 {
    if points.is_empty() {
        return Vec3::ZERO;
    }
    points.iter().copied().sum::<Vec3>() / points.len() as f32
}
