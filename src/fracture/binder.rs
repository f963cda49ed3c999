//! Cell to particle binding and per-frame cell animation

use glam::Mat4;
use tracing::debug;

use super::cell::VoronoiCellSet;
use crate::mesh::Mesh;
use crate::particles::ParticleSystem;
use crate::spatial::SpatialIndex;

/// Bind cells to the particle nearest to their centroid
///
/// Particles are located by birth position. In continuous mode every cell is
/// rebound each call and only keeps a binding to an emitted particle. Otherwise
/// bindings are sticky: unbound cells bind to the nearest emitted particle
/// once `frame` passes `start_frame + map_delay`, and keep that particle for
/// good.
///
/// Returns the number of bound cells.
pub fn bind_cells(
    cells: &mut VoronoiCellSet,
    particles: &ParticleSystem,
    frame: f32,
    object_matrix: &Mat4,
    continuous: bool,
    map_delay: f32,
) -> usize {
    if continuous {
        if let Some(index) = SpatialIndex::new(&particles.birth_positions()) {
            for cell in cells.iter_mut() {
                let nearest = index.find_nearest(object_matrix.transform_point3(cell.centroid));
                cell.particle = particles
                    .get(nearest)
                    .filter(|p| p.status.is_born())
                    .map(|_| nearest);
            }
        }
    } else if frame > particles.start_frame + map_delay {
        let born = particles
            .particles
            .iter()
            .enumerate()
            .filter(|(_, p)| p.status.is_born())
            .map(|(i, p)| (i, p.birth.position));
        if let Some(index) = SpatialIndex::from_entries(born) {
            for cell in cells.iter_mut().filter(|c| !c.is_bound()) {
                cell.particle = Some(index.find_nearest(object_matrix.transform_point3(cell.centroid)));
            }
        }
    }

    let bound = cells.iter().filter(|c| c.is_bound()).count();
    debug!("{} of {} cells bound at frame {}", bound, cells.len(), frame);
    bound
}

/// Move every bound cell rigidly with its particle
///
/// Each vertex is first reset to its rest position. Bound cells are then
/// carried by the particle's displacement since birth, and rotated by its
/// rotation since birth when the system integrates rotation. Cells bound to
/// an unborn particle stay at rest unless `continuous` is set.
pub fn animate_cells(
    cells: &VoronoiCellSet,
    mesh: &mut Mesh,
    particles: &ParticleSystem,
    object_matrix: &Mat4,
    continuous: bool,
) {
    let world_to_object = object_matrix.inverse();

    for cell in cells {
        for (v, rest) in cell.rest_vertices() {
            if let Some(slot) = mesh.positions.get_mut(v as usize) {
                *slot = rest;
            }
        }

        let Some(p) = cell.particle.and_then(|id| particles.get(id)) else {
            continue;
        };
        if !continuous && !p.status.is_born() {
            continue;
        }

        let rotation = p.rotation_delta();
        for (v, rest) in cell.rest_vertices() {
            let mut co = object_matrix.transform_point3(rest) - p.birth.position;
            if particles.rotations {
                co = rotation * co;
            }
            co += p.state.position;
            if let Some(slot) = mesh.positions.get_mut(v as usize) {
                *slot = world_to_object.transform_point3(co);
            }
        }
    }
}
