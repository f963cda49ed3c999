//! Seed point gathering for the Voronoi solver

use glam::{Mat4, Vec3};

use crate::config::PointSource;
use crate::mesh::Mesh;
use crate::particles::ParticleSystem;

/// An object parented (directly or indirectly) to the fractured object
#[derive(Debug, Clone, Default)]
pub struct ChildObject {
    /// Object-to-world matrix
    pub transform: Mat4,
    /// Mesh data, if the child is a mesh object
    pub mesh: Option<Mesh>,
    /// Particle systems on the child
    pub particles: Vec<ParticleSystem>,
}

/// Scene data besides the object itself that can provide seed points
#[derive(Debug, Clone, Default)]
pub struct SeedSources {
    /// Child hierarchy of the fractured object
    pub children: Vec<ChildObject>,
    /// Annotation strokes on the object, world-space points per stroke
    pub strokes: Vec<Vec<Vec3>>,
}

impl SeedSources {
    /// No extra sources
    pub fn none() -> Self {
        Self::default()
    }
}

fn mesh_points(mesh: &Mesh, transform: &Mat4, seeds: &mut Vec<Vec3>) {
    seeds.extend(mesh.positions.iter().map(|&p| transform.transform_point3(p)));
}

/// Collect world-space seed points in source order
///
/// Order: own particles, child particles, child vertices, stroke points,
/// own vertices. Own particles contribute their current positions when
/// `refracture` is set and their birth positions otherwise; child particles
/// always contribute birth positions.
pub fn gather_seeds(
    source: PointSource,
    refracture: bool,
    mesh: &Mesh,
    object_matrix: &Mat4,
    particles: Option<&ParticleSystem>,
    sources: &SeedSources,
) -> Vec<Vec3> {
    let mut seeds = Vec::new();

    if source.contains(PointSource::OWN_PARTICLES) {
        if let Some(psys) = particles {
            if refracture {
                seeds.extend(psys.current_positions());
            } else {
                seeds.extend(psys.birth_positions());
            }
        }
    }

    if source.contains(PointSource::CHILD_PARTICLES) {
        for child in &sources.children {
            for psys in &child.particles {
                seeds.extend(psys.birth_positions());
            }
        }
    }

    if source.contains(PointSource::CHILD_VERTS) {
        for child in &sources.children {
            if let Some(child_mesh) = &child.mesh {
                mesh_points(child_mesh, &child.transform, &mut seeds);
            }
        }
    }

    if source.contains(PointSource::STROKES) {
        for stroke in &sources.strokes {
            seeds.extend_from_slice(stroke);
        }
    }

    if source.contains(PointSource::OWN_VERTS) {
        mesh_points(mesh, object_matrix, &mut seeds);
    }

    seeds
}
