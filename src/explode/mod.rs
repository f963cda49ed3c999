//! Face-explode pipeline
//!
//! assignment → (optional) edge split → displacement

pub mod assign;
pub mod displace;
pub mod split;

pub use assign::{assign_faces, protected_vertices, FaceAssignment, Protection};
pub use displace::{displace_point, explode_mesh, is_visible};
pub use split::{split_edges, vertex_labels, EdgeSplitCase, SplitMesh, EXTRA_FACES};

use glam::Mat4;

use crate::config::{ExplodeConfig, ExplodeFlags};
use crate::mesh::Mesh;
use crate::particles::ParticleSystem;

/// Explode `mesh` for one frame using a precomputed face assignment
///
/// With [`ExplodeFlags::EDGE_CUT`] the mesh is first subdivided along
/// particle boundaries.
pub fn explode_faces(
    mesh: &Mesh,
    assignment: &FaceAssignment,
    particles: &ParticleSystem,
    frame: f32,
    object_matrix: &Mat4,
    config: &ExplodeConfig,
) -> Mesh {
    if config.flags.contains(ExplodeFlags::EDGE_CUT) {
        let split = split_edges(mesh, assignment);
        explode_mesh(&split.mesh, &split.assignment, particles, frame, object_matrix, config)
    } else {
        explode_mesh(mesh, assignment, particles, frame, object_matrix, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExplodeConfigBuilder;
    use crate::mesh::Face;
    use crate::particles::{Particle, ParticleKey, ParticleStatus};
    use glam::Vec3;

    #[test]
    fn test_edge_cut_separates_fragments() {
        let mesh = Mesh::from_parts(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(2.0, 1.0, 0.0),
            ],
            vec![Face::quad(0, 1, 4, 3), Face::quad(1, 2, 5, 4)],
        );
        let mut moving = Particle::resting(
            ParticleKey::at(Vec3::new(0.5, 0.5, 0.0)),
            ParticleStatus::Alive,
            0.0,
            10.0,
        );
        moving.state.position.z = 1.0;
        let still = Particle::resting(
            ParticleKey::at(Vec3::new(1.5, 0.5, 0.0)),
            ParticleStatus::Alive,
            0.0,
            10.0,
        );
        let particles = ParticleSystem::new(vec![moving, still]);
        let assignment = assign_faces(&mesh, &particles, &Mat4::IDENTITY, Protection::default());

        let plain = ExplodeConfig::default();
        let cut = ExplodeConfigBuilder::new().edge_cut(true).build().unwrap();

        let a = explode_faces(&mesh, &assignment, &particles, 1.0, &Mat4::IDENTITY, &plain);
        let b = explode_faces(&mesh, &assignment, &particles, 1.0, &Mat4::IDENTITY, &cut);

        assert_eq!(a.face_count(), 2);
        assert!(b.face_count() > a.face_count());
        assert!(b.validate().is_ok());
    }
}
