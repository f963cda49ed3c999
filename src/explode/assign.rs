//! Face-to-particle assignment
//!
//! Every face is labelled with the particle nearest to its centroid, unless
//! one of its corners is protected by the protection vertex group.

use glam::{Mat4, Vec3};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::mesh::Mesh;
use crate::particles::ParticleSystem;
use crate::spatial::SpatialIndex;

/// Per-face particle labels
///
/// The label `particle_count` is the "unassigned" sentinel. Labels of
/// assigned faces are always `< particle_count`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceAssignment {
    labels: Vec<usize>,
    particle_count: usize,
}

impl FaceAssignment {
    /// All faces unassigned
    pub fn unassigned(face_count: usize, particle_count: usize) -> Self {
        Self {
            labels: vec![particle_count; face_count],
            particle_count,
        }
    }

    /// Wrap raw labels; anything `>= particle_count` becomes the sentinel
    pub fn from_labels(labels: Vec<usize>, particle_count: usize) -> Self {
        let labels = labels
            .into_iter()
            .map(|l| l.min(particle_count))
            .collect();
        Self {
            labels,
            particle_count,
        }
    }

    /// Number of labelled faces
    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Check if there are no labels
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Particle count the labels refer to (also the sentinel value)
    #[inline]
    pub fn particle_count(&self) -> usize {
        self.particle_count
    }

    /// Raw labels, sentinel included
    #[inline]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Particle of a face, `None` when unassigned
    #[inline]
    pub fn particle(&self, face: usize) -> Option<usize> {
        let label = self.labels[face];
        (label < self.particle_count).then_some(label)
    }

    /// Number of faces bound to a particle
    pub fn assigned_count(&self) -> usize {
        self.labels
            .iter()
            .filter(|&&l| l < self.particle_count)
            .count()
    }
}

/// Protection parameters for [`assign_faces`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Protection<'a> {
    /// Vertex group holding the deform weights
    pub group: Option<&'a str>,
    /// Blend factor in `[0, 1]`
    pub factor: f32,
}

/// Draw the stochastic protection mask for every vertex
///
/// One uniform value is drawn per vertex in vertex order from a generator
/// seeded with `seed`, so the mask is stable for a given particle system.
/// Without a (matching) group nothing is protected and no values are drawn.
pub fn protected_vertices(mesh: &Mesh, protection: Protection<'_>, seed: u64) -> Vec<bool> {
    let Some(group) = protection.group.and_then(|name| mesh.vertex_group(name)) else {
        return vec![false; mesh.vertex_count()];
    };

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let p = protection.factor;
    (0..mesh.vertex_count())
        .map(|v| {
            let value: f32 = rng.gen();
            let value = (1.0 - p) * value + p * 0.5;
            value < group.weight(v)
        })
        .collect()
}

/// Label each face with its nearest particle
///
/// Particles are indexed at their birth positions, brought into object space
/// with the inverse of `object_matrix`. Faces touching a protected vertex
/// stay unassigned.
pub fn assign_faces(
    mesh: &Mesh,
    particles: &ParticleSystem,
    object_matrix: &Mat4,
    protection: Protection<'_>,
) -> FaceAssignment {
    let particle_count = particles.len();
    let mut assignment = FaceAssignment::unassigned(mesh.face_count(), particle_count);

    let world_to_object = object_matrix.inverse();
    let births: Vec<Vec3> = particles
        .particles
        .iter()
        .map(|p| world_to_object.transform_point3(p.birth.position))
        .collect();

    let Some(index) = SpatialIndex::new(&births) else {
        return assignment;
    };

    let protected = protected_vertices(mesh, protection, particles.seed);

    for (i, face) in mesh.faces.iter().enumerate() {
        let nearest = index.find_nearest(mesh.face_center(i));
        if face.corners().iter().all(|&v| !protected[v as usize]) {
            assignment.labels[i] = nearest;
        }
    }

    debug!(
        "Assigned {} of {} faces to {} particles",
        assignment.assigned_count(),
        assignment.len(),
        particle_count
    );

    assignment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Face;
    use crate::particles::{Particle, ParticleKey, ParticleStatus};

    fn strip() -> Mesh {
        // two quads side by side along +x
        Mesh::from_parts(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(2.0, 1.0, 0.0),
            ],
            vec![Face::quad(0, 1, 4, 3), Face::quad(1, 2, 5, 4)],
        )
    }

    fn system(positions: &[Vec3]) -> ParticleSystem {
        ParticleSystem::new(
            positions
                .iter()
                .map(|&p| Particle::resting(ParticleKey::at(p), ParticleStatus::Alive, 0.0, 10.0))
                .collect(),
        )
    }

    #[test]
    fn test_nearest_particle_per_face() {
        let mesh = strip();
        let particles = system(&[Vec3::new(1.6, 0.5, 0.0), Vec3::new(0.4, 0.5, 0.0)]);

        let assignment = assign_faces(&mesh, &particles, &Mat4::IDENTITY, Protection::default());

        assert_eq!(assignment.labels(), &[1, 0]);
        assert_eq!(assignment.assigned_count(), 2);
    }

    #[test]
    fn test_object_matrix_applied_to_particles() {
        let mesh = strip();
        // particles given in world space, object translated by +10 on x
        let particles = system(&[Vec3::new(10.4, 0.5, 0.0), Vec3::new(11.6, 0.5, 0.0)]);
        let matrix = Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0));

        let assignment = assign_faces(&mesh, &particles, &matrix, Protection::default());

        assert_eq!(assignment.labels(), &[0, 1]);
    }

    #[test]
    fn test_fully_protected_faces_stay_unassigned() {
        let mut mesh = strip();
        let g = mesh.add_vertex_group("protect");
        // weight above any possible blended value protects vertex 0 for sure
        mesh.vertex_groups[g].weights[0] = 2.0;

        let particles = system(&[Vec3::new(0.5, 0.5, 0.0)]);
        let protection = Protection {
            group: Some("protect"),
            factor: 0.0,
        };

        let assignment = assign_faces(&mesh, &particles, &Mat4::IDENTITY, protection);

        assert_eq!(assignment.particle(0), None);
        assert_eq!(assignment.particle(1), Some(0));
        for &label in assignment.labels() {
            assert!(label <= assignment.particle_count());
        }
    }

    #[test]
    fn test_full_protection_factor_uses_half_threshold() {
        let mut mesh = strip();
        let g = mesh.add_vertex_group("protect");
        mesh.vertex_groups[g].weights = vec![0.6, 0.4, 0.4, 0.4, 0.4, 0.4];

        let protection = Protection {
            group: Some("protect"),
            factor: 1.0,
        };
        let mask = protected_vertices(&mesh, protection, 7);

        assert_eq!(mask, vec![true, false, false, false, false, false]);
    }

    #[test]
    fn test_protection_deterministic_per_seed() {
        let mut mesh = strip();
        let g = mesh.add_vertex_group("protect");
        mesh.vertex_groups[g].weights = vec![0.5; 6];
        let protection = Protection {
            group: Some("protect"),
            factor: 0.3,
        };

        assert_eq!(
            protected_vertices(&mesh, protection, 42),
            protected_vertices(&mesh, protection, 42)
        );
    }

    #[test]
    fn test_no_particles_leaves_everything_unassigned() {
        let mesh = strip();
        let assignment = assign_faces(&mesh, &ParticleSystem::default(), &Mat4::IDENTITY, Protection::default());
        assert_eq!(assignment.labels(), &[0, 0]);
        assert_eq!(assignment.assigned_count(), 0);
    }

    #[test]
    fn test_from_labels_clamps_to_sentinel() {
        let assignment = FaceAssignment::from_labels(vec![0, 5, 2], 3);
        assert_eq!(assignment.labels(), &[0, 3, 2]);
        assert_eq!(assignment.particle(1), None);
    }
}
