//! Explode displacer
//!
//! Duplicates every vertex once per particle bucket it is used in and moves
//! the copies rigidly with their particle.

use std::collections::HashMap;

use glam::{Mat4, Vec2, Vec3};
use tracing::debug;

use super::assign::FaceAssignment;
use crate::config::{ExplodeConfig, ExplodeFlags};
use crate::mesh::Mesh;
use crate::particles::{Particle, ParticleStatus, ParticleSystem};

/// Whether faces of a particle in `status` are kept under `flags`
///
/// Dying particles are always shown.
pub fn is_visible(status: ParticleStatus, flags: ExplodeFlags) -> bool {
    match status {
        ParticleStatus::Unborn => flags.contains(ExplodeFlags::UNBORN),
        ParticleStatus::Alive => flags.contains(ExplodeFlags::ALIVE),
        ParticleStatus::Dead => flags.contains(ExplodeFlags::DEAD),
        ParticleStatus::Dying => true,
    }
}

/// Move an object-space point rigidly with a particle
///
/// The point is taken to world space, expressed relative to the particle's
/// birth position, rotated by the birth-to-current orientation change,
/// optionally scaled by the particle size, placed at the current position,
/// and brought back to object space.
pub fn displace_point(
    point: Vec3,
    particle: &Particle,
    object_matrix: &Mat4,
    world_to_object: &Mat4,
    rotate: bool,
    scale: bool,
) -> Vec3 {
    let mut co = object_matrix.transform_point3(point) - particle.birth.position;
    if rotate {
        co = particle.rotation_delta() * co;
    }
    if scale {
        co *= particle.size;
    }
    world_to_object.transform_point3(co + particle.state.position)
}

/// Produce the exploded mesh for `frame`
///
/// Faces whose particle is hidden by the visibility flags are dropped.
/// Faces of particles not yet emitted at `frame` share the unassigned
/// bucket and stay attached to the emitter. If `config.age_uv_layer` names
/// an existing layer, every assigned face gets `(age, 0.5)` on all corners.
pub fn explode_mesh(
    mesh: &Mesh,
    assignment: &FaceAssignment,
    particles: &ParticleSystem,
    frame: f32,
    object_matrix: &Mat4,
    config: &ExplodeConfig,
) -> Mesh {
    let unassigned = particles.len();
    let particle_of = |face: usize| {
        assignment
            .particle(face)
            .and_then(|p| particles.get(p).map(|pa| (p, pa)))
    };

    // (face, bucket) for every face that survives the visibility filter
    let mut kept = Vec::with_capacity(mesh.face_count());
    for face in 0..mesh.face_count() {
        let bucket = match particle_of(face) {
            Some((_, pa)) if !is_visible(pa.status, config.flags) => continue,
            Some((p, pa)) if frame >= pa.birth_time => p,
            _ => unassigned,
        };
        kept.push((face, bucket));
    }

    let mut out = mesh.template();
    let mut duplicates: HashMap<(u32, usize), u32> = HashMap::new();
    let world_to_object = object_matrix.inverse();
    let scale = config.flags.contains(ExplodeFlags::PARTICLE_SIZE);

    for &(face, bucket) in &kept {
        let mut source = mesh.faces[face];
        let n = source.corner_count();
        for v in &mut source.verts[..n] {
            let original = *v;
            *v = *duplicates.entry((original, bucket)).or_insert_with(|| {
                let index = out.copy_vertex(mesh, original as usize);
                if let Some(pa) = particles.get(bucket) {
                    let p = &mut out.positions[index as usize];
                    *p = displace_point(*p, pa, object_matrix, &world_to_object, true, scale);
                }
                index
            });
        }
        out.copy_face(mesh, face, source);
    }

    if let Some(layer) = config
        .age_uv_layer
        .as_deref()
        .and_then(|name| out.uv_layer_index(name))
    {
        for (u, &(face, _)) in kept.iter().enumerate() {
            if let Some((_, pa)) = particle_of(face) {
                out.uv_layers[layer].uvs[u] = [Vec2::new(pa.age(frame), 0.5); 4];
            }
        }
    }

    debug!(
        "Exploded {} faces into {} vertices ({} faces hidden)",
        out.face_count(),
        out.vertex_count(),
        mesh.face_count() - kept.len()
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExplodeConfigBuilder;
    use crate::mesh::Face;
    use crate::particles::ParticleKey;
    use glam::Quat;

    fn strip() -> Mesh {
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

    fn particle_at(p: Vec3, status: ParticleStatus) -> Particle {
        Particle::resting(ParticleKey::at(p), status, 0.0, 10.0)
    }

    #[test]
    fn test_resting_particles_are_identity() {
        let mesh = strip();
        let rot = Quat::from_rotation_z(0.4);
        let mut a = particle_at(Vec3::new(0.5, 0.5, 0.0), ParticleStatus::Alive);
        a.birth.rotation = rot;
        a.state.rotation = rot;
        let particles = ParticleSystem::new(vec![a, particle_at(Vec3::new(1.5, 0.5, 0.0), ParticleStatus::Alive)]);
        let assignment = FaceAssignment::from_labels(vec![0, 1], 2);
        let matrix = Mat4::from_scale_rotation_translation(Vec3::splat(2.0), Quat::from_rotation_x(0.3), Vec3::new(1.0, 2.0, 3.0));

        let out = explode_mesh(&mesh, &assignment, &particles, 5.0, &matrix, &ExplodeConfig::default());

        // the shared edge is duplicated once per particle
        assert_eq!(out.vertex_count(), 8);
        assert_eq!(out.face_count(), 2);
        for (face_out, face_in) in out.faces.iter().zip(&mesh.faces) {
            for (&vo, &vi) in face_out.corners().iter().zip(face_in.corners()) {
                let d = out.positions[vo as usize] - mesh.positions[vi as usize];
                assert!(d.length() < 1e-4);
            }
        }
    }

    #[test]
    fn test_translation_moves_fragment() {
        let mesh = strip();
        let mut a = particle_at(Vec3::new(0.5, 0.5, 0.0), ParticleStatus::Alive);
        a.state.position += Vec3::new(0.0, 0.0, 3.0);
        let b = particle_at(Vec3::new(1.5, 0.5, 0.0), ParticleStatus::Alive);
        let particles = ParticleSystem::new(vec![a, b]);
        let assignment = FaceAssignment::from_labels(vec![0, 1], 2);

        let out = explode_mesh(&mesh, &assignment, &particles, 5.0, &Mat4::IDENTITY, &ExplodeConfig::default());

        for &v in out.faces[0].corners() {
            assert!((out.positions[v as usize].z - 3.0).abs() < 1e-6);
        }
        for &v in out.faces[1].corners() {
            assert_eq!(out.positions[v as usize].z, 0.0);
        }
    }

    #[test]
    fn test_unborn_faces_stay_attached() {
        let mesh = strip();
        let mut a = particle_at(Vec3::new(0.5, 0.5, 0.0), ParticleStatus::Unborn);
        a.birth_time = 20.0;
        a.state.position += Vec3::new(0.0, 0.0, 3.0);
        let particles = ParticleSystem::new(vec![a]);
        let assignment = FaceAssignment::from_labels(vec![0, 1], 1);

        let out = explode_mesh(&mesh, &assignment, &particles, 5.0, &Mat4::IDENTITY, &ExplodeConfig::default());

        // face 0 waits for its particle, face 1 is unassigned: one shared bucket
        assert_eq!(out.vertex_count(), 6);
        assert!(out.positions.iter().all(|p| p.z == 0.0));
    }

    #[test]
    fn test_visibility_flags_drop_faces() {
        let mesh = strip();
        let particles = ParticleSystem::new(vec![
            particle_at(Vec3::ZERO, ParticleStatus::Dead),
            particle_at(Vec3::X, ParticleStatus::Dying),
        ]);
        let assignment = FaceAssignment::from_labels(vec![0, 1], 2);
        let config = ExplodeConfigBuilder::new()
            .flags(ExplodeFlags::UNBORN | ExplodeFlags::ALIVE)
            .build()
            .unwrap();

        let out = explode_mesh(&mesh, &assignment, &particles, 5.0, &Mat4::IDENTITY, &config);

        assert_eq!(out.face_count(), 1);
        assert_eq!(out.vertex_count(), 4);
        assert!(out.validate().is_ok());
    }

    #[test]
    fn test_particle_size_scales_about_birth() {
        let mesh = strip();
        let mut a = particle_at(Vec3::new(1.0, 0.0, 0.0), ParticleStatus::Alive);
        a.size = 2.0;
        let particles = ParticleSystem::new(vec![a]);
        let assignment = FaceAssignment::from_labels(vec![0, 0], 1);
        let config = ExplodeConfigBuilder::new()
            .flags(ExplodeFlags::default() | ExplodeFlags::PARTICLE_SIZE)
            .build()
            .unwrap();

        let out = explode_mesh(&mesh, &assignment, &particles, 5.0, &Mat4::IDENTITY, &config);

        assert!(out.positions.contains(&Vec3::new(-1.0, 0.0, 0.0)));
        assert!(out.positions.contains(&Vec3::new(3.0, 0.0, 0.0)));
    }

    #[test]
    fn test_age_uv_written_for_assigned_faces() {
        let mut mesh = strip();
        let layer = mesh.add_uv_layer("age");
        mesh.uv_layers[layer].uvs[1] = [Vec2::ONE; 4];
        let particles = ParticleSystem::new(vec![particle_at(Vec3::ZERO, ParticleStatus::Alive)]);
        let assignment = FaceAssignment::from_labels(vec![0, 1], 1);
        let config = ExplodeConfigBuilder::new().age_uv_layer("age").build().unwrap();

        let out = explode_mesh(&mesh, &assignment, &particles, 5.0, &Mat4::IDENTITY, &config);

        assert_eq!(out.uv_layers[0].uvs[0], [Vec2::new(0.5, 0.5); 4]);
        assert_eq!(out.uv_layers[0].uvs[1], [Vec2::ONE; 4]);
    }

    #[test]
    fn test_rotation_about_birth_position() {
        let mesh = Mesh::from_parts(
            vec![Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 0.0)],
            vec![Face::tri(0, 1, 2)],
        );
        let mut a = particle_at(Vec3::new(1.0, 0.0, 0.0), ParticleStatus::Alive);
        a.state.rotation = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let particles = ParticleSystem::new(vec![a]);
        let assignment = FaceAssignment::from_labels(vec![0], 1);

        let out = explode_mesh(&mesh, &assignment, &particles, 5.0, &Mat4::IDENTITY, &ExplodeConfig::default());

        let v = out.faces[0].verts[1] as usize;
        assert!((out.positions[v] - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-5);
    }
}
