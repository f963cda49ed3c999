//! End-to-end behaviour of both fragmentation modes through the public API

use std::io::{self, Write};

use particle_fracture::fracture::{write_cell, BuildInput};
use particle_fracture::*;

fn unit_quad() -> Mesh {
    Mesh::from_parts(
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ],
        vec![Face::quad(0, 1, 2, 3)],
    )
}

fn resting(at: Vec3, status: ParticleStatus) -> Particle {
    Particle::resting(ParticleKey::at(at), status, 0.0, 100.0)
}

/// Unit quad with an outward triangle at every corner and one particle
/// sitting on each triangle, so every quad corner belongs to a different
/// particle
fn quad_with_corner_claims() -> (Mesh, ParticleSystem) {
    let mut mesh = unit_quad();
    let mut particles = Vec::new();
    for v in 0..4u32 {
        let p = mesh.positions[v as usize];
        let d = p * 2.0 - Vec3::new(1.0, 1.0, 0.0);
        let a = mesh.add_vertex(p + Vec3::new(d.x, 0.0, 0.0));
        let b = mesh.add_vertex(p + Vec3::new(0.0, d.y, 0.0));
        mesh.add_face(Face::tri(v, a, b));
        particles.push(resting(p + Vec3::new(d.x, d.y, 0.0) * 0.3, ParticleStatus::Alive));
    }
    (mesh, ParticleSystem::new(particles))
}

/// One small triangle cell per seed, centred on the seed
fn triangle_cells(_: &Aabb, _: usize, seeds: &[Vec3], out: &mut dyn Write) -> io::Result<()> {
    for &s in seeds {
        let verts = [s, s + Vec3::X * 0.1, s + Vec3::Y * 0.1];
        write_cell(out, &verts, &[vec![0, 1, 2]], s)?;
    }
    Ok(())
}

#[test]
fn test_assignment_labels_are_particles_or_sentinel() {
    let (mesh, particles) = quad_with_corner_claims();
    let assignment = assign_faces(&mesh, &particles, &Mat4::IDENTITY, Protection::default());

    assert_eq!(assignment.len(), mesh.face_count());
    assert!(assignment.labels().iter().all(|&l| l <= particles.len()));
    assert_eq!(&assignment.labels()[1..], &[0, 1, 2, 3]);
}

#[test]
fn test_quad_with_four_owners_splits_into_four() {
    let (mesh, particles) = quad_with_corner_claims();
    let assignment = assign_faces(&mesh, &particles, &Mat4::IDENTITY, Protection::default());

    let split = split_edges(&mesh, &assignment);

    // four edge midpoints plus the center
    assert_eq!(split.split_edges, 5);
    assert_eq!(split.mesh.vertex_count(), mesh.vertex_count() + 5);
    assert_eq!(split.extra_faces, split.mesh.face_count() - mesh.face_count());
    // the quad became four faces, the corner triangles stayed whole
    assert_eq!(split.mesh.face_count(), 4 + 4);
    assert!(split.mesh.validate().is_ok());
}

#[test]
fn test_edge_cut_explode_keeps_every_fragment() {
    let (mesh, particles) = quad_with_corner_claims();
    let config = ExplodeConfigBuilder::new().edge_cut(true).build().unwrap();
    let mut modifier = ExplodeModifier::new(config);

    let out = modifier.apply(&mesh, &FrameContext::new(5.0, Some(&particles)));

    assert_eq!(out.face_count(), 8);
    assert!(out.validate().is_ok());
}

#[test]
fn test_resting_particles_leave_mesh_in_place() {
    let (mesh, particles) = quad_with_corner_claims();
    let matrix = Mat4::from_scale_rotation_translation(
        Vec3::splat(2.0),
        Quat::from_rotation_y(0.7),
        Vec3::new(3.0, -1.0, 4.0),
    );
    // particles live in world space
    let world = ParticleSystem::new(
        particles
            .particles
            .iter()
            .map(|p| resting(matrix.transform_point3(p.birth.position), p.status))
            .collect(),
    );
    let mut modifier = ExplodeModifier::new(ExplodeConfig::default());

    let out = modifier.apply(&mesh, &FrameContext::new(5.0, Some(&world)).with_object_matrix(matrix));

    assert_eq!(out.face_count(), mesh.face_count());
    for (face, original) in out.faces.iter().zip(&mesh.faces) {
        for (&a, &b) in face.corners().iter().zip(original.corners()) {
            let moved = out.positions[a as usize];
            assert!((moved - mesh.positions[b as usize]).length() < 1e-4);
        }
    }
}

#[test]
fn test_all_unborn_hidden_gives_no_faces() {
    let (mesh, particles) = quad_with_corner_claims();
    let unborn = ParticleSystem::new(
        particles
            .particles
            .iter()
            .map(|p| resting(p.birth.position, ParticleStatus::Unborn))
            .collect(),
    );
    let config = ExplodeConfigBuilder::new()
        .flags(ExplodeFlags::ALIVE | ExplodeFlags::DEAD)
        .build()
        .unwrap();
    let mut modifier = ExplodeModifier::new(config);

    let out = modifier.apply(&mesh, &FrameContext::new(0.0, Some(&unborn)));

    // the quad's own particle is unborn as well
    assert_eq!(out.face_count(), 0);
}

#[test]
fn test_zero_seeds_builds_no_cells() {
    let mesh = unit_quad();
    let sources = SeedSources::none();
    let input = BuildInput {
        mesh: &mesh,
        object_matrix: &Mat4::IDENTITY,
        particles: None,
        sources: &sources,
    };

    let build = build_cells(input, &ExplodeConfig::default(), &triangle_cells, &NoIntersector).unwrap();

    assert_eq!(build.cells.len(), 0);
    assert_eq!(build.mesh, mesh);
}

#[test]
fn test_cell_vertex_ownership_is_a_partition() {
    let mesh = unit_quad();
    let particles = ParticleSystem::new(
        (0..5)
            .map(|i| resting(Vec3::new(i as f32, 0.0, 0.0), ParticleStatus::Alive))
            .collect(),
    );
    let sources = SeedSources::none();
    let input = BuildInput {
        mesh: &mesh,
        object_matrix: &Mat4::IDENTITY,
        particles: Some(&particles),
        sources: &sources,
    };

    let build = build_cells(input, &ExplodeConfig::default(), &triangle_cells, &NoIntersector).unwrap();

    let mut owned: Vec<u32> = build.cells.iter().flat_map(|c| c.vertices().to_vec()).collect();
    owned.sort_unstable();
    owned.dedup();
    assert_eq!(build.cells.total_vertex_count(), owned.len());
    assert_eq!(owned.len(), build.mesh.vertex_count());
}

#[test]
fn test_unchanged_key_reuses_cells() {
    let config = ExplodeConfigBuilder::new().mode(FractureMode::Cells).build().unwrap();
    let mut modifier = ExplodeModifier::new(config).with_solver(triangle_cells);
    let particles = ParticleSystem::new(vec![
        resting(Vec3::ZERO, ParticleStatus::Alive),
        resting(Vec3::ONE, ParticleStatus::Alive),
    ]);

    for frame in 1..5 {
        modifier.apply(&unit_quad(), &FrameContext::new(frame as f32, Some(&particles)));
    }

    assert_eq!(modifier.rebuild_count(), 1);
    assert_eq!(modifier.cells().map(|c| c.len()), Some(2));
}

#[test]
fn test_moving_particle_moves_only_its_cell() {
    let config = ExplodeConfigBuilder::new().mode(FractureMode::Cells).build().unwrap();
    let mut modifier = ExplodeModifier::new(config).with_solver(triangle_cells);
    let mut particles = ParticleSystem::new(vec![
        resting(Vec3::ZERO, ParticleStatus::Alive),
        resting(Vec3::new(5.0, 0.0, 0.0), ParticleStatus::Alive),
    ]);

    let rest = modifier.apply(&unit_quad(), &FrameContext::new(2.0, Some(&particles)));
    assert!(modifier.cells().unwrap().iter().all(|c| c.is_bound()));

    particles.particles[0].state.position = Vec3::new(0.0, 0.0, 3.0);
    let moved = modifier.apply(&unit_quad(), &FrameContext::new(3.0, Some(&particles)));

    let cells = modifier.cells().unwrap();
    let first = cells.get(0).unwrap();
    let second = cells.get(1).unwrap();
    assert_eq!(first.particle, Some(0));
    for &v in first.vertices() {
        let delta = moved.positions[v as usize] - rest.positions[v as usize];
        assert!((delta - Vec3::new(0.0, 0.0, 3.0)).length() < 1e-5);
    }
    for &v in second.vertices() {
        assert_eq!(moved.positions[v as usize], rest.positions[v as usize]);
    }
    assert_eq!(modifier.rebuild_count(), 1);
}

/// Closed unit cube, outward winding
#[cfg(feature = "boolean")]
fn unit_cube() -> Mesh {
    let positions = (0..8)
        .map(|i| Vec3::new((i & 1) as f32, ((i >> 1) & 1) as f32, ((i >> 2) & 1) as f32))
        .collect();
    Mesh::from_parts(
        positions,
        vec![
            Face::quad(0, 2, 3, 1),
            Face::quad(4, 5, 7, 6),
            Face::quad(0, 1, 5, 4),
            Face::quad(2, 6, 7, 3),
            Face::quad(0, 4, 6, 2),
            Face::quad(1, 3, 7, 5),
        ],
    )
}

/// Box of half-size 0.3 around every seed
#[cfg(feature = "boolean")]
fn box_cells(_: &Aabb, _: usize, seeds: &[Vec3], out: &mut dyn Write) -> io::Result<()> {
    let faces = [
        vec![0, 2, 3, 1],
        vec![4, 5, 7, 6],
        vec![0, 1, 5, 4],
        vec![2, 6, 7, 3],
        vec![0, 4, 6, 2],
        vec![1, 3, 7, 5],
    ];
    for &s in seeds {
        let corners: Vec<Vec3> = (0..8)
            .map(|c| {
                s + Vec3::new(
                    if c & 1 == 0 { -0.3 } else { 0.3 },
                    if c & 2 == 0 { -0.3 } else { 0.3 },
                    if c & 4 == 0 { -0.3 } else { 0.3 },
                )
            })
            .collect();
        write_cell(out, &corners, &faces, s)?;
    }
    Ok(())
}

#[cfg(feature = "boolean")]
#[test]
fn test_boolean_cells_are_clipped_to_source() {
    let mut mesh = unit_cube();
    for face in &mut mesh.faces {
        face.material = 1;
    }
    let config = ExplodeConfigBuilder::new()
        .mode(FractureMode::Cells)
        .use_boolean(true)
        .inner_material(4)
        .build()
        .unwrap();
    let mut modifier = ExplodeModifier::new(config)
        .with_solver(box_cells)
        .with_intersector(ParryIntersector);
    // seeds near opposite faces, so each box pokes out of the cube once
    let particles = ParticleSystem::new(vec![
        resting(Vec3::new(0.1, 0.45, 0.55), ParticleStatus::Alive),
        resting(Vec3::new(0.9, 0.55, 0.45), ParticleStatus::Alive),
    ]);

    let out = modifier
        .try_apply(&mesh, &FrameContext::new(1.0, Some(&particles)))
        .unwrap();

    let cells = modifier.cells().unwrap();
    assert_eq!(cells.len(), 2);
    assert!(cells.iter().all(|c| c.cell_mesh.is_some()));
    assert!(out.validate().is_ok());
    for p in &out.positions {
        assert!(p.cmpge(Vec3::splat(-1e-4)).all() && p.cmple(Vec3::splat(1.0 + 1e-4)).all());
    }
    assert!(out.faces.iter().any(|f| f.material == 1));
    assert!(out.faces.iter().any(|f| f.material == 4));
}
