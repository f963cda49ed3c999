//! Demonstration of both fragmentation modes over a short animation

use std::io::{self, Write};

use particle_fracture::fracture::write_cell;
use particle_fracture::*;

/// Subdivided plane of `n` x `n` quads spanning the unit square
fn grid(n: u32) -> Mesh {
    let mut mesh = Mesh::new();
    for y in 0..=n {
        for x in 0..=n {
            mesh.add_vertex(Vec3::new(x as f32 / n as f32, y as f32 / n as f32, 0.0));
        }
    }
    let row = n + 1;
    for y in 0..n {
        for x in 0..n {
            let v = y * row + x;
            mesh.add_face(Face::quad(v, v + 1, v + row + 1, v + row));
        }
    }
    mesh
}

/// Particles scattered over the plane, all flying upwards from frame 0
fn particles(frame: f32) -> ParticleSystem {
    let seeds = [(0.2, 0.3), (0.7, 0.2), (0.5, 0.6), (0.15, 0.85), (0.85, 0.8)];
    let list = seeds
        .iter()
        .enumerate()
        .map(|(i, &(x, y))| {
            let mut p = Particle::resting(
                ParticleKey::at(Vec3::new(x, y, 0.0)),
                ParticleStatus::Alive,
                i as f32 * 2.0,
                40.0,
            );
            let t = (frame - p.birth_time).max(0.0);
            if t == 0.0 {
                p.status = ParticleStatus::Unborn;
            }
            p.state.position += Vec3::new(0.0, 0.0, 0.05 * t);
            p
        })
        .collect();
    ParticleSystem::new(list).with_seed(7)
}

/// Box-shaped cell around each seed; stands in for a real Voronoi solver
fn box_cells(_: &Aabb, _: usize, seeds: &[Vec3], out: &mut dyn Write) -> io::Result<()> {
    for &s in seeds {
        let h = 0.1;
        let corners: Vec<Vec3> = (0..8)
            .map(|c| {
                s + Vec3::new(
                    if c & 1 == 0 { -h } else { h },
                    if c & 2 == 0 { -h } else { h },
                    if c & 4 == 0 { -h } else { h },
                )
            })
            .collect();
        let faces = vec![
            vec![0, 2, 3, 1],
            vec![4, 5, 7, 6],
            vec![0, 1, 5, 4],
            vec![2, 6, 7, 3],
            vec![0, 4, 6, 2],
            vec![1, 3, 7, 5],
        ];
        write_cell(out, &corners, &faces, s)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let mesh = grid(8);
    println!("Source mesh: {} vertices, {} faces", mesh.vertex_count(), mesh.face_count());

    println!("\nFace explode with edge cut:");
    let config = ExplodeConfigBuilder::new()
        .mode(FractureMode::Faces)
        .edge_cut(true)
        .build()?;
    let mut modifier = ExplodeModifier::new(config);
    for frame in [0.0, 5.0, 20.0] {
        let psys = particles(frame);
        let out = modifier.apply(&mesh, &FrameContext::new(frame, Some(&psys)));
        let top = out.positions.iter().map(|p| p.z).fold(0.0f32, f32::max);
        println!(
            "  frame {:>4}: {} vertices, {} faces, highest fragment at z = {:.2}",
            frame,
            out.vertex_count(),
            out.face_count(),
            top
        );
    }

    println!("\nCell fracture:");
    let config = ExplodeConfigBuilder::new()
        .mode(FractureMode::Cells)
        .map_delay(0.0)?
        .build()?;
    let mut modifier = ExplodeModifier::new(config).with_solver(box_cells);
    for frame in [1.0, 10.0, 30.0] {
        let psys = particles(frame);
        let out = modifier.apply(&mesh, &FrameContext::new(frame, Some(&psys)));
        let bound = modifier
            .cells()
            .map_or(0, |cells| cells.iter().filter(|c| c.is_bound()).count());
        println!(
            "  frame {:>4}: {} vertices, {} bound cells, {} rebuilds",
            frame,
            out.vertex_count(),
            bound,
            modifier.rebuild_count()
        );
    }
    modifier.release();

    Ok(())
}
