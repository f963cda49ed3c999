//! Particle-driven mesh explosion and Voronoi cell fracture
//!
//! A standalone library that breaks a mesh into fragments following a
//! particle simulation, suitable for use as a per-frame modifier in any
//! host (game engine, DCC tool, offline renderer).
//!
//! Two modes are available:
//!
//! - **Faces**: every face follows its nearest particle. Optionally, faces
//!   straddling two particles are subdivided along edge midpoints first.
//! - **Cells**: the volume is partitioned into Voronoi cells by an external
//!   solver, each cell optionally clipped against the source mesh, and cells
//!   then move rigidly with the particle they bind to.
//!
//! # Quick Start
//!
//! ```rust
//! use particle_fracture::*;
//!
//! let mesh = Mesh::from_parts(
//!     vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y],
//!     vec![Face::quad(0, 1, 2, 3)],
//! );
//!
//! let mut particle = Particle::resting(
//!     ParticleKey::at(Vec3::new(0.5, 0.5, 0.0)),
//!     ParticleStatus::Alive,
//!     0.0,
//!     50.0,
//! );
//! particle.state.position.z = 2.0;
//! let particles = ParticleSystem::new(vec![particle]);
//!
//! let config = ExplodeConfigBuilder::new()
//!     .mode(FractureMode::Faces)
//!     .edge_cut(true)
//!     .build()
//!     .unwrap();
//!
//! let mut modifier = ExplodeModifier::new(config);
//! let exploded = modifier.apply(&mesh, &FrameContext::new(10.0, Some(&particles)));
//!
//! assert!(exploded.positions.iter().all(|p| (p.z - 2.0).abs() < 1e-5));
//! ```
//!
//! # Features
//!
//! - `boolean` (default): clips Voronoi cells against the source mesh with parry3d
//! - `serde`: enables serialization support for configuration and particle data

// Modules
pub mod config;
pub mod error;
pub mod explode;
pub mod fracture;
pub mod mesh;
pub mod modifier;
pub mod particles;
pub mod spatial;

// Re-export core types for convenience
pub use config::{ExplodeConfig, ExplodeConfigBuilder, ExplodeFlags, FractureMode, PointSource};
pub use error::{FractureError, Result};
pub use explode::{assign_faces, explode_faces, split_edges, FaceAssignment, Protection};
pub use fracture::{
    build_cells, CellParser, ChildObject, MeshIntersector, NoIntersector, SeedSources,
    VoronoiCell, VoronoiCellSet, VoronoiSolver,
};
pub use mesh::{Aabb, Face, Mesh, UvLayer, VertexGroup};
pub use modifier::{ExplodeModifier, FrameContext};
pub use particles::{Particle, ParticleKey, ParticleStatus, ParticleSystem};
pub use spatial::SpatialIndex;

#[cfg(feature = "boolean")]
pub use fracture::ParryIntersector;

// Re-export glam types used in the public API
pub use glam::{Mat4, Quat, Vec2, Vec3};
