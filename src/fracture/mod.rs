//! Voronoi cell fracture pipeline
//!
//! seeds → solver → parse → (optional) boolean clip → merge, then per frame
//! bind → animate

pub mod binder;
pub mod boolean;
pub mod builder;
pub mod cache;
pub mod cell;
pub mod parse;
pub mod seeds;
pub mod solver;

pub use binder::{animate_cells, bind_cells};
#[cfg(feature = "boolean")]
pub use boolean::ParryIntersector;
pub use boolean::{default_intersector, MeshIntersector, NoIntersector};
pub use builder::{build_cells, container_bounds, BuildInput, FractureBuild};
pub use cache::{CacheKey, FractureCache};
pub use cell::{VoronoiCell, VoronoiCellSet};
pub use parse::{parse_cells, CellParser, RawCell};
pub use seeds::{gather_seeds, ChildObject, SeedSources};
pub use solver::{write_cell, VoronoiSolver};
