//! Versioned fracture cache
//!
//! A built fracture is reused across frames for as long as its key stays
//! the same. Every rebuild bumps the generation counter.

use tracing::info;

use super::builder::FractureBuild;
use super::cell::VoronoiCellSet;
use crate::config::{ExplodeConfig, PointSource};
use crate::mesh::Mesh;
use crate::particles::ParticleSystem;

/// Inputs that invalidate a built fracture when they change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub particle_count: usize,
    pub use_boolean: bool,
    pub flip_normal: bool,
    pub point_source: PointSource,
    pub use_cache: bool,
}

impl CacheKey {
    /// Key for the current frame's inputs
    pub fn new(particles: Option<&ParticleSystem>, config: &ExplodeConfig) -> Self {
        Self {
            particle_count: particles.map_or(0, |p| p.len()),
            use_boolean: config.use_boolean,
            flip_normal: config.flip_normal,
            point_source: config.point_source,
            use_cache: config.use_cache,
        }
    }
}

/// A built fracture together with the key it was built for
#[derive(Debug, Clone)]
pub struct FractureCache {
    key: CacheKey,
    generation: u64,
    /// Merged cell geometry, at rest
    pub mesh: Mesh,
    /// Cells owning the vertices of `mesh`
    pub cells: VoronoiCellSet,
}

impl FractureCache {
    /// Wrap a fresh build
    ///
    /// `previous` is the generation of the cache being replaced, if any.
    pub fn new(key: CacheKey, build: FractureBuild, previous: Option<u64>) -> Self {
        let generation = previous.map_or(1, |g| g + 1);
        info!(
            "Fracture cache rebuilt (generation {}, {} cells)",
            generation,
            build.cells.len()
        );
        Self {
            key,
            generation,
            mesh: build.mesh,
            cells: build.cells,
        }
    }

    /// Key the cache was built for
    #[inline]
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Rebuild counter, starting at 1
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the cached fracture can serve a frame with `key`
    ///
    /// Never true with caching disabled. A build without cells is cached like
    /// any other so a solver yielding nothing is not rerun every frame.
    pub fn is_valid_for(&self, key: &CacheKey) -> bool {
        key.use_cache && self.key == *key
    }
}
