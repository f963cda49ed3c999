//! Explode / fracture configuration and builder
//!
//! This module provides the configuration types controlling both the
//! face-explode and the cell-fracture transforms.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{FractureError, Result};

/// Which fragmentation algorithm the modifier runs
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FractureMode {
    /// Every face follows its nearest particle (optionally edge-split first)
    #[default]
    Faces,
    /// The volume is partitioned into Voronoi cells that follow particles
    Cells,
}

impl FractureMode {
    /// Get a human-readable name for this mode
    pub fn name(self) -> &'static str {
        match self {
            FractureMode::Faces => "Faces",
            FractureMode::Cells => "Cells",
        }
    }
}

bitflags::bitflags! {
    /// Face-explode behaviour flags
    ///
    /// `UNBORN`, `ALIVE` and `DEAD` form the visibility mask: faces bound to a
    /// particle in a state whose flag is cleared are dropped from the output.
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ExplodeFlags: u16 {
        /// Split edges whose endpoints belong to different particles
        const EDGE_CUT = 1 << 0;
        /// Keep faces whose particle has not been born yet
        const UNBORN = 1 << 1;
        /// Keep faces whose particle is alive
        const ALIVE = 1 << 2;
        /// Keep faces whose particle is dead
        const DEAD = 1 << 3;
        /// Scale fragments by their particle's size
        const PARTICLE_SIZE = 1 << 4;
    }
}

impl Default for ExplodeFlags {
    fn default() -> Self {
        ExplodeFlags::UNBORN | ExplodeFlags::ALIVE | ExplodeFlags::DEAD
    }
}

bitflags::bitflags! {
    /// Where Voronoi seed points are gathered from
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PointSource: u8 {
        /// The object's own particles
        const OWN_PARTICLES = 1 << 0;
        /// The object's own vertices
        const OWN_VERTS = 1 << 1;
        /// Particles of the object's child hierarchy
        const CHILD_PARTICLES = 1 << 2;
        /// Vertices of the object's child hierarchy
        const CHILD_VERTS = 1 << 3;
        /// Points of annotation strokes attached to the object
        const STROKES = 1 << 4;
    }
}

impl Default for PointSource {
    fn default() -> Self {
        PointSource::OWN_PARTICLES
    }
}

/// Configuration for the explode / fracture modifier
///
/// # Example
///
/// ```rust
/// use particle_fracture::*;
///
/// let config = ExplodeConfigBuilder::new()
///     .mode(FractureMode::Cells)
///     .use_boolean(true)
///     .map_delay(5.0)
///     .unwrap()
///     .build()
///     .unwrap();
///
/// assert_eq!(config.mode, FractureMode::Cells);
/// assert!(config.use_cache);
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ExplodeConfig {
    /// Fragmentation algorithm
    pub mode: FractureMode,

    /// Face-explode flags (visibility mask, edge cut, particle size)
    pub flags: ExplodeFlags,

    /// Protection blend factor in `[0, 1]`
    ///
    /// Each vertex draws a uniform value `r`; it becomes protected when
    /// `(1 - protect) * r + protect * 0.5` is below its weight in
    /// `protect_group`.
    pub protect: f32,

    /// Vertex group whose weights drive vertex protection
    pub protect_group: Option<String>,

    /// UV layer overwritten with the particle age of each face
    pub age_uv_layer: Option<String>,

    /// Clip each Voronoi cell against the source volume
    pub use_boolean: bool,

    /// Flip the winding of Voronoi cell faces
    pub flip_normal: bool,

    /// Keep built cells across frames
    pub use_cache: bool,

    /// Rebuild cells every frame from current particle positions
    pub refracture: bool,

    /// Rebind cells to whichever particle is valid every frame
    pub emit_continuously: bool,

    /// Frames after the simulation start before cells bind to particles
    pub map_delay: f32,

    /// Material index assigned to interior faces created by clipping
    pub inner_material: Option<u16>,

    /// Seed point sources for the Voronoi solver
    pub point_source: PointSource,
}

impl Default for ExplodeConfig {
    fn default() -> Self {
        ExplodeConfigBuilder::new().config
    }
}

/// Builder for creating ExplodeConfig with validation
#[derive(Debug, Clone)]
pub struct ExplodeConfigBuilder {
    config: ExplodeConfig,
}

impl ExplodeConfigBuilder {
    /// Create a new builder with default values
    ///
    /// Defaults:
    /// - mode: Faces
    /// - flags: UNBORN | ALIVE | DEAD
    /// - protect: 0.0, no protection group, no age layer
    /// - use_cache: true, everything else off
    /// - map_delay: 1 frame
    /// - point_source: own particles
    pub fn new() -> Self {
        Self {
            config: ExplodeConfig {
                mode: FractureMode::default(),
                flags: ExplodeFlags::default(),
                protect: 0.0,
                protect_group: None,
                age_uv_layer: None,
                use_boolean: false,
                flip_normal: false,
                use_cache: true,
                refracture: false,
                emit_continuously: false,
                map_delay: 1.0,
                inner_material: None,
                point_source: PointSource::default(),
            },
        }
    }

    /// Set the fragmentation mode
    pub fn mode(mut self, mode: FractureMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Replace the explode flags
    pub fn flags(mut self, flags: ExplodeFlags) -> Self {
        self.config.flags = flags;
        self
    }

    /// Enable or disable edge cutting along particle boundaries
    pub fn edge_cut(mut self, enabled: bool) -> Self {
        self.config.flags.set(ExplodeFlags::EDGE_CUT, enabled);
        self
    }

    /// Set the protection factor
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the factor is outside `[0, 1]`
    pub fn protect(mut self, protect: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&protect) {
            return Err(FractureError::InvalidConfig(format!(
                "protect must be within [0, 1] (got {})",
                protect
            )));
        }
        self.config.protect = protect;
        Ok(self)
    }

    /// Set the vertex group used for protection weights
    pub fn protect_group(mut self, name: impl Into<String>) -> Self {
        self.config.protect_group = Some(name.into());
        self
    }

    /// Set the UV layer receiving particle age
    pub fn age_uv_layer(mut self, name: impl Into<String>) -> Self {
        self.config.age_uv_layer = Some(name.into());
        self
    }

    /// Enable boolean clipping of Voronoi cells
    pub fn use_boolean(mut self, enabled: bool) -> Self {
        self.config.use_boolean = enabled;
        self
    }

    /// Flip the winding of Voronoi cell faces
    pub fn flip_normal(mut self, enabled: bool) -> Self {
        self.config.flip_normal = enabled;
        self
    }

    /// Enable or disable the cell cache
    pub fn use_cache(mut self, enabled: bool) -> Self {
        self.config.use_cache = enabled;
        self
    }

    /// Enable one-shot re-fracture from current particle positions
    pub fn refracture(mut self, enabled: bool) -> Self {
        self.config.refracture = enabled;
        self
    }

    /// Enable continuous rebinding of cells
    pub fn emit_continuously(mut self, enabled: bool) -> Self {
        self.config.emit_continuously = enabled;
        self
    }

    /// Set the binding delay in frames
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the delay is negative or not finite
    pub fn map_delay(mut self, frames: f32) -> Result<Self> {
        if !frames.is_finite() || frames < 0.0 {
            return Err(FractureError::InvalidConfig(format!(
                "map delay must be a finite, non-negative frame count (got {})",
                frames
            )));
        }
        self.config.map_delay = frames;
        Ok(self)
    }

    /// Set the material index for interior faces
    pub fn inner_material(mut self, material: u16) -> Self {
        self.config.inner_material = Some(material);
        self
    }

    /// Set the seed point sources
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if no source is selected
    pub fn point_source(mut self, source: PointSource) -> Result<Self> {
        if source.is_empty() {
            return Err(FractureError::InvalidConfig(
                "at least one point source must be selected".to_string(),
            ));
        }
        self.config.point_source = source;
        Ok(self)
    }

    /// Build the configuration
    pub fn build(self) -> Result<ExplodeConfig> {
        Ok(self.config)
    }
}

impl Default for ExplodeConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
