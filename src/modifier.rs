//! Host-facing modifier
//!
//! [`ExplodeModifier`] owns the per-object state that survives between
//! frames (face assignment, fracture cache) and turns a source mesh plus a
//! particle snapshot into the mesh to display. [`ExplodeModifier::apply`]
//! never fails: whenever a stage cannot run, the input mesh comes back
//! unchanged.

use glam::Mat4;
use tracing::{debug, warn};

use crate::config::{ExplodeConfig, FractureMode};
use crate::error::Result;
use crate::explode::{assign_faces, explode_faces, FaceAssignment, Protection};
use crate::fracture::{
    animate_cells, bind_cells, build_cells, default_intersector, BuildInput, CacheKey,
    FractureCache, MeshIntersector, SeedSources, VoronoiCellSet, VoronoiSolver,
};
use crate::mesh::Mesh;
use crate::particles::ParticleSystem;

static NO_SOURCES: SeedSources = SeedSources {
    children: Vec::new(),
    strokes: Vec::new(),
};

/// Everything the host provides for one evaluation
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    /// Current frame
    pub frame: f32,
    /// Object-to-world matrix of the modified object
    pub object_matrix: Mat4,
    /// Particle system driving the modifier, `None` if the object has none
    pub particles: Option<&'a ParticleSystem>,
    /// Extra seed point sources for cell fracture
    pub sources: &'a SeedSources,
    /// Set by the host when the particle system was reset or re-seeded
    pub particles_changed: bool,
}

impl<'a> FrameContext<'a> {
    /// Context at `frame` with an identity object matrix and no extra sources
    pub fn new(frame: f32, particles: Option<&'a ParticleSystem>) -> Self {
        Self {
            frame,
            object_matrix: Mat4::IDENTITY,
            particles,
            sources: &NO_SOURCES,
            particles_changed: false,
        }
    }

    /// Set the object-to-world matrix
    pub fn with_object_matrix(mut self, matrix: Mat4) -> Self {
        self.object_matrix = matrix;
        self
    }

    /// Add child objects and strokes as cell fracture seed sources
    pub fn with_sources(mut self, sources: &'a SeedSources) -> Self {
        self.sources = sources;
        self
    }

    /// Mark the particle system as reset, forcing a new face assignment
    pub fn with_particles_changed(mut self, changed: bool) -> Self {
        self.particles_changed = changed;
        self
    }
}

/// Particle explode / cell fracture modifier
///
/// # Example
///
/// ```
/// use particle_fracture::*;
///
/// let mesh = Mesh::from_parts(
///     vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y],
///     vec![Face::quad(0, 1, 2, 3)],
/// );
/// let particles = ParticleSystem::new(vec![Particle::resting(
///     ParticleKey::at(Vec3::new(0.5, 0.5, 0.0)),
///     ParticleStatus::Alive,
///     0.0,
///     10.0,
/// )]);
///
/// let mut modifier = ExplodeModifier::new(ExplodeConfig::default());
/// let out = modifier.apply(&mesh, &FrameContext::new(1.0, Some(&particles)));
///
/// assert_eq!(out.face_count(), 1);
/// ```
pub struct ExplodeModifier {
    config: ExplodeConfig,
    assignment: Option<FaceAssignment>,
    reassign: bool,
    cache: Option<FractureCache>,
    rebuilds: u64,
    solver: Option<Box<dyn VoronoiSolver>>,
    intersector: Box<dyn MeshIntersector>,
}

impl ExplodeModifier {
    /// Create a modifier without a Voronoi solver
    ///
    /// Until a solver is attached, cell mode falls back to face explode.
    pub fn new(config: ExplodeConfig) -> Self {
        Self {
            config,
            assignment: None,
            reassign: false,
            cache: None,
            rebuilds: 0,
            solver: None,
            intersector: default_intersector(),
        }
    }

    /// Attach the Voronoi solver used in cell mode
    pub fn with_solver(mut self, solver: impl VoronoiSolver + 'static) -> Self {
        self.solver = Some(Box::new(solver));
        self
    }

    /// Replace the boolean backend used for clipping cells
    pub fn with_intersector(mut self, intersector: impl MeshIntersector + 'static) -> Self {
        self.intersector = Box::new(intersector);
        self
    }

    /// Current configuration
    #[inline]
    pub fn config(&self) -> &ExplodeConfig {
        &self.config
    }

    /// Replace the configuration
    ///
    /// Changing the map delay unbinds all cached cells so they bind again
    /// once the new delay has passed.
    pub fn set_config(&mut self, config: ExplodeConfig) {
        if config.map_delay != self.config.map_delay {
            if let Some(cache) = &mut self.cache {
                cache.cells.reset_bindings();
            }
        }
        self.config = config;
    }

    /// Force the face assignment to be recomputed on the next face-mode frame
    pub fn request_reassignment(&mut self) {
        self.reassign = true;
    }

    /// Current face assignment, if one was computed
    pub fn face_assignment(&self) -> Option<&FaceAssignment> {
        self.assignment.as_ref()
    }

    /// Cached cells, if a fracture is cached
    pub fn cells(&self) -> Option<&VoronoiCellSet> {
        self.cache.as_ref().map(|c| &c.cells)
    }

    /// Number of fracture builds run so far
    #[inline]
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    /// Drop the fracture cache and the face assignment
    pub fn release(&mut self) {
        self.cache = None;
        self.assignment = None;
        self.reassign = false;
    }

    /// Produce the output mesh for one frame
    ///
    /// Any failure is logged and the input mesh is returned unchanged.
    pub fn apply(&mut self, mesh: &Mesh, ctx: &FrameContext<'_>) -> Mesh {
        self.try_apply(mesh, ctx).unwrap_or_else(|e| {
            warn!("Explode skipped: {}", e);
            mesh.clone()
        })
    }

    /// Produce the output mesh for one frame, reporting a malformed input mesh
    ///
    /// Out-of-range face indices or attribute layers of the wrong length give
    /// [`crate::FractureError::InvalidMesh`] before any state is touched.
    pub fn try_apply(&mut self, mesh: &Mesh, ctx: &FrameContext<'_>) -> Result<Mesh> {
        mesh.validate()?;

        let Some(particles) = ctx.particles.filter(|p| !p.is_empty()) else {
            debug!("No particles, passing mesh through");
            return Ok(mesh.clone());
        };

        Ok(match self.config.mode {
            FractureMode::Cells if self.solver.is_some() => self.apply_cells(mesh, particles, ctx),
            FractureMode::Cells => {
                warn!("Cell fracture needs a Voronoi solver, falling back to face explode");
                self.apply_faces(mesh, particles, ctx)
            }
            FractureMode::Faces => self.apply_faces(mesh, particles, ctx),
        })
    }

    fn apply_faces(&mut self, mesh: &Mesh, particles: &ParticleSystem, ctx: &FrameContext<'_>) -> Mesh {
        let stale = self.assignment.as_ref().map_or(true, |a| {
            a.len() != mesh.face_count() || a.particle_count() != particles.len()
        });

        if stale || self.reassign || ctx.particles_changed {
            let protection = Protection {
                group: self.config.protect_group.as_deref(),
                factor: self.config.protect,
            };
            self.assignment = Some(assign_faces(mesh, particles, &ctx.object_matrix, protection));
            self.reassign = false;
        }

        match &self.assignment {
            Some(assignment) => explode_faces(
                mesh,
                assignment,
                particles,
                ctx.frame,
                &ctx.object_matrix,
                &self.config,
            ),
            None => mesh.clone(),
        }
    }

    fn apply_cells(&mut self, mesh: &Mesh, particles: &ParticleSystem, ctx: &FrameContext<'_>) -> Mesh {
        let Some(solver) = self.solver.as_deref() else {
            return mesh.clone();
        };

        let key = CacheKey::new(Some(particles), &self.config);
        let cached = self.cache.as_ref().is_some_and(|c| c.is_valid_for(&key));

        if !cached {
            let input = BuildInput {
                mesh,
                object_matrix: &ctx.object_matrix,
                particles: Some(particles),
                sources: ctx.sources,
            };
            let build = match build_cells(input, &self.config, solver, &*self.intersector) {
                Ok(build) => build,
                Err(e) => {
                    warn!("Fracture failed: {}", e);
                    self.cache = None;
                    return mesh.clone();
                }
            };
            self.rebuilds += 1;

            if self.config.refracture {
                self.cache = None;
                return build.mesh;
            }
            let previous = self.cache.as_ref().map(|c| c.generation());
            self.cache = Some(FractureCache::new(key, build, previous));
        }

        let Some(cache) = self.cache.as_mut() else {
            return mesh.clone();
        };
        let continuous = self.config.emit_continuously;
        bind_cells(
            &mut cache.cells,
            particles,
            ctx.frame,
            &ctx.object_matrix,
            continuous,
            self.config.map_delay,
        );

        let mut out = cache.mesh.clone();
        animate_cells(&cache.cells, &mut out, particles, &ctx.object_matrix, continuous);
        out
    }
}
