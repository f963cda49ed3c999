//! Particle simulation snapshot
//!
//! The simulation itself lives in the host. Every frame the host fills a
//! [`ParticleSystem`] with the state this crate reads: birth and current
//! coordinates, life status, and timing scalars. All positions are world space.

use glam::{Quat, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Life status of a particle at the current frame
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParticleStatus {
    /// Not emitted yet
    #[default]
    Unborn,
    /// Emitted and alive
    Alive,
    /// In its last simulation step
    Dying,
    /// Lifetime expired
    Dead,
}

impl ParticleStatus {
    /// Whether the particle has been emitted (alive, dying or dead)
    #[inline]
    pub fn is_born(self) -> bool {
        !matches!(self, ParticleStatus::Unborn)
    }
}

/// Position and orientation of a particle at one instant
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleKey {
    /// World-space position
    pub position: Vec3,
    /// World-space orientation
    pub rotation: Quat,
}

impl ParticleKey {
    /// Create a key from position and rotation
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Create an unrotated key at a position
    pub fn at(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }
}

impl Default for ParticleKey {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

/// One simulated particle
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Coordinates at emission
    pub birth: ParticleKey,
    /// Coordinates at the current frame
    pub state: ParticleKey,
    /// Life status at the current frame
    pub status: ParticleStatus,
    /// Frame of emission
    pub birth_time: f32,
    /// Lifetime in frames
    pub lifetime: f32,
    /// Particle size
    pub size: f32,
}

impl Particle {
    /// Create a particle that has not moved since its birth
    pub fn resting(birth: ParticleKey, status: ParticleStatus, birth_time: f32, lifetime: f32) -> Self {
        Self {
            birth,
            state: birth,
            status,
            birth_time,
            lifetime,
            size: 1.0,
        }
    }

    /// Normalized age at `frame`, clamped to `[0.001, 0.999]`
    ///
    /// The clamp keeps the value away from the texture-space wrap seam.
    pub fn age(&self, frame: f32) -> f32 {
        if self.lifetime <= 0.0 {
            return 0.999;
        }
        ((frame - self.birth_time) / self.lifetime).clamp(0.001, 0.999)
    }

    /// Rotation carrying the birth orientation onto the current one
    #[inline]
    pub fn rotation_delta(&self) -> Quat {
        self.state.rotation * self.birth.rotation.inverse()
    }
}

/// Snapshot of a particle system for one frame
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParticleSystem {
    /// All particles, indexed by particle id
    pub particles: Vec<Particle>,
    /// Random seed of the system (drives vertex protection draws)
    pub seed: u64,
    /// First emission frame of the simulation
    pub start_frame: f32,
    /// Whether the simulation integrates particle rotation
    pub rotations: bool,
}

impl ParticleSystem {
    /// Create a system from particles with default seed and timing
    pub fn new(particles: Vec<Particle>) -> Self {
        Self {
            particles,
            ..Default::default()
        }
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the simulation start frame
    pub fn with_start_frame(mut self, frame: f32) -> Self {
        self.start_frame = frame;
        self
    }

    /// Enable rotation integration
    pub fn with_rotations(mut self, enabled: bool) -> Self {
        self.rotations = enabled;
        self
    }

    /// Number of particles
    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Check if the system holds no particles
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Get a particle by id
    #[inline]
    pub fn get(&self, id: usize) -> Option<&Particle> {
        self.particles.get(id)
    }

    /// Birth positions of all particles, in id order
    pub fn birth_positions(&self) -> Vec<Vec3> {
        self.particles.iter().map(|p| p.birth.position).collect()
    }

    /// Current positions of all particles, in id order
    pub fn current_positions(&self) -> Vec<Vec3> {
        self.particles.iter().map(|p| p.state.position).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_clamped() {
        let p = Particle::resting(ParticleKey::default(), ParticleStatus::Alive, 10.0, 20.0);
        assert!((p.age(20.0) - 0.5).abs() < 1e-6);
        assert_eq!(p.age(0.0), 0.001);
        assert_eq!(p.age(100.0), 0.999);
    }

    #[test]
    fn test_age_zero_lifetime() {
        let p = Particle::resting(ParticleKey::default(), ParticleStatus::Dead, 0.0, 0.0);
        assert_eq!(p.age(5.0), 0.999);
    }

    #[test]
    fn test_rotation_delta_identity_at_rest() {
        let key = ParticleKey::new(Vec3::X, Quat::from_rotation_y(0.7));
        let p = Particle::resting(key, ParticleStatus::Alive, 0.0, 10.0);
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert!((p.rotation_delta() * v - v).length() < 1e-5);
    }

    #[test]
    fn test_rotation_delta() {
        let birth = ParticleKey::new(Vec3::ZERO, Quat::from_rotation_z(0.3));
        let mut p = Particle::resting(birth, ParticleStatus::Alive, 0.0, 10.0);
        p.state.rotation = Quat::from_rotation_z(0.3 + std::f32::consts::FRAC_PI_2);

        let rotated = p.rotation_delta() * Vec3::X;
        assert!((rotated - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_status_is_born() {
        assert!(!ParticleStatus::Unborn.is_born());
        assert!(ParticleStatus::Alive.is_born());
        assert!(ParticleStatus::Dying.is_born());
        assert!(ParticleStatus::Dead.is_born());
    }
}
