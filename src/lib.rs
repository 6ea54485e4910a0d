//! Gravitoids - asteroids on a torus with real gravity
//!
//! Core modules:
//! - `sim`: Deterministic simulation (Barnes-Hut gravity, leapfrog integration, collisions)
//! - `config`: World extent, physics constants and difficulty tuning

pub mod config;
pub mod sim;

pub use config::{AsteroidContact, ConfigError, DifficultyConfig, PhysicsConfig, SimConfig, WorldConfig};

use glam::Vec2;

/// Simulation constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;

    /// Default world extent
    pub const WORLD_WIDTH: f32 = 1280.0;
    pub const WORLD_HEIGHT: f32 = 720.0;

    /// Gravitational constant
    pub const GRAVITY_G: f32 = 100.0;
    /// Softening length (must stay > 0)
    pub const SOFTENING: f32 = 5.0;
    /// Barnes-Hut opening angle
    pub const THETA: f32 = 0.5;

    /// Ship defaults
    pub const SHIP_RADIUS: f32 = 10.0;
    pub const SHIP_MASS: f32 = 1500.0;
    pub const SHIP_LIVES: u32 = 3;
    /// Invulnerability after spawn or respawn (seconds)
    pub const SHIP_INVULNERABLE_TIME: f32 = 3.0;
    pub const SHIP_SHOOT_COOLDOWN: f32 = 0.2;
    /// Turn rate (radians/s)
    pub const SHIP_TURN_RATE: f32 = 3.0;
    /// Thrust and brake acceleration (units/s²)
    pub const SHIP_THRUST: f32 = 500.0;
    /// Initial heading, pointing up
    pub const SHIP_START_ANGLE: f32 = -std::f32::consts::FRAC_PI_2;

    /// Bullet defaults
    pub const BULLET_RADIUS: f32 = 2.0;
    pub const BULLET_MASS: f32 = 100.0;
    pub const BULLET_LIFETIME: f32 = 3.0;
    pub const BULLET_SPEED: f32 = 300.0;
    /// Spawn distance beyond the ship hull
    pub const BULLET_MUZZLE_OFFSET: f32 = 5.0;

    /// Mass of a size-class 0 asteroid
    pub const ASTEROID_BASE_MASS: f32 = 6000.0;
    pub const ASTEROID_COUNT: u32 = 4;

    /// Black hole defaults
    pub const BLACK_HOLE_SPAWN_RATE: f32 = 0.0005;
    pub const BLACK_HOLE_ACCRETION_RADIUS: f32 = 25.0;
    pub const BLACK_HOLE_VISUAL_RADIUS: f32 = 15.0;
    pub const BLACK_HOLE_BASE_MASS: f32 = 5000.0;
    pub const BLACK_HOLE_MASS_PER_WAVE: f32 = 500.0;
    /// Distance past the domain edge at which a black hole is dropped
    pub const BLACK_HOLE_OFFSCREEN_MARGIN: f32 = 100.0;
    /// Distance outside the domain edge where black holes enter
    pub const BLACK_HOLE_ENTRY_OFFSET: f32 = 50.0;

    /// Particle lifetime before multipliers (seconds)
    pub const PARTICLE_LIFETIME: f32 = 1.0;

    /// Below this separation a normal or contact direction is undefined
    pub const CONTACT_EPSILON: f32 = 1e-6;
}

/// Unit vector pointing along `angle` (radians)
#[inline]
pub fn unit_vector(angle: f32) -> Vec2 {
    Vec2::from_angle(angle)
}

/// True when both components are finite
#[inline]
pub fn is_finite_vec(v: Vec2) -> bool {
    v.x.is_finite() && v.y.is_finite()
}
