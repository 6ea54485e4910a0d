//! Simulation configuration
//!
//! World extent, physics constants and difficulty tuning. The core only reads
//! these values; loading from JSON is a convenience for the headless runner.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors raised while loading or validating a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// How two asteroids respond when they touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AsteroidContact {
    /// Mass-weighted elastic bounce
    #[default]
    Bounce,
    /// Inelastic merge into a single body
    Merge,
}

/// Toroidal domain extent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
        }
    }
}

impl WorldConfig {
    /// Half the length of the domain diagonal
    pub fn half_diagonal(&self) -> f32 {
        0.5 * (self.width * self.width + self.height * self.height).sqrt()
    }
}

/// Integrator and gravity constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Fixed timestep (seconds)
    pub dt: f32,
    /// Gravitational constant
    pub g: f32,
    /// Softening length
    pub epsilon: f32,
    /// Barnes-Hut opening angle
    pub theta: f32,
    pub asteroid_contact: AsteroidContact,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            dt: SIM_DT,
            g: GRAVITY_G,
            epsilon: SOFTENING,
            theta: THETA,
            asteroid_contact: AsteroidContact::Bounce,
        }
    }
}

/// Spawn-time tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    /// Probability of a black hole appearing on any tick
    pub bh_spawn_rate: f32,
    pub bh_mass_mult: f32,
    pub bh_accretion_radius: f32,
    pub bh_enabled: bool,
    pub ship_mass: f32,
    pub bullet_mass: f32,
    /// Mass of a size-class 0 asteroid; each smaller class halves it
    pub asteroid_base_mass: f32,
    pub asteroid_count: u32,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            bh_spawn_rate: BLACK_HOLE_SPAWN_RATE,
            bh_mass_mult: 1.0,
            bh_accretion_radius: BLACK_HOLE_ACCRETION_RADIUS,
            bh_enabled: true,
            ship_mass: SHIP_MASS,
            bullet_mass: BULLET_MASS,
            asteroid_base_mass: ASTEROID_BASE_MASS,
            asteroid_count: ASTEROID_COUNT,
        }
    }
}

/// Complete configuration consumed by the simulation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub world: WorldConfig,
    pub physics: PhysicsConfig,
    pub difficulty: DifficultyConfig,
}

impl SimConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the physics cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if !(self.world.width > 0.0 && self.world.height > 0.0) {
            return invalid(format!(
                "world extent must be positive, got {}x{}",
                self.world.width, self.world.height
            ));
        }
        let p = &self.physics;
        if !(p.dt > 0.0) {
            return invalid(format!("dt must be positive, got {}", p.dt));
        }
        if !(p.epsilon > 0.0) {
            return invalid(format!("softening must be positive, got {}", p.epsilon));
        }
        if !(p.theta > 0.0) {
            return invalid(format!("opening angle must be positive, got {}", p.theta));
        }
        if !(p.g >= 0.0) {
            return invalid(format!("G must be non-negative, got {}", p.g));
        }
        let d = &self.difficulty;
        for (name, mass) in [
            ("ship_mass", d.ship_mass),
            ("bullet_mass", d.bullet_mass),
            ("asteroid_base_mass", d.asteroid_base_mass),
            ("bh_mass_mult", d.bh_mass_mult),
        ] {
            if !(mass > 0.0) {
                return invalid(format!("{name} must be positive, got {mass}"));
            }
        }
        if !(d.bh_accretion_radius > 0.0 && d.bh_accretion_radius < self.world.half_diagonal()) {
            return invalid(format!(
                "accretion radius {} must lie in (0, {})",
                d.bh_accretion_radius,
                self.world.half_diagonal()
            ));
        }
        if !(0.0..=1.0).contains(&d.bh_spawn_rate) {
            return invalid(format!("bh_spawn_rate must be a probability, got {}", d.bh_spawn_rate));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config = SimConfig::from_json(r#"{ "physics": { "theta": 0.3 } }"#).unwrap();
        assert_eq!(config.physics.theta, 0.3);
        assert_eq!(config.physics.dt, SIM_DT);
        assert_eq!(config.world, WorldConfig::default());
    }

    #[test]
    fn test_json_roundtrip_preserves_merge_mode() {
        let mut config = SimConfig::default();
        config.physics.asteroid_contact = AsteroidContact::Merge;
        let json = config.to_json().unwrap();
        assert_eq!(SimConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_rejects_zero_softening() {
        let err = SimConfig::from_json(r#"{ "physics": { "epsilon": 0.0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_oversized_accretion_radius() {
        let mut config = SimConfig::default();
        config.difficulty.bh_accretion_radius = config.world.half_diagonal() + 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = SimConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
