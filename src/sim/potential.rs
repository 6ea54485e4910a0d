//! External gravitational potentials
//!
//! A fixed, enumerable set of closed-form fields centered on one point. The
//! integrator only needs [`ExternalPotential::acceleration_at`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Below this radius a field is treated as singular and contributes nothing
const SINGULAR_RADIUS: f32 = 1e-6;

/// External field applied on top of mutual gravity
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ExternalPotential {
    /// Free space
    #[default]
    None,
    /// `a = GM * dr / (r² + ε²)^1.5` toward `center`
    PointMass { center: Vec2, gm: f32, epsilon: f32 },
    /// `a = -ω² * (pos - center)`
    Harmonic { center: Vec2, omega2: f32 },
    /// `a = -v0² * dr / (r² + rc²)`, flat rotation curve
    Logarithmic { center: Vec2, v0: f32, rc: f32 },
    /// Navarro-Frenk-White halo
    Nfw {
        center: Vec2,
        rho_s: f32,
        r_s: f32,
        g: f32,
        epsilon: f32,
    },
}

impl ExternalPotential {
    /// Tuned potential for a level id. Unknown ids give free space.
    pub fn for_level(level: u32, center: Vec2, world_width: f32) -> Self {
        match level {
            1 => ExternalPotential::PointMass {
                center,
                gm: 50_000.0,
                epsilon: 20.0,
            },
            2 => ExternalPotential::Harmonic { center, omega2: 1e-4 },
            3 => ExternalPotential::Logarithmic {
                center,
                v0: 10.0,
                rc: world_width * 0.1,
            },
            4 => ExternalPotential::Nfw {
                center,
                rho_s: 0.004,
                r_s: world_width * 0.2,
                g: 50.0,
                epsilon: 10.0,
            },
            _ => ExternalPotential::None,
        }
    }

    /// Acceleration felt by a body at `pos`
    pub fn acceleration_at(&self, pos: Vec2) -> Vec2 {
        match *self {
            ExternalPotential::None => Vec2::ZERO,
            ExternalPotential::PointMass { center, gm, epsilon } => {
                let dr = center - pos;
                let r2 = dr.length_squared();
                if r2.sqrt() < SINGULAR_RADIUS {
                    return Vec2::ZERO;
                }
                let soft = r2 + epsilon * epsilon;
                dr * (gm / (soft * soft.sqrt()))
            }
            ExternalPotential::Harmonic { center, omega2 } => {
                let dr = pos - center;
                if dr.length() < SINGULAR_RADIUS {
                    return Vec2::ZERO;
                }
                dr * -omega2
            }
            ExternalPotential::Logarithmic { center, v0, rc } => {
                let dr = pos - center;
                let r2 = dr.length_squared();
                if r2.sqrt() < SINGULAR_RADIUS {
                    return Vec2::ZERO;
                }
                dr * (-v0 * v0 / (r2 + rc * rc))
            }
            ExternalPotential::Nfw {
                center,
                rho_s,
                r_s,
                g,
                epsilon,
            } => {
                let dr = pos - center;
                let r = dr.length();
                if r < SINGULAR_RADIUS {
                    return Vec2::ZERO;
                }
                // M(<r) = 4π ρs rs³ [ln(1+x) - x/(1+x)], x = r/rs
                let x = r / r_s;
                let enclosed =
                    4.0 * std::f32::consts::PI * rho_s * r_s * r_s * r_s * ((1.0 + x).ln() - x / (1.0 + x));
                let soft = r * r + epsilon * epsilon;
                dr * (-g * enclosed / (soft * soft.sqrt()))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExternalPotential::None => "No Potential",
            ExternalPotential::PointMass { .. } => "Point Mass",
            ExternalPotential::Harmonic { .. } => "Harmonic Oscillator",
            ExternalPotential::Logarithmic { .. } => "Logarithmic",
            ExternalPotential::Nfw { .. } => "NFW Profile",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ExternalPotential::None => "Free space with no external forces. Only mutual gravity between bodies.",
            ExternalPotential::PointMass { .. } => {
                "Central gravitational potential: a(r) = -GM * r / (r^2 + eps^2)^1.5"
            }
            ExternalPotential::Harmonic { .. } => {
                "Harmonic potential: a(r) = -omega^2 * r. Creates oscillatory orbits."
            }
            ExternalPotential::Logarithmic { .. } => {
                "Logarithmic potential: V(r) = v0^2 * ln(r^2 + rc^2). Flat rotation curve."
            }
            ExternalPotential::Nfw { .. } => "Navarro-Frenk-White dark matter halo: rho(r) ~ 1/(r(1+r/rs)^2)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CENTER: Vec2 = Vec2::new(640.0, 360.0);

    fn all_levels() -> Vec<ExternalPotential> {
        (0..5).map(|l| ExternalPotential::for_level(l, CENTER, 1280.0)).collect()
    }

    #[test]
    fn test_level_factory() {
        let names: Vec<_> = all_levels().iter().map(|p| p.name()).collect();
        assert_eq!(
            names,
            ["No Potential", "Point Mass", "Harmonic Oscillator", "Logarithmic", "NFW Profile"]
        );
        assert_eq!(ExternalPotential::for_level(99, CENTER, 1280.0), ExternalPotential::None);
    }

    #[test]
    fn test_center_is_not_singular() {
        for p in all_levels() {
            let a = p.acceleration_at(CENTER);
            assert_eq!(a, Vec2::ZERO, "{} at center", p.name());
        }
    }

    #[test]
    fn test_attractive_fields_point_inward() {
        let pos = CENTER + Vec2::new(200.0, 0.0);
        for p in all_levels().into_iter().skip(1) {
            let a = p.acceleration_at(pos);
            assert!(a.x < 0.0 && a.y.abs() < 1e-6, "{} gave {a:?}", p.name());
            assert!(!p.description().is_empty());
        }
    }

    #[test]
    fn test_harmonic_is_linear() {
        let p = ExternalPotential::Harmonic { center: CENTER, omega2: 0.01 };
        let a1 = p.acceleration_at(CENTER + Vec2::new(10.0, 0.0));
        let a2 = p.acceleration_at(CENTER + Vec2::new(20.0, 0.0));
        assert!((a2.x - 2.0 * a1.x).abs() < 1e-6);
    }
}
