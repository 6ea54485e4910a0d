//! Deterministic simulation module
//!
//! All physics lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (per-type collections, index order)
//! - No rendering or platform dependencies

pub mod body;
pub mod collision;
pub mod integrator;
pub mod periodic;
pub mod potential;
pub mod quadtree;
pub mod response;
pub mod state;
pub mod tick;

pub use body::{
    Asteroid, BlackHole, BodyKind, BodyRef, Bullet, DUST_SIZE_CLASS, Entities, IdAllocator, Kinematics, Particle,
    Ship, asteroid_mass, asteroid_radius,
};
pub use collision::{CollisionPair, circles_overlap, detect_collisions, within_accretion};
pub use integrator::{StepReport, accelerations, leapfrog_step};
pub use periodic::{Domain, minimum_image, wrap_position};
pub use potential::ExternalPotential;
pub use quadtree::{GravityParams, QuadTree, Source, direct_acceleration};
pub use response::{
    Accreted, BulletHit, Burst, ResolveReport, ResponseContext, emit_explosion, handle_asteroid_asteroid,
    handle_black_hole_accretion, handle_bullet_asteroid, handle_ship_asteroid, handle_ship_ship, merge_asteroids,
    resolve_collisions,
};
pub use state::SimState;
pub use tick::{ShipInput, TickReport, tick};
