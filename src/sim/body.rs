//! Simulated bodies
//!
//! Every body shares a [`Kinematics`] payload; the variant structs add their own
//! fields. Bodies live in per-type `Vec`s inside [`Entities`] and are addressed
//! through [`BodyRef`] handles (kind tag + index), which stay valid for one tick
//! because removal only happens in [`Entities::purge_inactive`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Type tag for a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyKind {
    Ship,
    Asteroid,
    Bullet,
    BlackHole,
    Particle,
}

/// Shared positional and kinematic state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kinematics {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Acceleration from the last half-kick
    pub acc: Vec2,
    pub mass: f32,
    /// Whether the body wraps at the domain edges
    pub wraps: bool,
    pub active: bool,
}

impl Kinematics {
    pub fn new(id: u32, pos: Vec2, vel: Vec2, mass: f32, wraps: bool) -> Self {
        debug_assert!(mass >= 0.0, "negative mass {mass}");
        Self {
            id,
            pos,
            vel,
            acc: Vec2::ZERO,
            mass,
            wraps,
            active: true,
        }
    }

    #[inline]
    pub fn momentum(&self) -> Vec2 {
        self.vel * self.mass
    }
}

/// A player ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ship {
    pub body: Kinematics,
    pub player_id: i32,
    /// Heading (radians)
    pub angle: f32,
    pub radius: f32,
    pub lives: u32,
    pub score: u32,
    pub thrusting: bool,
    /// Seconds of invulnerability left
    pub invulnerable_time: f32,
    pub shoot_cooldown: f32,
}

impl Ship {
    pub fn new(id: u32, pos: Vec2, player_id: i32, mass: f32) -> Self {
        Self {
            body: Kinematics::new(id, pos, Vec2::ZERO, mass, true),
            player_id,
            angle: SHIP_START_ANGLE,
            radius: SHIP_RADIUS,
            lives: SHIP_LIVES,
            score: 0,
            thrusting: false,
            invulnerable_time: SHIP_INVULNERABLE_TIME,
            shoot_cooldown: 0.0,
        }
    }

    #[inline]
    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_time > 0.0
    }

    #[inline]
    pub fn can_shoot(&self) -> bool {
        self.shoot_cooldown <= 0.0
    }

    /// Unit vector along the heading
    #[inline]
    pub fn heading(&self) -> Vec2 {
        crate::unit_vector(self.angle)
    }

    pub fn rotate(&mut self, delta: f32) {
        self.angle += delta;
    }

    pub fn thrust(&mut self, power: f32, dt: f32) {
        self.body.vel += self.heading() * (power * dt);
    }

    /// Decelerate against the current velocity, stopping outright when slow
    pub fn brake(&mut self, power: f32, dt: f32) {
        if self.body.vel.length() > 1.0 {
            self.body.vel -= self.body.vel.normalize_or_zero() * (power * dt);
        } else {
            self.body.vel = Vec2::ZERO;
        }
    }

    /// Count down invulnerability and weapon cooldown
    pub fn update(&mut self, dt: f32) {
        if self.invulnerable_time > 0.0 {
            self.invulnerable_time = (self.invulnerable_time - dt).max(0.0);
        }
        if self.shoot_cooldown > 0.0 {
            self.shoot_cooldown -= dt;
        }
    }

    /// Take one life. Returns true if that was the last one.
    pub fn lose_life(&mut self) -> bool {
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.body.active = false;
            true
        } else {
            false
        }
    }

    /// Put the ship back at `pos`, at rest and invulnerable
    pub fn respawn(&mut self, pos: Vec2) {
        self.body.pos = pos;
        self.body.vel = Vec2::ZERO;
        self.invulnerable_time = SHIP_INVULNERABLE_TIME;
    }
}

/// Radius per asteroid size class, largest first
pub const ASTEROID_RADII: [f32; 6] = [40.0, 25.0, 15.0, 10.0, 6.0, 3.0];

/// Smallest size class; these are destroyed rather than split
pub const DUST_SIZE_CLASS: u8 = (ASTEROID_RADII.len() - 1) as u8;

/// Radius of an asteroid of the given size class
pub fn asteroid_radius(size_class: u8) -> f32 {
    debug_assert!(size_class <= DUST_SIZE_CLASS, "undefined size class {size_class}");
    ASTEROID_RADII[(size_class as usize).min(ASTEROID_RADII.len() - 1)]
}

/// Mass of an asteroid of the given size class: `base_mass * 2^-k`
pub fn asteroid_mass(base_mass: f32, size_class: u8) -> f32 {
    debug_assert!(size_class <= DUST_SIZE_CLASS, "undefined size class {size_class}");
    base_mass / (1u32 << size_class) as f32
}

/// An asteroid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asteroid {
    pub body: Kinematics,
    pub radius: f32,
    /// 0 = largest, up to [`DUST_SIZE_CLASS`]
    pub size_class: u8,
    pub rotation: f32,
    pub rotation_speed: f32,
}

impl Asteroid {
    pub fn new(id: u32, pos: Vec2, vel: Vec2, size_class: u8, base_mass: f32, rotation_speed: f32) -> Self {
        Self {
            body: Kinematics::new(id, pos, vel, asteroid_mass(base_mass, size_class), true),
            radius: asteroid_radius(size_class),
            size_class,
            rotation: 0.0,
            rotation_speed,
        }
    }

    #[inline]
    pub fn is_dust(&self) -> bool {
        self.size_class >= DUST_SIZE_CLASS
    }

    pub fn update(&mut self, dt: f32) {
        self.rotation += self.rotation_speed * dt;
    }
}

/// A projectile fired by a ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub body: Kinematics,
    pub radius: f32,
    pub lifetime: f32,
    pub max_lifetime: f32,
    /// Player that fired it
    pub owner: i32,
}

impl Bullet {
    pub fn new(id: u32, pos: Vec2, vel: Vec2, owner: i32, mass: f32) -> Self {
        Self {
            body: Kinematics::new(id, pos, vel, mass, true),
            radius: BULLET_RADIUS,
            lifetime: BULLET_LIFETIME,
            max_lifetime: BULLET_LIFETIME,
            owner,
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.lifetime = (self.lifetime - dt).max(0.0);
        if self.lifetime <= 0.0 {
            self.body.active = false;
        }
    }
}

/// A black hole. Never wraps; leaves the game once it drifts off the domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlackHole {
    pub body: Kinematics,
    /// Anything closer than this is consumed
    pub accretion_radius: f32,
    pub visual_radius: f32,
}

impl BlackHole {
    pub fn new(id: u32, pos: Vec2, vel: Vec2, mass: f32, accretion_radius: f32) -> Self {
        Self {
            body: Kinematics::new(id, pos, vel, mass, false),
            accretion_radius,
            visual_radius: BLACK_HOLE_VISUAL_RADIUS,
        }
    }
}

/// Visual-only debris. Moves ballistically and takes no part in gravity or collisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub lifetime: f32,
    pub max_lifetime: f32,
    /// -1 for neutral/white, otherwise the player whose colour to use
    pub player_id: i32,
    pub active: bool,
}

impl Particle {
    pub fn new(pos: Vec2, vel: Vec2, lifetime: f32, player_id: i32) -> Self {
        Self {
            pos,
            vel,
            lifetime,
            max_lifetime: lifetime,
            player_id,
            active: true,
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.pos += self.vel * dt;
        self.lifetime -= dt;
        if self.lifetime <= 0.0 {
            self.active = false;
        }
    }

    /// Remaining life in `[0, 1]`
    pub fn fade(&self) -> f32 {
        if self.max_lifetime <= 0.0 {
            return 0.0;
        }
        (self.lifetime / self.max_lifetime).clamp(0.0, 1.0)
    }
}

/// Hands out monotonically increasing entity ids
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Id the next call will return
    pub fn peek(&self) -> u32 {
        self.next
    }
}

/// Stable handle to a gravitating body for the duration of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyRef {
    pub kind: BodyKind,
    pub index: usize,
}

impl BodyRef {
    pub const fn ship(index: usize) -> Self {
        Self { kind: BodyKind::Ship, index }
    }
    pub const fn asteroid(index: usize) -> Self {
        Self { kind: BodyKind::Asteroid, index }
    }
    pub const fn bullet(index: usize) -> Self {
        Self { kind: BodyKind::Bullet, index }
    }
    pub const fn black_hole(index: usize) -> Self {
        Self { kind: BodyKind::BlackHole, index }
    }
}

/// Per-type body collections
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entities {
    pub ships: Vec<Ship>,
    pub asteroids: Vec<Asteroid>,
    pub bullets: Vec<Bullet>,
    pub black_holes: Vec<BlackHole>,
    pub particles: Vec<Particle>,
}

impl Entities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.ships.clear();
        self.asteroids.clear();
        self.bullets.clear();
        self.black_holes.clear();
        self.particles.clear();
    }

    /// Kinematic state behind a handle. Particles have no handle.
    pub fn get(&self, r: BodyRef) -> Option<&Kinematics> {
        match r.kind {
            BodyKind::Ship => self.ships.get(r.index).map(|s| &s.body),
            BodyKind::Asteroid => self.asteroids.get(r.index).map(|a| &a.body),
            BodyKind::Bullet => self.bullets.get(r.index).map(|b| &b.body),
            BodyKind::BlackHole => self.black_holes.get(r.index).map(|b| &b.body),
            BodyKind::Particle => None,
        }
    }

    pub fn get_mut(&mut self, r: BodyRef) -> Option<&mut Kinematics> {
        match r.kind {
            BodyKind::Ship => self.ships.get_mut(r.index).map(|s| &mut s.body),
            BodyKind::Asteroid => self.asteroids.get_mut(r.index).map(|a| &mut a.body),
            BodyKind::Bullet => self.bullets.get_mut(r.index).map(|b| &mut b.body),
            BodyKind::BlackHole => self.black_holes.get_mut(r.index).map(|b| &mut b.body),
            BodyKind::Particle => None,
        }
    }

    pub fn is_active(&self, r: BodyRef) -> bool {
        self.get(r).is_some_and(|b| b.active)
    }

    /// Handles of every active body that takes part in gravity, in a stable order
    pub fn gravitating(&self) -> Vec<BodyRef> {
        let ships = self.ships.iter().enumerate().filter(|(_, s)| s.body.active).map(|(i, _)| BodyRef::ship(i));
        let asteroids = self
            .asteroids
            .iter()
            .enumerate()
            .filter(|(_, a)| a.body.active)
            .map(|(i, _)| BodyRef::asteroid(i));
        let bullets = self.bullets.iter().enumerate().filter(|(_, b)| b.body.active).map(|(i, _)| BodyRef::bullet(i));
        let holes = self
            .black_holes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.body.active)
            .map(|(i, _)| BodyRef::black_hole(i));
        ships.chain(asteroids).chain(bullets).chain(holes).collect()
    }

    /// Advance timers and particle motion
    pub fn update_timers(&mut self, dt: f32) {
        for ship in self.ships.iter_mut().filter(|s| s.body.active) {
            ship.update(dt);
        }
        for asteroid in self.asteroids.iter_mut().filter(|a| a.body.active) {
            asteroid.update(dt);
        }
        for bullet in self.bullets.iter_mut().filter(|b| b.body.active) {
            bullet.update(dt);
        }
        for particle in self.particles.iter_mut().filter(|p| p.active) {
            particle.update(dt);
        }
    }

    /// Drop everything marked inactive. Ships stay so player slots keep their index.
    pub fn purge_inactive(&mut self) {
        self.asteroids.retain(|a| a.body.active);
        self.bullets.retain(|b| b.body.active);
        self.black_holes.retain(|b| b.body.active);
        self.particles.retain(|p| p.active);
    }

    /// Sum of mass over active gravitating bodies
    pub fn total_mass(&self) -> f32 {
        self.gravitating().into_iter().filter_map(|r| self.get(r)).map(|b| b.mass).sum()
    }

    /// Sum of momentum over active gravitating bodies
    pub fn total_momentum(&self) -> Vec2 {
        self.gravitating().into_iter().filter_map(|r| self.get(r)).map(Kinematics::momentum).sum()
    }
}
