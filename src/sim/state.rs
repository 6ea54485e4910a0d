//! Simulation state and spawning
//!
//! Everything a run needs to be reproduced lives here: the seed, the RNG
//! drawn from it, the config, and the entity collections.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::body::{Asteroid, BlackHole, Bullet, Entities, IdAllocator, Particle, Ship, asteroid_mass};
use super::periodic::Domain;
use super::potential::ExternalPotential;
use super::tick::ShipInput;
use crate::config::{DifficultyConfig, SimConfig};
use crate::consts::*;

/// Complete simulation state (deterministic for a given seed and input stream)
#[derive(Debug, Clone)]
pub struct SimState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub(crate) config: SimConfig,
    pub(crate) domain: Domain,
    pub(crate) potential: ExternalPotential,
    /// Level id the potential was built from
    pub(crate) level: u32,
    pub(crate) entities: Entities,
    /// Latest input per player slot
    pub(crate) inputs: Vec<ShipInput>,
    pub(crate) players: usize,
    /// Elapsed simulated seconds
    pub time: f32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Wave number; fixed at 1 since wave progression lives outside the core
    pub(crate) wave: u32,
    pub(crate) ids: IdAllocator,
}

impl SimState {
    /// Create a populated state: `players` ships and the opening asteroid field
    pub fn new(config: SimConfig, seed: u64, players: usize) -> Self {
        debug_assert!(config.validate().is_ok(), "invalid config: {:?}", config.validate());
        let domain = Domain::from(config.world);
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            config,
            domain,
            potential: ExternalPotential::None,
            level: 0,
            entities: Entities::new(),
            inputs: vec![ShipInput::default(); players],
            players,
            time: 0.0,
            time_ticks: 0,
            wave: 1,
            ids: IdAllocator::new(),
        };
        state.reset();
        state
    }

    /// Reseed the RNG from the stored seed and repopulate the field
    pub fn reset(&mut self) {
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.ids = IdAllocator::new();
        self.entities.clear();
        self.inputs = vec![ShipInput::default(); self.players];
        self.time = 0.0;
        self.time_ticks = 0;
        self.wave = 1;

        for i in 0..self.players {
            self.spawn_ship(i);
        }
        self.spawn_asteroid_field();

        log::info!(
            "reset: seed {} with {} ship(s), {} asteroid(s)",
            self.seed,
            self.entities.ships.len(),
            self.entities.asteroids.len()
        );
    }

    /// Allocate a new entity id
    pub fn next_entity_id(&mut self) -> u32 {
        self.ids.next_id()
    }

    /// Spawn the ship for player slot `player`
    pub fn spawn_ship(&mut self, player: usize) -> u32 {
        let id = self.next_entity_id();
        let pos = Vec2::new(
            self.domain.width * (0.3 + 0.4 * player as f32),
            self.domain.height * 0.5,
        );
        let pos = self.domain.wrap(pos);
        self.entities
            .ships
            .push(Ship::new(id, pos, player as i32, self.config.difficulty.ship_mass));
        id
    }

    pub fn spawn_asteroid(&mut self, pos: Vec2, vel: Vec2, size_class: u8) -> u32 {
        let id = self.next_entity_id();
        let spin = self.rng.random_range(-0.5..0.5);
        let pos = self.domain.wrap(pos);
        self.entities.asteroids.push(Asteroid::new(
            id,
            pos,
            vel,
            size_class,
            self.config.difficulty.asteroid_base_mass,
            spin,
        ));
        id
    }

    /// Large asteroids drifting in from the domain edges
    pub fn spawn_asteroid_field(&mut self) {
        let count = self.config.difficulty.asteroid_count + self.wave * 2;
        let speed = 20.0 + self.wave as f32 * 5.0;
        for _ in 0..count {
            let pos = self.random_edge_position();
            let vel = Vec2::from_angle(self.rng.random_range(0.0..TAU)) * speed;
            self.spawn_asteroid(pos, vel, 0);
        }
    }

    fn random_edge_position(&mut self) -> Vec2 {
        let (w, h) = (self.domain.width, self.domain.height);
        match self.rng.random_range(0..4u8) {
            0 => Vec2::new(self.rng.random_range(0.0..w), 0.0),
            1 => Vec2::new(w, self.rng.random_range(0.0..h)),
            2 => Vec2::new(self.rng.random_range(0.0..w), h),
            _ => Vec2::new(0.0, self.rng.random_range(0.0..h)),
        }
    }

    /// Black hole entering from a random edge, just outside the domain
    pub fn spawn_black_hole(&mut self) -> u32 {
        let (w, h) = (self.domain.width, self.domain.height);
        let off = BLACK_HOLE_ENTRY_OFFSET;
        let (pos, vel) = match self.rng.random_range(0..4u8) {
            0 => (
                Vec2::new(self.rng.random_range(0.0..w), -off),
                Vec2::new(self.rng.random_range(-50.0..50.0), self.rng.random_range(80.0..150.0)),
            ),
            1 => (
                Vec2::new(w + off, self.rng.random_range(0.0..h)),
                Vec2::new(self.rng.random_range(-150.0..-80.0), self.rng.random_range(-50.0..50.0)),
            ),
            2 => (
                Vec2::new(self.rng.random_range(0.0..w), h + off),
                Vec2::new(self.rng.random_range(-50.0..50.0), self.rng.random_range(-150.0..-80.0)),
            ),
            _ => (
                Vec2::new(-off, self.rng.random_range(0.0..h)),
                Vec2::new(self.rng.random_range(80.0..150.0), self.rng.random_range(-50.0..50.0)),
            ),
        };

        let difficulty = &self.config.difficulty;
        let mass = (BLACK_HOLE_BASE_MASS + self.wave as f32 * BLACK_HOLE_MASS_PER_WAVE) * difficulty.bh_mass_mult;
        let accretion_radius = difficulty.bh_accretion_radius;
        let id = self.next_entity_id();
        self.entities
            .black_holes
            .push(BlackHole::new(id, pos, vel, mass, accretion_radius));
        log::info!("black hole {id} spawned at {pos:?} with mass {mass}");
        id
    }

    /// Roll the per-tick spawn chance. Returns true if a black hole appeared.
    pub(crate) fn maybe_spawn_black_hole(&mut self) -> bool {
        let difficulty = self.config.difficulty;
        if difficulty.bh_enabled && self.rng.random::<f32>() < difficulty.bh_spawn_rate {
            self.spawn_black_hole();
            true
        } else {
            false
        }
    }

    /// Fire from ship `index` if its weapon is ready. Returns the bullet id.
    pub fn fire_bullet(&mut self, index: usize) -> Option<u32> {
        let ship = self.entities.ships.get(index)?;
        if !ship.body.active || !ship.can_shoot() {
            return None;
        }
        let dir = ship.heading();
        let pos = self.domain.wrap(ship.body.pos + dir * (ship.radius + BULLET_MUZZLE_OFFSET));
        let vel = ship.body.vel + dir * BULLET_SPEED;
        let owner = ship.player_id;

        let id = self.next_entity_id();
        self.entities
            .bullets
            .push(Bullet::new(id, pos, vel, owner, self.config.difficulty.bullet_mass));
        if let Some(ship) = self.entities.ships.get_mut(index) {
            ship.shoot_cooldown = SHIP_SHOOT_COOLDOWN;
        }
        Some(id)
    }

    // --- Input ---

    /// Latch the input for a player slot. Unknown slots are ignored.
    pub fn set_input(&mut self, player: usize, input: ShipInput) {
        if let Some(slot) = self.inputs.get_mut(player) {
            *slot = input;
        }
    }

    pub fn input(&self, player: usize) -> ShipInput {
        self.inputs.get(player).copied().unwrap_or_default()
    }

    // --- Runtime tuning ---

    pub fn set_ship_mass(&mut self, mass: f32) {
        debug_assert!(mass > 0.0);
        self.config.difficulty.ship_mass = mass;
        for ship in &mut self.entities.ships {
            ship.body.mass = mass;
        }
    }

    pub fn set_bullet_mass(&mut self, mass: f32) {
        debug_assert!(mass > 0.0);
        self.config.difficulty.bullet_mass = mass;
        for bullet in &mut self.entities.bullets {
            bullet.body.mass = mass;
        }
    }

    /// Change the class-0 asteroid mass and rescale every live asteroid by class
    pub fn set_asteroid_base_mass(&mut self, mass: f32) {
        debug_assert!(mass > 0.0);
        self.config.difficulty.asteroid_base_mass = mass;
        for asteroid in &mut self.entities.asteroids {
            asteroid.body.mass = asteroid_mass(mass, asteroid.size_class);
        }
    }

    pub fn set_black_holes_enabled(&mut self, enabled: bool) {
        self.config.difficulty.bh_enabled = enabled;
    }

    /// Replace the difficulty table; applies to future spawns
    pub fn set_difficulty(&mut self, difficulty: DifficultyConfig) {
        self.config.difficulty = difficulty;
    }

    pub fn set_potential(&mut self, potential: ExternalPotential) {
        self.potential = potential;
    }

    /// Select the tuned external potential for a level id
    pub fn set_level(&mut self, level: u32) {
        self.level = level;
        self.potential = ExternalPotential::for_level(level, self.domain.center(), self.domain.width);
        log::info!("level {level}: {}", self.potential.name());
    }

    /// Change the number of player slots and start over
    pub fn set_player_count(&mut self, players: usize) {
        self.players = players;
        self.reset();
    }

    // --- Accessors ---

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn potential(&self) -> &ExternalPotential {
        &self.potential
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn wave(&self) -> u32 {
        self.wave
    }

    pub fn entities(&self) -> &Entities {
        &self.entities
    }

    /// Direct mutable access for hosts and tests that stage scenes by hand
    pub fn entities_mut(&mut self) -> &mut Entities {
        &mut self.entities
    }

    pub fn ships(&self) -> &[Ship] {
        &self.entities.ships
    }

    pub fn asteroids(&self) -> &[Asteroid] {
        &self.entities.asteroids
    }

    pub fn bullets(&self) -> &[Bullet] {
        &self.entities.bullets
    }

    pub fn black_holes(&self) -> &[BlackHole] {
        &self.entities.black_holes
    }

    pub fn particles(&self) -> &[Particle] {
        &self.entities.particles
    }

    pub fn ship(&self, index: usize) -> Option<&Ship> {
        self.entities.ships.get(index)
    }

    pub fn asteroid(&self, index: usize) -> Option<&Asteroid> {
        self.entities.asteroids.get(index)
    }

    pub fn bullet(&self, index: usize) -> Option<&Bullet> {
        self.entities.bullets.get(index)
    }

    pub fn black_hole(&self, index: usize) -> Option<&BlackHole> {
        self.entities.black_holes.get(index)
    }

    /// No ship left flying
    pub fn is_game_over(&self) -> bool {
        !self.entities.ships.iter().any(|s| s.body.active)
    }
}
