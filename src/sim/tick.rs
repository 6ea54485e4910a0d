//! Fixed timestep simulation tick
//!
//! One call advances the state by exactly one `dt`:
//! timers → ship input → leapfrog step → collision detection → collision
//! response → black hole spawn roll → purge of inactive bodies.

use serde::{Deserialize, Serialize};

use super::collision::detect_collisions;
use super::integrator::{StepReport, leapfrog_step};
use super::response::{ResolveReport, ResponseContext, resolve_collisions};
use super::state::SimState;
use crate::consts::*;

/// Control state for one ship during a tick (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipInput {
    /// Rotate counter-clockwise
    pub left: bool,
    /// Rotate clockwise
    pub right: bool,
    pub thrust: bool,
    pub brake: bool,
    pub shoot: bool,
}

/// Summary of what happened during one tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub step: StepReport,
    /// Overlapping pairs found after the step
    pub collisions: usize,
    pub resolve: ResolveReport,
    pub bullets_fired: usize,
    pub black_hole_spawned: bool,
}

/// Apply latched inputs to every active ship
fn apply_inputs(state: &mut SimState, dt: f32) -> usize {
    let mut fired = 0;
    for i in 0..state.entities.ships.len() {
        let input = state.input(i);
        let ship = &mut state.entities.ships[i];
        if !ship.body.active {
            continue;
        }
        if input.left {
            ship.rotate(-SHIP_TURN_RATE * dt);
        }
        if input.right {
            ship.rotate(SHIP_TURN_RATE * dt);
        }
        ship.thrusting = input.thrust;
        if input.thrust {
            ship.thrust(SHIP_THRUST, dt);
        }
        if input.brake {
            ship.brake(SHIP_THRUST, dt);
        }
        if input.shoot && state.fire_bullet(i).is_some() {
            fired += 1;
        }
    }
    fired
}

/// Advance the simulation by one fixed timestep
pub fn tick(state: &mut SimState) -> TickReport {
    let dt = state.config.physics.dt;
    let mut report = TickReport::default();

    state.entities.update_timers(dt);
    report.bullets_fired = apply_inputs(state, dt);

    report.step = leapfrog_step(
        &mut state.entities,
        state.domain,
        &state.config.physics,
        &state.potential,
    );

    let pairs = detect_collisions(&state.entities, &state.domain);
    report.collisions = pairs.len();

    let mut ctx = ResponseContext {
        domain: state.domain,
        asteroid_contact: state.config.physics.asteroid_contact,
        ids: &mut state.ids,
        rng: &mut state.rng,
    };
    report.resolve = resolve_collisions(&mut state.entities, &pairs, &mut ctx);

    report.black_hole_spawned = state.maybe_spawn_black_hole();

    // Handles from this tick are dead after this point
    state.entities.purge_inactive();

    state.time += dt;
    state.time_ticks += 1;
    report
}
