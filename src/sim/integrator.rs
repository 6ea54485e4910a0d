//! Kick-drift-kick leapfrog integration
//!
//! Per step: build the tree, half-kick every body, drift (wrapping the bodies
//! that wrap), rebuild the tree, half-kick again. The order matters: it is what
//! makes the scheme time-reversible and second order in `dt`.

use glam::Vec2;

use super::body::{BodyRef, Entities};
use super::periodic::Domain;
use super::potential::ExternalPotential;
use super::quadtree::{GravityParams, QuadTree, Source};
use crate::config::PhysicsConfig;
use crate::consts::BLACK_HOLE_OFFSCREEN_MARGIN;
use crate::is_finite_vec;

/// What a step did besides moving bodies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Bodies integrated
    pub bodies: usize,
    /// Bodies frozen after their state went non-finite
    pub frozen: usize,
    /// Black holes dropped for leaving the domain
    pub departed: usize,
}

impl From<&PhysicsConfig> for GravityParams {
    fn from(p: &PhysicsConfig) -> Self {
        GravityParams {
            g: p.g,
            epsilon: p.epsilon,
            theta: p.theta,
        }
    }
}

/// Snapshot positions and masses of `handles` in handle order
fn sources(entities: &Entities, handles: &[BodyRef]) -> Vec<Source> {
    handles
        .iter()
        .filter_map(|&h| entities.get(h))
        .map(|b| Source::new(b.pos, b.mass))
        .collect()
}

/// Tree gravity plus external field for every handle, in handle order
pub fn accelerations(
    entities: &Entities,
    handles: &[BodyRef],
    domain: Domain,
    params: &GravityParams,
    potential: &ExternalPotential,
) -> Vec<Vec2> {
    let sources = sources(entities, handles);
    let tree = QuadTree::build(domain, &sources);
    sources
        .iter()
        .enumerate()
        .map(|(i, src)| tree.acceleration_on(i, params) + potential.acceleration_at(src.pos))
        .collect()
}

fn half_kick(
    entities: &mut Entities,
    handles: &[BodyRef],
    domain: Domain,
    params: &GravityParams,
    potential: &ExternalPotential,
    half_dt: f32,
) {
    let acc = accelerations(entities, handles, domain, params, potential);
    for (&h, a) in handles.iter().zip(acc) {
        if let Some(body) = entities.get_mut(h) {
            body.acc = a;
            body.vel += a * half_dt;
        }
    }
}

fn drift(entities: &mut Entities, handles: &[BodyRef], domain: Domain, dt: f32) {
    for &h in handles {
        if let Some(body) = entities.get_mut(h) {
            body.pos += body.vel * dt;
            if body.wraps {
                body.pos = domain.wrap(body.pos);
            }
        }
    }
}

/// Freeze bodies whose state went non-finite and return the ones still usable,
/// each with its pre-step position and velocity
fn freeze_non_finite(
    entities: &mut Entities,
    bodies: Vec<(BodyRef, (Vec2, Vec2))>,
    report: &mut StepReport,
) -> Vec<(BodyRef, (Vec2, Vec2))> {
    let mut live = Vec::with_capacity(bodies.len());
    for (h, (pos, vel)) in bodies {
        let Some(body) = entities.get_mut(h) else {
            continue;
        };
        if is_finite_vec(body.pos) && is_finite_vec(body.vel) {
            live.push((h, (pos, vel)));
        } else {
            log::warn!("body {} ({:?}) went non-finite; freezing at {:?}", body.id, h.kind, pos);
            body.pos = pos;
            body.vel = Vec2::ZERO;
            body.acc = Vec2::ZERO;
            report.frozen += 1;
        }
    }
    live
}

/// Advance every active gravitating body by one fixed step
pub fn leapfrog_step(
    entities: &mut Entities,
    domain: Domain,
    physics: &PhysicsConfig,
    potential: &ExternalPotential,
) -> StepReport {
    let handles = entities.gravitating();
    let params = GravityParams::from(physics);
    let dt = physics.dt;

    let before: Vec<(BodyRef, (Vec2, Vec2))> = handles
        .iter()
        .filter_map(|&h| entities.get(h).map(|b| (h, (b.pos, b.vel))))
        .collect();

    let mut report = StepReport {
        bodies: handles.len(),
        ..Default::default()
    };

    half_kick(entities, &handles, domain, &params, potential, dt * 0.5);
    drift(entities, &handles, domain, dt);

    // A body that blew up in the drift must not reach the second tree
    let live = freeze_non_finite(entities, before, &mut report);
    let live_handles: Vec<BodyRef> = live.iter().map(|&(h, _)| h).collect();
    half_kick(entities, &live_handles, domain, &params, potential, dt * 0.5);
    freeze_non_finite(entities, live, &mut report);

    for hole in entities.black_holes.iter_mut().filter(|b| b.body.active) {
        if domain.is_outside(hole.body.pos, BLACK_HOLE_OFFSCREEN_MARGIN) {
            log::debug!("black hole {} left the domain", hole.body.id);
            hole.body.active = false;
            report.departed += 1;
        }
    }

    report
}
