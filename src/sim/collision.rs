//! Collision detection
//!
//! Brute-force overlap tests between the pairs of body types that interact:
//! ship/asteroid, ship/ship, asteroid/asteroid, bullet/asteroid, and anything
//! against a black hole's accretion radius. Bullets never hit bullets or ships.
//!
//! When both bodies wrap, the second is compared at its periodic image nearest
//! the first. Results come back in detection order; response code must skip
//! pairs whose bodies were deactivated earlier in the same batch.

use glam::Vec2;

use super::body::{BodyRef, Entities};
use super::periodic::Domain;

/// Two overlapping bodies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionPair {
    pub a: BodyRef,
    pub b: BodyRef,
    /// Center distance at detection time
    pub distance: f32,
}

/// Circle overlap test. Returns the center distance if the circles overlap.
pub fn circles_overlap(
    domain: &Domain,
    pos_a: Vec2,
    radius_a: f32,
    pos_b: Vec2,
    radius_b: f32,
    periodic: bool,
) -> Option<f32> {
    let pos_b = if periodic { domain.nearest_image(pos_b, pos_a) } else { pos_b };
    let dist2 = (pos_b - pos_a).length_squared();
    let min_dist = radius_a + radius_b;
    (dist2 < min_dist * min_dist).then(|| dist2.sqrt())
}

/// Single-radius accretion test around a black hole at `hole_pos`
pub fn within_accretion(
    domain: &Domain,
    pos: Vec2,
    wraps: bool,
    hole_pos: Vec2,
    accretion_radius: f32,
) -> Option<f32> {
    let dist = domain.displacement(hole_pos, pos, wraps).length();
    (dist < accretion_radius).then_some(dist)
}

/// Every overlapping pair among active bodies
pub fn detect_collisions(entities: &Entities, domain: &Domain) -> Vec<CollisionPair> {
    let mut pairs = Vec::new();
    let Entities {
        ships,
        asteroids,
        bullets,
        black_holes,
        ..
    } = entities;

    // Ship vs asteroid; invulnerable ships pass through
    for (i, ship) in ships.iter().enumerate() {
        if !ship.body.active || ship.is_invulnerable() {
            continue;
        }
        for (j, rock) in asteroids.iter().enumerate().filter(|(_, a)| a.body.active) {
            let periodic = ship.body.wraps && rock.body.wraps;
            if let Some(distance) =
                circles_overlap(domain, ship.body.pos, ship.radius, rock.body.pos, rock.radius, periodic)
            {
                pairs.push(CollisionPair {
                    a: BodyRef::ship(i),
                    b: BodyRef::asteroid(j),
                    distance,
                });
            }
        }
    }

    // Ship vs ship
    for i in 0..ships.len() {
        if !ships[i].body.active {
            continue;
        }
        for j in (i + 1)..ships.len() {
            let (s1, s2) = (&ships[i], &ships[j]);
            if !s2.body.active {
                continue;
            }
            let periodic = s1.body.wraps && s2.body.wraps;
            if let Some(distance) = circles_overlap(domain, s1.body.pos, s1.radius, s2.body.pos, s2.radius, periodic) {
                pairs.push(CollisionPair {
                    a: BodyRef::ship(i),
                    b: BodyRef::ship(j),
                    distance,
                });
            }
        }
    }

    // Asteroid vs asteroid
    for i in 0..asteroids.len() {
        if !asteroids[i].body.active {
            continue;
        }
        for j in (i + 1)..asteroids.len() {
            let (a1, a2) = (&asteroids[i], &asteroids[j]);
            if !a2.body.active {
                continue;
            }
            let periodic = a1.body.wraps && a2.body.wraps;
            if let Some(distance) = circles_overlap(domain, a1.body.pos, a1.radius, a2.body.pos, a2.radius, periodic) {
                pairs.push(CollisionPair {
                    a: BodyRef::asteroid(i),
                    b: BodyRef::asteroid(j),
                    distance,
                });
            }
        }
    }

    // Bullet vs asteroid
    for (i, bullet) in bullets.iter().enumerate().filter(|(_, b)| b.body.active) {
        for (j, rock) in asteroids.iter().enumerate().filter(|(_, a)| a.body.active) {
            let periodic = bullet.body.wraps && rock.body.wraps;
            if let Some(distance) =
                circles_overlap(domain, bullet.body.pos, bullet.radius, rock.body.pos, rock.radius, periodic)
            {
                pairs.push(CollisionPair {
                    a: BodyRef::bullet(i),
                    b: BodyRef::asteroid(j),
                    distance,
                });
            }
        }
    }

    // Accretion: the consumed body first, the black hole second
    for (h, hole) in black_holes.iter().enumerate().filter(|(_, b)| b.body.active) {
        let hole_ref = BodyRef::black_hole(h);
        let bodies = ships
            .iter()
            .enumerate()
            .map(|(i, s)| (BodyRef::ship(i), &s.body))
            .chain(asteroids.iter().enumerate().map(|(i, a)| (BodyRef::asteroid(i), &a.body)))
            .chain(bullets.iter().enumerate().map(|(i, b)| (BodyRef::bullet(i), &b.body)));

        for (r, body) in bodies.filter(|(_, b)| b.active) {
            if let Some(distance) = within_accretion(domain, body.pos, body.wraps, hole.body.pos, hole.accretion_radius) {
                pairs.push(CollisionPair {
                    a: r,
                    b: hole_ref,
                    distance,
                });
            }
        }
    }

    log::trace!("detected {} collision pairs", pairs.len());
    pairs
}
