//! Collision response
//!
//! One entry point per pair type, each mutating its arguments in place:
//! - ship/asteroid: lose a life, respawn or die, explode at the contact point
//! - ship/ship: equal-mass elastic bounce
//! - asteroid/asteroid: mass-weighted elastic bounce, or inelastic merge
//! - bullet/asteroid: bullet consumed, asteroid splits in two or is destroyed
//! - black hole: anything inside the accretion radius is consumed
//!
//! [`resolve_collisions`] walks detected pairs in order and skips any pair
//! whose bodies were deactivated earlier in the batch.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use rand::Rng;

use super::body::{
    Asteroid, BlackHole, BodyKind, Bullet, Entities, IdAllocator, Particle, Ship, asteroid_mass,
};
use super::collision::CollisionPair;
use super::periodic::Domain;
use crate::config::AsteroidContact;
use crate::consts::{CONTACT_EPSILON, PARTICLE_LIFETIME};

/// Particle colour for neutral debris
pub const NEUTRAL: i32 = -1;

/// Parameters of one particle burst
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Burst {
    pub pos: Vec2,
    pub count: u32,
    pub speed_min: f32,
    pub speed_max: f32,
    /// Scales the base particle lifetime
    pub lifetime_mult: f32,
    /// -1 for neutral/white, else the ship's player id
    pub player_id: i32,
}

impl Burst {
    /// Plain white debris
    pub fn debris(pos: Vec2, count: u32) -> Self {
        Self {
            pos,
            count,
            speed_min: 50.0,
            speed_max: 150.0,
            lifetime_mult: 1.0,
            player_id: NEUTRAL,
        }
    }
}

/// Emit `burst.count` particles flying out in random directions
pub fn emit_explosion<R: Rng + ?Sized>(particles: &mut Vec<Particle>, rng: &mut R, burst: &Burst) {
    // Bounds may arrive in either order from callers building `Burst` by hand
    let lo = burst.speed_min.min(burst.speed_max);
    let hi = burst.speed_min.max(burst.speed_max);
    if !(lo.is_finite() && hi.is_finite()) {
        log::warn!("explosion with non-finite speed band {lo}..{hi} dropped");
        return;
    }
    particles.reserve(burst.count as usize);
    for _ in 0..burst.count {
        let angle = rng.random_range(0.0..TAU);
        let speed = rng.random_range(lo..=hi);
        particles.push(Particle::new(
            burst.pos,
            Vec2::from_angle(angle) * speed,
            PARTICLE_LIFETIME * burst.lifetime_mult,
            burst.player_id,
        ));
    }
}

/// Unit normal from `a` to `b` and the center distance, or `None` when coincident
fn contact_normal(domain: &Domain, a: Vec2, b: Vec2) -> Option<(Vec2, f32)> {
    let dr = domain.minimum_image(b - a);
    let dist = dr.length();
    (dist >= CONTACT_EPSILON).then(|| (dr / dist, dist))
}

/// Point on the ship's hull nearest the asteroid
pub fn ship_contact_point(domain: &Domain, ship: &Ship, other: Vec2) -> Vec2 {
    match contact_normal(domain, ship.body.pos, other) {
        Some((normal, _)) => ship.body.pos + normal * ship.radius,
        None => ship.body.pos,
    }
}

/// Ship hit an asteroid. The asteroid is unaffected.
pub fn handle_ship_asteroid<R: Rng + ?Sized>(
    ship: &mut Ship,
    asteroid: &Asteroid,
    domain: &Domain,
    particles: &mut Vec<Particle>,
    rng: &mut R,
) {
    let contact = ship_contact_point(domain, ship, asteroid.body.pos);
    let player = ship.player_id;

    if ship.lose_life() {
        log::info!("ship {} (player {player}) destroyed by asteroid {}", ship.body.id, asteroid.body.id);
        // Impact flash followed by the hull breaking up
        emit_explosion(
            particles,
            rng,
            &Burst {
                pos: contact,
                count: 50,
                speed_min: 150.0,
                speed_max: 350.0,
                lifetime_mult: 1.3,
                player_id: player,
            },
        );
        emit_explosion(
            particles,
            rng,
            &Burst {
                pos: ship.body.pos,
                count: 40,
                speed_min: 100.0,
                speed_max: 300.0,
                lifetime_mult: 1.5,
                player_id: player,
            },
        );
    } else {
        emit_explosion(
            particles,
            rng,
            &Burst {
                pos: contact,
                count: 40,
                speed_min: 150.0,
                speed_max: 350.0,
                lifetime_mult: 1.3,
                player_id: player,
            },
        );
        ship.respawn(domain.center());
    }
}

/// Equal-mass elastic bounce between two ships
pub fn handle_ship_ship(ship1: &mut Ship, ship2: &mut Ship, domain: &Domain) {
    let Some((normal, dist)) = contact_normal(domain, ship1.body.pos, ship2.body.pos) else {
        return;
    };

    let rel_vel = ship2.body.vel - ship1.body.vel;
    let vel_along_normal = rel_vel.dot(normal);
    // Already separating: resolved earlier or moving apart
    if vel_along_normal > 0.0 {
        return;
    }

    let impulse = -2.0 * vel_along_normal / 2.0;
    ship1.body.vel -= normal * impulse;
    ship2.body.vel += normal * impulse;

    let overlap = ship1.radius + ship2.radius - dist;
    if overlap > 0.0 {
        let separation = normal * (overlap * 0.5);
        ship1.body.pos = domain.wrap(ship1.body.pos - separation);
        ship2.body.pos = domain.wrap(ship2.body.pos + separation);
    }
}

/// Mass-weighted elastic bounce between two asteroids
pub fn handle_asteroid_asteroid(a1: &mut Asteroid, a2: &mut Asteroid, domain: &Domain) {
    const RESTITUTION: f32 = 1.0;

    let Some((normal, dist)) = contact_normal(domain, a1.body.pos, a2.body.pos) else {
        return;
    };

    let rel_vel = a2.body.vel - a1.body.vel;
    let vel_along_normal = rel_vel.dot(normal);
    if vel_along_normal > 0.0 {
        return;
    }

    let (m1, m2) = (a1.body.mass, a2.body.mass);
    let impulse = -(1.0 + RESTITUTION) * vel_along_normal / (1.0 / m1 + 1.0 / m2);
    a1.body.vel -= normal * (impulse / m1);
    a2.body.vel += normal * (impulse / m2);

    // Heavier body moves less
    let overlap = a1.radius + a2.radius - dist;
    if overlap > 0.0 {
        let total = m1 + m2;
        a1.body.pos = domain.wrap(a1.body.pos - normal * (overlap * m2 / total));
        a2.body.pos = domain.wrap(a2.body.pos + normal * (overlap * m1 / total));
    }
}

/// Inelastic merge: `a1` absorbs `a2`, conserving mass and momentum
pub fn merge_asteroids(a1: &mut Asteroid, a2: &mut Asteroid, domain: &Domain) {
    let (m1, m2) = (a1.body.mass, a2.body.mass);
    let total = m1 + m2;
    if total <= 0.0 {
        return;
    }
    let pos2 = domain.nearest_image(a2.body.pos, a1.body.pos);

    a1.body.vel = (a1.body.momentum() + a2.body.momentum()) / total;
    a1.body.pos = domain.wrap((a1.body.pos * m1 + pos2 * m2) / total);
    a1.body.mass = total;
    // Area-preserving radius; the bigger class survives
    a1.radius = (a1.radius * a1.radius + a2.radius * a2.radius).sqrt();
    a1.size_class = a1.size_class.min(a2.size_class);

    a2.body.active = false;
    log::debug!("asteroid {} merged into {}", a2.body.id, a1.body.id);
}

/// Outcome of a bullet strike
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulletHit {
    /// Asteroid split into two fragments
    Split,
    /// Dust-class asteroid destroyed outright
    Destroyed,
}

/// Bullet struck an asteroid. Fragments are pushed to `spawned`.
///
/// Fragments fly apart at a fixed 100-200 u/s plus 30% of the parent's
/// velocity. This is deliberately not momentum-conserving.
pub fn handle_bullet_asteroid<R: Rng + ?Sized>(
    bullet: &mut Bullet,
    asteroid: &mut Asteroid,
    domain: &Domain,
    particles: &mut Vec<Particle>,
    spawned: &mut Vec<Asteroid>,
    ids: &mut IdAllocator,
    rng: &mut R,
) -> BulletHit {
    bullet.body.active = false;
    asteroid.body.active = false;

    if asteroid.is_dust() {
        emit_explosion(particles, rng, &Burst::debris(asteroid.body.pos, 15));
        log::debug!("asteroid {} destroyed", asteroid.body.id);
        return BulletHit::Destroyed;
    }

    // Recover the class-0 mass from this body's own mass so merged or
    // re-tuned asteroids split consistently
    let base_mass = asteroid.body.mass * (1u32 << asteroid.size_class) as f32;
    let child_class = asteroid.size_class + 1;
    let axis = Vec2::from_angle(rng.random_range(0.0..TAU));

    for i in 0..2 {
        let dir = axis.rotate(Vec2::from_angle(i as f32 * PI));
        let pos = domain.wrap(asteroid.body.pos + dir * (asteroid.radius * 1.5));
        let speed = rng.random_range(100.0..=200.0);
        let vel = asteroid.body.vel * 0.3 + dir * speed;
        let spin = rng.random_range(-0.5..0.5);
        let fragment = Asteroid::new(ids.next_id(), pos, vel, child_class, base_mass, spin);
        debug_assert!((fragment.body.mass - asteroid_mass(base_mass, child_class)).abs() <= f32::EPSILON * base_mass);
        spawned.push(fragment);
    }

    emit_explosion(particles, rng, &Burst::debris(asteroid.body.pos, 8));
    log::debug!("asteroid {} split into class {child_class}", asteroid.body.id);
    BulletHit::Split
}

/// A body caught inside a black hole's accretion radius
pub enum Accreted<'a> {
    Ship(&'a mut Ship),
    Asteroid(&'a mut Asteroid),
    Bullet(&'a mut Bullet),
}

/// Consume a body that crossed into the accretion radius
///
/// Ships take damage and respawn as if hit by an asteroid; anything else is
/// destroyed and its mass added to the hole.
pub fn handle_black_hole_accretion<R: Rng + ?Sized>(
    body: Accreted<'_>,
    hole: &mut BlackHole,
    domain: &Domain,
    particles: &mut Vec<Particle>,
    rng: &mut R,
) {
    match body {
        Accreted::Ship(ship) => {
            let pos = ship.body.pos;
            let player = ship.player_id;
            if ship.lose_life() {
                log::info!("ship {} (player {player}) swallowed by black hole {}", ship.body.id, hole.body.id);
                emit_explosion(
                    particles,
                    rng,
                    &Burst {
                        pos,
                        count: 60,
                        speed_min: 50.0,
                        speed_max: 250.0,
                        lifetime_mult: 2.0,
                        player_id: player,
                    },
                );
            } else {
                emit_explosion(
                    particles,
                    rng,
                    &Burst {
                        pos,
                        count: 40,
                        speed_min: 50.0,
                        speed_max: 200.0,
                        lifetime_mult: 1.5,
                        player_id: player,
                    },
                );
                ship.respawn(domain.center());
            }
        }
        Accreted::Asteroid(asteroid) => {
            swallow(&mut asteroid.body, hole, particles, rng);
        }
        Accreted::Bullet(bullet) => {
            swallow(&mut bullet.body, hole, particles, rng);
        }
    }
}

fn swallow<R: Rng + ?Sized>(
    body: &mut super::body::Kinematics,
    hole: &mut BlackHole,
    particles: &mut Vec<Particle>,
    rng: &mut R,
) {
    body.active = false;
    hole.body.mass += body.mass;
    emit_explosion(particles, rng, &Burst::debris(body.pos, 20));
    log::debug!("black hole {} accreted body {}", hole.body.id, body.id);
}

/// Counts from one batch of collision responses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    pub resolved: usize,
    /// Pairs skipped because a body was already gone
    pub skipped: usize,
    pub asteroids_split: usize,
    pub asteroids_destroyed: usize,
    pub accreted: usize,
    /// Owner of every bullet that hit an asteroid, in resolution order
    pub asteroid_hits: Vec<i32>,
}

/// Shared inputs for [`resolve_collisions`]
pub struct ResponseContext<'a, R: Rng + ?Sized> {
    pub domain: Domain,
    pub asteroid_contact: AsteroidContact,
    pub ids: &'a mut IdAllocator,
    pub rng: &'a mut R,
}

/// Two distinct mutable elements of one slice
fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> Option<(&mut T, &mut T)> {
    if i == j || i >= items.len() || j >= items.len() {
        return None;
    }
    if i < j {
        let (lo, hi) = items.split_at_mut(j);
        Some((&mut lo[i], &mut hi[0]))
    } else {
        let (lo, hi) = items.split_at_mut(i);
        Some((&mut hi[0], &mut lo[j]))
    }
}

/// Resolve detected pairs in detection order, then append any fragments
pub fn resolve_collisions<R: Rng + ?Sized>(
    entities: &mut Entities,
    pairs: &[CollisionPair],
    ctx: &mut ResponseContext<'_, R>,
) -> ResolveReport {
    let mut report = ResolveReport::default();
    let mut spawned = Vec::new();
    let domain = ctx.domain;

    for pair in pairs {
        if !entities.is_active(pair.a) || !entities.is_active(pair.b) {
            report.skipped += 1;
            continue;
        }
        let Entities {
            ships,
            asteroids,
            bullets,
            black_holes,
            particles,
        } = entities;
        let (a, b) = (pair.a.index, pair.b.index);

        match (pair.a.kind, pair.b.kind) {
            (BodyKind::Ship, BodyKind::Asteroid) => {
                handle_ship_asteroid(&mut ships[a], &asteroids[b], &domain, particles, ctx.rng);
            }
            (BodyKind::Asteroid, BodyKind::Ship) => {
                handle_ship_asteroid(&mut ships[b], &asteroids[a], &domain, particles, ctx.rng);
            }
            (BodyKind::Ship, BodyKind::Ship) => {
                if let Some((s1, s2)) = pair_mut(ships, a, b) {
                    handle_ship_ship(s1, s2, &domain);
                }
            }
            (BodyKind::Asteroid, BodyKind::Asteroid) => {
                if let Some((a1, a2)) = pair_mut(asteroids, a, b) {
                    match ctx.asteroid_contact {
                        AsteroidContact::Bounce => handle_asteroid_asteroid(a1, a2, &domain),
                        AsteroidContact::Merge => merge_asteroids(a1, a2, &domain),
                    }
                }
            }
            (BodyKind::Bullet, BodyKind::Asteroid) | (BodyKind::Asteroid, BodyKind::Bullet) => {
                let (bi, ai) = if pair.a.kind == BodyKind::Bullet { (a, b) } else { (b, a) };
                let bullet = &mut bullets[bi];
                let owner = bullet.owner;
                let hit = handle_bullet_asteroid(
                    bullet,
                    &mut asteroids[ai],
                    &domain,
                    particles,
                    &mut spawned,
                    ctx.ids,
                    ctx.rng,
                );
                match hit {
                    BulletHit::Split => report.asteroids_split += 1,
                    BulletHit::Destroyed => report.asteroids_destroyed += 1,
                }
                report.asteroid_hits.push(owner);
            }
            (kind, BodyKind::BlackHole) | (BodyKind::BlackHole, kind) => {
                let (body_idx, hole_idx) = if pair.b.kind == BodyKind::BlackHole { (a, b) } else { (b, a) };
                let hole = &mut black_holes[hole_idx];
                let body = match kind {
                    BodyKind::Ship => Accreted::Ship(&mut ships[body_idx]),
                    BodyKind::Asteroid => Accreted::Asteroid(&mut asteroids[body_idx]),
                    BodyKind::Bullet => Accreted::Bullet(&mut bullets[body_idx]),
                    BodyKind::BlackHole | BodyKind::Particle => {
                        report.skipped += 1;
                        continue;
                    }
                };
                handle_black_hole_accretion(body, hole, &domain, particles, ctx.rng);
                report.accreted += 1;
            }
            (ka, kb) => {
                log::warn!("no response for {ka:?}/{kb:?} pair");
                report.skipped += 1;
                continue;
            }
        }
        report.resolved += 1;
    }

    entities.asteroids.extend(spawned);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::body::{BodyRef, DUST_SIZE_CLASS};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn domain() -> Domain {
        Domain::new(1000.0, 800.0)
    }

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(7)
    }

    fn rock(id: u32, pos: Vec2, vel: Vec2, class: u8) -> Asteroid {
        Asteroid::new(id, pos, vel, class, 6000.0, 0.0)
    }

    fn ship(id: u32, pos: Vec2, vel: Vec2) -> Ship {
        let mut s = Ship::new(id, pos, id as i32, SHIP_MASS);
        s.body.vel = vel;
        s.invulnerable_time = 0.0;
        s
    }

    #[test]
    fn test_explosion_particles_in_speed_band() {
        let mut particles = Vec::new();
        let burst = Burst {
            pos: Vec2::new(10.0, 20.0),
            count: 30,
            speed_min: 150.0,
            speed_max: 350.0,
            lifetime_mult: 1.3,
            player_id: 1,
        };
        emit_explosion(&mut particles, &mut rng(), &burst);
        assert_eq!(particles.len(), 30);
        for p in &particles {
            let speed = p.vel.length();
            assert!((149.9..=350.1).contains(&speed), "speed {speed}");
            assert!((p.max_lifetime - 1.3).abs() < 1e-6);
            assert_eq!(p.player_id, 1);
            assert_eq!(p.pos, burst.pos);
        }
    }

    #[test]
    fn test_explosion_accepts_reversed_speed_band() {
        let mut particles = Vec::new();
        let burst = Burst {
            speed_min: 300.0,
            speed_max: 100.0,
            ..Burst::debris(Vec2::ZERO, 12)
        };
        emit_explosion(&mut particles, &mut rng(), &burst);
        assert_eq!(particles.len(), 12);
        for p in &particles {
            let speed = p.vel.length();
            assert!((99.9..=300.1).contains(&speed), "speed {speed}");
        }

        let bad = Burst {
            speed_min: f32::NAN,
            ..Burst::debris(Vec2::ZERO, 5)
        };
        emit_explosion(&mut particles, &mut rng(), &bad);
        assert_eq!(particles.len(), 12);
    }

    #[test]
    fn test_ship_asteroid_respawns_with_lives_left() {
        let d = domain();
        let mut s = ship(0, Vec2::new(100.0, 100.0), Vec2::new(30.0, 0.0));
        let a = rock(1, Vec2::new(130.0, 100.0), Vec2::ZERO, 0);
        let mut particles = Vec::new();
        handle_ship_asteroid(&mut s, &a, &d, &mut particles, &mut rng());

        assert_eq!(s.lives, SHIP_LIVES - 1);
        assert!(s.body.active);
        assert!(s.is_invulnerable());
        assert_eq!(s.body.pos, d.center());
        assert_eq!(s.body.vel, Vec2::ZERO);
        assert_eq!(particles.len(), 40);
        // Burst sits on the hull facing the asteroid
        assert!((particles[0].pos - Vec2::new(110.0, 100.0)).length() < 1e-4);
    }

    #[test]
    fn test_contact_point_through_seam() {
        let d = domain();
        let s = ship(0, Vec2::new(995.0, 400.0), Vec2::ZERO);
        let p = ship_contact_point(&d, &s, Vec2::new(15.0, 400.0));
        assert!((p - Vec2::new(1005.0, 400.0)).length() < 1e-3);
    }

    #[test]
    fn test_ship_ship_bounce_exchanges_velocity() {
        let d = domain();
        let mut s1 = ship(0, Vec2::new(100.0, 100.0), Vec2::new(50.0, 0.0));
        let mut s2 = ship(1, Vec2::new(115.0, 100.0), Vec2::new(-20.0, 0.0));
        handle_ship_ship(&mut s1, &mut s2, &d);
        assert!((s1.body.vel.x - (-20.0)).abs() < 1e-4);
        assert!((s2.body.vel.x - 50.0).abs() < 1e-4);
        // Pushed apart to just touching
        let gap = (s2.body.pos - s1.body.pos).length();
        assert!((gap - 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_separating_ships_untouched() {
        let d = domain();
        let mut s1 = ship(0, Vec2::new(100.0, 100.0), Vec2::new(-50.0, 0.0));
        let mut s2 = ship(1, Vec2::new(115.0, 100.0), Vec2::new(20.0, 0.0));
        handle_ship_ship(&mut s1, &mut s2, &d);
        assert_eq!(s1.body.vel, Vec2::new(-50.0, 0.0));
        assert_eq!(s1.body.pos, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_coincident_asteroids_skipped() {
        let d = domain();
        let mut a1 = rock(0, Vec2::new(100.0, 100.0), Vec2::X, 0);
        let mut a2 = rock(1, Vec2::new(100.0, 100.0), -Vec2::X, 0);
        handle_asteroid_asteroid(&mut a1, &mut a2, &d);
        assert_eq!(a1.body.vel, Vec2::X);
        assert!(is_finite(&a1) && is_finite(&a2));
    }

    fn is_finite(a: &Asteroid) -> bool {
        crate::is_finite_vec(a.body.pos) && crate::is_finite_vec(a.body.vel)
    }

    #[test]
    fn test_heavier_asteroid_moves_less() {
        let d = domain();
        let mut big = rock(0, Vec2::new(100.0, 100.0), Vec2::ZERO, 0);
        let mut small = rock(1, Vec2::new(150.0, 100.0), Vec2::new(-10.0, 0.0), 2);
        let (p_big, p_small) = (big.body.pos, small.body.pos);
        handle_asteroid_asteroid(&mut big, &mut small, &d);
        let moved_big = (big.body.pos - p_big).length();
        let moved_small = (small.body.pos - p_small).length();
        assert!(moved_big < moved_small);
        assert!(((moved_big + moved_small) - 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_merge_conserves_mass_and_momentum() {
        let d = domain();
        let mut a1 = rock(0, Vec2::new(990.0, 400.0), Vec2::new(10.0, 0.0), 0);
        let mut a2 = rock(1, Vec2::new(20.0, 400.0), Vec2::new(-5.0, 3.0), 1);
        let mass = a1.body.mass + a2.body.mass;
        let momentum = a1.body.momentum() + a2.body.momentum();
        merge_asteroids(&mut a1, &mut a2, &d);

        assert!(!a2.body.active);
        assert!((a1.body.mass - mass).abs() < 1e-3);
        assert!((a1.body.momentum() - momentum).length() < 1e-2);
        assert_eq!(a1.size_class, 0);
        // Center of mass across the seam stays near the seam
        let x = a1.body.pos.x;
        assert!(x > 990.0 || x < 20.0, "merged at {x}");
    }

    #[test]
    fn test_bullet_splits_asteroid() {
        let d = domain();
        let mut ids = IdAllocator::new();
        let mut bullet = Bullet::new(ids.next_id(), Vec2::new(460.0, 400.0), Vec2::X, 0, BULLET_MASS);
        let mut parent = rock(ids.next_id(), Vec2::new(500.0, 400.0), Vec2::new(10.0, 0.0), 0);
        let mut particles = Vec::new();
        let mut spawned = Vec::new();
        let hit = handle_bullet_asteroid(&mut bullet, &mut parent, &d, &mut particles, &mut spawned, &mut ids, &mut rng());

        assert_eq!(hit, BulletHit::Split);
        assert!(!bullet.body.active && !parent.body.active);
        assert_eq!(spawned.len(), 2);
        assert_eq!(particles.len(), 8);
        for f in &spawned {
            assert_eq!(f.size_class, 1);
            assert_eq!(f.radius, 25.0);
            assert!((f.body.mass - 3000.0).abs() < 1e-3);
            assert!(f.body.id >= 2);
            // Offset along the split axis by 1.5 parent radii
            assert!(((f.body.pos - parent.body.pos).length() - 60.0).abs() < 1e-3);
            // Separation speed band plus 30% of parent velocity
            let sep = (f.body.vel - parent.body.vel * 0.3).length();
            assert!((99.9..=200.1).contains(&sep), "separation {sep}");
        }
        // Fragments leave in opposite directions
        let d0 = spawned[0].body.pos - parent.body.pos;
        let d1 = spawned[1].body.pos - parent.body.pos;
        assert!((d0 + d1).length() < 1e-3);
    }

    #[test]
    fn test_bullet_destroys_dust() {
        let d = domain();
        let mut ids = IdAllocator::new();
        let mut bullet = Bullet::new(0, Vec2::new(500.0, 400.0), Vec2::X, 0, BULLET_MASS);
        let mut dust = rock(1, Vec2::new(501.0, 400.0), Vec2::ZERO, DUST_SIZE_CLASS);
        let mut particles = Vec::new();
        let mut spawned = Vec::new();
        let hit = handle_bullet_asteroid(&mut bullet, &mut dust, &d, &mut particles, &mut spawned, &mut ids, &mut rng());
        assert_eq!(hit, BulletHit::Destroyed);
        assert!(spawned.is_empty());
        assert!(!dust.body.active);
        // Destruction is louder than a split
        assert_eq!(particles.len(), 15);
    }

    #[test]
    fn test_black_hole_swallows_asteroid() {
        let d = domain();
        let mut hole = BlackHole::new(0, Vec2::new(500.0, 400.0), Vec2::ZERO, 50_000.0, 25.0);
        let mut a = rock(1, Vec2::new(510.0, 400.0), Vec2::ZERO, 2);
        let mass = a.body.mass;
        let mut particles = Vec::new();
        handle_black_hole_accretion(Accreted::Asteroid(&mut a), &mut hole, &d, &mut particles, &mut rng());
        assert!(!a.body.active);
        assert!((hole.body.mass - (50_000.0 + mass)).abs() < 1e-2);
        assert_eq!(particles.len(), 20);
        assert!(particles.iter().all(|p| p.player_id == NEUTRAL));
    }

    #[test]
    fn test_black_hole_damages_ship() {
        let d = domain();
        let mut hole = BlackHole::new(0, Vec2::new(500.0, 400.0), Vec2::ZERO, 50_000.0, 25.0);
        let mut s = ship(1, Vec2::new(505.0, 400.0), Vec2::ZERO);
        let mut particles = Vec::new();
        handle_black_hole_accretion(Accreted::Ship(&mut s), &mut hole, &d, &mut particles, &mut rng());
        assert_eq!(s.lives, SHIP_LIVES - 1);
        assert!(s.body.active);
        assert_eq!(s.body.pos, d.center());
        assert_eq!(particles.len(), 40);
        assert!(particles.iter().all(|p| p.player_id == 1));
        assert_eq!(hole.body.mass, 50_000.0);
    }

    #[test]
    fn test_resolve_skips_consumed_bodies() {
        // Two bullets hit the same asteroid in one batch; only the first counts
        let d = domain();
        let mut e = Entities::new();
        e.asteroids.push(rock(0, Vec2::new(500.0, 400.0), Vec2::ZERO, 0));
        e.bullets.push(Bullet::new(1, Vec2::new(470.0, 400.0), Vec2::ZERO, 0, BULLET_MASS));
        e.bullets.push(Bullet::new(2, Vec2::new(530.0, 400.0), Vec2::ZERO, 0, BULLET_MASS));
        let pairs = [
            CollisionPair { a: BodyRef::bullet(0), b: BodyRef::asteroid(0), distance: 30.0 },
            CollisionPair { a: BodyRef::bullet(1), b: BodyRef::asteroid(0), distance: 30.0 },
        ];
        let mut ids = IdAllocator::new();
        let mut r = rng();
        let mut ctx = ResponseContext {
            domain: d,
            asteroid_contact: AsteroidContact::Bounce,
            ids: &mut ids,
            rng: &mut r,
        };
        let report = resolve_collisions(&mut e, &pairs, &mut ctx);

        assert_eq!(report.resolved, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.asteroids_split, 1);
        assert_eq!(report.asteroid_hits, vec![0]);
        assert!(e.bullets[1].body.active);
        // Fragments appended after the batch
        assert_eq!(e.asteroids.len(), 3);
        assert!(e.asteroids[1].body.active && e.asteroids[2].body.active);
    }

    #[test]
    fn test_pair_mut() {
        let mut v = [1, 2, 3];
        let (a, b) = pair_mut(&mut v, 2, 0).unwrap();
        std::mem::swap(a, b);
        assert_eq!(v, [3, 2, 1]);
        assert!(pair_mut(&mut v, 1, 1).is_none());
        assert!(pair_mut(&mut v, 0, 5).is_none());
    }

    fn speed() -> impl Strategy<Value = f32> {
        (-20_000i32..20_000i32).prop_map(|v| v as f32 * 0.01)
    }

    proptest! {
        #[test]
        fn asteroid_bounce_conserves_momentum(
            k1 in 0u8..=DUST_SIZE_CLASS, k2 in 0u8..=DUST_SIZE_CLASS,
            v1x in speed(), v1y in speed(), v2x in speed(), v2y in speed(),
            angle in 0.0f32..TAU,
        ) {
            let d = domain();
            let p1 = Vec2::new(500.0, 400.0);
            let mut a1 = rock(0, p1, Vec2::new(v1x, v1y), k1);
            let gap = (a1.radius + crate::sim::body::asteroid_radius(k2)) * 0.9;
            let mut a2 = rock(1, p1 + Vec2::from_angle(angle) * gap, Vec2::new(v2x, v2y), k2);
            let before = a1.body.momentum() + a2.body.momentum();
            let scale = a1.body.momentum().length() + a2.body.momentum().length() + 1.0;

            handle_asteroid_asteroid(&mut a1, &mut a2, &d);
            let after = a1.body.momentum() + a2.body.momentum();
            prop_assert!((after - before).length() <= 1e-4 * scale, "{:?} -> {:?}", before, after);
        }

        #[test]
        fn ship_bounce_conserves_momentum(
            v1x in speed(), v1y in speed(), v2x in speed(), v2y in speed(),
            angle in 0.0f32..TAU,
        ) {
            let d = domain();
            let p1 = Vec2::new(500.0, 400.0);
            let mut s1 = ship(0, p1, Vec2::new(v1x, v1y));
            let mut s2 = ship(1, p1 + Vec2::from_angle(angle) * 15.0, Vec2::new(v2x, v2y));
            let before = s1.body.vel + s2.body.vel;
            handle_ship_ship(&mut s1, &mut s2, &d);
            let after = s1.body.vel + s2.body.vel;
            prop_assert!((after - before).length() < 1e-2);
        }

        #[test]
        fn split_conserves_mass(class in 0u8..DUST_SIZE_CLASS, seed in any::<u64>()) {
            let d = domain();
            let mut ids = IdAllocator::new();
            let mut bullet = Bullet::new(0, Vec2::new(500.0, 400.0), Vec2::ZERO, 0, BULLET_MASS);
            let mut parent = rock(1, Vec2::new(500.0, 400.0), Vec2::new(3.0, -4.0), class);
            let mut particles = Vec::new();
            let mut spawned = Vec::new();
            let mut r = Pcg32::seed_from_u64(seed);
            handle_bullet_asteroid(&mut bullet, &mut parent, &d, &mut particles, &mut spawned, &mut ids, &mut r);
            let total: f32 = spawned.iter().map(|f| f.body.mass).sum();
            prop_assert!((total - parent.body.mass).abs() <= 1e-3);
            prop_assert!(spawned.iter().all(|f| f.size_class == class + 1));
        }
    }
}
