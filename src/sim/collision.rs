//! Collision detection and response
//!
//! Two contact classes: ball-peg (static circle) and ball-ball (equal mass).
//! Each pair is resolved once per tick in iteration order, no sub-stepping.

use glam::Vec2;
use rand::Rng;

use super::board::{Board, Peg};
use super::physics::spread;
use super::state::Ball;
use crate::settings::PhysicsTuning;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Contact normal, pointing from the obstacle toward the ball
    pub normal: Vec2,
    /// Overlap depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check overlap between two circles. Coincident centers count as a miss since
/// no normal can be derived.
pub fn circle_contact(pos: Vec2, radius: f32, other: Vec2, other_radius: f32) -> CollisionResult {
    let delta = pos - other;
    let distance = delta.length();
    let reach = radius + other_radius;

    if distance < reach && distance > 0.0 {
        CollisionResult {
            hit: true,
            normal: delta / distance,
            penetration: reach - distance,
        }
    } else {
        CollisionResult::miss()
    }
}

/// Reflect the normal component of `velocity`, scaled by `dampening`:
/// v' = v - 2 d (v·n) n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2, dampening: f32) -> Vec2 {
    velocity - 2.0 * dampening * velocity.dot(normal) * normal
}

/// Equal-mass elastic exchange: the balls swap their components along `normal`
/// and keep their tangential components. Momentum along the normal is conserved.
pub fn exchange_normal_velocities(v1: Vec2, v2: Vec2, normal: Vec2) -> (Vec2, Vec2) {
    let tangent = normal.perp();
    let (v1n, v1t) = (v1.dot(normal), v1.dot(tangent));
    let (v2n, v2t) = (v2.dot(normal), v2.dot(tangent));
    (normal * v2n + tangent * v1t, normal * v1n + tangent * v2t)
}

/// Resolve a ball against one peg. Returns true on contact.
pub fn resolve_ball_peg(
    ball: &mut Ball,
    peg: &Peg,
    board: &Board,
    tuning: &PhysicsTuning,
    rng: &mut impl Rng,
) -> bool {
    let contact = circle_contact(ball.pos, board.ball_radius, peg.pos, board.peg_radius);
    if !contact.hit {
        return false;
    }

    ball.pos += contact.normal * (contact.penetration + tuning.contact_slop);
    ball.vel = reflect_velocity(ball.vel, contact.normal, tuning.dampening);

    ball.vel.x += spread(rng, tuning.peg_jitter_x);
    ball.vel.y += rng.random::<f32>() * tuning.peg_jitter_y;

    // Glancing hits on top of a peg must not stall the ball
    ball.vel.y = ball.vel.y.max(tuning.peg_min_vy);
    true
}

/// Resolve two overlapping balls. Returns true on contact.
pub fn resolve_ball_pair(
    a: &mut Ball,
    b: &mut Ball,
    radius: f32,
    tuning: &PhysicsTuning,
    rng: &mut impl Rng,
) -> bool {
    // Normal points from a toward b
    let contact = circle_contact(b.pos, radius, a.pos, radius);
    if !contact.hit {
        return false;
    }

    let push = contact.normal * (contact.penetration / 2.0 + tuning.contact_slop);
    a.pos -= push;
    b.pos += push;

    let (va, vb) = exchange_normal_velocities(a.vel, b.vel, contact.normal);
    a.vel = va * tuning.dampening;
    b.vel = vb * tuning.dampening;

    for ball in [a, b] {
        ball.vel.x += spread(rng, tuning.ball_jitter_x);
        ball.vel.y += rng.random::<f32>() * tuning.ball_jitter_y;
    }
    true
}

/// Resolve every ball against every peg, then every gated ball pair.
/// Returns the number of contacts resolved.
pub fn resolve_collisions(
    balls: &mut [Ball],
    board: &Board,
    tuning: &PhysicsTuning,
    rng: &mut impl Rng,
) -> usize {
    let mut contacts = 0;

    for ball in balls.iter_mut() {
        for peg in board.pegs() {
            if resolve_ball_peg(ball, peg, board, tuning, rng) {
                contacts += 1;
            }
        }
    }

    // Balls only interact once both are below the first peg row
    let gate_y = board.first_row_y();
    for i in 0..balls.len() {
        let (head, tail) = balls.split_at_mut(i + 1);
        let a = &mut head[i];
        for b in tail.iter_mut() {
            if a.pos.y > gate_y
                && b.pos.y > gate_y
                && resolve_ball_pair(a, b, board.ball_radius, tuning, rng)
            {
                contacts += 1;
            }
        }
    }

    contacts
}
