//! Per-tick ball integration
//!
//! Order per ball: stuck detection, gravity and drag, resting nudge,
//! anti-center bias, position update, wall constraint.

use rand::Rng;

use super::board::Board;
use super::state::Ball;
use crate::settings::PhysicsTuning;

/// Advance one ball by a tick
pub fn integrate(
    ball: &mut Ball,
    gravity: f32,
    board: &Board,
    tuning: &PhysicsTuning,
    rng: &mut impl Rng,
) {
    detect_stuck(ball, tuning, rng);
    ball.last_pos = ball.pos;

    ball.vel.y += gravity;
    ball.vel.x *= tuning.drag;

    // Resting mid-board
    if ball.vel.x.abs() < tuning.rest_speed
        && ball.vel.y.abs() < tuning.rest_speed
        && ball.pos.y > tuning.rest_margin_y
    {
        ball.vel.x += spread(rng, tuning.rest_kick_x);
        ball.vel.y += tuning.rest_kick_y;
    }

    ball.vel.x += center_push(ball, board, tuning);

    ball.pos += ball.vel;

    constrain_to_walls(ball, board.width, board.ball_radius, tuning.dampening);
}

/// Uniform random value in `[-amount / 2, amount / 2)`
#[inline]
pub fn spread(rng: &mut impl Rng, amount: f32) -> f32 {
    (rng.random::<f32>() - 0.5) * amount
}

/// Count still ticks and kick the ball loose once it has been still too long
fn detect_stuck(ball: &mut Ball, tuning: &PhysicsTuning, rng: &mut impl Rng) {
    let moved = ball.pos.distance(ball.last_pos);
    if moved >= tuning.stuck_epsilon {
        ball.stuck_ticks = 0;
        return;
    }

    ball.stuck_ticks += 1;
    if ball.stuck_ticks > tuning.stuck_ticks {
        ball.vel.x += spread(rng, tuning.stuck_kick_x);
        ball.vel.y += rng.random::<f32>() * tuning.stuck_kick_y_range + tuning.stuck_kick_y_min;
        ball.stuck_ticks = 0;
        log::debug!("Ball {} stuck at ({:.1}, {:.1}), kicked", ball.id, ball.pos.x, ball.pos.y);
    }
}

/// Horizontal velocity nudge away from the board center. Applies only inside the
/// center band and below the last peg row; a ball exactly on center goes left.
pub fn center_push(ball: &Ball, board: &Board, tuning: &PhysicsTuning) -> f32 {
    let center = board.center_x();
    let offset = ball.pos.x - center;
    if offset.abs() < tuning.center_band && ball.pos.y > board.last_row_y() {
        if offset > 0.0 {
            tuning.center_push
        } else {
            -tuning.center_push
        }
    } else {
        0.0
    }
}

/// Keep the ball inside `[radius, width - radius]`, bouncing off the side walls
pub fn constrain_to_walls(ball: &mut Ball, width: f32, radius: f32, dampening: f32) {
    if ball.pos.x < radius {
        ball.pos.x = radius;
        ball.vel.x = ball.vel.x.abs() * dampening;
    } else if ball.pos.x > width - radius {
        ball.pos.x = width - radius;
        ball.vel.x = -ball.vel.x.abs() * dampening;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::state::BallKind;
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn setup() -> (Board, PhysicsTuning, Pcg32) {
        let settings = Settings::default();
        (
            Board::generate(&settings.board),
            settings.physics,
            Pcg32::seed_from_u64(5),
        )
    }

    #[test]
    fn test_gravity_and_drag() {
        let (board, tuning, mut rng) = setup();
        let mut ball = Ball::new(1, BallKind::Regular, Vec2::new(100.0, 20.0));
        ball.vel = Vec2::new(2.0, 1.0);
        ball.last_pos = Vec2::new(98.0, 19.0);

        integrate(&mut ball, 0.05, &board, &tuning, &mut rng);
        assert!((ball.vel.y - 1.05).abs() < 1e-5);
        assert!((ball.vel.x - 2.0 * 0.995).abs() < 1e-5);
        assert!((ball.pos - Vec2::new(100.0 + 1.99, 21.05)).length() < 1e-4);
        assert_eq!(ball.last_pos, Vec2::new(100.0, 20.0));
    }

    #[test]
    fn test_stuck_ball_gets_kicked() {
        let (_, mut tuning, mut rng) = setup();
        tuning.stuck_ticks = 3;
        let mut ball = Ball::new(1, BallKind::Regular, Vec2::new(100.0, 20.0));

        for _ in 0..3 {
            detect_stuck(&mut ball, &tuning, &mut rng);
        }
        assert_eq!(ball.stuck_ticks, 3);
        assert_eq!(ball.vel, Vec2::ZERO);

        detect_stuck(&mut ball, &tuning, &mut rng);
        assert_eq!(ball.stuck_ticks, 0);
        // Kick always pushes down by at least the minimum
        assert!(ball.vel.y >= tuning.stuck_kick_y_min);
        assert!(ball.vel.x.abs() <= tuning.stuck_kick_x / 2.0);
    }

    #[test]
    fn test_moving_ball_resets_stuck_counter() {
        let (_, tuning, mut rng) = setup();
        let mut ball = Ball::new(1, BallKind::Regular, Vec2::new(100.0, 20.0));
        ball.stuck_ticks = 12;
        ball.last_pos = Vec2::new(100.0, 10.0);
        detect_stuck(&mut ball, &tuning, &mut rng);
        assert_eq!(ball.stuck_ticks, 0);
    }

    #[test]
    fn test_resting_ball_is_nudged_below_margin() {
        let (board, mut tuning, mut rng) = setup();
        tuning.center_band = 0.0;
        let mut ball = Ball::new(1, BallKind::Regular, Vec2::new(60.0, 300.0));
        ball.last_pos = Vec2::new(60.0, 290.0);
        integrate(&mut ball, 0.0, &board, &tuning, &mut rng);
        assert!((ball.vel.y - tuning.rest_kick_y).abs() < 1e-5);

        // Above the margin nothing is injected
        let mut ball = Ball::new(2, BallKind::Regular, Vec2::new(60.0, 20.0));
        ball.last_pos = Vec2::new(60.0, 10.0);
        integrate(&mut ball, 0.0, &board, &tuning, &mut rng);
        assert_eq!(ball.vel, Vec2::ZERO);
    }

    #[test]
    fn test_center_push_only_below_last_row() {
        let (board, tuning, _) = setup();
        let below = board.last_row_y() + 5.0;

        let right = Ball::new(1, BallKind::Regular, Vec2::new(board.center_x() + 3.0, below));
        assert_eq!(center_push(&right, &board, &tuning), tuning.center_push);

        let left = Ball::new(2, BallKind::Regular, Vec2::new(board.center_x() - 3.0, below));
        assert_eq!(center_push(&left, &board, &tuning), -tuning.center_push);

        let above = Ball::new(3, BallKind::Regular, Vec2::new(board.center_x() + 3.0, 100.0));
        assert_eq!(center_push(&above, &board, &tuning), 0.0);

        let outside = Ball::new(4, BallKind::Regular, Vec2::new(board.center_x() + 50.0, below));
        assert_eq!(center_push(&outside, &board, &tuning), 0.0);
    }

    #[test]
    fn test_wall_constraint_reflects() {
        let mut ball = Ball::new(1, BallKind::Regular, Vec2::new(4.0, 100.0));
        ball.vel = Vec2::new(-3.0, 1.0);
        constrain_to_walls(&mut ball, 400.0, 10.0, 0.6);
        assert_eq!(ball.pos.x, 10.0);
        assert!((ball.vel.x - 1.8).abs() < 1e-5);

        let mut ball = Ball::new(2, BallKind::Regular, Vec2::new(396.0, 100.0));
        ball.vel = Vec2::new(2.0, 1.0);
        constrain_to_walls(&mut ball, 400.0, 10.0, 0.6);
        assert_eq!(ball.pos.x, 390.0);
        assert!((ball.vel.x + 1.2).abs() < 1e-5);
    }
}
