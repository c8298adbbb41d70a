//! Fixed tick simulation step
//!
//! One call advances the session by one animation frame:
//! spawn -> integrate -> collide -> land/score -> decay flashes -> completion check.
//! Balls are mutated on a working copy and published at the end of the tick.

use super::collision::resolve_collisions;
use super::physics::{constrain_to_walls, integrate};
use super::scoring::{LandingBatch, partition_landed};
use super::spawn::spawn_ball;
use super::state::{Ball, DropPhase, DropSummary, GameEvent, Session};

/// Advance the session by one tick. Idle sessions only age their slot flashes.
pub fn tick(session: &mut Session) {
    session.time_ticks += 1;

    if session.phase != DropPhase::Dropping {
        session.flashes.decay();
        return;
    }

    let mut working = session.balls.clone();
    release_spawns(session, &mut working);

    let board = &session.board;
    let tuning = &session.settings.physics;
    let rng = &mut session.rng;

    for ball in working.iter_mut() {
        integrate(ball, session.current_gravity, board, tuning, rng);
    }
    resolve_collisions(&mut working, board, tuning, rng);

    // Contacts can push a ball past a wall; pull it back in
    for ball in working.iter_mut() {
        constrain_to_walls(ball, board.width, board.ball_radius, tuning.dampening);
    }

    let (landed, active) = partition_landed(working, board.floor_y);
    let batch = LandingBatch::collect(board, &landed);

    session.flashes.decay();
    if !batch.is_empty() {
        let flash_ticks = session.settings.drop.slot_flash_ticks();
        batch.apply(
            &mut session.tally,
            &mut session.total_score,
            &mut session.flashes,
            flash_ticks,
        );
        for landing in batch.landings {
            log::debug!(
                "Ball {} landed in slot {} for {}",
                landing.ball_id,
                landing.slot,
                landing.prize
            );
            session.events.push(GameEvent::BallLanded(landing));
        }
    }

    session.balls = active;

    if session.balls.is_empty() && session.spawns.is_empty() && session.had_balls {
        finish_drop(session);
    }
}

/// Move every due spawn onto the board
fn release_spawns(session: &mut Session, working: &mut Vec<Ball>) {
    let spawn_at = session.board.spawn_point();
    let jitter = session.settings.drop.spawn_jitter;
    while let Some(kind) = session.spawns.pop_due(session.time_ticks) {
        let id = session.next_ball_id();
        let ball = spawn_ball(id, kind, spawn_at, jitter, &mut session.rng);
        log::debug!("Spawned {:?} ball {}", kind, id);
        session.events.push(GameEvent::BallSpawned { id, kind });
        working.push(ball);
        session.had_balls = true;
    }
}

/// Leave `Dropping` and raise the single completion event
fn finish_drop(session: &mut Session) {
    session.phase = DropPhase::Idle;
    session.had_balls = false;
    session.last_ended_score = Some(session.total_score);

    let summary = DropSummary {
        total_score: session.total_score,
        tally: session.tally.clone(),
        balls_used: session.balls_requested,
        ticks: session.time_ticks - session.drop_started_at,
    };
    log::info!(
        "Drop complete: {} balls scored {} in {} ticks",
        summary.tally.landed(),
        summary.total_score,
        summary.ticks
    );
    session.events.push(GameEvent::DropCompleted(summary));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::PlayerLedger;
    use crate::settings::Settings;
    use crate::sim::state::BallCounts;

    fn ledger() -> PlayerLedger {
        PlayerLedger::new(BallCounts::new(100, 100))
    }

    /// Run until the drop ends or `limit` ticks pass; returns ticks used
    fn run_drop(session: &mut Session, limit: u32) -> u32 {
        for n in 1..=limit {
            tick(session);
            if !session.is_dropping() {
                return n;
            }
        }
        panic!("drop did not finish within {} ticks", limit);
    }

    /// One-row board, no spawn jitter and no center bias: a ball falls
    /// straight through the top gap
    fn straight_drop_settings() -> Settings {
        let mut settings = Settings::default();
        settings.board.rows = 1;
        settings.drop.spawn_jitter = 0.0;
        settings.physics.center_band = 0.0;
        settings
    }

    #[test]
    fn test_single_ball_lands_in_center_slot() {
        let mut session = Session::new(straight_drop_settings(), 2024);
        session.request_drop(BallCounts::new(1, 0), &ledger()).unwrap();
        session.drain_events();

        let mut landed_at = None;
        let mut completions = 0;
        for n in 1..=2000u32 {
            tick(&mut session);
            for event in session.drain_events() {
                match event {
                    GameEvent::BallLanded(landing) => {
                        assert_eq!(landing.slot, 4);
                        landed_at = Some(n);
                    }
                    GameEvent::DropCompleted(summary) => {
                        completions += 1;
                        assert_eq!(summary.total_score, 100);
                        assert_eq!(Some(n), landed_at);
                    }
                    _ => {}
                }
            }
            if landed_at.is_some() {
                assert!(!session.is_dropping());
            } else {
                assert!(session.is_dropping());
            }
            // The straight path never leaves the center line
            for ball in &session.balls {
                assert!((ball.pos.x - 200.0).abs() < 1e-4);
            }
        }

        assert_eq!(completions, 1);
        assert_eq!(session.total_score, 100);
        assert_eq!(session.last_ended_score, Some(100));
        assert_eq!(session.tally.get(100).regular, 1);
    }

    #[test]
    fn test_drop_waits_for_staggered_spawns() {
        let mut session = Session::new(Settings::default(), 7);
        session.request_drop(BallCounts::new(3, 0), &ledger()).unwrap();

        tick(&mut session);
        assert_eq!(session.balls.len(), 1);
        assert_eq!(session.pending_spawns(), 2);

        let interval = session.settings.drop.spawn_interval_ticks();
        for _ in 0..interval {
            tick(&mut session);
        }
        assert_eq!(session.balls.len(), 2);
        assert!(session.is_dropping());
    }

    #[test]
    fn test_every_ball_is_scored_once() {
        let mut session = Session::new(Settings::default(), 99);
        session.request_drop(BallCounts::new(30, 10), &ledger()).unwrap();
        run_drop(&mut session, 20_000);

        let events = session.drain_events();
        let spawned = events
            .iter()
            .filter(|e| matches!(e, GameEvent::BallSpawned { .. }))
            .count();
        let landed: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::BallLanded(l) => Some(*l),
                _ => None,
            })
            .collect();
        let completed: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::DropCompleted(s) => Some(s.clone()),
                _ => None,
            })
            .collect();

        assert_eq!(spawned, 40);
        assert_eq!(landed.len(), 40);
        assert_eq!(session.tally.landed(), 40);
        let bonus: u32 = session.tally.counts.values().map(|c| c.bonus).sum();
        assert_eq!(bonus, 10);

        assert_eq!(completed.len(), 1);
        let summary = &completed[0];
        assert_eq!(summary.balls_used, BallCounts::new(30, 10));
        assert_eq!(summary.total_score, landed.iter().map(|l| l.prize).sum::<u64>());
        assert_eq!(summary.total_score, session.tally.score());
    }

    #[test]
    fn test_balls_stay_inside_walls() {
        let mut session = Session::new(Settings::default(), 3);
        session.request_drop(BallCounts::new(60, 0), &ledger()).unwrap();
        let radius = session.board.ball_radius;
        let width = session.board.width;

        for _ in 0..20_000 {
            tick(&mut session);
            for ball in &session.balls {
                assert!(ball.pos.x >= radius && ball.pos.x <= width - radius);
            }
            if !session.is_dropping() {
                break;
            }
        }
        assert!(!session.is_dropping());
    }

    #[test]
    fn test_bonus_ball_pays_double() {
        let mut session = Session::new(straight_drop_settings(), 5);
        session.request_drop(BallCounts::new(0, 1), &ledger()).unwrap();
        run_drop(&mut session, 2000);
        assert_eq!(session.total_score, 200);
        assert_eq!(session.tally.get(100).bonus, 1);
        assert_eq!(session.flashes.get(4), Some(crate::sim::SlotFlash::Gold));
    }

    #[test]
    fn test_flashes_fade_while_idle() {
        let mut session = Session::new(straight_drop_settings(), 5);
        session.request_drop(BallCounts::new(1, 0), &ledger()).unwrap();
        run_drop(&mut session, 2000);
        assert!(session.flashes.get(4).is_some());

        for _ in 0..session.settings.drop.slot_flash_ticks() {
            tick(&mut session);
        }
        assert_eq!(session.flashes.get(4), None);
    }

    #[test]
    fn test_next_drop_resets_aggregates() {
        let mut session = Session::new(straight_drop_settings(), 8);
        session.request_drop(BallCounts::new(1, 0), &ledger()).unwrap();
        run_drop(&mut session, 2000);
        assert_eq!(session.total_score, 100);

        session.request_drop(BallCounts::new(0, 1), &ledger()).unwrap();
        assert_eq!(session.total_score, 0);
        assert!(session.tally.is_empty());
        run_drop(&mut session, 2000);
        assert_eq!(session.total_score, 200);
        assert_eq!(session.last_ended_score, Some(200));
    }

    #[test]
    fn test_compact_board_drop() {
        let settings = Settings::from_preset(crate::settings::BoardVariant::Compact);
        let mut session = Session::new(settings, 31);
        session.request_drop(BallCounts::new(20, 5), &ledger()).unwrap();
        assert_eq!(session.current_gravity, 0.1);
        run_drop(&mut session, 20_000);
        assert_eq!(session.tally.landed(), 25);
    }

    #[test]
    fn test_determinism() {
        // Two sessions with the same seed produce identical trajectories
        let mut s1 = Session::new(Settings::default(), 99999);
        let mut s2 = Session::new(Settings::default(), 99999);
        s1.request_drop(BallCounts::new(15, 5), &ledger()).unwrap();
        s2.request_drop(BallCounts::new(15, 5), &ledger()).unwrap();

        for _ in 0..600 {
            tick(&mut s1);
            tick(&mut s2);
            assert_eq!(s1.balls, s2.balls);
        }
        assert_eq!(s1.total_score, s2.total_score);
        assert_eq!(s1.tally, s2.tally);
    }

    #[test]
    fn test_idle_tick_is_inert() {
        let mut session = Session::new(Settings::default(), 1);
        tick(&mut session);
        assert_eq!(session.time_ticks, 1);
        assert!(session.balls.is_empty());
        assert!(session.drain_events().is_empty());
    }
}
