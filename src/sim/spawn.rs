//! Staggered ball spawning
//!
//! A drop request is flattened into one kind tag per ball, shuffled, and queued
//! as `(ready_at_tick, kind)` entries a fixed interval apart. The tick loop
//! releases due entries, so spawn timing needs no host timers.

use std::collections::VecDeque;

use glam::Vec2;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::physics::spread;
use super::state::{Ball, BallCounts, BallKind};

/// A ball waiting to enter the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSpawn {
    pub ready_at: u64,
    pub kind: BallKind,
}

/// FIFO of pending spawns, ordered by `ready_at`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpawnQueue {
    pending: VecDeque<PendingSpawn>,
}

impl SpawnQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one spawn per requested ball in shuffled order, the first at
    /// `start_tick` and each next one `interval` ticks later. Only called on an
    /// empty queue (a new drop).
    pub fn schedule(
        &mut self,
        counts: BallCounts,
        start_tick: u64,
        interval: u32,
        rng: &mut impl Rng,
    ) {
        let mut kinds: Vec<BallKind> = std::iter::repeat_n(BallKind::Bonus, counts.bonus as usize)
            .chain(std::iter::repeat_n(BallKind::Regular, counts.regular as usize))
            .collect();
        kinds.shuffle(rng);

        self.pending.extend(kinds.into_iter().enumerate().map(|(i, kind)| PendingSpawn {
            ready_at: start_tick + i as u64 * interval as u64,
            kind,
        }));
    }

    /// Pop the next entry if it is due at `now`
    pub fn pop_due(&mut self, now: u64) -> Option<BallKind> {
        if self.pending.front()?.ready_at <= now {
            self.pending.pop_front().map(|p| p.kind)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop all pending spawns
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingSpawn> {
        self.pending.iter()
    }
}

/// Create a ball at the spawn point with a tiny random horizontal velocity
pub fn spawn_ball(id: u32, kind: BallKind, at: Vec2, jitter: f32, rng: &mut impl Rng) -> Ball {
    let mut ball = Ball::new(id, kind, at);
    ball.vel = Vec2::new(spread(rng, jitter), 0.0);
    ball
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_schedule_staggers_entries() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut queue = SpawnQueue::new();
        queue.schedule(BallCounts::new(3, 2), 100, 9, &mut rng);

        let ticks: Vec<u64> = queue.iter().map(|p| p.ready_at).collect();
        assert_eq!(ticks, vec![100, 109, 118, 127, 136]);
        let bonus = queue.iter().filter(|p| p.kind == BallKind::Bonus).count();
        assert_eq!(bonus, 2);
    }

    #[test]
    fn test_pop_due_respects_time() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut queue = SpawnQueue::new();
        queue.schedule(BallCounts::new(2, 0), 10, 5, &mut rng);

        assert_eq!(queue.pop_due(9), None);
        assert_eq!(queue.pop_due(10), Some(BallKind::Regular));
        assert_eq!(queue.pop_due(14), None);
        assert_eq!(queue.pop_due(20), Some(BallKind::Regular));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_shuffle_mixes_kinds() {
        // With 10 of each kind, some seed must produce an order that is not
        // all-bonus-first
        let mixed = (0..8u64).any(|seed| {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut queue = SpawnQueue::new();
            queue.schedule(BallCounts::new(10, 10), 0, 1, &mut rng);
            queue.iter().take(10).any(|p| p.kind == BallKind::Regular)
        });
        assert!(mixed);
    }

    #[test]
    fn test_spawn_ball_jitter_bounds() {
        let mut rng = Pcg32::seed_from_u64(3);
        for id in 0..50 {
            let ball = spawn_ball(id, BallKind::Regular, Vec2::new(200.0, 20.0), 0.1, &mut rng);
            assert!(ball.vel.x.abs() <= 0.05);
            assert_eq!(ball.vel.y, 0.0);
            assert_eq!(ball.last_pos, ball.pos);
        }
    }

    #[test]
    fn test_zero_jitter_spawns_still() {
        let mut rng = Pcg32::seed_from_u64(3);
        let ball = spawn_ball(1, BallKind::Bonus, Vec2::new(200.0, 20.0), 0.0, &mut rng);
        assert_eq!(ball.vel.x.abs(), 0.0);
    }
}
