//! Landing detection and prize aggregation
//!
//! Balls past the floor are scored into the slot under them. All landings of one
//! tick are collected into a `LandingBatch` first and then applied together.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::board::Board;
use super::state::{Ball, BallKind};

/// Landed balls per kind for one prize value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PrizeCount {
    pub regular: u32,
    pub bonus: u32,
}

impl PrizeCount {
    pub fn total(&self) -> u32 {
        self.regular.saturating_add(self.bonus)
    }
}

/// Per-drop aggregate keyed by the slot's base (undoubled) prize value
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PrizeTally {
    pub counts: BTreeMap<u32, PrizeCount>,
}

impl PrizeTally {
    pub fn record(&mut self, base_value: u32, kind: BallKind) {
        let entry = self.counts.entry(base_value).or_default();
        match kind {
            BallKind::Regular => entry.regular += 1,
            BallKind::Bonus => entry.bonus += 1,
        }
    }

    pub fn get(&self, base_value: u32) -> PrizeCount {
        self.counts.get(&base_value).copied().unwrap_or_default()
    }

    /// Number of balls recorded across all prize values
    pub fn landed(&self) -> u32 {
        self.counts.values().map(PrizeCount::total).sum()
    }

    /// Score implied by the tally (bonus balls doubled)
    pub fn score(&self) -> u64 {
        self.counts.iter().fold(0u64, |acc, (&value, count)| {
            let weight = count.regular as u64 + 2 * count.bonus as u64;
            acc.saturating_add((value as u64).saturating_mul(weight))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }

    fn merge(&mut self, other: &PrizeTally) {
        for (&value, count) in &other.counts {
            let entry = self.counts.entry(value).or_default();
            entry.regular += count.regular;
            entry.bonus += count.bonus;
        }
    }
}

/// Transient per-slot highlight for the rendering layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotFlash {
    Win,
    Gold,
    Lose,
}

impl SlotFlash {
    pub fn for_landing(kind: BallKind, base_value: u32) -> Self {
        if base_value == 0 {
            SlotFlash::Lose
        } else if kind.is_bonus() {
            SlotFlash::Gold
        } else {
            SlotFlash::Win
        }
    }
}

/// Slot flashes with remaining lifetime in ticks
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlotSignals {
    slots: Vec<Option<(SlotFlash, u32)>>,
}

impl SlotSignals {
    pub fn new(slot_count: usize) -> Self {
        Self {
            slots: vec![None; slot_count],
        }
    }

    /// Light a slot, restarting its timer if already lit
    pub fn trigger(&mut self, slot: usize, flash: SlotFlash, ticks: u32) {
        if let Some(entry) = self.slots.get_mut(slot) {
            *entry = (ticks > 0).then_some((flash, ticks));
        }
    }

    /// Count down one tick, clearing expired flashes
    pub fn decay(&mut self) {
        for entry in &mut self.slots {
            if let Some((_, ticks)) = entry {
                *ticks -= 1;
                if *ticks == 0 {
                    *entry = None;
                }
            }
        }
    }

    pub fn get(&self, slot: usize) -> Option<SlotFlash> {
        self.slots.get(slot).copied().flatten().map(|(flash, _)| flash)
    }

    pub fn current(&self) -> Vec<Option<SlotFlash>> {
        self.slots.iter().map(|s| s.map(|(flash, _)| flash)).collect()
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
    }
}

/// One scored ball
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landing {
    pub ball_id: u32,
    pub kind: BallKind,
    pub slot: usize,
    /// Slot value before the bonus multiplier
    pub base_value: u32,
    /// What the ball actually paid
    pub prize: u64,
}

/// Payout for one ball: bonus balls double non-zero prizes
pub fn payout(base_value: u32, kind: BallKind) -> u64 {
    match kind {
        BallKind::Bonus => base_value as u64 * 2,
        BallKind::Regular => base_value as u64,
    }
}

/// Score a ball that crossed the floor
pub fn score_landing(board: &Board, ball: &Ball) -> Landing {
    let slot = board.slot_index(ball.pos.x);
    let base_value = board.slots.get(slot).map_or(0, |s| s.value);
    Landing {
        ball_id: ball.id,
        kind: ball.kind,
        slot,
        base_value,
        prize: payout(base_value, ball.kind),
    }
}

/// Split balls into (landed, still active)
pub fn partition_landed(balls: Vec<Ball>, floor_y: f32) -> (Vec<Ball>, Vec<Ball>) {
    balls.into_iter().partition(|b| b.pos.y > floor_y)
}

/// All landings from one tick, applied atomically
#[derive(Debug, Clone, Default)]
pub struct LandingBatch {
    pub landings: Vec<Landing>,
    pub tally: PrizeTally,
    pub total: u64,
}

impl LandingBatch {
    pub fn collect(board: &Board, landed: &[Ball]) -> Self {
        let mut batch = Self::default();
        for ball in landed {
            let landing = score_landing(board, ball);
            batch.tally.record(landing.base_value, landing.kind);
            batch.total += landing.prize;
            batch.landings.push(landing);
        }
        batch
    }

    pub fn is_empty(&self) -> bool {
        self.landings.is_empty()
    }

    /// Fold this batch into the running drop totals and light the slots
    pub fn apply(
        &self,
        tally: &mut PrizeTally,
        total_score: &mut u64,
        flashes: &mut SlotSignals,
        flash_ticks: u32,
    ) {
        tally.merge(&self.tally);
        *total_score += self.total;
        for landing in &self.landings {
            flashes.trigger(
                landing.slot,
                SlotFlash::for_landing(landing.kind, landing.base_value),
                flash_ticks,
            );
        }
    }
}
