//! Player inventory and drop persistence contracts
//!
//! The simulation only asks "how many balls does the player hold" before a drop
//! and hands a `DropSummary` over after it. `PlayerLedger` is the in-memory
//! reference collaborator used by the binary and tests.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::{BallCounts, DropSummary};

/// Persistence collaborator failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Pre-drop inventory lookup
pub trait Inventory {
    /// Balls the player currently holds, per kind
    fn available(&self) -> BallCounts;
}

/// Receives completed drops
pub trait DropSink {
    fn record_drop(&mut self, summary: &DropSummary) -> Result<(), LedgerError>;
}

/// Hand a completed drop to the sink. Failures are logged, never retried, and
/// never roll back the simulation.
pub fn deliver(sink: &mut impl DropSink, summary: &DropSummary) -> bool {
    match sink.record_drop(summary) {
        Ok(()) => true,
        Err(err) => {
            log::warn!("Failed to record drop scoring {}: {}", summary.total_score, err);
            false
        }
    }
}

/// One player's ball stock and cumulative score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PlayerLedger {
    pub regular_balls: u32,
    pub bonus_balls: u32,
    /// Sum of all recorded drop scores
    pub current_score: u64,
    pub drops_played: u32,
    /// Best single drop
    pub best_drop: u64,
    /// Simulates a backend outage; `record_drop` fails while set
    #[serde(skip)]
    pub offline: bool,
}

impl PlayerLedger {
    pub fn new(stock: BallCounts) -> Self {
        Self {
            regular_balls: stock.regular,
            bonus_balls: stock.bonus,
            ..Self::default()
        }
    }
}

impl Inventory for PlayerLedger {
    fn available(&self) -> BallCounts {
        BallCounts::new(self.regular_balls, self.bonus_balls)
    }
}

impl DropSink for PlayerLedger {
    fn record_drop(&mut self, summary: &DropSummary) -> Result<(), LedgerError> {
        if self.offline {
            return Err(LedgerError::Unavailable("player ledger is offline".into()));
        }

        // Stock never goes negative even if the drop used more than recorded
        self.regular_balls = self.regular_balls.saturating_sub(summary.balls_used.regular);
        self.bonus_balls = self.bonus_balls.saturating_sub(summary.balls_used.bonus);
        self.current_score += summary.total_score;
        self.drops_played += 1;
        self.best_drop = self.best_drop.max(summary.total_score);

        log::info!(
            "Ledger updated: {} regular, {} bonus left, score {}",
            self.regular_balls,
            self.bonus_balls,
            self.current_score
        );
        Ok(())
    }
}
