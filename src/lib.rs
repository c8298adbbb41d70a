//! Plinktrix - Plinko board simulation core
//!
//! Core modules:
//! - `sim`: Tick-based simulation (board, spawning, physics, collisions, scoring)
//! - `settings`: Board variants and physics tuning
//! - `ledger`: Inventory / persistence collaborator contracts
//! - `game`: Fixed-timestep frame driver for hosts

pub mod game;
pub mod ledger;
pub mod settings;
pub mod sim;

pub use game::Game;
pub use ledger::{DropSink, Inventory, LedgerError, PlayerLedger};
pub use settings::{BoardVariant, Settings, SettingsError};

/// Simulation timing constants
pub mod consts {
    /// Ticks per second (one tick per animation frame)
    pub const TICKS_PER_SECOND: u32 = 60;
    /// Fixed simulation timestep in seconds
    pub const SIM_DT: f32 = 1.0 / TICKS_PER_SECOND as f32;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest wall-clock frame the driver will account for (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;
}

/// Convert a duration in milliseconds to whole simulation ticks (rounded, at least 1
/// for any non-zero duration)
#[inline]
pub fn ms_to_ticks(ms: u32) -> u32 {
    if ms == 0 {
        return 0;
    }
    let ticks = (ms as f32 * consts::TICKS_PER_SECOND as f32 / 1000.0).round() as u32;
    ticks.max(1)
}
