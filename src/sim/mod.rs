//! Tick-based simulation module
//!
//! All board logic lives here:
//! - Per-tick constants only (one tick = one animation frame)
//! - Injected seeded RNG only
//! - Stable iteration order (by ball ID)
//! - No rendering, timer or storage dependencies

pub mod board;
pub mod collision;
pub mod physics;
pub mod scoring;
pub mod spawn;
pub mod state;
pub mod tick;

pub use board::{Board, Peg, PrizeSlot};
pub use collision::{CollisionResult, circle_contact, exchange_normal_velocities, reflect_velocity};
pub use scoring::{Landing, LandingBatch, PrizeCount, PrizeTally, SlotFlash, SlotSignals, payout};
pub use spawn::{PendingSpawn, SpawnQueue};
pub use state::{
    Ball, BallCounts, BallKind, BallView, DropPhase, DropRejection, DropSummary, GameEvent,
    RenderFrame, Session, gravity_for, validate_drop,
};
pub use tick::tick;
