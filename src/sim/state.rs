//! Session state and core simulation types
//!
//! A `Session` owns the board, the active balls and the per-drop aggregates.
//! Its lifecycle is `new -> request_drop -> tick* -> (drop completes) -> ...`.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::board::Board;
use super::scoring::{Landing, PrizeTally, SlotFlash, SlotSignals};
use super::spawn::SpawnQueue;
use crate::ledger::Inventory;
use crate::settings::{PhysicsTuning, Settings};

/// Drop lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DropPhase {
    /// Waiting for a drop request
    #[default]
    Idle,
    /// Balls are spawning or still on the board
    Dropping,
}

/// Ball kind; bonus balls pay double in non-zero slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BallKind {
    Regular,
    Bonus,
}

impl BallKind {
    pub fn is_bonus(&self) -> bool {
        matches!(self, BallKind::Bonus)
    }
}

/// Ball counts per kind (drop requests, balls used, inventory)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BallCounts {
    pub regular: u32,
    pub bonus: u32,
}

impl BallCounts {
    pub fn new(regular: u32, bonus: u32) -> Self {
        Self { regular, bonus }
    }

    /// Combined count, saturating so oversized requests still fail the cap check
    pub fn total(&self) -> u32 {
        self.regular.saturating_add(self.bonus)
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// A falling ball
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub kind: BallKind,
    /// Consecutive ticks with negligible displacement
    pub stuck_ticks: u32,
    /// Position at the start of the previous tick
    pub last_pos: Vec2,
}

impl Ball {
    pub fn new(id: u32, kind: BallKind, pos: Vec2) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            kind,
            stuck_ticks: 0,
            last_pos: pos,
        }
    }
}

/// Why a drop request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DropRejection {
    #[error("a drop is already in progress")]
    AlreadyDropping,
    #[error("no balls requested")]
    Empty,
    #[error("{requested} balls requested, at most {cap} per drop")]
    TooManyBalls { requested: u32, cap: u32 },
    #[error("{requested} regular balls requested, {available} available")]
    InsufficientRegular { requested: u32, available: u32 },
    #[error("{requested} bonus balls requested, {available} available")]
    InsufficientBonus { requested: u32, available: u32 },
}

/// Pre-flight check for a drop: inventory sufficiency and per-drop cap
pub fn validate_drop(
    request: BallCounts,
    available: BallCounts,
    cap: u32,
) -> Result<(), DropRejection> {
    if request.is_empty() {
        return Err(DropRejection::Empty);
    }
    if request.total() > cap {
        return Err(DropRejection::TooManyBalls {
            requested: request.total(),
            cap,
        });
    }
    if request.regular > available.regular {
        return Err(DropRejection::InsufficientRegular {
            requested: request.regular,
            available: available.regular,
        });
    }
    if request.bonus > available.bonus {
        return Err(DropRejection::InsufficientBonus {
            requested: request.bonus,
            available: available.bonus,
        });
    }
    Ok(())
}

/// Gravity tier for a drop of `total_balls`: low at or below the threshold, high above
pub fn gravity_for(total_balls: u32, tuning: &PhysicsTuning) -> f32 {
    if total_balls <= tuning.gravity_threshold {
        tuning.low_gravity
    } else {
        tuning.high_gravity
    }
}

/// Result of a finished drop, handed to the persistence collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropSummary {
    pub total_score: u64,
    pub tally: PrizeTally,
    pub balls_used: BallCounts,
    /// Ticks from the drop request to the last landing
    pub ticks: u64,
}

/// Notable things that happened during ticks, in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    DropStarted { balls: BallCounts, gravity: f32 },
    BallSpawned { id: u32, kind: BallKind },
    BallLanded(Landing),
    /// Fires exactly once per drop
    DropCompleted(DropSummary),
}

/// Render view of one ball
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallView {
    pub id: u32,
    pub pos: Vec2,
    pub kind: BallKind,
}

/// Per-tick output for a rendering layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    pub tick: u64,
    pub balls: Vec<BallView>,
    pub slot_flashes: Vec<Option<SlotFlash>>,
    pub total_score: u64,
}

/// One player's game session
#[derive(Debug, Clone)]
pub struct Session {
    pub settings: Settings,
    pub board: Board,
    /// Injected generator for jitter, kicks and shuffles
    pub(crate) rng: Pcg32,
    pub phase: DropPhase,
    /// Score of the current (or last) drop
    pub total_score: u64,
    /// Gravity selected for the current drop
    pub current_gravity: f32,
    /// Score reported by the last completed drop
    pub last_ended_score: Option<u64>,
    /// Active balls (sorted by id)
    pub balls: Vec<Ball>,
    /// Landed-ball counts for the current drop
    pub tally: PrizeTally,
    pub flashes: SlotSignals,
    pub(crate) spawns: SpawnQueue,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub(crate) drop_started_at: u64,
    pub(crate) balls_requested: BallCounts,
    /// Set once the first ball of the drop is on the board
    pub(crate) had_balls: bool,
    pub(crate) events: Vec<GameEvent>,
    next_id: u32,
}

impl Session {
    /// Create a session whose randomness comes from `seed`
    pub fn new(settings: Settings, seed: u64) -> Self {
        Self::with_rng(settings, Pcg32::seed_from_u64(seed))
    }

    /// Create a session with a caller-supplied generator
    pub fn with_rng(settings: Settings, rng: Pcg32) -> Self {
        let board = Board::generate(&settings.board);
        let flashes = SlotSignals::new(board.slots.len());
        let current_gravity = settings.physics.low_gravity;
        Self {
            settings,
            board,
            rng,
            phase: DropPhase::Idle,
            total_score: 0,
            current_gravity,
            last_ended_score: None,
            balls: Vec::new(),
            tally: PrizeTally::default(),
            flashes,
            spawns: SpawnQueue::new(),
            time_ticks: 0,
            drop_started_at: 0,
            balls_requested: BallCounts::default(),
            had_balls: false,
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new ball ID
    pub fn next_ball_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn is_dropping(&self) -> bool {
        self.phase == DropPhase::Dropping
    }

    /// Balls still waiting to spawn in this drop
    pub fn pending_spawns(&self) -> usize {
        self.spawns.len()
    }

    pub fn balls_requested(&self) -> BallCounts {
        self.balls_requested
    }

    /// Validate a drop request without starting it
    pub fn check_drop(
        &self,
        request: BallCounts,
        inventory: &impl Inventory,
    ) -> Result<(), DropRejection> {
        if self.is_dropping() {
            return Err(DropRejection::AlreadyDropping);
        }
        validate_drop(
            request,
            inventory.available(),
            self.settings.drop.max_balls_per_drop,
        )
    }

    /// Boolean view of `check_drop`
    pub fn can_drop(&self, request: BallCounts, inventory: &impl Inventory) -> bool {
        self.check_drop(request, inventory).is_ok()
    }

    /// Start a drop: pick gravity, reset per-drop aggregates and queue spawns.
    /// A rejected request leaves the session untouched.
    pub fn request_drop(
        &mut self,
        request: BallCounts,
        inventory: &impl Inventory,
    ) -> Result<(), DropRejection> {
        if let Err(rejection) = self.check_drop(request, inventory) {
            log::warn!("Drop rejected: {}", rejection);
            return Err(rejection);
        }

        self.current_gravity = gravity_for(request.total(), &self.settings.physics);
        self.total_score = 0;
        self.tally.clear();
        self.balls.clear();
        self.balls_requested = request;
        self.had_balls = false;
        self.drop_started_at = self.time_ticks;

        let interval = self.settings.drop.spawn_interval_ticks();
        self.spawns.schedule(request, self.time_ticks, interval, &mut self.rng);
        self.phase = DropPhase::Dropping;

        log::info!(
            "Drop started: {} regular, {} bonus, gravity {}",
            request.regular,
            request.bonus,
            self.current_gravity
        );
        self.events.push(GameEvent::DropStarted {
            balls: request,
            gravity: self.current_gravity,
        });
        Ok(())
    }

    /// Tear down an in-flight drop (host unmount). Pending spawns, balls and slot
    /// flashes are discarded and no completion event is raised.
    pub fn abandon(&mut self) {
        if self.is_dropping() {
            log::warn!(
                "Drop abandoned with {} balls active and {} pending",
                self.balls.len(),
                self.spawns.len()
            );
        }
        self.spawns.clear();
        self.balls.clear();
        self.flashes.clear();
        self.had_balls = false;
        self.phase = DropPhase::Idle;
    }

    /// Take all events raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Snapshot for the rendering layer
    pub fn frame(&self) -> RenderFrame {
        RenderFrame {
            tick: self.time_ticks,
            balls: self
                .balls
                .iter()
                .map(|b| BallView {
                    id: b.id,
                    pos: b.pos,
                    kind: b.kind,
                })
                .collect(),
            slot_flashes: self.flashes.current(),
            total_score: self.total_score,
        }
    }
}
