//! Host-agnostic frame driver
//!
//! Turns variable wall-clock frames into fixed simulation ticks and forwards
//! completed drops to the player ledger.

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::ledger::{DropSink, Inventory, deliver};
use crate::settings::Settings;
use crate::sim::{BallCounts, DropRejection, DropSummary, GameEvent, RenderFrame, Session, tick};

/// Game instance holding the session and its player ledger
pub struct Game<L: Inventory + DropSink> {
    pub session: Session,
    pub ledger: L,
    accumulator: f32,
    /// Events seen since the last `take_events`, for the host UI
    events: Vec<GameEvent>,
}

impl<L: Inventory + DropSink> Game<L> {
    pub fn new(settings: Settings, seed: u64, ledger: L) -> Self {
        Self {
            session: Session::new(settings, seed),
            ledger,
            accumulator: 0.0,
            events: Vec::new(),
        }
    }

    /// Start a drop if the ledger covers it
    pub fn drop_balls(&mut self, request: BallCounts) -> Result<(), DropRejection> {
        self.session.request_drop(request, &self.ledger)
    }

    pub fn can_drop(&self, request: BallCounts) -> bool {
        self.session.can_drop(request, &self.ledger)
    }

    /// Account for `dt` seconds of wall-clock time; returns ticks run
    pub fn update(&mut self, dt: f32) -> u32 {
        // NaN would poison the accumulator for good
        let dt = if dt.is_finite() { dt.clamp(0.0, MAX_FRAME_DT) } else { 0.0 };
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.step();
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        substeps
    }

    /// Run exactly one tick and dispatch its events
    pub fn step(&mut self) {
        tick(&mut self.session);
        for event in self.session.drain_events() {
            if let GameEvent::DropCompleted(summary) = &event {
                deliver(&mut self.ledger, summary);
            }
            self.events.push(event);
        }
    }

    /// Tick until the current drop completes, or give up after `max_ticks`
    pub fn run_to_completion(&mut self, max_ticks: u64) -> Option<DropSummary> {
        for _ in 0..max_ticks {
            if !self.session.is_dropping() {
                break;
            }
            self.step();
        }
        if self.session.is_dropping() {
            log::warn!("Drop still running after {} ticks", max_ticks);
            return None;
        }
        self.events.iter().rev().find_map(|event| match event {
            GameEvent::DropCompleted(summary) => Some(summary.clone()),
            _ => None,
        })
    }

    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn frame(&self) -> RenderFrame {
        self.session.frame()
    }

    /// Host unmount: stop the drop and discard pending work
    pub fn shutdown(&mut self) {
        self.session.abandon();
        self.accumulator = 0.0;
    }
}
