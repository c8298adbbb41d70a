//! Peg lattice and prize slot layout
//!
//! A board is a triangle of pegs: row i (0-based) holds i + 2 pegs, centered
//! horizontally, at y = spacing_y * (i + 2). Below the lattice the board width is
//! split into equal prize slots.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::settings::BoardConfig;

/// A fixed circular obstacle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peg {
    pub pos: Vec2,
}

/// One scoring range at the bottom of the board
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrizeSlot {
    pub index: usize,
    /// Base prize (0 = loss slot)
    pub value: u32,
    /// Left edge (inclusive)
    pub x_start: f32,
    /// Right edge (exclusive)
    pub x_end: f32,
}

/// Immutable board geometry for one configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    /// Pegs grouped by row, top row first
    pub rows: Vec<Vec<Peg>>,
    pub slots: Vec<PrizeSlot>,
    pub width: f32,
    /// Landing line; balls below it are scored
    pub floor_y: f32,
    pub peg_radius: f32,
    pub ball_radius: f32,
    pub peg_spacing_y: f32,
}

impl Board {
    /// Build the peg lattice and slot partition from configuration
    pub fn generate(config: &BoardConfig) -> Self {
        let rows = (0..config.rows)
            .map(|row| {
                let peg_count = row + 2;
                let row_width = (peg_count - 1) as f32 * config.peg_spacing_x;
                let start_x = (config.width - row_width) / 2.0;
                let y = config.peg_spacing_y * (row + 2) as f32;
                (0..peg_count)
                    .map(|col| Peg {
                        pos: Vec2::new(start_x + col as f32 * config.peg_spacing_x, y),
                    })
                    .collect()
            })
            .collect();

        let slot_count = config.prize_values.len();
        let slot_width = config.width / slot_count.max(1) as f32;
        let slots = config
            .prize_values
            .iter()
            .enumerate()
            .map(|(index, &value)| PrizeSlot {
                index,
                value,
                x_start: index as f32 * slot_width,
                x_end: (index + 1) as f32 * slot_width,
            })
            .collect();

        Self {
            rows,
            slots,
            width: config.width,
            floor_y: config.floor_y(),
            peg_radius: config.peg_radius,
            ball_radius: config.ball_radius,
            peg_spacing_y: config.peg_spacing_y,
        }
    }

    /// All pegs in row order
    pub fn pegs(&self) -> impl Iterator<Item = &Peg> {
        self.rows.iter().flatten()
    }

    pub fn peg_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn center_x(&self) -> f32 {
        self.width / 2.0
    }

    /// Y of the first peg row; ball-ball contacts only happen below it
    pub fn first_row_y(&self) -> f32 {
        self.peg_spacing_y * 2.0
    }

    /// Y of the last peg row; anti-center bias only applies below it
    pub fn last_row_y(&self) -> f32 {
        self.peg_spacing_y * (self.rows.len() + 1) as f32
    }

    /// Where new balls appear: midway between the two pegs of the top row,
    /// half a row spacing from the top edge
    pub fn spawn_point(&self) -> Vec2 {
        let x = match self.rows.first().map(Vec::as_slice) {
            Some([left, right, ..]) => (left.pos.x + right.pos.x) / 2.0,
            _ => self.center_x(),
        };
        Vec2::new(x, self.peg_spacing_y * 0.5)
    }

    /// Slot under horizontal position `x`, clamped into range so positions at or
    /// past the edges score in the outermost slots
    pub fn slot_index(&self, x: f32) -> usize {
        let count = self.slots.len();
        if count == 0 {
            return 0;
        }
        let raw = ((x / self.width) * count as f32).floor();
        if raw.is_nan() || raw < 0.0 {
            0
        } else {
            (raw as usize).min(count - 1)
        }
    }

    /// Slot under horizontal position `x`
    pub fn slot_at(&self, x: f32) -> Option<&PrizeSlot> {
        self.slots.get(self.slot_index(x))
    }
}
