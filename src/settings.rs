//! Board variants and physics tuning
//!
//! Loaded from a JSON file on native hosts, falling back to the Classic preset.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ms_to_ticks;

/// Errors raised while loading or validating settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Board layout presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BoardVariant {
    /// Tall board, 11 rows, up to 100 balls per drop
    #[default]
    Classic,
    /// Shorter board sized for small screens, up to 25 balls per drop
    Compact,
}

impl BoardVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoardVariant::Classic => "Classic",
            BoardVariant::Compact => "Compact",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "classic" => Some(BoardVariant::Classic),
            "compact" | "small" => Some(BoardVariant::Compact),
            _ => None,
        }
    }
}

/// Peg lattice and slot layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Number of peg rows (row i holds i + 2 pegs)
    pub rows: u32,
    /// Horizontal distance between neighbouring pegs
    pub peg_spacing_x: f32,
    /// Vertical distance between rows
    pub peg_spacing_y: f32,
    /// Board width in pixels
    pub width: f32,
    pub peg_radius: f32,
    pub ball_radius: f32,
    /// Rows of clearance counted from the top; the floor sits at
    /// `(rows + floor_rows) * peg_spacing_y`
    pub floor_rows: u32,
    /// Base prize per slot, left to right
    pub prize_values: Vec<u32>,
}

impl BoardConfig {
    /// Y coordinate past which a ball counts as landed
    pub fn floor_y(&self) -> f32 {
        (self.rows + self.floor_rows) as f32 * self.peg_spacing_y
    }
}

/// Per-tick physics constants (pixels per tick)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsTuning {
    /// Gravity for drops of at most `gravity_threshold` balls
    pub low_gravity: f32,
    /// Gravity for larger drops
    pub high_gravity: f32,
    pub gravity_threshold: u32,
    /// Horizontal air resistance multiplier (< 1)
    pub drag: f32,
    /// Energy kept on wall/peg/ball contact
    pub dampening: f32,

    // === Stuck recovery ===
    /// Displacement below which a tick counts as "not moving"
    pub stuck_epsilon: f32,
    /// Consecutive still ticks before a kick
    pub stuck_ticks: u32,
    /// Horizontal kick spread (uniform in +-half)
    pub stuck_kick_x: f32,
    /// Minimum downward kick
    pub stuck_kick_y_min: f32,
    /// Extra random downward kick
    pub stuck_kick_y_range: f32,

    // === Resting floor ===
    /// Both velocity components below this count as resting
    pub rest_speed: f32,
    /// Rest nudges only apply below this y
    pub rest_margin_y: f32,
    pub rest_kick_x: f32,
    pub rest_kick_y: f32,

    // === Anti-center bias ===
    /// Half-width of the band around the board center that gets pushed
    pub center_band: f32,
    /// Horizontal velocity added per tick inside the band
    pub center_push: f32,

    // === Collisions ===
    /// Extra separation added when pushing out of a contact
    pub contact_slop: f32,
    pub peg_jitter_x: f32,
    pub peg_jitter_y: f32,
    /// Downward speed a ball keeps after any peg hit
    pub peg_min_vy: f32,
    pub ball_jitter_x: f32,
    pub ball_jitter_y: f32,
}

/// Drop pacing and limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropRules {
    pub max_balls_per_drop: u32,
    /// Delay between consecutive spawns
    pub spawn_interval_ms: u32,
    /// Horizontal spawn velocity spread (uniform in +-half)
    pub spawn_jitter: f32,
    /// How long a slot flash stays lit
    pub slot_flash_ms: u32,
}

impl DropRules {
    pub fn spawn_interval_ticks(&self) -> u32 {
        ms_to_ticks(self.spawn_interval_ms)
    }

    pub fn slot_flash_ticks(&self) -> u32 {
        ms_to_ticks(self.slot_flash_ms)
    }
}

/// Complete simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub variant: BoardVariant,
    pub board: BoardConfig,
    pub physics: PhysicsTuning,
    pub drop: DropRules,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_preset(BoardVariant::Classic)
    }
}

/// Prize values shared by both variants
pub const DEFAULT_PRIZES: [u32; 9] = [1, 5, 10, 0, 100, 0, 10, 5, 1];

impl Settings {
    /// Create settings from a board preset
    pub fn from_preset(variant: BoardVariant) -> Self {
        let mut settings = Self {
            variant,
            board: BoardConfig {
                rows: 11,
                peg_spacing_x: 35.0,
                peg_spacing_y: 40.0,
                width: 400.0,
                peg_radius: 4.0,
                ball_radius: 10.0,
                floor_rows: 5,
                prize_values: DEFAULT_PRIZES.to_vec(),
            },
            physics: PhysicsTuning {
                low_gravity: 0.05,
                high_gravity: 0.09,
                gravity_threshold: 10,
                drag: 0.995,
                dampening: 0.6,
                stuck_epsilon: 0.5,
                stuck_ticks: 30,
                stuck_kick_x: 4.0,
                stuck_kick_y_min: 1.0,
                stuck_kick_y_range: 2.0,
                rest_speed: 0.1,
                rest_margin_y: 50.0,
                rest_kick_x: 0.5,
                rest_kick_y: 0.2,
                center_band: 10.0,
                center_push: 0.15,
                contact_slop: 1.0,
                peg_jitter_x: 2.5,
                peg_jitter_y: 0.5,
                peg_min_vy: 0.5,
                ball_jitter_x: 0.8,
                ball_jitter_y: 0.4,
            },
            drop: DropRules {
                max_balls_per_drop: 100,
                spawn_interval_ms: 150,
                spawn_jitter: 0.1,
                slot_flash_ms: 500,
            },
        };
        settings.apply_preset(variant);
        settings
    }

    /// Apply a board preset (updates variant-dependent values only)
    pub fn apply_preset(&mut self, variant: BoardVariant) {
        self.variant = variant;
        match variant {
            BoardVariant::Classic => {
                self.board.rows = 11;
                self.board.peg_spacing_x = 35.0;
                self.board.peg_spacing_y = 40.0;
                self.board.floor_rows = 5;
                self.physics.low_gravity = 0.05;
                self.physics.high_gravity = 0.09;
                self.physics.center_band = 10.0;
                self.physics.center_push = 0.15;
                self.drop.max_balls_per_drop = 100;
                self.drop.spawn_interval_ms = 150;
            }
            BoardVariant::Compact => {
                self.board.rows = 10;
                self.board.peg_spacing_x = 38.0;
                self.board.peg_spacing_y = 35.0;
                self.board.floor_rows = 3;
                self.physics.low_gravity = 0.06;
                self.physics.high_gravity = 0.1;
                self.physics.center_band = 30.0;
                self.physics.center_push = 0.2;
                self.drop.max_balls_per_drop = 25;
                self.drop.spawn_interval_ms = 200;
            }
        }
    }

    /// Check that the settings describe a playable board
    pub fn validate(&self) -> Result<(), SettingsError> {
        let board = &self.board;
        if board.rows == 0 {
            return Err(SettingsError::Invalid("board needs at least one peg row".into()));
        }
        if board.prize_values.is_empty() {
            return Err(SettingsError::Invalid("board needs at least one prize slot".into()));
        }
        if board.peg_spacing_x <= 0.0 || board.peg_spacing_y <= 0.0 {
            return Err(SettingsError::Invalid("peg spacing must be positive".into()));
        }
        if board.peg_radius < 0.0 || board.ball_radius <= 0.0 {
            return Err(SettingsError::Invalid("radii must be positive".into()));
        }
        let widest_row = board.rows as f32 * board.peg_spacing_x;
        if board.width <= widest_row.max(2.0 * board.ball_radius) {
            return Err(SettingsError::Invalid(format!(
                "board width {} cannot hold {} rows at spacing {}",
                board.width, board.rows, board.peg_spacing_x
            )));
        }

        let physics = &self.physics;
        if !(physics.dampening > 0.0 && physics.dampening <= 1.0) {
            return Err(SettingsError::Invalid("dampening must be in (0, 1]".into()));
        }
        if !(physics.drag > 0.0 && physics.drag <= 1.0) {
            return Err(SettingsError::Invalid("drag must be in (0, 1]".into()));
        }
        if physics.stuck_ticks == 0 {
            return Err(SettingsError::Invalid("stuck_ticks must be at least 1".into()));
        }
        if self.drop.max_balls_per_drop == 0 {
            return Err(SettingsError::Invalid("max_balls_per_drop must be at least 1".into()));
        }
        Ok(())
    }

    /// Parse and validate settings from JSON text
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load settings, falling back to defaults on any failure
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(settings) => {
                log::info!("Loaded {} settings from {}", settings.variant.as_str(), path.display());
                settings
            }
            Err(err) => {
                log::warn!("Using default settings ({})", err);
                Self::default()
            }
        }
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Settings saved");
        Ok(())
    }
}
