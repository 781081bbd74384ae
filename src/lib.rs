//! TrolleyGames - transit-signal recognition minigames
//!
//! Core modules:
//! - `sim`: Deterministic sequential challenge engine (sequence, rounds, collision gate, session)
//! - `games`: Presentation-free adapters for HoppyTrain, RememberBee, SchemaPro and SignalSlayer
//! - `catalog`: Signal data sources (builtin fallback, backend records, bounded-retry loading)
//! - `progress`: Per-user, per-line level progress
//! - `router`: Level routing after a session ends
//! - `settings`: Engine settings persisted as JSON
//! - `platform`: Frame driver shared by front ends, browser bindings (wasm32 only)

pub mod catalog;
pub mod error;
pub mod games;
pub mod platform;
pub mod progress;
pub mod router;
pub mod settings;
pub mod sim;

pub use error::{EngineError, Result};
pub use settings::{FetchPolicy, Settings, SignalSet};

/// Game configuration constants
///
/// Distances are canvas pixels, velocities are pixels per frame.
pub mod consts {
    /// Logical canvas size shared by the spatial games
    pub const CANVAS_WIDTH: f32 = 700.0;
    pub const CANVAS_HEIGHT: f32 = 400.0;

    /// Default hearts per session
    pub const MAX_HEALTH: u32 = 3;

    /// HoppyTrain physics
    pub const GRAVITY: f32 = 0.125;
    pub const FLAP_VELOCITY: f32 = -3.0;
    pub const PLAYER_SIZE: f32 = 40.0;
    /// Horizontal centre of the HoppyTrain player
    pub const PLAYER_X: f32 = 60.0;
    pub const GROUND_HEIGHT: f32 = 30.0;
    /// Velocity retained after hitting the ground
    pub const GROUND_BOUNCE: f32 = 0.6;

    /// HoppyTrain box columns
    pub const BOX_WIDTH: f32 = 120.0;
    pub const BOX_SPEED: f32 = 1.5;
    pub const BOXES_PER_COLUMN: usize = 3;
    /// Frames a wrong box flashes before staying red
    pub const FLASH_FRAMES: u32 = 15;

    /// SignalSlayer tracks
    pub const TRACKS: usize = 3;
    pub const ROW_SPEED: f32 = 2.0;
    /// Distance of the train's bottom edge from the canvas bottom
    pub const TRAIN_MARGIN: f32 = 30.0;

    /// SchemaPro point hotspots accept clicks within this radius
    pub const SCHEMA_CLICK_RADIUS: f32 = 20.0;
    /// Side of a backend hitbox whose width or height is missing
    pub const SCHEMA_HITBOX_SIZE: f32 = 20.0;

    /// Signals kept per line when playing the short test set
    pub const TEST_SIGNALS_PER_LINE: usize = 3;
}

/// Width of one SignalSlayer track
#[inline]
pub fn track_width() -> f32 {
    consts::CANVAS_WIDTH / consts::TRACKS as f32
}

/// Height of a falling SignalSlayer row
#[inline]
pub fn row_height() -> f32 {
    (consts::CANVAS_HEIGHT / 10.0).floor().max(50.0)
}

/// Side length of the SignalSlayer train hitbox
#[inline]
pub fn train_size() -> f32 {
    (track_width() * 0.09).floor().max(12.0)
}

/// Top edge of the SignalSlayer train hitbox
#[inline]
pub fn train_y() -> f32 {
    consts::CANVAS_HEIGHT - train_size() - consts::TRAIN_MARGIN
}

/// Height of one HoppyTrain box
#[inline]
pub fn box_height() -> f32 {
    consts::CANVAS_HEIGHT / consts::BOXES_PER_COLUMN as f32
}
