//! Neon Defender - simulation core of a 2D arcade shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, combat, boss patterns, tick loop)
//! - `economy`: Currency, score, combo and upgrade ledger
//! - `achievements`: Snapshot predicates and unlock notifications
//! - `platform`: Input contract consumed by the simulation
//! - `settings`: Volume and key bindings
//! - `persistence`: Save slots with corruption fallback
//! - `session`: Fixed-timestep driver that owns saving between ticks

pub mod achievements;
pub mod economy;
pub mod persistence;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;

pub use economy::{Auxiliary, Ledger, UpgradeKind};
pub use platform::input::{Action, ActionState};
pub use session::Session;
pub use settings::Settings;

use glam::Vec2;
use rand::Rng;

/// Game configuration constants
pub mod consts {
    /// Simulation ticks per second
    pub const TICK_RATE: u32 = 60;
    /// Fixed simulation timestep
    pub const SIM_DT: f32 = 1.0 / TICK_RATE as f32;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame the session driver will try to catch up on
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Play-field dimensions (y grows downward)
    pub const FIELD_WIDTH: f32 = 800.0;
    pub const FIELD_HEIGHT: f32 = 600.0;
    /// Projectiles survive this far outside the visible field
    pub const OUT_OF_BOUNDS_MARGIN: f32 = 50.0;

    /// Combo window after a kill (2 seconds)
    pub const COMBO_WINDOW_TICKS: u32 = 2 * TICK_RATE;
    /// Autosave cadence (60 seconds)
    pub const AUTOSAVE_INTERVAL_TICKS: u32 = 60 * TICK_RATE;
    /// Time between death and game over
    pub const DYING_TICKS: u32 = 2 * TICK_RATE;

    /// Boss schedule
    pub const BOSS_SCORE_STEP: u64 = 2000;

    /// Special-charge (ulti) capacity
    pub const MAX_SPECIAL_CHARGE: f32 = 100.0;
}

/// Wrap an angle in degrees to [0, 360)
#[inline]
pub fn wrap_degrees(angle: f32) -> f32 {
    angle.rem_euclid(360.0)
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Velocity of `speed` units/second heading `degrees` (0 = right, 90 = down)
#[inline]
pub fn heading(degrees: f32, speed: f32) -> Vec2 {
    polar_to_cartesian(speed, degrees.to_radians())
}

/// Convert a per-tick speed into units per second
#[inline]
pub fn per_tick(units: f32) -> f32 {
    units * consts::TICK_RATE as f32
}

/// Pick an item from a weighted table. Returns `None` for an empty or
/// zero-weight table.
pub fn weighted_choice<T: Copy, R: Rng + ?Sized>(rng: &mut R, table: &[(T, u32)]) -> Option<T> {
    let total: u32 = table.iter().map(|&(_, w)| w).sum();
    if total == 0 {
        return None;
    }
    let mut roll = rng.random_range(0..total);
    for &(item, weight) in table {
        if roll < weight {
            return Some(item);
        }
        roll -= weight;
    }
    None
}
