//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (owned by the world)
//! - Stable iteration order (spawn order)
//! - No rendering, audio or file I/O

pub mod autopilot;
pub mod boss;
pub mod collision;
pub mod combat;
pub mod entity;
pub mod events;
pub mod state;
pub mod tick;

pub use boss::Pattern;
pub use collision::{Collider, Hitbox};
pub use entity::{
    Boss, BossStage, DamageOutcome, Enemy, EnemyKind, EntityId, Owner, Pickup, PickupKind, Player,
    Projectile, Shape, ShipClass, Target,
};
pub use events::{GameEvent, TickEvents};
pub use state::{RunPhase, World, boss_threshold_for};
pub use tick::tick;
