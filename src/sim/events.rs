//! Per-tick signals
//!
//! [`TickEvents`] holds the edge-triggered flags the achievement evaluator
//! reads; [`GameEvent`] is the cue list the presentation layer drains for
//! sounds, floating text and shake. Both are cleared at the start of every
//! tick, so anything set during tick N is visible for exactly tick N.

use glam::Vec2;

use super::entity::{DamageOutcome, EnemyKind, PickupKind};

/// One-tick flags for the achievement snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickEvents {
    pub boss_just_killed: bool,
    /// Kills made by a special released this tick
    pub special_kills: Option<u32>,
    pub shot_fired: bool,
}

impl TickEvents {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Presentation cues produced during a tick
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Crit {
        pos: Vec2,
    },
    EnemyKilled {
        kind: EnemyKind,
        pos: Vec2,
        currency: u64,
        jackpot: bool,
        combo: u32,
    },
    EnemyFired {
        pos: Vec2,
    },
    BossSpawned,
    BossEnraged,
    BossAttack {
        projectiles: usize,
    },
    BossHit {
        damage: f32,
    },
    BossKilled {
        pos: Vec2,
    },
    PlayerHit {
        outcome: DamageOutcome,
        damage: f32,
    },
    PlayerDied {
        pos: Vec2,
    },
    PickupCollected {
        kind: PickupKind,
        pos: Vec2,
    },
    SpecialReleased {
        kills: u32,
    },
    Dash,
    AchievementUnlocked {
        id: &'static str,
    },
    ComboBroken {
        combo: u32,
    },
    GameOver,
}
