//! World state
//!
//! The world exclusively owns every entity collection. The combat resolver
//! and boss engine borrow pieces of it for one call and keep nothing.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{Boss, Enemy, EntityId, Pickup, Player, Projectile, ShipClass, Target};
use super::events::{GameEvent, TickEvents};
use crate::achievements::{AchievementBook, Snapshot};
use crate::consts::{BOSS_SCORE_STEP, TICK_RATE};
use crate::economy::{Auxiliary, AuxiliaryOutcome, Ledger, UpgradeKind};

/// Run lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    Playing,
    Paused,
    /// Ship destroyed; the field keeps moving without combat
    Dying { ticks_left: u32 },
    GameOver,
}

/// First boss threshold strictly above `score`
pub fn boss_threshold_for(score: u64) -> u64 {
    (score / BOSS_SCORE_STEP + 1) * BOSS_SCORE_STEP
}

/// Complete simulation state
#[derive(Debug)]
pub struct World {
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub phase: RunPhase,
    pub player: Player,
    /// Live enemies in spawn order
    pub enemies: Vec<Enemy>,
    pub boss: Option<Boss>,
    pub projectiles: Vec<Projectile>,
    pub pickups: Vec<Pickup>,
    pub ledger: Ledger,
    pub achievements: AchievementBook,
    /// Kills this run
    pub kill_counter: u64,
    /// Scales enemy health and speed; +0.5 per boss
    pub difficulty: f32,
    /// Score at which the next boss appears
    pub next_boss_score: u64,
    pub tick_events: TickEvents,
    /// Presentation cues from the last tick
    pub events: Vec<GameEvent>,
    /// Screen shake ticks remaining
    pub shake_ticks: u32,
    /// Radius of the expanding special-release ring
    pub emp_radius: Option<f32>,
    /// Tick of the most recent trigger pull
    pub last_shot_tick: u64,
    /// Ticks since the last autosave request
    pub autosave_ticks: u32,
    /// Set by the tick, cleared by whoever saves
    pub autosave_due: bool,
    next_id: EntityId,
}

impl World {
    /// Fresh run with the given ledger carried in
    pub fn new(seed: u64, class: ShipClass, ledger: Ledger) -> Self {
        let next_boss_score = boss_threshold_for(ledger.score);
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time_ticks: 0,
            phase: RunPhase::Playing,
            player: Player::new(class, &ledger),
            enemies: Vec::new(),
            boss: None,
            projectiles: Vec::new(),
            pickups: Vec::new(),
            ledger,
            achievements: AchievementBook::new(),
            kill_counter: 0,
            difficulty: 1.0,
            next_boss_score,
            tick_events: TickEvents::default(),
            events: Vec::new(),
            shake_ticks: 0,
            emp_radius: None,
            last_shot_tick: 0,
            autosave_ticks: 0,
            autosave_due: false,
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Tick time in milliseconds
    pub fn now_ms(&self) -> u64 {
        self.time_ticks * 1000 / TICK_RATE as u64
    }

    pub fn is_playing(&self) -> bool {
        self.phase == RunPhase::Playing
    }

    pub fn is_over(&self) -> bool {
        self.phase == RunPhase::GameOver
    }

    /// Pause or resume. Only a running game can be paused.
    pub fn set_paused(&mut self, paused: bool) {
        self.phase = match (self.phase, paused) {
            (RunPhase::Playing, true) => RunPhase::Paused,
            (RunPhase::Paused, false) => RunPhase::Playing,
            (phase, _) => phase,
        };
    }

    /// New ship and an empty field; the ledger and achievements are kept
    pub fn restart_run(&mut self, class: ShipClass) {
        self.ledger.reset_run();
        self.player = Player::new(class, &self.ledger);
        self.enemies.clear();
        self.boss = None;
        self.projectiles.clear();
        self.pickups.clear();
        self.kill_counter = 0;
        self.difficulty = 1.0;
        self.next_boss_score = boss_threshold_for(self.ledger.score);
        self.tick_events.clear();
        self.events.clear();
        self.shake_ticks = 0;
        self.emp_radius = None;
        self.last_shot_tick = self.time_ticks;
        self.phase = RunPhase::Playing;
        log::info!("Run restarted as {:?}, next boss at {}", class, self.next_boss_score);
    }

    /// Buy one upgrade level and mirror it into the ship
    pub fn purchase_upgrade(&mut self, kind: UpgradeKind) -> bool {
        if !self.ledger.apply_upgrade(kind) {
            return false;
        }
        self.player.apply_upgrade(kind, &self.ledger.upgrades);
        true
    }

    /// Buy or toggle an auxiliary and mirror the loadout into the ship
    pub fn purchase_or_toggle_aux(&mut self, aux: Auxiliary) -> AuxiliaryOutcome {
        let outcome = self.ledger.purchase_or_toggle(aux);
        self.player.sync_loadout(self.ledger.auxiliaries);
        outcome
    }

    /// Current position of a homing target, if it still exists
    pub fn target_position(&self, target: Target) -> Option<Vec2> {
        target_position(&self.enemies, self.boss.as_ref(), target)
    }

    /// Nearest live enemy or the boss, measured from `from`
    pub fn closest_hostile(&self, from: Vec2) -> Option<(Target, Vec2)> {
        let enemies = self
            .enemies
            .iter()
            .filter(|e| e.is_live())
            .map(|e| (Target::Enemy(e.id), e.pos));
        let boss = self.boss.iter().map(|b| (Target::Boss, b.pos));
        enemies
            .chain(boss)
            .min_by(|a, b| from.distance_squared(a.1).total_cmp(&from.distance_squared(b.1)))
    }

    /// Read-only view for the achievement predicates
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            kill_counter: self.kill_counter,
            score: self.ledger.score,
            currency: self.ledger.currency,
            health: self.player.health,
            max_health: self.player.max_health,
            combo: self.ledger.combo,
            upgrades: self.ledger.upgrades,
            auxiliaries: self.ledger.auxiliaries,
            tick: self.time_ticks,
            last_shot_tick: self.last_shot_tick,
            boss_just_killed: self.tick_events.boss_just_killed,
            special_kills: self.tick_events.special_kills,
            shot_fired: self.tick_events.shot_fired,
        }
    }
}

/// Resolve a target handle against the live tables
pub(crate) fn target_position(enemies: &[Enemy], boss: Option<&Boss>, target: Target) -> Option<Vec2> {
    match target {
        Target::Enemy(id) => enemies.iter().find(|e| e.id == id && e.is_live()).map(|e| e.pos),
        Target::Boss => boss.map(|b| b.pos),
    }
}
