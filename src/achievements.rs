//! Achievement evaluator
//!
//! Each achievement is a pure predicate over a read-only [`Snapshot`] built
//! once per tick. The book scans every locked entry, unlocks the satisfied
//! ones and queues a notification for each. Unlocking is monotonic.

use std::collections::VecDeque;

use thiserror::Error;

use crate::consts::TICK_RATE;
use crate::economy::{AuxiliaryFlags, UpgradeLevels};

/// Ticks a notification stays visible
pub const NOTIFICATION_TICKS: u32 = 3 * TICK_RATE;
/// Ticks without shooting that earn `pacifist`
pub const PACIFIST_TICKS: u64 = 60 * TICK_RATE as u64;

/// Read-only view of the world the predicates see
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub kill_counter: u64,
    pub score: u64,
    pub currency: u64,
    pub health: f32,
    pub max_health: f32,
    pub combo: u32,
    pub upgrades: UpgradeLevels,
    pub auxiliaries: AuxiliaryFlags,
    pub tick: u64,
    /// Tick of the most recent trigger pull
    pub last_shot_tick: u64,
    pub boss_just_killed: bool,
    /// Kills of a special released this tick
    pub special_kills: Option<u32>,
    pub shot_fired: bool,
}

/// A predicate could not decide
#[derive(Debug, Error, PartialEq)]
pub enum EvalError {
    #[error("max health is {0}, cannot compute a health ratio")]
    InvalidMaxHealth(f32),
    #[error("last shot at tick {last_shot} is after the current tick {now}")]
    ClockSkew { last_shot: u64, now: u64 },
}

pub type Predicate = fn(&Snapshot) -> Result<bool, EvalError>;

pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    predicate: Predicate,
    pub unlocked: bool,
    /// Tick the achievement was earned; `None` for locked or restored entries
    pub unlocked_at: Option<u64>,
}

impl std::fmt::Debug for Achievement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Achievement")
            .field("id", &self.id)
            .field("unlocked", &self.unlocked)
            .field("unlocked_at", &self.unlocked_at)
            .finish()
    }
}

impl Achievement {
    pub const fn new(id: &'static str, title: &'static str, description: &'static str, predicate: Predicate) -> Self {
        Self {
            id,
            title,
            description,
            predicate,
            unlocked: false,
            unlocked_at: None,
        }
    }

    pub fn check(&self, snapshot: &Snapshot) -> Result<bool, EvalError> {
        (self.predicate)(snapshot)
    }
}

fn health_ratio(s: &Snapshot) -> Result<f32, EvalError> {
    if s.max_health <= 0.0 || !s.max_health.is_finite() {
        return Err(EvalError::InvalidMaxHealth(s.max_health));
    }
    Ok(s.health / s.max_health)
}

fn first_blood(s: &Snapshot) -> Result<bool, EvalError> {
    Ok(s.kill_counter >= 1)
}

fn sniper_elite(s: &Snapshot) -> Result<bool, EvalError> {
    Ok(s.score >= 1000 && health_ratio(s)? >= 1.0)
}

fn money_maker(s: &Snapshot) -> Result<bool, EvalError> {
    Ok(s.currency >= 1000)
}

fn combo_master(s: &Snapshot) -> Result<bool, EvalError> {
    Ok(s.combo >= 25)
}

fn near_death(s: &Snapshot) -> Result<bool, EvalError> {
    if !s.boss_just_killed {
        return Ok(false);
    }
    Ok(health_ratio(s)? < 0.2)
}

fn pacifist(s: &Snapshot) -> Result<bool, EvalError> {
    if s.last_shot_tick > s.tick {
        return Err(EvalError::ClockSkew {
            last_shot: s.last_shot_tick,
            now: s.tick,
        });
    }
    Ok(!s.shot_fired && s.tick - s.last_shot_tick >= PACIFIST_TICKS)
}

fn ulti_master(s: &Snapshot) -> Result<bool, EvalError> {
    Ok(s.special_kills.is_some_and(|kills| kills >= 5))
}

fn fully_loaded(s: &Snapshot) -> Result<bool, EvalError> {
    Ok(s.auxiliaries.all_owned())
}

fn light_speed(s: &Snapshot) -> Result<bool, EvalError> {
    Ok(s.upgrades.speed >= 5)
}

fn cyber_millionaire(s: &Snapshot) -> Result<bool, EvalError> {
    Ok(s.currency >= 5000)
}

/// Full catalogue, locked
pub fn catalogue() -> Vec<Achievement> {
    vec![
        Achievement::new("first_blood", "First Blood", "Destroy your first enemy", first_blood),
        Achievement::new(
            "sniper_elite",
            "Sniper Elite",
            "Reach 1000 score without taking damage",
            sniper_elite,
        ),
        Achievement::new("money_maker", "Money Maker", "Hold 1000 credits", money_maker),
        Achievement::new("combo_master", "Combo Master", "Reach a 25 kill combo", combo_master),
        Achievement::new(
            "near_death",
            "Near Death",
            "Defeat a boss with less than 20% health",
            near_death,
        ),
        Achievement::new("pacifist", "Pacifist", "Survive 60 seconds without shooting", pacifist),
        Achievement::new("ulti_master", "Ulti Master", "Destroy 5 enemies with one special", ulti_master),
        Achievement::new("fully_loaded", "Fully Loaded", "Own every auxiliary weapon", fully_loaded),
        Achievement::new("light_speed", "Light Speed", "Reach speed level 5", light_speed),
        Achievement::new(
            "cyber_millionaire",
            "Cyber Millionaire",
            "Hold 5000 credits",
            cyber_millionaire,
        ),
    ]
}

/// An unlock waiting to be (or being) displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notification {
    pub id: &'static str,
    pub title: &'static str,
    /// Ticks left on screen; counts only while at the front of the queue
    pub remaining: u32,
}

/// Catalogue plus unlock state and the notification queue
#[derive(Debug)]
pub struct AchievementBook {
    entries: Vec<Achievement>,
    notifications: VecDeque<Notification>,
}

impl Default for AchievementBook {
    fn default() -> Self {
        Self::new()
    }
}

impl AchievementBook {
    pub fn new() -> Self {
        Self::with_entries(catalogue())
    }

    pub fn with_entries(entries: Vec<Achievement>) -> Self {
        Self {
            entries,
            notifications: VecDeque::new(),
        }
    }

    pub fn entries(&self) -> &[Achievement] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&Achievement> {
        self.entries.iter().find(|a| a.id == id)
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.get(id).is_some_and(|a| a.unlocked)
    }

    /// Scan locked entries against `snapshot`; returns the ids unlocked now.
    /// A failing predicate counts as not satisfied.
    pub fn evaluate(&mut self, snapshot: &Snapshot, now: u64) -> Vec<&'static str> {
        let mut unlocked = Vec::new();
        for entry in self.entries.iter_mut().filter(|a| !a.unlocked) {
            match entry.check(snapshot) {
                Ok(true) => {
                    entry.unlocked = true;
                    entry.unlocked_at = Some(now);
                    log::info!("Achievement unlocked: {} at tick {}", entry.id, now);
                    self.notifications.push_back(Notification {
                        id: entry.id,
                        title: entry.title,
                        remaining: NOTIFICATION_TICKS,
                    });
                    unlocked.push(entry.id);
                }
                Ok(false) => {}
                Err(e) => log::debug!("Achievement {} skipped: {}", entry.id, e),
            }
        }
        unlocked
    }

    /// Notification currently on screen
    pub fn current_notification(&self) -> Option<&Notification> {
        self.notifications.front()
    }

    pub fn pending_notifications(&self) -> usize {
        self.notifications.len()
    }

    /// Count down the visible notification, dropping it when it expires
    pub fn advance_notifications(&mut self) {
        if let Some(front) = self.notifications.front_mut() {
            front.remaining = front.remaining.saturating_sub(1);
            if front.remaining == 0 {
                self.notifications.pop_front();
            }
        }
    }

    /// Mark persisted ids as unlocked without notifying. Unknown ids are ignored.
    pub fn restore<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in ids {
            let id = id.as_ref();
            match self.entries.iter_mut().find(|a| a.id == id) {
                Some(entry) => entry.unlocked = true,
                None => log::debug!("Ignoring unknown achievement id {id:?}"),
            }
        }
    }

    pub fn unlocked_ids(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|a| a.unlocked)
            .map(|a| a.id.to_string())
            .collect()
    }
}
