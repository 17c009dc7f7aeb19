//! Economy and progression ledger
//!
//! Currency, score, combo bookkeeping and the permanent upgrade state. The
//! ledger is mutated by the combat resolver during a tick and by shop calls
//! between ticks; every mutation is synchronous.

use serde::{Deserialize, Serialize};

use crate::consts::COMBO_WINDOW_TICKS;

/// Stacking upgrades bought in the shop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpgradeKind {
    Health,
    Damage,
    Speed,
    FireRate,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 4] = [
        UpgradeKind::Health,
        UpgradeKind::Damage,
        UpgradeKind::Speed,
        UpgradeKind::FireRate,
    ];

    /// Price of one level
    pub fn cost(self) -> u64 {
        match self {
            UpgradeKind::Health => 150,
            UpgradeKind::Damage => 200,
            UpgradeKind::Speed => 150,
            UpgradeKind::FireRate => 300,
        }
    }
}

/// Max health gained per health level
pub const HEALTH_PER_LEVEL: f32 = 50.0;
/// Damage gained per damage level
pub const DAMAGE_PER_LEVEL: f32 = 10.0;
/// Speed (units/tick) gained per speed level
pub const SPEED_PER_LEVEL: f32 = 1.0;
/// Fire cooldown ticks removed per fire-rate level
pub const COOLDOWN_PER_LEVEL: u32 = 2;
/// Fire cooldown never drops below this
pub const MIN_FIRE_COOLDOWN: u32 = 5;

/// Auxiliary weapon systems: bought once, then toggled freely
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Auxiliary {
    TwinShot,
    Drone,
    HomingMissile,
}

impl Auxiliary {
    pub const ALL: [Auxiliary; 3] = [Auxiliary::TwinShot, Auxiliary::Drone, Auxiliary::HomingMissile];

    pub fn cost(self) -> u64 {
        match self {
            Auxiliary::TwinShot => 500,
            Auxiliary::Drone => 1000,
            Auxiliary::HomingMissile => 1500,
        }
    }
}

/// Owned/equipped bits of one auxiliary. Equipped implies owned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxiliarySlot {
    owned: bool,
    equipped: bool,
}

impl AuxiliarySlot {
    pub fn owned(&self) -> bool {
        self.owned
    }

    pub fn equipped(&self) -> bool {
        self.owned && self.equipped
    }

    /// Build from raw persisted bits, dropping an equipped bit without ownership
    pub fn from_bits(owned: bool, equipped: bool) -> Self {
        Self {
            owned,
            equipped: owned && equipped,
        }
    }
}

/// Levels bought for each stacking upgrade
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeLevels {
    pub health: u32,
    pub damage: u32,
    pub speed: u32,
    pub fire_rate: u32,
}

impl UpgradeLevels {
    pub fn level(&self, kind: UpgradeKind) -> u32 {
        match kind {
            UpgradeKind::Health => self.health,
            UpgradeKind::Damage => self.damage,
            UpgradeKind::Speed => self.speed,
            UpgradeKind::FireRate => self.fire_rate,
        }
    }

    fn level_mut(&mut self, kind: UpgradeKind) -> &mut u32 {
        match kind {
            UpgradeKind::Health => &mut self.health,
            UpgradeKind::Damage => &mut self.damage,
            UpgradeKind::Speed => &mut self.speed,
            UpgradeKind::FireRate => &mut self.fire_rate,
        }
    }

    /// Fire cooldown for a ship whose base cooldown is `base`
    pub fn fire_cooldown(&self, base: u32) -> u32 {
        base.saturating_sub(self.fire_rate * COOLDOWN_PER_LEVEL)
            .max(MIN_FIRE_COOLDOWN)
    }
}

/// Auxiliary flags for all three systems
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxiliaryFlags {
    pub twin_shot: AuxiliarySlot,
    pub drone: AuxiliarySlot,
    pub homing_missile: AuxiliarySlot,
}

impl AuxiliaryFlags {
    pub fn slot(&self, aux: Auxiliary) -> AuxiliarySlot {
        match aux {
            Auxiliary::TwinShot => self.twin_shot,
            Auxiliary::Drone => self.drone,
            Auxiliary::HomingMissile => self.homing_missile,
        }
    }

    fn slot_mut(&mut self, aux: Auxiliary) -> &mut AuxiliarySlot {
        match aux {
            Auxiliary::TwinShot => &mut self.twin_shot,
            Auxiliary::Drone => &mut self.drone,
            Auxiliary::HomingMissile => &mut self.homing_missile,
        }
    }

    pub fn all_owned(&self) -> bool {
        Auxiliary::ALL.iter().all(|&aux| self.slot(aux).owned())
    }
}

/// Result of pressing an auxiliary's shop entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuxiliaryOutcome {
    /// Bought and equipped
    Purchased,
    /// Already owned; equipped state is now the given value
    Toggled(bool),
    /// Not owned and not affordable; nothing changed
    InsufficientFunds,
}

/// Currency and score granted for one kill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KillReward {
    pub currency: u64,
    pub score: u64,
    pub jackpot: bool,
}

/// Combo multiplier in tenths: combo 10 -> 20 (2.0x)
#[inline]
pub fn combo_multiplier_tenths(combo: u32) -> u64 {
    10 + combo as u64
}

/// Apply the combo multiplier to a base value, rounding down
#[inline]
pub fn apply_combo(base: u64, combo: u32) -> u64 {
    base * combo_multiplier_tenths(combo) / 10
}

/// The persistent economy/progression ledger
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub currency: u64,
    pub score: u64,
    pub combo: u32,
    pub combo_timer: u32,
    pub max_combo: u32,
    pub upgrades: UpgradeLevels,
    pub auxiliaries: AuxiliaryFlags,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn credit(&mut self, amount: u64) {
        self.currency = self.currency.saturating_add(amount);
    }

    /// Take `amount` from the balance. Fails without mutation when short.
    pub fn debit(&mut self, amount: u64) -> bool {
        if self.currency < amount {
            return false;
        }
        self.currency -= amount;
        true
    }

    pub fn add_score(&mut self, amount: u64) {
        self.score = self.score.saturating_add(amount);
    }

    /// Buy one level of a stacking upgrade
    pub fn apply_upgrade(&mut self, kind: UpgradeKind) -> bool {
        if !self.debit(kind.cost()) {
            return false;
        }
        *self.upgrades.level_mut(kind) += 1;
        true
    }

    /// Buy an auxiliary, or toggle it for free if already owned
    pub fn purchase_or_toggle(&mut self, aux: Auxiliary) -> AuxiliaryOutcome {
        let owned = self.auxiliaries.slot(aux).owned();
        if owned {
            let slot = self.auxiliaries.slot_mut(aux);
            slot.equipped = !slot.equipped;
            return AuxiliaryOutcome::Toggled(slot.equipped);
        }
        if !self.debit(aux.cost()) {
            return AuxiliaryOutcome::InsufficientFunds;
        }
        *self.auxiliaries.slot_mut(aux) = AuxiliarySlot {
            owned: true,
            equipped: true,
        };
        AuxiliaryOutcome::Purchased
    }

    /// Count a kill: bump the combo and restart its window
    pub fn register_kill(&mut self) {
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        self.combo_timer = COMBO_WINDOW_TICKS;
    }

    /// Once-per-tick combo decay. Returns true when a running combo broke.
    pub fn decay_combo(&mut self) -> bool {
        if self.combo_timer > 0 {
            self.combo_timer -= 1;
            false
        } else {
            let broke = self.combo > 0;
            self.combo = 0;
            broke
        }
    }

    /// Reward for a kill at the current combo, credited to the ledger
    pub fn reward_kill(&mut self, base_currency: u64, base_score: u64, jackpot: bool) -> KillReward {
        let mut currency = apply_combo(base_currency, self.combo);
        if jackpot {
            currency *= 3;
        }
        let score = apply_combo(base_score, self.combo);
        self.credit(currency);
        self.add_score(score);
        KillReward {
            currency,
            score,
            jackpot,
        }
    }

    /// Start of a new run: combo state cleared, wallet and upgrades kept
    pub fn reset_run(&mut self) {
        self.combo = 0;
        self.combo_timer = 0;
        self.max_combo = 0;
    }

    /// Wipe everything (new game on an empty slot)
    pub fn wipe(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debit_insufficient_leaves_balance() {
        let mut ledger = Ledger::new();
        ledger.credit(100);
        assert!(!ledger.debit(150));
        assert_eq!(ledger.currency, 100);
    }

    #[test]
    fn test_upgrade_too_expensive_grants_nothing() {
        let mut ledger = Ledger::new();
        ledger.credit(100);
        assert!(!ledger.apply_upgrade(UpgradeKind::Health));
        assert_eq!(ledger.currency, 100);
        assert_eq!(ledger.upgrades.health, 0);
    }

    #[test]
    fn test_upgrade_stacks() {
        let mut ledger = Ledger::new();
        ledger.credit(1000);
        assert!(ledger.apply_upgrade(UpgradeKind::Damage));
        assert!(ledger.apply_upgrade(UpgradeKind::Damage));
        assert_eq!(ledger.upgrades.damage, 2);
        assert_eq!(ledger.currency, 600);
    }

    #[test]
    fn test_fire_cooldown_floor() {
        let levels = UpgradeLevels {
            fire_rate: 10,
            ..Default::default()
        };
        assert_eq!(levels.fire_cooldown(15), MIN_FIRE_COOLDOWN);
        let levels = UpgradeLevels {
            fire_rate: 2,
            ..Default::default()
        };
        assert_eq!(levels.fire_cooldown(15), 11);
    }

    #[test]
    fn test_auxiliary_purchase_then_free_toggle() {
        let mut ledger = Ledger::new();
        ledger.credit(600);
        assert_eq!(ledger.purchase_or_toggle(Auxiliary::TwinShot), AuxiliaryOutcome::Purchased);
        assert_eq!(ledger.currency, 100);
        assert!(ledger.auxiliaries.twin_shot.equipped());

        assert_eq!(ledger.purchase_or_toggle(Auxiliary::TwinShot), AuxiliaryOutcome::Toggled(false));
        assert_eq!(ledger.purchase_or_toggle(Auxiliary::TwinShot), AuxiliaryOutcome::Toggled(true));
        assert_eq!(ledger.currency, 100);
    }

    #[test]
    fn test_auxiliary_unaffordable() {
        let mut ledger = Ledger::new();
        ledger.credit(999);
        assert_eq!(
            ledger.purchase_or_toggle(Auxiliary::Drone),
            AuxiliaryOutcome::InsufficientFunds
        );
        assert!(!ledger.auxiliaries.drone.owned());
        assert_eq!(ledger.currency, 999);
    }

    #[test]
    fn test_equipped_requires_owned() {
        let slot = AuxiliarySlot::from_bits(false, true);
        assert!(!slot.equipped());
        assert!(!slot.owned());
    }

    #[test]
    fn test_combo_ten_doubles_payout() {
        let mut ledger = Ledger::new();
        ledger.combo = 10;
        let reward = ledger.reward_kill(5, 10, false);
        assert_eq!(reward.currency, 10);
        assert_eq!(reward.score, 20);
        assert_eq!(ledger.currency, 10);
    }

    #[test]
    fn test_jackpot_triples_currency_only() {
        let mut ledger = Ledger::new();
        ledger.combo = 1;
        let reward = ledger.reward_kill(15, 20, true);
        // 15 * 1.1 = 16.5 -> 16, then x3
        assert_eq!(reward.currency, 48);
        assert_eq!(reward.score, 22);
    }

    #[test]
    fn test_combo_decays_to_zero_after_window() {
        let mut ledger = Ledger::new();
        ledger.register_kill();
        ledger.register_kill();
        assert_eq!(ledger.combo, 2);
        for _ in 0..COMBO_WINDOW_TICKS {
            assert!(!ledger.decay_combo());
        }
        assert_eq!(ledger.combo, 2);
        assert!(ledger.decay_combo());
        assert_eq!(ledger.combo, 0);
        assert_eq!(ledger.max_combo, 2);
        assert_eq!(apply_combo(5, ledger.combo), 5);
    }
}
