//! Entity records and their self-contained update rules
//!
//! Positions are centers in field units, velocities are units per second and
//! every cooldown is counted in ticks. `advance` never looks at other
//! entities; anything relational (homing targets, aim points) is resolved by
//! the caller and passed in.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{Collider, Hitbox};
use crate::consts::*;
use crate::economy::{
    AuxiliaryFlags, DAMAGE_PER_LEVEL, HEALTH_PER_LEVEL, Ledger, SPEED_PER_LEVEL, UpgradeKind,
    UpgradeLevels,
};
use crate::platform::input::{Action, ActionState};
use crate::{per_tick, polar_to_cartesian, weighted_choice};

/// Stable id for entities that can be targeted
pub type EntityId = u32;

/// Handle to a homing target, looked up in the live tables every tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    Enemy(EntityId),
    Boss,
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

pub const PLAYER_SIZE: Vec2 = Vec2::new(50.0, 50.0);
/// Gap between the ship's bottom edge and the bottom of the field at spawn
const PLAYER_SPAWN_BOTTOM_GAP: f32 = 20.0;

pub const SHIELD_DURATION_TICKS: u32 = 7 * TICK_RATE;
pub const DASH_DURATION_TICKS: u32 = 10;
pub const DASH_COOLDOWN_TICKS: u32 = 120;
pub const DASH_SPEED_FACTOR: f32 = 3.0;

const DRONE_ORBIT_RADIUS: f32 = 40.0;
const DRONE_ORBIT_STEP_DEG: f32 = 5.0;
const DRONE_COOLDOWN_TICKS: u32 = 40;
const DRONE_SHOT_SPEED: f32 = 12.0;
const DRONE_SHOT_DAMAGE: f32 = 10.0;

const MISSILE_COOLDOWN_TICKS: u32 = 90;
const MISSILE_LAUNCH_SPEED: f32 = 5.0;
const MISSILE_DAMAGE: f32 = 30.0;
/// Cruise speed a homing projectile steers toward (units/tick)
pub const HOMING_SPEED: f32 = 8.0;
/// Fraction of the steering error corrected per tick
pub const HOMING_BLEND: f32 = 0.1;

const TWIN_SHOT_OFFSET: f32 = 15.0;

/// Selectable hulls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShipClass {
    #[default]
    Interceptor,
    Destroyer,
    Speeder,
    Sniper,
}

/// Base numbers of a hull before upgrades
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HullStats {
    /// Units per tick
    pub speed: f32,
    pub max_health: f32,
    pub damage: f32,
    pub fire_cooldown: u32,
}

impl ShipClass {
    pub const ALL: [ShipClass; 4] = [
        ShipClass::Interceptor,
        ShipClass::Destroyer,
        ShipClass::Speeder,
        ShipClass::Sniper,
    ];

    pub fn stats(self) -> HullStats {
        let (speed, max_health, damage, fire_cooldown) = match self {
            ShipClass::Interceptor => (6.0, 100.0, 15.0, 15),
            ShipClass::Destroyer => (3.0, 300.0, 25.0, 20),
            ShipClass::Speeder => (10.0, 50.0, 10.0, 10),
            ShipClass::Sniper => (5.0, 80.0, 100.0, 45),
        };
        HullStats {
            speed,
            max_health,
            damage,
            fire_cooldown,
        }
    }
}

/// Timed shield. Hits never deplete it; only time does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shield {
    pub active: bool,
    pub remaining: u32,
    pub max: u32,
}

/// Dash burst: short invulnerable speed boost with a cooldown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Dash {
    pub active: bool,
    pub remaining: u32,
    pub cooldown: u32,
}

/// What a batch of damage did to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Dashing: nothing happened
    Evaded,
    /// Shield took it
    Absorbed,
    /// Hull lost health
    Hull,
}

/// The player ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub class: ShipClass,
    pub pos: Vec2,
    pub vel: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub damage: f32,
    pub fire_cooldown: u32,
    pub fire_cooldown_limit: u32,
    /// Units per tick without dash
    pub base_speed: f32,
    pub shield: Shield,
    pub dash: Dash,
    pub special_charge: f32,
    pub loadout: AuxiliaryFlags,
    pub drone_angle: f32,
    pub drone_cooldown: u32,
    pub missile_cooldown: u32,
    /// False once destroyed; a dead ship neither moves nor shoots
    pub alive: bool,
}

impl Player {
    /// Build a ship of `class` with the ledger's upgrades and loadout applied
    pub fn new(class: ShipClass, ledger: &Ledger) -> Self {
        let hull = class.stats();
        let levels = &ledger.upgrades;
        let max_health = hull.max_health + levels.health as f32 * HEALTH_PER_LEVEL;
        Self {
            class,
            pos: Vec2::new(
                FIELD_WIDTH / 2.0,
                FIELD_HEIGHT - PLAYER_SPAWN_BOTTOM_GAP - PLAYER_SIZE.y / 2.0,
            ),
            vel: Vec2::ZERO,
            health: max_health,
            max_health,
            damage: hull.damage + levels.damage as f32 * DAMAGE_PER_LEVEL,
            fire_cooldown: 0,
            fire_cooldown_limit: levels.fire_cooldown(hull.fire_cooldown),
            base_speed: hull.speed + levels.speed as f32 * SPEED_PER_LEVEL,
            shield: Shield {
                active: false,
                remaining: 0,
                max: SHIELD_DURATION_TICKS,
            },
            dash: Dash::default(),
            special_charge: 0.0,
            loadout: ledger.auxiliaries,
            drone_angle: 0.0,
            drone_cooldown: 0,
            missile_cooldown: 0,
            alive: true,
        }
    }

    /// Mirror one purchased upgrade level into the live ship
    pub fn apply_upgrade(&mut self, kind: UpgradeKind, levels: &UpgradeLevels) {
        match kind {
            UpgradeKind::Health => {
                self.max_health += HEALTH_PER_LEVEL;
                self.health += HEALTH_PER_LEVEL;
            }
            UpgradeKind::Damage => self.damage += DAMAGE_PER_LEVEL,
            UpgradeKind::Speed => self.base_speed += SPEED_PER_LEVEL,
            UpgradeKind::FireRate => {
                self.fire_cooldown_limit = levels.fire_cooldown(self.class.stats().fire_cooldown);
            }
        }
    }

    /// Mirror the ledger's owned/equipped bits into the live ship
    pub fn sync_loadout(&mut self, flags: AuxiliaryFlags) {
        self.loadout = flags;
    }

    pub fn twin_shot(&self) -> bool {
        self.loadout.twin_shot.equipped()
    }

    pub fn has_drone(&self) -> bool {
        self.loadout.drone.equipped()
    }

    pub fn has_missiles(&self) -> bool {
        self.loadout.homing_missile.equipped()
    }

    /// Current top speed in units per tick
    pub fn speed(&self) -> f32 {
        if self.dash.active {
            self.base_speed * DASH_SPEED_FACTOR
        } else {
            self.base_speed
        }
    }

    pub fn activate_shield(&mut self) {
        self.shield.active = true;
        self.shield.remaining = self.shield.max;
    }

    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount).min(self.max_health);
    }

    pub fn add_special(&mut self, amount: f32) {
        self.special_charge = (self.special_charge + amount).min(MAX_SPECIAL_CHARGE);
    }

    pub fn special_ready(&self) -> bool {
        self.special_charge >= MAX_SPECIAL_CHARGE
    }

    /// Spend a full charge. Returns false (and keeps the charge) when not full.
    pub fn consume_special(&mut self) -> bool {
        if !self.special_ready() {
            return false;
        }
        self.special_charge = 0.0;
        true
    }

    /// Apply the summed damage of one tick: dash beats shield beats hull.
    /// Health is not clamped here; callers decide when death fires.
    pub fn receive_damage(&mut self, total: f32) -> DamageOutcome {
        if self.dash.active {
            DamageOutcome::Evaded
        } else if self.shield.active {
            DamageOutcome::Absorbed
        } else {
            self.health -= total;
            DamageOutcome::Hull
        }
    }

    pub fn drone_position(&self) -> Vec2 {
        self.pos + polar_to_cartesian(DRONE_ORBIT_RADIUS, self.drone_angle.to_radians())
    }

    /// Timers, dash, movement and the main gun for one tick
    pub fn advance(&mut self, dt: f32, input: &ActionState) -> Vec<Projectile> {
        if !self.alive {
            self.vel = Vec2::ZERO;
            return Vec::new();
        }

        if self.shield.active {
            self.shield.remaining = self.shield.remaining.saturating_sub(1);
            if self.shield.remaining == 0 {
                self.shield.active = false;
            }
        }

        if input.pressed(Action::Dash) && self.dash.cooldown == 0 {
            self.dash.active = true;
            self.dash.remaining = DASH_DURATION_TICKS;
            self.dash.cooldown = DASH_COOLDOWN_TICKS;
        }
        if self.dash.active {
            self.dash.remaining = self.dash.remaining.saturating_sub(1);
            if self.dash.remaining == 0 {
                self.dash.active = false;
            }
        }
        self.dash.cooldown = self.dash.cooldown.saturating_sub(1);

        let (ax, ay) = input.move_axis();
        self.vel = Vec2::new(ax, ay) * per_tick(self.speed());
        let half = PLAYER_SIZE * 0.5;
        let next = self.pos + self.vel * dt;
        self.pos = next.clamp(half, Vec2::new(FIELD_WIDTH, FIELD_HEIGHT) - half);

        self.fire_cooldown = self.fire_cooldown.saturating_sub(1);
        if self.has_drone() {
            self.drone_angle = crate::wrap_degrees(self.drone_angle + DRONE_ORBIT_STEP_DEG);
            self.drone_cooldown = self.drone_cooldown.saturating_sub(1);
        }
        if self.has_missiles() {
            self.missile_cooldown = self.missile_cooldown.saturating_sub(1);
        }

        if input.pressed(Action::Shoot) {
            self.shoot()
        } else {
            Vec::new()
        }
    }

    /// Main gun. Empty when still cooling down.
    pub fn shoot(&mut self) -> Vec<Projectile> {
        if self.fire_cooldown > 0 || !self.alive {
            return Vec::new();
        }
        self.fire_cooldown = self.fire_cooldown_limit;
        let muzzle = Vec2::new(self.pos.x, self.pos.y - PLAYER_SIZE.y / 2.0);

        if self.class == ShipClass::Sniper {
            return vec![Projectile::new(
                Owner::Player,
                muzzle,
                Vec2::new(0.0, per_tick(-20.0)),
                self.damage,
                Shape::Lance,
            )];
        }

        let bolt = |x: f32| {
            Projectile::new(
                Owner::Player,
                Vec2::new(x, muzzle.y),
                Vec2::new(0.0, per_tick(-10.0)),
                self.damage,
                Shape::Bolt,
            )
        };
        if self.twin_shot() {
            vec![bolt(muzzle.x - TWIN_SHOT_OFFSET), bolt(muzzle.x + TWIN_SHOT_OFFSET)]
        } else {
            vec![bolt(muzzle.x)]
        }
    }

    /// Drone shot from the orbit position toward `target`
    pub fn fire_drone(&mut self, target: Vec2) -> Option<Projectile> {
        if !self.alive || !self.has_drone() || self.drone_cooldown > 0 {
            return None;
        }
        let dir = (target - self.pos).normalize_or_zero();
        if dir == Vec2::ZERO {
            return None;
        }
        self.drone_cooldown = DRONE_COOLDOWN_TICKS;
        Some(Projectile::new(
            Owner::Player,
            self.drone_position(),
            dir * per_tick(DRONE_SHOT_SPEED),
            DRONE_SHOT_DAMAGE,
            Shape::Pellet,
        ))
    }

    /// Launch a homing missile at `target`
    pub fn fire_missile(&mut self, target: Target) -> Option<Projectile> {
        if !self.alive || !self.has_missiles() || self.missile_cooldown > 0 {
            return None;
        }
        self.missile_cooldown = MISSILE_COOLDOWN_TICKS;
        Some(
            Projectile::new(
                Owner::Player,
                self.pos,
                Vec2::new(0.0, per_tick(-MISSILE_LAUNCH_SPEED)),
                MISSILE_DAMAGE,
                Shape::Missile,
            )
            .homing(target),
        )
    }
}

impl Collider for Player {
    fn hitbox(&self) -> Hitbox {
        Hitbox::centered(self.pos, PLAYER_SIZE)
    }
}

// ---------------------------------------------------------------------------
// Enemies
// ---------------------------------------------------------------------------

pub const ENEMY_SIZE: Vec2 = Vec2::new(40.0, 40.0);
const ENEMY_FIRE_INTERVAL: u32 = 120;
const ENEMY_SHOT_DAMAGE: f32 = 10.0;
const ENEMY_SHOT_SPEED: f32 = 8.0;

/// Enemy variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    Light,
    Fast,
    Heavy,
}

impl EnemyKind {
    /// Spawn weights
    pub const WEIGHTS: [(EnemyKind, u32); 3] = [
        (EnemyKind::Light, 60),
        (EnemyKind::Fast, 30),
        (EnemyKind::Heavy, 10),
    ];

    pub fn score_value(self) -> u64 {
        match self {
            EnemyKind::Light => 10,
            EnemyKind::Fast => 20,
            EnemyKind::Heavy => 50,
        }
    }

    pub fn currency_value(self) -> u64 {
        match self {
            EnemyKind::Light => 5,
            EnemyKind::Fast => 15,
            EnemyKind::Heavy => 25,
        }
    }

    pub fn base_health(self) -> f32 {
        match self {
            EnemyKind::Light => 30.0,
            EnemyKind::Fast => 15.0,
            EnemyKind::Heavy => 100.0,
        }
    }

    pub fn can_fire(self) -> bool {
        self == EnemyKind::Fast
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EntityId,
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub health: f32,
    /// Ticks counted toward the next shot (fire-capable variants only)
    pub fire_timer: Option<u32>,
    /// Marked during a combat pass; removed once the pass ends
    #[serde(skip)]
    pub destroyed: bool,
}

impl Enemy {
    /// Fixed-stat enemy, mostly useful for scripted scenarios
    pub fn new(id: EntityId, kind: EnemyKind, pos: Vec2, speed: f32, difficulty: f32) -> Self {
        Self {
            id,
            kind,
            pos,
            vel: Vec2::new(0.0, per_tick(speed)),
            health: kind.base_health() * difficulty,
            fire_timer: kind.can_fire().then_some(0),
            destroyed: false,
        }
    }

    /// Random variant, lane and speed above the top edge
    pub fn spawn<R: Rng + ?Sized>(id: EntityId, rng: &mut R, difficulty: f32) -> Self {
        let kind = weighted_choice(rng, &EnemyKind::WEIGHTS).unwrap_or(EnemyKind::Light);
        let speed = match kind {
            EnemyKind::Light => rng.random_range(2..=5) as f32 + difficulty * 0.5,
            EnemyKind::Fast => rng.random_range(3..=7) as f32 + difficulty * 0.5,
            EnemyKind::Heavy => 1.0 + difficulty * 0.2,
        };
        let left = rng.random_range(0..=(FIELD_WIDTH - ENEMY_SIZE.x) as i32) as f32;
        let top = rng.random_range(-100..=-50) as f32;
        let pos = Vec2::new(left, top) + ENEMY_SIZE * 0.5;
        let mut enemy = Self::new(id, kind, pos, speed, difficulty);
        if kind.can_fire() {
            enemy.fire_timer = Some(rng.random_range(0..=60));
        }
        enemy
    }

    pub fn score_value(&self) -> u64 {
        self.kind.score_value()
    }

    pub fn currency_value(&self) -> u64 {
        self.kind.currency_value()
    }

    /// Alive and not yet flagged this tick
    pub fn is_live(&self) -> bool {
        !self.destroyed && self.health > 0.0
    }

    /// Fell past the bottom of the field
    pub fn escaped(&self) -> bool {
        self.hitbox().top() > FIELD_HEIGHT
    }

    /// Move down; fire-capable variants return a shot when their timer lapses
    pub fn advance(&mut self, dt: f32) -> Option<Projectile> {
        self.pos += self.vel * dt;
        let timer = self.fire_timer.as_mut()?;
        *timer += 1;
        if *timer <= ENEMY_FIRE_INTERVAL {
            return None;
        }
        *timer = 0;
        let muzzle = Vec2::new(self.pos.x, self.hitbox().bottom());
        Some(Projectile::new(
            Owner::Enemy,
            muzzle,
            Vec2::new(0.0, per_tick(ENEMY_SHOT_SPEED)),
            ENEMY_SHOT_DAMAGE,
            Shape::Bolt,
        ))
    }
}

impl Collider for Enemy {
    fn hitbox(&self) -> Hitbox {
        Hitbox::centered(self.pos, ENEMY_SIZE)
    }
}

// ---------------------------------------------------------------------------
// Boss
// ---------------------------------------------------------------------------

pub const BOSS_SIZE: Vec2 = Vec2::new(240.0, 150.0);
pub const BOSS_MAX_HEALTH: f32 = 3000.0;
/// Top edge where the entrance ends and the bob is centered
pub const BOSS_ARENA_TOP: f32 = 50.0;
const BOSS_SPAWN_TOP: f32 = -200.0;
/// Units per tick, horizontally and during the entrance
const BOSS_SPEED: f32 = 2.0;
const BOSS_BOB_AMPLITUDE: f32 = 20.0;
/// Radians per millisecond
const BOSS_BOB_RATE: f32 = 0.002;
const BOSS_WALL_PADDING: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossStage {
    /// Descending into the arena; cannot attack yet
    Entering,
    Active,
}

/// Boss record. Attack patterns live in [`super::boss`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    pub pos: Vec2,
    pub health: f32,
    pub max_health: f32,
    /// 1 or 2; only ever moves from 1 to 2
    pub phase: u8,
    pub stage: BossStage,
    /// +1 moving right, -1 moving left
    pub direction: f32,
    /// Degrees
    pub spiral_angle: f32,
    /// Degrees
    pub flower_offset: f32,
    /// Tick time (ms) of the last attack
    pub last_attack_ms: u64,
}

impl Default for Boss {
    fn default() -> Self {
        Self::new()
    }
}

impl Boss {
    pub fn new() -> Self {
        Self {
            pos: Vec2::new(FIELD_WIDTH / 2.0, BOSS_SPAWN_TOP + BOSS_SIZE.y / 2.0),
            health: BOSS_MAX_HEALTH,
            max_health: BOSS_MAX_HEALTH,
            phase: 1,
            stage: BossStage::Entering,
            direction: 1.0,
            spiral_angle: 0.0,
            flower_offset: 0.0,
            last_attack_ms: 0,
        }
    }

    pub fn entered(&self) -> bool {
        self.stage == BossStage::Active
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Subtract health and latch phase 2 once below half
    pub fn take_damage(&mut self, amount: f32) {
        self.health -= amount;
        self.refresh_phase();
    }

    /// One-way phase latch
    pub fn refresh_phase(&mut self) {
        if self.phase == 1 && self.health < self.max_health * 0.5 {
            self.phase = 2;
            log::info!("Boss enraged (phase 2) at {:.0} health", self.health);
        }
    }

    /// Entrance descent, then horizontal bounce with a sinusoidal bob
    pub fn advance(&mut self, dt: f32, now_ms: u64) {
        let step = per_tick(BOSS_SPEED) * dt;
        match self.stage {
            BossStage::Entering => {
                self.pos.y += step;
                if self.hitbox().top() >= BOSS_ARENA_TOP {
                    self.stage = BossStage::Active;
                    self.last_attack_ms = now_ms;
                }
            }
            BossStage::Active => {
                self.pos.x += step * self.direction;
                let top = BOSS_ARENA_TOP + (now_ms as f32 * BOSS_BOB_RATE).sin() * BOSS_BOB_AMPLITUDE;
                self.pos.y = top + BOSS_SIZE.y / 2.0;
                let hb = self.hitbox();
                if hb.right() > FIELD_WIDTH - BOSS_WALL_PADDING || hb.left() < BOSS_WALL_PADDING {
                    self.direction = -self.direction;
                }
            }
        }
    }
}

impl Collider for Boss {
    fn hitbox(&self) -> Hitbox {
        Hitbox::centered(self.pos, BOSS_SIZE)
    }
}

// ---------------------------------------------------------------------------
// Projectiles
// ---------------------------------------------------------------------------

/// Who fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    Player,
    Enemy,
    Boss,
}

/// Visual/footprint class of a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    /// Standard gun bolt
    Bolt,
    /// Sniper's long shot
    Lance,
    /// Drone shot
    Pellet,
    Missile,
    /// Boss shotgun slug
    Slug,
    /// Boss spiral shot
    Orb,
    /// Boss flower petal
    Petal,
    /// Boss aimed shot
    Spike,
}

impl Shape {
    pub fn size(self) -> Vec2 {
        match self {
            Shape::Bolt => Vec2::new(6.0, 15.0),
            Shape::Lance => Vec2::new(4.0, 30.0),
            Shape::Pellet => Vec2::new(4.0, 4.0),
            Shape::Missile => Vec2::new(10.0, 10.0),
            Shape::Slug => Vec2::new(8.0, 20.0),
            Shape::Orb => Vec2::new(10.0, 10.0),
            Shape::Petal => Vec2::new(12.0, 12.0),
            Shape::Spike => Vec2::new(15.0, 15.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub owner: Owner,
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: f32,
    pub shape: Shape,
    /// Steering target; a vanished target means straight flight
    pub homing: Option<Target>,
    /// Marked during a combat pass; removed once the pass ends
    #[serde(skip)]
    pub consumed: bool,
}

impl Projectile {
    pub fn new(owner: Owner, pos: Vec2, vel: Vec2, damage: f32, shape: Shape) -> Self {
        Self {
            owner,
            pos,
            vel,
            damage,
            shape,
            homing: None,
            consumed: false,
        }
    }

    pub fn homing(mut self, target: Target) -> Self {
        self.homing = Some(target);
        self
    }

    pub fn is_hostile(&self) -> bool {
        self.owner != Owner::Player
    }

    pub fn is_live(&self) -> bool {
        !self.consumed
    }

    /// Move one tick. `target_pos` is the resolved homing target, if it still exists.
    pub fn advance(&mut self, dt: f32, target_pos: Option<Vec2>) {
        if let Some(target) = target_pos {
            let to_target = target - self.pos;
            if to_target.length_squared() > 0.0 {
                let desired = to_target.normalize() * per_tick(HOMING_SPEED);
                self.vel += (desired - self.vel) * HOMING_BLEND;
            }
        }
        self.pos += self.vel * dt;
    }

    pub fn out_of_bounds(&self) -> bool {
        let hb = self.hitbox();
        hb.bottom() < -OUT_OF_BOUNDS_MARGIN
            || hb.top() > FIELD_HEIGHT + OUT_OF_BOUNDS_MARGIN
            || hb.right() < -OUT_OF_BOUNDS_MARGIN
            || hb.left() > FIELD_WIDTH + OUT_OF_BOUNDS_MARGIN
    }
}

impl Collider for Projectile {
    fn hitbox(&self) -> Hitbox {
        Hitbox::centered(self.pos, self.shape.size())
    }
}

// ---------------------------------------------------------------------------
// Pickups
// ---------------------------------------------------------------------------

pub const PICKUP_SIZE: Vec2 = Vec2::new(24.0, 24.0);
const PICKUP_FALL_SPEED: f32 = 3.0;
pub const HEALTH_PICKUP_AMOUNT: f32 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupKind {
    Health,
    Shield,
}

impl PickupKind {
    pub const WEIGHTS: [(PickupKind, u32); 2] = [(PickupKind::Health, 70), (PickupKind::Shield, 30)];

    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        weighted_choice(rng, &Self::WEIGHTS).unwrap_or(PickupKind::Health)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub kind: PickupKind,
    pub pos: Vec2,
    pub vel: Vec2,
}

impl Pickup {
    pub fn new(kind: PickupKind, pos: Vec2) -> Self {
        Self {
            kind,
            pos,
            vel: Vec2::new(0.0, per_tick(PICKUP_FALL_SPEED)),
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.pos += self.vel * dt;
    }

    pub fn escaped(&self) -> bool {
        self.hitbox().top() > FIELD_HEIGHT
    }
}

impl Collider for Pickup {
    fn hitbox(&self) -> Hitbox {
        Hitbox::centered(self.pos, PICKUP_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::Auxiliary;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn ledger_with(aux: &[Auxiliary]) -> Ledger {
        let mut ledger = Ledger::new();
        ledger.credit(10_000);
        for &a in aux {
            ledger.purchase_or_toggle(a);
        }
        ledger
    }

    #[test]
    fn test_upgrades_applied_at_spawn() {
        let mut ledger = Ledger::new();
        ledger.upgrades.health = 2;
        ledger.upgrades.damage = 1;
        ledger.upgrades.speed = 3;
        ledger.upgrades.fire_rate = 20;
        let player = Player::new(ShipClass::Interceptor, &ledger);
        assert_eq!(player.max_health, 200.0);
        assert_eq!(player.health, 200.0);
        assert_eq!(player.damage, 25.0);
        assert_eq!(player.base_speed, 9.0);
        assert_eq!(player.fire_cooldown_limit, 5);
    }

    #[test]
    fn test_main_gun_respects_cooldown() {
        let mut player = Player::new(ShipClass::Interceptor, &Ledger::new());
        let fire = ActionState::with(&[Action::Shoot]);
        assert_eq!(player.advance(SIM_DT, &fire).len(), 1);
        // Cooldown of 15 ticks: the next 14 ticks are silent
        for _ in 0..14 {
            assert!(player.advance(SIM_DT, &fire).is_empty());
        }
        assert_eq!(player.advance(SIM_DT, &fire).len(), 1);
    }

    #[test]
    fn test_twin_shot_needs_equipped() {
        let mut ledger = ledger_with(&[Auxiliary::TwinShot]);
        let mut player = Player::new(ShipClass::Interceptor, &ledger);
        assert_eq!(player.shoot().len(), 2);

        ledger.purchase_or_toggle(Auxiliary::TwinShot);
        player.sync_loadout(ledger.auxiliaries);
        player.fire_cooldown = 0;
        assert_eq!(player.shoot().len(), 1);
    }

    #[test]
    fn test_sniper_ignores_twin_shot() {
        let ledger = ledger_with(&[Auxiliary::TwinShot]);
        let mut player = Player::new(ShipClass::Sniper, &ledger);
        let shots = player.shoot();
        assert_eq!(shots.len(), 1);
        assert_eq!(shots[0].shape, Shape::Lance);
        assert_eq!(shots[0].damage, 100.0);
    }

    #[test]
    fn test_dash_window_and_cooldown() {
        let mut player = Player::new(ShipClass::Interceptor, &Ledger::new());
        let dash = ActionState::with(&[Action::Dash]);
        player.advance(SIM_DT, &dash);
        assert!(player.dash.active);
        let idle = ActionState::new();
        for _ in 0..(DASH_DURATION_TICKS - 1) {
            assert!(player.dash.active);
            player.advance(SIM_DT, &idle);
        }
        assert!(!player.dash.active);
        // Still cooling down: pressing again does nothing
        player.advance(SIM_DT, &dash);
        assert!(!player.dash.active);
    }

    #[test]
    fn test_dash_triples_speed() {
        let mut player = Player::new(ShipClass::Interceptor, &Ledger::new());
        let start = player.pos.x;
        player.advance(SIM_DT, &ActionState::with(&[Action::MoveLeft, Action::Dash]));
        assert!((start - player.pos.x - 18.0).abs() < 0.01);
    }

    #[test]
    fn test_player_stays_in_field() {
        let mut player = Player::new(ShipClass::Speeder, &Ledger::new());
        let input = ActionState::with(&[Action::MoveRight, Action::MoveDown]);
        for _ in 0..200 {
            player.advance(SIM_DT, &input);
        }
        let hb = player.hitbox();
        assert!(hb.right() <= FIELD_WIDTH + 0.001);
        assert!(hb.bottom() <= FIELD_HEIGHT + 0.001);
    }

    #[test]
    fn test_shield_expires_by_time_only() {
        let mut player = Player::new(ShipClass::Interceptor, &Ledger::new());
        player.activate_shield();
        for _ in 0..50 {
            assert_eq!(player.receive_damage(30.0), DamageOutcome::Absorbed);
        }
        assert_eq!(player.shield.remaining, SHIELD_DURATION_TICKS);
        for _ in 0..SHIELD_DURATION_TICKS {
            player.advance(SIM_DT, &ActionState::new());
        }
        assert!(!player.shield.active);
    }

    #[test]
    fn test_special_charge_clamped() {
        let mut player = Player::new(ShipClass::Interceptor, &Ledger::new());
        player.add_special(70.0);
        assert!(!player.consume_special());
        player.add_special(70.0);
        assert_eq!(player.special_charge, MAX_SPECIAL_CHARGE);
        assert!(player.consume_special());
        assert_eq!(player.special_charge, 0.0);
    }

    #[test]
    fn test_fast_enemy_fires_on_interval() {
        let mut enemy = Enemy::new(1, EnemyKind::Fast, Vec2::new(100.0, 0.0), 3.0, 1.0);
        let mut shots = 0;
        for _ in 0..ENEMY_FIRE_INTERVAL {
            shots += enemy.advance(SIM_DT).into_iter().count();
        }
        assert_eq!(shots, 0);
        let shot = enemy.advance(SIM_DT).expect("timer lapsed");
        assert_eq!(shot.owner, Owner::Enemy);
        assert!(shot.vel.y > 0.0);
    }

    #[test]
    fn test_light_enemy_never_fires() {
        let mut enemy = Enemy::new(1, EnemyKind::Light, Vec2::new(100.0, 0.0), 3.0, 1.0);
        for _ in 0..1000 {
            assert!(enemy.advance(SIM_DT).is_none());
        }
    }

    #[test]
    fn test_spawned_enemy_above_field() {
        let mut rng = Pcg32::seed_from_u64(3);
        for id in 0..200 {
            let enemy = Enemy::spawn(id, &mut rng, 1.5);
            let hb = enemy.hitbox();
            assert!(hb.top() >= -100.0 && hb.top() <= -50.0);
            assert!(hb.left() >= 0.0 && hb.right() <= FIELD_WIDTH);
            assert_eq!(enemy.health, enemy.kind.base_health() * 1.5);
            assert_eq!(enemy.fire_timer.is_some(), enemy.kind.can_fire());
        }
    }

    #[test]
    fn test_homing_blends_not_snaps() {
        let mut missile = Projectile::new(
            Owner::Player,
            Vec2::new(400.0, 500.0),
            Vec2::new(0.0, per_tick(-5.0)),
            30.0,
            Shape::Missile,
        )
        .homing(Target::Boss);
        missile.advance(SIM_DT, Some(Vec2::new(600.0, 500.0)));
        // 10% of the way from (0,-300) toward (480,0)
        assert!((missile.vel.x - 48.0).abs() < 0.01);
        assert!((missile.vel.y + 270.0).abs() < 0.01);
    }

    #[test]
    fn test_homing_without_target_flies_straight() {
        let vel = Vec2::new(0.0, per_tick(-5.0));
        let mut missile = Projectile::new(Owner::Player, Vec2::new(400.0, 500.0), vel, 30.0, Shape::Missile)
            .homing(Target::Enemy(42));
        missile.advance(SIM_DT, None);
        assert_eq!(missile.vel, vel);
        assert!((missile.pos.y - 495.0).abs() < 0.01);
    }

    #[test]
    fn test_projectile_margin() {
        let mut bolt = Projectile::new(Owner::Player, Vec2::new(400.0, -40.0), Vec2::ZERO, 1.0, Shape::Bolt);
        assert!(!bolt.out_of_bounds());
        bolt.pos.y = -60.0;
        assert!(bolt.out_of_bounds());
    }

    #[test]
    fn test_projectile_margin_every_edge() {
        let half = Shape::Slug.size() * 0.5;
        let slug = |x: f32, y: f32| Projectile::new(Owner::Boss, Vec2::new(x, y), Vec2::ZERO, 1.0, Shape::Slug);
        let below = FIELD_HEIGHT + OUT_OF_BOUNDS_MARGIN + half.y;
        let left = -OUT_OF_BOUNDS_MARGIN - half.x;
        let right = FIELD_WIDTH + OUT_OF_BOUNDS_MARGIN + half.x;

        assert!(slug(400.0, below + 1.0).out_of_bounds());
        assert!(!slug(400.0, below - 1.0).out_of_bounds());
        assert!(slug(left - 1.0, 300.0).out_of_bounds());
        assert!(!slug(left + 1.0, 300.0).out_of_bounds());
        assert!(slug(right + 1.0, 300.0).out_of_bounds());
        assert!(!slug(right - 1.0, 300.0).out_of_bounds());
        // Off-screen but inside the margin
        assert!(!slug(-20.0, FIELD_HEIGHT + 20.0).out_of_bounds());
    }

    #[test]
    fn test_boss_enters_then_activates() {
        let mut boss = Boss::new();
        let mut now = 0;
        while !boss.entered() {
            now += 16;
            boss.advance(SIM_DT, now);
        }
        assert!(boss.hitbox().top() >= BOSS_ARENA_TOP);
        assert_eq!(boss.last_attack_ms, now);
    }

    #[test]
    fn test_boss_bounces_between_walls() {
        let mut boss = Boss::new();
        boss.stage = BossStage::Active;
        let mut flips = 0;
        let mut last_dir = boss.direction;
        for t in 0..2000u64 {
            boss.advance(SIM_DT, t * 16);
            if boss.direction != last_dir {
                flips += 1;
                last_dir = boss.direction;
            }
            let hb = boss.hitbox();
            assert!(hb.left() > 0.0 && hb.right() < FIELD_WIDTH);
            assert!(hb.top() >= BOSS_ARENA_TOP - 20.01 && hb.top() <= BOSS_ARENA_TOP + 20.01);
        }
        assert!(flips >= 2);
    }

    #[test]
    fn test_pickup_roll_distribution() {
        let mut rng = Pcg32::seed_from_u64(11);
        let health = (0..10_000)
            .filter(|_| PickupKind::roll(&mut rng) == PickupKind::Health)
            .count();
        assert!((6500..7500).contains(&health));
    }
}
