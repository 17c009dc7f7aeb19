//! Boss pattern engine
//!
//! Stage machine: `Entering` (fixed descent) -> `Active`. While active the
//! boss bounces horizontally, bobs vertically and, each time its attack
//! cooldown lapses, fires one pattern picked by phase-dependent weights.
//! Spiral angle and flower offset persist across invocations so successive
//! attacks keep rotating.

use glam::Vec2;
use rand::Rng;

use super::collision::Collider;
use super::entity::{Boss, Owner, Projectile, Shape};
use crate::{heading, per_tick, weighted_choice, wrap_degrees};

/// Straight down, in field degrees (0 = right, y grows downward)
const DOWN_DEG: f32 = 90.0;

const SHOTGUN_SPREAD_DEG: [f32; 5] = [-30.0, -15.0, 0.0, 15.0, 30.0];
const SHOTGUN_SPEED: f32 = 7.0;
const SHOTGUN_DAMAGE: f32 = 15.0;

pub const SPIRAL_STEP_DEG: f32 = 15.0;
const SPIRAL_SPEED: f32 = 6.0;
const SPIRAL_DAMAGE: f32 = 10.0;

pub const FLOWER_STEP_DEG: f32 = 10.0;
const FLOWER_SPEED: f32 = 5.0;
const FLOWER_DAMAGE: f32 = 12.0;

const AIMED_SPEED: f32 = 12.0;
const AIMED_DAMAGE: f32 = 25.0;

pub const PHASE_ONE_COOLDOWN_MS: u64 = 1000;
pub const PHASE_TWO_COOLDOWN_MS: u64 = 600;

/// The four emission shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pattern {
    Shotgun,
    Spiral,
    Flower,
    Aimed,
}

impl Pattern {
    const PHASE_ONE_WEIGHTS: [(Pattern, u32); 4] = [
        (Pattern::Shotgun, 40),
        (Pattern::Spiral, 30),
        (Pattern::Flower, 20),
        (Pattern::Aimed, 10),
    ];
    const PHASE_TWO_WEIGHTS: [(Pattern, u32); 4] = [
        (Pattern::Shotgun, 20),
        (Pattern::Spiral, 30),
        (Pattern::Flower, 30),
        (Pattern::Aimed, 20),
    ];

    /// Selection weights for a phase
    pub fn weights(phase: u8) -> &'static [(Pattern, u32)] {
        if phase >= 2 {
            &Self::PHASE_TWO_WEIGHTS
        } else {
            &Self::PHASE_ONE_WEIGHTS
        }
    }

    pub fn choose<R: Rng + ?Sized>(rng: &mut R, phase: u8) -> Pattern {
        weighted_choice(rng, Self::weights(phase)).unwrap_or(Pattern::Shotgun)
    }
}

/// Milliseconds between attacks in a phase
pub fn attack_cooldown_ms(phase: u8) -> u64 {
    if phase >= 2 {
        PHASE_TWO_COOLDOWN_MS
    } else {
        PHASE_ONE_COOLDOWN_MS
    }
}

/// Output of one engine step
#[derive(Debug, Clone, Default)]
pub struct BossUpdate {
    pub projectiles: Vec<Projectile>,
    /// Pattern fired this tick, if the cooldown lapsed
    pub pattern: Option<Pattern>,
}

/// Advance the boss one tick. `player_pos` is `None` when there is nothing to
/// aim at (player dead or dying).
pub fn update<R: Rng + ?Sized>(
    boss: &mut Boss,
    dt: f32,
    now_ms: u64,
    player_pos: Option<Vec2>,
    rng: &mut R,
) -> BossUpdate {
    if !boss.entered() {
        boss.advance(dt, now_ms);
        return BossUpdate::default();
    }

    boss.refresh_phase();
    boss.advance(dt, now_ms);

    if now_ms.saturating_sub(boss.last_attack_ms) <= attack_cooldown_ms(boss.phase) {
        return BossUpdate::default();
    }
    boss.last_attack_ms = now_ms;

    let pattern = Pattern::choose(rng, boss.phase);
    let projectiles = boss.fire_pattern(pattern, player_pos);
    log::debug!(
        "Boss phase {} fired {:?} ({} projectiles)",
        boss.phase,
        pattern,
        projectiles.len()
    );
    BossUpdate {
        projectiles,
        pattern: Some(pattern),
    }
}

impl Boss {
    fn shot(&self, origin: Vec2, degrees: f32, speed: f32, damage: f32, shape: Shape) -> Projectile {
        Projectile::new(Owner::Boss, origin, heading(degrees, per_tick(speed)), damage, shape)
    }

    /// Emit one pattern, updating rotation state where the pattern has any
    pub fn fire_pattern(&mut self, pattern: Pattern, target: Option<Vec2>) -> Vec<Projectile> {
        match pattern {
            Pattern::Shotgun => self.shotgun(),
            Pattern::Spiral => self.spiral(),
            Pattern::Flower => self.flower(),
            Pattern::Aimed => self.aimed(target),
        }
    }

    /// Five-way fan around straight down, fired from the bottom edge
    pub fn shotgun(&self) -> Vec<Projectile> {
        let origin = Vec2::new(self.pos.x, self.hitbox().bottom());
        SHOTGUN_SPREAD_DEG
            .iter()
            .map(|&offset| self.shot(origin, DOWN_DEG + offset, SHOTGUN_SPEED, SHOTGUN_DAMAGE, Shape::Slug))
            .collect()
    }

    /// One arm (two mirrored arms in phase 2); the angle keeps turning
    pub fn spiral(&mut self) -> Vec<Projectile> {
        let arms = if self.phase >= 2 { 2 } else { 1 };
        let shots = (0..arms)
            .map(|arm| {
                let angle = self.spiral_angle + arm as f32 * 180.0;
                self.shot(self.pos, angle, SPIRAL_SPEED, SPIRAL_DAMAGE, Shape::Orb)
            })
            .collect();
        self.spiral_angle = wrap_degrees(self.spiral_angle + SPIRAL_STEP_DEG);
        shots
    }

    /// Full ring of petals; the ring's offset keeps turning
    pub fn flower(&mut self) -> Vec<Projectile> {
        let count: u32 = if self.phase >= 2 { 24 } else { 12 };
        let spacing = 360.0 / count as f32;
        let shots = (0..count)
            .map(|i| {
                let angle = spacing * i as f32 + self.flower_offset;
                self.shot(self.pos, angle, FLOWER_SPEED, FLOWER_DAMAGE, Shape::Petal)
            })
            .collect();
        self.flower_offset = wrap_degrees(self.flower_offset + FLOWER_STEP_DEG);
        shots
    }

    /// One fast shot at the target, or the shotgun when there is no target
    pub fn aimed(&self, target: Option<Vec2>) -> Vec<Projectile> {
        let Some(target) = target else {
            return self.shotgun();
        };
        let delta = target - self.pos;
        let angle = delta.y.atan2(delta.x).to_degrees();
        vec![self.shot(self.pos, angle, AIMED_SPEED, AIMED_DAMAGE, Shape::Spike)]
    }
}
