//! Combat resolution
//!
//! One pass per tick, always in this order:
//! 1. player projectiles vs enemies
//! 2. player projectiles vs boss
//! 3. hostile projectiles vs player
//! 4. player vs enemy bodies
//! 5. player vs boss body
//! 6. player vs pickups
//!
//! Consumed projectiles and destroyed enemies are flagged in place so nothing
//! interacts twice; flagged entities are dropped when the pass ends. Player
//! damage from steps 3-5 is summed and applied once through the
//! dash/shield/hull branch.

use glam::Vec2;
use rand::Rng;

use super::collision::Collider;
use super::entity::{
    Boss, DamageOutcome, Enemy, HEALTH_PICKUP_AMOUNT, Owner, Pickup, PickupKind, Player,
    Projectile,
};
use super::events::GameEvent;
use crate::economy::Ledger;

pub const CRIT_CHANCE: f64 = 0.15;
pub const CRIT_MULTIPLIER: f32 = 2.0;
pub const JACKPOT_CHANCE: f64 = 0.05;
pub const PICKUP_DROP_CHANCE: f64 = 0.15;

/// Special-charge granted per enemy kill
pub const KILL_SPECIAL_CHARGE: f32 = 5.0;
/// Special-charge granted for the boss
pub const BOSS_SPECIAL_CHARGE: f32 = 50.0;
pub const BOSS_SCORE_BONUS: u64 = 5000;
pub const BOSS_CURRENCY_BONUS: u64 = 1000;

/// Damage per source type, counted at most once per tick each
pub const HOSTILE_PROJECTILE_DAMAGE: f32 = 20.0;
pub const ENEMY_CONTACT_DAMAGE: f32 = 30.0;
pub const BOSS_CONTACT_DAMAGE: f32 = 5.0;

/// Mutable views of everything that can collide, borrowed for one pass
pub struct Combatants<'a> {
    pub player: &'a mut Player,
    pub enemies: &'a mut Vec<Enemy>,
    pub boss: &'a mut Option<Boss>,
    pub projectiles: &'a mut Vec<Projectile>,
    pub pickups: &'a mut Vec<Pickup>,
    pub ledger: &'a mut Ledger,
}

/// What the pass did, for the orchestrator's bookkeeping
#[derive(Debug, Clone, Default)]
pub struct CombatReport {
    pub kills: u32,
    /// Boss position when it died this pass
    pub boss_killed: Option<Vec2>,
    pub player_damage: f32,
    pub player_outcome: Option<DamageOutcome>,
    /// Health crossed zero this pass
    pub player_died: bool,
    pub events: Vec<GameEvent>,
}

/// Roll the crit for one hit
fn roll_hit<R: Rng + ?Sized>(rng: &mut R, base: f32) -> (f32, bool) {
    if rng.random_bool(CRIT_CHANCE) {
        (base * CRIT_MULTIPLIER, true)
    } else {
        (base, false)
    }
}

/// Run the full six-step pass
pub fn resolve<R: Rng + ?Sized>(mut c: Combatants<'_>, rng: &mut R) -> CombatReport {
    let mut report = CombatReport::default();

    player_shots_vs_enemies(&mut c, rng, &mut report);
    player_shots_vs_boss(&mut c, rng, &mut report);

    let mut incoming = 0.0;
    if c.player.alive {
        incoming += hostile_shots_vs_player(&mut c);
        incoming += enemy_contact(&mut c);
        incoming += boss_contact(&c);
        collect_pickups(&mut c, &mut report);
    }

    if incoming > 0.0 {
        let was_alive = c.player.health > 0.0;
        let outcome = c.player.receive_damage(incoming);
        report.player_damage = incoming;
        report.player_outcome = Some(outcome);
        report.events.push(GameEvent::PlayerHit {
            outcome,
            damage: incoming,
        });
        if outcome == DamageOutcome::Hull && was_alive && c.player.health <= 0.0 {
            report.player_died = true;
        }
    }

    c.projectiles.retain(Projectile::is_live);
    c.enemies.retain(|e| !e.destroyed);
    report
}

fn player_shots_vs_enemies<R: Rng + ?Sized>(c: &mut Combatants<'_>, rng: &mut R, report: &mut CombatReport) {
    for enemy in c.enemies.iter_mut() {
        if !enemy.is_live() {
            continue;
        }
        let mut was_hit = false;
        for shot in c
            .projectiles
            .iter_mut()
            .filter(|p| p.is_live() && p.owner == Owner::Player)
        {
            if !shot.touches(&*enemy) {
                continue;
            }
            shot.consumed = true;
            was_hit = true;
            let (damage, crit) = roll_hit(rng, shot.damage);
            if crit {
                report.events.push(GameEvent::Crit { pos: enemy.pos });
            }
            enemy.health -= damage;
        }

        if was_hit && enemy.health <= 0.0 {
            enemy.destroyed = true;
            report.kills += 1;

            c.ledger.register_kill();
            let jackpot = rng.random_bool(JACKPOT_CHANCE);
            let reward = c
                .ledger
                .reward_kill(enemy.currency_value(), enemy.score_value(), jackpot);
            c.player.add_special(KILL_SPECIAL_CHARGE);
            report.events.push(GameEvent::EnemyKilled {
                kind: enemy.kind,
                pos: enemy.pos,
                currency: reward.currency,
                jackpot: reward.jackpot,
                combo: c.ledger.combo,
            });

            if rng.random_bool(PICKUP_DROP_CHANCE) {
                c.pickups.push(Pickup::new(PickupKind::roll(rng), enemy.pos));
            }
        }
    }
}

fn player_shots_vs_boss<R: Rng + ?Sized>(c: &mut Combatants<'_>, rng: &mut R, report: &mut CombatReport) {
    let Some(boss) = c.boss.as_mut() else {
        return;
    };
    for shot in c
        .projectiles
        .iter_mut()
        .filter(|p| p.is_live() && p.owner == Owner::Player)
    {
        if !shot.touches(&*boss) {
            continue;
        }
        shot.consumed = true;
        let (damage, crit) = roll_hit(rng, shot.damage);
        if crit {
            report.events.push(GameEvent::Crit { pos: boss.pos });
        }
        boss.take_damage(damage);
        report.events.push(GameEvent::BossHit { damage });
    }

    // Also catches damage dealt outside this pass (special release)
    if boss.is_dead() {
        let pos = boss.pos;
        *c.boss = None;
        c.ledger.add_score(BOSS_SCORE_BONUS);
        c.ledger.credit(BOSS_CURRENCY_BONUS);
        c.player.add_special(BOSS_SPECIAL_CHARGE);
        report.boss_killed = Some(pos);
        report.events.push(GameEvent::BossKilled { pos });
    }
}

fn hostile_shots_vs_player(c: &mut Combatants<'_>) -> f32 {
    let mut hit = false;
    for shot in c
        .projectiles
        .iter_mut()
        .filter(|p| p.is_live() && p.is_hostile())
    {
        if shot.touches(&*c.player) {
            shot.consumed = true;
            hit = true;
        }
    }
    if hit { HOSTILE_PROJECTILE_DAMAGE } else { 0.0 }
}

fn enemy_contact(c: &mut Combatants<'_>) -> f32 {
    let mut hit = false;
    for enemy in c.enemies.iter_mut().filter(|e| e.is_live()) {
        if enemy.touches(&*c.player) {
            enemy.destroyed = true;
            hit = true;
        }
    }
    if hit { ENEMY_CONTACT_DAMAGE } else { 0.0 }
}

fn boss_contact(c: &Combatants<'_>) -> f32 {
    match c.boss.as_ref() {
        Some(boss) if boss.touches(&*c.player) => BOSS_CONTACT_DAMAGE,
        _ => 0.0,
    }
}

fn collect_pickups(c: &mut Combatants<'_>, report: &mut CombatReport) {
    let player = &mut *c.player;
    c.pickups.retain(|pickup| {
        if !pickup.touches(&*player) {
            return true;
        }
        match pickup.kind {
            PickupKind::Health => player.heal(HEALTH_PICKUP_AMOUNT),
            PickupKind::Shield => player.activate_shield(),
        }
        report.events.push(GameEvent::PickupCollected {
            kind: pickup.kind,
            pos: pickup.pos,
        });
        false
    });
}
