//! Fixed timestep simulation tick
//!
//! Core game loop that advances the world deterministically. Ordering per
//! tick: clear one-tick signals, global timers, player, spawning, movement,
//! combat, boss engine, achievements, autosave countdown.

use rand::Rng;

use super::boss;
use super::combat::{self, Combatants};
use super::entity::{Boss, DASH_COOLDOWN_TICKS, Enemy};
use super::events::GameEvent;
use super::state::{RunPhase, World, target_position};
use crate::consts::*;
use crate::platform::input::{Action, ActionState};

/// Base number of enemies allowed on the field at difficulty 0
pub const ENEMY_CAP_BASE: usize = 8;
/// One in this many ticks spawns an enemy when under the cap
pub const ENEMY_SPAWN_ODDS: u32 = 51;

pub const SPECIAL_ENEMY_DAMAGE: f32 = 100.0;
pub const SPECIAL_BOSS_DAMAGE: f32 = 200.0;
pub const SPECIAL_SHAKE_TICKS: u32 = 30;
pub const BOSS_KILL_SHAKE_TICKS: u32 = 30;
pub const EMP_START_RADIUS: f32 = 50.0;
pub const EMP_GROWTH: f32 = 25.0;
/// Ring disappears once it is wider than the field's diagonal
pub const EMP_MAX_RADIUS: f32 = 960.0;
pub const DIFFICULTY_PER_BOSS: f32 = 0.5;

/// Advance the world by one fixed timestep
pub fn tick(world: &mut World, input: &ActionState, dt: f32) {
    world.tick_events.clear();
    world.events.clear();

    match world.phase {
        RunPhase::Paused | RunPhase::GameOver => return,
        _ => {}
    }

    world.time_ticks += 1;
    let boss_phase = world.boss.as_ref().map(|b| b.phase);

    update_timers(world);
    update_player(world, input, dt);
    if world.is_playing() {
        spawn(world);
    }
    advance_entities(world, dt);
    if world.is_playing() {
        run_combat(world);
    }
    run_boss(world, dt, boss_phase);
    update_achievements(world);
    count_down_autosave(world);
}

fn update_timers(world: &mut World) {
    let combo = world.ledger.combo;
    if world.ledger.decay_combo() {
        world.events.push(GameEvent::ComboBroken { combo });
    }

    world.shake_ticks = world.shake_ticks.saturating_sub(1);

    if let Some(radius) = world.emp_radius {
        let grown = radius + EMP_GROWTH;
        world.emp_radius = (grown <= EMP_MAX_RADIUS).then_some(grown);
    }

    if let RunPhase::Dying { ticks_left } = world.phase {
        let ticks_left = ticks_left.saturating_sub(1);
        world.phase = if ticks_left == 0 {
            log::info!(
                "Game over at tick {}: score {}, {} kills",
                world.time_ticks,
                world.ledger.score,
                world.kill_counter
            );
            world.autosave_due = true;
            world.events.push(GameEvent::GameOver);
            RunPhase::GameOver
        } else {
            RunPhase::Dying { ticks_left }
        };
    }
}

fn update_player(world: &mut World, input: &ActionState, dt: f32) {
    if !world.player.alive {
        world.player.advance(dt, input);
        return;
    }

    let dash_ready = world.player.dash.cooldown == 0;
    let shots = world.player.advance(dt, input);
    if dash_ready && world.player.dash.cooldown == DASH_COOLDOWN_TICKS - 1 {
        world.events.push(GameEvent::Dash);
    }
    if input.pressed(Action::Shoot) {
        world.tick_events.shot_fired = true;
        world.last_shot_tick = world.time_ticks;
    }
    world.projectiles.extend(shots);

    if input.pressed(Action::Special) && world.player.consume_special() {
        release_special(world);
    }

    if world.player.has_drone() || world.player.has_missiles() {
        if let Some((target, pos)) = world.closest_hostile(world.player.pos) {
            let drone = world.player.fire_drone(pos);
            let missile = world.player.fire_missile(target);
            world.projectiles.extend(drone.into_iter().chain(missile));
        }
    }
}

/// Screen-clearing special: hostile fire wiped, every enemy and the boss hit
fn release_special(world: &mut World) {
    world.projectiles.retain(|p| !p.is_hostile());

    let mut kills = 0;
    for enemy in world.enemies.iter_mut().filter(|e| e.is_live()) {
        enemy.health -= SPECIAL_ENEMY_DAMAGE;
        if enemy.health <= 0.0 {
            enemy.destroyed = true;
            kills += 1;
            world.ledger.add_score(enemy.score_value());
            world.events.push(GameEvent::EnemyKilled {
                kind: enemy.kind,
                pos: enemy.pos,
                currency: 0,
                jackpot: false,
                combo: world.ledger.combo,
            });
        }
    }
    world.enemies.retain(|e| !e.destroyed);
    world.kill_counter += kills as u64;

    // A boss killed here is paid out by the next combat pass
    if let Some(boss) = world.boss.as_mut() {
        boss.take_damage(SPECIAL_BOSS_DAMAGE);
    }

    world.shake_ticks = world.shake_ticks.max(SPECIAL_SHAKE_TICKS);
    world.emp_radius = Some(EMP_START_RADIUS);
    world.tick_events.special_kills = Some(kills);
    world.events.push(GameEvent::SpecialReleased { kills });
    log::debug!("Special released at tick {}: {} kills", world.time_ticks, kills);
}

fn spawn(world: &mut World) {
    if world.boss.is_some() {
        return;
    }

    if world.ledger.score >= world.next_boss_score {
        world.enemies.clear();
        world.boss = Some(Boss::new());
        world.events.push(GameEvent::BossSpawned);
        log::info!(
            "Boss spawned at score {} (difficulty {:.1})",
            world.ledger.score,
            world.difficulty
        );
        return;
    }

    let cap = ENEMY_CAP_BASE + world.difficulty.floor() as usize;
    if world.enemies.len() < cap && world.rng.random_range(0..ENEMY_SPAWN_ODDS) == 0 {
        let id = world.next_entity_id();
        let enemy = Enemy::spawn(id, &mut world.rng, world.difficulty);
        world.enemies.push(enemy);
    }
}

fn advance_entities(world: &mut World, dt: f32) {
    for enemy in world.enemies.iter_mut() {
        if let Some(shot) = enemy.advance(dt) {
            world.events.push(GameEvent::EnemyFired { pos: shot.pos });
            world.projectiles.push(shot);
        }
    }
    world.enemies.retain(|e| !e.escaped());

    for projectile in world.projectiles.iter_mut() {
        let target = projectile
            .homing
            .and_then(|t| target_position(&world.enemies, world.boss.as_ref(), t));
        projectile.advance(dt, target);
    }
    world.projectiles.retain(|p| !p.out_of_bounds());

    for pickup in world.pickups.iter_mut() {
        pickup.advance(dt);
    }
    world.pickups.retain(|p| !p.escaped());
}

fn run_combat(world: &mut World) {
    let report = combat::resolve(
        Combatants {
            player: &mut world.player,
            enemies: &mut world.enemies,
            boss: &mut world.boss,
            projectiles: &mut world.projectiles,
            pickups: &mut world.pickups,
            ledger: &mut world.ledger,
        },
        &mut world.rng,
    );

    world.kill_counter += report.kills as u64;
    world.events.extend(report.events);

    if report.boss_killed.is_some() {
        world.difficulty += DIFFICULTY_PER_BOSS;
        world.next_boss_score = world.ledger.score + BOSS_SCORE_STEP;
        world.tick_events.boss_just_killed = true;
        world.shake_ticks = world.shake_ticks.max(BOSS_KILL_SHAKE_TICKS);
        log::info!(
            "Boss destroyed at tick {}: difficulty now {:.1}, next boss at {}",
            world.time_ticks,
            world.difficulty,
            world.next_boss_score
        );
    }

    if report.player_died {
        world.player.alive = false;
        world.phase = RunPhase::Dying {
            ticks_left: DYING_TICKS,
        };
        world.events.push(GameEvent::PlayerDied { pos: world.player.pos });
        log::info!("Player destroyed at tick {}", world.time_ticks);
    }
}

fn run_boss(world: &mut World, dt: f32, phase_at_start: Option<u8>) {
    let now_ms = world.now_ms();
    let player_pos = world.player.alive.then_some(world.player.pos);
    let Some(boss) = world.boss.as_mut() else {
        return;
    };

    let update = boss::update(boss, dt, now_ms, player_pos, &mut world.rng);
    if phase_at_start == Some(1) && boss.phase == 2 {
        world.events.push(GameEvent::BossEnraged);
    }
    if update.pattern.is_some() {
        world.events.push(GameEvent::BossAttack {
            projectiles: update.projectiles.len(),
        });
        world.projectiles.extend(update.projectiles);
    }
}

fn update_achievements(world: &mut World) {
    let snapshot = world.snapshot();
    let unlocked = world.achievements.evaluate(&snapshot, world.time_ticks);
    world
        .events
        .extend(unlocked.into_iter().map(|id| GameEvent::AchievementUnlocked { id }));
    world.achievements.advance_notifications();
}

fn count_down_autosave(world: &mut World) {
    world.autosave_ticks += 1;
    if world.autosave_ticks >= AUTOSAVE_INTERVAL_TICKS {
        world.autosave_ticks = 0;
        world.autosave_due = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::{Auxiliary, Ledger};
    use crate::sim::entity::{BossStage, EnemyKind, Owner, Projectile, Shape, ShipClass, Target};
    use glam::Vec2;

    fn world() -> World {
        World::new(42, ShipClass::Interceptor, Ledger::new())
    }

    /// World whose ship outlives any amount of stray fire
    fn sturdy_world() -> World {
        let mut w = world();
        w.player.max_health = 1.0e9;
        w.player.health = 1.0e9;
        w
    }

    fn idle() -> ActionState {
        ActionState::new()
    }

    fn active_boss_at(pos: Vec2) -> Boss {
        let mut boss = Boss::new();
        boss.stage = BossStage::Active;
        boss.pos = pos;
        boss
    }

    fn hostile_at(pos: Vec2) -> Projectile {
        Projectile::new(Owner::Enemy, pos, Vec2::ZERO, 10.0, Shape::Bolt)
    }

    #[test]
    fn test_paused_world_does_not_advance() {
        let mut w = world();
        w.set_paused(true);
        tick(&mut w, &idle(), SIM_DT);
        assert_eq!(w.time_ticks, 0);
        w.set_paused(false);
        tick(&mut w, &idle(), SIM_DT);
        assert_eq!(w.time_ticks, 1);
    }

    #[test]
    fn test_same_seed_same_inputs_same_world() {
        let script = |t: u64| {
            let mut input = ActionState::with(&[Action::Shoot]);
            input.set(if (t / 90) % 2 == 0 { Action::MoveLeft } else { Action::MoveRight }, true);
            input.set(Action::Dash, t % 200 == 0);
            input
        };
        let run = || {
            let mut w = world();
            for t in 0..3000 {
                tick(&mut w, &script(t), SIM_DT);
            }
            w
        };
        let (a, b) = (run(), run());
        assert_eq!(a.time_ticks, b.time_ticks);
        assert_eq!(a.ledger, b.ledger);
        assert_eq!(a.kill_counter, b.kill_counter);
        assert_eq!(a.player.pos, b.player.pos);
        assert_eq!(a.player.health, b.player.health);
        assert_eq!(a.enemies.len(), b.enemies.len());
        for (x, y) in a.enemies.iter().zip(&b.enemies) {
            assert_eq!((x.id, x.pos, x.health), (y.id, y.pos, y.health));
        }
        assert_eq!(a.projectiles.len(), b.projectiles.len());
        assert_eq!(a.phase, b.phase);
    }

    #[test]
    fn test_combo_breaks_after_window() {
        let mut w = world();
        w.ledger.register_kill();
        for _ in 0..COMBO_WINDOW_TICKS {
            tick(&mut w, &idle(), SIM_DT);
        }
        assert_eq!(w.ledger.combo, 1);
        tick(&mut w, &idle(), SIM_DT);
        assert_eq!(w.ledger.combo, 0);
        assert!(w.events.contains(&GameEvent::ComboBroken { combo: 1 }));
        // Multiplier back to 1.0
        assert_eq!(w.ledger.reward_kill(5, 10, false).currency, 5);
    }

    #[test]
    fn test_boss_spawn_clears_enemies() {
        let mut w = world();
        for _ in 0..5 {
            let id = w.next_entity_id();
            w.enemies.push(Enemy::new(id, EnemyKind::Light, Vec2::new(100.0, 100.0), 1.0, 1.0));
        }
        w.ledger.score = 2000;
        tick(&mut w, &idle(), SIM_DT);
        assert!(w.boss.is_some());
        assert!(w.enemies.is_empty());
        assert!(w.events.contains(&GameEvent::BossSpawned));

        // No regular spawns while the boss lives
        for _ in 0..600 {
            tick(&mut w, &idle(), SIM_DT);
        }
        assert!(w.enemies.is_empty());
    }

    #[test]
    fn test_near_death_boss_kill() {
        let mut w = world();
        w.player.health = 10.0;
        let mut boss = active_boss_at(Vec2::new(400.0, 200.0));
        boss.health = 1.0;
        boss.last_attack_ms = u64::MAX / 2;
        w.boss = Some(boss);
        w.projectiles.push(Projectile::new(
            Owner::Player,
            Vec2::new(400.0, 200.0),
            Vec2::ZERO,
            50.0,
            Shape::Bolt,
        ));

        tick(&mut w, &idle(), SIM_DT);
        assert!(w.boss.is_none());
        assert!(w.tick_events.boss_just_killed);
        assert!(w.achievements.is_unlocked("near_death"));
        assert_eq!(w.ledger.score, 5000);
        assert_eq!(w.ledger.currency, 1000);
        assert_eq!(w.difficulty, 1.5);
        assert_eq!(w.next_boss_score, 7000);
        assert_eq!(w.player.special_charge, 50.0);

        tick(&mut w, &idle(), SIM_DT);
        assert!(!w.tick_events.boss_just_killed);
        assert!(w.achievements.is_unlocked("near_death"));
    }

    #[test]
    fn test_healthy_boss_kill_is_not_near_death() {
        let mut w = world();
        let mut boss = active_boss_at(Vec2::new(400.0, 200.0));
        boss.health = 1.0;
        w.boss = Some(boss);
        w.projectiles.push(Projectile::new(
            Owner::Player,
            Vec2::new(400.0, 200.0),
            Vec2::ZERO,
            50.0,
            Shape::Bolt,
        ));
        tick(&mut w, &idle(), SIM_DT);
        assert!(w.tick_events.boss_just_killed);
        assert!(!w.achievements.is_unlocked("near_death"));
    }

    #[test]
    fn test_death_then_game_over() {
        let mut w = world();
        w.player.health = 5.0;
        let pos = w.player.pos;
        w.projectiles.push(hostile_at(pos));
        w.projectiles.push(hostile_at(pos + Vec2::new(5.0, 0.0)));

        tick(&mut w, &idle(), SIM_DT);
        // Two touching projectiles count as one 20-damage source
        assert_eq!(w.player.health, -15.0);
        assert!(!w.player.alive);
        assert_eq!(w.phase, RunPhase::Dying { ticks_left: DYING_TICKS });
        assert_eq!(
            w.events.iter().filter(|e| matches!(e, GameEvent::PlayerDied { .. })).count(),
            1
        );

        // More hostile fire while dying changes nothing
        w.projectiles.push(hostile_at(pos));
        for _ in 0..DYING_TICKS - 1 {
            tick(&mut w, &idle(), SIM_DT);
            assert!(!w.events.iter().any(|e| matches!(e, GameEvent::PlayerDied { .. })));
        }
        assert_eq!(w.player.health, -15.0);
        assert_eq!(w.phase, RunPhase::Dying { ticks_left: 1 });
        w.autosave_due = false;

        tick(&mut w, &idle(), SIM_DT);
        assert!(w.is_over());
        assert!(w.autosave_due);
        assert!(w.events.contains(&GameEvent::GameOver));

        let frozen = w.time_ticks;
        tick(&mut w, &idle(), SIM_DT);
        assert_eq!(w.time_ticks, frozen);
    }

    #[test]
    fn test_dash_nullifies_every_source() {
        let mut w = world();
        let pos = w.player.pos;
        w.player.health = 1.0;
        w.projectiles.push(hostile_at(pos));
        let id = w.next_entity_id();
        w.enemies.push(Enemy::new(id, EnemyKind::Heavy, pos, 0.0, 1.0));

        tick(&mut w, &ActionState::with(&[Action::Dash]), SIM_DT);
        assert_eq!(w.player.health, 1.0);
        assert!(w.player.alive);
        assert!(w.events.contains(&GameEvent::Dash));
    }

    #[test]
    fn test_shield_absorbs_without_shortening() {
        let mut w = world();
        w.player.activate_shield();
        let pos = w.player.pos;
        w.projectiles.push(hostile_at(pos));
        tick(&mut w, &idle(), SIM_DT);
        assert_eq!(w.player.health, w.player.max_health);
        // Only the one tick of time has passed
        assert_eq!(w.player.shield.remaining, w.player.shield.max - 1);
    }

    #[test]
    fn test_special_release() {
        let mut w = world();
        w.player.special_charge = MAX_SPECIAL_CHARGE;
        for i in 0..6 {
            let id = w.next_entity_id();
            w.enemies.push(Enemy::new(id, EnemyKind::Light, Vec2::new(60.0 + 100.0 * i as f32, 100.0), 0.0, 1.0));
        }
        let heavy = w.next_entity_id();
        w.enemies.push(Enemy::new(heavy, EnemyKind::Heavy, Vec2::new(700.0, 300.0), 0.0, 2.0));
        w.projectiles.push(hostile_at(Vec2::new(200.0, 300.0)));
        let mut boss = active_boss_at(Vec2::new(400.0, 150.0));
        boss.last_attack_ms = u64::MAX / 2;
        w.boss = Some(boss);

        tick(&mut w, &ActionState::with(&[Action::Special]), SIM_DT);

        assert_eq!(w.player.special_charge, 0.0);
        assert_eq!(w.tick_events.special_kills, Some(6));
        assert_eq!(w.kill_counter, 6);
        assert_eq!(w.ledger.score, 60);
        assert_eq!(w.ledger.currency, 0);
        assert_eq!(w.enemies.len(), 1);
        assert!(w.projectiles.iter().all(|p| !p.is_hostile()));
        assert_eq!(w.boss.as_ref().map(|b| b.health), Some(2800.0));
        assert_eq!(w.emp_radius, Some(EMP_START_RADIUS));
        assert!(w.achievements.is_unlocked("ulti_master"));

        tick(&mut w, &idle(), SIM_DT);
        assert_eq!(w.tick_events.special_kills, None);
        assert_eq!(w.emp_radius, Some(EMP_START_RADIUS + EMP_GROWTH));
    }

    #[test]
    fn test_special_needs_full_charge() {
        let mut w = world();
        w.player.special_charge = 99.0;
        let id = w.next_entity_id();
        w.enemies.push(Enemy::new(id, EnemyKind::Light, Vec2::new(100.0, 100.0), 0.0, 1.0));
        tick(&mut w, &ActionState::with(&[Action::Special]), SIM_DT);
        assert_eq!(w.enemies.len(), 1);
        assert_eq!(w.player.special_charge, 99.0);
    }

    #[test]
    fn test_emp_ring_expires() {
        let mut w = world();
        w.emp_radius = Some(EMP_START_RADIUS);
        let mut ticks = 0;
        while w.emp_radius.is_some() {
            tick(&mut w, &idle(), SIM_DT);
            ticks += 1;
        }
        // 50 + 25 * 36 = 950 is the last size drawn
        assert_eq!(ticks, 37);
    }

    #[test]
    fn test_missile_homes_on_closest_enemy() {
        let mut ledger = Ledger::new();
        ledger.credit(1500);
        ledger.purchase_or_toggle(Auxiliary::HomingMissile);
        let mut w = World::new(3, ShipClass::Interceptor, ledger);
        let id = w.next_entity_id();
        w.enemies.push(Enemy::new(id, EnemyKind::Heavy, Vec2::new(100.0, 100.0), 0.0, 1.0));

        tick(&mut w, &idle(), SIM_DT);
        let missile = w
            .projectiles
            .iter()
            .find(|p| p.shape == Shape::Missile)
            .expect("missile launched");
        assert_eq!(missile.homing, Some(Target::Enemy(id)));
    }

    #[test]
    fn test_pacifist_after_a_minute_without_shooting() {
        let mut w = sturdy_world();
        for _ in 0..3599 {
            tick(&mut w, &idle(), SIM_DT);
        }
        assert!(!w.achievements.is_unlocked("pacifist"));
        tick(&mut w, &idle(), SIM_DT);
        assert!(w.achievements.is_unlocked("pacifist"));
    }

    #[test]
    fn test_enemy_cap_grows_with_difficulty() {
        let mut w = world();
        w.difficulty = 3.7;
        for _ in 0..20_000 {
            spawn(&mut w);
        }
        assert_eq!(w.enemies.len(), ENEMY_CAP_BASE + 3);

        let mut w = world();
        for _ in 0..20_000 {
            spawn(&mut w);
        }
        assert_eq!(w.enemies.len(), ENEMY_CAP_BASE + 1);
    }

    #[test]
    fn test_autosave_interval() {
        let mut w = sturdy_world();
        for _ in 0..AUTOSAVE_INTERVAL_TICKS - 1 {
            tick(&mut w, &idle(), SIM_DT);
        }
        assert!(!w.autosave_due);
        tick(&mut w, &idle(), SIM_DT);
        assert!(w.autosave_due);
    }
}
