//! Idle/demo mode: a deterministic pilot that plays the game
//!
//! Reads the world and produces the same kind of [`ActionState`] a player
//! would. No randomness: identical worlds give identical inputs.

use glam::Vec2;

use super::collision::Collider;
use super::entity::PLAYER_SIZE;
use super::state::World;
use crate::consts::{FIELD_HEIGHT, FIELD_WIDTH};
use crate::platform::input::{Action, ActionState};

/// Hostile shots closer than this (vertically, above the ship) are dodged
const DANGER_HEIGHT: f32 = 120.0;
/// Horizontal half-width of the lane considered dangerous
const DANGER_LANE: f32 = 45.0;
/// Dead zone around the tracking target
const TRACK_SLACK: f32 = 6.0;
/// Preferred distance between the ship and the bottom edge
const HOME_GAP: f32 = 40.0;
/// Release the special when at least this many enemies are on screen
const SPECIAL_CROWD: usize = 5;

/// Choose this tick's input for the demo pilot
pub fn drive(world: &World) -> ActionState {
    let mut input = ActionState::new();
    if !world.is_playing() || !world.player.alive {
        return input;
    }
    let ship = world.player.pos;

    // Most urgent threat: nearest hostile shot falling toward our lane
    let threat = world
        .projectiles
        .iter()
        .filter(|p| p.is_hostile())
        .filter(|p| {
            let above = ship.y - p.pos.y;
            (0.0..DANGER_HEIGHT).contains(&above) && (p.pos.x - ship.x).abs() < DANGER_LANE
        })
        .min_by(|a, b| ship.distance_squared(a.pos).total_cmp(&ship.distance_squared(b.pos)));

    let body_threat = world
        .enemies
        .iter()
        .any(|e| e.hitbox().bottom() > ship.y - PLAYER_SIZE.y * 2.0 && (e.pos.x - ship.x).abs() < DANGER_LANE);

    if let Some(shot) = threat {
        // Sidestep away from the shot, toward open field if we are near a wall
        let go_left = if ship.x < PLAYER_SIZE.x * 2.0 {
            false
        } else if ship.x > FIELD_WIDTH - PLAYER_SIZE.x * 2.0 {
            true
        } else {
            shot.pos.x >= ship.x
        };
        input.set(if go_left { Action::MoveLeft } else { Action::MoveRight }, true);
        if ship.y - shot.pos.y < DANGER_HEIGHT * 0.5 {
            input.set(Action::Dash, true);
        }
    } else if let Some((_, target)) = world.closest_hostile(ship) {
        steer_toward(&mut input, ship, target.x);
        if body_threat {
            input.set(Action::Dash, true);
        }
    } else {
        // Idle sway so the pilot does not sit still
        let sway = (world.time_ticks as f32 * 0.01).sin() * FIELD_WIDTH * 0.3;
        steer_toward(&mut input, ship, FIELD_WIDTH * 0.5 + sway);
    }

    if ship.y < FIELD_HEIGHT - HOME_GAP - PLAYER_SIZE.y * 0.5 {
        input.set(Action::MoveDown, true);
    }

    // Grab a pickup if it is about to land in reach and nothing is incoming
    if threat.is_none() {
        if let Some(pickup) = world
            .pickups
            .iter()
            .filter(|p| p.pos.y > FIELD_HEIGHT * 0.5)
            .min_by(|a, b| ship.distance_squared(a.pos).total_cmp(&ship.distance_squared(b.pos)))
        {
            input.set(Action::MoveLeft, false);
            input.set(Action::MoveRight, false);
            steer_toward(&mut input, ship, pickup.pos.x);
        }
    }

    let has_targets = !world.enemies.is_empty() || world.boss.is_some();
    input.set(Action::Shoot, has_targets);

    if world.player.special_ready() && (world.boss.is_some() || world.enemies.len() >= SPECIAL_CROWD) {
        input.set(Action::Special, true);
    }

    input
}

fn steer_toward(input: &mut ActionState, ship: Vec2, x: f32) {
    let dx = x - ship.x;
    if dx > TRACK_SLACK {
        input.set(Action::MoveRight, true);
    } else if dx < -TRACK_SLACK {
        input.set(Action::MoveLeft, true);
    }
}
