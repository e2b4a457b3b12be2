//! Contact resolution
//!
//! Turns the contact pairs of one physics step into scoring, bumper kicks
//! and life/game-over transitions.

use std::collections::HashSet;

use rapier2d::prelude::ColliderHandle;

use super::state::{Game, GameEvent, Overlay};
use crate::consts::*;
use crate::physics::{BodyTag, ContactBegin};

/// React to every pair that involves the ball.
///
/// A collider reacts at most once per call, so a contact reported twice in
/// one step scores once. Pairs whose other body no longer exists are skipped.
pub fn resolve_contacts(game: &mut Game, contacts: &[ContactBegin]) {
    let mut visited: HashSet<ColliderHandle> = HashSet::new();

    for pair in contacts {
        // The ball may have been removed by an earlier pair in this step
        let Some(ball) = game.table.ball() else {
            return;
        };
        let Some(other) = pair.other(ball.collider) else {
            continue;
        };
        let Some(tag) = game.table.world.tag(other) else {
            continue;
        };
        if !visited.insert(other) {
            continue;
        }

        game.state.push_event(GameEvent::BallImpact);

        match tag {
            BodyTag::Bumper => kick_from_bumper(game, other),
            BodyTag::Target => hit_target(game),
            BodyTag::DeathZone => enter_death_zone(game),
            BodyTag::Ball
            | BodyTag::Wall
            | BodyTag::Flipper(_)
            | BodyTag::Plunger
            | BodyTag::PlungerShelf
            | BodyTag::Obstacle => {}
        }
    }
}

fn kick_from_bumper(game: &mut Game, bumper: ColliderHandle) {
    let table = &mut game.table;
    let (Some(ball), Some(center)) = (table.ball(), table.world.collider_position(bumper)) else {
        return;
    };
    let (Some(pos), Some(vel)) = (table.world.position(ball), table.world.velocity(ball)) else {
        return;
    };
    let kick = (pos - center).normalize_or_zero() * BUMPER_KICK;
    table.world.set_velocity(ball, vel + kick);
    game.state.push_event(GameEvent::BumperHit);
}

fn hit_target(game: &mut Game) {
    game.state.score += TARGET_POINTS;
    game.state.score_pops += 1;
    game.state.push_event(GameEvent::TargetHit {
        points: TARGET_POINTS,
    });
    log::debug!("Target hit, score {}", game.state.score);
}

/// Lose a life, or end the run on the last one. The ball is moved or removed
/// right away so the sensor can't fire again for the same fall.
pub fn enter_death_zone(game: &mut Game) {
    let state = &mut game.state;
    state.lives = state.lives.saturating_sub(1);

    if state.lives > 0 {
        game.table.respawn_ball();
        state.push_event(GameEvent::LifeLost {
            lives_left: state.lives,
        });
        log::info!("Life lost, {} left", state.lives);
        return;
    }

    game.table.remove_ball();
    state.overlay = Overlay::GameOver;
    state.push_event(GameEvent::GameOver {
        score: state.score,
        stage: state.stage,
    });
    log::info!("Game over with {} points on stage {}", state.score, state.stage);
}
