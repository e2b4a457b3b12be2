//! Fixed timestep simulation tick
//!
//! One call applies the input snapshot, steps physics once and resolves the
//! contacts that began during that step.

use super::collision::resolve_contacts;
use super::state::{Game, GameEvent};
use crate::physics::ContactBegin;
use crate::stage::stage_config;

/// Input for a single tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    pub left_held: bool,
    pub right_held: bool,
    /// Plunger being drawn back
    pub charging: bool,
    /// Plunger released this tick with the given charge ratio
    pub launch: Option<f32>,
    /// Start gesture
    pub start: bool,
    /// Skip to next stage (debug/testing)
    pub advance_stage: bool,
    /// Restart from the game-over screen; ignored during play
    pub restart: bool,
}

/// Advance the game by one fixed timestep
pub fn tick(game: &mut Game, input: &TickInput, dt: f32) {
    if input.start && !game.state.started {
        game.state.started = true;
        game.state.push_event(GameEvent::Started);
    }

    // Frozen until started
    if !game.state.started {
        return;
    }

    if input.restart && game.state.is_game_over() {
        restart(game);
    }

    if input.advance_stage && !game.state.is_game_over() {
        advance_stage(game);
    }

    let table = &mut game.table;
    table.left.drive(&mut table.world, input.left_held);
    table.right.drive(&mut table.world, input.right_held);

    if let Some(ratio) = input.launch {
        let ball = table.ball();
        if let Some(speed) = table.plunger.release(&mut table.world, ball, ratio) {
            game.state.push_event(GameEvent::Launched { speed });
        }
    }
    if input.charging {
        table.plunger.pull(&mut table.world, dt);
    }

    table.world.set_dt(dt);
    let contacts = table.world.step();
    table.left.clamp(&mut table.world);
    table.right.clamp(&mut table.world);

    apply_contacts(game, &contacts);
}

/// Resolve a step's contacts, then advance the stage if its target score
/// has been reached
pub fn apply_contacts(game: &mut Game, contacts: &[ContactBegin]) {
    resolve_contacts(game, contacts);

    if game.state.is_game_over() {
        return;
    }
    let reached = stage_config(game.state.stage)
        .and_then(|def| def.target_score)
        .is_some_and(|target| game.state.score >= target);
    if reached {
        advance_stage(game);
    }
}

/// Move on to the next stage: lives refilled, ball back in the lane, score
/// kept. Returns false on the final stage.
pub fn advance_stage(game: &mut Game) -> bool {
    let next = game.state.stage + 1;
    if stage_config(next).is_none() {
        log::debug!("Stage {} is the last stage", game.state.stage);
        return false;
    }

    game.state.stage = next;
    game.state.lives = crate::consts::START_LIVES;
    game.table.respawn_ball();
    game.table.load_stage(next);
    game.state.push_event(GameEvent::StageAdvanced { stage: next });
    log::info!("Advanced to stage {next}");
    true
}

/// Fresh run on stage 1. The ball is re-added if the last run removed it.
pub fn restart(game: &mut Game) {
    game.state.reset();
    game.table.respawn_ball();
    let table = &mut game.table;
    table.plunger.reset(&mut table.world);
    table.load_stage(1);
    game.state.push_event(GameEvent::Restarted);
    log::info!("Restarted");
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use proptest::prelude::*;

    use super::*;
    use crate::consts::*;
    use crate::physics::BodyTag;
    use crate::sim::state::Overlay;

    fn started_game() -> Game {
        let mut game = Game::new();
        let input = TickInput {
            start: true,
            ..Default::default()
        };
        tick(&mut game, &input, SIM_DT);
        game
    }

    fn target_contact(game: &Game) -> ContactBegin {
        let target = game
            .table
            .stage_bodies
            .handles()
            .iter()
            .find(|h| game.table.world.tag(h.collider) == Some(BodyTag::Target))
            .unwrap();
        ContactBegin {
            a: game.table.ball().unwrap().collider,
            b: target.collider,
        }
    }

    #[test]
    fn test_frozen_until_started() {
        let mut game = Game::new();
        let before = game.table.ball_position();
        for _ in 0..30 {
            tick(&mut game, &TickInput::default(), SIM_DT);
        }
        assert!(!game.state.started);
        assert_eq!(game.table.ball_position(), before);
        assert!(game.state.events.is_empty());
    }

    #[test]
    fn test_start_event() {
        let game = started_game();
        assert!(game.state.started);
        assert_eq!(game.state.events.first(), Some(&GameEvent::Started));
    }

    #[test]
    fn test_full_charge_launch() {
        let mut game = started_game();
        let input = TickInput {
            launch: Some(1.0),
            ..Default::default()
        };
        tick(&mut game, &input, SIM_DT);

        assert!(
            game.state
                .events
                .contains(&GameEvent::Launched { speed: PLUNGER_MAX_LAUNCH_SPEED })
        );
        let vel = game.table.ball_velocity().unwrap();
        assert!(vel.y < -0.9 * PLUNGER_MAX_LAUNCH_SPEED, "vy = {}", vel.y);
        assert_eq!(game.table.plunger.pull_y(), PLUNGER_REST_Y);
    }

    #[test]
    fn test_charging_pulls_plunger() {
        let mut game = started_game();
        let input = TickInput {
            charging: true,
            ..Default::default()
        };
        for _ in 0..10 {
            tick(&mut game, &input, SIM_DT);
        }
        assert!(game.table.plunger.pull_y() > PLUNGER_REST_Y);
    }

    #[test]
    fn test_ball_falls_into_death_zone() {
        let mut game = started_game();
        let ball = game.table.ball().unwrap();
        game.table.world.set_position(ball, Vec2::new(350.0, 1150.0));
        game.table.world.set_velocity(ball, Vec2::new(0.0, 300.0));

        for _ in 0..30 {
            tick(&mut game, &TickInput::default(), SIM_DT);
            if game.state.lives < START_LIVES {
                break;
            }
        }
        assert_eq!(game.state.lives, START_LIVES - 1);
        let pos = game.table.ball_position().unwrap();
        assert!(crate::sim::plunger::ball_in_lane(pos), "ball not respawned: {pos}");
    }

    #[test]
    fn test_last_life_game_over_then_restart() {
        let mut game = started_game();
        game.state.lives = 1;
        game.state.score = 900;
        let ball = game.table.ball().unwrap();
        game.table.world.set_position(ball, Vec2::new(350.0, 1190.0));

        for _ in 0..30 {
            tick(&mut game, &TickInput::default(), SIM_DT);
            if game.state.is_game_over() {
                break;
            }
        }
        assert_eq!(game.state.lives, 0);
        assert_eq!(game.state.overlay, Overlay::GameOver);
        assert!(game.table.ball().is_none());
        assert_eq!(game.table.world.count_tagged(BodyTag::Ball), 0);

        // Physics keeps running with no ball
        tick(&mut game, &TickInput::default(), SIM_DT);
        assert!(game.state.is_game_over());

        let input = TickInput {
            restart: true,
            ..Default::default()
        };
        tick(&mut game, &input, SIM_DT);
        assert_eq!(
            (game.state.score, game.state.lives, game.state.stage, game.state.overlay),
            (0, 3, 1, Overlay::None)
        );
        assert_eq!(game.table.world.count_tagged(BodyTag::Ball), 1);
        assert!(game.state.events.contains(&GameEvent::Restarted));
    }

    #[test]
    fn test_restart_from_later_stage() {
        let mut game = started_game();
        game.state.score = 5000;
        advance_stage(&mut game);
        game.state.lives = 0;
        game.state.overlay = Overlay::GameOver;
        game.table.remove_ball();

        restart(&mut game);
        assert_eq!(
            (game.state.score, game.state.lives, game.state.stage, game.state.overlay),
            (0, 3, 1, Overlay::None)
        );
        assert_eq!(game.table.stage_bodies.stage(), Some(1));
        assert_eq!(game.table.world.count_tagged(BodyTag::Bumper), 3);
        assert_eq!(game.table.ball_position(), Some(Vec2::new(BALL_SPAWN_X, BALL_SPAWN_Y)));
    }

    #[test]
    fn test_target_score_advances_stage() {
        let mut game = started_game();
        game.state.score = 900;
        game.state.lives = 1;

        let contact = target_contact(&game);
        apply_contacts(&mut game, &[contact]);

        assert_eq!(game.state.score, 1200);
        assert_eq!(game.state.stage, 2);
        assert_eq!(game.state.lives, 3);
        assert_eq!(game.table.stage_bodies.stage(), Some(2));
        assert_eq!(game.table.world.count_tagged(BodyTag::Target), 2);
        assert!(game.state.events.contains(&GameEvent::StageAdvanced { stage: 2 }));
    }

    #[test]
    fn test_final_stage_never_advances() {
        let mut game = started_game();
        advance_stage(&mut game);
        assert_eq!(game.state.stage, 2);

        game.state.score = 1_000_000;
        let contact = target_contact(&game);
        apply_contacts(&mut game, &[contact]);
        assert_eq!(game.state.stage, 2);
        assert!(!advance_stage(&mut game));
    }

    #[test]
    fn test_debug_advance_keeps_score() {
        let mut game = started_game();
        game.state.score = 300;
        game.state.lives = 2;
        let input = TickInput {
            advance_stage: true,
            ..Default::default()
        };
        tick(&mut game, &input, SIM_DT);
        assert_eq!(game.state.stage, 2);
        assert_eq!(game.state.lives, 3);
        assert_eq!(game.state.score, 300);

        // No stage 3: no-op
        tick(&mut game, &input, SIM_DT);
        assert_eq!(game.state.stage, 2);
    }

    #[test]
    fn test_score_only_rises_by_target_value() {
        let mut game = started_game();
        let mut last = game.state.score;
        for _ in 0..3 {
            let contact = target_contact(&game);
            apply_contacts(&mut game, &[contact]);
            assert_eq!(game.state.score, last + TARGET_POINTS);
            last = game.state.score;
        }
    }

    #[test]
    fn test_restart_ignored_while_playing() {
        let mut game = started_game();
        game.state.score = 900;
        game.state.lives = 2;
        let input = TickInput {
            restart: true,
            ..Default::default()
        };
        tick(&mut game, &input, SIM_DT);

        assert_eq!(game.state.score, 900);
        assert_eq!(game.state.lives, 2);
        assert_eq!(game.state.overlay, Overlay::None);
        assert!(!game.state.events.contains(&GameEvent::Restarted));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_restart_always_lands_on_fresh_run(
            score in 0u64..100_000,
            lives in 0u32..=START_LIVES,
            on_stage_two in any::<bool>(),
            game_over in any::<bool>(),
            ball_removed in any::<bool>(),
        ) {
            let mut game = started_game();
            if on_stage_two {
                advance_stage(&mut game);
            }
            game.state.score = score;
            game.state.lives = lives;
            if game_over {
                game.state.overlay = Overlay::GameOver;
            }
            if ball_removed {
                game.table.remove_ball();
            }

            restart(&mut game);

            prop_assert_eq!(
                (game.state.score, game.state.lives, game.state.stage, game.state.overlay),
                (0, START_LIVES, 1, Overlay::None)
            );
            prop_assert!(game.state.started);
            prop_assert_eq!(game.table.stage_bodies.stage(), Some(1));
            prop_assert_eq!(game.table.world.count_tagged(BodyTag::Ball), 1);
            prop_assert_eq!(game.table.world.count_tagged(BodyTag::Bumper), 3);
            prop_assert_eq!(
                game.table.ball_position(),
                Some(Vec2::new(BALL_SPAWN_X, BALL_SPAWN_Y))
            );
        }
    }
}
