//! One running game and its collaborators
//!
//! The session owns the table, the input controller, the audio sink and the
//! score sink. Input handlers call into it, the frame loop advances it, and
//! after every frame the simulation's events are turned into sounds, score
//! submissions and high score entries.

use crate::audio::{AudioSink, SoundCue};
use crate::consts::*;
use crate::highscores::HighScores;
use crate::input::{Button, ControlScheme, InputAction, InputController, Key};
use crate::scores::ScoreSink;
use crate::sim::{Game, GameEvent, GameState, tick};
use crate::wall_clock_ms;

/// Longest frame gap fed to the accumulator (s)
const MAX_FRAME_DT: f32 = 0.1;

pub struct Session {
    game: Game,
    input: InputController,
    audio: Box<dyn AudioSink>,
    scores: Box<dyn ScoreSink>,
    highscores: HighScores,
    accumulator: f32,
    last_frame_ms: Option<f64>,
    disposed: bool,
}

impl Session {
    pub fn create(
        scheme: ControlScheme,
        audio: Box<dyn AudioSink>,
        scores: Box<dyn ScoreSink>,
        highscores: HighScores,
    ) -> Self {
        log::info!("Session created ({scheme:?} controls)");
        Self {
            game: Game::new(),
            input: InputController::new(scheme),
            audio,
            scores,
            highscores,
            accumulator: 0.0,
            last_frame_ms: None,
            disposed: false,
        }
    }

    /// Stop audio and freeze the session. Input and frames are ignored
    /// afterwards; the shell detaches its listeners before calling this.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.audio.stop_all();
        log::info!("Session disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    // === Input ===

    pub fn click_start(&mut self) {
        if self.disposed {
            return;
        }
        let action = self.input.start();
        self.react(action);
    }

    pub fn key_down(&mut self, key: Key, now_ms: f64) {
        if self.disposed {
            return;
        }
        let action = self.input.key_down(key, now_ms);
        self.react(action);
    }

    pub fn key_up(&mut self, key: Key, now_ms: f64) {
        if self.disposed {
            return;
        }
        let action = self.input.key_up(key, now_ms);
        self.react(action);
    }

    pub fn touch_start(&mut self, x: f32, width: f32) {
        if self.disposed {
            return;
        }
        let action = self.input.touch_start(x, width);
        self.react(action);
    }

    pub fn touch_end(&mut self) {
        if self.disposed {
            return;
        }
        for action in self.input.touch_end() {
            self.react(Some(action));
        }
    }

    pub fn button_down(&mut self, button: Button, now_ms: f64) {
        if self.disposed {
            return;
        }
        let action = self.input.button_down(button, now_ms);
        self.react(action);
    }

    pub fn button_up(&mut self, button: Button, now_ms: f64) {
        if self.disposed {
            return;
        }
        let action = self.input.button_up(button, now_ms);
        self.react(action);
    }

    /// Restart button on the game-over screen
    pub fn restart(&mut self) {
        if self.disposed || !self.game.state.is_game_over() {
            return;
        }
        self.input.request_restart();
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.audio.set_muted(muted);
    }

    pub fn is_muted(&self) -> bool {
        self.audio.is_muted()
    }

    /// Immediate feedback that doesn't wait for the next tick
    fn react(&mut self, action: Option<InputAction>) {
        match action {
            Some(InputAction::Start) => self.audio.start_music(),
            Some(InputAction::FlipperToggled(_)) => self.audio.play(SoundCue::Flipper),
            Some(InputAction::ChargeStarted)
            | Some(InputAction::Released { .. })
            | Some(InputAction::AdvanceStage)
            | None => {}
        }
    }

    // === Simulation ===

    /// Advance by the time since the previous frame, in fixed steps
    pub fn frame(&mut self, now_ms: f64) {
        if self.disposed {
            return;
        }
        let dt = match self.last_frame_ms {
            Some(last) => ((now_ms - last) / 1000.0) as f32,
            None => SIM_DT,
        };
        self.last_frame_ms = Some(now_ms);

        self.accumulator += dt.clamp(0.0, MAX_FRAME_DT);
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.step_once();
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        // Drop the backlog instead of spiraling
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }

        self.dispatch_events();
    }

    /// Exactly one fixed step, then event dispatch
    pub fn step(&mut self) {
        if self.disposed {
            return;
        }
        self.step_once();
        self.dispatch_events();
    }

    fn step_once(&mut self) {
        let input = self.input.tick_input();
        tick(&mut self.game, &input, SIM_DT);
        // Clear one-shot inputs after processing
        self.input.clear_one_shots();
    }

    fn dispatch_events(&mut self) {
        for event in self.game.state.drain_events() {
            match event {
                GameEvent::BallImpact => self.audio.play(SoundCue::Impact),
                GameEvent::BumperHit => self.audio.play(SoundCue::Bumper),
                GameEvent::LifeLost { .. } => self.audio.play(SoundCue::LifeLost),
                GameEvent::GameOver { score, stage } => {
                    self.audio.play(SoundCue::GameOver);
                    self.scores.submit(score);
                    if let Some(rank) = self.highscores.add_score(score, stage, wall_clock_ms()) {
                        log::info!("New local high score, rank {rank}");
                        self.highscores.save();
                    }
                }
                GameEvent::Started
                | GameEvent::TargetHit { .. }
                | GameEvent::Launched { .. }
                | GameEvent::StageAdvanced { .. }
                | GameEvent::Restarted => {}
            }
        }
    }

    // === Presentation ===

    /// Score, lives, stage, overlay for the HUD
    pub fn snapshot(&self) -> GameState {
        self.game.snapshot()
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut Game {
        &mut self.game
    }

    pub fn input(&self) -> &InputController {
        &self.input
    }

    /// Best score reported by the server, once a submission has come back
    pub fn best_score(&self) -> Option<u64> {
        self.scores.best_score()
    }

    pub fn high_scores(&self) -> &HighScores {
        &self.highscores
    }
}
