//! Game state and core simulation types
//!
//! Bookkeeping (score, lives, stage, overlay) is plain data; the physical
//! table lives next to it in [`Game`].

use serde::{Deserialize, Serialize};

use super::table::Table;
use crate::consts::*;

/// Terminal-screen flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Overlay {
    /// Gameplay visible
    #[default]
    None,
    /// Run ended, waiting for restart
    GameOver,
}

/// Something that happened during a tick, for the I/O shell to react to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Started,
    /// Ball touched anything
    BallImpact,
    BumperHit,
    TargetHit { points: u64 },
    Launched { speed: f32 },
    LifeLost { lives_left: u32 },
    GameOver { score: u64, stage: u32 },
    StageAdvanced { stage: u32 },
    Restarted,
}

/// Score, lives, stage and overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub score: u64,
    pub lives: u32,
    /// 1-based stage number
    pub stage: u32,
    pub overlay: Overlay,
    /// Simulation frozen until the first start gesture
    pub started: bool,
    /// Target hits so far, drives the score-pop animation
    pub score_pops: u32,
    /// Events from the current frame, drained by the session
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        Self {
            score: 0,
            lives: START_LIVES,
            stage: 1,
            overlay: Overlay::None,
            started: false,
            score_pops: 0,
            events: Vec::new(),
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.overlay == Overlay::GameOver
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Back to a fresh run. `started` is kept.
    pub fn reset(&mut self) {
        self.score = 0;
        self.lives = START_LIVES;
        self.stage = 1;
        self.overlay = Overlay::None;
    }
}

/// One running game: bookkeeping plus the physical table
pub struct Game {
    pub state: GameState,
    pub table: Table,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// Fresh game at stage 1, frozen until started
    pub fn new() -> Self {
        let state = GameState::new();
        let table = Table::new(state.stage);
        Self { state, table }
    }

    /// Copy of the bookkeeping for presentation
    pub fn snapshot(&self) -> GameState {
        GameState {
            events: Vec::new(),
            ..self.state.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state() {
        let state = GameState::new();
        assert_eq!(state.score, 0);
        assert_eq!(state.lives, 3);
        assert_eq!(state.stage, 1);
        assert_eq!(state.overlay, Overlay::None);
        assert!(!state.started);
    }

    #[test]
    fn test_reset_keeps_started() {
        let mut state = GameState::new();
        state.started = true;
        state.score = 4200;
        state.lives = 0;
        state.stage = 2;
        state.overlay = Overlay::GameOver;

        state.reset();
        assert_eq!(
            (state.score, state.lives, state.stage, state.overlay),
            (0, 3, 1, Overlay::None)
        );
        assert!(state.started);
    }

    #[test]
    fn test_drain_events() {
        let mut state = GameState::new();
        state.push_event(GameEvent::Started);
        state.push_event(GameEvent::BumperHit);
        assert_eq!(state.drain_events(), vec![GameEvent::Started, GameEvent::BumperHit]);
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_state_serialization() {
        let mut state = GameState::new();
        state.score = 600;
        state.push_event(GameEvent::Started);

        let json = serde_json::to_string(&state).unwrap();
        let back: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.score, 600);
        // Events are transient
        assert!(back.events.is_empty());
    }
}
