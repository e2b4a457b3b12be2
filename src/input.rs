//! Input normalization
//!
//! Keyboard, half-screen taps and on-screen buttons all collapse into the
//! same few signals: two flipper holds, a plunger charge with its start time,
//! and one-shot requests that the next simulation tick consumes.

use crate::consts::{MAX_CHARGE_MS, MIN_CHARGE_RATIO};
use crate::physics::FlipperSide;
use crate::sim::TickInput;

/// Logical key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    LeftFlipper,
    RightFlipper,
    Plunger,
    /// Debug stage skip
    NextStage,
}

impl Key {
    /// Map a DOM `KeyboardEvent` key/code pair
    pub fn from_dom(key: &str, code: &str) -> Option<Self> {
        match key {
            "ArrowLeft" => Some(Key::LeftFlipper),
            "ArrowRight" => Some(Key::RightFlipper),
            " " => Some(Key::Plunger),
            "n" | "N" => Some(Key::NextStage),
            _ if code == "Space" => Some(Key::Plunger),
            _ => None,
        }
    }
}

/// On-screen control for touch devices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    LeftFlipper,
    Plunger,
    RightFlipper,
}

/// Which touch controls are wired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlScheme {
    /// Dedicated left / plunger / right buttons
    Buttons,
    /// Tap the left or right half of the field
    HalfScreen,
}

/// What an input event did, for immediate feedback outside the simulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputAction {
    Start,
    FlipperToggled(FlipperSide),
    ChargeStarted,
    Released { ratio: f32 },
    AdvanceStage,
}

/// Launch strength for a hold of `held_ms`, in `[MIN_CHARGE_RATIO, 1.0]`
pub fn charge_ratio(held_ms: f64) -> f32 {
    let held = held_ms.clamp(0.0, MAX_CHARGE_MS);
    ((held / MAX_CHARGE_MS) as f32).max(MIN_CHARGE_RATIO)
}

/// Held flags plus queued one-shots
#[derive(Debug, Clone)]
pub struct InputController {
    scheme: ControlScheme,
    started: bool,
    left_held: bool,
    right_held: bool,
    charge_started_ms: Option<f64>,
    pending_start: bool,
    pending_launch: Option<f32>,
    pending_advance: bool,
    pending_restart: bool,
}

impl InputController {
    pub fn new(scheme: ControlScheme) -> Self {
        Self {
            scheme,
            started: false,
            left_held: false,
            right_held: false,
            charge_started_ms: None,
            pending_start: false,
            pending_launch: None,
            pending_advance: false,
            pending_restart: false,
        }
    }

    pub fn scheme(&self) -> ControlScheme {
        self.scheme
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn held(&self, side: FlipperSide) -> bool {
        match side {
            FlipperSide::Left => self.left_held,
            FlipperSide::Right => self.right_held,
        }
    }

    pub fn charging(&self) -> bool {
        self.charge_started_ms.is_some()
    }

    pub fn charge_started_ms(&self) -> Option<f64> {
        self.charge_started_ms
    }

    /// Start gesture (click on the start overlay, or first Space)
    pub fn start(&mut self) -> Option<InputAction> {
        if self.started {
            return None;
        }
        self.started = true;
        self.pending_start = true;
        log::info!("Game started");
        Some(InputAction::Start)
    }

    pub fn key_down(&mut self, key: Key, now_ms: f64) -> Option<InputAction> {
        // Before the first start only the plunger key counts, and it starts the game
        if !self.started {
            return match key {
                Key::Plunger => self.start(),
                _ => None,
            };
        }

        match key {
            Key::LeftFlipper => self.press_flipper(FlipperSide::Left),
            Key::RightFlipper => self.press_flipper(FlipperSide::Right),
            Key::Plunger => self.begin_charge(now_ms),
            Key::NextStage => {
                self.pending_advance = true;
                Some(InputAction::AdvanceStage)
            }
        }
    }

    pub fn key_up(&mut self, key: Key, now_ms: f64) -> Option<InputAction> {
        if !self.started {
            return None;
        }
        match key {
            Key::LeftFlipper => self.release_flipper(FlipperSide::Left),
            Key::RightFlipper => self.release_flipper(FlipperSide::Right),
            Key::Plunger => self.release_charge(now_ms),
            Key::NextStage => None,
        }
    }

    /// Tap at `x` within a field `width` pixels wide. Half-screen scheme only.
    pub fn touch_start(&mut self, x: f32, width: f32) -> Option<InputAction> {
        if self.scheme != ControlScheme::HalfScreen || !self.started {
            return None;
        }
        if x < width / 2.0 {
            self.press_flipper(FlipperSide::Left)
        } else {
            self.press_flipper(FlipperSide::Right)
        }
    }

    /// Lifting a finger releases both flippers
    pub fn touch_end(&mut self) -> Vec<InputAction> {
        if self.scheme != ControlScheme::HalfScreen {
            return Vec::new();
        }
        [FlipperSide::Left, FlipperSide::Right]
            .into_iter()
            .filter_map(|side| self.release_flipper(side))
            .collect()
    }

    /// Pointer down on an on-screen button. Buttons scheme only.
    pub fn button_down(&mut self, button: Button, now_ms: f64) -> Option<InputAction> {
        if self.scheme != ControlScheme::Buttons {
            return None;
        }
        if !self.started {
            return match button {
                Button::Plunger => self.start(),
                _ => None,
            };
        }
        match button {
            Button::LeftFlipper => self.press_flipper(FlipperSide::Left),
            Button::RightFlipper => self.press_flipper(FlipperSide::Right),
            Button::Plunger => self.begin_charge(now_ms),
        }
    }

    /// Pointer up or leave on an on-screen button
    pub fn button_up(&mut self, button: Button, now_ms: f64) -> Option<InputAction> {
        if self.scheme != ControlScheme::Buttons || !self.started {
            return None;
        }
        match button {
            Button::LeftFlipper => self.release_flipper(FlipperSide::Left),
            Button::RightFlipper => self.release_flipper(FlipperSide::Right),
            Button::Plunger => self.release_charge(now_ms),
        }
    }

    /// Queue a restart from the game-over screen
    pub fn request_restart(&mut self) {
        self.pending_restart = true;
        self.charge_started_ms = None;
        self.pending_launch = None;
    }

    /// Snapshot for the next simulation step
    pub fn tick_input(&self) -> TickInput {
        TickInput {
            left_held: self.left_held,
            right_held: self.right_held,
            charging: self.charging(),
            launch: self.pending_launch,
            start: self.pending_start,
            advance_stage: self.pending_advance,
            restart: self.pending_restart,
        }
    }

    /// Drop one-shots once a step has consumed them
    pub fn clear_one_shots(&mut self) {
        self.pending_start = false;
        self.pending_launch = None;
        self.pending_advance = false;
        self.pending_restart = false;
    }

    fn press_flipper(&mut self, side: FlipperSide) -> Option<InputAction> {
        let held = self.held_mut(side);
        if *held {
            return None;
        }
        *held = true;
        Some(InputAction::FlipperToggled(side))
    }

    fn release_flipper(&mut self, side: FlipperSide) -> Option<InputAction> {
        let held = self.held_mut(side);
        if !*held {
            return None;
        }
        *held = false;
        Some(InputAction::FlipperToggled(side))
    }

    fn held_mut(&mut self, side: FlipperSide) -> &mut bool {
        match side {
            FlipperSide::Left => &mut self.left_held,
            FlipperSide::Right => &mut self.right_held,
        }
    }

    fn begin_charge(&mut self, now_ms: f64) -> Option<InputAction> {
        if self.charge_started_ms.is_some() {
            return None;
        }
        self.charge_started_ms = Some(now_ms);
        Some(InputAction::ChargeStarted)
    }

    fn release_charge(&mut self, now_ms: f64) -> Option<InputAction> {
        // Clear first so a repeated release can't fire twice
        let started_ms = self.charge_started_ms.take()?;
        let ratio = charge_ratio(now_ms - started_ms);
        self.pending_launch = Some(ratio);
        log::debug!("Plunger released at {:.0}% charge", ratio * 100.0);
        Some(InputAction::Released { ratio })
    }
}
