//! Table simulation
//!
//! All gameplay logic lives here. Nothing in this module does I/O:
//! - Fixed timestep only
//! - Side effects leave as `GameEvent`s for the session to act on
//! - No rendering or platform dependencies

pub mod collision;
pub mod flipper;
pub mod plunger;
pub mod state;
pub mod table;
pub mod tick;

pub use collision::resolve_contacts;
pub use flipper::{Flipper, FlipperSpec};
pub use plunger::{Plunger, ball_in_lane, launch_speed};
pub use state::{Game, GameEvent, GameState, Overlay};
pub use table::Table;
pub use tick::{TickInput, advance_stage, apply_contacts, restart, tick};
