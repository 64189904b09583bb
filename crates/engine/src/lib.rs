//! Autoplay - planners that drive any of the games from their snapshots
//!
//! Used by the headless simulator and the benches. Pilots only ever see what a
//! renderer would see (the board part of a published snapshot) and answer with
//! ordinary intents, so they exercise the same paths as a human player.

pub mod pilot;
pub mod place;

pub use pilot::{Autoplay, BubblePilot, MergePilot, SnakePilot, TetrisPilot};
pub use place::{best_place, plan_place, PlaceError, Placement};
