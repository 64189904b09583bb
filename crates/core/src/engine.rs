//! Engine capability interface
//!
//! Every game variant implements [`GameEngine`] once; the state machine drives
//! all of them the same way. Engines hold only their own board and entities:
//! phase, score accounting, high scores, intent buffering and timers belong to
//! the machine.

use std::time::Duration;

use serde::Serialize;

use crate::rng::RandomSource;
use crate::scoring::HighScorePolicy;
use crate::types::{GameEvent, Intent};

pub trait GameEngine {
    /// Read-only view state handed to the renderer
    type Snapshot: Clone + Serialize;

    /// Stable id, also the score store key
    fn game_id(&self) -> &'static str;

    fn high_score_policy(&self) -> HighScorePolicy;

    /// Rebuild the board and entities for a new run
    fn reset(&mut self, rng: &mut dyn RandomSource);

    /// True if the intent waits for the next tick instead of applying now
    fn buffers(&self, _intent: &Intent) -> bool {
        false
    }

    /// Apply an immediate intent. Illegal intents leave the engine untouched
    /// and return false.
    fn apply_intent(
        &mut self,
        intent: Intent,
        rng: &mut dyn RandomSource,
        events: &mut Vec<GameEvent>,
    ) -> bool;

    /// Advance one tick, consuming the intents buffered since the last one
    fn tick(&mut self, buffered: &[Intent], rng: &mut dyn RandomSource, events: &mut Vec<GameEvent>);

    /// The run cannot continue
    fn is_terminal(&self) -> bool;

    /// Delay until the next tick; None for games driven purely by input
    fn tick_interval(&self) -> Option<Duration>;

    /// Primary player's score for this run
    fn score(&self) -> u32;

    fn snapshot(&self) -> Self::Snapshot;
}
