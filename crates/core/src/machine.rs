//! Game state machine - drives any [`GameEngine`] through its lifecycle
//!
//! The machine owns everything that is not board state: the phase, the run
//! score and high score, the per-player intent buffer, the RNG, the score store
//! and the currently armed tick interval.
//!
//! ```text
//! Idle --Start--> Playing <--PauseToggle--> Paused
//!                    |
//!               (terminal)
//!                    v
//!                GameOver --Start--> Playing (fresh run)
//! any --Reset--> Idle (fresh run)
//! ```
//!
//! Every call returns a [`Frame`]: the ordered events plus an instruction for
//! whoever owns the timer. The machine never sleeps itself.

use std::time::Duration;

use arrayvec::ArrayVec;

use crate::engine::GameEngine;
use crate::rng::RandomSource;
use crate::scoring::{HighScoreUpdate, Scoreboard};
use crate::snapshot::GameSnapshot;
use crate::store::ScoreStore;
use crate::types::{GameEvent, GamePhase, Intent, Player, MAX_PLAYERS};

/// What the timer owner must do after a machine call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Leave the current timer as it is
    Keep,
    /// Drop any pending timer and arm a new one with this period
    Arm(Duration),
    /// Drop any pending timer
    Cancel,
}

/// Output of one machine call
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub events: Vec<GameEvent>,
    pub schedule: Schedule,
    /// Whether the call changed anything a snapshot shows
    pub changed: bool,
}

impl Frame {
    fn keep(events: Vec<GameEvent>) -> Self {
        Self {
            changed: !events.is_empty(),
            events,
            schedule: Schedule::Keep,
        }
    }

    fn new(events: Vec<GameEvent>, schedule: Schedule) -> Self {
        Self {
            events,
            schedule,
            changed: true,
        }
    }

    /// Nothing happened: the intent was ignored, rejected or only buffered
    pub fn is_noop(&self) -> bool {
        !self.changed && self.events.is_empty() && self.schedule == Schedule::Keep
    }
}

pub struct GameMachine<E: GameEngine> {
    engine: E,
    phase: GamePhase,
    scoreboard: Scoreboard,
    store: Box<dyn ScoreStore + Send>,
    rng: Box<dyn RandomSource + Send>,
    /// Latest buffered intent per player, consumed on the next tick
    pending: ArrayVec<Intent, MAX_PLAYERS>,
    armed: Option<Duration>,
}

impl<E: GameEngine> GameMachine<E> {
    /// Wrap a freshly built engine. The machine starts `Idle`.
    ///
    /// An unreadable store counts as a high score of 0.
    pub fn new(
        engine: E,
        store: Box<dyn ScoreStore + Send>,
        rng: Box<dyn RandomSource + Send>,
    ) -> Self {
        let game_id = engine.game_id();
        let high_score = match store.get(game_id) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("[{}] could not read high score, using 0: {}", game_id, e);
                0
            }
        };
        let scoreboard = Scoreboard::new(engine.high_score_policy(), high_score);
        Self {
            engine,
            phase: GamePhase::Idle,
            scoreboard,
            store,
            rng,
            pending: ArrayVec::new(),
            armed: None,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.scoreboard.score()
    }

    pub fn high_score(&self) -> u32 {
        self.scoreboard.high_score()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Intents waiting for the next tick
    pub fn pending(&self) -> &[Intent] {
        &self.pending
    }

    /// Currently armed tick period
    pub fn armed_interval(&self) -> Option<Duration> {
        self.armed
    }

    pub fn snapshot(&self) -> GameSnapshot<E::Snapshot> {
        GameSnapshot {
            game: self.engine.game_id(),
            phase: self.phase,
            score: self.scoreboard.score(),
            high_score: self.scoreboard.high_score(),
            board: self.engine.snapshot(),
        }
    }

    /// Feed one decoded intent
    pub fn handle(&mut self, intent: Intent) -> Frame {
        match intent {
            Intent::Start => self.start(),
            Intent::Reset => self.reset(),
            Intent::PauseToggle => self.toggle_pause(),
            _ if self.phase != GamePhase::Playing => Frame::keep(Vec::new()),
            _ if self.engine.buffers(&intent) => {
                self.buffer(intent);
                Frame::keep(Vec::new())
            }
            _ => {
                let before = self.engine.score();
                let mut events = Vec::new();
                if !self
                    .engine
                    .apply_intent(intent, self.rng.as_mut(), &mut events)
                {
                    return Frame::keep(events);
                }
                self.settle(before, events)
            }
        }
    }

    /// Advance one tick. Outside `Playing` this does nothing.
    pub fn tick(&mut self) -> Frame {
        if self.phase != GamePhase::Playing {
            return Frame::keep(Vec::new());
        }
        let buffered = std::mem::take(&mut self.pending);
        let before = self.engine.score();
        let mut events = Vec::new();
        self.engine
            .tick(&buffered, self.rng.as_mut(), &mut events);
        self.settle(before, events)
    }

    /// The timer could not be armed; fall back to a fresh `Idle` game
    pub fn scheduler_failed(&mut self) -> Frame {
        log::error!(
            "[{}] tick scheduling failed, returning to idle",
            self.engine.game_id()
        );
        self.rebuild();
        self.phase = GamePhase::Idle;
        Frame {
            events: vec![GameEvent::PhaseChanged {
                phase: GamePhase::Idle,
            }],
            schedule: Schedule::Cancel,
            changed: true,
        }
    }

    fn start(&mut self) -> Frame {
        match self.phase {
            GamePhase::Idle => {}
            GamePhase::GameOver => self.rebuild(),
            GamePhase::Playing | GamePhase::Paused => return Frame::keep(Vec::new()),
        }
        self.phase = GamePhase::Playing;
        log::debug!("[{}] run started", self.engine.game_id());
        let events = vec![GameEvent::PhaseChanged {
            phase: GamePhase::Playing,
        }];
        if self.engine.is_terminal() {
            return self.finish(events);
        }
        Frame::new(events, self.rearm())
    }

    fn reset(&mut self) -> Frame {
        self.rebuild();
        self.phase = GamePhase::Idle;
        self.armed = None;
        Frame {
            events: vec![GameEvent::PhaseChanged {
                phase: GamePhase::Idle,
            }],
            schedule: Schedule::Cancel,
            changed: true,
        }
    }

    fn toggle_pause(&mut self) -> Frame {
        match self.phase {
            GamePhase::Playing => {
                self.phase = GamePhase::Paused;
                self.armed = None;
                Frame {
                    events: vec![GameEvent::PhaseChanged {
                        phase: GamePhase::Paused,
                    }],
                    schedule: Schedule::Cancel,
                    changed: true,
                }
            }
            GamePhase::Paused => {
                self.phase = GamePhase::Playing;
                Frame {
                    events: vec![GameEvent::PhaseChanged {
                        phase: GamePhase::Playing,
                    }],
                    schedule: self.rearm(),
                    changed: true,
                }
            }
            GamePhase::Idle | GamePhase::GameOver => Frame::keep(Vec::new()),
        }
    }

    /// Fresh engine and run score; the high score survives
    fn rebuild(&mut self) {
        self.engine.reset(self.rng.as_mut());
        self.scoreboard.reset_run();
        self.pending.clear();
        self.armed = None;
    }

    /// Keep only the latest buffered intent per player
    fn buffer(&mut self, intent: Intent) {
        let player = match intent {
            Intent::Move { player, .. } => player,
            _ => Player::One,
        };
        let slot = self.pending.iter().position(|p| match p {
            Intent::Move { player: other, .. } => *other == player,
            _ => player == Player::One,
        });
        match slot {
            Some(idx) => self.pending[idx] = intent,
            None => {
                let _ = self.pending.try_push(intent);
            }
        }
    }

    /// Account the score change of the last engine step and follow up on it
    fn settle(&mut self, score_before: u32, mut events: Vec<GameEvent>) -> Frame {
        let delta = self.engine.score().saturating_sub(score_before);
        if delta > 0 {
            events.push(GameEvent::Scored { delta });
            let update = self.scoreboard.add(delta);
            self.sync_high_score(update, &mut events);
        }
        debug_assert_eq!(self.scoreboard.score(), self.engine.score());

        if self.engine.is_terminal() {
            return self.finish(events);
        }
        Frame::new(events, self.rearm())
    }

    fn finish(&mut self, mut events: Vec<GameEvent>) -> Frame {
        let update = self.scoreboard.finish_run();
        self.sync_high_score(update, &mut events);

        self.phase = GamePhase::GameOver;
        self.armed = None;
        let final_score = self.scoreboard.score();
        log::info!(
            "[{}] game over, final score {}",
            self.engine.game_id(),
            final_score
        );
        events.push(GameEvent::GameOver { final_score });
        events.push(GameEvent::PhaseChanged {
            phase: GamePhase::GameOver,
        });
        Frame::new(events, Schedule::Cancel)
    }

    /// Announce and persist a new high score, retrying any earlier failed write
    fn sync_high_score(&mut self, update: Option<HighScoreUpdate>, events: &mut Vec<GameEvent>) {
        if let Some(update) = update {
            if update.announce {
                log::info!(
                    "[{}] new high score {}",
                    self.engine.game_id(),
                    update.value
                );
                events.push(GameEvent::NewHighScore {
                    value: update.value,
                });
            }
        }

        let value = match (update.map(|u| u.value), self.scoreboard.take_pending()) {
            (Some(a), Some(b)) => a.max(b),
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => return,
        };

        match self.store.set(self.engine.game_id(), value) {
            Ok(()) => self.scoreboard.write_result(value, true),
            Err(e) => {
                log::warn!(
                    "[{}] could not save high score {}: {}",
                    self.engine.game_id(),
                    value,
                    e
                );
                self.scoreboard.write_result(value, false);
                events.push(GameEvent::HighScoreNotSaved { value });
            }
        }
    }

    /// Re-arm only when the engine's interval differs from the armed one
    fn rearm(&mut self) -> Schedule {
        let next = self.engine.tick_interval();
        if next == self.armed {
            return Schedule::Keep;
        }
        self.armed = next;
        match next {
            Some(period) => {
                log::debug!(
                    "[{}] tick re-armed at {:?}",
                    self.engine.game_id(),
                    period
                );
                Schedule::Arm(period)
            }
            None => Schedule::Cancel,
        }
    }
}
