//! Scoring module - point tables, speed curves and the high-score rule
//!
//! Engines compute deltas with the helpers here; the state machine feeds every
//! delta through a [`Scoreboard`], which owns the run score and decides when the
//! persisted high score is checked.
//!
//! Compatibility notes:
//! - Tetris uses a fixed table keyed on simultaneous lines, not a formula.
//! - Snake and 2048 check the high score on every score change; Tetris and
//!   Bubble-Pop only when the run ends. Keep these timings as they are.

use serde::{Deserialize, Serialize};

use crate::types::{COMBO_THRESHOLD, LINE_SCORES};

/// Add a delta to a score; never wraps
pub fn apply_delta(score: u32, delta: u32) -> u32 {
    score.saturating_add(delta)
}

/// Tetris line clear points from a table indexed by line count
///
/// Counts beyond the table award the last entry; zero lines award zero.
pub fn line_clear_points(table: &[u32], lines: usize) -> u32 {
    if lines == 0 {
        return 0;
    }
    table
        .get(lines)
        .or_else(|| table.last())
        .copied()
        .unwrap_or(0)
}

/// Default Tetris table as an owned vector (for configs)
pub fn default_line_table() -> Vec<u32> {
    LINE_SCORES.to_vec()
}

/// Floor-clamped stepwise interval
///
/// `interval = max(base - floor(progress / step) * decrement, min)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedCurve {
    pub base_ms: u32,
    pub step: u32,
    pub decrement_ms: u32,
    pub min_ms: u32,
}

impl SpeedCurve {
    /// A curve that never speeds up
    pub const fn constant(interval_ms: u32) -> Self {
        Self {
            base_ms: interval_ms,
            step: 1,
            decrement_ms: 0,
            min_ms: interval_ms,
        }
    }

    pub fn interval_ms(&self, progress: u32) -> u32 {
        let steps = progress / self.step.max(1);
        self.base_ms
            .saturating_sub(steps.saturating_mul(self.decrement_ms))
            .max(self.min_ms)
    }
}

/// Outcome of one bubble pop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PopScore {
    /// Combo counter after this pop
    pub combo: u32,
    /// Bonus earned from the combo (already included in `points`)
    pub combo_bonus: u32,
    pub points: u32,
}

/// Bubble-Pop points for a single pop
///
/// A pop of the same kind as the previous one extends the combo; once the combo
/// reaches the threshold it adds `floor(combo / 2)` points. A pop of another
/// kind resets the combo to 0. Special bubbles double the pop's total.
pub fn bubble_pop_points(previous_combo: u32, same_kind: bool, special: bool) -> PopScore {
    let mut points = 1;
    let mut combo_bonus = 0;
    let combo = if same_kind { previous_combo + 1 } else { 0 };
    if same_kind && combo >= COMBO_THRESHOLD {
        combo_bonus = combo / 2;
        points += combo_bonus;
    }
    if special {
        points *= 2;
    }
    PopScore {
        combo,
        combo_bonus,
        points,
    }
}

/// When the persisted high score is compared against the run score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HighScorePolicy {
    /// On every score change
    Continuous,
    /// Once, when the run ends
    EndOfRun,
}

/// What the scoreboard wants persisted after an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighScoreUpdate {
    /// Value to write to the store
    pub value: u32,
    /// First time this run beat the stored record
    pub announce: bool,
}

/// Run score plus high-score bookkeeping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scoreboard {
    policy: HighScorePolicy,
    score: u32,
    high_score: u32,
    /// A value the store refused; retried on the next update
    pending_write: Option<u32>,
    announced: bool,
}

impl Scoreboard {
    pub fn new(policy: HighScorePolicy, high_score: u32) -> Self {
        Self {
            policy,
            score: 0,
            high_score,
            pending_write: None,
            announced: false,
        }
    }

    pub fn policy(&self) -> HighScorePolicy {
        self.policy
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn pending_write(&self) -> Option<u32> {
        self.pending_write
    }

    /// Start a new run; the high score carries over
    pub fn reset_run(&mut self) {
        self.score = 0;
        self.announced = false;
    }

    /// Accumulate a delta; returns a high-score update under the continuous policy
    pub fn add(&mut self, delta: u32) -> Option<HighScoreUpdate> {
        if delta == 0 {
            return None;
        }
        self.score = apply_delta(self.score, delta);
        match self.policy {
            HighScorePolicy::Continuous => self.check_high_score(),
            HighScorePolicy::EndOfRun => None,
        }
    }

    /// Run ended; returns a high-score update under the end-of-run policy
    pub fn finish_run(&mut self) -> Option<HighScoreUpdate> {
        match self.policy {
            HighScorePolicy::EndOfRun => self.check_high_score(),
            HighScorePolicy::Continuous => None,
        }
    }

    fn check_high_score(&mut self) -> Option<HighScoreUpdate> {
        if self.score <= self.high_score {
            return None;
        }
        self.high_score = self.score;
        let announce = !self.announced;
        self.announced = true;
        Some(HighScoreUpdate {
            value: self.high_score,
            announce,
        })
    }

    /// Record the result of persisting `value`
    pub fn write_result(&mut self, value: u32, ok: bool) {
        if ok {
            if self.pending_write.is_some_and(|p| p <= value) {
                self.pending_write = None;
            }
        } else {
            self.pending_write = Some(self.pending_write.map_or(value, |p| p.max(value)));
        }
    }

    /// Take the value waiting for a retry, if any
    pub fn take_pending(&mut self) -> Option<u32> {
        self.pending_write.take()
    }
}
