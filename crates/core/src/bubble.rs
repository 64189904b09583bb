//! Bubble-Pop engine - a timed round of rising bubbles
//!
//! The simulation runs on a fixed frame. Every frame the round clock advances,
//! unfrozen bubbles rise, bubbles past the top edge are dropped, and a new
//! bubble spawns whenever the spawn interval has elapsed and the canvas holds
//! fewer than the difficulty's maximum. The round ends when the clock reaches 0.
//!
//! Popping is the only input. Kinds:
//! - Normal: plain points
//! - Special: doubles the pop
//! - Ice: freezes every live bubble for a while
//! - Bomb: takes every other bubble inside the blast radius with it (no points)

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::GameEngine;
use crate::rng::RandomSource;
use crate::scoring::{apply_delta, bubble_pop_points, HighScorePolicy};
use crate::types::{
    ActivateTarget, BubbleKind, GameEvent, Intent, BUBBLE_BOMB_RADIUS, BUBBLE_CANVAS_HEIGHT,
    BUBBLE_CANVAS_WIDTH, BUBBLE_FRAME_MS, BUBBLE_FREEZE_MS, BUBBLE_ROUND_MS, COMBO_THRESHOLD,
};

/// Spawn and speed tuning for one difficulty
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyProfile {
    pub spawn_interval_ms: u32,
    pub max_concurrent: usize,
    pub base_speed: f32,
    pub special_probability: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn profile(self) -> DifficultyProfile {
        match self {
            Difficulty::Easy => DifficultyProfile {
                spawn_interval_ms: 1500,
                max_concurrent: 8,
                base_speed: 0.5,
                special_probability: 0.15,
            },
            Difficulty::Normal => DifficultyProfile {
                spawn_interval_ms: 1000,
                max_concurrent: 10,
                base_speed: 1.0,
                special_probability: 0.2,
            },
            Difficulty::Hard => DifficultyProfile {
                spawn_interval_ms: 800,
                max_concurrent: 12,
                base_speed: 1.5,
                special_probability: 0.25,
            },
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BubbleConfig {
    pub difficulty: Difficulty,
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub round_ms: u32,
    pub frame_ms: u32,
    pub freeze_ms: u32,
    pub bomb_radius: f32,
    /// Round extension granted each time the combo reaches a multiple of the
    /// combo threshold
    pub combo_time_bonus_ms: u32,
}

impl Default for BubbleConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,
            canvas_width: BUBBLE_CANVAS_WIDTH,
            canvas_height: BUBBLE_CANVAS_HEIGHT,
            round_ms: BUBBLE_ROUND_MS,
            frame_ms: BUBBLE_FRAME_MS,
            freeze_ms: BUBBLE_FREEZE_MS,
            bomb_radius: BUBBLE_BOMB_RADIUS,
            combo_time_bonus_ms: 0,
        }
    }
}

/// Draw a bubble kind from a uniform `r` in `[0, 1)`
pub fn kind_for_roll(r: f32, special_probability: f32) -> BubbleKind {
    let p = special_probability;
    if r < p * 0.5 {
        BubbleKind::Special
    } else if r < p * 0.75 {
        BubbleKind::Ice
    } else if r < p {
        BubbleKind::Bomb
    } else {
        BubbleKind::Normal
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bubble {
    pub id: u32,
    /// Centre, canvas pixels
    pub x: f32,
    pub y: f32,
    /// Diameter
    pub size: f32,
    pub kind: BubbleKind,
    /// Relative speed fixed at spawn
    pub speed: f32,
    /// Wobble phase in radians, for the view
    pub sway: f32,
    /// Round time until which the bubble does not move
    pub frozen_until_ms: u64,
}

impl Bubble {
    pub fn is_frozen(&self, now_ms: u64) -> bool {
        now_ms < self.frozen_until_ms
    }

    fn contains(&self, x: f32, y: f32) -> bool {
        distance(self.x, self.y, x, y) <= self.size / 2.0
    }
}

fn distance(ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BubbleSnapshot {
    pub difficulty: Difficulty,
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub bubbles: Vec<Bubble>,
    pub combo: u32,
    pub last_kind: BubbleKind,
    pub elapsed_ms: u64,
    pub time_left_ms: u64,
}

pub struct BubbleEngine {
    config: BubbleConfig,
    profile: DifficultyProfile,
    bubbles: Vec<Bubble>,
    next_id: u32,
    elapsed_ms: u64,
    /// Round length including any combo extensions
    round_ms: u64,
    since_spawn_ms: u32,
    last_secs: u32,
    combo: u32,
    last_kind: BubbleKind,
    score: u32,
}

impl BubbleEngine {
    pub fn new(config: BubbleConfig) -> Self {
        let profile = config.difficulty.profile();
        let round_ms = config.round_ms as u64;
        Self {
            config,
            profile,
            bubbles: Vec::new(),
            next_id: 1,
            elapsed_ms: 0,
            round_ms,
            since_spawn_ms: 0,
            last_secs: (round_ms / 1000) as u32,
            combo: 0,
            last_kind: BubbleKind::Normal,
            score: 0,
        }
    }

    /// Start with bubbles already on the canvas
    pub fn with_bubbles(config: BubbleConfig, bubbles: Vec<Bubble>) -> Self {
        let mut engine = Self::new(config);
        engine.next_id = bubbles.iter().map(|b| b.id).max().unwrap_or(0) + 1;
        engine.bubbles = bubbles;
        engine
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn time_left_ms(&self) -> u64 {
        self.round_ms.saturating_sub(self.elapsed_ms)
    }

    /// Rise in pixels per second for a bubble of relative speed `speed`
    fn rise_rate(&self, speed: f32) -> f32 {
        self.config.canvas_height * speed / 4.0
    }

    fn spawn(&mut self, rng: &mut dyn RandomSource) {
        let kind = kind_for_roll(rng.next_unit(), self.profile.special_probability);
        let size = rng.next_range_f32(40.0, 60.0);
        let width = self.config.canvas_width;
        let x = (rng.next_unit() * width).min(width - size).max(size);
        let progress = self.elapsed_ms as f32 / self.round_ms.max(1) as f32;
        let bubble = Bubble {
            id: self.next_id,
            x,
            y: self.config.canvas_height + size / 2.0,
            size,
            kind,
            speed: self.profile.base_speed * (1.0 + progress),
            sway: rng.next_range_f32(0.0, std::f32::consts::TAU),
            frozen_until_ms: 0,
        };
        self.next_id = self.next_id.wrapping_add(1);
        self.bubbles.push(bubble);
    }

    fn rise(&mut self, dt_ms: u32) {
        let now = self.elapsed_ms;
        let secs = dt_ms as f32 / 1000.0;
        for i in 0..self.bubbles.len() {
            let bubble = &self.bubbles[i];
            if bubble.is_frozen(now) {
                continue;
            }
            let dy = self.rise_rate(bubble.speed) * secs;
            self.bubbles[i].y -= dy;
        }
        // Gone once fully past the top edge.
        self.bubbles.retain(|b| b.y + b.size / 2.0 >= 0.0);
    }

    fn find(&self, target: ActivateTarget) -> Option<usize> {
        match target {
            ActivateTarget::Bubble { id } => self.bubbles.iter().position(|b| b.id == id),
            // Latest spawned is drawn on top.
            ActivateTarget::Point { x, y } => self.bubbles.iter().rposition(|b| b.contains(x, y)),
        }
    }

    fn pop(&mut self, idx: usize, events: &mut Vec<GameEvent>) {
        let bubble = self.bubbles.remove(idx);
        let same_kind = bubble.kind == self.last_kind;
        let pop = bubble_pop_points(self.combo, same_kind, bubble.kind == BubbleKind::Special);
        self.combo = pop.combo;
        self.last_kind = bubble.kind;

        events.push(GameEvent::BubblePopped { kind: bubble.kind });
        if pop.combo_bonus > 0 {
            events.push(GameEvent::ComboBonus {
                combo: pop.combo,
                points: pop.combo_bonus,
            });
        }

        match bubble.kind {
            BubbleKind::Ice => {
                let until = self.elapsed_ms + self.config.freeze_ms as u64;
                for b in &mut self.bubbles {
                    b.frozen_until_ms = until;
                }
                events.push(GameEvent::Frozen { until_ms: until });
            }
            BubbleKind::Bomb => {
                let radius = self.config.bomb_radius;
                self.bubbles
                    .retain(|b| distance(b.x, b.y, bubble.x, bubble.y) > radius);
            }
            BubbleKind::Normal | BubbleKind::Special => {}
        }

        self.score = apply_delta(self.score, pop.points);

        let bonus = self.config.combo_time_bonus_ms;
        if bonus > 0 && pop.combo > 0 && pop.combo % COMBO_THRESHOLD == 0 {
            self.round_ms += bonus as u64;
        }
    }
}

impl GameEngine for BubbleEngine {
    type Snapshot = BubbleSnapshot;

    fn game_id(&self) -> &'static str {
        "bubble-pop"
    }

    fn high_score_policy(&self) -> HighScorePolicy {
        HighScorePolicy::EndOfRun
    }

    fn reset(&mut self, _rng: &mut dyn RandomSource) {
        *self = BubbleEngine::new(self.config.clone());
    }

    fn apply_intent(
        &mut self,
        intent: Intent,
        _rng: &mut dyn RandomSource,
        events: &mut Vec<GameEvent>,
    ) -> bool {
        let Intent::Activate { target } = intent else {
            return false;
        };
        if self.is_terminal() {
            return false;
        }
        match self.find(target) {
            Some(idx) => {
                self.pop(idx, events);
                true
            }
            None => false,
        }
    }

    fn tick(&mut self, _buffered: &[Intent], rng: &mut dyn RandomSource, events: &mut Vec<GameEvent>) {
        if self.is_terminal() {
            return;
        }
        let frame = self.config.frame_ms;
        self.elapsed_ms += frame as u64;
        self.rise(frame);

        self.since_spawn_ms += frame;
        if self.since_spawn_ms >= self.profile.spawn_interval_ms {
            self.since_spawn_ms -= self.profile.spawn_interval_ms;
            if self.bubbles.len() < self.profile.max_concurrent {
                self.spawn(rng);
            }
        }

        let secs = self.time_left_ms().div_ceil(1000) as u32;
        if secs != self.last_secs {
            self.last_secs = secs;
            events.push(GameEvent::TimeLeft { secs });
        }
    }

    fn is_terminal(&self) -> bool {
        self.elapsed_ms >= self.round_ms
    }

    fn tick_interval(&self) -> Option<Duration> {
        Some(Duration::from_millis(self.config.frame_ms as u64))
    }

    fn score(&self) -> u32 {
        self.score
    }

    fn snapshot(&self) -> BubbleSnapshot {
        BubbleSnapshot {
            difficulty: self.config.difficulty,
            canvas_width: self.config.canvas_width,
            canvas_height: self.config.canvas_height,
            bubbles: self.bubbles.clone(),
            combo: self.combo,
            last_kind: self.last_kind,
            elapsed_ms: self.elapsed_ms,
            time_left_ms: self.time_left_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SimpleRng;

    fn bubble(id: u32, x: f32, y: f32, kind: BubbleKind) -> Bubble {
        Bubble {
            id,
            x,
            y,
            size: 50.0,
            kind,
            speed: 1.0,
            sway: 0.0,
            frozen_until_ms: 0,
        }
    }

    fn pop_id(engine: &mut BubbleEngine, id: u32) -> Vec<GameEvent> {
        let mut rng = SimpleRng::new(1);
        let mut events = Vec::new();
        assert!(engine.apply_intent(
            Intent::Activate { target: ActivateTarget::Bubble { id } },
            &mut rng,
            &mut events
        ));
        events
    }

    #[test]
    fn test_kind_thresholds() {
        assert_eq!(kind_for_roll(0.0, 0.2), BubbleKind::Special);
        assert_eq!(kind_for_roll(0.099, 0.2), BubbleKind::Special);
        assert_eq!(kind_for_roll(0.1, 0.2), BubbleKind::Ice);
        assert_eq!(kind_for_roll(0.16, 0.2), BubbleKind::Bomb);
        assert_eq!(kind_for_roll(0.2, 0.2), BubbleKind::Normal);
        assert_eq!(kind_for_roll(0.9, 0.2), BubbleKind::Normal);
    }

    #[test]
    fn test_profiles() {
        assert_eq!(Difficulty::Easy.profile().max_concurrent, 8);
        assert_eq!(Difficulty::Normal.profile().spawn_interval_ms, 1000);
        assert_eq!(Difficulty::Hard.profile().special_probability, 0.25);
    }

    #[test]
    fn test_first_pop_of_normal_continues_combo() {
        // The previous kind starts as Normal, so the first Normal pop counts.
        let mut engine = BubbleEngine::with_bubbles(
            BubbleConfig::default(),
            vec![
                bubble(1, 100.0, 100.0, BubbleKind::Normal),
                bubble(2, 300.0, 100.0, BubbleKind::Normal),
                bubble(3, 500.0, 100.0, BubbleKind::Normal),
            ],
        );
        pop_id(&mut engine, 1);
        pop_id(&mut engine, 2);
        assert_eq!(engine.combo(), 2);
        let events = pop_id(&mut engine, 3);
        assert_eq!(engine.combo(), 3);
        assert!(events.contains(&GameEvent::ComboBonus { combo: 3, points: 1 }));
        assert_eq!(engine.score(), 1 + 1 + 2);
    }

    #[test]
    fn test_special_doubles_points() {
        let mut engine = BubbleEngine::with_bubbles(
            BubbleConfig::default(),
            vec![bubble(1, 100.0, 100.0, BubbleKind::Special)],
        );
        pop_id(&mut engine, 1);
        assert_eq!(engine.score(), 2);
        assert_eq!(engine.combo(), 0);
    }

    #[test]
    fn test_ice_freezes_everything() {
        let mut rng = SimpleRng::new(1);
        let mut engine = BubbleEngine::with_bubbles(
            BubbleConfig::default(),
            vec![
                bubble(1, 100.0, 300.0, BubbleKind::Ice),
                bubble(2, 400.0, 300.0, BubbleKind::Normal),
            ],
        );
        let events = pop_id(&mut engine, 1);
        assert!(events.contains(&GameEvent::Frozen { until_ms: 3000 }));

        let mut tick_events = Vec::new();
        engine.tick(&[], &mut rng, &mut tick_events);
        assert_eq!(engine.bubbles()[0].y, 300.0);
    }

    #[test]
    fn test_bomb_clears_neighbours_only() {
        let mut engine = BubbleEngine::with_bubbles(
            BubbleConfig::default(),
            vec![
                bubble(1, 200.0, 200.0, BubbleKind::Bomb),
                bubble(2, 260.0, 200.0, BubbleKind::Normal),
                bubble(3, 200.0, 300.0, BubbleKind::Normal),
                bubble(4, 200.0, 301.0, BubbleKind::Normal),
            ],
        );
        pop_id(&mut engine, 1);
        let left: Vec<u32> = engine.bubbles().iter().map(|b| b.id).collect();
        assert_eq!(left, vec![4]);
        assert_eq!(engine.score(), 1);
    }

    #[test]
    fn test_point_hit_uses_radius() {
        let mut rng = SimpleRng::new(1);
        let mut engine = BubbleEngine::with_bubbles(
            BubbleConfig::default(),
            vec![bubble(7, 100.0, 100.0, BubbleKind::Normal)],
        );
        let mut events = Vec::new();
        let miss = Intent::Activate { target: ActivateTarget::Point { x: 130.0, y: 100.0 } };
        assert!(!engine.apply_intent(miss, &mut rng, &mut events));
        let hit = Intent::Activate { target: ActivateTarget::Point { x: 120.0, y: 110.0 } };
        assert!(engine.apply_intent(hit, &mut rng, &mut events));
        assert!(engine.bubbles().is_empty());
    }

    #[test]
    fn test_rise_rate_and_escape() {
        let mut rng = SimpleRng::new(1);
        let mut engine = BubbleEngine::with_bubbles(
            BubbleConfig::default(),
            vec![bubble(1, 100.0, 10.0, BubbleKind::Normal)],
        );
        let mut events = Vec::new();
        // 600 * 1.0 / 4 = 150 px/s, 7.5 px per 50 ms frame
        engine.tick(&[], &mut rng, &mut events);
        assert!((engine.bubbles()[0].y - 2.5).abs() < 1e-4);
        for _ in 0..5 {
            engine.tick(&[], &mut rng, &mut events);
        }
        assert!(engine.bubbles().iter().all(|b| b.id != 1));
    }

    #[test]
    fn test_spawns_on_interval_up_to_cap() {
        let mut rng = SimpleRng::new(9);
        let config = BubbleConfig {
            difficulty: Difficulty::Easy,
            ..BubbleConfig::default()
        };
        let mut engine = BubbleEngine::new(config);
        let mut events = Vec::new();
        for _ in 0..29 {
            engine.tick(&[], &mut rng, &mut events);
        }
        assert!(engine.bubbles().is_empty());
        engine.tick(&[], &mut rng, &mut events);
        assert_eq!(engine.bubbles().len(), 1);
        let b = &engine.bubbles()[0];
        assert!(b.size >= 40.0 && b.size < 60.0);
        assert!(b.x >= b.size && b.x <= 800.0 - b.size);
    }

    #[test]
    fn test_round_clock_counts_down_and_ends() {
        let mut rng = SimpleRng::new(1);
        let config = BubbleConfig {
            round_ms: 2000,
            ..BubbleConfig::default()
        };
        let mut engine = BubbleEngine::new(config);
        let mut events = Vec::new();
        for _ in 0..40 {
            engine.tick(&[], &mut rng, &mut events);
        }
        let times: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::TimeLeft { secs } => Some(*secs),
                _ => None,
            })
            .collect();
        assert_eq!(times, vec![1, 0]);
        assert!(engine.is_terminal());
    }

    #[test]
    fn test_combo_time_bonus_extends_round() {
        let config = BubbleConfig {
            combo_time_bonus_ms: 2000,
            ..BubbleConfig::default()
        };
        let bubbles = (1..=3).map(|id| bubble(id, 100.0 * id as f32, 100.0, BubbleKind::Normal)).collect();
        let mut engine = BubbleEngine::with_bubbles(config, bubbles);
        for id in 1..=3 {
            pop_id(&mut engine, id);
        }
        assert_eq!(engine.time_left_ms(), 62_000);
    }
}
