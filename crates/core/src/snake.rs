//! Snake engine - one or two snakes on a bounded grid
//!
//! Each tick every snake advances one cell in its current direction. Direction
//! changes are buffered by the state machine and applied at the start of the
//! tick; a change to the opposite direction is ignored. Running into a wall, a
//! body or the other snake ends the run. Eating grows the snake by one segment,
//! scores one point and moves the food to a uniformly random empty cell.
//!
//! Modes:
//! - `Single`: player one only
//! - `TwoPlayers`: both seats driven by intents
//! - `VersusAi`: seat two is steered by [`ai_direction`]

use std::collections::VecDeque;
use std::time::Duration;

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use crate::board::{Board, Position};
use crate::engine::GameEngine;
use crate::rng::{choose, RandomSource};
use crate::scoring::{apply_delta, HighScorePolicy, SpeedCurve};
use crate::types::{
    Direction, GameEvent, Intent, Player, MAX_PLAYERS, SNAKE_BASE_INTERVAL_MS, SNAKE_GRID_SIZE,
    SNAKE_MIN_INTERVAL_MS, SNAKE_SAFE_MARGIN, SNAKE_SPEED_DECREMENT_MS, SNAKE_SPEED_STEP,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SnakeMode {
    #[default]
    Single,
    TwoPlayers,
    VersusAi,
}

impl SnakeMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "single" | "1p" => Some(SnakeMode::Single),
            "twoplayers" | "2p" => Some(SnakeMode::TwoPlayers),
            "versusai" | "ai" => Some(SnakeMode::VersusAi),
            _ => None,
        }
    }

    fn players(self) -> usize {
        match self {
            SnakeMode::Single => 1,
            SnakeMode::TwoPlayers | SnakeMode::VersusAi => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SnakeConfig {
    pub width: u16,
    pub height: u16,
    pub mode: SnakeMode,
    /// Tick interval over player one's score
    pub speed: SpeedCurve,
    /// Player one spawns at least this far from every wall
    pub safe_margin: u16,
}

impl Default for SnakeConfig {
    fn default() -> Self {
        Self {
            width: SNAKE_GRID_SIZE,
            height: SNAKE_GRID_SIZE,
            mode: SnakeMode::Single,
            speed: SpeedCurve {
                base_ms: SNAKE_BASE_INTERVAL_MS,
                step: SNAKE_SPEED_STEP,
                decrement_ms: SNAKE_SPEED_DECREMENT_MS,
                min_ms: SNAKE_MIN_INTERVAL_MS,
            },
            safe_margin: SNAKE_SAFE_MARGIN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snake {
    /// Head first
    segments: VecDeque<Position>,
    direction: Direction,
    score: u32,
}

impl Snake {
    pub fn new(segments: impl IntoIterator<Item = Position>, direction: Direction) -> Self {
        Self {
            segments: segments.into_iter().collect(),
            direction,
            score: 0,
        }
    }

    pub fn head(&self) -> Position {
        self.segments.front().copied().unwrap_or_default()
    }

    pub fn segments(&self) -> &VecDeque<Position> {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Change heading unless it would reverse onto the neck
    pub fn steer(&mut self, direction: Direction) -> bool {
        if direction == self.direction.opposite() {
            return false;
        }
        self.direction = direction;
        true
    }

    fn next_head(&self, direction: Direction) -> Position {
        self.head().offset(direction.delta())
    }

    fn occupies(&self, pos: Position) -> bool {
        self.segments.contains(&pos)
    }
}

/// Collision rule for a proposed head position
///
/// Blocked when outside the grid, on one of the snake's own segments (the tail
/// counts only when the snake grows this tick, since it vacates otherwise), or
/// anywhere on another snake.
pub fn is_blocked(
    snake: &Snake,
    proposed: Position,
    growing: bool,
    others: &[&Snake],
    width: u16,
    height: u16,
) -> bool {
    if proposed.x < 0 || proposed.y < 0 || proposed.x >= width as i32 || proposed.y >= height as i32
    {
        return true;
    }
    let own = if growing {
        snake.segments.len()
    } else {
        snake.segments.len().saturating_sub(1)
    };
    if snake.segments.iter().take(own).any(|&p| p == proposed) {
        return true;
    }
    others.iter().any(|other| other.occupies(proposed))
}

/// Greedy heading toward the food
///
/// Considers every non-reversing direction whose next cell is not blocked and
/// picks the one closest to the food by Manhattan distance, ties broken in the
/// order Up, Down, Left, Right. Keeps the current heading when nothing is safe.
pub fn ai_direction(
    snake: &Snake,
    food: Option<Position>,
    others: &[&Snake],
    width: u16,
    height: u16,
) -> Direction {
    let target = food.unwrap_or_else(|| snake.head());
    let candidates: ArrayVec<(Direction, u32), 4> = Direction::ALL
        .into_iter()
        .filter(|&d| d != snake.direction.opposite())
        .filter_map(|d| {
            let next = snake.next_head(d);
            let growing = Some(next) == food;
            if is_blocked(snake, next, growing, others, width, height) {
                None
            } else {
                Some((d, next.manhattan(target)))
            }
        })
        .collect();

    candidates
        .iter()
        .fold(None, |best: Option<(Direction, u32)>, &(d, dist)| match best {
            Some((_, best_dist)) if best_dist <= dist => best,
            _ => Some((d, dist)),
        })
        .map_or(snake.direction, |(d, _)| d)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SnakeCell {
    Head(Player),
    Body(Player),
    Food,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnakeView {
    pub player: Player,
    pub segments: Vec<Position>,
    pub direction: Direction,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnakeSnapshot {
    pub mode: SnakeMode,
    pub width: u16,
    pub height: u16,
    pub snakes: Vec<SnakeView>,
    pub food: Option<Position>,
    pub cells: Board<SnakeCell>,
}

pub struct SnakeEngine {
    config: SnakeConfig,
    snakes: ArrayVec<Snake, MAX_PLAYERS>,
    food: Option<Position>,
    over: bool,
}

const SEATS: [Player; MAX_PLAYERS] = [Player::One, Player::Two];

impl SnakeEngine {
    pub fn new(config: SnakeConfig, rng: &mut dyn RandomSource) -> Self {
        let mut engine = Self {
            config,
            snakes: ArrayVec::new(),
            food: None,
            over: false,
        };
        engine.populate(rng);
        engine
    }

    /// Start from given snakes (player one first) and food
    pub fn from_parts(config: SnakeConfig, snakes: Vec<Snake>, food: Option<Position>) -> Self {
        let snakes = snakes.into_iter().take(MAX_PLAYERS).collect();
        Self {
            config,
            snakes,
            food,
            over: false,
        }
    }

    pub fn config(&self) -> &SnakeConfig {
        &self.config
    }

    pub fn snake(&self, player: Player) -> Option<&Snake> {
        self.snakes.get(player.index())
    }

    pub fn food(&self) -> Option<Position> {
        self.food
    }

    fn populate(&mut self, rng: &mut dyn RandomSource) {
        let (w, h) = (self.config.width, self.config.height);
        self.snakes.clear();
        self.snakes.push(Snake::new(
            [Position::new(
                spawn_coord(rng, w, self.config.safe_margin),
                spawn_coord(rng, h, self.config.safe_margin),
            )],
            Direction::Right,
        ));
        if self.config.mode.players() > 1 {
            let second = Position::new(w as i32 - 4, h as i32 - 4);
            if self.snakes[0].head() != second {
                self.snakes.push(Snake::new([second], Direction::Left));
            }
        }
        self.over = false;
        self.food = None;
        if !self.relocate_food(rng) {
            self.over = true;
        }
    }

    fn grid(&self) -> Board<SnakeCell> {
        let mut grid = Board::new(self.config.width, self.config.height);
        for (snake, &player) in self.snakes.iter().zip(SEATS.iter()) {
            for (i, &p) in snake.segments.iter().enumerate() {
                let cell = if i == 0 {
                    SnakeCell::Head(player)
                } else {
                    SnakeCell::Body(player)
                };
                grid.set_at(p, Some(cell));
            }
        }
        if let Some(food) = self.food {
            grid.set_at(food, Some(SnakeCell::Food));
        }
        grid
    }

    /// Move the food to a random empty cell; false when the board is full
    fn relocate_food(&mut self, rng: &mut dyn RandomSource) -> bool {
        self.food = None;
        let empty = self.grid().empty_cells();
        self.food = choose(rng, &empty).copied();
        self.food.is_some()
    }

    fn others(&self, idx: usize) -> ArrayVec<&Snake, MAX_PLAYERS> {
        self.snakes
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != idx)
            .map(|(_, s)| s)
            .collect()
    }

    fn steer_from(&mut self, buffered: &[Intent]) {
        for intent in buffered {
            if let Intent::Move { player, direction } = *intent {
                let human = match player {
                    Player::One => true,
                    Player::Two => self.config.mode == SnakeMode::TwoPlayers,
                };
                if !human {
                    continue;
                }
                if let Some(snake) = self.snakes.get_mut(player.index()) {
                    snake.steer(direction);
                }
            }
        }
        if self.config.mode == SnakeMode::VersusAi && self.snakes.len() > 1 {
            let dir = {
                let others = self.others(1);
                ai_direction(
                    &self.snakes[1],
                    self.food,
                    &others,
                    self.config.width,
                    self.config.height,
                )
            };
            self.snakes[1].steer(dir);
        }
    }

    fn debug_check(&self) {
        if cfg!(debug_assertions) {
            let mut seen = std::collections::HashSet::new();
            for snake in &self.snakes {
                for p in &snake.segments {
                    debug_assert!(
                        p.x >= 0
                            && p.y >= 0
                            && p.x < self.config.width as i32
                            && p.y < self.config.height as i32,
                        "segment {:?} out of bounds",
                        p
                    );
                    debug_assert!(seen.insert(*p), "segment {:?} overlaps", p);
                }
            }
        }
    }
}

/// Random coordinate at least `margin` cells from both walls, or the centre on
/// boards too small for the margin
fn spawn_coord(rng: &mut dyn RandomSource, size: u16, margin: u16) -> i32 {
    let span = size.saturating_sub(margin.saturating_mul(2));
    if span == 0 {
        return size as i32 / 2;
    }
    (margin as u32 + rng.next_below(span as u32)) as i32
}

impl GameEngine for SnakeEngine {
    type Snapshot = SnakeSnapshot;

    fn game_id(&self) -> &'static str {
        "snake"
    }

    fn high_score_policy(&self) -> HighScorePolicy {
        HighScorePolicy::Continuous
    }

    fn reset(&mut self, rng: &mut dyn RandomSource) {
        self.populate(rng);
    }

    fn buffers(&self, intent: &Intent) -> bool {
        matches!(intent, Intent::Move { .. })
    }

    fn apply_intent(
        &mut self,
        _intent: Intent,
        _rng: &mut dyn RandomSource,
        _events: &mut Vec<GameEvent>,
    ) -> bool {
        false
    }

    fn tick(&mut self, buffered: &[Intent], rng: &mut dyn RandomSource, events: &mut Vec<GameEvent>) {
        if self.over {
            return;
        }
        self.steer_from(buffered);

        let (w, h) = (self.config.width, self.config.height);
        let heads: ArrayVec<Position, MAX_PLAYERS> = self
            .snakes
            .iter()
            .map(|s| s.next_head(s.direction))
            .collect();

        let mut lost = false;
        for (idx, &next) in heads.iter().enumerate() {
            let growing = Some(next) == self.food;
            let others = self.others(idx);
            let head_on = heads
                .iter()
                .enumerate()
                .any(|(j, &other)| j != idx && other == next);
            if head_on || is_blocked(&self.snakes[idx], next, growing, &others, w, h) {
                events.push(GameEvent::PlayerLost {
                    player: SEATS[idx],
                });
                lost = true;
            }
        }
        if lost {
            self.over = true;
            return;
        }

        let mut ate = false;
        for (idx, &next) in heads.iter().enumerate() {
            let snake = &mut self.snakes[idx];
            snake.segments.push_front(next);
            if Some(next) == self.food {
                snake.score = apply_delta(snake.score, 1);
                events.push(GameEvent::FoodEaten { player: SEATS[idx] });
                ate = true;
            } else {
                snake.segments.pop_back();
            }
        }
        if ate && !self.relocate_food(rng) {
            log::debug!("snake: board full, no room for food");
            self.over = true;
        }
        self.debug_check();
    }

    fn is_terminal(&self) -> bool {
        self.over
    }

    fn tick_interval(&self) -> Option<Duration> {
        Some(Duration::from_millis(
            self.config.speed.interval_ms(self.score()) as u64,
        ))
    }

    fn score(&self) -> u32 {
        self.snakes.first().map_or(0, |s| s.score)
    }

    fn snapshot(&self) -> SnakeSnapshot {
        SnakeSnapshot {
            mode: self.config.mode,
            width: self.config.width,
            height: self.config.height,
            snakes: self
                .snakes
                .iter()
                .zip(SEATS.iter())
                .map(|(s, &player)| SnakeView {
                    player,
                    segments: s.segments.iter().copied().collect(),
                    direction: s.direction,
                    score: s.score,
                })
                .collect(),
            food: self.food,
            cells: self.grid(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SimpleRng;

    fn single(segments: &[(i32, i32)], direction: Direction, food: (i32, i32)) -> SnakeEngine {
        SnakeEngine::from_parts(
            SnakeConfig::default(),
            vec![Snake::new(
                segments.iter().map(|&(x, y)| Position::new(x, y)),
                direction,
            )],
            Some(Position::new(food.0, food.1)),
        )
    }

    #[test]
    fn test_new_game_spawns_inside_margin() {
        let mut rng = SimpleRng::new(42);
        for _ in 0..20 {
            let engine = SnakeEngine::new(SnakeConfig::default(), &mut rng);
            let head = engine.snake(Player::One).map(|s| s.head()).unwrap_or_default();
            assert!((4..16).contains(&head.x));
            assert!((4..16).contains(&head.y));
            assert_ne!(engine.food(), Some(head));
            assert!(engine.snake(Player::Two).is_none());
        }
    }

    #[test]
    fn test_two_player_seat_placement() {
        let mut rng = SimpleRng::new(8);
        let config = SnakeConfig {
            mode: SnakeMode::TwoPlayers,
            ..SnakeConfig::default()
        };
        let engine = SnakeEngine::new(config, &mut rng);
        let two = engine.snake(Player::Two);
        assert_eq!(two.map(|s| s.head()), Some(Position::new(16, 16)));
        assert_eq!(two.map(|s| s.direction()), Some(Direction::Left));
    }

    #[test]
    fn test_moves_forward_without_growing() {
        let mut rng = SimpleRng::new(1);
        let mut engine = single(&[(5, 5), (4, 5)], Direction::Right, (0, 0));
        let mut events = Vec::new();
        engine.tick(&[], &mut rng, &mut events);
        let snake = engine.snake(Player::One).unwrap();
        assert_eq!(snake.head(), Position::new(6, 5));
        assert_eq!(snake.len(), 2);
        assert!(events.is_empty());
    }

    #[test]
    fn test_reversal_is_ignored() {
        let mut rng = SimpleRng::new(1);
        let mut engine = single(&[(5, 5), (4, 5)], Direction::Right, (0, 0));
        let mut events = Vec::new();
        engine.tick(&[Intent::step(Direction::Left)], &mut rng, &mut events);
        assert_eq!(engine.snake(Player::One).map(|s| s.head()), Some(Position::new(6, 5)));
        assert!(!engine.is_terminal());
    }

    #[test]
    fn test_wall_collision_ends_run() {
        let mut rng = SimpleRng::new(1);
        let mut engine = single(&[(19, 3)], Direction::Right, (0, 0));
        let mut events = Vec::new();
        engine.tick(&[], &mut rng, &mut events);
        assert!(engine.is_terminal());
        assert_eq!(events, vec![GameEvent::PlayerLost { player: Player::One }]);
        // The snake does not move into the wall.
        assert_eq!(engine.snake(Player::One).map(|s| s.head()), Some(Position::new(19, 3)));
    }

    #[test]
    fn test_chasing_own_tail_is_allowed() {
        // A 2x2 loop: the head moves into the cell the tail is leaving.
        let snake = Snake::new(
            [
                Position::new(1, 0),
                Position::new(1, 1),
                Position::new(0, 1),
                Position::new(0, 0),
            ],
            Direction::Left,
        );
        assert!(!is_blocked(&snake, Position::new(0, 0), false, &[], 20, 20));
        assert!(is_blocked(&snake, Position::new(0, 0), true, &[], 20, 20));
        assert!(is_blocked(&snake, Position::new(1, 1), false, &[], 20, 20));
    }

    #[test]
    fn test_other_snake_blocks() {
        let me = Snake::new([Position::new(5, 5)], Direction::Right);
        let other = Snake::new([Position::new(6, 5), Position::new(7, 5)], Direction::Left);
        assert!(is_blocked(&me, Position::new(6, 5), false, &[&other], 20, 20));
        assert!(is_blocked(&me, Position::new(7, 5), false, &[&other], 20, 20));
        assert!(!is_blocked(&me, Position::new(5, 4), false, &[&other], 20, 20));
    }

    #[test]
    fn test_ai_prefers_closest_and_breaks_ties_in_order() {
        let snake = Snake::new([Position::new(5, 5)], Direction::Right);
        // Food straight down.
        assert_eq!(ai_direction(&snake, Some(Position::new(5, 9)), &[], 20, 20), Direction::Down);
        // Up and Right both reduce the distance by one: Up wins the tie.
        assert_eq!(ai_direction(&snake, Some(Position::new(8, 2)), &[], 20, 20), Direction::Up);
    }

    #[test]
    fn test_ai_never_reverses_and_keeps_heading_when_trapped() {
        let snake = Snake::new([Position::new(5, 5), Position::new(6, 5)], Direction::Left);
        // Food behind: reversing is not an option.
        let dir = ai_direction(&snake, Some(Position::new(9, 5)), &[], 20, 20);
        assert_ne!(dir, Direction::Right);

        let cornered = Snake::new([Position::new(0, 0)], Direction::Left);
        let wall = Snake::new([Position::new(0, 1), Position::new(1, 1), Position::new(1, 0)], Direction::Up);
        assert_eq!(ai_direction(&cornered, Some(Position::new(9, 9)), &[&wall], 20, 20), Direction::Left);
    }

    #[test]
    fn test_versus_ai_steers_seat_two() {
        let mut rng = SimpleRng::new(1);
        let config = SnakeConfig {
            mode: SnakeMode::VersusAi,
            ..SnakeConfig::default()
        };
        let mut engine = SnakeEngine::from_parts(
            config,
            vec![
                Snake::new([Position::new(2, 2)], Direction::Right),
                Snake::new([Position::new(10, 10)], Direction::Left),
            ],
            Some(Position::new(10, 14)),
        );
        let mut events = Vec::new();
        // Seat two ignores human input in this mode.
        let up = Intent::Move { player: Player::Two, direction: Direction::Up };
        engine.tick(&[up], &mut rng, &mut events);
        assert_eq!(engine.snake(Player::Two).map(|s| s.head()), Some(Position::new(10, 11)));
    }

    #[test]
    fn test_second_player_score_is_separate() {
        let mut rng = SimpleRng::new(1);
        let config = SnakeConfig {
            mode: SnakeMode::TwoPlayers,
            ..SnakeConfig::default()
        };
        let mut engine = SnakeEngine::from_parts(
            config,
            vec![
                Snake::new([Position::new(2, 2)], Direction::Right),
                Snake::new([Position::new(10, 10)], Direction::Left),
            ],
            Some(Position::new(9, 10)),
        );
        let mut events = Vec::new();
        engine.tick(&[], &mut rng, &mut events);
        assert_eq!(events, vec![GameEvent::FoodEaten { player: Player::Two }]);
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.snake(Player::Two).map(|s| s.score()), Some(1));
    }

    #[test]
    fn test_full_board_ends_run() {
        let mut rng = SimpleRng::new(1);
        let config = SnakeConfig {
            width: 2,
            height: 2,
            safe_margin: 0,
            ..SnakeConfig::default()
        };
        let mut engine = SnakeEngine::from_parts(
            config,
            vec![Snake::new(
                [Position::new(0, 1), Position::new(0, 0), Position::new(1, 0)],
                Direction::Right,
            )],
            Some(Position::new(1, 1)),
        );
        let mut events = Vec::new();
        engine.tick(&[], &mut rng, &mut events);
        assert_eq!(engine.score(), 1);
        assert_eq!(engine.food(), None);
        assert!(engine.is_terminal());
    }

    #[test]
    fn test_speed_follows_player_one_score() {
        let mut engine = single(&[(5, 5)], Direction::Right, (6, 5));
        assert_eq!(engine.tick_interval(), Some(Duration::from_millis(200)));
        if let Some(s) = engine.snakes.get_mut(0) {
            s.score = 5;
        }
        assert_eq!(engine.tick_interval(), Some(Duration::from_millis(190)));
    }

    #[test]
    fn test_oversized_margin_spawns_in_centre() {
        let mut rng = SimpleRng::new(1);
        assert_eq!(spawn_coord(&mut rng, 20, u16::MAX), 10);
        let config = SnakeConfig {
            safe_margin: 40_000,
            ..SnakeConfig::default()
        };
        let centre = Position::new(config.width as i32 / 2, config.height as i32 / 2);
        let engine = SnakeEngine::new(config, &mut rng);
        assert_eq!(engine.snake(Player::One).map(|s| s.head()), Some(centre));
    }
}
