//! RNG module - the single source of uniform randomness for every engine
//!
//! Engines never reach for a global generator: each game instance owns one
//! [`RandomSource`] and passes it down by `&mut`. Two implementations exist:
//!
//! - [`SimpleRng`]: tiny LCG, fully deterministic from its seed (tests, benches)
//! - [`LiveRng`]: PCG32 from `rand_pcg`, seeded from the OS for real play
//!
//! Also provides the Tetris piece queue (uniform draw or 7-bag).

use std::collections::VecDeque;

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::types::PieceKind;

/// Uniform randomness consumed by the engines
pub trait RandomSource {
    /// Next raw 32-bit value
    fn next_u32(&mut self) -> u32;

    /// Uniform integer in `[0, bound)`; returns 0 when `bound` is 0
    fn next_below(&mut self, bound: u32) -> u32 {
        // Multiply-shift keeps the high bits, which are the good ones for an LCG.
        ((self.next_u32() as u64 * bound as u64) >> 32) as u32
    }

    /// Uniform float in `[0, 1)`
    fn next_unit(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// True with probability `p`
    fn chance(&mut self, p: f32) -> bool {
        self.next_unit() < p
    }

    /// Uniform float in `[lo, hi)`
    fn next_range_f32(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.next_unit()
    }
}

/// Pick a uniformly random element, or None for an empty slice
pub fn choose<'a, T>(rng: &mut dyn RandomSource, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(rng.next_below(items.len() as u32) as usize)
}

/// Shuffle a slice using Fisher-Yates
pub fn shuffle<T>(rng: &mut dyn RandomSource, slice: &mut [T]) {
    for i in (1..slice.len()).rev() {
        let j = rng.next_below((i + 1) as u32) as usize;
        slice.swap(i, j);
    }
}

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Current internal state (re-seeding with it continues the sequence)
    pub fn state(&self) -> u32 {
        self.state
    }
}

impl RandomSource for SimpleRng {
    fn next_u32(&mut self) -> u32 {
        // LCG formula: (a * state + c) mod m
        // Using Numerical Recipes constants: a=1664525, c=1013904223, m=2^32
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }
}

/// PCG32 generator for live play
#[derive(Debug, Clone)]
pub struct LiveRng {
    inner: Pcg32,
}

impl LiveRng {
    /// Seed from the thread-local OS-backed generator
    pub fn from_entropy() -> Self {
        Self {
            inner: Pcg32::from_rng(&mut rand::rng()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: Pcg32::seed_from_u64(seed),
        }
    }
}

impl RandomSource for LiveRng {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }
}

/// How the next tetromino is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PieceRandomizer {
    /// Each piece independently uniform over the seven kinds
    #[default]
    Uniform,
    /// Shuffled bags of all seven kinds
    SevenBag,
}

/// Upcoming tetromino queue with a fixed-length preview
#[derive(Debug, Clone)]
pub struct PieceQueue {
    randomizer: PieceRandomizer,
    preview: usize,
    queue: VecDeque<PieceKind>,
}

impl PieceQueue {
    pub fn new(randomizer: PieceRandomizer, preview: usize, rng: &mut dyn RandomSource) -> Self {
        let mut queue = Self {
            randomizer,
            preview,
            queue: VecDeque::with_capacity(preview + PieceKind::ALL.len()),
        };
        queue.refill(rng);
        queue
    }

    /// Keep at least `preview + 1` pieces buffered so peeking never needs the RNG
    fn refill(&mut self, rng: &mut dyn RandomSource) {
        while self.queue.len() <= self.preview {
            match self.randomizer {
                PieceRandomizer::Uniform => {
                    let idx = rng.next_below(PieceKind::ALL.len() as u32) as usize;
                    self.queue.push_back(PieceKind::ALL[idx]);
                }
                PieceRandomizer::SevenBag => {
                    let mut bag = PieceKind::ALL;
                    shuffle(rng, &mut bag);
                    self.queue.extend(bag);
                }
            }
        }
    }

    /// Peek at the next piece without removing it
    pub fn peek(&self) -> Option<PieceKind> {
        self.queue.front().copied()
    }

    /// The next `preview` pieces, oldest first
    pub fn preview(&self) -> Vec<PieceKind> {
        self.queue.iter().take(self.preview).copied().collect()
    }

    /// Draw the next piece from the queue
    pub fn draw(&mut self, rng: &mut dyn RandomSource) -> PieceKind {
        self.refill(rng);
        let piece = self.queue.pop_front().unwrap_or(PieceKind::I);
        self.refill(rng);
        piece
    }
}
