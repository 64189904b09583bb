//! Minigames (workspace facade crate).
//!
//! Re-exports the workspace crates under one name so binaries, tests and
//! benches can write `minigames::core::...` and `minigames::runtime::...`.

pub use minigames_core as core;
pub use minigames_engine as engine;
pub use minigames_runtime as runtime;
pub use minigames_types as types;
