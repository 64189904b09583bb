//! Headless simulator (default binary).
//!
//! Runs one game on the tick runtime with the matching autoplayer and prints
//! every published frame as a JSON line on stdout. Settings come from the
//! `MINIGAMES_*` environment variables, overridden by command line flags:
//!
//! ```text
//! minigames-sim [--game snake|tetris|2048|bubble-pop] [--seed N] [--store PATH]
//!               [--difficulty easy|normal|hard] [--mode single|2p|ai]
//!               [--max-frames N]
//! ```

use anyhow::{anyhow, bail, Context, Result};

use minigames::core::bubble::{BubbleConfig, BubbleEngine};
use minigames::core::machine::GameMachine;
use minigames::core::merge::{MergeConfig, MergeEngine};
use minigames::core::rng::{LiveRng, RandomSource};
use minigames::core::snake::{SnakeConfig, SnakeEngine};
use minigames::core::store::{JsonFileScoreStore, MemoryScoreStore, ScoreStore};
use minigames::core::tetris::{TetrisConfig, TetrisEngine};
use minigames::core::GameEngine;
use minigames::engine::pilot::{Autoplay, BubblePilot, MergePilot, SnakePilot, TetrisPilot};
use minigames::runtime::config::parse_number;
use minigames::runtime::{GameKind, Session, SimConfig};
use minigames::types::{GamePhase, Intent};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = parse_args(SimConfig::from_env()?, std::env::args().skip(1))?;
    log::info!(
        "simulating {} (seed {:?}, max frames {:?})",
        config.game.as_str(),
        config.seed,
        config.max_frames
    );

    let mut rng = match config.seed {
        Some(seed) => LiveRng::seeded(seed),
        None => LiveRng::from_entropy(),
    };
    let store: Box<dyn ScoreStore + Send> = match &config.store_path {
        Some(path) => Box::new(JsonFileScoreStore::new(path)),
        None => Box::new(MemoryScoreStore::new()),
    };

    match config.game {
        GameKind::Snake => {
            let snake = SnakeConfig {
                mode: config.snake_mode,
                ..SnakeConfig::default()
            };
            let engine = SnakeEngine::new(snake, &mut rng);
            run(engine, store, rng, SnakePilot::default(), config.max_frames).await
        }
        GameKind::Tetris => {
            let engine = TetrisEngine::new(TetrisConfig::default(), &mut rng);
            run(engine, store, rng, TetrisPilot::default(), config.max_frames).await
        }
        GameKind::Merge => {
            let engine = MergeEngine::new(MergeConfig::default(), &mut rng);
            run(engine, store, rng, MergePilot, config.max_frames).await
        }
        GameKind::Bubble => {
            let bubble = BubbleConfig {
                difficulty: config.difficulty,
                ..BubbleConfig::default()
            };
            let engine = BubbleEngine::new(bubble);
            run(engine, store, rng, BubblePilot::default(), config.max_frames).await
        }
    }
}

fn parse_args(mut config: SimConfig, args: impl IntoIterator<Item = String>) -> Result<SimConfig> {
    let mut args = args.into_iter();
    while let Some(flag) = args.next() {
        let mut value = || {
            args.next()
                .ok_or_else(|| anyhow!("missing value for {}", flag))
        };
        match flag.as_str() {
            "--game" => config.set_game(&value()?)?,
            "--seed" => config.seed = Some(parse_number("--seed", &value()?)?),
            "--store" => config.store_path = Some(value()?.into()),
            "--difficulty" => config.set_difficulty(&value()?)?,
            "--mode" => config.set_snake_mode(&value()?)?,
            "--max-frames" => {
                let n = parse_number("--max-frames", &value()?)?;
                config.max_frames = (n > 0).then_some(n);
            }
            other => bail!("unknown argument '{}'", other),
        }
    }
    Ok(config)
}

async fn run<E, P>(
    engine: E,
    store: Box<dyn ScoreStore + Send>,
    rng: LiveRng,
    mut pilot: P,
    max_frames: Option<u64>,
) -> Result<()>
where
    E: GameEngine + Send + 'static,
    E::Snapshot: Send + 'static,
    P: Autoplay<Board = E::Snapshot>,
{
    let rng: Box<dyn RandomSource + Send> = Box::new(rng);
    let mut session = Session::spawn(GameMachine::new(engine, store, rng));
    session.send(Intent::Start).await?;

    let mut published = 0u64;
    while let Some(report) = session.next_frame().await {
        println!(
            "{}",
            serde_json::to_string(&report).context("could not encode frame")?
        );
        published += 1;

        if report.snapshot.phase == GamePhase::GameOver {
            log::info!("final score {}", report.snapshot.score);
            break;
        }
        if max_frames.is_some_and(|max| published >= max) {
            log::info!("stopping after {} frames", published);
            break;
        }
        if report.snapshot.playable() {
            if let Some(intent) = pilot.next_intent(&report.snapshot.board) {
                session.send(intent).await?;
            }
        }
    }

    let machine = session.shutdown().await?;
    log::info!(
        "session closed in {:?}, high score {}",
        machine.phase(),
        machine.high_score()
    );
    Ok(())
}
