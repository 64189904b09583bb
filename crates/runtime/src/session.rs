//! Game session task
//!
//! One tokio task owns one [`GameMachine`]. Intents arrive over a bounded
//! channel, every machine call that changes something is published as a
//! [`FrameReport`], and the tick timer is a `tokio::time::Interval` that is
//! rebuilt whenever the machine asks for a new period and dropped when it asks
//! to cancel. Intents and ticks are handled by the same task, so a tick can
//! never race a `Reset` or land after `GameOver`.

use std::time::Duration;

use anyhow::{anyhow, Context};
use minigames_core::machine::{Frame, GameMachine, Schedule};
use minigames_core::snapshot::FrameReport;
use minigames_core::GameEngine;
use minigames_core::types::Intent;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Default depth of the intent channel
pub const INTENT_QUEUE: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("tick period must be non-zero")]
    ZeroPeriod,
}

/// Build the tick timer for `period`; the first tick fires one period from now
pub fn arm(period: Duration) -> Result<Interval, ScheduleError> {
    if period.is_zero() {
        return Err(ScheduleError::ZeroPeriod);
    }
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Ok(ticker)
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(t) => {
            t.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Handle to a running session
pub struct Session<E: GameEngine> {
    intents: mpsc::Sender<Intent>,
    frames: mpsc::UnboundedReceiver<FrameReport<E::Snapshot>>,
    task: JoinHandle<GameMachine<E>>,
}

impl<E> Session<E>
where
    E: GameEngine + Send + 'static,
    E::Snapshot: Send + 'static,
{
    /// Move the machine onto its own task
    ///
    /// The current snapshot is published right away, before any intent.
    pub fn spawn(machine: GameMachine<E>) -> Self {
        Self::with_capacity(machine, INTENT_QUEUE)
    }

    pub fn with_capacity(machine: GameMachine<E>, capacity: usize) -> Self {
        let (intent_tx, intent_rx) = mpsc::channel(capacity.max(1));
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(drive(machine, intent_rx, frame_tx));
        Self {
            intents: intent_tx,
            frames: frame_rx,
            task,
        }
    }

    pub async fn send(&self, intent: Intent) -> anyhow::Result<()> {
        self.intents
            .send(intent)
            .await
            .map_err(|_| anyhow!("session task has stopped"))
    }

    /// A sender that can be moved to another task
    pub fn sender(&self) -> mpsc::Sender<Intent> {
        self.intents.clone()
    }

    /// Wait for the next published frame; None once the task has stopped
    pub async fn next_frame(&mut self) -> Option<FrameReport<E::Snapshot>> {
        self.frames.recv().await
    }

    /// Next frame if one is already waiting
    pub fn try_frame(&mut self) -> Option<FrameReport<E::Snapshot>> {
        self.frames.try_recv().ok()
    }

    /// Close the intent channel and hand the machine back
    pub async fn shutdown(self) -> anyhow::Result<GameMachine<E>> {
        let Self { intents, frames, task } = self;
        drop(intents);
        drop(frames);
        task.await.context("session task panicked")
    }
}

fn report<E: GameEngine>(machine: &GameMachine<E>, frame: Frame) -> FrameReport<E::Snapshot> {
    FrameReport {
        events: frame.events,
        snapshot: machine.snapshot(),
    }
}

async fn drive<E: GameEngine>(
    mut machine: GameMachine<E>,
    mut intents: mpsc::Receiver<Intent>,
    frames: mpsc::UnboundedSender<FrameReport<E::Snapshot>>,
) -> GameMachine<E> {
    let game = machine.engine().game_id();
    let mut ticker: Option<Interval> = None;

    let initial = FrameReport {
        events: Vec::new(),
        snapshot: machine.snapshot(),
    };
    if frames.send(initial).is_err() {
        return machine;
    }

    loop {
        let frame = tokio::select! {
            biased;
            intent = intents.recv() => match intent {
                Some(intent) => machine.handle(intent),
                None => break,
            },
            _ = next_tick(&mut ticker) => machine.tick(),
        };

        // Ignored and buffered intents publish nothing.
        if frame.is_noop() {
            continue;
        }

        let schedule = frame.schedule;
        if frames.send(report(&machine, frame)).is_err() {
            break;
        }

        match schedule {
            Schedule::Keep => {}
            Schedule::Cancel => {
                if ticker.take().is_some() {
                    log::debug!("[{}] tick timer cancelled", game);
                }
            }
            Schedule::Arm(period) => match arm(period) {
                Ok(t) => ticker = Some(t),
                Err(e) => {
                    log::error!("[{}] could not arm tick timer: {}", game, e);
                    ticker = None;
                    let failed = machine.scheduler_failed();
                    if frames.send(report(&machine, failed)).is_err() {
                        break;
                    }
                }
            },
        }
    }

    log::debug!("[{}] session stopped", game);
    machine
}
