//! Tick loop and command channel.
use std::io::BufRead;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use telemu_engine::SharedEmulator;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use crate::commands::{self, Outcome};
use crate::report::{OutputTarget, StatsRecord};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub interval: Duration,
    pub ticks: Option<u64>,
    pub report_every: Option<u64>,
    pub driver: String,
    pub vin: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub records: u64,
}

/// Spawn a reader thread forwarding stdin lines. A plain thread is used
/// because a blocked stdin read must not hold up runtime shutdown.
pub fn stdin_lines() -> Result<mpsc::Receiver<String>> {
    let (tx, rx) = mpsc::channel(32);
    thread::Builder::new()
        .name("telemu-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
        })
        .context("failed to spawn stdin reader")?;
    Ok(rx)
}

/// Apply incoming command lines through the shared handle; `/stats`
/// requests are forwarded to the tick loop, which owns the output.
async fn handle_commands(
    shared: SharedEmulator,
    mut lines: mpsc::Receiver<String>,
    stats: mpsc::Sender<()>,
) {
    while let Some(line) = lines.recv().await {
        if line.trim().is_empty() {
            continue;
        }
        let command = match commands::parse(&line) {
            Ok(command) => command,
            Err(err) => {
                log::warn!("ignoring command: {err:#}");
                continue;
            }
        };
        match shared.with(|emu| commands::apply(emu, &command)) {
            Ok(Outcome::Done) => {}
            Ok(Outcome::Refused) => log::warn!("command refused: {}", line.trim()),
            Ok(Outcome::EmitStats) => {
                if stats.send(()).await.is_err() {
                    break;
                }
            }
            Err(err) => log::warn!("command rejected: {err:#}"),
        }
    }
}

/// Drive the emulator until Ctrl-C or the tick limit. Each tick advances
/// simulated time by the wall time measured since the previous one.
pub async fn run(
    shared: SharedEmulator,
    options: RunOptions,
    commands: Option<mpsc::Receiver<String>>,
    mut output: OutputTarget,
) -> Result<RunSummary> {
    let (stats_tx, mut stats_rx) = mpsc::channel(8);
    if let Some(lines) = commands {
        tokio::spawn(handle_commands(shared.clone(), lines, stats_tx));
    } else {
        drop(stats_tx);
    }

    let mut interval = tokio::time::interval(options.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut summary = RunSummary::default();
    let mut last = Instant::now();
    loop {
        tokio::select! {
            now = interval.tick() => {
                let dt = now.duration_since(last).as_secs_f64();
                last = now;
                if dt <= 0.0 {
                    continue;
                }
                shared.with(|emu| emu.update(dt))?;
                summary.ticks += 1;

                if options
                    .report_every
                    .is_some_and(|every| every > 0 && summary.ticks % every == 0)
                {
                    emit(&mut output, &shared, &options)?;
                    summary.records += 1;
                }
                if options.ticks.is_some_and(|limit| summary.ticks >= limit) {
                    log::info!("tick limit reached after {} ticks", summary.ticks);
                    break;
                }
            }
            Some(()) = stats_rx.recv() => {
                emit(&mut output, &shared, &options)?;
                summary.records += 1;
            }
            _ = &mut shutdown => {
                log::info!("shutting down after {} ticks", summary.ticks);
                break;
            }
        }
    }
    Ok(summary)
}

fn emit(output: &mut OutputTarget, shared: &SharedEmulator, options: &RunOptions) -> Result<()> {
    let record = StatsRecord::now(&options.driver, &options.vin, shared.snapshot());
    output.emit(&record)
}
