//! Elapsed-time readout shown while a model request is in flight.
//!
//! The readout runs as one tokio task that rewrites a single terminal line
//! every [`TICK`] until it receives a stop signal. The signal is a oneshot
//! channel, so a timer can be stopped at most once; [`ProgressTimer::stop`]
//! also joins the task, after which it never writes again.

use anyhow::{Context, Result};
use std::io::{self, Write};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

pub const TICK: Duration = Duration::from_millis(100);
const PROGRESS_LABEL: &str = "Processing Time: ";

/// Formats a duration as `mm:ss.t`. Minutes keep counting past 59.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_secs = elapsed.as_secs();
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    let tenths = elapsed.subsec_millis() / 100;
    format!("{minutes:02}:{seconds:02}.{tenths}")
}

pub struct ProgressTimer {
    started: Instant,
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<io::Result<()>>,
}

impl ProgressTimer {
    pub fn start<W>(out: W) -> Self
    where
        W: Write + Send + 'static,
    {
        let started = Instant::now();
        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(render_until_stopped(out, started, stop_rx));
        Self {
            started,
            stop_tx,
            handle,
        }
    }

    /// Signals the display task, waits for it to exit and returns the elapsed time.
    pub async fn stop(self) -> Result<Duration> {
        // The receiver is only gone if the task already ended; joining reports why.
        let _ = self.stop_tx.send(());
        self.handle
            .await
            .context("Progress timer task panicked")?
            .context("Failed to write progress timer")?;

        let elapsed = self.started.elapsed();
        debug!(elapsed = ?elapsed, "progress timer stopped");
        Ok(elapsed)
    }
}

async fn render_until_stopped<W: Write>(
    mut out: W,
    started: Instant,
    mut stop_rx: oneshot::Receiver<()>,
) -> io::Result<()> {
    let mut ticker = time::interval(TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // The first tick is immediate, so even a fast reply shows one readout.
    ticker.tick().await;
    render(&mut out, started)?;

    loop {
        tokio::select! {
            biased;
            _ = &mut stop_rx => break,
            _ = ticker.tick() => render(&mut out, started)?,
        }
    }

    Ok(())
}

fn render<W: Write>(out: &mut W, started: Instant) -> io::Result<()> {
    write!(out, "\r{PROGRESS_LABEL}{}", format_elapsed(started.elapsed()))?;
    out.flush()
}
