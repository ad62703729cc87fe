//! Wall-clock backstop for when ticks stop arriving.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::lifecycle::EndSignal;
use crate::session::MatchRecorder;
use crate::stall::position_digest;

pub struct WatchdogHandle {
    stop_tx: mpsc::Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl WatchdogHandle {
    /// Signals the watchdog and waits for its thread to exit.
    pub fn stop(mut self) {
        if let Err(error) = self.stop_tx.send(()) {
            tracing::debug!("Watchdog stop signal channel is closed: {error}");
        }

        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("Watchdog thread panicked");
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.thread
            .as_ref()
            .map_or(true, |thread| thread.is_finished())
    }
}

enum Wait {
    Elapsed,
    Stopped,
}

fn wait(stop_rx: &mpsc::Receiver<()>, duration: Duration) -> Wait {
    match stop_rx.recv_timeout(duration) {
        Err(RecvTimeoutError::Timeout) => Wait::Elapsed,
        Ok(()) | Err(RecvTimeoutError::Disconnected) => Wait::Stopped,
    }
}

pub fn spawn_watchdog(recorder: Arc<MatchRecorder>) -> WatchdogHandle {
    let (stop_tx, stop_rx) = mpsc::channel::<()>();
    let thread = thread::spawn(move || run_watchdog(&recorder, &stop_rx));

    WatchdogHandle {
        stop_tx,
        thread: Some(thread),
    }
}

fn run_watchdog(recorder: &MatchRecorder, stop_rx: &mpsc::Receiver<()>) {
    let settings = recorder.settings();
    let poll_interval = settings.watchdog_poll_interval();
    let stall_window = settings.watchdog_stall_window();
    let no_combat_ceiling = settings.watchdog_no_combat_ceiling();
    let mut waited_without_combat = Duration::ZERO;

    tracing::info!(
        poll_interval_ms = poll_interval.as_millis() as u64,
        stall_window_ms = stall_window.as_millis() as u64,
        no_combat_ceiling_ms = no_combat_ceiling.as_millis() as u64,
        "Match watchdog started"
    );

    loop {
        if let Wait::Stopped = wait(stop_rx, poll_interval) {
            break;
        }
        if recorder.is_ended() {
            break;
        }

        let signal = if recorder.has_seen_combat() {
            let before = position_digest(&recorder.host().principals());
            if let Wait::Stopped = wait(stop_rx, stall_window) {
                break;
            }
            if recorder.is_ended() {
                break;
            }
            let after = position_digest(&recorder.host().principals());

            (before == after).then_some(EndSignal::WatchdogPositionsFrozen {
                window: stall_window,
            })
        } else {
            waited_without_combat += poll_interval;
            (waited_without_combat > no_combat_ceiling).then_some(EndSignal::WatchdogNoCombat {
                waited: waited_without_combat,
            })
        };

        if let Some(signal) = signal {
            let game_time = recorder.host().game_time();
            tracing::warn!(
                reason = signal.reason(),
                game_time,
                "Watchdog forcing match end"
            );
            recorder.conclude(vec![signal], game_time);
            break;
        }
    }

    tracing::info!("Match watchdog stopped");
}
