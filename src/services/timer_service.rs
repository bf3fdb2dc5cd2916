//! The timer contract: a timeout event eventually arrives for every armed
//! window, tagged with the arming token so the engine can discard it once
//! the phase has moved on. Arming replaces (and aborts) the previous
//! window; cancellation on phase exit keeps dead timers from firing at all.

use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use crate::state::{AppState, QueuedSignal, game::TimerToken};

/// Arm a countdown that reports `token` on the merged event queue after
/// `duration`. Any previously armed countdown is aborted.
pub fn arm(state: &AppState, token: TimerToken, duration: Duration) {
    let tx = state.signal_sender();
    let handle = tokio::spawn(async move {
        sleep(duration).await;
        debug!(%token, "timer elapsed");
        let _ = tx.send(QueuedSignal::Timeout(token));
    });
    state.store_timer(handle.abort_handle());
}

/// Abort the outstanding countdown, if any.
pub fn cancel(state: &AppState) {
    state.clear_timer();
}
