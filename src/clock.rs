use std::time::Duration;

use chrono::Local;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use crate::display::DisplayDriver;

pub const CLOCK_PERIOD: Duration = Duration::from_secs(1);

/// Repaints the clock region every `period` until the renderer goes away.
pub fn spawn_clock(display: DisplayDriver, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if !display.render_clock(Local::now()) {
                debug!("clock ticker stopping");
                break;
            }
        }
    })
}

/// Cancels the ticker and waits for it. Cancellation is the normal outcome;
/// anything else, such as a panic inside the task, is returned.
pub async fn stop_clock(handle: JoinHandle<()>) -> Result<(), JoinError> {
    handle.abort();
    match handle.await {
        Err(err) if !err.is_cancelled() => Err(err),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{HistoryFormat, Region};
    use tokio::sync::mpsc::unbounded_channel;

    #[tokio::test]
    async fn ticks_into_clock_region_only() {
        let (tx, mut rx) = unbounded_channel();
        let handle = spawn_clock(
            DisplayDriver::new(tx, true, HistoryFormat::Table),
            Duration::from_millis(5),
        );

        for _ in 0..3 {
            let update = rx.recv().await.unwrap();
            assert_eq!(update.region, Region::Clock);
            assert!(update.content.starts_with("🕒 "));
        }

        drop(rx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn stopping_a_running_clock_is_clean() {
        let (tx, _rx) = unbounded_channel();
        let handle = spawn_clock(
            DisplayDriver::new(tx, false, HistoryFormat::Table),
            Duration::from_secs(60),
        );
        assert!(stop_clock(handle).await.is_ok());
    }

    #[tokio::test]
    async fn stopping_surfaces_a_panicked_clock() {
        let handle = tokio::spawn(async { panic!("clock broke") });
        while !handle.is_finished() {
            tokio::task::yield_now().await;
        }
        let err = stop_clock(handle).await.unwrap_err();
        assert!(err.is_panic());
    }
}
