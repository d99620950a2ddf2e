//! Watch command: pull on a fixed interval until interrupted.
//!
//! Waits `loopStartDelay` milliseconds, then pulls, sleeping the interval
//! between runs. Failures recorded in a pass are reported and the loop
//! continues; a connection failure ends it.

use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};

use crate::cli::SelectionArgs;
use crate::cli::commands::sync::{cancel_on_ctrl_c, load_run_context, report};
use crate::config::SyncMethod;
use crate::error::{Error, Result};
use crate::remote::MongoStore;
use crate::sync::{CancelFlag, SyncEngine};

/// Sleep for `duration`, waking early if `cancel` is set.
///
/// Returns false if the sleep was cut short.
async fn sleep_unless_cancelled(duration: Duration, cancel: &CancelFlag) -> bool {
    const TICK: Duration = Duration::from_millis(100);

    let deadline = tokio::time::Instant::now() + duration;
    while tokio::time::Instant::now() < deadline {
        if cancel.is_cancelled() {
            return false;
        }
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        tokio::time::sleep(remaining.min(TICK)).await;
    }
    !cancel.is_cancelled()
}

/// Execute the watch command.
///
/// # Errors
///
/// Returns an error if the configuration is unusable, no interval is set,
/// the remote store is unreachable, or the loop was interrupted.
pub fn execute(
    args: &SelectionArgs,
    interval: Option<u64>,
    config_path: Option<&Path>,
    mirror: Option<&Path>,
    json: bool,
) -> Result<()> {
    let ctx = load_run_context(args, config_path, mirror)?;

    let interval_ms = interval
        .or(ctx.config.method_specific_settings.interval)
        .ok_or_else(|| {
            Error::Config(
                "No interval: set methodSpecificSettings.interval or pass --interval".into(),
            )
        })?;
    if interval_ms == 0 {
        return Err(Error::InvalidArgument("interval must be greater than zero".into()));
    }
    if ctx.config.method != SyncMethod::Pai {
        warn!(method = %ctx.config.method, "Watching with a non-interval sync method");
    }

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;

    rt.block_on(async {
        let cancel = CancelFlag::new();
        cancel_on_ctrl_c(&cancel);
        let engine = SyncEngine::new(MongoStore).with_cancel_flag(cancel.clone());

        let start_delay = Duration::from_millis(ctx.config.loop_start_delay);
        let interval = Duration::from_millis(interval_ms);

        info!(
            method = %ctx.config.method,
            start_delay_ms = ctx.config.loop_start_delay,
            interval_ms,
            "Watch started"
        );

        if !sleep_unless_cancelled(start_delay, &cancel).await {
            return Err(Error::Cancelled);
        }

        let mut pass: u64 = 0;
        loop {
            pass += 1;
            let summary = engine.pull(&ctx.selection, &ctx.mirror_root).await?;
            info!(pass, clean = summary.is_clean(), "Watch pass finished");
            report(&summary, &ctx.mirror_root, json)?;

            if summary.cancelled || !sleep_unless_cancelled(interval, &cancel).await {
                return Err(Error::Cancelled);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sleep_completes() {
        let cancel = CancelFlag::new();
        assert!(sleep_unless_cancelled(Duration::from_millis(5), &cancel).await);
    }

    #[tokio::test]
    async fn test_sleep_stops_when_cancelled() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        assert!(!sleep_unless_cancelled(Duration::from_secs(60), &cancel).await);
    }

    #[tokio::test]
    async fn test_zero_sleep() {
        let cancel = CancelFlag::new();
        assert!(sleep_unless_cancelled(Duration::ZERO, &cancel).await);
    }
}
