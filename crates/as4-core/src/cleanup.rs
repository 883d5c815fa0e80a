//! Periodic eviction of expired duplicate-detection entries.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::context::As4Context;
use crate::error::As4Error;
use crate::Result;

/// Runs [`As4Context::evict_expired_duplicates`] every `period` until the
/// returned handle is aborted. The first pass runs immediately.
///
/// Must be called from within a tokio runtime.
///
/// # Arguments
///
/// * `ctx` - Context whose duplicate cache is swept
/// * `period` - Time between sweeps
///
/// # Errors
///
/// Returns `As4Error::Config` for a zero `period`; nothing is spawned.
pub fn spawn_duplicate_cleanup(
    ctx: Arc<As4Context>,
    period: Duration,
) -> Result<JoinHandle<()>> {
    if period.is_zero() {
        return Err(As4Error::Config("cleanup period must be positive".to_string()));
    }
    Ok(tokio::spawn(cleanup_task(ctx, period)))
}

/// Spawns the cleanup task with the configured interval.
///
/// # Errors
///
/// Same as [`spawn_duplicate_cleanup`].
pub fn spawn_configured_cleanup(ctx: Arc<As4Context>) -> Result<JoinHandle<()>> {
    let period = Duration::from_secs(ctx.config().duplicates.cleanup_interval_secs);
    spawn_duplicate_cleanup(ctx, period)
}

async fn cleanup_task(ctx: Arc<As4Context>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match ctx.evict_expired_duplicates() {
            Ok(evicted) if !evicted.is_empty() => {
                debug!(evicted = evicted.len(), "evicted expired duplicate entries");
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "duplicate cleanup pass failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::As4Config;
    use as4_profile::ProfileRegistry;
    use as4_registry::ManualClock;
    use chrono::Utc;

    #[tokio::test]
    async fn test_cleanup_task_evicts_expired_entries() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let ctx = Arc::new(
            As4Context::with_clock(
                As4Config::default(),
                Arc::new(ProfileRegistry::with_builtin()),
                clock.clone(),
            )
            .unwrap(),
        );
        ctx.duplicates().register_and_check("old", "generic", "pm").unwrap();
        clock.advance(chrono::Duration::minutes(11));
        ctx.duplicates().register_and_check("fresh", "generic", "pm").unwrap();

        let handle =
            spawn_duplicate_cleanup(Arc::clone(&ctx), Duration::from_millis(10)).unwrap();
        for _ in 0..100 {
            if ctx.duplicates().size() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();

        assert!(ctx.duplicates().get_item_of_message_id("old").unwrap().is_none());
        assert!(ctx.duplicates().get_item_of_message_id("fresh").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_zero_period_is_rejected() {
        let ctx = Arc::new(
            As4Context::new(As4Config::default(), Arc::new(ProfileRegistry::with_builtin()))
                .unwrap(),
        );
        let err = spawn_duplicate_cleanup(ctx, Duration::ZERO).unwrap_err();
        assert!(matches!(err, As4Error::Config(_)));
    }
}
