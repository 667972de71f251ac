//! Timeout and cancellation boundary around a single transport call.

use std::{future::Future, time::Duration};

use tokio_util::sync::CancellationToken;

use crate::{NetworkError, Result};

/// Runs `operation` until it completes, `timeout` elapses, or `signal` fires.
///
/// Whichever comes first wins. A losing `operation` is dropped, which aborts
/// the in-flight request; the timer is dropped with it on every path.
pub(crate) async fn guard<F, T>(
    operation: F,
    timeout: Duration,
    signal: Option<&CancellationToken>,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let cancelled = async {
        match signal {
            Some(token) => token.cancelled().await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        biased;
        _ = cancelled => {
            #[cfg(feature = "tracing")]
            tracing::debug!("request cancelled by caller signal");
            Err(NetworkError::Timeout)
        }
        _ = tokio::time::sleep(timeout) => {
            #[cfg(feature = "tracing")]
            tracing::debug!("request timed out after {} ms", timeout.as_millis());
            Err(NetworkError::Timeout)
        }
        result = operation => result,
    }
}

/// Sleeps for `delay` unless `signal` fires first.
///
/// Returns `false` when the sleep was interrupted.
pub(crate) async fn sleep_unless_cancelled(
    delay: Duration,
    signal: Option<&CancellationToken>,
) -> bool {
    match signal {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        },
        None => {
            tokio::time::sleep(delay).await;
            true
        }
    }
}
