use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Sleep for `wait` unless cancelled first. Returns false on cancellation.
pub(crate) async fn pause(cancel: &CancellationToken, wait: Duration) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(wait) => true,
    }
}
