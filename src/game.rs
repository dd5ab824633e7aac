pub mod dispatcher;
pub mod messages;
pub mod scheduler;

use std::time::Duration;
use tokio::task::JoinSet;

/// Waits up to `grace` for `tasks` to finish, then aborts whatever is left.
pub(crate) async fn drain(tasks: &mut JoinSet<()>, grace: Duration, what: &str) {
    if tasks.is_empty() {
        return;
    }

    tracing::info!(pending = tasks.len(), "{what}: waiting for in-flight tasks");
    let finished = tokio::time::timeout(grace, async {
        while let Some(res) = tasks.join_next().await {
            log_join(res, what);
        }
    })
    .await;

    if finished.is_err() {
        tracing::warn!(pending = tasks.len(), "{what}: grace period over, aborting tasks");
        tasks.abort_all();
        while tasks.join_next().await.is_some() {}
    }
}

pub(crate) fn log_join(res: Result<(), tokio::task::JoinError>, what: &str) {
    if let Err(e) = res {
        if e.is_panic() {
            tracing::error!(error = %e, "{what}: task panicked");
        }
    }
}
