use tokio::sync::watch;

pub type ShutdownSignal = watch::Receiver<bool>;

/// Shutdown flag shared by the long-running loops. Flip it once with `send(true)`.
pub fn channel() -> (watch::Sender<bool>, ShutdownSignal) {
    watch::channel(false)
}

/// Resolves once the flag is set (or the sender is gone).
pub async fn wait_for_shutdown(mut rx: ShutdownSignal) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

/// Sets the flag on Ctrl-C.
pub fn trigger_on_ctrl_c(tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        let _ = tx.send(true);
        tracing::info!("shutdown signal received");
    });
}
