//! OS signal handling.

use tokio::task::JoinHandle;

use crate::lifecycle::cancel::CancelSignal;

/// Trigger `signal` when the process receives Ctrl-C.
///
/// The returned task finishes after the first Ctrl-C, or immediately if the
/// handler cannot be installed.
pub fn cancel_on_ctrl_c(signal: CancelSignal) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Interrupt received, cancelling");
                signal.cancel();
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            }
        }
    })
}
