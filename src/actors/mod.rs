//! Long-running services. Each owns an mpsc receiver, runs until it gets a
//! `Shutdown` message or its channel closes, and is driven through the
//! matching client in [`crate::clients`].

pub mod asset;
pub mod notifier;
pub mod order;
pub mod store;

pub use asset::AssetService;
pub use notifier::NotifierService;
pub use order::{Limits, OrderService, Pipeline};
pub use store::{Collections, StoreService};

use tokio::task::JoinError;
use tracing::error;

/// Logs a background task that panicked or was cancelled.
fn reap(result: Result<(), JoinError>) {
    if let Err(e) = result {
        error!(error = %e, "Background task failed");
    }
}
