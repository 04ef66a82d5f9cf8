use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info, instrument};

use crate::actors::{AssetService, Collections, Limits, NotifierService, OrderService, Pipeline, StoreService};
use crate::backends::Backends;
use crate::clients::{AssetClient, NotifierClient, OrderClient, StoreClient};
use crate::config::Config;
use crate::retry::RetryPolicy;

/// Tunables for the services, split from [`Config`] so tests can start a
/// system without any environment.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemSettings {
    pub buffer_size: usize,
    pub collections: Collections,
    pub upload_retry: RetryPolicy,
    pub notify_retry: RetryPolicy,
    pub limits: Limits,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            buffer_size: 100,
            collections: Collections::default(),
            upload_retry: RetryPolicy::fixed(3, Duration::from_millis(1000)),
            notify_retry: RetryPolicy::linear(2, Duration::from_millis(1000)),
            limits: Limits::default(),
        }
    }
}

impl From<&Config> for SystemSettings {
    fn from(config: &Config) -> Self {
        Self {
            collections: config.collections.clone(),
            upload_retry: config.upload_retry,
            notify_retry: config.notify_retry,
            limits: config.limits,
            ..Self::default()
        }
    }
}

/// Starts the services, wires their clients together and stops them in
/// dependency order.
pub struct OrderSystem {
    pub order_client: OrderClient,
    pub notifier_client: NotifierClient,
    asset_client: AssetClient,
    store_client: StoreClient,
    order_handle: JoinHandle<()>,
    backend_handles: Vec<JoinHandle<()>>,
    notifier_handle: JoinHandle<()>,
}

impl OrderSystem {
    /// **Startup Order:**
    /// 1. Sub-services with no dependencies (assets, store, notifier)
    /// 2. The order service, holding clients for all three
    #[instrument(name = "order_system", skip_all)]
    pub fn new(backends: Backends, settings: SystemSettings) -> Self {
        info!("Starting order system");

        let (asset_service, asset_client) =
            AssetService::new(settings.buffer_size, backends.assets, settings.upload_retry);
        let asset_handle = tokio::spawn(asset_service.run());

        let (store_service, store_client) =
            StoreService::new(settings.buffer_size, backends.store, settings.collections);
        let store_handle = tokio::spawn(store_service.run());

        let (notifier_service, notifier_client) =
            NotifierService::new(settings.buffer_size, backends.mailer, settings.notify_retry);
        let notifier_handle = tokio::spawn(notifier_service.run());

        let pipeline = Pipeline::new(
            asset_client.clone(),
            store_client.clone(),
            notifier_client.clone(),
            settings.limits,
        );
        let (order_service, order_client) = OrderService::new(settings.buffer_size, pipeline);
        let order_handle = tokio::spawn(order_service.run());

        info!("Order system started successfully");

        Self {
            order_client,
            notifier_client,
            asset_client,
            store_client,
            order_handle,
            backend_handles: vec![asset_handle, store_handle],
            notifier_handle,
        }
    }

    /// **Shutdown Order:**
    /// 1. The order service, which finishes the submissions in flight
    /// 2. Asset and store services
    /// 3. The notifier last, so queued emails are still delivered
    ///
    /// Errors are logged and shutdown continues.
    #[instrument(skip(self))]
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down order system");

        let _ = self.order_client.shutdown().await;
        join("order", self.order_handle).await;

        let _ = self.asset_client.shutdown().await;
        let _ = self.store_client.shutdown().await;
        for handle in self.backend_handles {
            join("backend", handle).await;
        }

        let _ = self.notifier_client.shutdown().await;
        join("notifier", self.notifier_handle).await;

        info!("Order system shutdown complete");
        Ok(())
    }
}

async fn join(service: &str, handle: JoinHandle<()>) {
    if let Err(e) = handle.await {
        error!(service, error = ?e, "Service shutdown error");
    }
}
