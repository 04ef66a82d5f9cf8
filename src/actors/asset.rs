use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, instrument, Instrument};

use crate::backends::AssetHost;
use crate::clients::AssetClient;
use crate::domain::Asset;
use crate::error::UploadError;
use crate::messages::{AssetRequest, ServiceResponse};
use crate::retry::RetryPolicy;

/// Uploads images to the asset host, retrying each upload on its own task.
pub struct AssetService {
    receiver: mpsc::Receiver<AssetRequest>,
    host: Arc<dyn AssetHost>,
    retry: RetryPolicy,
}

impl AssetService {
    pub fn new(buffer_size: usize, host: Arc<dyn AssetHost>, retry: RetryPolicy) -> (Self, AssetClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let service = Self {
            receiver,
            host,
            retry,
        };
        (service, AssetClient::new(sender))
    }

    #[instrument(name = "asset_service", skip(self))]
    pub async fn run(mut self) {
        info!("AssetService starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                AssetRequest::Upload { asset, respond_to } => {
                    self.handle_upload(asset, respond_to);
                }
                AssetRequest::Shutdown => {
                    info!("AssetService shutting down");
                    break;
                }
            }
        }
        info!("AssetService stopped");
    }

    /// The spawned task owns `respond_to`, so a slow upload never holds up
    /// the receive loop.
    #[instrument(fields(file_name = %asset.file_name, bytes = asset.len()), skip(self, asset, respond_to))]
    fn handle_upload(&self, asset: Asset, respond_to: ServiceResponse<String, UploadError>) {
        info!("Processing upload request");
        let host = Arc::clone(&self.host);
        let retry = self.retry;

        tokio::spawn(
            async move {
                let result = retry.run("upload", |_| host.upload(&asset)).await;
                match &result {
                    Ok(url) => info!(url = %url, "Upload complete"),
                    Err(e) => error!(error = %e, "Upload failed"),
                }
                let _ = respond_to.send(result);
            }
            .in_current_span(),
        );
    }
}
