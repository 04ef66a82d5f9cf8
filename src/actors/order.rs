use std::collections::BTreeMap;

use chrono::Utc;
use futures::future::try_join_all;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn, Instrument};

use super::reap;
use crate::clients::{AssetClient, NotifierClient, OrderClient, StoreClient};
use crate::domain::{
    Email, Order, OrderDraft, OrderReceipt, PrintDraft, PrintReceipt, ValidatedOrder,
    DEFAULT_MAX_MODEL_BYTES,
};
use crate::error::{OrderError, UploadError};
use crate::messages::{OrderRequest, ServiceResponse};
use crate::templates;

/// Largest model file that is still sent to the shop as an email attachment.
pub const DEFAULT_ATTACHMENT_LIMIT_BYTES: u64 = 40 * 1024 * 1024;

/// Body cap for figure orders: a photo plus fifteen accessory images, base64 encoded.
pub const DEFAULT_MAX_REQUEST_BYTES: u64 = 64 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_model_bytes: u64,
    pub attachment_limit_bytes: u64,
    pub max_request_bytes: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_model_bytes: DEFAULT_MAX_MODEL_BYTES,
            attachment_limit_bytes: DEFAULT_ATTACHMENT_LIMIT_BYTES,
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
        }
    }
}

/// The submission flow: validate, upload, persist, then notify.
///
/// Only validation, upload and persistence decide the outcome. The
/// notification is handed off and never fails a submission.
#[derive(Clone)]
pub struct Pipeline {
    assets: AssetClient,
    store: StoreClient,
    notifier: NotifierClient,
    limits: Limits,
}

impl Pipeline {
    pub fn new(assets: AssetClient, store: StoreClient, notifier: NotifierClient, limits: Limits) -> Self {
        Self {
            assets,
            store,
            notifier,
            limits,
        }
    }

    pub async fn submit_order(&self, draft: OrderDraft) -> Result<OrderReceipt, OrderError> {
        let ValidatedOrder {
            kind,
            variant,
            description,
            photo,
            contact,
            accessories,
        } = draft.validate()?;
        info!(kind = %kind, variant = %variant, accessories = accessories.len(), "Order validated");

        let photo_url = self.assets.upload(photo).await?;

        let assets = &self.assets;
        let entries = try_join_all(accessories.into_iter().map(|accessory| async move {
            let url = assets.upload(accessory.image.clone()).await?;
            Ok::<_, UploadError>((accessory.key(), accessory.into_entry(url)))
        }))
        .await?;
        let accessories: BTreeMap<_, _> = entries.into_iter().collect();

        let order = Order::new(kind, variant, description, photo_url, contact, accessories, Utc::now());

        let order_id = match self.store.save_order(order.clone()).await {
            Ok(id) => id,
            Err(e) => {
                let orphaned: Vec<&str> = std::iter::once(order.photo_url.as_str())
                    .chain(order.accessories.values().map(|entry| entry.image_url.as_str()))
                    .collect();
                warn!(error = %e, orphaned = ?orphaned, "Order not saved, uploaded images are unreferenced");
                return Err(e.into());
            }
        };

        self.notify(templates::order_email(&order_id, &order)).await;

        Ok(OrderReceipt {
            order_id,
            photo_url: order.photo_url,
            accessories: order.accessories.into_keys().collect(),
        })
    }

    pub async fn submit_print_order(&self, draft: PrintDraft) -> Result<PrintReceipt, OrderError> {
        let print = draft.validate(self.limits.max_model_bytes)?;
        info!(
            file_name = %print.file.file_name,
            bytes = print.file.size(),
            material = %print.material,
            color = %print.color,
            "Print order validated"
        );

        let order = print.to_order(Utc::now());
        let order_id = self.store.save_print_order(order.clone()).await?;

        let file_attached = print.file.size() <= self.limits.attachment_limit_bytes;
        if !file_attached {
            warn!(bytes = print.file.size(), "Model too large to attach");
        }
        self.notify(templates::print_email(&order_id, &order, &print, file_attached))
            .await;

        Ok(PrintReceipt::new(order_id, file_attached))
    }

    async fn notify(&self, email: Email) {
        if let Err(e) = self.notifier.notify(email).await {
            warn!(error = %e, "Notification not queued");
        }
    }
}

/// Root service. Each submission runs on its own task so a slow upload never
/// holds up other customers.
pub struct OrderService {
    receiver: mpsc::Receiver<OrderRequest>,
    pipeline: Pipeline,
    submissions: JoinSet<()>,
}

impl OrderService {
    pub fn new(buffer_size: usize, pipeline: Pipeline) -> (Self, OrderClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let service = Self {
            receiver,
            pipeline,
            submissions: JoinSet::new(),
        };
        (service, OrderClient::new(sender))
    }

    #[instrument(name = "order_service", skip(self))]
    pub async fn run(mut self) {
        info!("OrderService starting");
        loop {
            tokio::select! {
                msg = self.receiver.recv() => match msg {
                    Some(OrderRequest::SubmitOrder { draft, respond_to }) => {
                        self.handle_submit_order(draft, respond_to);
                    }
                    Some(OrderRequest::SubmitPrintOrder { draft, respond_to }) => {
                        self.handle_submit_print_order(draft, respond_to);
                    }
                    Some(OrderRequest::Shutdown) => {
                        info!("OrderService shutting down");
                        break;
                    }
                    None => break,
                },
                Some(result) = self.submissions.join_next(), if !self.submissions.is_empty() => {
                    reap(result);
                }
            }
        }

        while let Some(result) = self.submissions.join_next().await {
            reap(result);
        }
        info!("OrderService stopped");
    }

    #[instrument(skip(self, draft, respond_to))]
    fn handle_submit_order(&mut self, draft: OrderDraft, respond_to: ServiceResponse<OrderReceipt, OrderError>) {
        info!("Processing submit_order request");
        let pipeline = self.pipeline.clone();
        self.submissions.spawn(
            async move {
                let result = pipeline.submit_order(draft).await;
                match &result {
                    Ok(receipt) => info!(order_id = %receipt.order_id, "Order submitted"),
                    Err(e) => log_failure(e),
                }
                let _ = respond_to.send(result);
            }
            .in_current_span(),
        );
    }

    #[instrument(skip(self, draft, respond_to))]
    fn handle_submit_print_order(
        &mut self,
        draft: PrintDraft,
        respond_to: ServiceResponse<PrintReceipt, OrderError>,
    ) {
        info!("Processing submit_print_order request");
        let pipeline = self.pipeline.clone();
        self.submissions.spawn(
            async move {
                let result = pipeline.submit_print_order(draft).await;
                match &result {
                    Ok(receipt) => info!(order_id = %receipt.order_id, "Print order submitted"),
                    Err(e) => log_failure(e),
                }
                let _ = respond_to.send(result);
            }
            .in_current_span(),
        );
    }
}

fn log_failure(e: &OrderError) {
    match e {
        OrderError::Validation(e) => warn!(error = %e, "Submission rejected"),
        e => error!(error = %e, "Submission failed"),
    }
}
