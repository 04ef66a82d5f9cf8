use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{error, info, instrument, Instrument};

use crate::backends::{Document, OrderStore};
use crate::clients::StoreClient;
use crate::error::StoreError;
use crate::messages::{ServiceResponse, StoreRequest};

/// Where each kind of order is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collections {
    pub orders: String,
    pub print_orders: String,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            orders: "orders".to_string(),
            print_orders: "print_orders".to_string(),
        }
    }
}

pub struct StoreService {
    receiver: mpsc::Receiver<StoreRequest>,
    store: Arc<dyn OrderStore>,
    collections: Collections,
}

impl StoreService {
    pub fn new(buffer_size: usize, store: Arc<dyn OrderStore>, collections: Collections) -> (Self, StoreClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let service = Self {
            receiver,
            store,
            collections,
        };
        (service, StoreClient::new(sender))
    }

    #[instrument(name = "store_service", skip(self))]
    pub async fn run(mut self) {
        info!("StoreService starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::SaveOrder { order, respond_to } => {
                    let created_at = order.created_at;
                    self.handle_save(self.collections.orders.clone(), &order, created_at, respond_to);
                }
                StoreRequest::SavePrintOrder { order, respond_to } => {
                    let created_at = order.created_at;
                    self.handle_save(self.collections.print_orders.clone(), &order, created_at, respond_to);
                }
                StoreRequest::Shutdown => {
                    info!("StoreService shutting down");
                    break;
                }
            }
        }
        info!("StoreService stopped");
    }

    #[instrument(skip(self, record, created_at, respond_to))]
    fn handle_save<T: Serialize>(
        &self,
        collection: String,
        record: &T,
        created_at: DateTime<Utc>,
        respond_to: ServiceResponse<String, StoreError>,
    ) {
        info!("Processing save request");
        let document = match Document::from_record(record, created_at) {
            Ok(document) => document,
            Err(e) => {
                error!(error = %e, "Order could not be encoded");
                let _ = respond_to.send(Err(e));
                return;
            }
        };

        let store = Arc::clone(&self.store);
        tokio::spawn(
            async move {
                let result = store.insert(&collection, document).await;
                match &result {
                    Ok(id) => info!(document_id = %id, "Order saved"),
                    Err(e) => error!(error = %e, "Order not saved"),
                }
                let _ = respond_to.send(result);
            }
            .in_current_span(),
        );
    }
}
