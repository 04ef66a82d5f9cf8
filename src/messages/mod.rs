use tokio::sync::oneshot;

use crate::domain::{Asset, Email, Order, OrderDraft, OrderReceipt, PrintDraft, PrintOrder, PrintReceipt};
use crate::error::{NotifyError, OrderError, StoreError, UploadError};

/// Generic type aliases for service communication
pub type ServiceResult<T, E> = std::result::Result<T, E>;
pub type ServiceResponse<T, E> = oneshot::Sender<ServiceResult<T, E>>;

/// Typed message enums for actor communication. Each variant includes parameters
/// and a oneshot channel for responses.

#[derive(Debug)]
pub enum AssetRequest {
    Upload {
        asset: Asset,
        respond_to: ServiceResponse<String, UploadError>,
    },
    Shutdown,
}

#[derive(Debug)]
pub enum StoreRequest {
    SaveOrder {
        order: Order,
        respond_to: ServiceResponse<String, StoreError>,
    },
    SavePrintOrder {
        order: PrintOrder,
        respond_to: ServiceResponse<String, StoreError>,
    },
    Shutdown,
}

#[derive(Debug)]
pub enum NotifierRequest {
    /// Answered as soon as the email is queued; delivery happens afterwards.
    Notify {
        email: Email,
        respond_to: ServiceResponse<(), NotifyError>,
    },
    Shutdown,
}

#[derive(Debug)]
pub enum OrderRequest {
    SubmitOrder {
        draft: OrderDraft,
        respond_to: ServiceResponse<OrderReceipt, OrderError>,
    },
    SubmitPrintOrder {
        draft: PrintDraft,
        respond_to: ServiceResponse<PrintReceipt, OrderError>,
    },
    Shutdown,
}
