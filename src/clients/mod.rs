#[macro_use]
mod macros;

use crate::domain::{Asset, Email, Order, OrderDraft, OrderReceipt, PrintDraft, PrintOrder, PrintReceipt};
use crate::error::{NotifyError, OrderError, StoreError, UploadError};
use crate::messages::{AssetRequest, NotifierRequest, OrderRequest, StoreRequest};

actor_client!(
    /// Handle to the asset uploader.
    AssetClient,
    AssetRequest
);
client_method!(AssetClient => fn upload(asset: Asset) -> String as AssetRequest::Upload, Error = UploadError);

actor_client!(
    /// Handle to the order persister.
    StoreClient,
    StoreRequest
);
client_method!(StoreClient => fn save_order(order: Order) -> String as StoreRequest::SaveOrder, Error = StoreError);
client_method!(StoreClient => fn save_print_order(order: PrintOrder) -> String as StoreRequest::SavePrintOrder, Error = StoreError);

actor_client!(
    /// Handle to the notifier. `notify` returns once the email is queued.
    NotifierClient,
    NotifierRequest
);
client_method!(NotifierClient => fn notify(email: Email) -> () as NotifierRequest::Notify, Error = NotifyError);

actor_client!(
    /// Handle to the order service, the entry point for submissions.
    OrderClient,
    OrderRequest
);
client_method!(OrderClient => fn submit_order(draft: OrderDraft) -> OrderReceipt as OrderRequest::SubmitOrder, Error = OrderError);
client_method!(OrderClient => fn submit_print_order(draft: PrintDraft) -> PrintReceipt as OrderRequest::SubmitPrintOrder, Error = OrderError);
