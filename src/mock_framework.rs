//! # Mock Framework
//!
//! Utilities for testing the services in isolation.
//!
//! Two kinds of doubles live here:
//!
//! - **Mock clients** ([`mock_asset_client`], [`mock_store_client`],
//!   [`mock_notifier_client`]) hand out a real client wired to a receiver the
//!   test controls. Helpers such as [`expect_upload`] pull the next request so
//!   the test can assert on it and answer it.
//! - **Fake backends** ([`ScriptedHost`], [`MemoryStore`], [`FakeMailer`])
//!   stand in for the HTTP services so the actors can run for real.
//! - **[`SpanRecorder`]** is a tracing layer that keeps the values recorded
//!   into spans after they were opened.

use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::span::{Id, Record};
use tracing::Subscriber;
use tracing_subscriber::layer::{Context, Layer};

use crate::backends::{AssetHost, Document, Mailer, OrderStore};
use crate::clients::{AssetClient, NotifierClient, StoreClient};
use crate::domain::{
    AccessoryCategory, AccessorySlot, Asset, Color, Contact, Email, FigureKind, Material, ModelFile, Order,
    OrderDraft, PrintDraft, PrintOrder, ValidatedPrint, Variant,
};
use crate::error::{NotifyError, StoreError, UploadError};
use crate::messages::{AssetRequest, NotifierRequest, ServiceResponse, StoreRequest};

// =============================================================================
// Mock clients
// =============================================================================

pub fn mock_asset_client(buffer_size: usize) -> (AssetClient, mpsc::Receiver<AssetRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (AssetClient::new(sender), receiver)
}

pub fn mock_store_client(buffer_size: usize) -> (StoreClient, mpsc::Receiver<StoreRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (StoreClient::new(sender), receiver)
}

pub fn mock_notifier_client(buffer_size: usize) -> (NotifierClient, mpsc::Receiver<NotifierRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (NotifierClient::new(sender), receiver)
}

/// Helper to verify that the next message is an Upload request
pub async fn expect_upload(
    receiver: &mut mpsc::Receiver<AssetRequest>,
) -> Option<(Asset, ServiceResponse<String, UploadError>)> {
    match receiver.recv().await {
        Some(AssetRequest::Upload { asset, respond_to }) => Some((asset, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a SaveOrder request
pub async fn expect_save_order(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(Order, ServiceResponse<String, StoreError>)> {
    match receiver.recv().await {
        Some(StoreRequest::SaveOrder { order, respond_to }) => Some((order, respond_to)),
        _ => None,
    }
}

pub async fn expect_save_print_order(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(PrintOrder, ServiceResponse<String, StoreError>)> {
    match receiver.recv().await {
        Some(StoreRequest::SavePrintOrder { order, respond_to }) => Some((order, respond_to)),
        _ => None,
    }
}

pub async fn expect_notify(
    receiver: &mut mpsc::Receiver<NotifierRequest>,
) -> Option<(Email, ServiceResponse<(), NotifyError>)> {
    match receiver.recv().await {
        Some(NotifierRequest::Notify { email, respond_to }) => Some((email, respond_to)),
        _ => None,
    }
}

// =============================================================================
// Fake backends
// =============================================================================

/// Answers uploads from a script, then falls back to a URL derived from the
/// file name once the script runs out.
pub struct ScriptedHost {
    script: Mutex<VecDeque<Result<String, UploadError>>>,
    attempts: AtomicUsize,
}

impl ScriptedHost {
    pub fn new(script: Vec<Result<String, UploadError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetHost for ScriptedHost {
    async fn upload(&self, asset: &Asset) -> Result<String, UploadError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(format!("https://img.test/{}", asset.file_name)))
    }
}

/// Keeps inserted documents in memory, or fails every insert.
pub struct MemoryStore {
    documents: Mutex<Vec<(String, Document)>>,
    failure: Option<StoreError>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            documents: Mutex::new(Vec::new()),
            failure: None,
        }
    }

    pub fn failing(error: StoreError) -> Self {
        Self {
            documents: Mutex::new(Vec::new()),
            failure: Some(error),
        }
    }

    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| c == collection)
            .map(|(_, document)| document.clone())
            .collect()
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert(&self, collection: &str, document: Document) -> Result<String, StoreError> {
        if let Some(e) = &self.failure {
            return Err(e.clone());
        }
        let mut documents = self.documents.lock().unwrap();
        documents.push((collection.to_string(), document));
        Ok(format!("doc_{}", documents.len()))
    }
}

enum MailerMode {
    Deliver,
    Fail,
    Slow(Duration),
}

pub struct FakeMailer {
    mode: MailerMode,
    sent: Mutex<Vec<Email>>,
    attempts: AtomicUsize,
}

impl FakeMailer {
    fn with_mode(mode: MailerMode) -> Self {
        Self {
            mode,
            sent: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn delivering() -> Self {
        Self::with_mode(MailerMode::Deliver)
    }

    pub fn failing() -> Self {
        Self::with_mode(MailerMode::Fail)
    }

    pub fn slow(delay: Duration) -> Self {
        Self::with_mode(MailerMode::Slow(delay))
    }

    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Mailer for FakeMailer {
    async fn send(&self, email: &Email) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            MailerMode::Deliver => {}
            MailerMode::Fail => {
                return Err(NotifyError::Rejected {
                    status: 500,
                    message: "mail server down".to_string(),
                })
            }
            MailerMode::Slow(delay) => tokio::time::sleep(delay).await,
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

// =============================================================================
// Span recording
// =============================================================================

#[derive(Clone, Default)]
pub struct SpanRecorder {
    fields: Arc<Mutex<Vec<(String, String)>>>,
}

impl SpanRecorder {
    /// Last value recorded under `name`, across all spans.
    pub fn field(&self, name: &str) -> Option<String> {
        self.fields
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.clone())
    }
}

struct FieldVisitor<'a>(&'a mut Vec<(String, String)>);

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }
}

impl<S: Subscriber> Layer<S> for SpanRecorder {
    fn on_record(&self, _span: &Id, values: &Record<'_>, _ctx: Context<'_, S>) {
        let mut fields = self.fields.lock().unwrap();
        values.record(&mut FieldVisitor(&mut fields));
    }
}

// =============================================================================
// Samples
// =============================================================================

pub fn sample_photo() -> Asset {
    Asset::new("me.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF])
}

pub fn sample_accessory(category: AccessoryCategory, slot: usize, description: &str) -> AccessorySlot {
    let image = Asset::new(format!("{category}_{slot}.png"), "image/png", vec![0x89, 0x50]);
    AccessorySlot::new(category, slot, Some(image), description)
}

pub fn sample_draft() -> OrderDraft {
    OrderDraft {
        kind: Some(FigureKind::Individual),
        variant: Some(Variant::Female),
        description: "Red hair, green dress".to_string(),
        photo: Some(sample_photo()),
        contact: Contact::new("Ana", "555-0101"),
        accessories: Vec::new(),
    }
}

pub fn sample_order() -> Order {
    Order::new(
        FigureKind::Individual,
        Variant::Female,
        "Red hair",
        "https://img.test/me.jpg",
        Contact::new("Ana", "555-0101"),
        Default::default(),
        Utc::now(),
    )
}

pub fn sample_print_draft(bytes: usize) -> PrintDraft {
    PrintDraft {
        file: Some(ModelFile::new("dragon.stl", vec![0u8; bytes])),
        material: Some(Material::Pla),
        color: Some(Color::Red),
        email: "ana@example.com".to_string(),
        name: "Ana".to_string(),
    }
}

pub fn sample_print() -> ValidatedPrint {
    sample_print_draft(16)
        .validate(1024)
        .expect("sample print draft is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_client() {
        let (client, mut receiver) = mock_asset_client(10);

        let upload_task = tokio::spawn(async move { client.upload(sample_photo()).await });

        let (asset, responder) = expect_upload(&mut receiver).await.expect("Expected Upload request");
        assert_eq!(asset.file_name, "me.jpg");
        responder.send(Ok("https://img.test/me.jpg".to_string())).unwrap();

        let result = upload_task.await.unwrap();
        assert_eq!(result, Ok("https://img.test/me.jpg".to_string()));
    }

    #[tokio::test]
    async fn scripted_host_falls_back_to_file_name() {
        let host = ScriptedHost::new(vec![Err(UploadError::MissingUrl)]);
        assert_eq!(host.upload(&sample_photo()).await, Err(UploadError::MissingUrl));
        assert_eq!(host.upload(&sample_photo()).await, Ok("https://img.test/me.jpg".to_string()));
        assert_eq!(host.attempts(), 2);
    }
}
