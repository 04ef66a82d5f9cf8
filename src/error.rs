use thiserror::Error;

use crate::domain::{AccessoryCategory, Color, FigureKind, Material, Variant};

/// Problems found before any network call is made.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Variant {variant} does not fit a {kind} figure")]
    VariantMismatch { kind: FigureKind, variant: Variant },
    #[error("Not an image: {0}")]
    NotAnImage(String),
    #[error("Accessory slot out of range: {category} slot {slot}")]
    SlotOutOfRange {
        category: AccessoryCategory,
        slot: usize,
    },
    #[error("Accessory slot given twice: {0}")]
    DuplicateSlot(String),
    #[error("Unsupported model format: {0}")]
    UnsupportedFormat(String),
    #[error("File too large: {size} bytes (max {max})")]
    FileTooLarge { size: u64, max: u64 },
    #[error("{material} is not available in {color}")]
    ColorUnavailable { material: Material, color: Color },
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
    #[error("Invalid file data: {0}")]
    InvalidFileData(String),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum UploadError {
    #[error("Upload request failed: {0}")]
    Transport(String),
    #[error("Image host rejected upload with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("Image host returned no URL")]
    MissingUrl,
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("Store request failed: {0}")]
    Transport(String),
    #[error("Store rejected document with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("Document could not be encoded: {0}")]
    Encoding(String),
    #[error("Unexpected store response: {0}")]
    MalformedResponse(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum NotifyError {
    #[error("Email request failed: {0}")]
    Transport(String),
    #[error("Email API rejected message with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

/// Failure of a whole submission, as seen by the customer.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Upload failed: {0}")]
    Upload(#[from] UploadError),
    #[error("Order could not be saved: {0}")]
    Persist(#[from] StoreError),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),
    #[error("Invalid {key} value: {message}")]
    Invalid { key: &'static str, message: String },
    #[error("HTTP client could not be built: {0}")]
    HttpClient(String),
}
