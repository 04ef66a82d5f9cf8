//! External services the order pipeline talks to.
//!
//! Each service sits behind a trait so the actors can be driven by fakes in
//! tests and by the HTTP implementations in production:
//!
//! - [`AssetHost`] → ImgBB image hosting ([`ImgbbHost`])
//! - [`OrderStore`] → Firestore documents ([`FirestoreStore`])
//! - [`Mailer`] → Resend transactional email ([`ResendMailer`])

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::Config;
use crate::domain::{Asset, Email};
use crate::error::{ConfigError, NotifyError, StoreError, UploadError};

pub mod firestore;
pub mod imgbb;
pub mod resend;

pub use firestore::FirestoreStore;
pub use imgbb::ImgbbHost;
pub use resend::ResendMailer;

#[async_trait]
pub trait AssetHost: Send + Sync + 'static {
    /// Uploads one asset and returns its public URL.
    async fn upload(&self, asset: &Asset) -> Result<String, UploadError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync + 'static {
    /// Writes a new document and returns the id the store assigned to it.
    async fn insert(&self, collection: &str, document: Document) -> Result<String, StoreError>;
}

#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send(&self, email: &Email) -> Result<(), NotifyError>;
}

/// A record ready to be written, with its creation time kept apart so the
/// store can encode it as a native timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub fields: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn from_record<T: Serialize>(record: &T, created_at: DateTime<Utc>) -> Result<Self, StoreError> {
        match serde_json::to_value(record) {
            Ok(Value::Object(fields)) => Ok(Self { fields, created_at }),
            Ok(other) => Err(StoreError::Encoding(format!(
                "expected an object, got {other}"
            ))),
            Err(e) => Err(StoreError::Encoding(e.to_string())),
        }
    }
}

/// The production set of backends.
#[derive(Clone)]
pub struct Backends {
    pub assets: Arc<dyn AssetHost>,
    pub store: Arc<dyn OrderStore>,
    pub mailer: Arc<dyn Mailer>,
}

impl Backends {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            assets: Arc::new(ImgbbHost::new(http.clone(), &config.imgbb)),
            store: Arc::new(FirestoreStore::new(http.clone(), &config.firestore)),
            mailer: Arc::new(ResendMailer::new(http, &config.resend)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Record {
        name: &'static str,
    }

    #[test]
    fn document_keeps_record_fields() {
        let now = Utc::now();
        let document = Document::from_record(&Record { name: "funko" }, now).unwrap();
        assert_eq!(document.fields["name"], "funko");
        assert_eq!(document.created_at, now);
    }

    #[test]
    fn document_requires_an_object() {
        let err = Document::from_record(&"just a string", Utc::now()).unwrap_err();
        assert!(matches!(err, StoreError::Encoding(_)));
    }
}
