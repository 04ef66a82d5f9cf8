use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::Mailer;
use crate::config::ResendConfig;
use crate::domain::Email;
use crate::error::NotifyError;

/// Sends notifications through the Resend email API.
pub struct ResendMailer {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    from: String,
    to: Vec<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ResendPayload<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<ResendAttachment<'a>>,
}

#[derive(Debug, Serialize, PartialEq)]
struct ResendAttachment<'a> {
    filename: &'a str,
    content: String,
}

impl ResendMailer {
    pub fn new(http: reqwest::Client, config: &ResendConfig) -> Self {
        Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            from: config.from.clone(),
            to: config.to.clone(),
        }
    }

    pub fn payload<'a>(&'a self, email: &'a Email) -> ResendPayload<'a> {
        ResendPayload {
            from: &self.from,
            to: &self.to,
            subject: &email.subject,
            html: &email.html,
            attachments: email
                .attachments
                .iter()
                .map(|attachment| ResendAttachment {
                    filename: &attachment.file_name,
                    content: STANDARD.encode(&attachment.content),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    #[instrument(name = "resend_send", skip(self, email), fields(subject = %email.subject))]
    async fn send(&self, email: &Email) -> Result<(), NotifyError> {
        debug!("Sending request");
        let response = self
            .http
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.payload(email))
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let id = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v["id"].as_str().map(ToString::to_string))
            .unwrap_or_default();
        info!(email_id = %id, "Email accepted");
        Ok(())
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["message"].as_str().map(ToString::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}
