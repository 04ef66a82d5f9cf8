use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::AssetHost;
use crate::config::ImgbbConfig;
use crate::domain::Asset;
use crate::error::UploadError;

/// Uploads images to ImgBB and hands back their public URLs.
pub struct ImgbbHost {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Deserialize)]
struct ImgbbResponse {
    #[serde(default)]
    success: bool,
    data: Option<ImgbbData>,
    error: Option<ImgbbFailure>,
}

#[derive(Deserialize)]
struct ImgbbData {
    url: Option<String>,
}

#[derive(Deserialize)]
struct ImgbbFailure {
    message: Option<String>,
}

impl ImgbbHost {
    pub fn new(http: reqwest::Client, config: &ImgbbConfig) -> Self {
        Self {
            http,
            endpoint: config.url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl AssetHost for ImgbbHost {
    #[instrument(name = "imgbb_upload", skip(self, asset), fields(file_name = %asset.file_name))]
    async fn upload(&self, asset: &Asset) -> Result<String, UploadError> {
        let part = Part::bytes(asset.bytes.to_vec())
            .file_name(asset.file_name.clone())
            .mime_str(&asset.content_type)
            .map_err(|e| UploadError::Transport(e.to_string()))?;
        let form = Form::new()
            .text("name", asset.stem().to_string())
            .part("image", part);

        debug!("Sending request");
        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        parse_upload_response(status, &body)
    }
}

/// Extracts the hosted URL, treating `success: false` like an HTTP error.
pub fn parse_upload_response(status: u16, body: &str) -> Result<String, UploadError> {
    let parsed: Option<ImgbbResponse> = serde_json::from_str(body).ok();

    let Some(parsed) = parsed else {
        return Err(UploadError::Rejected {
            status,
            message: truncate(body),
        });
    };

    if !(200..300).contains(&status) || !parsed.success {
        let message = parsed
            .error
            .and_then(|e| e.message)
            .unwrap_or_else(|| "upload not accepted".to_string());
        return Err(UploadError::Rejected { status, message });
    }

    parsed
        .data
        .and_then(|data| data.url)
        .filter(|url| !url.is_empty())
        .ok_or(UploadError::MissingUrl)
}

fn truncate(body: &str) -> String {
    body.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_hosted_url() {
        let body = r#"{"data":{"id":"2ndCYJK","url":"https://i.ibb.co/w04Prt6/c1f64245afb2.gif"},"success":true,"status":200}"#;
        assert_eq!(
            parse_upload_response(200, body),
            Ok("https://i.ibb.co/w04Prt6/c1f64245afb2.gif".to_string())
        );
    }

    #[test]
    fn unsuccessful_flag_is_a_rejection() {
        let body = r#"{"status_code":400,"error":{"message":"Invalid API v1 key.","code":100},"status_txt":"Bad Request"}"#;
        assert_eq!(
            parse_upload_response(400, body),
            Err(UploadError::Rejected {
                status: 400,
                message: "Invalid API v1 key.".to_string()
            })
        );

        let body = r#"{"data":{"url":"https://i.ibb.co/x.png"},"success":false}"#;
        assert!(matches!(
            parse_upload_response(200, body),
            Err(UploadError::Rejected { status: 200, .. })
        ));
    }

    #[test]
    fn success_without_url_is_an_error() {
        let body = r#"{"data":{},"success":true}"#;
        assert_eq!(parse_upload_response(200, body), Err(UploadError::MissingUrl));
    }

    #[test]
    fn non_json_body_is_a_rejection() {
        assert_eq!(
            parse_upload_response(502, "<html>bad gateway</html>"),
            Err(UploadError::Rejected {
                status: 502,
                message: "<html>bad gateway</html>".to_string()
            })
        );
    }
}
