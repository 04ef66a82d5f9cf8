use std::{env, fmt::Display, fs::read_to_string, str::FromStr, time::Duration};

use tracing::{info, warn};

use crate::actors::{Collections, Limits};
use crate::error::ConfigError;
use crate::retry::RetryPolicy;

pub struct Config {
    pub port: u16,
    pub imgbb: ImgbbConfig,
    pub firestore: FirestoreConfig,
    pub resend: ResendConfig,
    pub collections: Collections,
    pub upload_retry: RetryPolicy,
    pub notify_retry: RetryPolicy,
    pub limits: Limits,
    pub http_timeout: Duration,
}

pub struct ImgbbConfig {
    pub url: String,
    pub api_key: String,
}

pub struct FirestoreConfig {
    pub url: String,
    pub project_id: String,
    pub api_key: String,
}

pub struct ResendConfig {
    pub url: String,
    pub api_key: String,
    pub from: String,
    pub to: Vec<String>,
}

impl Config {
    /// Reads settings from the environment, falling back to `/run/secrets/<NAME>`.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok().or_else(|| read_secret(key)))
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let source = Source { lookup };

        let recipients: Vec<String> = source
            .require("EMAIL_TO")?
            .split(',')
            .map(str::trim)
            .filter(|address| !address.is_empty())
            .map(ToString::to_string)
            .collect();
        if recipients.is_empty() {
            return Err(ConfigError::Missing("EMAIL_TO"));
        }

        Ok(Self {
            port: source.try_load("RUST_PORT", "1111")?,
            imgbb: ImgbbConfig {
                url: source.try_load("IMGBB_URL", "https://api.imgbb.com/1/upload")?,
                api_key: source.require("IMGBB_API_KEY")?,
            },
            firestore: FirestoreConfig {
                url: source.try_load("FIRESTORE_URL", "https://firestore.googleapis.com")?,
                project_id: source.require("FIRESTORE_PROJECT_ID")?,
                api_key: source.require("FIRESTORE_API_KEY")?,
            },
            resend: ResendConfig {
                url: source.try_load("RESEND_URL", "https://api.resend.com")?,
                api_key: source.require("RESEND_API_KEY")?,
                from: source.try_load("EMAIL_FROM", "onboarding@resend.dev")?,
                to: recipients,
            },
            collections: Collections {
                orders: source.try_load("ORDERS_COLLECTION", "orders")?,
                print_orders: source.try_load("PRINT_ORDERS_COLLECTION", "print_orders")?,
            },
            upload_retry: RetryPolicy::fixed(
                source.try_load("UPLOAD_ATTEMPTS", "3")?,
                Duration::from_millis(source.try_load("UPLOAD_DELAY_MS", "1000")?),
            ),
            notify_retry: RetryPolicy::linear(
                source.try_load("NOTIFY_ATTEMPTS", "2")?,
                Duration::from_millis(source.try_load("NOTIFY_DELAY_MS", "1000")?),
            ),
            limits: Limits {
                max_model_bytes: source.try_load("MAX_MODEL_BYTES", "2576980377")?,
                attachment_limit_bytes: source.try_load("ATTACHMENT_LIMIT_BYTES", "41943040")?,
                max_request_bytes: source.try_load("MAX_REQUEST_BYTES", "67108864")?,
            },
            http_timeout: Duration::from_secs(source.try_load("HTTP_TIMEOUT_SECS", "30")?),
        })
    }
}

struct Source<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Source<F> {
    fn var(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|value| !value.trim().is_empty())
    }

    fn require(&self, key: &'static str) -> Result<String, ConfigError> {
        self.var(key)
            .map(|value| value.trim().to_string())
            .ok_or_else(|| {
                warn!("Required setting {key} not found");
                ConfigError::Missing(key)
            })
    }

    fn try_load<T: FromStr>(&self, key: &'static str, default: &str) -> Result<T, ConfigError>
    where
        T::Err: Display,
    {
        self.var(key)
            .unwrap_or_else(|| {
                info!("{key} not set, using default: {default}");
                default.to_string()
            })
            .trim()
            .parse()
            .map_err(|e: T::Err| {
                warn!("Invalid {key} value: {e}");
                ConfigError::Invalid {
                    key,
                    message: e.to_string(),
                }
            })
    }
}

fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");
    read_to_string(path).ok().map(|s| s.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::Backoff;
    use std::collections::HashMap;

    fn required() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("IMGBB_API_KEY", "imgbb-key"),
            ("FIRESTORE_PROJECT_ID", "funko-shop"),
            ("FIRESTORE_API_KEY", "fs-key"),
            ("RESEND_API_KEY", "re_key"),
            ("EMAIL_TO", "shop@example.com, owner@example.com ,"),
        ])
    }

    fn load(vars: HashMap<&'static str, &'static str>) -> Result<Config, ConfigError> {
        Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn defaults_fill_optional_settings() {
        let config = load(required()).unwrap();

        assert_eq!(config.port, 1111);
        assert_eq!(config.imgbb.url, "https://api.imgbb.com/1/upload");
        assert_eq!(config.resend.from, "onboarding@resend.dev");
        assert_eq!(config.resend.to, vec!["shop@example.com", "owner@example.com"]);
        assert_eq!(config.collections, Collections::default());
        assert_eq!(config.upload_retry, RetryPolicy::fixed(3, Duration::from_millis(1000)));
        assert_eq!(config.notify_retry.backoff, Backoff::Linear);
        assert_eq!(config.notify_retry.max_attempts, 2);
        assert_eq!(config.limits, Limits::default());
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn overrides_are_parsed() {
        let mut vars = required();
        vars.insert("RUST_PORT", "8080");
        vars.insert("UPLOAD_ATTEMPTS", "5");
        vars.insert("MAX_MODEL_BYTES", "1024");
        vars.insert("MAX_REQUEST_BYTES", "2048");
        let config = load(vars).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.upload_retry.max_attempts, 5);
        assert_eq!(config.limits.max_model_bytes, 1024);
        assert_eq!(config.limits.max_request_bytes, 2048);
    }

    #[test]
    fn missing_secret_is_an_error() {
        let mut vars = required();
        vars.remove("RESEND_API_KEY");
        assert_eq!(load(vars).err(), Some(ConfigError::Missing("RESEND_API_KEY")));

        let mut vars = required();
        vars.insert("EMAIL_TO", " , ");
        assert_eq!(load(vars).err(), Some(ConfigError::Missing("EMAIL_TO")));
    }

    #[test]
    fn unparsable_number_is_an_error() {
        let mut vars = required();
        vars.insert("RUST_PORT", "eleven");
        assert!(matches!(
            load(vars),
            Err(ConfigError::Invalid { key: "RUST_PORT", .. })
        ));
    }
}
