//! Session configuration.

use std::time::Duration;

use directory::DirectoryError;
use reqwest::Url;
use serde::{Deserialize, Serialize};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONTENT_TYPE: &str = "application/json";

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_content_type() -> String {
    DEFAULT_CONTENT_TYPE.to_string()
}

/// Everything needed to open an [`crate::HttpSession`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Base URL of the device server, e.g. `https://deviceserver.example.com/`.
    pub url: String,
    /// Access key used as the OAuth username.
    pub key: String,
    /// Access secret used as the OAuth password.
    pub secret: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// `Content-Type` sent with instance writes.
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

impl SessionConfig {
    /// Creates a configuration with the default timeout and content type.
    pub fn new(url: impl Into<String>, key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key: key.into(),
            secret: secret.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            content_type: default_content_type(),
        }
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Checks the configuration and returns the parsed base URL.
    ///
    /// The returned URL always ends in `/` so relative hrefs resolve below it.
    pub fn validate(&self) -> Result<Url, DirectoryError> {
        let mut url = Url::parse(&self.url).map_err(|e| DirectoryError::Configuration {
            message: format!("url `{}` is not valid: {e}", self.url),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DirectoryError::Configuration {
                message: format!("url `{}` must use http or https", self.url),
            });
        }
        if self.key.trim().is_empty() {
            return Err(DirectoryError::Configuration {
                message: "key must not be empty".into(),
            });
        }
        if self.secret.is_empty() {
            return Err(DirectoryError::Configuration {
                message: "secret must not be empty".into(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(DirectoryError::Configuration {
                message: "timeout_secs must be greater than zero".into(),
            });
        }
        if self.content_type.trim().is_empty() {
            return Err(DirectoryError::Configuration {
                message: "content_type must not be empty".into(),
            });
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }
}

// The secret never reaches logs.
impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("url", &self.url)
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .field("content_type", &self.content_type)
            .finish()
    }
}
