//! [`HttpSession`]: the REST implementation of [`DeviceServerSession`].

use async_trait::async_trait;
use directory::{rel, DeviceServerSession, DirectoryError, Href, Links};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::auth::TokenManager;
use crate::error_mapping::{check_response, map_reqwest_error};
use crate::SessionConfig;

const ACCEPT_JSON: &str = "application/json";

/// Token endpoint used when the entry point advertises none.
const DEFAULT_TOKEN_PATH: &str = "oauth/token";

/// Entry-point document.
#[derive(Debug, Deserialize)]
struct EntryPoint {
    #[serde(rename = "Links", default)]
    links: Links,
}

/// Authenticated HTTP session with a device server.
///
/// Cheap to share behind an `Arc`; concurrent requests only contend on the
/// token lock.
pub struct HttpSession {
    client: reqwest::Client,
    base_url: Url,
    content_type: String,
    tokens: TokenManager,
}

impl std::fmt::Debug for HttpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSession")
            .field("base_url", &self.base_url.as_str())
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

impl HttpSession {
    /// Validates `config`, discovers the token endpoint and logs in.
    #[instrument(skip(config), fields(url = %config.url))]
    pub async fn connect(config: &SessionConfig) -> Result<Self, DirectoryError> {
        let base_url = config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DirectoryError::Configuration {
                message: format!("HTTP client could not be built: {e}"),
            })?;

        let entry = fetch_entry_point(&client, &base_url, None).await?;
        let token_url = match entry.href(rel::AUTHENTICATE) {
            Some(href) => resolve(&base_url, href)?,
            None => base_url.join(DEFAULT_TOKEN_PATH).map_err(|e| {
                DirectoryError::Configuration {
                    message: format!("token endpoint could not be derived: {e}"),
                }
            })?,
        };
        debug!(token_url = %token_url, "token endpoint resolved");

        let tokens = TokenManager::new(
            client.clone(),
            token_url,
            config.key.clone(),
            config.secret.clone(),
        );
        tokens.login().await?;
        info!(url = %base_url, "connected to device server");

        Ok(Self {
            client,
            base_url,
            content_type: config.content_type.clone(),
            tokens,
        })
    }

    /// Base URL every relative href is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl DeviceServerSession for HttpSession {
    async fn entry_point(&self) -> Result<Links, DirectoryError> {
        let token = self.tokens.access_token().await?;
        fetch_entry_point(&self.client, &self.base_url, Some(&token)).await
    }

    async fn get(&self, href: &Href) -> Result<Value, DirectoryError> {
        let url = resolve(&self.base_url, href)?;
        let token = self.tokens.access_token().await?;
        debug!(url = %url, "GET");

        let resp = self
            .client
            .get(url)
            .bearer_auth(token)
            .header(ACCEPT, ACCEPT_JSON)
            .send()
            .await
            .map_err(|e| map_reqwest_error("GET", e))?;
        let resp = check_response("GET", href.as_str(), resp).await?;

        resp.json().await.map_err(|e| map_reqwest_error("GET", e))
    }

    async fn get_raw(&self, href: &Href) -> Result<Vec<u8>, DirectoryError> {
        let url = resolve(&self.base_url, href)?;
        let token = self.tokens.access_token().await?;
        debug!(url = %url, "GET raw");

        let resp = self
            .client
            .get(url)
            .bearer_auth(token)
            .header(ACCEPT, self.content_type.as_str())
            .send()
            .await
            .map_err(|e| map_reqwest_error("GET", e))?;
        let resp = check_response("GET", href.as_str(), resp).await?;

        let body = resp
            .bytes()
            .await
            .map_err(|e| map_reqwest_error("GET", e))?;
        Ok(body.to_vec())
    }

    async fn put(&self, href: &Href, body: Option<&[u8]>) -> Result<(), DirectoryError> {
        let url = resolve(&self.base_url, href)?;
        let token = self.tokens.access_token().await?;
        let body = body.map(<[u8]>::to_vec).unwrap_or_default();
        debug!(url = %url, bytes = body.len(), "PUT");

        let resp = self
            .client
            .put(url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, self.content_type.as_str())
            .body(body)
            .send()
            .await
            .map_err(|e| map_reqwest_error("PUT", e))?;
        check_response("PUT", href.as_str(), resp).await?;
        Ok(())
    }
}

fn resolve(base: &Url, href: &Href) -> Result<Url, DirectoryError> {
    base.join(href.as_str())
        .map_err(|e| DirectoryError::protocol(format!("href `{href}` cannot be resolved: {e}")))
}

async fn fetch_entry_point(
    client: &reqwest::Client,
    base_url: &Url,
    token: Option<&str>,
) -> Result<Links, DirectoryError> {
    let mut req = client.get(base_url.clone()).header(ACCEPT, ACCEPT_JSON);
    if let Some(token) = token {
        req = req.bearer_auth(token);
    }

    let resp = req
        .send()
        .await
        .map_err(|e| map_reqwest_error("GET entry point", e))?;
    let resp = check_response("GET entry point", base_url.as_str(), resp).await?;
    let entry: EntryPoint = resp
        .json()
        .await
        .map_err(|e| map_reqwest_error("GET entry point", e))?;
    Ok(entry.links)
}
