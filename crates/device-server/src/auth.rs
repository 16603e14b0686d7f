//! OAuth token management.
//!
//! Obtains access tokens with the password grant (access key and secret),
//! renews them with the refresh grant shortly before they expire, and falls
//! back to a fresh password login when renewal is refused.

use chrono::{DateTime, TimeDelta, Utc};
use directory::DirectoryError;
use reqwest::Url;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error_mapping::{check_response, map_reqwest_error};

/// Tokens this close to expiry are renewed before use.
const REFRESH_MARGIN_SECS: i64 = 60;

/// Lifetime assumed when the server omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct TokenState {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: DateTime<Utc>,
}

/// Holds and renews the bearer token of one session.
pub(crate) struct TokenManager {
    client: reqwest::Client,
    token_url: Url,
    key: String,
    secret: String,
    state: RwLock<Option<TokenState>>,
}

impl TokenManager {
    pub(crate) fn new(
        client: reqwest::Client,
        token_url: Url,
        key: String,
        secret: String,
    ) -> Self {
        Self {
            client,
            token_url,
            key,
            secret,
            state: RwLock::new(None),
        }
    }

    /// Exchanges key and secret for a token.
    pub(crate) async fn login(&self) -> Result<(), DirectoryError> {
        let state = self
            .request_token(&[
                ("grant_type", "password"),
                ("username", self.key.as_str()),
                ("password", self.secret.as_str()),
            ])
            .await?;

        debug!(expires_at = %state.expires_at, "device server login succeeded");
        *self.state.write().await = Some(state);
        Ok(())
    }

    /// Renews the token with the refresh grant.
    pub(crate) async fn refresh(&self) -> Result<(), DirectoryError> {
        let refresh_token = {
            let state = self.state.read().await;
            state
                .as_ref()
                .and_then(|s| s.refresh_token.clone())
                .ok_or_else(|| DirectoryError::Authentication {
                    message: "no refresh token available".into(),
                })?
        };

        let mut state = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
            ])
            .await?;
        if state.refresh_token.is_none() {
            state.refresh_token = Some(refresh_token);
        }

        debug!(expires_at = %state.expires_at, "device server token refreshed");
        *self.state.write().await = Some(state);
        Ok(())
    }

    /// Returns a usable access token, renewing it first if it is about to
    /// expire.
    pub(crate) async fn access_token(&self) -> Result<String, DirectoryError> {
        let needs_renewal = {
            let state = self.state.read().await;
            match &*state {
                Some(s) => Utc::now() + TimeDelta::seconds(REFRESH_MARGIN_SECS) >= s.expires_at,
                None => true,
            }
        };

        if needs_renewal {
            if let Err(e) = self.refresh().await {
                warn!("token refresh failed, logging in again: {e}");
                self.login().await?;
            }
        }

        let state = self.state.read().await;
        state
            .as_ref()
            .map(|s| s.access_token.clone())
            .ok_or_else(|| DirectoryError::Authentication {
                message: "not authenticated".into(),
            })
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenState, DirectoryError> {
        const OPERATION: &str = "POST token";

        let resp = self
            .client
            .post(self.token_url.clone())
            .form(form)
            .send()
            .await
            .map_err(|e| map_reqwest_error(OPERATION, e))?;

        let resp = match check_response(OPERATION, self.token_url.as_str(), resp).await {
            // The token endpoint answers a bad grant with 400.
            Err(DirectoryError::InvalidArgument { message }) => {
                return Err(DirectoryError::Authentication { message })
            }
            other => other?,
        };

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| map_reqwest_error(OPERATION, e))?;

        Ok(TokenState {
            expires_at: expiry(Utc::now(), token.expires_in)?,
            access_token: token.access_token,
            refresh_token: token.refresh_token,
        })
    }

    #[cfg(test)]
    async fn expire_now(&self) {
        if let Some(state) = self.state.write().await.as_mut() {
            state.expires_at = Utc::now();
        }
    }
}

/// Instant a token issued at `now` with lifetime `expires_in` expires.
fn expiry(now: DateTime<Utc>, expires_in: Option<i64>) -> Result<DateTime<Utc>, DirectoryError> {
    let secs = expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
    TimeDelta::try_seconds(secs)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| DirectoryError::protocol(format!("token expires_in {secs} is out of range")))
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;

    fn manager(server: &mockito::ServerGuard) -> TokenManager {
        let url = Url::parse(&format!("{}/oauth/token", server.url())).unwrap();
        TokenManager::new(reqwest::Client::new(), url, "key".into(), "secret".into())
    }

    #[tokio::test]
    async fn login_posts_password_grant() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "password".into()),
                Matcher::UrlEncoded("username".into(), "key".into()),
                Matcher::UrlEncoded("password".into(), "secret".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"tok1","refresh_token":"ref1","expires_in":3600}"#)
            .create_async()
            .await;

        let tm = manager(&server);
        tm.login().await.unwrap();
        assert_eq!(tm.access_token().await.unwrap(), "tok1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_credentials_are_authentication_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/oauth/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;

        let err = manager(&server).login().await.unwrap_err();
        assert!(matches!(err, DirectoryError::Authentication { .. }), "{err}");
    }

    #[tokio::test]
    async fn expiring_token_is_refreshed() {
        let mut server = mockito::Server::new_async().await;
        let _login = server
            .mock("POST", "/oauth/token")
            .match_body(Matcher::UrlEncoded("grant_type".into(), "password".into()))
            .with_status(200)
            .with_body(r#"{"access_token":"tok1","refresh_token":"ref1","expires_in":3600}"#)
            .create_async()
            .await;
        let refresh = server
            .mock("POST", "/oauth/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                Matcher::UrlEncoded("refresh_token".into(), "ref1".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"access_token":"tok2","expires_in":3600}"#)
            .create_async()
            .await;

        let tm = manager(&server);
        tm.login().await.unwrap();
        tm.expire_now().await;

        assert_eq!(tm.access_token().await.unwrap(), "tok2");
        refresh.assert_async().await;

        // The refresh token survives a response that omits it.
        let state = tm.state.read().await.clone().unwrap();
        assert_eq!(state.refresh_token.as_deref(), Some("ref1"));
    }

    #[tokio::test]
    async fn refused_refresh_falls_back_to_login() {
        let mut server = mockito::Server::new_async().await;
        let login = server
            .mock("POST", "/oauth/token")
            .match_body(Matcher::UrlEncoded("grant_type".into(), "password".into()))
            .with_status(200)
            .with_body(r#"{"access_token":"tok","refresh_token":"ref","expires_in":3600}"#)
            .expect(2)
            .create_async()
            .await;
        let _refresh = server
            .mock("POST", "/oauth/token")
            .match_body(Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()))
            .with_status(401)
            .create_async()
            .await;

        let tm = manager(&server);
        tm.login().await.unwrap();
        tm.expire_now().await;

        assert_eq!(tm.access_token().await.unwrap(), "tok");
        login.assert_async().await;
    }

    #[tokio::test]
    async fn out_of_range_lifetime_is_a_protocol_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/oauth/token")
            .with_status(200)
            .with_body(r#"{"access_token":"t","expires_in":9223372036854775807}"#)
            .create_async()
            .await;

        let tm = manager(&server);
        let err = tm.login().await.unwrap_err();
        assert!(matches!(err, DirectoryError::Protocol { .. }), "{err}");
        assert!(tm.state.read().await.is_none());
    }

    #[test]
    fn expiry_handles_negative_and_default_lifetimes() {
        let now = Utc::now();
        assert_eq!(expiry(now, None).unwrap(), now + TimeDelta::seconds(3600));
        assert_eq!(expiry(now, Some(-30)).unwrap(), now - TimeDelta::seconds(30));
        assert!(expiry(now, Some(i64::MIN)).is_err());
    }

    #[tokio::test]
    async fn unreachable_token_endpoint_is_a_transport_error() {
        let url = Url::parse("http://127.0.0.1:1/oauth/token").unwrap();
        let tm = TokenManager::new(reqwest::Client::new(), url, "k".into(), "s".into());
        let err = tm.login().await.unwrap_err();
        assert!(matches!(err, DirectoryError::Transport { .. }), "{err}");
    }
}
