use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use url::Url;

use crate::auth::error::{AuthError, AuthResult};
use crate::auth::model::UserProfile;
use crate::auth::oauth::Provider;

/// Body sent to the token-exchange backend.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExchangeRequest {
    pub code: String,
}

/// Trades an authorization code for the signed-in user's profile.
///
/// The exchange must happen on a trusted backend: client secrets never ship
/// to the browser.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait CodeExchange {
    async fn exchange(&self, provider: Provider, code: &str) -> AuthResult<UserProfile>;
}

/// Calls `POST {base}/auth/{provider}/callback` with `{ "code": ... }`.
#[derive(Debug, Clone)]
pub struct HttpCodeExchange {
    client: Client,
    base_url: Url,
}

impl HttpCodeExchange {
    pub fn new(base_url: &str) -> AuthResult<Self> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> AuthResult<Self> {
        let base_url = Url::parse(base_url).map_err(|err| {
            AuthError::InvalidConfiguration(format!("invalid exchange backend `{base_url}`: {err}"))
        })?;
        Ok(Self { client, base_url })
    }

    pub fn endpoint(&self, provider: Provider) -> AuthResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                AuthError::InvalidConfiguration(format!(
                    "exchange backend `{}` cannot be a base URL",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(["auth", provider.id(), "callback"]);
        Ok(url)
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl CodeExchange for HttpCodeExchange {
    async fn exchange(&self, provider: Provider, code: &str) -> AuthResult<UserProfile> {
        let url = self.endpoint(provider)?;
        let request = ExchangeRequest {
            code: code.to_owned(),
        };

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|err| AuthError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::ExchangeFailed(format!(
                "{} callback returned {status}: {body}",
                provider.display_name()
            )));
        }

        response
            .json::<UserProfile>()
            .await
            .map_err(|err| AuthError::ExchangeFailed(format!("malformed profile response: {err}")))
    }
}
