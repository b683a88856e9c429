use std::collections::BTreeMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use super::Provider;
use crate::auth::error::{AuthError, AuthResult};
use crate::auth::logger::LOGGER;

pub const RESPONSE_TYPE_CODE: &str = "code";

/// Characters left as-is in query values (RFC 3986 unreserved set).
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Keys owned by the builder; custom parameters cannot replace them.
const RESERVED_PARAMETERS: &[&str] = &["client_id", "redirect_uri", "response_type", "scope", "state"];

/// One authorization-code request, created per sign-in attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRequest {
    pub provider: Provider,
    pub authorization_endpoint: String,
    pub client_id: String,
    /// Sent verbatim; providers require an exact match with the registration.
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub response_type: &'static str,
    /// Correlation token echoed back by the callback page.
    pub state: String,
    pub custom_parameters: BTreeMap<String, String>,
}

impl AuthRequest {
    pub fn authorization_url(&self) -> AuthResult<Url> {
        build_auth_url(self)
    }
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE).to_string()
}

/// Builds the provider authorization URL for `request`.
///
/// Parameters are emitted in a fixed order: `client_id`, `redirect_uri`,
/// `response_type`, `scope`, `state`, the provider's own extras and finally
/// the custom parameters sorted by key. A custom parameter with the same key
/// as a provider extra replaces it.
pub fn build_auth_url(request: &AuthRequest) -> AuthResult<Url> {
    let provider = request.provider;
    if request.client_id.trim().is_empty() {
        return Err(AuthError::InvalidConfiguration(format!(
            "missing client id for {}",
            provider.display_name()
        )));
    }
    if request.state.is_empty() {
        return Err(AuthError::InvalidConfiguration(
            "authorization request has an empty state token".into(),
        ));
    }

    let redirect = Url::parse(&request.redirect_uri).map_err(|err| {
        AuthError::InvalidConfiguration(format!(
            "invalid redirect URI `{}`: {err}",
            request.redirect_uri
        ))
    })?;
    if !matches!(redirect.scheme(), "http" | "https") {
        return Err(AuthError::InvalidConfiguration(format!(
            "redirect URI `{}` must use http or https",
            request.redirect_uri
        )));
    }

    let mut url = Url::parse(&request.authorization_endpoint).map_err(|err| {
        AuthError::InvalidConfiguration(format!(
            "invalid authorization endpoint for {}: {err}",
            provider.display_name()
        ))
    })?;

    let mut params: Vec<(&str, String)> = vec![
        ("client_id", encode(&request.client_id)),
        ("redirect_uri", encode(&request.redirect_uri)),
        ("response_type", encode(request.response_type)),
    ];
    if !request.scopes.is_empty() {
        let scope = request
            .scopes
            .iter()
            .map(|scope| encode(scope))
            .collect::<Vec<_>>()
            .join(provider.scope_separator());
        params.push(("scope", scope));
    }
    params.push(("state", encode(&request.state)));

    for (key, value) in provider.extra_parameters() {
        if !request.custom_parameters.contains_key(*key) {
            params.push((*key, encode(value)));
        }
    }
    for (key, value) in &request.custom_parameters {
        if RESERVED_PARAMETERS.contains(&key.as_str()) {
            LOGGER.warn(format!(
                "ignoring custom parameter `{key}` for {}: reserved by the authorization request",
                provider.display_name()
            ));
            continue;
        }
        params.push((key.as_str(), encode(value)));
    }

    let mut query = params
        .iter()
        .map(|(key, value)| format!("{}={}", encode(key), value))
        .collect::<Vec<_>>()
        .join("&");
    if let Some(existing) = url.query().filter(|q| !q.is_empty()) {
        query = format!("{existing}&{query}");
    }
    url.set_query(Some(&query));
    Ok(url)
}
