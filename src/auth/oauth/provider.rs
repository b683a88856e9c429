use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::request::{AuthRequest, RESPONSE_TYPE_CODE};
use super::state::generate_state;
use crate::auth::error::{AuthError, AuthResult};
use crate::platform::environment::provider_client_id;

/// Identity providers offered on the login and signup forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    Microsoft,
    Yahoo,
}

const DEFAULT_SCOPES: &[&str] = &["openid", "email", "profile"];

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Google, Provider::Microsoft, Provider::Yahoo];

    /// Identifier used in redirect paths and backend routes.
    pub fn id(self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Microsoft => "microsoft",
            Provider::Yahoo => "yahoo",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Provider::Google => "Google",
            Provider::Microsoft => "Microsoft",
            Provider::Yahoo => "Yahoo",
        }
    }

    /// Window name passed to `window.open` for this provider's popup.
    pub fn popup_name(self) -> &'static str {
        match self {
            Provider::Google => "google-login",
            Provider::Microsoft => "microsoft-login",
            Provider::Yahoo => "yahoo-login",
        }
    }

    pub fn authorization_endpoint(self) -> &'static str {
        match self {
            Provider::Google => "https://accounts.google.com/o/oauth2/v2/auth",
            Provider::Microsoft => {
                "https://login.microsoftonline.com/common/oauth2/v2.0/authorize"
            }
            Provider::Yahoo => "https://api.login.yahoo.com/oauth2/request_auth",
        }
    }

    pub fn default_scopes(self) -> &'static [&'static str] {
        DEFAULT_SCOPES
    }

    /// Already-encoded separator placed between scope values.
    pub(crate) fn scope_separator(self) -> &'static str {
        match self {
            Provider::Google => "+",
            Provider::Microsoft | Provider::Yahoo => "%20",
        }
    }

    /// Fixed query parameters the provider expects on every request.
    pub(crate) fn extra_parameters(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Provider::Google => &[("access_type", "offline"), ("prompt", "consent")],
            Provider::Microsoft => &[("response_mode", "query")],
            Provider::Yahoo => &[],
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Provider {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" | "google.com" => Ok(Provider::Google),
            "microsoft" | "microsoft.com" => Ok(Provider::Microsoft),
            "yahoo" | "yahoo.com" => Ok(Provider::Yahoo),
            other => Err(AuthError::InvalidConfiguration(format!(
                "unknown identity provider `{other}`"
            ))),
        }
    }
}

/// Builder-like configuration for one identity provider.
///
/// The provider stores the registered client id, the redirect URI, scopes and
/// custom parameters, and produces a fresh [`AuthRequest`] (with a new `state`
/// token) for every sign-in attempt.
#[derive(Debug, Clone)]
pub struct OAuthProvider {
    provider: Provider,
    client_id: String,
    redirect_uri: Option<String>,
    authorization_endpoint: Option<String>,
    scopes: Vec<String>,
    custom_parameters: BTreeMap<String, String>,
}

impl OAuthProvider {
    /// Creates a provider with its default scopes.
    pub fn new(provider: Provider, client_id: impl Into<String>) -> Self {
        Self {
            provider,
            client_id: client_id.into(),
            redirect_uri: None,
            authorization_endpoint: None,
            scopes: provider.default_scopes().iter().map(|s| s.to_string()).collect(),
            custom_parameters: BTreeMap::new(),
        }
    }

    /// Creates a provider whose client id comes from `AIVA_{PROVIDER}_CLIENT_ID`
    /// or the `__AIVA_AUTH_DEFAULTS__` object.
    pub fn from_environment(provider: Provider) -> AuthResult<Self> {
        let client_id = provider_client_id(provider).ok_or_else(|| {
            AuthError::InvalidConfiguration(format!(
                "no client id configured for {}; set AIVA_{}_CLIENT_ID",
                provider.display_name(),
                provider.id().to_ascii_uppercase()
            ))
        })?;
        Ok(Self::new(provider, client_id))
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn custom_parameters(&self) -> &BTreeMap<String, String> {
        &self.custom_parameters
    }

    /// Adds a scope to the provider if it has not been added yet.
    pub fn add_scope(&mut self, scope: impl Into<String>) -> &mut Self {
        let value = scope.into();
        if !self.scopes.contains(&value) {
            self.scopes.push(value);
        }
        self
    }

    /// Replaces the scopes, keeping the first occurrence of duplicates.
    pub fn set_scopes<I, S>(&mut self, scopes: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes.clear();
        for scope in scopes {
            self.add_scope(scope);
        }
        self
    }

    pub fn set_custom_parameter(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.custom_parameters.insert(key.into(), value.into());
        self
    }

    pub fn set_custom_parameters(&mut self, parameters: BTreeMap<String, String>) -> &mut Self {
        self.custom_parameters = parameters;
        self
    }

    /// Overrides the default `{origin}/auth/{provider}/callback` redirect URI.
    pub fn set_redirect_uri(&mut self, uri: impl Into<String>) -> &mut Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Points the provider at a different authorization endpoint.
    pub fn set_authorization_endpoint(&mut self, endpoint: impl Into<String>) -> &mut Self {
        self.authorization_endpoint = Some(endpoint.into());
        self
    }

    pub fn authorization_endpoint(&self) -> &str {
        self.authorization_endpoint
            .as_deref()
            .unwrap_or_else(|| self.provider.authorization_endpoint())
    }

    /// Returns the redirect URI registered for `origin`.
    pub fn redirect_uri(&self, origin: &str) -> String {
        match &self.redirect_uri {
            Some(uri) => uri.clone(),
            None => format!(
                "{}/auth/{}/callback",
                origin.trim_end_matches('/'),
                self.provider.id()
            ),
        }
    }

    /// Builds the request for a new sign-in attempt with a fresh `state`.
    pub fn build_request(&self, origin: &str) -> AuthResult<AuthRequest> {
        self.build_request_with_state(origin, generate_state())
    }

    pub fn build_request_with_state(
        &self,
        origin: &str,
        state: impl Into<String>,
    ) -> AuthResult<AuthRequest> {
        if self.client_id.trim().is_empty() {
            return Err(AuthError::InvalidConfiguration(format!(
                "missing client id for {}",
                self.provider.display_name()
            )));
        }
        let request = AuthRequest {
            provider: self.provider,
            authorization_endpoint: self.authorization_endpoint().to_string(),
            client_id: self.client_id.clone(),
            redirect_uri: self.redirect_uri(origin),
            scopes: self.scopes.clone(),
            response_type: RESPONSE_TYPE_CODE,
            state: state.into(),
            custom_parameters: self.custom_parameters.clone(),
        };
        // Surface malformed configuration now, before any popup navigates.
        request.authorization_url()?;
        Ok(request)
    }
}
