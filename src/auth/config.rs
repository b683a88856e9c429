use std::time::Duration;

use crate::auth::accounts::DEFAULT_ACCOUNT_LIMIT;
use crate::auth::error::{AuthError, AuthResult};
use crate::auth::popup::{HandshakeOptions, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT, POPUP_FEATURES};

/// Runtime options for popup sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    /// Overrides the origin reported by the window host.
    pub origin: Option<String>,
    /// Base of the token-exchange backend; defaults to `{origin}/api`.
    pub backend_url: Option<String>,
    pub poll_interval: Duration,
    /// `None` disables the handshake timeout.
    pub timeout: Option<Duration>,
    pub popup_features: String,
    pub account_limit: usize,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            origin: None,
            backend_url: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: Some(DEFAULT_TIMEOUT),
            popup_features: POPUP_FEATURES.to_string(),
            account_limit: DEFAULT_ACCOUNT_LIMIT,
        }
    }
}

impl AuthSettings {
    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = Some(url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// The configured origin, or `host_origin` when none is set.
    pub fn resolve_origin(&self, host_origin: &str) -> String {
        self.origin
            .clone()
            .unwrap_or_else(|| host_origin.to_string())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn backend_base(&self, origin: &str) -> String {
        match &self.backend_url {
            Some(url) => url.clone(),
            None => format!("{}/api", origin.trim_end_matches('/')),
        }
    }

    pub fn handshake_options(&self) -> HandshakeOptions {
        HandshakeOptions {
            poll_interval: self.poll_interval,
            timeout: self.timeout,
            expected_origin: self
                .origin
                .as_deref()
                .map(|origin| origin.trim_end_matches('/').to_string()),
        }
    }

    pub fn validate(&self) -> AuthResult<()> {
        if self.poll_interval.is_zero() {
            return Err(AuthError::InvalidConfiguration(
                "poll interval must be greater than zero".into(),
            ));
        }
        if self.timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(AuthError::InvalidConfiguration(
                "timeout must be greater than zero; use None to disable it".into(),
            ));
        }
        if self.account_limit == 0 {
            return Err(AuthError::InvalidConfiguration(
                "account limit must be at least one".into(),
            ));
        }
        Ok(())
    }
}
