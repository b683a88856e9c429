use std::rc::Rc;

use url::Url;

use super::exchange::CodeExchange;
use super::OpenerWindow;
use crate::auth::error::{AuthError, AuthResult};
use crate::auth::logger::LOGGER;
use crate::auth::model::PopupMessage;
use crate::auth::oauth::Provider;

/// Error relayed when the redirect carries neither `code` nor `error`.
pub const NO_CODE_ERROR: &str = "no_code";

/// Query parameters of the provider redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
    pub state: Option<String>,
}

impl CallbackParams {
    pub fn from_url(url: &str) -> AuthResult<Self> {
        let url = Url::parse(url)
            .map_err(|err| AuthError::InvalidConfiguration(format!("invalid callback URL: {err}")))?;
        let mut params = CallbackParams::default();
        for (key, value) in url.query_pairs() {
            let value = value.into_owned();
            if value.is_empty() {
                continue;
            }
            let slot = match key.as_ref() {
                "code" => &mut params.code,
                "error" => &mut params.error,
                "error_description" => &mut params.error_description,
                "state" => &mut params.state,
                _ => continue,
            };
            // First occurrence wins, like URLSearchParams.get.
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        Ok(params)
    }

    fn error_reason(&self) -> Option<String> {
        let error = self.error.as_ref()?;
        Some(match &self.error_description {
            Some(description) => format!("{error}: {description}"),
            None => error.clone(),
        })
    }
}

/// What the callback page relayed to its opener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Relayed(PopupMessage),
    /// The message could not be posted (no opener, or it navigated away).
    Undelivered(PopupMessage, AuthError),
}

impl CallbackOutcome {
    pub fn message(&self) -> &PopupMessage {
        match self {
            CallbackOutcome::Relayed(message) | CallbackOutcome::Undelivered(message, _) => message,
        }
    }
}

/// Handles the provider redirect inside the popup.
///
/// The receiver never settles anything itself. It reports the outcome to the
/// opener with `postMessage` restricted to its own origin, where the parent's
/// handshake picks it up.
pub struct CallbackReceiver {
    provider: Provider,
    opener: Rc<dyn OpenerWindow>,
    exchange: Rc<dyn CodeExchange>,
}

impl CallbackReceiver {
    pub fn new(
        provider: Provider,
        opener: Rc<dyn OpenerWindow>,
        exchange: Rc<dyn CodeExchange>,
    ) -> Self {
        Self {
            provider,
            opener,
            exchange,
        }
    }

    /// Processes the redirect at `callback_url` and relays the result.
    pub async fn handle(&self, callback_url: &str) -> CallbackOutcome {
        let params = match CallbackParams::from_url(callback_url) {
            Ok(params) => params,
            Err(err) => {
                LOGGER.warn(format!("{} callback: {err}", self.provider));
                CallbackParams::default()
            }
        };
        let message = self.resolve(&params).await;
        self.relay(message)
    }

    async fn resolve(&self, params: &CallbackParams) -> PopupMessage {
        let state = params.state.clone();
        if let Some(reason) = params.error_reason() {
            return PopupMessage::Error {
                error: reason,
                state,
            };
        }
        let Some(code) = params.code.as_deref() else {
            return PopupMessage::Error {
                error: NO_CODE_ERROR.to_string(),
                state,
            };
        };

        match self.exchange.exchange(self.provider, code).await {
            Ok(user) => PopupMessage::Success { user, state },
            Err(err) => {
                LOGGER.warn(format!("{} code exchange failed: {err}", self.provider));
                PopupMessage::Error {
                    error: err.to_string(),
                    state,
                }
            }
        }
    }

    fn relay(&self, message: PopupMessage) -> CallbackOutcome {
        let target_origin = self.opener.origin();
        match self.opener.post_to_opener(&message.to_value(), &target_origin) {
            Ok(()) => CallbackOutcome::Relayed(message),
            Err(err) => {
                LOGGER.warn(format!(
                    "{} callback could not reach its opener: {err}",
                    self.provider
                ));
                CallbackOutcome::Undelivered(message, err)
            }
        }
    }
}
