use std::fmt;

use crate::auth::oauth::Provider;

pub type AuthResult<T> = Result<T, AuthError>;

pub(crate) const POPUP_BLOCKED_GUIDANCE: &str = "Please allow pop-ups for this site and try again. \
Check your browser's address bar for a pop-up blocker icon.";

/// Classified failure of a sign-in attempt.
///
/// Callers branch on the variant (or [`AuthError::code`]) to pick the text
/// shown next to the provider buttons. `PopupBlocked`, `UserCancelled` and
/// `TimedOut` are expected outcomes the user can retry directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    PopupBlocked,
    UserCancelled,
    TimedOut,
    ProviderError(String),
    ExchangeFailed(String),
    Network(String),
    Popup(String),
    InvalidConfiguration(String),
    Persistence(String),
}

impl AuthError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::PopupBlocked => "popup_blocked",
            AuthError::UserCancelled => "user_cancelled",
            AuthError::TimedOut => "timed_out",
            AuthError::ProviderError(_) => "provider_error",
            AuthError::ExchangeFailed(_) => "exchange_failed",
            AuthError::Network(_) => "network_error",
            AuthError::Popup(_) => "popup_error",
            AuthError::InvalidConfiguration(_) => "invalid_configuration",
            AuthError::Persistence(_) => "persistence_error",
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AuthError::PopupBlocked | AuthError::UserCancelled | AuthError::TimedOut
        )
    }

    /// Text suitable for the login and signup forms.
    ///
    /// Diagnostic reasons are deliberately left out; they are logged instead.
    pub fn user_message(&self, provider: Provider) -> String {
        let name = provider.display_name();
        match self {
            AuthError::PopupBlocked => POPUP_BLOCKED_GUIDANCE.to_string(),
            AuthError::UserCancelled => {
                format!("{name} sign-in was cancelled. Click the button again to retry.")
            }
            AuthError::TimedOut => {
                format!("{name} sign-in timed out. Please try again.")
            }
            _ => format!("{name} login failed. Please try again."),
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::PopupBlocked => write!(f, "Popup blocked"),
            AuthError::UserCancelled => write!(f, "Authentication cancelled"),
            AuthError::TimedOut => write!(f, "Authentication timed out"),
            AuthError::ProviderError(reason) => write!(f, "Provider error: {reason}"),
            AuthError::ExchangeFailed(reason) => write!(f, "Code exchange failed: {reason}"),
            AuthError::Network(message) => write!(f, "Network error: {message}"),
            AuthError::Popup(message) => write!(f, "Popup error: {message}"),
            AuthError::InvalidConfiguration(message) => {
                write!(f, "Invalid configuration: {message}")
            }
            AuthError::Persistence(message) => write!(f, "Persistence error: {message}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<url::ParseError> for AuthError {
    fn from(error: url::ParseError) -> Self {
        AuthError::InvalidConfiguration(error.to_string())
    }
}
