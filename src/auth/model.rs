use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const OAUTH_SUCCESS: &str = "OAUTH_SUCCESS";
pub const OAUTH_ERROR: &str = "OAUTH_ERROR";

/// Profile reported by the token-exchange backend. Every field is best-effort.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl UserProfile {
    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Default::default()
        }
    }
}

/// Payload relayed from the callback page to the opener window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PopupMessage {
    #[serde(rename = "OAUTH_SUCCESS")]
    Success {
        user: UserProfile,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        state: Option<String>,
    },
    #[serde(rename = "OAUTH_ERROR")]
    Error {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        state: Option<String>,
    },
}

impl PopupMessage {
    pub fn state(&self) -> Option<&str> {
        match self {
            PopupMessage::Success { state, .. } | PopupMessage::Error { state, .. } => {
                state.as_deref()
            }
        }
    }

    pub fn message_type(&self) -> &'static str {
        match self {
            PopupMessage::Success { .. } => OAUTH_SUCCESS,
            PopupMessage::Error { .. } => OAUTH_ERROR,
        }
    }

    pub fn to_value(&self) -> Value {
        // Serializing plain strings and options into JSON cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Decodes `data` if it has the shape of a handshake message.
    pub fn from_value(data: &Value) -> Option<Self> {
        serde_json::from_value(data.clone()).ok()
    }
}

/// A `message` event observed on the parent window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowMessage {
    pub origin: String,
    pub data: Value,
}

impl WindowMessage {
    pub fn new(origin: impl Into<String>, data: Value) -> Self {
        Self {
            origin: origin.into(),
            data,
        }
    }
}
