//! Popup sign-in: the window capability, the opener and the handshake.
//!
//! Browser globals are never touched directly. Everything the handshake needs
//! from the parent window (opening a popup, the shared `message` bus, timers)
//! goes through [`WindowHost`], and the popup itself is a [`PopupWindow`].
//! The `wasm-web` feature provides implementations backed by `web_sys`; tests
//! use an in-memory host with a virtual clock.

mod callback;
mod exchange;
mod handshake;

use std::rc::Rc;
use std::time::Duration;

pub use callback::{CallbackOutcome, CallbackParams, CallbackReceiver, NO_CODE_ERROR};
pub use exchange::{CodeExchange, ExchangeRequest, HttpCodeExchange};
pub use handshake::{
    start_handshake, HandshakeOptions, HandshakeState, PendingHandshake, RejectedMessage,
    DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT,
};

use crate::auth::error::AuthResult;
use crate::auth::logger::LOGGER;
use crate::auth::model::WindowMessage;

pub const POPUP_FEATURES: &str = "width=500,height=600,scrollbars=yes,resizable=yes";
pub const BLANK_PAGE: &str = "about:blank";

/// Handle for a registered message listener.
pub type ListenerId = u64;
/// Handle for an interval or timeout.
pub type TimerId = u64;

pub type MessageCallback = Box<dyn FnMut(WindowMessage)>;
pub type TimerCallback = Box<dyn FnMut()>;

/// Capabilities of the parent window used by the popup flow.
pub trait WindowHost {
    /// Origin of the parent window, e.g. `https://app.example.com`.
    fn origin(&self) -> String;

    /// Mirrors `window.open`; `None` when the popup was blocked.
    fn open(&self, url: &str, name: &str, features: &str) -> Option<Rc<dyn PopupWindow>>;

    fn add_message_listener(&self, callback: MessageCallback) -> ListenerId;
    fn remove_message_listener(&self, id: ListenerId);

    fn set_interval(&self, period: Duration, callback: TimerCallback) -> TimerId;
    fn clear_interval(&self, id: TimerId);

    fn set_timeout(&self, delay: Duration, callback: TimerCallback) -> TimerId;
    fn clear_timeout(&self, id: TimerId);
}

/// A popup window opened by the parent.
pub trait PopupWindow {
    /// Sets the popup location.
    fn navigate(&self, url: &str) -> AuthResult<()>;
    fn is_closed(&self) -> bool;
    fn close(&self);
}

/// The popup's view of its opener, used by the callback page.
pub trait OpenerWindow {
    /// Origin of the page running inside the popup.
    fn origin(&self) -> String;

    /// Posts `message` to `window.opener`, restricted to `target_origin`.
    fn post_to_opener(&self, message: &serde_json::Value, target_origin: &str)
        -> AuthResult<()>;
}

/// Opens a blank popup named `name`.
///
/// Browsers only allow popups opened synchronously from a user gesture, so
/// this must be called directly inside the click handler, before any
/// `.await`. A blocked popup yields `None`.
pub fn open_popup(host: &dyn WindowHost, name: &str) -> Option<Rc<dyn PopupWindow>> {
    open_popup_with_features(host, name, POPUP_FEATURES)
}

pub fn open_popup_with_features(
    host: &dyn WindowHost,
    name: &str,
    features: &str,
) -> Option<Rc<dyn PopupWindow>> {
    let popup = host.open(BLANK_PAGE, name, features);
    if popup.is_none() {
        LOGGER.debug(format!("popup `{name}` was blocked by the browser"));
    }
    popup
}
