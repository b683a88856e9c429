//! `web_sys` implementations of the popup window capabilities.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use gloo_timers::callback::{Interval, Timeout};
use serde_json::Value;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{MessageEvent, Window};

use crate::auth::config::AuthSettings;
use crate::auth::error::{AuthError, AuthResult};
use crate::auth::model::WindowMessage;
use crate::auth::oauth::Provider;
use crate::auth::popup::{
    CallbackOutcome, ListenerId, MessageCallback, OpenerWindow, PopupWindow, TimerCallback,
    TimerId, WindowHost,
};
use crate::auth::PopupAuth;
use crate::platform::runtime::{drop_later, spawn_detached};

const MESSAGE_EVENT: &str = "message";

pub(crate) fn stringify_js_error(err: &JsValue) -> String {
    if let Some(string) = err.as_string() {
        return string;
    }

    if let Ok(stringified) = js_sys::JSON::stringify(err) {
        if let Some(text) = stringified.as_string() {
            return text;
        }
    }

    format!("{err:?}")
}

fn map_js_error(err: JsValue) -> AuthError {
    AuthError::Popup(stringify_js_error(&err))
}

fn browser_window() -> AuthResult<Window> {
    web_sys::window().ok_or_else(|| {
        AuthError::Popup("window object is not available in this environment".into())
    })
}

fn millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}

/// Converts `postMessage` data to JSON; non-serializable payloads become null.
fn message_data(event: &MessageEvent) -> Value {
    let data = event.data();
    if data.is_null() || data.is_undefined() {
        return Value::Null;
    }
    js_sys::JSON::stringify(&data)
        .ok()
        .and_then(|text| text.as_string())
        .and_then(|text| serde_json::from_str(&text).ok())
        .unwrap_or(Value::Null)
}

/// The current browser window as a [`WindowHost`].
pub struct BrowserWindowHost {
    window: Window,
    next_id: Cell<u64>,
    listeners: RefCell<HashMap<ListenerId, Closure<dyn FnMut(MessageEvent)>>>,
    intervals: RefCell<HashMap<TimerId, Interval>>,
    timeouts: RefCell<HashMap<TimerId, Timeout>>,
}

impl BrowserWindowHost {
    pub fn new() -> AuthResult<Self> {
        Ok(Self::from_window(browser_window()?))
    }

    pub fn from_window(window: Window) -> Self {
        Self {
            window,
            next_id: Cell::new(1),
            listeners: RefCell::new(HashMap::new()),
            intervals: RefCell::new(HashMap::new()),
            timeouts: RefCell::new(HashMap::new()),
        }
    }

    fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

impl WindowHost for BrowserWindowHost {
    fn origin(&self) -> String {
        self.window.location().origin().unwrap_or_default()
    }

    fn open(&self, url: &str, name: &str, features: &str) -> Option<Rc<dyn PopupWindow>> {
        match self
            .window
            .open_with_url_and_target_and_features(url, name, features)
        {
            Ok(Some(window)) => {
                let popup: Rc<dyn PopupWindow> = Rc::new(BrowserPopup { window });
                Some(popup)
            }
            Ok(None) => None,
            Err(err) => {
                log::warn!("window.open failed: {}", stringify_js_error(&err));
                None
            }
        }
    }

    fn add_message_listener(&self, mut callback: MessageCallback) -> ListenerId {
        let id = self.next_id();
        let closure = Closure::wrap(Box::new(move |event: MessageEvent| {
            callback(WindowMessage::new(event.origin(), message_data(&event)));
        }) as Box<dyn FnMut(MessageEvent)>);
        if let Err(err) = self
            .window
            .add_event_listener_with_callback(MESSAGE_EVENT, closure.as_ref().unchecked_ref())
        {
            log::error!("addEventListener(message) failed: {}", stringify_js_error(&err));
        }
        self.listeners.borrow_mut().insert(id, closure);
        id
    }

    fn remove_message_listener(&self, id: ListenerId) {
        let Some(closure) = self.listeners.borrow_mut().remove(&id) else {
            return;
        };
        if let Err(err) = self
            .window
            .remove_event_listener_with_callback(MESSAGE_EVENT, closure.as_ref().unchecked_ref())
        {
            log::error!("removeEventListener(message) failed: {}", stringify_js_error(&err));
        }
        // Removal usually happens from inside this very closure.
        drop_later(closure);
    }

    fn set_interval(&self, period: Duration, mut callback: TimerCallback) -> TimerId {
        let id = self.next_id();
        let interval = Interval::new(millis(period), move || callback());
        self.intervals.borrow_mut().insert(id, interval);
        id
    }

    fn clear_interval(&self, id: TimerId) {
        if let Some(interval) = self.intervals.borrow_mut().remove(&id) {
            drop_later(interval.cancel());
        }
    }

    fn set_timeout(&self, delay: Duration, mut callback: TimerCallback) -> TimerId {
        let id = self.next_id();
        let timeout = Timeout::new(millis(delay), move || callback());
        self.timeouts.borrow_mut().insert(id, timeout);
        id
    }

    fn clear_timeout(&self, id: TimerId) {
        if let Some(timeout) = self.timeouts.borrow_mut().remove(&id) {
            drop_later(timeout.cancel());
        }
    }
}

/// A window returned by `window.open`.
pub struct BrowserPopup {
    window: Window,
}

impl BrowserPopup {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl PopupWindow for BrowserPopup {
    fn navigate(&self, url: &str) -> AuthResult<()> {
        self.window.location().set_href(url).map_err(map_js_error)
    }

    fn is_closed(&self) -> bool {
        // A window we can no longer inspect is as good as closed.
        self.window.closed().unwrap_or(true)
    }

    fn close(&self) {
        if let Err(err) = self.window.close() {
            log::debug!("popup close failed: {}", stringify_js_error(&err));
        }
    }
}

/// `window.opener` as seen from the callback page.
pub struct BrowserOpener {
    window: Window,
}

impl BrowserOpener {
    pub fn new() -> AuthResult<Self> {
        Ok(Self {
            window: browser_window()?,
        })
    }

    fn opener(&self) -> AuthResult<Window> {
        let opener = self.window.opener().map_err(map_js_error)?;
        if opener.is_null() || opener.is_undefined() {
            return Err(AuthError::Popup("window.opener is not available".into()));
        }
        opener
            .dyn_into::<Window>()
            .map_err(|_| AuthError::Popup("window.opener is not a window".into()))
    }
}

impl OpenerWindow for BrowserOpener {
    fn origin(&self) -> String {
        self.window.location().origin().unwrap_or_default()
    }

    fn post_to_opener(&self, message: &Value, target_origin: &str) -> AuthResult<()> {
        let serialized = serde_json::to_string(message)
            .map_err(|err| AuthError::Popup(format!("failed to encode message: {err}")))?;
        let payload = js_sys::JSON::parse(&serialized).map_err(map_js_error)?;
        self.opener()?
            .post_message(&payload, target_origin)
            .map_err(map_js_error)
    }
}

/// Runs the provider callback page: relays the redirect result to the
/// opener, then closes the popup if the opener has not already done so.
pub fn run_callback_page(provider: Provider, settings: AuthSettings) -> AuthResult<()> {
    let window = browser_window()?;
    let href = window.location().href().map_err(map_js_error)?;
    let host: Rc<dyn WindowHost> = Rc::new(BrowserWindowHost::from_window(window.clone()));
    let auth = PopupAuth::builder(host).with_settings(settings).build()?;
    let receiver = auth.callback_receiver(provider, Rc::new(BrowserOpener::new()?))?;

    spawn_detached(async move {
        if let CallbackOutcome::Relayed(_) = receiver.handle(&href).await {
            if let Err(err) = window.close() {
                log::debug!("callback page close failed: {}", stringify_js_error(&err));
            }
        }
    });
    Ok(())
}
