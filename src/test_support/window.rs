//! In-memory window capabilities with a virtual clock.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::auth::error::{AuthError, AuthResult};
use crate::auth::model::{UserProfile, WindowMessage};
use crate::auth::oauth::Provider;
use crate::auth::popup::{
    CodeExchange, ListenerId, MessageCallback, OpenerWindow, PopupWindow, TimerCallback, TimerId,
    WindowHost, BLANK_PAGE,
};

struct Timer {
    due: Duration,
    period: Option<Duration>,
    callback: Rc<RefCell<TimerCallback>>,
}

/// A popup recorded by [`FakeWindowHost::open`].
#[derive(Clone)]
pub struct OpenedPopup {
    pub name: String,
    pub url: String,
    pub features: String,
    pub window: Rc<FakePopup>,
}

/// Parent window double.
///
/// Timers only fire from [`FakeWindowHost::advance`], in due order. A host
/// created with [`FakeWindowHost::blocking`] refuses popups opened outside
/// [`FakeWindowHost::with_user_gesture`], like a browser popup blocker.
pub struct FakeWindowHost {
    origin: String,
    requires_gesture: bool,
    gesture: Cell<bool>,
    now: Cell<Duration>,
    next_id: Cell<u64>,
    listeners: RefCell<BTreeMap<ListenerId, Rc<RefCell<MessageCallback>>>>,
    timers: RefCell<BTreeMap<TimerId, Timer>>,
    opened: RefCell<Vec<OpenedPopup>>,
}

impl FakeWindowHost {
    pub fn new(origin: &str) -> Self {
        Self {
            origin: origin.to_string(),
            requires_gesture: false,
            gesture: Cell::new(false),
            now: Cell::new(Duration::ZERO),
            next_id: Cell::new(1),
            listeners: RefCell::new(BTreeMap::new()),
            timers: RefCell::new(BTreeMap::new()),
            opened: RefCell::new(Vec::new()),
        }
    }

    pub fn blocking(origin: &str) -> Self {
        Self {
            requires_gesture: true,
            ..Self::new(origin)
        }
    }

    pub fn with_user_gesture<R>(&self, f: impl FnOnce() -> R) -> R {
        let previous = self.gesture.replace(true);
        let result = f();
        self.gesture.set(previous);
        result
    }

    pub fn in_user_gesture(&self) -> bool {
        self.gesture.get()
    }

    /// Opens a popup regardless of the gesture rule.
    pub fn open_fake_popup(&self, name: &str) -> Rc<FakePopup> {
        self.record_popup(BLANK_PAGE, name, "")
    }

    pub fn opened_popups(&self) -> Vec<OpenedPopup> {
        self.opened.borrow().clone()
    }

    pub fn now(&self) -> Duration {
        self.now.get()
    }

    /// Delivers a `message` event to every registered listener.
    pub fn dispatch_message(&self, origin: &str, data: Value) {
        let message = WindowMessage::new(origin, data);
        let ids: Vec<ListenerId> = self.listeners.borrow().keys().copied().collect();
        for id in ids {
            let callback = self.listeners.borrow().get(&id).cloned();
            let Some(callback) = callback else {
                continue;
            };
            if let Ok(mut callback) = callback.try_borrow_mut() {
                (*callback)(message.clone());
            };
        }
    }

    /// Moves the virtual clock forward, firing due timers in order.
    pub fn advance(&self, by: Duration) {
        let target = self.now.get() + by;
        while let Some((due, callback)) = self.take_next_timer(target) {
            self.now.set(due);
            if let Ok(mut callback) = callback.try_borrow_mut() {
                (*callback)();
            };
        }
        self.now.set(target);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn interval_count(&self) -> usize {
        self.timers
            .borrow()
            .values()
            .filter(|timer| timer.period.is_some())
            .count()
    }

    pub fn timeout_count(&self) -> usize {
        self.timers
            .borrow()
            .values()
            .filter(|timer| timer.period.is_none())
            .count()
    }

    pub fn timer_count(&self) -> usize {
        self.timers.borrow().len()
    }

    fn take_next_timer(&self, target: Duration) -> Option<(Duration, Rc<RefCell<TimerCallback>>)> {
        let mut timers = self.timers.borrow_mut();
        let (id, due) = timers
            .iter()
            .filter(|(_, timer)| timer.due <= target)
            .map(|(id, timer)| (*id, timer.due))
            .min_by_key(|(id, due)| (*due, *id))?;
        // Intervals are rescheduled before their callback runs so a callback
        // may clear its own timer.
        match timers.get(&id)?.period {
            Some(period) => {
                let timer = timers.get_mut(&id)?;
                timer.due = due + period.max(Duration::from_millis(1));
                Some((due, Rc::clone(&timer.callback)))
            }
            None => timers.remove(&id).map(|timer| (due, timer.callback)),
        }
    }

    fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    fn schedule(&self, delay: Duration, period: Option<Duration>, callback: TimerCallback) -> TimerId {
        let id = self.next_id();
        self.timers.borrow_mut().insert(
            id,
            Timer {
                due: self.now.get() + delay,
                period,
                callback: Rc::new(RefCell::new(callback)),
            },
        );
        id
    }

    fn record_popup(&self, url: &str, name: &str, features: &str) -> Rc<FakePopup> {
        let window = Rc::new(FakePopup::new(url));
        self.opened.borrow_mut().push(OpenedPopup {
            name: name.to_string(),
            url: url.to_string(),
            features: features.to_string(),
            window: Rc::clone(&window),
        });
        window
    }
}

impl WindowHost for FakeWindowHost {
    fn origin(&self) -> String {
        self.origin.clone()
    }

    fn open(&self, url: &str, name: &str, features: &str) -> Option<Rc<dyn PopupWindow>> {
        if self.requires_gesture && !self.in_user_gesture() {
            return None;
        }
        let popup: Rc<dyn PopupWindow> = self.record_popup(url, name, features);
        Some(popup)
    }

    fn add_message_listener(&self, callback: MessageCallback) -> ListenerId {
        let id = self.next_id();
        self.listeners
            .borrow_mut()
            .insert(id, Rc::new(RefCell::new(callback)));
        id
    }

    fn remove_message_listener(&self, id: ListenerId) {
        self.listeners.borrow_mut().remove(&id);
    }

    fn set_interval(&self, period: Duration, callback: TimerCallback) -> TimerId {
        self.schedule(period, Some(period), callback)
    }

    fn clear_interval(&self, id: TimerId) {
        self.timers.borrow_mut().remove(&id);
    }

    fn set_timeout(&self, delay: Duration, callback: TimerCallback) -> TimerId {
        self.schedule(delay, None, callback)
    }

    fn clear_timeout(&self, id: TimerId) {
        self.timers.borrow_mut().remove(&id);
    }
}

/// Popup window double.
pub struct FakePopup {
    location: RefCell<Option<String>>,
    closed: Cell<bool>,
    close_calls: Cell<usize>,
    navigation_error: RefCell<Option<String>>,
}

impl FakePopup {
    fn new(url: &str) -> Self {
        Self {
            location: RefCell::new(Some(url.to_string())),
            closed: Cell::new(false),
            close_calls: Cell::new(0),
            navigation_error: RefCell::new(None),
        }
    }

    pub fn location(&self) -> Option<String> {
        self.location.borrow().clone()
    }

    /// The user closes the window; not counted as a programmatic close.
    pub fn close_by_user(&self) {
        self.closed.set(true);
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.get()
    }

    /// Makes the next navigations fail with `reason`.
    pub fn fail_navigation(&self, reason: &str) {
        *self.navigation_error.borrow_mut() = Some(reason.to_string());
    }
}

impl PopupWindow for FakePopup {
    fn navigate(&self, url: &str) -> AuthResult<()> {
        if self.closed.get() {
            return Err(AuthError::Popup("popup window is closed".into()));
        }
        if let Some(reason) = self.navigation_error.borrow().as_ref() {
            return Err(AuthError::Popup(reason.clone()));
        }
        *self.location.borrow_mut() = Some(url.to_string());
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.get()
    }

    fn close(&self) {
        self.close_calls.set(self.close_calls.get() + 1);
        self.closed.set(true);
    }
}

/// Opener double that records every posted message with its target origin.
pub struct RecordingOpener {
    origin: String,
    attached: bool,
    posted: RefCell<Vec<(Value, String)>>,
}

impl RecordingOpener {
    pub fn new(origin: &str) -> Self {
        Self {
            origin: origin.to_string(),
            attached: true,
            posted: RefCell::new(Vec::new()),
        }
    }

    /// A popup whose opener is gone.
    pub fn detached(origin: &str) -> Self {
        Self {
            attached: false,
            ..Self::new(origin)
        }
    }

    pub fn posted(&self) -> Vec<(Value, String)> {
        self.posted.borrow().clone()
    }
}

impl OpenerWindow for RecordingOpener {
    fn origin(&self) -> String {
        self.origin.clone()
    }

    fn post_to_opener(&self, message: &Value, target_origin: &str) -> AuthResult<()> {
        if !self.attached {
            return Err(AuthError::Popup("window.opener is not available".into()));
        }
        self.posted
            .borrow_mut()
            .push((message.clone(), target_origin.to_string()));
        Ok(())
    }
}

/// Exchange double returning a fixed outcome.
pub struct StaticExchange {
    outcome: AuthResult<UserProfile>,
    codes: Mutex<Vec<String>>,
}

impl StaticExchange {
    pub fn succeeding(profile: UserProfile) -> Self {
        Self {
            outcome: Ok(profile),
            codes: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: AuthError) -> Self {
        Self {
            outcome: Err(error),
            codes: Mutex::new(Vec::new()),
        }
    }

    pub fn codes(&self) -> Vec<String> {
        self.codes
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }

    pub fn calls(&self) -> usize {
        self.codes().len()
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl CodeExchange for StaticExchange {
    async fn exchange(&self, _provider: Provider, code: &str) -> AuthResult<UserProfile> {
        self.codes
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .push(code.to_string());
        self.outcome.clone()
    }
}
