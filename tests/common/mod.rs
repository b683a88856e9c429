#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use aiva_auth::auth::popup::{ListenerId, MessageCallback, TimerCallback, TimerId};
use aiva_auth::auth::{AuthResult, PopupWindow, WindowHost, WindowMessage};
use serde_json::Value;

/// Minimal browser stand-in: timers fire only through `tick` and `expire`.
pub struct ScriptedHost {
    origin: String,
    allow_popups: bool,
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(ListenerId, Rc<RefCell<MessageCallback>>)>>,
    intervals: RefCell<Vec<(TimerId, Rc<RefCell<TimerCallback>>)>>,
    timeouts: RefCell<Vec<(TimerId, Rc<RefCell<TimerCallback>>)>>,
    popups: RefCell<Vec<Rc<ScriptedPopup>>>,
}

impl ScriptedHost {
    pub fn new(origin: &str) -> Rc<Self> {
        Rc::new(Self::build(origin, true))
    }

    pub fn with_popup_blocker(origin: &str) -> Rc<Self> {
        Rc::new(Self::build(origin, false))
    }

    fn build(origin: &str, allow_popups: bool) -> Self {
        Self {
            origin: origin.to_string(),
            allow_popups,
            next_id: Cell::new(1),
            listeners: RefCell::new(Vec::new()),
            intervals: RefCell::new(Vec::new()),
            timeouts: RefCell::new(Vec::new()),
            popups: RefCell::new(Vec::new()),
        }
    }

    fn id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    pub fn popup(&self, index: usize) -> Rc<ScriptedPopup> {
        Rc::clone(&self.popups.borrow()[index])
    }

    pub fn popup_count(&self) -> usize {
        self.popups.borrow().len()
    }

    pub fn post(&self, origin: &str, data: Value) {
        let listeners: Vec<_> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        for callback in listeners {
            (*callback.borrow_mut())(WindowMessage::new(origin, data.clone()));
        }
    }

    /// Runs every interval callback once.
    pub fn tick(&self) {
        let intervals: Vec<_> = self
            .intervals
            .borrow()
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        for callback in intervals {
            (*callback.borrow_mut())();
        }
    }

    /// Fires every pending timeout.
    pub fn expire(&self) {
        let timeouts: Vec<_> = self.timeouts.borrow_mut().drain(..).collect();
        for (_, callback) in timeouts {
            (*callback.borrow_mut())();
        }
    }

    pub fn installed(&self) -> usize {
        self.listeners.borrow().len() + self.intervals.borrow().len() + self.timeouts.borrow().len()
    }
}

impl WindowHost for ScriptedHost {
    fn origin(&self) -> String {
        self.origin.clone()
    }

    fn open(&self, _url: &str, name: &str, _features: &str) -> Option<Rc<dyn PopupWindow>> {
        if !self.allow_popups {
            return None;
        }
        let popup = Rc::new(ScriptedPopup {
            name: name.to_string(),
            location: RefCell::new(String::new()),
            closed: Cell::new(false),
        });
        self.popups.borrow_mut().push(Rc::clone(&popup));
        Some(popup as Rc<dyn PopupWindow>)
    }

    fn add_message_listener(&self, callback: MessageCallback) -> ListenerId {
        let id = self.id();
        self.listeners
            .borrow_mut()
            .push((id, Rc::new(RefCell::new(callback))));
        id
    }

    fn remove_message_listener(&self, id: ListenerId) {
        self.listeners.borrow_mut().retain(|(existing, _)| *existing != id);
    }

    fn set_interval(&self, _period: Duration, callback: TimerCallback) -> TimerId {
        let id = self.id();
        self.intervals
            .borrow_mut()
            .push((id, Rc::new(RefCell::new(callback))));
        id
    }

    fn clear_interval(&self, id: TimerId) {
        self.intervals.borrow_mut().retain(|(existing, _)| *existing != id);
    }

    fn set_timeout(&self, _delay: Duration, callback: TimerCallback) -> TimerId {
        let id = self.id();
        self.timeouts
            .borrow_mut()
            .push((id, Rc::new(RefCell::new(callback))));
        id
    }

    fn clear_timeout(&self, id: TimerId) {
        self.timeouts.borrow_mut().retain(|(existing, _)| *existing != id);
    }
}

pub struct ScriptedPopup {
    pub name: String,
    location: RefCell<String>,
    closed: Cell<bool>,
}

impl ScriptedPopup {
    pub fn location(&self) -> String {
        self.location.borrow().clone()
    }

    pub fn user_closes(&self) {
        self.closed.set(true);
    }
}

impl PopupWindow for ScriptedPopup {
    fn navigate(&self, url: &str) -> AuthResult<()> {
        *self.location.borrow_mut() = url.to_string();
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.get()
    }

    fn close(&self) {
        self.closed.set(true);
    }
}
