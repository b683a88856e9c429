use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use futures::channel::oneshot;

use super::{ListenerId, PopupWindow, TimerId, WindowHost};
use crate::auth::error::{AuthError, AuthResult};
use crate::auth::logger::LOGGER;
use crate::auth::model::{PopupMessage, UserProfile, WindowMessage};
use crate::auth::oauth::{states_match, AuthRequest, Provider};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Lifecycle of one popup handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandshakeState {
    Idle,
    Navigated,
    Succeeded,
    Failed,
    Cancelled,
    TimedOut,
}

impl HandshakeState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, HandshakeState::Idle | HandshakeState::Navigated)
    }
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HandshakeState::Idle => "idle",
            HandshakeState::Navigated => "navigated",
            HandshakeState::Succeeded => "succeeded",
            HandshakeState::Failed => "failed",
            HandshakeState::Cancelled => "cancelled",
            HandshakeState::TimedOut => "timed out",
        };
        f.write_str(label)
    }
}

/// Why an inbound window message was ignored.
///
/// Rejections never settle the handshake and are not reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectedMessage {
    ForeignOrigin,
    /// Missing or mismatching correlation token.
    InvalidState,
    /// Not a handshake message at all.
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeOptions {
    /// How often the popup is checked for having been closed.
    pub poll_interval: Duration,
    /// Maximum wait before the popup is force-closed; `None` waits forever.
    pub timeout: Option<Duration>,
    /// Origin the callback page posts from; `None` uses the host's origin.
    pub expected_origin: Option<String>,
}

impl Default for HandshakeOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: Some(DEFAULT_TIMEOUT),
            expected_origin: None,
        }
    }
}

type Completion = oneshot::Sender<AuthResult<UserProfile>>;

struct Core {
    state: HandshakeState,
    provider: Provider,
    expected_origin: String,
    expected_state: String,
    message_received: bool,
    popup: Rc<dyn PopupWindow>,
    listener: Option<ListenerId>,
    poll_timer: Option<TimerId>,
    timeout_timer: Option<TimerId>,
    completion: Option<Completion>,
}

/// Resources taken out of a settled [`Core`], released once the borrow ends.
struct Teardown {
    provider: Provider,
    state: HandshakeState,
    popup: Rc<dyn PopupWindow>,
    listener: Option<ListenerId>,
    poll_timer: Option<TimerId>,
    timeout_timer: Option<TimerId>,
    completion: Option<Completion>,
    outcome: AuthResult<UserProfile>,
}

impl Teardown {
    fn run(self, host: &dyn WindowHost) {
        if let Some(id) = self.listener {
            host.remove_message_listener(id);
        }
        if let Some(id) = self.poll_timer {
            host.clear_interval(id);
        }
        if let Some(id) = self.timeout_timer {
            host.clear_timeout(id);
        }
        if !self.popup.is_closed() {
            self.popup.close();
        }
        LOGGER.debug(format!("{} handshake {}", self.provider, self.state));
        if let Some(completion) = self.completion {
            // The waiter may have gone away; nothing else to notify then.
            let _ = completion.send(self.outcome);
        }
    }
}

impl Core {
    /// Moves to `next` and hands back everything that must be released.
    ///
    /// Only the first call after navigation yields a teardown; the ids are
    /// taken out of `self`, so listeners and timers are removed exactly once.
    fn settle(
        &mut self,
        next: HandshakeState,
        outcome: AuthResult<UserProfile>,
    ) -> Option<Teardown> {
        if self.state.is_terminal() {
            return None;
        }
        self.state = next;
        Some(Teardown {
            provider: self.provider,
            state: next,
            popup: Rc::clone(&self.popup),
            listener: self.listener.take(),
            poll_timer: self.poll_timer.take(),
            timeout_timer: self.timeout_timer.take(),
            completion: self.completion.take(),
            outcome,
        })
    }

    fn on_message(&mut self, message: &WindowMessage) -> Result<Option<Teardown>, RejectedMessage> {
        if self.state.is_terminal() {
            return Ok(None);
        }
        if message.origin != self.expected_origin {
            return Err(RejectedMessage::ForeignOrigin);
        }
        let parsed = PopupMessage::from_value(&message.data).ok_or(RejectedMessage::Unrecognized)?;
        match parsed.state() {
            Some(state) if states_match(&self.expected_state, state) => {}
            _ => return Err(RejectedMessage::InvalidState),
        }

        self.message_received = true;
        let teardown = match parsed {
            PopupMessage::Success { user, .. } => self.settle(HandshakeState::Succeeded, Ok(user)),
            PopupMessage::Error { error, .. } => {
                self.settle(HandshakeState::Failed, Err(AuthError::ProviderError(error)))
            }
        };
        Ok(teardown)
    }

    fn on_poll(&mut self) -> Option<Teardown> {
        // A message accepted in the same turn wins over a closed window.
        if self.state.is_terminal() || self.message_received {
            return None;
        }
        if self.popup.is_closed() {
            return self.settle(HandshakeState::Cancelled, Err(AuthError::UserCancelled));
        }
        None
    }

    fn on_timeout(&mut self) -> Option<Teardown> {
        self.settle(HandshakeState::TimedOut, Err(AuthError::TimedOut))
    }
}

/// An in-flight popup handshake.
///
/// Dropping it before it settles tears the handshake down (popup closed,
/// listener and timers removed).
pub struct PendingHandshake {
    core: Rc<RefCell<Core>>,
    host: Rc<dyn WindowHost>,
    receiver: Option<oneshot::Receiver<AuthResult<UserProfile>>>,
}

impl fmt::Debug for PendingHandshake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingHandshake")
            .field("provider", &self.provider())
            .field("state", &self.state())
            .finish()
    }
}

impl PendingHandshake {
    pub fn state(&self) -> HandshakeState {
        self.core.borrow().state
    }

    pub fn provider(&self) -> Provider {
        self.core.borrow().provider
    }

    /// Correlation token the callback page must echo back.
    pub fn request_state(&self) -> String {
        self.core.borrow().expected_state.clone()
    }

    pub fn is_settled(&self) -> bool {
        self.state().is_terminal()
    }

    /// Waits for the handshake to settle.
    pub async fn wait(mut self) -> AuthResult<UserProfile> {
        let receiver = match self.receiver.take() {
            Some(receiver) => receiver,
            None => return Err(AuthError::Popup("handshake result already taken".into())),
        };
        match receiver.await {
            Ok(outcome) => outcome,
            Err(_) => Err(AuthError::Popup("handshake was torn down without a result".into())),
        }
    }
}

impl Drop for PendingHandshake {
    fn drop(&mut self) {
        let teardown = match self.core.try_borrow_mut() {
            Ok(mut core) => core.settle(HandshakeState::Cancelled, Err(AuthError::UserCancelled)),
            Err(_) => None,
        };
        if let Some(teardown) = teardown {
            teardown.run(&*self.host);
        }
    }
}

fn with_core<F>(core: &Weak<RefCell<Core>>, host: &Weak<dyn WindowHost>, event: F)
where
    F: FnOnce(&mut Core) -> Option<Teardown>,
{
    let (Some(core), Some(host)) = (core.upgrade(), host.upgrade()) else {
        return;
    };
    let teardown = match core.try_borrow_mut() {
        Ok(mut core) => event(&mut *core),
        Err(_) => None,
    };
    if let Some(teardown) = teardown {
        teardown.run(&*host);
    }
}

/// Navigates `popup` to the authorization URL of `request` and starts
/// listening for the callback page's message.
///
/// `popup` must already be open (see [`super::open_popup`]). On error the
/// popup is closed and nothing is left installed on `host`.
pub fn start_handshake(
    host: Rc<dyn WindowHost>,
    popup: Rc<dyn PopupWindow>,
    request: &AuthRequest,
    options: &HandshakeOptions,
) -> AuthResult<PendingHandshake> {
    let url = match request.authorization_url() {
        Ok(url) => url,
        Err(err) => {
            popup.close();
            return Err(err);
        }
    };
    let (sender, receiver) = oneshot::channel();
    let core = Rc::new(RefCell::new(Core {
        state: HandshakeState::Idle,
        provider: request.provider,
        expected_origin: options
            .expected_origin
            .clone()
            .unwrap_or_else(|| host.origin()),
        expected_state: request.state.clone(),
        message_received: false,
        popup: Rc::clone(&popup),
        listener: None,
        poll_timer: None,
        timeout_timer: None,
        completion: Some(sender),
    }));

    if let Err(err) = popup.navigate(url.as_str()) {
        let teardown = core
            .borrow_mut()
            .settle(HandshakeState::Failed, Err(err.clone()));
        if let Some(teardown) = teardown {
            teardown.run(&*host);
        }
        return Err(err);
    }
    core.borrow_mut().state = HandshakeState::Navigated;

    let weak_core = Rc::downgrade(&core);
    let weak_host = Rc::downgrade(&host);

    let listener = {
        let (core, host_ref) = (weak_core.clone(), weak_host.clone());
        host.add_message_listener(Box::new(move |message: WindowMessage| {
            with_core(&core, &host_ref, |core| match core.on_message(&message) {
                Ok(teardown) => teardown,
                Err(reason) => {
                    LOGGER.debug(format!(
                        "{} handshake ignored message from {}: {reason:?}",
                        core.provider, message.origin
                    ));
                    None
                }
            });
        }))
    };
    let poll_timer = {
        let (core, host_ref) = (weak_core.clone(), weak_host.clone());
        host.set_interval(
            options.poll_interval,
            Box::new(move || with_core(&core, &host_ref, Core::on_poll)),
        )
    };
    let timeout_timer = options.timeout.map(|delay| {
        let (core, host_ref) = (weak_core.clone(), weak_host.clone());
        host.set_timeout(
            delay,
            Box::new(move || with_core(&core, &host_ref, Core::on_timeout)),
        )
    });

    {
        let mut guard = core.borrow_mut();
        guard.listener = Some(listener);
        guard.poll_timer = Some(poll_timer);
        guard.timeout_timer = timeout_timer;
    }
    LOGGER.debug(format!("{} handshake navigated", request.provider));

    Ok(PendingHandshake {
        core,
        host,
        receiver: Some(receiver),
    })
}
