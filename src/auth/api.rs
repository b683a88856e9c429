use std::fmt;
use std::rc::Rc;

use crate::auth::accounts::AccountStore;
use crate::auth::config::AuthSettings;
use crate::auth::error::{AuthError, AuthResult};
use crate::auth::logger::LOGGER;
use crate::auth::model::UserProfile;
use crate::auth::oauth::{AuthRequest, OAuthProvider, Provider};
use crate::auth::popup::{
    open_popup_with_features, start_handshake, CallbackReceiver, HandshakeState,
    HttpCodeExchange, OpenerWindow, PendingHandshake, PopupWindow, WindowHost,
};

/// Callback invoked with the profile of every completed sign-in.
pub type SignInHook = Rc<dyn Fn(&UserProfile)>;

/// Entry point for popup-based social sign-in.
///
/// ```ignore
/// let auth = PopupAuth::builder(host).build()?;
/// // Inside the click handler, before any `.await`:
/// let pending = auth.sign_in_with_popup(&GoogleAuthProvider::new(client_id))?;
/// let profile = pending.wait().await?;
/// ```
pub struct PopupAuth {
    host: Rc<dyn WindowHost>,
    settings: AuthSettings,
    accounts: AccountStore,
    hooks: Rc<[SignInHook]>,
}

impl fmt::Debug for PopupAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopupAuth")
            .field("settings", &self.settings)
            .field("accounts", &self.accounts)
            .finish_non_exhaustive()
    }
}

impl PopupAuth {
    pub fn builder(host: Rc<dyn WindowHost>) -> PopupAuthBuilder {
        PopupAuthBuilder::new(host)
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }

    pub fn origin(&self) -> String {
        self.settings.resolve_origin(&self.host.origin())
    }

    /// Opens the provider popup and starts the handshake.
    ///
    /// Must be called synchronously from the user's click handler: the popup
    /// is opened before this returns, and a blocked popup fails with
    /// [`AuthError::PopupBlocked`] without installing anything.
    pub fn sign_in_with_popup(&self, provider: &OAuthProvider) -> AuthResult<PendingSignIn> {
        let request = provider.build_request(&self.origin())?;
        let name = request.provider.popup_name();
        let Some(popup) =
            open_popup_with_features(&*self.host, name, &self.settings.popup_features)
        else {
            LOGGER.warn(format!("{} sign-in popup was blocked", request.provider));
            return Err(AuthError::PopupBlocked);
        };
        self.start(popup, &request)
    }

    /// Starts the handshake in a popup the caller opened itself.
    pub fn start_with_popup(
        &self,
        popup: Rc<dyn PopupWindow>,
        provider: &OAuthProvider,
    ) -> AuthResult<PendingSignIn> {
        let request = match provider.build_request(&self.origin()) {
            Ok(request) => request,
            Err(err) => {
                popup.close();
                return Err(err);
            }
        };
        self.start(popup, &request)
    }

    /// Receiver for the callback page served inside the popup.
    pub fn callback_receiver(
        &self,
        provider: Provider,
        opener: Rc<dyn OpenerWindow>,
    ) -> AuthResult<CallbackReceiver> {
        let exchange = HttpCodeExchange::new(&self.settings.backend_base(&self.origin()))?;
        Ok(CallbackReceiver::new(provider, opener, Rc::new(exchange)))
    }

    fn start(&self, popup: Rc<dyn PopupWindow>, request: &AuthRequest) -> AuthResult<PendingSignIn> {
        LOGGER.info(format!("{} sign-in started", request.provider));
        let handshake = start_handshake(
            Rc::clone(&self.host),
            popup,
            request,
            &self.settings.handshake_options(),
        )?;
        Ok(PendingSignIn {
            handshake,
            accounts: self.accounts.clone(),
            hooks: Rc::clone(&self.hooks),
        })
    }
}

pub struct PopupAuthBuilder {
    host: Rc<dyn WindowHost>,
    settings: AuthSettings,
    accounts: Option<AccountStore>,
    hooks: Vec<SignInHook>,
}

impl PopupAuthBuilder {
    fn new(host: Rc<dyn WindowHost>) -> Self {
        Self {
            host,
            settings: AuthSettings::default(),
            accounts: None,
            hooks: Vec::new(),
        }
    }

    pub fn with_settings(mut self, settings: AuthSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_account_store(mut self, accounts: AccountStore) -> Self {
        self.accounts = Some(accounts);
        self
    }

    pub fn on_sign_in<F>(mut self, hook: F) -> Self
    where
        F: Fn(&UserProfile) + 'static,
    {
        self.hooks.push(Rc::new(hook));
        self
    }

    pub fn build(self) -> AuthResult<PopupAuth> {
        self.settings.validate()?;
        let accounts = self
            .accounts
            .unwrap_or_else(AccountStore::in_memory)
            .with_limit(self.settings.account_limit);
        Ok(PopupAuth {
            host: self.host,
            settings: self.settings,
            accounts,
            hooks: self.hooks.into(),
        })
    }
}

/// A sign-in whose popup is open.
///
/// Dropping it before it settles closes the popup and releases the listener
/// and timers.
pub struct PendingSignIn {
    handshake: PendingHandshake,
    accounts: AccountStore,
    hooks: Rc<[SignInHook]>,
}

impl fmt::Debug for PendingSignIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingSignIn")
            .field("handshake", &self.handshake)
            .finish_non_exhaustive()
    }
}

impl PendingSignIn {
    pub fn provider(&self) -> Provider {
        self.handshake.provider()
    }

    pub fn request_state(&self) -> String {
        self.handshake.request_state()
    }

    pub fn state(&self) -> HandshakeState {
        self.handshake.state()
    }

    /// Resolves with the signed-in profile and remembers the account.
    pub async fn wait(self) -> AuthResult<UserProfile> {
        let provider = self.handshake.provider();
        match self.handshake.wait().await {
            Ok(profile) => {
                LOGGER.info(format!("{provider} sign-in completed"));
                if let Err(err) = self.accounts.remember(&profile) {
                    LOGGER.warn(format!("failed to remember {provider} account: {err}"));
                }
                for hook in self.hooks.iter() {
                    hook(&profile);
                }
                Ok(profile)
            }
            Err(err) => {
                match &err {
                    AuthError::ProviderError(_) | AuthError::ExchangeFailed(_) => {
                        LOGGER.warn(format!("{provider} sign-in failed: {err}"));
                    }
                    _ => LOGGER.info(format!("{provider} sign-in ended: {err}")),
                }
                Err(err)
            }
        }
    }
}
