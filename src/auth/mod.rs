//! Social sign-in through a provider popup.
//!
//! The parent window opens a named popup inside the user's click handler,
//! navigates it to the provider's authorization endpoint and waits for the
//! callback page (served from the same origin) to post back an
//! `OAUTH_SUCCESS` or `OAUTH_ERROR` message. Closing the popup cancels the
//! attempt; a timeout bounds it.
//!
//! ```ignore
//! use aiva_auth::auth::{GoogleAuthProvider, OAuthProviderFactory, PopupAuth};
//!
//! let auth = PopupAuth::builder(host).build()?;
//! let pending = auth.sign_in_with_popup(&GoogleAuthProvider::new(client_id))?;
//! let profile = pending.wait().await?;
//! ```

pub(crate) mod accounts;
mod api;
pub(crate) mod config;
pub(crate) mod error;
pub mod logger;
pub(crate) mod model;
pub(crate) mod oauth;
pub mod popup;

#[doc(inline)]
pub use accounts::{
    AccountPersistence, AccountStore, InMemoryAccountPersistence, ACCOUNTS_STORAGE_KEY,
    DEFAULT_ACCOUNT_LIMIT,
};

#[cfg(not(all(feature = "wasm-web", target_arch = "wasm32")))]
#[doc(inline)]
pub use accounts::FileAccountPersistence;

#[cfg(all(target_arch = "wasm32", feature = "wasm-web"))]
#[doc(inline)]
pub use accounts::WebStorageAccountPersistence;

#[doc(inline)]
pub use api::{PendingSignIn, PopupAuth, PopupAuthBuilder, SignInHook};

#[doc(inline)]
pub use config::AuthSettings;

#[doc(inline)]
pub use error::{AuthError, AuthResult};

#[doc(inline)]
pub use model::{PopupMessage, UserProfile, WindowMessage, OAUTH_ERROR, OAUTH_SUCCESS};

#[doc(inline)]
pub use oauth::{
    build_auth_url, generate_state, AuthRequest, GoogleAuthProvider, MicrosoftAuthProvider,
    OAuthProvider, OAuthProviderFactory, Provider, YahooAuthProvider, RESPONSE_TYPE_CODE,
};

#[doc(inline)]
pub use popup::{
    open_popup, CallbackOutcome, CallbackParams, CallbackReceiver, CodeExchange,
    HandshakeOptions, HandshakeState, HttpCodeExchange, OpenerWindow, PendingHandshake,
    PopupWindow, WindowHost, NO_CODE_ERROR,
};
