mod provider;
mod providers;
mod request;
mod state;

pub use provider::{OAuthProvider, Provider};
pub use providers::{
    GoogleAuthProvider, MicrosoftAuthProvider, OAuthProviderFactory, YahooAuthProvider,
};
pub use request::{build_auth_url, AuthRequest, RESPONSE_TYPE_CODE};
pub use state::generate_state;

pub(crate) use state::states_match;
