use super::provider::{OAuthProvider, Provider};

/// Creates preconfigured [`OAuthProvider`] instances for a specific provider.
pub trait OAuthProviderFactory {
    fn provider() -> Provider;

    fn new(client_id: impl Into<String>) -> OAuthProvider {
        OAuthProvider::new(Self::provider(), client_id)
    }
}

pub struct GoogleAuthProvider;

impl GoogleAuthProvider {
    /// Adds a `login_hint` so Google preselects the given account.
    pub fn add_login_hint(provider: &mut OAuthProvider, hint: &str) {
        provider.set_custom_parameter("login_hint", hint);
    }

    /// Replaces the default `prompt=consent` with the account chooser.
    pub fn prompt_select_account(provider: &mut OAuthProvider) {
        provider.set_custom_parameter("prompt", "select_account");
    }
}

impl OAuthProviderFactory for GoogleAuthProvider {
    fn provider() -> Provider {
        Provider::Google
    }
}

pub struct MicrosoftAuthProvider;

impl MicrosoftAuthProvider {
    /// Restricts sign-in to one Azure AD tenant instead of `common`.
    pub fn set_tenant(provider: &mut OAuthProvider, tenant: &str) {
        provider.set_authorization_endpoint(format!(
            "https://login.microsoftonline.com/{tenant}/oauth2/v2.0/authorize"
        ));
    }

    pub fn add_login_hint(provider: &mut OAuthProvider, hint: &str) {
        provider.set_custom_parameter("login_hint", hint);
    }
}

impl OAuthProviderFactory for MicrosoftAuthProvider {
    fn provider() -> Provider {
        Provider::Microsoft
    }
}

pub struct YahooAuthProvider;

impl YahooAuthProvider {
    /// Sets the Yahoo prompt value (e.g. `login`, `consent`).
    pub fn set_prompt(provider: &mut OAuthProvider, prompt: &str) {
        provider.set_custom_parameter("prompt", prompt);
    }
}

impl OAuthProviderFactory for YahooAuthProvider {
    fn provider() -> Provider {
        Provider::Yahoo
    }
}
