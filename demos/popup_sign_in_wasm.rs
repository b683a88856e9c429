#[cfg(target_arch = "wasm32")]
mod wasm_demo {
    use std::rc::Rc;

    use aiva_auth::auth::{
        AccountStore, AuthError, AuthSettings, OAuthProvider, PopupAuth, Provider,
        WebStorageAccountPersistence, WindowHost,
    };
    use aiva_auth::platform::browser::{run_callback_page, BrowserWindowHost};
    use std::sync::Arc;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::spawn_local;

    fn to_js(err: AuthError) -> JsValue {
        JsValue::from_str(&err.to_string())
    }

    fn build_auth() -> Result<PopupAuth, AuthError> {
        let host: Rc<dyn WindowHost> = Rc::new(BrowserWindowHost::new()?);
        PopupAuth::builder(host)
            .with_account_store(AccountStore::new(Arc::new(
                WebStorageAccountPersistence::new(),
            )))
            .on_sign_in(|profile| {
                web_sys::console::log_1(&JsValue::from_str(&format!(
                    "signed in as {}",
                    profile.email.as_deref().unwrap_or("unknown")
                )));
            })
            .build()
    }

    /// Call directly from the login button's click handler.
    ///
    /// `on_done` receives `(error_message, user_json)`; exactly one is set.
    #[wasm_bindgen]
    pub fn sign_in(provider: &str, on_done: js_sys::Function) -> Result<(), JsValue> {
        let provider: Provider = provider.parse().map_err(to_js)?;
        let auth = build_auth().map_err(to_js)?;
        let oauth = OAuthProvider::from_environment(provider).map_err(to_js)?;

        // Opening the popup must happen before the first await.
        let pending = match auth.sign_in_with_popup(&oauth) {
            Ok(pending) => pending,
            Err(err) => {
                let message = err.user_message(provider);
                let _ = on_done.call2(&JsValue::NULL, &JsValue::from_str(&message), &JsValue::NULL);
                return Ok(());
            }
        };

        spawn_local(async move {
            let result = pending.wait().await;
            let (error, user) = match result {
                Ok(profile) => (
                    JsValue::NULL,
                    serde_json::to_string(&profile)
                        .ok()
                        .and_then(|text| js_sys::JSON::parse(&text).ok())
                        .unwrap_or(JsValue::NULL),
                ),
                Err(err) => (JsValue::from_str(&err.user_message(provider)), JsValue::NULL),
            };
            let _ = on_done.call2(&JsValue::NULL, &error, &user);
            // Keep the facade alive until the handshake settles.
            drop(auth);
        });
        Ok(())
    }

    /// Entry point of `/auth/{provider}/callback`.
    #[wasm_bindgen]
    pub fn complete_sign_in(provider: &str) -> Result<(), JsValue> {
        let provider: Provider = provider.parse().map_err(to_js)?;
        run_callback_page(provider, AuthSettings::default()).map_err(to_js)
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    panic!("Compile this demo for --target wasm32-unknown-unknown and --features wasm-web");
}
