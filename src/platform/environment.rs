//! Shared runtime environment detection and default configuration helpers.

use std::env;
use std::fs;

use serde_json::Value;

use crate::auth::Provider;

const DEFAULTS_VARIABLE: &str = "__AIVA_AUTH_DEFAULTS__";
const DEFAULTS_PATH_VARIABLE: &str = "__AIVA_AUTH_DEFAULTS_PATH";

/// Returns the parsed `__AIVA_AUTH_DEFAULTS__` object when available.
fn auth_defaults() -> Option<Value> {
    defaults_from_env()
        .or_else(defaults_from_path)
        .or_else(defaults_from_global)
}

fn defaults_from_env() -> Option<Value> {
    let raw = env::var(DEFAULTS_VARIABLE).ok()?;
    parse_json_object(&raw)
}

fn defaults_from_path() -> Option<Value> {
    let path = env::var(DEFAULTS_PATH_VARIABLE).ok()?;
    let content = fs::read_to_string(path).ok()?;
    parse_json_object(&content)
}

#[cfg(all(target_arch = "wasm32", feature = "wasm-web"))]
fn defaults_from_global() -> Option<Value> {
    use wasm_bindgen::JsValue;

    let global = js_sys::global();
    let value = js_sys::Reflect::get(&global, &JsValue::from_str(DEFAULTS_VARIABLE)).ok()?;
    if value.is_null() || value.is_undefined() {
        return None;
    }
    let serialized = js_sys::JSON::stringify(&value).ok()?.as_string()?;
    parse_json_object(&serialized)
}

#[cfg(not(all(target_arch = "wasm32", feature = "wasm-web")))]
fn defaults_from_global() -> Option<Value> {
    None
}

fn parse_json_object(raw: &str) -> Option<Value> {
    serde_json::from_str::<Value>(raw)
        .ok()
        .filter(Value::is_object)
}

fn client_id_variable(provider: Provider) -> String {
    format!("AIVA_{}_CLIENT_ID", provider.id().to_ascii_uppercase())
}

fn client_id_from_defaults(defaults: &Value, provider: Provider) -> Option<String> {
    let entry = defaults.get(provider.id())?;
    entry
        .get("clientId")
        .or_else(|| entry.get("client_id"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Resolves the registered client id for `provider`.
///
/// `AIVA_{PROVIDER}_CLIENT_ID` wins over the `__AIVA_AUTH_DEFAULTS__` object
/// (read from the environment, from the file named by
/// `__AIVA_AUTH_DEFAULTS_PATH`, or from a JS global on `wasm-web`).
pub fn provider_client_id(provider: Provider) -> Option<String> {
    if let Ok(value) = env::var(client_id_variable(provider)) {
        let value = value.trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }
    auth_defaults().and_then(|defaults| client_id_from_defaults(&defaults, provider))
}
