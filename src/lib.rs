//! # aiva-auth
//!
//! Popup-based OAuth 2.0 sign-in (Google, Microsoft, Yahoo) for the AIVA
//! assistant web front end.
//!
//! The crate builds the provider authorization URL, opens and tracks the
//! popup window, and correlates the callback page's `postMessage` with the
//! request that started it. Browser globals are reached through the
//! [`auth::popup::WindowHost`] family of traits; the `wasm-web` feature
//! provides `web_sys` implementations in `platform::browser`.
//!
//! Logging goes through the [`logger`] module, using the `@aiva/auth`
//! component logger.

pub mod auth;
pub mod logger;
pub mod platform;

#[cfg(test)]
pub(crate) mod test_support;
