//! Test utilities shared across crate-level unit tests.

#[cfg(not(target_arch = "wasm32"))]
pub mod http;
pub mod window;

#[cfg(not(target_arch = "wasm32"))]
pub use http::start_mock_server;
pub use window::{FakePopup, FakeWindowHost, RecordingOpener, StaticExchange};
