pub mod environment;

#[cfg(all(target_arch = "wasm32", feature = "wasm-web"))]
pub mod browser;

#[cfg(all(target_arch = "wasm32", feature = "wasm-web"))]
pub mod runtime;
