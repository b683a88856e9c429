use std::future::Future;

/// Spawns an async task on the browser event loop.
pub fn spawn_detached<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

/// Drops `value` on a later turn of the event loop.
///
/// JS closures must not be freed while they are executing; teardown that runs
/// inside a listener or timer callback parks the closure here instead.
pub fn drop_later<T: 'static>(value: T) {
    spawn_detached(async move {
        drop(value);
    });
}
