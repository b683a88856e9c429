use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;

const STATE_BYTES: usize = 32;

/// Generates an opaque, URL-safe correlation token for one sign-in attempt.
pub fn generate_state() -> String {
    let bytes: [u8; STATE_BYTES] = rand::thread_rng().gen();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compares two state tokens without short-circuiting on the first mismatch.
pub(crate) fn states_match(expected: &str, received: &str) -> bool {
    let (expected, received) = (expected.as_bytes(), received.as_bytes());
    if expected.len() != received.len() {
        return false;
    }
    expected
        .iter()
        .zip(received)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
