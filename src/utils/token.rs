use rand::{distributions::Alphanumeric, thread_rng, Rng};

pub const SESSION_KEY_LENGTH: usize = 40;

pub fn generate_token(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Opaque key that binds a test session to one browser.
pub fn generate_session_key() -> String {
    generate_token(SESSION_KEY_LENGTH)
}
