//! Ephemeral token substitution.
//!
//! Commands may contain a `{random}` marker that is replaced with a fresh
//! token before every execution, so repeated runs (e.g. creating a user or a
//! service) don't collide while keeping the same structural shape.

use rand::Rng;

/// Marker replaced by a fresh token before each execution.
pub const TOKEN_PLACEHOLDER: &str = "{random}";

/// Length of generated tokens.
pub const TOKEN_LENGTH: usize = 10;

const TOKEN_ALPHABET: &[u8] = b"0123456789ABCDEF";

/// Replace every placeholder in `template` with `token`.
pub fn substitute_token(template: &str, token: &str) -> String {
    template.replace(TOKEN_PLACEHOLDER, token)
}

/// Source of fresh ephemeral tokens. Called concurrently by every worker.
pub trait TokenSource: Send + Sync {
    fn fresh(&self) -> String;
}

/// Random hexadecimal tokens from the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomHexTokens;

impl TokenSource for RandomHexTokens {
    fn fresh(&self) -> String {
        let mut rng = rand::rng();
        (0..TOKEN_LENGTH)
            .map(|_| TOKEN_ALPHABET[rng.random_range(0..TOKEN_ALPHABET.len())] as char)
            .collect()
    }
}

/// Always returns the same token. Useful for deterministic runs.
#[derive(Debug, Clone)]
pub struct FixedToken(pub String);

impl TokenSource for FixedToken {
    fn fresh(&self) -> String {
        self.0.clone()
    }
}
