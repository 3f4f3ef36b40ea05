//! Injectable secret generation
//!
//! Modules that must mint a credential locally (e.g. a database user
//! password the vendor does not return) draw it from this capability, so
//! tests can supply deterministic values.

use rand::distributions::Alphanumeric;
use rand::Rng;

const DEFAULT_SECRET_LEN: usize = 32;

/// Source of generated secrets.
pub trait SecretGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Cryptographically strong random secrets (the default).
#[derive(Debug, Clone, Copy)]
pub struct RandomSecrets {
    length: usize,
}

impl RandomSecrets {
    pub fn new() -> Self {
        Self {
            length: DEFAULT_SECRET_LEN,
        }
    }

    pub fn with_length(length: usize) -> Self {
        Self { length }
    }
}

impl Default for RandomSecrets {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretGenerator for RandomSecrets {
    fn generate(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(self.length)
            .map(char::from)
            .collect()
    }
}

/// Fixed secret values for deterministic tests.
#[derive(Debug, Clone)]
pub struct StaticSecrets {
    value: String,
}

impl StaticSecrets {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl SecretGenerator for StaticSecrets {
    fn generate(&self) -> String {
        self.value.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_secrets_have_requested_length() {
        let secrets = RandomSecrets::with_length(16);
        let value = secrets.generate();
        assert_eq!(value.len(), 16);
        assert!(value.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn random_secrets_differ() {
        let secrets = RandomSecrets::new();
        assert_ne!(secrets.generate(), secrets.generate());
    }

    #[test]
    fn static_secrets_are_fixed() {
        let secrets = StaticSecrets::new("fixed-for-tests");
        assert_eq!(secrets.generate(), "fixed-for-tests");
    }
}
