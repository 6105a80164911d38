// ID Provider Port (for deterministic testing)

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Default request id length
pub const DEFAULT_ID_LEN: usize = 20;

/// ID provider interface (allows deterministic IDs in tests)
pub trait IdProvider: Send + Sync {
    /// Generate a new request ID
    fn generate_id(&self) -> String;
}

/// Random alphanumeric provider (production default)
pub struct RandomIdProvider {
    len: usize,
}

impl RandomIdProvider {
    /// Lengths below the default are raised to it.
    pub fn new(len: usize) -> Self {
        Self {
            len: len.max(DEFAULT_ID_LEN),
        }
    }
}

impl Default for RandomIdProvider {
    fn default() -> Self {
        Self::new(DEFAULT_ID_LEN)
    }
}

impl IdProvider for RandomIdProvider {
    fn generate_id(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(self.len)
            .map(char::from)
            .collect()
    }
}

/// UUID v4 provider, rendered without hyphens (32 alphanumeric chars)
pub struct UuidIdProvider;

impl IdProvider for UuidIdProvider {
    fn generate_id(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_random_ids_are_alphanumeric() {
        let provider = RandomIdProvider::default();
        let id = provider.generate_id();
        assert_eq!(id.len(), DEFAULT_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_short_length_is_raised() {
        assert_eq!(RandomIdProvider::new(4).generate_id().len(), DEFAULT_ID_LEN);
    }

    #[test]
    fn test_ids_do_not_repeat() {
        let provider = RandomIdProvider::default();
        let ids: HashSet<_> = (0..1000).map(|_| provider.generate_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_uuid_ids() {
        let id = UuidIdProvider.generate_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
