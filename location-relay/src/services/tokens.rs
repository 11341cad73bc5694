//! Access token registry.
//!
//! Membership is the only authorization check the relay performs. Tokens are
//! compared by exact, case-sensitive equality and never expire.

use std::collections::HashSet;

/// Tokens provisioned when no `ACCESS_TOKENS` list is configured.
pub const BUILTIN_TOKENS: &[&str] = &["ABC123"];

pub trait TokenRegistry: Send + Sync {
    fn is_valid(&self, token: &str) -> bool;
}

/// Fixed token set established at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenRegistry {
    tokens: HashSet<String>,
}

impl StaticTokenRegistry {
    pub fn new<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    pub fn builtin() -> Self {
        Self::new(BUILTIN_TOKENS.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl TokenRegistry for StaticTokenRegistry {
    fn is_valid(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }
}
