use std::fmt;

use serde::Deserialize;
use subtle::ConstantTimeEq;

/// Shared secret guarding the admin endpoints.
///
/// Loaded from configuration, never logged. An empty token matches nothing,
/// which leaves the admin endpoints closed.
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct AdminToken(String);

impl AdminToken {
    #[cfg(test)]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Compares in time independent of where the first mismatch is.
    pub fn matches(&self, candidate: &str) -> bool {
        let expected = self.0.as_bytes();

        !expected.is_empty() && bool::from(expected.ct_eq(candidate.as_bytes()))
    }
}

impl fmt::Debug for AdminToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AdminToken([redacted])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_only_the_exact_token() {
        let token = AdminToken::new("s3cret");
        assert!(token.matches("s3cret"));
        assert!(!token.matches("s3cre"));
        assert!(!token.matches("s3cret!"));
        assert!(!token.matches("S3CRET"));
        assert!(!token.matches(""));
    }

    #[test]
    fn empty_token_never_matches() {
        let token = AdminToken::new("");
        assert!(!token.matches(""));
    }

    #[test]
    fn debug_is_redacted() {
        let token = AdminToken::new("s3cret");
        assert!(!format!("{token:?}").contains("s3cret"));
    }
}
