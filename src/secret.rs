//! Shared secret used to key ticket checksums.

use std::fmt;

/// The secret shared by every tier that issues or verifies tickets.
///
/// `Debug` never prints the secret value.
///
/// # Example
///
/// ```
/// use auth_tkt::Secret;
///
/// let secret = Secret::new("our_secret");
/// assert_eq!(secret.as_bytes(), b"our_secret");
/// assert!(!format!("{secret:?}").contains("our_secret"));
/// ```
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Secret {
    inner: String,
}

impl Secret {
    /// Wraps a secret string.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            inner: secret.into(),
        }
    }

    /// Returns the secret as UTF-8 bytes, the form hashed into checksums.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.inner.as_bytes()
    }

    /// Returns true if the secret is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl From<&str> for Secret {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Secret {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("len", &self.inner.len())
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Secret {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_is_redacted() {
        let secret = Secret::new("some_random_secret_key");
        let debug = format!("{secret:?}");
        assert!(!debug.contains("some_random"));
        assert!(debug.contains("len: 22"));
    }

    #[test]
    fn empty_secret() {
        assert!(Secret::default().is_empty());
        assert!(!Secret::from("x").is_empty());
    }
}
