//! Verification policy.

use crate::constants::DEFAULT_COOKIE_NAME;
use crate::digest::DigestAlgorithm;
use crate::error::PolicyError;
use crate::secret::Secret;

/// Settings shared by everything that issues or verifies tickets for one
/// protected resource.
///
/// With the `serde` feature the policy can be loaded from configuration.
/// `timeout` then accepts either a number of seconds or a time expression
/// such as `"30m"`, and the secret is never serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TicketPolicy {
    /// Secret shared with the issuing tier.
    ///
    /// Default: empty, which [`validate`](Self::validate) rejects
    #[cfg_attr(feature = "serde", serde(skip_serializing))]
    pub secret: Secret,

    /// Hash used for the checksum.
    ///
    /// Default: MD5
    pub digest: DigestAlgorithm,

    /// Name of the cookie carrying the ticket.
    ///
    /// Default: `auth_tkt`
    pub cookie_name: String,

    /// Maximum ticket age in seconds.
    ///
    /// Zero disables expiry, so a captured ticket can be replayed forever.
    /// Default: 0
    #[cfg_attr(
        feature = "serde",
        serde(deserialize_with = "timeout_serde::deserialize")
    )]
    pub timeout: u64,

    /// Whether the checksum binds the client IPv4 address.
    ///
    /// Default: false
    pub check_address: bool,

    /// Tokens of which a ticket must carry at least one.
    ///
    /// Empty means any authentic ticket is accepted.
    /// Default: empty
    pub required_tokens: Vec<String>,
}

impl Default for TicketPolicy {
    fn default() -> Self {
        Self {
            secret: Secret::default(),
            digest: DigestAlgorithm::Md5,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            timeout: 0,
            check_address: false,
            required_tokens: Vec::new(),
        }
    }
}

impl TicketPolicy {
    /// Creates a policy with defaults and the given secret.
    #[must_use]
    pub fn new(secret: impl Into<Secret>) -> Self {
        Self {
            secret: secret.into(),
            ..Self::default()
        }
    }

    /// Sets the shared secret.
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<Secret>) -> Self {
        self.secret = secret.into();
        self
    }

    /// Sets the digest algorithm.
    #[must_use]
    pub const fn with_digest(mut self, digest: DigestAlgorithm) -> Self {
        self.digest = digest;
        self
    }

    /// Sets the cookie name.
    #[must_use]
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Sets the timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Sets the timeout from a time expression such as `"2h"`.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidTimeExpression`] if the expression does
    /// not parse.
    pub fn with_timeout_expression(mut self, expression: &str) -> Result<Self, PolicyError> {
        self.timeout = parse_time_expression(expression)?;
        Ok(self)
    }

    /// Enables or disables client address binding.
    #[must_use]
    pub const fn with_check_address(mut self, check: bool) -> Self {
        self.check_address = check;
        self
    }

    /// Adds a required token.
    #[must_use]
    pub fn with_required_token(mut self, token: impl Into<String>) -> Self {
        self.required_tokens.push(token.into());
        self
    }

    /// Replaces the required tokens.
    #[must_use]
    pub fn with_required_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_tokens = tokens.into_iter().map(Into::into).collect();
        self
    }

    /// Returns true if tickets never expire under this policy.
    #[must_use]
    pub const fn expiry_disabled(&self) -> bool {
        self.timeout == 0
    }

    /// Checks that the policy can be used to verify tickets.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::EmptySecret`] if no secret is configured.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.secret.is_empty() {
            return Err(PolicyError::EmptySecret);
        }
        Ok(())
    }
}

/// Parses a time expression into seconds.
///
/// The grammar is one or more decimal digits followed by an optional unit:
/// `s` (seconds, the default), `m` (minutes), `h` (hours) or `d` (days).
///
/// # Errors
///
/// Returns [`PolicyError::InvalidTimeExpression`] for anything else, or if the
/// result overflows.
///
/// # Examples
///
/// ```
/// use auth_tkt::parse_time_expression;
///
/// assert_eq!(parse_time_expression("90").unwrap(), 90);
/// assert_eq!(parse_time_expression("30m").unwrap(), 1800);
/// assert_eq!(parse_time_expression("2d").unwrap(), 172_800);
/// assert!(parse_time_expression("1w").is_err());
/// ```
pub fn parse_time_expression(expression: &str) -> Result<u64, PolicyError> {
    let invalid = || PolicyError::InvalidTimeExpression {
        value: expression.to_string(),
    };

    let trimmed = expression.trim();
    let (digits, multiplier) = match trimmed.as_bytes().last() {
        Some(b's') => (&trimmed[..trimmed.len() - 1], 1),
        Some(b'm') => (&trimmed[..trimmed.len() - 1], 60),
        Some(b'h') => (&trimmed[..trimmed.len() - 1], 3600),
        Some(b'd') => (&trimmed[..trimmed.len() - 1], 86_400),
        _ => (trimmed, 1),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    digits
        .parse::<u64>()
        .ok()
        .and_then(|value| value.checked_mul(multiplier))
        .ok_or_else(invalid)
}

#[cfg(feature = "serde")]
mod timeout_serde {
    use std::fmt;

    use serde::de::{self, Visitor};

    use super::parse_time_expression;

    struct TimeoutVisitor;

    impl Visitor<'_> for TimeoutVisitor {
        type Value = u64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("seconds or a time expression like \"30m\"")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
            u64::try_from(v).map_err(|_| E::custom("timeout cannot be negative"))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
            parse_time_expression(v).map_err(E::custom)
        }
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_any(TimeoutVisitor)
    }
}


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn deserialize_with_defaults() {
        let policy: TicketPolicy =
            serde_json::from_str(r#"{"secret":"our_secret","timeout":"30m"}"#).unwrap();
        assert_eq!(policy.secret, Secret::new("our_secret"));
        assert_eq!(policy.timeout, 1800);
        assert_eq!(policy.cookie_name, "auth_tkt");
        assert_eq!(policy.digest, DigestAlgorithm::Md5);
    }

    #[test]
    fn deserialize_full() {
        let policy: TicketPolicy = serde_json::from_str(
            r#"{"secret":"s","digest":"SHA-256","cookie_name":"sso","timeout":60,
                "check_address":true,"required_tokens":["admin"]}"#,
        )
        .unwrap();
        assert_eq!(policy.digest, DigestAlgorithm::Sha256);
        assert_eq!(policy.timeout, 60);
        assert!(policy.check_address);
        assert_eq!(policy.required_tokens, ["admin"]);
    }

    #[test]
    fn secret_is_not_serialized() {
        let json = serde_json::to_string(&TicketPolicy::new("our_secret")).unwrap();
        assert!(!json.contains("our_secret"));
        assert!(!json.contains("\"secret\""));
        assert!(json.contains("\"digest\":\"MD5\""));
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(serde_json::from_str::<TicketPolicy>(r#"{"timeout":"soon"}"#).is_err());
        assert!(serde_json::from_str::<TicketPolicy>(r#"{"timeout":-1}"#).is_err());
        assert!(serde_json::from_str::<TicketPolicy>(r#"{"digest":"SHA1"}"#).is_err());
    }
}
