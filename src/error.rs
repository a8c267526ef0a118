//! Error types for auth ticket decoding, verification and issuance.

use std::fmt;

/// Errors produced while locating, decoding or verifying an auth ticket.
///
/// The variants form two families that callers usually branch on:
///
/// - "not found": [`NotFound`](Self::NotFound), [`Malformed`](Self::Malformed)
///   and [`Expired`](Self::Expired). The request should be treated as
///   unauthenticated. See [`is_not_found`](Self::is_not_found).
/// - "invalid": [`Invalid`](Self::Invalid) and
///   [`TokenMissing`](Self::TokenMissing). A ticket was presented but must not
///   be trusted for this resource. See [`is_invalid`](Self::is_invalid).
///
/// None of these failures is retryable for the same ticket value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketError {
    /// No ticket cookie was present, or its value was empty.
    NotFound,
    /// The cookie value could not be decoded into a ticket.
    Malformed {
        /// Why decoding failed
        reason: MalformedReason,
    },
    /// The ticket is older than the configured timeout.
    Expired {
        /// Creation time carried by the ticket (seconds since epoch)
        timestamp: u32,
        /// Timeout in seconds that was exceeded
        timeout: u64,
    },
    /// The checksum does not match the ticket contents.
    Invalid,
    /// The checksum is valid but none of the required tokens are present.
    TokenMissing {
        /// Tokens of which at least one was required
        required: Vec<String>,
    },
    /// The client address supplied for issuance could not be parsed.
    InvalidAddress {
        /// The rejected address
        value: String,
    },
}

impl TicketError {
    /// Returns true for failures that mean "no usable ticket": missing,
    /// malformed or expired.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound | Self::Malformed { .. } | Self::Expired { .. }
        )
    }

    /// Returns true for failures where a ticket was decoded but must not be
    /// trusted: checksum mismatch or missing required token.
    #[must_use]
    pub const fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid | Self::TokenMissing { .. })
    }

    pub(crate) const fn malformed(reason: MalformedReason) -> Self {
        Self::Malformed { reason }
    }
}

impl fmt::Display for TicketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "no auth ticket present"),
            Self::Malformed { reason } => write!(f, "malformed auth ticket: {reason}"),
            Self::Expired { timestamp, timeout } => write!(
                f,
                "auth ticket issued at {timestamp} expired after {timeout}s; re-authentication required"
            ),
            Self::Invalid => write!(
                f,
                "auth ticket checksum mismatch; ticket may have been tampered with"
            ),
            Self::TokenMissing { required } => write!(
                f,
                "auth ticket carries none of the required tokens [{}]",
                required.join(", ")
            ),
            Self::InvalidAddress { value } => {
                write!(f, "invalid client address '{value}'")
            }
        }
    }
}

impl std::error::Error for TicketError {}

/// Why a ticket string could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    /// The wire string is not longer than checksum plus timestamp.
    InvalidLength {
        /// Minimum length that must be exceeded
        min: usize,
        /// Actual length
        actual: usize,
    },
    /// The checksum prefix is not valid hex.
    InvalidChecksumHex,
    /// The timestamp is not eight hex digits.
    InvalidTimestamp,
    /// The body does not split into two or three `!`-delimited fields.
    MissingUserData,
    /// The username field is empty.
    EmptyUsername,
    /// No decoding step produced a string containing the `!` delimiter.
    UnknownEncoding,
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLength { min, actual } => {
                write!(f, "invalid ticket length {actual}, must exceed {min}")
            }
            Self::InvalidChecksumHex => write!(f, "checksum is not valid hex"),
            Self::InvalidTimestamp => write!(f, "timestamp is not 8 hex digits"),
            Self::MissingUserData => write!(f, "ticket missing user data"),
            Self::EmptyUsername => write!(f, "username is empty"),
            Self::UnknownEncoding => write!(f, "unknown encoding"),
        }
    }
}

/// Errors for ticket fields supplied to a [`TicketBuilder`](crate::TicketBuilder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketFieldError {
    /// Username is empty
    EmptyUsername,
    /// A field contains the `!` delimiter
    ContainsDelimiter {
        /// Name of the offending field
        field: &'static str,
        /// The rejected value
        value: String,
    },
    /// A token is empty or only whitespace
    EmptyToken,
    /// A token contains the `,` separator
    ContainsSeparator {
        /// The rejected token
        value: String,
    },
}

impl fmt::Display for TicketFieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "username cannot be empty"),
            Self::EmptyToken => write!(f, "token cannot be empty"),
            Self::ContainsDelimiter { field, value } => {
                write!(f, "{field} '{value}' contains invalid character '!'")
            }
            Self::ContainsSeparator { value } => {
                write!(f, "token '{value}' contains invalid character ','")
            }
        }
    }
}

impl std::error::Error for TicketFieldError {}

/// Errors for building a [`TicketPolicy`](crate::TicketPolicy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// The shared secret is empty
    EmptySecret,
    /// A timeout expression did not match `<digits>[s|m|h|d]`
    InvalidTimeExpression {
        /// The rejected expression
        value: String,
    },
    /// Digest name is not one of MD5, SHA256, SHA512
    UnknownDigest {
        /// The rejected name
        value: String,
    },
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySecret => write!(f, "shared secret cannot be empty"),
            Self::InvalidTimeExpression { value } => write!(
                f,
                "invalid time expression '{value}'; expected digits with optional s, m, h or d suffix"
            ),
            Self::UnknownDigest { value } => write!(
                f,
                "unknown digest algorithm '{value}'; expected MD5, SHA256 or SHA512"
            ),
        }
    }
}

impl std::error::Error for PolicyError {}
