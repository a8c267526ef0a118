//! Ticket value types.
//!
//! A ticket comes into existence in one of two ways:
//!
//! - decoded from a cookie by [`parse_ticket`](crate::parse_ticket), giving an
//!   immutable [`AuthTicket`] that carries the checksum it *claims*;
//! - assembled by an issuer with a [`TicketBuilder`], which has no checksum and
//!   is signed by [`TicketVerifier::encode`](crate::TicketVerifier::encode).

use std::borrow::Cow;
use std::fmt;

use chrono::Utc;

use crate::codec::serialize_ticket;
use crate::constants::{DELIMITER, TOKEN_SEPARATOR};
use crate::encoding::encode_for_transport;
use crate::error::TicketFieldError;

/// Read access shared by signed and unsigned tickets.
pub trait Ticket {
    /// Returns the principal's name.
    fn username(&self) -> &str;

    /// Returns the creation time in seconds since the epoch.
    fn timestamp(&self) -> u32;

    /// Returns the tokens in wire order, without duplicates.
    fn tokens(&self) -> &[String];

    /// Returns the application data, empty if none.
    fn user_data(&self) -> &str;

    /// Returns the checksum, empty for an unsigned ticket.
    fn checksum(&self) -> &[u8];

    /// Returns the token list exactly as it is hashed and serialized.
    fn token_list(&self) -> Cow<'_, str> {
        Cow::Owned(self.tokens().join(","))
    }

    /// Returns true if the ticket carries `token`.
    fn contains(&self, token: &str) -> bool {
        self.tokens().iter().any(|t| t == token)
    }

    /// Returns true if the ticket carries at least one of `required`.
    ///
    /// An empty `required` set is always satisfied.
    fn contains_any<S: AsRef<str>>(&self, required: &[S]) -> bool
    where
        Self: Sized,
    {
        required.is_empty() || required.iter().any(|r| self.contains(r.as_ref()))
    }

    /// Returns true if at `now` the ticket is at least `timeout` seconds old.
    ///
    /// A zero timeout never expires.
    fn is_expired_at(&self, timeout: u64, now: i64) -> bool {
        if timeout == 0 {
            return false;
        }
        let timeout = i64::try_from(timeout).unwrap_or(i64::MAX);
        now.saturating_sub(i64::from(self.timestamp())) >= timeout
    }

    /// Returns true if the ticket is at least `timeout` seconds old now.
    fn is_expired(&self, timeout: u64) -> bool {
        self.is_expired_at(timeout, Utc::now().timestamp())
    }
}

/// A signed, immutable auth ticket.
///
/// Produced either by parsing a cookie (the checksum is then only *claimed*
/// until a [`TicketVerifier`](crate::TicketVerifier) accepts it) or by
/// signing a [`TicketBuilder`].
///
/// `Display` renders the wire string; [`encoded`](Self::encoded) renders the
/// percent-encoded form for a `Set-Cookie` header.
///
/// # Example
///
/// ```
/// use auth_tkt::{parse_ticket, DigestAlgorithm, Ticket};
///
/// let ticket = parse_ticket(
///     "00112233445566778899aabbccddeeffaabbccddcfloersch!admin,engineer!Chris",
///     DigestAlgorithm::Md5,
/// ).unwrap();
///
/// assert_eq!(ticket.username(), "cfloersch");
/// assert_eq!(ticket.timestamp(), 0xaabb_ccdd);
/// assert!(ticket.contains("engineer"));
/// assert_eq!(ticket.user_data(), "Chris");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuthTicket {
    checksum: Vec<u8>,
    timestamp: u32,
    username: String,
    token_list: String,
    tokens: Vec<String>,
    user_data: String,
}

impl AuthTicket {
    /// Assembles a ticket from decoded wire fields.
    ///
    /// `token_list` is kept verbatim for checksum computation.
    pub(crate) fn from_wire_parts(
        checksum: Vec<u8>,
        timestamp: u32,
        username: &str,
        token_list: Option<&str>,
        user_data: &str,
    ) -> Self {
        let token_list = token_list.unwrap_or_default();
        Self {
            checksum,
            timestamp,
            username: username.to_string(),
            tokens: parse_token_list(token_list),
            token_list: token_list.to_string(),
            user_data: user_data.to_string(),
        }
    }

    /// Attaches a freshly computed checksum to the fields of `ticket`.
    pub(crate) fn signed(ticket: &impl Ticket, checksum: Vec<u8>) -> Self {
        Self {
            checksum,
            timestamp: ticket.timestamp(),
            username: ticket.username().to_string(),
            token_list: ticket.token_list().into_owned(),
            tokens: ticket.tokens().to_vec(),
            user_data: ticket.user_data().to_string(),
        }
    }

    /// Returns the checksum as lower-case hex.
    #[must_use]
    pub fn checksum_hex(&self) -> String {
        hex::encode(&self.checksum)
    }

    /// Returns the wire string, equivalent to `to_string()`.
    #[must_use]
    pub fn to_wire(&self) -> String {
        serialize_ticket(self)
    }

    /// Returns the percent-encoded wire string for use as a cookie value.
    #[must_use]
    pub fn encoded(&self) -> String {
        encode_for_transport(&self.to_wire())
    }
}

impl Ticket for AuthTicket {
    fn username(&self) -> &str {
        &self.username
    }

    fn timestamp(&self) -> u32 {
        self.timestamp
    }

    fn tokens(&self) -> &[String] {
        &self.tokens
    }

    fn user_data(&self) -> &str {
        &self.user_data
    }

    fn checksum(&self) -> &[u8] {
        &self.checksum
    }

    fn token_list(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.token_list)
    }
}

impl fmt::Display for AuthTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serialize_ticket(self))
    }
}

/// An unsigned ticket under construction.
///
/// Tokens keep insertion order, which is the order they are hashed and
/// serialized in. Every setter rejects values that would break the
/// positional wire format.
///
/// # Example
///
/// ```
/// use auth_tkt::{Ticket, TicketBuilder};
///
/// let mut ticket = TicketBuilder::new("jblow")?
///     .with_token("admin")?
///     .with_user_data("Joe Blow")?;
/// ticket.add_token("engineer")?;
///
/// assert_eq!(ticket.tokens(), ["admin", "engineer"]);
/// assert!(ticket.checksum().is_empty());
/// assert!(TicketBuilder::new("j!blow").is_err());
/// # Ok::<(), auth_tkt::TicketFieldError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketBuilder {
    timestamp: u32,
    username: String,
    tokens: Vec<String>,
    user_data: String,
}

impl TicketBuilder {
    /// Starts a ticket for `username`, stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`TicketFieldError`] if the username is empty or contains `!`.
    pub fn new(username: impl Into<String>) -> Result<Self, TicketFieldError> {
        let username = username.into();
        if username.is_empty() {
            return Err(TicketFieldError::EmptyUsername);
        }
        check_delimiter("username", &username)?;
        Ok(Self {
            timestamp: now_timestamp(),
            username,
            tokens: Vec::new(),
            user_data: String::new(),
        })
    }

    /// Overrides the creation timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: u32) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Adds a token, returning false if it was already present.
    ///
    /// Surrounding whitespace is trimmed, as it is when tokens are parsed.
    ///
    /// # Errors
    ///
    /// Returns [`TicketFieldError`] if the token is empty or contains `!` or `,`.
    pub fn add_token(&mut self, token: &str) -> Result<bool, TicketFieldError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TicketFieldError::EmptyToken);
        }
        check_delimiter("token", token)?;
        if token.contains(TOKEN_SEPARATOR) {
            return Err(TicketFieldError::ContainsSeparator {
                value: token.to_string(),
            });
        }
        if self.contains(token) {
            return Ok(false);
        }
        self.tokens.push(token.to_string());
        Ok(true)
    }

    /// Chaining form of [`add_token`](Self::add_token).
    ///
    /// # Errors
    ///
    /// Returns [`TicketFieldError`] if the token is invalid.
    pub fn with_token(mut self, token: &str) -> Result<Self, TicketFieldError> {
        self.add_token(token)?;
        Ok(self)
    }

    /// Removes a token, returning true if it was present.
    pub fn remove_token(&mut self, token: &str) -> bool {
        let before = self.tokens.len();
        self.tokens.retain(|t| t != token);
        self.tokens.len() != before
    }

    /// Sets the application data.
    ///
    /// # Errors
    ///
    /// Returns [`TicketFieldError::ContainsDelimiter`] if the data contains `!`.
    pub fn set_user_data(&mut self, user_data: impl Into<String>) -> Result<(), TicketFieldError> {
        let user_data = user_data.into();
        check_delimiter("user data", &user_data)?;
        self.user_data = user_data;
        Ok(())
    }

    /// Chaining form of [`set_user_data`](Self::set_user_data).
    ///
    /// # Errors
    ///
    /// Returns [`TicketFieldError::ContainsDelimiter`] if the data contains `!`.
    pub fn with_user_data(mut self, user_data: impl Into<String>) -> Result<Self, TicketFieldError> {
        self.set_user_data(user_data)?;
        Ok(self)
    }

    /// Clears the application data.
    pub fn clear_user_data(&mut self) {
        self.user_data.clear();
    }
}

impl Ticket for TicketBuilder {
    fn username(&self) -> &str {
        &self.username
    }

    fn timestamp(&self) -> u32 {
        self.timestamp
    }

    fn tokens(&self) -> &[String] {
        &self.tokens
    }

    fn user_data(&self) -> &str {
        &self.user_data
    }

    fn checksum(&self) -> &[u8] {
        &[]
    }
}

impl fmt::Display for TicketBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serialize_ticket(self))
    }
}

/// Splits a comma-separated token list, trimming whitespace and dropping
/// empty entries and duplicates.
fn parse_token_list(list: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for token in list.split(TOKEN_SEPARATOR).map(str::trim) {
        if !token.is_empty() && !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
    }
    tokens
}

fn check_delimiter(field: &'static str, value: &str) -> Result<(), TicketFieldError> {
    if value.contains(DELIMITER) {
        Err(TicketFieldError::ContainsDelimiter {
            field,
            value: value.to_string(),
        })
    } else {
        Ok(())
    }
}

fn now_timestamp() -> u32 {
    u32::try_from(Utc::now().timestamp()).unwrap_or(u32::MAX)
}
