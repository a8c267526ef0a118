//! Transport encodings of the ticket wire string.
//!
//! Producers in the wild quote, percent-encode or base64-encode the cookie
//! value. Every valid wire string contains at least one `!`, so decoding
//! repeats until that delimiter appears:
//!
//! 1. strip one layer of surrounding quotes
//! 2. a string containing `!` is the wire string
//! 3. a string containing `%21` or `%3D` is percent-decoded, then step 2 again
//! 4. anything else is base64-decoded, then step 2 again
//!
//! Each decode strictly shortens the string, so the loop terminates.

use std::borrow::Cow;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use tracing::debug;

use crate::constants::DELIMITER;
use crate::error::{MalformedReason, TicketError};

/// Characters left unescaped on issuance: alphanumerics plus `-_.*`.
const TICKET_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'*');

/// Standard alphabet; padding is optional on input.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Recovers the wire string from a raw cookie value.
///
/// # Errors
///
/// Returns [`TicketError::Malformed`] with [`MalformedReason::UnknownEncoding`]
/// if no decoding step yields a string containing `!`.
///
/// # Examples
///
/// ```
/// use auth_tkt::decode_cookie_value;
///
/// let wire = decode_cookie_value("\"abc%21def\"").unwrap();
/// assert_eq!(wire, "abc!def");
/// ```
pub fn decode_cookie_value(raw: &str) -> Result<String, TicketError> {
    let mut current = unquote(raw).to_string();

    while !current.contains(DELIMITER) {
        current = if is_percent_encoded(&current) {
            debug!(step = "percent", len = current.len(), "decoding ticket cookie");
            percent_decode(&current)?
        } else {
            debug!(step = "base64", len = current.len(), "decoding ticket cookie");
            base64_decode(&current)?
        };
    }

    Ok(current)
}

/// Percent-encodes a wire string for placement in a `Set-Cookie` header.
///
/// Base64 is accepted on input for older producers but never emitted.
///
/// # Examples
///
/// ```
/// use auth_tkt::encode_for_transport;
///
/// assert_eq!(encode_for_transport("jblow!a+b!Joe Blow"), "jblow%21a%2Bb%21Joe%20Blow");
/// ```
#[must_use]
pub fn encode_for_transport(wire: &str) -> String {
    utf8_percent_encode(wire, TICKET_ENCODE_SET).to_string()
}

/// Strips one layer of matching surrounding quotes.
fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn is_percent_encoded(value: &str) -> bool {
    value.contains("%21") || value.contains("%3D") || value.contains("%3d")
}

fn percent_decode(value: &str) -> Result<String, TicketError> {
    percent_decode_str(value)
        .decode_utf8()
        .map(Cow::into_owned)
        .map_err(|_| TicketError::malformed(MalformedReason::UnknownEncoding))
}

fn base64_decode(value: &str) -> Result<String, TicketError> {
    let bytes = LENIENT_BASE64
        .decode(value)
        .map_err(|_| TicketError::malformed(MalformedReason::UnknownEncoding))?;
    if bytes.is_empty() {
        return Err(TicketError::malformed(MalformedReason::UnknownEncoding));
    }
    String::from_utf8(bytes).map_err(|_| TicketError::malformed(MalformedReason::UnknownEncoding))
}
