//! Wire string parsing and serialization.
//!
//! ```text
//! hex(checksum) + hex8(timestamp) + username + "!" [+ tokens + "!"] + user_data
//! ```

use crate::constants::{DELIMITER, TIMESTAMP_HEX_LENGTH, UNSIGNED_CHECKSUM_LENGTH};
use crate::digest::DigestAlgorithm;
use crate::encoding::decode_cookie_value;
use crate::error::{MalformedReason, TicketError};
use crate::ticket::{AuthTicket, Ticket};

/// Parses a wire string into a ticket carrying its claimed checksum.
///
/// The algorithm fixes the width of the checksum prefix. The checksum is not
/// verified here; see [`TicketVerifier`](crate::TicketVerifier).
///
/// # Errors
///
/// Returns [`TicketError::Malformed`] if:
/// - the string is not longer than the checksum plus timestamp width
/// - the checksum prefix is not hex
/// - the timestamp is not eight hex digits
/// - the remainder does not split into two or three `!`-delimited fields
/// - the username is empty
///
/// # Examples
///
/// ```
/// use auth_tkt::{parse_ticket, DigestAlgorithm, Ticket};
///
/// let ticket = parse_ticket(
///     "e400af8d8448df14b22193dfdcebe22b55ce64a9cfloersch!Workbook+OVE!Chris+Floersch",
///     DigestAlgorithm::Md5,
/// ).unwrap();
/// assert_eq!(ticket.username(), "cfloersch");
/// assert_eq!(ticket.tokens(), ["Workbook+OVE"]);
///
/// assert!(parse_ticket("e400af8d", DigestAlgorithm::Md5).is_err());
/// ```
pub fn parse_ticket(wire: &str, algorithm: DigestAlgorithm) -> Result<AuthTicket, TicketError> {
    let checksum_width = algorithm.checksum_hex_len();
    let header_width = checksum_width + TIMESTAMP_HEX_LENGTH;

    if wire.len() <= header_width {
        return Err(TicketError::malformed(MalformedReason::InvalidLength {
            min: header_width,
            actual: wire.len(),
        }));
    }

    let checksum = wire
        .get(..checksum_width)
        .and_then(|hex_text| hex::decode(hex_text).ok())
        .ok_or(TicketError::malformed(MalformedReason::InvalidChecksumHex))?;

    let timestamp = wire
        .get(checksum_width..header_width)
        .filter(|hex_text| hex_text.bytes().all(|b| b.is_ascii_hexdigit()))
        .and_then(|hex_text| u32::from_str_radix(hex_text, 16).ok())
        .ok_or(TicketError::malformed(MalformedReason::InvalidTimestamp))?;

    let body = wire
        .get(header_width..)
        .ok_or(TicketError::malformed(MalformedReason::InvalidTimestamp))?;

    let fields: Vec<&str> = body.split(DELIMITER).collect();
    let (username, token_list, user_data) = match fields.as_slice() {
        [username, user_data] => (*username, None, *user_data),
        [username, token_list, user_data] => (*username, Some(*token_list), *user_data),
        _ => return Err(TicketError::malformed(MalformedReason::MissingUserData)),
    };

    if username.is_empty() {
        return Err(TicketError::malformed(MalformedReason::EmptyUsername));
    }

    Ok(AuthTicket::from_wire_parts(
        checksum, timestamp, username, token_list, user_data,
    ))
}

/// Decodes a raw cookie value and parses the resulting wire string.
///
/// # Errors
///
/// Returns [`TicketError::Malformed`] if the value cannot be decoded or
/// parsed.
pub fn parse_cookie(raw: &str, algorithm: DigestAlgorithm) -> Result<AuthTicket, TicketError> {
    let wire = decode_cookie_value(raw)?;
    parse_ticket(&wire, algorithm)
}

/// Renders a ticket as its wire string.
///
/// An unsigned ticket is rendered with a zero checksum of
/// [`UNSIGNED_CHECKSUM_LENGTH`] bytes.
///
/// # Examples
///
/// ```
/// use auth_tkt::{serialize_ticket, TicketBuilder};
///
/// let ticket = TicketBuilder::new("jblow")?
///     .with_timestamp(0x5bd1_f400)
///     .with_token("admin")?;
/// assert_eq!(serialize_ticket(&ticket), "000000005bd1f400jblow!admin!");
/// # Ok::<(), auth_tkt::TicketFieldError>(())
/// ```
#[must_use]
pub fn serialize_ticket(ticket: &impl Ticket) -> String {
    let checksum = ticket.checksum();
    let mut wire = if checksum.is_empty() {
        hex::encode([0u8; UNSIGNED_CHECKSUM_LENGTH])
    } else {
        hex::encode(checksum)
    };

    wire.push_str(&format!("{:08x}", ticket.timestamp()));
    wire.push_str(ticket.username());

    let token_list = ticket.token_list();
    if !token_list.is_empty() {
        wire.push(DELIMITER);
        wire.push_str(&token_list);
    }

    wire.push(DELIMITER);
    wire.push_str(ticket.user_data());
    wire
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKSUM: &str = "00112233445566778899aabbccddeeff";

    fn md5(body: &str) -> Result<AuthTicket, TicketError> {
        parse_ticket(&format!("{CHECKSUM}000000ffjblow{body}"), DigestAlgorithm::Md5)
    }

    fn malformed(reason: MalformedReason) -> Result<AuthTicket, TicketError> {
        Err(TicketError::malformed(reason))
    }

    #[test]
    fn parses_three_fields() {
        let ticket = md5("!admin,engineer!Joe Blow").unwrap();
        assert_eq!(ticket.checksum_hex(), CHECKSUM);
        assert_eq!(ticket.timestamp(), 0xff);
        assert_eq!(ticket.username(), "jblow");
        assert_eq!(ticket.tokens(), ["admin", "engineer"]);
        assert_eq!(ticket.user_data(), "Joe Blow");
    }

    #[test]
    fn parses_two_fields() {
        let ticket = md5("!Joe Blow").unwrap();
        assert!(ticket.tokens().is_empty());
        assert_eq!(ticket.user_data(), "Joe Blow");
    }

    #[test]
    fn trailing_empty_fields_are_kept() {
        let ticket = md5("!").unwrap();
        assert_eq!(ticket.user_data(), "");

        let ticket = md5("!admin!").unwrap();
        assert_eq!(ticket.tokens(), ["admin"]);
        assert_eq!(ticket.user_data(), "");
    }

    #[test]
    fn too_many_or_too_few_fields() {
        assert_eq!(md5(""), malformed(MalformedReason::MissingUserData));
        assert_eq!(md5("!a!b!c"), malformed(MalformedReason::MissingUserData));
    }

    #[test]
    fn length_must_exceed_header() {
        assert_eq!(
            parse_ticket(&format!("{CHECKSUM}000000ff"), DigestAlgorithm::Md5),
            malformed(MalformedReason::InvalidLength { min: 40, actual: 40 })
        );
        assert_eq!(
            parse_ticket("short", DigestAlgorithm::Sha256),
            malformed(MalformedReason::InvalidLength { min: 72, actual: 5 })
        );
    }

    #[test]
    fn bad_checksum_hex() {
        let wire = format!("zz{}000000ffjblow!", &CHECKSUM[2..]);
        assert_eq!(
            parse_ticket(&wire, DigestAlgorithm::Md5),
            malformed(MalformedReason::InvalidChecksumHex)
        );
    }

    #[test]
    fn bad_timestamp() {
        for stamp in ["0000zzff", "+00000ff", "-00000ff"] {
            let wire = format!("{CHECKSUM}{stamp}jblow!");
            assert_eq!(
                parse_ticket(&wire, DigestAlgorithm::Md5),
                malformed(MalformedReason::InvalidTimestamp)
            );
        }
    }

    #[test]
    fn timestamp_uses_full_unsigned_range() {
        let wire = format!("{CHECKSUM}ffffffffjblow!");
        let ticket = parse_ticket(&wire, DigestAlgorithm::Md5).unwrap();
        assert_eq!(ticket.timestamp(), u32::MAX);
    }

    #[test]
    fn multibyte_header_does_not_panic() {
        let wire = format!("{}é00000000jblow!", &CHECKSUM[..31]);
        assert_eq!(
            parse_ticket(&wire, DigestAlgorithm::Md5),
            malformed(MalformedReason::InvalidChecksumHex)
        );
    }

    #[test]
    fn empty_username() {
        assert_eq!(
            parse_ticket(&format!("{CHECKSUM}000000ff!data"), DigestAlgorithm::Md5),
            malformed(MalformedReason::EmptyUsername)
        );
    }

    #[test]
    fn algorithm_fixes_checksum_width() {
        let wire = format!("{}5bd1f400jblow!", "ab".repeat(32));
        let ticket = parse_ticket(&wire, DigestAlgorithm::Sha256).unwrap();
        assert_eq!(ticket.checksum().len(), 32);
        assert_eq!(ticket.timestamp(), 0x5bd1_f400);

        let as_md5 = parse_ticket(&wire, DigestAlgorithm::Md5).unwrap();
        assert_eq!(as_md5.username().len(), 24 + 8 + 5);
    }

    #[test]
    fn serialize_roundtrip() {
        for body in ["!admin,engineer!Joe Blow", "!Joe Blow", "!", "!admin!"] {
            let wire = format!("{CHECKSUM}000000ffjblow{body}");
            let ticket = parse_ticket(&wire, DigestAlgorithm::Md5).unwrap();
            assert_eq!(serialize_ticket(&ticket), wire);
            assert_eq!(ticket.to_string(), wire);
        }
    }

    #[test]
    fn serialize_unsigned() {
        let builder = crate::TicketBuilder::new("jblow")
            .unwrap()
            .with_timestamp(1)
            .with_user_data("Joe")
            .unwrap();
        assert_eq!(serialize_ticket(&builder), "0000000000000001jblow!Joe");
    }

    #[test]
    fn timestamp_is_zero_padded() {
        for (timestamp, hex) in [(0, "00000000"), (0xabc, "00000abc"), (u32::MAX, "ffffffff")] {
            let builder = crate::TicketBuilder::new("jblow")
                .unwrap()
                .with_timestamp(timestamp);
            assert_eq!(serialize_ticket(&builder), format!("00000000{hex}jblow!"));
        }
    }

    #[test]
    fn parse_cookie_decodes_first() {
        let raw = format!("\"{CHECKSUM}000000ffjblow%21admin%21Joe%20Blow\"");
        let ticket = parse_cookie(&raw, DigestAlgorithm::Md5).unwrap();
        assert_eq!(ticket.tokens(), ["admin"]);
        assert_eq!(ticket.user_data(), "Joe Blow");
    }
}
