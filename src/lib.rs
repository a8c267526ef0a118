//! Codec, checksum and verifier for `mod_auth_tkt` single sign-on cookies.
//!
//! An auth ticket is a signed, delimiter-based string carried in a cookie so
//! that independent web tiers can trust a user identity without shared
//! session storage. Any tier holding the shared secret can issue tickets, and
//! any other tier can verify them.
//!
//! # Wire Format
//!
//! ```text
//! hex(checksum) + hex8(timestamp) + username + "!" [+ tokens + "!"] + user_data
//! ```
//!
//! | Field | Encoding |
//! |-------|----------|
//! | checksum | lower-case hex, 32/64/128 chars for MD5/SHA-256/SHA-512 |
//! | timestamp | 8 lower-case hex chars, seconds since the epoch |
//! | tokens | comma-separated, optional |
//! | user data | opaque, may be empty |
//!
//! On the way in, cookie values may additionally be quoted, percent-encoded
//! or base64-encoded. On the way out they are percent-encoded.
//!
//! # Quick Start
//!
//! ```rust
//! use auth_tkt::{RequestHeaders, Ticket, TicketBuilder, TicketPolicy, TicketVerifier};
//!
//! let verifier = TicketVerifier::new(
//!     TicketPolicy::new("our_secret")
//!         .with_timeout(2 * 3600)
//!         .with_required_token("engineer"),
//! );
//!
//! // Issue a ticket at the login tier
//! let unsigned = TicketBuilder::new("jblow")?
//!     .with_token("admin")?
//!     .with_token("engineer")?
//!     .with_user_data("Joe Blow")?;
//! let cookie = verifier.encode(&unsigned, None)?.encoded();
//!
//! // Verify it at any other tier
//! let request = RequestHeaders::new(&format!("auth_tkt={cookie}"));
//! let ticket = verifier.authenticate(&request)?;
//! assert_eq!(ticket.username(), "jblow");
//! assert!(ticket.contains("admin"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Checksum
//!
//! ```text
//! digest0  := H(address_stamp + secret + username + '\0' + tokens + '\0' + user_data)
//! checksum := H(lower_hex(digest0) + secret)
//! ```
//!
//! The address stamp is the client IPv4 address (zero unless the policy binds
//! addresses) followed by the big-endian timestamp. See [`compute_checksum`].
//!
//! # Logging
//!
//! Decoding steps and verification failures are reported through `tracing`
//! at `debug` level, never including the secret or checksums. Install a
//! subscriber to see them.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod codec;
mod constants;
mod digest;
mod encoding;
mod error;
mod mac;
mod policy;
pub mod prelude;
mod request;
mod secret;
mod ticket;
mod verifier;

pub use codec::{parse_cookie, parse_ticket, serialize_ticket};
pub use constants::{
    ADDRESS_STAMP_LENGTH, DEFAULT_COOKIE_NAME, DELIMITER, TIMESTAMP_HEX_LENGTH, TOKEN_SEPARATOR,
    UNSIGNED_CHECKSUM_LENGTH,
};
pub use digest::{DigestAlgorithm, TicketHasher};
pub use encoding::{decode_cookie_value, encode_for_transport};
pub use error::{MalformedReason, PolicyError, TicketError, TicketFieldError};
pub use mac::{AddressStamp, MacFields, checksums_match, compute_checksum, rehash_hex_digest};
pub use policy::{TicketPolicy, parse_time_expression};
pub use request::{
    CookieJar, RequestHeaders, TicketRequest, parse_client_address, resolve_client_address,
};
pub use secret::Secret;
pub use ticket::{AuthTicket, Ticket, TicketBuilder};
pub use verifier::TicketVerifier;
