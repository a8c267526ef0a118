//! Convenient re-exports for glob imports.
//!
//! ```rust
//! use auth_tkt::prelude::*;
//!
//! let verifier = TicketVerifier::new(TicketPolicy::new("our_secret"));
//! let ticket = TicketBuilder::new("jblow").unwrap();
//! assert!(verifier.encode(&ticket, None).is_ok());
//! ```
//!
//! Checksum internals (`compute_checksum`, `AddressStamp`, `MacFields`) are
//! left out; import them from the crate root when needed.

pub use crate::{
    // Core types
    AuthTicket, DigestAlgorithm, Secret, Ticket, TicketBuilder,
    // Verification
    CookieJar, RequestHeaders, TicketPolicy, TicketRequest, TicketVerifier,
    // Errors
    MalformedReason, PolicyError, TicketError, TicketFieldError,
    // Codec
    decode_cookie_value, encode_for_transport, parse_cookie, parse_ticket, serialize_ticket,
    // Constants
    DEFAULT_COOKIE_NAME,
};
