//! Ticket issuance and verification under a [`TicketPolicy`].

use std::net::Ipv4Addr;

use chrono::Utc;
use tracing::{debug, trace, warn};

use crate::codec::parse_cookie;
use crate::error::{PolicyError, TicketError};
use crate::mac::{AddressStamp, MacFields, checksums_match, compute_checksum};
use crate::policy::TicketPolicy;
use crate::request::{TicketRequest, parse_client_address, resolve_client_address};
use crate::ticket::{AuthTicket, Ticket};

/// Signs and verifies tickets for one protected resource.
///
/// A verifier holds only its policy and allocates a fresh hashing context for
/// every call, so a single instance can be shared across threads.
///
/// # Example
///
/// ```
/// use auth_tkt::{TicketBuilder, TicketPolicy, TicketVerifier};
///
/// let verifier = TicketVerifier::new(
///     TicketPolicy::new("our_secret").with_timeout(3600).with_required_token("admin"),
/// );
///
/// let unsigned = TicketBuilder::new("jblow").unwrap().with_token("admin").unwrap();
/// let signed = verifier.encode(&unsigned, None).unwrap();
///
/// let ticket = verifier.authenticate_cookie(&signed.encoded(), None).unwrap();
/// assert_eq!(ticket, signed);
/// ```
#[derive(Debug, Clone)]
pub struct TicketVerifier {
    policy: TicketPolicy,
}

impl TicketVerifier {
    /// Creates a verifier.
    ///
    /// Logs a warning if the policy disables expiry.
    #[must_use]
    pub fn new(policy: TicketPolicy) -> Self {
        if policy.expiry_disabled() {
            warn!(
                cookie = %policy.cookie_name,
                "ticket timeout disabled; tickets never expire and can be replayed indefinitely"
            );
        }
        Self { policy }
    }

    /// Creates a verifier after validating the policy.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::EmptySecret`] if the policy has no secret.
    pub fn try_new(policy: TicketPolicy) -> Result<Self, PolicyError> {
        policy.validate()?;
        Ok(Self::new(policy))
    }

    /// Returns the policy.
    #[must_use]
    pub const fn policy(&self) -> &TicketPolicy {
        &self.policy
    }

    /// Signs a ticket.
    ///
    /// `client_addr` is only consulted when the policy binds addresses; an
    /// IPv6 client is then issued an unbound ticket.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::InvalidAddress`] if address binding is on and
    /// `client_addr` is not an IP address.
    pub fn encode(
        &self,
        ticket: &impl Ticket,
        client_addr: Option<&str>,
    ) -> Result<AuthTicket, TicketError> {
        let address = if self.policy.check_address {
            parse_client_address(client_addr)?
        } else {
            None
        };
        let checksum = self.checksum_for(ticket, address);
        Ok(AuthTicket::signed(ticket, checksum))
    }

    /// Verifies a decoded ticket against the current time.
    ///
    /// # Errors
    ///
    /// See [`verify_at`](Self::verify_at).
    pub fn verify(&self, ticket: &impl Ticket, client_addr: Option<&str>) -> Result<(), TicketError> {
        self.verify_at(ticket, client_addr, Utc::now().timestamp())
    }

    /// Verifies a decoded ticket as of `now` (seconds since the epoch).
    ///
    /// Checks run in order and the first failure is returned:
    /// 1. expiry
    /// 2. checksum, with the client address bound if the policy says so
    /// 3. required tokens
    ///
    /// # Errors
    ///
    /// - [`TicketError::Expired`] if the ticket is at least `timeout` seconds old
    /// - [`TicketError::Invalid`] if the checksum does not match
    /// - [`TicketError::TokenMissing`] if none of the required tokens is present
    pub fn verify_at(
        &self,
        ticket: &impl Ticket,
        client_addr: Option<&str>,
        now: i64,
    ) -> Result<(), TicketError> {
        let policy = &self.policy;

        if ticket.is_expired_at(policy.timeout, now) {
            debug!(
                username = ticket.username(),
                timestamp = ticket.timestamp(),
                timeout = policy.timeout,
                "ticket expired"
            );
            return Err(TicketError::Expired {
                timestamp: ticket.timestamp(),
                timeout: policy.timeout,
            });
        }

        let address = if policy.check_address {
            resolve_client_address(client_addr)
        } else {
            None
        };
        let expected = self.checksum_for(ticket, address);
        if !checksums_match(ticket.checksum(), &expected) {
            debug!(
                username = ticket.username(),
                digest = %policy.digest,
                address_bound = policy.check_address,
                "ticket checksum mismatch"
            );
            return Err(TicketError::Invalid);
        }

        if !ticket.contains_any(policy.required_tokens.as_slice()) {
            debug!(
                username = ticket.username(),
                required = ?policy.required_tokens,
                "ticket lacks required token"
            );
            return Err(TicketError::TokenMissing {
                required: policy.required_tokens.clone(),
            });
        }

        trace!(username = ticket.username(), "ticket verified");
        Ok(())
    }

    /// Decodes, parses and verifies a raw cookie value.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::NotFound`] for an empty value, otherwise any
    /// error from [`parse_cookie`](crate::parse_cookie) or
    /// [`verify`](Self::verify).
    pub fn authenticate_cookie(
        &self,
        raw: &str,
        client_addr: Option<&str>,
    ) -> Result<AuthTicket, TicketError> {
        if raw.trim().is_empty() {
            return Err(TicketError::NotFound);
        }
        let ticket = parse_cookie(raw, self.policy.digest).inspect_err(|err| {
            debug!(error = %err, "ticket cookie rejected");
        })?;
        self.verify(&ticket, client_addr)?;
        Ok(ticket)
    }

    /// Authenticates a request by its ticket cookie.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::NotFound`] if the request carries no non-empty
    /// cookie named by the policy, otherwise as
    /// [`authenticate_cookie`](Self::authenticate_cookie).
    pub fn authenticate(&self, request: &impl TicketRequest) -> Result<AuthTicket, TicketError> {
        let Some(raw) = request.cookie(&self.policy.cookie_name) else {
            debug!(cookie = %self.policy.cookie_name, "no ticket cookie");
            return Err(TicketError::NotFound);
        };
        self.authenticate_cookie(raw, request.remote_addr())
    }

    fn checksum_for(&self, ticket: &impl Ticket, address: Option<Ipv4Addr>) -> Vec<u8> {
        let token_list = ticket.token_list();
        compute_checksum(
            self.policy.digest,
            &self.policy.secret,
            &AddressStamp::new(address, ticket.timestamp()),
            MacFields {
                username: ticket.username(),
                token_list: &token_list,
                user_data: ticket.user_data(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::parse_ticket;
    use crate::digest::DigestAlgorithm;
    use crate::request::RequestHeaders;
    use crate::ticket::TicketBuilder;

    const SECRET: &str = "some_random_secret_key";
    const VECTOR: &str =
        "e400af8d8448df14b22193dfdcebe22b55ce64a9cfloersch!Workbook+OVE!Chris+Floersch";
    const VECTOR_TIMESTAMP: i64 = 0x55ce_64a9;

    fn verifier() -> TicketVerifier {
        TicketVerifier::new(TicketPolicy::new(SECRET))
    }

    fn vector() -> AuthTicket {
        parse_ticket(VECTOR, DigestAlgorithm::Md5).unwrap()
    }

    fn builder() -> TicketBuilder {
        TicketBuilder::new("jblow")
            .unwrap()
            .with_timestamp(0x5bd1_f400)
            .with_token("admin")
            .unwrap()
            .with_token("engineer")
            .unwrap()
            .with_user_data("Joe Blow")
            .unwrap()
    }

    #[test]
    fn verifies_known_vector() {
        assert_eq!(verifier().verify(&vector(), None), Ok(()));
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let verifier = TicketVerifier::new(TicketPolicy::new("another_secret"));
        assert_eq!(verifier.verify(&vector(), None), Err(TicketError::Invalid));
    }

    #[test]
    fn unsigned_ticket_is_invalid() {
        assert_eq!(verifier().verify(&builder(), None), Err(TicketError::Invalid));
    }

    #[test]
    fn expiry_boundary() {
        let verifier = TicketVerifier::new(TicketPolicy::new(SECRET).with_timeout(60));
        let ticket = vector();
        assert_eq!(verifier.verify_at(&ticket, None, VECTOR_TIMESTAMP + 59), Ok(()));
        assert_eq!(
            verifier.verify_at(&ticket, None, VECTOR_TIMESTAMP + 60),
            Err(TicketError::Expired {
                timestamp: 0x55ce_64a9,
                timeout: 60
            })
        );
    }

    #[test]
    fn old_vector_expires_now() {
        let verifier = TicketVerifier::new(TicketPolicy::new(SECRET).with_timeout(3600));
        assert!(matches!(
            verifier.verify(&vector(), None),
            Err(TicketError::Expired { .. })
        ));
    }

    #[test]
    fn expiry_is_checked_before_checksum() {
        let verifier = TicketVerifier::new(TicketPolicy::new("wrong").with_timeout(1));
        assert!(matches!(
            verifier.verify_at(&vector(), None, VECTOR_TIMESTAMP + 5),
            Err(TicketError::Expired { .. })
        ));
    }

    #[test]
    fn required_tokens() {
        let policy = TicketPolicy::new(SECRET).with_required_tokens(["admin", "Workbook+OVE"]);
        assert_eq!(TicketVerifier::new(policy).verify(&vector(), None), Ok(()));

        let policy = TicketPolicy::new(SECRET).with_required_token("admin");
        assert_eq!(
            TicketVerifier::new(policy).verify(&vector(), None),
            Err(TicketError::TokenMissing {
                required: vec!["admin".to_string()]
            })
        );
    }

    #[test]
    fn checksum_is_checked_before_tokens() {
        let policy = TicketPolicy::new("wrong").with_required_token("admin");
        assert_eq!(
            TicketVerifier::new(policy).verify(&vector(), None),
            Err(TicketError::Invalid)
        );
    }

    #[test]
    fn address_binding() {
        let unbound = verifier();
        let ticket = vector();
        assert_eq!(unbound.verify(&ticket, Some("192.168.1.12")), Ok(()));

        let bound = TicketVerifier::new(TicketPolicy::new(SECRET).with_check_address(true));
        assert_eq!(
            bound.verify(&ticket, Some("192.168.1.12")),
            Err(TicketError::Invalid)
        );
        assert_eq!(bound.verify(&ticket, None), Ok(()));
        assert_eq!(bound.verify(&ticket, Some("2001:db8::1")), Ok(()));
    }

    #[test]
    fn encode_bound_to_address() {
        let verifier = TicketVerifier::new(TicketPolicy::new(SECRET).with_check_address(true));
        let signed = verifier
            .encode(&builder(), Some("203.0.113.9, 10.0.0.1"))
            .unwrap();

        assert_eq!(verifier.verify(&signed, Some("203.0.113.9")), Ok(()));
        assert_eq!(
            verifier.verify(&signed, Some("203.0.113.10")),
            Err(TicketError::Invalid)
        );
        assert_eq!(verifier.verify(&signed, None), Err(TicketError::Invalid));
    }

    #[test]
    fn encode_rejects_bad_address_only_when_bound() {
        let bound = TicketVerifier::new(TicketPolicy::new(SECRET).with_check_address(true));
        assert!(matches!(
            bound.encode(&builder(), Some("bogus")),
            Err(TicketError::InvalidAddress { .. })
        ));
        assert!(verifier().encode(&builder(), Some("bogus")).is_ok());
    }

    #[test]
    fn encode_known_wire() {
        let signed = TicketVerifier::new(TicketPolicy::new("our_secret"))
            .encode(&builder(), None)
            .unwrap();
        assert_eq!(
            signed.to_wire(),
            "7566ab1352118678f172d2496c82fefb5bd1f400jblow!admin,engineer!Joe Blow"
        );
    }

    #[test]
    fn encode_then_authenticate_every_digest() {
        for digest in DigestAlgorithm::ALL {
            let verifier = TicketVerifier::new(TicketPolicy::new(SECRET).with_digest(digest));
            let signed = verifier.encode(&builder(), None).unwrap();
            assert_eq!(signed.checksum().len(), digest.checksum_len());

            let ticket = verifier.authenticate_cookie(&signed.encoded(), None).unwrap();
            assert_eq!(ticket.username(), "jblow");
            assert_eq!(ticket.tokens(), ["admin", "engineer"]);
            assert_eq!(ticket.user_data(), "Joe Blow");
        }
    }

    #[test]
    fn authenticate_request() {
        let encoded = "e400af8d8448df14b22193dfdcebe22b55ce64a9cfloersch%21Workbook%2BOVE%21Chris%2BFloersch";
        let request = RequestHeaders::new(&format!("lang=en; auth_tkt={encoded}"));
        let ticket = verifier().authenticate(&request).unwrap();
        assert_eq!(ticket.username(), "cfloersch");
    }

    #[test]
    fn missing_or_empty_cookie_is_not_found() {
        let verifier = verifier();
        assert_eq!(
            verifier.authenticate(&RequestHeaders::new("lang=en")),
            Err(TicketError::NotFound)
        );
        assert_eq!(
            verifier.authenticate(&RequestHeaders::new("auth_tkt=")),
            Err(TicketError::NotFound)
        );
    }

    #[test]
    fn custom_cookie_name() {
        let verifier = TicketVerifier::new(TicketPolicy::new(SECRET).with_cookie_name("sso"));
        let request = RequestHeaders::new(&format!("auth_tkt=x; sso={VECTOR}"));
        assert!(verifier.authenticate(&request).is_ok());
    }

    #[test]
    fn malformed_cookie() {
        let err = verifier().authenticate_cookie("garbage", None).unwrap_err();
        assert!(err.is_not_found());
        assert!(matches!(err, TicketError::Malformed { .. }));
    }

    #[test]
    fn try_new_validates() {
        assert_eq!(
            TicketVerifier::try_new(TicketPolicy::default()).unwrap_err(),
            PolicyError::EmptySecret
        );
        let verifier = TicketVerifier::try_new(TicketPolicy::new(SECRET)).unwrap();
        assert_eq!(verifier.policy().cookie_name, "auth_tkt");
    }

    #[test]
    fn verifier_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TicketVerifier>();
    }

    #[test]
    fn concurrent_verification() {
        let verifier = TicketVerifier::new(TicketPolicy::new(SECRET));
        let tickets: Vec<AuthTicket> = (0..64u32)
            .map(|i| {
                let unsigned = TicketBuilder::new(format!("user{i}"))
                    .unwrap()
                    .with_timestamp(1_000_000 + i)
                    .with_token("admin")
                    .unwrap();
                verifier.encode(&unsigned, None).unwrap()
            })
            .collect();

        std::thread::scope(|scope| {
            for chunk in tickets.chunks(8) {
                let verifier = &verifier;
                scope.spawn(move || {
                    for ticket in chunk {
                        assert_eq!(verifier.verify(ticket, None), Ok(()));
                    }
                });
            }
        });
    }
}
