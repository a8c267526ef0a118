//! Request-side collaborators: cookie lookup and client address resolution.

use std::net::{IpAddr, Ipv4Addr};

use cookie::Cookie;
use tracing::trace;

use crate::error::TicketError;

/// The parts of an HTTP request that ticket authentication reads.
///
/// Implement this for the request type of your web framework, or use
/// [`RequestHeaders`] when only raw header values are at hand.
pub trait TicketRequest {
    /// Returns the raw value of the named cookie.
    fn cookie(&self, name: &str) -> Option<&str>;

    /// Returns the client address, possibly a comma-separated proxy chain
    /// such as an `X-Forwarded-For` value.
    fn remote_addr(&self) -> Option<&str>;
}

/// Cookies parsed from a `Cookie` request header.
///
/// Values are kept raw; quotes and transport encodings are left for
/// [`decode_cookie_value`](crate::decode_cookie_value). When a name appears
/// more than once the first value wins.
///
/// # Example
///
/// ```
/// use auth_tkt::CookieJar;
///
/// let jar = CookieJar::parse("lang=en; auth_tkt=\"abc%21\"; theme=dark");
/// assert_eq!(jar.get("auth_tkt"), Some("\"abc%21\""));
/// assert_eq!(jar.get("missing"), None);
/// assert_eq!(jar.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: Vec<(String, String)>,
}

impl CookieJar {
    /// Parses a `Cookie` header value.
    ///
    /// Pairs the `cookie` crate rejects, such as ones without `=` or with an
    /// empty name, are skipped. Values are not percent-decoded.
    #[must_use]
    pub fn parse(header: &str) -> Self {
        let cookies = Cookie::split_parse(header)
            .filter_map(|parsed| match parsed {
                Ok(cookie) => Some((cookie.name().to_string(), cookie.value().to_string())),
                Err(error) => {
                    trace!(%error, "skipping malformed cookie pair");
                    None
                }
            })
            .collect();
        Self { cookies }
    }

    /// Returns the first value of the named cookie.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns the number of cookies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Returns true if there are no cookies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

/// A [`TicketRequest`] built from raw header values.
///
/// # Example
///
/// ```
/// use auth_tkt::{RequestHeaders, TicketRequest};
///
/// let request = RequestHeaders::new("auth_tkt=abc")
///     .with_remote_addr("203.0.113.7, 10.0.0.1");
/// assert_eq!(request.cookie("auth_tkt"), Some("abc"));
/// assert_eq!(request.remote_addr(), Some("203.0.113.7, 10.0.0.1"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders {
    cookies: CookieJar,
    remote_addr: Option<String>,
}

impl RequestHeaders {
    /// Creates a request from a `Cookie` header value.
    #[must_use]
    pub fn new(cookie_header: &str) -> Self {
        Self {
            cookies: CookieJar::parse(cookie_header),
            remote_addr: None,
        }
    }

    /// Sets the client address.
    #[must_use]
    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    /// Returns the parsed cookies.
    #[must_use]
    pub const fn cookies(&self) -> &CookieJar {
        &self.cookies
    }
}

impl TicketRequest for RequestHeaders {
    fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name)
    }

    fn remote_addr(&self) -> Option<&str> {
        self.remote_addr.as_deref()
    }
}

/// Returns the first entry of a comma-separated address chain.
fn first_address(value: &str) -> &str {
    value.split(',').next().unwrap_or_default().trim()
}

/// Resolves the IPv4 address to bind into a checksum during verification.
///
/// Uses the first entry of a proxy chain. IPv6 addresses, unless
/// IPv4-mapped, and unparseable values resolve to `None`, which hashes as
/// the zero address.
///
/// # Example
///
/// ```
/// use std::net::Ipv4Addr;
/// use auth_tkt::resolve_client_address;
///
/// assert_eq!(
///     resolve_client_address(Some("192.168.1.12, 10.0.0.1")),
///     Some(Ipv4Addr::new(192, 168, 1, 12))
/// );
/// assert_eq!(resolve_client_address(Some("2001:db8::1")), None);
/// assert_eq!(resolve_client_address(None), None);
/// ```
#[must_use]
pub fn resolve_client_address(value: Option<&str>) -> Option<Ipv4Addr> {
    value
        .and_then(|v| first_address(v).parse::<IpAddr>().ok())
        .and_then(ipv4_of)
}

/// Resolves the IPv4 address to bind into a checksum during issuance.
///
/// Like [`resolve_client_address`], except that an unparseable address is an
/// error rather than silently unbound.
///
/// # Errors
///
/// Returns [`TicketError::InvalidAddress`] if the first entry is not an IP
/// address.
pub fn parse_client_address(value: Option<&str>) -> Result<Option<Ipv4Addr>, TicketError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let first = first_address(value);
    first
        .parse::<IpAddr>()
        .map(ipv4_of)
        .map_err(|_| TicketError::InvalidAddress {
            value: first.to_string(),
        })
}

fn ipv4_of(addr: IpAddr) -> Option<Ipv4Addr> {
    match addr {
        IpAddr::V4(v4) => Some(v4),
        IpAddr::V6(v6) => v6.to_ipv4_mapped(),
    }
}
