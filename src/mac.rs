//! Message authentication code for auth tickets.
//!
//! The checksum is computed in two passes, exactly as `mod_auth_tkt` defines it:
//!
//! ```text
//! digest0  := H(address_stamp + secret + username + '\0' + tokens + '\0' + user_data)
//! checksum := H(lower_hex(digest0) + secret)
//! ```
//!
//! The second pass hashes the *lower-case hex text* of `digest0`, not its raw
//! bytes. That step is part of the wire protocol and lives in
//! [`rehash_hex_digest`] only.

use std::net::Ipv4Addr;

use subtle::ConstantTimeEq;

use crate::constants::ADDRESS_STAMP_LENGTH;
use crate::digest::DigestAlgorithm;
use crate::secret::Secret;

/// The 8-byte prefix of the first digest pass.
///
/// Bytes 0-3 carry the client IPv4 address in network order (zero when
/// address binding is off or no IPv4 address is known); bytes 4-7 carry the
/// ticket timestamp, big-endian.
///
/// # Example
///
/// ```
/// use std::net::Ipv4Addr;
/// use auth_tkt::AddressStamp;
///
/// let stamp = AddressStamp::new(Some(Ipv4Addr::new(192, 168, 1, 12)), 0x55ce_64a9);
/// assert_eq!(stamp.as_bytes(), &[192, 168, 1, 12, 0x55, 0xce, 0x64, 0xa9]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressStamp {
    bytes: [u8; ADDRESS_STAMP_LENGTH],
}

impl AddressStamp {
    /// Builds a stamp from an optional IPv4 address and a timestamp.
    #[must_use]
    pub fn new(address: Option<Ipv4Addr>, timestamp: u32) -> Self {
        let mut bytes = [0u8; ADDRESS_STAMP_LENGTH];
        if let Some(address) = address {
            bytes[..4].copy_from_slice(&address.octets());
        }
        bytes[4..].copy_from_slice(&timestamp.to_be_bytes());
        Self { bytes }
    }

    /// Builds a stamp with the address bytes zeroed.
    #[must_use]
    pub fn unbound(timestamp: u32) -> Self {
        Self::new(None, timestamp)
    }

    /// Returns the raw stamp bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ADDRESS_STAMP_LENGTH] {
        &self.bytes
    }

    /// Returns the bound address, or `0.0.0.0` when unbound.
    #[must_use]
    pub const fn address(&self) -> Ipv4Addr {
        Ipv4Addr::new(self.bytes[0], self.bytes[1], self.bytes[2], self.bytes[3])
    }

    /// Returns the timestamp half of the stamp.
    #[must_use]
    pub const fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.bytes[4], self.bytes[5], self.bytes[6], self.bytes[7]])
    }
}

/// The ticket fields covered by the checksum.
#[derive(Debug, Clone, Copy)]
pub struct MacFields<'a> {
    /// Principal name
    pub username: &'a str,
    /// Comma-joined token list, in wire order
    pub token_list: &'a str,
    /// Opaque application data
    pub user_data: &'a str,
}

/// Computes a ticket checksum.
///
/// Every string operand is hashed as UTF-8. The result is
/// [`DigestAlgorithm::checksum_len`] bytes long.
///
/// # Example
///
/// ```
/// use auth_tkt::{compute_checksum, AddressStamp, DigestAlgorithm, MacFields, Secret};
///
/// let checksum = compute_checksum(
///     DigestAlgorithm::Md5,
///     &Secret::new("some_random_secret_key"),
///     &AddressStamp::unbound(0x55ce_64a9),
///     MacFields {
///         username: "cfloersch",
///         token_list: "Workbook+OVE",
///         user_data: "Chris+Floersch",
///     },
/// );
/// assert_eq!(hex::encode(checksum), "e400af8d8448df14b22193dfdcebe22b");
/// ```
#[must_use]
pub fn compute_checksum(
    algorithm: DigestAlgorithm,
    secret: &Secret,
    stamp: &AddressStamp,
    fields: MacFields<'_>,
) -> Vec<u8> {
    let mut hasher = algorithm.hasher();
    hasher.update(stamp.as_bytes());
    hasher.update(secret.as_bytes());
    hasher.update(fields.username);
    hasher.update([0u8]);
    hasher.update(fields.token_list);
    hasher.update([0u8]);
    hasher.update(fields.user_data);
    let digest0 = hasher.finalize();

    rehash_hex_digest(algorithm, &digest0, secret)
}

/// Second checksum pass: hashes the lower-case hex *text* of `digest0`
/// followed by the secret.
///
/// Hashing the raw bytes instead yields a different (incompatible) checksum.
#[must_use]
pub fn rehash_hex_digest(algorithm: DigestAlgorithm, digest0: &[u8], secret: &Secret) -> Vec<u8> {
    let mut hasher = algorithm.hasher();
    hasher.update(hex::encode(digest0));
    hasher.update(secret.as_bytes());
    hasher.finalize()
}

/// Compares two checksums in constant time.
#[must_use]
pub fn checksums_match(claimed: &[u8], computed: &[u8]) -> bool {
    claimed.len() == computed.len() && bool::from(claimed.ct_eq(computed))
}
