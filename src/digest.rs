//! Digest algorithm selection for the ticket checksum.

use std::fmt;
use std::str::FromStr;

use md5::Md5;
use sha2::{Digest, Sha256, Sha512};

use crate::error::PolicyError;

/// Hash primitive used to compute a ticket's checksum.
///
/// The algorithm fixes the checksum width on the wire, so a ticket can only
/// be parsed by the algorithm that produced it.
///
/// | Variant | Checksum bytes | Hex chars |
/// |---------|----------------|-----------|
/// | `Md5` | 16 | 32 |
/// | `Sha256` | 32 | 64 |
/// | `Sha512` | 64 | 128 |
///
/// # Examples
///
/// ```
/// use auth_tkt::DigestAlgorithm;
///
/// let alg: DigestAlgorithm = "SHA-256".parse().unwrap();
/// assert_eq!(alg, DigestAlgorithm::Sha256);
/// assert_eq!(alg.checksum_hex_len(), 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DigestAlgorithm {
    /// MD5, the `mod_auth_tkt` default
    #[default]
    Md5,
    /// SHA-256
    Sha256,
    /// SHA-512
    Sha512,
}

impl DigestAlgorithm {
    /// Every supported algorithm, weakest first.
    pub const ALL: [Self; 3] = [Self::Md5, Self::Sha256, Self::Sha512];

    /// Returns the raw checksum length in bytes.
    #[must_use]
    pub const fn checksum_len(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha256 => 32,
            Self::Sha512 => 64,
        }
    }

    /// Returns the width of the hex-encoded checksum at the start of a ticket.
    #[must_use]
    pub const fn checksum_hex_len(self) -> usize {
        self.checksum_len() * 2
    }

    /// Returns the canonical algorithm name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
        }
    }

    /// Returns a fresh hashing context owned by the caller.
    ///
    /// Contexts are never shared; every checksum computation starts from a
    /// new one, which keeps verification reentrant across threads.
    #[must_use]
    pub fn hasher(self) -> TicketHasher {
        let state = match self {
            Self::Md5 => HasherState::Md5(Md5::new()),
            Self::Sha256 => HasherState::Sha256(Sha256::new()),
            Self::Sha512 => HasherState::Sha512(Sha512::new()),
        };
        TicketHasher {
            algorithm: self,
            state,
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_uppercase();
        match normalized.as_str() {
            "MD5" => Ok(Self::Md5),
            "SHA256" => Ok(Self::Sha256),
            "SHA512" => Ok(Self::Sha512),
            _ => Err(PolicyError::UnknownDigest {
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for DigestAlgorithm {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for DigestAlgorithm {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An in-progress hash computation for one [`DigestAlgorithm`].
///
/// Single owner, consumed by [`finalize`](Self::finalize).
#[derive(Clone)]
pub struct TicketHasher {
    algorithm: DigestAlgorithm,
    state: HasherState,
}

#[derive(Clone)]
enum HasherState {
    Md5(Md5),
    Sha256(Sha256),
    Sha512(Sha512),
}

impl TicketHasher {
    /// Feeds bytes into the hash.
    pub fn update(&mut self, data: impl AsRef<[u8]>) {
        let data = data.as_ref();
        match &mut self.state {
            HasherState::Md5(h) => h.update(data),
            HasherState::Sha256(h) => h.update(data),
            HasherState::Sha512(h) => h.update(data),
        }
    }

    /// Consumes the context and returns the digest bytes.
    #[must_use]
    pub fn finalize(self) -> Vec<u8> {
        match self.state {
            HasherState::Md5(h) => h.finalize().to_vec(),
            HasherState::Sha256(h) => h.finalize().to_vec(),
            HasherState::Sha512(h) => h.finalize().to_vec(),
        }
    }
}

impl fmt::Debug for TicketHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TicketHasher")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}
