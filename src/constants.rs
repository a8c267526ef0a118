//! Constants for the auth ticket wire format.

/// Positional field delimiter in the wire string.
pub const DELIMITER: char = '!';

/// Separator between entries of the token list.
pub const TOKEN_SEPARATOR: char = ',';

/// Width of the hex-encoded timestamp that follows the checksum.
pub const TIMESTAMP_HEX_LENGTH: usize = 8;

/// Length of the address stamp hashed into the first digest pass.
pub const ADDRESS_STAMP_LENGTH: usize = 8;

/// Placeholder checksum length written for tickets that were never signed.
pub const UNSIGNED_CHECKSUM_LENGTH: usize = 4;

/// Cookie name used by `mod_auth_tkt` when none is configured.
pub const DEFAULT_COOKIE_NAME: &str = "auth_tkt";
