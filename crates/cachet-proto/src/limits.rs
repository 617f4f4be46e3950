//! Protocol limits and constants.
//!
//! All protocol limits are defined here for consistent enforcement on
//! both sides of the wire.

// === Messages ===

/// Maximum serialized size of a send request body (payload + metadata
/// ciphertexts, JSON-framed). Enforced locally by the client before any
/// network call and again by the server.
pub const MESSAGE_SIZE_LIMIT: usize = 50 * 1024;

// === Challenges ===

/// Number of random bytes in a hashcash challenge.
pub const CHALLENGE_SIZE: usize = 1024;

/// Maximum accepted age of an issued challenge, in seconds.
pub const CHALLENGE_MAX_AGE_SECS: i64 = 30;

/// Default challenge difficulty in leading zero bits (~1M hashes).
/// Incrementing by 1 *doubles* the work.
pub const DEFAULT_CHALLENGE_BITS: u32 = 20;

/// Hard ceiling on challenge difficulty: the solution check reads the
/// first 8 bytes of the digest.
pub const MAX_CHALLENGE_BITS: u32 = 64;

/// Bound of the hashcash nonce search space.
pub const NONCE_SPACE: u64 = u32::MAX as u64;

/// Detached signature bytes prepended to the signed challenge blob.
pub const SIGN_OVERHEAD: usize = cachet_crypto::SIGNATURE_SIZE;

// === Activation ===

/// Activation codes are uniform in `[1, ACTIVATION_CODE_MAX]`.
pub const ACTIVATION_CODE_MAX: u32 = 999_999;

// === Identifiers ===

/// Length of a full message id (UUID text form).
pub const MESSAGE_ID_FULL_LEN: usize = 36;

/// Length of a short message id (hex prefix of the UUID).
pub const MESSAGE_ID_PREFIX_LEN: usize = 8;
