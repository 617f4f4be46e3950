//! Stateless signed hashcash challenges.
//!
//! The server issues a signed challenge, keeps nothing, and verifies the
//! returned solution purely from the blob itself: the signature
//! authenticates the challenge and the embedded timestamp bounds its
//! lifetime. The client strips the signature overhead, searches the nonce
//! space, and returns the blob *unchanged* together with the nonce.
//!
//! A solution is valid when the first `complexity` bits of
//! `SHA-512(be64(nonce) || challenge)` are zero. The check reads the
//! first 8 bytes of the digest big-endian and masks, so difficulty is
//! capped at 64 bits.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};

use cachet_crypto::{SignPublicKey, SignSecretKey};

use crate::b64;
use crate::limits::{
    CHALLENGE_MAX_AGE_SECS, CHALLENGE_SIZE, MAX_CHALLENGE_BITS, NONCE_SPACE, SIGN_OVERHEAD,
};
use crate::wire::{ChallengeRequest, ChallengeResponse};
use crate::{ProtocolError, Result};

/// The inner challenge document, carried as canonical JSON inside the
/// signed blob.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Challenge {
    /// Challenge format version; always 1.
    pub version: u32,
    /// Required number of leading zero bits.
    pub complexity: u32,
    /// Unix timestamp at issue.
    pub timestamp: i64,
    /// Random challenge bytes.
    #[serde(with = "b64")]
    pub challenge: Vec<u8>,
}

impl Challenge {
    /// Build a fresh challenge at the given difficulty.
    pub fn new(complexity: u32, timestamp: i64) -> Self {
        let mut challenge = vec![0u8; CHALLENGE_SIZE];
        rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut challenge);
        Self {
            version: 1,
            complexity,
            timestamp,
            challenge,
        }
    }
}

/// Issue a new signed challenge.
///
/// The result is `signature(64) || canonical JSON` wrapped for the wire.
pub fn issue_challenge(complexity: u32, key: &SignSecretKey) -> Result<ChallengeRequest> {
    let challenge = Challenge::new(complexity, chrono::Utc::now().timestamp());
    sign_challenge(&challenge, key)
}

/// Sign an explicit challenge document.
///
/// Split out from [`issue_challenge`] so tests can control the timestamp.
pub fn sign_challenge(challenge: &Challenge, key: &SignSecretKey) -> Result<ChallengeRequest> {
    let body =
        serde_json::to_vec(challenge).map_err(|e| ProtocolError::Serialization(e.to_string()))?;

    let mut blob = Vec::with_capacity(SIGN_OVERHEAD + body.len());
    blob.extend_from_slice(&key.sign(&body));
    blob.extend_from_slice(&body);

    Ok(ChallengeRequest { challenge: blob })
}

/// Solve a challenge by searching the nonce space.
///
/// Only the server cares about the signature, so the solver skips past the
/// signature overhead without verifying it. Returns the signed blob
/// unchanged plus the first solving nonce.
///
/// # Errors
///
/// `InvalidComplexity` when the difficulty cannot be satisfied - either it
/// exceeds the 64-bit ceiling outright, or the bounded nonce space is
/// exhausted without a solution.
pub fn solve_challenge(request: &ChallengeRequest) -> Result<ChallengeResponse> {
    if request.challenge.len() <= SIGN_OVERHEAD {
        return Err(ProtocolError::InvalidChallenge(
            "signed blob shorter than its signature".into(),
        ));
    }

    let challenge: Challenge = serde_json::from_slice(&request.challenge[SIGN_OVERHEAD..])
        .map_err(|e| ProtocolError::Serialization(e.to_string()))?;

    if challenge.complexity > MAX_CHALLENGE_BITS {
        return Err(ProtocolError::InvalidComplexity(challenge.complexity));
    }

    for nonce in 0..NONCE_SPACE {
        let digest = hash_with_nonce(&challenge.challenge, nonce);
        if solution_ok(challenge.complexity, &digest) {
            return Ok(ChallengeResponse {
                challenge: request.challenge.clone(),
                nonce,
            });
        }
    }

    Err(ProtocolError::InvalidComplexity(challenge.complexity))
}

/// Verify a challenge solution against the server sign key.
pub fn verify_solution(response: &ChallengeResponse, key: &SignPublicKey) -> Result<()> {
    verify_solution_at(response, key, chrono::Utc::now().timestamp())
}

/// Verify a challenge solution with an explicit clock.
///
/// Checks, in order: the detached signature, the structural fields
/// (version, challenge length, difficulty ceiling), the freshness window
/// `now - timestamp ∈ [0, 30]` (negative deltas from clock skew are
/// rejected too), then the proof of work itself.
pub fn verify_solution_at(
    response: &ChallengeResponse,
    key: &SignPublicKey,
    now: i64,
) -> Result<()> {
    if response.challenge.len() <= SIGN_OVERHEAD {
        return Err(ProtocolError::InvalidChallengeSignature);
    }

    let (signature, body) = response.challenge.split_at(SIGN_OVERHEAD);
    key.verify(body, signature)
        .map_err(|_| ProtocolError::InvalidChallengeSignature)?;

    let challenge: Challenge =
        serde_json::from_slice(body).map_err(|e| ProtocolError::Serialization(e.to_string()))?;

    if challenge.version != 1 {
        return Err(ProtocolError::InvalidChallenge(format!(
            "invalid challenge version {}",
            challenge.version
        )));
    }

    if challenge.challenge.len() != CHALLENGE_SIZE {
        return Err(ProtocolError::InvalidChallenge(format!(
            "invalid challenge length {}; expected {}",
            challenge.challenge.len(),
            CHALLENGE_SIZE
        )));
    }

    if challenge.complexity > MAX_CHALLENGE_BITS {
        return Err(ProtocolError::InvalidComplexity(challenge.complexity));
    }

    let delta = now - challenge.timestamp;
    if !(0..=CHALLENGE_MAX_AGE_SECS).contains(&delta) {
        return Err(ProtocolError::ChallengeExpired);
    }

    let digest = hash_with_nonce(&challenge.challenge, response.nonce);
    if solution_ok(challenge.complexity, &digest) {
        Ok(())
    } else {
        Err(ProtocolError::InvalidChallengeSolution)
    }
}

/// `SHA-512(be64(nonce) || challenge)`.
fn hash_with_nonce(challenge: &[u8], nonce: u64) -> [u8; 64] {
    let mut hasher = Sha512::new();
    hasher.update(nonce.to_be_bytes());
    hasher.update(challenge);
    hasher.finalize().into()
}

/// Check that the top `complexity` bits of the digest are zero.
///
/// Reads the first 8 bytes big-endian and masks out everything below the
/// required bits; complexity 0 trivially passes. Callers guarantee
/// `complexity <= 64`.
fn solution_ok(complexity: u32, digest: &[u8]) -> bool {
    if complexity == 0 {
        return true;
    }

    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    let solution = u64::from_be_bytes(head);

    let mask = u64::MAX << (64 - complexity);
    (solution & mask) == 0
}
