//! The server engine: typed handlers over keys, storage and the mailer.

use std::sync::Arc;

use cachet_proto::limits::DEFAULT_CHALLENGE_BITS;
use cachet_proto::wire::{ChallengeRequest, PeerInfo};
use cachet_proto::{challenge, ChallengeResponse};

use crate::mailer::ActivationMailer;
use crate::storage::{PeerRecord, Storage};
use crate::{Result, ServerError, ServerKeys};

/// Tunable server policy.
#[derive(Clone, Debug)]
pub struct ServerPolicy {
    /// Hashcash difficulty for enrolment challenges.
    pub challenge_bits: u32,
    /// Maximum accepted bearer token age, in seconds.
    pub bearer_max_age_secs: i64,
}

impl Default for ServerPolicy {
    fn default() -> Self {
        Self {
            challenge_bits: DEFAULT_CHALLENGE_BITS,
            // Tokens carry their issue time; 30 days is the documented
            // expiry policy.
            bearer_max_age_secs: 30 * 24 * 60 * 60,
        }
    }
}

/// One server's protocol engine.
///
/// Handlers are plain methods; the HTTP layer maps paths onto them and
/// never interprets protocol state itself. Requests are independent, so
/// the engine holds no per-request state and is freely shared.
pub struct ServerEngine<S: Storage> {
    keys: ServerKeys,
    policy: ServerPolicy,
    storage: S,
    mailer: Arc<dyn ActivationMailer>,
}

impl<S: Storage> ServerEngine<S> {
    /// Build an engine from its parts.
    pub fn new(
        keys: ServerKeys,
        policy: ServerPolicy,
        storage: S,
        mailer: Arc<dyn ActivationMailer>,
    ) -> Self {
        Self {
            keys,
            policy,
            storage,
            mailer,
        }
    }

    /// The server key material.
    pub fn keys(&self) -> &ServerKeys {
        &self.keys
    }

    /// The active policy.
    pub fn policy(&self) -> &ServerPolicy {
        &self.policy
    }

    pub(crate) fn storage(&self) -> &S {
        &self.storage
    }

    pub(crate) fn mailer(&self) -> &dyn ActivationMailer {
        self.mailer.as_ref()
    }

    /// Handle `GET /challenge`.
    pub fn challenge(&self) -> Result<ChallengeRequest> {
        Ok(challenge::issue_challenge(
            self.policy.challenge_bits,
            self.keys.sign_secret(),
        )?)
    }

    /// Verify an enrolment proof of work.
    pub(crate) fn verify_challenge(&self, solution: &ChallengeResponse) -> Result<()> {
        challenge::verify_solution(solution, self.keys.sign_public())?;
        Ok(())
    }

    /// Resolve a peer row, surfacing `UnknownPeer` when absent.
    pub(crate) fn require_peer(&self, alias: &str) -> Result<PeerRecord> {
        self.storage
            .peer_by_alias(self.keys.server_id(), alias)?
            .ok_or_else(|| ServerError::UnknownPeer(alias.to_string()))
    }

    /// Handle `GET /peer/{alias}`.
    ///
    /// The `_auth` witness is the peer attached by request authentication;
    /// the directory is not public.
    pub fn peer(&self, _auth: &PeerRecord, alias: &str) -> Result<PeerInfo> {
        let record = self.require_peer(alias)?;
        Ok(PeerInfo {
            peer: record.alias,
            public_key: record.public_key,
        })
    }
}
