//! Enrolment and activation.
//!
//! Enrolment binds nothing: the server seals the candidate
//! `(alias, public key, code)` into an opaque token, dispatches it
//! out-of-band, and keeps no record, so abandoned enrolments leak no
//! storage. The peer row is materialized only when activation presents
//! the token with the matching code.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cachet_crypto::{open_secret, seal_secret, BoxPublicKey};
use cachet_proto::b64;
use cachet_proto::limits::ACTIVATION_CODE_MAX;
use cachet_proto::wire::{ActivationRequest, ActivationResponse, EnrolRequest, EnrolResponse};
use cachet_proto::ChallengeResponse;

use crate::auth::BearerToken;
use crate::mailer::ActivationNotice;
use crate::storage::{PeerRecord, Storage, StorageError};
use crate::{Result, ServerEngine, ServerError};

/// The sealed contents of an activation token.
///
/// Opaque to the client; carries everything needed to complete the
/// binding once the code comes back.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationToken {
    /// Candidate alias.
    pub peer: String,
    /// Candidate public box key.
    #[serde(with = "b64")]
    pub public_key: Vec<u8>,
    /// Code the user must present.
    pub code: u32,
}

impl<S: Storage> ServerEngine<S> {
    /// Handle `POST /enrol/{alias}`.
    ///
    /// Gated by hashcash. Re-enrolment with the already-bound key is
    /// idempotent; a different key for a known alias is a conflict
    /// (recovery requires an out-of-band rotation this protocol does not
    /// define).
    pub fn enrol(
        &self,
        alias: &str,
        solution: &ChallengeResponse,
        request: &EnrolRequest,
    ) -> Result<EnrolResponse> {
        self.verify_challenge(solution)?;

        if alias.is_empty() {
            return Err(ServerError::BadRequest("empty alias".into()));
        }

        // Key length is a hard boundary; reject before anything else sees it.
        BoxPublicKey::from_bytes(&request.public_key)
            .map_err(|_| ServerError::BadRequest("invalid public key".into()))?;

        tracing::info!(alias, nonce = solution.nonce, "enrolment challenge accepted");

        if let Some(existing) = self
            .storage()
            .peer_by_alias(self.keys().server_id(), alias)?
        {
            if existing.public_key == request.public_key {
                return Ok(EnrolResponse {
                    server_key: self.keys().box_public().to_bytes().to_vec(),
                    activated: true,
                    message: "already enrolled".into(),
                });
            }
            return Err(ServerError::ExistingPeer);
        }

        let token = ActivationToken {
            peer: alias.to_string(),
            public_key: request.public_key.clone(),
            code: rand::rngs::OsRng.gen_range(1..=ACTIVATION_CODE_MAX),
        };

        let notice = ActivationNotice {
            alias: alias.to_string(),
            token: self.seal_activation_token(&token)?,
            code: token.code,
        };
        self.mailer().deliver(&notice)?;

        tracing::info!(alias, "activation token dispatched");

        Ok(EnrolResponse {
            server_key: self.keys().box_public().to_bytes().to_vec(),
            activated: false,
            message: "check your inbox for the activation token".into(),
        })
    }

    /// Handle `POST /activate`.
    ///
    /// Rejection order: token decode, then code match, then row creation.
    /// A wrong code leaves the token valid for a correct retry.
    pub fn activate(&self, request: &ActivationRequest) -> Result<ActivationResponse> {
        let token = self.open_activation_token(&request.token)?;

        if request.code != token.code {
            // Logged distinctly, but the user sees the same Forbidden as
            // any tampering would produce.
            tracing::warn!(alias = %token.peer, "activation code mismatch");
            return Err(ServerError::Forbidden);
        }

        let peer = match self
            .storage()
            .peer_by_alias(self.keys().server_id(), &token.peer)?
        {
            Some(existing) if existing.public_key == token.public_key => existing,
            Some(_) => return Err(ServerError::ExistingPeer),
            None => {
                let record = PeerRecord {
                    server: self.keys().server_id(),
                    peer: Uuid::new_v4(),
                    alias: token.peer.clone(),
                    public_key: token.public_key.clone(),
                };
                match self.storage().create_peer(&record) {
                    Ok(()) => record,
                    // Lost a race with a concurrent activation of the same
                    // token; re-read and fall through to the key check.
                    Err(StorageError::ExistingPeer) => {
                        let existing = self.require_peer(&token.peer)?;
                        if existing.public_key != token.public_key {
                            return Err(ServerError::ExistingPeer);
                        }
                        existing
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };

        tracing::info!(alias = %peer.alias, peer = %peer.peer, "peer activated");

        Ok(ActivationResponse {
            token: self.issue_bearer(&peer)?,
            message: "welcome to cachet".into(),
        })
    }

    fn seal_activation_token(&self, token: &ActivationToken) -> Result<String> {
        let plaintext = serde_json::to_vec(token)
            .map_err(|e| ServerError::Internal(format!("token encode: {e}")))?;
        let sealed = seal_secret(&plaintext, self.keys().seal_key())?;
        Ok(URL_SAFE_NO_PAD.encode(sealed))
    }

    fn open_activation_token(&self, token: &str) -> Result<ActivationToken> {
        let sealed = URL_SAFE_NO_PAD
            .decode(token.as_bytes())
            .map_err(|_| ServerError::InvalidToken)?;
        let plaintext =
            open_secret(&sealed, self.keys().seal_key()).map_err(|_| ServerError::InvalidToken)?;
        serde_json::from_slice(&plaintext).map_err(|_| ServerError::InvalidToken)
    }

    fn issue_bearer(&self, peer: &PeerRecord) -> Result<String> {
        BearerToken::issue(peer).seal(self.keys().seal_key())
    }
}
