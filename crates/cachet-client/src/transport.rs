//! The transport seam.
//!
//! The client never speaks HTTP itself; it calls these typed operations
//! and an implementation carries them over the wire. A production
//! implementation wraps an HTTP client with bounded timeouts (suggested:
//! 10 s dial, 10 s TLS handshake, 10 s response headers, 30 s overall)
//! and must propagate cancellation to in-flight requests. Tests wire the
//! trait straight into an in-process server engine.

use std::time::Duration;

use thiserror::Error;

use cachet_proto::wire::{
    ActivationRequest, ActivationResponse, ChallengeRequest, ChallengeResponse, EnrolRequest,
    EnrolResponse, Envelope, Inbox, MessageResponse, PeerInfo, SendResponse,
};

/// Suggested dial timeout for HTTP implementations.
pub const DIAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Suggested TLS handshake timeout for HTTP implementations.
pub const TLS_TIMEOUT: Duration = Duration::from_secs(10);

/// Suggested response-header timeout for HTTP implementations.
pub const RESPONSE_HEADER_TIMEOUT: Duration = Duration::from_secs(10);

/// Suggested overall request timeout for HTTP implementations.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport-level failures.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The server answered with a non-success status.
    #[error("http status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Status line or body excerpt, for logs.
        message: String,
    },

    /// The request never completed.
    #[error("transport: {0}")]
    Io(String),
}

impl TransportError {
    /// The status code, when the failure was an HTTP error.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Io(_) => None,
        }
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Typed operations against one relay endpoint.
///
/// `token` arguments carry the base64 bearer token; implementations place
/// it in `Authorization: Bearer <token>`. The challenge solution on
/// enrolment travels as the `Challenge` and `Nonce` headers.
pub trait Transport {
    /// `GET /challenge`.
    fn get_challenge(&self) -> TransportResult<ChallengeRequest>;

    /// `POST /enrol/{alias}`.
    fn enrol(
        &self,
        alias: &str,
        solution: &ChallengeResponse,
        request: &EnrolRequest,
    ) -> TransportResult<EnrolResponse>;

    /// `POST /activate`.
    fn activate(&self, request: &ActivationRequest) -> TransportResult<ActivationResponse>;

    /// `GET /peer/{alias}`.
    fn get_peer(&self, token: &str, alias: &str) -> TransportResult<PeerInfo>;

    /// `GET /inbox`; `None` is an empty inbox (204 on the wire).
    fn get_inbox(&self, token: &str) -> TransportResult<Option<Inbox>>;

    /// `POST /message/{recipient}`.
    fn post_message(
        &self,
        token: &str,
        recipient: &str,
        envelope: &Envelope,
    ) -> TransportResult<SendResponse>;

    /// `GET /message/{id}`.
    fn get_message(&self, token: &str, id: &str) -> TransportResult<MessageResponse>;

    /// `DELETE /message/{id}`.
    fn delete_message(&self, token: &str, id: &str) -> TransportResult<()>;

    /// `POST /invite/{alias}`.
    fn invite(&self, token: &str, alias: &str) -> TransportResult<()>;
}
