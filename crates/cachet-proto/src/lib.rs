//! # cachet-proto
//!
//! The protocol layer shared by cachet clients and servers:
//!
//! - **Wire types**: the JSON bodies of every endpoint, with byte fields
//!   carried as base64 strings
//! - **Limits**: the envelope size cap and challenge parameters
//! - **Challenge engine**: stateless signed hashcash - the server issues
//!   and verifies without storing anything, the client searches for a
//!   nonce
//! - **Claims**: the server-issued attestation bound to each delivered
//!   message
//!
//! Transport framing (HTTP) is not here; this crate defines what goes on
//! the wire, not how it travels.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod b64;
pub mod challenge;
pub mod claims;
pub mod error;
pub mod limits;
pub mod wire;

pub use challenge::{issue_challenge, solve_challenge, verify_solution, verify_solution_at};
pub use claims::Claims;
pub use error::{ProtocolError, Result};
pub use wire::{
    ActivationRequest, ActivationResponse, ChallengeRequest, ChallengeResponse, EnrolRequest,
    EnrolResponse, Envelope, Inbox, InboxMessage, MessageResponse, Metadata, PeerInfo,
    SendResponse,
};
