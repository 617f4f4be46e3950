//! Out-of-band delivery of activation notices.
//!
//! Conveying the activation token over a channel the alias controls (mail,
//! for email-shaped aliases) is what binds the alias to the key. Actual
//! SMTP delivery is an external collaborator; the engine only hands a
//! notice to this seam.

use std::sync::Mutex;

use crate::Result;

/// Everything the out-of-band channel needs to deliver.
#[derive(Clone, Debug)]
pub struct ActivationNotice {
    /// The alias being activated - for mail channels, the address.
    pub alias: String,
    /// The opaque base64url activation token.
    pub token: String,
    /// The numeric code the user must enter alongside the token.
    pub code: u32,
}

/// Delivery seam for activation notices.
pub trait ActivationMailer: Send + Sync {
    /// Deliver a notice to the channel the alias controls.
    fn deliver(&self, notice: &ActivationNotice) -> Result<()>;
}

/// Mailer that only logs the notice.
///
/// Useful for development servers where the operator relays codes by hand.
#[derive(Default)]
pub struct LogMailer;

impl ActivationMailer for LogMailer {
    fn deliver(&self, notice: &ActivationNotice) -> Result<()> {
        tracing::info!(
            alias = %notice.alias,
            token = %notice.token,
            code = notice.code,
            "activation notice"
        );
        Ok(())
    }
}

/// Mailer that records notices in memory, for tests.
#[derive(Default)]
pub struct MemoryMailer {
    notices: Mutex<Vec<ActivationNotice>>,
}

impl MemoryMailer {
    /// Create an empty mailer.
    pub fn new() -> Self {
        Self::default()
    }

    /// All notices delivered so far.
    pub fn notices(&self) -> Vec<ActivationNotice> {
        self.notices.lock().expect("mailer lock poisoned").clone()
    }

    /// The most recent notice for an alias.
    pub fn last_for(&self, alias: &str) -> Option<ActivationNotice> {
        self.notices()
            .into_iter()
            .rev()
            .find(|n| n.alias == alias)
    }
}

impl ActivationMailer for MemoryMailer {
    fn deliver(&self, notice: &ActivationNotice) -> Result<()> {
        self.notices
            .lock()
            .expect("mailer lock poisoned")
            .push(notice.clone());
        Ok(())
    }
}
