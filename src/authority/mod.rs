//! Certificate authority access.
//!
//! The [`CertificateAuthority`] trait is the narrow interface the
//! [provisioning state machine][crate::provision] needs from a certificate authority: request a
//! DNS-validated certificate, describe the validation challenge for it, and list which
//! certificates have been issued. [`acm::AcmAuthority`] implements it for AWS Certificate
//! Manager.
//!
//! Two components are built on top of it:
//!
//! * [`CertificateRequester`] requests the certificate (at most once per logical attempt) and
//!   waits a bounded time for the authority to compute the DNS challenge.
//! * [`IssuanceMonitor`] answers whether a requested certificate has been issued yet.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub mod acm;
pub mod monitor;
pub mod requester;

pub use monitor::IssuanceMonitor;
pub use requester::CertificateRequester;

/// The authority-assigned identifier of a requested certificate (an ACM certificate ARN).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct CertificateHandle(String);

impl CertificateHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CertificateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The DNS record the authority requires to be published to prove domain ownership.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ValidationChallenge {
    pub name: String,
    pub record_type: String,
    pub value: String,
}

/// `DynAuthority` is a type alias for a [`CertificateAuthority`] shared by the components of a
/// single invocation.
pub type DynAuthority = Arc<dyn CertificateAuthority + Send + Sync>;

/// An async trait describing the certificate authority operations used while provisioning.
#[async_trait::async_trait]
pub trait CertificateAuthority {
    /// Request a DNS-validated certificate, with certificate transparency logging enabled, for
    /// the given FQDN. This is not idempotent: every call creates a new pending certificate.
    async fn request_certificate(&self, fqdn: &str) -> Result<CertificateHandle, Error>;

    /// Describe the DNS validation challenge for a requested certificate, or `None` if the
    /// authority hasn't computed it yet.
    async fn describe_challenge(
        &self,
        handle: &CertificateHandle,
    ) -> Result<Option<ValidationChallenge>, Error>;

    /// List the handles of all certificates currently in the issued state.
    async fn issued_certificates(&self) -> Result<Vec<CertificateHandle>, Error>;
}
