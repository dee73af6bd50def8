use crate::authority::{CertificateHandle, DynAuthority};
use crate::error::Error;

/// Answers whether a requested certificate has been issued. Safe to call arbitrarily often.
#[derive(Clone)]
pub struct IssuanceMonitor {
    authority: DynAuthority,
}

impl IssuanceMonitor {
    pub fn new(authority: DynAuthority) -> Self {
        Self { authority }
    }

    /// Returns `Ok(false)` while the certificate is pending; only failures to query the
    /// authority are errors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authority`] if the issued certificates can't be listed.
    pub async fn is_issued(&self, handle: &CertificateHandle) -> Result<bool, Error> {
        let issued = self
            .authority
            .issued_certificates()
            .await?
            .iter()
            .any(|h| h == handle);
        tracing::debug!("certificate {handle} issued: {issued}");
        Ok(issued)
    }
}
