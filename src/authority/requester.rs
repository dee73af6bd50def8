use crate::authority::{CertificateHandle, DynAuthority, ValidationChallenge};
use crate::config::Shared;
use crate::error::Error;
use crate::provision::InvocationBudget;
use std::str::FromStr;
use trust_dns_proto::rr::Name;

/// Requests certificates and waits for their DNS validation challenge.
#[derive(Clone)]
pub struct CertificateRequester {
    authority: DynAuthority,
    config: Shared,
}

impl CertificateRequester {
    pub fn new(authority: DynAuthority, config: Shared) -> Self {
        Self { authority, config }
    }

    /// Request a certificate for `fqdn`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authority`] if `fqdn` is not a valid DNS name, or if the authority
    /// rejects the request.
    pub async fn request(&self, fqdn: &str) -> Result<CertificateHandle, Error> {
        let name = Name::from_str(fqdn)
            .map_err(|err| Error::Authority(format!("malformed domain name \"{fqdn}\": {err}")))?;
        if name.is_root() {
            return Err(Error::Authority("empty domain name".into()));
        }
        let handle = self.authority.request_certificate(fqdn).await?;
        tracing::info!("requested certificate {handle} for \"{fqdn}\"");
        Ok(handle)
    }

    /// Read the validation challenge for `handle`, sleeping
    /// [`Config::challenge_poll_interval`][crate::config::Config::challenge_poll_interval]
    /// between reads until the authority has computed it.
    ///
    /// Returns `Ok(None)` when the challenge isn't ready yet and `budget` leaves no room for
    /// another wait, so the caller can checkpoint and read it again in the next invocation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authority`] if the challenge is still missing after
    /// [`Config::challenge_poll_attempts`][crate::config::Config::challenge_poll_attempts]
    /// reads, or if describing the certificate fails.
    pub async fn fetch_challenge(
        &self,
        handle: &CertificateHandle,
        budget: &InvocationBudget,
    ) -> Result<Option<ValidationChallenge>, Error> {
        let attempts = self.config.challenge_poll_attempts;
        let interval = self.config.challenge_poll_interval;
        for attempt in 1..=attempts {
            if let Some(challenge) = self.authority.describe_challenge(handle).await? {
                tracing::info!(
                    "challenge for {handle}: {} {} {}",
                    challenge.name,
                    challenge.record_type,
                    challenge.value
                );
                return Ok(Some(challenge));
            }
            tracing::debug!("challenge for {handle} not ready ({attempt}/{attempts})");
            if attempt == attempts {
                break;
            }
            if !budget.allows_wait(interval) {
                tracing::info!("challenge for {handle} not ready, deferring to next invocation");
                return Ok(None);
            }
            tokio::time::sleep(interval).await;
        }
        Err(Error::Authority("challenge not ready".into()))
    }
}
