//! Error types.

/// Error enumerates the possible Cert Crab error states.
///
/// Conditions that are expected while waiting on the certificate authority, such as a
/// validation challenge that hasn't been computed yet or a certificate that hasn't been
/// issued yet, are never represented here. Those are ordinary negative results that drive
/// the [provisioning state machine][crate::provision].
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Returned when the certificate authority rejects a request, returns malformed
    /// challenge data, or never produces a challenge within the configured bound. Also
    /// returned when the domain name to certify isn't a valid DNS name.
    #[error("certificate authority error: {0}")]
    Authority(String),

    /// Returned by [`ValidationRecordPublisher::publish`][crate::zone::ValidationRecordPublisher]
    /// when no zone exactly matches the requested zone name. The zone is a precondition the
    /// stack author must fix, so this is never retried.
    #[error("no hosted zone named \"{0}.\"")]
    ZoneNotFound(String),

    /// Returned when the DNS zone service rejects a lookup or a record change.
    #[error("DNS zone service error: {0}")]
    Zone(String),

    /// Returned when a resumed invocation carries an attempt counter beyond
    /// [`Config::max_attempts`][crate::config::Config::max_attempts].
    #[error(
        "timed out waiting for certificate issuance: attempt {attempt} exceeds the maximum of {max}"
    )]
    BudgetExceeded { attempt: u32, max: u32 },

    /// Returned when neither the request properties nor the environment name a region.
    #[error("no target region: set the Region property or AWS_DEFAULT_REGION")]
    MissingRegion,

    /// Returned when a create request lacks properties required to provision.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Returned when the follow-up invocation carrying a checkpoint couldn't be scheduled.
    #[error("failed to schedule re-invocation: {0}")]
    Reinvoke(String),

    /// Returned when the orchestrator callback couldn't be delivered.
    #[error("callback delivery failed")]
    Callback(#[from] reqwest::Error),

    /// Returned when the orchestrator callback endpoint answers with a non-success status.
    #[error("callback rejected with HTTP status {0}")]
    CallbackStatus(u16),

    /// Returned when the [`Config`][crate::config::Config] settings are inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Returned when a generic IO error occurs.
    #[error("an IO error occurred")]
    IO(#[from] std::io::Error),

    /// Returned when an event payload or a config file isn't valid JSON for its model.
    #[error("invalid JSON")]
    InvalidJSON(#[from] serde_json::Error),
}
