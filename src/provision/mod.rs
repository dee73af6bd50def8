//! The resumable provisioning state machine.
//!
//! Provisioning a certificate moves through
//! `STARTING → REQUESTED → RECORD_PUBLISHED → POLLING → {ISSUED | TIMED_OUT | FAILED}`:
//!
//! * `STARTING`: resolve the target region, request the certificate for the FQDN and read
//!   its DNS validation challenge. A challenge the authority hasn't computed by the time the
//!   budget runs low is read again after a `REQUESTED` checkpoint.
//! * `REQUESTED`: publish the challenge record into the hosted zone. A missing zone fails the
//!   attempt.
//! * `RECORD_PUBLISHED`: begin polling.
//! * `POLLING`: check for issuance every [`Config::poll_interval`][crate::config::Config],
//!   for as long as the invocation has more than
//!   [`Config::safety_margin`][crate::config::Config] left after the next wait.
//!
//! Issuance can take longer than one invocation may run. When the budget runs out the
//! machine builds a [`Checkpoint`] of its phase, hands the event carrying it to a
//! [`Reinvoker`][crate::reinvoke::Reinvoker] and ends the invocation as
//! [`ProvisioningOutcome::InProgress`] without reporting anything. The next invocation resumes
//! from the checkpoint: the certificate is never requested twice and the challenge record is
//! published only once.
//!
//! Each checkpoint carries the number of the invocation that will consume it, starting from 1
//! for the invocation with no checkpoint. An invocation whose attempt number exceeds
//! [`Config::max_attempts`][crate::config::Config] fails as timed out before touching any
//! external service.
//!
//! Every terminal outcome, including any error raised on the way and the invocation running
//! into its own deadline, is reported to the orchestrator before [`Provisioner::handle`]
//! returns.

use crate::authority::{CertificateHandle, CertificateRequester, IssuanceMonitor};
use crate::config::Shared;
use crate::error::Error;
use crate::event::{CustomResourceEvent, ProvisioningRequest, RequestType};
use crate::reinvoke::DynReinvoker;
use crate::report::ResultReporter;
use crate::services::DynServiceFactory;
use crate::zone::ValidationRecordPublisher;
use tokio::time::Instant;

mod budget;
mod checkpoint;

pub use budget::InvocationBudget;
pub use checkpoint::{Checkpoint, CheckpointPhase, ProvisioningOutcome};
use checkpoint::Phase;

/// Reason reported when the invocation deadline interrupts provisioning.
pub const DEADLINE_REASON: &str = "invocation deadline reached before provisioning finished";

pub struct Provisioner {
    config: Shared,
    services: DynServiceFactory,
    reinvoker: DynReinvoker,
    reporter: ResultReporter,
}

impl Provisioner {
    pub fn new(
        config: Shared,
        services: DynServiceFactory,
        reinvoker: DynReinvoker,
        reporter: ResultReporter,
    ) -> Self {
        Self {
            config,
            services,
            reinvoker,
            reporter,
        }
    }

    /// Run one invocation for `event` and report its outcome if it is terminal.
    pub async fn handle(
        &self,
        event: &CustomResourceEvent,
        budget: &InvocationBudget,
    ) -> ProvisioningOutcome {
        let outcome = match event.request_type {
            RequestType::Create => self.guarded_create(event, budget).await,
            RequestType::Update | RequestType::Delete => {
                tracing::info!(
                    "acknowledging {:?} of {} without changes",
                    event.request_type,
                    event.logical_resource_id
                );
                ProvisioningOutcome::Acknowledged
            }
        };
        self.reporter.report(event, &outcome).await;
        outcome
    }

    async fn guarded_create(
        &self,
        event: &CustomResourceEvent,
        budget: &InvocationBudget,
    ) -> ProvisioningOutcome {
        let guard = budget
            .deadline()
            .checked_sub(self.config.report_reserve)
            .unwrap_or_else(Instant::now);
        match tokio::time::timeout_at(guard, self.create(event, budget)).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => {
                tracing::error!(
                    "provisioning {} ({}) failed: {err}",
                    event.logical_resource_id,
                    event.request_id
                );
                ProvisioningOutcome::Failed {
                    reason: err.to_string(),
                }
            }
            Err(_) => {
                tracing::error!(
                    "provisioning {} ({}) interrupted by the invocation deadline",
                    event.logical_resource_id,
                    event.request_id
                );
                ProvisioningOutcome::Failed {
                    reason: DEADLINE_REASON.to_string(),
                }
            }
        }
    }

    async fn create(
        &self,
        event: &CustomResourceEvent,
        budget: &InvocationBudget,
    ) -> Result<ProvisioningOutcome, Error> {
        let attempt = event.checkpoint.as_ref().map_or(1, |c| c.attempt);
        if attempt > self.config.max_attempts {
            return Err(Error::BudgetExceeded {
                attempt,
                max: self.config.max_attempts,
            });
        }

        let request = ProvisioningRequest::resolve(
            &event.resource_properties,
            self.config.default_region.as_deref(),
        )?;
        let mut phase = event.checkpoint.as_ref().map_or(Phase::Starting, Phase::resume);
        tracing::info!(
            "attempt {attempt}/{} for \"{}\" in {} from {phase:?}",
            self.config.max_attempts,
            request.fqdn(),
            request.region
        );

        let services = self.services.connect(&request.region);
        let requester = CertificateRequester::new(services.authority.clone(), self.config.clone());
        let publisher = ValidationRecordPublisher::new(services.zones.clone(), self.config.clone());
        let monitor = IssuanceMonitor::new(services.authority.clone());

        loop {
            phase = match phase {
                Phase::Starting => {
                    let handle = requester.request(&request.fqdn()).await?;
                    match requester.fetch_challenge(&handle, budget).await? {
                        Some(challenge) => Phase::Requested {
                            handle,
                            challenge: Some(challenge),
                        },
                        None => return self.defer_challenge(event, handle, attempt).await,
                    }
                }
                Phase::Requested {
                    handle,
                    challenge: Some(challenge),
                } => {
                    publisher.publish(&request.zone_name, &challenge).await?;
                    Phase::RecordPublished { handle }
                }
                Phase::Requested {
                    handle,
                    challenge: None,
                } => match requester.fetch_challenge(&handle, budget).await? {
                    Some(challenge) => Phase::Requested {
                        handle,
                        challenge: Some(challenge),
                    },
                    None => return self.defer_challenge(event, handle, attempt).await,
                },
                Phase::RecordPublished { handle } => Phase::Polling { handle },
                Phase::Polling { handle } => {
                    return self.poll(event, budget, &monitor, handle, attempt).await;
                }
            };
            if budget.exhausted() {
                if let Some(checkpoint) = phase.checkpoint(attempt.saturating_add(1)) {
                    return self.suspend(event, checkpoint).await;
                }
            }
        }
    }

    async fn poll(
        &self,
        event: &CustomResourceEvent,
        budget: &InvocationBudget,
        monitor: &IssuanceMonitor,
        handle: CertificateHandle,
        attempt: u32,
    ) -> Result<ProvisioningOutcome, Error> {
        let mut checks = 0;
        loop {
            checks += 1;
            if monitor.is_issued(&handle).await? {
                tracing::info!("certificate {handle} issued (attempt {attempt}, check {checks})");
                return Ok(ProvisioningOutcome::Success {
                    certificate_handle: handle,
                });
            }
            if !budget.allows_wait(self.config.poll_interval) {
                let checkpoint = Checkpoint {
                    certificate_handle: handle,
                    attempt: attempt.saturating_add(1),
                    phase: CheckpointPhase::Polling,
                };
                return self.suspend(event, checkpoint).await;
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Suspend in `REQUESTED` because the challenge wasn't ready within this invocation.
    async fn defer_challenge(
        &self,
        event: &CustomResourceEvent,
        handle: CertificateHandle,
        attempt: u32,
    ) -> Result<ProvisioningOutcome, Error> {
        let checkpoint = Checkpoint {
            certificate_handle: handle,
            attempt: attempt.saturating_add(1),
            phase: CheckpointPhase::Requested,
        };
        self.suspend(event, checkpoint).await
    }

    async fn suspend(
        &self,
        event: &CustomResourceEvent,
        checkpoint: Checkpoint,
    ) -> Result<ProvisioningOutcome, Error> {
        tracing::info!(
            "suspending {} in {:?}, resuming as attempt {}",
            checkpoint.certificate_handle,
            checkpoint.phase,
            checkpoint.attempt
        );
        self.reinvoker
            .reinvoke(&event.resume_with(checkpoint.clone()))
            .await?;
        Ok(ProvisioningOutcome::InProgress { checkpoint })
    }
}
