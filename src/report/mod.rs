//! Delivering terminal outcomes back to the stack orchestrator.
//!
//! The orchestrator waits for a single JSON document `PUT` to the `ResponseURL` of the event
//! that started provisioning:
//!
//! ```json
//! {
//!   "Status": "SUCCESS",
//!   "Reason": "certificate arn:aws:acm:... issued",
//!   "PhysicalResourceId": "arn:aws:acm:...",
//!   "StackId": "arn:aws:cloudformation:...",
//!   "RequestId": "b3d0c1a2-...",
//!   "LogicalResourceId": "Certificate",
//!   "Data": { "Arn": "arn:aws:acm:...", "CertificateHandle": "arn:aws:acm:..." }
//! }
//! ```
//!
//! Delivery is best effort. A failed `PUT` is logged and not retried: the orchestrator
//! surfaces its own timeout when no callback arrives.

use crate::error::Error;
use crate::event::CustomResourceEvent;
use crate::provision::ProvisioningOutcome;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

pub mod http;

pub use http::HttpCallback;

/// Output attribute carrying the issued certificate's handle.
pub const CERTIFICATE_HANDLE_ATTRIBUTE: &str = "CertificateHandle";

/// The same handle under the name templates read with `!GetAtt Resource.Arn`.
pub const ARN_ATTRIBUTE: &str = "Arn";

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallbackStatus {
    Success,
    Failed,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct CallbackResponse {
    pub status: CallbackStatus,
    pub reason: String,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    pub data: BTreeMap<String, String>,
}

impl CallbackResponse {
    /// Build the callback for a terminal `outcome`, or `None` while provisioning is still in
    /// progress.
    #[must_use]
    pub fn for_outcome(event: &CustomResourceEvent, outcome: &ProvisioningOutcome) -> Option<Self> {
        let (status, reason, data) = match outcome {
            ProvisioningOutcome::InProgress { .. } => return None,
            ProvisioningOutcome::Success { certificate_handle } => (
                CallbackStatus::Success,
                format!("certificate {certificate_handle} issued"),
                BTreeMap::from([
                    (
                        CERTIFICATE_HANDLE_ATTRIBUTE.to_string(),
                        certificate_handle.to_string(),
                    ),
                    (ARN_ATTRIBUTE.to_string(), certificate_handle.to_string()),
                ]),
            ),
            ProvisioningOutcome::Acknowledged => (
                CallbackStatus::Success,
                format!("{:?} acknowledged without changes", event.request_type),
                BTreeMap::new(),
            ),
            ProvisioningOutcome::Failed { reason } => {
                (CallbackStatus::Failed, reason.clone(), BTreeMap::new())
            }
        };
        Some(Self {
            status,
            reason,
            physical_resource_id: physical_resource_id(event, outcome),
            stack_id: event.stack_id.clone(),
            request_id: event.request_id.clone(),
            logical_resource_id: event.logical_resource_id.clone(),
            data,
        })
    }
}

fn physical_resource_id(event: &CustomResourceEvent, outcome: &ProvisioningOutcome) -> String {
    if let Some(id) = event.physical_resource_id() {
        return id.to_string();
    }
    if let ProvisioningOutcome::Success { certificate_handle } = outcome {
        return certificate_handle.to_string();
    }
    // Stable across re-invocations of the same request.
    let request_prefix: String = event.request_id.chars().take(8).collect();
    format!(
        "{}_{}_{request_prefix}",
        event.stack_name(),
        event.logical_resource_id
    )
}

/// `DynCallbackTransport` is a type alias for a shared [`CallbackTransport`].
pub type DynCallbackTransport = Arc<dyn CallbackTransport + Send + Sync>;

/// An async trait describing how a [`CallbackResponse`] reaches the orchestrator.
#[async_trait::async_trait]
pub trait CallbackTransport {
    async fn deliver(&self, response_url: &str, response: &CallbackResponse) -> Result<(), Error>;
}

/// Reports terminal outcomes for the events that started them.
#[derive(Clone)]
pub struct ResultReporter {
    transport: DynCallbackTransport,
}

impl ResultReporter {
    pub fn new(transport: DynCallbackTransport) -> Self {
        Self { transport }
    }

    /// Send the callback for `outcome`. Does nothing for in-progress outcomes, and only logs
    /// delivery failures.
    pub async fn report(&self, event: &CustomResourceEvent, outcome: &ProvisioningOutcome) {
        let Some(response) = CallbackResponse::for_outcome(event, outcome) else {
            return;
        };
        match self.transport.deliver(&event.response_url, &response).await {
            Ok(()) => tracing::info!(
                "reported {:?} for {} ({})",
                response.status,
                event.logical_resource_id,
                event.request_id
            ),
            Err(err) => tracing::error!(
                "failed to report {:?} for {} ({}): {err}",
                response.status,
                event.logical_resource_id,
                event.request_id
            ),
        }
    }
}
