//! Self re-invocation.
//!
//! A certificate can take longer to issue than a single invocation may run. When the
//! [provisioning state machine][crate::provision] runs out of time it hands the event, carrying
//! an updated [`Checkpoint`][crate::provision::Checkpoint], to a [`Reinvoker`] which starts a
//! fresh invocation of the same function without waiting for it.

use crate::error::Error;
use crate::event::CustomResourceEvent;
use aws_sdk_lambda::error::DisplayErrorContext;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::InvocationType;
use std::sync::Arc;

/// `DynReinvoker` is a type alias for a shared [`Reinvoker`].
pub type DynReinvoker = Arc<dyn Reinvoker + Send + Sync>;

/// An async trait describing a fire-and-forget dispatch of the handler with a new event.
#[async_trait::async_trait]
pub trait Reinvoker {
    /// Schedule an invocation with `event` as its payload. Returns once the dispatch has been
    /// accepted, not once the invocation has run.
    async fn reinvoke(&self, event: &CustomResourceEvent) -> Result<(), Error>;
}

/// Re-invokes a Lambda function asynchronously (`Event` invocation type).
#[derive(Debug, Clone)]
pub struct LambdaReinvoker {
    client: aws_sdk_lambda::Client,
    function_arn: String,
}

impl LambdaReinvoker {
    pub fn new(client: aws_sdk_lambda::Client, function_arn: impl Into<String>) -> Self {
        Self {
            client,
            function_arn: function_arn.into(),
        }
    }
}

#[async_trait::async_trait]
impl Reinvoker for LambdaReinvoker {
    async fn reinvoke(&self, event: &CustomResourceEvent) -> Result<(), Error> {
        let payload = serde_json::to_vec(event)?;
        let resp = self
            .client
            .invoke()
            .function_name(&self.function_arn)
            .invocation_type(InvocationType::Event)
            .payload(Blob::new(payload))
            .send()
            .await
            .map_err(|err| Error::Reinvoke(format!("{}", DisplayErrorContext(&err))))?;
        match resp.status_code() {
            200..=299 => {
                tracing::debug!(
                    "dispatched {} with status {}",
                    self.function_arn,
                    resp.status_code()
                );
                Ok(())
            }
            status => Err(Error::Reinvoke(format!(
                "{} answered with status {status}",
                self.function_arn
            ))),
        }
    }
}
