//! The custom resource event delivered by the stack orchestrator.
//!
//! Events are deserialised from the orchestrator's PascalCase JSON. Fields this crate doesn't
//! model (e.g. `ServiceToken`, `ResourceType`, `OldResourceProperties`) are captured in
//! `extra` maps so that a re-invocation payload built from an event reproduces it verbatim,
//! plus the updated [`Checkpoint`].
//!
//! ```json
//! {
//!   "RequestType": "Create",
//!   "ResponseURL": "https://cloudformation-custom-resource-response.s3.amazonaws.com/...",
//!   "StackId": "arn:aws:cloudformation:us-east-1:123456789012:stack/web/guid",
//!   "RequestId": "b3d0c1a2-...",
//!   "LogicalResourceId": "Certificate",
//!   "ResourceProperties": { "HostedZoneName": "example.com", "RecordName": "app" },
//!   "Checkpoint": { "CertificateHandle": "arn:aws:acm:...", "Attempt": 2, "Phase": "POLLING" }
//! }
//! ```

use crate::error::Error;
use crate::provision::Checkpoint;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

/// The template's properties for the resource, kept exactly as received.
///
/// Values are read through accessors rather than modelled fields, so a property the template
/// sets to `null` is still `null` in a re-invocation payload.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct ResourceProperties(Map<String, Value>);

impl ResourceProperties {
    pub const HOSTED_ZONE_NAME: &'static str = "HostedZoneName";
    pub const RECORD_NAME: &'static str = "RecordName";
    pub const REGION: &'static str = "Region";
    pub const TARGET_REGION: &'static str = "TargetRegion";

    /// The string value of property `key`. Absent, `null` and non-string values read as `None`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Set property `key`, or remove it when `value` is `None`.
    pub fn set(&mut self, key: &str, value: Option<&str>) {
        match value {
            Some(value) => {
                self.0.insert(key.to_string(), Value::from(value));
            }
            None => {
                self.0.remove(key);
            }
        }
    }

    #[must_use]
    pub fn hosted_zone_name(&self) -> Option<&str> {
        self.get(Self::HOSTED_ZONE_NAME)
    }

    #[must_use]
    pub fn record_name(&self) -> Option<&str> {
        self.get(Self::RECORD_NAME)
    }

    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.get(Self::REGION)
    }

    #[must_use]
    pub fn target_region(&self) -> Option<&str> {
        self.get(Self::TARGET_REGION)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceEvent {
    pub request_type: RequestType,
    #[serde(rename = "ResponseURL")]
    pub response_url: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    #[serde(default)]
    pub resource_properties: ResourceProperties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<Checkpoint>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CustomResourceEvent {
    /// The same event carrying `checkpoint`, for the next invocation of the attempt.
    #[must_use]
    pub fn resume_with(&self, checkpoint: Checkpoint) -> Self {
        Self {
            checkpoint: Some(checkpoint),
            ..self.clone()
        }
    }

    /// The `PhysicalResourceId` the orchestrator already knows, sent with updates and deletes.
    #[must_use]
    pub fn physical_resource_id(&self) -> Option<&str> {
        self.extra.get("PhysicalResourceId").and_then(Value::as_str)
    }

    /// The stack name embedded in the stack ARN, or the whole id if it isn't an ARN.
    #[must_use]
    pub fn stack_name(&self) -> &str {
        self.stack_id.split('/').nth(1).unwrap_or(&self.stack_id)
    }
}

/// The immutable description of what to provision, resolved from a create event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningRequest {
    pub zone_name: String,
    pub record_name: Option<String>,
    pub region: String,
}

impl ProvisioningRequest {
    /// Resolve the request from `props`. The region is taken from the `Region` property, then
    /// `TargetRegion`, then `default_region`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if `HostedZoneName` is missing or empty.
    ///
    /// Returns [`Error::MissingRegion`] if no region can be resolved.
    pub fn resolve(
        props: &ResourceProperties,
        default_region: Option<&str>,
    ) -> Result<Self, Error> {
        let zone_name = props
            .hosted_zone_name()
            .map(|z| z.trim().trim_end_matches('.'))
            .filter(|z| !z.is_empty())
            .ok_or_else(|| Error::InvalidRequest("HostedZoneName is required".into()))?
            .to_string();
        let record_name = props
            .record_name()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(ToString::to_string);
        let region = [
            props.region(),
            props.target_region(),
            default_region,
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|r| !r.is_empty())
        .ok_or(Error::MissingRegion)?
        .to_string();

        Ok(Self {
            zone_name,
            record_name,
            region,
        })
    }

    /// The domain to certify: `record.zone`, or the zone itself without a record prefix.
    #[must_use]
    pub fn fqdn(&self) -> String {
        match &self.record_name {
            Some(record) => format!("{record}.{}", self.zone_name),
            None => self.zone_name.clone(),
        }
    }
}
