//! Cert Crab
//!
//! A CloudFormation custom resource handler that provisions a DNS validated [ACM] certificate
//! for a domain served from a [Route 53] hosted zone, from an AWS Lambda function.
//!
//! Certificate issuance routinely takes longer than a Lambda invocation may run, so
//! provisioning is a [resumable state machine][provision]: progress is carried in a
//! [`Checkpoint`][provision::Checkpoint] embedded in the event, and the function
//! [re-invokes itself][reinvoke] with it until the certificate is issued or the attempt
//! budget is spent. The outcome is then [reported][report] to the stack via the custom
//! resource response URL.
//!
//! ```yaml
//! Certificate:
//!   Type: Custom::Certificate
//!   Properties:
//!     ServiceToken: !GetAtt CertCrabFunction.Arn
//!     HostedZoneName: example.com
//!     RecordName: app
//!     Region: us-east-1
//! ```
//!
//! The certificate ARN is available as `!GetAtt Certificate.CertificateHandle`.
//!
//! [ACM]: https://docs.aws.amazon.com/acm/latest/userguide/dns-validation.html
//! [Route 53]: https://docs.aws.amazon.com/Route53/latest/DeveloperGuide/hosted-zones-working-with.html
//!
#![warn(clippy::pedantic)]

pub mod authority;
pub mod config;
pub mod error;
pub mod event;
pub mod provision;
pub mod reinvoke;
pub mod report;
pub mod services;
pub mod zone;

#[cfg(test)]
mod fakes;

pub use config::{Config, Shared};
pub use event::CustomResourceEvent;
pub use provision::{InvocationBudget, Provisioner, ProvisioningOutcome};
