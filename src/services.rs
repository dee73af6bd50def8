//! Per-invocation construction of the regional service clients.
//!
//! The target region is only known once an event has been resolved, so the
//! [provisioning state machine][crate::provision] asks a [`ServiceFactory`] for clients after
//! resolving it rather than sharing one process-wide client.

use crate::authority::acm::AcmAuthority;
use crate::authority::DynAuthority;
use crate::zone::route53::Route53Zones;
use crate::zone::DynZoneRegistry;
use aws_config::{Region, SdkConfig};
use std::sync::Arc;

/// The external services one logical attempt talks to.
#[derive(Clone)]
pub struct Services {
    pub authority: DynAuthority,
    pub zones: DynZoneRegistry,
}

/// `DynServiceFactory` is a type alias for a shared [`ServiceFactory`].
pub type DynServiceFactory = Arc<dyn ServiceFactory + Send + Sync>;

pub trait ServiceFactory {
    /// Build the services for `region`.
    fn connect(&self, region: &str) -> Services;
}

/// Builds ACM and Route 53 clients from the function's shared AWS configuration.
#[derive(Debug, Clone)]
pub struct AwsServices {
    sdk_config: SdkConfig,
}

impl AwsServices {
    pub fn new(sdk_config: SdkConfig) -> Self {
        Self { sdk_config }
    }
}

impl ServiceFactory for AwsServices {
    fn connect(&self, region: &str) -> Services {
        tracing::debug!("connecting services in {region}");
        let region = Region::new(region.to_string());
        let acm_config = aws_sdk_acm::config::Builder::from(&self.sdk_config)
            .region(region.clone())
            .build();
        let route53_config = aws_sdk_route53::config::Builder::from(&self.sdk_config)
            .region(region)
            .build();
        Services {
            authority: Arc::new(AcmAuthority::new(aws_sdk_acm::Client::from_conf(
                acm_config,
            ))),
            zones: Arc::new(Route53Zones::new(aws_sdk_route53::Client::from_conf(
                route53_config,
            ))),
        }
    }
}
