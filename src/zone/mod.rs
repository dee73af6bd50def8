//! DNS zone management.
//!
//! Validation challenges are proven by publishing a record into the authoritative hosted zone
//! for the domain being certified. The [`ZoneRegistry`] trait describes the two zone
//! operations that needs, looking zones up by name and upserting a record set, and
//! [`route53::Route53Zones`] implements it for Amazon Route 53.
//!
//! Zones are matched by exact, trailing-dot qualified name: a request for `example.com` only
//! ever targets a zone named `example.com.`. See [`ValidationRecordPublisher`].

use crate::error::Error;
use std::sync::Arc;

pub mod publisher;
pub mod route53;

pub use publisher::ValidationRecordPublisher;

/// A hosted zone as listed by the zone service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedZone {
    pub id: String,
    pub name: String,
}

/// A single-value resource record set to upsert.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordSet {
    pub name: String,
    pub record_type: String,
    pub ttl: i64,
    pub value: String,
}

/// `DynZoneRegistry` is a type alias for a [`ZoneRegistry`] shared by the components of a
/// single invocation.
#[allow(clippy::module_name_repetitions)]
pub type DynZoneRegistry = Arc<dyn ZoneRegistry + Send + Sync>;

/// An async trait describing the hosted zone operations used to publish validation records.
#[async_trait::async_trait]
#[allow(clippy::module_name_repetitions)]
pub trait ZoneRegistry {
    /// List hosted zones in lexicographic order starting at `dns_name`. As with Route 53's
    /// `ListHostedZonesByName`, the first entry is only the requested zone if it exists.
    async fn zones_by_name(&self, dns_name: &str) -> Result<Vec<HostedZone>, Error>;

    /// Create or replace `record` in the zone identified by `zone_id`.
    async fn upsert_record(&self, zone_id: &str, record: &RecordSet) -> Result<(), Error>;
}
