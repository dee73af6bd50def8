//! An Amazon Route 53 implementation of the [`ZoneRegistry`][super::ZoneRegistry] trait.
use crate::error::Error;
use crate::zone::{HostedZone, RecordSet, ZoneRegistry};
use aws_sdk_route53::error::DisplayErrorContext;
use aws_sdk_route53::types::{
    Change, ChangeAction, ChangeBatch, ResourceRecord, ResourceRecordSet, RrType,
};

#[derive(Debug, Clone)]
pub struct Route53Zones {
    client: aws_sdk_route53::Client,
}

impl Route53Zones {
    pub fn new(client: aws_sdk_route53::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ZoneRegistry for Route53Zones {
    async fn zones_by_name(&self, dns_name: &str) -> Result<Vec<HostedZone>, Error> {
        let resp = self
            .client
            .list_hosted_zones_by_name()
            .dns_name(dns_name)
            .send()
            .await
            .map_err(|err| Error::Zone(format!("{}", DisplayErrorContext(&err))))?;
        Ok(resp
            .hosted_zones()
            .iter()
            .map(|zone| HostedZone {
                id: zone.id().to_string(),
                name: zone.name().to_string(),
            })
            .collect())
    }

    async fn upsert_record(&self, zone_id: &str, record: &RecordSet) -> Result<(), Error> {
        let build_err = |err: aws_sdk_route53::error::BuildError| Error::Zone(err.to_string());
        let record_set = ResourceRecordSet::builder()
            .name(&record.name)
            .r#type(RrType::from(record.record_type.as_str()))
            .ttl(record.ttl)
            .resource_records(
                ResourceRecord::builder()
                    .value(&record.value)
                    .build()
                    .map_err(build_err)?,
            )
            .build()
            .map_err(build_err)?;
        let change = Change::builder()
            .action(ChangeAction::Upsert)
            .resource_record_set(record_set)
            .build()
            .map_err(build_err)?;
        let batch = ChangeBatch::builder()
            .changes(change)
            .build()
            .map_err(build_err)?;

        self.client
            .change_resource_record_sets()
            .hosted_zone_id(zone_id)
            .change_batch(batch)
            .send()
            .await
            .map_err(|err| Error::Zone(format!("{}", DisplayErrorContext(&err))))?;
        Ok(())
    }
}
