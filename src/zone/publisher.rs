use crate::authority::ValidationChallenge;
use crate::config::Shared;
use crate::error::Error;
use crate::zone::{DynZoneRegistry, RecordSet};

/// Publishes validation challenges into the hosted zone they belong to.
#[derive(Clone)]
pub struct ValidationRecordPublisher {
    zones: DynZoneRegistry,
    config: Shared,
}

impl ValidationRecordPublisher {
    pub fn new(zones: DynZoneRegistry, config: Shared) -> Self {
        Self { zones, config }
    }

    /// Upsert `challenge` into the zone named `zone_name`. Repeating this with the same
    /// challenge leaves the zone unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZoneNotFound`] when the zone lookup returns no zones, or when the
    /// first zone returned isn't named exactly `zone_name + "."`.
    ///
    /// Returns [`Error::Zone`] if the lookup or the record change fails.
    pub async fn publish(
        &self,
        zone_name: &str,
        challenge: &ValidationChallenge,
    ) -> Result<(), Error> {
        let qualified = format!("{zone_name}.");
        let zones = self.zones.zones_by_name(zone_name).await?;
        let zone = match zones.first() {
            Some(zone) if zone.name == qualified => zone,
            _ => return Err(Error::ZoneNotFound(zone_name.to_string())),
        };

        let record = RecordSet {
            name: challenge.name.clone(),
            record_type: challenge.record_type.clone(),
            ttl: self.config.record_ttl,
            value: challenge.value.clone(),
        };
        self.zones.upsert_record(&zone.id, &record).await?;
        tracing::info!(
            "published {} {} in zone {} ({})",
            record.record_type,
            record.name,
            zone.name,
            zone.id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::fakes::{FakeAuthority, FakeZones};
    use std::sync::Arc;

    fn publisher(zones: &Arc<FakeZones>) -> ValidationRecordPublisher {
        ValidationRecordPublisher::new(zones.clone(), Arc::new(Config::default()))
    }

    #[tokio::test]
    async fn publish_upserts_challenge_with_ttl() {
        let zones = Arc::new(FakeZones::with_zones(&[("Z1", "example.com.")]));
        publisher(&zones)
            .publish("example.com", &FakeAuthority::challenge())
            .await
            .unwrap();

        let records = zones.records("Z1");
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0],
            RecordSet {
                name: "_abc.example.com".into(),
                record_type: "CNAME".into(),
                ttl: 300,
                value: "_xyz.acm-validations.aws".into(),
            }
        );
    }

    #[tokio::test]
    async fn publish_twice_is_the_same_as_once() {
        let zones = Arc::new(FakeZones::with_zones(&[("Z1", "example.com.")]));
        let publisher = publisher(&zones);
        let challenge = FakeAuthority::challenge();

        publisher.publish("example.com", &challenge).await.unwrap();
        let once = zones.records("Z1");
        publisher.publish("example.com", &challenge).await.unwrap();

        assert_eq!(zones.records("Z1"), once);
        assert_eq!(zones.upsert_calls(), 2);
    }

    #[tokio::test]
    async fn no_zones_is_zone_not_found() {
        let zones = Arc::new(FakeZones::with_zones(&[]));
        let res = publisher(&zones)
            .publish("example.org", &FakeAuthority::challenge())
            .await;

        assert!(matches!(res, Err(Error::ZoneNotFound(name)) if name == "example.org"));
        assert_eq!(zones.upsert_calls(), 0);
    }

    #[tokio::test]
    async fn first_zone_must_match_exactly() {
        let zones = Arc::new(FakeZones::with_zones(&[("Z1", "example.com.")]));
        let res = publisher(&zones)
            .publish("example.org", &FakeAuthority::challenge())
            .await;

        assert!(matches!(res, Err(Error::ZoneNotFound(_))));
        assert_eq!(zones.upsert_calls(), 0);
    }

    #[tokio::test]
    async fn only_first_listed_zone_is_considered() {
        let zones = Arc::new(FakeZones::with_zones(&[
            ("Z1", "a.example.com."),
            ("Z2", "example.com."),
        ]));
        let res = publisher(&zones)
            .publish("example.com", &FakeAuthority::challenge())
            .await;

        assert!(matches!(res, Err(Error::ZoneNotFound(_))));
    }
}
