//! In-memory stand-ins for the external services, shared by the unit tests.
use crate::authority::{CertificateAuthority, CertificateHandle, ValidationChallenge};
use crate::error::Error;
use crate::event::CustomResourceEvent;
use crate::reinvoke::Reinvoker;
use crate::report::{CallbackResponse, CallbackTransport};
use crate::services::{ServiceFactory, Services};
use crate::zone::{HostedZone, RecordSet, ZoneRegistry};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) fn create_event() -> CustomResourceEvent {
    serde_json::from_value(json!({
        "RequestType": "Create",
        "ServiceToken": "arn:aws:lambda:us-east-1:123456789012:function:certcrab",
        "ResponseURL": "https://callback.example.invalid/response",
        "StackId": "arn:aws:cloudformation:us-east-1:123456789012:stack/web/3f1e2d4c",
        "RequestId": "5f0d6d1e-8a4b-4c1e-9e63-1d0c5b7f2a11",
        "ResourceType": "Custom::Certificate",
        "LogicalResourceId": "Certificate",
        "ResourceProperties": {
            "ServiceToken": "arn:aws:lambda:us-east-1:123456789012:function:certcrab",
            "HostedZoneName": "example.com",
            "RecordName": "app",
            "Region": "us-east-1"
        }
    }))
    .unwrap()
}

#[derive(Debug)]
struct AuthorityState {
    handle: CertificateHandle,
    request_error: Option<String>,
    challenge_ready_after: usize,
    issue_after_polls: Option<usize>,
    stall_listing: bool,
    requested: Vec<String>,
    describe_calls: usize,
    list_calls: usize,
}

/// A certificate authority issuing a single, fixed certificate handle.
#[derive(Debug)]
pub(crate) struct FakeAuthority {
    state: Mutex<AuthorityState>,
}

impl FakeAuthority {
    /// The challenge is ready on the first describe and the certificate issued on the first
    /// poll unless configured otherwise.
    pub(crate) fn new(handle: &str) -> Self {
        Self {
            state: Mutex::new(AuthorityState {
                handle: CertificateHandle::new(handle),
                request_error: None,
                challenge_ready_after: 1,
                issue_after_polls: Some(1),
                stall_listing: false,
                requested: vec![],
                describe_calls: 0,
                list_calls: 0,
            }),
        }
    }

    pub(crate) fn challenge() -> ValidationChallenge {
        ValidationChallenge {
            name: "_abc.example.com".into(),
            record_type: "CNAME".into(),
            value: "_xyz.acm-validations.aws".into(),
        }
    }

    pub(crate) fn reject_requests(&self, reason: &str) {
        self.state.lock().unwrap().request_error = Some(reason.to_string());
    }

    pub(crate) fn challenge_ready_after(&self, describes: usize) {
        self.state.lock().unwrap().challenge_ready_after = describes;
    }

    /// `None` never issues.
    pub(crate) fn issue_after_polls(&self, polls: Option<usize>) {
        self.state.lock().unwrap().issue_after_polls = polls;
    }

    pub(crate) fn stall_listing(&self) {
        self.state.lock().unwrap().stall_listing = true;
    }

    pub(crate) fn requested_fqdns(&self) -> Vec<String> {
        self.state.lock().unwrap().requested.clone()
    }

    pub(crate) fn request_calls(&self) -> usize {
        self.state.lock().unwrap().requested.len()
    }

    pub(crate) fn describe_calls(&self) -> usize {
        self.state.lock().unwrap().describe_calls
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.request_calls() + self.describe_calls() + self.list_calls()
    }
}

#[async_trait::async_trait]
impl CertificateAuthority for FakeAuthority {
    async fn request_certificate(&self, fqdn: &str) -> Result<CertificateHandle, Error> {
        let mut state = self.state.lock().unwrap();
        state.requested.push(fqdn.to_string());
        match &state.request_error {
            Some(reason) => Err(Error::Authority(reason.clone())),
            None => Ok(state.handle.clone()),
        }
    }

    async fn describe_challenge(
        &self,
        handle: &CertificateHandle,
    ) -> Result<Option<ValidationChallenge>, Error> {
        let mut state = self.state.lock().unwrap();
        if *handle != state.handle {
            return Err(Error::Authority(format!("no certificate {handle}")));
        }
        state.describe_calls += 1;
        Ok((state.describe_calls >= state.challenge_ready_after).then(Self::challenge))
    }

    async fn issued_certificates(&self) -> Result<Vec<CertificateHandle>, Error> {
        let stall = {
            let mut state = self.state.lock().unwrap();
            state.list_calls += 1;
            state.stall_listing
        };
        if stall {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        let state = self.state.lock().unwrap();
        let mut issued = vec![CertificateHandle::new("arn:cert:unrelated")];
        if matches!(state.issue_after_polls, Some(n) if state.list_calls >= n) {
            issued.push(state.handle.clone());
        }
        Ok(issued)
    }
}

#[derive(Debug, Default)]
struct ZonesState {
    zones: Vec<HostedZone>,
    records: HashMap<String, BTreeMap<(String, String), RecordSet>>,
    lookups: usize,
    upserts: usize,
}

/// Hosted zones listed in the order given, holding upserted records keyed by name and type.
#[derive(Debug, Default)]
pub(crate) struct FakeZones {
    state: Mutex<ZonesState>,
}

impl FakeZones {
    pub(crate) fn with_zones(zones: &[(&str, &str)]) -> Self {
        let zones = zones
            .iter()
            .map(|(id, name)| HostedZone {
                id: (*id).to_string(),
                name: (*name).to_string(),
            })
            .collect();
        Self {
            state: Mutex::new(ZonesState {
                zones,
                ..ZonesState::default()
            }),
        }
    }

    pub(crate) fn records(&self, zone_id: &str) -> Vec<RecordSet> {
        self.state
            .lock()
            .unwrap()
            .records
            .get(zone_id)
            .map(|r| r.values().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn lookups(&self) -> usize {
        self.state.lock().unwrap().lookups
    }

    pub(crate) fn upsert_calls(&self) -> usize {
        self.state.lock().unwrap().upserts
    }
}

#[async_trait::async_trait]
impl ZoneRegistry for FakeZones {
    async fn zones_by_name(&self, _dns_name: &str) -> Result<Vec<HostedZone>, Error> {
        let mut state = self.state.lock().unwrap();
        state.lookups += 1;
        Ok(state.zones.clone())
    }

    async fn upsert_record(&self, zone_id: &str, record: &RecordSet) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        state.upserts += 1;
        if !state.zones.iter().any(|z| z.id == zone_id) {
            return Err(Error::Zone(format!("no such zone {zone_id}")));
        }
        state.records.entry(zone_id.to_string()).or_default().insert(
            (record.name.clone(), record.record_type.clone()),
            record.clone(),
        );
        Ok(())
    }
}

/// Hands out the same fakes for every region, remembering which regions were asked for.
pub(crate) struct FakeServices {
    pub(crate) authority: Arc<FakeAuthority>,
    pub(crate) zones: Arc<FakeZones>,
    regions: Mutex<Vec<String>>,
}

impl FakeServices {
    pub(crate) fn new(authority: Arc<FakeAuthority>, zones: Arc<FakeZones>) -> Self {
        Self {
            authority,
            zones,
            regions: Mutex::new(vec![]),
        }
    }

    pub(crate) fn regions(&self) -> Vec<String> {
        self.regions.lock().unwrap().clone()
    }
}

impl ServiceFactory for FakeServices {
    fn connect(&self, region: &str) -> Services {
        self.regions.lock().unwrap().push(region.to_string());
        Services {
            authority: self.authority.clone(),
            zones: self.zones.clone(),
        }
    }
}

/// Records re-invocation payloads as serialised JSON, the way they'd travel.
#[derive(Debug, Default)]
pub(crate) struct CapturingReinvoker {
    payloads: Mutex<Vec<Vec<u8>>>,
    fail: Mutex<bool>,
}

impl CapturingReinvoker {
    pub(crate) fn fail_dispatches(&self) {
        *self.fail.lock().unwrap() = true;
    }

    pub(crate) fn events(&self) -> Vec<CustomResourceEvent> {
        self.payloads
            .lock()
            .unwrap()
            .iter()
            .map(|p| serde_json::from_slice(p).unwrap())
            .collect()
    }
}

#[async_trait::async_trait]
impl Reinvoker for CapturingReinvoker {
    async fn reinvoke(&self, event: &CustomResourceEvent) -> Result<(), Error> {
        if *self.fail.lock().unwrap() {
            return Err(Error::Reinvoke("throttled".into()));
        }
        self.payloads
            .lock()
            .unwrap()
            .push(serde_json::to_vec(event)?);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(crate) struct CapturingCallback {
    delivered: Mutex<Vec<(String, CallbackResponse)>>,
    attempts: Mutex<usize>,
    fail: Mutex<bool>,
}

impl CapturingCallback {
    pub(crate) fn fail_deliveries(&self) {
        *self.fail.lock().unwrap() = true;
    }

    pub(crate) fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }

    pub(crate) fn responses(&self) -> Vec<CallbackResponse> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .map(|(_, r)| r.clone())
            .collect()
    }

    pub(crate) fn urls(&self) -> Vec<String> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .map(|(u, _)| u.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl CallbackTransport for CapturingCallback {
    async fn deliver(&self, response_url: &str, response: &CallbackResponse) -> Result<(), Error> {
        *self.attempts.lock().unwrap() += 1;
        if *self.fail.lock().unwrap() {
            return Err(Error::CallbackStatus(403));
        }
        self.delivered
            .lock()
            .unwrap()
            .push((response_url.to_string(), response.clone()));
        Ok(())
    }
}
