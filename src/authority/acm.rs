//! An AWS Certificate Manager implementation of the
//! [`CertificateAuthority`][super::CertificateAuthority] trait.
use crate::authority::{CertificateAuthority, CertificateHandle, ValidationChallenge};
use crate::error::Error;
use aws_sdk_acm::error::DisplayErrorContext;
#[allow(deprecated)]
use aws_sdk_acm::types::CertificateTransparencyLoggingPreference;
use aws_sdk_acm::types::{CertificateOptions, CertificateStatus, ValidationMethod};

/// Talks to ACM in a single region with a client built for the invocation.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct AcmAuthority {
    client: aws_sdk_acm::Client,
}

impl AcmAuthority {
    pub fn new(client: aws_sdk_acm::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl CertificateAuthority for AcmAuthority {
    // CT logging stays enabled while the SDK marks the preference deprecated.
    #[allow(deprecated)]
    async fn request_certificate(&self, fqdn: &str) -> Result<CertificateHandle, Error> {
        let options = CertificateOptions::builder()
            .certificate_transparency_logging_preference(
                CertificateTransparencyLoggingPreference::Enabled,
            )
            .build();
        let resp = self
            .client
            .request_certificate()
            .domain_name(fqdn)
            .validation_method(ValidationMethod::Dns)
            .options(options)
            .send()
            .await
            .map_err(|err| Error::Authority(format!("{}", DisplayErrorContext(&err))))?;
        resp.certificate_arn()
            .map(CertificateHandle::new)
            .ok_or_else(|| Error::Authority("request returned no certificate ARN".into()))
    }

    async fn describe_challenge(
        &self,
        handle: &CertificateHandle,
    ) -> Result<Option<ValidationChallenge>, Error> {
        let resp = self
            .client
            .describe_certificate()
            .certificate_arn(handle.as_str())
            .send()
            .await
            .map_err(|err| Error::Authority(format!("{}", DisplayErrorContext(&err))))?;
        let detail = resp
            .certificate()
            .ok_or_else(|| Error::Authority(format!("no details for certificate {handle}")))?;

        // Single domain certificates only ever carry one validation option.
        let record = detail
            .domain_validation_options()
            .first()
            .and_then(|dv| dv.resource_record());
        Ok(record.map(|rr| ValidationChallenge {
            name: rr.name().to_string(),
            record_type: rr.r#type().as_str().to_string(),
            value: rr.value().to_string(),
        }))
    }

    async fn issued_certificates(&self) -> Result<Vec<CertificateHandle>, Error> {
        let mut handles = vec![];
        let mut next_token: Option<String> = None;
        loop {
            let resp = self
                .client
                .list_certificates()
                .certificate_statuses(CertificateStatus::Issued)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|err| Error::Authority(format!("{}", DisplayErrorContext(&err))))?;
            handles.extend(
                resp.certificate_summary_list()
                    .iter()
                    .filter_map(|summary| summary.certificate_arn())
                    .map(CertificateHandle::new),
            );
            match resp.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }
        Ok(handles)
    }
}
