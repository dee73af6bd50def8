//! An HTTPS implementation of the [`CallbackTransport`][super::CallbackTransport] trait.
use crate::error::Error;
use crate::report::{CallbackResponse, CallbackTransport};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use std::time::Duration;

/// `PUT`s callbacks with [`reqwest`]. Pre-signed response URLs are signed without a content
/// type, so the request carries an empty `Content-Type` header.
#[derive(Debug, Clone)]
pub struct HttpCallback {
    client: reqwest::Client,
}

impl HttpCallback {
    /// # Errors
    ///
    /// Returns [`Error::Callback`] if the HTTP client can't be initialised.
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl CallbackTransport for HttpCallback {
    async fn deliver(&self, response_url: &str, response: &CallbackResponse) -> Result<(), Error> {
        let body = serde_json::to_vec(response)?;
        let resp = self
            .client
            .put(response_url)
            .header(CONTENT_TYPE, "")
            .header(CONTENT_LENGTH, body.len())
            .body(body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::CallbackStatus(status.as_u16()));
        }
        Ok(())
    }
}
