use reqwest::{Client, Url};

use super::{ApiError, ApiRequest};

/// Thin typed client over the daemon's submission API
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            client: Client::new(),
        })
    }

    /// Send a request and decode its typed response
    ///
    /// Non-success statuses surface as [`ApiError::Status`] with the response
    /// body, so the daemon's structured rejection reasons reach the caller.
    pub async fn call<R: ApiRequest>(&self, request: R) -> Result<R::Response, ApiError> {
        let response = request
            .build_request(&self.base_url, &self.client)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status(status, body));
        }

        Ok(response.json().await?)
    }
}
