//! Gmail REST API client

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::constants::{GMAIL_API_BASE, HTTP_TIMEOUT_SECS, THREAD_METADATA_HEADERS};
use crate::error::TransportError;

use super::MailService;
use super::types::{OutgoingMessage, Profile, Thread, ThreadPage};

/// Gmail API client authorized with a bearer access token
pub struct GmailClient {
    client: Client,
    access_token: String,
    base_url: String,
}

impl GmailClient {
    pub fn new(access_token: String) -> Result<Self> {
        Self::with_base_url(access_token, GMAIL_API_BASE)
    }

    /// Point the client at another API root (e.g. a local test server)
    pub fn with_base_url(access_token: String, base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            access_token,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn execute(&self, endpoint: &str, request: RequestBuilder) -> Result<Response, TransportError> {
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|source| TransportError::Http {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<T, TransportError> {
        self.execute(endpoint, request)
            .await?
            .json()
            .await
            .map_err(|e| TransportError::Decode {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })
    }
}

impl MailService for GmailClient {
    async fn get_profile(&self) -> Result<Profile, TransportError> {
        let request = self.client.get(self.url("profile"));
        self.get_json("profile", request).await
    }

    async fn list_threads(
        &self,
        query: &str,
        page_token: Option<&str>,
    ) -> Result<ThreadPage, TransportError> {
        let mut request = self.client.get(self.url("threads")).query(&[("q", query)]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }
        tracing::debug!("Listing threads (page token: {:?})", page_token);
        self.get_json("threads.list", request).await
    }

    async fn get_thread(&self, id: &str) -> Result<Thread, TransportError> {
        let mut params = vec![("format", "metadata")];
        for header in THREAD_METADATA_HEADERS {
            params.push(("metadataHeaders", header));
        }
        let request = self
            .client
            .get(self.url(&format!("threads/{}", id)))
            .query(&params);
        self.get_json("threads.get", request).await
    }

    async fn send_message(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        let request = self.client.post(self.url("messages/send")).json(message);
        self.execute("messages.send", request).await?;
        Ok(())
    }
}
