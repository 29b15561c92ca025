//! Client for an optional remote generation service.
//!
//! The service receives the same request payload the local solver does and
//! may answer with an authoritative subject list. It is called once per
//! request with no retry; any failure leaves the local subject pool in place.

use crate::data::TimetableRequest;
use log::{debug, warn};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("gateway answered with status {0}")]
    Status(reqwest::StatusCode),
    #[error("gateway response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Default, Deserialize)]
struct GatewayReply {
    #[serde(default)]
    subjects: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct GenerationGateway {
    client: reqwest::Client,
    url: String,
}

impl GenerationGateway {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    /// One round-trip. `Ok(None)` when the reply carries no subjects.
    pub async fn request_subjects(
        &self,
        request: &TimetableRequest,
    ) -> Result<Option<Vec<String>>, GatewayError> {
        let response = self.client.post(&self.url).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status(status));
        }
        let body = response.bytes().await?;
        let reply: GatewayReply = serde_json::from_slice(&body)?;
        Ok(reply.subjects.filter(|subjects| !subjects.is_empty()))
    }

    /// Like [`Self::request_subjects`], with failures logged and dropped.
    pub async fn subjects_or_fallback(&self, request: &TimetableRequest) -> Option<Vec<String>> {
        match self.request_subjects(request).await {
            Ok(subjects) => {
                debug!("Gateway at {} returned {:?}", self.url, subjects);
                subjects
            }
            Err(e) => {
                warn!("Generation gateway unavailable, using local subjects: {e}");
                None
            }
        }
    }
}
