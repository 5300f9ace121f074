//! HTTP adapter for the genie's FastAPI service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::{BackendError, GenieBackend, WishRequest};
use crate::domain::{DoorId, DoorRule, Hint, Narration, RulesResponse, WishVerdict};

/// File name and MIME type of the uploaded utterance
const WISH_FILE_NAME: &str = "wish.wav";
const WISH_MIME: &str = "audio/wav";

/// Genie service client over HTTP
pub struct HttpBackend {
    /// Base URL without trailing slash, e.g. `http://localhost:8000`
    base_url: String,
    /// HTTP client
    client: reqwest::Client,
}

impl HttpBackend {
    /// Create a new client with a per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| BackendError::Transport {
                endpoint: base_url.clone(),
                source,
            })?;

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a URL for an endpoint or a returned resource path.
    ///
    /// Absolute URLs (the service sometimes hands those out for audio) are
    /// used unchanged.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, BackendError> {
        let response = self
            .client
            .get(self.url(endpoint))
            .query(query)
            .send()
            .await
            .map_err(|source| transport(endpoint, source))?;

        decode(endpoint, response).await
    }
}

fn transport(endpoint: &str, source: reqwest::Error) -> BackendError {
    BackendError::Transport {
        endpoint: endpoint.to_string(),
        source,
    }
}

/// Check the status, then parse the body as JSON
async fn decode<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T, BackendError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|source| transport(endpoint, source))?;

    if !status.is_success() {
        return Err(BackendError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    debug!(endpoint, body = %body, "Service response");

    serde_json::from_str(&body).map_err(|source| BackendError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}

#[async_trait]
impl GenieBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self))]
    async fn get_rules(&self) -> Result<Vec<DoorRule>, BackendError> {
        let response: RulesResponse = self.get_json("/get_rules", &[]).await?;
        Ok(response.doors)
    }

    #[instrument(skip(self, request), fields(door = %request.door, bytes = request.audio.len()))]
    async fn process_wish(&self, request: WishRequest) -> Result<WishVerdict, BackendError> {
        const ENDPOINT: &str = "/process_wish";

        let file_part = Part::bytes(request.audio)
            .file_name(WISH_FILE_NAME)
            .mime_str(WISH_MIME)
            .map_err(|source| transport(ENDPOINT, source))?;

        let form = Form::new()
            .text("door_id", request.door.to_string())
            .text("door_rules", request.door_rules)
            .part("file", file_part);

        let response = self
            .client
            .post(self.url(ENDPOINT))
            .multipart(form)
            .send()
            .await
            .map_err(|source| transport(ENDPOINT, source))?;

        decode(ENDPOINT, response).await
    }

    #[instrument(skip(self))]
    async fn room_transition(&self, door: DoorId) -> Result<Narration, BackendError> {
        self.get_json("/room_transition", &[("door_id", door.to_string())])
            .await
    }

    #[instrument(skip(self))]
    async fn get_hint(&self, door: DoorId) -> Result<Hint, BackendError> {
        self.get_json("/get_hint", &[("door_id", door.to_string())])
            .await
    }

    #[instrument(skip(self))]
    async fn intro(&self) -> Result<Narration, BackendError> {
        self.get_json("/intro", &[]).await
    }

    #[instrument(skip(self))]
    async fn fetch_audio(&self, path: &str) -> Result<Vec<u8>, BackendError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|source| transport(path, source))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                endpoint: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| transport(path, source))?;
        Ok(bytes.to_vec())
    }
}
