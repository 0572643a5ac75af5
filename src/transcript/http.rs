//! Transcript sink over the presentation service's REST API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::debug;

use super::{RoomPayload, TranscriptError, TranscriptSink};
use crate::http::{join_url, sign_request, RequestSigner};

#[derive(Deserialize)]
struct CreatedRoom {
    data: CreatedRoomData,
}

#[derive(Deserialize)]
struct CreatedRoomData {
    id: String,
}

/// Publishes rooms to `{base}/rooms`.
pub struct HttpTranscript {
    client: Client,
    base_url: String,
    signer: Option<Arc<dyn RequestSigner>>,
}

impl HttpTranscript {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TranscriptError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            signer: None,
        })
    }

    #[must_use]
    pub fn with_signer(mut self, signer: Arc<dyn RequestSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    async fn check(response: Response) -> Result<Response, TranscriptError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(TranscriptError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl TranscriptSink for HttpTranscript {
    async fn create_room(&self, payload: &RoomPayload) -> Result<String, TranscriptError> {
        let url = join_url(&self.base_url, "rooms/create");
        let request = sign_request(self.client.post(url).json(payload), self.signer.as_deref());
        let response = Self::check(request.send().await?).await?;
        let created: CreatedRoom = response
            .json()
            .await
            .map_err(|_| TranscriptError::MissingRoomId)?;
        debug!(room_id = %created.data.id, "room created");
        Ok(created.data.id)
    }

    async fn update_room(&self, room_id: &str, payload: &RoomPayload) -> Result<(), TranscriptError> {
        let url = join_url(&self.base_url, &format!("rooms/{room_id}"));
        let request = sign_request(self.client.patch(url).json(payload), self.signer.as_deref());
        Self::check(request.send().await?).await?;
        Ok(())
    }

    async fn delete_room(&self, room_id: &str) -> Result<(), TranscriptError> {
        let url = join_url(&self.base_url, &format!("rooms/{room_id}"));
        let request = sign_request(self.client.delete(url), self.signer.as_deref());
        Self::check(request.send().await?).await?;
        Ok(())
    }
}
