//! HTTP implementation of [`SyncBackend`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;

use super::record::{PushPayload, SyncPage};
use super::sync::{SyncBackend, SyncError, SyncResult};
use crate::core::{Competition, SyncConfig};
use crate::http::{join_url, sign_request, RequestSigner};

#[derive(Deserialize)]
struct ActiveMiners {
    #[serde(default)]
    data: Vec<String>,
}

/// Backend ledger reached over REST.
///
/// - `PATCH {base}/scores/{room_id}`
/// - `GET {base}/scores/sync?since_id=&limit=&competition=`
/// - `GET {base}/miners/active?competition=`
pub struct HttpSyncBackend {
    client: Client,
    base_url: String,
    signer: Option<Arc<dyn RequestSigner>>,
}

impl HttpSyncBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> SyncResult<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.into(),
            signer: None,
        })
    }

    pub fn from_config(config: &SyncConfig) -> SyncResult<Self> {
        Self::new(config.backend_url.clone(), config.request_timeout())
    }

    #[must_use]
    pub fn with_signer(mut self, signer: Arc<dyn RequestSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    async fn check(response: Response) -> SyncResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SyncError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl SyncBackend for HttpSyncBackend {
    async fn push(&self, room_id: &str, payload: &PushPayload) -> SyncResult<()> {
        let url = join_url(&self.base_url, &format!("scores/{room_id}"));
        let request = sign_request(self.client.patch(url).json(payload), self.signer.as_deref());
        Self::check(request.send().await?).await?;
        Ok(())
    }

    async fn fetch_page(&self, competition: Competition, since_id: i64, limit: u32) -> SyncResult<SyncPage> {
        let url = join_url(&self.base_url, "scores/sync");
        let request = self.client.get(url).query(&[
            ("since_id", since_id.to_string()),
            ("limit", limit.to_string()),
            ("competition", competition.as_str().to_string()),
        ]);
        let response = Self::check(sign_request(request, self.signer.as_deref()).send().await?).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| SyncError::Malformed(e.to_string()))
    }

    async fn active_miners(&self, competition: Competition) -> SyncResult<Vec<String>> {
        let url = join_url(&self.base_url, "miners/active");
        let request = self
            .client
            .get(url)
            .query(&[("competition", competition.as_str())]);
        let response = Self::check(sign_request(request, self.signer.as_deref()).send().await?).await?;
        let body = response.text().await?;
        let active: ActiveMiners =
            serde_json::from_str(&body).map_err(|e| SyncError::Malformed(e.to_string()))?;
        Ok(active.data)
    }
}
