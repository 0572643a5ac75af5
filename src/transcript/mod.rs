//! Spectator transcripts.
//!
//! Each game is mirrored into a "room" on an external presentation service:
//! created once, patched after every turn, deleted if the game is
//! abandoned. Publishing is best-effort; the runner logs failures and
//! carries on.

pub mod http;
pub mod payload;

pub use http::HttpTranscript;
pub use payload::{RoomCard, RoomChat, RoomClue, RoomParticipant, RoomPayload};

use async_trait::async_trait;
use thiserror::Error;

/// Transcript publishing failures.
#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("transcript request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("transcript service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transcript response missing room id")]
    MissingRoomId,
}

/// Destination for room documents.
#[async_trait]
pub trait TranscriptSink: Send + Sync {
    /// Create a room and return its id.
    async fn create_room(&self, payload: &RoomPayload) -> Result<String, TranscriptError>;

    async fn update_room(&self, room_id: &str, payload: &RoomPayload) -> Result<(), TranscriptError>;

    async fn delete_room(&self, room_id: &str) -> Result<(), TranscriptError>;
}

/// Sink that publishes nothing. Rooms get locally generated ids.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullTranscript;

#[async_trait]
impl TranscriptSink for NullTranscript {
    async fn create_room(&self, _payload: &RoomPayload) -> Result<String, TranscriptError> {
        Ok(uuid::Uuid::new_v4().to_string())
    }

    async fn update_room(&self, _room_id: &str, _payload: &RoomPayload) -> Result<(), TranscriptError> {
        Ok(())
    }

    async fn delete_room(&self, _room_id: &str) -> Result<(), TranscriptError> {
        Ok(())
    }
}
