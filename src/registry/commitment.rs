//! On-chain commitment parsing.
//!
//! A participant's commitment is a JSON object mapping competition names to
//! endpoint references:
//!
//! ```json
//! {"clue_competition": "sn-abc123", "guess_competition": "sn-def456"}
//! ```
//!
//! Parsing happens once, at the registry boundary. Unknown competition keys
//! are ignored; known keys with a malformed value reject the whole blob.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::Competition;

/// Commitment parse failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitmentError {
    #[error("commitment is not valid JSON: {0}")]
    Json(String),

    #[error("commitment must be a JSON object")]
    NotAnObject,

    #[error("endpoint for {competition} must be a string")]
    NotAString { competition: Competition },

    #[error("invalid endpoint {value:?}: {reason}")]
    InvalidEndpoint { value: String, reason: &'static str },
}

const MAX_ENDPOINT_LEN: usize = 256;

/// Validated address of a participant's agent.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EndpointRef(String);

impl EndpointRef {
    /// Validate a raw endpoint string.
    ///
    /// ```
    /// use clue_arena::registry::EndpointRef;
    ///
    /// assert!(EndpointRef::parse("sn-abc123").is_ok());
    /// assert!(EndpointRef::parse("has space").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, CommitmentError> {
        let value = raw.trim();
        let invalid = |reason| CommitmentError::InvalidEndpoint {
            value: raw.to_string(),
            reason,
        };
        if value.is_empty() {
            return Err(invalid("empty"));
        }
        if value.len() > MAX_ENDPOINT_LEN {
            return Err(invalid("too long"));
        }
        let allowed = |c: char| c.is_ascii_alphanumeric() || "-_.:/".contains(c);
        if !value.chars().all(allowed) {
            return Err(invalid("unexpected character"));
        }
        Ok(Self(value.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EndpointRef {
    type Error = CommitmentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EndpointRef> for String {
    fn from(value: EndpointRef) -> Self {
        value.0
    }
}

impl std::fmt::Display for EndpointRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parsed commitment: one endpoint per competition.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitmentMap {
    endpoints: HashMap<Competition, EndpointRef>,
}

impl CommitmentMap {
    /// Parse a raw commitment blob.
    pub fn parse(raw: &str) -> Result<Self, CommitmentError> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| CommitmentError::Json(e.to_string()))?;
        let object = value.as_object().ok_or(CommitmentError::NotAnObject)?;

        let mut endpoints = HashMap::new();
        for competition in Competition::ALL {
            let Some(entry) = object.get(competition.as_str()) else {
                continue;
            };
            let raw = entry
                .as_str()
                .ok_or(CommitmentError::NotAString { competition })?;
            endpoints.insert(competition, EndpointRef::parse(raw)?);
        }
        Ok(Self { endpoints })
    }

    /// Endpoint committed for `competition`.
    #[must_use]
    pub fn endpoint(&self, competition: Competition) -> Option<&EndpointRef> {
        self.endpoints.get(&competition)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
