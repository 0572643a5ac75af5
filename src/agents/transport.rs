//! Remote and local agent interfaces.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::game::{TurnResponse, TurnView};
use crate::registry::EndpointRef;

/// Failures reaching a remote agent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("agent returned status {0}")]
    Status(u16),

    #[error("malformed agent response: {0}")]
    Protocol(String),
}

/// Reaches participant agents.
#[async_trait]
pub trait AgentTransport: Send + Sync {
    /// Send a turn view. `Ok(None)` means the agent answered without a response.
    async fn query(
        &self,
        endpoint: &EndpointRef,
        view: &TurnView,
        timeout: Duration,
    ) -> Result<Option<TurnResponse>, TransportError>;

    /// Lightweight health check. `Ok(false)` means reachable but unhealthy.
    async fn ping(&self, endpoint: &EndpointRef, timeout: Duration) -> Result<bool, TransportError>;
}

/// Fallback player for local seats.
#[async_trait]
pub trait LocalAgent: Send + Sync {
    async fn respond(&self, view: &TurnView) -> Option<TurnResponse>;
}
