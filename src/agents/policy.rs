//! Turn query policy.
//!
//! Each remote turn gets up to `attempts` tries with a fixed timeout per
//! try. Transport errors and timeouts are retried. An attempt that comes
//! back empty faster than `saturation` ends the query: the agent is up but
//! has nothing to say, so another try would only cost time.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use super::transport::AgentTransport;
use crate::core::GameConfig;
use crate::game::{TurnResponse, TurnView};
use crate::registry::EndpointRef;

/// Result of querying one seat.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryOutcome {
    pub response: Option<TurnResponse>,
    /// Latency of the final attempt.
    pub elapsed: Duration,
    pub attempts: u32,
    /// Every attempt ran into the timeout.
    pub timed_out: bool,
}

/// Attempts, timeout and saturation cut-off for remote turns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueryPolicy {
    pub attempts: u32,
    pub timeout: Duration,
    pub saturation: Duration,
}

impl Default for QueryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            timeout: Duration::from_secs(30),
            saturation: Duration::from_secs(3),
        }
    }
}

impl QueryPolicy {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            attempts: config.turn_attempts.max(1),
            timeout: config.turn_timeout(),
            saturation: config.saturation(),
        }
    }

    /// Query `endpoint` until a response arrives or the policy gives up.
    pub async fn query<T: AgentTransport + ?Sized>(
        &self,
        transport: &T,
        endpoint: &EndpointRef,
        view: &TurnView,
    ) -> QueryOutcome {
        let mut elapsed = Duration::ZERO;
        let mut timeouts = 0;
        let mut attempts = 0;

        while attempts < self.attempts {
            attempts += 1;
            let start = Instant::now();
            let result =
                tokio::time::timeout(self.timeout, transport.query(endpoint, view, self.timeout))
                    .await;
            elapsed = start.elapsed();

            match result {
                Ok(Ok(Some(response))) => {
                    debug!(%endpoint, attempts, elapsed_ms = elapsed.as_millis() as u64, "agent responded");
                    return QueryOutcome {
                        response: Some(response),
                        elapsed,
                        attempts,
                        timed_out: false,
                    };
                }
                Ok(Ok(None)) if elapsed < self.saturation => {
                    debug!(%endpoint, attempts, "empty response under saturation threshold, not retrying");
                    break;
                }
                Ok(Ok(None)) => {
                    debug!(%endpoint, attempts, "empty response");
                }
                Ok(Err(err)) => {
                    warn!(%endpoint, attempt = attempts, error = %err, "agent query failed");
                }
                Err(_) => {
                    timeouts += 1;
                    warn!(%endpoint, attempt = attempts, timeout_secs = self.timeout.as_secs(), "agent query timed out");
                }
            }
        }

        QueryOutcome {
            response: None,
            elapsed,
            attempts,
            timed_out: timeouts == attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::TransportError;
    use crate::board::{Board, WordList};
    use crate::core::{Competition, GameRng, SeatMap};
    use crate::game::{GameState, Occupant};
    use async_trait::async_trait;
    use std::sync::Mutex;

    enum Step {
        Respond(Duration, Option<TurnResponse>),
        Fail,
        Hang,
    }

    struct Scripted {
        steps: Mutex<Vec<Step>>,
        calls: Mutex<u32>,
    }

    impl Scripted {
        fn new(mut steps: Vec<Step>) -> Self {
            steps.reverse();
            Self {
                steps: Mutex::new(steps),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl AgentTransport for Scripted {
        async fn query(
            &self,
            _endpoint: &EndpointRef,
            _view: &TurnView,
            _timeout: Duration,
        ) -> Result<Option<TurnResponse>, TransportError> {
            *self.calls.lock().unwrap() += 1;
            let step = self.steps.lock().unwrap().pop();
            match step {
                Some(Step::Respond(delay, response)) => {
                    tokio::time::sleep(delay).await;
                    Ok(response)
                }
                Some(Step::Fail) => Err(TransportError::Connection("refused".into())),
                Some(Step::Hang) | None => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(None)
                }
            }
        }

        async fn ping(&self, _endpoint: &EndpointRef, _timeout: Duration) -> Result<bool, TransportError> {
            Ok(true)
        }
    }

    fn view() -> TurnView {
        let board = Board::generate(&WordList::default(), &mut GameRng::new(2)).unwrap();
        let state = GameState::new(
            Competition::ClueCompetition,
            SeatMap::with_value(Occupant::local("v")),
            board,
            0,
        );
        TurnView::for_current(&state)
    }

    fn endpoint() -> EndpointRef {
        EndpointRef::parse("agent-1").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_response_wins() {
        let t = Scripted::new(vec![Step::Respond(
            Duration::from_secs(1),
            Some(TurnResponse::clue("sea", 1)),
        )]);
        let out = QueryPolicy::default().query(&t, &endpoint(), &view()).await;

        assert!(out.response.is_some());
        assert_eq!(out.attempts, 1);
        assert_eq!(out.elapsed, Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_empty_response_stops_retrying() {
        let t = Scripted::new(vec![Step::Respond(Duration::from_secs(1), None)]);
        let out = QueryPolicy::default().query(&t, &endpoint(), &view()).await;

        assert!(out.response.is_none());
        assert_eq!(t.calls(), 1);
        assert!(!out.timed_out);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_empty_response_retries() {
        let t = Scripted::new(vec![
            Step::Respond(Duration::from_secs(5), None),
            Step::Respond(Duration::from_secs(1), Some(TurnResponse::guesses(["a"]))),
        ]);
        let out = QueryPolicy::default().query(&t, &endpoint(), &view()).await;

        assert!(out.response.is_some());
        assert_eq!(out.attempts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_and_timeouts_retried() {
        let t = Scripted::new(vec![
            Step::Fail,
            Step::Hang,
            Step::Respond(Duration::ZERO, Some(TurnResponse::clue("sea", 2))),
        ]);
        let out = QueryPolicy::default().query(&t, &endpoint(), &view()).await;

        assert!(out.response.is_some());
        assert_eq!(out.attempts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_timeouts() {
        let t = Scripted::new(vec![Step::Hang, Step::Hang, Step::Hang]);
        let out = QueryPolicy::default().query(&t, &endpoint(), &view()).await;

        assert!(out.response.is_none());
        assert!(out.timed_out);
        assert_eq!(t.calls(), 3);
    }
}
