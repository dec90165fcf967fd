//! Itinerary generation with a bounded validate-and-retry loop.
//!
//! A completion that fails to parse or validate is retried up to
//! `max_attempts` times in total. A failed request to the completion
//! endpoint ends generation immediately.

pub mod prompt;

use std::sync::Arc;

use thiserror::Error;

use crate::itinerary::{ItineraryError, ItineraryRequest, TripDayDraft, parse_completion};
use crate::llm::{CompletionClient, CompletionError};

pub use prompt::{Preprompts, build_messages};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    InvalidRequest(ItineraryError),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("no valid itinerary after {attempts} attempts: {last_error}")]
    Exhausted {
        attempts: u32,
        last_error: ItineraryError,
    },
}

/// Produces validated itineraries from a [`CompletionClient`].
#[derive(Clone)]
pub struct TripGenerator {
    client: Arc<dyn CompletionClient>,
    preprompts: Preprompts,
    max_attempts: u32,
}

impl TripGenerator {
    pub fn new(client: Arc<dyn CompletionClient>, preprompts: Preprompts) -> Self {
        Self {
            client,
            preprompts,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Set the total number of attempts. Values below 1 are treated as 1.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub async fn generate(
        &self,
        request: &ItineraryRequest,
    ) -> Result<Vec<TripDayDraft>, GenerateError> {
        request.validate().map_err(GenerateError::InvalidRequest)?;

        let messages = build_messages(&self.preprompts, request);
        let expected_days = request.number_of_days as usize;
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            let content = self.client.complete(&messages).await.map_err(|e| {
                tracing::error!(attempt, error = %e, "completion request failed");
                GenerateError::Completion(e)
            })?;

            match parse_completion(&content, expected_days) {
                Ok(days) => {
                    tracing::info!(
                        attempt,
                        days = days.len(),
                        country = %request.country,
                        city = %request.city,
                        "generated itinerary"
                    );
                    return Ok(days);
                }
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "generated itinerary was invalid"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(GenerateError::Exhausted {
            attempts: self.max_attempts,
            last_error: last_error.unwrap_or_else(|| {
                ItineraryError::UnexpectedShape("no completion attempted".to_string())
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::llm::ChatMessage;

    /// Replays canned results and records what it was sent.
    struct ScriptedClient {
        replies: Mutex<VecDeque<Result<String, CompletionError>>>,
        calls: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedClient {
        fn new(replies: Vec<Result<String, CompletionError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String, CompletionError> {
            self.calls.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(CompletionError::Empty))
        }
    }

    fn valid_days(n: usize) -> String {
        let event = r#"{"title":"Old Town","description":"Guided walk","address":"Main Square 1","country":"Poland","city":"Krakow","tickets":"Free"}"#;
        let day = format!(r#"{{"events":[{event},{event},{event}]}}"#);
        format!(r#"{{"data":[{}]}}"#, vec![day; n].join(","))
    }

    fn generator(client: Arc<ScriptedClient>) -> TripGenerator {
        TripGenerator::new(client, Preprompts::default())
    }

    #[tokio::test]
    async fn first_valid_answer_wins() {
        let client = ScriptedClient::new(vec![Ok(valid_days(2))]);
        let days = generator(client.clone())
            .generate(&ItineraryRequest::new(2, "Poland", "Krakow"))
            .await
            .unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(client.call_count(), 1);

        let sent = &client.calls.lock().unwrap()[0];
        assert_eq!(sent.len(), 4);
        assert!(sent[3].content.contains("\"Krakow\""));
    }

    #[tokio::test]
    async fn retries_after_invalid_output() {
        let client = ScriptedClient::new(vec![
            Ok("not json".to_string()),
            Ok(valid_days(3)),
            Ok(valid_days(2)),
        ]);
        let days = generator(client.clone())
            .generate(&ItineraryRequest::new(2, "Poland", "Krakow"))
            .await
            .unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let client = ScriptedClient::new(vec![
            Ok("[]".to_string()),
            Ok("[]".to_string()),
            Ok("[]".to_string()),
            Ok(valid_days(1)),
        ]);
        let err = generator(client.clone())
            .generate(&ItineraryRequest::new(1, "Poland", "Krakow"))
            .await
            .unwrap_err();
        match err {
            GenerateError::Exhausted {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(
                    last_error,
                    ItineraryError::DayCount {
                        expected: 1,
                        actual: 0
                    }
                );
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn completion_failure_is_not_retried() {
        let client = ScriptedClient::new(vec![
            Err(CompletionError::Status {
                status: 500,
                body: "boom".to_string(),
            }),
            Ok(valid_days(1)),
        ]);
        let err = generator(client.clone())
            .generate(&ItineraryRequest::new(1, "Poland", "Krakow"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GenerateError::Completion(CompletionError::Status { status: 500, .. })
        ));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn invalid_request_never_calls_client() {
        let client = ScriptedClient::new(vec![Ok(valid_days(1))]);
        let err = generator(client.clone())
            .generate(&ItineraryRequest::new(0, "Poland", "Krakow"))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::InvalidRequest(_)));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn max_attempts_floor_is_one() {
        let client = ScriptedClient::new(vec![Ok("{}".to_string()), Ok(valid_days(1))]);
        let generator = generator(client.clone()).with_max_attempts(0);
        assert_eq!(generator.max_attempts(), 1);
        let err = generator
            .generate(&ItineraryRequest::new(1, "Poland", "Krakow"))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::Exhausted { attempts: 1, .. }));
        assert_eq!(client.call_count(), 1);
    }
}
