//! Reliable generation client with retry, backoff and deterministic fallback
//!
//! Wraps a `GenerationBackend` so that callers never see an error: retryable
//! failures are retried with exponential backoff, terminal failures degrade
//! to fixed fallback text per category. Attempt counters and delays are local
//! to each call; the client shares only read-only configuration between
//! concurrent invocations.

use std::sync::Arc;

use shared::{ApiFailure, GenerationConfig, ResultStatus, RetryConfig};
use tracing::{debug, warn};

use crate::traits::GenerationBackend;

/// Fallback when retries are exhausted on rate limiting
pub const RATE_LIMIT_FALLBACK: &str =
    "Unable to generate report due to rate limiting. Please try again later.";

/// Fallback when retries are exhausted on connectivity failures
pub const CONNECTIVITY_FALLBACK: &str =
    "Unable to generate report after multiple attempts. Please try again later.";

/// Fallback when the backend blocks the request on content policy
pub const CONTENT_POLICY_FALLBACK: &str =
    "No significant abnormality detected based on the provided findings.";

/// Fallback for any other terminal failure
pub const GENERIC_FALLBACK: &str = "Unable to process findings. Please review input data.";

/// Result of a client call; the client itself never fails
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub text: String,
    pub status: ResultStatus,
    /// Backend attempts consumed, including the final one
    pub attempts: u32,
}

impl GenerationOutcome {
    pub fn is_fallback(&self) -> bool {
        self.status == ResultStatus::Fallback
    }
}

/// Generation client with retry and fallback semantics
pub struct GenerationClient<B> {
    backend: Arc<B>,
    generation: GenerationConfig,
    retry: RetryConfig,
}

impl<B> Clone for GenerationClient<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            generation: self.generation.clone(),
            retry: self.retry.clone(),
        }
    }
}

impl<B: GenerationBackend> GenerationClient<B> {
    pub fn new(backend: Arc<B>, generation: GenerationConfig, retry: RetryConfig) -> Self {
        Self {
            backend,
            generation,
            retry,
        }
    }

    /// One reliable generation call
    pub async fn generate(&self, instructions: &str, content: &str) -> GenerationOutcome {
        self.run(instructions, content, false).await
    }

    /// One reliable schema-constrained call returning JSON text
    pub async fn generate_structured(&self, instructions: &str, content: &str) -> GenerationOutcome {
        self.run(instructions, content, true).await
    }

    async fn run(&self, instructions: &str, content: &str, structured: bool) -> GenerationOutcome {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;

            let call = async {
                if structured {
                    self.backend
                        .generate_structured(instructions, content, &self.generation)
                        .await
                } else {
                    self.backend
                        .generate(instructions, content, &self.generation)
                        .await
                }
            };

            // Every attempt runs under the request deadline; a stalled call
            // resolves as a retryable connectivity failure instead of
            // pinning its task forever.
            let result = match tokio::time::timeout(self.generation.request_timeout, call).await {
                Ok(result) => result,
                Err(_) => Err(ApiFailure::Connectivity(format!(
                    "request deadline of {:?} elapsed",
                    self.generation.request_timeout
                ))),
            };

            match result {
                Ok(text) => {
                    debug!(attempts = attempt, "generation call succeeded");
                    return GenerationOutcome {
                        text,
                        status: ResultStatus::Success,
                        attempts: attempt,
                    };
                }
                Err(failure) if failure.is_retryable() => {
                    if attempt >= self.retry.max_attempts {
                        warn!(
                            attempts = attempt,
                            "generation failed after exhausting retries: {failure}"
                        );
                        return self.exhausted(&failure, attempt);
                    }
                    let delay = self.backoff_delay(attempt - 1);
                    warn!(
                        "⚠️ {failure}; retrying in {delay:?} (attempt {attempt}/{})",
                        self.retry.max_attempts
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(ApiFailure::ContentBlocked) => {
                    // Not retried: the same input will be blocked again
                    debug!(attempts = attempt, "generation blocked by content policy");
                    return GenerationOutcome {
                        text: CONTENT_POLICY_FALLBACK.to_string(),
                        status: ResultStatus::Fallback,
                        attempts: attempt,
                    };
                }
                Err(failure) => {
                    warn!(attempts = attempt, "generation failed: {failure}");
                    return GenerationOutcome {
                        text: GENERIC_FALLBACK.to_string(),
                        status: ResultStatus::Fallback,
                        attempts: attempt,
                    };
                }
            }
        }
    }

    fn exhausted(&self, failure: &ApiFailure, attempts: u32) -> GenerationOutcome {
        let text = match failure {
            ApiFailure::RateLimited => RATE_LIMIT_FALLBACK,
            ApiFailure::Connectivity(_) => CONNECTIVITY_FALLBACK,
            _ => GENERIC_FALLBACK,
        };
        GenerationOutcome {
            text: text.to_string(),
            status: ResultStatus::Fallback,
            attempts,
        }
    }

    fn backoff_delay(&self, attempt: u32) -> std::time::Duration {
        let base = self.retry.delay_for_attempt(attempt);
        if self.retry.jitter {
            use rand::Rng;
            base + base.mul_f64(rand::thread_rng().gen::<f64>() * 0.1)
        } else {
            base
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Backend replaying a fixed script of responses
    struct ScriptedResponses {
        script: Mutex<VecDeque<Result<String, ApiFailure>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedResponses {
        fn new(script: Vec<Result<String, ApiFailure>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait::async_trait]
    impl GenerationBackend for ScriptedResponses {
        async fn generate(
            &self,
            _instructions: &str,
            _content: &str,
            _config: &GenerationConfig,
        ) -> Result<String, ApiFailure> {
            *self.calls.lock().unwrap() += 1;
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ApiFailure::Other("script exhausted".to_string())))
        }

        async fn generate_structured(
            &self,
            instructions: &str,
            content: &str,
            config: &GenerationConfig,
        ) -> Result<String, ApiFailure> {
            self.generate(instructions, content, config).await
        }
    }

    fn client_over(backend: ScriptedResponses) -> GenerationClient<ScriptedResponses> {
        GenerationClient::new(
            Arc::new(backend),
            GenerationConfig::default(),
            RetryConfig::default(),
        )
    }

    #[tokio::test]
    async fn success_on_first_attempt() {
        let client = client_over(ScriptedResponses::new(vec![Ok("report text".to_string())]));
        let outcome = client.generate("i", "c").await;
        assert_eq!(outcome.text, "report text");
        assert_eq!(outcome.status, ResultStatus::Success);
        assert_eq!(outcome.attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_rate_limit_with_doubling_backoff() {
        let backend = ScriptedResponses::new(vec![
            Err(ApiFailure::RateLimited),
            Err(ApiFailure::RateLimited),
            Ok("recovered".to_string()),
        ]);
        let client = GenerationClient::new(
            Arc::new(backend),
            GenerationConfig::default(),
            RetryConfig::default(),
        );

        let start = tokio::time::Instant::now();
        let outcome = client.generate("i", "c").await;

        assert_eq!(outcome.text, "recovered");
        assert_eq!(outcome.attempts, 3);
        // backoff after the first failure is 1s, after the second 2s
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_exhaustion_returns_fallback() {
        let backend = ScriptedResponses::new(vec![
            Err(ApiFailure::RateLimited),
            Err(ApiFailure::RateLimited),
            Err(ApiFailure::RateLimited),
            Err(ApiFailure::RateLimited),
            Err(ApiFailure::RateLimited),
        ]);
        let client = GenerationClient::new(
            Arc::new(backend),
            GenerationConfig::default(),
            RetryConfig::default(),
        );

        let outcome = client.generate("i", "c").await;
        assert_eq!(outcome.text, RATE_LIMIT_FALLBACK);
        assert_eq!(outcome.status, ResultStatus::Fallback);
        assert_eq!(outcome.attempts, 5);
        assert_eq!(client.backend.calls(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn connectivity_exhaustion_uses_distinct_fallback() {
        let script = (0..5)
            .map(|_| Err(ApiFailure::Connectivity("reset".to_string())))
            .collect();
        let client = client_over(ScriptedResponses::new(script));
        let outcome = client.generate("i", "c").await;
        assert_eq!(outcome.text, CONNECTIVITY_FALLBACK);
        assert_eq!(outcome.attempts, 5);
    }

    #[tokio::test]
    async fn content_block_short_circuits() {
        let backend = ScriptedResponses::new(vec![Err(ApiFailure::ContentBlocked)]);
        let client = GenerationClient::new(
            Arc::new(backend),
            GenerationConfig::default(),
            RetryConfig::default(),
        );
        let outcome = client.generate("i", "c").await;
        assert_eq!(outcome.text, CONTENT_POLICY_FALLBACK);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(client.backend.calls(), 1);
    }

    #[tokio::test]
    async fn malformed_output_is_terminal_after_one_attempt() {
        let backend = ScriptedResponses::new(vec![Err(ApiFailure::MalformedOutput(
            "no text in payload".to_string(),
        ))]);
        let client = GenerationClient::new(
            Arc::new(backend),
            GenerationConfig::default(),
            RetryConfig::default(),
        );
        let outcome = client.generate("i", "c").await;
        assert_eq!(outcome.text, GENERIC_FALLBACK);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(client.backend.calls(), 1);
    }

    /// A backend that never resolves; the request deadline must convert the
    /// stall into a retryable connectivity failure.
    struct StalledBackend;

    #[async_trait::async_trait]
    impl GenerationBackend for StalledBackend {
        async fn generate(
            &self,
            _instructions: &str,
            _content: &str,
            _config: &GenerationConfig,
        ) -> Result<String, ApiFailure> {
            std::future::pending().await
        }

        async fn generate_structured(
            &self,
            instructions: &str,
            content: &str,
            config: &GenerationConfig,
        ) -> Result<String, ApiFailure> {
            self.generate(instructions, content, config).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_backend_hits_deadline_and_degrades() {
        let generation = GenerationConfig {
            request_timeout: Duration::from_secs(5),
            ..GenerationConfig::default()
        };
        let retry = RetryConfig {
            max_attempts: 2,
            ..RetryConfig::default()
        };
        let client = GenerationClient::new(Arc::new(StalledBackend), generation, retry);

        let start = tokio::time::Instant::now();
        let outcome = client.generate("i", "c").await;

        assert_eq!(outcome.text, CONNECTIVITY_FALLBACK);
        assert_eq!(outcome.attempts, 2);
        // two 5s deadlines plus the 1s backoff between them
        assert_eq!(start.elapsed(), Duration::from_secs(11));
    }
}
