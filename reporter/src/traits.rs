//! Trait definitions with mockall annotations for testing
//!
//! These traits are the seams between the pipeline and its external
//! collaborators (generation backend, credentials, persistence). They are
//! used for dependency injection and enable testing the whole pipeline
//! against scripted or mocked backends.

use std::path::PathBuf;

use shared::{ApiFailure, GenerationConfig};

use crate::error::ReporterResult;

/// Error when the required backend credential is missing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredKeyMissing {
    pub key_name: String,
    pub message: String,
}

/// Text-generation backend abstraction
///
/// One implementation call corresponds to one request against the remote
/// service; retry, backoff and fallback live above this seam in
/// `GenerationClient`. Implementations must honor the sampling parameters in
/// `GenerationConfig` (in particular deterministic temperature-0 sampling).
#[mockall::automock]
#[async_trait::async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Send one generation request and return the produced text
    async fn generate(
        &self,
        instructions: &str,
        content: &str,
        config: &GenerationConfig,
    ) -> Result<String, ApiFailure>;

    /// Schema-constrained variant returning a JSON object as text
    ///
    /// Used only by segmentation. Backends without structured-output support
    /// may serve this through plain generation; callers must still parse
    /// defensively.
    async fn generate_structured(
        &self,
        instructions: &str,
        content: &str,
        config: &GenerationConfig,
    ) -> Result<String, ApiFailure>;
}

/// Credential source abstraction
///
/// The only pre-flight fatal in the system: a missing key stops the run
/// before any case is processed.
#[mockall::automock]
#[async_trait::async_trait]
pub trait ApiKeySource: Send + Sync {
    /// Retrieve the backend API key with validation
    async fn get_api_key(&self) -> Result<String, RequiredKeyMissing>;
}

/// Persistence abstraction for rendered report artifacts
#[mockall::automock]
#[async_trait::async_trait]
pub trait ReportStore: Send + Sync {
    /// Write the combined batch artifact for a date, returning its path
    async fn write_batch(&self, date: &str, content: &str) -> ReporterResult<PathBuf>;

    /// Write a single case artifact, returning its path
    async fn write_case(&self, label: &str, content: &str) -> ReporterResult<PathBuf>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Mock generation works through the trait object seam
    #[tokio::test]
    async fn mock_traits_instantiate() {
        let mut backend = MockGenerationBackend::new();
        backend
            .expect_generate()
            .returning(|_, _, _| Ok("text".to_string()));

        let config = GenerationConfig::default();
        let text = backend.generate("instructions", "content", &config).await.unwrap();
        assert_eq!(text, "text");

        let _keys = MockApiKeySource::new();
        let _store = MockReportStore::new();
    }
}
