//! Environment variable-based credential loading
//!
//! The backend key is loaded from a `.env` file (if present) or the process
//! environment. A missing key is fatal and surfaces before any case is
//! processed.

use crate::traits::{ApiKeySource, RequiredKeyMissing};

/// Accepted environment variable names, in precedence order
const KEY_NAMES: &[&str] = &["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Real API key source using environment variables
pub struct EnvApiKeySource;

impl EnvApiKeySource {
    pub fn new() -> Self {
        Self
    }

    /// Load `.env` from the current or parent directories if present.
    /// Safe to call repeatedly; already-set variables take precedence.
    fn init_env() {
        let _ = dotenv::dotenv();
    }
}

impl Default for EnvApiKeySource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ApiKeySource for EnvApiKeySource {
    async fn get_api_key(&self) -> Result<String, RequiredKeyMissing> {
        Self::init_env();

        for &name in KEY_NAMES {
            if let Ok(value) = std::env::var(name) {
                if !value.trim().is_empty() {
                    return Ok(value);
                }
            }
        }

        Err(RequiredKeyMissing {
            key_name: KEY_NAMES.join(", "),
            message: format!(
                "Missing backend API key. Set one of these environment variables: {}.",
                KEY_NAMES.join(", ")
            ),
        })
    }
}
