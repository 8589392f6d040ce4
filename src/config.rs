use std::env;

use anyhow::Result;

use crate::verification::llm::{DEFAULT_GATEWAY_URL, DEFAULT_MODEL};

/// Default model for the help assistant.
pub const DEFAULT_CHAT_MODEL: &str = "google/gemini-3-flash-preview";

/// Which classifier the submission pipeline uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierBackend {
    /// Keyword/pattern scorer (default): no API key, no network
    Heuristic,
    /// Language-model classifier: requires SAHAYAK_AI_API_KEY, falls back
    /// to the heuristic when the gateway fails
    Ai,
}

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file
/// is loaded automatically at startup via dotenvy.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    /// Which classifier to use (default: Heuristic)
    pub classifier_backend: ClassifierBackend,
    /// Bearer token for the model gateway
    pub ai_api_key: String,
    /// Chat-completions endpoint
    pub ai_url: String,
    /// Model used for classification
    pub ai_model: String,
    /// Model used by the help assistant
    pub chat_model: String,
    /// HTTP timeout for model calls, in seconds
    pub ai_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a default except the API key, which is only checked
    /// when the AI backend is actually used.
    pub fn load() -> Result<Self> {
        let classifier_backend = match env::var("SAHAYAK_CLASSIFIER").as_deref() {
            Ok("ai") => ClassifierBackend::Ai,
            Ok("heuristic") | Err(_) => ClassifierBackend::Heuristic,
            Ok(other) => anyhow::bail!(
                "Unknown SAHAYAK_CLASSIFIER value '{other}'. Use 'heuristic' or 'ai'."
            ),
        };

        let ai_timeout_secs = match env::var("SAHAYAK_AI_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| {
                anyhow::anyhow!("SAHAYAK_AI_TIMEOUT_SECS must be a whole number of seconds, got '{raw}'")
            })?,
            Err(_) => 30,
        };

        Ok(Self {
            db_path: env::var("SAHAYAK_DB_PATH").unwrap_or_else(|_| "./sahayak.db".to_string()),
            classifier_backend,
            ai_api_key: env::var("SAHAYAK_AI_API_KEY").unwrap_or_default(),
            ai_url: env::var("SAHAYAK_AI_URL").unwrap_or_else(|_| DEFAULT_GATEWAY_URL.to_string()),
            ai_model: env::var("SAHAYAK_AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            chat_model: env::var("SAHAYAK_CHAT_MODEL")
                .unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string()),
            ai_timeout_secs,
        })
    }

    /// Check that the model gateway key is configured.
    /// Call this before any operation that talks to the language model.
    pub fn require_ai(&self) -> Result<()> {
        if self.ai_api_key.is_empty() {
            anyhow::bail!(
                "SAHAYAK_AI_API_KEY not set. Add it to your .env file,\n\
                 or set SAHAYAK_CLASSIFIER=heuristic to classify without a model."
            );
        }
        Ok(())
    }

    /// Validate that the chosen classifier backend has what it needs.
    pub fn require_classifier(&self) -> Result<()> {
        match self.classifier_backend {
            ClassifierBackend::Heuristic => Ok(()),
            ClassifierBackend::Ai => self.require_ai(),
        }
    }
}
