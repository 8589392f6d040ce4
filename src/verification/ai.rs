// AI classifier: asks a language model to judge a distress message.
//
// The model is told to answer with a single JSON object, but nothing it
// returns is trusted: the text is unfenced, parsed into an untyped value,
// and every field is whitelisted before a ClassificationResult is built.
//
// Failure policy:
//   - upstream/transport failure -> heuristic scorer result
//   - unparseable answer         -> fixed "Needs Verification, 0.5" result
// `classify_strict` skips the transport fallback so synchronous callers
// can surface rate-limit and quota errors to the user.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use super::heuristic;
use super::llm::{LanguageModel, LlmError};
use super::traits::{ClassificationResult, Classifier, Verdict};
use crate::output::truncate_chars;

/// System instruction sent with every classification request.
pub const SYSTEM_PROMPT: &str =
    "You are a disaster verification AI. Always respond with valid JSON only.";

/// Reason used when the model's answer can't be parsed at all.
pub const UNPARSEABLE_REASON: &str =
    "Unable to analyze message automatically. Manual verification recommended.";

/// Reason used when the model's JSON has no usable `reason` field.
pub const MISSING_REASON: &str = "No explanation was provided by the automated analysis.";

/// Confidence used when the model's value is missing or not a number.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Build the user prompt for a message/location pair.
pub fn build_prompt(message: &str, location: &str) -> String {
    format!(
        "You are a disaster-response verification assistant.
Analyze the following distress message and estimate how likely it is to be genuine.

Message: {message}
Location: {location}

Evaluate based on:
1. Specific details (addresses, number of people, floor numbers, etc.)
2. Disaster relevance (flood, earthquake, fire, etc. keywords)
3. Emotional manipulation (excessive urgency, guilt-tripping)
4. Scam indicators (requests for money, suspicious links, vague details)

Respond ONLY in valid JSON with this exact structure:
{{
  \"status\": \"Likely Genuine\" or \"Needs Verification\" or \"High Scam Probability\",
  \"confidence\": a number between 0 and 1,
  \"reason\": \"brief explanation of your analysis\"
}}"
    )
}

/// Remove Markdown code fences the model may wrap its answer in.
pub fn strip_code_fences(text: &str) -> String {
    let cleaned = if text.contains("```json") {
        text.replace("```json", "").replace("```", "")
    } else if text.contains("```") {
        text.replace("```", "")
    } else {
        text.to_string()
    };
    cleaned.trim().to_string()
}

/// The result used when the model's answer can't be understood.
pub fn unparseable_result() -> ClassificationResult {
    ClassificationResult {
        status: Verdict::NeedsVerification,
        confidence: DEFAULT_CONFIDENCE,
        reason: UNPARSEABLE_REASON.to_string(),
    }
}

/// Turn raw model output into a validated result. Never fails.
pub fn parse_response(raw: &str) -> ClassificationResult {
    let cleaned = strip_code_fences(raw);
    match serde_json::from_str::<Value>(&cleaned) {
        Ok(value @ Value::Object(_)) => validate(&value),
        Ok(_) => {
            warn!("Model answer is JSON but not an object");
            unparseable_result()
        }
        Err(e) => {
            warn!(error = %e, preview = %truncate_chars(&cleaned, 80), "Failed to parse model answer");
            unparseable_result()
        }
    }
}

/// Whitelist the fields of a parsed answer.
fn validate(value: &Value) -> ClassificationResult {
    let status = value
        .get("status")
        .and_then(Value::as_str)
        .and_then(|s| Verdict::from_label(s.trim()))
        .unwrap_or(Verdict::NeedsVerification);

    let confidence = value
        .get("confidence")
        .and_then(coerce_number)
        .filter(|n| n.is_finite())
        .map(|n| n.clamp(0.0, 1.0))
        .unwrap_or(DEFAULT_CONFIDENCE);

    let reason = value
        .get("reason")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(MISSING_REASON)
        .to_string();

    ClassificationResult {
        status,
        confidence,
        reason,
    }
}

/// Numbers pass through; numeric strings are accepted; anything else is None.
fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Classifier that delegates judgment to a language model.
pub struct AiClassifier {
    model: Arc<dyn LanguageModel>,
}

impl AiClassifier {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Classify without the transport fallback. Parse problems are still
    /// absorbed; only upstream failures are returned.
    pub async fn classify_strict(
        &self,
        message: &str,
        location: &str,
    ) -> Result<ClassificationResult, LlmError> {
        let prompt = build_prompt(message, location);
        let raw = self.model.complete(SYSTEM_PROMPT, &prompt).await?;
        debug!(preview = %truncate_chars(&raw, 120), "Model answer received");
        Ok(parse_response(&raw))
    }
}

#[async_trait]
impl Classifier for AiClassifier {
    async fn classify(&self, message: &str, location: &str) -> ClassificationResult {
        match self.classify_strict(message, location).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "AI classification failed, using heuristic scorer");
                heuristic::score(message, location)
            }
        }
    }

    fn name(&self) -> &'static str {
        "ai"
    }
}
