// Classifier trait: the swap-ready abstraction.
//
// Both the heuristic scorer and the language-model classifier produce the
// same ClassificationResult, so the submission pipeline never needs to know
// which one it is talking to.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A terminal classification. `Pending` is deliberately absent: a
/// classifier can only ever hand back one of these three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "Likely Genuine")]
    LikelyGenuine,
    #[serde(rename = "Needs Verification")]
    NeedsVerification,
    #[serde(rename = "High Scam Probability")]
    HighScamProbability,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::LikelyGenuine => "Likely Genuine",
            Verdict::NeedsVerification => "Needs Verification",
            Verdict::HighScamProbability => "High Scam Probability",
        }
    }

    /// Exact-match a label. Returns None for anything else.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Likely Genuine" => Some(Verdict::LikelyGenuine),
            "Needs Verification" => Some(Verdict::NeedsVerification),
            "High Scam Probability" => Some(Verdict::HighScamProbability),
            _ => None,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The outcome of one classification attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub status: Verdict,
    /// 0.0 to 1.0. Not a calibrated probability.
    pub confidence: f64,
    pub reason: String,
}

/// Trait for classifying a distress message.
///
/// `classify` is infallible. Implementations that talk to the network
/// degrade to a safe result instead of returning an error.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify a message and the location it was reported from.
    async fn classify(&self, message: &str, location: &str) -> ClassificationResult;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}
