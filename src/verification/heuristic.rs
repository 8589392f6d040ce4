// Heuristic scorer: keyword and pattern signals, no network.
//
// Starts from a neutral 0.5 and nudges the score up for signals that show
// up in actionable reports (disaster vocabulary, concrete addresses, head
// counts, reachable contacts) and down for scam and pressure signals. The
// result is clamped away from 0 and 1: a keyword count never justifies
// absolute certainty.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex_lite::Regex;

use super::lexicon::{count_matches, DISASTER_TERMS, MANIPULATION_PHRASES, SCAM_TERMS};
use super::traits::{ClassificationResult, Classifier, Verdict};

/// Scores at or above this are Likely Genuine.
pub const GENUINE_THRESHOLD: f64 = 0.65;
/// Scores below this are High Scam Probability.
pub const SCAM_THRESHOLD: f64 = 0.35;
/// Lowest confidence the heuristic will report.
pub const MIN_CONFIDENCE: f64 = 0.05;
/// Highest confidence the heuristic will report.
pub const MAX_CONFIDENCE: f64 = 0.98;

/// Used when no signal fired.
pub const NO_SIGNAL_REASON: &str = "Standard analysis completed without notable indicators.";

static SPECIFIC_LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\d+|street|road|avenue|block|floor|building|near|opposite|behind")
        .expect("static regex")
});

static PEOPLE_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\d+\s*(people|persons|family|members|children|kids|adults)")
        .expect("static regex")
});

static CONTACT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\+?\d{10,}|[\w.-]+@[\w.-]+\.\w+").expect("static regex")
});

/// Weights for each signal. The defaults are the production values; the
/// struct exists so tests and experiments can isolate individual signals.
#[derive(Debug, Clone)]
pub struct HeuristicWeights {
    /// Per distinct disaster term (default 0.08), capped at `disaster_cap`.
    pub disaster_per_term: f64,
    pub disaster_cap: f64,
    /// Concrete location details (default 0.10).
    pub specific_location: f64,
    /// "<n> people" style head count (default 0.10).
    pub people_count: f64,
    /// Per distinct scam term (default 0.15), capped at `scam_cap`.
    pub scam_per_term: f64,
    pub scam_cap: f64,
    /// Per manipulation phrase (default 0.12), capped at `manipulation_cap`.
    pub manipulation_per_phrase: f64,
    pub manipulation_cap: f64,
    /// Penalty for messages under 30 characters (default 0.15).
    pub too_brief: f64,
    /// Bonus for 101..=499 character messages (default 0.05).
    pub adequate_detail: f64,
    /// Phone number or email present (default 0.08).
    pub verifiable_contact: f64,
    /// More than half the message in capitals (default 0.10).
    pub all_caps: f64,
    /// More than three exclamation marks (default 0.08).
    pub exclamations: f64,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        Self {
            disaster_per_term: 0.08,
            disaster_cap: 0.3,
            specific_location: 0.10,
            people_count: 0.10,
            scam_per_term: 0.15,
            scam_cap: 0.4,
            manipulation_per_phrase: 0.12,
            manipulation_cap: 0.3,
            too_brief: 0.15,
            adequate_detail: 0.05,
            verifiable_contact: 0.08,
            all_caps: 0.10,
            exclamations: 0.08,
        }
    }
}

/// Map a clamped score to a verdict.
pub fn verdict_for_score(score: f64) -> Verdict {
    if score >= GENUINE_THRESHOLD {
        Verdict::LikelyGenuine
    } else if score >= SCAM_THRESHOLD {
        Verdict::NeedsVerification
    } else {
        Verdict::HighScamProbability
    }
}

/// Score a message with the default weights.
pub fn score(message: &str, location: &str) -> ClassificationResult {
    score_with(message, location, &HeuristicWeights::default())
}

/// Score a message. Pure and deterministic; the order in which reasons are
/// listed follows the order the signals are evaluated.
pub fn score_with(message: &str, location: &str, weights: &HeuristicWeights) -> ClassificationResult {
    let text = format!("{} {}", message.to_lowercase(), location.to_lowercase());
    let length = message.chars().count();

    let mut score = 0.5;
    let mut reasons: Vec<String> = Vec::new();

    let disaster = count_matches(&text, DISASTER_TERMS);
    if disaster > 0 {
        score += (disaster as f64 * weights.disaster_per_term).min(weights.disaster_cap);
        reasons.push(format!("Contains {disaster} disaster-related terms"));
    }

    if SPECIFIC_LOCATION.is_match(location) {
        score += weights.specific_location;
        reasons.push("Location contains specific details".to_string());
    }

    if PEOPLE_COUNT.is_match(message) {
        score += weights.people_count;
        reasons.push("Specifies number of people affected".to_string());
    }

    let scam = count_matches(&text, SCAM_TERMS);
    if scam > 0 {
        score -= (scam as f64 * weights.scam_per_term).min(weights.scam_cap);
        reasons.push(format!("Contains {scam} potential scam indicator(s)"));
    }

    let manipulation = count_matches(&text, MANIPULATION_PHRASES);
    if manipulation > 0 {
        score -= (manipulation as f64 * weights.manipulation_per_phrase)
            .min(weights.manipulation_cap);
        reasons.push("Contains emotional manipulation language".to_string());
    }

    if length < 30 {
        score -= weights.too_brief;
        reasons.push("Message is too brief for actionable response".to_string());
    } else if length > 100 && length < 500 {
        score += weights.adequate_detail;
        reasons.push("Message provides adequate detail".to_string());
    }

    if CONTACT.is_match(&text) {
        score += weights.verifiable_contact;
        reasons.push("Contains verifiable contact information".to_string());
    }

    if length > 20 {
        let capitals = message.chars().filter(|c| c.is_ascii_uppercase()).count();
        if capitals as f64 / length as f64 > 0.5 {
            score -= weights.all_caps;
            reasons.push("Excessive use of capital letters".to_string());
        }
    }

    if message.matches('!').count() > 3 {
        score -= weights.exclamations;
        reasons.push("Excessive punctuation detected".to_string());
    }

    let confidence = score.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE);

    let reason = if reasons.is_empty() {
        NO_SIGNAL_REASON.to_string()
    } else {
        format!("{}.", reasons.join(". "))
    };

    ClassificationResult {
        status: verdict_for_score(confidence),
        confidence,
        reason,
    }
}

/// Classifier backed by the heuristic. Never touches the network.
#[derive(Debug, Clone, Default)]
pub struct HeuristicClassifier {
    pub weights: HeuristicWeights,
}

#[async_trait]
impl Classifier for HeuristicClassifier {
    async fn classify(&self, message: &str, location: &str) -> ClassificationResult {
        score_with(message, location, &self.weights)
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}
