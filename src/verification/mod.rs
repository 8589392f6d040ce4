// Message-authenticity classification.
//
// Two interchangeable backends sit behind the Classifier trait: a
// deterministic heuristic scorer and a language-model classifier that
// falls back to the heuristic when the model can't be reached.

pub mod ai;
pub mod heuristic;
pub mod lexicon;
pub mod llm;
pub mod traits;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::config::{ClassifierBackend, Config};
use traits::Classifier;

/// Build the gateway client described by the configuration.
pub fn gateway_client(config: &Config) -> Result<llm::GatewayClient> {
    config.require_ai()?;
    llm::GatewayClient::new(
        &config.ai_url,
        &config.ai_api_key,
        &config.ai_model,
        Duration::from_secs(config.ai_timeout_secs),
    )
}

/// Build the classifier selected by `SAHAYAK_CLASSIFIER`.
pub fn build_classifier(config: &Config) -> Result<Arc<dyn Classifier>> {
    match config.classifier_backend {
        ClassifierBackend::Heuristic => Ok(Arc::new(heuristic::HeuristicClassifier::default())),
        ClassifierBackend::Ai => {
            let client = gateway_client(config)?;
            Ok(Arc::new(ai::AiClassifier::new(Arc::new(client))))
        }
    }
}
