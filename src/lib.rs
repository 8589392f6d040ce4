// Sahayak: authenticity scoring for disaster distress reports
//
// This is the library root. Each module corresponds to a major subsystem:
// storage, classification, the submission pipeline and the surfaces
// (terminal, HTTP) built on top of them.

pub mod analytics;
pub mod assistant;
pub mod config;
pub mod db;
pub mod output;
pub mod pipeline;
pub mod status;
pub mod verification;

#[cfg(feature = "web")]
pub mod web;
