pub mod parser;
pub mod pipeline;

use derive_more::derive::Display;
use serde::{Deserialize, Serialize};

use crate::{
    email::{body_extractor::ExtractionError, client::GatewayError},
    prompt::ProviderError,
};

pub use pipeline::AnalysisPipeline;

pub const DEFAULT_CATEGORY: &str = "other";

/// Structured read of a single email. Field names are part of the HTTP
/// contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAnalysis {
    pub topic: String,
    pub sentiment: String,
    pub priority: String,
    pub category: String,
    pub should_trash: bool,
    pub key_points: Vec<String>,
    pub action_items: Vec<String>,
}

impl Default for EmailAnalysis {
    fn default() -> Self {
        Self {
            topic: String::new(),
            sentiment: String::new(),
            priority: String::new(),
            category: DEFAULT_CATEGORY.to_string(),
            should_trash: false,
            key_points: Vec::new(),
            action_items: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftResponse {
    pub content: String,
}

#[derive(Debug, Display)]
pub enum AnalysisError {
    #[display("{_0}")]
    Mailbox(GatewayError),
    #[display("{_0}")]
    Extraction(ExtractionError),
    #[display("Email content is empty")]
    EmptyContent,
    #[display("{_0}")]
    Provider(ProviderError),
}

impl std::error::Error for AnalysisError {}

impl From<GatewayError> for AnalysisError {
    fn from(error: GatewayError) -> Self {
        AnalysisError::Mailbox(error)
    }
}

impl From<ExtractionError> for AnalysisError {
    fn from(error: ExtractionError) -> Self {
        AnalysisError::Extraction(error)
    }
}

impl From<ProviderError> for AnalysisError {
    fn from(error: ProviderError) -> Self {
        AnalysisError::Provider(error)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_default_analysis() {
        let analysis = EmailAnalysis::default();
        assert_eq!(analysis.category, "other");
        assert!(!analysis.should_trash);
        assert!(analysis.topic.is_empty());
    }

    #[test]
    fn test_analysis_json_field_names() {
        let value = serde_json::to_value(EmailAnalysis::default()).unwrap();
        assert_eq!(
            value,
            json!({
                "topic": "",
                "sentiment": "",
                "priority": "",
                "category": "other",
                "should_trash": false,
                "key_points": [],
                "action_items": []
            })
        );
    }
}
