//! Placeholder explainer used until a real model is wired in.

use async_trait::async_trait;
use chrono::Utc;

use super::provider::{ExplainError, Explainer, Explanation};

const PLACEHOLDER: &str = "This is a mock response. In the future, this will contain insights, \
    explanations, and/or analysis of the selected text.";

pub struct MockExplainer;

#[async_trait]
impl Explainer for MockExplainer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn explain(&self, text: &str) -> Result<Explanation, ExplainError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ExplainError::Empty);
        }
        Ok(Explanation {
            text: format!("\"{text}\"\n\n{PLACEHOLDER}"),
            timestamp: Utc::now(),
        })
    }
}
