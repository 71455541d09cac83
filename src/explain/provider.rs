use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::citation::{SelectedVerse, resolve};

/// Errors an explainer can report.
#[derive(Debug)]
pub enum ExplainError {
    /// Nothing to explain (empty or whitespace-only text). Not retryable.
    Empty,
    /// The backing service failed. Retryability is up to the provider.
    Provider(String),
}

impl fmt::Display for ExplainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExplainError::Empty => write!(f, "nothing selected to explain"),
            ExplainError::Provider(msg) => write!(f, "explain provider error: {msg}"),
        }
    }
}

impl std::error::Error for ExplainError {}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Explanation {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Opaque `explain(text) -> text` collaborator.
#[async_trait]
pub trait Explainer: Send + Sync {
    /// Returns the name of the explainer.
    fn name(&self) -> &str;

    async fn explain(&self, text: &str) -> Result<Explanation, ExplainError>;
}

/// Explains a selected passage, prefixing its citation so the provider
/// knows where the text comes from.
pub async fn explain_selection(
    explainer: &dyn Explainer,
    selection: &[SelectedVerse],
    passage: &str,
) -> Result<Explanation, ExplainError> {
    let citation = resolve(selection);
    let text = if citation.is_empty() {
        passage.to_string()
    } else {
        format!("{citation}\n{passage}")
    };
    log::debug!("Explaining '{}' via {}", citation, explainer.name());
    explainer.explain(&text).await
}
