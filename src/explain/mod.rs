pub mod mock;
pub mod provider;

pub use mock::MockExplainer;
pub use provider::{ExplainError, Explainer, Explanation, explain_selection};
