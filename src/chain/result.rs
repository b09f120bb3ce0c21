//! Structured chain outcomes.

use serde::Serialize;

/// Terminal state of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainState {
    /// Every step ran.
    Completed,
    /// A critical failure or fault stopped the chain early.
    Aborted,
    /// The chain failed validation; nothing ran.
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepResult {
    /// 1-based position in the chain.
    pub step: usize,
    pub action: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepResult {
    pub fn ok(step: usize, action: &str, output: String) -> Self {
        Self {
            step,
            action: action.to_owned(),
            success: true,
            output: Some(output),
            error: None,
        }
    }

    pub fn failed(step: usize, action: &str, error: String) -> Self {
        Self {
            step,
            action: action.to_owned(),
            success: false,
            output: None,
            error: Some(error),
        }
    }
}

/// Aggregate result of one chain.
///
/// `executed <= steps`; when `executed < steps` the last entry of `results`
/// is a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub steps: usize,
    pub executed: usize,
    pub results: Vec<StepResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub state: ChainState,
}

impl ExecutionResult {
    pub fn rejected() -> Self {
        Self {
            success: false,
            steps: 0,
            executed: 0,
            results: Vec::new(),
            error: Some("Invalid chain format".to_owned()),
            state: ChainState::Rejected,
        }
    }

    /// Builds the aggregate from the recorded steps.
    pub fn from_steps(steps: usize, results: Vec<StepResult>) -> Self {
        let executed = results.len();
        Self {
            success: executed > 0 && results.iter().all(|r| r.success),
            steps,
            executed,
            results,
            error: None,
            state: if executed < steps {
                ChainState::Aborted
            } else {
                ChainState::Completed
            },
        }
    }
}
