//! Validator contract.

use async_trait::async_trait;
use vibeware_proto::GameName;

/// Outcome of running the external checker on one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub success: bool,
    /// Standard output followed by standard error.
    pub output: String,
}

impl ValidationResult {
    pub fn passed(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}

/// Judges whether a freshly written game meets the project's structural rules.
///
/// Implementations never fail: a checker that cannot even be started yields a
/// failed result carrying the launch error.
#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(&self, name: &GameName) -> ValidationResult;
}
