use crate::catalog::OperationId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AggregateError {
    /// No target, and no baseline behaviour, services the operation.
    #[error("unsupported operation '{operation}': no target of the aggregate services it")]
    UnsupportedOperation { operation: OperationId },

    /// The resolved target's own failure, passed through unchanged.
    #[error(transparent)]
    Target(anyhow::Error),
}

impl AggregateError {
    pub fn unsupported(operation: OperationId) -> Self {
        Self::UnsupportedOperation { operation }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedOperation { .. })
    }
}
