//! Compilation errors.

use crate::api::{Diagnostic, Severity};
use crate::ast::ExprId;
use crate::{String, ToString};

/// Broad classes of [`CompileError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed tree or inconsistent program. Always fatal.
    Structural,
    /// Name or overload resolution problem. Reported as a warning unless
    /// warnings are configured to fail the build.
    Resolution,
    /// Expression rejected by a safety analysis. Always fatal.
    Safety,
    /// Invalid configuration supplied by the caller.
    ExternalInput,
}

/// Errors and warnings produced while building a program.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("{message}")]
    InvalidArgument {
        message: String,
        expr_id: Option<ExprId>,
    },

    #[error("Invalid expression container: '{container}'")]
    InvalidContainer { container: String },

    #[error("No overloads provided for FunctionStep creation: {function}")]
    NoMatchingOverload { function: String, expr_id: ExprId },

    #[error("No overload found in reference resolve step for {function}")]
    UnresolvedReference { function: String, expr_id: ExprId },

    #[error("Reference map doesn't provide overloads for {function}")]
    ReferenceMissingOverloads { function: String, expr_id: ExprId },

    #[error("Reference map points to a presence test -- has(container.attr)")]
    PresenceTestReference { expr_id: ExprId },

    #[error("Comprehension contains memory exhaustion vulnerability")]
    AccumulationVulnerability { expr_id: ExprId },

    /// Offset between a jump and its target does not fit in 32 bits.
    #[error("Jump distance too large: {distance}")]
    JumpTooFar { distance: i64 },

    #[error("Invalid jump target {target} for step {origin:?}")]
    InvalidJumpTarget {
        origin: Option<usize>,
        target: usize,
    },

    #[error("Jump at step {index} was never patched")]
    UnpatchedJump { index: usize, expr_id: ExprId },

    #[error("Constant folding failed: {message}")]
    ConstantFolding {
        message: String,
        expr_id: Option<ExprId>,
    },
}

impl CompileError {
    pub fn invalid_argument(message: impl Into<String>, expr_id: ExprId) -> Self {
        CompileError::InvalidArgument {
            message: message.into(),
            expr_id: Some(expr_id),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            CompileError::InvalidArgument { .. }
            | CompileError::JumpTooFar { .. }
            | CompileError::InvalidJumpTarget { .. }
            | CompileError::UnpatchedJump { .. }
            | CompileError::ConstantFolding { .. } => ErrorCategory::Structural,
            CompileError::NoMatchingOverload { .. }
            | CompileError::UnresolvedReference { .. }
            | CompileError::ReferenceMissingOverloads { .. }
            | CompileError::PresenceTestReference { .. } => ErrorCategory::Resolution,
            CompileError::AccumulationVulnerability { .. } => ErrorCategory::Safety,
            CompileError::InvalidContainer { .. } => ErrorCategory::ExternalInput,
        }
    }

    /// Id of the node the error refers to, when there is one.
    pub fn expr_id(&self) -> Option<ExprId> {
        match self {
            CompileError::InvalidArgument { expr_id, .. }
            | CompileError::ConstantFolding { expr_id, .. } => *expr_id,
            CompileError::NoMatchingOverload { expr_id, .. }
            | CompileError::UnresolvedReference { expr_id, .. }
            | CompileError::ReferenceMissingOverloads { expr_id, .. }
            | CompileError::PresenceTestReference { expr_id }
            | CompileError::AccumulationVulnerability { expr_id }
            | CompileError::UnpatchedJump { expr_id, .. } => Some(*expr_id),
            CompileError::InvalidContainer { .. }
            | CompileError::JumpTooFar { .. }
            | CompileError::InvalidJumpTarget { .. } => None,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            CompileError::InvalidArgument { .. } => "C001",
            CompileError::InvalidContainer { .. } => "C002",
            CompileError::NoMatchingOverload { .. } => "C003",
            CompileError::UnresolvedReference { .. } => "C004",
            CompileError::ReferenceMissingOverloads { .. } => "C005",
            CompileError::PresenceTestReference { .. } => "C006",
            CompileError::AccumulationVulnerability { .. } => "C007",
            CompileError::JumpTooFar { .. } => "C008",
            CompileError::InvalidJumpTarget { .. } => "C009",
            CompileError::UnpatchedJump { .. } => "C010",
            CompileError::ConstantFolding { .. } => "C011",
        }
    }

    /// Convert to a Diagnostic for API boundary.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let severity = match self.category() {
            ErrorCategory::Resolution => Severity::Warning,
            _ => Severity::Error,
        };
        Diagnostic {
            severity,
            message: self.to_string(),
            expr_id: self.expr_id(),
            code: Some(String::from(self.code())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = CompileError::invalid_argument("Map entry missing key", ExprId(3));
        assert_eq!(err.to_string(), "Map entry missing key");
        assert_eq!(err.expr_id(), Some(ExprId(3)));

        let err = CompileError::InvalidContainer {
            container: ".a".into(),
        };
        assert_eq!(err.to_string(), "Invalid expression container: '.a'");
        assert_eq!(err.category(), ErrorCategory::ExternalInput);
    }

    #[test]
    fn test_diagnostic_severity() {
        let warning = CompileError::UnresolvedReference {
            function: "f".into(),
            expr_id: ExprId(1),
        };
        let diagnostic = warning.to_diagnostic();
        assert_eq!(diagnostic.severity, Severity::Warning);
        assert_eq!(
            diagnostic.message,
            "No overload found in reference resolve step for f"
        );
        assert_eq!(diagnostic.code.as_deref(), Some("C004"));

        let error = CompileError::AccumulationVulnerability { expr_id: ExprId(9) };
        assert_eq!(error.to_diagnostic().severity, Severity::Error);
        assert_eq!(error.category(), ErrorCategory::Safety);
    }
}
