//! Public diagnostic types.
//!
//! Internal errors are converted to these types at API boundaries with
//! [`CompileError::to_diagnostic`](crate::compiler::CompileError::to_diagnostic).

use crate::String;
use crate::ast::ExprId;

/// A diagnostic message (error, warning, or info) attached to an expression
/// node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity level (error, warning, info).
    pub severity: Severity,

    /// Primary diagnostic message.
    pub message: String,

    /// Node the diagnostic refers to, when there is one. Callers map it back
    /// to a source position using their parser's position table.
    pub expr_id: Option<ExprId>,

    /// Optional error code (e.g., "C001") for documentation lookup.
    pub code: Option<String>,
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl core::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        write!(f, "{}", level)?;
        if let Some(code) = &self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(id) = self.expr_id {
            write!(f, " (at {})", id)?;
        }
        Ok(())
    }
}
