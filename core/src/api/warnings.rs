use tracing::warn;

use crate::Vec;
use crate::compiler::CompileError;

/// Resolution warnings collected during a build.
#[derive(Debug, Clone, Default)]
pub struct BuilderWarnings {
    fail_immediately: bool,
    warnings: Vec<CompileError>,
}

impl BuilderWarnings {
    pub fn new(fail_immediately: bool) -> Self {
        Self {
            fail_immediately,
            warnings: Vec::new(),
        }
    }

    /// Records a warning. In fail-immediately mode the warning is also
    /// returned as an error for the caller to propagate.
    pub fn add_warning(&mut self, warning: CompileError) -> Result<(), CompileError> {
        warn!(id = ?warning.expr_id(), "{}", warning);
        self.warnings.push(warning);
        match self.warnings.last() {
            Some(last) if self.fail_immediately => Err(last.clone()),
            _ => Ok(()),
        }
    }

    pub fn fail_immediately(&self) -> bool {
        self.fail_immediately
    }

    pub fn warnings(&self) -> &[CompileError] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn into_warnings(self) -> Vec<CompileError> {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ExprId;

    fn unresolved() -> CompileError {
        CompileError::UnresolvedReference {
            function: "f".into(),
            expr_id: ExprId(1),
        }
    }

    #[test]
    fn test_collects_warnings() {
        let mut warnings = BuilderWarnings::new(false);
        assert!(warnings.add_warning(unresolved()).is_ok());
        assert!(warnings.add_warning(unresolved()).is_ok());
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_fail_immediately() {
        let mut warnings = BuilderWarnings::new(true);
        assert_eq!(warnings.add_warning(unresolved()), Err(unresolved()));
        assert_eq!(warnings.warnings(), &[unresolved()]);
    }
}
