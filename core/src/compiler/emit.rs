use tracing::trace;

use super::CompileError;
use crate::ast::ExprId;
use crate::program::{Jump, Program, Step};

/// The program under construction plus the first failure, if any.
///
/// Once a failure is recorded, nothing more is appended and later failures
/// are dropped: the first error is the one reported.
#[derive(Debug, Default)]
pub(crate) struct Emitter {
    program: Program,
    error: Option<CompileError>,
}

impl Emitter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn ok(&self) -> bool {
        self.error.is_none()
    }

    /// Appends `step` and returns its index, or `None` after a failure.
    pub(crate) fn add_step(&mut self, step: Step) -> Option<usize> {
        if !self.ok() {
            return None;
        }
        trace!(index = self.program.len(), id = %step.id(), "emit {}", step);
        Some(self.program.push(step))
    }

    /// Appends a jump step and binds a descriptor to it. The descriptor is
    /// unbound when nothing was appended.
    pub(crate) fn add_jump(&mut self, step: Step) -> Jump {
        self.add_step(step).map(Jump::new).unwrap_or_default()
    }

    /// Index the next appended step will get.
    pub(crate) fn current_index(&self) -> usize {
        self.program.len()
    }

    pub(crate) fn fail(&mut self, error: CompileError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Records an invalid-argument failure unless `condition` holds.
    pub(crate) fn validate(&mut self, condition: bool, message: &str, id: ExprId) -> bool {
        if !condition {
            self.fail(CompileError::invalid_argument(message, id));
        }
        condition
    }

    pub(crate) fn set_target(&mut self, jump: &Jump, target: usize) {
        if self.ok()
            && let Err(err) = jump.set_target(&mut self.program, target)
        {
            self.fail(err);
        }
    }

    pub(crate) fn set_error_target(&mut self, jump: &Jump, target: usize) {
        if self.ok()
            && let Err(err) = jump.set_error_target(&mut self.program, target)
        {
            self.fail(err);
        }
    }

    pub(crate) fn finish(self) -> Result<Program, CompileError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.program),
        }
    }
}
