use super::Program;
use crate::compiler::CompileError;

/// Handle to a jump step already appended to a [`Program`].
///
/// A descriptor does not own the step; it remembers where the step lives so
/// its offset can be set once the destination is known. The default
/// descriptor is unbound and stands for a jump whose emission failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Jump {
    origin: Option<usize>,
}

impl Jump {
    pub fn new(origin: usize) -> Self {
        Self {
            origin: Some(origin),
        }
    }

    pub fn exists(&self) -> bool {
        self.origin.is_some()
    }

    pub fn origin(&self) -> Option<usize> {
        self.origin
    }

    /// Points the jump at `target`. An offset of zero falls through to the
    /// next step.
    pub fn set_target(&self, program: &mut Program, target: usize) -> Result<(), CompileError> {
        let (origin, offset) = self.resolve(program, target)?;
        let step = program.step_mut(origin);
        if step.is_some_and(|step| step.set_jump_offset(offset)) {
            Ok(())
        } else {
            Err(self.invalid(target))
        }
    }

    /// Points the error exit of a comprehension step at `target`.
    pub fn set_error_target(
        &self,
        program: &mut Program,
        target: usize,
    ) -> Result<(), CompileError> {
        let (origin, offset) = self.resolve(program, target)?;
        let step = program.step_mut(origin);
        if step.is_some_and(|step| step.set_error_jump_offset(offset)) {
            Ok(())
        } else {
            Err(self.invalid(target))
        }
    }

    fn resolve(&self, program: &Program, target: usize) -> Result<(usize, i32), CompileError> {
        let origin = self.origin.ok_or_else(|| self.invalid(target))?;
        // `target == len` is the position right after the last step.
        if origin >= program.len() || target > program.len() {
            return Err(self.invalid(target));
        }
        Ok((origin, relative_offset(origin, target)?))
    }

    fn invalid(&self, target: usize) -> CompileError {
        CompileError::InvalidJumpTarget {
            origin: self.origin,
            target,
        }
    }
}

/// Offset stored in the step at `origin` so that execution continues at
/// `target`.
pub fn relative_offset(origin: usize, target: usize) -> Result<i32, CompileError> {
    let distance = target as i64 - origin as i64 - 1;
    i32::try_from(distance).map_err(|_| CompileError::JumpTooFar { distance })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExprId, Value};
    use crate::program::Step;

    fn program_with_jump() -> (Program, Jump) {
        let mut program = Program::new();
        program.push(Step::Const {
            id: ExprId(1),
            value: Value::Bool(true),
        });
        let origin = program.push(Step::CondJump {
            id: ExprId(2),
            jump_on: false,
            leave_on_stack: true,
            offset: None,
        });
        program.push(Step::Const {
            id: ExprId(3),
            value: Value::Bool(false),
        });
        program.push(Step::And { id: ExprId(2) });
        (program, Jump::new(origin))
    }

    #[test]
    fn test_forward_target() {
        let (mut program, jump) = program_with_jump();
        jump.set_target(&mut program, 4).unwrap();
        assert_eq!(program.steps()[1].jump_offset(), Some(2));
        assert_eq!(program.target_of(1), Some(4));
    }

    #[test]
    fn test_fall_through_is_zero() {
        let (mut program, jump) = program_with_jump();
        jump.set_target(&mut program, 2).unwrap();
        assert_eq!(program.steps()[1].jump_offset(), Some(0));
    }

    #[test]
    fn test_backward_target() {
        let mut program = Program::new();
        program.push(Step::Const {
            id: ExprId(1),
            value: Value::Null,
        });
        let origin = program.push(Step::Jump {
            id: ExprId(1),
            offset: None,
        });
        Jump::new(origin).set_target(&mut program, 0).unwrap();
        assert_eq!(program.steps()[1].jump_offset(), Some(-2));
    }

    #[test]
    fn test_unbound_descriptor_fails() {
        let (mut program, _) = program_with_jump();
        let jump = Jump::default();
        assert!(!jump.exists());
        assert!(matches!(
            jump.set_target(&mut program, 3),
            Err(CompileError::InvalidJumpTarget {
                origin: None,
                target: 3,
            })
        ));
    }

    #[test]
    fn test_out_of_bounds_target_fails() {
        let (mut program, jump) = program_with_jump();
        assert!(jump.set_target(&mut program, 5).is_err());
    }

    #[test]
    fn test_error_target_requires_comprehension_step() {
        let (mut program, jump) = program_with_jump();
        assert!(jump.set_error_target(&mut program, 4).is_err());
    }

    #[test]
    fn test_offset_overflow() {
        let far = i32::MAX as usize + 10;
        assert!(matches!(
            relative_offset(0, far),
            Err(CompileError::JumpTooFar { .. })
        ));
        assert_eq!(relative_offset(10, 3), Ok(-8));
    }
}
