//! Compiled programs.

mod jump;
#[allow(clippy::module_inception)]
mod program;
mod step;

pub use jump::{Jump, relative_offset};
pub use program::Program;
pub use step::{Binding, LoopSlot, OverloadId, Overloads, Step, StructKeys};

static_assertions::assert_impl_all!(Program: Send, Sync);
static_assertions::assert_impl_all!(Step: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExprId, Value};
    use crate::format;

    #[test]
    fn test_debug_listing_labels_targets() {
        let mut program = Program::new();
        program.push(Step::Ident {
            id: ExprId(1),
            name: "a".into(),
        });
        let origin = program.push(Step::CondJump {
            id: ExprId(3),
            jump_on: false,
            leave_on_stack: true,
            offset: None,
        });
        program.push(Step::Ident {
            id: ExprId(2),
            name: "b".into(),
        });
        program.push(Step::And { id: ExprId(3) });
        Jump::new(origin).set_target(&mut program, 4).unwrap();

        let listing = format!("{:?}", program);
        assert!(
            listing.contains("JumpIffalse keep +2  ; #3 (to L0)"),
            "{}",
            listing
        );
        assert!(listing.contains("L0:"), "{}", listing);
    }

    #[test]
    fn test_unpatched_jump_detection() {
        let mut program = Program::new();
        program.push(Step::Const {
            id: ExprId(1),
            value: Value::Int(1),
        });
        assert_eq!(program.first_unpatched_jump(), None);
        program.push(Step::Jump {
            id: ExprId(1),
            offset: None,
        });
        assert_eq!(program.first_unpatched_jump(), Some(1));
        assert_eq!(program.jump_count(), 1);
    }
}
