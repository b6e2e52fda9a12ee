//! Flat program steps.
//!
//! A program is a sequence of steps run by a stack machine. Each step pops its
//! operands and pushes its result. Most steps move to the next index when done;
//! jump steps move by a signed offset relative to the step that follows them:
//!
//! ```text
//! target = index + 1 + offset
//! ```
//!
//! # Stack Discipline
//!
//! Stack effect notation: `[..., operand1, operand2] -> [..., result]`
//!
//! Errors and unknown values are ordinary stack values. A step that reads an
//! error operand generally propagates it; the control-flow steps below document
//! where they differ.
//!
//! # Comprehension Layout
//!
//! ```text
//!         PushLoopSlot(Accumulator)
//!         <iter_range>
//!         ListKeys                     maps iterate their keys
//!         PushLoopSlot(Index)          index starts at -1
//!         PushLoopSlot(CurrentValue)
//!         <accu_init>
//! next:   ComprehensionNext            done: -> result, error: -> finish
//!         <loop_condition>
//!         ComprehensionCond            false: -> result, error: -> finish
//!         <loop_step>
//!         Jump                         -> next
//! result: <result>
//! finish: ComprehensionFinish
//! ```
//!
//! While the loop runs, the stack holds `[accu, range, index, value]` plus
//! the value computed by `<accu_init>` or `<loop_step>`. Next folds that value
//! into the `accu` slot. When the loop ends, Next and Cond leave only `[accu]`
//! and continue at `<result>`. On an error they leave `[accu, error]` and jump
//! to Finish, so the error becomes the comprehension's value.

use core::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::String;
use crate::Vec;
use crate::ast::{ExprId, Value};

/// Identifier of a concrete function implementation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OverloadId(pub String);

impl OverloadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OverloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// When overloads are bound to implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Binding {
    /// Implementations are known when the program is built.
    Eager,
    /// Implementations are supplied by the activation at evaluation time.
    Lazy,
}

/// Candidate overloads of a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overloads {
    pub binding: Binding,
    pub ids: SmallVec<[OverloadId; 2]>,
}

impl Overloads {
    pub fn new(binding: Binding) -> Self {
        Self {
            binding,
            ids: SmallVec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OverloadId> {
        self.ids.iter()
    }
}

/// Placeholder values pushed before a comprehension's operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopSlot {
    /// Slot that holds the accumulator once the loop starts.
    Accumulator,
    /// Iteration index, starts before the first element.
    Index,
    /// Current element.
    CurrentValue,
}

/// Keys used to assemble a map or message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StructKeys {
    /// Map literal; the stack holds `entries` key/value pairs.
    Map { entries: usize },
    /// Message literal; one stack value per field, in order.
    Fields(Vec<String>),
}

impl StructKeys {
    fn operand_count(&self) -> usize {
        match self {
            StructKeys::Map { entries } => entries * 2,
            StructKeys::Fields(fields) => fields.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Step {
    // ========================================================================
    // Values
    // ========================================================================
    /// Push a literal.
    /// Stack: [...] -> [..., value]
    Const { id: ExprId, value: Value },

    /// Push a constant the activation may override with a variable of the same
    /// name, e.g. an enum constant or a type identifier.
    /// Stack: [...] -> [..., value]
    ShadowableConst {
        id: ExprId,
        name: String,
        value: Value,
    },

    /// Push a comprehension placeholder.
    /// Stack: [...] -> [..., slot]
    PushLoopSlot { id: ExprId, slot: LoopSlot },

    /// Look up a variable in the activation (or the innermost loop variable
    /// with that name).
    /// Stack: [...] -> [..., value]
    Ident { id: ExprId, name: String },

    // ========================================================================
    // Access
    // ========================================================================
    /// Select a field, or test its presence when `test_only` is set.
    ///
    /// `qualified_path` is the dotted name of the whole select chain when the
    /// operand is itself an identifier or a select; it lets the runtime match
    /// unknown and missing-attribute patterns by path.
    /// Stack: [..., operand] -> [..., field]
    Select {
        id: ExprId,
        field: String,
        test_only: bool,
        qualified_path: Option<String>,
        unbox_null_wrappers: bool,
    },

    /// Index a list or map.
    /// Stack: [..., container, key] -> [..., element]
    ContainerAccess { id: ExprId },

    // ========================================================================
    // Calls
    // ========================================================================
    /// Dispatch to the first overload whose signature matches the argument
    /// values. For receiver-style calls the receiver is the first of the
    /// `arg_count` operands.
    /// Stack: [..., arg0, ..., argN] -> [..., result]
    Call {
        id: ExprId,
        function: String,
        receiver_style: bool,
        arg_count: usize,
        overloads: Overloads,
    },

    /// Append the elements of a list to the accumulator list in place.
    /// Stack: [..., accumulator, list] -> [..., accumulator]
    ListAppend { id: ExprId },

    // ========================================================================
    // Construction
    // ========================================================================
    /// Stack: [..., e0, ..., eN] -> [..., list]
    /// A `mutable` list is an accumulator that [`Step::ListAppend`] may grow.
    CreateList {
        id: ExprId,
        len: usize,
        mutable: bool,
    },

    /// Stack: [..., k0, v0, ..., kN, vN] -> [..., map] for maps,
    /// [..., v0, ..., vN] -> [..., message] for messages.
    CreateStruct {
        id: ExprId,
        message_type: Option<String>,
        keys: StructKeys,
    },

    // ========================================================================
    // Control Flow
    // ========================================================================
    /// Unconditional jump.
    /// Stack: [...] -> [...]
    Jump { id: ExprId, offset: Option<i32> },

    /// Jump when the top of the stack is the boolean `jump_on`. Values that are
    /// not booleans (errors, unknowns) never jump. When `leave_on_stack` is set
    /// the value is kept whether or not the jump is taken; otherwise it is
    /// popped.
    /// Stack: [..., cond] -> [..., cond?]
    CondJump {
        id: ExprId,
        jump_on: bool,
        leave_on_stack: bool,
        offset: Option<i32>,
    },

    /// Jump when the top of the stack is an error or unknown, leaving it in
    /// place. A non-boolean value is replaced by a no-matching-overload error
    /// first. Booleans do not jump and stay on the stack.
    /// Stack: [..., cond] -> [..., cond]
    BoolCheckJump { id: ExprId, offset: Option<i32> },

    /// Combine two operands with logical AND (errors absorbed by `false`).
    /// Stack: [..., lhs, rhs] -> [..., result]
    And { id: ExprId },

    /// Combine two operands with logical OR (errors absorbed by `true`).
    /// Stack: [..., lhs, rhs] -> [..., result]
    Or { id: ExprId },

    /// Select between two evaluated branches.
    /// Stack: [..., cond, then, else] -> [..., result]
    Ternary { id: ExprId },

    // ========================================================================
    // Comprehensions
    // ========================================================================
    /// Replace a map range by its key list.
    /// Stack: [..., range] -> [..., keys]
    ListKeys { id: ExprId },

    /// Store the latest accumulator value and advance to the next element,
    /// binding `iter_var` and `accu_var`. When the range is exhausted, jump by
    /// `offset`. When the range is not a list, jump by `error_offset`.
    /// Stack: [..., accu, range, index, value, step] -> [..., step, range, index', value']
    ComprehensionNext {
        id: ExprId,
        accu_var: String,
        iter_var: String,
        offset: Option<i32>,
        error_offset: Option<i32>,
    },

    /// Check the loop condition. `false` ends the loop when
    /// `short_circuiting` is set; errors and non-booleans jump by
    /// `error_offset`.
    /// Stack: [..., accu, range, index, value, cond] -> [..., accu, range, index, value]
    ComprehensionCond {
        id: ExprId,
        accu_var: String,
        iter_var: String,
        short_circuiting: bool,
        offset: Option<i32>,
        error_offset: Option<i32>,
    },

    /// Drop the accumulator under the result and unbind the loop variables.
    /// Stack: [..., accu, result] -> [..., result]
    ComprehensionFinish {
        id: ExprId,
        accu_var: String,
        iter_var: String,
    },
}

impl Step {
    /// Id of the expression node the step was compiled from.
    pub fn id(&self) -> ExprId {
        match self {
            Step::Const { id, .. }
            | Step::ShadowableConst { id, .. }
            | Step::PushLoopSlot { id, .. }
            | Step::Ident { id, .. }
            | Step::Select { id, .. }
            | Step::ContainerAccess { id }
            | Step::Call { id, .. }
            | Step::ListAppend { id }
            | Step::CreateList { id, .. }
            | Step::CreateStruct { id, .. }
            | Step::Jump { id, .. }
            | Step::CondJump { id, .. }
            | Step::BoolCheckJump { id, .. }
            | Step::And { id }
            | Step::Or { id }
            | Step::Ternary { id }
            | Step::ListKeys { id }
            | Step::ComprehensionNext { id, .. }
            | Step::ComprehensionCond { id, .. }
            | Step::ComprehensionFinish { id, .. } => *id,
        }
    }

    pub fn is_jump(&self) -> bool {
        matches!(
            self,
            Step::Jump { .. }
                | Step::CondJump { .. }
                | Step::BoolCheckJump { .. }
                | Step::ComprehensionNext { .. }
                | Step::ComprehensionCond { .. }
        )
    }

    /// Primary jump offset. `None` for non-jumps and for jumps not yet patched.
    pub fn jump_offset(&self) -> Option<i32> {
        match self {
            Step::Jump { offset, .. }
            | Step::CondJump { offset, .. }
            | Step::BoolCheckJump { offset, .. }
            | Step::ComprehensionNext { offset, .. }
            | Step::ComprehensionCond { offset, .. } => *offset,
            _ => None,
        }
    }

    pub fn error_jump_offset(&self) -> Option<i32> {
        match self {
            Step::ComprehensionNext { error_offset, .. }
            | Step::ComprehensionCond { error_offset, .. } => *error_offset,
            _ => None,
        }
    }

    /// Whether every offset this step carries has been set.
    pub fn is_patched(&self) -> bool {
        match self {
            Step::ComprehensionNext {
                offset,
                error_offset,
                ..
            }
            | Step::ComprehensionCond {
                offset,
                error_offset,
                ..
            } => offset.is_some() && error_offset.is_some(),
            Step::Jump { offset, .. }
            | Step::CondJump { offset, .. }
            | Step::BoolCheckJump { offset, .. } => offset.is_some(),
            _ => true,
        }
    }

    /// Returns `false` when the step has no primary offset to set.
    pub(crate) fn set_jump_offset(&mut self, new_offset: i32) -> bool {
        match self {
            Step::Jump { offset, .. }
            | Step::CondJump { offset, .. }
            | Step::BoolCheckJump { offset, .. }
            | Step::ComprehensionNext { offset, .. }
            | Step::ComprehensionCond { offset, .. } => {
                *offset = Some(new_offset);
                true
            }
            _ => false,
        }
    }

    /// Returns `false` when the step has no error offset to set.
    pub(crate) fn set_error_jump_offset(&mut self, new_offset: i32) -> bool {
        match self {
            Step::ComprehensionNext { error_offset, .. }
            | Step::ComprehensionCond { error_offset, .. } => {
                *error_offset = Some(new_offset);
                true
            }
            _ => false,
        }
    }

    /// Net change in stack depth when the step falls through to the next one.
    pub fn stack_effect(&self) -> isize {
        match self {
            Step::Const { .. }
            | Step::ShadowableConst { .. }
            | Step::PushLoopSlot { .. }
            | Step::Ident { .. } => 1,
            Step::Select { .. } | Step::ListKeys { .. } => 0,
            Step::ContainerAccess { .. }
            | Step::ListAppend { .. }
            | Step::And { .. }
            | Step::Or { .. } => -1,
            Step::Call { arg_count, .. } => 1 - *arg_count as isize,
            Step::CreateList { len, .. } => 1 - *len as isize,
            Step::CreateStruct { keys, .. } => 1 - keys.operand_count() as isize,
            Step::Jump { .. } | Step::BoolCheckJump { .. } => 0,
            Step::CondJump { leave_on_stack, .. } => {
                if *leave_on_stack {
                    0
                } else {
                    -1
                }
            }
            Step::Ternary { .. } => -2,
            Step::ComprehensionNext { .. } => -1,
            Step::ComprehensionCond { .. } => -1,
            Step::ComprehensionFinish { .. } => -1,
        }
    }
}

fn fmt_offset(offset: Option<i32>) -> String {
    match offset {
        Some(offset) => crate::format!("{:+}", offset),
        None => String::from("?"),
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Const { value, .. } => write!(f, "Const {}", value),
            Step::ShadowableConst { name, value, .. } => {
                write!(f, "ShadowableConst {} = {}", name, value)
            }
            Step::PushLoopSlot { slot, .. } => write!(f, "PushLoopSlot {:?}", slot),
            Step::Ident { name, .. } => write!(f, "Ident {}", name),
            Step::Select {
                field,
                test_only,
                qualified_path,
                ..
            } => {
                if *test_only {
                    write!(f, "Has .{}", field)?;
                } else {
                    write!(f, "Select .{}", field)?;
                }
                if let Some(path) = qualified_path {
                    write!(f, " [{}]", path)?;
                }
                Ok(())
            }
            Step::ContainerAccess { .. } => write!(f, "ContainerAccess"),
            Step::Call {
                function,
                receiver_style,
                arg_count,
                overloads,
                ..
            } => {
                let style = if *receiver_style { "receiver " } else { "" };
                write!(f, "Call {}{}/{}", style, function, arg_count)?;
                if overloads.binding == Binding::Lazy {
                    write!(f, " lazy")?;
                }
                Ok(())
            }
            Step::ListAppend { .. } => write!(f, "ListAppend"),
            Step::CreateList { len, mutable, .. } => {
                write!(f, "CreateList {}", len)?;
                if *mutable {
                    write!(f, " mutable")?;
                }
                Ok(())
            }
            Step::CreateStruct {
                message_type,
                keys,
                ..
            } => match (message_type, keys) {
                (Some(name), StructKeys::Fields(fields)) => {
                    write!(f, "CreateMessage {} {:?}", name, fields)
                }
                (_, keys) => write!(f, "CreateMap {}", keys.operand_count() / 2),
            },
            Step::Jump { offset, .. } => write!(f, "Jump {}", fmt_offset(*offset)),
            Step::CondJump {
                jump_on,
                leave_on_stack,
                offset,
                ..
            } => {
                let keep = if *leave_on_stack { " keep" } else { "" };
                write!(f, "JumpIf{}{} {}", jump_on, keep, fmt_offset(*offset))
            }
            Step::BoolCheckJump { offset, .. } => {
                write!(f, "BoolCheckJump {}", fmt_offset(*offset))
            }
            Step::And { .. } => write!(f, "And"),
            Step::Or { .. } => write!(f, "Or"),
            Step::Ternary { .. } => write!(f, "Ternary"),
            Step::ListKeys { .. } => write!(f, "ListKeys"),
            Step::ComprehensionNext {
                iter_var,
                accu_var,
                offset,
                error_offset,
                ..
            } => write!(
                f,
                "ComprehensionNext {}, {} {} err {}",
                iter_var,
                accu_var,
                fmt_offset(*offset),
                fmt_offset(*error_offset)
            ),
            Step::ComprehensionCond {
                short_circuiting, offset, error_offset, ..
            } => {
                let mode = if *short_circuiting { "" } else { " exhaustive" };
                write!(
                    f,
                    "ComprehensionCond{} {} err {}",
                    mode,
                    fmt_offset(*offset),
                    fmt_offset(*error_offset)
                )
            }
            Step::ComprehensionFinish { .. } => write!(f, "ComprehensionFinish"),
        }
    }
}
