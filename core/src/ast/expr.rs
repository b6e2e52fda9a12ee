use core::fmt;

use serde::{Deserialize, Serialize};

use super::Value;
use crate::{Box, String, Vec};

/// Identifier of an expression node.
///
/// Ids are assigned by whoever builds the tree (a parser, or [`ExprFactory`])
/// and are expected to be unique within one tree. A few rewrites create nodes
/// that reuse the id of the node they replace.
///
/// [`ExprFactory`]: super::ExprFactory
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ExprId(pub i64);

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub id: ExprId,
    pub kind: ExprKind,
}

impl Expr {
    pub fn new(id: ExprId, kind: ExprKind) -> Self {
        Self { id, kind }
    }

    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&Call> {
        match &self.kind {
            ExprKind::Call(call) => Some(call),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Const(Value),
    Ident(String),
    Select(Select),
    Call(Call),
    List(CreateList),
    Struct(CreateStruct),
    Comprehension(Comprehension),
}

/// Field selection `operand.field`, or the presence test `has(operand.field)`
/// when `test_only` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Select {
    pub operand: Box<Expr>,
    pub field: String,
    pub test_only: bool,
}

/// Function call. Receiver-style calls (`target.function(args)`) carry a
/// target; global calls do not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub target: Option<Box<Expr>>,
    pub function: String,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateList {
    pub elements: Vec<Expr>,
}

/// Map literal (empty `message_name`) or message construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateStruct {
    pub message_name: String,
    pub entries: Vec<Entry>,
}

impl CreateStruct {
    pub fn is_map(&self) -> bool {
        self.message_name.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: ExprId,
    pub key: EntryKey,
    pub value: Option<Box<Expr>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntryKey {
    /// Message field name.
    Field(String),
    /// Map key expression.
    Map(Box<Expr>),
    /// Neither was set. Only produced by malformed input.
    Missing,
}

/// Fold over a range.
///
/// ```text
/// let accu_var = accu_init
/// for iter_var in iter_range:
///     if !loop_condition: break
///     accu_var = loop_step
/// return result
/// ```
///
/// The sub-expressions are optional so that malformed trees can be
/// represented and rejected by the compiler with a precise message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comprehension {
    pub iter_var: String,
    pub iter_range: Option<Box<Expr>>,
    pub accu_var: String,
    pub accu_init: Option<Box<Expr>>,
    pub loop_condition: Option<Box<Expr>>,
    pub loop_step: Option<Box<Expr>>,
    pub result: Option<Box<Expr>>,
}

/// Positions of a comprehension's sub-expressions, in visit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComprehensionArg {
    IterRange = 0,
    AccuInit = 1,
    LoopCondition = 2,
    LoopStep = 3,
    Result = 4,
}

impl ComprehensionArg {
    pub const ALL: [ComprehensionArg; 5] = [
        ComprehensionArg::IterRange,
        ComprehensionArg::AccuInit,
        ComprehensionArg::LoopCondition,
        ComprehensionArg::LoopStep,
        ComprehensionArg::Result,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl Comprehension {
    pub fn arg(&self, arg: ComprehensionArg) -> Option<&Expr> {
        match arg {
            ComprehensionArg::IterRange => self.iter_range.as_deref(),
            ComprehensionArg::AccuInit => self.accu_init.as_deref(),
            ComprehensionArg::LoopCondition => self.loop_condition.as_deref(),
            ComprehensionArg::LoopStep => self.loop_step.as_deref(),
            ComprehensionArg::Result => self.result.as_deref(),
        }
    }

    pub fn arg_mut(&mut self, arg: ComprehensionArg) -> Option<&mut Expr> {
        match arg {
            ComprehensionArg::IterRange => self.iter_range.as_deref_mut(),
            ComprehensionArg::AccuInit => self.accu_init.as_deref_mut(),
            ComprehensionArg::LoopCondition => self.loop_condition.as_deref_mut(),
            ComprehensionArg::LoopStep => self.loop_step.as_deref_mut(),
            ComprehensionArg::Result => self.result.as_deref_mut(),
        }
    }
}
