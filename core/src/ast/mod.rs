//! Expression trees consumed by the compiler.
//!
//! The tree is owned and plain: every node carries an [`ExprId`] and one of
//! the [`ExprKind`] shapes. Trees typically come from a parser, optionally
//! paired with a type checker's [`ReferenceMap`] as a [`CheckedExpr`].

pub mod builtins;
mod checked;
mod expr;
mod factory;
mod traverse;
mod value;

pub use checked::{CheckedExpr, Reference, ReferenceMap};
pub use expr::{
    Call, Comprehension, ComprehensionArg, CreateList, CreateStruct, Entry, EntryKey, Expr,
    ExprId, ExprKind, Select,
};
pub use factory::{ACCUMULATOR_VAR, ExprFactory};
pub use traverse::{AstVisitor, traverse};
pub use value::Value;
