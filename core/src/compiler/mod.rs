//! Flat compiler for expression trees.
//!
//! This module turns an expression tree into a [`Program`]: a flat sequence
//! of stack-machine steps that evaluates the tree in one pass. The compiler
//! uses the visitor pattern to walk the tree and emit steps.
//!
//! ## Design
//!
//! - Walks the tree with an explicit stack, so step emission does not recurse
//!   on depth. The accumulation analysis in [`safety`] and the reference
//!   rewrite do recurse, as do `Clone` and `Drop` on [`Expr`], so callers
//!   bound tree depth before compiling untrusted input
//! - Appends jumps with unset offsets and patches them once targets are known
//! - Uses one control-flow frame per `&&`, `||`, `?:` and comprehension
//! - Rejects comprehensions whose accumulator can grow exponentially
//!
//! [`Expr`]: crate::ast::Expr
//! [`Program`]: crate::program::Program

mod cond;
mod emit;
mod error;
mod flat;
pub mod safety;


pub use error::{CompileError, ErrorCategory};
pub use flat::{FlatCompiler, FlatOptions, FlatOutput};
