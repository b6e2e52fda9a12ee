//! Built, ready-to-evaluate expressions.

use alloc::collections::BTreeSet;

use super::RuntimeOptions;
use crate::String;
use crate::ast::Expr;
use crate::program::Program;

/// An executable unit: the program plus everything the evaluator needs to
/// run it.
///
/// Expressions are immutable once built and can be shared between threads.
#[derive(Debug, Clone)]
pub struct Expression {
    expr: Expr,
    program: Program,
    iter_variable_names: BTreeSet<String>,
    runtime: RuntimeOptions,
}

impl Expression {
    pub(crate) fn new(
        expr: Expr,
        program: Program,
        iter_variable_names: BTreeSet<String>,
        runtime: RuntimeOptions,
    ) -> Self {
        Self {
            expr,
            program,
            iter_variable_names,
            runtime,
        }
    }

    /// The tree the program was compiled from, after rewriting and folding.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Comprehension variable names, which the evaluator binds in its own
    /// scopes rather than reading from the activation.
    pub fn iter_variable_names(&self) -> &BTreeSet<String> {
        &self.iter_variable_names
    }

    pub fn runtime_options(&self) -> &RuntimeOptions {
        &self.runtime
    }
}

static_assertions::assert_impl_all!(Expression: Send, Sync);
