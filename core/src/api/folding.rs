//! Hook for constant folding, run between name resolution and compilation.

use hashbrown::HashMap;

use crate::String;
use crate::ast::{Expr, Value};
use crate::compiler::CompileError;

/// Values the folder extracted from the tree, keyed by the identifier it
/// left in their place. The compiler emits them as plain constants.
pub type ConstantIdents = HashMap<String, Value>;

/// Evaluates constant subtrees ahead of time.
///
/// Implementations return the folded tree. A subtree whose value cannot be
/// written as a literal (a list, say) may be replaced by an identifier that
/// is recorded in `idents`.
pub trait ConstantFolder {
    fn fold(&self, expr: &Expr, idents: &mut ConstantIdents) -> Result<Expr, CompileError>;
}
