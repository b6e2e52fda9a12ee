use hashbrown::HashMap;

use super::{Expr, ExprId, Value};
use crate::{String, Vec};

/// What a type checker resolved a node to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reference {
    /// Fully qualified name of the referenced variable or enum constant.
    pub name: String,
    /// Overloads a call node may dispatch to.
    pub overload_ids: Vec<String>,
    /// Constant value of the reference, set for enum constants.
    pub value: Option<Value>,
}

impl Reference {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn constant(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            overload_ids: Vec::new(),
            value: Some(value),
        }
    }

    pub fn overloads<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            overload_ids: ids.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

pub type ReferenceMap = HashMap<ExprId, Reference>;

/// An expression together with the checker's reference map.
#[derive(Debug, Clone)]
pub struct CheckedExpr {
    pub expr: Expr,
    pub reference_map: ReferenceMap,
}

impl CheckedExpr {
    pub fn new(expr: Expr, reference_map: ReferenceMap) -> Self {
        Self {
            expr,
            reference_map,
        }
    }
}
