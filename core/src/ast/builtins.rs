//! Names of the functions the compiler treats specially.

pub const AND: &str = "_&&_";
pub const OR: &str = "_||_";
pub const NOT: &str = "!_";
pub const TERNARY: &str = "_?_:_";
pub const INDEX: &str = "_[_]";
pub const ADD: &str = "_+_";
pub const EQUALS: &str = "_==_";
pub const DYN: &str = "dyn";
pub const NOT_STRICTLY_FALSE: &str = "@not_strictly_false";

/// Functions that compile to dedicated steps, so the reference resolver never
/// reports them as unresolved.
pub fn is_special_function(name: &str) -> bool {
    matches!(name, AND | OR | TERNARY | INDEX)
}
