//! Accumulator growth analysis for comprehensions.
//!
//! A loop step that uses the accumulator twice, as in `acc + acc`, doubles
//! the accumulator on every iteration, so an expression a few dozen bytes long
//! can exhaust memory. [`accumulation_references`] counts how many copies of
//! the accumulator a loop step can feed into its result, following only the
//! paths through which a value is carried forward.

use crate::ast::{Expr, ExprKind, builtins};

/// Number of times `var` can flow into the value of `expr`.
///
/// Only one branch of a conditional runs, so the larger branch counts.
/// Inner comprehensions that rebind `var` hide it. Calls other than
/// concatenation, indexing and `dyn` produce fresh values and count as zero.
/// Recurses once per nesting level of `expr`.
pub fn accumulation_references(expr: &Expr, var: &str) -> usize {
    let refs = |sub: &Expr| accumulation_references(sub, var);
    match &expr.kind {
        ExprKind::Call(call) => match (call.function.as_str(), call.args.len()) {
            (builtins::ADD, _) => call.args.iter().map(refs).sum(),
            (builtins::TERNARY, 3) => refs(&call.args[1]).max(refs(&call.args[2])),
            (builtins::INDEX, 2) | (builtins::DYN, 1) => refs(&call.args[0]),
            _ => 0,
        },
        ExprKind::Comprehension(comprehension) => {
            if comprehension.accu_var == var || comprehension.iter_var == var {
                return 0;
            }
            let step_refs = comprehension.loop_step.as_deref().map_or(0, refs);
            let result_refs = comprehension.result.as_deref().map_or(0, refs);
            step_refs.max(result_refs)
        }
        ExprKind::List(list) => list.elements.iter().map(refs).sum(),
        ExprKind::Struct(create) => create
            .entries
            .iter()
            // Map keys are hashed, never accumulated.
            .map(|entry| entry.value.as_deref().map_or(0, refs))
            .sum(),
        ExprKind::Select(select) if !select.test_only => refs(&select.operand),
        ExprKind::Ident(name) => usize::from(name == var),
        ExprKind::Select(_) | ExprKind::Const(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ExprFactory;
    use crate::vec;

    #[test]
    fn test_concatenation_counts_each_operand() {
        let mut f = ExprFactory::new();
        let lhs = f.ident("acc");
        let rhs = f.ident("acc");
        let step = f.add(lhs, rhs);
        assert_eq!(accumulation_references(&step, "acc"), 2);

        let lhs = f.ident("acc");
        let x = f.ident("x");
        let rhs = f.list(vec![x]);
        let step = f.add(lhs, rhs);
        assert_eq!(accumulation_references(&step, "acc"), 1);
    }

    #[test]
    fn test_ternary_takes_larger_branch() {
        let mut f = ExprFactory::new();
        let cond = f.ident("acc");
        let a = f.ident("acc");
        let b = f.ident("acc");
        let doubled = f.add(a, b);
        let single = f.ident("acc");
        let step = f.ternary(cond, doubled, single);
        assert_eq!(accumulation_references(&step, "acc"), 2);
    }

    #[test]
    fn test_index_dyn_and_other_calls() {
        let mut f = ExprFactory::new();
        let acc = f.ident("acc");
        let zero = f.constant(0i64);
        let indexed = f.index(acc, zero);
        assert_eq!(accumulation_references(&indexed, "acc"), 1);

        let acc = f.ident("acc");
        let dyn_call = f.call(builtins::DYN, vec![acc]);
        assert_eq!(accumulation_references(&dyn_call, "acc"), 1);

        let a = f.ident("acc");
        let b = f.ident("acc");
        let size = f.call("size", vec![a, b]);
        assert_eq!(accumulation_references(&size, "acc"), 0);
    }

    #[test]
    fn test_shadowing_comprehension_hides_var() {
        let mut f = ExprFactory::new();
        let range = f.ident("xs");
        let init = f.constant(0i64);
        let cond = f.constant(true);
        let a = f.ident("acc");
        let b = f.ident("acc");
        let step = f.add(a, b);
        let result = f.ident("acc");
        let inner = f.comprehension("y", range, "acc", init, cond, step, result);
        assert_eq!(accumulation_references(&inner, "acc"), 0);
        assert_eq!(accumulation_references(&inner, "other"), 0);
    }

    #[test]
    fn test_select_and_struct() {
        let mut f = ExprFactory::new();
        let acc = f.ident("acc");
        let sel = f.select(acc, "field");
        assert_eq!(accumulation_references(&sel, "acc"), 1);

        let acc = f.ident("acc");
        let has = f.presence_test(acc, "field");
        assert_eq!(accumulation_references(&has, "acc"), 0);

        let k = f.ident("acc");
        let v = f.ident("acc");
        let k2 = f.constant("b");
        let v2 = f.ident("acc");
        let map = f.map(vec![(k, v), (k2, v2)]);
        assert_eq!(accumulation_references(&map, "acc"), 2);
    }
}
