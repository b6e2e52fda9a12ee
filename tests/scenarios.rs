#[macro_use]
mod cases;

use cases::{FUNCTIONS, TYPES, build_with, factory, program_of};
use flatcel::{
    Builder, BuilderOptions, CheckedExpr, CompileError, ExprKind, Reference, ReferenceMap, Step,
    Value,
};
use pretty_assertions::assert_eq;

fn exhaustive() -> BuilderOptions {
    BuilderOptions {
        short_circuiting: false,
        ..BuilderOptions::default()
    }
}

compile_case!(
    literal,
    expr: |f| f.constant(1i64),
    steps: 1,
    jumps: 0,
);

compile_case!(
    and_exhaustive,
    expr: |f| {
        let lhs = f.constant(true);
        let rhs = f.constant(false);
        f.and(lhs, rhs)
    },
    options: exhaustive(),
    steps: 3,
    jumps: 0,
);

compile_case!(
    and_short_circuit,
    expr: |f| {
        let lhs = f.constant(true);
        let rhs = f.constant(false);
        f.and(lhs, rhs)
    },
    steps: 4,
    jumps: 1,
);

compile_case!(
    ternary_exhaustive,
    expr: |f| {
        let cond = f.ident("cond");
        let x = f.ident("x");
        let y = f.ident("y");
        f.ternary(cond, x, y)
    },
    options: exhaustive(),
    steps: 4,
    jumps: 0,
);

compile_case!(
    ternary_short_circuit,
    expr: |f| {
        let cond = f.ident("cond");
        let x = f.ident("x");
        let y = f.ident("y");
        f.ternary(cond, x, y)
    },
    steps: 6,
    jumps: 3,
);

compile_case!(
    chained_or,
    expr: |f| {
        let a = f.ident("a");
        let b = f.ident("b");
        let c = f.ident("c");
        let ab = f.or(a, b);
        f.or(ab, c)
    },
    steps: 7,
    jumps: 2,
);

compile_case!(
    lazy_function_call,
    expr: |f| f.call("now", Vec::new()),
    steps: 1,
    jumps: 0,
);

#[test]
fn test_listing_of_short_circuit_and() {
    let mut f = factory();
    let a = f.ident("a");
    let b = f.ident("b");
    let expr = f.and(a, b);
    let program = program_of(&expr, BuilderOptions::default());

    let expected = "\
Program {
  steps:
       0       Ident a  ; #1
       1       JumpIffalse keep +2  ; #3 (to L0)
       2       Ident b  ; #2
       3       And  ; #3
       4  L0:
}";
    assert_eq!(format!("{:?}", program), expected);
}

#[test]
fn test_ternary_error_jump_shares_end_target() {
    let mut f = factory();
    let cond = f.ident("cond");
    let x = f.ident("x");
    let y = f.ident("y");
    let expr = f.ternary(cond, x, y);
    let program = program_of(&expr, BuilderOptions::default());

    let jumps: Vec<usize> = (0..program.len()).filter(|&i| program.steps()[i].is_jump()).collect();
    assert_eq!(jumps, vec![1, 2, 4]);
    assert_eq!(program.target_of(1), program.target_of(4));
    assert_eq!(program.target_of(1), Some(program.len()));
}

#[test]
fn test_enum_constant_from_checked_reference() {
    let mut f = factory();
    let expr = f.path("a.b.C");
    let mut references = ReferenceMap::new();
    references.insert(expr.id, Reference::constant("a.b.C", Value::Int(7)));

    let builder = Builder::new(&FUNCTIONS, &TYPES, BuilderOptions::default());
    let output = builder
        .build_checked(&CheckedExpr::new(expr.clone(), references))
        .unwrap();

    assert_eq!(
        output.expression.program().steps(),
        &[Step::Const {
            id: expr.id,
            value: Value::Int(7),
        }]
    );
}

#[test]
fn test_enum_constant_from_type_registry() {
    let mut f = factory();
    let expr = f.path("Color.GREEN");
    let options = BuilderOptions {
        container: "google.api".into(),
        ..BuilderOptions::default()
    };
    let program = program_of(&expr, options);

    assert_eq!(
        program.steps(),
        &[Step::ShadowableConst {
            id: expr.id,
            name: "Color.GREEN".into(),
            value: Value::Int(1),
        }]
    );
}

#[test]
fn test_namespaced_function_resolves_without_warnings() {
    let mut f = factory();
    let target = f.path("google.api.sub");
    let arg = f.constant("key");
    let expr = f.receiver_call("lookup", target, vec![arg]);
    let options = BuilderOptions {
        enable_qualified_identifier_rewrites: true,
        ..BuilderOptions::default()
    };

    let output = build_with(&expr, options).unwrap();
    assert!(output.warnings.is_empty(), "{:?}", output.warnings);
    let rewritten = output.expression.expr().as_call().unwrap();
    assert_eq!(rewritten.function, "google.api.lookup");
    assert!(rewritten.target.is_none());
}

#[test]
fn test_rewrite_is_idempotent_across_builds() {
    let mut f = factory();
    let target = f.path("google.api.sub");
    let arg = f.constant("key");
    let expr = f.receiver_call("lookup", target, vec![arg]);
    let options = BuilderOptions {
        enable_qualified_identifier_rewrites: true,
        ..BuilderOptions::default()
    };

    let first = build_with(&expr, options.clone()).unwrap();
    let second = build_with(first.expression.expr(), options).unwrap();
    assert_eq!(second.expression.expr(), first.expression.expr());
    assert_eq!(second.expression.program(), first.expression.program());
}

#[test]
fn test_message_creation_in_container() {
    let mut f = factory();
    let x = f.constant(1i64);
    let y = f.constant(2i64);
    let expr = f.message("Point", vec![("x", x), ("y", y)]);
    let options = BuilderOptions {
        container: "google.api".into(),
        ..BuilderOptions::default()
    };
    let program = program_of(&expr, options);

    assert!(matches!(
        program.steps().last(),
        Some(Step::CreateStruct { message_type: Some(name), .. }) if name == "google.api.Point"
    ));
}

#[test]
fn test_node_ids_survive_rewrite() {
    let mut f = factory();
    let arg = f.constant(1i64);
    let expr = f.call("lookup", vec![arg]);
    let options = BuilderOptions {
        container: "google.api".into(),
        enable_qualified_identifier_rewrites: true,
        ..BuilderOptions::default()
    };

    let output = build_with(&expr, options).unwrap();
    let rewritten = output.expression.expr();
    assert_eq!(rewritten.id, expr.id);
    assert!(matches!(
        &rewritten.kind,
        ExprKind::Call(call) if call.function == "google.api.lookup"
    ));
}

#[test]
fn test_container_must_be_well_formed() {
    let mut f = factory();
    let expr = f.constant(true);
    let options = BuilderOptions {
        container: "google.".into(),
        ..BuilderOptions::default()
    };
    let err = build_with(&expr, options).unwrap_err();
    assert_eq!(err.to_string(), "Invalid expression container: 'google.'");
    assert!(matches!(err, CompileError::InvalidContainer { .. }));
}
