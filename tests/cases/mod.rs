#![allow(dead_code)]

use flatcel::{
    BuildOutput, Builder, BuilderOptions, CompileError, Expr, ExprFactory, FunctionDescriptor,
    FunctionRegistry, Program, TypeRegistry,
};
use once_cell::sync::Lazy;

/// Overloads for the operators and functions used across the test files.
pub static FUNCTIONS: Lazy<FunctionRegistry> = Lazy::new(|| {
    let mut functions = FunctionRegistry::new();
    let globals = [
        ("_+_", 2, "add_int64"),
        ("_-_", 2, "subtract_int64"),
        ("_<_", 2, "less_int64"),
        ("_==_", 2, "equals"),
        ("!_", 1, "logical_not"),
        ("@not_strictly_false", 1, "not_strictly_false"),
        ("size", 1, "size_list"),
        ("google.api.lookup", 1, "lookup_string"),
    ];
    for (name, arg_count, id) in globals {
        functions
            .register(FunctionDescriptor::global(name, arg_count, id))
            .unwrap();
    }
    functions
        .register(FunctionDescriptor::receiver("size", 1, "list_size"))
        .unwrap();
    functions
        .register(FunctionDescriptor::receiver("startsWith", 2, "starts_with"))
        .unwrap();
    functions
        .register_lazy(FunctionDescriptor::global("now", 0, "now"))
        .unwrap();
    functions
});

pub static TYPES: Lazy<TypeRegistry> = Lazy::new(|| {
    let mut types = TypeRegistry::new();
    types.register_message("google.api.Point").unwrap();
    types
        .register_enum("google.api.Color", [("RED", 0), ("GREEN", 1), ("BLUE", 2)])
        .unwrap();
    types
});

pub fn build_with(expr: &Expr, options: BuilderOptions) -> Result<BuildOutput, CompileError> {
    Builder::new(&FUNCTIONS, &TYPES, options).build(expr)
}

pub fn program_of(expr: &Expr, options: BuilderOptions) -> Program {
    build_with(expr, options)
        .unwrap()
        .expression
        .program()
        .clone()
}

/// Declares a test that builds an expression and checks the step and jump
/// counts of the program.
///
/// ```ignore
/// compile_case!(
///     name,
///     expr: |f| f.constant(1i64),
///     steps: 1,
///     jumps: 0,
/// );
/// ```
#[macro_export]
macro_rules! compile_case {
    (
        $name:ident,
        expr: $build:expr,
        $(options: $options:expr,)?
        steps: $steps:expr,
        jumps: $jumps:expr $(,)?
    ) => {
        #[test]
        fn $name() {
            let mut factory = flatcel::ExprFactory::new();
            let build: fn(&mut flatcel::ExprFactory) -> flatcel::Expr = $build;
            let expr = build(&mut factory);
            #[allow(unused_mut, unused_assignments)]
            let mut options = flatcel::BuilderOptions::default();
            $(options = $options;)?
            let program = $crate::cases::program_of(&expr, options);
            assert_eq!(program.len(), $steps, "steps of {:?}", program);
            assert_eq!(program.jump_count(), $jumps, "jumps of {:?}", program);
            assert_eq!(program.first_unpatched_jump(), None);
        }
    };
}

pub fn factory() -> ExprFactory {
    ExprFactory::new()
}
