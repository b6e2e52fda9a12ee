#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]

extern crate alloc;

// Re-export for convenience so other modules don't need alloc:: prefix
#[allow(unused_imports)]
pub(crate) use alloc::{boxed::Box, format, string::String, string::ToString, vec, vec::Vec};

pub mod api;
pub mod ast;
pub mod compiler;
pub mod program;
pub mod resolver;

/// Test utilities for enabling logging in tests
#[cfg(test)]
pub mod test_utils {
    /// Initialize tracing subscriber for tests with DEBUG level
    /// Call this at the start of tests where you want to see logging output
    ///
    /// # Example
    /// ```ignore
    /// #[test]
    /// fn test_comprehension_layout() {
    ///     test_utils::init_test_logging();
    ///     // ... your test code
    /// }
    /// ```
    pub fn init_test_logging() {
        use tracing_subscriber::{EnvFilter, fmt};

        // Try to initialize, ignore error if already initialized
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }

    use crate::api::BuilderWarnings;
    use crate::ast::{Expr, Value};
    use crate::compiler::{CompileError, FlatCompiler, FlatOptions, FlatOutput};
    use crate::resolver::{FunctionDescriptor, FunctionRegistry, Resolver, TypeRegistry};

    /// Registry with the operators the macro expansions use.
    pub fn standard_functions() -> FunctionRegistry {
        let mut functions = FunctionRegistry::new();
        for (name, arg_count, id) in [
            ("_+_", 2, "add"),
            ("_==_", 2, "equals"),
            ("_<_", 2, "less"),
            ("!_", 1, "logical_not"),
            ("@not_strictly_false", 1, "not_strictly_false"),
            ("size", 1, "size"),
        ] {
            functions
                .register(FunctionDescriptor::global(name, arg_count, id))
                .unwrap();
        }
        functions
            .register(FunctionDescriptor::receiver("size", 1, "size_receiver"))
            .unwrap();
        functions
    }

    /// Runs the flat compiler directly, without the rewrite pass.
    pub fn compile_flat(
        expr: &Expr,
        options: FlatOptions,
        functions: &FunctionRegistry,
        types: &TypeRegistry,
        container: &str,
    ) -> (Result<FlatOutput, CompileError>, BuilderWarnings) {
        let resolver = Resolver::new(container, functions, types, false);
        let idents = hashbrown::HashMap::<crate::String, Value>::new();
        let mut warnings = BuilderWarnings::new(false);
        let result = FlatCompiler::new(&resolver, options, &idents, &mut warnings).compile(expr);
        (result, warnings)
    }
}
