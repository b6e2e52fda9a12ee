//! flatcel - compiles expression trees into flat stack-machine programs
//!
//! # Overview
//!
//! flatcel takes the tree a parser (and, optionally, a type checker) produced
//! for a small side-effect-free expression language and turns it into a
//! [`Program`]: a linear list of steps an interpreter runs with a value stack
//! and no recursion. Boolean operators and the conditional operator keep
//! their short-circuit behaviour through jumps, and comprehension loops are
//! laid out as a fixed sequence of loop-control steps.
//!
//! # Quick Start
//!
//! ```
//! use flatcel::{
//!     Builder, BuilderOptions, ExprFactory, FunctionDescriptor, FunctionRegistry, TypeRegistry,
//! };
//!
//! let mut functions = FunctionRegistry::new();
//! functions.register(FunctionDescriptor::global("_<_", 2, "less_int64")).unwrap();
//! let types = TypeRegistry::new();
//! let builder = Builder::new(&functions, &types, BuilderOptions::default());
//!
//! // x < 10 && ok
//! let mut f = ExprFactory::new();
//! let x = f.ident("x");
//! let ten = f.constant(10i64);
//! let less = f.call("_<_", vec![x, ten]);
//! let ok = f.ident("ok");
//! let expr = f.and(less, ok);
//!
//! let output = builder.build(&expr).unwrap();
//! let program = output.expression.program();
//! assert_eq!(program.len(), 6);
//! assert_eq!(program.jump_count(), 1);
//! ```
//!
//! # Pipeline
//!
//! 1. **Rewrite**: names are qualified against the container, using the
//!    checker's reference map when there is one
//! 2. **Fold**: an optional [`ConstantFolder`] precomputes constant subtrees
//! 3. **Compile**: the tree is flattened, with jumps patched as their targets
//!    become known
//!
//! Warnings about unresolved names are collected in the [`BuildOutput`];
//! set [`BuilderOptions::fail_on_warnings`] to turn them into errors.

// Re-export public API from flatcel_core
pub use flatcel_core::api::{
    BuildOutput, Builder, BuilderOptions, BuilderWarnings, ConstantFolder, ConstantIdents,
    Diagnostic, Expression, OverflowPolicy, RuntimeOptions, Severity,
};

// Re-export the tree, program and registry types
pub use flatcel_core::ast::{
    self, CheckedExpr, Expr, ExprFactory, ExprId, ExprKind, Reference, ReferenceMap, Value,
};
pub use flatcel_core::program::{self, Binding, LoopSlot, OverloadId, Program, Step};
pub use flatcel_core::resolver::{
    FunctionDescriptor, FunctionRegistry, RegistryError, TypeRegistry,
};

// Re-export errors
pub use flatcel_core::compiler::{CompileError, ErrorCategory};
