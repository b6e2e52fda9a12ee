//! Public API for building flat programs from expression trees.
//!
//! A [`Builder`] holds the registries and options shared by every build.
//! Each call to [`Builder::build`] or [`Builder::build_checked`] runs the
//! pipeline once:
//!
//! 1. validate the container
//! 2. rewrite references to their qualified names
//! 3. fold constants, when a [`ConstantFolder`] is installed
//! 4. compile the tree to a [`Program`](crate::program::Program)
//!
//! # Example
//!
//! ```
//! use flatcel_core::api::{Builder, BuilderOptions};
//! use flatcel_core::ast::ExprFactory;
//! use flatcel_core::resolver::{FunctionDescriptor, FunctionRegistry, TypeRegistry};
//!
//! let mut functions = FunctionRegistry::new();
//! functions.register(FunctionDescriptor::global("_+_", 2, "add_int64")).unwrap();
//! let types = TypeRegistry::new();
//!
//! let builder = Builder::new(&functions, &types, BuilderOptions::default());
//!
//! let mut f = ExprFactory::new();
//! let lhs = f.ident("x");
//! let rhs = f.constant(1i64);
//! let expr = f.add(lhs, rhs);
//!
//! let output = builder.build(&expr).unwrap();
//! assert!(output.warnings.is_empty());
//! assert_eq!(output.expression.program().len(), 3);
//! ```

mod builder;
pub mod error;
mod expression;
mod folding;
pub mod options;
mod warnings;

pub use builder::{BuildOutput, Builder};
pub use error::{Diagnostic, Severity};
pub use expression::Expression;
pub use folding::{ConstantFolder, ConstantIdents};
pub use options::{BuilderOptions, OverflowPolicy, RuntimeOptions};
pub use warnings::BuilderWarnings;
