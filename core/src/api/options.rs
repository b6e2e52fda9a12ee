//! Configuration options for building and running expressions.

use crate::String;

/// What the runtime does when integer arithmetic overflows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Produce an overflow error value.
    #[default]
    Error,
    /// Wrap around.
    Wrap,
}

/// Options carried with a built expression for the evaluator.
///
/// The builder does not interpret these; it hands them to the executable unit
/// unchanged.
///
/// # Example
///
/// ```
/// use flatcel_core::api::RuntimeOptions;
///
/// let options = RuntimeOptions {
///     comprehension_max_iterations: 10_000,
///     ..RuntimeOptions::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeOptions {
    /// Maximum number of comprehension iterations per evaluation, summed over
    /// all comprehensions.
    ///
    /// Set to 0 for unlimited iterations (be careful with untrusted code!).
    ///
    /// Default: 0
    pub comprehension_max_iterations: usize,

    /// Track unknown attributes instead of failing on them.
    ///
    /// Default: false
    pub enable_unknowns: bool,

    /// Treat results of unknown functions as unknowns.
    ///
    /// Default: false
    pub enable_unknown_function_results: bool,

    /// Produce errors for attributes flagged as missing by the activation.
    ///
    /// Default: false
    pub enable_missing_attribute_errors: bool,

    /// Allow `null` to coerce into message-typed arguments.
    ///
    /// Default: true
    pub enable_null_coercion: bool,

    /// Compare values of different numeric types by value.
    ///
    /// Default: false
    pub enable_heterogeneous_equality: bool,

    /// Default: [`OverflowPolicy::Error`]
    pub overflow: OverflowPolicy,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            comprehension_max_iterations: 0,
            enable_unknowns: false,
            enable_unknown_function_results: false,
            enable_missing_attribute_errors: false,
            enable_null_coercion: true,
            enable_heterogeneous_equality: false,
            overflow: OverflowPolicy::Error,
        }
    }
}

/// Options controlling how expressions are compiled.
///
/// # Example
///
/// ```
/// use flatcel_core::api::BuilderOptions;
///
/// let options = BuilderOptions {
///     container: "google.api".into(),
///     short_circuiting: false,
///     ..BuilderOptions::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderOptions {
    /// Namespace names are resolved against, e.g. `pkg.sub`.
    ///
    /// Default: ""
    pub container: String,

    /// Emit jumps that skip operands whose value cannot change the result.
    ///
    /// Default: true
    pub short_circuiting: bool,

    /// Run the installed constant folder before compiling.
    ///
    /// Default: false
    pub constant_folding: bool,

    /// Default: true
    pub enable_comprehension: bool,

    /// Compile `accu + [e]` loop steps over an empty-list accumulator as an
    /// in-place append.
    ///
    /// Default: true
    pub enable_comprehension_list_append: bool,

    /// Reject comprehensions whose loop step references the accumulator more
    /// than once, since those can grow exponentially.
    ///
    /// Default: true
    pub enable_comprehension_vulnerability_check: bool,

    /// Resolve names against the container even without a reference map.
    ///
    /// Default: false
    pub enable_qualified_identifier_rewrites: bool,

    /// Resolve dotted identifiers such as `pkg.Type` to type values.
    ///
    /// Default: false
    pub enable_qualified_type_identifiers: bool,

    /// Let field selection unwrap null wrapper values.
    ///
    /// Default: false
    pub enable_wrapper_type_null_unboxing: bool,

    /// Fail the build on the first resolution warning.
    ///
    /// Default: false
    pub fail_on_warnings: bool,

    /// Passed through to the built expression.
    pub runtime: RuntimeOptions,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            container: String::new(),
            short_circuiting: true,
            constant_folding: false,
            enable_comprehension: true,
            enable_comprehension_list_append: true,
            enable_comprehension_vulnerability_check: true,
            enable_qualified_identifier_rewrites: false,
            enable_qualified_type_identifiers: false,
            enable_wrapper_type_null_unboxing: false,
            fail_on_warnings: false,
            runtime: RuntimeOptions::default(),
        }
    }
}
