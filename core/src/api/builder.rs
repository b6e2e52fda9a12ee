//! The build driver.

use tracing::debug;

use super::{
    BuilderOptions, BuilderWarnings, ConstantFolder, ConstantIdents, Diagnostic, Expression,
};
use crate::ast::{CheckedExpr, Expr, ReferenceMap};
use crate::compiler::{CompileError, FlatCompiler, FlatOptions};
use crate::program::Step;
use crate::resolver::{FunctionRegistry, Resolver, TypeRegistry, resolve_references};
use crate::{String, Vec};

/// A successful build.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub expression: Expression,
    /// Resolution problems that did not fail the build.
    pub warnings: Vec<CompileError>,
}

impl BuildOutput {
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.warnings
            .iter()
            .map(CompileError::to_diagnostic)
            .collect()
    }
}

/// Builds [`Expression`]s against a fixed set of registries and options.
///
/// The builder only reads the registries, so one builder can serve any
/// number of builds.
pub struct Builder<'r> {
    functions: &'r FunctionRegistry,
    types: &'r TypeRegistry,
    options: BuilderOptions,
    folder: Option<&'r dyn ConstantFolder>,
}

impl<'r> Builder<'r> {
    pub fn new(
        functions: &'r FunctionRegistry,
        types: &'r TypeRegistry,
        options: BuilderOptions,
    ) -> Self {
        Self {
            functions,
            types,
            options,
            folder: None,
        }
    }

    /// Installs a constant folder. It only runs when
    /// [`BuilderOptions::constant_folding`] is set.
    pub fn with_constant_folder(mut self, folder: &'r dyn ConstantFolder) -> Self {
        self.folder = Some(folder);
        self
    }

    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    /// Builds a parsed expression that has no reference map.
    pub fn build(&self, expr: &Expr) -> Result<BuildOutput, CompileError> {
        self.build_with_references(expr, None)
    }

    /// Builds a type-checked expression, using its reference map to resolve
    /// names.
    pub fn build_checked(&self, checked: &CheckedExpr) -> Result<BuildOutput, CompileError> {
        self.build_with_references(&checked.expr, Some(&checked.reference_map))
    }

    fn build_with_references(
        &self,
        expr: &Expr,
        reference_map: Option<&ReferenceMap>,
    ) -> Result<BuildOutput, CompileError> {
        let options = &self.options;
        validate_container(&options.container)?;
        debug!(container = %options.container, root = %expr.id, "building expression");

        let resolver = Resolver::new(
            &options.container,
            self.functions,
            self.types,
            options.enable_qualified_type_identifiers,
        );
        let mut warnings = BuilderWarnings::new(options.fail_on_warnings);

        let reference_map = reference_map.filter(|map| !map.is_empty());
        let mut rewritten = None;
        if options.enable_qualified_identifier_rewrites || reference_map.is_some() {
            let mut copy = expr.clone();
            if resolve_references(&mut copy, reference_map, &resolver, &mut warnings)? {
                rewritten = Some(copy);
            }
        }

        let mut constant_idents = ConstantIdents::new();
        if options.constant_folding
            && let Some(folder) = self.folder
        {
            let folded = folder.fold(rewritten.as_ref().unwrap_or(expr), &mut constant_idents)?;
            rewritten = Some(folded);
        }

        let effective = rewritten.as_ref().unwrap_or(expr);
        let output = FlatCompiler::new(
            &resolver,
            FlatOptions::from(options),
            &constant_idents,
            &mut warnings,
        )
        .compile(effective)?;

        if let Some(index) = output.program.first_unpatched_jump() {
            let expr_id = output.program.get(index).map_or(expr.id, Step::id);
            return Err(CompileError::UnpatchedJump { index, expr_id });
        }

        debug!(
            steps = output.program.len(),
            warnings = warnings.len(),
            "built expression"
        );
        let expr = rewritten.unwrap_or_else(|| expr.clone());
        let expression = Expression::new(
            expr,
            output.program,
            output.iter_variable_names,
            options.runtime.clone(),
        );
        Ok(BuildOutput {
            expression,
            warnings: warnings.into_warnings(),
        })
    }
}

/// A container is a dotted name; it may be empty but must not start or end
/// with a dot.
fn validate_container(container: &str) -> Result<(), CompileError> {
    if container.starts_with('.') || container.ends_with('.') {
        return Err(CompileError::InvalidContainer {
            container: String::from(container),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "builder_test.rs"]
mod builder_test;
