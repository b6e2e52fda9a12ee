//! Rewrites names in an expression to their resolved, fully qualified form.
//!
//! Two sources of information are combined: the reference map produced by a
//! type checker (when available), and the overloads visible from the
//! expression container. References to enum constants become integer
//! literals, variable references become plain identifiers, and
//! receiver-style calls whose receiver is really a namespace
//! (`pkg.sub.fn(x)`) become global calls (`pkg.fn(x)`).

use hashbrown::HashSet;
use tracing::trace;

use super::Resolver;
use crate::api::BuilderWarnings;
use crate::ast::{
    ComprehensionArg, EntryKey, Expr, ExprId, ExprKind, Reference, ReferenceMap, Value, builtins,
};
use crate::compiler::CompileError;
use crate::{String, ToString, format};

/// Rewrites `expr` in place and reports whether anything changed.
///
/// Problems found along the way are recorded in `warnings`. When warnings are
/// configured to fail immediately, the first one is returned as the error once
/// the pass completes. Running the pass again over its own output changes
/// nothing. The walk recurses once per nesting level of `expr`.
pub fn resolve_references(
    expr: &mut Expr,
    reference_map: Option<&ReferenceMap>,
    resolver: &Resolver<'_>,
    warnings: &mut BuilderWarnings,
) -> Result<bool, CompileError> {
    let mut rewriter = ReferenceRewriter {
        reference_map,
        resolver,
        warnings: &mut *warnings,
        variable_references: HashSet::new(),
    };
    let changed = rewriter.rewrite(expr);
    if warnings.fail_immediately()
        && let Some(first) = warnings.warnings().first()
    {
        return Err(first.clone());
    }
    Ok(changed)
}

struct ReferenceRewriter<'a, 'r> {
    reference_map: Option<&'a ReferenceMap>,
    resolver: &'a Resolver<'r>,
    warnings: &'a mut BuilderWarnings,
    /// Nodes the reference map identifies as variables. They are never read
    /// as namespaces.
    variable_references: HashSet<ExprId>,
}

impl<'a> ReferenceRewriter<'a, '_> {
    fn reference(&self, id: ExprId) -> Option<&'a Reference> {
        self.reference_map?.get(&id)
    }

    fn warn(&mut self, warning: CompileError) {
        // Escalation is handled once the whole pass is done.
        let _ = self.warnings.add_warning(warning);
    }

    fn rewrite(&mut self, expr: &mut Expr) -> bool {
        let mut changed = self.pre_visit(expr);
        match &mut expr.kind {
            ExprKind::Const(_) | ExprKind::Ident(_) => {}
            ExprKind::Select(select) => changed |= self.rewrite(&mut select.operand),
            ExprKind::Call(call) => {
                if let Some(target) = call.target.as_deref_mut() {
                    changed |= self.rewrite(target);
                }
                for arg in &mut call.args {
                    changed |= self.rewrite(arg);
                }
            }
            ExprKind::List(list) => {
                for element in &mut list.elements {
                    changed |= self.rewrite(element);
                }
            }
            ExprKind::Struct(create) => {
                for entry in &mut create.entries {
                    if let EntryKey::Map(key) = &mut entry.key {
                        changed |= self.rewrite(key);
                    }
                    if let Some(value) = entry.value.as_deref_mut() {
                        changed |= self.rewrite(value);
                    }
                }
            }
            ExprKind::Comprehension(comprehension) => {
                for arg in ComprehensionArg::ALL {
                    if let Some(sub) = comprehension.arg_mut(arg) {
                        changed |= self.rewrite(sub);
                    }
                }
            }
        }
        changed |= self.post_visit(expr);
        changed
    }

    fn pre_visit(&mut self, expr: &mut Expr) -> bool {
        let Some(reference) = self.reference(expr.id) else {
            return false;
        };

        if let Some(value) = &reference.value {
            let Value::Int(number) = value else {
                return false;
            };
            if matches!(expr.kind, ExprKind::Const(Value::Int(current)) if current == *number) {
                return false;
            }
            trace!(id = %expr.id, value = number, "folding enum reference");
            expr.kind = ExprKind::Const(Value::Int(*number));
            return true;
        }

        let name = reference.name.clone();
        match &expr.kind {
            ExprKind::Ident(current) => {
                if name.is_empty() {
                    return false;
                }
                self.variable_references.insert(expr.id);
                if *current == name {
                    return false;
                }
                trace!(id = %expr.id, from = %current, to = %name, "rewriting identifier");
                expr.kind = ExprKind::Ident(name);
                true
            }
            ExprKind::Select(select) if select.test_only => {
                self.warn(CompileError::PresenceTestReference { expr_id: expr.id });
                false
            }
            ExprKind::Select(_) if !name.is_empty() => {
                trace!(id = %expr.id, to = %name, "collapsing select into identifier");
                expr.kind = ExprKind::Ident(name);
                self.variable_references.insert(expr.id);
                true
            }
            _ => false,
        }
    }

    fn post_visit(&mut self, expr: &mut Expr) -> bool {
        let id = expr.id;
        let missing_overloads = self
            .reference(id)
            .is_some_and(|r| r.overload_ids.is_empty());
        let ExprKind::Call(call) = &expr.kind else {
            return false;
        };
        if missing_overloads {
            self.warn(CompileError::ReferenceMissingOverloads {
                function: call.function.clone(),
                expr_id: id,
            });
        }

        let arg_count = call.args.len();
        let resolved = match &call.target {
            Some(target) => self
                .to_namespace(target)
                .and_then(|namespace| {
                    self.best_namespaced_match(&namespace, &call.function, arg_count)
                })
                .map(|function| (function, true)),
            None => best_overload_match(self.resolver, &call.function, arg_count)
                .map(|function| (function, false)),
        };

        let ExprKind::Call(call) = &mut expr.kind else {
            return false;
        };
        match resolved {
            Some((function, _)) if function == call.function && call.target.is_none() => false,
            Some((function, drop_target)) => {
                trace!(id = %id, from = %call.function, to = %function, "qualifying call");
                call.function = function;
                if drop_target {
                    call.target = None;
                }
                true
            }
            None if call.target.is_some() => {
                let receiver_args = arg_count + 1;
                let has_receiver_overload = !self
                    .resolver
                    .find_overloads(&call.function, true, receiver_args)
                    .is_empty()
                    || !self
                        .resolver
                        .find_lazy_overloads(&call.function, true, receiver_args)
                        .is_empty();
                if !has_receiver_overload {
                    let function = call.function.clone();
                    self.warn(CompileError::UnresolvedReference {
                        function,
                        expr_id: id,
                    });
                }
                false
            }
            None => {
                let function = call.function.clone();
                self.warn(CompileError::UnresolvedReference {
                    function,
                    expr_id: id,
                });
                false
            }
        }
    }

    /// Reads an identifier or select chain as a dotted namespace.
    fn to_namespace(&self, expr: &Expr) -> Option<String> {
        if self.variable_references.contains(&expr.id) {
            return None;
        }
        match &expr.kind {
            ExprKind::Ident(name) => Some(name.clone()),
            ExprKind::Select(select) if !select.test_only => {
                let parent = self.to_namespace(&select.operand)?;
                Some(format!("{}.{}", parent, select.field))
            }
            _ => None,
        }
    }

    /// Tries `ns.fn`, then drops trailing namespace segments one at a time.
    /// The bare function name is never tried.
    fn best_namespaced_match(
        &self,
        namespace: &str,
        function: &str,
        arg_count: usize,
    ) -> Option<String> {
        let mut prefix = namespace;
        loop {
            let candidate = format!("{}.{}", prefix, function);
            if let Some(found) = best_overload_match(self.resolver, &candidate, arg_count) {
                return Some(found);
            }
            match prefix.rfind('.') {
                Some(end) if end > 0 => prefix = &prefix[..end],
                _ => return None,
            }
        }
    }
}

/// Qualified name of the first candidate with a global overload taking
/// `arg_count` arguments. Absolute names are returned as written.
fn best_overload_match(
    resolver: &Resolver<'_>,
    base_name: &str,
    arg_count: usize,
) -> Option<String> {
    if builtins::is_special_function(base_name) {
        return Some(base_name.to_string());
    }
    let found = resolver
        .fully_qualified_names(base_name)
        .into_iter()
        .find(|name| resolver.overload_exists(name, false, arg_count))?;
    if base_name.starts_with('.') {
        Some(base_name.to_string())
    } else {
        Some(found)
    }
}

#[cfg(test)]
#[path = "qualify_test.rs"]
mod qualify_test;
