use alloc::collections::{BTreeSet, VecDeque};

use hashbrown::HashMap;
use tracing::debug;

use super::CompileError;
use super::cond::{BinaryCond, BoolOp, ComprehensionCond, CondFrame, TernaryCond};
use super::emit::Emitter;
use crate::api::{BuilderOptions, BuilderWarnings};
use crate::ast::{
    AstVisitor, Call, Comprehension, CreateList, CreateStruct, EntryKey, Expr, ExprId, ExprKind,
    Select, Value, builtins, traverse,
};
use crate::program::{Program, Step, StructKeys};
use crate::resolver::Resolver;
use crate::{String, ToString, Vec, format};

/// Compiler switches, taken from [`BuilderOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatOptions {
    pub short_circuiting: bool,
    pub enable_comprehension: bool,
    pub enable_comprehension_list_append: bool,
    pub enable_comprehension_vulnerability_check: bool,
    pub enable_wrapper_type_null_unboxing: bool,
}

impl Default for FlatOptions {
    fn default() -> Self {
        (&BuilderOptions::default()).into()
    }
}

impl From<&BuilderOptions> for FlatOptions {
    fn from(options: &BuilderOptions) -> Self {
        Self {
            short_circuiting: options.short_circuiting,
            enable_comprehension: options.enable_comprehension,
            enable_comprehension_list_append: options.enable_comprehension_list_append,
            enable_comprehension_vulnerability_check: options
                .enable_comprehension_vulnerability_check,
            enable_wrapper_type_null_unboxing: options.enable_wrapper_type_null_unboxing,
        }
    }
}

/// Result of a successful compilation.
#[derive(Debug, Clone)]
pub struct FlatOutput {
    pub program: Program,
    /// Accumulator and iteration variable names of every comprehension.
    pub iter_variable_names: BTreeSet<String>,
}

struct CondRecord {
    id: ExprId,
    frame: CondFrame,
}

/// Comprehension currently being compiled, for list-append detection.
struct LoopScope {
    /// Set only when the list-append rewrite applies to this comprehension.
    accu_init_id: Option<ExprId>,
    append_call_id: Option<ExprId>,
}

/// Compiles an expression tree into a flat [`Program`].
///
/// The tree is walked once, in evaluation order, and each node appends its
/// steps after those of its operands. Operators that need jumps between
/// their operands are handled by control-flow frames (see `cond.rs`).
///
/// The first structural error stops emission; the walk still completes so
/// that overload warnings are reported for every call.
pub struct FlatCompiler<'a> {
    resolver: &'a Resolver<'a>,
    options: FlatOptions,
    constant_idents: &'a HashMap<String, Value>,
    warnings: &'a mut BuilderWarnings,
    emitter: Emitter,
    cond_stack: Vec<CondRecord>,
    loop_scopes: Vec<LoopScope>,
    /// Pending select suffixes of the select chain being entered, paired with
    /// the id of the select each belongs to. The front is the outermost.
    namespace_stack: VecDeque<(ExprId, String)>,
    /// Dotted path of every select whose operand chain starts at an ident.
    namespace_map: HashMap<ExprId, String>,
    /// Outermost select of a chain already emitted as a constant; its inner
    /// selects emit nothing.
    resolved_select: Option<ExprId>,
    iter_variable_names: BTreeSet<String>,
}

impl<'a> FlatCompiler<'a> {
    pub fn new(
        resolver: &'a Resolver<'a>,
        options: FlatOptions,
        constant_idents: &'a HashMap<String, Value>,
        warnings: &'a mut BuilderWarnings,
    ) -> Self {
        Self {
            resolver,
            options,
            constant_idents,
            warnings,
            emitter: Emitter::new(),
            cond_stack: Vec::new(),
            loop_scopes: Vec::new(),
            namespace_stack: VecDeque::new(),
            namespace_map: HashMap::new(),
            resolved_select: None,
            iter_variable_names: BTreeSet::new(),
        }
    }

    pub fn compile(mut self, expr: &'a Expr) -> Result<FlatOutput, CompileError> {
        traverse(expr, &mut self);
        let program = self.emitter.finish()?;
        debug!(steps = program.len(), jumps = program.jump_count(), "compiled program");
        Ok(FlatOutput {
            program,
            iter_variable_names: self.iter_variable_names,
        })
    }

    fn add_step(&mut self, step: Step) {
        self.emitter.add_step(step);
    }

    /// Finishes and pops the frame opened for `expr`, if it is on top.
    fn close_frame(&mut self, expr: &Expr) -> bool {
        match self.cond_stack.last_mut() {
            Some(record) if record.id == expr.id => {
                record.frame.post_visit(expr, &mut self.emitter);
                self.cond_stack.pop();
                true
            }
            _ => false,
        }
    }

    fn is_list_append(&self, id: ExprId) -> bool {
        self.loop_scopes
            .last()
            .is_some_and(|scope| scope.append_call_id == Some(id))
    }

    /// Records a call's overloads, or a warning when it has none.
    fn resolve_call(&mut self, call: &Call, expr: &Expr) -> Result<Step, CompileError> {
        let receiver_style = call.target.is_some();
        let arg_count = call.args.len() + usize::from(receiver_style);
        let mut overloads = self
            .resolver
            .find_lazy_overloads(&call.function, receiver_style, arg_count);
        if overloads.is_empty() {
            overloads = self
                .resolver
                .find_overloads(&call.function, receiver_style, arg_count);
        }
        if overloads.is_empty() {
            self.warnings.add_warning(CompileError::NoMatchingOverload {
                function: call.function.clone(),
                expr_id: expr.id,
            })?;
        }
        Ok(Step::Call {
            id: expr.id,
            function: call.function.clone(),
            receiver_style,
            arg_count,
            overloads,
        })
    }
}

/// Which comprehension nodes take part in the list-append rewrite: the empty
/// list accumulator and the `accu + [e]` call that grows it.
fn list_append_ids(comprehension: &Comprehension) -> Option<(ExprId, ExprId)> {
    let init = comprehension.accu_init.as_deref()?;
    if !matches!(&init.kind, ExprKind::List(list) if list.elements.is_empty()) {
        return None;
    }
    let is_append = |expr: &Expr| match &expr.kind {
        ExprKind::Call(call) => {
            call.function == builtins::ADD
                && call.target.is_none()
                && call.args.len() == 2
                && call.args[0].as_ident() == Some(comprehension.accu_var.as_str())
                && matches!(call.args[1].kind, ExprKind::List(_))
        }
        _ => false,
    };
    let step = comprehension.loop_step.as_deref()?;
    if is_append(step) {
        return Some((init.id, step.id));
    }
    match &step.kind {
        ExprKind::Call(call)
            if call.function == builtins::TERNARY
                && call.args.len() == 3
                && is_append(&call.args[1]) =>
        {
            Some((init.id, call.args[1].id))
        }
        _ => None,
    }
}

impl<'a> AstVisitor<'a> for FlatCompiler<'a> {
    fn post_visit_const(&mut self, value: &'a Value, expr: &'a Expr) {
        self.add_step(Step::Const {
            id: expr.id,
            value: value.clone(),
        });
    }

    fn post_visit_ident(&mut self, name: &'a str, expr: &'a Expr) {
        if !self.emitter.ok() {
            return;
        }
        if !self.emitter.validate(
            !name.is_empty(),
            "Invalid expression: identifier 'name' must not be empty",
            expr.id,
        ) {
            self.namespace_stack.clear();
            return;
        }

        if let Some(value) = self.constant_idents.get(name) {
            // A folded ident never heads a namespace path.
            self.namespace_stack.clear();
            self.add_step(Step::Const {
                id: expr.id,
                value: value.clone(),
            });
            return;
        }

        // `a.b.C` may name an enum constant or type. Try the longest path
        // first; the first match replaces the whole chain.
        while let Some((select_id, suffix)) = self.namespace_stack.pop_front() {
            let qualified = format!("{}.{}", name, suffix);
            self.namespace_map.insert(select_id, qualified.clone());
            if let Some(value) = self.resolver.find_constant(&qualified) {
                self.add_step(Step::ShadowableConst {
                    id: select_id,
                    name: qualified,
                    value,
                });
                self.resolved_select = Some(select_id);
                self.namespace_stack.clear();
                return;
            }
        }

        match self.resolver.find_constant(name) {
            Some(value) => {
                self.add_step(Step::ShadowableConst {
                    id: expr.id,
                    name: name.to_string(),
                    value,
                })
            }
            None => self.add_step(Step::Ident {
                id: expr.id,
                name: name.to_string(),
            }),
        }
    }

    fn pre_visit_select(&mut self, select: &'a Select, expr: &'a Expr) {
        if !self.emitter.ok() {
            return;
        }
        if !self.emitter.validate(
            !select.field.is_empty(),
            "Invalid expression: select 'field' must not be empty",
            expr.id,
        ) {
            return;
        }
        let extends_path = !select.test_only
            && matches!(
                select.operand.kind,
                ExprKind::Ident(_) | ExprKind::Select(_)
            );
        if extends_path {
            for (_, suffix) in self.namespace_stack.iter_mut() {
                *suffix = format!("{}.{}", select.field, suffix);
            }
            self.namespace_stack
                .push_back((expr.id, select.field.clone()));
        } else {
            self.namespace_stack.clear();
        }
    }

    fn post_visit_select(&mut self, select: &'a Select, expr: &'a Expr) {
        if !self.emitter.ok() {
            return;
        }
        if let Some(resolved) = self.resolved_select {
            if resolved == expr.id {
                self.resolved_select = None;
            }
            return;
        }
        self.add_step(Step::Select {
            id: expr.id,
            field: select.field.clone(),
            test_only: select.test_only,
            qualified_path: self.namespace_map.get(&expr.id).cloned(),
            unbox_null_wrappers: self.options.enable_wrapper_type_null_unboxing,
        });
    }

    fn pre_visit_call(&mut self, call: &'a Call, expr: &'a Expr) {
        if !self.emitter.ok() {
            return;
        }
        let short_circuiting = self.options.short_circuiting;
        let mut frame = match call.function.as_str() {
            builtins::AND => CondFrame::Binary(BinaryCond::new(BoolOp::And, short_circuiting)),
            builtins::OR => CondFrame::Binary(BinaryCond::new(BoolOp::Or, short_circuiting)),
            builtins::TERNARY if short_circuiting => CondFrame::Ternary(TernaryCond::default()),
            builtins::TERNARY => CondFrame::ExhaustiveTernary,
            _ => return,
        };
        frame.pre_visit(expr, &mut self.emitter);
        self.cond_stack.push(CondRecord { id: expr.id, frame });
    }

    fn post_visit_call(&mut self, call: &'a Call, expr: &'a Expr) {
        if !self.emitter.ok() {
            // Keep reporting unresolved calls after a failure.
            if !builtins::is_special_function(&call.function) && !self.is_list_append(expr.id) {
                let _ = self.resolve_call(call, expr);
            }
            return;
        }

        if self.close_frame(expr) {
            return;
        }

        if call.function == builtins::INDEX {
            self.add_step(Step::ContainerAccess { id: expr.id });
            return;
        }

        if self.is_list_append(expr.id) {
            self.add_step(Step::ListAppend { id: expr.id });
            return;
        }

        match self.resolve_call(call, expr) {
            Ok(step) => self.add_step(step),
            Err(err) => self.emitter.fail(err),
        }
    }

    fn pre_visit_comprehension(&mut self, comprehension: &'a Comprehension, expr: &'a Expr) {
        if !self.emitter.ok() {
            return;
        }
        let id = expr.id;
        let checks: [(bool, &str); 9] = [
            (
                self.options.enable_comprehension,
                "Comprehension support is disabled",
            ),
            (
                !comprehension.accu_var.is_empty(),
                "Invalid comprehension: 'accu_var' must not be empty",
            ),
            (
                !comprehension.iter_var.is_empty(),
                "Invalid comprehension: 'iter_var' must not be empty",
            ),
            (
                comprehension.accu_var != comprehension.iter_var,
                "Invalid comprehension: 'accu_var' must not be the same as 'iter_var'",
            ),
            (
                comprehension.iter_range.is_some(),
                "Invalid comprehension: 'iter_range' must be set",
            ),
            (
                comprehension.accu_init.is_some(),
                "Invalid comprehension: 'accu_init' must be set",
            ),
            (
                comprehension.loop_condition.is_some(),
                "Invalid comprehension: 'loop_condition' must be set",
            ),
            (
                comprehension.loop_step.is_some(),
                "Invalid comprehension: 'loop_step' must be set",
            ),
            (
                comprehension.result.is_some(),
                "Invalid comprehension: 'result' must be set",
            ),
        ];
        for (condition, message) in checks {
            if !self.emitter.validate(condition, message, id) {
                return;
            }
        }

        let append = if self.options.enable_comprehension_list_append {
            list_append_ids(comprehension)
        } else {
            None
        };
        self.loop_scopes.push(LoopScope {
            accu_init_id: append.map(|(init, _)| init),
            append_call_id: append.map(|(_, call)| call),
        });

        let mut frame = CondFrame::Comprehension(ComprehensionCond::new(
            self.options.short_circuiting,
            self.options.enable_comprehension_vulnerability_check,
        ));
        frame.pre_visit(expr, &mut self.emitter);
        self.cond_stack.push(CondRecord { id, frame });
    }

    fn post_visit_comprehension(&mut self, comprehension: &'a Comprehension, expr: &'a Expr) {
        if !self.emitter.ok() {
            return;
        }
        self.loop_scopes.pop();
        self.close_frame(expr);
        self.iter_variable_names
            .insert(comprehension.accu_var.clone());
        self.iter_variable_names
            .insert(comprehension.iter_var.clone());
    }

    fn post_visit_arg(&mut self, arg_num: usize, parent: &'a Expr) {
        if !self.emitter.ok() {
            return;
        }
        if let Some(record) = self.cond_stack.last_mut()
            && record.id == parent.id
        {
            record
                .frame
                .post_visit_arg(arg_num, parent, &mut self.emitter);
        }
    }

    fn post_visit_create_list(&mut self, list: &'a CreateList, expr: &'a Expr) {
        let mutable = self
            .loop_scopes
            .last()
            .is_some_and(|scope| scope.accu_init_id == Some(expr.id));
        self.add_step(Step::CreateList {
            id: expr.id,
            len: list.elements.len(),
            mutable,
        });
    }

    fn post_visit_create_struct(&mut self, create: &'a CreateStruct, expr: &'a Expr) {
        if !self.emitter.ok() {
            return;
        }

        if create.is_map() {
            for entry in &create.entries {
                self.emitter.validate(
                    matches!(entry.key, EntryKey::Map(_)),
                    "Map entry missing key",
                    entry.id,
                );
                self.emitter
                    .validate(entry.value.is_some(), "Map entry missing value", entry.id);
            }
            self.add_step(Step::CreateStruct {
                id: expr.id,
                message_type: None,
                keys: StructKeys::Map {
                    entries: create.entries.len(),
                },
            });
            return;
        }

        let Some(message_type) = self.resolver.find_type_adapter(&create.message_name) else {
            let message = format!(
                "Invalid struct creation: missing type info for '{}'",
                create.message_name
            );
            self.emitter.validate(false, &message, expr.id);
            return;
        };

        let mut fields = Vec::with_capacity(create.entries.len());
        for entry in &create.entries {
            match &entry.key {
                EntryKey::Field(field) if !field.is_empty() => fields.push(field.clone()),
                _ => {
                    self.emitter
                        .validate(false, "Struct entry missing field name", entry.id);
                }
            }
            let has_value = entry.value.is_some();
            self.emitter
                .validate(has_value, "Struct entry missing value", entry.id);
        }
        self.add_step(Step::CreateStruct {
            id: expr.id,
            message_type: Some(message_type),
            keys: StructKeys::Fields(fields),
        });
    }
}

#[cfg(test)]
#[path = "flat_test.rs"]
mod flat_test;
