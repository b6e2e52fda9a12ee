use super::{
    Call, Comprehension, CreateList, CreateStruct, Entry, EntryKey, Expr, ExprId, ExprKind,
    Select, Value, builtins,
};
use crate::{Box, String, ToString, Vec, vec};

/// Name of the accumulator variable introduced by the macro expansions.
pub const ACCUMULATOR_VAR: &str = "__result__";

/// Builds expression trees with sequential ids.
///
/// Children are built before their parents, so ids grow in post-order.
/// Macro helpers (`all`, `exists`, `map`, `filter`) produce the same
/// comprehension shapes a parser expands the corresponding macros into.
#[derive(Debug, Clone)]
pub struct ExprFactory {
    next_id: i64,
}

impl Default for ExprFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ExprFactory {
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    /// Starts numbering at `first_id`.
    pub fn starting_at(first_id: i64) -> Self {
        Self { next_id: first_id }
    }

    pub fn next_id(&mut self) -> ExprId {
        let id = ExprId(self.next_id);
        self.next_id += 1;
        id
    }

    fn expr(&mut self, kind: ExprKind) -> Expr {
        let id = self.next_id();
        Expr::new(id, kind)
    }

    pub fn constant(&mut self, value: impl Into<Value>) -> Expr {
        self.expr(ExprKind::Const(value.into()))
    }

    pub fn null(&mut self) -> Expr {
        self.expr(ExprKind::Const(Value::Null))
    }

    pub fn ident(&mut self, name: impl Into<String>) -> Expr {
        self.expr(ExprKind::Ident(name.into()))
    }

    pub fn select(&mut self, operand: Expr, field: impl Into<String>) -> Expr {
        self.expr(ExprKind::Select(Select {
            operand: Box::new(operand),
            field: field.into(),
            test_only: false,
        }))
    }

    /// `has(operand.field)`.
    pub fn presence_test(&mut self, operand: Expr, field: impl Into<String>) -> Expr {
        self.expr(ExprKind::Select(Select {
            operand: Box::new(operand),
            field: field.into(),
            test_only: true,
        }))
    }

    /// Builds `a.b.c` as an identifier followed by selects.
    pub fn path(&mut self, dotted: &str) -> Expr {
        let mut segments = dotted.split('.');
        let first = segments.next().unwrap_or_default();
        let mut expr = self.ident(first);
        for segment in segments {
            expr = self.select(expr, segment);
        }
        expr
    }

    pub fn call(&mut self, function: impl Into<String>, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Call(Call {
            target: None,
            function: function.into(),
            args,
        }))
    }

    pub fn receiver_call(
        &mut self,
        function: impl Into<String>,
        target: Expr,
        args: Vec<Expr>,
    ) -> Expr {
        self.expr(ExprKind::Call(Call {
            target: Some(Box::new(target)),
            function: function.into(),
            args,
        }))
    }

    pub fn and(&mut self, lhs: Expr, rhs: Expr) -> Expr {
        self.call(builtins::AND, vec![lhs, rhs])
    }

    pub fn or(&mut self, lhs: Expr, rhs: Expr) -> Expr {
        self.call(builtins::OR, vec![lhs, rhs])
    }

    pub fn not(&mut self, operand: Expr) -> Expr {
        self.call(builtins::NOT, vec![operand])
    }

    pub fn ternary(&mut self, condition: Expr, then_branch: Expr, else_branch: Expr) -> Expr {
        self.call(builtins::TERNARY, vec![condition, then_branch, else_branch])
    }

    pub fn index(&mut self, container: Expr, key: Expr) -> Expr {
        self.call(builtins::INDEX, vec![container, key])
    }

    pub fn add(&mut self, lhs: Expr, rhs: Expr) -> Expr {
        self.call(builtins::ADD, vec![lhs, rhs])
    }

    pub fn list(&mut self, elements: Vec<Expr>) -> Expr {
        self.expr(ExprKind::List(CreateList { elements }))
    }

    pub fn map(&mut self, entries: Vec<(Expr, Expr)>) -> Expr {
        let entries = entries
            .into_iter()
            .map(|(key, value)| Entry {
                id: self.next_id(),
                key: EntryKey::Map(Box::new(key)),
                value: Some(Box::new(value)),
            })
            .collect();
        self.expr(ExprKind::Struct(CreateStruct {
            message_name: String::new(),
            entries,
        }))
    }

    pub fn message(&mut self, message_name: impl Into<String>, fields: Vec<(&str, Expr)>) -> Expr {
        let entries = fields
            .into_iter()
            .map(|(field, value)| Entry {
                id: self.next_id(),
                key: EntryKey::Field(field.to_string()),
                value: Some(Box::new(value)),
            })
            .collect();
        self.expr(ExprKind::Struct(CreateStruct {
            message_name: message_name.into(),
            entries,
        }))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn comprehension(
        &mut self,
        iter_var: impl Into<String>,
        iter_range: Expr,
        accu_var: impl Into<String>,
        accu_init: Expr,
        loop_condition: Expr,
        loop_step: Expr,
        result: Expr,
    ) -> Expr {
        self.expr(ExprKind::Comprehension(Comprehension {
            iter_var: iter_var.into(),
            iter_range: Some(Box::new(iter_range)),
            accu_var: accu_var.into(),
            accu_init: Some(Box::new(accu_init)),
            loop_condition: Some(Box::new(loop_condition)),
            loop_step: Some(Box::new(loop_step)),
            result: Some(Box::new(result)),
        }))
    }

    /// `range.all(iter_var, predicate)`.
    pub fn all(&mut self, range: Expr, iter_var: &str, predicate: Expr) -> Expr {
        let init = self.constant(true);
        let accu = self.ident(ACCUMULATOR_VAR);
        let condition = self.call(builtins::NOT_STRICTLY_FALSE, vec![accu]);
        let accu = self.ident(ACCUMULATOR_VAR);
        let step = self.and(accu, predicate);
        let result = self.ident(ACCUMULATOR_VAR);
        self.macro_comprehension(iter_var, range, init, condition, step, result)
    }

    /// `range.exists(iter_var, predicate)`.
    pub fn exists(&mut self, range: Expr, iter_var: &str, predicate: Expr) -> Expr {
        let init = self.constant(false);
        let accu = self.ident(ACCUMULATOR_VAR);
        let negated = self.not(accu);
        let condition = self.call(builtins::NOT_STRICTLY_FALSE, vec![negated]);
        let accu = self.ident(ACCUMULATOR_VAR);
        let step = self.or(accu, predicate);
        let result = self.ident(ACCUMULATOR_VAR);
        self.macro_comprehension(iter_var, range, init, condition, step, result)
    }

    /// `range.map(iter_var, transform)`.
    pub fn map_macro(&mut self, range: Expr, iter_var: &str, transform: Expr) -> Expr {
        let init = self.list(Vec::new());
        let condition = self.constant(true);
        let accu = self.ident(ACCUMULATOR_VAR);
        let element = self.list(vec![transform]);
        let step = self.add(accu, element);
        let result = self.ident(ACCUMULATOR_VAR);
        self.macro_comprehension(iter_var, range, init, condition, step, result)
    }

    /// `range.filter(iter_var, predicate)`.
    pub fn filter(&mut self, range: Expr, iter_var: &str, predicate: Expr) -> Expr {
        let init = self.list(Vec::new());
        let condition = self.constant(true);
        let accu = self.ident(ACCUMULATOR_VAR);
        let item = self.ident(iter_var);
        let element = self.list(vec![item]);
        let append = self.add(accu, element);
        let unchanged = self.ident(ACCUMULATOR_VAR);
        let step = self.ternary(predicate, append, unchanged);
        let result = self.ident(ACCUMULATOR_VAR);
        self.macro_comprehension(iter_var, range, init, condition, step, result)
    }

    fn macro_comprehension(
        &mut self,
        iter_var: &str,
        range: Expr,
        init: Expr,
        condition: Expr,
        step: Expr,
        result: Expr,
    ) -> Expr {
        self.comprehension(
            iter_var,
            range,
            ACCUMULATOR_VAR,
            init,
            condition,
            step,
            result,
        )
    }
}
