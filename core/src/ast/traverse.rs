//! Iterative depth-first traversal with pre/post hooks.
//!
//! The walk uses an explicit stack, so arbitrarily deep trees do not overflow
//! the native stack. Children are visited in evaluation order:
//!
//! - select: the operand
//! - call: the target (if any), then the arguments left to right
//! - list: the elements
//! - struct: for each entry, the map key (if any) then the value
//! - comprehension: iter_range, accu_init, loop_condition, loop_step, result
//!
//! After each call argument or comprehension sub-expression has been fully
//! visited, [`AstVisitor::post_visit_arg`] is invoked with the parent node.
//! This is the hook control-flow compilation uses to place jumps between
//! operands.

use super::{Call, Comprehension, CreateList, CreateStruct, EntryKey, Expr, ExprKind, Select, Value};
use crate::{Vec, vec};

/// Hooks called by [`traverse`]. All default to doing nothing.
pub trait AstVisitor<'a> {
    fn pre_visit_expr(&mut self, _expr: &'a Expr) {}
    fn post_visit_expr(&mut self, _expr: &'a Expr) {}

    fn post_visit_const(&mut self, _value: &'a Value, _expr: &'a Expr) {}
    fn post_visit_ident(&mut self, _name: &'a str, _expr: &'a Expr) {}

    fn pre_visit_select(&mut self, _select: &'a Select, _expr: &'a Expr) {}
    fn post_visit_select(&mut self, _select: &'a Select, _expr: &'a Expr) {}

    fn pre_visit_call(&mut self, _call: &'a Call, _expr: &'a Expr) {}
    fn post_visit_call(&mut self, _call: &'a Call, _expr: &'a Expr) {}

    fn pre_visit_comprehension(&mut self, _comprehension: &'a Comprehension, _expr: &'a Expr) {}
    fn post_visit_comprehension(&mut self, _comprehension: &'a Comprehension, _expr: &'a Expr) {}

    /// Called after argument `arg_num` of `parent` has been visited. For
    /// comprehensions `arg_num` is a [`ComprehensionArg`] index.
    ///
    /// [`ComprehensionArg`]: super::ComprehensionArg
    fn post_visit_arg(&mut self, _arg_num: usize, _parent: &'a Expr) {}
    fn post_visit_target(&mut self, _parent: &'a Expr) {}

    fn post_visit_create_list(&mut self, _list: &'a CreateList, _expr: &'a Expr) {}
    fn post_visit_create_struct(&mut self, _create: &'a CreateStruct, _expr: &'a Expr) {}
}

#[derive(Clone, Copy)]
enum Position {
    Root,
    Target,
    Arg(usize),
    /// Struct keys and values, list elements, select operands.
    Child,
}

#[derive(Clone, Copy)]
struct StackRecord<'a> {
    expr: &'a Expr,
    parent: Option<&'a Expr>,
    position: Position,
    visited: bool,
}

impl<'a> StackRecord<'a> {
    fn root(expr: &'a Expr) -> Self {
        Self {
            expr,
            parent: None,
            position: Position::Root,
            visited: false,
        }
    }

    fn child(expr: &'a Expr, parent: &'a Expr, position: Position) -> Self {
        Self {
            expr,
            parent: Some(parent),
            position,
            visited: false,
        }
    }
}

pub fn traverse<'a, V>(root: &'a Expr, visitor: &mut V)
where
    V: AstVisitor<'a> + ?Sized,
{
    let mut stack = vec![StackRecord::root(root)];
    while let Some(top) = stack.last_mut() {
        if top.visited {
            let record = *top;
            stack.pop();
            post_visit(record, visitor);
        } else {
            top.visited = true;
            let record = *top;
            pre_visit(record, visitor);
            push_children(record, &mut stack);
        }
    }
}

fn pre_visit<'a, V: AstVisitor<'a> + ?Sized>(record: StackRecord<'a>, visitor: &mut V) {
    let expr = record.expr;
    visitor.pre_visit_expr(expr);
    match &expr.kind {
        ExprKind::Select(select) => visitor.pre_visit_select(select, expr),
        ExprKind::Call(call) => visitor.pre_visit_call(call, expr),
        ExprKind::Comprehension(comprehension) => {
            visitor.pre_visit_comprehension(comprehension, expr)
        }
        ExprKind::Const(_) | ExprKind::Ident(_) | ExprKind::List(_) | ExprKind::Struct(_) => {}
    }
}

fn post_visit<'a, V: AstVisitor<'a> + ?Sized>(record: StackRecord<'a>, visitor: &mut V) {
    let expr = record.expr;
    match &expr.kind {
        ExprKind::Const(value) => visitor.post_visit_const(value, expr),
        ExprKind::Ident(name) => visitor.post_visit_ident(name, expr),
        ExprKind::Select(select) => visitor.post_visit_select(select, expr),
        ExprKind::Call(call) => visitor.post_visit_call(call, expr),
        ExprKind::List(list) => visitor.post_visit_create_list(list, expr),
        ExprKind::Struct(create) => visitor.post_visit_create_struct(create, expr),
        ExprKind::Comprehension(comprehension) => {
            visitor.post_visit_comprehension(comprehension, expr)
        }
    }
    visitor.post_visit_expr(expr);

    if let Some(parent) = record.parent {
        match record.position {
            Position::Target => visitor.post_visit_target(parent),
            Position::Arg(arg_num) => visitor.post_visit_arg(arg_num, parent),
            Position::Root | Position::Child => {}
        }
    }
}

/// Pushes children in reverse so they pop in evaluation order.
fn push_children<'a>(record: StackRecord<'a>, stack: &mut Vec<StackRecord<'a>>) {
    let expr = record.expr;
    match &expr.kind {
        ExprKind::Const(_) | ExprKind::Ident(_) => {}
        ExprKind::Select(select) => {
            stack.push(StackRecord::child(&select.operand, expr, Position::Child));
        }
        ExprKind::Call(call) => {
            for (arg_num, arg) in call.args.iter().enumerate().rev() {
                stack.push(StackRecord::child(arg, expr, Position::Arg(arg_num)));
            }
            if let Some(target) = &call.target {
                stack.push(StackRecord::child(target, expr, Position::Target));
            }
        }
        ExprKind::List(list) => {
            for element in list.elements.iter().rev() {
                stack.push(StackRecord::child(element, expr, Position::Child));
            }
        }
        ExprKind::Struct(create) => {
            for entry in create.entries.iter().rev() {
                if let Some(value) = &entry.value {
                    stack.push(StackRecord::child(value, expr, Position::Child));
                }
                if let EntryKey::Map(key) = &entry.key {
                    stack.push(StackRecord::child(key, expr, Position::Child));
                }
            }
        }
        ExprKind::Comprehension(comprehension) => {
            let args = [
                &comprehension.iter_range,
                &comprehension.accu_init,
                &comprehension.loop_condition,
                &comprehension.loop_step,
                &comprehension.result,
            ];
            for (arg_num, arg) in args.into_iter().enumerate().rev() {
                if let Some(arg) = arg {
                    stack.push(StackRecord::child(arg, expr, Position::Arg(arg_num)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ExprFactory;
    use crate::{String, format};

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl<'a> AstVisitor<'a> for Recorder {
        fn post_visit_const(&mut self, value: &'a Value, _expr: &'a Expr) {
            self.events.push(format!("const {}", value));
        }
        fn post_visit_ident(&mut self, name: &'a str, _expr: &'a Expr) {
            self.events.push(format!("ident {}", name));
        }
        fn pre_visit_call(&mut self, call: &'a Call, _expr: &'a Expr) {
            self.events.push(format!("pre {}", call.function));
        }
        fn post_visit_call(&mut self, call: &'a Call, _expr: &'a Expr) {
            self.events.push(format!("post {}", call.function));
        }
        fn post_visit_arg(&mut self, arg_num: usize, parent: &'a Expr) {
            let event = format!("arg {} of {}", arg_num, parent.id);
            self.events.push(event);
        }
        fn post_visit_target(&mut self, parent: &'a Expr) {
            self.events.push(format!("target of {}", parent.id));
        }
        fn post_visit_comprehension(&mut self, _c: &'a Comprehension, _expr: &'a Expr) {
            self.events.push(String::from("post comprehension"));
        }
    }

    #[test]
    fn test_call_visit_order() {
        let mut f = ExprFactory::new();
        let target = f.ident("t");
        let arg0 = f.constant(1i64);
        let arg1 = f.ident("y");
        let call = f.receiver_call("f", target, vec![arg0, arg1]);

        let mut recorder = Recorder::default();
        traverse(&call, &mut recorder);
        assert_eq!(
            recorder.events,
            [
                "pre f",
                "ident t",
                "target of #4",
                "const 1",
                "arg 0 of #4",
                "ident y",
                "arg 1 of #4",
                "post f"
            ]
        );
    }

    #[test]
    fn test_comprehension_arg_order() {
        let mut f = ExprFactory::new();
        let range = f.ident("xs");
        let init = f.constant(0i64);
        let cond = f.constant(true);
        let step = f.ident("acc");
        let result = f.ident("acc");
        let expr = f.comprehension("x", range, "acc", init, cond, step, result);
        let id = expr.id;

        let mut recorder = Recorder::default();
        traverse(&expr, &mut recorder);
        let args: Vec<_> = recorder
            .events
            .iter()
            .filter(|e| e.starts_with("arg"))
            .cloned()
            .collect();
        let expected: Vec<_> = (0..5).map(|i| format!("arg {} of {}", i, id)).collect();
        assert_eq!(args, expected);
        let last = recorder.events.last().map(String::as_str);
        assert_eq!(last, Some("post comprehension"));
    }

    #[test]
    fn test_deep_tree_does_not_overflow() {
        let mut f = ExprFactory::new();
        let mut expr = f.constant(0i64);
        for _ in 0..100_000 {
            let one = f.constant(1i64);
            expr = f.add(expr, one);
        }
        let mut recorder = Recorder::default();
        traverse(&expr, &mut recorder);
        let posts = recorder
            .events
            .iter()
            .filter(|e| e.starts_with("post"))
            .count();
        assert_eq!(posts, 100_000);
        // Dropping a 100k-deep boxed tree recursively would overflow; leak it.
        core::mem::forget(expr);
    }
}
