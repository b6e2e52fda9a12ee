//! Control-flow frames.
//!
//! Logical operators, the conditional operator and comprehensions do not
//! compile to a single step: they need jumps placed between their operands.
//! The compiler pushes one frame per such node on entry, forwards every
//! "argument finished" event for that node to the frame, and pops the frame
//! when the node is done.

use super::emit::Emitter;
use super::{CompileError, safety};
use crate::ast::{ComprehensionArg, Expr, ExprKind};
use crate::format;
use crate::program::{Jump, LoopSlot, Step, relative_offset};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoolOp {
    And,
    Or,
}

impl BoolOp {
    /// Operand value that decides the result on its own.
    fn deciding_value(self) -> bool {
        match self {
            BoolOp::And => false,
            BoolOp::Or => true,
        }
    }
}

#[derive(Debug)]
pub(crate) enum CondFrame {
    Binary(BinaryCond),
    Ternary(TernaryCond),
    ExhaustiveTernary,
    Comprehension(ComprehensionCond),
}

impl CondFrame {
    pub(crate) fn pre_visit(&mut self, expr: &Expr, emitter: &mut Emitter) {
        match self {
            CondFrame::Binary(_) => validate_call_shape(
                expr,
                2,
                "Invalid argument count for a binary function call.",
                emitter,
            ),
            CondFrame::Ternary(_) | CondFrame::ExhaustiveTernary => validate_call_shape(
                expr,
                3,
                "Invalid argument count for a ternary function call.",
                emitter,
            ),
            CondFrame::Comprehension(cond) => cond.pre_visit(expr, emitter),
        }
    }

    pub(crate) fn post_visit_arg(&mut self, arg_num: usize, expr: &Expr, emitter: &mut Emitter) {
        match self {
            CondFrame::Binary(cond) => cond.post_visit_arg(arg_num, expr, emitter),
            CondFrame::Ternary(cond) => cond.post_visit_arg(arg_num, expr, emitter),
            CondFrame::ExhaustiveTernary => {}
            CondFrame::Comprehension(cond) => cond.post_visit_arg(arg_num, expr, emitter),
        }
    }

    pub(crate) fn post_visit(&mut self, expr: &Expr, emitter: &mut Emitter) {
        match self {
            CondFrame::Binary(cond) => cond.post_visit(expr, emitter),
            CondFrame::Ternary(cond) => cond.post_visit(expr, emitter),
            CondFrame::ExhaustiveTernary => {
                emitter.add_step(Step::Ternary { id: expr.id });
            }
            CondFrame::Comprehension(cond) => cond.post_visit(expr, emitter),
        }
    }
}

fn validate_call_shape(expr: &Expr, arg_count: usize, message: &str, emitter: &mut Emitter) {
    let well_formed = matches!(
        &expr.kind,
        ExprKind::Call(call) if call.target.is_none() && call.args.len() == arg_count
    );
    emitter.validate(well_formed, message, expr.id);
}

/// `a && b` and `a || b`.
///
/// Both operands are always compiled and combined by an And/Or step, which
/// absorbs errors on either side. When short-circuiting, a jump after the
/// first operand skips straight past the combinator if that operand already
/// decides the result, leaving it on the stack as the value.
#[derive(Debug)]
pub(crate) struct BinaryCond {
    op: BoolOp,
    short_circuiting: bool,
    jump: Jump,
}

impl BinaryCond {
    pub(crate) fn new(op: BoolOp, short_circuiting: bool) -> Self {
        Self {
            op,
            short_circuiting,
            jump: Jump::default(),
        }
    }

    fn post_visit_arg(&mut self, arg_num: usize, expr: &Expr, emitter: &mut Emitter) {
        if !self.short_circuiting || arg_num != 0 {
            return;
        }
        self.jump = emitter.add_jump(Step::CondJump {
            id: expr.id,
            jump_on: self.op.deciding_value(),
            leave_on_stack: true,
            offset: None,
        });
    }

    fn post_visit(&mut self, expr: &Expr, emitter: &mut Emitter) {
        let step = match self.op {
            BoolOp::And => Step::And { id: expr.id },
            BoolOp::Or => Step::Or { id: expr.id },
        };
        emitter.add_step(step);
        if self.short_circuiting {
            let end = emitter.current_index();
            emitter.set_target(&self.jump, end);
        }
    }
}

/// Short-circuiting `cond ? a : b`.
///
/// ```text
///       <cond>
///       BoolCheckJump  -> end     error or non-bool: it is the result
///       CondJump false -> else
///       <a>
///       Jump           -> end
/// else: <b>
/// end:
/// ```
#[derive(Debug, Default)]
pub(crate) struct TernaryCond {
    error_jump: Jump,
    jump_to_second: Jump,
    jump_after_first: Jump,
}

impl TernaryCond {
    fn post_visit_arg(&mut self, arg_num: usize, expr: &Expr, emitter: &mut Emitter) {
        match arg_num {
            0 => {
                self.error_jump = emitter.add_jump(Step::BoolCheckJump {
                    id: expr.id,
                    offset: None,
                });
                self.jump_to_second = emitter.add_jump(Step::CondJump {
                    id: expr.id,
                    jump_on: false,
                    leave_on_stack: false,
                    offset: None,
                });
            }
            1 => {
                self.jump_after_first = emitter.add_jump(Step::Jump {
                    id: expr.id,
                    offset: None,
                });
                let else_start = emitter.current_index();
                patch_checked(
                    emitter,
                    &self.jump_to_second,
                    "jump_to_second",
                    else_start,
                    expr,
                );
            }
            _ => {}
        }
    }

    fn post_visit(&mut self, expr: &Expr, emitter: &mut Emitter) {
        let end = emitter.current_index();
        patch_checked(emitter, &self.error_jump, "error_jump", end, expr);
        patch_checked(
            emitter,
            &self.jump_after_first,
            "jump_after_first",
            end,
            expr,
        );
    }
}

fn patch_checked(emitter: &mut Emitter, jump: &Jump, name: &str, target: usize, expr: &Expr) {
    if !emitter.ok() {
        return;
    }
    let message = format!("Error configuring ternary operator: {} is null", name);
    if emitter.validate(jump.exists(), &message, expr.id) {
        emitter.set_target(jump, target);
    }
}

/// Loop scaffolding for a comprehension. See the layout in
/// [`crate::program::Step`]'s module docs.
#[derive(Debug)]
pub(crate) struct ComprehensionCond {
    short_circuiting: bool,
    vulnerability_check: bool,
    next: Jump,
    cond: Jump,
}

impl ComprehensionCond {
    pub(crate) fn new(short_circuiting: bool, vulnerability_check: bool) -> Self {
        Self {
            short_circuiting,
            vulnerability_check,
            next: Jump::default(),
            cond: Jump::default(),
        }
    }

    fn pre_visit(&mut self, expr: &Expr, emitter: &mut Emitter) {
        emitter.add_step(Step::PushLoopSlot {
            id: expr.id,
            slot: LoopSlot::Accumulator,
        });
    }

    fn post_visit_arg(&mut self, arg_num: usize, expr: &Expr, emitter: &mut Emitter) {
        let ExprKind::Comprehension(comprehension) = &expr.kind else {
            return;
        };
        let id = expr.id;
        let accu_var = || comprehension.accu_var.clone();
        let iter_var = || comprehension.iter_var.clone();
        match ComprehensionArg::from_index(arg_num) {
            Some(ComprehensionArg::IterRange) => {
                emitter.add_step(Step::ListKeys { id });
                emitter.add_step(Step::PushLoopSlot {
                    id,
                    slot: LoopSlot::Index,
                });
                emitter.add_step(Step::PushLoopSlot {
                    id,
                    slot: LoopSlot::CurrentValue,
                });
            }
            Some(ComprehensionArg::AccuInit) => {
                self.next = emitter.add_jump(Step::ComprehensionNext {
                    id,
                    accu_var: accu_var(),
                    iter_var: iter_var(),
                    offset: None,
                    error_offset: None,
                });
            }
            Some(ComprehensionArg::LoopCondition) => {
                self.cond = emitter.add_jump(Step::ComprehensionCond {
                    id,
                    accu_var: accu_var(),
                    iter_var: iter_var(),
                    short_circuiting: self.short_circuiting,
                    offset: None,
                    error_offset: None,
                });
            }
            Some(ComprehensionArg::LoopStep) => {
                let Some(next_index) = self.next.origin() else {
                    emitter.validate(
                        false,
                        "Invalid comprehension: loop-next step is missing",
                        id,
                    );
                    return;
                };
                match relative_offset(emitter.current_index(), next_index) {
                    Ok(offset) => {
                        emitter.add_step(Step::Jump {
                            id,
                            offset: Some(offset),
                        });
                    }
                    Err(err) => emitter.fail(err),
                }
                let result_start = emitter.current_index();
                emitter.set_target(&self.next, result_start);
                emitter.set_target(&self.cond, result_start);
            }
            Some(ComprehensionArg::Result) => {
                if let Some(finish) = emitter.add_step(Step::ComprehensionFinish {
                    id,
                    accu_var: accu_var(),
                    iter_var: iter_var(),
                }) {
                    emitter.set_error_target(&self.next, finish);
                    emitter.set_error_target(&self.cond, finish);
                }
            }
            None => {}
        }
    }

    fn post_visit(&mut self, expr: &Expr, emitter: &mut Emitter) {
        if !self.vulnerability_check || !emitter.ok() {
            return;
        }
        let ExprKind::Comprehension(comprehension) = &expr.kind else {
            return;
        };
        let references = comprehension
            .loop_step
            .as_deref()
            .map_or(0, |step| {
                safety::accumulation_references(step, &comprehension.accu_var)
            });
        if references >= 2 {
            emitter.fail(CompileError::AccumulationVulnerability { expr_id: expr.id });
        }
    }
}
