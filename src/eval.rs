// Tree-walking evaluator.

use crate::ast::Ast;
use crate::error::EvalError;
use crate::operators::{to_int, OpKind};
use crate::value::{format_g, parse_number_loose, Value};

#[derive(Debug, Clone, Copy)]
pub struct EvalOptions {
    // When true (the default), a && b with both operands truthy yields
    // b's value, discarding a, instead of the left-truthy-preserving
    // semantics || uses. See the And arm in eval_op below.
    pub quirky_logical_and: bool,
}

impl Default for EvalOptions {
    fn default() -> Self {
        EvalOptions {
            quirky_logical_and: true,
        }
    }
}

pub fn eval(ast: &Ast) -> Result<Value, EvalError> {
    eval_with(ast, &EvalOptions::default())
}

pub fn eval_with(ast: &Ast, opts: &EvalOptions) -> Result<Value, EvalError> {
    match ast {
        Ast::ConstNum(n) => Ok(Value::Num(*n)),
        Ast::ConstStr(s) => Ok(Value::Str(s.clone())),
        Ast::Var(slot) => Ok(Value::Num(slot.borrow().value)),
        Ast::Func(entry, args, context) => {
            let result = entry.call(args, context.borrow_mut().as_mut());
            Ok(Value::Num(result))
        }
        Ast::Op(kind, args) => eval_op(*kind, args, opts),
    }
}

fn as_num(v: &Value) -> Result<f32, EvalError> {
    match v {
        Value::Num(n) => Ok(*n),
        Value::Str(_) => Err(EvalError::ExpectedNumber),
    }
}

fn coerce_num(v: Value) -> f32 {
    match v {
        Value::Num(n) => n,
        Value::Str(s) => parse_number_loose(&s),
    }
}

fn numeric_binop(
    args: &[Ast],
    opts: &EvalOptions,
    f: impl FnOnce(f32, f32) -> Result<f32, EvalError>,
) -> Result<Value, EvalError> {
    let a = as_num(&eval_with(&args[0], opts)?)?;
    let b = as_num(&eval_with(&args[1], opts)?)?;
    Ok(Value::Num(f(a, b)?))
}

fn int_binop(args: &[Ast], opts: &EvalOptions, f: impl FnOnce(i32, i32) -> i32) -> Result<Value, EvalError> {
    let a = as_num(&eval_with(&args[0], opts)?)?;
    let b = as_num(&eval_with(&args[1], opts)?)?;
    Ok(Value::Num(f(to_int(a), to_int(b)) as f32))
}

fn eval_compare(kind: OpKind, args: &[Ast], opts: &EvalOptions) -> Result<Value, EvalError> {
    let lv = eval_with(&args[0], opts)?;
    let rv = eval_with(&args[1], opts)?;
    let truth = match lv {
        Value::Str(ls) => {
            let rs = match rv {
                Value::Str(s) => s,
                Value::Num(n) => format_g(n),
            };
            let ord = ls.as_bytes().cmp(rs.as_bytes());
            use std::cmp::Ordering::*;
            match kind {
                OpKind::Lt => ord == Less,
                OpKind::Le => ord != Greater,
                OpKind::Gt => ord == Greater,
                OpKind::Ge => ord != Less,
                OpKind::Eq => ord == Equal,
                OpKind::Ne => ord != Equal,
                _ => unreachable!("eval_compare called with non-comparison op"),
            }
        }
        Value::Num(ln) => {
            let rn = coerce_num(rv);
            match kind {
                OpKind::Lt => ln < rn,
                OpKind::Le => ln <= rn,
                OpKind::Gt => ln > rn,
                OpKind::Ge => ln >= rn,
                OpKind::Eq => ln == rn,
                OpKind::Ne => ln != rn,
                _ => unreachable!("eval_compare called with non-comparison op"),
            }
        }
    };
    Ok(Value::Num(if truth { 1.0 } else { 0.0 }))
}

fn eval_op(kind: OpKind, args: &[Ast], opts: &EvalOptions) -> Result<Value, EvalError> {
    use OpKind::*;
    log::trace!("eval_op: {kind:?}");
    match kind {
        NegUnary => {
            let v = as_num(&eval_with(&args[0], opts)?)?;
            Ok(Value::Num(-v))
        }
        NotUnary => {
            let v = as_num(&eval_with(&args[0], opts)?)?;
            Ok(Value::Num(if v == 0.0 { 1.0 } else { 0.0 }))
        }
        BitNotUnary => {
            let v = as_num(&eval_with(&args[0], opts)?)?;
            Ok(Value::Num(!to_int(v) as f32))
        }
        Pow => numeric_binop(args, opts, |a, b| Ok(a.powf(b))),
        Mul => numeric_binop(args, opts, |a, b| Ok(a * b)),
        Div => numeric_binop(args, opts, |a, b| {
            if b == 0.0 {
                Err(EvalError::DivisionByZero)
            } else {
                Ok(a / b)
            }
        }),
        Rem => numeric_binop(args, opts, |a, b| Ok(a % b)),
        Sub => numeric_binop(args, opts, |a, b| Ok(a - b)),
        Shl => int_binop(args, opts, |a, b| a.wrapping_shl(b as u32)),
        Shr => int_binop(args, opts, |a, b| a.wrapping_shr(b as u32)),
        BitAnd => int_binop(args, opts, |a, b| a & b),
        BitOr => int_binop(args, opts, |a, b| a | b),
        BitXor => int_binop(args, opts, |a, b| a ^ b),
        Lt | Le | Gt | Ge | Eq | Ne => eval_compare(kind, args, opts),
        Add => {
            let lv = eval_with(&args[0], opts)?;
            let rv = eval_with(&args[1], opts)?;
            match lv {
                // Only a *string* left operand triggers concatenation; a
                // number left operand with a string right operand
                // coerces the string to a number instead. Preserved
                // verbatim from the original source.
                Value::Str(ls) => {
                    let rs = match rv {
                        Value::Str(s) => s,
                        Value::Num(n) => format_g(n),
                    };
                    Ok(Value::Str(ls + &rs))
                }
                Value::Num(ln) => Ok(Value::Num(ln + coerce_num(rv))),
            }
        }
        And => {
            let lv = as_num(&eval_with(&args[0], opts)?)?;
            if lv == 0.0 {
                return Ok(Value::Num(0.0));
            }
            let rv = as_num(&eval_with(&args[1], opts)?)?;
            if rv == 0.0 {
                return Ok(Value::Num(0.0));
            }
            Ok(Value::Num(if opts.quirky_logical_and { rv } else { lv }))
        }
        Or => {
            let lv = as_num(&eval_with(&args[0], opts)?)?;
            if lv != 0.0 && !lv.is_nan() {
                return Ok(Value::Num(lv));
            }
            let rv = as_num(&eval_with(&args[1], opts)?)?;
            Ok(Value::Num(rv))
        }
        Assign => {
            // Always stores the numeric coercion of the right-hand side,
            // even when it evaluated to a string. Preserved verbatim.
            let rv = eval_with(&args[1], opts)?;
            let n = coerce_num(rv);
            if let Ast::Var(slot) = &args[0] {
                slot.borrow_mut().value = n;
            }
            Ok(Value::Num(n))
        }
        Comma => {
            let _ = eval_with(&args[0], opts)?;
            let rv = eval_with(&args[1], opts)?;
            Ok(Value::Num(coerce_num(rv)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::VariableTable;

    fn num(n: f32) -> Ast {
        Ast::ConstNum(n)
    }

    fn op(kind: OpKind, args: Vec<Ast>) -> Ast {
        Ast::Op(kind, args)
    }

    fn assert_evaluates_to_num(ast: &Ast, expected: f32) {
        match eval(ast).unwrap() {
            Value::Num(n) => assert_eq!(n, expected),
            Value::Str(s) => panic!("expected Num({}), got Str({:?})", expected, s),
        }
    }

    #[test]
    fn arithmetic() {
        assert_evaluates_to_num(&op(OpKind::Add, vec![num(2.0), num(3.0)]), 5.0);
        assert_evaluates_to_num(&op(OpKind::Mul, vec![num(2.0), num(3.0)]), 6.0);
        assert_evaluates_to_num(&op(OpKind::Pow, vec![num(2.0), num(10.0)]), 1024.0);
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let ast = op(OpKind::Div, vec![num(1.0), num(0.0)]);
        assert_eq!(eval(&ast), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn string_concatenation_only_triggers_on_string_left_operand() {
        let ast = op(
            OpKind::Add,
            vec![Ast::ConstStr("x=".to_string()), num(5.0)],
        );
        assert_eq!(eval(&ast).unwrap(), Value::Str("x=5".to_string()));

        // Number left + string right coerces the string to a number.
        let ast2 = op(OpKind::Add, vec![num(1.0), Ast::ConstStr("2".to_string())]);
        assert_evaluates_to_num(&ast2, 3.0);
    }

    #[test]
    fn logical_and_quirk_returns_right_operand() {
        let ast = op(OpKind::And, vec![num(5.0), num(7.0)]);
        assert_evaluates_to_num(&ast, 7.0);
    }

    #[test]
    fn logical_and_non_quirky_returns_left_operand() {
        let ast = op(OpKind::And, vec![num(5.0), num(7.0)]);
        let opts = EvalOptions {
            quirky_logical_and: false,
        };
        match eval_with(&ast, &opts).unwrap() {
            Value::Num(n) => assert_eq!(n, 5.0),
            _ => panic!("expected a number"),
        }
    }

    #[test]
    fn logical_and_short_circuits_on_falsy_left() {
        let mut vars = VariableTable::new();
        let counter = vars.lookup_or_create("hits");
        // Right side increments `hits` as a side effect via assignment;
        // if `&&` short-circuits correctly it must never evaluate.
        let rhs = op(
            OpKind::Assign,
            vec![Ast::Var(counter.clone()), num(1.0)],
        );
        let ast = op(OpKind::And, vec![num(0.0), rhs]);
        assert_evaluates_to_num(&ast, 0.0);
        assert_eq!(counter.borrow().value, 0.0);
    }

    #[test]
    fn assignment_stores_numeric_coercion_of_string_rhs() {
        let mut vars = VariableTable::new();
        let slot = vars.lookup_or_create("s");
        let ast = op(
            OpKind::Assign,
            vec![Ast::Var(slot.clone()), Ast::ConstStr("45".to_string())],
        );
        assert_evaluates_to_num(&ast, 45.0);
        assert_eq!(slot.borrow().value, 45.0);
    }

    #[test]
    fn comma_discards_left_and_coerces_right_to_number() {
        let ast = op(
            OpKind::Comma,
            vec![num(1.0), Ast::ConstStr("9".to_string())],
        );
        assert_evaluates_to_num(&ast, 9.0);
    }

    #[test]
    fn bitwise_ops_go_through_to_int() {
        let ast = op(OpKind::BitAnd, vec![num(6.0), num(3.0)]);
        assert_evaluates_to_num(&ast, 2.0);
        let ast = op(OpKind::Shl, vec![num(1.0), num(4.0)]);
        assert_evaluates_to_num(&ast, 16.0);
    }

    #[test]
    fn string_comparison_is_lexicographic_by_byte() {
        let ast = op(
            OpKind::Lt,
            vec![Ast::ConstStr("abc".to_string()), Ast::ConstStr("abd".to_string())],
        );
        assert_evaluates_to_num(&ast, 1.0);
    }

    #[test]
    fn logical_or_falls_through_on_nan_left_operand() {
        // (-1)**0.5 is NaN; NaN != 0.0 so a naive truthiness check would
        // short-circuit here, but NaN must not count as truthy.
        let ast = op(
            OpKind::Or,
            vec![op(OpKind::Pow, vec![num(-1.0), num(0.5)]), num(5.0)],
        );
        assert_evaluates_to_num(&ast, 5.0);
    }
}
