//! Bounded expression evaluation.

use crate::core::EvaluatorLimits;

use super::{BinaryOp, ExprError, Expression, Value, VariableScope};

/// Evaluates expressions against a read-only scope.
///
/// Implementations may keep a running operation budget; the interpreter
/// calls [`reset`](ExpressionEvaluator::reset) at the start of every run.
pub trait ExpressionEvaluator: Send {
    fn evaluate(&mut self, expr: &Expression, scope: &dyn VariableScope) -> Result<Value, ExprError>;

    /// Clear per-run counters.
    fn reset(&mut self);
}

/// The default evaluator.
///
/// Counts every node visited since the last reset against
/// `max_operations`, and bounds recursion by `max_depth`. Arithmetic that
/// produces NaN or infinity is rejected instead of propagated.
#[derive(Clone, Debug, Default)]
pub struct SafeEvaluator {
    limits: EvaluatorLimits,
    operations: u32,
}

impl SafeEvaluator {
    pub fn new(limits: EvaluatorLimits) -> Self {
        Self {
            limits,
            operations: 0,
        }
    }

    /// Nodes evaluated since the last reset.
    #[must_use]
    pub fn operations(&self) -> u32 {
        self.operations
    }

    fn eval(
        &mut self,
        expr: &Expression,
        scope: &dyn VariableScope,
        depth: u32,
    ) -> Result<Value, ExprError> {
        if depth > self.limits.max_depth {
            return Err(ExprError::DepthExceeded(self.limits.max_depth));
        }
        self.operations += 1;
        if self.operations > self.limits.max_operations {
            return Err(ExprError::OperationLimit(self.limits.max_operations));
        }

        match expr {
            Expression::Number(n) => finite(*n).map(Value::Number),
            Expression::Bool(b) => Ok(Value::Bool(*b)),
            Expression::Variable(path) => scope
                .resolve(path)
                .ok_or_else(|| ExprError::UndefinedVariable(path.clone())),
            Expression::Binary { op, left, right } => {
                let op = BinaryOp::parse(op).ok_or_else(|| ExprError::UnknownOperator(op.clone()))?;
                self.eval_binary(op, left, right, scope, depth)
            }
            Expression::Call { function, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg, scope, depth + 1)?.as_number());
                }
                call(function, &values).and_then(finite).map(Value::Number)
            }
        }
    }

    fn eval_binary(
        &mut self,
        op: BinaryOp,
        left: &Expression,
        right: &Expression,
        scope: &dyn VariableScope,
        depth: u32,
    ) -> Result<Value, ExprError> {
        let lhs = self.eval(left, scope, depth + 1)?;

        // Logical operators short-circuit.
        match op {
            BinaryOp::And if !lhs.is_truthy() => return Ok(Value::Bool(false)),
            BinaryOp::Or if lhs.is_truthy() => return Ok(Value::Bool(true)),
            _ => {}
        }

        let rhs = self.eval(right, scope, depth + 1)?;
        let (a, b) = (lhs.as_number(), rhs.as_number());

        let value = match op {
            BinaryOp::Add => Value::Number(finite(a + b)?),
            BinaryOp::Sub => Value::Number(finite(a - b)?),
            BinaryOp::Mul => Value::Number(finite(a * b)?),
            BinaryOp::Div => {
                if b == 0.0 {
                    return Err(ExprError::DivisionByZero);
                }
                Value::Number(finite(a / b)?)
            }
            BinaryOp::Rem => {
                if b == 0.0 {
                    return Err(ExprError::DivisionByZero);
                }
                Value::Number(finite(a % b)?)
            }
            BinaryOp::Pow => Value::Number(finite(a.powf(b))?),
            BinaryOp::Lt => Value::Bool(a < b),
            BinaryOp::Le => Value::Bool(a <= b),
            BinaryOp::Gt => Value::Bool(a > b),
            BinaryOp::Ge => Value::Bool(a >= b),
            BinaryOp::Eq => Value::Bool(lhs == rhs || a == b),
            BinaryOp::Ne => Value::Bool(!(lhs == rhs || a == b)),
            BinaryOp::And | BinaryOp::Or => Value::Bool(rhs.is_truthy()),
        };
        Ok(value)
    }
}

impl ExpressionEvaluator for SafeEvaluator {
    fn evaluate(&mut self, expr: &Expression, scope: &dyn VariableScope) -> Result<Value, ExprError> {
        self.eval(expr, scope, 0)
    }

    fn reset(&mut self) {
        self.operations = 0;
    }
}

fn finite(n: f64) -> Result<f64, ExprError> {
    if n.is_finite() {
        Ok(n)
    } else {
        Err(ExprError::NonFinite)
    }
}

fn arity(function: &str, expected: &'static str, got: usize) -> ExprError {
    ExprError::Arity {
        function: function.to_string(),
        expected,
        got,
    }
}

fn call(function: &str, args: &[f64]) -> Result<f64, ExprError> {
    let unary = |f: fn(f64) -> f64| match args {
        [x] => Ok(f(*x)),
        _ => Err(arity(function, "1", args.len())),
    };

    match function {
        "abs" => unary(f64::abs),
        "floor" => unary(f64::floor),
        "ceil" => unary(f64::ceil),
        "round" => unary(f64::round),
        "sqrt" => unary(f64::sqrt),
        "min" | "max" => {
            if args.is_empty() {
                return Err(arity(function, "at least 1", 0));
            }
            let fold: fn(f64, f64) -> f64 = if function == "min" { f64::min } else { f64::max };
            Ok(args[1..].iter().copied().fold(args[0], fold))
        }
        "pow" => match args {
            [base, exp] => Ok(base.powf(*exp)),
            _ => Err(arity(function, "2", args.len())),
        },
        "clamp" => match args {
            [x, lo, hi] if lo <= hi => Ok(x.clamp(*lo, *hi)),
            [x, lo, hi] => Ok(x.clamp(*hi, *lo)),
            _ => Err(arity(function, "3", args.len())),
        },
        _ => Err(ExprError::UnknownFunction(function.to_string())),
    }
}
