//! Executes a parsed deck and collects its record blocks.
//!
//! The interpreter understands just enough Python for input decks:
//! assignments, `import math`, arithmetic with Python's int/float rules,
//! lists, a handful of builtins and the profile functions.

use indexmap::IndexMap;
use log::{debug, trace};
use std::collections::{HashMap, HashSet};

use crate::{
    ast::{BinaryOp, Expr, Stmt, UnaryOp},
    error::EvalError,
    profiles::Profile,
    value::{RawRecord, RecordKind, Value},
};

/// Modules an `import` statement may name.
const MODULES: &[&str] = &["math"];

/// Run every statement in order and return the record blocks encountered.
pub fn evaluate(program: &[Stmt]) -> Result<Vec<RawRecord>, EvalError> {
    let mut interpreter = Interpreter::default();
    for stmt in program {
        interpreter.execute(stmt)?;
    }
    Ok(interpreter.records)
}

#[derive(Default)]
struct Interpreter {
    bindings: HashMap<String, Value>,
    modules: HashSet<String>,
    records: Vec<RawRecord>,
    /// Line of the statement being executed
    line: usize,
}

impl Interpreter {
    fn execute(&mut self, stmt: &Stmt) -> Result<(), EvalError> {
        self.line = stmt.line();
        match stmt {
            Stmt::Import { module, .. } => {
                if !MODULES.contains(&module.as_str()) {
                    return Err(EvalError::UnknownModule {
                        module: module.clone(),
                        line: self.line,
                    });
                }
                self.modules.insert(module.clone());
            }
            Stmt::Assign { name, value, .. } => {
                let value = self.eval(value)?;
                trace!("line {}: {name} = {value:?}", self.line);
                self.bindings.insert(name.clone(), value);
            }
            Stmt::Expr { expr, .. } => {
                if let Expr::Call {
                    callee,
                    args,
                    kwargs,
                } = expr
                {
                    if let Expr::Name(name) = callee.as_ref() {
                        if let Some(kind) = RecordKind::from_name(name) {
                            return self.record(kind, args, kwargs);
                        }
                    }
                }
                self.eval(expr)?;
            }
        }
        Ok(())
    }

    fn record(
        &mut self,
        kind: RecordKind,
        args: &[Expr],
        kwargs: &[(String, Expr)],
    ) -> Result<(), EvalError> {
        if !args.is_empty() {
            return Err(self.bad_arguments(kind.name(), "blocks only take keyword arguments"));
        }
        let mut fields = IndexMap::with_capacity(kwargs.len());
        for (key, expr) in kwargs {
            let value = self.eval(expr)?;
            if fields.insert(key.clone(), value).is_some() {
                return Err(self.bad_arguments(kind.name(), format!("`{key}` is given more than once")));
            }
        }
        debug!("line {}: {kind} block with {} field(s)", self.line, fields.len());
        self.records.push(RawRecord {
            kind,
            line: self.line,
            fields,
        });
        Ok(())
    }

    fn eval(&self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::None => Ok(Value::None),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Int(i) => Ok(Value::Int(*i)),
            Expr::Float(x) => Ok(Value::Float(*x)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Name(name) => self.lookup(name),
            Expr::List(items) => items
                .iter()
                .map(|item| self.eval(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Expr::Attr { base, attr } => {
                let module = self.module(base)?;
                math_constant(attr)
                    .map(Value::Float)
                    .ok_or_else(|| EvalError::UnknownFunction {
                        module,
                        name: attr.clone(),
                        line: self.line,
                    })
            }
            Expr::Call {
                callee,
                args,
                kwargs,
            } => self.call(callee, args, kwargs),
            Expr::Unary { op, operand } => unary(*op, self.eval(operand)?, self.line),
            Expr::Binary { op, lhs, rhs } => binary(*op, self.eval(lhs)?, self.eval(rhs)?, self.line),
        }
    }

    fn lookup(&self, name: &str) -> Result<Value, EvalError> {
        self.bindings
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UndefinedName {
                name: name.to_string(),
                line: self.line,
            })
    }

    /// Name of the imported module `base` refers to.
    fn module(&self, base: &Expr) -> Result<String, EvalError> {
        let Expr::Name(name) = base else {
            return Err(self.bad_arguments(".", "attributes are only available on modules"));
        };
        if self.modules.contains(name) {
            Ok(name.clone())
        } else if self.bindings.contains_key(name) {
            Err(self.bad_arguments(name, "attributes are only available on modules"))
        } else if MODULES.contains(&name.as_str()) {
            Err(EvalError::ModuleNotImported {
                module: name.clone(),
                line: self.line,
            })
        } else {
            Err(EvalError::UndefinedName {
                name: name.clone(),
                line: self.line,
            })
        }
    }

    fn call(&self, callee: &Expr, args: &[Expr], kwargs: &[(String, Expr)]) -> Result<Value, EvalError> {
        let args = args
            .iter()
            .map(|arg| self.eval(arg))
            .collect::<Result<Vec<_>, _>>()?;
        let kwargs = kwargs
            .iter()
            .map(|(key, expr)| Ok((key.clone(), self.eval(expr)?)))
            .collect::<Result<Vec<_>, EvalError>>()?;

        match callee {
            Expr::Attr { base, attr } => {
                let module = self.module(base)?;
                if !kwargs.is_empty() {
                    return Err(self.bad_arguments(attr, "takes no keyword arguments"));
                }
                let numbers = args
                    .iter()
                    .map(Value::as_f64)
                    .collect::<Option<Vec<f64>>>()
                    .ok_or_else(|| self.bad_arguments(attr, "arguments must be numbers"))?;
                math_function(attr, &numbers, self.line).unwrap_or_else(|| {
                    Err(EvalError::UnknownFunction {
                        module,
                        name: attr.clone(),
                        line: self.line,
                    })
                })
            }
            Expr::Name(name) => {
                if let Some(kind) = RecordKind::from_name(name) {
                    return Err(EvalError::NestedRecord {
                        kind,
                        line: self.line,
                    });
                }
                if Profile::is_profile_name(name) {
                    return Profile::from_call(name, args, kwargs)
                        .map(Value::Profile)
                        .map_err(|reason| self.bad_arguments(name, reason));
                }
                match builtin(name, args) {
                    Some(result) => result.map_err(|reason| self.bad_arguments(name, reason)),
                    None => Err(EvalError::UnknownProfile {
                        name: name.clone(),
                        line: self.line,
                    }),
                }
            }
            _ => Err(self.bad_arguments("call", "expression is not callable")),
        }
    }

    fn bad_arguments(&self, callee: &str, reason: impl Into<String>) -> EvalError {
        EvalError::BadArguments {
            callee: callee.to_string(),
            reason: reason.into(),
            line: self.line,
        }
    }
}

fn math_constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(std::f64::consts::PI),
        "e" => Some(std::f64::consts::E),
        "tau" => Some(std::f64::consts::TAU),
        _ => None,
    }
}

/// `None` when the function does not exist.
fn math_function(name: &str, args: &[f64], line: usize) -> Option<Result<Value, EvalError>> {
    let domain = || EvalError::MathDomain {
        function: name.to_string(),
        line,
    };
    let arity = |n: usize| {
        if args.len() == n {
            Ok(())
        } else {
            Err(EvalError::BadArguments {
                callee: format!("math.{name}"),
                reason: format!("takes {n} argument(s) ({} given)", args.len()),
                line,
            })
        }
    };
    let unary_fn: fn(f64) -> f64 = match name {
        "exp" => f64::exp,
        "cos" => f64::cos,
        "sin" => f64::sin,
        "tan" => f64::tan,
        "atan" => f64::atan,
        "fabs" => f64::abs,
        "sqrt" => {
            return Some(arity(1).and_then(|_| {
                if args[0] < 0.0 {
                    Err(domain())
                } else {
                    Ok(Value::Float(args[0].sqrt()))
                }
            }))
        }
        "log" => {
            return Some(match args {
                [x] if *x > 0.0 => Ok(Value::Float(x.ln())),
                [x, base] if *x > 0.0 && *base > 0.0 && *base != 1.0 => {
                    Ok(Value::Float(x.ln() / base.ln()))
                }
                [_] | [_, _] => Err(domain()),
                _ => arity(1).map(|_| Value::None),
            })
        }
        "pow" => return Some(arity(2).map(|_| Value::Float(args[0].powf(args[1])))),
        "floor" => {
            return Some(arity(1).and_then(|_| integral(args[0].floor()).ok_or_else(domain)))
        }
        "ceil" => {
            return Some(arity(1).and_then(|_| integral(args[0].ceil()).ok_or_else(domain)))
        }
        _ => return None,
    };
    Some(arity(1).map(|_| Value::Float(unary_fn(args[0]))))
}

/// An integral float as an `Int`, or left as a `Float` when it does not fit
/// in an `i64`. `None` for infinities and NaN.
fn integral(x: f64) -> Option<Value> {
    // 2^63 is exact in f64; `as` would saturate silently past it
    const BOUND: f64 = 9_223_372_036_854_775_808.0;
    if !x.is_finite() {
        None
    } else if (-BOUND..BOUND).contains(&x) {
        Some(Value::Int(x as i64))
    } else {
        Some(Value::Float(x))
    }
}

/// The few Python builtins decks reach for. `None` when `name` is not one.
fn builtin(name: &str, args: Vec<Value>) -> Option<Result<Value, String>> {
    let single = |args: &[Value]| match args {
        [value] => Ok(value.clone()),
        _ => Err(format!("takes exactly one argument ({} given)", args.len())),
    };
    let result = match name {
        "abs" => single(&args).and_then(|v| match v {
            Value::Int(i) => Ok(i.checked_abs().map_or(Value::Float(-(i as f64)), Value::Int)),
            Value::Float(x) => Ok(Value::Float(x.abs())),
            other => Err(format!("bad operand type {}", other.type_name())),
        }),
        "float" => single(&args).and_then(|v| {
            v.as_f64()
                .map(Value::Float)
                .ok_or_else(|| format!("cannot convert {} to float", v.type_name()))
        }),
        "int" => single(&args).and_then(|v| match v {
            Value::Int(i) => Ok(Value::Int(i)),
            Value::Float(x) => {
                integral(x.trunc()).ok_or_else(|| format!("cannot convert {x} to int"))
            }
            other => Err(format!("cannot convert {} to int", other.type_name())),
        }),
        "len" => single(&args).and_then(|v| match v {
            Value::List(items) => Ok(Value::Int(items.len() as i64)),
            Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
            other => Err(format!("{} has no len()", other.type_name())),
        }),
        "min" | "max" => {
            // `max([a, b])` as well as `max(a, b)`
            let unpacked = match args.as_slice() {
                [Value::List(items)] => Some(items.clone()),
                _ => None,
            };
            extremum(name == "max", unpacked.unwrap_or(args))
        }
        _ => return None,
    };
    Some(result)
}

fn extremum(max: bool, items: Vec<Value>) -> Result<Value, String> {
    let mut best: Option<(f64, Value)> = None;
    for item in items {
        let x = item
            .as_f64()
            .ok_or_else(|| format!("cannot compare {}", item.type_name()))?;
        let better = match &best {
            None => true,
            Some((current, _)) => (max && x > *current) || (!max && x < *current),
        };
        if better {
            best = Some((x, item));
        }
    }
    best.map(|(_, item)| item)
        .ok_or_else(|| "arg is an empty sequence".to_string())
}

/// Longest list `list * int` may build.
const MAX_LIST_LEN: usize = 1 << 20;

fn unary(op: UnaryOp, value: Value, line: usize) -> Result<Value, EvalError> {
    match (op, value) {
        (UnaryOp::Pos, value @ (Value::Int(_) | Value::Float(_))) => Ok(value),
        (UnaryOp::Neg, Value::Int(i)) => Ok(i
            .checked_neg()
            .map_or(Value::Float(-(i as f64)), Value::Int)),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (op, value) => Err(EvalError::BadOperand {
            op: if op == UnaryOp::Neg { "-" } else { "+" },
            operand: value.type_name(),
            line,
        }),
    }
}

fn binary(op: BinaryOp, lhs: Value, rhs: Value, line: usize) -> Result<Value, EvalError> {
    match (op, lhs, rhs) {
        (op, Value::Int(a), Value::Int(b)) => int_arithmetic(op, a, b, line),
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
        (BinaryOp::Add, Value::List(mut a), Value::List(b)) => {
            a.extend(b);
            Ok(Value::List(a))
        }
        // `[0.] * 3`
        (BinaryOp::Mul, Value::List(items), Value::Int(n))
        | (BinaryOp::Mul, Value::Int(n), Value::List(items)) => {
            let copies = usize::try_from(n).unwrap_or(0);
            if items.len().saturating_mul(copies) > MAX_LIST_LEN {
                return Err(EvalError::BadArguments {
                    callee: "*".to_string(),
                    reason: format!("list repeated {n} times exceeds {MAX_LIST_LEN} items"),
                    line,
                });
            }
            Ok(Value::List(
                std::iter::repeat(items).take(copies).flatten().collect(),
            ))
        }
        (op, lhs, rhs) => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(a), Some(b)) => float_arithmetic(op, a, b, line),
            _ => Err(EvalError::TypeMismatch {
                op: op.symbol(),
                lhs: lhs.type_name(),
                rhs: rhs.type_name(),
                line,
            }),
        },
    }
}

/// Integer arithmetic stays integral except for `/`, negative powers and
/// overflow, which fall back to floats.
fn int_arithmetic(op: BinaryOp, a: i64, b: i64, line: usize) -> Result<Value, EvalError> {
    let exact = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => None,
        BinaryOp::Pow => u32::try_from(b).ok().and_then(|e| a.checked_pow(e)),
    };
    match exact {
        Some(v) => Ok(Value::Int(v)),
        None => float_arithmetic(op, a as f64, b as f64, line),
    }
}

fn float_arithmetic(op: BinaryOp, a: f64, b: f64, line: usize) -> Result<Value, EvalError> {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero { line });
            }
            a / b
        }
        BinaryOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(EvalError::DivisionByZero { line });
            }
            let p = a.powf(b);
            if p.is_nan() && !a.is_nan() && !b.is_nan() {
                return Err(EvalError::MathDomain {
                    function: "**".to_string(),
                    line,
                });
            }
            p
        }
    };
    Ok(Value::Float(result))
}
