use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while evaluating or resolving a parameter expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
    #[error("parameter #{0} is not bound")]
    UnboundParameter(usize),
    #[error("division by zero")]
    DivisionByZero,
    #[error("'{0}' does not evaluate to a finite number")]
    NonFinite(String),
}

/// Built-in functions allowed in OpenQASM 2.0 expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Exp,
    Ln,
    Sqrt,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sin" => Some(Function::Sin),
            "cos" => Some(Function::Cos),
            "tan" => Some(Function::Tan),
            "exp" => Some(Function::Exp),
            "ln" => Some(Function::Ln),
            "sqrt" => Some(Function::Sqrt),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Exp => "exp",
            Function::Ln => "ln",
            Function::Sqrt => "sqrt",
        }
    }

    fn apply(&self, x: f64) -> f64 {
        match self {
            Function::Sin => x.sin(),
            Function::Cos => x.cos(),
            Function::Tan => x.tan(),
            Function::Exp => x.exp(),
            Function::Ln => x.ln(),
            Function::Sqrt => x.sqrt(),
        }
    }
}

/// A gate parameter expression.
///
/// The parser produces `Var` for every identifier. Inside a gate definition
/// the names of formal parameters are then resolved to positional `Param`
/// references, so a definition does not depend on what its parameters were
/// called. The only free variable left after resolution is `pi`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Float(f64),
    Var(String),
    /// Formal parameter of the enclosing gate definition, by position.
    Param(usize),
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Call(Function, Box<Expr>),
}

impl Expr {
    /// Evaluates a constant expression (no parameters bound).
    pub fn evaluate(&self) -> Result<f64, ExprError> {
        self.evaluate_with(&[])
    }

    /// Evaluates the expression with `params[i]` bound to `Param(i)`.
    ///
    /// Every intermediate value must be finite, so a result can always be
    /// written back out as an OpenQASM real.
    pub fn evaluate_with(&self, params: &[f64]) -> Result<f64, ExprError> {
        let value = match self {
            Expr::Float(val) => *val,
            Expr::Var(name) if name == "pi" => std::f64::consts::PI,
            Expr::Var(name) => return Err(ExprError::UnknownVariable(name.clone())),
            Expr::Param(index) => *params
                .get(*index)
                .ok_or(ExprError::UnboundParameter(*index))?,
            Expr::Neg(inner) => -inner.evaluate_with(params)?,
            Expr::Add(lhs, rhs) => lhs.evaluate_with(params)? + rhs.evaluate_with(params)?,
            Expr::Sub(lhs, rhs) => lhs.evaluate_with(params)? - rhs.evaluate_with(params)?,
            Expr::Mul(lhs, rhs) => lhs.evaluate_with(params)? * rhs.evaluate_with(params)?,
            Expr::Div(lhs, rhs) => {
                let denom = rhs.evaluate_with(params)?;
                if denom == 0.0 {
                    return Err(ExprError::DivisionByZero);
                }
                lhs.evaluate_with(params)? / denom
            }
            Expr::Pow(lhs, rhs) => lhs.evaluate_with(params)?.powf(rhs.evaluate_with(params)?),
            Expr::Call(func, arg) => func.apply(arg.evaluate_with(params)?),
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ExprError::NonFinite(self.to_qasm(&[])))
        }
    }

    /// Replaces named variables by positional parameters. `formals` maps a
    /// formal parameter name to its position; `pi` is left untouched.
    pub fn resolve(&self, formals: &HashMap<String, usize>) -> Result<Expr, ExprError> {
        let binary = |lhs: &Expr, rhs: &Expr| -> Result<(Box<Expr>, Box<Expr>), ExprError> {
            Ok((Box::new(lhs.resolve(formals)?), Box::new(rhs.resolve(formals)?)))
        };
        Ok(match self {
            Expr::Var(name) if name == "pi" => self.clone(),
            Expr::Var(name) => match formals.get(name) {
                Some(index) => Expr::Param(*index),
                None => return Err(ExprError::UnknownVariable(name.clone())),
            },
            Expr::Float(_) | Expr::Param(_) => self.clone(),
            Expr::Neg(inner) => Expr::Neg(Box::new(inner.resolve(formals)?)),
            Expr::Add(lhs, rhs) => {
                let (lhs, rhs) = binary(lhs, rhs)?;
                Expr::Add(lhs, rhs)
            }
            Expr::Sub(lhs, rhs) => {
                let (lhs, rhs) = binary(lhs, rhs)?;
                Expr::Sub(lhs, rhs)
            }
            Expr::Mul(lhs, rhs) => {
                let (lhs, rhs) = binary(lhs, rhs)?;
                Expr::Mul(lhs, rhs)
            }
            Expr::Div(lhs, rhs) => {
                let (lhs, rhs) = binary(lhs, rhs)?;
                Expr::Div(lhs, rhs)
            }
            Expr::Pow(lhs, rhs) => {
                let (lhs, rhs) = binary(lhs, rhs)?;
                Expr::Pow(lhs, rhs)
            }
            Expr::Call(func, arg) => Expr::Call(*func, Box::new(arg.resolve(formals)?)),
        })
    }

    /// Largest `Param` index referenced, if any.
    pub fn max_param(&self) -> Option<usize> {
        match self {
            Expr::Param(index) => Some(*index),
            Expr::Float(_) | Expr::Var(_) => None,
            Expr::Neg(inner) | Expr::Call(_, inner) => inner.max_param(),
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => lhs.max_param().max(rhs.max_param()),
        }
    }

    /// First free variable other than `pi`.
    pub fn free_variable(&self) -> Option<&str> {
        match self {
            Expr::Var(name) if name != "pi" => Some(name.as_str()),
            Expr::Float(_) | Expr::Var(_) | Expr::Param(_) => None,
            Expr::Neg(inner) | Expr::Call(_, inner) => inner.free_variable(),
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => lhs.free_variable().or_else(|| rhs.free_variable()),
        }
    }

    /// Renders the expression as OpenQASM, naming `Param(i)` as `names[i]`.
    pub fn to_qasm(&self, names: &[String]) -> String {
        match self {
            Expr::Float(val) => format!("{:?}", val),
            Expr::Var(name) => name.clone(),
            Expr::Param(index) => names
                .get(*index)
                .cloned()
                .unwrap_or_else(|| format!("p{}", index)),
            Expr::Neg(inner) => format!("(-{})", inner.to_qasm(names)),
            Expr::Add(lhs, rhs) => format!("({} + {})", lhs.to_qasm(names), rhs.to_qasm(names)),
            Expr::Sub(lhs, rhs) => format!("({} - {})", lhs.to_qasm(names), rhs.to_qasm(names)),
            Expr::Mul(lhs, rhs) => format!("({} * {})", lhs.to_qasm(names), rhs.to_qasm(names)),
            Expr::Div(lhs, rhs) => format!("({} / {})", lhs.to_qasm(names), rhs.to_qasm(names)),
            Expr::Pow(lhs, rhs) => format!("({} ^ {})", lhs.to_qasm(names), rhs.to_qasm(names)),
            Expr::Call(func, arg) => format!("{}({})", func.name(), arg.to_qasm(names)),
        }
    }
}
