//! Builder for composite metric expressions.
//!
//! ```
//! use metricops::composite::{divide, series, sum};
//!
//! let ratio = divide(
//!     sum(series("requests.errors", "*")),
//!     sum(series("requests.total", "*")),
//! );
//! assert_eq!(
//!     ratio.to_string(),
//!     r#"divide([sum(s("requests.errors", "*")), sum(s("requests.total", "*"))])"#
//! );
//! ```

use std::fmt;
use thiserror::Error;

/// Functions that take a single set of series and may wrap one directly.
pub const SET_FUNCTIONS: &[&str] = &["sum", "mean", "max", "min", "derive"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompositeError {
    #[error("Unknown composite function '{name}', expected one of: {}", SET_FUNCTIONS.join(", "))]
    UnknownFunction { name: String },
}

/// A composite expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Composite {
    /// `s("metric", "source", {options})`
    Series {
        metric: String,
        source: String,
        options: Vec<(String, String)>,
    },
    /// `name(args, {options})`
    Function {
        name: String,
        args: Vec<Composite>,
        options: Vec<(String, String)>,
    },
    /// `[a, b, ...]`
    List(Vec<Composite>),
    /// A quoted string argument.
    Literal(String),
}

impl Composite {
    /// Adds an option, rendered in insertion order. No effect on lists and
    /// literals.
    pub fn with_option(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        match &mut self {
            Composite::Series { options, .. } | Composite::Function { options, .. } => {
                options.push((key.into(), value.to_string()));
            }
            Composite::List(_) | Composite::Literal(_) => {}
        }
        self
    }

    /// Wraps `self` in one of the [`SET_FUNCTIONS`].
    pub fn wrap(self, function: &str) -> Result<Composite, CompositeError> {
        if !SET_FUNCTIONS.contains(&function) {
            return Err(CompositeError::UnknownFunction {
                name: function.to_string(),
            });
        }
        Ok(call(function, vec![self]))
    }
}

/// A single metric stream.
pub fn series(metric: impl Into<String>, source: impl Into<String>) -> Composite {
    Composite::Series {
        metric: metric.into(),
        source: source.into(),
        options: Vec::new(),
    }
}

/// A function call with arbitrary arguments.
pub fn call(name: impl Into<String>, args: Vec<Composite>) -> Composite {
    Composite::Function {
        name: name.into(),
        args,
        options: Vec::new(),
    }
}

pub fn sum(set: Composite) -> Composite {
    call("sum", vec![set])
}

pub fn mean(set: Composite) -> Composite {
    call("mean", vec![set])
}

pub fn max(set: Composite) -> Composite {
    call("max", vec![set])
}

pub fn min(set: Composite) -> Composite {
    call("min", vec![set])
}

pub fn derive(set: Composite) -> Composite {
    call("derive", vec![set])
}

pub fn divide(dividend: Composite, divisor: Composite) -> Composite {
    call("divide", vec![Composite::List(vec![dividend, divisor])])
}

pub fn multiply(a: Composite, b: Composite) -> Composite {
    call("multiply", vec![Composite::List(vec![a, b])])
}

pub fn subtract(minuend: Composite, subtrahend: Composite) -> Composite {
    call("subtract", vec![Composite::List(vec![minuend, subtrahend])])
}

/// `scale(set, {factor: "f"})`
pub fn scale(set: Composite, factor: f64) -> Composite {
    call("scale", vec![set]).with_option("factor", factor)
}

/// `timeshift("shift", set)`, e.g. a shift of `"1d"`.
pub fn timeshift(shift: impl Into<String>, set: Composite) -> Composite {
    call("timeshift", vec![Composite::Literal(shift.into()), set])
}

fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in text.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            c => write!(f, "{}", c)?,
        }
    }
    f.write_str("\"")
}

fn write_options(f: &mut fmt::Formatter<'_>, options: &[(String, String)]) -> fmt::Result {
    f.write_str("{")?;
    for (i, (key, value)) in options.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}: ", key)?;
        write_quoted(f, value)?;
    }
    f.write_str("}")
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Composite]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Composite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Composite::Series {
                metric,
                source,
                options,
            } => {
                f.write_str("s(")?;
                write_quoted(f, metric)?;
                f.write_str(", ")?;
                write_quoted(f, source)?;
                if !options.is_empty() {
                    f.write_str(", ")?;
                    write_options(f, options)?;
                }
                f.write_str(")")
            }
            Composite::Function {
                name,
                args,
                options,
            } => {
                write!(f, "{}(", name)?;
                write_list(f, args)?;
                if !options.is_empty() {
                    if !args.is_empty() {
                        f.write_str(", ")?;
                    }
                    write_options(f, options)?;
                }
                f.write_str(")")
            }
            Composite::List(items) => {
                f.write_str("[")?;
                write_list(f, items)?;
                f.write_str("]")
            }
            Composite::Literal(text) => write_quoted(f, text),
        }
    }
}
