//! Time-dependent boundary expressions.
//!
//! An expression is evaluated pointwise as `(cell, x) -> f64` and carries its
//! own time value. The time-stepping loop is the only writer of that value and
//! updates it through [`ExpressionRegistry::set_time`] before the residual is
//! re-evaluated.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Deserialize;

use super::Point;
use crate::error::{BoundaryError, Result};

/// Shared function type for expression sources, `(t, x) -> value`.
pub type SFn = Arc<dyn Fn(f64, Point) -> f64 + Send + Sync>;

/// Local trait allowing convenient conversion into [`SFn`].
pub trait IntoSFn {
    fn into_sfn(self) -> SFn;
}

fn c(val: f64) -> SFn {
    Arc::new(move |_, _| val)
}

impl IntoSFn for f64 {
    fn into_sfn(self) -> SFn {
        c(self)
    }
}

impl<F> IntoSFn for F
where
    F: Fn(f64, Point) -> f64 + Send + Sync + 'static,
{
    fn into_sfn(self) -> SFn {
        Arc::new(self)
    }
}

/// Time value stored as raw `f64` bits so expressions stay `Sync`.
#[derive(Debug, Default)]
struct TimeCell(AtomicU64);

impl TimeCell {
    pub fn new(t: f64) -> Self {
        Self(AtomicU64::new(t.to_bits()))
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, t: f64) {
        self.0.store(t.to_bits(), Ordering::Release);
    }
}

/// Pointwise-evaluable, time-mutable quantity.
pub trait PointwiseExpression: Send + Sync {
    /// Value at point `x` inside (or on the boundary of) `cell`.
    fn value(&self, cell: usize, x: Point) -> f64;

    /// Composite values forward the time to the expressions they wrap.
    fn set_time(&self, t: f64);

    fn time(&self) -> f64;
}

/// A compiled scalar expression of time and position.
pub struct Expression {
    source: SFn,
    t: TimeCell,
}

impl Expression {
    pub fn new(source: impl IntoSFn) -> Self {
        Self {
            source: source.into_sfn(),
            t: TimeCell::new(0.0),
        }
    }

    pub fn constant(val: f64) -> Self {
        Self::new(val)
    }

    pub fn eval(&self, x: Point) -> f64 {
        (self.source)(self.t.get(), x)
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expression")
            .field("t", &self.t.get())
            .finish_non_exhaustive()
    }
}

impl PointwiseExpression for Expression {
    fn value(&self, _cell: usize, x: Point) -> f64 {
        self.eval(x)
    }

    fn set_time(&self, t: f64) {
        self.t.set(t);
    }

    fn time(&self) -> f64 {
        self.t.get()
    }
}

/// A declared scalar parameter: a number or a symbolic expression to compile.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Coefficient {
    Constant(f64),
    Symbolic(String),
}

impl From<f64> for Coefficient {
    fn from(val: f64) -> Self {
        Coefficient::Constant(val)
    }
}

impl From<&str> for Coefficient {
    fn from(source: &str) -> Self {
        Coefficient::Symbolic(source.to_string())
    }
}

/// Symbolic-to-numeric compiler.
pub trait ExpressionCompiler {
    fn compile(&self, source: &str) -> Result<SFn>;
}

/// Compiler backed by a table of named closures.
///
/// Sources that parse as a number compile to constants; any other source must
/// name a registered function.
#[derive(Clone, Default)]
pub struct NamedExpressions {
    table: HashMap<String, SFn>,
}

impl NamedExpressions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, f: impl IntoSFn) -> Self {
        self.insert(name, f);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, f: impl IntoSFn) {
        self.table.insert(name.into(), f.into_sfn());
    }
}

impl ExpressionCompiler for NamedExpressions {
    fn compile(&self, source: &str) -> Result<SFn> {
        let source = source.trim();
        if let Ok(val) = source.parse::<f64>() {
            return Ok(c(val));
        }
        self.table.get(source).cloned().ok_or_else(|| {
            BoundaryError::InvalidConfiguration(format!("cannot compile expression `{source}`"))
        })
    }
}

impl Coefficient {
    pub fn compile(&self, compiler: &dyn ExpressionCompiler) -> Result<Arc<Expression>> {
        let source = match self {
            Coefficient::Constant(val) => c(*val),
            Coefficient::Symbolic(s) => compiler.compile(s)?,
        };
        Ok(Arc::new(Expression {
            source,
            t: TimeCell::new(0.0),
        }))
    }
}

/// Expressions whose time value must be refreshed once per step.
#[derive(Clone, Default)]
pub struct ExpressionRegistry {
    expressions: Vec<Arc<dyn PointwiseExpression>>,
}

impl ExpressionRegistry {
    pub fn push(&mut self, expr: Arc<dyn PointwiseExpression>) {
        self.expressions.push(expr);
    }

    pub fn extend(&mut self, other: ExpressionRegistry) {
        self.expressions.extend(other.expressions);
    }

    pub fn set_time(&self, t: f64) {
        for expr in &self.expressions {
            expr.set_time(t);
        }
    }

    pub fn len(&self) -> usize {
        self.expressions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }
}
