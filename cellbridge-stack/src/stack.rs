use std::sync::Arc;

use cellbridge_core::Cell;
use num_bigint::BigInt;
use thiserror::Error;

use crate::value::StackValue;

#[derive(Debug, Error, PartialEq)]
pub enum StackError {
    #[error("stack underflow: need {needed} operands, have {depth}")]
    Underflow { needed: usize, depth: usize },

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("integer {value} out of range {min}..={max}")]
    OutOfRange { value: BigInt, min: i64, max: i64 },
}

/// The host's operand stack as seen by bridge commands.
///
/// Typed pops consume the top value even when it has the wrong type, the
/// same as an untyped pop followed by a check.
pub trait OperandStack {
    fn depth(&self) -> usize;

    fn push(&mut self, value: StackValue);

    fn pop(&mut self) -> Result<StackValue, StackError>;

    /// Fails unless at least `needed` values are present. Never modifies the stack.
    fn check_underflow(&self, needed: usize) -> Result<(), StackError> {
        let depth = self.depth();
        if depth < needed {
            return Err(StackError::Underflow { needed, depth });
        }
        Ok(())
    }

    fn pop_int(&mut self) -> Result<BigInt, StackError> {
        match self.pop()? {
            StackValue::Int(n) => Ok(n),
            other => Err(mismatch("integer", &other)),
        }
    }

    fn pop_string(&mut self) -> Result<String, StackError> {
        match self.pop()? {
            StackValue::String(s) => Ok(s),
            other => Err(mismatch("string", &other)),
        }
    }

    fn pop_cell(&mut self) -> Result<Arc<Cell>, StackError> {
        match self.pop()? {
            StackValue::Cell(c) => Ok(c),
            other => Err(mismatch("cell", &other)),
        }
    }

    /// Pops an integer and checks that it lies in `min..=max`.
    fn pop_smallint_range(&mut self, min: i64, max: i64) -> Result<i64, StackError> {
        let value = self.pop_int()?;
        match i64::try_from(&value) {
            Ok(n) if (min..=max).contains(&n) => Ok(n),
            _ => Err(StackError::OutOfRange { value, min, max }),
        }
    }
}

fn mismatch(expected: &'static str, found: &StackValue) -> StackError {
    StackError::TypeMismatch {
        expected,
        found: found.type_name(),
    }
}

/// Vector-backed operand stack; the last element is the top.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct VecStack {
    values: Vec<StackValue>,
}

impl VecStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value `depth` positions below the top, if any.
    pub fn peek(&self, depth: usize) -> Option<&StackValue> {
        self.values.iter().rev().nth(depth)
    }

    /// Values from bottom to top.
    pub fn values(&self) -> &[StackValue] {
        &self.values
    }

    pub fn into_values(self) -> Vec<StackValue> {
        self.values
    }
}

impl From<Vec<StackValue>> for VecStack {
    fn from(values: Vec<StackValue>) -> Self {
        Self { values }
    }
}

impl OperandStack for VecStack {
    fn depth(&self) -> usize {
        self.values.len()
    }

    fn push(&mut self, value: StackValue) {
        self.values.push(value);
    }

    fn pop(&mut self) -> Result<StackValue, StackError> {
        self.values
            .pop()
            .ok_or(StackError::Underflow { needed: 1, depth: 0 })
    }
}
