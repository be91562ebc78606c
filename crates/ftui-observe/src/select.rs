#![forbid(unsafe_code)]

//! Interception strategy selection.
//!
//! Every value the builder meets is routed by [`select`]:
//!
//! - scalars (including `Null`) pass through untouched and end recursion;
//! - arrays get their mutator set intercepted, and their elements and
//!   named properties walked;
//! - objects get an accessor on every present key.

use crate::array::Array;
use crate::object::Object;
use crate::value::Value;

/// How a value is intercepted.
#[derive(Debug, Clone, Copy)]
pub enum Strategy<'a> {
    /// Left as is.
    Scalar,
    /// Intercept structural mutators; walk elements and named properties.
    Sequence(&'a Array),
    /// Install accessors on every present key.
    Keyed(&'a Object),
}

/// Payload-free form of [`Strategy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Scalar,
    Sequence,
    Keyed,
}

impl Strategy<'_> {
    #[must_use]
    pub const fn kind(&self) -> StrategyKind {
        match self {
            Self::Scalar => StrategyKind::Scalar,
            Self::Sequence(_) => StrategyKind::Sequence,
            Self::Keyed(_) => StrategyKind::Keyed,
        }
    }
}

/// Choose the interception strategy for `value`.
#[must_use]
pub fn select(value: &Value) -> Strategy<'_> {
    match value {
        Value::Array(arr) => Strategy::Sequence(arr),
        Value::Object(obj) => Strategy::Keyed(obj),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Strategy::Scalar,
    }
}
