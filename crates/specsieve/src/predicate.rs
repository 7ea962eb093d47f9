use crate::{fold::TextFold, query::JoinParent, value::Value};
use std::{
    fmt,
    ops::{BitAnd, BitOr},
};

///
/// Predicate IR
///
/// Pure representation of the condition tree handed to the external
/// query engine. This layer contains no schema validation or execution
/// semantics; it is the output of filter composition and the input of
/// the `mem` reference executor.
///

///
/// FieldRef
///
/// A resolved attribute reference: a navigation source (root or join
/// node) plus the remaining attribute segments.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldRef {
    pub source: JoinParent,
    pub segments: Vec<String>,
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source {
            JoinParent::Root => {}
            JoinParent::Join(id) => write!(f, "[join #{}].", id.index())?,
        }
        write!(f, "{}", self.segments.join("."))
    }
}

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

///
/// MatchMode
///
/// Anchoring of a pattern match.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MatchMode {
    Anywhere,
    Start,
    End,
}

///
/// Predicate
///

#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    True,
    False,
    And(Vec<Self>),
    Or(Vec<Self>),
    Not(Box<Self>),
    Compare {
        field: FieldRef,
        op: CompareOp,
        value: Value,
        fold: TextFold,
    },
    Match {
        field: FieldRef,
        pattern: String,
        mode: MatchMode,
        fold: TextFold,
    },
    Between {
        field: FieldRef,
        lower: Value,
        upper: Value,
    },
    In {
        field: FieldRef,
        values: Vec<Value>,
        negated: bool,
    },
    IsNull {
        field: FieldRef,
        negated: bool,
    },
}

impl Predicate {
    #[must_use]
    pub const fn and(preds: Vec<Self>) -> Self {
        Self::And(preds)
    }

    #[must_use]
    pub const fn or(preds: Vec<Self>) -> Self {
        Self::Or(preds)
    }

    #[expect(clippy::should_implement_trait)]
    #[must_use]
    pub fn not(pred: Self) -> Self {
        Self::Not(Box::new(pred))
    }

    #[must_use]
    pub const fn compare(field: FieldRef, op: CompareOp, value: Value) -> Self {
        Self::Compare {
            field,
            op,
            value,
            fold: TextFold::None,
        }
    }

    #[must_use]
    pub const fn eq(field: FieldRef, value: Value) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    #[must_use]
    pub const fn ne(field: FieldRef, value: Value) -> Self {
        Self::compare(field, CompareOp::Ne, value)
    }

    #[must_use]
    pub const fn lt(field: FieldRef, value: Value) -> Self {
        Self::compare(field, CompareOp::Lt, value)
    }

    #[must_use]
    pub const fn lte(field: FieldRef, value: Value) -> Self {
        Self::compare(field, CompareOp::Lte, value)
    }

    #[must_use]
    pub const fn gt(field: FieldRef, value: Value) -> Self {
        Self::compare(field, CompareOp::Gt, value)
    }

    #[must_use]
    pub const fn gte(field: FieldRef, value: Value) -> Self {
        Self::compare(field, CompareOp::Gte, value)
    }

    #[must_use]
    pub const fn is_null(field: FieldRef) -> Self {
        Self::IsNull {
            field,
            negated: false,
        }
    }

    #[must_use]
    pub const fn not_null(field: FieldRef) -> Self {
        Self::IsNull {
            field,
            negated: true,
        }
    }
}

impl BitAnd for Predicate {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self::And(vec![self, rhs])
    }
}

impl BitOr for Predicate {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::Or(vec![self, rhs])
    }
}
