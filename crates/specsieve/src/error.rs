use crate::model::FieldKind;
use std::fmt;
use thiserror::Error as ThisError;

///
/// FilterError
///
/// Top-level error surface for definition resolution and filter
/// evaluation. Configuration errors are fatal caller mistakes;
/// conversion errors are recoverable per-fragment and may be
/// intercepted by an `OnMismatch` decorator.
///

#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum FilterError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Convert(#[from] ConvertError),
}

impl FilterError {
    /// Whether a mismatch decorator is allowed to intercept this error.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Convert(_))
    }
}

///
/// ConfigError
///
/// Malformed declarative definitions. Never retried; surfaced at
/// resolution or first evaluation. Messages name the offending alias
/// or path and, where relevant, the referencing fragment's path.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ConfigError {
    #[error("alias '{alias}' not found while resolving path '{path}'; declare the join before referencing it")]
    UnresolvedAlias { alias: String, path: String },

    #[error("fetch alias '{alias}' not found while resolving fetch path '{path}'")]
    UnresolvedFetchAlias { alias: String, path: String },

    #[error("an alias requires exactly one fetch path; alias '{alias}' is attached to {paths} paths")]
    AliasOnMultiFetch { alias: String, paths: usize },

    #[error("unknown entity '{entity}'")]
    UnknownEntity { entity: String },

    #[error("unknown attribute '{attribute}' on entity '{entity}' in path '{path}'")]
    UnknownAttribute {
        entity: String,
        attribute: String,
        path: String,
    },

    #[error("attribute '{attribute}' on entity '{entity}' is not a relation in path '{path}'")]
    NotARelation {
        entity: String,
        attribute: String,
        path: String,
    },

    #[error(
        "attribute '{attribute}' on entity '{entity}' is a to-many relation; declare a join instead of navigating it inline in path '{path}'"
    )]
    ToManyNavigation {
        entity: String,
        attribute: String,
        path: String,
    },

    #[error("path '{path}' does not end at a scalar attribute")]
    NonScalarTerminal { path: String },

    #[error("empty attribute path")]
    EmptyPath,

    #[error("filter kind '{kind}' expects {expected} argument(s), found {found}")]
    ArgumentArity {
        kind: String,
        expected: Arity,
        found: usize,
    },

    #[error("path variable '{name}' is missing")]
    MissingPathVariable { name: String },
}

///
/// ConvertError
///
/// A supplied raw value could not be converted to the target
/// attribute's data type. Recoverable per-fragment.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("cannot convert '{raw}' to {kind} for attribute '{attribute}'")]
pub struct ConvertError {
    pub raw: String,
    pub attribute: String,
    pub kind: FieldKind,
}

///
/// Arity
///
/// Declared argument-count contract of a leaf filter kind.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    /// Whether `found` satisfies this contract.
    #[must_use]
    pub const fn accepts(self, found: usize) -> bool {
        match self {
            Self::Exact(expected) => found == expected,
            Self::AtLeast(expected) => found >= expected,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "exactly {n}"),
            Self::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}
