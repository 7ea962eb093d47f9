use crate::{
    error::FilterError,
    filter::{BuildCx, Filter},
    predicate::Predicate,
};
use serde::{Deserialize, Serialize};

///
/// MismatchPolicy
///
/// How a type-conversion failure in a wrapped fragment surfaces.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum MismatchPolicy {
    /// Conversion errors propagate as a fatal input-validation failure.
    #[default]
    Propagate,

    /// Conversion errors yield an unconditionally false predicate, so a
    /// multi-field OR degrades gracefully when one branch's attribute
    /// type does not match the supplied value.
    EmptyResult,

    /// Conversion errors yield "no constraint", so the surrounding
    /// composite simply omits this branch — the AND-context companion
    /// to `EmptyResult`.
    Ignore,
}

///
/// OnMismatch
///
/// Wraps a fragment and applies a mismatch policy to conversion
/// errors. Configuration errors always propagate.
///

#[derive(Clone, Debug, PartialEq)]
pub struct OnMismatch {
    policy: MismatchPolicy,
    inner: Box<Filter>,
}

impl OnMismatch {
    #[must_use]
    pub fn new(policy: MismatchPolicy, inner: Filter) -> Self {
        Self {
            policy,
            inner: Box::new(inner),
        }
    }

    #[must_use]
    pub const fn policy(&self) -> MismatchPolicy {
        self.policy
    }

    #[must_use]
    pub fn inner(&self) -> &Filter {
        &self.inner
    }

    pub(crate) fn to_predicate(
        &self,
        cx: &mut BuildCx<'_>,
    ) -> Result<Option<Predicate>, FilterError> {
        match self.inner.to_predicate(cx) {
            Err(err) if err.is_recoverable() => match self.policy {
                MismatchPolicy::Propagate => Err(err),
                MismatchPolicy::EmptyResult => Ok(Some(Predicate::False)),
                MismatchPolicy::Ignore => Ok(None),
            },
            other => other,
        }
    }
}
