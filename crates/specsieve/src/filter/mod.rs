pub mod composite;
pub mod decorator;
pub mod join;
pub mod leaf;

#[cfg(test)]
mod tests;

pub use composite::{Conjunction, Disjunction};
pub use decorator::{MismatchPolicy, OnMismatch};
pub use join::{Join, JoinFetch};
pub use leaf::{Leaf, LeafKind};

use crate::{
    context::JoinContext,
    error::FilterError,
    model::Schema,
    predicate::Predicate,
    query::QueryState,
};

///
/// BuildCx
///
/// The query construction context a filter evaluates against: the
/// schema (entity root navigation), the mutable query object, and the
/// join context. Constructed fresh per evaluation and threaded
/// explicitly; there is no ambient state.
///

pub struct BuildCx<'a> {
    pub schema: &'a Schema,
    pub query: &'a mut QueryState,
    pub joins: &'a mut JoinContext,
}

impl<'a> BuildCx<'a> {
    #[must_use]
    pub const fn new(
        schema: &'a Schema,
        query: &'a mut QueryState,
        joins: &'a mut JoinContext,
    ) -> Self {
        Self {
            schema,
            query,
            joins,
        }
    }
}

///
/// Filter
///
/// A composable fragment of filtering logic. Evaluation produces a
/// predicate or `None` ("no constraint"); side-effect-only fragments
/// (join registration) always produce `None`. A composed tree is built
/// once and may be evaluated against several query objects in
/// sequence; fragments are side-effect-free except through the join
/// context and the query object itself.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    Conjunction(Conjunction),
    Disjunction(Disjunction),
    Join(Join),
    JoinFetch(JoinFetch),
    Leaf(Leaf),
    OnMismatch(OnMismatch),
}

impl Filter {
    /// Evaluate this fragment against a query construction context.
    pub fn to_predicate(&self, cx: &mut BuildCx<'_>) -> Result<Option<Predicate>, FilterError> {
        match self {
            Self::Conjunction(conjunction) => conjunction.to_predicate(cx),
            Self::Disjunction(disjunction) => disjunction.to_predicate(cx),
            Self::Join(join) => join.to_predicate(cx),
            Self::JoinFetch(fetch) => fetch.to_predicate(cx),
            Self::Leaf(leaf) => leaf.to_predicate(cx),
            Self::OnMismatch(decorated) => decorated.to_predicate(cx),
        }
    }

    /// Whether this fragment exists only for its side effects and never
    /// contributes a condition. Composition nodes evaluate these in a
    /// pre-pass so declaration order does not matter to callers.
    #[must_use]
    pub const fn is_side_effect_only(&self) -> bool {
        matches!(self, Self::Join(_) | Self::JoinFetch(_))
    }
}

impl From<Conjunction> for Filter {
    fn from(value: Conjunction) -> Self {
        Self::Conjunction(value)
    }
}

impl From<Disjunction> for Filter {
    fn from(value: Disjunction) -> Self {
        Self::Disjunction(value)
    }
}

impl From<Join> for Filter {
    fn from(value: Join) -> Self {
        Self::Join(value)
    }
}

impl From<JoinFetch> for Filter {
    fn from(value: JoinFetch) -> Self {
        Self::JoinFetch(value)
    }
}

impl From<Leaf> for Filter {
    fn from(value: Leaf) -> Self {
        Self::Leaf(value)
    }
}

impl From<OnMismatch> for Filter {
    fn from(value: OnMismatch) -> Self {
        Self::OnMismatch(value)
    }
}
