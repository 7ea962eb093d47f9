use crate::{
    error::FilterError,
    filter::{BuildCx, Filter},
    predicate::Predicate,
    query::QueryId,
};
use std::{cell::RefCell, collections::BTreeSet};

///
/// Composition nodes
///
/// Conjunction and Disjunction hold an ordered collection of
/// fragments. Order never affects the boolean result, but execution
/// runs side-effect-only fragments first (the pre-pass), so a filter
/// may reference an alias declared anywhere in the same composite.
///
/// The pre-pass runs at most once per query object: the same composed
/// tree is evaluated against the row query and then the count query,
/// and bookkeeping keys on query identity, not tree identity.
///

///
/// Conjunction
///

#[derive(Clone, Debug)]
pub struct Conjunction {
    parts: Vec<Filter>,
    primed: RefCell<BTreeSet<QueryId>>,
}

impl PartialEq for Conjunction {
    fn eq(&self, other: &Self) -> bool {
        self.parts == other.parts
    }
}

impl Conjunction {
    #[must_use]
    pub fn new(parts: Vec<Filter>) -> Self {
        Self {
            parts,
            primed: RefCell::new(BTreeSet::new()),
        }
    }

    #[must_use]
    pub fn parts(&self) -> &[Filter] {
        &self.parts
    }

    /// Run the fake-pre-pass for the context's query object, once.
    /// A failed pre-pass is not recorded, so a later evaluation against
    /// the same query object reports the same error instead of skipping
    /// the side effects.
    pub(crate) fn prime(&self, cx: &mut BuildCx<'_>) -> Result<(), FilterError> {
        if self.primed.borrow().contains(&cx.query.id()) {
            return Ok(());
        }

        prime_parts(&self.parts, cx)?;
        self.primed.borrow_mut().insert(cx.query.id());

        Ok(())
    }

    pub(crate) fn to_predicate(
        &self,
        cx: &mut BuildCx<'_>,
    ) -> Result<Option<Predicate>, FilterError> {
        self.prime(cx)?;

        let preds = real_pass(&self.parts, cx)?;

        Ok(combine(preds, Predicate::And))
    }
}

///
/// Disjunction
///
/// Runs the same pre-pass as Conjunction: a join declared in one
/// branch must be visible to sibling branches that navigate through
/// its alias.
///

#[derive(Clone, Debug)]
pub struct Disjunction {
    parts: Vec<Filter>,
    primed: RefCell<BTreeSet<QueryId>>,
}

impl PartialEq for Disjunction {
    fn eq(&self, other: &Self) -> bool {
        self.parts == other.parts
    }
}

impl Disjunction {
    #[must_use]
    pub fn new(parts: Vec<Filter>) -> Self {
        Self {
            parts,
            primed: RefCell::new(BTreeSet::new()),
        }
    }

    #[must_use]
    pub fn parts(&self) -> &[Filter] {
        &self.parts
    }

    pub(crate) fn prime(&self, cx: &mut BuildCx<'_>) -> Result<(), FilterError> {
        if self.primed.borrow().contains(&cx.query.id()) {
            return Ok(());
        }

        prime_parts(&self.parts, cx)?;
        self.primed.borrow_mut().insert(cx.query.id());

        Ok(())
    }

    pub(crate) fn to_predicate(
        &self,
        cx: &mut BuildCx<'_>,
    ) -> Result<Option<Predicate>, FilterError> {
        self.prime(cx)?;

        let preds = real_pass(&self.parts, cx)?;

        Ok(combine(preds, Predicate::Or))
    }
}

/// Recursively prime nested composites, then evaluate directly-held
/// side-effect-only fragments.
fn prime_parts(parts: &[Filter], cx: &mut BuildCx<'_>) -> Result<(), FilterError> {
    for part in parts {
        match part {
            Filter::Conjunction(conjunction) => conjunction.prime(cx)?,
            Filter::Disjunction(disjunction) => disjunction.prime(cx)?,
            _ => {}
        }
    }

    for part in parts {
        if part.is_side_effect_only() {
            part.to_predicate(cx)?;
        }
    }

    Ok(())
}

/// Evaluate every non-fake fragment, dropping "no constraint" results.
fn real_pass(parts: &[Filter], cx: &mut BuildCx<'_>) -> Result<Vec<Predicate>, FilterError> {
    let mut preds = Vec::with_capacity(parts.len());

    for part in parts {
        if part.is_side_effect_only() {
            continue;
        }
        if let Some(pred) = part.to_predicate(cx)? {
            preds.push(pred);
        }
    }

    Ok(preds)
}

fn combine(mut preds: Vec<Predicate>, compose: impl FnOnce(Vec<Predicate>) -> Predicate) -> Option<Predicate> {
    match preds.len() {
        0 => None,
        1 => preds.pop(),
        _ => Some(compose(preds)),
    }
}
