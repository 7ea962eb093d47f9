use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

///
/// ResultKind
///
/// Execution mode of the query being built. Count-mode evaluation
/// drops eager-load semantics (see `filter::JoinFetch`).
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResultKind {
    Rows,
    Count,
}

///
/// QueryId
///
/// Identity of one query-construction object. The same composed filter
/// tree is typically evaluated against two query objects in sequence
/// (row selection, then count); caches and pre-pass bookkeeping key on
/// this identity, never on tree identity.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct QueryId(u64);

static NEXT_QUERY_ID: AtomicU64 = AtomicU64::new(0);

impl QueryId {
    fn next() -> Self {
        Self(NEXT_QUERY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

///
/// JoinId
///
/// Handle into a query's join-node arena. Two fragments that resolve
/// the same alias against the same query receive the same handle.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct JoinId(usize);

impl JoinId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

///
/// JoinKind
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    #[default]
    Left,
    Right,
}

///
/// JoinParent
///
/// Where a join or attribute path starts: the entity root, or a
/// previously built join node.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JoinParent {
    Root,
    Join(JoinId),
}

///
/// JoinRecord
///
/// One join node in the built query. `fetch` marks eager-load joins;
/// they participate in row expansion like plain joins but additionally
/// instruct the engine to load the related data.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JoinRecord {
    pub parent: JoinParent,
    pub relation: String,
    pub target: String,
    pub kind: JoinKind,
    pub fetch: bool,
}

///
/// QueryState
///
/// The mutable query object for one evaluation mode. Owns the join
/// arena; filter fragments mutate it only through `BuildCx`.
///

#[derive(Debug)]
pub struct QueryState {
    id: QueryId,
    root: String,
    result: ResultKind,
    distinct: bool,
    joins: Vec<JoinRecord>,
}

impl QueryState {
    #[must_use]
    pub fn new(root_entity: impl Into<String>, result: ResultKind) -> Self {
        Self {
            id: QueryId::next(),
            root: root_entity.into(),
            result,
            distinct: false,
            joins: Vec::new(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> QueryId {
        self.id
    }

    #[must_use]
    pub fn root_entity(&self) -> &str {
        &self.root
    }

    #[must_use]
    pub const fn result(&self) -> ResultKind {
        self.result
    }

    #[must_use]
    pub const fn distinct(&self) -> bool {
        self.distinct
    }

    pub const fn set_distinct(&mut self, distinct: bool) {
        self.distinct = distinct;
    }

    #[must_use]
    pub fn joins(&self) -> &[JoinRecord] {
        &self.joins
    }

    #[must_use]
    pub fn join(&self, id: JoinId) -> &JoinRecord {
        &self.joins[id.index()]
    }

    /// Entity name at a join parent (the root, or a join's target).
    #[must_use]
    pub fn entity_at(&self, parent: JoinParent) -> &str {
        match parent {
            JoinParent::Root => &self.root,
            JoinParent::Join(id) => &self.join(id).target,
        }
    }

    /// Append a join node and return its handle.
    pub fn add_join(&mut self, record: JoinRecord) -> JoinId {
        self.joins.push(record);

        JoinId(self.joins.len() - 1)
    }
}
