use crate::{
    error::{ConfigError, FilterError},
    model::Schema,
    query::{JoinId, JoinKind, JoinParent, JoinRecord, QueryId, QueryState},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

///
/// JoinSpec
///
/// Lazy join definition stored in the registry. Evaluated on first
/// resolution against a query object, never at registration time, so
/// forward-declared joins work regardless of per-query evaluation
/// order.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct JoinSpec {
    pub origin: JoinOrigin,
    pub kind: JoinKind,
}

///
/// JoinOrigin
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum JoinOrigin {
    /// Join a relation directly off the entity root.
    Root { relation: String },

    /// Join a relation off a previously registered alias. The alias is
    /// resolved when this spec is evaluated, not when it is declared.
    Alias { alias: String, relation: String },
}

impl JoinSpec {
    /// Parse a declarative join path: `relation` joins from the root,
    /// `alias.relation` joins from a registered alias.
    #[must_use]
    pub fn from_path(path: &str, kind: JoinKind) -> Self {
        let origin = match path.split_once('.') {
            Some((alias, relation)) => JoinOrigin::Alias {
                alias: alias.to_string(),
                relation: relation.to_string(),
            },
            None => JoinOrigin::Root {
                relation: path.to_string(),
            },
        };

        Self { origin, kind }
    }

    /// The caller-facing path this spec was declared with.
    #[must_use]
    pub fn path(&self) -> String {
        match &self.origin {
            JoinOrigin::Root { relation } => relation.clone(),
            JoinOrigin::Alias { alias, relation } => format!("{alias}.{relation}"),
        }
    }
}

///
/// JoinContext
///
/// Per-query-evaluation registry and cache for join and fetch nodes.
/// Constructed fresh for every evaluation and threaded explicitly;
/// never shared across concurrent evaluations. One context may serve
/// two sequential query objects (row selection, then count) — caches
/// key on (alias, query id) so each query object gets its own nodes.
///

#[derive(Debug, Default)]
pub struct JoinContext {
    registry: BTreeMap<String, JoinSpec>,
    join_cache: BTreeMap<(String, QueryId), JoinId>,
    fetch_cache: BTreeMap<(String, QueryId), JoinId>,
}

impl JoinContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a lazy join spec under an alias. Re-registration
    /// overwrites; cached nodes from earlier evaluations are kept.
    pub fn register_join(&mut self, alias: impl Into<String>, spec: JoinSpec) {
        self.registry.insert(alias.into(), spec);
    }

    /// Whether an alias has a registered (not necessarily evaluated)
    /// join spec.
    #[must_use]
    pub fn is_registered(&self, alias: &str) -> bool {
        self.registry.contains_key(alias)
    }

    /// The join node already evaluated for (alias, query), if any.
    #[must_use]
    pub fn evaluated_join(&self, alias: &str, query: QueryId) -> Option<JoinId> {
        self.join_cache.get(&(alias.to_string(), query)).copied()
    }

    /// Resolve an alias to a join node for `query`, evaluating and
    /// caching the registered spec on first use. Exactly one join node
    /// exists per (alias, query) pair no matter how many fragments
    /// resolve it.
    ///
    /// `referencing_path` is the path of the fragment asking, carried
    /// into error messages.
    pub fn resolve_join(
        &mut self,
        alias: &str,
        referencing_path: &str,
        schema: &Schema,
        query: &mut QueryState,
    ) -> Result<JoinId, FilterError> {
        if let Some(id) = self.evaluated_join(alias, query.id()) {
            return Ok(id);
        }

        let spec = self
            .registry
            .get(alias)
            .cloned()
            .ok_or_else(|| ConfigError::UnresolvedAlias {
                alias: alias.to_string(),
                path: referencing_path.to_string(),
            })?;

        let (parent, relation) = match spec.origin {
            JoinOrigin::Root { relation } => (JoinParent::Root, relation),
            JoinOrigin::Alias {
                alias: base,
                relation,
            } => {
                let base_id = self.resolve_join(&base, referencing_path, schema, query)?;
                (JoinParent::Join(base_id), relation)
            }
        };

        let owner = query.entity_at(parent);
        let target = schema.relation(owner, &relation, referencing_path)?.target.clone();

        let id = query.add_join(JoinRecord {
            parent,
            relation,
            target,
            kind: spec.kind,
            fetch: false,
        });
        self.join_cache.insert((alias.to_string(), query.id()), id);

        Ok(id)
    }

    /// Resolve the first segment of a dotted path. Registered or cached
    /// join aliases win; evaluated fetch aliases are the fallback (a
    /// fetch alias used purely for navigation is otherwise
    /// indistinguishable from a join alias).
    pub(crate) fn resolve_path_head(
        &mut self,
        segment: &str,
        referencing_path: &str,
        schema: &Schema,
        query: &mut QueryState,
    ) -> Result<Option<JoinId>, FilterError> {
        if self.is_registered(segment) || self.evaluated_join(segment, query.id()).is_some() {
            return self
                .resolve_join(segment, referencing_path, schema, query)
                .map(Some);
        }

        Ok(self.resolve_fetch(segment, query.id()))
    }

    /// Cache an evaluated fetch node under an alias for one query.
    pub fn register_fetch(&mut self, alias: impl Into<String>, query: QueryId, node: JoinId) {
        self.fetch_cache.insert((alias.into(), query), node);
    }

    /// The fetch node evaluated for (alias, query), if any.
    #[must_use]
    pub fn resolve_fetch(&self, alias: &str, query: QueryId) -> Option<JoinId> {
        self.fetch_cache.get(&(alias.to_string(), query)).copied()
    }
}
