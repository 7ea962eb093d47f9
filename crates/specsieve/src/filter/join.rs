use crate::{
    context::JoinSpec,
    error::{ConfigError, FilterError},
    filter::BuildCx,
    predicate::Predicate,
    query::{JoinKind, JoinParent, JoinRecord, ResultKind},
};

///
/// Join
///
/// Side-effect-only fragment: registers a lazy join spec under an
/// alias and toggles the query's distinct flag (needed when joining
/// one-to-many relations, to avoid duplicate parent rows). Never
/// contributes a condition.
///
/// The path joins a relation off the root (`orders`) or off a
/// previously registered alias (`o.tags`); the base alias is resolved
/// when the spec is first evaluated, and must be declared by then.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Join {
    path: String,
    alias: String,
    kind: JoinKind,
    distinct: bool,
}

impl Join {
    #[must_use]
    pub fn new(path: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            alias: alias.into(),
            kind: JoinKind::Inner,
            distinct: true,
        }
    }

    #[must_use]
    pub const fn kind(mut self, kind: JoinKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub const fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    #[must_use]
    pub fn alias_name(&self) -> &str {
        &self.alias
    }

    pub(crate) fn to_predicate(
        &self,
        cx: &mut BuildCx<'_>,
    ) -> Result<Option<Predicate>, FilterError> {
        cx.query.set_distinct(self.distinct);
        cx.joins
            .register_join(&self.alias, JoinSpec::from_path(&self.path, self.kind));

        Ok(None)
    }
}

///
/// JoinFetch
///
/// Side-effect-only fragment that eagerly loads related data for one
/// path or a batch of paths sharing a join kind. An alias is allowed
/// only with exactly one path.
///
/// Count-mode evaluation has no row shape to fetch into, so the fetch
/// is skipped — unless an alias is present, which signals the join is
/// also used for filtering elsewhere; then the identical definition is
/// re-expressed as a plain `Join` and delegated, preserving the
/// filtering semantics while dropping the eager load.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JoinFetch {
    paths: Vec<String>,
    alias: Option<String>,
    kind: JoinKind,
    distinct: bool,
}

impl JoinFetch {
    #[must_use]
    pub fn new(paths: Vec<String>) -> Self {
        Self {
            paths,
            alias: None,
            kind: JoinKind::Left,
            distinct: true,
        }
    }

    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    #[must_use]
    pub const fn kind(mut self, kind: JoinKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub const fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    pub(crate) fn to_predicate(
        &self,
        cx: &mut BuildCx<'_>,
    ) -> Result<Option<Predicate>, FilterError> {
        if let Some(alias) = &self.alias
            && self.paths.len() != 1
        {
            return Err(ConfigError::AliasOnMultiFetch {
                alias: alias.clone(),
                paths: self.paths.len(),
            }
            .into());
        }

        match cx.query.result() {
            ResultKind::Count => match &self.alias {
                Some(alias) => Join::new(&self.paths[0], alias)
                    .kind(self.kind)
                    .distinct(self.distinct)
                    .to_predicate(cx),
                None => Ok(None),
            },
            ResultKind::Rows => {
                cx.query.set_distinct(self.distinct);

                for path in &self.paths {
                    let node = self.fetch_one(cx, path)?;
                    if let Some(alias) = &self.alias {
                        cx.joins.register_fetch(alias, cx.query.id(), node);
                    }
                }

                Ok(None)
            }
        }
    }

    /// Add one fetch node. A dotted path reroutes through a previously
    /// evaluated fetch alias so nested fetches chain.
    fn fetch_one(
        &self,
        cx: &mut BuildCx<'_>,
        path: &str,
    ) -> Result<crate::query::JoinId, FilterError> {
        let (parent, relation) = match path.split_once('.') {
            Some((base, relation)) => {
                let id = cx.joins.resolve_fetch(base, cx.query.id()).ok_or_else(|| {
                    ConfigError::UnresolvedFetchAlias {
                        alias: base.to_string(),
                        path: path.to_string(),
                    }
                })?;

                (JoinParent::Join(id), relation)
            }
            None => (JoinParent::Root, path),
        };

        let owner = cx.query.entity_at(parent);
        let target = cx.schema.relation(owner, relation, path)?.target.clone();

        Ok(cx.query.add_join(JoinRecord {
            parent,
            relation: relation.to_string(),
            target,
            kind: self.kind,
            fetch: true,
        }))
    }
}
