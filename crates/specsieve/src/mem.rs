use crate::{
    fold::TextFold,
    model::{EntityFieldKind, Schema},
    predicate::{CompareOp, FieldRef, MatchMode, Predicate},
    query::{JoinKind, JoinParent, QueryState},
    value::Value,
};
use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet},
};

///
/// In-memory reference executor
///
/// Interprets a built query (join arena + distinct flag) and a
/// predicate against plain row tables. This is the testing and
/// reference surface for composed filters, not a database: evaluation
/// is pure, unsupported comparisons are non-matches, and absent rows
/// from outer joins read as nulls.
///

///
/// Row
///
/// Scalar fields by name plus relation links as indices into the
/// target entity's table.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    fields: BTreeMap<String, Value>,
    links: BTreeMap<String, Vec<usize>>,
}

impl Row {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn link(mut self, relation: impl Into<String>, targets: Vec<usize>) -> Self {
        self.links.insert(relation.into(), targets);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    fn linked(&self, relation: &str) -> &[usize] {
        self.links.get(relation).map_or(&[], Vec::as_slice)
    }
}

///
/// Dataset
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    tables: BTreeMap<String, Vec<Row>>,
}

impl Dataset {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn table(mut self, entity: impl Into<String>, rows: Vec<Row>) -> Self {
        self.tables.insert(entity.into(), rows);
        self
    }

    #[must_use]
    pub fn rows(&self, entity: &str) -> &[Row] {
        self.tables.get(entity).map_or(&[], Vec::as_slice)
    }
}

///
/// Tuple
///
/// One joined row combination: the root row index plus one binding per
/// join node (None when an outer join found no match).
///

#[derive(Clone, Debug)]
struct Tuple {
    root: usize,
    bindings: Vec<Option<usize>>,
}

/// Execute a row query: root row indices after join expansion and
/// filtering, distinct-aware, in table order of first appearance.
#[must_use]
pub fn select(
    ds: &Dataset,
    schema: &Schema,
    query: &QueryState,
    predicate: Option<&Predicate>,
) -> Vec<usize> {
    let matched = matched_tuples(ds, schema, query, predicate);
    let roots = matched.iter().map(|tuple| tuple.root);

    if query.distinct() {
        let mut seen = BTreeSet::new();
        roots.filter(|root| seen.insert(*root)).collect()
    } else {
        roots.collect()
    }
}

/// Execute a count query over the same expansion.
#[must_use]
pub fn count(
    ds: &Dataset,
    schema: &Schema,
    query: &QueryState,
    predicate: Option<&Predicate>,
) -> usize {
    let matched = matched_tuples(ds, schema, query, predicate);

    if query.distinct() {
        matched
            .iter()
            .map(|tuple| tuple.root)
            .collect::<BTreeSet<_>>()
            .len()
    } else {
        matched.len()
    }
}

fn matched_tuples(
    ds: &Dataset,
    schema: &Schema,
    query: &QueryState,
    predicate: Option<&Predicate>,
) -> Vec<Tuple> {
    expand(ds, query)
        .into_iter()
        .filter(|tuple| predicate.is_none_or(|pred| eval(ds, schema, query, tuple, pred)))
        .collect()
}

/// Expand root rows through the query's join arena, nested-loop style.
fn expand(ds: &Dataset, query: &QueryState) -> Vec<Tuple> {
    let mut tuples: Vec<Tuple> = (0..ds.rows(query.root_entity()).len())
        .map(|root| Tuple {
            root,
            bindings: Vec::new(),
        })
        .collect();

    for record in query.joins() {
        let mut next = Vec::with_capacity(tuples.len());

        for tuple in tuples {
            let parent = match record.parent {
                JoinParent::Root => Some((query.root_entity(), tuple.root)),
                JoinParent::Join(id) => tuple.bindings[id.index()]
                    .map(|index| (query.join(id).target.as_str(), index)),
            };
            let targets = parent
                .and_then(|(entity, index)| ds.rows(entity).get(index))
                .map_or(&[][..], |row| row.linked(&record.relation));

            if targets.is_empty() {
                // Right joins degrade to left here; the reference
                // executor has no unmatched-target enumeration.
                if !matches!(record.kind, JoinKind::Inner) {
                    let mut kept = tuple.clone();
                    kept.bindings.push(None);
                    next.push(kept);
                }
                continue;
            }

            for target in targets {
                let mut expanded = tuple.clone();
                expanded.bindings.push(Some(*target));
                next.push(expanded);
            }
        }

        tuples = next;
    }

    tuples
}

/// Evaluate a predicate against one joined tuple. Missing fields and
/// undefined comparisons are non-matches.
fn eval(ds: &Dataset, schema: &Schema, query: &QueryState, tuple: &Tuple, pred: &Predicate) -> bool {
    match pred {
        Predicate::True => true,
        Predicate::False => false,

        Predicate::And(children) => children.iter().all(|child| eval(ds, schema, query, tuple, child)),
        Predicate::Or(children) => children.iter().any(|child| eval(ds, schema, query, tuple, child)),
        Predicate::Not(inner) => !eval(ds, schema, query, tuple, inner),

        Predicate::Compare {
            field,
            op,
            value,
            fold,
        } => {
            let Some(actual) = field_value(ds, schema, query, tuple, field) else {
                return false;
            };

            match op {
                CompareOp::Eq => eq_opt(&actual, value, *fold).unwrap_or(false),
                CompareOp::Ne => eq_opt(&actual, value, *fold).is_some_and(|eq| !eq),
                CompareOp::Lt => ord_opt(&actual, value, *fold).is_some_and(Ordering::is_lt),
                CompareOp::Lte => ord_opt(&actual, value, *fold).is_some_and(Ordering::is_le),
                CompareOp::Gt => ord_opt(&actual, value, *fold).is_some_and(Ordering::is_gt),
                CompareOp::Gte => ord_opt(&actual, value, *fold).is_some_and(Ordering::is_ge),
            }
        }

        Predicate::Match {
            field,
            pattern,
            mode,
            fold,
        } => {
            let Some(Value::Text(actual)) = field_value(ds, schema, query, tuple, field) else {
                return false;
            };
            let actual = fold.apply(&actual);
            let pattern = fold.apply(pattern);

            match mode {
                MatchMode::Anywhere => actual.contains(&pattern),
                MatchMode::Start => actual.starts_with(&pattern),
                MatchMode::End => actual.ends_with(&pattern),
            }
        }

        Predicate::Between {
            field,
            lower,
            upper,
        } => {
            let Some(actual) = field_value(ds, schema, query, tuple, field) else {
                return false;
            };

            ord_opt(&actual, lower, TextFold::None).is_some_and(Ordering::is_ge)
                && ord_opt(&actual, upper, TextFold::None).is_some_and(Ordering::is_le)
        }

        Predicate::In {
            field,
            values,
            negated,
        } => {
            let Some(actual) = field_value(ds, schema, query, tuple, field) else {
                return false;
            };
            let matched = values
                .iter()
                .any(|value| eq_opt(&actual, value, TextFold::None).unwrap_or(false));

            matched != *negated
        }

        Predicate::IsNull { field, negated } => {
            let null = field_value(ds, schema, query, tuple, field)
                .is_none_or(|value| value.is_null());

            null != *negated
        }
    }
}

/// Read a field reference off a tuple: pick the source row, walk
/// intermediate to-one relations, read the terminal scalar. Absent
/// outer-join rows and broken links read as missing.
fn field_value(
    ds: &Dataset,
    schema: &Schema,
    query: &QueryState,
    tuple: &Tuple,
    field: &FieldRef,
) -> Option<Value> {
    let (mut entity, mut row) = match field.source {
        JoinParent::Root => (
            query.root_entity(),
            ds.rows(query.root_entity()).get(tuple.root),
        ),
        JoinParent::Join(id) => {
            let target = query.join(id).target.as_str();
            let row = tuple.bindings[id.index()].and_then(|index| ds.rows(target).get(index));

            (target, row)
        }
    };

    let last = field.segments.len().checked_sub(1)?;
    for (index, segment) in field.segments.iter().enumerate() {
        let current = row?;

        if index == last {
            return current.get(segment).cloned();
        }

        // Intermediate segments are schema-validated to-one relations.
        let Ok(model) = schema.entity_model(entity) else {
            return None;
        };
        let Some(EntityFieldKind::Relation(relation)) = model.get(segment) else {
            return None;
        };

        entity = &relation.target;
        row = current
            .linked(segment)
            .first()
            .and_then(|index| ds.rows(entity).get(*index));
    }

    None
}

fn eq_opt(left: &Value, right: &Value, fold: TextFold) -> Option<bool> {
    match (left, right) {
        (Value::Text(a), Value::Text(b)) => Some(fold.apply(a) == fold.apply(b)),
        _ => {
            if std::mem::discriminant(left) == std::mem::discriminant(right) {
                Some(left == right)
            } else {
                None
            }
        }
    }
}

fn ord_opt(left: &Value, right: &Value, fold: TextFold) -> Option<Ordering> {
    match (left, right) {
        (Value::Text(a), Value::Text(b)) => Some(fold.apply(a).cmp(&fold.apply(b))),
        _ => left.compare(right),
    }
}
