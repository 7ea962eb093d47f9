use crate::{
    context::JoinContext,
    error::{ConfigError, FilterError},
    model::{EntityFieldKind, FieldKind, Schema},
    predicate::FieldRef,
    query::{JoinParent, QueryState},
};

///
/// Path resolution
///
/// Turns a dotted attribute path into a navigable reference against
/// the entity root, rerouting the first segment through a previously
/// declared join or fetch alias when one exists for the current query
/// object. Every segment is schema-validated; alias misuse is a fatal
/// configuration error naming the alias and the referencing path.
///

///
/// ResolvedPath
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedPath {
    pub field: FieldRef,
    pub kind: FieldKind,
}

/// Resolve `path` for the given query object.
///
/// The first segment is matched against the join registry/cache, then
/// the fetch cache; a hit starts navigation at that node, a miss starts
/// at the entity root. Remaining segments walk to-one relations and
/// must end at a scalar attribute.
pub fn resolve(
    schema: &Schema,
    joins: &mut JoinContext,
    query: &mut QueryState,
    path: &str,
) -> Result<ResolvedPath, FilterError> {
    if path.is_empty() {
        return Err(ConfigError::EmptyPath.into());
    }

    let segments: Vec<&str> = path.split('.').collect();

    let (source, rest) = match joins.resolve_path_head(segments[0], path, schema, query)? {
        Some(id) => (JoinParent::Join(id), &segments[1..]),
        None => (JoinParent::Root, segments.as_slice()),
    };

    if rest.is_empty() {
        // The whole path was an alias; there is nothing scalar to filter on.
        return Err(ConfigError::NonScalarTerminal {
            path: path.to_string(),
        }
        .into());
    }

    let mut entity = query.entity_at(source).to_string();
    let mut out = Vec::with_capacity(rest.len());

    for (index, segment) in rest.iter().enumerate() {
        let last = index + 1 == rest.len();
        let model = schema.entity_model(&entity)?;

        let Some(kind) = model.get(segment) else {
            // An unknown head of a multi-segment root path reads as an
            // alias the caller forgot to declare.
            let err = if index == 0 && source == JoinParent::Root && segments.len() > 1 {
                ConfigError::UnresolvedAlias {
                    alias: (*segment).to_string(),
                    path: path.to_string(),
                }
            } else {
                ConfigError::UnknownAttribute {
                    entity: entity.clone(),
                    attribute: (*segment).to_string(),
                    path: path.to_string(),
                }
            };
            return Err(err.into());
        };

        match kind {
            EntityFieldKind::Scalar(scalar) => {
                if !last {
                    return Err(ConfigError::NotARelation {
                        entity: entity.clone(),
                        attribute: (*segment).to_string(),
                        path: path.to_string(),
                    }
                    .into());
                }

                out.push((*segment).to_string());

                return Ok(ResolvedPath {
                    field: FieldRef {
                        source,
                        segments: out,
                    },
                    kind: *scalar,
                });
            }
            EntityFieldKind::Relation(relation) => {
                if last {
                    return Err(ConfigError::NonScalarTerminal {
                        path: path.to_string(),
                    }
                    .into());
                }
                if relation.to_many {
                    return Err(ConfigError::ToManyNavigation {
                        entity: entity.clone(),
                        attribute: (*segment).to_string(),
                        path: path.to_string(),
                    }
                    .into());
                }

                out.push((*segment).to_string());
                entity = relation.target.clone();
            }
        }
    }

    unreachable!("loop returns on the last segment")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        context::JoinSpec,
        model::EntityModel,
        query::{JoinKind, ResultKind},
    };

    fn schema() -> Schema {
        Schema::new()
            .entity(
                EntityModel::new("Customer")
                    .field("lastName", FieldKind::Text)
                    .relation("address", "Address", false)
                    .relation("orders", "Order", true),
            )
            .entity(EntityModel::new("Address").field("city", FieldKind::Text))
            .entity(EntityModel::new("Order").field("itemName", FieldKind::Text))
    }

    #[test]
    fn resolves_scalar_from_root() {
        let schema = schema();
        let mut query = QueryState::new("Customer", ResultKind::Rows);
        let mut joins = JoinContext::new();

        let resolved = resolve(&schema, &mut joins, &mut query, "lastName").unwrap();

        assert_eq!(resolved.kind, FieldKind::Text);
        assert_eq!(resolved.field.source, JoinParent::Root);
        assert_eq!(resolved.field.segments, vec!["lastName".to_string()]);
    }

    #[test]
    fn navigates_to_one_relations_inline() {
        let schema = schema();
        let mut query = QueryState::new("Customer", ResultKind::Rows);
        let mut joins = JoinContext::new();

        let resolved = resolve(&schema, &mut joins, &mut query, "address.city").unwrap();

        assert_eq!(
            resolved.field.segments,
            vec!["address".to_string(), "city".to_string()]
        );
        assert!(query.joins().is_empty());
    }

    #[test]
    fn reroutes_first_segment_through_a_join_alias() {
        let schema = schema();
        let mut query = QueryState::new("Customer", ResultKind::Rows);
        let mut joins = JoinContext::new();
        joins.register_join("o", JoinSpec::from_path("orders", JoinKind::Inner));

        let resolved = resolve(&schema, &mut joins, &mut query, "o.itemName").unwrap();

        let id = joins.evaluated_join("o", query.id()).unwrap();
        assert_eq!(resolved.field.source, JoinParent::Join(id));
        assert_eq!(resolved.field.segments, vec!["itemName".to_string()]);
        assert_eq!(query.joins().len(), 1);
    }

    #[test]
    fn undeclared_alias_reads_as_configuration_error() {
        let schema = schema();
        let mut query = QueryState::new("Customer", ResultKind::Rows);
        let mut joins = JoinContext::new();

        let err = resolve(&schema, &mut joins, &mut query, "o.itemName").unwrap_err();

        assert_eq!(
            err,
            FilterError::Config(ConfigError::UnresolvedAlias {
                alias: "o".into(),
                path: "o.itemName".into(),
            })
        );
    }

    #[test]
    fn inline_to_many_navigation_is_rejected() {
        let schema = schema();
        let mut query = QueryState::new("Customer", ResultKind::Rows);
        let mut joins = JoinContext::new();

        let err = resolve(&schema, &mut joins, &mut query, "orders.itemName").unwrap_err();

        assert!(matches!(
            err,
            FilterError::Config(ConfigError::ToManyNavigation { .. })
        ));
    }

    #[test]
    fn unknown_single_segment_is_an_unknown_attribute() {
        let schema = schema();
        let mut query = QueryState::new("Customer", ResultKind::Rows);
        let mut joins = JoinContext::new();

        let err = resolve(&schema, &mut joins, &mut query, "surname").unwrap_err();

        assert!(matches!(
            err,
            FilterError::Config(ConfigError::UnknownAttribute { .. })
        ));
    }
}
