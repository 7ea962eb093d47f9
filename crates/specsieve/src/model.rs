use crate::error::ConfigError;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

///
/// FieldKind
///
/// Scalar type surface needed by path validation and argument
/// conversion. Deliberately smaller than a full schema type system.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Serialize, Deserialize)]
pub enum FieldKind {
    #[display("bool")]
    Bool,
    #[display("date")]
    Date,
    #[display("float")]
    Float,
    #[display("int")]
    Int,
    #[display("text")]
    Text,
    #[display("timestamp")]
    Timestamp,
    #[display("uint")]
    Uint,
}

///
/// RelationModel
///
/// A named edge to another entity. `to_many` controls whether inline
/// path navigation is allowed (to-one only) and informs callers that a
/// join over it can multiply parent rows.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RelationModel {
    pub target: String,
    pub to_many: bool,
}

///
/// EntityFieldKind
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum EntityFieldKind {
    Scalar(FieldKind),
    Relation(RelationModel),
}

///
/// EntityField
///
/// Field metadata as used in predicates and path navigation.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct EntityField {
    pub name: String,
    pub kind: EntityFieldKind,
}

///
/// EntityModel
///
/// Runtime model for one entity. Ordered field list is authoritative;
/// lookup is by name.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct EntityModel {
    name: String,
    fields: Vec<EntityField>,
}

impl EntityModel {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a scalar field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(EntityField {
            name: name.into(),
            kind: EntityFieldKind::Scalar(kind),
        });
        self
    }

    /// Append a relation field.
    #[must_use]
    pub fn relation(mut self, name: impl Into<String>, target: impl Into<String>, to_many: bool) -> Self {
        self.fields.push(EntityField {
            name: name.into(),
            kind: EntityFieldKind::Relation(RelationModel {
                target: target.into(),
                to_many,
            }),
        });
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn fields(&self) -> &[EntityField] {
        &self.fields
    }

    /// Look up a field by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&EntityFieldKind> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.kind)
    }
}

///
/// Schema
///
/// The entity graph path resolution and joins navigate. Built once by
/// the caller and shared immutably across query evaluations.
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    entities: BTreeMap<String, EntityModel>,
}

impl Schema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity model under its own name.
    #[must_use]
    pub fn entity(mut self, model: EntityModel) -> Self {
        self.entities.insert(model.name().to_string(), model);
        self
    }

    pub fn entity_model(&self, name: &str) -> Result<&EntityModel, ConfigError> {
        self.entities.get(name).ok_or_else(|| ConfigError::UnknownEntity {
            entity: name.to_string(),
        })
    }

    /// Resolve a relation attribute on `entity`, for join construction.
    ///
    /// `path` is the caller-facing path carried into error messages.
    pub fn relation(
        &self,
        entity: &str,
        attribute: &str,
        path: &str,
    ) -> Result<&RelationModel, ConfigError> {
        let model = self.entity_model(entity)?;

        match model.get(attribute) {
            Some(EntityFieldKind::Relation(relation)) => Ok(relation),
            Some(EntityFieldKind::Scalar(_)) => Err(ConfigError::NotARelation {
                entity: entity.to_string(),
                attribute: attribute.to_string(),
                path: path.to_string(),
            }),
            None => Err(ConfigError::UnknownAttribute {
                entity: entity.to_string(),
                attribute: attribute.to_string(),
                path: path.to_string(),
            }),
        }
    }
}
