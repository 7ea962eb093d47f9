use crate::{error::ConvertError, model::FieldKind};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

///
/// Value
///
/// Runtime representation of a filter argument after conversion.
/// Pure data; comparison semantics live in the helpers below and all
/// interpretation against rows happens in `mem`.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Date(NaiveDate),
    Float(f64),
    Int(i64),
    Null,
    Text(String),
    Timestamp(DateTime<Utc>),
    Uint(u64),
}

impl Value {
    /// Convert one raw string into a typed value for the given target kind.
    ///
    /// `attribute` is carried only for error reporting.
    pub fn convert(raw: &str, attribute: &str, kind: FieldKind) -> Result<Self, ConvertError> {
        let err = || ConvertError {
            raw: raw.to_string(),
            attribute: attribute.to_string(),
            kind,
        };

        let value = match kind {
            FieldKind::Text => Self::Text(raw.to_string()),
            FieldKind::Int => Self::Int(raw.parse().map_err(|_| err())?),
            FieldKind::Uint => Self::Uint(raw.parse().map_err(|_| err())?),
            FieldKind::Float => Self::Float(raw.parse().map_err(|_| err())?),
            FieldKind::Bool => match raw {
                "true" => Self::Bool(true),
                "false" => Self::Bool(false),
                _ => return Err(err()),
            },
            FieldKind::Date => Self::Date(
                NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| err())?,
            ),
            FieldKind::Timestamp => Self::Timestamp(
                DateTime::parse_from_rfc3339(raw)
                    .map_err(|_| err())?
                    .with_timezone(&Utc),
            ),
        };

        Ok(value)
    }

    /// Strict ordering for identical value variants.
    ///
    /// Returns `None` if values are of different variants or do not
    /// support ordering.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.partial_cmp(b),
            (Self::Date(a), Self::Date(b)) => a.partial_cmp(b),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Int(a), Self::Int(b)) => a.partial_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.partial_cmp(b),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.partial_cmp(b),
            (Self::Uint(a), Self::Uint(b)) => a.partial_cmp(b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}
