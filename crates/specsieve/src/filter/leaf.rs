use crate::{
    error::{Arity, ConfigError, ConvertError, FilterError},
    filter::BuildCx,
    fold::CasePolicy,
    model::FieldKind,
    path,
    predicate::{CompareOp, MatchMode, Predicate},
    value::Value,
};
use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// LeafKind
///
/// The enumerated set of thin filter fragments. Each translates a
/// resolved path plus converted arguments into one predicate node.
/// Ignore-case behavior comes from the fragment's case policy, not
/// from separate kinds.
///

#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq, Serialize, Deserialize)]
pub enum LeafKind {
    #[display("between")]
    Between,
    #[display("ends_with")]
    EndsWith,
    #[default]
    #[display("equal")]
    Equal,
    #[display("false")]
    False,
    #[display("greater_than")]
    GreaterThan,
    #[display("greater_than_or_equal")]
    GreaterThanOrEqual,
    #[display("in")]
    In,
    #[display("less_than")]
    LessThan,
    #[display("less_than_or_equal")]
    LessThanOrEqual,
    #[display("like")]
    Like,
    #[display("not_equal")]
    NotEqual,
    #[display("not_in")]
    NotIn,
    #[display("not_null")]
    NotNull,
    #[display("null")]
    Null,
    #[display("starts_with")]
    StartsWith,
    #[display("true")]
    True,
}

impl LeafKind {
    /// Declared argument arity of this kind.
    #[must_use]
    pub const fn arity(self) -> Arity {
        match self {
            Self::Null | Self::NotNull | Self::True | Self::False => Arity::Exact(0),
            Self::Between => Arity::Exact(2),
            Self::In | Self::NotIn => Arity::AtLeast(1),
            _ => Arity::Exact(1),
        }
    }

    /// Whether this kind consumes arguments at all. Zero-argument kinds
    /// are instantiated regardless of what the argument sources yield.
    #[must_use]
    pub const fn takes_arguments(self) -> bool {
        !matches!(self.arity(), Arity::Exact(0))
    }

    /// Validate a sourced argument count against this kind's arity.
    pub fn check_arity(self, found: usize) -> Result<(), ConfigError> {
        let expected = self.arity();
        if expected.accepts(found) {
            Ok(())
        } else {
            Err(ConfigError::ArgumentArity {
                kind: self.to_string(),
                expected,
                found,
            })
        }
    }
}

///
/// Leaf
///
/// One concrete filter fragment: target path, kind, raw arguments, and
/// a case policy for text comparison. Arguments stay raw until
/// evaluation, when the target attribute's schema type is known;
/// conversion failures surface as recoverable conversion errors.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Leaf {
    path: String,
    kind: LeafKind,
    args: Vec<String>,
    case: CasePolicy,
}

impl Leaf {
    #[must_use]
    pub fn new(path: impl Into<String>, kind: LeafKind, args: Vec<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            args,
            case: CasePolicy::Exact,
        }
    }

    #[must_use]
    pub fn with_case(mut self, case: CasePolicy) -> Self {
        self.case = case;
        self
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub const fn kind(&self) -> LeafKind {
        self.kind
    }

    #[cfg(test)]
    pub(crate) fn args(&self) -> &[String] {
        &self.args
    }

    pub(crate) fn to_predicate(
        &self,
        cx: &mut BuildCx<'_>,
    ) -> Result<Option<Predicate>, FilterError> {
        self.kind.check_arity(self.args.len())?;

        let resolved = path::resolve(cx.schema, cx.joins, cx.query, &self.path)?;
        let field = resolved.field;
        let fold = self.case.text_fold();

        let predicate = match self.kind {
            LeafKind::Null => Predicate::is_null(field),
            LeafKind::NotNull => Predicate::not_null(field),
            LeafKind::True => Predicate::eq(field, Value::Bool(true)),
            LeafKind::False => Predicate::eq(field, Value::Bool(false)),

            LeafKind::Like | LeafKind::StartsWith | LeafKind::EndsWith => {
                // Pattern matching is text-only; a non-text target is a
                // recoverable mismatch, like any other conversion failure.
                if resolved.kind != FieldKind::Text {
                    return Err(ConvertError {
                        raw: self.args[0].clone(),
                        attribute: self.path.clone(),
                        kind: resolved.kind,
                    }
                    .into());
                }

                let pattern = match self.case.fold_value(Value::Text(self.args[0].clone())) {
                    Value::Text(text) => text,
                    _ => self.args[0].clone(),
                };
                let mode = match self.kind {
                    LeafKind::StartsWith => MatchMode::Start,
                    LeafKind::EndsWith => MatchMode::End,
                    _ => MatchMode::Anywhere,
                };

                Predicate::Match {
                    field,
                    pattern,
                    mode,
                    fold,
                }
            }

            LeafKind::Between => {
                let lower = self.convert(&self.args[0], resolved.kind)?;
                let upper = self.convert(&self.args[1], resolved.kind)?;

                Predicate::Between {
                    field,
                    lower,
                    upper,
                }
            }

            LeafKind::In | LeafKind::NotIn => {
                let values = self
                    .args
                    .iter()
                    .map(|raw| self.convert(raw, resolved.kind))
                    .collect::<Result<Vec<_>, _>>()?;

                Predicate::In {
                    field,
                    values,
                    negated: self.kind == LeafKind::NotIn,
                }
            }

            LeafKind::Equal
            | LeafKind::NotEqual
            | LeafKind::GreaterThan
            | LeafKind::GreaterThanOrEqual
            | LeafKind::LessThan
            | LeafKind::LessThanOrEqual => {
                let value = self
                    .case
                    .fold_value(self.convert(&self.args[0], resolved.kind)?);
                let op = match self.kind {
                    LeafKind::NotEqual => CompareOp::Ne,
                    LeafKind::GreaterThan => CompareOp::Gt,
                    LeafKind::GreaterThanOrEqual => CompareOp::Gte,
                    LeafKind::LessThan => CompareOp::Lt,
                    LeafKind::LessThanOrEqual => CompareOp::Lte,
                    _ => CompareOp::Eq,
                };

                Predicate::Compare {
                    field,
                    op,
                    value,
                    fold,
                }
            }
        };

        Ok(Some(predicate))
    }

    fn convert(&self, raw: &str, kind: FieldKind) -> Result<Value, ConvertError> {
        Value::convert(raw, &self.path, kind)
    }
}
