pub mod args;


pub use args::{Args, MissingVarPolicy};

use crate::{
    error::FilterError,
    filter::{
        Conjunction, Disjunction, Filter, Join, JoinFetch, Leaf, LeafKind, MismatchPolicy,
        OnMismatch,
    },
    fold::CasePolicy,
    query::JoinKind,
};
use serde::{Deserialize, Serialize};

///
/// SpecDef
///
/// One declarative leaf definition: an attribute path, an operator
/// kind, and the request channels its arguments come from. A
/// definition that resolves to no arguments simply does not
/// participate in the built filter.
///

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecDef {
    pub path: String,
    pub kind: LeafKind,

    /// Query parameter names, multi-valued.
    #[serde(default)]
    pub params: Vec<String>,

    /// Path variable names from the matched route.
    #[serde(default)]
    pub path_vars: Vec<String>,

    /// Header names, single-valued.
    #[serde(default)]
    pub headers: Vec<String>,

    /// Dotted paths into the JSON request body.
    #[serde(default)]
    pub body_params: Vec<String>,

    /// Fixed values, taking precedence over every request channel.
    #[serde(default)]
    pub const_val: Vec<String>,

    /// Fallback values when every channel comes up empty.
    #[serde(default)]
    pub default_val: Vec<String>,

    /// Split each resolved raw value on this character.
    #[serde(default)]
    pub separator: Option<char>,

    #[serde(default)]
    pub case: CasePolicy,

    #[serde(default)]
    pub on_mismatch: MismatchPolicy,
}

///
/// JoinDef
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JoinDef {
    pub path: String,
    pub alias: String,
    #[serde(default = "inner")]
    pub kind: JoinKind,
    #[serde(default = "enabled")]
    pub distinct: bool,
}

///
/// JoinFetchDef
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JoinFetchDef {
    pub paths: Vec<String>,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub kind: JoinKind,
    #[serde(default = "enabled")]
    pub distinct: bool,
}

const fn inner() -> JoinKind {
    JoinKind::Inner
}

const fn enabled() -> bool {
    true
}

///
/// DefTree
///
/// A declarative filter definition, typically deserialized from
/// endpoint configuration. `build_filter` turns it plus one request's
/// arguments into a composed `Filter`.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DefTree {
    And(Vec<DefTree>),
    Or(Vec<DefTree>),
    Spec(SpecDef),
    Join(JoinDef),
    JoinFetch(JoinFetchDef),
}

/// Resolve a definition tree against request arguments.
///
/// Leaves whose arguments are absent from the request drop out;
/// `Ok(None)` means nothing in the tree applied. Join definitions are
/// request-independent and always survive.
pub fn build_filter(def: &DefTree, args: &Args) -> Result<Option<Filter>, FilterError> {
    match def {
        DefTree::And(children) => {
            let parts = build_parts(children, args)?;

            Ok(compose(parts, |parts| Conjunction::new(parts).into()))
        }
        DefTree::Or(children) => {
            let parts = build_parts(children, args)?;

            Ok(compose(parts, |parts| Disjunction::new(parts).into()))
        }
        DefTree::Spec(spec) => build_leaf(spec, args),
        DefTree::Join(join) => Ok(Some(
            Join::new(&join.path, &join.alias)
                .kind(join.kind)
                .distinct(join.distinct)
                .into(),
        )),
        DefTree::JoinFetch(fetch) => {
            let mut filter = JoinFetch::new(fetch.paths.clone())
                .kind(fetch.kind)
                .distinct(fetch.distinct);
            if let Some(alias) = &fetch.alias {
                filter = filter.alias(alias);
            }

            Ok(Some(filter.into()))
        }
    }
}

fn build_parts(children: &[DefTree], args: &Args) -> Result<Vec<Filter>, FilterError> {
    let mut parts = Vec::with_capacity(children.len());
    for child in children {
        if let Some(filter) = build_filter(child, args)? {
            parts.push(filter);
        }
    }

    Ok(parts)
}

fn compose(mut parts: Vec<Filter>, wrap: impl FnOnce(Vec<Filter>) -> Filter) -> Option<Filter> {
    match parts.len() {
        0 => None,
        1 => parts.pop(),
        _ => Some(wrap(parts)),
    }
}

fn build_leaf(spec: &SpecDef, args: &Args) -> Result<Option<Filter>, FilterError> {
    let mut values = resolve_values(spec, args)?;
    if values.is_empty() {
        values = spec.default_val.clone();
    }
    // Split after the default fallback so every source, defaults
    // included, goes through the same delimiter handling.
    let values = split_all(values, spec.separator);

    if values.is_empty() && spec.kind.takes_arguments() {
        return Ok(None);
    }
    spec.kind.check_arity(values.len())?;

    let leaf = Leaf::new(&spec.path, spec.kind, values).with_case(spec.case.clone());
    let filter = if spec.on_mismatch == MismatchPolicy::Propagate {
        leaf.into()
    } else {
        OnMismatch::new(spec.on_mismatch, leaf.into()).into()
    };

    Ok(Some(filter))
}

/// Channel precedence: constants, then path variables, then body
/// fields, then headers, then query parameters. The first channel that
/// yields anything wins outright.
fn resolve_values(spec: &SpecDef, args: &Args) -> Result<Vec<String>, FilterError> {
    if !spec.const_val.is_empty() {
        return Ok(spec.const_val.clone());
    }

    let mut values = Vec::new();
    for name in &spec.path_vars {
        values.extend(args.path_var_values(name)?);
    }
    if values.is_empty() {
        for name in &spec.body_params {
            values.extend(args.body_values(name));
        }
    }
    if values.is_empty() {
        for name in &spec.headers {
            values.extend(args.header_values(name));
        }
    }
    if values.is_empty() {
        for name in &spec.params {
            values.extend(args.param_values(name));
        }
    }

    Ok(values)
}

fn split_all(values: Vec<String>, separator: Option<char>) -> Vec<String> {
    let Some(separator) = separator else {
        return values;
    };

    values
        .iter()
        .flat_map(|value| value.split(separator))
        .map(str::to_string)
        .collect()
}
