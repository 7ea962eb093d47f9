//! Specsieve: declarative request-derived filters composed into
//! predicate trees, with lazy, deduplicated join handling.
//!
//! A filter tree is built once (usually from a [`resolve::DefTree`]
//! definition plus request arguments) and evaluated against one query
//! object per execution mode. Evaluation produces a [`predicate`] tree
//! and populates the query's join arena through a shared
//! [`context::JoinContext`], so the same alias resolves to the same
//! join node no matter how many fragments reference it.

pub mod context;
pub mod error;
pub mod filter;
pub mod fold;
pub mod mem;
pub mod model;
pub mod path;
pub mod predicate;
pub mod query;
pub mod resolve;
pub mod value;

///
/// Prelude
///
/// Domain vocabulary only. Errors, the reference executor, and the
/// definition resolver stay behind their modules.
///

pub mod prelude {
    pub use crate::{
        context::JoinContext,
        filter::{
            BuildCx, Conjunction, Disjunction, Filter, Join, JoinFetch, Leaf, LeafKind,
            MismatchPolicy, OnMismatch,
        },
        fold::CasePolicy,
        model::{EntityModel, FieldKind, Schema},
        predicate::Predicate,
        query::{JoinKind, QueryState, ResultKind},
        value::Value,
    };
}
