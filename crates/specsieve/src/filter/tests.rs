use super::*;
use crate::{
    context::JoinContext,
    error::{ConfigError, FilterError},
    fold::{CasePolicy, Locale},
    mem::{self, Dataset, Row},
    model::{EntityModel, FieldKind, Schema},
    predicate::Predicate,
    query::{JoinKind, JoinParent, QueryState, ResultKind},
    value::Value,
};
use chrono::NaiveDate;

fn schema() -> Schema {
    Schema::new()
        .entity(
            EntityModel::new("Customer")
                .field("firstName", FieldKind::Text)
                .field("lastName", FieldKind::Text)
                .field("age", FieldKind::Int)
                .field("nickName", FieldKind::Text)
                .field("registrationDate", FieldKind::Date)
                .relation("orders", "Order", true)
                .relation("address", "Address", false),
        )
        .entity(
            EntityModel::new("Order")
                .field("itemName", FieldKind::Text)
                .relation("tags", "Tag", true),
        )
        .entity(EntityModel::new("Tag").field("name", FieldKind::Text))
        .entity(EntityModel::new("Address").field("city", FieldKind::Text))
}

fn date(year: i32, month: u32, day: u32) -> Value {
    Value::Date(NaiveDate::from_ymd_opt(year, month, day).unwrap())
}

fn dataset() -> Dataset {
    Dataset::new()
        .table(
            "Customer",
            vec![
                Row::new()
                    .field("firstName", Value::Text("Homer".into()))
                    .field("lastName", Value::Text("Simpson".into()))
                    .field("age", Value::Int(39))
                    .field("nickName", Value::Text("Mr. Sparkle".into()))
                    .field("registrationDate", date(2014, 3, 21))
                    .link("orders", vec![0, 1]),
                Row::new()
                    .field("firstName", Value::Text("Marge".into()))
                    .field("lastName", Value::Text("Simpson".into()))
                    .field("age", Value::Int(36))
                    .field("nickName", Value::Text("Marge".into()))
                    .field("registrationDate", date(2013, 7, 2))
                    .link("orders", vec![2]),
                Row::new()
                    .field("firstName", Value::Text("Ned".into()))
                    .field("lastName", Value::Text("Flanders".into()))
                    .field("age", Value::Int(60))
                    .field("nickName", Value::Text("Neddy".into()))
                    .field("registrationDate", date(1989, 12, 17))
                    .link("orders", vec![3]),
            ],
        )
        .table(
            "Order",
            vec![
                Row::new()
                    .field("itemName", Value::Text("Duff Beer".into()))
                    .link("tags", vec![0]),
                Row::new().field("itemName", Value::Text("Donuts".into())),
                Row::new().field("itemName", Value::Text("Oven Cleaner".into())),
                Row::new().field("itemName", Value::Text("Bible Stories".into())),
            ],
        )
        .table("Tag", vec![Row::new().field("name", Value::Text("beverage".into()))])
}

fn build(
    filter: &Filter,
    query: &mut QueryState,
    joins: &mut JoinContext,
) -> Result<Option<Predicate>, FilterError> {
    filter.to_predicate(&mut BuildCx::new(&schema(), query, joins))
}

fn select(filter: &Filter) -> Vec<usize> {
    let schema = schema();
    let mut query = QueryState::new("Customer", ResultKind::Rows);
    let mut joins = JoinContext::new();
    let pred = filter
        .to_predicate(&mut BuildCx::new(&schema, &mut query, &mut joins))
        .unwrap();

    mem::select(&dataset(), &schema, &query, pred.as_ref())
}

#[test]
fn disjunction_of_likes_matches_either_name() {
    let filter: Filter = Disjunction::new(vec![
        Leaf::new("firstName", LeafKind::Like, vec!["Homer".into()]).into(),
        Leaf::new("lastName", LeafKind::Like, vec!["Flanders".into()]).into(),
    ])
    .into();

    assert_eq!(select(&filter), vec![0, 2]);
}

#[test]
fn conjunction_narrows_with_comparisons() {
    let filter: Filter = Conjunction::new(vec![
        Leaf::new("lastName", LeafKind::Equal, vec!["Simpson".into()]).into(),
        Leaf::new("age", LeafKind::LessThan, vec!["39".into()]).into(),
    ])
    .into();

    assert_eq!(select(&filter), vec![1]);
}

#[test]
fn joined_attribute_filters_through_the_alias() {
    let filter: Filter = Conjunction::new(vec![
        Join::new("orders", "o").into(),
        Leaf::new("o.itemName", LeafKind::Equal, vec!["Duff Beer".into()]).into(),
    ])
    .into();

    assert_eq!(select(&filter), vec![0]);
}

#[test]
fn fake_fragments_evaluate_before_real_ones_regardless_of_order() {
    // The leaf references the alias but is declared first.
    let filter: Filter = Conjunction::new(vec![
        Leaf::new("o.itemName", LeafKind::Like, vec!["Beer".into()]).into(),
        Join::new("orders", "o").into(),
    ])
    .into();

    assert_eq!(select(&filter), vec![0]);
}

#[test]
fn alias_in_nested_disjunction_still_sees_the_outer_join() {
    let filter: Filter = Conjunction::new(vec![
        Disjunction::new(vec![
            Leaf::new("o.itemName", LeafKind::Equal, vec!["Donuts".into()]).into(),
            Leaf::new("o.itemName", LeafKind::Equal, vec!["Bible Stories".into()]).into(),
        ])
        .into(),
        Join::new("orders", "o").into(),
    ])
    .into();

    assert_eq!(select(&filter), vec![0, 2]);
}

#[test]
fn one_alias_produces_one_join_per_query() {
    let filter: Filter = Conjunction::new(vec![
        Join::new("orders", "o").into(),
        Leaf::new("o.itemName", LeafKind::Like, vec!["e".into()]).into(),
        Leaf::new("o.itemName", LeafKind::NotEqual, vec!["Donuts".into()]).into(),
    ])
    .into();

    let mut query = QueryState::new("Customer", ResultKind::Rows);
    let mut joins = JoinContext::new();
    build(&filter, &mut query, &mut joins).unwrap();

    assert_eq!(query.joins().len(), 1);
}

#[test]
fn reused_tree_builds_fresh_joins_per_query_object() {
    let filter: Filter = Conjunction::new(vec![
        Join::new("orders", "o").into(),
        Leaf::new("o.itemName", LeafKind::Like, vec!["Beer".into()]).into(),
    ])
    .into();
    let mut joins = JoinContext::new();

    let mut first = QueryState::new("Customer", ResultKind::Rows);
    build(&filter, &mut first, &mut joins).unwrap();
    assert_eq!(first.joins().len(), 1);

    // Same tree and context, second query object: its own join.
    let mut second = QueryState::new("Customer", ResultKind::Rows);
    build(&filter, &mut second, &mut joins).unwrap();
    assert_eq!(second.joins().len(), 1);

    // Re-evaluating against the first query adds nothing.
    build(&filter, &mut first, &mut joins).unwrap();
    assert_eq!(first.joins().len(), 1);
}

#[test]
fn unregistered_alias_reference_is_fatal() {
    let filter: Filter =
        Leaf::new("x.itemName", LeafKind::Equal, vec!["Duff Beer".into()]).into();

    let mut query = QueryState::new("Customer", ResultKind::Rows);
    let mut joins = JoinContext::new();
    let err = build(&filter, &mut query, &mut joins).unwrap_err();

    match err {
        FilterError::Config(ConfigError::UnresolvedAlias { alias, .. }) => {
            assert_eq!(alias, "x");
        }
        other => panic!("expected an unresolved alias error, got {other:?}"),
    }
}

#[test]
fn chained_aliases_resolve_bases_lazily() {
    // The tag join hangs off the order alias; only a tag-level leaf is
    // present, so both joins must materialize on first use.
    let filter: Filter = Conjunction::new(vec![
        Join::new("orders", "o").into(),
        Join::new("o.tags", "t").into(),
        Leaf::new("t.name", LeafKind::Equal, vec!["beverage".into()]).into(),
    ])
    .into();

    let mut query = QueryState::new("Customer", ResultKind::Rows);
    let mut joins = JoinContext::new();
    build(&filter, &mut query, &mut joins).unwrap();

    assert_eq!(query.joins().len(), 2);
    assert_eq!(select(&filter), vec![0]);
}

#[test]
fn unused_join_registration_adds_no_join() {
    let filter: Filter = Conjunction::new(vec![
        Join::new("orders", "o").into(),
        Leaf::new("lastName", LeafKind::Equal, vec!["Simpson".into()]).into(),
    ])
    .into();

    let mut query = QueryState::new("Customer", ResultKind::Rows);
    let mut joins = JoinContext::new();
    build(&filter, &mut query, &mut joins).unwrap();

    assert!(query.joins().is_empty());
}

#[test]
fn inline_to_many_navigation_is_rejected() {
    let filter: Filter =
        Leaf::new("orders.itemName", LeafKind::Equal, vec!["Donuts".into()]).into();

    let mut query = QueryState::new("Customer", ResultKind::Rows);
    let mut joins = JoinContext::new();
    let err = build(&filter, &mut query, &mut joins).unwrap_err();

    assert!(matches!(
        err,
        FilterError::Config(ConfigError::ToManyNavigation { .. })
    ));
}

#[test]
fn join_fetch_adds_fetch_joins_in_rows_mode() {
    let filter: Filter = JoinFetch::new(vec!["orders".into()]).into();

    let mut query = QueryState::new("Customer", ResultKind::Rows);
    let mut joins = JoinContext::new();
    let pred = build(&filter, &mut query, &mut joins).unwrap();

    assert_eq!(pred, None);
    assert_eq!(query.joins().len(), 1);
    assert!(query.joins()[0].fetch);
    assert_eq!(query.joins()[0].kind, JoinKind::Left);
}

#[test]
fn unaliased_join_fetch_vanishes_in_count_mode() {
    let filter: Filter = Conjunction::new(vec![
        JoinFetch::new(vec!["orders".into()]).into(),
        JoinFetch::new(vec!["orders".into()]).into(),
    ])
    .into();

    let mut query = QueryState::new("Customer", ResultKind::Count);
    let mut joins = JoinContext::new();
    let pred = build(&filter, &mut query, &mut joins).unwrap();

    assert_eq!(pred, None);
    assert!(query.joins().is_empty());
}

#[test]
fn aliased_join_fetch_degrades_to_a_join_in_count_mode() {
    let filter: Filter = Conjunction::new(vec![
        JoinFetch::new(vec!["orders".into()]).alias("o").into(),
        Leaf::new("o.itemName", LeafKind::Like, vec!["Beer".into()]).into(),
    ])
    .into();

    let mut query = QueryState::new("Customer", ResultKind::Count);
    let mut joins = JoinContext::new();
    build(&filter, &mut query, &mut joins).unwrap();

    assert_eq!(query.joins().len(), 1);
    assert!(!query.joins()[0].fetch);
}

#[test]
fn aliased_fetch_serves_path_resolution_in_rows_mode() {
    let filter: Filter = Conjunction::new(vec![
        JoinFetch::new(vec!["orders".into()]).alias("o").into(),
        Leaf::new("o.itemName", LeafKind::Equal, vec!["Duff Beer".into()]).into(),
    ])
    .into();

    let mut query = QueryState::new("Customer", ResultKind::Rows);
    let mut joins = JoinContext::new();
    build(&filter, &mut query, &mut joins).unwrap();

    // The leaf rides the fetch join instead of adding a second one.
    assert_eq!(query.joins().len(), 1);
    assert!(query.joins()[0].fetch);
}

#[test]
fn nested_fetch_reroutes_through_a_prior_fetch_alias() {
    let filter: Filter = Conjunction::new(vec![
        JoinFetch::new(vec!["orders".into()]).alias("o").into(),
        JoinFetch::new(vec!["o.tags".into()]).into(),
    ])
    .into();

    let mut query = QueryState::new("Customer", ResultKind::Rows);
    let mut joins = JoinContext::new();
    build(&filter, &mut query, &mut joins).unwrap();

    assert_eq!(query.joins().len(), 2);
    assert!(query.joins().iter().all(|record| record.fetch));
    // The tag fetch hangs off the order fetch node, not the root.
    match query.joins()[1].parent {
        JoinParent::Join(id) => assert_eq!(id.index(), 0),
        JoinParent::Root => panic!("nested fetch did not reroute through the alias"),
    }
}

#[test]
fn nested_fetch_without_prior_alias_is_fatal() {
    let filter: Filter = JoinFetch::new(vec!["o.tags".into()]).into();

    let mut query = QueryState::new("Customer", ResultKind::Rows);
    let mut joins = JoinContext::new();
    let err = build(&filter, &mut query, &mut joins).unwrap_err();

    match err {
        FilterError::Config(ConfigError::UnresolvedFetchAlias { alias, .. }) => {
            assert_eq!(alias, "o");
        }
        other => panic!("expected an unresolved fetch alias error, got {other:?}"),
    }
}

#[test]
fn count_query_with_unused_fetch_aliases_adds_no_joins() {
    // Two aliased fetches whose aliases no filter references: in count
    // mode both degrade to lazy joins that never materialize.
    let filter: Filter = Conjunction::new(vec![
        JoinFetch::new(vec!["orders".into()]).alias("o").into(),
        JoinFetch::new(vec!["address".into()]).alias("a").into(),
    ])
    .into();

    let schema = schema();
    let mut query = QueryState::new("Customer", ResultKind::Count);
    let mut joins = JoinContext::new();
    let pred = filter
        .to_predicate(&mut BuildCx::new(&schema, &mut query, &mut joins))
        .unwrap();

    assert_eq!(pred, None);
    assert!(query.joins().is_empty());
    assert_eq!(mem::count(&dataset(), &schema, &query, pred.as_ref()), 3);
}

#[test]
fn alias_on_multi_path_fetch_is_rejected() {
    let filter: Filter = JoinFetch::new(vec!["orders".into(), "tags".into()])
        .alias("o")
        .into();

    let mut query = QueryState::new("Customer", ResultKind::Rows);
    let mut joins = JoinContext::new();
    let err = build(&filter, &mut query, &mut joins).unwrap_err();

    assert!(matches!(
        err,
        FilterError::Config(ConfigError::AliasOnMultiFetch { .. })
    ));
}

#[test]
fn conversion_failure_propagates_by_default() {
    let filter: Filter = Leaf::new("age", LeafKind::Equal, vec!["unknown".into()]).into();

    let mut query = QueryState::new("Customer", ResultKind::Rows);
    let mut joins = JoinContext::new();
    let err = build(&filter, &mut query, &mut joins).unwrap_err();

    assert!(err.is_recoverable());
    assert!(matches!(err, FilterError::Convert(_)));
}

#[test]
fn empty_result_policy_turns_mismatch_into_false() {
    let leaf = Leaf::new("age", LeafKind::Equal, vec!["unknown".into()]);
    let filter: Filter = OnMismatch::new(MismatchPolicy::EmptyResult, leaf.into()).into();

    let mut query = QueryState::new("Customer", ResultKind::Rows);
    let mut joins = JoinContext::new();
    let pred = build(&filter, &mut query, &mut joins).unwrap();

    assert_eq!(pred, Some(Predicate::False));
}

#[test]
fn ignore_policy_drops_the_mismatched_leaf() {
    let broken = Leaf::new("age", LeafKind::Equal, vec!["unknown".into()]);
    let filter: Filter = Conjunction::new(vec![
        OnMismatch::new(MismatchPolicy::Ignore, broken.into()).into(),
        Leaf::new("lastName", LeafKind::Equal, vec!["Simpson".into()]).into(),
    ])
    .into();

    assert_eq!(select(&filter), vec![0, 1]);
}

#[test]
fn mismatch_policies_leave_config_errors_alone() {
    let broken = Leaf::new("missing", LeafKind::Equal, vec!["x".into()]);
    let filter: Filter = OnMismatch::new(MismatchPolicy::Ignore, broken.into()).into();

    let mut query = QueryState::new("Customer", ResultKind::Rows);
    let mut joins = JoinContext::new();
    let err = build(&filter, &mut query, &mut joins).unwrap_err();

    assert!(matches!(err, FilterError::Config(_)));
}

#[test]
fn failed_pre_pass_reruns_on_the_next_evaluation() {
    // The broken fetch aborts the pre-pass before the join registers.
    let filter: Filter = Conjunction::new(vec![
        JoinFetch::new(vec!["bogus".into()]).into(),
        Join::new("orders", "o").into(),
        Leaf::new("o.itemName", LeafKind::Like, vec!["Beer".into()]).into(),
    ])
    .into();

    let mut query = QueryState::new("Customer", ResultKind::Rows);
    let mut joins = JoinContext::new();

    let first = build(&filter, &mut query, &mut joins).unwrap_err();
    // Same query object again: the pre-pass must run again and report
    // the same configuration error, not skip the side effects.
    let second = build(&filter, &mut query, &mut joins).unwrap_err();

    assert!(matches!(
        first,
        FilterError::Config(ConfigError::UnknownAttribute { .. })
    ));
    assert_eq!(first, second);
}

#[test]
fn single_surviving_branch_comes_back_unwrapped() {
    let filter: Filter = Conjunction::new(vec![
        Join::new("orders", "o").into(),
        Leaf::new("lastName", LeafKind::Equal, vec!["Simpson".into()]).into(),
    ])
    .into();

    let mut query = QueryState::new("Customer", ResultKind::Rows);
    let mut joins = JoinContext::new();
    let pred = build(&filter, &mut query, &mut joins).unwrap().unwrap();

    assert!(matches!(pred, Predicate::Compare { .. }));
}

#[test]
fn case_policy_folds_both_sides() {
    let filter: Filter = Leaf::new("lastName", LeafKind::Like, vec!["simpson".into()])
        .with_case(CasePolicy::FoldLower)
        .into();

    assert_eq!(select(&filter), vec![0, 1]);
}

#[test]
fn turkic_locale_folds_dotted_i() {
    let filter: Filter = Leaf::new("lastName", LeafKind::Equal, vec!["simpson".into()])
        .with_case(CasePolicy::Application(Locale::new("tr")))
        .into();

    let mut query = QueryState::new("Customer", ResultKind::Rows);
    let mut joins = JoinContext::new();
    let pred = build(&filter, &mut query, &mut joins).unwrap().unwrap();

    // Turkish uppercasing maps 'i' to dotted capital I.
    match pred {
        Predicate::Compare {
            value: Value::Text(text),
            ..
        } => assert_eq!(text, "S\u{130}MPSON"),
        other => panic!("expected a folded comparison, got {other:?}"),
    }
}

#[test]
fn date_comparisons_convert_and_evaluate() {
    let since: Filter = Leaf::new(
        "registrationDate",
        LeafKind::GreaterThanOrEqual,
        vec!["2014-01-01".into()],
    )
    .into();
    assert_eq!(select(&since), vec![0]);

    let range: Filter = Leaf::new(
        "registrationDate",
        LeafKind::Between,
        vec!["2013-01-01".into(), "2014-12-31".into()],
    )
    .into();
    assert_eq!(select(&range), vec![0, 1]);

    let garbled: Filter =
        Leaf::new("registrationDate", LeafKind::Equal, vec!["21-03-2014".into()]).into();
    let mut query = QueryState::new("Customer", ResultKind::Rows);
    let mut joins = JoinContext::new();
    let err = build(&garbled, &mut query, &mut joins).unwrap_err();
    assert!(matches!(err, FilterError::Convert(_)));
}

#[test]
fn between_in_and_null_kinds_build_their_predicates() {
    let between: Filter =
        Leaf::new("age", LeafKind::Between, vec!["35".into(), "40".into()]).into();
    assert_eq!(select(&between), vec![0, 1]);

    let within: Filter = Leaf::new(
        "firstName",
        LeafKind::In,
        vec!["Homer".into(), "Ned".into()],
    )
    .into();
    assert_eq!(select(&within), vec![0, 2]);

    let missing: Filter = Leaf::new("nickName", LeafKind::Null, Vec::new()).into();
    assert_eq!(select(&missing), Vec::<usize>::new());
}
