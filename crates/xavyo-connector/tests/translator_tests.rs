//! Filter translation through an LDAP-style translator.

mod common;

use common::*;
use xavyo_connector::prelude::*;

fn translate(caps: Capabilities, filter: &Filter) -> Vec<String> {
    LdapTranslator::new(caps)
        .translate(filter)
        .unwrap()
        .iter()
        .map(|q| q.as_str().to_string())
        .collect()
}

fn level(kind: FilterKind, value: i64) -> Filter {
    let attr = Attribute::single("level", value).unwrap();
    let filter = match kind {
        FilterKind::GreaterThan => Filter::greater_than(attr),
        FilterKind::GreaterThanOrEqual => Filter::greater_than_or_equal(attr),
        FilterKind::LessThan => Filter::less_than(attr),
        FilterKind::LessThanOrEqual => Filter::less_than_or_equal(attr),
        other => panic!("not a comparison: {other}"),
    };
    filter.unwrap()
}

#[test]
fn test_values_are_escaped() {
    assert_eq!(
        translate(Capabilities::full(), &eq("cn", "a*(b)\\c")),
        vec!["(cn=a\\2a\\28b\\29\\5cc)"]
    );
    assert_eq!(
        translate(Capabilities::full(), &starts_with("cn", "J*")),
        vec!["(cn=J\\2a*)"]
    );
}

#[test]
fn test_substring_shapes() {
    let caps = Capabilities::full();
    assert_eq!(translate(caps, &contains("mail", "test")), vec!["(mail=*test*)"]);
    assert_eq!(translate(caps, &starts_with("cn", "John")), vec!["(cn=John*)"]);
    let ends = Filter::ends_with(Attribute::single("mail", "@example.com").unwrap()).unwrap();
    assert_eq!(translate(caps, &ends), vec!["(mail=*@example.com)"]);
}

#[test]
fn test_negated_substring_is_native() {
    let filter = Filter::negate(contains("mail", "test"));
    assert_eq!(
        translate(Capabilities::leaves_only(), &filter),
        vec!["(!(mail=*test*))"]
    );
}

#[test]
fn test_not_and_with_negated_equals_scans() {
    // NOT(a AND b) == NOT a OR NOT b, and NOT a has no native form.
    let filter = Filter::negate(Filter::and(eq("dept", "eng"), contains("mail", "x")));
    assert!(translate(Capabilities::full(), &filter).is_empty());
}

#[test]
fn test_not_or_keeps_expressible_side() {
    let filter = Filter::negate(Filter::or(eq("dept", "eng"), contains("mail", "x")));
    assert_eq!(
        translate(Capabilities::full(), &filter),
        vec!["(!(mail=*x*))"]
    );
}

#[test]
fn test_strict_comparisons_widen_to_inclusive() {
    let caps = Capabilities::full();
    assert_eq!(
        translate(caps, &level(FilterKind::GreaterThan, 5)),
        vec!["(level>=5)"]
    );
    assert_eq!(
        translate(caps, &level(FilterKind::LessThan, 5)),
        vec!["(level<=5)"]
    );
    assert!(translate(caps, &Filter::negate(level(FilterKind::LessThan, 5))).is_empty());
}

#[test]
fn test_identical_native_expressions_are_merged() {
    let caps = Capabilities {
        ordering: true,
        ..Capabilities::leaves_only()
    };
    let filter = Filter::or(
        level(FilterKind::GreaterThan, 5),
        level(FilterKind::GreaterThanOrEqual, 5),
    );
    assert_eq!(translate(caps, &filter), vec!["(level>=5)"]);
}

#[test]
fn test_unsupported_values_scan() {
    let caps = Capabilities::full();
    let multi = Filter::equals(Attribute::multi("groups", ["a", "b"]).unwrap()).unwrap();
    assert!(translate(caps, &multi).is_empty());

    let numeric = Filter::equals(Attribute::single("level", 3i64).unwrap()).unwrap();
    assert!(translate(caps, &numeric).is_empty());

    let all = Filter::contains_all_values(Attribute::multi("groups", ["a"]).unwrap()).unwrap();
    assert!(translate(caps, &all).is_empty());
}

#[test]
fn test_nested_and_distributes_once_per_branch() {
    let filter = Filter::and(
        Filter::and(eq("a", "1"), eq("b", "2")),
        Filter::or(eq("c", "3"), eq("d", "4")),
    );
    assert_eq!(
        translate(Capabilities::and_only(), &filter),
        vec!["(&(&(a=1)(b=2))(c=3))", "(&(&(a=1)(b=2))(d=4))"]
    );
    assert_eq!(
        translate(Capabilities::full(), &filter),
        vec!["(&(&(a=1)(b=2))(|(c=3)(d=4)))"]
    );
}

#[test]
fn test_or_chain_without_native_or() {
    let filter = Filter::any_of([eq("dept", "eng"), eq("dept", "ops"), eq("dept", "hr")]).unwrap();
    assert_eq!(
        translate(Capabilities::leaves_only(), &filter),
        vec!["(dept=eng)", "(dept=ops)", "(dept=hr)"]
    );
    assert_eq!(
        translate(Capabilities::full(), &filter),
        vec!["(|(|(dept=eng)(dept=ops))(dept=hr))"]
    );
}

#[test]
fn test_and_chain_keeps_fewest_queries() {
    // (dept=eng OR dept=ops) AND title=Sr* with no AND support: the single
    // title query is the cheaper superset.
    let filter = Filter::and(
        Filter::or(eq("dept", "eng"), eq("dept", "ops")),
        starts_with("title", "Sr"),
    );
    assert_eq!(
        translate(Capabilities::leaves_only(), &filter),
        vec!["(title=Sr*)"]
    );
}
