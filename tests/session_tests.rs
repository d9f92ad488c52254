//! Assertion semantics and count tracking for Session.

use tapkit::{CatchPolicy, Comparator, Outcome, Session, TapError, Value};

fn v(n: i64) -> Value {
    Value::Int(n)
}

#[test]
fn basics_plan_ok_pass_fail() {
    let mut test = Session::new();
    test.plan(4);

    assert!(test.ok(true, Some("ok()"), None).ok);
    assert!(test.pass(Some("pass()"), None).ok);
    assert!(!test.fail(Some("fail()"), None).ok);
    assert!(test.ok(1 + 1 == 2, None, None).ok);

    assert_eq!(test.planned(), 4);
    assert_eq!(test.ran(), 4);
    assert_eq!(test.failed(false), 1);
    assert!(!test.success(true));
}

#[test]
fn is_succeeds_on_identity_for_every_shape() {
    let mut test = Session::new();
    let values = [
        Value::Null,
        Value::Bool(true),
        Value::Int(7),
        Value::Float(3.5),
        Value::from("hello"),
        Value::Seq(vec![v(1), v(2)]),
        Value::Map(vec![("k".into(), v(1))]),
    ];
    for value in &values {
        assert!(test.is(value, value, None).ok);
    }
    assert_eq!(test.failed(false), 0);
}

#[test]
fn isnt_succeeds_only_on_non_identity() {
    let mut test = Session::new();
    assert!(test.isnt(&v(1), &v(2), None).ok);
    assert!(test.isnt(&v(1), &Value::Float(1.0), None).ok);
    assert!(!test.isnt(&v(1), &v(1), None).ok);
}

#[test]
fn cmp_alias_pairs_agree() {
    let aliases: &[&[&str]] = &[
        &["is", "==="],
        &["isnt", "!=="],
        &["eq", "=="],
        &["ne", "!="],
        &["lt", "<"],
        &["gt", ">"],
        &["le", "lte", "<="],
        &["ge", "gte", ">="],
    ];
    let pairs = [
        (v(1), v(1)),
        (v(1), v(2)),
        (v(2), v(1)),
        (v(1), Value::Float(1.0)),
        (Value::from("a"), Value::from("b")),
    ];
    for group in aliases {
        for (got, want) in &pairs {
            let mut outcomes = Vec::new();
            for token in *group {
                let mut test = Session::new();
                outcomes.push(test.cmp_ok(got, want, token, None, true).ok);
            }
            assert!(
                outcomes.windows(2).all(|w| w[0] == w[1]),
                "aliases {:?} disagree on {:?} vs {:?}",
                group,
                got,
                want
            );
        }
    }
}

#[test]
fn cmp_enum_and_token_forms_agree() {
    let table = [
        (Comparator::Identical, "is"),
        (Comparator::NotIdentical, "isnt"),
        (Comparator::LooseEq, "eq"),
        (Comparator::LooseNe, "ne"),
        (Comparator::Lt, "lt"),
        (Comparator::Gt, "gt"),
        (Comparator::Le, "le"),
        (Comparator::Ge, "ge"),
    ];
    for (comparator, token) in table {
        let mut a = Session::new();
        let mut b = Session::new();
        let left = a.cmp(&v(2), &v(3), comparator, None, true).ok;
        let right = b.cmp_ok(&v(2), &v(3), token, None, true).ok;
        assert_eq!(left, right, "{:?} vs {:?}", comparator, token);
    }
}

#[test]
fn unknown_comparator_token_is_a_failure_not_an_error() {
    let mut test = Session::new();
    let log = test.cmp_ok(&v(1), &v(1), "spaceship", None, true);
    assert!(!log.ok);
    let details = log.details.clone().expect("failed cmp records details");
    assert_eq!(details.comparator.as_deref(), Some("spaceship"));
    assert_eq!(test.failed(false), 1);
}

#[test]
fn loose_comparators_coerce_numerics() {
    let mut test = Session::new();
    assert!(test.cmp(&v(1), &Value::Float(1.0), Comparator::LooseEq, None, true).ok);
    assert!(test.cmp(&v(1), &v(2), Comparator::Lt, None, true).ok);
    assert!(test.cmp(&Value::Float(2.5), &v(2), Comparator::Gt, None, true).ok);
    assert!(test.cmp(&v(2), &v(2), Comparator::Le, None, true).ok);
    assert!(test.cmp(&v(2), &v(2), Comparator::Ge, None, true).ok);
    // Unordered pair: every ordering comparison fails.
    assert!(!test.cmp(&v(1), &Value::from("1"), Comparator::Lt, None, true).ok);
    assert!(!test.cmp(&v(1), &Value::from("1"), Comparator::Ge, None, true).ok);
}

#[test]
fn dies_policy_matrix() {
    let mut test = Session::new();

    // All: any raised tier succeeds, completion fails.
    assert!(test.dies(|| Outcome::Exception("e".into()), None, CatchPolicy::All).ok);
    assert!(test.dies(|| Outcome::Error("f".into()), None, CatchPolicy::All).ok);
    assert!(!test.dies(|| Outcome::Ok, None, CatchPolicy::All).ok);

    // ExceptionsOnly rejects the error tier, and vice versa.
    assert!(
        test.dies(|| Outcome::Exception("e".into()), None, CatchPolicy::ExceptionsOnly)
            .ok
    );
    assert!(
        !test
            .dies(|| Outcome::Error("f".into()), None, CatchPolicy::ExceptionsOnly)
            .ok
    );
    assert!(test.dies(|| Outcome::Error("f".into()), None, CatchPolicy::ErrorsOnly).ok);
    assert!(
        !test
            .dies(|| Outcome::Exception("e".into()), None, CatchPolicy::ErrorsOnly)
            .ok
    );
}

#[test]
fn dies_stores_the_throwable_as_directive() {
    use tapkit::{Directive, Thrown};
    let mut test = Session::new();
    let log = test.dies(
        || Outcome::Exception("bad input".into()),
        Some("raises"),
        CatchPolicy::All,
    );
    assert_eq!(
        log.directive,
        Some(Directive::Thrown(Thrown::Exception("bad input".into())))
    );
}

#[test]
fn dies_catches_panics_as_the_error_tier() {
    let mut test = Session::new();
    assert!(test.dies(|| panic!("kaboom"), None, CatchPolicy::All).ok);
    assert!(test.dies(|| panic!("kaboom"), None, CatchPolicy::ErrorsOnly).ok);
    assert!(
        !test
            .dies(|| panic!("kaboom"), None, CatchPolicy::ExceptionsOnly)
            .ok
    );
    // Nothing escaped: three assertions ran, the session is intact.
    assert_eq!(test.ran(), 3);
}

#[test]
fn json_equivalence_is_order_sensitive() {
    let mut test = Session::new();
    let a = Value::Map(vec![("x".into(), v(1)), ("y".into(), v(2))]);
    let b = Value::Map(vec![("x".into(), v(1)), ("y".into(), v(2))]);
    let reordered = Value::Map(vec![("y".into(), v(2)), ("x".into(), v(1))]);

    assert!(test.is_json(&a, &b, None).ok);
    assert!(!test.is_json(&a, &reordered, None).ok);
}

#[test]
fn serialized_equivalence_distinguishes_numeric_variants() {
    let mut test = Session::new();
    assert!(test.is_serialized(&v(1), &v(1), None, false).ok);
    assert!(!test.is_serialized(&v(1), &Value::Float(1.0), None, false).ok);

    // JSON equivalence blurs exactly that distinction.
    assert!(test.is_json(&v(1), &Value::Int(1), None).ok);
}

#[test]
fn serialized_failure_details_honor_raw_output() {
    let mut test = Session::new();
    let log = test.is_serialized(&v(1), &v(2), None, true);
    let details = log.details.clone().expect("details recorded");
    assert_eq!(details.got.as_str(), Some(r#"{"Int":1}"#));
    assert!(!details.stringify);

    let log = test.is_serialized(&v(1), &v(2), None, false);
    let details = log.details.clone().expect("details recorded");
    assert_eq!(details.got, v(1));
    assert!(details.stringify);
}

#[test]
fn is_type_matches_tags_pseudotypes_and_registered_supertypes() {
    let mut test = Session::new();
    test.register_type("Dog", ["Animal", "iterable"]);

    assert!(test.is_type(&v(1), "int", None).ok);
    assert!(test.is_type(&Value::Seq(vec![]), "iterable", None).ok);
    assert!(test.is_type(&Value::Map(vec![]), "iterable", None).ok);
    assert!(test.is_type(&Value::Callable("f".into()), "callable", None).ok);

    let dog = Value::Object {
        class: "Dog".into(),
        fields: vec![],
    };
    assert!(test.is_type(&dog, "object", None).ok);
    assert!(test.is_type(&dog, "Dog", None).ok);
    assert!(test.is_type(&dog, "Animal", None).ok);
    assert!(test.is_type(&dog, "iterable", None).ok);

    // Exact-case matching, unknown names fail.
    assert!(!test.is_type(&dog, "dog", None).ok);
    assert!(!test.is_type(&dog, "Vegetable", None).ok);
    assert!(!test.is_type(&v(1), "Int", None).ok);
}

#[test]
fn skip_and_todo_adjust_counts_and_flags() {
    let mut test = Session::new();
    test.plan(3);
    test.is(&v(1), &v(1), None);
    test.is(&v(1), &v(2), None);
    test.skip(Some("not ready"), None);

    assert_eq!(test.ran(), 3);
    assert_eq!(test.failed(false), 1);
    assert_eq!(test.skipped(), 1);
    assert!(!test.success(true), "a real failure fails the session");
}

#[test]
fn todo_failures_are_excludable_from_totals() {
    let mut test = Session::new();
    test.plan(2);
    test.ok(true, None, None);
    test.todo_mark(Some("write this feature"), None);

    assert_eq!(test.are_todo(), 1);
    assert_eq!(test.failed(false), 1);
    assert_eq!(test.failed(true), 0);
    assert!(test.success(true));
    assert!(!test.success(false));
}

#[test]
fn plan_mismatch_fails_success_even_with_no_failures() {
    let mut test = Session::new();
    test.plan(2);
    test.ok(true, None, None);
    assert!(!test.success(true));
}

#[test]
fn unplanned_session_succeeds_on_any_count() {
    let mut test = Session::new();
    test.ok(true, None, None);
    assert!(test.success(true));
}

#[test]
fn version_accepts_12_and_13_only() {
    let mut test = Session::new();
    assert!(test.version(12).is_ok());
    assert!(test.version(13).is_ok());
    let err = test.version(14).unwrap_err();
    assert!(matches!(err, TapError::UnsupportedVersion { requested: 14 }));
    // The failed call left the previous setting in place.
    assert_eq!(test.tap_version().as_u32(), 13);
}

#[test]
fn diag_does_not_affect_counts() {
    let mut test = Session::new();
    test.diag("# starting up");
    test.ok(true, None, None);
    test.diag_value(&Value::Seq(vec![v(1)]));
    assert_eq!(test.ran(), 1);
    assert_eq!(test.failed(false), 0);
}
