//! Property tests for the expression normalizer and extractor.

use proptest::prelude::*;

use concord::extract::extract;
use concord::normalize::{Normalizer, normalize};

fn variable() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["x", "y", "z"]).prop_map(String::from)
}

fn operand() -> impl Strategy<Value = String> {
    prop_oneof![variable(), (0i64..20).prop_map(|n| n.to_string())]
}

/// Small sums and products of variables and integers.
fn expression() -> impl Strategy<Value = String> {
    operand().prop_recursive(3, 12, 2, |inner| {
        (inner.clone(), prop::sample::select(vec!["+", "*", "-"]), inner)
            .prop_map(|(l, op, r)| format!("({l} {op} {r})"))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn normalize_never_panics(input in ".{0,40}") {
        let _ = normalize(&input);
    }

    #[test]
    fn normalize_is_idempotent_on_its_output(e in expression()) {
        let once = normalize(&e);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn addition_commutes(a in expression(), b in expression()) {
        let n = Normalizer::default();
        prop_assert_eq!(
            n.normalize(&format!("{a} + {b}")),
            n.normalize(&format!("{b} + {a}"))
        );
    }

    #[test]
    fn multiplication_commutes(a in operand(), b in operand()) {
        prop_assert_eq!(normalize(&format!("{a} * {b}")), normalize(&format!("{b} * {a}")));
    }

    #[test]
    fn extract_never_panics(input in ".{0,80}") {
        let _ = extract(&input);
    }
}
