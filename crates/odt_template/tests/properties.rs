//! Property-based tests for substitution, row normalization and accumulation

use odt_template::rows::normalize_rows;
use odt_template::{Segment, TemplateConfig, TokenStore};
use proptest::prelude::*;

/// Replacement text, braces included so values can look like tags
fn value_strategy() -> impl Strategy<Value = String> {
    "[a-z{}]{0,12}"
}

/// Two distinct variable names
fn key_pair_strategy() -> impl Strategy<Value = (String, String)> {
    ("[a-z]{1,5}", "[a-z]{1,5}").prop_filter("keys must differ", |(a, b)| a != b)
}

/// One table row, optionally carrying a `row.` segment across its cells
fn row_strategy() -> impl Strategy<Value = String> {
    ("[a-z ]{0,8}", "[a-z ]{0,8}", proptest::option::of("[a-z]{1,6}")).prop_map(|(left, right, marker)| {
        let (begin, end) = match marker {
            Some(name) => (
                format!("[!-- BEGIN row.{} --]", name),
                format!("[!-- END row.{} --]", name),
            ),
            None => (String::new(), String::new()),
        };
        format!(
            "<table:table-row><table:table-cell>{}{}</table:table-cell><table:table-cell>{}{}</table:table-cell></table:table-row>",
            begin, left, right, end
        )
    })
}

proptest! {
    #[test]
    fn substitution_is_single_pass(
        (a, b) in key_pair_strategy(),
        va in value_strategy(),
        vb in value_strategy(),
    ) {
        let mut store = TokenStore::new();
        store.bind(format!("{{{}}}", a), &va, false);
        store.bind(format!("{{{}}}", b), &vb, false);

        let payload = format!("{{{}}}|{{{}}}|{{{}}}", a, b, a);
        let result = store.apply(&payload).unwrap();
        prop_assert_eq!(result, format!("{}|{}|{}", va, vb, va));
    }

    #[test]
    fn substitution_ignores_binding_order(
        (a, b) in key_pair_strategy(),
        va in value_strategy(),
        vb in value_strategy(),
    ) {
        let (ta, tb) = (format!("{{{}}}", a), format!("{{{}}}", b));
        let payload = format!("x{}y{}z", ta, tb);

        let mut forward = TokenStore::new();
        forward.bind(ta.clone(), &va, true);
        forward.bind(tb.clone(), &vb, true);
        let mut backward = TokenStore::new();
        backward.bind(tb, &vb, true);
        backward.bind(ta, &va, true);

        prop_assert_eq!(forward.apply(&payload).unwrap(), backward.apply(&payload).unwrap());
    }

    #[test]
    fn row_normalization_is_idempotent(rows in proptest::collection::vec(row_strategy(), 0..6)) {
        let content = format!("<table:table>{}</table:table>", rows.concat());
        let once = normalize_rows(&content);
        let twice = normalize_rows(&once);
        prop_assert!(!once.contains("row."));
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn merges_accumulate_in_order(values in proptest::collection::vec("[a-z]{1,8}", 1..8)) {
        let xml = "[!-- BEGIN items --]<p>{v}</p>[!-- END items --]";
        let mut items = Segment::standalone("items", xml, TemplateConfig::default()).unwrap();
        for value in &values {
            items.bind_variable("v", value).unwrap();
            items.merge().unwrap();
        }
        let expected: String = values.iter().map(|v| format!("<p>{}</p>", v)).collect();
        prop_assert_eq!(items.output(), expected.as_str());
    }
}
