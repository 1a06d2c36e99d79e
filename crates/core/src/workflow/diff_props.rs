//! Property-based tests for the diff engine.

use proptest::prelude::*;
use rust_decimal::Decimal;
use tresor_shared::types::{FieldMap, FieldValue};

use crate::workflow::diff::diff;

fn arb_field_value() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        any::<bool>().prop_map(FieldValue::Flag),
        (-1_000_000i64..1_000_000i64).prop_map(|n| FieldValue::Number(Decimal::from(n))),
        "[a-zA-Z0-9 ]{0,20}".prop_map(FieldValue::Text),
    ]
}

fn arb_field_map() -> impl Strategy<Value = FieldMap> {
    proptest::collection::btree_map("[a-z_]{1,12}", arb_field_value(), 0..8)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A map diffed against itself changes nothing.
    #[test]
    fn prop_self_diff_is_empty(map in arb_field_map()) {
        prop_assert!(diff(&map, &map).is_empty());
    }

    /// The delta only ever contains keys from the edited map, with the
    /// edited values.
    #[test]
    fn prop_delta_is_subset_of_edit(current in arb_field_map(), edited in arb_field_map()) {
        let delta = diff(&current, &edited);
        for (key, value) in &delta {
            prop_assert_eq!(edited.get(key), Some(value));
        }
    }

    /// Applying the delta on top of current makes every edited key
    /// normalized-equal to the edit; an empty delta means the edit was
    /// already normalized-equal everywhere.
    #[test]
    fn prop_applying_delta_reaches_edit(current in arb_field_map(), edited in arb_field_map()) {
        let delta = diff(&current, &edited);

        let mut applied = current.clone();
        applied.extend(delta);

        for (key, value) in &edited {
            let after = applied.get(key).expect("edited key present after apply");
            prop_assert!(after.normalized_eq(value));
        }
    }

    /// Rewriting a number as its string rendering is never a change.
    #[test]
    fn prop_numeric_rendering_is_noop(n in -1_000_000i64..1_000_000i64) {
        let mut current = FieldMap::new();
        current.insert("amount".into(), FieldValue::Number(Decimal::from(n)));
        let mut edited = FieldMap::new();
        edited.insert("amount".into(), FieldValue::Text(Decimal::from(n).to_string()));

        prop_assert!(diff(&current, &edited).is_empty());
    }
}
