//! Field-level delta computation.
//!
//! The diff engine decides whether an edit submission is a no-op and
//! builds the audit payload a change request carries. Comparison is
//! type-normalized: a numeric string and a number with the same value
//! are not a change.

use tresor_shared::types::FieldMap;

/// Computes the minimal field-level delta between a record's current
/// values and a caller-supplied candidate map.
///
/// Only keys present in `edited` are considered; keys absent from
/// `edited` are left untouched by the eventual update. A key missing
/// from `current` counts as changed.
#[must_use]
pub fn diff(current: &FieldMap, edited: &FieldMap) -> FieldMap {
    edited
        .iter()
        .filter(|(key, value)| {
            current
                .get(*key)
                .is_none_or(|existing| !existing.normalized_eq(value))
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tresor_shared::types::FieldValue;

    fn fields(entries: &[(&str, FieldValue)]) -> FieldMap {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_identical_maps_diff_empty() {
        let current = fields(&[("name", "A".into()), ("code", "1".into())]);
        assert!(diff(&current, &current.clone()).is_empty());
    }

    #[test]
    fn test_only_changed_keys_survive() {
        let current = fields(&[("name", "A".into()), ("code", "1".into())]);
        let edited = fields(&[("name", "A".into()), ("code", "2".into())]);

        let delta = diff(&current, &edited);
        assert_eq!(delta.len(), 1);
        assert_eq!(delta.get("code"), Some(&FieldValue::Text("2".into())));
        assert!(!delta.contains_key("name"));
    }

    #[test]
    fn test_numeric_string_vs_number_is_not_a_change() {
        let current = fields(&[("limit", FieldValue::Number(dec!(1000)))]);
        let edited = fields(&[("limit", "1000".into())]);
        assert!(diff(&current, &edited).is_empty());
    }

    #[test]
    fn test_numeric_value_change_detected() {
        let current = fields(&[("limit", FieldValue::Number(dec!(1000)))]);
        let edited = fields(&[("limit", "1001".into())]);
        let delta = diff(&current, &edited);
        assert_eq!(delta.len(), 1);
    }

    #[test]
    fn test_new_key_counts_as_changed() {
        let current = fields(&[("name", "A".into())]);
        let edited = fields(&[("swift_code", "ABCDGB2L".into())]);
        let delta = diff(&current, &edited);
        assert_eq!(delta.len(), 1);
        assert!(delta.contains_key("swift_code"));
    }

    #[test]
    fn test_keys_absent_from_edit_are_ignored() {
        let current = fields(&[("name", "A".into()), ("code", "1".into())]);
        let edited = fields(&[("code", "1".into())]);
        assert!(diff(&current, &edited).is_empty());
    }
}
