// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! One-shot maintenance operation re-deriving `value_type` for rows that
//! predate the classifier, ported from
//! `original_source/data_entry/management/commands/backfill_value_type.py`.
//! Invoked from the CLI, not wired into the scheduler.

use crate::aggregate::bucket::BucketStore;

fn infer_from_numeric(value: f64) -> &'static str {
    if value.fract() == 0.0 { "int" } else { "float" }
}

/// Re-derives `value_type` for every row currently tagged `"null"`: prefers
/// `value`, falls back in order to `min_value`/`avg_value`/`max_value`/
/// `sum_value`, and as a last resort guesses `"bool"` when both `min_value`
/// and `max_value` sit in `{0, 1}` and a `count` is present.
pub fn recompute_value_types(store: &BucketStore) -> usize {
    let mut updated = 0;
    for mut row in store.all_rows() {
        if row.value_type != "null" {
            continue;
        }

        let inferred = row
            .value
            .map(infer_from_numeric)
            .or_else(|| row.min_value.map(infer_from_numeric))
            .or_else(|| row.avg_value.map(infer_from_numeric))
            .or_else(|| row.max_value.map(infer_from_numeric))
            .or_else(|| row.sum_value.map(infer_from_numeric))
            .or_else(|| {
                let bool_like = |v: Option<f64>| matches!(v, Some(x) if x == 0.0 || x == 1.0);
                if row.count.is_some() && bool_like(row.min_value) && bool_like(row.max_value) {
                    Some("bool")
                } else {
                    None
                }
            });

        if let Some(kind) = inferred {
            row.value_type = kind.to_string();
            store.upsert(row);
            updated += 1;
        }
    }
    updated
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::aggregate::bucket::{BucketRow, Resolution};

    fn untyped_row(value: Option<f64>, min: Option<f64>, max: Option<f64>, count: Option<i64>) -> BucketRow {
        BucketRow {
            resolution: Resolution::TwoMin,
            timestamp: "2026-01-01T00:00:00Z".parse::<DateTime<Utc>>().expect("parse"),
            var_id: "temp".into(),
            client_id: "plc-1".into(),
            group_id: "0".into(),
            value,
            value_type: "null".into(),
            min_value: min,
            max_value: max,
            avg_value: None,
            sum_value: None,
            count,
        }
    }

    #[test]
    fn infers_float_from_value_field() {
        let store = BucketStore::new();
        store.upsert(untyped_row(Some(1.5), None, None, None));
        assert_eq!(recompute_value_types(&store), 1);
        let row = store.get(Resolution::TwoMin, untyped_row(None, None, None, None).timestamp, "temp").unwrap();
        assert_eq!(row.value_type, "float");
    }

    #[test]
    fn guesses_bool_from_zero_one_min_max_when_no_direct_value() {
        let store = BucketStore::new();
        store.upsert(untyped_row(None, Some(0.0), Some(1.0), Some(5)));
        assert_eq!(recompute_value_types(&store), 1);
        let row = store.get(Resolution::TwoMin, untyped_row(None, None, None, None).timestamp, "temp").unwrap();
        assert_eq!(row.value_type, "bool");
    }

    #[test]
    fn leaves_already_typed_rows_untouched() {
        let store = BucketStore::new();
        let mut row = untyped_row(Some(1.0), None, None, None);
        row.value_type = "int".into();
        store.upsert(row);
        assert_eq!(recompute_value_types(&store), 0);
    }
}
