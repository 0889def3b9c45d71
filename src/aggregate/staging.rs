// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! 2-minute staging pass: drains the [`KvCache`](crate::cache::KvCache) into
//! `TwoMin` bucket rows, ported from
//! `original_source/data_entry/service.py::redis_to_db`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::{
    aggregate::{
        bucket::{BucketRow, BucketStore, Resolution},
        classify::classify_value,
    },
    cache::KvCache,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingSummary {
    pub bucket_ts: DateTime<Utc>,
    pub buckets: usize,
}

struct Accumulator {
    client_id: String,
    sum: f64,
    count: i64,
    min: Option<f64>,
    max: Option<f64>,
    last_numeric: Option<f64>,
    last_label: String,
}

/// Scans the whole cache (`*:*`) and folds every `client_id:var_id` reading
/// into a `TwoMin` row floored to `bucket_ts`'s own 2-minute boundary.
/// Mirrors `redis_to_db`'s single aggregation key `var_id` (readings from
/// multiple clients for the same `var_id` in one window collapse into one
/// row, keeping the last client seen as the row's `client_id`).
pub fn stage_two_minute(cache: &KvCache, store: &BucketStore, at: DateTime<Utc>) -> StagingSummary {
    let bucket_ts = Resolution::TwoMin.floor(at);
    let rows = cache.scan("*:*").unwrap_or_default();

    let mut aggregates: HashMap<String, Accumulator> = HashMap::new();
    for (key, sample) in rows {
        let Some((client_id, var_id)) = key.split_once(':') else { continue };
        let (kind, numeric) = classify_value(&sample.value.to_json());

        let entry = aggregates.entry(var_id.to_string()).or_insert_with(|| Accumulator {
            client_id: client_id.to_string(),
            sum: 0.0,
            count: 0,
            min: None,
            max: None,
            last_numeric: None,
            last_label: "null".to_string(),
        });
        entry.client_id = client_id.to_string();
        if let Some(v) = numeric {
            entry.sum += v;
            entry.count += 1;
            entry.last_numeric = Some(v);
            entry.last_label = kind.to_string();
            entry.min = Some(entry.min.map_or(v, |m| m.min(v)));
            entry.max = Some(entry.max.map_or(v, |m| m.max(v)));
        } else {
            entry.last_label = kind.to_string();
        }
    }

    let bucket_count = aggregates.len();
    for (var_id, agg) in aggregates {
        let avg = if agg.count > 0 { Some(agg.sum / agg.count as f64) } else { None };
        store.upsert(BucketRow {
            resolution: Resolution::TwoMin,
            timestamp: bucket_ts,
            var_id,
            client_id: agg.client_id,
            group_id: "0".to_string(),
            value: agg.last_numeric,
            value_type: agg.last_label,
            min_value: agg.min,
            max_value: agg.max,
            avg_value: avg,
            sum_value: if agg.count > 0 { Some(agg.sum) } else { None },
            count: if agg.count > 0 { Some(agg.count) } else { None },
        });
    }

    StagingSummary { bucket_ts, buckets: bucket_count }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SampleValue;

    #[test]
    fn stages_numeric_readings_into_a_two_minute_row() {
        let cache = KvCache::new();
        cache.set("plc-1", "temp", SampleValue::Float(21.5));
        cache.set("plc-1", "press", SampleValue::Int(7));

        let store = BucketStore::new();
        let at = "2026-01-01T12:03:10Z".parse::<DateTime<Utc>>().expect("parse");
        let summary = stage_two_minute(&cache, &store, at);

        assert_eq!(summary.buckets, 2);
        let bucket_ts = Resolution::TwoMin.floor(at);
        let row = store.get(Resolution::TwoMin, bucket_ts, "temp").expect("row present");
        assert_eq!(row.value, Some(21.5));
        assert_eq!(row.value_type, "float");
        assert_eq!(row.count, Some(1));
    }

    #[test]
    fn non_numeric_reading_keeps_label_without_numeric_fields() {
        let cache = KvCache::new();
        cache.set("plc-1", "mode", SampleValue::Str("idle".into()));

        let store = BucketStore::new();
        let at = "2026-01-01T12:03:10Z".parse::<DateTime<Utc>>().expect("parse");
        stage_two_minute(&cache, &store, at);

        let bucket_ts = Resolution::TwoMin.floor(at);
        let row = store.get(Resolution::TwoMin, bucket_ts, "mode").expect("row present");
        assert_eq!(row.value, None);
        assert_eq!(row.value_type, "str");
        assert_eq!(row.count, None);
    }
}
