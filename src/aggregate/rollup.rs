// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Rollups that fold lower-resolution bucket rows upward, ported from
//! `original_source/data_entry/service.py::aggregate_2min_to_10min` /
//! `aggregate_to_1hour` / `aggregate_to_daily`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::aggregate::bucket::{BucketRow, BucketStore, Resolution};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollupSummary {
    pub bucket_start: DateTime<Utc>,
    pub var_count: usize,
}

#[derive(Default)]
struct Fold {
    client_id: String,
    group_id: String,
    sum: f64,
    count: i64,
    min: Option<f64>,
    max: Option<f64>,
    slots: u32,
}

/// Row-level numeric extraction shared by every rollup: prefer the row's own
/// `count`/`sum_value`, fall back to `avg_value * count`, fall back to the
/// bare `value` as a single sample. Mirrors the repeated inline logic in the
/// original's three `aggregate_*` functions.
fn row_count_and_sum(row: &BucketRow) -> (i64, f64) {
    let count = row.count.unwrap_or(if row.value.is_some() { 1 } else { 0 });
    let sum = if let Some(s) = row.sum_value {
        s
    } else if let (Some(avg), true) = (row.avg_value, count > 0) {
        avg * count as f64
    } else {
        row.value.unwrap_or(0.0)
    };
    (count, sum)
}

fn fold_row(fold: &mut Fold, row: &BucketRow) {
    fold.client_id = row.client_id.clone();
    fold.group_id = row.group_id.clone();

    let (count, sum) = row_count_and_sum(row);
    if count > 0 {
        fold.sum += sum;
        fold.count += count;
    }

    let min_candidate = row.min_value.or(row.value);
    if let Some(mv) = min_candidate {
        fold.min = Some(fold.min.map_or(mv, |m| m.min(mv)));
    }
    let max_candidate = row.max_value.or(row.value);
    if let Some(xv) = max_candidate {
        fold.max = Some(fold.max.map_or(xv, |m| m.max(xv)));
    }
    fold.slots += 1;
}

fn fold_rows<'a>(rows: impl Iterator<Item = &'a BucketRow>) -> HashMap<String, Fold> {
    let mut agg: HashMap<String, Fold> = HashMap::new();
    for row in rows {
        let entry = agg.entry(row.var_id.clone()).or_default();
        fold_row(entry, row);
    }
    agg
}

fn upsert_fold(store: &BucketStore, resolution: Resolution, bucket_start: DateTime<Utc>, var_id: String, fold: &Fold) {
    let avg = if fold.count > 0 { Some(fold.sum / fold.count as f64) } else { None };
    store.upsert(BucketRow {
        resolution,
        timestamp: bucket_start,
        var_id,
        client_id: fold.client_id.clone(),
        group_id: fold.group_id.clone(),
        value: avg,
        value_type: if avg.is_some() { "float".to_string() } else { "null".to_string() },
        min_value: fold.min,
        max_value: fold.max,
        avg_value: avg,
        sum_value: if fold.count > 0 { Some(fold.sum) } else { None },
        count: Some(fold.count),
    });
}

/// Folds `TwoMin` rows in `[bucket_start, bucket_start + 10min)` into one
/// `TenMin` row per `var_id`.
pub fn rollup_to_ten_minute(store: &BucketStore, at: DateTime<Utc>) -> RollupSummary {
    let bucket_start = Resolution::TenMin.floor(at);
    let bucket_end = bucket_start + Resolution::TenMin.window();
    let rows = store.rows_in_range(Resolution::TwoMin, bucket_start, bucket_end);
    let agg = fold_rows(rows.iter());

    let mut var_count = 0;
    for (var_id, fold) in &agg {
        if fold.count <= 0 {
            continue;
        }
        upsert_fold(store, Resolution::TenMin, bucket_start, var_id.clone(), fold);
        var_count += 1;
    }
    RollupSummary { bucket_start, var_count }
}

/// Shared fallback policy for hour/day rollups: prefer the `TenMin` source
/// when a `var_id` has at least 3 ten-minute slots in the window, otherwise
/// fall back to folding `TwoMin` rows directly.
fn rollup_with_fallback(store: &BucketStore, resolution: Resolution, bucket_start: DateTime<Utc>) -> RollupSummary {
    let bucket_end = bucket_start + resolution.window();
    let ten_rows = store.rows_in_range(Resolution::TenMin, bucket_start, bucket_end);
    let two_rows = store.rows_in_range(Resolution::TwoMin, bucket_start, bucket_end);

    let ten_agg = fold_rows(ten_rows.iter());
    let two_agg = fold_rows(two_rows.iter());

    let mut all_vids: Vec<&String> = ten_agg.keys().chain(two_agg.keys()).collect();
    all_vids.sort();
    all_vids.dedup();

    let mut var_count = 0;
    for var_id in all_vids {
        let use_ten = ten_agg.get(var_id).is_some_and(|f| f.slots >= 3);
        let fold = if use_ten { ten_agg.get(var_id) } else { two_agg.get(var_id) };
        let Some(fold) = fold else { continue };
        if fold.count <= 0 {
            continue;
        }
        upsert_fold(store, resolution, bucket_start, var_id.clone(), fold);
        var_count += 1;
    }
    RollupSummary { bucket_start, var_count }
}

pub fn rollup_to_hourly(store: &BucketStore, at: DateTime<Utc>) -> RollupSummary {
    let bucket_start = Resolution::Hour.floor(at);
    rollup_with_fallback(store, Resolution::Hour, bucket_start)
}

pub fn rollup_to_daily(store: &BucketStore, at: DateTime<Utc>) -> RollupSummary {
    let bucket_start = Resolution::Day.floor(at);
    rollup_with_fallback(store, Resolution::Day, bucket_start)
}
