// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::fmt;

use chrono::{DateTime, Duration, Timelike, Utc};
use dashmap::DashMap;

/// The four rollup grains, standing in for the original backend's four
/// structurally-identical tables (`TwoMinuteData`, `TenMinuteData`,
/// `HourlyData`, `DailyData`). Collapsed into one discriminant since Rust's
/// type system doesn't need the table-per-resolution split an ORM schema
/// does (see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    TwoMin,
    TenMin,
    Hour,
    Day,
}

impl Resolution {
    /// Floors `ts` to this resolution's bucket boundary, in the timestamp's
    /// own offset (callers apply the configured zone before calling this).
    pub fn floor(self, ts: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Resolution::TwoMin => floor_minutes(ts, 2),
            Resolution::TenMin => floor_minutes(ts, 10),
            Resolution::Hour => ts
                .with_minute(0)
                .and_then(|t| t.with_second(0))
                .and_then(|t| t.with_nanosecond(0))
                .unwrap_or(ts),
            Resolution::Day => ts
                .with_hour(0)
                .and_then(|t| t.with_minute(0))
                .and_then(|t| t.with_second(0))
                .and_then(|t| t.with_nanosecond(0))
                .unwrap_or(ts),
        }
    }

    pub fn window(self) -> Duration {
        match self {
            Resolution::TwoMin => Duration::minutes(2),
            Resolution::TenMin => Duration::minutes(10),
            Resolution::Hour => Duration::hours(1),
            Resolution::Day => Duration::days(1),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Resolution::TwoMin => "2min",
            Resolution::TenMin => "10min",
            Resolution::Hour => "hour",
            Resolution::Day => "day",
        };
        f.write_str(s)
    }
}

fn floor_minutes(ts: DateTime<Utc>, step: u32) -> DateTime<Utc> {
    let floored_minute = (ts.minute() / step) * step;
    ts.with_minute(floored_minute)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

/// One rollup row: unique per `(resolution, timestamp, var_id)`, mirroring
/// the original's `unique_together = (timestamp, var_id)` constraint scoped
/// per table.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketRow {
    pub resolution: Resolution,
    pub timestamp: DateTime<Utc>,
    pub var_id: String,
    pub client_id: String,
    pub group_id: String,
    pub value: Option<f64>,
    pub value_type: String,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub avg_value: Option<f64>,
    pub sum_value: Option<f64>,
    pub count: Option<i64>,
}

type BucketKey = (Resolution, DateTime<Utc>, String);

/// In-memory stand-in for the original's four Django tables. Upserts replace
/// the row at `(resolution, timestamp, var_id)` wholesale, matching
/// `update_or_create`'s all-fields-from-defaults semantics.
#[derive(Debug, Default)]
pub struct BucketStore {
    rows: DashMap<BucketKey, BucketRow>,
}

impl BucketStore {
    pub fn new() -> Self {
        Self { rows: DashMap::new() }
    }

    /// Upserts by `(resolution, timestamp, var_id)`. Idempotent: upserting
    /// the same row twice leaves the store in the same state.
    pub fn upsert(&self, row: BucketRow) {
        let key = (row.resolution, row.timestamp, row.var_id.clone());
        self.rows.insert(key, row);
    }

    pub fn get(&self, resolution: Resolution, timestamp: DateTime<Utc>, var_id: &str) -> Option<BucketRow> {
        self.rows.get(&(resolution, timestamp, var_id.to_string())).map(|e| e.value().clone())
    }

    /// Rows of `resolution` with `start <= timestamp < end`, the half-open
    /// window every rollup query in the original backend uses.
    pub fn rows_in_range(&self, resolution: Resolution, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<BucketRow> {
        self.rows
            .iter()
            .filter(|e| e.key().0 == resolution && e.key().1 >= start && e.key().1 < end)
            .map(|e| e.value().clone())
            .collect()
    }

    pub fn all_rows(&self) -> Vec<BucketRow> {
        self.rows.iter().map(|e| e.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_rounds_down_to_resolution_boundary() {
        let ts = "2026-01-01T12:37:45Z".parse::<DateTime<Utc>>().expect("parse");
        assert_eq!(Resolution::TwoMin.floor(ts).minute(), 36);
        assert_eq!(Resolution::TenMin.floor(ts).minute(), 30);
        assert_eq!(Resolution::Hour.floor(ts).minute(), 0);
        assert_eq!(Resolution::Day.floor(ts).hour(), 0);
    }

    #[test]
    fn upsert_replaces_existing_row_for_same_key() {
        let store = BucketStore::new();
        let ts = "2026-01-01T12:36:00Z".parse::<DateTime<Utc>>().expect("parse");
        let row = |value: f64| BucketRow {
            resolution: Resolution::TwoMin,
            timestamp: ts,
            var_id: "temp".into(),
            client_id: "plc-1".into(),
            group_id: "0".into(),
            value: Some(value),
            value_type: "float".into(),
            min_value: Some(value),
            max_value: Some(value),
            avg_value: Some(value),
            sum_value: Some(value),
            count: Some(1),
        };
        store.upsert(row(1.0));
        store.upsert(row(2.0));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(Resolution::TwoMin, ts, "temp").unwrap().value, Some(2.0));
    }
}
