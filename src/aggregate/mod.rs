// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Time-bucketed rollups over the [`KvCache`](crate::cache::KvCache),
//! ported from `original_source/data_entry/service.py`: a 2-minute staging
//! pass that drains the cache into bucket rows, then 10-minute/hourly/daily
//! rollups that fold lower-resolution rows upward.

pub mod backfill;
pub mod bucket;
pub mod classify;
pub mod rollup;
pub mod staging;

pub use bucket::{BucketRow, BucketStore, Resolution};
pub use classify::{classify_value, ValueKind};
pub use rollup::{rollup_to_daily, rollup_to_hourly, rollup_to_ten_minute};
pub use staging::stage_two_minute;
