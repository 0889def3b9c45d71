// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Cron-triggered job wiring on top of `tokio-cron-scheduler`, ported from
//! `original_source/main.py`'s APScheduler job registration
//! (`redis_to_db`/`aggregate_2min_to_10min`/`aggregate_to_1hour`/
//! `aggregate_to_daily` plus per-client polling jobs).

pub mod jobs;

pub use jobs::{cron, PollJob, SchedulerHandle};
