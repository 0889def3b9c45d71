// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Process-wide latest-value cache, keyed `client_id:var_id`. Stands in for
//! the original backend's Redis instance (see
//! `original_source/data_entry/service.py`'s `redis_instance.set`/
//! `query_scan('*:*')` calls): same key shape, same "last write wins, no
//! history" semantics, no TTL.

pub mod kv;

pub use kv::{KvCache, Sample, SampleValue};
