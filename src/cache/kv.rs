// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::error::ValidationError;

/// A single scalar value read off a PLC/MCU variable, tagged with the
/// classification it would carry once it reaches a bucket row.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl SampleValue {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            SampleValue::Bool(b) => serde_json::Value::Bool(*b),
            SampleValue::Int(i) => serde_json::Value::from(*i),
            SampleValue::Float(f) => {
                serde_json::Number::from_f64(*f).map(serde_json::Value::Number).unwrap_or(serde_json::Value::Null)
            }
            SampleValue::Str(s) => serde_json::Value::String(s.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sample {
    pub value: SampleValue,
    pub updated_at: DateTime<Utc>,
}

/// Splits a `client_id:var_id` key. The original backend never nests more
/// than one colon in a cache key; anything else is a caller bug.
fn split_key(key: &str) -> Option<(&str, &str)> {
    key.split_once(':')
}

/// Process-wide latest-sample cache. One entry per `client_id:var_id`; a
/// later `set()` for the same key replaces the prior value outright, mirroring
/// the original Redis instance's behavior (no history, no TTL).
#[derive(Debug, Default)]
pub struct KvCache {
    entries: DashMap<String, Sample>,
}

impl KvCache {
    pub fn new() -> Self {
        Self { entries: DashMap::new() }
    }

    pub fn set(&self, client_id: &str, var_id: &str, value: SampleValue) {
        let key = format!("{client_id}:{var_id}");
        self.entries.insert(key, Sample { value, updated_at: Utc::now() });
    }

    pub fn get(&self, client_id: &str, var_id: &str) -> Option<Sample> {
        let key = format!("{client_id}:{var_id}");
        self.entries.get(&key).map(|entry| entry.value().clone())
    }

    /// Scans the cache. Only the wildcard `*:*` (every key) is supported,
    /// matching the single scan pattern the original backend ever issues.
    pub fn scan(&self, pattern: &str) -> Result<Vec<(String, Sample)>, ValidationError> {
        if pattern != "*:*" {
            return Err(ValidationError::Other(format!(
                "unsupported scan pattern {pattern:?}, only \"*:*\" is supported"
            )));
        }
        Ok(self
            .entries
            .iter()
            .filter(|entry| split_key(entry.key()).is_some())
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
