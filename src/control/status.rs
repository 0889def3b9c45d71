// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! `SocketClientStatus`/`SocketClientLog`: the latest known status per
//! socket client plus an append-only transition log, ported from
//! `original_source/LSISsocket/models.py::SocketClientStatus.save()`. The
//! original detects a change by comparing `error_code` and a sorted-JSON
//! string of `detailedStatus` so key-order differences don't cause a false
//! transition; `serde_json::Value` already serializes object keys in sorted
//! order (this crate doesn't enable `preserve_order`), so a plain
//! `to_string()` comparison reproduces that.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct SocketClientStatus {
    pub config_name: String,
    pub updated_at: DateTime<Utc>,
    pub detailed_status: Value,
    pub error_code: i32,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct SocketClientLog {
    pub config_name: String,
    pub detailed_status: Value,
    pub created_at: DateTime<Utc>,
    pub message: String,
    pub error_code: Option<i32>,
}

fn system_status(detailed: &Value) -> &str {
    detailed.get("SYSTEM STATUS").and_then(Value::as_str).unwrap_or("")
}

/// Latest status per config plus its transition log. One entry per
/// `config_name`, mirroring the FK from `SocketClientStatus` to
/// `SocketClientConfig`.
#[derive(Debug, Default)]
pub struct StatusStore {
    latest: DashMap<String, SocketClientStatus>,
    log: DashMap<String, Vec<SocketClientLog>>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self { latest: DashMap::new(), log: DashMap::new() }
    }

    /// Records a new observed status for `config_name`. Returns `true` if
    /// this changed the stored status (and so appended a log row): either
    /// there was no prior status, `error_code` differs, or the normalized
    /// `detailed_status` JSON differs.
    pub fn record(&self, config_name: &str, detailed_status: Value, error_code: i32) -> bool {
        let prior = self.latest.get(config_name).map(|e| e.value().clone());

        let changed = match &prior {
            None => true,
            Some(old) => {
                old.error_code != error_code || serde_json::to_string(&old.detailed_status) != serde_json::to_string(&detailed_status)
            }
        };

        let now = Utc::now();
        let message = match &prior {
            Some(old) => format!("{} -> {}", system_status(&old.detailed_status), system_status(&detailed_status)),
            None => format!("-> {}", system_status(&detailed_status)),
        };

        self.latest.insert(
            config_name.to_string(),
            SocketClientStatus {
                config_name: config_name.to_string(),
                updated_at: now,
                detailed_status: detailed_status.clone(),
                error_code,
                message: message.clone(),
            },
        );

        if changed {
            self.log.entry(config_name.to_string()).or_default().push(SocketClientLog {
                config_name: config_name.to_string(),
                detailed_status,
                created_at: now,
                message,
                error_code: Some(error_code),
            });
        }
        changed
    }

    pub fn latest(&self, config_name: &str) -> Option<SocketClientStatus> {
        self.latest.get(config_name).map(|e| e.value().clone())
    }

    pub fn log_for(&self, config_name: &str) -> Vec<SocketClientLog> {
        self.log.get(config_name).map(|e| e.value().clone()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn first_observation_is_always_a_change() {
        let store = StatusStore::new();
        let changed = store.record("plc-1", json!({"SYSTEM STATUS": "RUN"}), 0);
        assert!(changed);
        assert_eq!(store.log_for("plc-1").len(), 1);
    }

    #[test]
    fn identical_detailed_status_with_reordered_keys_is_not_a_change() {
        let store = StatusStore::new();
        store.record("plc-1", json!({"SYSTEM STATUS": "RUN", "ERROR": null}), 0);
        let changed = store.record("plc-1", json!({"ERROR": null, "SYSTEM STATUS": "RUN"}), 0);
        assert!(!changed);
        assert_eq!(store.log_for("plc-1").len(), 1);
    }

    #[test]
    fn status_transition_message_uses_system_status_field() {
        let store = StatusStore::new();
        store.record("plc-1", json!({"SYSTEM STATUS": "STOP"}), 0);
        store.record("plc-1", json!({"SYSTEM STATUS": "RUN"}), 0);
        let log = store.log_for("plc-1");
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].message, "STOP -> RUN");
    }

    #[test]
    fn error_code_change_alone_is_a_change() {
        let store = StatusStore::new();
        store.record("plc-1", json!({"SYSTEM STATUS": "RUN"}), 0);
        let changed = store.record("plc-1", json!({"SYSTEM STATUS": "RUN"}), 7);
        assert!(changed);
    }
}
