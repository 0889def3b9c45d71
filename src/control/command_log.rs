// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! `SocketClientCommand`: an append-only log of raw command dispatches,
//! distinct from [`ControlValueHistory`](crate::control::ControlValueHistory)
//! — one row per wire-level send/response pair rather than per logical
//! control-value lifecycle. Ported from
//! `original_source/LSISsocket/models.py::SocketClientCommand`.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;

#[derive(Debug, Clone)]
pub struct SocketClientCommand {
    pub id: u64,
    pub config_name: String,
    pub user: Option<String>,
    pub command: String,
    pub value: Option<String>,
    pub control_time: DateTime<Utc>,
    /// Hex-encoded wire bytes sent, per spec.md §4.9 ("payload bytes (hex)").
    pub payload: Option<String>,
    /// Hex-encoded wire bytes received ("response bytes (hex)").
    pub response: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Default)]
pub struct CommandLogStore {
    rows: DashMap<u64, SocketClientCommand>,
    next_id: AtomicU64,
}

impl CommandLogStore {
    pub fn new() -> Self {
        Self { rows: DashMap::new(), next_id: AtomicU64::new(1) }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &self,
        config_name: &str,
        user: Option<String>,
        command: String,
        value: Option<String>,
        payload: Option<&[u8]>,
        response: Option<&[u8]>,
        message: Option<String>,
    ) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.rows.insert(
            id,
            SocketClientCommand {
                id,
                config_name: config_name.to_string(),
                user,
                command,
                value,
                control_time: Utc::now(),
                payload: payload.map(hex::encode),
                response: response.map(hex::encode),
                message,
            },
        );
        id
    }

    pub fn for_config(&self, config_name: &str) -> Vec<SocketClientCommand> {
        let mut rows: Vec<_> = self.rows.iter().filter(|e| e.config_name == config_name).map(|e| e.value().clone()).collect();
        rows.sort_by_key(|r| r.id);
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_are_append_only_and_scoped_per_config() {
        let store = CommandLogStore::new();
        store.record("plc-1", None, "set_do".into(), Some("1".into()), None, None, None);
        store.record("plc-2", None, "set_do".into(), Some("0".into()), None, None, None);
        store.record("plc-1", None, "set_do".into(), Some("0".into()), None, None, None);

        let rows = store.for_config("plc-1");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].value.as_deref(), Some("1"));
        assert_eq!(rows[1].value.as_deref(), Some("0"));
    }

    #[test]
    fn payload_and_response_are_hex_encoded() {
        let store = CommandLogStore::new();
        let id = store.record(
            "plc-1",
            None,
            "do_write".into(),
            None,
            Some(&[0x03, 0x01]),
            Some(&[0x24]),
            None,
        );
        let row = store.for_config("plc-1").into_iter().find(|r| r.id == id).expect("row present");
        assert_eq!(row.payload.as_deref(), Some("0301"));
        assert_eq!(row.response.as_deref(), Some("24"));
    }
}
