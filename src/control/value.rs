// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! `ControlValue`/`ControlValueHistory`: one control command's lifecycle and
//! the append-only history of its status transitions, ported from
//! `original_source/LSISsocket/models.py::ControlValue`/`ControlValueHistory`.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;

use crate::error::ConsistencyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    Pending,
    Sent,
    Acknowledged,
    Completed,
    Failed,
}

impl fmt::Display for ControlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ControlState::Pending => "pending",
            ControlState::Sent => "sent",
            ControlState::Acknowledged => "acknowledged",
            ControlState::Completed => "completed",
            ControlState::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct ControlValue {
    pub id: u64,
    pub control_user: Option<String>,
    pub status: ControlState,
    pub command_name: String,
    pub target: String,
    pub data_type: String,
    pub value: Value,
    pub control_at: Option<DateTime<Utc>>,
    pub env_data: Option<Value>,
    pub response: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ControlValueHistory {
    pub control_value_id: u64,
    pub status: ControlState,
    pub command_name: String,
    pub target: String,
    pub data_type: String,
    pub value: Value,
    pub control_at: Option<DateTime<Utc>>,
    pub env_data: Option<Value>,
    pub response: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl From<&ControlValue> for ControlValueHistory {
    fn from(cv: &ControlValue) -> Self {
        ControlValueHistory {
            control_value_id: cv.id,
            status: cv.status,
            command_name: cv.command_name.clone(),
            target: cv.target.clone(),
            data_type: cv.data_type.clone(),
            value: cv.value.clone(),
            control_at: cv.control_at,
            env_data: cv.env_data.clone(),
            response: cv.response.clone(),
            created_at: cv.updated_at,
        }
    }
}

/// Holds live `ControlValue` rows plus their append-only history. A status
/// transition snapshots the row's current state into history *before*
/// mutating it, so the history always records the state that was actually
/// superseded rather than the one being written.
#[derive(Debug, Default)]
pub struct ControlValueStore {
    values: DashMap<u64, ControlValue>,
    history: DashMap<u64, Vec<ControlValueHistory>>,
    next_id: AtomicU64,
}

impl ControlValueStore {
    pub fn new() -> Self {
        Self { values: DashMap::new(), history: DashMap::new(), next_id: AtomicU64::new(1) }
    }

    pub fn create(
        &self,
        control_user: Option<String>,
        command_name: String,
        target: String,
        data_type: String,
        value: Value,
        control_at: Option<DateTime<Utc>>,
        env_data: Option<Value>,
    ) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let now = Utc::now();
        let row = ControlValue {
            id,
            control_user,
            status: ControlState::Pending,
            command_name,
            target,
            data_type,
            value,
            control_at,
            env_data,
            response: None,
            created_at: now,
            updated_at: now,
        };
        self.values.insert(id, row);
        id
    }

    pub fn get(&self, id: u64) -> Option<ControlValue> {
        self.values.get(&id).map(|e| e.value().clone())
    }

    /// Advances `id` to `new_status`, recording the pre-mutation snapshot in
    /// history first. Returns `MissingPriorStatus` if `id` is unknown.
    pub fn advance_status(
        &self,
        id: u64,
        new_status: ControlState,
        response: Option<Value>,
    ) -> Result<(), ConsistencyError> {
        let mut entry = self
            .values
            .get_mut(&id)
            .ok_or_else(|| ConsistencyError::MissingPriorStatus(id.to_string()))?;

        let snapshot = ControlValueHistory::from(&*entry);
        self.history.entry(id).or_default().push(snapshot);

        entry.status = new_status;
        if let Some(resp) = response {
            entry.response = Some(resp);
        }
        entry.updated_at = Utc::now();
        Ok(())
    }

    pub fn history_for(&self, id: u64) -> Vec<ControlValueHistory> {
        self.history.get(&id).map(|e| e.value().clone()).unwrap_or_default()
    }
}
