// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Value classification, ported from
//! `original_source/data_entry/service.py::_classify_value`: any value read
//! off the cache is labeled and, where it carries a numeric reading,
//! reduced to an `f64` for aggregation.

use std::fmt;

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    Str,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Str => "str",
        };
        f.write_str(s)
    }
}

/// Classifies a value, returning `(kind, numeric)` where `numeric` is
/// `Some` whenever the value reduces to a number (bool -> 0.0/1.0, int/float
/// pass through, numeric strings are parsed, `"true"`/`"false"` strings are
/// treated as bool). A JSON-encoded string is decoded and reclassified
/// recursively, exactly as the original backend does for values some writer
/// serialized into a string.
pub fn classify_value(value: &Value) -> (ValueKind, Option<f64>) {
    match value {
        Value::Null => (ValueKind::Null, None),
        Value::Bool(b) => (ValueKind::Bool, Some(if *b { 1.0 } else { 0.0 })),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                (ValueKind::Int, Some(i as f64))
            } else {
                (ValueKind::Float, n.as_f64())
            }
        }
        Value::String(s) => classify_string(s),
        // arrays/objects have no original-backend counterpart; label by kind.
        Value::Array(_) => (ValueKind::Str, None),
        Value::Object(_) => (ValueKind::Str, None),
    }
}

fn classify_string(raw: &str) -> (ValueKind, Option<f64>) {
    let s = raw.trim();
    let low = s.to_ascii_lowercase();
    if low == "true" || low == "false" {
        return (ValueKind::Bool, Some(if low == "true" { 1.0 } else { 0.0 }));
    }
    if !s.contains('.') && !low.contains('e') {
        if let Ok(i) = s.parse::<i64>() {
            return (ValueKind::Int, Some(i as f64));
        }
    }
    if let Ok(f) = s.parse::<f64>() {
        return (ValueKind::Float, Some(f));
    }
    if let Ok(parsed) = serde_json::from_str::<Value>(raw) {
        if !parsed.is_string() {
            return classify_value(&parsed);
        }
    }
    (ValueKind::Str, None)
}
