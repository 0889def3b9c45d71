// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The error taxonomy shared by every protocol, transport, and aggregation
//! module: validation failures (bad config/address), framing failures
//! (malformed wire bytes), protocol failures (device rejected a request),
//! timeouts, connection failures, and consistency failures (aggregation
//! invariants broken).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("value {value} out of range [{min}, {max}]")]
    OutOfRange { value: f64, min: f64, max: f64 },
    #[error("unknown data type {0:?}")]
    UnknownDataType(String),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum FramingError {
    #[error("frame too short: got {got} bytes, need at least {need}")]
    TooShort { got: usize, need: usize },
    #[error("bad company id: expected {expected:?}, got {got:?}")]
    BadCompanyId { expected: &'static str, got: Vec<u8> },
    #[error("checksum mismatch: expected {expected:#x}, computed {computed:#x}")]
    ChecksumMismatch { expected: u32, computed: u32 },
    #[error("no start byte found within {scanned} bytes")]
    NoStartByte { scanned: usize },
    #[error("frame exceeds max packet size: {len} > {max}")]
    TooLong { len: usize, max: usize },
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("device returned error status {code:#x}: {detail}")]
    DeviceError { code: u16, detail: String },
    #[error("unexpected invoke id in reply: expected {expected}, got {got}")]
    InvokeIdMismatch { expected: u16, got: u16 },
    #[error("node select rejected for node {}", hex::encode_upper(node))]
    NodeSelectRejected { node: [u8; 8] },
    #[error("unsupported command code {0:#x}")]
    UnsupportedCommand(u16),
}

#[derive(Debug, Error)]
pub enum TimeoutError {
    #[error("timed out waiting {0:?} for a reply")]
    WaitingForReply(std::time::Duration),
    #[error("timed out connecting after {0:?}")]
    Connecting(std::time::Duration),
}

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("connection to {endpoint} closed unexpectedly after {bytes_read} bytes")]
    AbruptClose { endpoint: String, bytes_read: usize },
    #[error("not connected to {0}")]
    NotConnected(String),
    #[error("io error talking to {endpoint}: {source}")]
    Io {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConsistencyError {
    #[error("duplicate bucket row for (timestamp={timestamp}, var_id={var_id})")]
    DuplicateBucketRow { timestamp: String, var_id: i64 },
    #[error("status transition observed with no prior status for client {0}")]
    MissingPriorStatus(String),
    #[error("aggregation source window empty for var_id={0}")]
    EmptySourceWindow(i64),
}
