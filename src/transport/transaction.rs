// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The transaction lifecycle shared by every request sent over
//! [`crate::transport::tcp::XgtConnection`] or
//! [`crate::transport::serial::McuConnection`].
//!
//! State names are taken verbatim from the original backend's
//! `LSIS_TransactionState` so operator-facing logs read the same way.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Idle,
    Sending,
    WaitingForReply,
    WaitingTurnaroundDelay,
    ProcessingReply,
    ProcessingError,
    Complete,
    Retrying,
    NoResponse,
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransactionState::Idle => "IDLE",
            TransactionState::Sending => "SENDING",
            TransactionState::WaitingForReply => "WAITING_FOR_REPLY",
            TransactionState::WaitingTurnaroundDelay => "WAITING_TURNAROUND_DELAY",
            TransactionState::ProcessingReply => "PROCESSING_REPLY",
            TransactionState::ProcessingError => "PROCESSING_ERROR",
            TransactionState::Complete => "TRANSACTION_COMPLETE",
            TransactionState::Retrying => "RETRYING TRANSACTION",
            TransactionState::NoResponse => "NO_RESPONSE_STATE",
        })
    }
}

#[derive(Debug, Error)]
pub enum TransactionError {
    #[error(transparent)]
    Framing(#[from] crate::error::FramingError),
    #[error(transparent)]
    Protocol(#[from] crate::error::ProtocolError),
    #[error(transparent)]
    Timeout(#[from] crate::error::TimeoutError),
    #[error(transparent)]
    Connection(#[from] crate::error::ConnectionError),
}

/// A minimal transition record used to trace state changes in logs; the
/// drive loop itself lives in `transport::tcp`/`transport::serial` since
/// each transport frames and dispatches replies differently.
#[derive(Debug, Clone, Copy)]
pub struct TransactionTrace {
    pub from: TransactionState,
    pub to: TransactionState,
}

impl fmt::Display for TransactionTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}
