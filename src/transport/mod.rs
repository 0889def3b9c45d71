// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Transport connectors (TCP for LSIS XGT, serial for MCU) and the shared
//! transaction-manager state machine that drives request/reply pairing over
//! either.

pub mod common;
pub mod serial;
pub mod tcp;
pub mod transaction;

pub use tcp::XgtConnection;
pub use transaction::{TransactionState, TransactionError};
