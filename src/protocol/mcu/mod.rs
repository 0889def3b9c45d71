// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! MCU serial frame codec: start-byte-framed PDUs with a selectable trailing
//! checksum.

pub mod checksum;
pub mod pdu;

pub use pdu::{FirmwareChunk, McuFrame, McuRequest, McuResponse};
