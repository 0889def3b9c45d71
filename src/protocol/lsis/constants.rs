// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Wire constants for the LSIS XGT `FEnet` protocol, ported from the
//! original backend's `utils.protocol.LSIS.constants`.

/// The 8-byte company identifier every frame opens with.
pub const COMPANY_ID: &[u8; 8] = b"LSIS-XGT";

/// `sorce_of_Frame` values (the field is misspelled on the wire and in the
/// original implementation; kept as the device actually sends it).
pub const SOURCE_REQUEST: u8 = 0x33;
pub const SOURCE_RESPONSE: u8 = 0x11;
pub const SOURCE_SYSTEM: u8 = 0x22;

/// Header length in bytes: company_id(8) + PLC_info(2) + CPU_info(1) +
/// source_of_frame(1) + invoke_id(2) + length(2) + fenet_position(1) +
/// bcc(1) + reserved(2) = 20.
pub const HEADER_LEN: usize = 20;

/// Default TCP port for XGT `FEnet` servers.
pub const TCP_PORT: u16 = 2004;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
/// Default number of retries on a failed transaction.
pub const DEFAULT_RETRIES: u8 = 3;
/// Backoff multiplier base applied between retries.
pub const DEFAULT_BACKOFF: f64 = 0.3;
/// Base reconnect delay in milliseconds.
pub const RECONNECT_DELAY_MS: u64 = 100;
/// Ceiling on exponential reconnect backoff, 5 minutes.
pub const RECONNECT_DELAY_MAX_MS: u64 = 300_000;

/// `0xFFFF` is the wire sentinel for "request failed" in the length field.
pub const ERROR_LENGTH_SENTINEL: u16 = 0xFFFF;

/// Single-data-type codes used by continuous read/write instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingleDataType {
    Bit = 0,
    Byte = 1,
    Word = 2,
    Dword = 3,
    Lword = 4,
}

impl SingleDataType {
    pub fn from_code(code: u16) -> Option<Self> {
        Some(match code {
            0 => Self::Bit,
            1 => Self::Byte,
            2 => Self::Word,
            3 => Self::Dword,
            4 => Self::Lword,
            _ => return None,
        })
    }

    pub fn byte_len(self) -> usize {
        match self {
            SingleDataType::Bit => 1,
            SingleDataType::Byte => 1,
            SingleDataType::Word => 2,
            SingleDataType::Dword => 4,
            SingleDataType::Lword => 8,
        }
    }
}
