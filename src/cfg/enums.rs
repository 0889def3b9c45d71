// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use core::fmt;

use serde::{Deserialize, Serialize};

/// Checksum algorithm selection for MCU serial frames.
///
/// Mirrors the algorithm table the original backend exposes through
/// `utils.protocol.checksum`; `Sum` is the wire default used by most
/// command families, the rest cover legacy devices and firmware variants.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumKind {
    #[default]
    #[serde(rename = "sum", alias = "SUM", alias = "checksum_sum")]
    Sum,
    #[serde(rename = "lrc", alias = "LRC")]
    Lrc,
    #[serde(rename = "crc16_modbus", alias = "CRC16_MODBUS")]
    Crc16Modbus,
    #[serde(rename = "crc16_ccitt", alias = "CRC16_CCITT")]
    Crc16Ccitt,
    #[serde(rename = "crc32", alias = "CRC32")]
    Crc32,
    #[serde(rename = "adler32", alias = "ADLER32")]
    Adler32,
    #[serde(rename = "xor", alias = "XOR")]
    Xor,
}
impl fmt::Display for ChecksumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChecksumKind::Sum => "sum",
            ChecksumKind::Lrc => "lrc",
            ChecksumKind::Crc16Modbus => "crc16_modbus",
            ChecksumKind::Crc16Ccitt => "crc16_ccitt",
            ChecksumKind::Crc32 => "crc32",
            ChecksumKind::Adler32 => "adler32",
            ChecksumKind::Xor => "xor",
        })
    }
}

/// Log sink selection.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogOutput {
    #[default]
    #[serde(rename = "stdout", alias = "STDOUT")]
    Stdout,
    #[serde(rename = "file", alias = "FILE")]
    File,
}

/// PLC `SYSTEM STATUS` nibble decoded from the XGT header's `PLC_Info` word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemStatus {
    Run,
    Stop,
    Error,
    Debug,
    Unknown(u8),
}
impl fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemStatus::Run => f.write_str("RUN"),
            SystemStatus::Stop => f.write_str("STOP"),
            SystemStatus::Error => f.write_str("ERROR"),
            SystemStatus::Debug => f.write_str("DEBUG"),
            SystemStatus::Unknown(v) => write!(f, "Unknown({v:#x})"),
        }
    }
}
impl From<u8> for SystemStatus {
    fn from(nibble: u8) -> Self {
        match nibble {
            0x01 => SystemStatus::Run,
            0x02 => SystemStatus::Stop,
            0x04 => SystemStatus::Error,
            0x08 => SystemStatus::Debug,
            other => SystemStatus::Unknown(other),
        }
    }
}

/// DI threshold selector (0/1/2 -> 18V/24V/39V) used by MCU digital-input
/// configuration commands.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiThreshold {
    #[serde(rename = "18v", alias = "0")]
    Volts18,
    #[serde(rename = "24v", alias = "1")]
    Volts24,
    #[serde(rename = "39v", alias = "2")]
    Volts39,
}
impl DiThreshold {
    pub fn wire_code(self) -> u8 {
        match self {
            DiThreshold::Volts18 => 0,
            DiThreshold::Volts24 => 1,
            DiThreshold::Volts39 => 2,
        }
    }
}
impl TryFrom<u8> for DiThreshold {
    type Error = ();
    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(DiThreshold::Volts18),
            1 => Ok(DiThreshold::Volts24),
            2 => Ok(DiThreshold::Volts39),
            _ => Err(()),
        }
    }
}
