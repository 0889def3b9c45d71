// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Decodes the `PLC_Info`/`CPU_Info` header words into a human-readable
//! device status, mirroring `utilities.interpretation` in the original
//! backend.

use serde::Serialize;

use crate::cfg::enums::SystemStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuType {
    XgkXgiXgrCpuH,
    XgkXgiCpuS,
    XgkCpuA,
    XgkXgiCpuE,
    XgkXgiCpuU,
    XgkCpuHn,
    Unknown(u8),
}

impl CpuType {
    fn from_nibble(v: u8) -> Self {
        match v {
            0x01 => Self::XgkXgiXgrCpuH,
            0x02 => Self::XgkXgiCpuS,
            0x03 => Self::XgkCpuA,
            0x04 => Self::XgkXgiCpuE,
            0x05 => Self::XgkXgiCpuU,
            0x11 => Self::XgkCpuHn,
            other => Self::Unknown(other),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CpuType::XgkXgiXgrCpuH => "XGK/I/R-CPUH",
            CpuType::XgkXgiCpuS => "XGK/I-CPUS",
            CpuType::XgkCpuA => "XGK-CPUA",
            CpuType::XgkXgiCpuE => "XGK/I-CPUE",
            CpuType::XgkXgiCpuU => "XGK/I-CPUU",
            CpuType::XgkCpuHn => "XGK-CPUHN",
            CpuType::Unknown(_) => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuInfo {
    Xgk,
    XgbMk,
    Xgi,
    XgbIec,
    Xgr,
    Unknown(u8),
}

impl CpuInfo {
    fn from_byte(v: u8) -> Self {
        match v {
            0xA0 => Self::Xgk,
            0xB0 => Self::XgbMk,
            0xA4 => Self::Xgi,
            0xB4 => Self::XgbIec,
            0xA8 => Self::Xgr,
            other => Self::Unknown(other),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CpuInfo::Xgk => "XGK",
            CpuInfo::XgbMk => "XGB(MK)",
            CpuInfo::Xgi => "XGI",
            CpuInfo::XgbIec => "XGB(IEC)",
            CpuInfo::Xgr => "XGR",
            CpuInfo::Unknown(_) => "Unknown",
        }
    }
}

/// Human-readable device status decoded from a PDU header plus the
/// instruction block's error status word.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceStatus {
    #[serde(skip)]
    pub cpu_type: CpuType,
    pub cpu_type_label: String,
    /// `true` when the PLC is configured as a redundant (dual) pair.
    pub is_redundant: bool,
    /// `true` when the CPU reports a fault condition.
    pub cpu_fault: bool,
    #[serde(skip)]
    pub system_status: SystemStatus,
    pub system_status_label: String,
    #[serde(skip)]
    pub cpu_info: CpuInfo,
    pub cpu_info_label: String,
    pub error_code: u16,
}

/// Decodes `plc_info` (the header's 16-bit PLC status word), `cpu_info` (the
/// header's 8-bit CPU info byte), and the instruction block's error status
/// into a `DeviceStatus`.
pub fn interpretation(plc_info: u16, cpu_info: u8, error_status: u16) -> DeviceStatus {
    let cpu_type_nibble = (plc_info & 0x1F) as u8;
    let composition_bit = ((plc_info >> 5) & 0x1) as u8;
    let cpu_status_bit = ((plc_info >> 6) & 0x1) as u8;
    let system_status_nibble = ((plc_info >> 8) & 0x0F) as u8;

    let cpu_type = CpuType::from_nibble(cpu_type_nibble);
    let system_status = SystemStatus::from(system_status_nibble);
    let cpu_info_decoded = CpuInfo::from_byte(cpu_info);

    DeviceStatus {
        cpu_type,
        cpu_type_label: cpu_type.label().to_string(),
        is_redundant: composition_bit == 1,
        cpu_fault: cpu_status_bit == 1,
        system_status,
        system_status_label: system_status.to_string(),
        cpu_info: cpu_info_decoded,
        cpu_info_label: cpu_info_decoded.label().to_string(),
        error_code: error_status,
    }
}
