// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The 20-byte XGT `FEnet` application header.
//!
//! Field layout (all multi-byte integers little-endian, matching the
//! original backend's `struct.pack("<...")` format strings):
//!
//! ```text
//! offset  len  field
//! 0       8    company_id ("LSIS-XGT")
//! 8       2    plc_info
//! 10      1    cpu_info
//! 11      1    source_of_frame
//! 12      2    invoke_id
//! 14      2    length            <- canonical; a stray doc comment in the
//!                                   original implementation claims
//!                                   invoke_id is a single byte, which would
//!                                   shift this field to 17-18. The device
//!                                   firmware uses the 2-byte invoke_id /
//!                                   14-15 layout; treat offset 17-18 as
//!                                   legacy-buggy-reader-only.
//! 16      1    fenet_position
//! 17      1    bcc
//! 18      2    reserved
//! ```

use crate::{error::FramingError, protocol::lsis::constants};

pub const HEADER_LEN: usize = constants::HEADER_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XgtHeader {
    pub plc_info: u16,
    pub cpu_info: u8,
    pub source_of_frame: u8,
    pub invoke_id: u16,
    pub length: u16,
    pub fenet_position: u8,
    pub bcc: u8,
}

impl Default for XgtHeader {
    fn default() -> Self {
        Self {
            plc_info: 0,
            cpu_info: 0xA4,
            source_of_frame: constants::SOURCE_REQUEST,
            invoke_id: 0,
            length: 0,
            fenet_position: 0,
            bcc: 0,
        }
    }
}

impl XgtHeader {
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..8].copy_from_slice(constants::COMPANY_ID);
        buf[8..10].copy_from_slice(&self.plc_info.to_le_bytes());
        buf[10] = self.cpu_info;
        buf[11] = self.source_of_frame;
        buf[12..14].copy_from_slice(&self.invoke_id.to_le_bytes());
        buf[14..16].copy_from_slice(&self.length.to_le_bytes());
        buf[16] = self.fenet_position;
        buf[17] = self.bcc;
        // buf[18..20] stays reserved/zero.
        buf
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, FramingError> {
        if data.len() < HEADER_LEN {
            return Err(FramingError::TooShort { got: data.len(), need: HEADER_LEN });
        }
        if &data[0..8] != constants::COMPANY_ID.as_slice() {
            return Err(FramingError::BadCompanyId {
                expected: "LSIS-XGT",
                got: data[0..8].to_vec(),
            });
        }
        let plc_info = u16::from_le_bytes([data[8], data[9]]);
        let cpu_info = data[10];
        let source_of_frame = data[11];
        let invoke_id = u16::from_le_bytes([data[12], data[13]]);
        let length = u16::from_le_bytes([data[14], data[15]]);
        let fenet_position = data[16];
        let bcc = data[17];
        Ok(Self {
            plc_info,
            cpu_info,
            source_of_frame,
            invoke_id,
            length,
            fenet_position,
            bcc,
        })
    }

    pub fn is_error_length(&self) -> bool {
        self.length == constants::ERROR_LENGTH_SENTINEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_header() {
        let h = XgtHeader {
            plc_info: 0x1234,
            cpu_info: 0xA4,
            source_of_frame: constants::SOURCE_REQUEST,
            invoke_id: 7,
            length: 12,
            fenet_position: 0,
            bcc: 0,
        };
        let bytes = h.to_bytes();
        assert_eq!(bytes.len(), HEADER_LEN);
        let parsed = XgtHeader::from_bytes(&bytes).expect("decode");
        assert_eq!(parsed, h);
    }

    #[test]
    fn rejects_short_buffer() {
        let err = XgtHeader::from_bytes(&[0u8; 4]).unwrap_err();
        assert!(matches!(err, FramingError::TooShort { .. }));
    }

    #[test]
    fn rejects_bad_company_id() {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..8].copy_from_slice(b"NOT-LSIS");
        let err = XgtHeader::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, FramingError::BadCompanyId { .. }));
    }
}
