// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! MCU serial PDU: `start_byte | command | data_len | data | checksum`.
//! Ported from `utils.protocol.MCU.pdu.DE_MCU_PDU` and the command table in
//! `utils.protocol.MCU.config`.

use crate::{cfg::enums::ChecksumKind, error::FramingError, protocol::mcu::checksum};

/// Default frame start byte for the MCU link.
pub const START_BYTE: u8 = 0x7E;
/// Upper bound on a single frame's size, guarding the resync scan.
pub const MAX_PACKET_SIZE: usize = 1024;

/// The full DE-MCU command table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McuCommand {
    NodeSelectReq,
    NodeSelectRes,
    DiReadReq,
    DiReadRes,
    DiThresholdWriteReq,
    DiThresholdWriteRes,
    DoReadReq,
    DoReadRes,
    DoWriteReq,
    DoWriteRes,
    DoWriteAllReq,
    DoWriteAllRes,
    DioReadAllReq,
    DioReadAllRes,
    AnalogReadReq,
    AnalogReadRes,
    AnalogReadAllReq,
    AnalogReadAllRes,
    SerialSetupReq,
    SerialSetupRes,
    SerialSetupReadReq,
    SerialSetupReadRes,
    SerialWriteReq,
    SerialWriteRes,
    AccelReadReq,
    AccelReadRes,
    GpsReadReq,
    GpsReadRes,
    FirmwareVersionReadReq,
    FirmwareVersionReadRes,
    FirmwareVersionUpdateReq,
    FirmwareVersionUpdateRes,
    /// Shared "generic ack/nak" response code (0x24) used by several write
    /// commands.
    GenericAck,
}

impl McuCommand {
    pub const fn wire_code(self) -> u8 {
        match self {
            McuCommand::NodeSelectReq => 0x20,
            McuCommand::NodeSelectRes => 0x21,
            McuCommand::DiReadReq => 0x30,
            McuCommand::DiReadRes => 0x40,
            McuCommand::DiThresholdWriteReq => 0x31,
            McuCommand::DiThresholdWriteRes => 0x24,
            McuCommand::DoReadReq => 0x32,
            McuCommand::DoReadRes => 0x41,
            McuCommand::DoWriteReq => 0x33,
            McuCommand::DoWriteRes => 0x24,
            McuCommand::DoWriteAllReq => 0x44,
            McuCommand::DoWriteAllRes => 0x24,
            McuCommand::DioReadAllReq => 0x42,
            McuCommand::DioReadAllRes => 0x43,
            McuCommand::AnalogReadReq => 0x50,
            McuCommand::AnalogReadRes => 0x60,
            McuCommand::AnalogReadAllReq => 0x51,
            McuCommand::AnalogReadAllRes => 0x61,
            McuCommand::SerialSetupReq => 0x70,
            McuCommand::SerialSetupRes => 0x24,
            McuCommand::SerialSetupReadReq => 0x71,
            McuCommand::SerialSetupReadRes => 0x82,
            McuCommand::SerialWriteReq => 0x80,
            McuCommand::SerialWriteRes => 0x81,
            McuCommand::AccelReadReq => 0x90,
            McuCommand::AccelReadRes => 0x91,
            McuCommand::GpsReadReq => 0x92,
            McuCommand::GpsReadRes => 0x93,
            McuCommand::FirmwareVersionReadReq => 0xA0,
            McuCommand::FirmwareVersionReadRes => 0xA1,
            McuCommand::FirmwareVersionUpdateReq => 0xA2,
            McuCommand::FirmwareVersionUpdateRes => 0x24,
            McuCommand::GenericAck => 0x24,
        }
    }

    /// Best-effort reverse lookup. Several response codes collide on `0x24`
    /// (`GenericAck`); callers that need to disambiguate must track which
    /// request they are awaiting a reply to, same as the original client.
    pub fn from_wire_code(code: u8) -> Option<Self> {
        Some(match code {
            0x20 => Self::NodeSelectReq,
            0x21 => Self::NodeSelectRes,
            0x30 => Self::DiReadReq,
            0x40 => Self::DiReadRes,
            0x31 => Self::DiThresholdWriteReq,
            0x32 => Self::DoReadReq,
            0x41 => Self::DoReadRes,
            0x33 => Self::DoWriteReq,
            0x44 => Self::DoWriteAllReq,
            0x42 => Self::DioReadAllReq,
            0x43 => Self::DioReadAllRes,
            0x50 => Self::AnalogReadReq,
            0x60 => Self::AnalogReadRes,
            0x51 => Self::AnalogReadAllReq,
            0x61 => Self::AnalogReadAllRes,
            0x70 => Self::SerialSetupReq,
            0x71 => Self::SerialSetupReadReq,
            0x82 => Self::SerialSetupReadRes,
            0x80 => Self::SerialWriteReq,
            0x81 => Self::SerialWriteRes,
            0x90 => Self::AccelReadReq,
            0x91 => Self::AccelReadRes,
            0x92 => Self::GpsReadReq,
            0x93 => Self::GpsReadRes,
            0xA0 => Self::FirmwareVersionReadReq,
            0xA1 => Self::FirmwareVersionReadRes,
            0xA2 => Self::FirmwareVersionUpdateReq,
            0x24 => Self::GenericAck,
            _ => return None,
        })
    }
}

/// A raw MCU frame: everything between (and including) the start byte and
/// the checksum trailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McuFrame {
    pub command: u8,
    pub data: Vec<u8>,
}

impl McuFrame {
    /// Serializes `start_byte | command | len | data | checksum`.
    pub fn encode(&self, checksum_kind: ChecksumKind) -> Vec<u8> {
        let mut body = Vec::with_capacity(2 + self.data.len());
        body.push(self.command);
        body.push(self.data.len() as u8);
        body.extend_from_slice(&self.data);

        let mut frame = Vec::with_capacity(1 + body.len() + checksum::trailer_len(checksum_kind));
        frame.push(START_BYTE);
        frame.extend_from_slice(&body);
        let trailer = checksum::compute(checksum_kind, &frame);
        frame.extend_from_slice(&trailer);
        frame
    }

    /// Scans `buf` for a start byte, then decodes one frame starting there.
    /// Returns `(frame, bytes_consumed)`. Bounded by [`MAX_PACKET_SIZE`] to
    /// avoid scanning forever on a noisy, desynchronized link.
    ///
    /// A start byte that turns out to belong to noise (oversized declared
    /// length, or a checksum that doesn't verify) is not fatal: the scan
    /// resumes from the byte right after it, per spec.md §4.2/§4.4, until
    /// either a valid frame is found or [`MAX_PACKET_SIZE`] bytes have been
    /// scanned with no luck, in which case the last failure is reported.
    pub fn decode(buf: &[u8], checksum_kind: ChecksumKind) -> Result<(Self, usize), FramingError> {
        let scan_limit = buf.len().min(MAX_PACKET_SIZE);
        let mut cursor = 0usize;
        let mut last_err = FramingError::NoStartByte { scanned: scan_limit };

        loop {
            let Some(rel) = buf[cursor..scan_limit].iter().position(|&b| b == START_BYTE) else {
                return Err(last_err);
            };
            let start = cursor + rel;
            let rest = &buf[start..];

            if rest.len() < 3 {
                return Err(FramingError::TooShort { got: rest.len(), need: 3 });
            }
            let command = rest[1];
            let len = rest[2] as usize;
            let trailer_len = checksum::trailer_len(checksum_kind);
            let total = 3 + len + trailer_len;

            if total > MAX_PACKET_SIZE {
                last_err = FramingError::TooLong { len: total, max: MAX_PACKET_SIZE };
                cursor = start + 1;
                continue;
            }
            if rest.len() < total {
                return Err(FramingError::TooShort { got: rest.len(), need: total });
            }

            let data = rest[3..3 + len].to_vec();
            let frame_without_trailer = &rest[..3 + len];
            let trailer = &rest[3 + len..total];
            if !checksum::verify(checksum_kind, frame_without_trailer, trailer) {
                let expected = trailer.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32);
                let computed = checksum::compute(checksum_kind, frame_without_trailer)
                    .iter()
                    .fold(0u32, |acc, &b| (acc << 8) | b as u32);
                last_err = FramingError::ChecksumMismatch { expected, computed };
                cursor = start + 1;
                continue;
            }

            return Ok((McuFrame { command, data }, start + total));
        }
    }
}

/// A typed request, convenience wrapper over [`McuFrame`].
#[derive(Debug, Clone)]
pub struct McuRequest {
    pub command: McuCommand,
    pub data: Vec<u8>,
}

impl McuRequest {
    pub fn encode(&self, checksum_kind: ChecksumKind) -> Vec<u8> {
        McuFrame { command: self.command.wire_code(), data: self.data.clone() }
            .encode(checksum_kind)
    }
}

/// One firmware-update chunk's raw payload bytes, carried in a
/// `FIRMWARE_VERSION_UPDATE_REQ` data field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareChunk(pub Vec<u8>);

impl FirmwareChunk {
    /// Splits a legacy firmware blob on literal `:` bytes into chunks,
    /// dropping empty segments (a blob ending in `:` does not produce a
    /// trailing empty chunk). This is the input format the firmware tooling
    /// has always produced; callers building chunks directly should
    /// construct `FirmwareChunk` values instead of going through this.
    pub fn split_legacy(blob: &[u8]) -> Vec<Self> {
        blob.split(|&b| b == b':').filter(|s| !s.is_empty()).map(|s| Self(s.to_vec())).collect()
    }
}

/// A decoded response.
#[derive(Debug, Clone)]
pub struct McuResponse {
    pub command: u8,
    pub data: Vec<u8>,
}

impl McuResponse {
    pub fn decode(
        buf: &[u8],
        checksum_kind: ChecksumKind,
    ) -> Result<(Self, usize), FramingError> {
        let (frame, consumed) = McuFrame::decode(buf, checksum_kind)?;
        Ok((Self { command: frame.command, data: frame.data }, consumed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_node_select() {
        let req = McuRequest { command: McuCommand::NodeSelectReq, data: vec![0x01] };
        let bytes = req.encode(ChecksumKind::Xor);
        let (resp, consumed) = McuResponse::decode(&bytes, ChecksumKind::Xor).expect("decode");
        assert_eq!(consumed, bytes.len());
        assert_eq!(resp.command, McuCommand::NodeSelectReq.wire_code());
        assert_eq!(resp.data, vec![0x01]);
    }

    #[test]
    fn detects_checksum_mismatch() {
        let req = McuRequest { command: McuCommand::DiReadReq, data: vec![0x00] };
        let mut bytes = req.encode(ChecksumKind::Crc16Modbus);
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        let err = McuResponse::decode(&bytes, ChecksumKind::Crc16Modbus).unwrap_err();
        assert!(matches!(err, FramingError::ChecksumMismatch { .. }));
    }

    #[test]
    fn resyncs_past_a_corrupted_frame_to_the_next_good_one() {
        let corrupt = McuRequest { command: McuCommand::DiReadReq, data: vec![0x00] };
        let mut corrupt_bytes = corrupt.encode(ChecksumKind::Xor);
        let last = corrupt_bytes.len() - 1;
        corrupt_bytes[last] ^= 0xFF;

        let good = McuRequest { command: McuCommand::GpsReadReq, data: vec![] };
        let good_bytes = good.encode(ChecksumKind::Xor);

        let mut buf = corrupt_bytes;
        buf.extend(&good_bytes);

        let (resp, consumed) = McuResponse::decode(&buf, ChecksumKind::Xor).expect("decode");
        assert_eq!(resp.command, McuCommand::GpsReadReq.wire_code());
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn splits_legacy_firmware_blob_on_colon() {
        let chunks = FirmwareChunk::split_legacy(b"AABB:CCDD:EE");
        assert_eq!(chunks, vec![
            FirmwareChunk(b"AABB".to_vec()),
            FirmwareChunk(b"CCDD".to_vec()),
            FirmwareChunk(b"EE".to_vec()),
        ]);
    }

    #[test]
    fn drops_empty_segments_from_legacy_firmware_blob() {
        let chunks = FirmwareChunk::split_legacy(b"AABB::CCDD:");
        assert_eq!(chunks, vec![FirmwareChunk(b"AABB".to_vec()), FirmwareChunk(b"CCDD".to_vec())]);
    }

    #[test]
    fn skips_noise_before_start_byte() {
        let req = McuRequest { command: McuCommand::GpsReadReq, data: vec![] };
        let mut bytes = vec![0x00, 0xAA, 0xBB];
        bytes.extend(req.encode(ChecksumKind::Sum));
        let (resp, consumed) = McuResponse::decode(&bytes, ChecksumKind::Sum).expect("decode");
        assert_eq!(resp.command, McuCommand::GpsReadReq.wire_code());
        assert_eq!(consumed, bytes.len());
    }
}
