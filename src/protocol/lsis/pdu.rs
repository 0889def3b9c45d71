// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Full XGT PDU: header + instruction block. Supports the
//! `ContinuousRead`/`ContinuousWrite` command family plus the generic
//! `SystemCommand` family.

use crate::{
    error::FramingError,
    protocol::lsis::{
        command::XgtCommand,
        constants::{self, SingleDataType},
        header::{HEADER_LEN, XgtHeader},
    },
};

/// A request PDU: header plus an instruction block addressing one starting
/// device address and element count (spec.md §4.1: "memory prefix, starting
/// address, element count, and, for writes, the payload bytes").
#[derive(Debug, Clone)]
pub struct XgtRequest {
    pub header: XgtHeader,
    pub command: XgtCommand,
    pub data_type: SingleDataType,
    /// Starting device address, e.g. `"%MB100"`.
    pub address: String,
    /// Element count to read. Ignored for writes, where the element count is
    /// derived from `write_payload`'s length.
    pub count: u16,
    /// Present only for write requests: the raw little-endian payload bytes,
    /// already sized to match `data_type`.
    pub write_payload: Vec<u8>,
}

impl XgtRequest {
    pub fn continuous_read(
        invoke_id: u16,
        data_type: SingleDataType,
        address: String,
        count: u16,
    ) -> Self {
        Self {
            header: XgtHeader { invoke_id, ..Default::default() },
            command: XgtCommand::ContinuousReadRequest,
            data_type,
            address,
            count,
            write_payload: Vec::new(),
        }
    }

    pub fn continuous_write(
        invoke_id: u16,
        data_type: SingleDataType,
        address: String,
        write_payload: Vec<u8>,
    ) -> Self {
        Self {
            header: XgtHeader { invoke_id, ..Default::default() },
            command: XgtCommand::ContinuousWriteRequest,
            data_type,
            address,
            count: 0,
            write_payload,
        }
    }

    /// Builds a minimal query frame that carries no instruction data of its
    /// own; the PLC's reply header's `plc_info`/`cpu_info` fields (see
    /// [`crate::protocol::lsis::status::interpretation`]) are the payload
    /// this command is issued for, per spec.md §4.1.
    pub fn system_status(invoke_id: u16) -> Self {
        Self {
            header: XgtHeader { invoke_id, ..Default::default() },
            command: XgtCommand::SystemCommandRequest,
            data_type: SingleDataType::Byte,
            address: String::new(),
            count: 0,
            write_payload: Vec::new(),
        }
    }

    /// Serializes header + instruction block into a single frame.
    ///
    /// Layout: `cmd(u16) | data_type(u16) | reserved(u16) | block_count(u16,
    /// always 1 — spec.md §9 notes only count=1 is exercised) |
    /// var_length(u16) | var_bytes | data_count(u16) | payload`. Reads carry
    /// the requested element count as `data_count`; writes carry the element
    /// count implied by `write_payload`'s length, followed by the payload
    /// itself.
    pub fn encode(&self) -> Vec<u8> {
        if self.command == XgtCommand::SystemCommandRequest {
            let mut header = self.header;
            header.source_of_frame = constants::SOURCE_SYSTEM;
            header.length = 0;
            return header.to_bytes().to_vec();
        }

        let mut body = Vec::new();
        body.extend_from_slice(&self.command.wire_code().to_le_bytes());
        body.extend_from_slice(&(self.data_type as u16).to_le_bytes());
        body.extend_from_slice(&0u16.to_le_bytes()); // reserved
        body.extend_from_slice(&1u16.to_le_bytes()); // block_count
        body.extend_from_slice(&(self.address.len() as u16).to_le_bytes());
        body.extend_from_slice(self.address.as_bytes());

        if self.command == XgtCommand::ContinuousWriteRequest {
            let elem_len = self.data_type.byte_len().max(1);
            let data_count = (self.write_payload.len() / elem_len) as u16;
            body.extend_from_slice(&data_count.to_le_bytes());
            body.extend_from_slice(&self.write_payload);
        } else {
            body.extend_from_slice(&self.count.to_le_bytes());
        }

        let mut header = self.header;
        header.source_of_frame = constants::SOURCE_REQUEST;
        header.length = body.len() as u16;

        let mut out = Vec::with_capacity(HEADER_LEN + body.len());
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(&body);
        out
    }
}

/// A response PDU: header plus decoded instruction-block payload (raw value
/// bytes for reads, an error code for failed transactions).
#[derive(Debug, Clone)]
pub struct XgtResponse {
    pub header: XgtHeader,
    pub command: XgtCommand,
    pub error_status: u16,
    /// Raw payload bytes, one contiguous slice covering every element the
    /// request addressed (empty on error). Decoding into typed variable
    /// values is delegated to `decode::MemoryGroup`.
    pub payload: Vec<u8>,
}

impl XgtResponse {
    /// Decodes a complete frame (header + instruction block) previously
    /// delimited by the transaction manager using `header.length`.
    ///
    /// Continuous-read/write response layout per spec.md §4.1: `cmd(u16) |
    /// data_type(u16) | reserved(u16) | reserved(u16) | block_count(u16) |
    /// data_count(u16) | payload[data_count]`, with `payload` exposed as one
    /// raw byte slice starting at offset 12.
    pub fn decode(data: &[u8]) -> Result<Self, FramingError> {
        let header = XgtHeader::from_bytes(data)?;
        let body = &data[HEADER_LEN..];

        if header.source_of_frame == constants::SOURCE_SYSTEM {
            // The system-status query has no instruction-block payload of
            // its own; the header's plc_info/cpu_info fields already carry
            // the answer (see `status::interpretation`).
            return Ok(Self {
                header,
                command: XgtCommand::SystemCommandRequest,
                error_status: 0,
                payload: Vec::new(),
            });
        }

        if header.is_error_length() {
            let error_status = body.first_chunk::<2>().map(|b| u16::from_le_bytes(*b)).unwrap_or(0);
            return Ok(Self {
                header,
                command: XgtCommand::ContinuousReadResponse,
                error_status,
                payload: Vec::new(),
            });
        }

        if body.len() < 12 {
            return Err(FramingError::TooShort { got: body.len(), need: 12 });
        }
        let command_code = u16::from_le_bytes([body[0], body[1]]);
        let command = XgtCommand::try_from(command_code)
            .map_err(|_| FramingError::TooShort { got: body.len(), need: 12 })?;
        let data_count = u16::from_le_bytes([body[10], body[11]]) as usize;

        let payload_start = 12;
        let payload_end = payload_start + data_count;
        if payload_end > body.len() {
            return Err(FramingError::TooShort { got: body.len(), need: payload_end });
        }

        Ok(Self {
            header,
            command,
            error_status: 0,
            payload: body[payload_start..payload_end].to_vec(),
        })
    }

    pub fn is_error(&self) -> bool {
        self.header.is_error_length() || self.error_status != 0
    }

    /// Decodes this response's header into a human-readable device status,
    /// valid for any response (every frame's header carries `plc_info`/
    /// `cpu_info`), not just replies to [`XgtRequest::system_status`].
    pub fn status(&self) -> crate::protocol::lsis::status::DeviceStatus {
        crate::protocol::lsis::status::interpretation(
            self.header.plc_info,
            self.header.cpu_info,
            self.error_status,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_continuous_read_request() {
        let req = XgtRequest::continuous_read(1, SingleDataType::Word, "%MW100".to_string(), 1);
        let bytes = req.encode();
        assert_eq!(&bytes[0..8], constants::COMPANY_ID.as_slice());
        let hdr = XgtHeader::from_bytes(&bytes).expect("header decodes");
        assert_eq!(hdr.invoke_id, 1);
        assert!(hdr.length as usize == bytes.len() - HEADER_LEN);
    }

    #[test]
    fn decodes_continuous_read_response_payload() {
        // cmd | data_type | reserved | reserved | block_count | data_count | payload
        let mut body = Vec::new();
        body.extend_from_slice(&XgtCommand::ContinuousReadResponse.wire_code().to_le_bytes());
        body.extend_from_slice(&(SingleDataType::Byte as u16).to_le_bytes());
        body.extend_from_slice(&0u16.to_le_bytes());
        body.extend_from_slice(&0u16.to_le_bytes());
        body.extend_from_slice(&1u16.to_le_bytes());
        body.extend_from_slice(&2u16.to_le_bytes());
        body.extend_from_slice(&[0x7B, 0x00]);

        let mut header = XgtHeader { invoke_id: 7, ..Default::default() };
        header.source_of_frame = constants::SOURCE_RESPONSE;
        header.length = body.len() as u16;
        let mut bytes = header.to_bytes().to_vec();
        bytes.extend_from_slice(&body);

        let resp = XgtResponse::decode(&bytes).expect("decode");
        assert!(!resp.is_error());
        assert_eq!(resp.payload, vec![0x7B, 0x00]);
    }

    #[test]
    fn system_status_request_carries_no_instruction_block() {
        let req = XgtRequest::system_status(3);
        let bytes = req.encode();
        assert_eq!(bytes.len(), HEADER_LEN);
        let hdr = XgtHeader::from_bytes(&bytes).expect("header decodes");
        assert_eq!(hdr.source_of_frame, constants::SOURCE_SYSTEM);
        assert_eq!(hdr.length, 0);
    }

    #[test]
    fn decodes_system_status_response_from_header_fields() {
        let mut header = XgtHeader {
            invoke_id: 3,
            source_of_frame: constants::SOURCE_SYSTEM,
            plc_info: (0x01 << 8) | 0x05,
            cpu_info: 0xA4,
            ..Default::default()
        };
        header.length = 0;
        let bytes = header.to_bytes();

        let resp = XgtResponse::decode(&bytes).expect("decode");
        assert!(!resp.is_error());
        assert!(resp.payload.is_empty());
        let status = resp.status();
        assert_eq!(status.system_status_label, "RUN");
        assert_eq!(status.cpu_info_label, "XGI");
    }
}
