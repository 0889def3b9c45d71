// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The XGT command-code table. Mirrors the op-code lookup pattern the
//! teacher protocol uses for its Basic-Header-Segment op-codes, but keyed on
//! the 16-bit command field of the XGT instruction block.

use std::convert::TryFrom;

use thiserror::Error;

/// Commands defined by the `FEnet` continuous read/write and system-command
/// families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XgtCommand {
    ContinuousReadRequest,
    ContinuousReadResponse,
    ContinuousWriteRequest,
    ContinuousWriteResponse,
    SystemCommandRequest,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown XGT command code {0:#06x}")]
pub struct UnknownCommand(pub u16);

impl XgtCommand {
    pub const fn wire_code(self) -> u16 {
        match self {
            XgtCommand::ContinuousReadRequest => 0x54,
            XgtCommand::ContinuousReadResponse => 0x55,
            XgtCommand::ContinuousWriteRequest => 0x58,
            XgtCommand::ContinuousWriteResponse => 0x59,
            XgtCommand::SystemCommandRequest => 0xEF,
        }
    }

    pub const fn is_response(self) -> bool {
        matches!(
            self,
            XgtCommand::ContinuousReadResponse | XgtCommand::ContinuousWriteResponse
        )
    }
}

impl TryFrom<u16> for XgtCommand {
    type Error = UnknownCommand;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        Ok(match code {
            0x54 => Self::ContinuousReadRequest,
            0x55 => Self::ContinuousReadResponse,
            0x58 => Self::ContinuousWriteRequest,
            0x59 => Self::ContinuousWriteResponse,
            0xEF => Self::SystemCommandRequest,
            other => return Err(UnknownCommand(other)),
        })
    }
}

impl From<XgtCommand> for u16 {
    fn from(c: XgtCommand) -> Self {
        c.wire_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_known_code() {
        for c in [
            XgtCommand::ContinuousReadRequest,
            XgtCommand::ContinuousReadResponse,
            XgtCommand::ContinuousWriteRequest,
            XgtCommand::ContinuousWriteResponse,
            XgtCommand::SystemCommandRequest,
        ] {
            let code = c.wire_code();
            assert_eq!(XgtCommand::try_from(code), Ok(c));
        }
    }

    #[test]
    fn rejects_unknown_code() {
        assert_eq!(XgtCommand::try_from(0x01), Err(UnknownCommand(0x01)));
    }
}
