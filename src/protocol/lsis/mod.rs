// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! LSIS XGT `FEnet` frame codec: a fixed 20-byte header followed by an
//! instruction block and, for write/response frames, a variable data
//! segment.

pub mod command;
pub mod constants;
pub mod header;
pub mod pdu;
pub mod status;

pub use command::XgtCommand;
pub use header::XgtHeader;
pub use pdu::{XgtRequest, XgtResponse};
