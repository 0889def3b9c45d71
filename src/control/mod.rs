// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Control-command lifecycle and the status/command audit trail, ported
//! from `original_source/LSISsocket/models.py`'s `ControlValue`,
//! `ControlValueHistory`, `SocketClientStatus`, `SocketClientLog`, and
//! `SocketClientCommand`.

pub mod command_log;
pub mod status;
pub mod value;

pub use command_log::{CommandLogStore, SocketClientCommand};
pub use status::{SocketClientLog, SocketClientStatus, StatusStore};
pub use value::{ControlState, ControlValue, ControlValueHistory, ControlValueStore};
