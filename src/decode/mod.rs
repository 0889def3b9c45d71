// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Address/variable decoding: turns a raw instruction-block byte buffer
//! into typed, scaled values per a configured memory map, and the reverse
//! for writes. Ported from `LSISsocket.models.Variable` and the group/
//! variable relationship implied by spec.md's C4 contract.

pub mod memory_group;
pub mod observer;
pub mod variable;

pub use memory_group::MemoryGroup;
pub use variable::{DataType, Unit, Variable, VariableAttributes};
