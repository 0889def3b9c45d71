// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! A single scalar inside a read block: device prefix, byte/bit address,
//! data type, scale, clamp range, and the attribute flags used to route it
//! to monitoring, control, history, and alarm consumers. Field set ported
//! from `LSISsocket.models.Variable`.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

bitflags::bitflags! {
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct VariableAttributes: u8 {
        const MONITOR = 0b0001;
        const CONTROL = 0b0010;
        const RECORD  = 0b0100;
        const ALARM   = 0b1000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Bool,
    Sint,
    Usint,
    Int,
    Uint,
    Dint,
    Udint,
    Float,
}

impl DataType {
    /// Wire width in bytes, independent of `unit` (which describes the
    /// *read block's* element size, not necessarily the variable's).
    pub fn byte_len(self) -> usize {
        match self {
            DataType::Bool | DataType::Sint | DataType::Usint => 1,
            DataType::Int | DataType::Uint => 2,
            DataType::Dint | DataType::Udint | DataType::Float => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Bit,
    Byte,
    Word,
    Dword,
    Lword,
}

impl Unit {
    pub fn byte_size(self) -> usize {
        match self {
            Unit::Bit | Unit::Byte => 1,
            Unit::Word => 2,
            Unit::Dword => 4,
            Unit::Lword => 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    /// Device prefix, e.g. `"%MB"`.
    pub device: String,
    /// Byte-offset.bit-index encoding: integer part is the byte offset,
    /// fractional part (scaled ×10 à la the original) names the bit for
    /// `DataType::Bool` variables.
    pub address: f64,
    pub data_type: DataType,
    pub unit: Unit,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub offset: String,
    #[serde(default)]
    pub attributes: VariableAttributes,
    #[serde(default)]
    pub use_group_base_address: bool,
    #[serde(default)]
    pub min: f64,
    #[serde(default)]
    pub max: f64,
}

fn default_scale() -> f64 {
    1.0
}

impl Variable {
    fn byte_offset(&self) -> usize {
        self.address.trunc() as usize
    }

    fn bit_index(&self) -> u8 {
        // Fractional part names the bit 0-7: 0.3 -> bit 3.
        ((self.address.fract() * 10.0).round() as i64).rem_euclid(8) as u8
    }

    /// Resolves the absolute byte offset into the read block, honoring
    /// `use_group_base_address`.
    pub fn resolve_offset(&self, group_start_address: f64) -> usize {
        if self.use_group_base_address {
            group_start_address.trunc() as usize + self.byte_offset() * self.unit.byte_size()
        } else {
            self.byte_offset() * self.unit.byte_size()
        }
    }

    fn clamp(&self, value: f64) -> f64 {
        if self.min < self.max {
            value.clamp(self.min, self.max)
        } else {
            value
        }
    }

    /// Extracts this variable's typed, scaled value from `block`, a raw
    /// instruction-block byte buffer, resolving its offset against
    /// `group_start_address`.
    pub fn decode(&self, block: &[u8], group_start_address: f64) -> Result<f64, ValidationError> {
        let offset = self.resolve_offset(group_start_address);

        if self.data_type == DataType::Bool {
            let byte = *block.get(offset).ok_or_else(|| ValidationError::InvalidAddress {
                address: format!("{}{}", self.device, self.address),
                reason: format!("byte offset {offset} out of block bounds ({} bytes)", block.len()),
            })?;
            let bit = self.bit_index();
            let raw = ((byte >> bit) & 1) as f64;
            return Ok(self.clamp(raw * self.scale));
        }

        let width = self.data_type.byte_len();
        let bytes = block.get(offset..offset + width).ok_or_else(|| ValidationError::InvalidAddress {
            address: format!("{}{}", self.device, self.address),
            reason: format!(
                "range {offset}..{} out of block bounds ({} bytes)",
                offset + width,
                block.len()
            ),
        })?;

        let raw: f64 = match self.data_type {
            DataType::Sint => bytes[0] as i8 as f64,
            DataType::Usint => bytes[0] as f64,
            DataType::Int => i16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            DataType::Uint => u16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            DataType::Dint => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            DataType::Udint => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            DataType::Float => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            DataType::Bool => unreachable!("handled above"),
        };

        Ok(self.clamp(raw * self.scale))
    }

    /// Builds a write address string and payload for `value`. Bool
    /// variables write a single-bit address (`"%MX<bit>"`) with a 0/1
    /// payload byte; scalars divide by `scale`, clamp, and pack
    /// little-endian per `data_type`.
    pub fn encode_write(&self, value: f64) -> Result<(String, Vec<u8>), ValidationError> {
        if self.data_type == DataType::Bool {
            let bit = self.bit_index();
            let address = format!("%MX{}", self.byte_offset() * 8 + bit as usize);
            let payload = vec![if value != 0.0 { 1 } else { 0 }];
            return Ok((address, payload));
        }

        if self.scale == 0.0 {
            return Err(ValidationError::Other(format!(
                "variable {} has scale == 0, cannot encode a write",
                self.name
            )));
        }

        let unscaled = self.clamp(value) / self.scale;
        let address = format!("{}{}", self.device, self.byte_offset());
        let payload = match self.data_type {
            DataType::Sint => vec![unscaled as i8 as u8],
            DataType::Usint => vec![unscaled as u8],
            DataType::Int => (unscaled as i16).to_le_bytes().to_vec(),
            DataType::Uint => (unscaled as u16).to_le_bytes().to_vec(),
            DataType::Dint => (unscaled as i32).to_le_bytes().to_vec(),
            DataType::Udint => (unscaled as u32).to_le_bytes().to_vec(),
            DataType::Float => (unscaled as f32).to_le_bytes().to_vec(),
            DataType::Bool => unreachable!("handled above"),
        };
        Ok((address, payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_var() -> Variable {
        Variable {
            name: "temp".into(),
            device: "%MB".into(),
            address: 0.0,
            data_type: DataType::Int,
            unit: Unit::Word,
            scale: 0.1,
            offset: String::new(),
            attributes: VariableAttributes::MONITOR,
            use_group_base_address: false,
            min: 0.0,
            max: 0.0,
        }
    }

    #[test]
    fn decodes_scaled_word() {
        let var = int_var();
        let block = 123i16.to_le_bytes();
        let value = var.decode(&block, 0.0).expect("decode");
        assert!((value - 12.3).abs() < 1e-9);
    }

    #[test]
    fn decodes_bool_bit() {
        let var = Variable {
            data_type: DataType::Bool,
            unit: Unit::Bit,
            address: 0.3,
            scale: 1.0,
            ..int_var()
        };
        let block = [0b0000_1000u8];
        let value = var.decode(&block, 0.0).expect("decode");
        assert_eq!(value, 1.0);
    }

    #[test]
    fn clamps_to_min_max() {
        let var = Variable { min: 0.0, max: 10.0, ..int_var() };
        let block = 1000i16.to_le_bytes();
        let value = var.decode(&block, 0.0).expect("decode");
        assert_eq!(value, 10.0);
    }

    #[test]
    fn rejects_write_with_zero_scale() {
        let var = Variable { scale: 0.0, ..int_var() };
        let err = var.encode_write(5.0).unwrap_err();
        assert!(matches!(err, ValidationError::Other(_)));
    }

    #[test]
    fn out_of_bounds_offset_is_validation_error() {
        let var = int_var();
        let err = var.decode(&[], 0.0).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidAddress { .. }));
    }
}
