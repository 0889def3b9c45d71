// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! A named, ordered collection of [`Variable`](crate::decode::Variable)s
//! belonging to one logical device, ported from
//! `LSISsocket.models.MemoryGroup`.

use serde::{Deserialize, Serialize};

use crate::{decode::variable::Variable, error::ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryGroup {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub size_byte: usize,
    #[serde(default)]
    pub start_address: f64,
    #[serde(default)]
    pub variables: Vec<Variable>,
}

impl MemoryGroup {
    /// Validates the size invariant from spec.md §3: `size_byte` must cover
    /// every variable's resolved offset plus its own byte width.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for v in &self.variables {
            let offset = v.resolve_offset(self.start_address);
            let width = if v.data_type == crate::decode::variable::DataType::Bool {
                1
            } else {
                v.data_type.byte_len()
            };
            if offset + width > self.size_byte {
                return Err(ValidationError::InvalidAddress {
                    address: format!("{}{}", v.device, v.address),
                    reason: format!(
                        "variable {} (offset {offset}, width {width}) exceeds group {} size_byte \
                         {}",
                        v.name, self.name, self.size_byte
                    ),
                });
            }
        }
        Ok(())
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Decodes every variable in this group from one raw instruction-block
    /// read, returning `(variable_name, value)` pairs. A single variable's
    /// out-of-bounds failure does not abort the rest of the block.
    pub fn decode_all(&self, block: &[u8]) -> Vec<(String, Result<f64, ValidationError>)> {
        self.variables
            .iter()
            .map(|v| (v.name.clone(), v.decode(block, self.start_address)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::variable::{DataType, Unit, VariableAttributes};

    fn group() -> MemoryGroup {
        MemoryGroup {
            name: "zone-a".into(),
            description: String::new(),
            size_byte: 4,
            start_address: 0.0,
            variables: vec![Variable {
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
            }],
        }
    }

    #[test]
    fn validate_accepts_variable_within_bounds() {
        assert!(group().validate().is_ok());
    }

    #[test]
    fn validate_rejects_variable_exceeding_size() {
        let mut g = group();
        g.size_byte = 1;
        assert!(g.validate().is_err());
    }

    #[test]
    fn decode_all_reports_per_variable_results() {
        let g = group();
        let block = 123i16.to_le_bytes();
        let results = g.decode_all(&block);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "temp");
        assert!((results[0].1.as_ref().unwrap() - 12.3).abs() < 1e-9);
    }
}
