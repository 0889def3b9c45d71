use xgt_core::{
    cache::{KvCache, SampleValue},
    decode::{
        memory_group::MemoryGroup,
        variable::{DataType, Unit, Variable, VariableAttributes},
    },
};

fn line1_status() -> MemoryGroup {
    MemoryGroup {
        name: "line1_status".into(),
        description: "line 1 sensor readings".into(),
        size_byte: 8,
        start_address: 0.0,
        variables: vec![
            Variable {
                name: "line1_temp".into(),
                device: "%MB".into(),
                address: 0.0,
                data_type: DataType::Int,
                unit: Unit::Word,
                scale: 0.1,
                offset: String::new(),
                attributes: VariableAttributes::MONITOR | VariableAttributes::RECORD,
                use_group_base_address: false,
                min: -40.0,
                max: 150.0,
            },
            Variable {
                name: "line1_running".into(),
                device: "%MB".into(),
                address: 2.3,
                data_type: DataType::Bool,
                unit: Unit::Bit,
                scale: 1.0,
                offset: String::new(),
                attributes: VariableAttributes::MONITOR,
                use_group_base_address: false,
                min: 0.0,
                max: 0.0,
            },
        ],
    }
}

/// End-to-end read-and-decode: a raw instruction-block reply decodes through
/// every variable in a group and lands in the KV cache with the right
/// client-scoped keys and types.
#[test]
fn decodes_group_and_stages_into_cache() {
    let group = line1_status();
    group.validate().expect("group should validate");

    let mut block = vec![0u8; 8];
    block[0..2].copy_from_slice(&123i16.to_le_bytes()); // line1_temp raw
    block[2] = 0b0000_1000; // line1_running bit 3 set

    let cache = KvCache::new();
    for (name, result) in group.decode_all(&block) {
        let value = result.expect("decode should succeed");
        let is_bool = group.variable(&name).map(|v| v.data_type) == Some(DataType::Bool);
        let sample = if is_bool { SampleValue::Bool(value != 0.0) } else { SampleValue::Float(value) };
        cache.set("plc-line1", &name, sample);
    }

    let temp = cache.get("plc-line1", "line1_temp").expect("temp sample present");
    match temp.value {
        SampleValue::Float(v) => assert!((v - 12.3).abs() < 1e-9),
        other => panic!("unexpected sample {other:?}"),
    }

    let running = cache.get("plc-line1", "line1_running").expect("running sample present");
    assert_eq!(running.value, SampleValue::Bool(true));
}

#[test]
fn out_of_bounds_variable_does_not_abort_the_rest_of_the_group() {
    let mut group = line1_status();
    group.size_byte = 16;
    group.variables.push(Variable {
        name: "bad".into(),
        device: "%MB".into(),
        address: 100.0,
        data_type: DataType::Int,
        unit: Unit::Word,
        scale: 1.0,
        offset: String::new(),
        attributes: VariableAttributes::MONITOR,
        use_group_base_address: false,
        min: 0.0,
        max: 0.0,
    });

    let block = vec![0u8; 8];
    let results = group.decode_all(&block);
    let bad = results.iter().find(|(name, _)| name == "bad").expect("bad entry present");
    assert!(bad.1.is_err());
    let temp = results.iter().find(|(name, _)| name == "line1_temp").expect("temp entry present");
    assert!(temp.1.is_ok());
}
