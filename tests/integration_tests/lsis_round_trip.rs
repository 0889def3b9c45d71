use tokio_util::sync::CancellationToken;
use xgt_core::{
    decode::{DataType, MemoryGroup},
    protocol::lsis::{
        command::XgtCommand,
        constants::SingleDataType,
    },
    transport::tcp::XgtConnection,
};

use crate::integration_tests::common::spawn_mock_plc;

/// A canned continuous-read response body: cmd | data_type | reserved |
/// reserved | block_count | data_count | payload, matching spec.md §4.1's
/// instruction-block layout.
fn continuous_read_reply(payload: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&XgtCommand::ContinuousReadResponse.wire_code().to_le_bytes());
    body.extend_from_slice(&(SingleDataType::Byte as u16).to_le_bytes());
    body.extend_from_slice(&0u16.to_le_bytes()); // reserved
    body.extend_from_slice(&0u16.to_le_bytes()); // reserved
    body.extend_from_slice(&1u16.to_le_bytes()); // block_count
    body.extend_from_slice(&(payload.len() as u16).to_le_bytes()); // data_count
    body.extend_from_slice(payload);
    body
}

/// Drives a full read -> decode -> cache round trip against a mock PLC:
/// the client issues a continuous read, the decoded instruction block feeds
/// `MemoryGroup::decode_all`, and the scaled value lands as expected.
#[tokio::test]
async fn continuous_read_decodes_scaled_value() {
    let raw = 123i16.to_le_bytes();
    let (host, port) = spawn_mock_plc(move |_invoke_id| Some(continuous_read_reply(&raw))).await;

    let conn = XgtConnection::connect(
        &host,
        port,
        1,
        std::time::Duration::from_secs(2),
        std::time::Duration::from_millis(50),
        std::time::Duration::from_millis(200),
        CancellationToken::new(),
    )
    .await
    .expect("connect to mock plc");

    let resp = conn
        .continuous_read(SingleDataType::Byte, "%MB0".to_string(), 2)
        .await
        .expect("read succeeds");
    assert!(!resp.is_error());
    assert_eq!(resp.payload, raw.to_vec());

    let group = MemoryGroup {
        name: "zone-a".into(),
        description: String::new(),
        size_byte: 2,
        start_address: 0.0,
        variables: vec![xgt_core::decode::Variable {
            name: "temp".into(),
            device: "%MB".into(),
            address: 0.0,
            data_type: DataType::Int,
            unit: xgt_core::decode::Unit::Word,
            scale: 0.1,
            offset: String::new(),
            attributes: xgt_core::decode::VariableAttributes::MONITOR,
            use_group_base_address: false,
            min: 0.0,
            max: 0.0,
        }],
    };

    let results = group.decode_all(&resp.payload);
    assert_eq!(results.len(), 1);
    let value = results[0].1.as_ref().expect("decode succeeds");
    assert!((value - 12.3).abs() < 1e-9);
}
