use tokio_util::sync::CancellationToken;
use xgt_core::{error::TimeoutError, protocol::lsis::constants::SingleDataType, transport::tcp::XgtConnection};

use crate::integration_tests::common::spawn_mock_plc;

/// A PLC that accepts the connection but never replies should surface as a
/// `TimeoutError::WaitingForReply`, not hang the caller forever.
#[tokio::test]
async fn non_responding_plc_times_out() {
    let (host, port) = spawn_mock_plc(|_invoke_id| None).await;

    let conn = XgtConnection::connect(
        &host,
        port,
        1,
        std::time::Duration::from_millis(200),
        std::time::Duration::from_millis(50),
        std::time::Duration::from_millis(200),
        CancellationToken::new(),
    )
    .await
    .expect("connect to mock plc");

    let err = conn
        .continuous_read(SingleDataType::Byte, "%MB0".to_string(), 1)
        .await
        .expect_err("read should time out");

    assert!(err.downcast_ref::<TimeoutError>().is_some(), "expected a TimeoutError, got {err:?}");
}
