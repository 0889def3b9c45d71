//! Shared helpers for the integration tests: a minimal mock LSIS XGT PLC
//! listening on a loopback TCP port. It speaks just enough of the wire
//! protocol (header framing, a canned continuous-read reply, a
//! non-responding mode for the timeout test) to drive
//! `transport::tcp::XgtConnection` end to end.

use std::time::Duration;

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};
use xgt_core::protocol::lsis::{constants::HEADER_LEN, header::XgtHeader};

/// Starts a one-shot mock PLC on an ephemeral port. `respond` builds the
/// reply body (not including the header) from the request's invoke id;
/// returning `None` makes the server accept the connection and then hang up
/// without ever replying, to exercise the client's read timeout.
pub async fn spawn_mock_plc<F>(respond: F) -> (String, u16)
where
    F: Fn(u16) -> Option<Vec<u8>> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock plc");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        let (mut stream, _) = match listener.accept().await {
            Ok(pair) => pair,
            Err(_) => return,
        };

        let mut header_buf = [0u8; HEADER_LEN];
        if stream.read_exact(&mut header_buf).await.is_err() {
            return;
        }
        let header = match XgtHeader::from_bytes(&header_buf) {
            Ok(h) => h,
            Err(_) => return,
        };

        if header.length > 0 {
            let mut body = vec![0u8; header.length as usize];
            if stream.read_exact(&mut body).await.is_err() {
                return;
            }
        }

        match respond(header.invoke_id) {
            Some(body) => {
                let mut reply_header = header;
                reply_header.length = body.len() as u16;
                let mut out = Vec::with_capacity(HEADER_LEN + body.len());
                out.extend_from_slice(&reply_header.to_bytes());
                out.extend_from_slice(&body);
                let _ = stream.write_all(&out).await;
            }
            None => {
                // Hold the connection open without replying, then let it drop.
                tokio::time::sleep(Duration::from_secs(10)).await;
            }
        }
    });

    (addr.ip().to_string(), addr.port())
}
