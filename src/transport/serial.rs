// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Serial connector for the MCU protocol, carried over `tokio-serial` since
//! this link is RS-485/RS-232 rather than TCP. Structurally this mirrors
//! `transport::tcp::XgtConnection` (single reader/writer behind a mutex,
//! request/reply correlated by a pending slot) but MCU has no invoke id on
//! the wire: frames are correlated purely by ordering, so only one request
//! may be in flight at a time, enforced here with a connection-wide mutex
//! rather than a dispatch map.

use std::time::Duration;

use anyhow::{Result, bail};
use tokio::sync::Mutex;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    cfg::enums::ChecksumKind,
    control::CommandLogStore,
    error::{ConnectionError, TimeoutError},
    protocol::mcu::pdu::{FirmwareChunk, MAX_PACKET_SIZE, McuCommand, McuRequest, McuResponse},
    transport::common::io_with_timeout,
};

pub struct McuConnection {
    port: Mutex<SerialStream>,
    path: String,
    checksum: ChecksumKind,
    io_timeout: Duration,
    cancel: CancellationToken,
    /// Serial number of the node currently selected by the last successful
    /// `NODE_SELECT_REQ`. Re-issued before every transaction batch for a
    /// different node, per the multi-drop bus safety rule.
    selected_node: Mutex<Option<[u8; 8]>>,
}

impl McuConnection {
    pub fn open(
        path: &str,
        baud_rate: u32,
        checksum: ChecksumKind,
        io_timeout: Duration,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let port = tokio_serial::new(path, baud_rate).open_native_async()?;
        Ok(Self {
            port: Mutex::new(port),
            path: path.to_string(),
            checksum,
            io_timeout,
            cancel,
            selected_node: Mutex::new(None),
        })
    }

    /// Ensures the node with this 8-byte serial number is selected on the
    /// bus before further requests. A no-op if it is already the
    /// last-selected node.
    pub async fn select_node(&self, serial: [u8; 8]) -> Result<()> {
        {
            let selected = self.selected_node.lock().await;
            if *selected == Some(serial) {
                return Ok(());
            }
        }
        let resp = self
            .request(McuRequest { command: McuCommand::NodeSelectReq, data: serial.to_vec() })
            .await?;
        if resp.command != McuCommand::NodeSelectRes.wire_code() {
            bail!(crate::error::ProtocolError::NodeSelectRejected { node: serial });
        }
        *self.selected_node.lock().await = Some(serial);
        Ok(())
    }

    /// Sends one request and awaits exactly one reply frame. The serial
    /// link is half-duplex and strictly one-at-a-time: the connection-wide
    /// lock on `port` for the whole round trip gives that ordering.
    pub async fn request(&self, req: McuRequest) -> Result<McuResponse> {
        self.request_with_timeout(req, self.io_timeout).await
    }

    /// Same as [`Self::request`] but with an explicit reply timeout, used by
    /// the firmware-update sequence, which waits `firmware_response_timeout_ms`
    /// (shorter than the normal transaction timeout) between chunk writes.
    async fn request_with_timeout(&self, req: McuRequest, reply_timeout: Duration) -> Result<McuResponse> {
        if self.cancel.is_cancelled() {
            bail!(ConnectionError::NotConnected(self.path.clone()));
        }

        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        let bytes = req.encode(self.checksum);

        let mut port = self.port.lock().await;
        debug!("SEND mcu command={:?} node_selected={:?}", req.command, *self.selected_node.lock().await);
        io_with_timeout("write mcu frame", port.write_all(&bytes), self.io_timeout, &self.cancel).await?;

        let mut buf = Vec::with_capacity(MAX_PACKET_SIZE);
        let mut chunk = [0u8; 256];
        loop {
            let n = tokio::select! {
                _ = self.cancel.cancelled() => bail!("cancelled"),
                res = tokio::time::timeout(reply_timeout, port.read(&mut chunk)) => match res {
                    Ok(Ok(0)) => bail!(ConnectionError::AbruptClose { endpoint: self.path.clone(), bytes_read: buf.len() }),
                    Ok(Ok(n)) => n,
                    Ok(Err(e)) => return Err(e.into()),
                    Err(_) => bail!(TimeoutError::WaitingForReply(reply_timeout)),
                },
            };
            buf.extend_from_slice(&chunk[..n]);

            match McuResponse::decode(&buf, self.checksum) {
                Ok((resp, _consumed)) => return Ok(resp),
                Err(crate::error::FramingError::TooShort { .. }) if buf.len() < MAX_PACKET_SIZE => {
                    continue;
                }
                Err(e) => {
                    warn!("mcu frame decode failed on {}: {e}", self.path);
                    return Err(e.into());
                }
            }
        }
    }

    /// Writes a single digital output channel, recording the command in
    /// `command_log` with hex-encoded wire bytes on both sides (spec.md
    /// §4.9). Uses the connection's own configured checksum, so callers
    /// never need to carry one alongside the connection.
    pub async fn write_do(
        &self,
        command_log: &CommandLogStore,
        device_name: &str,
        channel: u8,
        value: bool,
    ) -> Result<()> {
        let req = McuRequest { command: McuCommand::DoWriteReq, data: vec![channel, value as u8] };
        let payload = req.encode(self.checksum);
        let result = self.request(req).await;
        match &result {
            Ok(resp) => {
                command_log.record(
                    device_name,
                    None,
                    "do_write".to_string(),
                    Some(format!("{channel}={value}")),
                    Some(&payload),
                    Some(&[resp.command]),
                    None,
                );
            }
            Err(e) => {
                command_log.record(
                    device_name,
                    None,
                    "do_write".to_string(),
                    Some(format!("{channel}={value}")),
                    Some(&payload),
                    None,
                    Some(e.to_string()),
                );
            }
        }
        result.map(|_| ())
    }

    /// Pushes firmware as a sequence of chunks, re-selecting `node` before
    /// every chunk (the bus is multi-drop: another message between chunks
    /// could steal it) and waiting only `firmware_response_timeout` for each
    /// reply, shorter than the connection's normal transaction timeout.
    /// Stops at the first chunk whose write fails or is rejected, returning
    /// how many chunks landed before that.
    pub async fn firmware_update(
        &self,
        command_log: &CommandLogStore,
        device_name: &str,
        node: [u8; 8],
        chunks: &[FirmwareChunk],
        firmware_response_timeout: Duration,
    ) -> Result<usize> {
        let mut completed = 0usize;
        for (idx, chunk) in chunks.iter().enumerate() {
            let select = self
                .request_with_timeout(
                    McuRequest { command: McuCommand::NodeSelectReq, data: node.to_vec() },
                    firmware_response_timeout,
                )
                .await;
            match select {
                Ok(resp) if resp.command == McuCommand::NodeSelectRes.wire_code() => {
                    *self.selected_node.lock().await = Some(node);
                }
                Ok(_) | Err(_) => {
                    warn!(
                        "firmware update on {}: node select failed before chunk {}/{}",
                        self.path,
                        idx + 1,
                        chunks.len()
                    );
                    break;
                }
            }

            let req = McuRequest { command: McuCommand::FirmwareVersionUpdateReq, data: chunk.0.clone() };
            let payload = req.encode(self.checksum);
            let result = self.request_with_timeout(req, firmware_response_timeout).await;
            match &result {
                Ok(resp) => {
                    command_log.record(
                        device_name,
                        None,
                        "firmware_update".to_string(),
                        Some(format!("chunk {}/{}", idx + 1, chunks.len())),
                        Some(&payload),
                        Some(&[resp.command]),
                        None,
                    );
                }
                Err(e) => {
                    command_log.record(
                        device_name,
                        None,
                        "firmware_update".to_string(),
                        Some(format!("chunk {}/{}", idx + 1, chunks.len())),
                        Some(&payload),
                        None,
                        Some(e.to_string()),
                    );
                    warn!("firmware update on {}: chunk {}/{} failed: {e}", self.path, idx + 1, chunks.len());
                    break;
                }
            }
            completed += 1;
        }
        Ok(completed)
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl std::fmt::Debug for McuConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McuConnection").field("path", &self.path).finish()
    }
}
