// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! TCP connector for the LSIS XGT protocol: a read half and write half each
//! behind their own mutex, a map from the in-flight `invoke_id` to a oneshot
//! reply channel, and a background `read_loop` that frames inbound bytes and
//! dispatches them to whichever request is waiting on that id. XGT has no
//! continuation PDUs, so there is no "final bit" bookkeeping: one request
//! always gets exactly one reply frame.

use std::{sync::atomic::{AtomicU16, Ordering}, time::Duration};

use anyhow::{Result, anyhow, bail};
use dashmap::DashMap;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::{Mutex, oneshot},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    error::ConnectionError,
    protocol::lsis::{
        constants::HEADER_LEN,
        header::XgtHeader,
        pdu::{XgtRequest, XgtResponse},
    },
    transport::common::{backoff_delay, io_with_timeout},
};

pub struct XgtConnection {
    reader: Mutex<OwnedReadHalf>,
    writer: Mutex<OwnedWriteHalf>,
    endpoint: String,
    io_timeout: Duration,
    pending: DashMap<u16, oneshot::Sender<Vec<u8>>>,
    next_invoke_id: AtomicU16,
    cancel: CancellationToken,
}

impl XgtConnection {
    /// Connects with exponential backoff, matching the original TCP
    /// client's `connect()` retry loop.
    pub async fn connect(
        host: &str,
        port: u16,
        retries: u32,
        io_timeout: Duration,
        backoff_base: Duration,
        backoff_max: Duration,
        cancel: CancellationToken,
    ) -> Result<std::sync::Arc<Self>> {
        let endpoint = format!("{host}:{port}");
        let mut attempt = 0u32;
        let stream = loop {
            attempt += 1;
            match tokio::time::timeout(io_timeout, TcpStream::connect(&endpoint)).await {
                Ok(Ok(stream)) => break stream,
                Ok(Err(e)) if attempt > retries => return Err(e.into()),
                Err(_) if attempt > retries => {
                    return Err(anyhow!(crate::error::TimeoutError::Connecting(io_timeout)));
                }
                _ => {
                    let delay = backoff_delay(attempt, backoff_base, backoff_max);
                    warn!("connect attempt {attempt} to {endpoint} failed, retrying in {delay:?}");
                    tokio::time::sleep(delay).await;
                }
            }
        };
        stream.set_nodelay(true)?;
        let (r, w) = stream.into_split();

        let conn = std::sync::Arc::new(Self {
            reader: Mutex::new(r),
            writer: Mutex::new(w),
            endpoint,
            io_timeout,
            pending: DashMap::new(),
            next_invoke_id: AtomicU16::new(0),
            cancel,
        });

        let reader = std::sync::Arc::clone(&conn);
        tokio::spawn(async move {
            if let Err(e) = reader.read_loop().await {
                warn!("xgt read loop exited: {e}");
            }
            // Mid-session connection loss fails every pending transaction
            // immediately rather than letting each one sit until its own
            // timeout fires (spec.md §4.3/§5): dropping the senders makes
            // any in-flight `request()` call observe a closed channel now.
            reader.pending.clear();
        });

        Ok(conn)
    }

    fn alloc_invoke_id(&self) -> u16 {
        self.next_invoke_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Sends `req` and awaits its reply, honoring the connection's I/O
    /// timeout. One retry-free request/reply round trip; callers that need
    /// retries drive this in a loop (see `transport::transaction`).
    pub async fn request(&self, mut req: XgtRequest) -> Result<XgtResponse> {
        if self.cancel.is_cancelled() {
            bail!(ConnectionError::NotConnected(self.endpoint.clone()));
        }

        let invoke_id = self.alloc_invoke_id();
        req.header.invoke_id = invoke_id;

        let (tx, rx) = oneshot::channel();
        self.pending.insert(invoke_id, tx);

        if let Err(e) = self.write_request(&req).await {
            self.pending.remove(&invoke_id);
            return Err(e);
        }

        let raw = tokio::select! {
            _ = self.cancel.cancelled() => {
                self.pending.remove(&invoke_id);
                bail!("cancelled");
            }
            res = tokio::time::timeout(self.io_timeout, rx) => {
                match res {
                    Ok(Ok(raw)) => raw,
                    Ok(Err(_)) => bail!(ConnectionError::AbruptClose { endpoint: self.endpoint.clone(), bytes_read: 0 }),
                    Err(_) => {
                        self.pending.remove(&invoke_id);
                        bail!(crate::error::TimeoutError::WaitingForReply(self.io_timeout));
                    }
                }
            }
        };

        let resp = XgtResponse::decode(&raw)?;
        if resp.header.invoke_id != invoke_id {
            bail!(crate::error::ProtocolError::InvokeIdMismatch {
                expected: invoke_id,
                got: resp.header.invoke_id,
            });
        }
        Ok(resp)
    }

    async fn write_request(&self, req: &XgtRequest) -> Result<()> {
        let bytes = req.encode();
        let mut w = self.writer.lock().await;
        debug!("SEND xgt invoke_id={} command={:?}", req.header.invoke_id, req.command);
        io_with_timeout("write xgt request", w.write_all(&bytes), self.io_timeout, &self.cancel).await
    }

    async fn read_loop(self: std::sync::Arc<Self>) -> Result<()> {
        let mut header_buf = [0u8; HEADER_LEN];
        loop {
            if self.cancel.is_cancelled() {
                bail!("cancelled");
            }

            {
                let mut r = self.reader.lock().await;
                io_with_timeout(
                    "read xgt header",
                    r.read_exact(&mut header_buf),
                    self.io_timeout,
                    &self.cancel,
                )
                .await
                .map_err(|_| ConnectionError::AbruptClose { endpoint: self.endpoint.clone(), bytes_read: 0 })?;
            }

            let header = XgtHeader::from_bytes(&header_buf)?;
            let body_len = header.length as usize;
            let mut body = vec![0u8; body_len];
            if body_len > 0 {
                let mut r = self.reader.lock().await;
                io_with_timeout("read xgt body", r.read_exact(&mut body), self.io_timeout, &self.cancel).await?;
            }

            let mut raw = Vec::with_capacity(HEADER_LEN + body_len);
            raw.extend_from_slice(&header_buf);
            raw.extend_from_slice(&body);

            if let Some((_, tx)) = self.pending.remove(&header.invoke_id) {
                let _ = tx.send(raw);
            } else {
                warn!("no pending request for invoke_id={}, dropping frame", header.invoke_id);
            }
        }
    }

    /// Convenience wrapper issuing a continuous-read transaction. The
    /// `invoke_id` passed to the PDU constructor is a placeholder;
    /// `request()` overwrites it with a freshly allocated one before send.
    pub async fn continuous_read(
        &self,
        data_type: crate::protocol::lsis::constants::SingleDataType,
        address: String,
        count: u16,
    ) -> Result<XgtResponse> {
        let req = XgtRequest::continuous_read(0, data_type, address, count);
        self.request(req).await
    }

    /// Convenience wrapper issuing a continuous-write transaction.
    pub async fn continuous_write(
        &self,
        data_type: crate::protocol::lsis::constants::SingleDataType,
        address: String,
        payload: Vec<u8>,
    ) -> Result<XgtResponse> {
        let req = XgtRequest::continuous_write(0, data_type, address, payload);
        self.request(req).await
    }

    /// Convenience wrapper issuing a system-status query (see
    /// [`XgtRequest::system_status`]); the reply's header carries the
    /// decodable `plc_info`/`cpu_info` status fields.
    pub async fn system_status(&self) -> Result<XgtResponse> {
        let req = XgtRequest::system_status(0);
        self.request(req).await
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl std::fmt::Debug for XgtConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XgtConnection").field("endpoint", &self.endpoint).finish()
    }
}
