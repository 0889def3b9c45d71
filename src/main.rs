// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use xgt_core::{
    aggregate::{self, BucketStore},
    cache::{KvCache, SampleValue},
    cfg::{cli::resolve_config_path, config::Config, logger::init_logger},
    control::{CommandLogStore, ControlValueStore, StatusStore},
    decode::{DataType, MemoryGroup},
    protocol::{
        lsis::constants::SingleDataType,
        mcu::pdu::{McuCommand, McuRequest},
    },
    scheduler::{cron, PollJob, SchedulerHandle},
    transport::{serial::McuConnection, tcp::XgtConnection},
};

/// Polls every memory group assigned to one client once: reads each group's
/// byte range over TCP with a single continuous-read covering the whole
/// group, decodes every variable out of the returned contiguous payload, and
/// writes the results into the cache under `client_name:var_name`. Also
/// issues a system-status query so `StatusStore` reflects the PLC's current
/// CPU/system status, logging a transition row when it changes (see
/// spec.md §3's `SocketClientStatus`/`SocketClientLog`).
async fn poll_client_once(
    client: &XgtConnection,
    client_name: &str,
    groups: &[MemoryGroup],
    cache: &KvCache,
    status_store: &StatusStore,
) -> Result<()> {
    for group in groups {
        let address = format!("%MB{}", group.start_address as usize);
        let resp = client.continuous_read(SingleDataType::Byte, address, group.size_byte as u16).await?;
        if resp.is_error() {
            warn!(client = client_name, group = %group.name, error_status = resp.error_status, "PLC returned error status");
            continue;
        }

        for (name, result) in group.decode_all(&resp.payload) {
            match result {
                Ok(value) => {
                    let is_bool = group.variable(&name).map(|v| v.data_type) == Some(DataType::Bool);
                    let sample = if is_bool { SampleValue::Bool(value != 0.0) } else { SampleValue::Float(value) };
                    cache.set(client_name, &name, sample);
                }
                Err(e) => warn!(client = client_name, variable = %name, "decode failed: {e}"),
            }
        }
    }

    let status_resp = client.system_status().await?;
    let status = status_resp.status();
    if status_store.record(client_name, serde_json::to_value(&status)?, status.error_code as i32) {
        info!(client = client_name, message = %status_store.latest(client_name).map(|s| s.message).unwrap_or_default(), "PLC status transition");
    }
    Ok(())
}

/// Polls one MCU device's digital and analog channels once, writing the raw
/// per-channel readings into the cache under `device_name:di<n>`/`ai<n>`.
async fn poll_mcu_once(mcu: &McuConnection, device_name: &str, node_serial: [u8; 8], cache: &KvCache) -> Result<()> {
    mcu.select_node(node_serial).await?;

    let di = mcu.request(McuRequest { command: McuCommand::DioReadAllReq, data: vec![] }).await?;
    for (i, byte) in di.data.iter().enumerate() {
        for bit in 0..8u8 {
            let value = (byte >> bit) & 1 == 1;
            cache.set(device_name, &format!("di{}", i * 8 + bit as usize), SampleValue::Bool(value));
        }
    }

    let analog = mcu.request(McuRequest { command: McuCommand::AnalogReadAllReq, data: vec![] }).await?;
    for (i, chunk) in analog.data.chunks_exact(2).enumerate() {
        let raw = u16::from_le_bytes([chunk[0], chunk[1]]);
        cache.set(device_name, &format!("ai{i}"), SampleValue::Float(raw as f64));
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = resolve_config_path("config/xgt.yaml").context("failed to resolve config path")?;
    let _logger_guard = init_logger(config_path.to_str().unwrap_or("config/xgt.yaml"))
        .context("failed to initialize logger")?;

    let cfg = Config::load_from_file(&config_path).context("failed to load config")?;
    info!("loaded config: {} client(s), {} mcu device(s)", cfg.clients.len(), cfg.mcu_devices.len());

    let cache = Arc::new(KvCache::new());
    let bucket_store = Arc::new(BucketStore::new());
    // `control_values` and `command_log` back the control path (setpoint
    // writes, DO commands); nothing in this binary issues those yet since
    // they arrive from outside the polling/aggregation scheduler (a REST
    // layer, an operator console), so both stores just sit ready for that
    // caller. `status_store` is driven below, from `poll_client_once`.
    let control_values = Arc::new(ControlValueStore::new());
    let command_log = Arc::new(CommandLogStore::new());
    let status_store = Arc::new(StatusStore::new());
    let _ = &control_values;
    let _ = &command_log;

    let root_cancel = CancellationToken::new();

    let mut scheduler = SchedulerHandle::new().await?;

    for client_cfg in cfg.clients.iter().filter(|c| c.is_used) {
        let groups: Vec<MemoryGroup> = client_cfg
            .memory_groups
            .iter()
            .filter_map(|name| cfg.memory_groups.get(name).cloned())
            .collect();

        let conn = match XgtConnection::connect(
            &client_cfg.host,
            client_cfg.port,
            client_cfg.connection.retries as u32,
            client_cfg.connection.timeout,
            client_cfg.connection.reconnect_delay,
            client_cfg.connection.reconnect_delay_max,
            root_cancel.child_token(),
        )
        .await
        {
            Ok(conn) => conn,
            Err(e) => {
                warn!(client = %client_cfg.name, "failed to connect, skipping its polling job: {e}");
                continue;
            }
        };

        let cache = Arc::clone(&cache);
        let status_store = Arc::clone(&status_store);
        let name = client_cfg.name.clone();
        scheduler
            .add_job(
                PollJob {
                    label: format!("poll_client:{name}"),
                    cron_expr: client_cfg.cron.to_expr(),
                    misfire_grace: cfg.scheduler.misfire_grace,
                },
                move || {
                    let conn = Arc::clone(&conn);
                    let cache = Arc::clone(&cache);
                    let status_store = Arc::clone(&status_store);
                    let name = name.clone();
                    let groups = groups.clone();
                    async move {
                        if let Err(e) = poll_client_once(&conn, &name, &groups, &cache, &status_store).await {
                            warn!(client = %name, "poll failed: {e}");
                        }
                    }
                },
            )
            .await?;
    }

    for mcu_cfg in cfg.mcu_devices.iter().filter(|d| d.is_used) {
        let node_serial = match mcu_cfg.node_serial_bytes() {
            Ok(serial) => serial,
            Err(e) => {
                warn!(device = %mcu_cfg.name, "invalid node_serial, skipping its polling job: {e}");
                continue;
            }
        };

        let conn = match McuConnection::open(
            &mcu_cfg.port,
            mcu_cfg.baud_rate,
            mcu_cfg.checksum,
            mcu_cfg.connection.timeout,
            root_cancel.child_token(),
        ) {
            Ok(conn) => Arc::new(conn),
            Err(e) => {
                warn!(device = %mcu_cfg.name, "failed to open serial port, skipping its polling job: {e}");
                continue;
            }
        };

        let cache = Arc::clone(&cache);
        let name = mcu_cfg.name.clone();
        scheduler
            .add_job(
                PollJob {
                    label: format!("poll_mcu:{name}"),
                    cron_expr: mcu_cfg.cron.to_expr(),
                    misfire_grace: cfg.scheduler.misfire_grace,
                },
                move || {
                    let conn = Arc::clone(&conn);
                    let cache = Arc::clone(&cache);
                    let name = name.clone();
                    async move {
                        if let Err(e) = poll_mcu_once(&conn, &name, node_serial, &cache).await {
                            warn!(device = %name, "poll failed: {e}");
                        }
                    }
                },
            )
            .await?;
    }

    {
        let cache = Arc::clone(&cache);
        let store = Arc::clone(&bucket_store);
        scheduler
            .add_job(
                PollJob {
                    label: "stage_two_minute".into(),
                    cron_expr: cron::TWO_MINUTE_STAGING.into(),
                    misfire_grace: cfg.scheduler.misfire_grace,
                },
                move || {
                    let cache = Arc::clone(&cache);
                    let store = Arc::clone(&store);
                    async move {
                        let summary = aggregate::stage_two_minute(&cache, &store, chrono::Utc::now());
                        info!(buckets = summary.buckets, "staged 2-minute readings");
                    }
                },
            )
            .await?;
    }

    {
        let store = Arc::clone(&bucket_store);
        scheduler
            .add_job(
                PollJob {
                    label: "rollup_ten_minute".into(),
                    cron_expr: cron::TEN_MINUTE_ROLLUP.into(),
                    misfire_grace: cfg.scheduler.misfire_grace,
                },
                move || {
                    let store = Arc::clone(&store);
                    async move {
                        let summary = aggregate::rollup_to_ten_minute(&store, chrono::Utc::now());
                        info!(var_count = summary.var_count, "rolled up to 10-minute buckets");
                    }
                },
            )
            .await?;
    }

    {
        let store = Arc::clone(&bucket_store);
        scheduler
            .add_job(
                PollJob {
                    label: "rollup_hourly".into(),
                    cron_expr: cron::HOURLY_ROLLUP.into(),
                    misfire_grace: cfg.scheduler.misfire_grace,
                },
                move || {
                    let store = Arc::clone(&store);
                    async move {
                        let summary = aggregate::rollup_to_hourly(&store, chrono::Utc::now());
                        info!(var_count = summary.var_count, "rolled up to hourly buckets");
                    }
                },
            )
            .await?;
    }

    {
        let store = Arc::clone(&bucket_store);
        scheduler
            .add_job(
                PollJob {
                    label: "rollup_daily".into(),
                    cron_expr: cron::DAILY_ROLLUP.into(),
                    misfire_grace: cfg.scheduler.misfire_grace,
                },
                move || {
                    let store = Arc::clone(&store);
                    async move {
                        let summary = aggregate::rollup_to_daily(&store, chrono::Utc::now());
                        info!(var_count = summary.var_count, "rolled up to daily buckets");
                    }
                },
            )
            .await?;
    }

    scheduler.start().await?;
    info!("scheduler started, running until interrupted");

    tokio::signal::ctrl_c().await.context("failed to listen for ctrl-c")?;
    info!("shutdown requested, draining scheduler");
    scheduler.shutdown(cfg.scheduler.shutdown_grace).await?;
    root_cancel.cancel();

    Ok(())
}
