// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::{
    cfg::enums::{ChecksumKind, LogOutput},
    decode::memory_group::MemoryGroup,
};

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    /// LSIS XGT PLC endpoints polled over TCP.
    #[serde(default)]
    pub clients: Vec<SocketClientConfig>,
    /// MCU serial devices polled over a serial link.
    #[serde(default)]
    pub mcu_devices: Vec<McuDeviceConfig>,
    /// Named memory groups, shared across clients by name (see
    /// `SocketClientConfig::memory_groups`).
    #[serde(default)]
    pub memory_groups: HashMap<String, MemoryGroup>,
    /// Sensor nodes, each either owning a direct endpoint or delegating to a
    /// `SocketClientConfig` gateway.
    #[serde(default)]
    pub sensor_nodes: Vec<SensorNodeConfig>,
    /// Control nodes, symmetric to `sensor_nodes`.
    #[serde(default)]
    pub control_nodes: Vec<ControlNodeConfig>,
    /// Scheduler-wide knobs shared by every cron job.
    pub scheduler: SchedulerConfig,
    /// Logging sink configuration.
    pub logging: LoggingConfig,
    /// Implementation/runtime parameters that live outside any wire protocol.
    pub runtime: RuntimeConfig,
}

/// One read/write instruction block dispatched against a client, e.g.
/// `{address: "0", count: 700, func_name: "continuous_read_bytes", memory:
/// "%MB"}` in the original backend's `SocketClientConfig.blocks` JSON field.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct BlockDescriptor {
    pub id: u32,
    pub address: String,
    pub count: u16,
    pub func_name: String,
    pub memory: String,
}

/// A sensor endpoint that either owns a direct `ip:port` or delegates to a
/// `SocketClientConfig` gateway by name, ported from
/// `LSISsocket.models.SensorNodeConfig::get_ip/get_port`.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SensorNodeConfig {
    pub name: String,
    #[serde(default)]
    pub gateway: Option<String>,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub port: u16,
    pub sensor_type: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Symmetric to [`SensorNodeConfig`], for write-side control endpoints.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ControlNodeConfig {
    pub name: String,
    #[serde(default)]
    pub gateway: Option<String>,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub port: u16,
    pub control_type: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl SensorNodeConfig {
    /// Resolves the endpoint to dial: the named gateway's host/port when one
    /// is set and found among `clients`, else this node's own `ip`/`port`.
    pub fn resolved_endpoint(&self, clients: &[SocketClientConfig]) -> (String, u16) {
        resolve_endpoint(self.gateway.as_deref(), &self.ip, self.port, clients)
    }
}

impl ControlNodeConfig {
    pub fn resolved_endpoint(&self, clients: &[SocketClientConfig]) -> (String, u16) {
        resolve_endpoint(self.gateway.as_deref(), &self.ip, self.port, clients)
    }
}

fn resolve_endpoint(gateway: Option<&str>, own_ip: &str, own_port: u16, clients: &[SocketClientConfig]) -> (String, u16) {
    if let Some(gateway_name) = gateway {
        if let Some(client) = clients.iter().find(|c| c.name == gateway_name) {
            return (client.host.clone(), client.port);
        }
    }
    (own_ip.to_string(), own_port)
}

/// One LSIS XGT PLC endpoint, mirroring `SocketClientConfig` in the original
/// backend.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SocketClientConfig {
    /// Human-readable name used in logs and the command log.
    pub name: String,
    #[serde(rename = "Host")]
    pub host: String,
    #[serde(default = "default_xgt_port", rename = "Port")]
    pub port: u16,
    /// Memory-group names this client should poll; resolved against the
    /// top-level memory-group table at load time.
    #[serde(default)]
    pub memory_groups: Vec<String>,
    /// Read/write instruction blocks dispatched against this client.
    #[serde(default)]
    pub blocks: Vec<BlockDescriptor>,
    /// Cron spec driving the 2-minute staging poll for this client.
    pub cron: CronSpec,
    #[serde(default = "default_true")]
    pub is_used: bool,
    #[serde(default)]
    pub connection: ConnectionTuning,
}

fn default_xgt_port() -> u16 {
    2004
}

fn default_true() -> bool {
    true
}

/// One MCU serial device.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct McuDeviceConfig {
    pub name: String,
    /// Serial port path, e.g. `/dev/ttyUSB0`.
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default)]
    pub checksum: ChecksumKind,
    /// This device's 8-byte bus serial number as a 16-character hex string,
    /// e.g. `"0011223344556677"`; sent in every `NODE_SELECT_REQ` before a
    /// command batch (spec.md §4.4 Table CMD).
    pub node_serial: String,
    pub cron: CronSpec,
    #[serde(default = "default_true")]
    pub is_used: bool,
    #[serde(default)]
    pub connection: ConnectionTuning,
    /// Reply timeout used between firmware chunk writes, shorter than
    /// `connection.timeout` since the device is expected to ack quickly
    /// mid-update (spec.md §4.4 Table CMD).
    #[serde(with = "serde_millis", default = "default_firmware_response_timeout_ms")]
    pub firmware_response_timeout_ms: Duration,
}

impl McuDeviceConfig {
    /// Decodes `node_serial` into the 8 raw bytes `NODE_SELECT_REQ` carries.
    pub fn node_serial_bytes(&self) -> Result<[u8; 8]> {
        let decoded = hex::decode(&self.node_serial)
            .with_context(|| format!("mcu device {}: node_serial is not valid hex", self.name))?;
        let array: [u8; 8] = decoded.try_into().map_err(|v: Vec<u8>| {
            anyhow::anyhow!(
                "mcu device {}: node_serial must decode to 8 bytes, got {}",
                self.name,
                v.len()
            )
        })?;
        Ok(array)
    }
}

fn default_baud_rate() -> u32 {
    19200
}

fn default_firmware_response_timeout_ms() -> Duration {
    Duration::from_millis(100)
}

/// Reconnect/backoff/timeout knobs shared by TCP and serial connectors.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ConnectionTuning {
    #[serde(with = "serde_secs", default = "default_timeout")]
    pub timeout: Duration,
    #[serde(default = "default_retries")]
    pub retries: u8,
    #[serde(with = "serde_millis", default = "default_reconnect_delay_ms")]
    pub reconnect_delay: Duration,
    #[serde(with = "serde_millis", default = "default_reconnect_delay_max_ms")]
    pub reconnect_delay_max: Duration,
}

impl Default for ConnectionTuning {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            retries: default_retries(),
            reconnect_delay: default_reconnect_delay_ms(),
            reconnect_delay_max: default_reconnect_delay_max_ms(),
        }
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_retries() -> u8 {
    3
}

fn default_reconnect_delay_ms() -> Duration {
    Duration::from_millis(100)
}

fn default_reconnect_delay_max_ms() -> Duration {
    Duration::from_millis(300_000)
}

/// A cron-like trigger spec, deserialized either as a single standard
/// five-field cron string or as a struct of individual fields.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(untagged)]
pub enum CronSpec {
    Expr { cron: String },
    Fields(CronFields),
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CronFields {
    #[serde(default = "default_star")]
    pub second: String,
    #[serde(default = "default_star")]
    pub minute: String,
    #[serde(default = "default_star")]
    pub hour: String,
    #[serde(default = "default_star")]
    pub day_of_month: String,
    #[serde(default = "default_star")]
    pub month: String,
    #[serde(default = "default_star")]
    pub day_of_week: String,
}

fn default_star() -> String {
    "*".to_string()
}

impl CronSpec {
    /// Renders a six-field cron expression consumable by the scheduler,
    /// prefixing a `0` seconds field when only five fields were given.
    pub fn to_expr(&self) -> String {
        match self {
            CronSpec::Expr { cron } => {
                if cron.split_whitespace().count() == 5 {
                    format!("0 {cron}")
                } else {
                    cron.clone()
                }
            }
            CronSpec::Fields(f) => format!(
                "{} {} {} {} {} {}",
                f.second, f.minute, f.hour, f.day_of_month, f.month, f.day_of_week
            ),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SchedulerConfig {
    #[serde(with = "serde_secs", default = "default_misfire_grace")]
    pub misfire_grace: Duration,
    #[serde(with = "serde_secs", default = "default_shutdown_grace")]
    pub shutdown_grace: Duration,
    /// Only one instance of a given job may run concurrently; always true in
    /// this design, kept explicit to document the invariant.
    #[serde(default = "default_true")]
    pub max_instances_one: bool,
}

fn default_misfire_grace() -> Duration {
    Duration::from_secs(30)
}

fn default_shutdown_grace() -> Duration {
    Duration::from_secs(30)
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub output: LogOutput,
    #[serde(default)]
    pub directory: String,
}

/// Runtime-only settings that do not map to any wire protocol.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RuntimeConfig {
    /// Offset applied when flooring naive bucket timestamps, overridable via
    /// the `DB_SAVE_OFFSET_HOURS` environment variable.
    #[serde(default)]
    pub db_save_offset_hours: i64,
    /// IANA time zone name used only when flooring bucket boundaries or
    /// rendering operator-facing timestamps; storage stays UTC.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    #[serde(default)]
    pub custom: HashMap<String, String>,
}

fn default_time_zone() -> String {
    "UTC".to_string()
}

impl Config {
    /// Loads the configuration from YAML, validates it, and returns the
    /// ready-to-use value.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        let mut cfg: Config =
            serde_yaml::from_str(&s).context("failed to parse config YAML")?;
        cfg.apply_env_overrides();
        cfg.validate_and_normalize()?;
        Ok(cfg)
    }

    /// Environment overrides matching the original service's `os.getenv`
    /// knobs (`DB_SAVE_OFFSET_HOURS`, `REDIS_TIME_ZONE`).
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("DB_SAVE_OFFSET_HOURS")
            && let Ok(parsed) = v.parse::<i64>()
        {
            self.runtime.db_save_offset_hours = parsed;
        }
        if let Ok(v) = std::env::var("REDIS_TIME_ZONE") {
            self.runtime.time_zone = v;
        }
    }

    /// Validates invariants and normalizes derived fields.
    pub fn validate_and_normalize(&mut self) -> Result<()> {
        ensure!(
            !self.clients.is_empty() || !self.mcu_devices.is_empty(),
            "at least one PLC client or MCU device must be configured"
        );

        for c in &self.clients {
            ensure!(!c.name.is_empty(), "client name must not be empty");
            ensure!(!c.host.is_empty(), "client {} Host must not be empty", c.name);
            ensure!(
                c.connection.reconnect_delay <= c.connection.reconnect_delay_max,
                "client {}: reconnect_delay must not exceed reconnect_delay_max",
                c.name
            );
        }
        for d in &self.mcu_devices {
            ensure!(!d.name.is_empty(), "mcu device name must not be empty");
            ensure!(!d.port.is_empty(), "mcu device {} port must not be empty", d.name);
            ensure!(d.baud_rate > 0, "mcu device {}: baud_rate must be > 0", d.name);
            d.node_serial_bytes()?;
        }

        for (name, group) in &self.memory_groups {
            group.validate().map_err(|e| anyhow::anyhow!("memory group {name:?}: {e}"))?;
        }
        for c in &self.clients {
            for group_name in &c.memory_groups {
                ensure!(
                    self.memory_groups.contains_key(group_name),
                    "client {}: references unknown memory group {:?}",
                    c.name,
                    group_name
                );
            }
        }
        for s in &self.sensor_nodes {
            if let Some(gateway) = &s.gateway {
                ensure!(
                    self.clients.iter().any(|c| &c.name == gateway),
                    "sensor node {}: references unknown gateway {:?}",
                    s.name,
                    gateway
                );
            }
        }
        for c in &self.control_nodes {
            if let Some(gateway) = &c.gateway {
                ensure!(
                    self.clients.iter().any(|client| &client.name == gateway),
                    "control node {}: references unknown gateway {:?}",
                    c.name,
                    gateway
                );
            }
        }

        self.runtime.time_zone.parse::<chrono_tz::Tz>().map_err(|_| {
            anyhow::anyhow!("runtime.time_zone {:?} is not a valid IANA zone", self.runtime.time_zone)
        })?;

        Ok(())
    }
}

/// Serde helpers for representing `Duration` as a number of seconds.
mod serde_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}

/// Serde helpers for representing `Duration` as a number of milliseconds,
/// used for the sub-second reconnect backoff knobs.
mod serde_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let ms = u64::deserialize(d)?;
        Ok(Duration::from_millis(ms))
    }
}
