use xgt_core::cfg::config::Config;

#[test]
fn sample_config_loads_and_validates() {
    let mut cfg: Config = serde_yaml::from_str(SAMPLE).expect("parse sample config");
    cfg.validate_and_normalize().expect("sample config should validate");

    assert_eq!(cfg.clients.len(), 1);
    let client = &cfg.clients[0];
    assert_eq!(client.name, "plc-line1");
    assert_eq!(client.host, "192.168.10.11");
    assert_eq!(client.port, 2004);
    assert_eq!(client.memory_groups, vec!["line1_status".to_string()]);

    assert_eq!(cfg.mcu_devices.len(), 1);
    assert_eq!(cfg.mcu_devices[0].port, "/dev/ttyUSB0");

    let group = cfg.memory_groups.get("line1_status").expect("memory group present");
    assert_eq!(group.size_byte, 8);
    assert_eq!(group.variables.len(), 2);
}

#[test]
fn rejects_client_referencing_unknown_memory_group() {
    let mut cfg: Config = serde_yaml::from_str(SAMPLE).expect("parse sample config");
    cfg.clients[0].memory_groups = vec!["does_not_exist".to_string()];
    assert!(cfg.validate_and_normalize().is_err());
}

#[test]
fn rejects_empty_client_and_device_lists() {
    let mut cfg: Config = serde_yaml::from_str(SAMPLE).expect("parse sample config");
    cfg.clients.clear();
    cfg.mcu_devices.clear();
    assert!(cfg.validate_and_normalize().is_err());
}

#[test]
fn rejects_invalid_time_zone() {
    let mut cfg: Config = serde_yaml::from_str(SAMPLE).expect("parse sample config");
    cfg.runtime.time_zone = "Not/AZone".to_string();
    assert!(cfg.validate_and_normalize().is_err());
}

const SAMPLE: &str = r#"
memory_groups:
  line1_status:
    description: "line 1 sensor readings"
    size_byte: 8
    start_address: 0
    variables:
      - name: line1_temp
        device: "%MB"
        address: 0
        data_type: int
        unit: word
        scale: 0.1
        attributes: "MONITOR | RECORD"
        min: -40.0
        max: 150.0
      - name: line1_running
        device: "%MB"
        address: 2.0
        data_type: bool
        unit: bit
        scale: 1.0
        attributes: "MONITOR"

clients:
  - name: plc-line1
    Host: "192.168.10.11"
    Port: 2004
    memory_groups: ["line1_status"]
    cron:
      cron: "*/30 * * * * *"
    is_used: true
    connection:
      timeout: 5
      retries: 3
      reconnect_delay: 200
      reconnect_delay_max: 30000

mcu_devices:
  - name: mcu-bay1
    port: "/dev/ttyUSB0"
    baud_rate: 19200
    checksum: sum
    node_serial: "0011223344556677"
    cron:
      cron: "*/10 * * * * *"
    is_used: true
    connection:
      timeout: 2
      retries: 2
      reconnect_delay: 100
      reconnect_delay_max: 5000

sensor_nodes:
  - name: line1-sensor
    gateway: plc-line1
    sensor_type: temperature
    is_active: true

control_nodes: []

scheduler:
  misfire_grace: 30
  shutdown_grace: 30
  max_instances_one: true

logging:
  level: info
  output: stdout
  directory: ""

runtime:
  db_save_offset_hours: 0
  time_zone: "UTC"
  custom: {}
"#;
