//! Configuration loading from disk.

// Tests touching DOCCACHE_DGRAPH_HOST are serialized by ENV_MUTEX.
#![allow(clippy::unwrap_used, clippy::panic)]

use doccache::config::{Config, DGRAPH_HOST_ENV};
use doccache_core::DoccacheError;
use std::io::Write;
use std::sync::{Mutex, MutexGuard};

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Holds the env lock and clears the override on drop.
struct EnvGuard {
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    fn acquire() -> Self {
        let guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        // SAFETY: env access is serialized by ENV_MUTEX.
        unsafe { std::env::remove_var(DGRAPH_HOST_ENV) };
        Self { _guard: guard }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        // SAFETY: env access is serialized by ENV_MUTEX.
        unsafe { std::env::remove_var(DGRAPH_HOST_ENV) };
    }
}

fn write_config(suffix: &str, text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

const YAML: &str = r"
contract-name: dao.hypha
doc-table-name: documents
edge-table-name: edges
dgraph-alpha-host: localhost
dgraph-alpha-http-port: 8080
prometheus-port: 2112
start-block: 150000000
type-mappings:
  - type: Payout
    labels:
      details: [recipient]
logical-ids:
  - type: Dho
    ids:
      - {content-group: details, name: rootNode, type: name}
custom-interfaces:
  - name: Votable
    types: [Proposal]
    fields:
      - {content-group: ballot, name: expiration, type: time_point, signature: true}
      - {content-group: details, name: title, type: string, is-id: false}
      - {name: vote, type: Vote}
";

const TOML: &str = r#"
contract-name = "dao.hypha"
doc-table-name = "documents"
edge-table-name = "edges"
dgraph-alpha-host = "localhost"
dgraph-alpha-http-port = 8080
prometheus-port = 2112

[[logical-ids]]
type = "Dho"

[[logical-ids.ids]]
content-group = "details"
name = "rootNode"
type = "name"

[[custom-interfaces]]
name = "Votable"
types = ["Proposal"]

[[custom-interfaces.fields]]
content-group = "ballot"
name = "expiration"
type = "time_point"
signature = true
"#;

#[test]
fn loads_yaml() {
    let _env = EnvGuard::acquire();
    let file = write_config(".yml", YAML);

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.contract_name, "dao.hypha");
    assert_eq!(config.start_block, 150_000_000);
    assert_eq!(config.heart_beat_frequency, 100);
    assert_eq!(config.tables().documents, "documents");

    let policy = config.policy().unwrap();
    assert_eq!(policy.type_mappings[0].type_name, "Payout");
    let votable = &policy.interfaces[0];
    assert!(votable.applicable_types.contains("Proposal"));
    assert!(votable.fields.contains_key("details_title_s"));
}

#[test]
fn loads_toml_by_extension() {
    let _env = EnvGuard::acquire();
    let file = write_config(".toml", TOML);

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.dgraph_alpha_http_port, 8080);
    assert_eq!(config.logical_ids[0].type_name, "Dho");
    assert_eq!(config.logical_ids[0].ids[0].field_name().unwrap(), "details_rootNode_n");
    assert!(config.custom_interfaces[0].applicable_types.contains(&"Proposal".to_string()));
    assert_eq!(config.custom_interfaces[0].fields[0].name, "expiration");
}

#[test]
fn loads_logical_ids_and_interface_types() {
    let _env = EnvGuard::acquire();
    let text = r"
contract-name: dao.hypha
doc-table-name: documents
edge-table-name: edges
dgraph-alpha-host: localhost
dgraph-alpha-http-port: 8080
prometheus-port: 2112
logical-ids:
  - type: Dho
    ids: [{content-group: details, name: name, type: name}]
  - type: Period
    ids:
      - {content-group: details, name: hash, type: checksum256}
      - {content-group: details, name: label, type: string}
custom-interfaces:
  - name: Votable
    types: [Proposal]
    fields:
      - {content-group: ballot, name: expiration, type: time_point, signature: true}
";
    let file = write_config(".yml", text);

    let policy = Config::load(file.path()).unwrap().policy().unwrap();
    assert_eq!(policy.logical_ids["Dho"], vec!["details_name_n".to_string()]);
    assert_eq!(
        policy.logical_ids["Period"],
        vec!["details_hash_c".to_string(), "details_label_s".to_string()]
    );
    assert!(policy.interfaces[0].applicable_types.contains("Proposal"));
}

#[test]
fn rejects_int_logical_id() {
    let _env = EnvGuard::acquire();
    let text = YAML.replace("type: name}", "type: int64}");
    let file = write_config(".yml", &text);

    assert!(matches!(Config::load(file.path()), Err(DoccacheError::InvalidConfig(_))));
}

#[test]
fn env_overrides_backend_host() {
    let _env = EnvGuard::acquire();
    // SAFETY: env access is serialized by ENV_MUTEX.
    unsafe { std::env::set_var(DGRAPH_HOST_ENV, "alpha.internal") };
    let file = write_config(".yaml", YAML);

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.dgraph_alpha_host, "alpha.internal");
    assert_eq!(config.data_url(), "http://alpha.internal:8080/graphql");
}

#[test]
fn rejects_identical_table_names() {
    let _env = EnvGuard::acquire();
    let file = write_config(".yml", &YAML.replace("edge-table-name: edges", "edge-table-name: documents"));

    assert!(matches!(Config::load(file.path()), Err(DoccacheError::InvalidConfig(_))));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = Config::load(&dir.path().join("absent.yml"));
    assert!(matches!(result, Err(DoccacheError::IoError(_))));
}

#[test]
fn malformed_yaml_is_invalid_config() {
    let _env = EnvGuard::acquire();
    let file = write_config(".yml", "contract-name: [unclosed");
    assert!(matches!(Config::load(file.path()), Err(DoccacheError::InvalidConfig(_))));
}
