//! # Configuration
//!
//! Loaded once at startup from YAML (or TOML when the file ends in `.toml`).
//!
//! ```yaml
//! contract-name: dao.hypha
//! doc-table-name: documents
//! edge-table-name: edges
//! dgraph-alpha-host: localhost
//! dgraph-alpha-http-port: 8080
//! prometheus-port: 2112
//! logical-ids:
//!   - type: Dho
//!     ids:
//!       - {content-group: details, name: rootNode, type: name}
//! custom-interfaces:
//!   - name: Votable
//!     types: [Proposal]
//!     fields:
//!       - {content-group: ballot, name: expiration, type: time_point, signature: true}
//!       - {name: vote, type: Vote}
//! ```
//!
//! `DOCCACHE_DGRAPH_HOST` overrides `dgraph-alpha-host`.

use doccache_core::codec;
use doccache_core::{
    ContentType, DoccacheError, Policy, SimplifiedField, SimplifiedInterface, Tables, TypeMapping,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Environment variable overriding the backend host.
pub const DGRAPH_HOST_ENV: &str = "DOCCACHE_DGRAPH_HOST";

const fn default_grpc_port() -> u16 {
    9080
}

const fn default_heart_beat_frequency() -> u64 {
    100
}

// =============================================================================
// CONFIG
// =============================================================================

/// Process configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub contract_name: String,
    pub doc_table_name: String,
    pub edge_table_name: String,
    #[serde(default)]
    pub firehose_endpoint: Option<String>,
    #[serde(default)]
    pub eos_endpoint: Option<String>,
    #[serde(default)]
    pub dfuse_api_key: Option<String>,
    pub dgraph_alpha_host: String,
    #[serde(default = "default_grpc_port")]
    pub dgraph_alpha_grpc_port: u16,
    pub dgraph_alpha_http_port: u16,
    pub prometheus_port: u16,
    #[serde(default)]
    pub start_block: i64,
    /// Blocks between upstream heartbeats.
    #[serde(default = "default_heart_beat_frequency")]
    pub heart_beat_frequency: u64,
    #[serde(default)]
    pub type_mappings: Vec<TypeMapping>,
    #[serde(default)]
    pub custom_interfaces: Vec<InterfaceConfig>,
    #[serde(default)]
    pub logical_ids: Vec<LogicalIdConfig>,
}

/// Logical-id fields of one induced type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LogicalIdConfig {
    #[serde(rename = "type")]
    pub type_name: String,
    pub ids: Vec<ContentFieldConfig>,
}

/// A content field addressed by group, label and content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContentFieldConfig {
    pub content_group: String,
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

impl ContentFieldConfig {
    /// The induced field name, e.g. `details_rootNode_n`.
    pub fn field_name(&self) -> Result<String, DoccacheError> {
        let t: ContentType = self.type_name.parse().map_err(|_| {
            DoccacheError::InvalidConfig(format!("unknown content type {}", self.type_name))
        })?;
        Ok(codec::field_name(&self.content_group, &self.name, t))
    }
}

/// A custom interface definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InterfaceConfig {
    pub name: String,
    #[serde(rename = "types", default)]
    pub applicable_types: Vec<String>,
    #[serde(default)]
    pub fields: Vec<InterfaceFieldConfig>,
}

/// An interface field: a content field when `content-group` is set,
/// otherwise a list edge to the object type named by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InterfaceFieldConfig {
    #[serde(default)]
    pub content_group: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub is_id: bool,
    #[serde(default)]
    pub signature: bool,
}

impl Config {
    /// Read, parse and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, DoccacheError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| DoccacheError::IoError(format!("{}: {e}", path.display())))?;
        let is_toml = path.extension().is_some_and(|e| e.eq_ignore_ascii_case("toml"));
        let mut config = if is_toml {
            Self::from_toml(&text)?
        } else {
            Self::from_yaml(&text)?
        };
        if let Ok(host) = std::env::var(DGRAPH_HOST_ENV) {
            if !host.trim().is_empty() {
                config.dgraph_alpha_host = host;
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Parse YAML text (no validation).
    pub fn from_yaml(text: &str) -> Result<Self, DoccacheError> {
        serde_yaml::from_str(text).map_err(|e| DoccacheError::InvalidConfig(e.to_string()))
    }

    /// Parse TOML text (no validation).
    pub fn from_toml(text: &str) -> Result<Self, DoccacheError> {
        toml::from_str(text).map_err(|e| DoccacheError::InvalidConfig(e.to_string()))
    }

    /// Check table names, logical ids and interfaces.
    pub fn validate(&self) -> Result<(), DoccacheError> {
        for (key, value) in [
            ("doc-table-name", &self.doc_table_name),
            ("edge-table-name", &self.edge_table_name),
            ("dgraph-alpha-host", &self.dgraph_alpha_host),
        ] {
            if value.trim().is_empty() {
                return Err(DoccacheError::InvalidConfig(format!("{key} must not be empty")));
            }
        }
        if self.doc_table_name == self.edge_table_name {
            return Err(DoccacheError::InvalidConfig(
                "doc-table-name and edge-table-name must differ".to_string(),
            ));
        }

        for entry in &self.logical_ids {
            for id in &entry.ids {
                match id.type_name.parse::<ContentType>() {
                    Ok(ContentType::Checksum256 | ContentType::Name | ContentType::String) => {}
                    _ => {
                        return Err(DoccacheError::InvalidConfig(format!(
                            "logical id {}.{}.{} must be a checksum256, name or string field",
                            entry.type_name, id.content_group, id.name
                        )));
                    }
                }
            }
        }

        self.policy().map(|_| ())
    }

    /// Data and edge table names.
    #[must_use]
    pub fn tables(&self) -> Tables {
        Tables {
            documents: self.doc_table_name.clone(),
            edges: self.edge_table_name.clone(),
        }
    }

    /// Admin endpoint of the backend.
    #[must_use]
    pub fn admin_url(&self) -> String {
        format!("http://{}:{}/admin", self.dgraph_alpha_host, self.dgraph_alpha_http_port)
    }

    /// GraphQL data endpoint of the backend.
    #[must_use]
    pub fn data_url(&self) -> String {
        format!("http://{}:{}/graphql", self.dgraph_alpha_host, self.dgraph_alpha_http_port)
    }

    /// The core policy described by this configuration.
    pub fn policy(&self) -> Result<Policy, DoccacheError> {
        let interfaces = self
            .custom_interfaces
            .iter()
            .map(InterfaceConfig::to_interface)
            .collect::<Result<Vec<_>, _>>()?;
        let mut logical_ids: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for entry in &self.logical_ids {
            let fields = logical_ids.entry(entry.type_name.clone()).or_default();
            for id in &entry.ids {
                fields.push(id.field_name()?);
            }
        }
        Ok(Policy {
            logical_ids,
            interfaces,
            type_mappings: self.type_mappings.clone(),
        })
    }
}

impl InterfaceConfig {
    /// Build the interface, naming content fields the way documents induce them.
    pub fn to_interface(&self) -> Result<SimplifiedInterface, DoccacheError> {
        let mut iface = SimplifiedInterface::new(&self.name);
        iface.applicable_types = self.applicable_types.iter().cloned().collect();

        for f in &self.fields {
            let field = match &f.content_group {
                Some(group) => {
                    let t: ContentType = f.type_name.parse().map_err(|_| {
                        DoccacheError::InvalidConfig(format!(
                            "interface {}: field {} has unknown type {}",
                            self.name, f.name, f.type_name
                        ))
                    })?;
                    let field = SimplifiedField::from_content(codec::field_name(group, &f.name, t), t);
                    if f.is_id { field.id() } else { field }
                }
                None => SimplifiedField::edge(&f.name, &f.type_name),
            };
            if f.signature {
                iface.insert_signature(field);
            } else {
                iface.insert(field);
            }
        }

        iface.validate()?;
        Ok(iface)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r"
contract-name: dao.hypha
doc-table-name: documents
edge-table-name: edges
dgraph-alpha-host: localhost
dgraph-alpha-http-port: 8080
prometheus-port: 2112
logical-ids:
  - type: Dho
    ids:
      - {content-group: details, name: name, type: name}
custom-interfaces:
  - name: Votable
    types: [Proposal]
    fields:
      - {content-group: ballot, name: expiration, type: time_point, signature: true}
      - {name: vote, type: Vote}
";

    #[test]
    fn parses_yaml_and_builds_policy() {
        let config = Config::from_yaml(YAML).expect("parse");
        config.validate().expect("valid");
        assert_eq!(config.dgraph_alpha_grpc_port, 9080);
        assert_eq!(config.admin_url(), "http://localhost:8080/admin");
        assert_eq!(config.data_url(), "http://localhost:8080/graphql");

        let policy = config.policy().expect("policy");
        assert_eq!(policy.logical_ids["Dho"], vec!["details_name_n".to_string()]);
        let votable = &policy.interfaces[0];
        assert!(votable.applicable_types.contains("Proposal"));
        assert!(votable.signature_fields.contains("ballot_expiration_t"));
        assert!(votable.fields.get("vote").is_some_and(SimplifiedField::is_edge));
    }

    #[test]
    fn rejects_non_string_logical_ids() {
        let mut config = Config::from_yaml(YAML).expect("parse");
        config.logical_ids.push(LogicalIdConfig {
            type_name: "Period".into(),
            ids: vec![ContentFieldConfig {
                content_group: "details".into(),
                name: "number".into(),
                type_name: "int64".into(),
            }],
        });
        assert!(matches!(config.validate(), Err(DoccacheError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_interface_without_rules() {
        let mut config = Config::from_yaml(YAML).expect("parse");
        config.custom_interfaces.push(InterfaceConfig {
            name: "Empty".into(),
            applicable_types: Vec::new(),
            fields: Vec::new(),
        });
        assert!(matches!(config.validate(), Err(DoccacheError::InvalidInterface { .. })));
    }
}
