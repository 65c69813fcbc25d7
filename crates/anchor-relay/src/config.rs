//! Relay configuration
//!
//! Loaded from TOML, overridden by `ANCHOR_*` environment variables, then
//! validated. Every field has a default so an empty file is a valid config.

use anchor_core::{hash, Address, AnchorError, Hash, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// Environment variable overriding [`RelayConfig::namespace`]
pub const ENV_NAMESPACE: &str = "ANCHOR_NAMESPACE";
/// Environment variable overriding [`ServerConfig::bind_address`]
pub const ENV_BIND_ADDRESS: &str = "ANCHOR_BIND_ADDRESS";
/// Environment variable overriding [`LedgerConfig::root_commits_address`]
pub const ENV_ROOT_COMMITS_ADDRESS: &str = "ANCHOR_ROOT_COMMITS_ADDRESS";

/// Top-level relay configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelayConfig {
    /// Namespace string; its hash prefixes every relay-authored claim
    pub namespace: String,
    /// HTTP listener
    pub server: ServerConfig,
    /// Root-commits contract
    pub ledger: LedgerConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// `host:port` the HTTP listener binds
    pub bind_address: String,
}

/// Ledger settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    /// Contract holding committed relay roots
    pub root_commits_address: Address,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            namespace: "iden3.io".to_string(),
            server: ServerConfig::default(),
            ledger: LedgerConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".to_string(),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            root_commits_address: Address::ZERO,
        }
    }
}

impl RelayConfig {
    /// Defaults, or `path` when given, then environment overrides, then validation
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.merge_with_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AnchorError::invalid(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| AnchorError::invalid(format!("invalid config: {e}")))
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| AnchorError::internal(format!("failed to render config: {e}")))
    }

    /// Apply `ANCHOR_*` overrides from the process environment
    pub fn merge_with_env(&mut self) -> Result<()> {
        let vars = [ENV_NAMESPACE, ENV_BIND_ADDRESS, ENV_ROOT_COMMITS_ADDRESS]
            .into_iter()
            .filter_map(|name| std::env::var(name).ok().map(|value| (name, value)));
        self.merge_vars(vars)
    }

    /// Apply overrides from `(name, value)` pairs; unknown names are ignored
    pub fn merge_vars<'a>(
        &mut self,
        vars: impl IntoIterator<Item = (&'a str, String)>,
    ) -> Result<()> {
        for (name, value) in vars {
            match name {
                ENV_NAMESPACE => self.namespace = value,
                ENV_BIND_ADDRESS => self.server.bind_address = value,
                ENV_ROOT_COMMITS_ADDRESS => {
                    self.ledger.root_commits_address = Address::from_hex(&value)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Reject an empty namespace or an unparseable bind address
    pub fn validate(&self) -> Result<()> {
        if self.namespace.trim().is_empty() {
            return Err(AnchorError::invalid("namespace must not be empty"));
        }
        self.bind_socket_addr()?;
        Ok(())
    }

    /// Hash of the namespace string
    pub fn namespace_hash(&self) -> Hash {
        hash(self.namespace.as_bytes())
    }

    /// Parsed listener address
    pub fn bind_socket_addr(&self) -> Result<SocketAddr> {
        self.server.bind_address.parse().map_err(|e| {
            AnchorError::invalid(format!(
                "invalid bind address {:?}: {e}",
                self.server.bind_address
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        let config = RelayConfig::default();
        config.validate().unwrap();
        assert_eq!(config.namespace_hash(), hash(b"iden3.io"));
        assert_eq!(config.ledger.root_commits_address, Address::ZERO);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(RelayConfig::from_toml_str("").unwrap(), RelayConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = RelayConfig::from_toml_str(
            r#"
namespace = "example.org"

[server]
bind_address = "0.0.0.0:9000"
"#,
        )
        .unwrap();
        assert_eq!(config.namespace, "example.org");
        assert_eq!(config.server.bind_address, "0.0.0.0:9000");
        assert_eq!(config.ledger, LedgerConfig::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(RelayConfig::from_toml_str("colour = \"red\"").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[ledger]\nroot_commits_address = \"0x0101010101010101010101010101010101010101\""
        )
        .unwrap();
        let config = RelayConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.ledger.root_commits_address, Address([1; 20]));
    }

    #[test]
    fn test_merge_vars() {
        let mut config = RelayConfig::default();
        config
            .merge_vars([
                (ENV_NAMESPACE, "other".to_string()),
                (ENV_BIND_ADDRESS, "127.0.0.1:1".to_string()),
                (
                    ENV_ROOT_COMMITS_ADDRESS,
                    "0202020202020202020202020202020202020202".to_string(),
                ),
                ("UNRELATED", "x".to_string()),
            ])
            .unwrap();
        assert_eq!(config.namespace, "other");
        assert_eq!(config.server.bind_address, "127.0.0.1:1");
        assert_eq!(config.ledger.root_commits_address, Address([2; 20]));
    }

    #[test]
    fn test_bad_address_override_rejected() {
        let mut config = RelayConfig::default();
        assert!(config
            .merge_vars([(ENV_ROOT_COMMITS_ADDRESS, "0x12".to_string())])
            .is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = RelayConfig::default();
        config.namespace = "  ".into();
        assert!(config.validate().is_err());

        let mut config = RelayConfig::default();
        config.server.bind_address = "not an address".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip_renders() {
        let text = RelayConfig::default().to_toml_string().unwrap();
        assert!(text.contains("iden3.io"));
    }
}
