use std::collections::HashSet;
use std::net::SocketAddr;

use serde::Deserialize;
use secsgate_core::error::{Result, SecsGateError};
use secsgate_core::item::Capabilities;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(SecsGateError::BadRequest(format!(
                "unsupported config version: {}",
                self.version
            )));
        }
        if self.connections.is_empty() {
            return Err(SecsGateError::BadRequest("connections must not be empty".into()));
        }

        self.gateway.validate()?;

        let mut seen = HashSet::new();
        for c in &self.connections {
            c.validate()?;
            if !seen.insert(c.name.as_str()) {
                return Err(SecsGateError::BadRequest(format!(
                    "duplicate connection name: {}",
                    c.name
                )));
            }
        }
        Ok(())
    }

    pub fn connection(&self, name: &str) -> Option<&ConnectionConfig> {
        self.connections.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,

    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            templates_dir: default_templates_dir(),
            default_timeout_ms: default_timeout_ms(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.parse::<SocketAddr>().is_err() {
            return Err(SecsGateError::BadRequest(format!(
                "gateway.listen must be a valid SocketAddr: {}",
                self.listen
            )));
        }
        if self.templates_dir.trim().is_empty() {
            return Err(SecsGateError::BadRequest(
                "gateway.templates_dir must not be empty".into(),
            ));
        }
        if !(1..=600_000).contains(&self.default_timeout_ms) {
            return Err(SecsGateError::BadRequest(
                "gateway.default_timeout_ms must be between 1 and 600000".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_templates_dir() -> String {
    "templates".into()
}
fn default_timeout_ms() -> u64 {
    10_000
}

/// Transport implementation behind a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    #[default]
    Loopback,
}

/// How a loopback peer answers primaries that expect a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyMode {
    #[default]
    Echo,
    Silent,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    pub name: String,

    #[serde(default)]
    pub kind: ConnectionKind,

    #[serde(default)]
    pub reply: ReplyMode,

    #[serde(default = "default_reply_delay_ms")]
    pub reply_delay_ms: u64,

    #[serde(default)]
    pub capabilities: Capabilities,
}

impl ConnectionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(SecsGateError::BadRequest("connection name must not be empty".into()));
        }
        if self.reply_delay_ms > 60_000 {
            return Err(SecsGateError::BadRequest(format!(
                "connection {} reply_delay_ms must be <= 60000",
                self.name
            )));
        }
        Ok(())
    }
}

fn default_reply_delay_ms() -> u64 {
    5
}
