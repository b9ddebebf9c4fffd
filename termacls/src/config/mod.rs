use serde::{Deserialize, Deserializer};
use service_core::config as core_config;
use service_core::error::AppError;

use crate::acl::{SystemChannel, SystemPolicy};
use crate::services::AclError;

/// Environment prefix, e.g. `ACL__DATABASE__URL`.
pub const ENV_PREFIX: &str = "ACL";

#[derive(Debug, Clone, Deserialize)]
pub struct AclConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    /// Channels OR'd for system administration, as a list or a
    /// comma-separated string.
    #[serde(
        default = "default_system_channels",
        deserialize_with = "deserialize_channels"
    )]
    pub system_channels: Vec<SystemChannel>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            system_channels: default_system_channels(),
        }
    }
}

fn default_service_name() -> String {
    "termacls".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_min_connections() -> u32 {
    1
}

fn default_system_channels() -> Vec<SystemChannel> {
    SystemPolicy::hybrid().channels().to_vec()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ChannelList {
    Many(Vec<String>),
    Csv(String),
}

fn deserialize_channels<'de, D>(deserializer: D) -> Result<Vec<SystemChannel>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match ChannelList::deserialize(deserializer)? {
        ChannelList::Many(items) => items,
        ChannelList::Csv(value) => value.split(',').map(str::to_string).collect(),
    };

    raw.iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse().map_err(serde::de::Error::custom))
        .collect()
}

impl AclConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let config: AclConfig = core_config::load(ENV_PREFIX)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AclError> {
        if self.database.url.trim().is_empty() {
            return Err(AclError::Config("database.url must not be empty".into()));
        }
        if self.database.max_connections == 0 {
            return Err(AclError::Config(
                "database.max_connections must be at least 1".into(),
            ));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(AclError::Config(format!(
                "database.min_connections ({}) exceeds max_connections ({})",
                self.database.min_connections, self.database.max_connections
            )));
        }

        let channels = &self.policy.system_channels;
        if channels.is_empty() {
            return Err(AclError::Config(
                "policy.system_channels must name at least one channel".into(),
            ));
        }
        for (i, channel) in channels.iter().enumerate() {
            if channels[..i].contains(channel) {
                return Err(AclError::Config(format!(
                    "policy.system_channels lists '{}' twice",
                    channel
                )));
            }
        }

        Ok(())
    }

    pub fn system_policy(&self) -> SystemPolicy {
        SystemPolicy::new(self.policy.system_channels.iter().copied())
    }
}
