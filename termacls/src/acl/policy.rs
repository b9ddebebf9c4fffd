//! Which grant channels make a system administerable.

use serde::{Deserialize, Serialize};

/// An independent route through which a system becomes administerable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemChannel {
    /// A manufacturer grant for the system's manufacturer.
    Manufacturer,
    /// A group grant for the system's hardware group.
    Group,
    /// A type grant for the type of the system's current deployment.
    DeploymentType,
    /// The account's customer operates the system.
    Operator,
}

impl SystemChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemChannel::Manufacturer => "manufacturer",
            SystemChannel::Group => "group",
            SystemChannel::DeploymentType => "deployment_type",
            SystemChannel::Operator => "operator",
        }
    }
}

impl std::fmt::Display for SystemChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SystemChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "manufacturer" => Ok(SystemChannel::Manufacturer),
            "group" => Ok(SystemChannel::Group),
            "deployment_type" | "type" => Ok(SystemChannel::DeploymentType),
            "operator" => Ok(SystemChannel::Operator),
            _ => Err(format!("Invalid system channel: {}", s)),
        }
    }
}

/// The channels OR'd together when deciding system administration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemPolicy {
    channels: Vec<SystemChannel>,
}

impl SystemPolicy {
    /// Build a policy from channels, dropping duplicates but keeping order.
    pub fn new(channels: impl IntoIterator<Item = SystemChannel>) -> Self {
        let mut unique = Vec::new();
        for channel in channels {
            if !unique.contains(&channel) {
                unique.push(channel);
            }
        }
        Self { channels: unique }
    }

    /// Manufacturer grants OR deployment-type grants.
    pub fn hybrid() -> Self {
        Self::new([SystemChannel::Manufacturer, SystemChannel::DeploymentType])
    }

    pub fn channels(&self) -> &[SystemChannel] {
        &self.channels
    }

    pub fn includes(&self, channel: SystemChannel) -> bool {
        self.channels.contains(&channel)
    }
}

impl Default for SystemPolicy {
    fn default() -> Self {
        Self::hybrid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_hybrid() {
        let policy = SystemPolicy::default();
        assert_eq!(
            policy.channels(),
            &[SystemChannel::Manufacturer, SystemChannel::DeploymentType]
        );
        assert!(!policy.includes(SystemChannel::Group));
    }

    #[test]
    fn test_new_drops_duplicates() {
        let policy = SystemPolicy::new([
            SystemChannel::Group,
            SystemChannel::Operator,
            SystemChannel::Group,
        ]);
        assert_eq!(
            policy.channels(),
            &[SystemChannel::Group, SystemChannel::Operator]
        );
    }

    #[test]
    fn test_parse_channel() {
        assert_eq!(
            "Manufacturer".parse::<SystemChannel>(),
            Ok(SystemChannel::Manufacturer)
        );
        assert_eq!(
            " deployment_type ".parse::<SystemChannel>(),
            Ok(SystemChannel::DeploymentType)
        );
        assert_eq!("type".parse::<SystemChannel>(), Ok(SystemChannel::DeploymentType));
        assert!("owner".parse::<SystemChannel>().is_err());
    }
}
