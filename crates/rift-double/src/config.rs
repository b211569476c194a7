//! Substitute configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Member names read by the substitute itself rather than recorded.
pub const RESERVED_MEMBERS: &[&str] = &[
    "returns",
    "returnsAsync",
    "andDoes",
    "received",
    "receivedWithAnyArgs",
    "didNotReceive",
    "didNotReceiveWithAnyArgs",
];

/// Name under which a member hands back the object itself.
pub const CONSTRUCTOR_MEMBER: &str = "constructor";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstituteConfig {
    /// Label attached to log events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Names probed by generic code (string conversion, length checks, ...).
    /// Reading one never creates a ledger entry.
    #[serde(default = "default_probe_members")]
    pub probe_members: Vec<String>,
}

fn default_probe_members() -> Vec<String> {
    [
        "valueOf",
        "$$typeof",
        "length",
        "toString",
        "inspect",
        "prototype",
        "name",
        "stack",
        "Symbol.toPrimitive",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for SubstituteConfig {
    fn default() -> Self {
        Self {
            name: None,
            probe_members: default_probe_members(),
        }
    }
}

impl SubstituteConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, anyhow::Error> {
        let config: SubstituteConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        for member in &self.probe_members {
            if member.trim().is_empty() {
                anyhow::bail!("Probe member names must not be empty");
            }
            if RESERVED_MEMBERS.contains(&member.as_str()) || member == CONSTRUCTOR_MEMBER {
                anyhow::bail!(
                    "'{}' is handled by the substitute itself and cannot be a probe member",
                    member
                );
            }
        }
        Ok(())
    }

    pub fn is_probe_member(&self, member: &str) -> bool {
        self.probe_members.iter().any(|m| m == member)
    }
}
