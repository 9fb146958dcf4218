//! Capability roles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A capability that can be granted to an address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Grants and revokes roles.
    Admin,
    /// Registers lectures and issues credentials.
    Issuer,
    /// Engages and releases the emergency halt.
    HaltController,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Issuer, Role::HaltController];

    /// Human-readable name of this role.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Issuer => "issuer",
            Self::HaltController => "halt_controller",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "admin" => Ok(Self::Admin),
            "issuer" => Ok(Self::Issuer),
            "halt_controller" => Ok(Self::HaltController),
            other => Err(format!("unknown role: {other}")),
        }
    }
}
