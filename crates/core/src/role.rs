use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Platform role.
///
/// The set is closed: any other string fails to parse (and to deserialize),
/// so an unrecognized role can never be granted access by accident.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Donor,
    Recipient,
    Logistics,
    Admin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Donor, Role::Recipient, Role::Logistics, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Donor => "donor",
            Role::Recipient => "recipient",
            Role::Logistics => "logistics",
            Role::Admin => "admin",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| DomainError::unknown_role(s))
    }
}
