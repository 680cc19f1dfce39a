use serde::{Deserialize, Serialize};
use std::fmt;

/// Subscription tier of the caller. Variant order is the capability order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Free,
    Premium,
    Coach,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Free, Role::Premium, Role::Coach];

    /// Map a persisted subscription tier onto a role.
    ///
    /// Unknown or absent tiers resolve to [`Role::Free`].
    pub fn from_tier(tier: Option<&str>) -> Role {
        let Some(tier) = tier else {
            return Role::Free;
        };

        match tier.trim().to_ascii_lowercase().as_str() {
            "premium" => Role::Premium,
            "coach" => Role::Coach,
            _ => Role::Free,
        }
    }

    /// Whether this role may call a tool that requires `minimum`.
    pub fn satisfies(self, minimum: Option<Role>) -> bool {
        match minimum {
            Some(required) => self >= required,
            None => true,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Free => "free",
            Role::Premium => "premium",
            Role::Coach => "coach",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
