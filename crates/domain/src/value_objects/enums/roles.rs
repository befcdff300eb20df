use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Municipality,
    Entrepreneur,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Municipality => "MUNICIPALITY",
            Role::Entrepreneur => "ENTREPRENEUR",
            Role::User => "USER",
        }
    }

    /// Accepts both bare names and the `ROLE_` prefixed form issued by the identity provider.
    pub fn from_str(value: &str) -> Option<Self> {
        let value = value.trim();
        let value = value.strip_prefix("ROLE_").unwrap_or(value);
        match value.to_ascii_uppercase().as_str() {
            "ADMIN" => Some(Role::Admin),
            "MUNICIPALITY" => Some(Role::Municipality),
            "ENTREPRENEUR" => Some(Role::Entrepreneur),
            "USER" => Some(Role::User),
            _ => None,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
