use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// How a payment relates to the reservation's net amount.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    Full,
    Partial,
    Balance,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Full => "FULL",
            PaymentType::Partial => "PARTIAL",
            PaymentType::Balance => "BALANCE",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "FULL" => Some(PaymentType::Full),
            "PARTIAL" => Some(PaymentType::Partial),
            "BALANCE" => Some(PaymentType::Balance),
            _ => None,
        }
    }
}

impl Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
