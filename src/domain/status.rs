use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The closed set of order states. Serialized with the values the order service uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    #[serde(rename = "PENDENTE")]
    Pending,
    #[serde(rename = "PROCESSANDO")]
    Processing,
    #[serde(rename = "ENVIADO")]
    Shipped,
    #[serde(rename = "CANCELADO")]
    Canceled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Canceled,
    ];

    pub const fn as_wire(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDENTE",
            OrderStatus::Processing => "PROCESSANDO",
            OrderStatus::Shipped => "ENVIADO",
            OrderStatus::Canceled => "CANCELADO",
        }
    }

    const fn english_name(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Canceled => "CANCELED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Accepts the wire value or the English name, in any case.
impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        OrderStatus::ALL
            .into_iter()
            .find(|status| {
                wanted.eq_ignore_ascii_case(status.as_wire())
                    || wanted.eq_ignore_ascii_case(status.english_name())
            })
            .ok_or_else(|| ValidationError::UnknownStatus(s.to_string()))
    }
}
