//! Status and kind enums shared between the gateway payloads and front ends.
//!
//! The gateway spells these in `SCREAMING_SNAKE_CASE`. Values this client does
//! not know about decode into `Unknown` instead of failing the whole payload.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// Orders can be cancelled by the customer until they start processing.
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Delivered and cancelled orders do not change any more.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Processing => "PROCESSING",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
            Self::Unknown => "UNKNOWN",
        };
        f.pad(s)
    }
}

/// How the customer pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    Cod,
    Card,
    Upi,
    NetBanking,
    #[serde(other)]
    Unknown,
}

impl PaymentMethod {
    /// Human readable name shown at checkout and in order history.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Cod => "Cash on Delivery",
            Self::Card => "Credit/Debit Card",
            Self::Upi => "UPI Payment",
            Self::NetBanking => "Net Banking",
            Self::Unknown => "Other",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "COD" => Ok(Self::Cod),
            "CARD" => Ok(Self::Card),
            "UPI" => Ok(Self::Upi),
            "NET_BANKING" => Ok(Self::NetBanking),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// Payment state reported on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
    #[serde(other)]
    Unknown,
}

/// Kind of saved address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AddressType {
    #[default]
    Home,
    Work,
    Other,
}

impl std::str::FromStr for AddressType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HOME" => Ok(Self::Home),
            "WORK" => Ok(Self::Work),
            "OTHER" => Ok(Self::Other),
            _ => Err(format!("invalid address type: {s}")),
        }
    }
}

/// Role of the authenticated account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[default]
    Customer,
    Artisan,
    Admin,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Artisan => write!(f, "artisan"),
            Self::Admin => write!(f, "admin"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_wire_format() {
        let status: OrderStatus = serde_json::from_str("\"SHIPPED\"").unwrap();
        assert_eq!(status, OrderStatus::Shipped);
        assert_eq!(
            serde_json::to_string(&OrderStatus::Cancelled).unwrap(),
            "\"CANCELLED\""
        );
    }

    #[test]
    fn test_unknown_values_do_not_fail() {
        let status: OrderStatus = serde_json::from_str("\"RETURNED\"").unwrap();
        assert_eq!(status, OrderStatus::Unknown);
        let role: UserRole = serde_json::from_str("\"SUPPORT\"").unwrap();
        assert_eq!(role, UserRole::Unknown);
    }

    #[test]
    fn test_cancellable_statuses() {
        assert!(OrderStatus::Pending.is_cancellable());
        assert!(OrderStatus::Confirmed.is_cancellable());
        assert!(!OrderStatus::Processing.is_cancellable());
        assert!(!OrderStatus::Shipped.is_cancellable());
        assert!(!OrderStatus::Cancelled.is_cancellable());
    }

    #[test]
    fn test_payment_method_names() {
        assert_eq!(PaymentMethod::Cod.display_name(), "Cash on Delivery");
        assert_eq!(PaymentMethod::NetBanking.display_name(), "Net Banking");
        assert_eq!(
            serde_json::to_string(&PaymentMethod::NetBanking).unwrap(),
            "\"NET_BANKING\""
        );
    }

    #[test]
    fn test_payment_method_from_str() {
        assert_eq!("upi".parse::<PaymentMethod>().unwrap(), PaymentMethod::Upi);
        assert_eq!(
            "net-banking".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::NetBanking
        );
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_address_type_from_str() {
        assert_eq!("work".parse::<AddressType>().unwrap(), AddressType::Work);
        assert!("moon".parse::<AddressType>().is_err());
    }
}
