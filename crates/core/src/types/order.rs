//! Order-related enums shared between the cart and checkout flows.

use serde::{Deserialize, Serialize};

/// How the order reaches the customer.
///
/// Pickup orders never carry a shipping cost; ship orders require a
/// calculated carrier quote before checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryType {
    /// Customer collects at the store counter.
    Pickup,
    /// Carrier delivery to a street address.
    Ship,
}

/// Payment instrument selected at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Card payment through the gateway redirect.
    Card,
    /// Manual bank transfer.
    Transfer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_type_wire_format() {
        assert_eq!(
            serde_json::to_string(&DeliveryType::Pickup).unwrap(),
            "\"pickup\""
        );
        assert_eq!(
            serde_json::to_string(&DeliveryType::Ship).unwrap(),
            "\"ship\""
        );
    }

    #[test]
    fn test_payment_method_wire_format() {
        let m: PaymentMethod = serde_json::from_str("\"transfer\"").unwrap();
        assert_eq!(m, PaymentMethod::Transfer);
    }
}
