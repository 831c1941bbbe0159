use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use opsdesk_core::{DeliveryId, Entity};

/// Maximum number of records returned by a delivery-history lookup.
pub const DELIVERY_HISTORY_LIMIT: usize = 100;

/// A past delivery to a customer (read-only history).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub id: DeliveryId,
    pub customer_code: String,
    pub delivered_on: NaiveDate,
    pub product_code: String,
    pub product_name: String,
    pub quantity: i64,
    pub destination: Option<String>,
    pub note: Option<String>,
}

impl Entity for DeliveryRecord {
    type Id = DeliveryId;

    fn id(&self) -> DeliveryId {
        self.id
    }
}

/// Normalise a customer code from a query string; blank codes yield `None`.
pub fn normalize_customer_code(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|c| !c.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_customer_codes_are_ignored() {
        assert_eq!(normalize_customer_code(None), None);
        assert_eq!(normalize_customer_code(Some("")), None);
        assert_eq!(normalize_customer_code(Some("   ")), None);
        assert_eq!(normalize_customer_code(Some(" C001 ")), Some("C001"));
    }

    #[test]
    fn serializes_with_plain_numeric_id() {
        let record = DeliveryRecord {
            id: DeliveryId::new(7),
            customer_code: "C001".into(),
            delivered_on: NaiveDate::from_ymd_opt(2024, 6, 5).unwrap(),
            product_code: "A-100".into(),
            product_name: "Rice 5kg".into(),
            quantity: 3,
            destination: None,
            note: Some("left at reception".into()),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["delivered_on"], "2024-06-05");
        assert!(json["destination"].is_null());
    }
}
