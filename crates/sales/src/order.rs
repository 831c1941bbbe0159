use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use opsdesk_core::{DomainError, DomainResult, Entity, LineId, OrderId};

use crate::status::OrderStatus;

/// Product code of non-physical adjustment lines (discounts, rounding, fees).
///
/// These lines never appear in an export file and never count towards it.
pub const ADJUSTMENT_PRODUCT_CODE: &str = "9999";

/// An order header: date, customer and export status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_date: NaiveDate,
    pub customer_code: String,
    pub customer_name: String,
    pub status: OrderStatus,
}

impl Order {
    pub fn new(
        id: OrderId,
        order_date: NaiveDate,
        customer_code: impl Into<String>,
        customer_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            order_date,
            customer_code: customer_code.into(),
            customer_name: customer_name.into(),
            status: OrderStatus::NotExported,
        }
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_exported(&self) -> bool {
        self.status == OrderStatus::Exported
    }

    /// Transition to `Exported`. Re-marking an exported order is a no-op.
    pub fn mark_exported(&mut self) {
        self.status = OrderStatus::Exported;
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> OrderId {
        self.id
    }
}

/// One product row within an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: LineId,
    pub order_id: OrderId,
    pub product_code: String,
    pub product_name: String,
    pub quantity: i64,
    /// Price in the smallest currency unit (yen).
    pub unit_price: i64,
}

impl OrderLine {
    pub fn new(
        id: LineId,
        order_id: OrderId,
        product_code: impl Into<String>,
        product_name: impl Into<String>,
        quantity: i64,
        unit_price: i64,
    ) -> DomainResult<Self> {
        let product_code = product_code.into();
        if product_code.trim().is_empty() {
            return Err(DomainError::validation("product_code must not be empty"));
        }
        Ok(Self {
            id,
            order_id,
            product_code,
            product_name: product_name.into(),
            quantity,
            unit_price,
        })
    }

    pub fn is_adjustment(&self) -> bool {
        self.product_code == ADJUSTMENT_PRODUCT_CODE
    }

    pub fn amount(&self) -> i64 {
        self.quantity.saturating_mul(self.unit_price)
    }
}

impl Entity for OrderLine {
    type Id = LineId;

    fn id(&self) -> LineId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> Order {
        Order::new(
            OrderId::new(1),
            NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            "C001",
            "Tanaka Shoji",
        )
    }

    #[test]
    fn new_orders_start_not_exported() {
        assert_eq!(order().status, OrderStatus::NotExported);
        assert!(!order().is_exported());
    }

    #[test]
    fn mark_exported_is_idempotent() {
        let mut o = order();
        o.mark_exported();
        assert!(o.is_exported());
        let snapshot = o.clone();
        o.mark_exported();
        assert_eq!(o, snapshot);
    }

    #[test]
    fn identity_survives_status_change() {
        let before = order();
        let mut after = before.clone();
        after.mark_exported();
        assert!(before.same_identity_as(&after));
        assert_ne!(before, after);
    }

    #[test]
    fn adjustment_lines_are_recognised() {
        let line = OrderLine::new(LineId::new(1), OrderId::new(1), "9999", "Discount", 1, -500).unwrap();
        assert!(line.is_adjustment());
        let line = OrderLine::new(LineId::new(2), OrderId::new(1), "A-100", "Rice 5kg", 3, 2400).unwrap();
        assert!(!line.is_adjustment());
        assert_eq!(line.amount(), 7200);
    }

    #[test]
    fn empty_product_code_is_rejected() {
        let err = OrderLine::new(LineId::new(1), OrderId::new(1), " ", "x", 1, 1).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
