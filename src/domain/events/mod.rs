//! Domain events
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::aggregates::OrderStatus;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "aggregate", content = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    Product(ProductEvent),
    Order(OrderEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProductEvent {
    Created { product_id: String, name: String },
    PriceChanged { product_id: String, price: Decimal },
    StockChanged { product_id: String, stock: u32 },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Created { order_id: String, customer_id: String },
    Confirmed { order_id: String, total: Decimal },
    Advanced { order_id: String, status: OrderStatus },
    Cancelled { order_id: String, restockable_units: u32 },
}

impl DomainEvent {
    /// Messaging subject, e.g. `cafeteria.order.confirmed`.
    pub fn subject(&self) -> String {
        let (aggregate, name) = match self {
            Self::Product(ProductEvent::Created { .. }) => ("product", "created"),
            Self::Product(ProductEvent::PriceChanged { .. }) => ("product", "price_changed"),
            Self::Product(ProductEvent::StockChanged { .. }) => ("product", "stock_changed"),
            Self::Order(OrderEvent::Created { .. }) => ("order", "created"),
            Self::Order(OrderEvent::Confirmed { .. }) => ("order", "confirmed"),
            Self::Order(OrderEvent::Advanced { .. }) => ("order", "advanced"),
            Self::Order(OrderEvent::Cancelled { .. }) => ("order", "cancelled"),
        };
        format!("cafeteria.{aggregate}.{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_subject_and_payload() {
        let event = DomainEvent::Order(OrderEvent::Confirmed { order_id: "o-1".into(), total: Decimal::new(6000, 0) });
        assert_eq!(event.subject(), "cafeteria.order.confirmed");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["aggregate"], "order");
        assert_eq!(json["event"]["type"], "confirmed");
        assert_eq!(json["event"]["order_id"], "o-1");
    }
}
