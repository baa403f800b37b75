//! Product model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money;

/// Product entity
///
/// `stock_total` is immutable after seeding; `stock_sold` only grows, and
/// only when an order settles as paid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub stock_total: i32,
    pub stock_sold: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product API view: catalog fields plus the derived available stock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductView {
    pub id: i64,
    pub name: String,
    #[serde(with = "money::serde_string")]
    pub price: Decimal,
    pub stock_total: i32,
    pub stock_sold: i32,
    pub available_stock: i64,
}

impl ProductView {
    pub fn from_product(product: Product, available_stock: i64) -> Self {
        Self {
            id: product.id,
            name: product.name,
            price: product.price,
            stock_total: product.stock_total,
            stock_sold: product.stock_sold,
            available_stock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_product_view_serializes_price_as_string() {
        let view = ProductView {
            id: 1,
            name: "Limited sneaker".to_string(),
            price: dec!(49.99),
            stock_total: 100,
            stock_sold: 5,
            available_stock: 95,
        };

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["price"], "49.99");
        assert_eq!(json["available_stock"], 95);
    }
}
