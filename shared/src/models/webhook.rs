//! Payment webhook models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Processing status of a recorded webhook delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(
    feature = "db",
    sqlx(type_name = "webhook_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum WebhookStatus {
    /// Settled against an existing order
    Processed,
    /// Arrived before its order existed; waiting for reconciliation
    PendingOrder,
}

/// Recorded webhook delivery
///
/// The unique `idempotency_key` is the idempotency primitive: duplicate
/// deliveries collapse onto one row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct WebhookLog {
    pub id: i64,
    pub idempotency_key: String,
    pub payload: serde_json::Value,
    pub status: WebhookStatus,
    pub processed_at: DateTime<Utc>,
}

/// Upstream payment outcome for an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub order_id: i64,
    /// "success" or "failed"; anything else is rejected
    pub payment_status: String,
    pub idempotency_key: String,
}

impl WebhookPayload {
    pub fn is_success(&self) -> bool {
        self.payment_status == "success"
    }

    pub fn is_failed(&self) -> bool {
        self.payment_status == "failed"
    }
}

/// Webhook processing outcome returned to the payment provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookOutcome {
    /// success | failed | already_processed | pending_order
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<i64>,
}

impl WebhookOutcome {
    pub fn settled(status: &str, order_id: i64) -> Self {
        Self {
            status: status.to_string(),
            message: format!("Payment outcome '{status}' applied"),
            order_id: Some(order_id),
        }
    }

    pub fn already_processed() -> Self {
        Self {
            status: "already_processed".to_string(),
            message: "Webhook already processed".to_string(),
            order_id: None,
        }
    }

    pub fn pending_order(order_id: i64) -> Self {
        Self {
            status: "pending_order".to_string(),
            message: "Order not found yet, webhook stored for reconciliation".to_string(),
            order_id: Some(order_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_status_checks() {
        let mut payload = WebhookPayload {
            order_id: 1,
            payment_status: "success".to_string(),
            idempotency_key: "k1".to_string(),
        };
        assert!(payload.is_success());
        assert!(!payload.is_failed());

        payload.payment_status = "failed".to_string();
        assert!(payload.is_failed());

        payload.payment_status = "refunded".to_string();
        assert!(!payload.is_success() && !payload.is_failed());
    }

    #[test]
    fn test_outcome_serialization() {
        let out = WebhookOutcome::already_processed();
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["status"], "already_processed");
        assert!(json.get("order_id").is_none());

        let out = WebhookOutcome::pending_order(99999);
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["status"], "pending_order");
        assert_eq!(json["order_id"], 99999);
    }

    #[test]
    fn test_webhook_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&WebhookStatus::PendingOrder).unwrap(),
            "\"pending_order\""
        );
    }
}
