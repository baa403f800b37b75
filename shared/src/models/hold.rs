//! Stock hold model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Time-bounded stock reservation
///
/// A fresh hold moves into exactly one of `used` (converted into an order)
/// or `released` (given back, by caller or expiry sweep). Both flags are
/// monotone: once set they never clear, and they are mutually exclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Hold {
    pub id: i64,
    pub product_id: i64,
    pub qty: i32,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub released: bool,
    pub created_at: DateTime<Utc>,
}

impl Hold {
    /// A hold still counts against stock and can become an order
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.used && !self.released && self.expires_at > now
    }
}

/// Create hold payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldCreate {
    pub product_id: i64,
    pub qty: i32,
}

/// Create hold response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldCreated {
    pub hold_id: i64,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn hold(used: bool, released: bool, expires_in: Duration) -> Hold {
        let now = Utc::now();
        Hold {
            id: 1,
            product_id: 1,
            qty: 2,
            expires_at: now + expires_in,
            used,
            released,
            created_at: now,
        }
    }

    #[test]
    fn test_fresh_unexpired_hold_is_active() {
        assert!(hold(false, false, Duration::minutes(2)).is_active(Utc::now()));
    }

    #[test]
    fn test_used_released_or_expired_is_not_active() {
        let now = Utc::now();
        assert!(!hold(true, false, Duration::minutes(2)).is_active(now));
        assert!(!hold(false, true, Duration::minutes(2)).is_active(now));
        assert!(!hold(false, false, Duration::minutes(-1)).is_active(now));
    }

    #[test]
    fn test_expires_at_serializes_as_utc_iso8601() {
        let created = HoldCreated {
            hold_id: 7,
            expires_at: DateTime::parse_from_rfc3339("2025-11-29T14:32:00Z")
                .unwrap()
                .with_timezone(&Utc),
        };
        let json = serde_json::to_value(&created).unwrap();
        assert_eq!(json["expires_at"], "2025-11-29T14:32:00Z");
    }
}
