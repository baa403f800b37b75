//! Money calculation utilities using rust_decimal for precision
//!
//! All monetary values are carried as `Decimal` (Postgres `NUMERIC`) and
//! rounded to two fractional digits. Serialization on the API surface uses
//! fixed two-digit strings ("49.99"), never floats.

use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Round a monetary value to two decimal places, half away from zero
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Compute an order amount: `unit_price * qty`, rounded to two decimals
pub fn line_amount(unit_price: Decimal, qty: i32) -> Decimal {
    round_money(unit_price * Decimal::from(qty))
}

/// Format a monetary value with exactly two fractional digits
pub fn format_money(value: Decimal) -> String {
    format!("{:.2}", round_money(value))
}

/// Serde helper: serialize `Decimal` amounts as fixed two-digit strings
///
/// Usage: `#[serde(with = "shared::money::serde_string")]`
pub mod serde_string {
    use super::{format_money, Decimal};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    pub fn serialize<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_money(*value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Decimal::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_line_amount() {
        assert_eq!(line_amount(dec!(49.99), 5), dec!(249.95));
        assert_eq!(line_amount(dec!(10.00), 3), dec!(30.00));
        assert_eq!(line_amount(dec!(0.01), 100), dec!(1.00));
    }

    #[test]
    fn test_line_amount_no_float_drift() {
        // 0.1 + 0.2 style accumulation stays exact in Decimal
        let mut total = Decimal::ZERO;
        for _ in 0..1000 {
            total += dec!(0.01);
        }
        assert_eq!(total, dec!(10.00));
    }

    #[test]
    fn test_round_money_half_up() {
        assert_eq!(round_money(dec!(0.005)), dec!(0.01));
        assert_eq!(round_money(dec!(0.004)), dec!(0.00));
        assert_eq!(round_money(dec!(2.675)), dec!(2.68));
    }

    #[test]
    fn test_format_money_two_digits() {
        assert_eq!(format_money(dec!(49.99)), "49.99");
        assert_eq!(format_money(dec!(50)), "50.00");
        assert_eq!(format_money(dec!(0.5)), "0.50");
        assert_eq!(format_money(dec!(249.95)), "249.95");
    }

    #[test]
    fn test_serde_string_round_trip() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Payload {
            #[serde(with = "super::serde_string")]
            amount: Decimal,
        }

        let json = serde_json::to_string(&Payload { amount: dec!(49.9) }).unwrap();
        assert_eq!(json, r#"{"amount":"49.90"}"#);

        let back: Payload = serde_json::from_str(r#"{"amount":"249.95"}"#).unwrap();
        assert_eq!(back.amount, dec!(249.95));
    }
}
