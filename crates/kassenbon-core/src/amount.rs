//! Locale-formatted decimal amounts.
//!
//! The receipt portal renders every amount with a comma decimal separator
//! (`"3,49"`), both in markup attributes and in printed text. This module is
//! the single place where that format is parsed and produced; the serde
//! adapters below keep the persisted JSON in the same comma format.

/// Parses a comma-decimal amount string.
///
/// Returns `Some(0.0)` for empty or whitespace-only input (an absent amount
/// is a zero amount on a receipt) and `None` when the text is present but
/// not numeric. Callers treat `None` as "value absent" and default or skip;
/// it is never a hard error.
#[must_use]
pub fn parse_amount(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.replace(',', ".").parse::<f64>().ok()
}

/// [`parse_amount`] over an optional input: a missing value parses to `0.0`.
#[must_use]
pub fn parse_amount_opt(text: Option<&str>) -> Option<f64> {
    match text {
        None => Some(0.0),
        Some(t) => parse_amount(t),
    }
}

/// Formats an amount to two fractional digits with a comma separator,
/// the inverse of [`parse_amount`] up to rounding (`3.49` → `"3,49"`).
#[must_use]
pub fn format_amount(value: f64) -> String {
    format!("{value:.2}").replace('.', ",")
}

/// Serde adapter: `f64` ↔ comma-decimal string (`7.47` ↔ `"7,47"`).
pub mod comma {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{format_amount, parse_amount};

    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_amount(*value))
    }

    /// # Errors
    ///
    /// Fails when the string is present but not a comma-decimal amount.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_amount(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("malformed amount {raw:?}")))
    }
}

/// Serde adapter: `Option<f64>` ↔ comma-decimal string or `null`.
pub mod comma_opt {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{format_amount, parse_amount};

    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_str(&format_amount(*v)),
            None => serializer.serialize_none(),
        }
    }

    /// # Errors
    ///
    /// Fails when a string is present but not a comma-decimal amount.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) => parse_amount(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("malformed amount {s:?}"))),
        }
    }
}
