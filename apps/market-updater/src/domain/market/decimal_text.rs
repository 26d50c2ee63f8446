//! Exact decimal text for monetary values.
//!
//! Provider prices arrive as JSON numbers such as `67234.51861342378`.
//! Decoding them into `f64` would round them, so the verbatim number text
//! is kept and written as-is.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// Verbatim JSON number text.
///
/// Always holds a syntactically valid JSON number (`-12.5`, `3`, `1.2e-7`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DecimalText(String);

impl DecimalText {
    /// Validate and wrap number text.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDecimalText` if `text` is not a JSON number.
    pub fn parse(text: &str) -> Result<Self, InvalidDecimalText> {
        let trimmed = text.trim();
        if serde_json::Number::from_str(trimmed).is_err() {
            return Err(InvalidDecimalText(text.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The number text exactly as received.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DecimalText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DecimalText {
    type Err = InvalidDecimalText;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for DecimalText {
    /// Only supported by `serde_json`, which can hand out the raw number text.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        Self::parse(raw.get()).map_err(de::Error::custom)
    }
}

/// Text that is not a JSON number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a decimal number: {0:?}")]
pub struct InvalidDecimalText(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("0" ; "zero")]
    #[test_case("-12.5" ; "negative")]
    #[test_case("67234.51861342378123456" ; "long fraction")]
    #[test_case("1.2e-7" ; "exponent")]
    fn accepts_json_numbers(text: &str) {
        let value = DecimalText::parse(text).unwrap();
        assert_eq!(value.as_str(), text);
    }

    #[test_case("" ; "empty")]
    #[test_case("abc" ; "word")]
    #[test_case("\"12.5\"" ; "quoted")]
    #[test_case("1." ; "trailing dot")]
    #[test_case("NaN" ; "nan")]
    fn rejects_non_numbers(text: &str) {
        assert!(DecimalText::parse(text).is_err());
    }

    #[test]
    fn deserialize_keeps_wire_text() {
        let value: DecimalText = serde_json::from_str("0.1000000000000000055511151231257827").unwrap();
        assert_eq!(value.as_str(), "0.1000000000000000055511151231257827");
    }

    #[test]
    fn deserialize_rejects_string_values() {
        let result: Result<DecimalText, _> = serde_json::from_str("\"12.5\"");
        assert!(result.is_err());
    }

    #[test]
    fn serialize_is_transparent() {
        let value = DecimalText::parse("42.10").unwrap();
        assert_eq!(serde_json::to_string(&value).unwrap(), "\"42.10\"");
    }
}
