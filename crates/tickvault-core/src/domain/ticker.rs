use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_TICKER_LEN: usize = 15;

/// Upper-cased equity ticker such as `AAPL` or `BRK.B`.
///
/// `.` and `-` only separate a share class from the root symbol, so each one
/// must sit between two alphanumeric characters (`BRK.B`, `BF-B`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyTicker);
        }

        let normalized = trimmed.to_ascii_uppercase();
        let len = normalized.chars().count();
        if len > MAX_TICKER_LEN {
            return Err(ValidationError::TickerTooLong {
                len,
                max: MAX_TICKER_LEN,
            });
        }

        if let Some(first) = normalized.chars().next() {
            if !first.is_ascii_alphabetic() {
                return Err(ValidationError::TickerInvalidStart { ch: first });
            }
        }

        let mut previous_separator = false;
        for (index, ch) in normalized.chars().enumerate() {
            let separator = is_class_separator(ch);
            if !(ch.is_ascii_alphanumeric() || separator) {
                return Err(ValidationError::TickerInvalidChar { ch, index });
            }
            if separator && (previous_separator || index + 1 == len) {
                return Err(ValidationError::TickerDanglingSeparator { ch, index });
            }
            previous_separator = separator;
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Root symbol without its share class: `BRK` for `BRK.B`.
    pub fn root(&self) -> &str {
        self.0
            .split(is_class_separator)
            .next()
            .unwrap_or(self.0.as_str())
    }
}

fn is_class_separator(ch: char) -> bool {
    ch == '.' || ch == '-'
}

impl Display for Ticker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Ticker {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Ticker {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Ticker> for String {
    fn from(value: Ticker) -> Self {
        value.0
    }
}
