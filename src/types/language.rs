//! Defines the languages Airly can phrase its index descriptions in.

use crate::types::config::ConfigError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Language used for the human-readable parts of a response (index description and advice).
///
/// Numeric values are identical in every language; only text changes. The language also
/// decides which "no sensors in this area" sentinel a response is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Pl,
}

impl Language {
    /// All supported languages, in the order offered to users.
    pub const ALL: [Language; 2] = [Language::En, Language::Pl];

    /// The tag sent in the `Accept-Language` header.
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Pl => "pl",
        }
    }

    /// The index description Airly returns when no sensor covers the requested point.
    pub fn no_sensors_sentinel(&self) -> &'static str {
        match self {
            Language::En => "There are no Airly sensors in this area yet.",
            Language::Pl => "Nie mamy jeszcze czujników Airly w tej okolicy.",
        }
    }

    pub fn is_no_sensors_sentinel(&self, description: &str) -> bool {
        description == self.no_sensors_sentinel()
    }
}

/// Allows formatting a `Language` using its tag.
///
/// # Examples
///
/// ```
/// use airly::Language;
///
/// assert_eq!(Language::Pl.to_string(), "pl");
/// ```
impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|language| language.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnsupportedLanguage(s.to_string()))
    }
}

/// Accepts the same spellings as [`FromStr`], so `"PL"` and `"pl"` both deserialize.
impl<'de> Deserialize<'de> for Language {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}
