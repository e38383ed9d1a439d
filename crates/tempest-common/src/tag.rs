//! Tag identifier for weather types.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Identifying tag of a weather type (e.g. `"weather.rain"`).
///
/// Tags are cheap to clone and compare; catalog entries are authored
/// with static strings, snapshots restore them as owned strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeatherTag(Cow<'static, str>);

impl WeatherTag {
    /// Creates a tag from a string.
    #[must_use]
    pub fn new(tag: impl Into<Cow<'static, str>>) -> Self {
        Self(tag.into())
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WeatherTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for WeatherTag {
    fn from(s: &'static str) -> Self {
        Self::new(s)
    }
}

impl From<String> for WeatherTag {
    fn from(s: String) -> Self {
        Self(Cow::Owned(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_display() {
        let tag = WeatherTag::new("weather.storm");
        assert_eq!(tag.to_string(), "weather.storm");
        assert_eq!(tag.as_str(), "weather.storm");
    }

    #[test]
    fn test_tag_from_owned() {
        let tag: WeatherTag = String::from("weather.fog").into();
        assert_eq!(tag, WeatherTag::new("weather.fog"));
    }
}
