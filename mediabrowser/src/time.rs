//! Timestamps as Jellyfin and Emby send them
//!
//! The servers disagree on fractional-second precision and on how the zone is
//! written (`Z`, sometimes `ZZ`, or `+00:00`). Only second precision is kept
//! and the value is treated as naive UTC.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::MediaBrowserError;

const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MediaTime(pub NaiveDateTime);

impl MediaTime {
    /// Parse a server timestamp, with or without surrounding quotes.
    pub fn parse(raw: &str) -> Result<Self, MediaBrowserError> {
        let trimmed = raw.trim_start_matches('"').trim_end_matches(['"', 'Z']);
        let seconds = trimmed
            .rfind('.')
            .filter(|&dot| dot > 0)
            .map_or(trimmed, |dot| &trimmed[..dot]);
        NaiveDateTime::parse_from_str(seconds, FORMAT)
            .map(Self)
            .map_err(|e| MediaBrowserError::Parse(format!("invalid timestamp {raw:?}: {e}")))
    }

    #[must_use]
    pub const fn naive(&self) -> NaiveDateTime {
        self.0
    }
}

impl fmt::Display for MediaTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(FORMAT))
    }
}

impl From<NaiveDateTime> for MediaTime {
    fn from(value: NaiveDateTime) -> Self {
        Self(value)
    }
}

impl<'de> Deserialize<'de> for MediaTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl Serialize for MediaTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{}Z", self.0.format(FORMAT)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> MediaTime {
        MediaTime(
            NaiveDate::from_ymd_opt(y, mo, d)
                .unwrap()
                .and_hms_opt(h, mi, s)
                .unwrap(),
        )
    }

    #[test]
    fn test_parse_server_formats() {
        let cases = [
            ("2021-01-27T03:16:36.28538ZZ", at(2021, 1, 27, 3, 16, 36)),
            ("\"2021-01-27T03:16:36.28538ZZ\"", at(2021, 1, 27, 3, 16, 36)),
            ("\"2021-01-27T03:16:36.28538Z\"", at(2021, 1, 27, 3, 16, 36)),
            ("\"2021-01-09T20:58:41.5907920+00:00\"", at(2021, 1, 9, 20, 58, 41)),
            ("2021-01-09T20:58:41", at(2021, 1, 9, 20, 58, 41)),
        ];
        for (raw, expected) in cases {
            assert_eq!(MediaTime::parse(raw).unwrap(), expected, "{raw}");
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(MediaTime::parse("yesterday").is_err());
        assert!(MediaTime::parse("").is_err());
    }

    #[test]
    fn test_json_field() {
        #[derive(Deserialize)]
        struct Wrapper {
            #[serde(rename = "LastLoginDate")]
            last_login: Option<MediaTime>,
        }

        let w: Wrapper =
            serde_json::from_str(r#"{"LastLoginDate":"2023-06-01T12:00:05.1234567Z"}"#).unwrap();
        assert_eq!(w.last_login, Some(at(2023, 6, 1, 12, 0, 5)));

        let w: Wrapper = serde_json::from_str(r#"{"LastLoginDate":null}"#).unwrap();
        assert!(w.last_login.is_none());
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&at(2021, 1, 27, 3, 16, 36)).unwrap();
        assert_eq!(json, "\"2021-01-27T03:16:36Z\"");
    }
}
