//! Serde support for the timestamps stored with categories and transactions.
//!
//! Timestamps are always written in UTC with six fractional digits, e.g.
//! `2024-01-15T10:30:00.000000Z`. Because the width never changes, sorting
//! the text gives the same order as sorting the timestamps, which lets the
//! stores sort by date without knowing anything about dates.
//!
//! Use with `#[serde(with = "crate::timestamp")]`.

use serde::{Deserialize, Deserializer, Serializer, de, ser};
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, UtcOffset,
    format_description::{BorrowedFormatItem, well_known::Rfc3339},
    macros::format_description,
};

const STORED_FORMAT: &[BorrowedFormatItem<'_>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"
);

const NAIVE_DATE_TIME_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]");

const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// The current time in UTC truncated to the precision that is stored.
pub fn now() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();

    now.replace_microsecond(now.microsecond()).unwrap_or(now)
}

/// Format `timestamp` the way it is stored and sent to clients.
pub fn format(timestamp: &OffsetDateTime) -> Result<String, time::error::Format> {
    timestamp.to_offset(UtcOffset::UTC).format(STORED_FORMAT)
}

/// Parse a timestamp sent by a client or read back from a store.
///
/// Accepts RFC 3339 with any offset, ISO 8601 date-times without an offset
/// (taken to be UTC) and plain dates (midnight UTC).
pub fn parse(text: &str) -> Result<OffsetDateTime, time::error::Parse> {
    let text = text.trim();

    OffsetDateTime::parse(text, &Rfc3339)
        .or_else(|_| {
            PrimitiveDateTime::parse(text, NAIVE_DATE_TIME_FORMAT)
                .map(PrimitiveDateTime::assume_utc)
        })
        .or_else(|_| Date::parse(text, DATE_FORMAT).map(|date| date.midnight().assume_utc()))
        .map(|timestamp| timestamp.to_offset(UtcOffset::UTC))
}

/// Serialize a timestamp in the stored format.
pub fn serialize<S>(timestamp: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let text = format(timestamp).map_err(ser::Error::custom)?;

    serializer.serialize_str(&text)
}

/// Deserialize a timestamp from any of the formats accepted by [parse].
pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;

    parse(&text)
        .map_err(|error| de::Error::custom(format!("invalid timestamp \"{text}\": {error}")))
}
