use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A point in time as stored on a note document.
///
/// Notes written through the document store carry server-native
/// timestamp objects, while notes written offline carry plain dates.
/// Both shapes can coexist in one collection, so every comparison goes
/// through [`Timestamp::epoch_millis`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    /// Server-native timestamp object: `{"seconds": .., "nanoseconds": ..}`.
    Server { seconds: i64, nanoseconds: u32 },
    /// Plain date written by a local client, serialized as RFC 3339.
    Local(#[serde(with = "time::serde::rfc3339")] OffsetDateTime),
    /// Bare epoch milliseconds, as found in some imported documents.
    Millis(i64),
}

impl Timestamp {
    /// Server timestamp for the current instant.
    pub fn server_now() -> Self {
        Self::from_server(OffsetDateTime::now_utc())
    }

    /// Local date for the current instant.
    pub fn local_now() -> Self {
        Self::Local(OffsetDateTime::now_utc())
    }

    /// Converts a date into the server-native representation.
    pub fn from_server(at: OffsetDateTime) -> Self {
        Self::Server {
            seconds: at.unix_timestamp(),
            nanoseconds: at.nanosecond(),
        }
    }

    /// Normalizes either representation to milliseconds since the Unix epoch.
    ///
    /// # Examples
    ///
    /// ```
    /// use keepnote::Timestamp;
    /// use time::macros::datetime;
    ///
    /// let server = Timestamp::Server { seconds: 1_700_000_000, nanoseconds: 250_000_000 };
    /// let local = Timestamp::Local(datetime!(2023-11-14 22:13:20.25 UTC));
    /// assert_eq!(server.epoch_millis(), 1_700_000_000_250);
    /// assert_eq!(server.epoch_millis(), local.epoch_millis());
    /// ```
    pub fn epoch_millis(&self) -> i64 {
        match *self {
            Self::Server {
                seconds,
                nanoseconds,
            } => seconds
                .saturating_mul(1000)
                .saturating_add(i64::from(nanoseconds / 1_000_000)),
            Self::Local(at) => (at.unix_timestamp_nanos() / 1_000_000) as i64,
            Self::Millis(millis) => millis,
        }
    }

    /// Converts to a UTC date for display.
    ///
    /// Returns `None` for values outside the supported date range.
    pub fn to_datetime(&self) -> Option<OffsetDateTime> {
        match *self {
            Self::Local(at) => Some(at),
            _ => OffsetDateTime::from_unix_timestamp_nanos(
                i128::from(self.epoch_millis()) * 1_000_000,
            )
            .ok(),
        }
    }
}
