pub mod envelope;

use chrono::{DateTime, NaiveDateTime, Utc};

/// Timestamps are stored as naive UTC and rendered RFC 3339 on the wire.
pub fn rfc3339(ts: NaiveDateTime) -> String {
    DateTime::<Utc>::from_naive_utc_and_offset(ts, Utc).to_rfc3339()
}
