pub mod pets_repo;
pub mod profiles_repo;
pub mod stats_repo;

use chrono::{DateTime, SecondsFormat, Utc};

/// Timestamps are stored as RFC 3339 UTC text so they sort lexically.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn now_timestamp() -> String {
    timestamp(Utc::now())
}
