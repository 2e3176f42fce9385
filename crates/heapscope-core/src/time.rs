use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the unix epoch; pre-epoch times clamp to 0.
///
/// Report timestamps are plain unix seconds so payloads stay serializable
/// as nested key/value data without a host-specific time type.
pub fn unix_seconds(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}
