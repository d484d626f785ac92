//! Timer-free expiry computation.
//!
//! Background sweeps only decide *when* to run these functions; every read
//! path checks timestamps itself, so sweep timing never affects correctness.

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Whether a value stamped at `stamp_ms` is older than `ttl_ms` at `now_ms`.
pub fn is_expired(stamp_ms: i64, now_ms: i64, ttl_ms: u64) -> bool {
    let ttl = i64::try_from(ttl_ms).unwrap_or(i64::MAX);
    now_ms.saturating_sub(stamp_ms) > ttl
}

/// Keys whose stamp is older than `ttl_ms` at `now_ms`.
pub fn expired_keys<'a, I>(stamps: I, now_ms: i64, ttl_ms: u64) -> Vec<String>
where
    I: IntoIterator<Item = (&'a str, i64)>,
{
    stamps
        .into_iter()
        .filter(|(_, stamp)| is_expired(*stamp, now_ms, ttl_ms))
        .map(|(key, _)| key.to_string())
        .collect()
}
