//! Rate-limit headers and the client's last-observed snapshot.

use http::HeaderMap;
use parking_lot::RwLock;
use serde::Serialize;

use crate::timestamp::Timestamp;

pub const HEADER_RATE_LIMIT: &str = "X-RateLimit-Limit";
pub const HEADER_RATE_REMAINING: &str = "X-RateLimit-Remaining";
pub const HEADER_RETRY_AFTER: &str = "Retry-After";

/// Rate-limit state reported by the server on a single response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Rate {
    /// Requests per window the client is limited to.
    pub limit: u64,

    /// Requests left in the current window.
    pub remaining: u64,

    /// When the window resets. Only known when the server sent a non-zero
    /// `Retry-After` that lands on a representable time.
    pub reset: Option<Timestamp>,
}

/// Read the rate headers of a response received now.
pub fn parse_rate(headers: &HeaderMap) -> Rate {
    parse_rate_at(headers, Timestamp::now())
}

/// Read the rate headers of a response received at `received`.
/// Missing or malformed counts read as 0.
pub fn parse_rate_at(headers: &HeaderMap, received: Timestamp) -> Rate {
    let mut rate = Rate {
        limit: header_int(headers, HEADER_RATE_LIMIT).unwrap_or(0),
        remaining: header_int(headers, HEADER_RATE_REMAINING).unwrap_or(0),
        reset: None,
    };
    if let Some(seconds) = header_int::<i64>(headers, HEADER_RETRY_AFTER) {
        if seconds != 0 {
            rate.reset = received.plus_seconds(seconds);
        }
    }
    rate
}

fn header_int<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

/// Most recently observed `Rate`, shared by every call on a client.
///
/// Each response replaces the whole value under a write lock, so concurrent
/// responses resolve last-writer-wins without mixing fields of different
/// responses. Readers get no freshness guarantee beyond that.
#[derive(Debug, Default)]
pub struct RateSnapshot(RwLock<Rate>);

impl RateSnapshot {
    pub fn get(&self) -> Rate {
        *self.0.read()
    }

    pub(crate) fn store(&self, rate: Rate) {
        *self.0.write() = rate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    fn received() -> Timestamp {
        Timestamp::from_unix(1_682_942_400).unwrap()
    }

    #[test]
    fn reads_limit_and_remaining() {
        let rate = parse_rate_at(
            &headers(&[("x-ratelimit-limit", "60"), ("x-ratelimit-remaining", "59")]),
            received(),
        );
        assert_eq!(rate.limit, 60);
        assert_eq!(rate.remaining, 59);
        assert_eq!(rate.reset, None);
    }

    #[test]
    fn retry_after_sets_reset_relative_to_receipt() {
        let rate = parse_rate_at(&headers(&[("retry-after", "30")]), received());
        assert_eq!(rate.reset, Some(Timestamp::from_unix(1_682_942_430).unwrap()));
    }

    #[test]
    fn zero_or_garbage_retry_after_leaves_reset_unset() {
        let rate = parse_rate_at(&headers(&[("retry-after", "0")]), received());
        assert_eq!(rate.reset, None);
        let rate = parse_rate_at(&headers(&[("retry-after", "soon")]), received());
        assert_eq!(rate.reset, None);
    }

    #[test]
    fn out_of_range_retry_after_leaves_reset_unset() {
        for value in ["10000000000000", "-10000000000000", "9223372036854775807"] {
            let rate = parse_rate_at(&headers(&[("retry-after", value)]), received());
            assert_eq!(rate.reset, None, "{value}");
        }
    }

    #[test]
    fn negative_retry_after_counts_back_from_receipt() {
        let rate = parse_rate_at(&headers(&[("retry-after", "-30")]), received());
        assert_eq!(rate.reset, Some(Timestamp::from_unix(1_682_942_370).unwrap()));
    }

    #[test]
    fn malformed_counts_read_as_zero() {
        let rate = parse_rate_at(
            &headers(&[("x-ratelimit-limit", "lots"), ("x-ratelimit-remaining", "-1")]),
            received(),
        );
        assert_eq!(rate, Rate::default());
    }

    #[test]
    fn snapshot_replaces_whole_value() {
        let snapshot = RateSnapshot::default();
        assert_eq!(snapshot.get(), Rate::default());
        let rate = Rate {
            limit: 60,
            remaining: 12,
            reset: Some(received()),
        };
        snapshot.store(rate);
        assert_eq!(snapshot.get(), rate);
    }
}
