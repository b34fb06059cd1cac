//! Parsing of the server backpressure headers described in the HTTP surface:
//! `Retry-After`, `X-RateLimit-Retry-After-Ms`, `X-Backpressure`, `RateLimit-Remaining`.

use http::HeaderMap;
use std::time::Duration;

const RETRY_AFTER: &str = "retry-after";
const RETRY_AFTER_MS: &str = "x-ratelimit-retry-after-ms";
const BACKPRESSURE: &str = "x-backpressure";
const REMAINING: &str = "ratelimit-remaining";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name)?.to_str().ok()
}

/// Parses the retry-after wait, preferring the millisecond-precision header
/// when both are present.
pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    if let Some(ms) = header_str(headers, RETRY_AFTER_MS).and_then(|v| v.parse::<u64>().ok()) {
        return Some(Duration::from_millis(ms));
    }
    header_str(headers, RETRY_AFTER)
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Parses the `X-Backpressure` score, clamped to `[0, 1]`.
pub(crate) fn parse_backpressure(headers: &HeaderMap) -> Option<f64> {
    header_str(headers, BACKPRESSURE)
        .and_then(|v| v.parse::<f64>().ok())
        .map(|v| v.clamp(0.0, 1.0))
}

/// Parses the remaining-token count, if advertised.
pub(crate) fn parse_remaining_tokens(headers: &HeaderMap) -> Option<u64> {
    header_str(headers, REMAINING).and_then(|v| v.parse::<u64>().ok())
}
