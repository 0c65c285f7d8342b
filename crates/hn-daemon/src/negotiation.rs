//! Accept-header negotiation between snapshot and stream reads.
//!
//! [`select_mode`] is pure: headers in, [`QueryMode`] out. A read streams
//! when `text/event-stream` is acceptable: the most specific matching range
//! (`text/event-stream`, then `text/*`, then `*/*`) carries a non-zero weight.
//! No `Accept` header at all means snapshot.

use axum::http::{header::ACCEPT, HeaderMap};
use hn_reactive::QueryMode;

pub const EVENT_STREAM: &str = "text/event-stream";

/// One entry of an `Accept` header.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRange {
    /// Lowercased `type/subtype`.
    pub essence: String,
    pub q: f32,
}

/// Parse an `Accept` value into media ranges, in header order.
///
/// Entries with an unparsable or out-of-range `q` are dropped.
pub fn parse_accept(value: &str) -> Vec<MediaRange> {
    let mut out = Vec::new();

    for entry in value.split(',') {
        let mut parts = entry.split(';');
        let essence = parts.next().unwrap_or("").trim().to_ascii_lowercase();
        if essence.is_empty() || !essence.contains('/') {
            continue;
        }

        let mut q = 1.0_f32;
        let mut valid = true;
        for param in parts {
            if let Some((k, v)) = param.split_once('=') {
                if k.trim().eq_ignore_ascii_case("q") {
                    match v.trim().parse::<f32>() {
                        Ok(w) if (0.0..=1.0).contains(&w) => q = w,
                        _ => valid = false,
                    }
                }
            }
        }

        if valid {
            out.push(MediaRange { essence, q });
        }
    }

    out
}

pub fn select_mode(headers: &HeaderMap) -> QueryMode {
    let ranges: Vec<MediaRange> = headers
        .get_all(ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(parse_accept)
        .collect();

    if event_stream_weight(&ranges) > 0.0 {
        QueryMode::Stream
    } else {
        QueryMode::Snapshot
    }
}

/// Weight of `text/event-stream` under the most specific matching range.
/// An explicit `q=0` anywhere on the exact type excludes it.
fn event_stream_weight(ranges: &[MediaRange]) -> f32 {
    let weight_of = |essence: &str| {
        ranges
            .iter()
            .filter(|r| r.essence == essence)
            .map(|r| r.q)
            .reduce(f32::min)
    };

    weight_of(EVENT_STREAM)
        .or_else(|| weight_of("text/*"))
        .or_else(|| weight_of("*/*"))
        .unwrap_or(0.0)
}
