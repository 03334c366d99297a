//! Metric name constants and recording helpers

use std::time::Instant;

use opentelemetry::global;
use opentelemetry::metrics::{Histogram, Meter};

/// Meter shared by all Sigma instruments
///
/// Instruments must be created after [`crate::init`] has installed the
/// global meter provider, otherwise they record into a no-op provider.
pub fn meter() -> Meter {
    global::meter("sigma")
}

/// Record elapsed seconds since `start` on a histogram
pub fn record_duration(histogram: &Histogram<f64>, start: Instant, attributes: &[opentelemetry::KeyValue]) {
    histogram.record(start.elapsed().as_secs_f64(), attributes);
}

// Chat metric names
pub const CHAT_REQUEST_COUNT: &str = "chat.request.count";
pub const CHAT_STREAM_DURATION: &str = "chat.stream.duration";
pub const CHAT_TIME_TO_FIRST_TOKEN: &str = "chat.time_to_first_token";
pub const CHAT_TOOL_CALL_COUNT: &str = "chat.tool_call.count";

// Search metric names
pub const SEARCH_DURATION: &str = "search.request.duration";

// Image generation metric names
pub const IMAGEGEN_REQUEST_DURATION: &str = "imagegen.request.duration";
