use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("fiqh.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("fiqh.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("fiqh.client.request_duration_seconds");

pub(crate) static STREAM_CHUNKS: Counter = Counter::new("fiqh.stream.chunks");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("fiqh.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("fiqh.stream.bytes");
pub(crate) static STREAM_TTFB: Moments = Moments::new("fiqh.stream.ttfb_seconds");
pub(crate) static STREAM_DURATION: Moments = Moments::new("fiqh.stream.duration_seconds");

pub(crate) static CHAT_SENDS: Counter = Counter::new("fiqh.chat.sends");
pub(crate) static CHAT_SKIPPED: Counter = Counter::new("fiqh.chat.skipped");
pub(crate) static CHAT_REJECTED: Counter = Counter::new("fiqh.chat.rejected");
pub(crate) static CHAT_FAILURES: Counter = Counter::new("fiqh.chat.failures");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_CHUNKS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);
    collector.register_moments(&STREAM_TTFB);
    collector.register_moments(&STREAM_DURATION);

    collector.register_counter(&CHAT_SENDS);
    collector.register_counter(&CHAT_SKIPPED);
    collector.register_counter(&CHAT_REJECTED);
    collector.register_counter(&CHAT_FAILURES);
}
