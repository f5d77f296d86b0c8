use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("personachat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter =
    Counter::new("personachat.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("personachat.client.request_duration_seconds");

pub(crate) static STREAM_CHUNKS: Counter = Counter::new("personachat.stream.chunks");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("personachat.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("personachat.stream.bytes");

pub(crate) static CHAT_TURNS: Counter = Counter::new("personachat.chat.turns");
pub(crate) static CHAT_TURN_ERRORS: Counter = Counter::new("personachat.chat.turn_errors");
pub(crate) static CHAT_EMPTY_REPLIES: Counter = Counter::new("personachat.chat.empty_replies");
pub(crate) static CHAT_FRAGMENTS: Counter = Counter::new("personachat.chat.fragments");
pub(crate) static CHAT_FIRST_FRAGMENT: Moments =
    Moments::new("personachat.chat.first_fragment_seconds");
pub(crate) static CHAT_TURN_DURATION: Moments =
    Moments::new("personachat.chat.turn_duration_seconds");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: &Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_CHUNKS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);

    collector.register_counter(&CHAT_TURNS);
    collector.register_counter(&CHAT_TURN_ERRORS);
    collector.register_counter(&CHAT_EMPTY_REPLIES);
    collector.register_counter(&CHAT_FRAGMENTS);
    collector.register_moments(&CHAT_FIRST_FRAGMENT);
    collector.register_moments(&CHAT_TURN_DURATION);
}
