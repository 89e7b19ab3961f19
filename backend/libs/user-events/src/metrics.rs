use once_cell::sync::Lazy;
use prometheus::{IntCounterVec, Opts};
use tracing::warn;

static PUBLISHED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register(
        IntCounterVec::new(
            Opts::new(
                "user_events_published_total",
                "User event publish attempts by outcome",
            ),
            &["outcome"],
        )
        .expect("valid metric opts for user_events_published_total"),
    )
});

static CONSUMED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register(
        IntCounterVec::new(
            Opts::new(
                "user_events_consumed_total",
                "User event messages received by outcome",
            ),
            &["outcome"],
        )
        .expect("valid metric opts for user_events_consumed_total"),
    )
});

fn register(counter: IntCounterVec) -> IntCounterVec {
    if let Err(e) = prometheus::default_registry().register(Box::new(counter.clone())) {
        warn!("Failed to register user events metric: {}", e);
    }
    counter
}

/// Register both counters so they are exported before the first event.
pub fn init_metrics() {
    Lazy::force(&PUBLISHED_TOTAL);
    Lazy::force(&CONSUMED_TOTAL);
}

/// Outcome labels: `published`, `missing_key`, `encode_failed`, `transport_failed`.
pub fn record_publish(outcome: &str) {
    PUBLISHED_TOTAL.with_label_values(&[outcome]).inc();
}

/// Outcome labels: `processed`, `decode_failed`, `handler_failed`.
pub fn record_consume(outcome: &str) {
    CONSUMED_TOTAL.with_label_values(&[outcome]).inc();
}
