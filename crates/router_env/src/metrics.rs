//! Process-local counters. The teacher ships full OpenTelemetry export;
//! that collector has no consumer in this scope (see DESIGN.md), so this
//! is deliberately a plain atomic counter registry instead of a vendored
//! no-op OTLP client.

use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::Lazy;

pub struct Counter {
    value: AtomicU64,
    name: &'static str,
}

impl Counter {
    pub const fn new(name: &'static str) -> Self {
        Self {
            value: AtomicU64::new(0),
            name,
        }
    }

    pub fn add(&self, count: u64) {
        self.value.fetch_add(count, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

pub static CONNECTOR_CALL_COUNT: Lazy<Counter> = Lazy::new(|| Counter::new("connector_call_count"));
pub static WEBHOOK_DELIVERY_ATTEMPT_COUNT: Lazy<Counter> =
    Lazy::new(|| Counter::new("webhook_delivery_attempt_count"));
pub static RATE_LIMITED_REQUEST_COUNT: Lazy<Counter> =
    Lazy::new(|| Counter::new("rate_limited_request_count"));
