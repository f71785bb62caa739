//! In-process request counters rendered in the Prometheus text format.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use axum::http::StatusCode;

const CLASSES: [&str; 5] = ["1xx", "2xx", "3xx", "4xx", "5xx"];

#[derive(Debug)]
pub struct Metrics {
    started: Instant,
    responses: [AtomicU64; 5],
    rate_limited: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            responses: Default::default(),
            rate_limited: AtomicU64::new(0),
        }
    }

    pub fn record_response(&self, status: StatusCode) {
        let class = (status.as_u16() / 100).clamp(1, 5) as usize - 1;
        self.responses[class].fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn responses(&self, class: &str) -> u64 {
        CLASSES
            .iter()
            .position(|c| *c == class)
            .map(|i| self.responses[i].load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = writeln!(out, "# HELP huddle_http_responses_total HTTP responses by status class.");
        let _ = writeln!(out, "# TYPE huddle_http_responses_total counter");
        for (i, class) in CLASSES.iter().enumerate() {
            let _ = writeln!(
                out,
                "huddle_http_responses_total{{class=\"{}\"}} {}",
                class,
                self.responses[i].load(Ordering::Relaxed)
            );
        }
        let _ = writeln!(out, "# HELP huddle_rate_limited_total Requests rejected by the rate limiter.");
        let _ = writeln!(out, "# TYPE huddle_rate_limited_total counter");
        let _ = writeln!(
            out,
            "huddle_rate_limited_total {}",
            self.rate_limited.load(Ordering::Relaxed)
        );
        let _ = writeln!(out, "# HELP huddle_uptime_seconds Seconds since the server started.");
        let _ = writeln!(out, "# TYPE huddle_uptime_seconds gauge");
        let _ = writeln!(
            out,
            "huddle_uptime_seconds {:.3}",
            self.started.elapsed().as_secs_f64()
        );
        out
    }
}
