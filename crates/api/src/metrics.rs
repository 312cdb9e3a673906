use query::AnswerSource;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[derive(Default)]
pub struct Metrics {
    // Counters
    total_requests: AtomicUsize,
    llm_answers: AtomicUsize,
    fallback_answers: AtomicUsize,
    empty_retrievals: AtomicUsize,
    rejected_requests: AtomicUsize,

    // Timing (in microseconds)
    total_query_time_us: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_answer(&self, source: AnswerSource, duration: Duration) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_query_time_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        let counter = match source {
            AnswerSource::Llm => &self.llm_answers,
            AnswerSource::Fallback => &self.fallback_answers,
            AnswerSource::NoInformation => &self.empty_retrievals,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.rejected_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let answered = self.llm_answers.load(Ordering::Relaxed)
            + self.fallback_answers.load(Ordering::Relaxed)
            + self.empty_retrievals.load(Ordering::Relaxed);

        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            llm_answers: self.llm_answers.load(Ordering::Relaxed),
            fallback_answers: self.fallback_answers.load(Ordering::Relaxed),
            empty_retrievals: self.empty_retrievals.load(Ordering::Relaxed),
            rejected_requests: self.rejected_requests.load(Ordering::Relaxed),
            avg_query_time_ms: avg_time_ms(&self.total_query_time_us, answered),
        }
    }
}

fn avg_time_ms(total_us: &AtomicU64, count: usize) -> f64 {
    let total = total_us.load(Ordering::Relaxed) as f64;
    if count > 0 {
        total / count as f64 / 1000.0 // Convert to ms
    } else {
        0.0
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: usize,
    pub llm_answers: usize,
    pub fallback_answers: usize,
    pub empty_retrievals: usize,
    pub rejected_requests: usize,
    pub avg_query_time_ms: f64,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
