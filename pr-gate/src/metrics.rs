//! Aggregate review metrics, in-memory only (reset on restart).

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Counters kept across all handled events.
#[derive(Debug, Default)]
struct Counters {
    total_reviews: u64,
    passed: u64,
    failed: u64,
    total_questions_generated: u64,
    total_answers_graded: u64,
    question_batches: u64,
    last_review_at: Option<DateTime<Utc>>,
}

/// Shared metrics sink; cheap to lock, updated from event handlers.
#[derive(Debug, Default)]
pub struct ReviewMetrics {
    inner: Mutex<Counters>,
}

/// Serializable snapshot for the metrics endpoint.
#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_reviews: u64,
    pub passed: u64,
    pub failed: u64,
    pub pass_rate_pct: f64,
    pub total_questions_generated: u64,
    pub total_answers_graded: u64,
    pub avg_questions_per_pr: f64,
    pub last_review_at: Option<DateTime<Utc>>,
}

impl ReviewMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_questions_generated(&self, count: usize) {
        let mut c = self.inner.lock().unwrap();
        c.total_questions_generated += count as u64;
        c.question_batches += 1;
    }

    pub fn record_review_result(&self, passed: bool, num_answers: usize) {
        let mut c = self.inner.lock().unwrap();
        c.total_reviews += 1;
        c.total_answers_graded += num_answers as u64;
        c.last_review_at = Some(Utc::now());
        if passed {
            c.passed += 1;
        } else {
            c.failed += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let c = self.inner.lock().unwrap();
        let pass_rate_pct = if c.total_reviews == 0 {
            0.0
        } else {
            (c.passed as f64 / c.total_reviews as f64 * 1000.0).round() / 10.0
        };
        let avg_questions_per_pr = if c.question_batches == 0 {
            0.0
        } else {
            (c.total_questions_generated as f64 / c.question_batches as f64 * 10.0).round() / 10.0
        };
        MetricsSnapshot {
            total_reviews: c.total_reviews,
            passed: c.passed,
            failed: c.failed,
            pass_rate_pct,
            total_questions_generated: c.total_questions_generated,
            total_answers_graded: c.total_answers_graded,
            avg_questions_per_pr,
            last_review_at: c.last_review_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_rate_and_averages() {
        let m = ReviewMetrics::new();
        m.record_questions_generated(3);
        m.record_questions_generated(5);
        m.record_review_result(true, 3);
        m.record_review_result(false, 5);
        m.record_review_result(true, 3);

        let s = m.snapshot();
        assert_eq!(s.total_reviews, 3);
        assert_eq!(s.passed, 2);
        assert_eq!(s.failed, 1);
        assert_eq!(s.pass_rate_pct, 66.7);
        assert_eq!(s.total_questions_generated, 8);
        assert_eq!(s.avg_questions_per_pr, 4.0);
        assert!(s.last_review_at.is_some());
    }

    #[test]
    fn empty_snapshot_is_zeroed() {
        let s = ReviewMetrics::new().snapshot();
        assert_eq!(s.total_reviews, 0);
        assert_eq!(s.pass_rate_pct, 0.0);
        assert_eq!(s.avg_questions_per_pr, 0.0);
        assert!(s.last_review_at.is_none());
    }
}
