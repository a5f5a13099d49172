// Per-run state shared by every operation of one analysis or cleanup.
// Tracks request, retry, and failure counts and enforces the error and request budgets.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::{FellowError, Result};
use crate::github::RateLimit;

/// Budgets and caps for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Unrecoverable failures tolerated before the run is aborted.
    pub max_errors: u32,
    /// Network requests allowed in one run.
    pub max_requests: u32,
    /// Users looked up or unfollowed per group in one run.
    pub max_users_to_process: usize,
    /// Pause between consecutive unfollow requests.
    pub unfollow_delay: Duration,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_errors: 10,
            max_requests: 2500,
            max_users_to_process: 200,
            unfollow_delay: Duration::from_millis(500),
        }
    }
}

/// Counters collected during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Network requests sent, retries included.
    pub requests: u32,
    /// Responses served from the cache.
    pub cache_hits: u32,
    /// Attempts that were retried after a transient failure.
    pub retries: u32,
    /// Calls that failed for good.
    pub failures: u32,
}

/// Snapshot of the run's request accounting, as reported to users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestStatus {
    pub current_requests: u32,
    pub max_requests: u32,
    pub remaining_requests: u32,
    pub usage_percentage: f64,
    pub cache_hits: u32,
    pub retries: u32,
    pub failures: u32,
    pub max_errors: u32,
    pub max_users_to_process: usize,
    pub github_rate_limit: Option<RateLimit>,
}

/// Mutable state threaded through every operation of a run.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    limits: Limits,
    metrics: RunMetrics,
    rate_limit: Option<RateLimit>,
}

impl RunContext {
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            metrics: RunMetrics::default(),
            rate_limit: None,
        }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    /// Last rate limit seen in a response.
    pub fn rate_limit(&self) -> Option<&RateLimit> {
        self.rate_limit.as_ref()
    }

    /// True once failures have gone past the error budget.
    pub fn budget_exceeded(&self) -> bool {
        self.metrics.failures > self.limits.max_errors
    }

    /// Fail if the run has already been aborted by its error budget.
    pub fn ensure_budget(&self) -> Result<()> {
        if self.budget_exceeded() {
            return Err(FellowError::ErrorBudgetExceeded {
                failures: self.metrics.failures,
                max: self.limits.max_errors,
            });
        }
        Ok(())
    }

    /// Account for one network request, refusing it when the request budget is spent.
    pub fn begin_request(&mut self) -> Result<()> {
        if self.metrics.requests >= self.limits.max_requests {
            return Err(FellowError::RequestLimitReached {
                max: self.limits.max_requests,
            });
        }
        self.metrics.requests += 1;
        Ok(())
    }

    pub fn record_cache_hit(&mut self) {
        self.metrics.cache_hits += 1;
    }

    pub fn record_retry(&mut self) {
        self.metrics.retries += 1;
    }

    /// Record an unrecoverable failure. Returns true if this pushed the run over budget.
    pub fn record_failure(&mut self) -> bool {
        let was_exceeded = self.budget_exceeded();
        self.metrics.failures += 1;

        let exceeded = self.budget_exceeded();
        if exceeded && !was_exceeded {
            error!(
                failures = self.metrics.failures,
                max_errors = self.limits.max_errors,
                "error budget exceeded, aborting remaining operations"
            );
        }
        exceeded
    }

    pub fn update_rate_limit(&mut self, rate_limit: RateLimit) {
        self.rate_limit = Some(rate_limit);
    }

    pub fn request_status(&self) -> RequestStatus {
        let max = self.limits.max_requests;
        let current = self.metrics.requests;
        let usage_percentage = if max == 0 {
            100.0
        } else {
            (f64::from(current) / f64::from(max) * 1000.0).round() / 10.0
        };

        RequestStatus {
            current_requests: current,
            max_requests: max,
            remaining_requests: max.saturating_sub(current),
            usage_percentage,
            cache_hits: self.metrics.cache_hits,
            retries: self.metrics.retries,
            failures: self.metrics.failures,
            max_errors: self.limits.max_errors,
            max_users_to_process: self.limits.max_users_to_process,
            github_rate_limit: self.rate_limit.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(max_errors: u32, max_requests: u32) -> Limits {
        Limits {
            max_errors,
            max_requests,
            ..Limits::default()
        }
    }

    #[test]
    fn test_error_budget() {
        let mut ctx = RunContext::new(limits(2, 100));

        assert!(!ctx.record_failure());
        assert!(!ctx.record_failure());
        assert!(ctx.ensure_budget().is_ok());

        // Third failure exceeds a budget of two.
        assert!(ctx.record_failure());
        assert!(matches!(
            ctx.ensure_budget(),
            Err(FellowError::ErrorBudgetExceeded { failures: 3, max: 2 })
        ));
    }

    #[test]
    fn test_request_budget() {
        let mut ctx = RunContext::new(limits(10, 2));

        ctx.begin_request().unwrap();
        ctx.begin_request().unwrap();
        assert!(matches!(
            ctx.begin_request(),
            Err(FellowError::RequestLimitReached { max: 2 })
        ));
        assert_eq!(ctx.metrics().requests, 2);
    }

    #[test]
    fn test_request_status() {
        let mut ctx = RunContext::new(limits(10, 2500));
        for _ in 0..100 {
            ctx.begin_request().unwrap();
        }
        ctx.record_cache_hit();
        ctx.update_rate_limit(RateLimit {
            limit: 5000,
            remaining: 4900,
            reset: 0,
        });

        let status = ctx.request_status();
        assert_eq!(status.current_requests, 100);
        assert_eq!(status.remaining_requests, 2400);
        assert_eq!(status.usage_percentage, 4.0);
        assert_eq!(status.cache_hits, 1);
        assert_eq!(status.github_rate_limit.unwrap().remaining, 4900);
    }
}
