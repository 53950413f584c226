//! Health check aggregation
//!
//! Runs a set of named checkers and reports a combined pass/fail payload.
//! Results are cached per checker: passing results for `success_ttl`,
//! failing ones for the shorter `failed_ttl`.

use crate::observability::{MonitorMetrics, StructuredLogger};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// How long a passing result is reused
pub const DEFAULT_SUCCESS_TTL: Duration = Duration::from_secs(27);

/// How long a failing result is reused
pub const DEFAULT_FAILED_TTL: Duration = Duration::from_secs(9);

/// Overall health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Success,
    Failure,
}

/// Verdict of a single checker run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub passed: bool,
    pub output: String,
}

impl CheckOutcome {
    pub fn pass(output: impl Into<String>) -> Self {
        Self {
            passed: true,
            output: output.into(),
        }
    }

    pub fn fail(output: impl Into<String>) -> Self {
        Self {
            passed: false,
            output: output.into(),
        }
    }
}

/// A named health check. Implementations report failure in the outcome.
#[async_trait]
pub trait Checker: Send + Sync {
    fn name(&self) -> &str;

    async fn check(&self) -> CheckOutcome;
}

/// One checker's entry in the health payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub checker: String,
    pub output: String,
    pub passed: bool,
    pub timestamp: i64,
    pub expires: i64,
    /// Seconds spent running the checker
    pub response_time: f64,
}

/// Overall health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub hostname: String,
    pub status: HealthStatus,
    pub timestamp: i64,
    pub results: Vec<CheckResult>,
}

impl HealthReport {
    /// Success only when every result passed
    pub fn compute_status(results: &[CheckResult]) -> HealthStatus {
        if results.iter().all(|r| r.passed) {
            HealthStatus::Success
        } else {
            HealthStatus::Failure
        }
    }
}

#[derive(Debug, Clone)]
struct CachedResult {
    result: CheckResult,
    valid_until: Instant,
}

/// Runs registered checkers and caches their results
#[derive(Clone)]
pub struct HealthCheck {
    checkers: Vec<Arc<dyn Checker>>,
    cache: Arc<RwLock<HashMap<String, CachedResult>>>,
    success_ttl: Duration,
    failed_ttl: Duration,
    metrics: MonitorMetrics,
    logger: StructuredLogger,
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthCheck {
    pub fn new() -> Self {
        Self {
            checkers: Vec::new(),
            cache: Arc::new(RwLock::new(HashMap::new())),
            success_ttl: DEFAULT_SUCCESS_TTL,
            failed_ttl: DEFAULT_FAILED_TTL,
            metrics: MonitorMetrics::new(),
            logger: StructuredLogger::for_local_host(),
        }
    }

    /// Register a checker
    pub fn with_checker(mut self, checker: Arc<dyn Checker>) -> Self {
        self.checkers.push(checker);
        self
    }

    /// Set cache lifetimes for passing and failing results
    pub fn with_ttls(mut self, success_ttl: Duration, failed_ttl: Duration) -> Self {
        self.success_ttl = success_ttl;
        self.failed_ttl = failed_ttl;
        self
    }

    /// Logger whose host name is reported in the payload
    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Run every checker (or reuse a fresh cached result) and combine them
    pub async fn run(&self) -> HealthReport {
        let mut results = Vec::with_capacity(self.checkers.len());

        for checker in &self.checkers {
            results.push(self.run_checker(checker.as_ref()).await);
        }

        HealthReport {
            hostname: self.logger.host_name().to_string(),
            status: HealthReport::compute_status(&results),
            timestamp: chrono::Utc::now().timestamp(),
            results,
        }
    }

    /// Cached result when still fresh. On a miss the write lock is held while
    /// the checker runs, so concurrent callers wait for that one refresh
    /// instead of issuing their own.
    async fn run_checker(&self, checker: &dyn Checker) -> CheckResult {
        if let Some(result) = fresh_result(&*self.cache.read().await, checker.name()) {
            return result;
        }

        let mut cache = self.cache.write().await;
        if let Some(result) = fresh_result(&cache, checker.name()) {
            return result;
        }

        let start = Instant::now();
        let outcome = checker.check().await;
        let elapsed = start.elapsed();

        self.metrics.observe_probe_latency(elapsed.as_secs_f64());
        if !outcome.passed {
            self.metrics.inc_probe_failures();
        }
        self.logger.log_probe(
            checker.name(),
            outcome.passed,
            &outcome.output,
            elapsed.as_secs_f64(),
        );

        let ttl = if outcome.passed {
            self.success_ttl
        } else {
            self.failed_ttl
        };
        let now = chrono::Utc::now().timestamp();
        let result = CheckResult {
            checker: checker.name().to_string(),
            output: outcome.output,
            passed: outcome.passed,
            timestamp: now,
            expires: now + ttl.as_secs() as i64,
            response_time: elapsed.as_secs_f64(),
        };

        cache.insert(
            result.checker.clone(),
            CachedResult {
                result: result.clone(),
                valid_until: Instant::now() + ttl,
            },
        );

        result
    }
}

fn fresh_result(cache: &HashMap<String, CachedResult>, name: &str) -> Option<CheckResult> {
    cache
        .get(name)
        .filter(|cached| cached.valid_until > Instant::now())
        .map(|cached| cached.result.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingChecker {
        name: String,
        passed: bool,
        calls: AtomicUsize,
    }

    impl CountingChecker {
        fn new(name: &str, passed: bool) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                passed,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Checker for CountingChecker {
        fn name(&self) -> &str {
            &self.name
        }

        async fn check(&self) -> CheckOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.passed {
                CheckOutcome::pass(format!("{} ok", self.name))
            } else {
                CheckOutcome::fail(format!("{} returned 503", self.name))
            }
        }
    }

    #[tokio::test]
    async fn test_no_checkers_is_success() {
        let report = HealthCheck::new().run().await;

        assert_eq!(report.status, HealthStatus::Success);
        assert!(report.results.is_empty());
    }

    #[tokio::test]
    async fn test_any_failure_fails_report() {
        let health = HealthCheck::new()
            .with_checker(CountingChecker::new("first", true))
            .with_checker(CountingChecker::new("second", false));

        let report = health.run().await;

        assert_eq!(report.status, HealthStatus::Failure);
        assert_eq!(report.results.len(), 2);
        assert!(report.results[0].passed);
        assert!(!report.results[1].passed);
        assert!(report.results[1].output.contains("503"));
    }

    #[tokio::test]
    async fn test_passing_result_is_cached() {
        let checker = CountingChecker::new("cached", true);
        let health = HealthCheck::new().with_checker(checker.clone());

        health.run().await;
        let report = health.run().await;

        assert_eq!(checker.calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.results[0].expires - report.results[0].timestamp, 27);
    }

    #[tokio::test]
    async fn test_failing_result_uses_failed_ttl() {
        let checker = CountingChecker::new("flaky", false);
        let health = HealthCheck::new().with_checker(checker.clone());

        let report = health.run().await;

        assert_eq!(report.results[0].expires - report.results[0].timestamp, 9);
    }

    #[tokio::test]
    async fn test_expired_result_is_rerun() {
        let checker = CountingChecker::new("expiring", true);
        let health = HealthCheck::new()
            .with_ttls(Duration::ZERO, Duration::ZERO)
            .with_checker(checker.clone());

        health.run().await;
        health.run().await;

        assert_eq!(checker.calls.load(Ordering::SeqCst), 2);
    }

    struct SlowChecker {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Checker for SlowChecker {
        fn name(&self) -> &str {
            "slow"
        }

        async fn check(&self) -> CheckOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            CheckOutcome::pass("slow ok")
        }
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_refresh() {
        let checker = Arc::new(SlowChecker {
            calls: AtomicUsize::new(0),
        });
        let health = HealthCheck::new().with_checker(checker.clone());

        let (first, second) = tokio::join!(health.run(), health.run());

        assert_eq!(checker.calls.load(Ordering::SeqCst), 1);
        assert!(first.results[0].passed);
        assert_eq!(first.results[0].timestamp, second.results[0].timestamp);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&HealthStatus::Failure).unwrap();
        assert_eq!(json, "\"failure\"");
    }
}
