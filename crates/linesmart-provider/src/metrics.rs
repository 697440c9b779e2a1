//! In-memory health and latency metrics per provider.
//!
//! Every provider gets one record at construction. A record only changes
//! through [`MetricsCollector::record_success`] and
//! [`MetricsCollector::record_error`]; each record sits behind its own mutex
//! so its counters always move together. Status reflects the most recent
//! outcome, not a smoothed judgment.

use crate::kind::{ProviderKind, UnknownProviderError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{error, info};

/// Per-provider status derived from the latest recorded outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderStatus {
    /// No call observed yet.
    Unknown,
    Healthy,
    Degraded,
    Unavailable,
}

/// The most recent failure of a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastError {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Snapshot of one provider's counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMetrics {
    pub requests: u64,
    pub errors: u64,
    pub total_response_time_ms: u64,
    pub avg_response_time_ms: u64,
    pub last_response_time_ms: u64,
    pub last_error: Option<LastError>,
    pub last_success: Option<DateTime<Utc>>,
    pub status: ProviderStatus,
}

impl Default for ProviderMetrics {
    fn default() -> Self {
        Self {
            requests: 0,
            errors: 0,
            total_response_time_ms: 0,
            avg_response_time_ms: 0,
            last_response_time_ms: 0,
            last_error: None,
            last_success: None,
            status: ProviderStatus::Unknown,
        }
    }
}

impl ProviderMetrics {
    /// Errors as a percentage of requests; zero before the first request.
    pub fn error_rate(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.errors as f64 / self.requests as f64 * 100.0
        }
    }
}

/// Timing handle for one upstream call. Consumed by the matching record call.
#[derive(Debug)]
pub struct RequestContext {
    provider: ProviderKind,
    started: Instant,
}

impl RequestContext {
    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Per-provider view used by [`MetricsReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMetricsView {
    pub status: ProviderStatus,
    pub requests: u64,
    pub errors: u64,
    /// Percent, two decimals.
    pub error_rate: f64,
    pub avg_response_time_ms: u64,
    pub last_response_time_ms: u64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<LastError>,
}

/// Everything the collector knows, plus process uptime.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsReport {
    pub uptime_secs: u64,
    pub total_requests: u64,
    pub total_errors: u64,
    /// Percent, two decimals.
    pub overall_error_rate: f64,
    pub providers: BTreeMap<ProviderKind, ProviderMetricsView>,
}

/// Aggregate status across observed providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallHealth {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Status and error rate of one provider in a [`HealthSummary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderHealth {
    pub status: ProviderStatus,
    /// Percent, one decimal.
    pub error_rate: f64,
}

/// Dashboard summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthSummary {
    pub status: OverallHealth,
    /// Observed providers whose last call succeeded.
    pub healthy: usize,
    /// Providers observed at least once.
    pub total: usize,
    pub providers: BTreeMap<ProviderKind, ProviderHealth>,
}

/// Process-wide metrics store keyed by provider.
#[derive(Debug)]
pub struct MetricsCollector {
    started: Instant,
    providers: HashMap<ProviderKind, Mutex<ProviderMetrics>>,
    total_requests: AtomicU64,
    total_errors: AtomicU64,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    /// Create a collector with an `unknown` record for every provider.
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            providers: ProviderKind::ALL
                .iter()
                .map(|&kind| (kind, Mutex::new(ProviderMetrics::default())))
                .collect(),
            total_requests: AtomicU64::new(0),
            total_errors: AtomicU64::new(0),
        }
    }

    /// Begin timing a call to `provider`.
    pub fn start_request(&self, provider: ProviderKind) -> RequestContext {
        RequestContext {
            provider,
            started: Instant::now(),
        }
    }

    /// Record a successful call.
    pub fn record_success(&self, ctx: RequestContext) {
        self.record(ctx.provider, ctx.elapsed_ms(), None);
    }

    /// Record a failed call.
    pub fn record_error(&self, ctx: RequestContext, err: &impl fmt::Display) {
        self.record(ctx.provider, ctx.elapsed_ms(), Some(err.to_string()));
    }

    fn record(&self, provider: ProviderKind, elapsed_ms: u64, failure: Option<String>) {
        let avg = match self.providers.get(&provider) {
            Some(entry) => {
                let mut m = lock(entry);
                m.requests += 1;
                m.total_response_time_ms += elapsed_ms;
                m.avg_response_time_ms =
                    (m.total_response_time_ms as f64 / m.requests as f64).round() as u64;
                m.last_response_time_ms = elapsed_ms;
                match &failure {
                    Some(message) => {
                        m.errors += 1;
                        m.last_error = Some(LastError {
                            message: message.clone(),
                            timestamp: Utc::now(),
                        });
                        m.status = ProviderStatus::Degraded;
                    }
                    None => {
                        m.last_success = Some(Utc::now());
                        m.status = ProviderStatus::Healthy;
                    }
                }
                m.avg_response_time_ms
            }
            None => 0,
        };

        self.total_requests.fetch_add(1, Ordering::Relaxed);
        match failure {
            Some(message) => {
                self.total_errors.fetch_add(1, Ordering::Relaxed);
                error!(provider = %provider, response_time_ms = elapsed_ms, error = %message, "AI request failed");
            }
            None => {
                info!(provider = %provider, response_time_ms = elapsed_ms, avg_response_time_ms = avg, "AI request completed");
            }
        }
    }

    /// Snapshot of one provider, looked up by name.
    pub fn provider_metrics(&self, name: &str) -> Result<Option<ProviderMetrics>, UnknownProviderError> {
        let kind = name.parse::<ProviderKind>()?;
        Ok(self.snapshot(kind))
    }

    /// Snapshot of one provider.
    pub fn snapshot(&self, provider: ProviderKind) -> Option<ProviderMetrics> {
        self.providers.get(&provider).map(|entry| lock(entry).clone())
    }

    /// Every provider's counters with derived error rates and uptime.
    pub fn all_metrics(&self) -> MetricsReport {
        let providers = self
            .snapshots()
            .into_iter()
            .map(|(kind, m)| {
                let view = ProviderMetricsView {
                    status: m.status,
                    requests: m.requests,
                    errors: m.errors,
                    error_rate: round_to(m.error_rate(), 2),
                    avg_response_time_ms: m.avg_response_time_ms,
                    last_response_time_ms: m.last_response_time_ms,
                    last_success: m.last_success,
                    last_error: m.last_error,
                };
                (kind, view)
            })
            .collect();

        let total_requests = self.total_requests.load(Ordering::Relaxed);
        let total_errors = self.total_errors.load(Ordering::Relaxed);
        let overall_error_rate = if total_requests == 0 {
            0.0
        } else {
            round_to(total_errors as f64 / total_requests as f64 * 100.0, 2)
        };

        MetricsReport {
            uptime_secs: self.started.elapsed().as_secs(),
            total_requests,
            total_errors,
            overall_error_rate,
            providers,
        }
    }

    /// Aggregate health over providers that have been observed.
    ///
    /// `healthy` when every observed provider is healthy (including when none
    /// has been observed yet), `degraded` when only some are, `unhealthy` when
    /// none are.
    pub fn health_summary(&self) -> HealthSummary {
        let mut healthy = 0;
        let mut total = 0;
        let mut providers = BTreeMap::new();

        for (kind, m) in self.snapshots() {
            if m.status != ProviderStatus::Unknown {
                total += 1;
                if m.status == ProviderStatus::Healthy {
                    healthy += 1;
                }
            }
            providers.insert(
                kind,
                ProviderHealth {
                    status: m.status,
                    error_rate: round_to(m.error_rate(), 1),
                },
            );
        }

        let status = if healthy == total {
            OverallHealth::Healthy
        } else if healthy > 0 {
            OverallHealth::Degraded
        } else {
            OverallHealth::Unhealthy
        };

        HealthSummary {
            status,
            healthy,
            total,
            providers,
        }
    }

    /// Return every record to its initial state. Intended for tests.
    pub fn reset(&self) {
        for entry in self.providers.values() {
            *lock(entry) = ProviderMetrics::default();
        }
        self.total_requests.store(0, Ordering::Relaxed);
        self.total_errors.store(0, Ordering::Relaxed);
    }

    fn snapshots(&self) -> BTreeMap<ProviderKind, ProviderMetrics> {
        self.providers
            .iter()
            .map(|(&kind, entry)| (kind, lock(entry).clone()))
            .collect()
    }
}

fn lock(entry: &Mutex<ProviderMetrics>) -> MutexGuard<'_, ProviderMetrics> {
    entry.lock().unwrap_or_else(PoisonError::into_inner)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
