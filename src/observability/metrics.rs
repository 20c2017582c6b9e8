//! Thread-safe dispatch metrics
//!
//! Atomic counters for per-outcome totals and mutex-protected collections for
//! latency samples and per-agent statistics. A collector is owned by the
//! dispatcher that feeds it; there is no process-wide instance.

use crate::protocol::ResponseStatus;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Latency samples kept per series
const MAX_SAMPLES: usize = 1000;

/// Thread-safe metrics collector using atomics and mutexes
#[derive(Debug)]
pub struct MetricsCollector {
    requests_received: AtomicU64,
    requests_in_flight: AtomicU64,
    answered: AtomicU64,
    not_understood: AtomicU64,
    failed: AtomicU64,
    unhandled: AtomicU64,
    unavailable: AtomicU64,
    escalations: AtomicU64,

    processing_times: Mutex<VecDeque<u64>>, // in milliseconds
    agent_stats: Mutex<HashMap<String, AgentInvocationStats>>,

    started_at: AtomicU64,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            requests_received: AtomicU64::new(0),
            requests_in_flight: AtomicU64::new(0),
            answered: AtomicU64::new(0),
            not_understood: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            unhandled: AtomicU64::new(0),
            unavailable: AtomicU64::new(0),
            escalations: AtomicU64::new(0),
            processing_times: Mutex::new(VecDeque::new()),
            agent_stats: Mutex::new(HashMap::new()),
            started_at: AtomicU64::new(current_timestamp()),
        }
    }

    /// Count a new request; it stays in flight until the returned guard drops
    #[must_use = "the request leaves the in-flight count when the guard drops"]
    pub fn request_received(&self) -> InFlightGuard<'_> {
        self.requests_received.fetch_add(1, Ordering::Relaxed);
        self.requests_in_flight.fetch_add(1, Ordering::Relaxed);
        InFlightGuard {
            in_flight: &self.requests_in_flight,
        }
    }

    /// Record the final outcome of a dispatch call
    pub fn request_completed(&self, status: ResponseStatus, duration: Duration) {
        let counter = match status {
            ResponseStatus::Answered => &self.answered,
            ResponseStatus::NotUnderstood => &self.not_understood,
            ResponseStatus::Failed => &self.failed,
            ResponseStatus::Unhandled => &self.unhandled,
            ResponseStatus::Unavailable => &self.unavailable,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut times) = self.processing_times.lock() {
            push_sample(&mut times, duration);
        }
    }

    /// Record one agent invocation
    pub fn agent_invoked(&self, agent: &str, status: ResponseStatus, duration: Duration) {
        if let Ok(mut stats) = self.agent_stats.lock() {
            let entry = stats.entry(agent.to_string()).or_default();
            entry.invocations += 1;
            entry.last_invocation = current_timestamp();
            if status == ResponseStatus::Failed {
                entry.failures += 1;
            }
            push_sample(&mut entry.durations, duration);
        }
    }

    /// Record an agent invocation that hit the dispatch timeout
    pub fn agent_timed_out(&self, agent: &str) {
        if let Ok(mut stats) = self.agent_stats.lock() {
            stats.entry(agent.to_string()).or_default().timeouts += 1;
        }
    }

    /// Record a fall-through to the next candidate
    pub fn escalated(&self) {
        self.escalations.fetch_add(1, Ordering::Relaxed);
    }

    fn processing_time_statistics(&self) -> (f64, f64, f64, f64) {
        let Ok(times) = self.processing_times.lock() else {
            return (0.0, 0.0, 0.0, 0.0);
        };
        if times.is_empty() {
            return (0.0, 0.0, 0.0, 0.0);
        }

        let mut sorted_times: Vec<u64> = times.iter().copied().collect();
        sorted_times.sort_unstable();

        let avg = sorted_times.iter().sum::<u64>() as f64 / sorted_times.len() as f64;
        (
            avg,
            percentile(&sorted_times, 50.0),
            percentile(&sorted_times, 95.0),
            percentile(&sorted_times, 99.0),
        )
    }

    fn agent_snapshots(&self) -> HashMap<String, AgentStatsSnapshot> {
        let Ok(stats) = self.agent_stats.lock() else {
            return HashMap::new();
        };

        stats
            .iter()
            .map(|(name, stats)| {
                let avg_duration_ms = if stats.durations.is_empty() {
                    0.0
                } else {
                    stats.durations.iter().sum::<u64>() as f64 / stats.durations.len() as f64
                };
                let success_rate = if stats.invocations == 0 {
                    0.0
                } else {
                    (stats.invocations - stats.failures) as f64 / stats.invocations as f64
                };

                (
                    name.clone(),
                    AgentStatsSnapshot {
                        invocations: stats.invocations,
                        failures: stats.failures,
                        timeouts: stats.timeouts,
                        avg_duration_ms,
                        success_rate,
                        last_invocation: stats.last_invocation,
                    },
                )
            })
            .collect()
    }

    /// Get complete metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        let now = current_timestamp();
        let (avg_processing_time_ms, p50, p95, p99) = self.processing_time_statistics();

        MetricsSnapshot {
            requests: RequestMetrics {
                received: self.requests_received.load(Ordering::Relaxed),
                in_flight: self.requests_in_flight.load(Ordering::Relaxed),
                answered: self.answered.load(Ordering::Relaxed),
                not_understood: self.not_understood.load(Ordering::Relaxed),
                failed: self.failed.load(Ordering::Relaxed),
                unhandled: self.unhandled.load(Ordering::Relaxed),
                unavailable: self.unavailable.load(Ordering::Relaxed),
                escalations: self.escalations.load(Ordering::Relaxed),
                avg_processing_time_ms,
                processing_time_p50_ms: p50,
                processing_time_p95_ms: p95,
                processing_time_p99_ms: p99,
            },
            agents: self.agent_snapshots(),
            uptime_seconds: now.saturating_sub(self.started_at.load(Ordering::Relaxed)),
            timestamp: now,
        }
    }
}

/// Holds one request in the in-flight count, including dispatches that are
/// cancelled before they complete
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    in_flight: &'a AtomicU64,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Default)]
struct AgentInvocationStats {
    invocations: u64,
    failures: u64,
    timeouts: u64,
    durations: VecDeque<u64>, // milliseconds
    last_invocation: u64,
}

// Public metrics structures
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests: RequestMetrics,
    pub agents: HashMap<String, AgentStatsSnapshot>,
    pub uptime_seconds: u64,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestMetrics {
    pub received: u64,
    pub in_flight: u64,
    pub answered: u64,
    pub not_understood: u64,
    pub failed: u64,
    pub unhandled: u64,
    pub unavailable: u64,
    pub escalations: u64,
    pub avg_processing_time_ms: f64,
    pub processing_time_p50_ms: f64,
    pub processing_time_p95_ms: f64,
    pub processing_time_p99_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentStatsSnapshot {
    pub invocations: u64,
    pub failures: u64,
    pub timeouts: u64,
    pub avg_duration_ms: f64,
    pub success_rate: f64,
    pub last_invocation: u64,
}

// Helper functions
fn push_sample(samples: &mut VecDeque<u64>, duration: Duration) {
    samples.push_back(duration.as_millis() as u64);
    if samples.len() > MAX_SAMPLES {
        samples.pop_front();
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn percentile(sorted_data: &[u64], percentile: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }

    let len = sorted_data.len();
    let index = (percentile / 100.0) * (len - 1) as f64;

    if index.fract() == 0.0 {
        sorted_data[index as usize] as f64
    } else {
        let lower_index = index.floor() as usize;
        let upper_index = index.ceil() as usize;
        let lower_value = sorted_data[lower_index] as f64;
        let upper_value = sorted_data[upper_index] as f64;

        lower_value + (upper_value - lower_value) * index.fract()
    }
}
