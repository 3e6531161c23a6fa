//! Concurrent scan scheduling.
//!
//! A fixed pool of workers pulls ports from a shared queue, probes them and
//! pushes results into a shared, lock-guarded list. The scan is done when
//! every worker has drained the queue, so every requested port is covered
//! exactly as often as it appears in the input.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

use crate::config::ScanConfig;
use crate::scan::probe::{probe_port, PortProbeResult, PortStatus};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Aggregated result of a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub host: String,
    pub total_scanned: usize,
    pub open_ports: Vec<u16>,
    pub closed_ports: Vec<u16>,
    pub timeout_ports: Vec<u16>,
    pub error_ports: Vec<u16>,
    pub results: Vec<PortProbeResult>,
    pub duration: String,
    pub start_time: String,
    pub end_time: String,
}

impl ScanReport {
    /// Bucket sizes keyed by status name.
    pub fn bucket_counts(&self) -> [(&'static str, usize); 4] {
        [
            (PortStatus::Open.as_str(), self.open_ports.len()),
            (PortStatus::Closed.as_str(), self.closed_ports.len()),
            (PortStatus::Timeout.as_str(), self.timeout_ports.len()),
            (PortStatus::Error.as_str(), self.error_ports.len()),
        ]
    }
}

/// Per-request scan parameters, already resolved against defaults.
#[derive(Debug, Clone)]
pub struct ScanPlan {
    pub host: String,
    pub ports: Vec<u16>,
    pub timeout: Duration,
    pub batch_size: usize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Runs scans with a bounded worker pool.
#[derive(Debug, Clone)]
pub struct ScanScheduler {
    config: ScanConfig,
}

impl ScanScheduler {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Number of concurrent workers for a plan.
    pub fn worker_count(&self, plan: &ScanPlan) -> usize {
        plan.batch_size
            .min(self.config.max_concurrency)
            .min(plan.ports.len())
            .max(1)
    }

    pub async fn run(&self, plan: ScanPlan) -> ScanReport {
        let started_at = Local::now();
        let start = Instant::now();
        let workers = self.worker_count(&plan);
        let total = plan.ports.len();

        tracing::info!(
            host = %plan.host,
            ports = total,
            timeout_ms = plan.timeout.as_millis() as u64,
            workers,
            "Starting port scan"
        );

        let queue = Arc::new(Mutex::new(plan.ports.into_iter().enumerate()));
        let collected: Arc<Mutex<Vec<(usize, PortProbeResult)>>> = Arc::new(Mutex::new(Vec::with_capacity(total)));
        let host: Arc<str> = Arc::from(plan.host.as_str());
        let write_timeout = Duration::from_millis(self.config.write_timeout_ms);

        let mut set = JoinSet::new();
        for _ in 0..workers {
            let queue = queue.clone();
            let collected = collected.clone();
            let host = host.clone();
            let connect_timeout = plan.timeout;
            set.spawn(async move {
                loop {
                    let next = lock(&queue).next();
                    let Some((index, port)) = next else {
                        break;
                    };
                    let result = probe_port(&host, port, connect_timeout, write_timeout).await;
                    lock(&collected).push((index, result));
                }
            });
        }
        while let Some(joined) = set.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Scan worker terminated abnormally");
            }
        }

        let mut indexed = std::mem::take(&mut *lock(&collected));
        indexed.sort_by_key(|(index, _)| *index);
        let results: Vec<PortProbeResult> = indexed.into_iter().map(|(_, result)| result).collect();

        let elapsed = start.elapsed();
        let report = aggregate(plan.host, total, results, elapsed, started_at.format(TIMESTAMP_FORMAT).to_string());

        tracing::info!(
            host = %report.host,
            open = report.open_ports.len(),
            closed = report.closed_ports.len(),
            timeout = report.timeout_ports.len(),
            error = report.error_ports.len(),
            duration = %report.duration,
            "Port scan complete"
        );
        report
    }
}

/// Partition results into the four status buckets.
pub fn aggregate(
    host: String,
    total_scanned: usize,
    results: Vec<PortProbeResult>,
    elapsed: Duration,
    start_time: String,
) -> ScanReport {
    let mut open_ports = Vec::new();
    let mut closed_ports = Vec::new();
    let mut timeout_ports = Vec::new();
    let mut error_ports = Vec::new();

    for result in &results {
        let bucket = match result.status {
            PortStatus::Open => &mut open_ports,
            PortStatus::Closed => &mut closed_ports,
            PortStatus::Timeout => &mut timeout_ports,
            PortStatus::Error => &mut error_ports,
        };
        bucket.push(result.port);
    }

    ScanReport {
        host,
        total_scanned,
        open_ports,
        closed_ports,
        timeout_ports,
        error_ports,
        results,
        duration: format!("{:?}", elapsed),
        start_time,
        end_time: Local::now().format(TIMESTAMP_FORMAT).to_string(),
    }
}
