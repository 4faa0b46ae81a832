use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Instant,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestMetrics {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub avg_response_time_ms: f64,
    pub last_error: Option<String>,
    pub last_error_time: Option<DateTime<Utc>>,
}

/// Shared request counters, fed by [`track_requests`].
#[derive(Clone, Default)]
pub struct MetricsCollector {
    metrics: Arc<Mutex<RequestMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RequestMetrics> {
        self.metrics.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_request_start(&self) -> RequestTracker {
        RequestTracker {
            start_time: Instant::now(),
            collector: self.clone(),
        }
    }

    pub fn record_error(&self, error: String) {
        let mut metrics = self.lock();
        metrics.last_error = Some(error);
        metrics.last_error_time = Some(Utc::now());
    }

    pub fn get_metrics(&self) -> RequestMetrics {
        self.lock().clone()
    }
}

pub struct RequestTracker {
    start_time: Instant,
    collector: MetricsCollector,
}

impl RequestTracker {
    pub fn finish(self, success: bool) {
        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut metrics = self.collector.lock();

        metrics.total_requests += 1;
        if success {
            metrics.successful_requests += 1;
        } else {
            metrics.failed_requests += 1;
        }

        // Exponential moving average, seeded by the first sample.
        let alpha = 0.1;
        metrics.avg_response_time_ms = if metrics.total_requests == 1 {
            elapsed_ms
        } else {
            metrics.avg_response_time_ms * (1.0 - alpha) + elapsed_ms * alpha
        };
    }
}

/// Counts every request; 5xx responses count as failures.
pub async fn track_requests(
    State(metrics): State<MetricsCollector>,
    request: Request,
    next: Next,
) -> Response {
    let route = format!("{} {}", request.method(), request.uri().path());
    let tracker = metrics.record_request_start();
    let response = next.run(request).await;
    let failed = response.status().is_server_error();
    tracker.finish(!failed);
    if failed {
        metrics.record_error(format!("{} returned {}", route, response.status()));
    }
    response
}
