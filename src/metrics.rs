use metrics::{histogram, increment_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Performance counters for the capture pipeline
///
/// Backed by the global metrics recorder; a no-op unless a recorder is
/// installed via [`PrometheusExporter::install`].
#[derive(Debug, Default)]
pub struct Metrics;

impl Metrics {
    pub fn new() -> Self {
        Self
    }

    pub fn record_capture(&self, duration: Duration, success: bool) {
        if success {
            increment_counter!("captures_total");
        } else {
            increment_counter!("capture_failures_total");
        }
        histogram!("capture_duration_seconds", duration.as_secs_f64());
    }

    pub fn record_upload(&self, success: bool) {
        if success {
            increment_counter!("uploads_total");
        } else {
            increment_counter!("upload_failures_total");
        }
    }
}

/// Prometheus recorder plus the handle used to render `/metrics`
pub struct PrometheusExporter {
    handle: PrometheusHandle,
}

impl PrometheusExporter {
    /// Install the global recorder; fails if one is already set
    pub fn install() -> Result<Self, metrics::SetRecorderError> {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::set_boxed_recorder(Box::new(recorder))?;
        Ok(Self { handle })
    }

    /// Render the current metric values in Prometheus text format
    pub fn render(&self) -> String {
        self.handle.render()
    }
}
