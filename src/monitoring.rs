use crate::{error::StreamError, events::EventKind, types::ConnectionState};
use anyhow::Result;
use metrics::{Counter, Gauge, counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::{net::SocketAddr, sync::LazyLock};
use tracing::{error, info};

// Global metrics
pub static SESSION_COUNTER: LazyLock<Counter> =
    LazyLock::new(|| counter!("fiscalctl_stream_sessions_total"));
pub static OUTAGE_COUNTER: LazyLock<Counter> =
    LazyLock::new(|| counter!("fiscalctl_stream_outages_total"));
pub static LISTENER_FAILURE_COUNTER: LazyLock<Counter> =
    LazyLock::new(|| counter!("fiscalctl_stream_listener_failures_total"));
pub static CONNECTED_GAUGE: LazyLock<Gauge> =
    LazyLock::new(|| gauge!("fiscalctl_stream_connected"));

pub fn record_emitted(kind: EventKind) {
    counter!("fiscalctl_stream_events_total", "kind" => kind.as_str()).increment(1);
}

pub async fn setup_metrics(port: u16) -> Result<()> {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();

    let builder = PrometheusBuilder::new()
        .with_http_listener(addr)
        .add_global_label("service", "fiscalctl-stream")
        .add_global_label("version", env!("CARGO_PKG_VERSION"));

    match builder.install() {
        Ok(_handle) => {
            info!(
                "Prometheus metrics server started on http://{}/metrics",
                addr
            );

            SESSION_COUNTER.absolute(0);
            OUTAGE_COUNTER.absolute(0);
            LISTENER_FAILURE_COUNTER.absolute(0);
            CONNECTED_GAUGE.set(0.0);

            Ok(())
        }
        Err(e) => {
            error!("Failed to start metrics server: {}", e);
            Err(StreamError::MetricsError(e.to_string()).into())
        }
    }
}

#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub state: ConnectionState,
    pub session_id: Option<String>,
    pub last_event_time: Option<chrono::DateTime<chrono::Utc>>,
    pub sessions_started: u64,
    pub outages: u64,
    pub tax_updates: u64,
    pub new_logs: u64,
    pub uptime: chrono::Duration,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthStatus {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            session_id: None,
            last_event_time: None,
            sessions_started: 0,
            outages: 0,
            tax_updates: 0,
            new_logs: 0,
            uptime: chrono::Duration::zero(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.state.is_connected()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "status": if self.is_healthy() { "healthy" } else { "unhealthy" },
            "connection": self.state,
            "session_id": self.session_id,
            "last_event_time": self.last_event_time,
            "sessions_started": self.sessions_started,
            "outages": self.outages,
            "tax_updates": self.tax_updates,
            "new_logs": self.new_logs,
            "uptime_seconds": self.uptime.num_seconds(),
            "timestamp": chrono::Utc::now()
        })
    }
}
