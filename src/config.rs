/// file: src/config.rs
/// description: runtime configuration for the simulated stream, dashboard and metrics
use crate::{cli::Args, error::StreamError};
use anyhow::Result;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    pub stream: StreamConfig,
    pub metrics: MetricsConfig,
    pub dashboard: DashboardConfig,
    pub run: RunConfig,
}

#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub endpoint: Url,
    pub connect_delay: Duration,
    pub simulation_interval: Duration,
    pub heartbeat_interval: Duration,
    pub recovery_delay: Duration,
    pub thresholds: SimulationThresholds,
    pub seed: Option<u64>,
}

/// Cut-offs compared against uniform draws in `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationThresholds {
    pub tax_update: f64,
    pub new_log: f64,
    pub outage: f64,
    pub approval: f64,
}

#[derive(Debug, Clone)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub history_cap: usize,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub duration: Option<Duration>,
    pub max_logs: Option<u64>,
}

pub const DEFAULT_ENDPOINT: &str = "wss://api.fiscalctl.com/stream";

impl Default for SimulationThresholds {
    fn default() -> Self {
        Self {
            tax_update: 0.7,
            new_log: 0.85,
            outage: 0.95,
            approval: 0.2,
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is a valid url"),
            connect_delay: Duration::from_secs(1),
            simulation_interval: Duration::from_secs(2),
            heartbeat_interval: Duration::from_secs(10),
            recovery_delay: Duration::from_secs(3),
            thresholds: SimulationThresholds::default(),
            seed: None,
        }
    }
}

impl StreamConfig {
    pub fn validate(&self) -> Result<(), StreamError> {
        if !matches!(self.endpoint.scheme(), "ws" | "wss") {
            return Err(StreamError::InvalidConfig(format!(
                "endpoint must use ws or wss, got {}",
                self.endpoint.scheme()
            )));
        }

        for (name, period) in [
            ("simulation interval", self.simulation_interval),
            ("heartbeat interval", self.heartbeat_interval),
        ] {
            if period.is_zero() {
                return Err(StreamError::InvalidConfig(format!(
                    "{name} must be non-zero"
                )));
            }
        }

        let t = &self.thresholds;
        for (name, value) in [
            ("tax update threshold", t.tax_update),
            ("new log threshold", t.new_log),
            ("outage threshold", t.outage),
            ("approval threshold", t.approval),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(StreamError::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }

        Ok(())
    }
}

impl Config {
    pub fn from_args(args: &Args) -> Result<Self> {
        let stream = StreamConfig {
            endpoint: Url::parse(&args.endpoint).map_err(StreamError::from)?,
            connect_delay: Duration::from_millis(args.connect_delay_ms),
            simulation_interval: Duration::from_millis(args.simulation_interval_ms),
            heartbeat_interval: Duration::from_millis(args.heartbeat_interval_ms),
            recovery_delay: Duration::from_millis(args.recovery_delay_ms),
            thresholds: SimulationThresholds {
                tax_update: args.tax_update_threshold,
                new_log: args.new_log_threshold,
                outage: args.outage_threshold,
                ..SimulationThresholds::default()
            },
            seed: args.seed,
        };
        stream.validate()?;

        if args.history_cap == 0 {
            return Err(StreamError::InvalidConfig("history cap must be at least 1".into()).into());
        }

        Ok(Config {
            stream,
            metrics: MetricsConfig {
                enabled: args.metrics,
                port: args.metrics_port,
            },
            dashboard: DashboardConfig {
                history_cap: args.history_cap,
            },
            run: RunConfig {
                duration: (args.duration > 0).then(|| Duration::from_secs(args.duration)),
                max_logs: (args.max_logs > 0).then_some(args.max_logs),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["fiscalctl-stream"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn defaults_match_stream_constants() {
        let config = Config::from_args(&parse(&[])).unwrap();
        let defaults = StreamConfig::default();

        assert_eq!(config.stream.endpoint, defaults.endpoint);
        assert_eq!(config.stream.connect_delay, defaults.connect_delay);
        assert_eq!(config.stream.simulation_interval, Duration::from_secs(2));
        assert_eq!(config.stream.heartbeat_interval, Duration::from_secs(10));
        assert_eq!(config.stream.recovery_delay, Duration::from_secs(3));
        assert_eq!(config.stream.thresholds, SimulationThresholds::default());
        assert_eq!(config.dashboard.history_cap, 7);
        assert!(config.run.duration.is_none());
        assert!(config.run.max_logs.is_none());
    }

    #[test]
    fn rejects_zero_simulation_interval() {
        let err = Config::from_args(&parse(&["--simulation-interval-ms", "0"])).unwrap_err();
        assert!(err.to_string().contains("simulation interval"));
    }

    #[test]
    fn rejects_threshold_out_of_range() {
        let err = Config::from_args(&parse(&["--outage-threshold", "1.5"])).unwrap_err();
        assert!(err.to_string().contains("outage threshold"));
    }

    #[test]
    fn rejects_non_websocket_endpoint() {
        let err = Config::from_args(&parse(&["--endpoint", "https://example.com"])).unwrap_err();
        assert!(err.to_string().contains("ws or wss"));
    }

    #[test]
    fn rejects_empty_history() {
        assert!(Config::from_args(&parse(&["--history-cap", "0"])).is_err());
    }

    #[test]
    fn run_limits_are_optional() {
        let config = Config::from_args(&parse(&["--duration", "30", "--max-logs", "5"])).unwrap();
        assert_eq!(config.run.duration, Some(Duration::from_secs(30)));
        assert_eq!(config.run.max_logs, Some(5));
    }
}
