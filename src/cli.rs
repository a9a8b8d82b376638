use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "fiscalctl-stream",
    about = "simulated real-time fiscal event stream with a terminal dashboard fold",
    version
)]
pub struct Args {
    /// Stream endpoint label shown in logs (no connection is made)
    #[arg(long, default_value = "wss://api.fiscalctl.com/stream")]
    pub endpoint: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Output logs in JSON format
    #[arg(long)]
    pub json_logs: bool,

    /// Enable metrics server
    #[arg(long)]
    pub metrics: bool,

    /// Metrics server port
    #[arg(long, default_value = "9090")]
    pub metrics_port: u16,

    /// Simulated connection latency in milliseconds
    #[arg(long, default_value = "1000")]
    pub connect_delay_ms: u64,

    /// Data tick period in milliseconds
    #[arg(long, default_value = "2000")]
    pub simulation_interval_ms: u64,

    /// Heartbeat period in milliseconds
    #[arg(long, default_value = "10000")]
    pub heartbeat_interval_ms: u64,

    /// Time spent reconnecting after a simulated outage, in milliseconds
    #[arg(long, default_value = "3000")]
    pub recovery_delay_ms: u64,

    /// Draws above this value emit a tax update
    #[arg(long, default_value = "0.7")]
    pub tax_update_threshold: f64,

    /// Draws above this value emit a new audit log entry
    #[arg(long, default_value = "0.85")]
    pub new_log_threshold: f64,

    /// Heartbeat draws above this value simulate an outage
    #[arg(long, default_value = "0.95")]
    pub outage_threshold: f64,

    /// Seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of recent audit entries kept by the dashboard
    #[arg(long, default_value = "7")]
    pub history_cap: usize,

    /// Stop after this many seconds (0 runs until Ctrl+C)
    #[arg(long, default_value = "0")]
    pub duration: u64,

    /// Stop after this many new audit entries (0 for unlimited)
    #[arg(long, default_value = "0")]
    pub max_logs: u64,

    /// Output format: table, csv, json, minimal
    #[arg(long, default_value = "table")]
    pub format: String,

    /// Disable colored output (useful for piping to files)
    #[arg(long)]
    pub no_color: bool,

    /// Quiet mode - only audit entries, no banners or status lines
    #[arg(long)]
    pub quiet: bool,
}
