use anyhow::Result;
use clap::Parser;
use fiscalctl_stream::{
    cli::Args,
    config::Config,
    dashboard::{DashboardFeed, DashboardState},
    events::create_event_channel,
    formatter::OutputFormat,
    monitoring::setup_metrics,
    service::EventStreamService,
    tracing_setup::setup_tracing,
    ui::{UIController, UIOptions},
};
use std::time::Duration;
use tracing::{error, info};

async fn run_for(duration: Option<Duration>) {
    match duration {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending().await,
    }
}

// Single-threaded like the feed it simulates; disconnect relies on it.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_tracing(&args.log_level, args.json_logs)?;

    info!(
        "Starting fiscalctl stream v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_args(&args)?;

    if config.metrics.enabled {
        setup_metrics(config.metrics.port).await?;
        info!("Metrics server started on port {}", config.metrics.port);
    }

    let service = EventStreamService::new(config.stream.clone());
    let (sender, receiver) = create_event_channel();
    let feed = DashboardFeed::attach(&service, sender);

    let mut ui = UIController::new(
        receiver,
        DashboardState::new(config.dashboard.history_cap),
        OutputFormat::from(args.format.as_str()),
        UIOptions {
            colored: !args.no_color,
            quiet: args.quiet,
            max_logs: config.run.max_logs,
        },
    );
    ui.print_banner(config.stream.endpoint.as_str());

    service.connect();
    info!("Stream started. Press Ctrl+C to shutdown...");

    let signal_error = tokio::select! {
        _ = ui.run() => {
            info!("Dashboard finished");
            None
        }
        _ = run_for(config.run.duration) => {
            info!("Run duration elapsed");
            None
        }
        signal = tokio::signal::ctrl_c() => {
            info!("Ctrl+C received");
            signal.err()
        }
    };

    if let Some(e) = signal_error {
        error!("Failed to listen for Ctrl+C: {}", e);
        ui.print_error("SIGNAL", &e.to_string());
    }

    service.disconnect();
    drop(feed);

    let health = service.health();
    info!(health = %health.to_json(), "Stream stopped");
    ui.print_summary(&health);

    Ok(())
}
