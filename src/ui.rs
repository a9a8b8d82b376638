/// file: src/ui.rs
/// description: ui presentation layer that folds stream events into the dashboard and prints them
use crate::{
    dashboard::DashboardState,
    events::{EventReceiver, StreamEvent},
    formatter::{FeedFormatter, OutputFormat},
    monitoring::HealthStatus,
};
use tracing::{debug, info};

pub struct UIController {
    event_receiver: EventReceiver,
    dashboard: DashboardState,
    formatter: FeedFormatter,
    header_printed: bool,
    max_logs: Option<u64>,
}

pub struct UIOptions {
    pub colored: bool,
    pub quiet: bool,
    pub max_logs: Option<u64>,
}

impl UIController {
    pub fn new(
        event_receiver: EventReceiver,
        dashboard: DashboardState,
        format: OutputFormat,
        options: UIOptions,
    ) -> Self {
        Self {
            event_receiver,
            dashboard,
            formatter: FeedFormatter::new(format, options.colored, options.quiet),
            header_printed: false,
            max_logs: options.max_logs,
        }
    }

    pub fn dashboard(&self) -> &DashboardState {
        &self.dashboard
    }

    pub fn print_banner(&self, endpoint: &str) {
        self.formatter.print_banner(endpoint);
    }

    /// Drains events until the channel closes or the entry limit is reached.
    pub async fn run(&mut self) {
        while let Some(event) = self.event_receiver.recv().await {
            if !self.handle_event(event) {
                break;
            }
        }
    }

    /// Applies one event; returns false once the configured entry limit is hit.
    pub fn handle_event(&mut self, event: StreamEvent) -> bool {
        self.dashboard.apply(&event);

        match &event {
            StreamEvent::StatusChange(state) => {
                info!(state = %state, "Link status changed");
                self.formatter.print_status(*state);
            }
            StreamEvent::TaxUpdate(update) => {
                debug!(delta = update.delta, "Tax update applied");
                if let Some(total) = self.dashboard.tax_total() {
                    self.formatter.print_tax_update(total, update.delta);
                }
            }
            StreamEvent::NewLog(entry) => {
                if !self.header_printed {
                    self.formatter.print_header();
                    self.header_printed = true;
                }
                self.formatter.print_entry(entry);

                if let Some(max_logs) = self.max_logs
                    && self.formatter.entry_count() >= max_logs
                {
                    info!("Reached configured max entries ({max_logs})");
                    return false;
                }
            }
        }

        true
    }

    pub fn print_summary(&self, health: &HealthStatus) {
        self.formatter.print_summary(health, &self.dashboard);
    }

    pub fn print_error(&self, error_type: &str, message: &str) {
        self.formatter.print_error(error_type, message);
    }
}
