use crate::{
    dashboard::DashboardState,
    monitoring::HealthStatus,
    types::{AuditLogEntry, ConnectionState, Kpi, Status, Trend},
};
use tracing::warn;

// ANSI color codes
pub struct Colors;

impl Colors {
    pub const RESET: &'static str = "\x1b[0m";
    pub const BOLD: &'static str = "\x1b[1m";
    pub const DIM: &'static str = "\x1b[2m";

    // Colors
    pub const RED: &'static str = "\x1b[31m";
    pub const WHITE: &'static str = "\x1b[37m";
    pub const GRAY: &'static str = "\x1b[90m";

    // Bright colors
    pub const BRIGHT_RED: &'static str = "\x1b[91m";
    pub const BRIGHT_GREEN: &'static str = "\x1b[92m";
    pub const BRIGHT_YELLOW: &'static str = "\x1b[93m";
    pub const BRIGHT_BLUE: &'static str = "\x1b[94m";
    pub const BRIGHT_MAGENTA: &'static str = "\x1b[95m";
    pub const BRIGHT_CYAN: &'static str = "\x1b[96m";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
    Minimal,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "csv" => OutputFormat::Csv,
            "json" => OutputFormat::Json,
            "minimal" => OutputFormat::Minimal,
            _ => OutputFormat::Table,
        }
    }
}

/// `$12,450`, `-$45`.
pub fn format_currency(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if amount < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let kept: String = value.chars().take(width.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

pub struct FeedFormatter {
    format: OutputFormat,
    colored: bool,
    quiet: bool,
    entry_count: u64,
}

impl FeedFormatter {
    pub fn new(format: OutputFormat, colored: bool, quiet: bool) -> Self {
        Self {
            format,
            colored,
            quiet,
            entry_count: 0,
        }
    }

    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.colored {
            format!("{color}{text}{}", Colors::RESET)
        } else {
            text.to_string()
        }
    }

    fn status_color(status: Status) -> &'static str {
        match status {
            Status::Approved => Colors::BRIGHT_GREEN,
            Status::Rejected => Colors::BRIGHT_RED,
            Status::Pending => Colors::BRIGHT_YELLOW,
        }
    }

    pub fn print_header(&self) {
        if self.quiet {
            return;
        }

        match self.format {
            OutputFormat::Table => {
                let header = format!(
                    "{:<18} │ {:<32} │ {:<16} │ {:>10} │ {:<8}",
                    "DATE", "TITLE", "CATEGORY", "AMOUNT", "STATUS"
                );
                println!("{}", self.paint(Colors::BOLD, &header));
                println!("{}", self.paint(Colors::GRAY, &"─".repeat(header.chars().count())));
            }
            OutputFormat::Csv => println!("id,date,title,category,amount,status"),
            OutputFormat::Json | OutputFormat::Minimal => {}
        }
    }

    pub fn print_entry(&mut self, entry: &AuditLogEntry) {
        self.entry_count += 1;
        println!("{}", self.format_entry(entry));
    }

    pub fn format_entry(&self, entry: &AuditLogEntry) -> String {
        match self.format {
            OutputFormat::Table => self.format_table_row(entry),
            OutputFormat::Csv => Self::format_csv_row(entry),
            OutputFormat::Json => Self::format_json_row(entry),
            OutputFormat::Minimal => self.format_minimal_row(entry),
        }
    }

    fn format_table_row(&self, entry: &AuditLogEntry) -> String {
        let status = format!("{:<8}", entry.status);
        format!(
            "{:<18} │ {:<32} │ {:<16} │ {:>10} │ {}",
            truncate(&entry.date, 18),
            truncate(&entry.title, 32),
            truncate(&entry.category, 16),
            format_currency(entry.amount as i64),
            self.paint(Self::status_color(entry.status), &status)
        )
    }

    fn format_csv_row(entry: &AuditLogEntry) -> String {
        [
            csv_field(&entry.id),
            csv_field(&entry.date),
            csv_field(&entry.title),
            csv_field(&entry.category),
            entry.amount.to_string(),
            entry.status.to_string(),
        ]
        .join(",")
    }

    fn format_json_row(entry: &AuditLogEntry) -> String {
        match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(e) => {
                warn!(id = %entry.id, "Failed to serialize audit entry: {}", e);
                String::new()
            }
        }
    }

    fn format_minimal_row(&self, entry: &AuditLogEntry) -> String {
        format!(
            "{} {} {} {}",
            entry.status.as_str().chars().next().unwrap_or('?'),
            format_currency(entry.amount as i64),
            entry.title,
            self.paint(Colors::DIM, &entry.date)
        )
    }

    pub fn print_tax_update(&self, total: i64, delta: i64) {
        if self.quiet || matches!(self.format, OutputFormat::Csv | OutputFormat::Json) {
            return;
        }
        let color = match Trend::from_delta(delta) {
            Trend::Up => Colors::BRIGHT_RED,
            Trend::Down => Colors::BRIGHT_GREEN,
            Trend::Neutral => Colors::WHITE,
        };
        println!(
            "{} Total tax liability {} ({})",
            self.paint(Colors::BRIGHT_BLUE, "[KPI]"),
            self.paint(Colors::BOLD, &format_currency(total)),
            self.paint(color, &format!("{delta:+}"))
        );
    }

    pub fn print_status(&self, state: ConnectionState) {
        if self.quiet {
            return;
        }
        let (color, symbol) = match state {
            ConnectionState::Connected => (Colors::BRIGHT_GREEN, "+"),
            ConnectionState::Reconnecting => (Colors::BRIGHT_YELLOW, "*"),
            ConnectionState::Disconnected => (Colors::BRIGHT_RED, "X"),
        };
        let label = format!("[{}]", state.as_str().to_uppercase());
        eprintln!("{} {}", self.paint(color, &label), symbol);
    }

    pub fn format_kpi(&self, kpi: &Kpi) -> String {
        let mut line = format!(
            "{:<24} {:>10} {} {}",
            kpi.title,
            format_currency(kpi.value),
            kpi.trend.symbol(),
            kpi.trend_value
        );
        if let Some(badge) = &kpi.badge {
            line.push_str(&format!(" [{badge}]"));
        }
        if let Some(subtext) = &kpi.subtext {
            line.push_str(&format!(" {}", self.paint(Colors::DIM, subtext)));
        }
        self.paint(Self::status_color(kpi.status), &line)
    }

    pub fn print_snapshot(&self, state: &DashboardState) {
        println!();
        println!("{}", self.paint(Colors::BOLD, "Key indicators"));
        for kpi in state.kpis() {
            println!("  {}", self.format_kpi(kpi));
        }
        println!();
        println!(
            "{}",
            self.paint(
                Colors::BOLD,
                &format!("Recent activity (last {})", state.history_cap())
            )
        );
        for entry in state.logs() {
            println!(
                "  {} {:<32} {:>10} {}",
                self.paint(Colors::DIM, &format!("{:<18}", entry.date)),
                truncate(&entry.title, 32),
                format_currency(entry.amount as i64),
                self.paint(Self::status_color(entry.status), entry.status.as_str())
            );
        }
    }

    pub fn print_summary(&self, health: &HealthStatus, state: &DashboardState) {
        if self.quiet {
            return;
        }
        self.print_snapshot(state);
        println!();
        println!(
            "{} sessions: {} │ outages: {} │ tax updates: {} │ new entries: {} │ uptime: {}s",
            self.paint(Colors::BRIGHT_CYAN, "[SUMMARY]"),
            health.sessions_started,
            health.outages,
            state.tax_updates_applied(),
            state.logs_received(),
            health.uptime.num_seconds()
        );
    }

    pub fn print_error(&self, error_type: &str, message: &str) {
        eprintln!(
            "{} ! {}",
            self.paint(Colors::BRIGHT_RED, &format!("[{error_type}]")),
            self.paint(Colors::RED, message)
        );
    }

    pub fn print_banner(&self, endpoint: &str) {
        if self.quiet {
            return;
        }
        let rule = "═".repeat(78);
        println!("{}", self.paint(Colors::BRIGHT_CYAN, &format!("╔{rule}╗")));
        println!(
            "{}",
            self.paint(
                Colors::BRIGHT_CYAN,
                &format!("║{:^78}║", "FISCALCTL REAL-TIME OVERSIGHT")
            )
        );
        println!("{}", self.paint(Colors::BRIGHT_CYAN, &format!("╚{rule}╝")));
        println!(
            "{} v{} │ feed: {}",
            self.paint(Colors::BRIGHT_MAGENTA, "[STREAM]"),
            env!("CARGO_PKG_VERSION"),
            endpoint
        );
        println!();
    }
}
