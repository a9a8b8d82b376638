/// file: src/types.rs
/// description: domain records carried by the stream and folded by the dashboard
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Review outcome of an audited transaction. Also drives KPI card colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Approved,
    Rejected,
    Pending,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Approved => "APPROVED",
            Status::Rejected => "REJECTED",
            Status::Pending => "PENDING",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Simulated link health as reported through `status_change` events.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
    Reconnecting,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Proposed signed adjustment to the running tax liability. The consumer owns the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxUpdate {
    pub delta: i64,
}

/// One recorded financial transaction shown in the activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: String,
    pub title: String,
    pub category: String,
    pub amount: u64, // whole currency units
    pub date: String, // display string, not parsed
    pub status: Status,
}

impl AuditLogEntry {
    /// Display label for an entry recorded "today" at the given local time.
    pub fn today_label(at: DateTime<Local>) -> String {
        format!("Today, {}", at.format("%H:%M:%S"))
    }

    /// Structural sanity: non-empty id and a positive amount.
    pub fn is_well_formed(&self) -> bool {
        !self.id.is_empty() && self.amount > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

impl Trend {
    pub fn from_delta(delta: i64) -> Self {
        match delta.signum() {
            1 => Trend::Up,
            -1 => Trend::Down,
            _ => Trend::Neutral,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Trend::Up => "▲",
            Trend::Down => "▼",
            Trend::Neutral => "■",
        }
    }
}

/// A summary metric displayed as a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kpi {
    pub id: String,
    pub title: String,
    pub value: i64, // whole currency units
    pub subtext: Option<String>,
    pub status: Status,
    pub badge: Option<String>,
    pub trend: Trend,
    pub trend_value: String,
}
