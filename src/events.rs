/// file: src/events.rs
/// description: closed event catalog and the channel that carries events to the ui
use crate::error::StreamError;
use crate::types::{AuditLogEntry, ConnectionState, TaxUpdate};
use serde::Serialize;
use std::{fmt, str::FromStr};
use tokio::sync::mpsc;

/// Event names a listener can register for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    StatusChange,
    TaxUpdate,
    NewLog,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [
        EventKind::StatusChange,
        EventKind::TaxUpdate,
        EventKind::NewLog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::StatusChange => "status_change",
            EventKind::TaxUpdate => "tax_update",
            EventKind::NewLog => "new_log",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| StreamError::UnknownEvent(s.to_string()))
    }
}

/// An emitted event with its kind-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum StreamEvent {
    StatusChange(ConnectionState),
    TaxUpdate(TaxUpdate),
    NewLog(AuditLogEntry),
}

impl StreamEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            StreamEvent::StatusChange(_) => EventKind::StatusChange,
            StreamEvent::TaxUpdate(_) => EventKind::TaxUpdate,
            StreamEvent::NewLog(_) => EventKind::NewLog,
        }
    }
}

// Bounded so a stalled ui cannot grow memory without limit.
// At the default cadence (one tick per 2s) this is hours of backlog.
const EVENT_CHANNEL_CAPACITY: usize = 1_024;

pub type EventSender = mpsc::Sender<StreamEvent>;
pub type EventReceiver = mpsc::Receiver<StreamEvent>;

pub fn create_event_channel() -> (EventSender, EventReceiver) {
    mpsc::channel(EVENT_CHANNEL_CAPACITY)
}
