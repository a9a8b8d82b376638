/// file: src/dashboard.rs
/// description: consumer-side fold of stream events into the dashboard's KPI and activity state
use crate::{
    events::{EventKind, EventSender, StreamEvent},
    registry::listener,
    seed::{self, TAX_TOTAL_KPI},
    service::{EventStreamService, Subscription},
    types::{AuditLogEntry, ConnectionState, Kpi, Trend},
};
use std::{collections::VecDeque, sync::Arc};
use tracing::{debug, warn};

pub const DEFAULT_HISTORY_CAP: usize = 7;

/// Everything the dashboard displays that changes over time.
///
/// The stream only proposes deltas and entries. Totals and the bounded
/// history live here.
#[derive(Debug, Clone)]
pub struct DashboardState {
    kpis: Vec<Kpi>,
    logs: VecDeque<AuditLogEntry>,
    history_cap: usize,
    link: ConnectionState,
    tax_updates_applied: u64,
    logs_received: u64,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP)
    }
}

impl DashboardState {
    /// Starts from the sample KPI cards and recent entries.
    pub fn new(history_cap: usize) -> Self {
        Self::with_seed(seed::kpis(), seed::recent_logs(), history_cap)
    }

    /// `logs` are newest first. A zero cap is treated as one.
    pub fn with_seed(kpis: Vec<Kpi>, logs: Vec<AuditLogEntry>, history_cap: usize) -> Self {
        let history_cap = history_cap.max(1);
        let mut logs: VecDeque<_> = logs.into();
        logs.truncate(history_cap);

        Self {
            kpis,
            logs,
            history_cap,
            link: ConnectionState::Disconnected,
            tax_updates_applied: 0,
            logs_received: 0,
        }
    }

    pub fn apply(&mut self, event: &StreamEvent) {
        match event {
            StreamEvent::StatusChange(state) => {
                self.link = *state;
            }
            StreamEvent::TaxUpdate(update) => {
                self.tax_updates_applied += 1;
                let Some(kpi) = self.kpis.iter_mut().find(|k| k.id == TAX_TOTAL_KPI) else {
                    debug!("no tax total card, delta dropped");
                    return;
                };
                kpi.value += update.delta;
                kpi.trend = Trend::from_delta(update.delta);
                kpi.trend_value = format!("{:+}", update.delta);
            }
            StreamEvent::NewLog(entry) => {
                self.logs_received += 1;
                self.logs.push_front(entry.clone());
                self.logs.truncate(self.history_cap);
            }
        }
    }

    pub fn tax_total(&self) -> Option<i64> {
        self.kpis
            .iter()
            .find(|k| k.id == TAX_TOTAL_KPI)
            .map(|k| k.value)
    }

    pub fn kpis(&self) -> &[Kpi] {
        &self.kpis
    }

    /// Newest first, at most `history_cap` entries.
    pub fn logs(&self) -> impl Iterator<Item = &AuditLogEntry> {
        self.logs.iter()
    }

    pub fn history_cap(&self) -> usize {
        self.history_cap
    }

    pub fn link(&self) -> ConnectionState {
        self.link
    }

    pub fn tax_updates_applied(&self) -> u64 {
        self.tax_updates_applied
    }

    pub fn logs_received(&self) -> u64 {
        self.logs_received
    }
}

/// Forwards every stream event into the ui channel for as long as it lives.
///
/// Subscribes on attach and unsubscribes on drop, so a torn-down view leaves
/// no listeners behind.
pub struct DashboardFeed {
    subscriptions: Vec<Subscription>,
}

impl DashboardFeed {
    pub fn attach(service: &EventStreamService, sender: EventSender) -> Self {
        let forward = listener(move |event: &StreamEvent| {
            // never block the driver: a full channel drops the event
            if let Err(e) = sender.try_send(event.clone()) {
                warn!(event = %event.kind(), error = %e, "dashboard channel rejected event");
            }
        });

        let subscriptions = EventKind::ALL
            .into_iter()
            .map(|kind| service.subscribe(kind, Arc::clone(&forward)))
            .collect();

        Self { subscriptions }
    }

    pub fn kinds(&self) -> impl Iterator<Item = EventKind> + '_ {
        self.subscriptions.iter().map(Subscription::kind)
    }
}
