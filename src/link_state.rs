/// file: src/link_state.rs
/// description: session bookkeeping for the simulated link, kept apart from the driver logic
use crate::types::ConnectionState;
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug, Default)]
pub struct LinkState {
    pub state: ConnectionState,
    /// A connect has been requested and not yet torn down.
    pub active: bool,
    /// Bumped on every session start and teardown. Drivers compare against it.
    pub epoch: u64,
    pub session_id: Option<String>,
    pub driver: Option<JoinHandle<()>>,

    pub sessions_started: u64,
    pub outages: u64,
    pub tax_updates: u64,
    pub new_logs: u64,
    pub connected_since: Option<Instant>,
    pub last_event_time: Option<Instant>,
}

impl LinkState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new session and returns its epoch.
    pub fn begin_session(&mut self) -> u64 {
        self.epoch += 1;
        self.active = true;
        self.state = ConnectionState::Disconnected;
        self.session_id = Some(uuid::Uuid::new_v4().to_string());
        self.sessions_started += 1;
        self.epoch
    }

    /// Ends the current session and hands back its driver for cancellation.
    pub fn end_session(&mut self) -> Option<JoinHandle<()>> {
        self.epoch += 1;
        self.active = false;
        self.state = ConnectionState::Disconnected;
        self.connected_since = None;
        self.driver.take()
    }

    pub fn is_current(&self, epoch: u64) -> bool {
        self.active && self.epoch == epoch
    }

    /// True when data events of session `epoch` may be delivered.
    pub fn accepts_data(&self, epoch: u64) -> bool {
        self.is_current(epoch) && self.state.is_connected()
    }

    pub fn mark_connected(&mut self) {
        self.state = ConnectionState::Connected;
        if self.connected_since.is_none() {
            self.connected_since = Some(Instant::now());
        }
    }

    pub fn mark_reconnecting(&mut self) {
        self.state = ConnectionState::Reconnecting;
        self.outages += 1;
    }

    pub fn record_tax_update(&mut self) {
        self.tax_updates += 1;
        self.last_event_time = Some(Instant::now());
    }

    pub fn record_new_log(&mut self) {
        self.new_logs += 1;
        self.last_event_time = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sessions_invalidate_previous_epochs() {
        let mut link = LinkState::new();
        let first = link.begin_session();
        assert!(link.is_current(first));

        link.end_session();
        assert!(!link.is_current(first));

        let second = link.begin_session();
        assert_ne!(first, second);
        assert!(!link.is_current(first));
        assert!(link.is_current(second));
        assert_eq!(link.sessions_started, 2);
    }

    #[test]
    fn data_only_flows_while_connected() {
        let mut link = LinkState::new();
        let epoch = link.begin_session();
        assert!(!link.accepts_data(epoch));

        link.mark_connected();
        assert!(link.accepts_data(epoch));

        link.mark_reconnecting();
        assert!(!link.accepts_data(epoch));
        assert_eq!(link.outages, 1);

        link.mark_connected();
        assert!(link.accepts_data(epoch));
    }

    #[test]
    fn end_session_resets_state() {
        let mut link = LinkState::new();
        link.begin_session();
        link.mark_connected();
        assert!(link.end_session().is_none());
        assert_eq!(link.state, ConnectionState::Disconnected);
        assert!(!link.active);
        assert!(link.connected_since.is_none());
    }
}
