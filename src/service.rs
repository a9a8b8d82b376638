// file: src/service.rs
// description: simulated real-time event stream, a listener bus driven by local timers
// no transport is involved: the endpoint is only a label for logs

use crate::{
    config::StreamConfig,
    events::{EventKind, StreamEvent},
    link_state::LinkState,
    monitoring::{CONNECTED_GAUGE, HealthStatus, OUTAGE_COUNTER, SESSION_COUNTER, record_emitted},
    random::{self, RandomSource},
    registry::{self, Listener, ListenerRegistry},
    simulation,
    types::ConnectionState,
};
use chrono::{Local, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep, sleep_until};
use tracing::{debug, info, trace, warn};

// Listeners never run under these locks, so a poisoned guard still holds consistent data.
fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Shared {
    config: StreamConfig,
    registry: Mutex<ListenerRegistry>,
    link: Mutex<LinkState>,
    rng: Mutex<Box<dyn RandomSource>>,
}

/// Publish/subscribe bus fed by a timer-driven simulation.
///
/// Cloning yields another handle to the same service. `connect` spawns the
/// session driver and must be called from within a tokio runtime; the binary
/// drives it on a current-thread runtime.
#[derive(Clone)]
pub struct EventStreamService {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for EventStreamService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStreamService")
            .field("state", &self.state())
            .field("listeners", &*lock(&self.shared.registry))
            .finish()
    }
}

impl EventStreamService {
    pub fn new(config: StreamConfig) -> Self {
        let rng = random::from_seed(config.seed);
        Self::with_random(config, rng)
    }

    /// Builds a service that draws from `rng` instead of the configured seed.
    pub fn with_random(config: StreamConfig, rng: Box<dyn RandomSource>) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                registry: Mutex::new(ListenerRegistry::new()),
                link: Mutex::new(LinkState::new()),
                rng: Mutex::new(rng),
            }),
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.shared.config
    }

    /// Registers `listener` for every future emission of `kind`.
    pub fn on(&self, kind: EventKind, listener: Listener) {
        let count = {
            let mut registry = lock(&self.shared.registry);
            registry.register(kind, listener);
            registry.count(kind)
        };
        debug!(event = %kind, listeners = count, "listener registered");
    }

    /// Removes every registration of `listener` under `kind`. Unknown listeners are ignored.
    pub fn off(&self, kind: EventKind, listener: &Listener) {
        let removed = lock(&self.shared.registry).unregister(kind, listener);
        debug!(event = %kind, removed, "listener unregistered");
    }

    /// Like [`on`](Self::on), but unregisters when the returned guard is dropped.
    pub fn subscribe(&self, kind: EventKind, listener: Listener) -> Subscription {
        self.on(kind, Arc::clone(&listener));
        Subscription {
            shared: Arc::downgrade(&self.shared),
            kind,
            listener,
        }
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        lock(&self.shared.registry).count(kind)
    }

    pub fn state(&self) -> ConnectionState {
        lock(&self.shared.link).state
    }

    /// True from `connect` until the matching `disconnect`, including the startup latency.
    pub fn is_active(&self) -> bool {
        lock(&self.shared.link).active
    }

    pub fn health(&self) -> HealthStatus {
        let link = lock(&self.shared.link);
        let since = |at: Instant| chrono::Duration::from_std(at.elapsed()).unwrap_or_default();

        HealthStatus {
            state: link.state,
            session_id: link.session_id.clone(),
            last_event_time: link.last_event_time.map(|at| Utc::now() - since(at)),
            sessions_started: link.sessions_started,
            outages: link.outages,
            tax_updates: link.tax_updates,
            new_logs: link.new_logs,
            uptime: link.connected_since.map(since).unwrap_or_default(),
        }
    }

    /// Starts a session. No-op while one is already active.
    ///
    /// After the configured latency the state becomes connected, a
    /// `status_change` fires and the simulation and heartbeat drivers start.
    pub fn connect(&self) {
        let mut link = lock(&self.shared.link);
        if link.active {
            debug!(state = %link.state, "connect ignored, session already active");
            return;
        }

        let epoch = link.begin_session();
        SESSION_COUNTER.increment(1);
        info!(
            endpoint = %self.shared.config.endpoint,
            session_id = link.session_id.as_deref().unwrap_or_default(),
            delay_ms = self.shared.config.connect_delay.as_millis() as u64,
            "Connecting to simulated stream"
        );

        let driver = run_session(
            Arc::downgrade(&self.shared),
            epoch,
            self.shared.config.clone(),
        );
        link.driver = Some(tokio::spawn(driver));
    }

    /// Ends the active session, cancelling every pending timer.
    ///
    /// Emits `status_change(disconnected)` once; calling it without an active
    /// session does nothing. No further events are delivered after it returns.
    pub fn disconnect(&self) {
        let driver = {
            let mut link = lock(&self.shared.link);
            if !link.active {
                debug!("disconnect ignored, no active session");
                return;
            }
            link.end_session()
        };

        if let Some(driver) = driver {
            driver.abort();
        }
        CONNECTED_GAUGE.set(0.0);
        info!("Disconnected from simulated stream");

        self.shared
            .emit(StreamEvent::StatusChange(ConnectionState::Disconnected));
    }
}

/// Guard returned by [`EventStreamService::subscribe`].
#[must_use = "dropping a Subscription unregisters its listener"]
pub struct Subscription {
    shared: Weak<Shared>,
    kind: EventKind,
    listener: Listener,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            lock(&shared.registry).unregister(self.kind, &self.listener);
            debug!(event = %self.kind, "subscription dropped");
        }
    }
}

impl Shared {
    fn emit(&self, event: StreamEvent) {
        let kind = event.kind();
        let listeners = lock(&self.registry).snapshot(kind);
        record_emitted(kind);
        trace!(event = %kind, listeners = listeners.len(), "dispatching event");
        registry::dispatch(&listeners, &event);
    }

    fn emit_for_session(&self, epoch: u64, event: StreamEvent) {
        if lock(&self.link).is_current(epoch) {
            self.emit(event);
        }
    }

    // Re-checked right before dispatch: an earlier listener in the same tick may have disconnected.
    fn emit_data(&self, epoch: u64, event: StreamEvent) {
        {
            let mut link = lock(&self.link);
            if !link.accepts_data(epoch) {
                return;
            }
            match &event {
                StreamEvent::TaxUpdate(_) => link.record_tax_update(),
                StreamEvent::NewLog(_) => link.record_new_log(),
                StreamEvent::StatusChange(_) => {}
            }
        }
        self.emit(event);
    }

    fn complete_connect(&self, epoch: u64) -> bool {
        {
            let mut link = lock(&self.link);
            if !link.is_current(epoch) {
                return false;
            }
            link.mark_connected();
            info!(
                session_id = link.session_id.as_deref().unwrap_or_default(),
                "Connected to simulated stream"
            );
        }
        CONNECTED_GAUGE.set(1.0);
        self.emit_for_session(epoch, StreamEvent::StatusChange(ConnectionState::Connected));
        true
    }

    fn simulation_tick(&self, epoch: u64) {
        if !lock(&self.link).accepts_data(epoch) {
            trace!("simulation tick skipped, link not connected");
            return;
        }

        let outcome = {
            let mut rng = lock(&self.rng);
            simulation::simulate_tick(&mut **rng, &self.config.thresholds, Local::now())
        };

        if let Some(update) = outcome.tax_update {
            debug!(delta = update.delta, "tax update");
            self.emit_data(epoch, StreamEvent::TaxUpdate(update));
        }
        if let Some(entry) = outcome.new_log {
            debug!(id = %entry.id, amount = entry.amount, status = %entry.status, "new audit entry");
            self.emit_data(epoch, StreamEvent::NewLog(entry));
        }
    }

    /// Returns the recovery deadline when this heartbeat starts an outage.
    fn heartbeat_tick(&self, epoch: u64) -> Option<Instant> {
        {
            let mut link = lock(&self.link);
            if !link.accepts_data(epoch) {
                return None;
            }
            let outage = simulation::roll_outage(&mut **lock(&self.rng), &self.config.thresholds);
            if !outage {
                trace!("heartbeat ok");
                return None;
            }
            link.mark_reconnecting();
        }

        OUTAGE_COUNTER.increment(1);
        CONNECTED_GAUGE.set(0.0);
        warn!(
            recovery_ms = self.config.recovery_delay.as_millis() as u64,
            "Simulated connection loss, reconnecting"
        );
        self.emit_for_session(
            epoch,
            StreamEvent::StatusChange(ConnectionState::Reconnecting),
        );
        Some(Instant::now() + self.config.recovery_delay)
    }

    fn recover(&self, epoch: u64) {
        {
            let mut link = lock(&self.link);
            if !link.is_current(epoch) || link.state != ConnectionState::Reconnecting {
                return;
            }
            link.mark_connected();
        }

        CONNECTED_GAUGE.set(1.0);
        info!("Simulated stream reconnected");
        self.emit_for_session(epoch, StreamEvent::StatusChange(ConnectionState::Connected));
    }

    fn is_current(&self, epoch: u64) -> bool {
        lock(&self.link).is_current(epoch)
    }
}

/// Session driver: startup latency, then simulation and heartbeat ticks until
/// the session ends or every service handle is gone.
async fn run_session(shared: Weak<Shared>, epoch: u64, config: StreamConfig) {
    sleep(config.connect_delay).await;

    match shared.upgrade() {
        Some(service) if service.complete_connect(epoch) => {}
        _ => return,
    }

    let start = Instant::now();
    let mut simulation = interval_at(
        start + config.simulation_interval,
        config.simulation_interval,
    );
    simulation.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut heartbeat = interval_at(start + config.heartbeat_interval, config.heartbeat_interval);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut recovery: Option<Instant> = None;

    loop {
        // biased: within one instant the data tick runs before the heartbeat
        tokio::select! {
            biased;
            _ = simulation.tick() => {
                let Some(service) = shared.upgrade() else { break };
                service.simulation_tick(epoch);
            }
            _ = heartbeat.tick() => {
                let Some(service) = shared.upgrade() else { break };
                if let Some(deadline) = service.heartbeat_tick(epoch) {
                    recovery = Some(deadline);
                }
            }
            _ = sleep_until(recovery.unwrap_or(start)), if recovery.is_some() => {
                recovery = None;
                let Some(service) = shared.upgrade() else { break };
                service.recover(epoch);
            }
        }

        let live = match shared.upgrade() {
            Some(service) => service.is_current(epoch),
            None => false,
        };
        if !live {
            break;
        }
    }

    debug!(epoch, "session driver stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::SimulationThresholds,
        random::ScriptedRandom,
        registry::listener,
        simulation::{TAX_DELTA_MIN, TAX_DELTA_SPAN},
        types::Status,
    };
    use std::time::Duration;

    type Seen = Arc<Mutex<Vec<(Instant, StreamEvent)>>>;

    /// Defaults with outages disabled.
    fn steady_config() -> StreamConfig {
        StreamConfig {
            thresholds: SimulationThresholds {
                outage: 1.0,
                ..SimulationThresholds::default()
            },
            ..StreamConfig::default()
        }
    }

    /// Every draw is 0.99: each tick emits both data events, each heartbeat is an outage.
    fn always_fire(config: StreamConfig) -> EventStreamService {
        EventStreamService::with_random(config, Box::new(ScriptedRandom::new([0.99])))
    }

    fn recorder() -> (Listener, Seen) {
        let seen: Seen = Arc::default();
        let sink = Arc::clone(&seen);
        let l = listener(move |event| sink.lock().unwrap().push((Instant::now(), event.clone())));
        (l, seen)
    }

    fn record_all(service: &EventStreamService) -> Seen {
        let (l, seen) = recorder();
        for kind in EventKind::ALL {
            service.on(kind, Arc::clone(&l));
        }
        seen
    }

    fn statuses(seen: &Seen) -> Vec<ConnectionState> {
        seen.lock()
            .unwrap()
            .iter()
            .filter_map(|(_, e)| match e {
                StreamEvent::StatusChange(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    fn count(seen: &Seen, kind: EventKind) -> usize {
        seen.lock()
            .unwrap()
            .iter()
            .filter(|(_, e)| e.kind() == kind)
            .count()
    }

    #[tokio::test(start_paused = true)]
    async fn connect_emits_connected_once_after_delay() {
        let service = always_fire(steady_config());
        let seen = record_all(&service);

        service.connect();
        assert!(service.is_active());

        sleep(Duration::from_millis(999)).await;
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(service.state(), ConnectionState::Disconnected);

        sleep(Duration::from_millis(2)).await;
        assert_eq!(statuses(&seen), vec![ConnectionState::Connected]);
        assert_eq!(service.state(), ConnectionState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn connect_is_idempotent_during_startup() {
        let service = always_fire(steady_config());
        let seen = record_all(&service);

        service.connect();
        sleep(Duration::from_millis(500)).await;
        service.connect();
        sleep(Duration::from_millis(1_000)).await;
        service.connect();

        // t = 3.5s: exactly one data tick at t = 3s
        sleep(Duration::from_secs(2)).await;
        assert_eq!(statuses(&seen), vec![ConnectionState::Connected]);
        assert_eq!(count(&seen, EventKind::TaxUpdate), 1);
        assert_eq!(count(&seen, EventKind::NewLog), 1);
        assert_eq!(service.health().sessions_started, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn late_listener_gets_no_replay() {
        let service = always_fire(steady_config());
        let early = record_all(&service);

        service.connect();
        sleep(Duration::from_millis(1_500)).await;

        let (late_listener, late) = recorder();
        service.on(EventKind::StatusChange, late_listener);
        sleep(Duration::from_millis(100)).await;

        assert_eq!(statuses(&early), vec![ConnectionState::Connected]);
        assert!(late.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_halts_emission() {
        let service = always_fire(steady_config());
        let seen = record_all(&service);

        service.connect();
        sleep(Duration::from_millis(5_500)).await;
        assert_eq!(count(&seen, EventKind::TaxUpdate), 2);

        service.disconnect();
        assert_eq!(service.state(), ConnectionState::Disconnected);
        let delivered = seen.lock().unwrap().len();
        assert_eq!(
            statuses(&seen).last(),
            Some(&ConnectionState::Disconnected)
        );

        sleep(Duration::from_secs(60)).await;
        assert_eq!(seen.lock().unwrap().len(), delivered);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_during_startup_cancels_connect() {
        let service = always_fire(steady_config());
        let seen = record_all(&service);

        service.connect();
        sleep(Duration::from_millis(400)).await;
        service.disconnect();

        sleep(Duration::from_secs(10)).await;
        assert_eq!(statuses(&seen), vec![ConnectionState::Disconnected]);
        assert_eq!(count(&seen, EventKind::TaxUpdate), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_without_session_is_silent() {
        let service = always_fire(steady_config());
        let seen = record_all(&service);

        service.disconnect();
        assert!(seen.lock().unwrap().is_empty());

        service.connect();
        sleep(Duration::from_millis(1_500)).await;
        service.disconnect();
        service.disconnect();

        assert_eq!(
            statuses(&seen),
            vec![ConnectionState::Connected, ConnectionState::Disconnected]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_after_disconnect_resumes() {
        let service = always_fire(steady_config());
        let seen = record_all(&service);

        service.connect();
        sleep(Duration::from_millis(1_500)).await;
        service.disconnect();

        service.connect();
        sleep(Duration::from_millis(3_500)).await;

        assert_eq!(
            statuses(&seen),
            vec![
                ConnectionState::Connected,
                ConnectionState::Disconnected,
                ConnectionState::Connected,
            ]
        );
        assert_eq!(count(&seen, EventKind::TaxUpdate), 1);
        assert_eq!(service.health().sessions_started, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_listener_does_not_stop_delivery() {
        let service = always_fire(steady_config());
        service.on(
            EventKind::TaxUpdate,
            listener(|_| panic!("dashboard exploded")),
        );
        let (l, seen) = recorder();
        service.on(EventKind::TaxUpdate, l);

        service.connect();
        sleep(Duration::from_millis(5_500)).await;

        assert_eq!(count(&seen, EventKind::TaxUpdate), 2);
        assert_eq!(service.state(), ConnectionState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn listener_may_disconnect_mid_tick() {
        let service = always_fire(steady_config());
        let seen = record_all(&service);
        let handle = service.clone();
        service.on(
            EventKind::TaxUpdate,
            listener(move |_| handle.disconnect()),
        );

        service.connect();
        sleep(Duration::from_secs(10)).await;

        let kinds: Vec<EventKind> = seen.lock().unwrap().iter().map(|(_, e)| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::StatusChange,
                EventKind::TaxUpdate,
                EventKind::StatusChange,
            ]
        );
        assert_eq!(
            statuses(&seen),
            vec![ConnectionState::Connected, ConnectionState::Disconnected]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn tax_deltas_stay_in_range() {
        let service = EventStreamService::new(StreamConfig {
            seed: Some(7),
            ..steady_config()
        });
        let (l, seen) = recorder();
        service.on(EventKind::TaxUpdate, l);

        service.connect();
        sleep(Duration::from_secs(200)).await;

        let deltas: Vec<i64> = seen
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, e)| match e {
                StreamEvent::TaxUpdate(update) => Some(update.delta),
                _ => None,
            })
            .collect();

        let max = TAX_DELTA_MIN + i64::from(TAX_DELTA_SPAN) - 1;
        assert!(!deltas.is_empty());
        assert!(deltas.iter().all(|d| (TAX_DELTA_MIN..=max).contains(d)));
    }

    #[tokio::test(start_paused = true)]
    async fn new_log_entries_are_well_formed() {
        let service = EventStreamService::new(StreamConfig {
            seed: Some(99),
            ..steady_config()
        });
        let (l, seen) = recorder();
        service.on(EventKind::NewLog, l);

        service.connect();
        sleep(Duration::from_secs(400)).await;

        let seen = seen.lock().unwrap();
        assert!(!seen.is_empty());
        for (_, event) in seen.iter() {
            let StreamEvent::NewLog(entry) = event else {
                panic!("unexpected event {event:?}");
            };
            assert!(!entry.id.is_empty());
            assert!(entry.amount > 0);
            assert!(matches!(
                entry.status,
                Status::Approved | Status::Rejected | Status::Pending
            ));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeat_outage_pauses_data_until_recovery() {
        // outages enabled: the heartbeat at t = 11s draws 0.99
        let service = always_fire(StreamConfig::default());
        let seen = record_all(&service);
        let origin = Instant::now();

        service.connect();
        sleep(Duration::from_secs(16)).await;

        assert_eq!(
            statuses(&seen),
            vec![
                ConnectionState::Connected,
                ConnectionState::Reconnecting,
                ConnectionState::Connected,
            ]
        );

        let seen = seen.lock().unwrap();
        let status_at: Vec<(usize, Instant)> = seen
            .iter()
            .enumerate()
            .filter(|(_, (_, e))| e.kind() == EventKind::StatusChange)
            .map(|(i, (at, _))| (i, *at))
            .collect();
        let (lost_idx, lost_at) = status_at[1];
        let (back_idx, back_at) = status_at[2];

        let slack = Duration::from_millis(5);
        assert!(lost_at - origin >= Duration::from_secs(11));
        assert!(lost_at - origin < Duration::from_secs(11) + slack);
        assert!(back_at - lost_at >= Duration::from_secs(3));
        assert!(back_at - lost_at < Duration::from_secs(3) + slack);
        assert_eq!(back_idx, lost_idx + 1, "no data events while reconnecting");
        // the tick at t = 15s flows again
        assert!(seen[back_idx + 1..]
            .iter()
            .any(|(_, e)| e.kind() == EventKind::TaxUpdate));
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_cancels_pending_recovery() {
        let service = always_fire(StreamConfig::default());
        let seen = record_all(&service);

        service.connect();
        sleep(Duration::from_millis(12_000)).await;
        assert_eq!(service.state(), ConnectionState::Reconnecting);

        service.disconnect();
        sleep(Duration::from_secs(10)).await;

        assert_eq!(
            statuses(&seen),
            vec![
                ConnectionState::Connected,
                ConnectionState::Reconnecting,
                ConnectionState::Disconnected,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn subscription_unregisters_on_drop() {
        let service = always_fire(steady_config());
        let (l, _seen) = recorder();

        let subscription = service.subscribe(EventKind::NewLog, l);
        assert_eq!(subscription.kind(), EventKind::NewLog);
        assert_eq!(service.listener_count(EventKind::NewLog), 1);

        drop(subscription);
        assert_eq!(service.listener_count(EventKind::NewLog), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn health_tracks_session_counters() {
        let service = always_fire(steady_config());

        service.connect();
        sleep(Duration::from_millis(5_500)).await;

        let health = service.health();
        assert!(health.is_healthy());
        assert!(health.session_id.is_some());
        assert_eq!(health.tax_updates, 2);
        assert_eq!(health.new_logs, 2);
        assert_eq!(health.outages, 0);
        assert!(health.last_event_time.is_some());
    }
}
