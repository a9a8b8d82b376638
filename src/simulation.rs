// file: src/simulation.rs
// description: pure tick logic behind the simulated feed, independent of timers

use crate::{
    config::SimulationThresholds,
    random::RandomSource,
    types::{AuditLogEntry, Status, TaxUpdate},
};
use chrono::{DateTime, Local};
use uuid::Uuid;

/// Tax deltas land in `[-50, 149]`, slightly biased upward.
pub const TAX_DELTA_MIN: i64 = -50;
pub const TAX_DELTA_SPAN: u32 = 200;

/// Synthesized amounts land in `[100, 5099]`.
pub const AMOUNT_MIN: i64 = 100;
pub const AMOUNT_SPAN: u32 = 5_000;

pub const TITLES: [&str; 5] = [
    "ISLR Withholding Payment",
    "Banesco Transfer",
    "Q2 Payroll Payment",
    "IVSS Contribution",
    "AWS Invoice",
];

pub const CATEGORIES: [&str; 5] = ["Taxes", "Payroll Levies", "Payroll", "Suppliers", "Banking"];

/// What a single simulation tick decided to emit.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    pub tax_update: Option<TaxUpdate>,
    pub new_log: Option<AuditLogEntry>,
}

impl TickOutcome {
    pub fn is_empty(&self) -> bool {
        self.tax_update.is_none() && self.new_log.is_none()
    }
}

/// Runs one data tick.
///
/// A single draw is compared against both thresholds, so a `new_log` tick is
/// always also a `tax_update` tick whenever `new_log >= tax_update`. Extra
/// draws for the payloads happen afterwards, tax delta first.
pub fn simulate_tick(
    rng: &mut dyn RandomSource,
    thresholds: &SimulationThresholds,
    now: DateTime<Local>,
) -> TickOutcome {
    let roll = rng.next_f64();

    let tax_update = (roll > thresholds.tax_update).then(|| TaxUpdate {
        delta: rng.next_in(TAX_DELTA_MIN, TAX_DELTA_SPAN),
    });
    let new_log =
        (roll > thresholds.new_log).then(|| synthesize_entry(rng, thresholds.approval, now));

    TickOutcome {
        tax_update,
        new_log,
    }
}

/// Heartbeat draw: true when a transient outage should be simulated.
pub fn roll_outage(rng: &mut dyn RandomSource, thresholds: &SimulationThresholds) -> bool {
    rng.next_f64() > thresholds.outage
}

/// Builds an audit entry from the fixed vocabularies.
///
/// The id comes from a v4 uuid rather than the random source so that ids stay
/// unique even under a scripted source.
pub fn synthesize_entry(
    rng: &mut dyn RandomSource,
    approval_threshold: f64,
    now: DateTime<Local>,
) -> AuditLogEntry {
    let title = TITLES[rng.next_index(TITLES.len())];
    let category = CATEGORIES[rng.next_index(CATEGORIES.len())];
    let amount = rng.next_in(AMOUNT_MIN, AMOUNT_SPAN).unsigned_abs();
    let status = if rng.next_f64() > approval_threshold {
        Status::Approved
    } else {
        Status::Pending
    };

    AuditLogEntry {
        id: format!("ws-log-{}", Uuid::new_v4().simple()),
        title: title.to_string(),
        category: category.to_string(),
        amount,
        date: AuditLogEntry::today_label(now),
        status,
    }
}
