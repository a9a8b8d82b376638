#![doc = include_str!("../docs/rustdoc.md")]

/// Command-line argument definitions.
pub mod cli;
/// Runtime configuration model.
pub mod config;
/// Consumer-side fold of stream events and the feed that wires it up.
pub mod dashboard;
/// Error types used across the crate.
pub mod error;
/// Event catalog and the channel between stream and UI.
pub mod events;
/// Terminal output formatters.
pub mod formatter;
/// Session bookkeeping for the simulated link.
pub mod link_state;
/// Metrics and health status structures.
pub mod monitoring;
/// Injectable random sources.
pub mod random;
/// Listener registry and dispatch.
pub mod registry;
/// Sample KPI cards and audit entries.
pub mod seed;
/// The simulated event stream service.
pub mod service;
/// Tick logic behind the simulated feed.
pub mod simulation;
/// Tracing/logging initialization.
pub mod tracing_setup;
/// Domain data models.
pub mod types;
/// UI controller and presentation loop.
pub mod ui;

/// Primary crate error type.
pub use error::StreamError;
pub use events::{EventKind, StreamEvent};
pub use registry::{Listener, listener};
pub use service::{EventStreamService, Subscription};
