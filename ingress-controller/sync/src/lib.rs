#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Keeps generated routes converged with services and rules.

mod convergence;
mod events;
mod metrics;
pub mod queue;
mod reconcile;
mod registry;


pub use self::{
    convergence::Convergence,
    events::{Event, EventRouter, RouteEvent, ServiceEvent},
    metrics::{ConvergenceMetrics, QueueMetrics},
    queue::{Backoff, Handle},
    reconcile::{Reconciler, RuleEvent},
    registry::{RuleRegistry, SharedRegistry},
};
