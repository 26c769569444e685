//! Pod remediation library
//!
//! This crate provides the core functionality for:
//! - Pod health classification from phase and readiness conditions
//! - Restart attempt tracking and the escalation state machine
//! - Restart and scale-down actions against the Kubernetes API
//! - Escalation alerts over SMTP and Alertmanager
//! - Health checks and observability

pub mod alert;
pub mod classifier;
pub mod controller;
pub mod engine;
pub mod error;
pub mod executor;
pub mod health;
pub mod models;
pub mod observability;
pub mod source;
pub mod tracker;

pub use controller::{Controller, ControllerConfig, Remediator, RemediatorBuilder, RunOutcome};
pub use engine::{RemediationEngine, DEFAULT_MAX_RESTARTS};
pub use error::RemediationError;
pub use health::{ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse};
pub use models::*;
pub use observability::{ControllerMetrics, StructuredLogger};
pub use tracker::{AttemptStore, InMemoryAttemptStore};
