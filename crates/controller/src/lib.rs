//! Pod remediation controller
//!
//! Wires the remediation library to the cluster: configuration from the
//! environment and the health/metrics/attempts HTTP API.

pub mod api;
pub mod config;
