//! HTTP handlers for the stimuli service.

pub mod app;
pub mod generation;
pub mod health;
pub mod metrics;
