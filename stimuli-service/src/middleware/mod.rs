pub mod cors;
pub mod metrics;

pub use cors::cors_middleware;
pub use metrics::metrics_middleware;
