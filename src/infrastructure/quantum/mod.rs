// Quantum gateway adapter implementing the metrics port

pub mod http_gateway;

pub use http_gateway::HttpMetricsService;
