pub mod client;
pub mod document;
pub mod metrics;

pub use client::{AlphaVantageClient, DEFAULT_BASE_URL};
pub use document::QuoteDocument;
pub use metrics::{coerce_number, BoundMetric, MetricClient};
