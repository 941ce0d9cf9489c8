use async_trait::async_trait;
use serde_json::Value;

use crate::{AnalysisError, MetricKind, MetricQuery, Ticker};

/// Source of raw provider values addressed by a field path
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch(&self, query: &MetricQuery) -> Result<Value, AnalysisError>;
}

/// Typed access to one metric for any ticker
#[async_trait]
pub trait MetricAccessor: Send + Sync {
    fn metric(&self) -> MetricKind;

    async fn fetch(&self, ticker: &Ticker) -> Result<f64, AnalysisError>;
}

/// Pacing policy applied around each outbound provider call.
///
/// Implementations decide whether to wait before a call (rate limiting)
/// or after it (fixed spacing). Both hooks default to no wait.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn before_call(&self) {}

    async fn after_call(&self) {}
}

#[async_trait]
impl<T: Pacer + ?Sized> Pacer for Box<T> {
    async fn before_call(&self) {
        (**self).before_call().await
    }

    async fn after_call(&self) {
        (**self).after_call().await
    }
}
