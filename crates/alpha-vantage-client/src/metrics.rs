use analysis_core::{AnalysisError, MetricAccessor, MetricKind, MetricQuery, QuoteSource, Ticker};
use async_trait::async_trait;
use serde_json::Value;

/// Typed metric accessors layered over a [`QuoteSource`].
///
/// Each accessor issues exactly one query whose endpoint mode and key path
/// are fixed by the metric, then coerces the value to `f64`.
#[derive(Debug, Clone)]
pub struct MetricClient<S> {
    source: S,
}

impl<S: QuoteSource> MetricClient<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn fetch_metric(&self, metric: MetricKind, ticker: &Ticker) -> Result<f64, AnalysisError> {
        let query = metric.query(ticker);
        let raw = self.source.fetch(&query).await?;
        coerce_number(&raw, &query)
    }

    /// Latest traded price
    pub async fn price(&self, ticker: &Ticker) -> Result<f64, AnalysisError> {
        self.fetch_metric(MetricKind::Price, ticker).await
    }

    pub async fn pe_ratio(&self, ticker: &Ticker) -> Result<f64, AnalysisError> {
        self.fetch_metric(MetricKind::PeRatio, ticker).await
    }

    pub async fn peg_ratio(&self, ticker: &Ticker) -> Result<f64, AnalysisError> {
        self.fetch_metric(MetricKind::PegRatio, ticker).await
    }

    pub async fn dividend_per_share(&self, ticker: &Ticker) -> Result<f64, AnalysisError> {
        self.fetch_metric(MetricKind::DividendPerShare, ticker).await
    }

    /// Accessor for one metric, usable wherever a [`MetricAccessor`] is expected.
    pub fn accessor(&self, metric: MetricKind) -> BoundMetric<'_, S> {
        BoundMetric { client: self, metric }
    }
}

/// A [`MetricClient`] fixed to a single metric.
pub struct BoundMetric<'a, S> {
    client: &'a MetricClient<S>,
    metric: MetricKind,
}

#[async_trait]
impl<'a, S: QuoteSource> MetricAccessor for BoundMetric<'a, S> {
    fn metric(&self) -> MetricKind {
        self.metric
    }

    async fn fetch(&self, ticker: &Ticker) -> Result<f64, AnalysisError> {
        self.client.fetch_metric(self.metric, ticker).await
    }
}

/// Converts a provider value to a finite `f64`.
///
/// The provider sends numbers as strings and uses sentinels such as `"None"`
/// or `"-"` for metrics that do not apply; those are coercion failures.
pub fn coerce_number(value: &Value, query: &MetricQuery) -> Result<f64, AnalysisError> {
    let parsed = match value {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(AnalysisError::CoercionFailure {
            ticker: query.ticker.to_string(),
            path: query.path(),
            raw: value.to_string(),
        }),
    }
}
