use analysis_core::{AnalysisError, MetricAccessor, MetricKind, MetricSeries, Pacer, Ticker};
use std::fmt;
use std::str::FromStr;

/// What to do when one ticker in a batch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
    /// Abort the batch on the first failure
    #[default]
    FailFast,
    /// Keep going and report failures alongside the successful values
    Collect,
}

impl FromStr for BatchMode {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail-fast" | "fail_fast" | "failfast" => Ok(BatchMode::FailFast),
            "collect" => Ok(BatchMode::Collect),
            other => Err(AnalysisError::Config(format!(
                "unknown batch mode '{}', expected 'fail-fast' or 'collect'",
                other
            ))),
        }
    }
}

impl fmt::Display for BatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchMode::FailFast => f.write_str("fail-fast"),
            BatchMode::Collect => f.write_str("collect"),
        }
    }
}

#[derive(Debug)]
pub struct TickerFailure {
    pub ticker: Ticker,
    pub error: AnalysisError,
}

/// Result of one batch: the values that were fetched plus any per-ticker failures.
#[derive(Debug)]
pub struct BatchReport {
    pub series: MetricSeries,
    pub failures: Vec<TickerFailure>,
}

impl BatchReport {
    pub fn metric(&self) -> MetricKind {
        self.series.metric
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Mean over successfully fetched values only.
    pub fn mean(&self) -> Result<f64, AnalysisError> {
        self.series.mean()
    }
}

/// Sequential batch fetcher for a list of comparison tickers.
///
/// Calls are issued one at a time in list order. The pacer is consulted
/// before and after every call so throttling policy stays independent of
/// the aggregation logic.
pub struct SectorAggregator<P> {
    pacer: P,
}

impl<P: Pacer> SectorAggregator<P> {
    pub fn new(pacer: P) -> Self {
        Self { pacer }
    }

    pub fn pacer(&self) -> &P {
        &self.pacer
    }

    /// Fetch one metric for every ticker and return the series with its mean.
    ///
    /// The first failure aborts the batch; no partial series is returned.
    pub async fn aggregate<A>(
        &self,
        tickers: &[Ticker],
        accessor: &A,
    ) -> Result<(MetricSeries, f64), AnalysisError>
    where
        A: MetricAccessor + ?Sized,
    {
        ensure_tickers(tickers)?;
        let metric = accessor.metric();
        let mut series = MetricSeries::new(metric);

        for ticker in tickers {
            self.pacer.before_call().await;
            let value = accessor.fetch(ticker).await?;
            tracing::info!("{}: successful, {}: {}", ticker, metric, value);
            series.push(ticker.clone(), value);
            self.pacer.after_call().await;
        }

        let mean = series.mean()?;
        Ok((series, mean))
    }

    /// Fetch one metric for every ticker, recording failures instead of aborting.
    pub async fn aggregate_collecting<A>(
        &self,
        tickers: &[Ticker],
        accessor: &A,
    ) -> Result<BatchReport, AnalysisError>
    where
        A: MetricAccessor + ?Sized,
    {
        ensure_tickers(tickers)?;
        let metric = accessor.metric();
        let mut series = MetricSeries::new(metric);
        let mut failures = Vec::new();

        for ticker in tickers {
            self.pacer.before_call().await;
            match accessor.fetch(ticker).await {
                Ok(value) => {
                    tracing::info!("{}: successful, {}: {}", ticker, metric, value);
                    series.push(ticker.clone(), value);
                }
                Err(error) => {
                    tracing::warn!("{}: failed to fetch {}: {}", ticker, metric, error);
                    failures.push(TickerFailure {
                        ticker: ticker.clone(),
                        error,
                    });
                }
            }
            self.pacer.after_call().await;
        }

        Ok(BatchReport { series, failures })
    }

    pub async fn run<A>(
        &self,
        mode: BatchMode,
        tickers: &[Ticker],
        accessor: &A,
    ) -> Result<BatchReport, AnalysisError>
    where
        A: MetricAccessor + ?Sized,
    {
        match mode {
            BatchMode::FailFast => {
                let (series, _) = self.aggregate(tickers, accessor).await?;
                Ok(BatchReport {
                    series,
                    failures: Vec::new(),
                })
            }
            BatchMode::Collect => self.aggregate_collecting(tickers, accessor).await,
        }
    }
}

fn ensure_tickers(tickers: &[Ticker]) -> Result<(), AnalysisError> {
    if tickers.is_empty() {
        return Err(AnalysisError::EmptyInput(
            "comparison ticker list is empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacing::{FixedDelay, NoPacing};
    use approx::assert_relative_eq;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    /// Returns canned values; tickers without one fail with a coercion error.
    struct StubAccessor {
        metric: MetricKind,
        values: HashMap<String, f64>,
        calls: Mutex<Vec<String>>,
    }

    impl StubAccessor {
        fn new(metric: MetricKind, values: &[(&str, f64)]) -> Self {
            Self {
                metric,
                values: values.iter().map(|(t, v)| (t.to_string(), *v)).collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MetricAccessor for StubAccessor {
        fn metric(&self) -> MetricKind {
            self.metric
        }

        async fn fetch(&self, ticker: &Ticker) -> Result<f64, AnalysisError> {
            self.calls.lock().unwrap().push(ticker.to_string());
            self.values
                .get(ticker.as_str())
                .copied()
                .ok_or_else(|| AnalysisError::CoercionFailure {
                    ticker: ticker.to_string(),
                    path: "PEGRatio".to_string(),
                    raw: "\"None\"".to_string(),
                })
        }
    }

    fn tickers(symbols: &[&str]) -> Vec<Ticker> {
        symbols.iter().map(|s| Ticker::new(*s).unwrap()).collect()
    }

    #[tokio::test]
    async fn test_aggregate_preserves_order_and_averages() {
        let accessor = StubAccessor::new(
            MetricKind::PegRatio,
            &[("SPGI", 2.47), ("JPM", 1.92), ("V", 1.82)],
        );
        let aggregator = SectorAggregator::new(NoPacing);

        let (series, mean) = aggregator
            .aggregate(&tickers(&["V", "SPGI", "JPM"]), &accessor)
            .await
            .unwrap();

        assert_eq!(series.values(), &[1.82, 2.47, 1.92]);
        assert_eq!(series.tickers(), tickers(&["V", "SPGI", "JPM"]).as_slice());
        assert_eq!(series.metric, MetricKind::PegRatio);
        assert_relative_eq!(mean, (1.82 + 2.47 + 1.92) / 3.0, epsilon = 1e-12);
        assert_eq!(accessor.calls(), vec!["V", "SPGI", "JPM"]);
    }

    #[tokio::test]
    async fn test_fail_fast_stops_at_first_failure() {
        let accessor = StubAccessor::new(MetricKind::PegRatio, &[("MA", 1.86), ("WFC", 0.87)]);
        let aggregator = SectorAggregator::new(NoPacing);

        let err = aggregator
            .aggregate(&tickers(&["MA", "BAC", "WFC"]), &accessor)
            .await
            .unwrap_err();

        assert_eq!(err.ticker(), Some("BAC"));
        assert!(matches!(err, AnalysisError::CoercionFailure { .. }));
        assert_eq!(accessor.calls(), vec!["MA", "BAC"]);
    }

    #[tokio::test]
    async fn test_empty_ticker_list() {
        let accessor = StubAccessor::new(MetricKind::PeRatio, &[]);
        let aggregator = SectorAggregator::new(NoPacing);

        let err = aggregator.aggregate(&[], &accessor).await.unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyInput(_)));
        assert!(accessor.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_accumulates_per_ticker() {
        let accessor = StubAccessor::new(
            MetricKind::PeRatio,
            &[("MS", 15.9), ("GS", 14.8), ("BLK", 20.1)],
        );
        let aggregator = SectorAggregator::new(FixedDelay::new(Duration::from_secs(8)));

        let start = Instant::now();
        aggregator
            .aggregate(&tickers(&["MS", "GS", "BLK"]), &accessor)
            .await
            .unwrap();

        assert!(start.elapsed() >= Duration::from_secs(24));
    }

    #[tokio::test]
    async fn test_collect_mode_reports_failures() {
        let accessor = StubAccessor::new(MetricKind::PegRatio, &[("MA", 1.86), ("WFC", 0.87)]);
        let aggregator = SectorAggregator::new(NoPacing);

        let report = aggregator
            .run(BatchMode::Collect, &tickers(&["MA", "BAC", "WFC"]), &accessor)
            .await
            .unwrap();

        assert!(!report.is_complete());
        assert_eq!(report.metric(), MetricKind::PegRatio);
        assert_eq!(report.series.tickers(), tickers(&["MA", "WFC"]).as_slice());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].ticker.as_str(), "BAC");
        assert_relative_eq!(report.mean().unwrap(), (1.86 + 0.87) / 2.0, epsilon = 1e-12);
        assert_eq!(accessor.calls(), vec!["MA", "BAC", "WFC"]);
    }

    #[tokio::test]
    async fn test_collect_mode_all_failed_has_no_mean() {
        let accessor = StubAccessor::new(MetricKind::PegRatio, &[]);
        let aggregator = SectorAggregator::new(NoPacing);

        let report = aggregator
            .aggregate_collecting(&tickers(&["GS", "MS"]), &accessor)
            .await
            .unwrap();

        assert_eq!(report.failures.len(), 2);
        assert!(matches!(report.mean(), Err(AnalysisError::EmptyInput(_))));
    }

    #[tokio::test]
    async fn test_run_fail_fast_is_complete() {
        let accessor = StubAccessor::new(MetricKind::PeRatio, &[("AXP", 19.4)]);
        let aggregator = SectorAggregator::new(NoPacing);

        let report = aggregator
            .run(BatchMode::FailFast, &tickers(&["AXP"]), &accessor)
            .await
            .unwrap();
        assert!(report.is_complete());
        assert_relative_eq!(report.mean().unwrap(), 19.4);
    }

    #[test]
    fn test_batch_mode_parsing() {
        assert_eq!("collect".parse::<BatchMode>().unwrap(), BatchMode::Collect);
        assert_eq!("Fail-Fast".parse::<BatchMode>().unwrap(), BatchMode::FailFast);
        assert!(matches!("skip".parse::<BatchMode>(), Err(AnalysisError::Config(_))));
        assert_eq!(BatchMode::default(), BatchMode::FailFast);
    }
}
