use alpha_vantage_client::MetricClient;
use analysis_core::{
    AnalysisError, MetricKind, Pacer, QuoteSource, SeriesProvenance, Ticker, ValuationResult,
};
use fundamental_analysis::{compute_fair_value, BatchMode, SectorAggregator, SectorAverages, TickerFailure};

use crate::config::ReportConfig;

/// Figures for the security being valued.
#[derive(Debug, Clone)]
pub struct TargetSnapshot {
    pub ticker: Ticker,
    pub price: Option<f64>,
    pub pe: f64,
    pub peg: f64,
    pub peg_provenance: SeriesProvenance,
    pub current_dividend: f64,
    pub dividend_provenance: SeriesProvenance,
}

/// Everything the report and chart consume.
#[derive(Debug)]
pub struct ComparisonOutcome {
    pub target: TargetSnapshot,
    pub sector: SectorAverages,
    pub index_pe: f64,
    pub index_peg: f64,
    pub valuation: ValuationResult,
    pub batch_mode: BatchMode,
    pub failures: Vec<TickerFailure>,
}

/// Runs the full comparison: sector PEG batch, sector P/E batch, target
/// metrics, then the dividend discount valuation.
pub async fn run_comparison<S, P>(
    config: &ReportConfig,
    metrics: &MetricClient<S>,
    aggregator: &SectorAggregator<P>,
) -> Result<ComparisonOutcome, AnalysisError>
where
    S: QuoteSource,
    P: Pacer,
{
    let index_peg = config.index.peg()?;

    // Reject bad valuation inputs before spending minutes on paced calls
    let early_valuation = match config.current_dividend {
        Some(dividend) => Some(compute_fair_value(&config.valuation_inputs(dividend))?),
        None => None,
    };

    let tickers = &config.comparison_tickers;
    tracing::info!(
        "Fetching PEG and P/E for {} comparison tickers ({} mode)",
        tickers.len(),
        config.batch_mode
    );

    let pe_accessor = metrics.accessor(MetricKind::PeRatio);
    let (sector, failures) = match &config.comparison_peg_override {
        // The manual list stands in for the provider field, so no PEG batch runs
        Some(values) => {
            let pe_report = aggregator.run(config.batch_mode, tickers, &pe_accessor).await?;
            let sector = SectorAverages::with_manual_peg(pe_report.series, tickers, values.clone())?;
            (sector, pe_report.failures)
        }
        None => {
            let peg_report = aggregator
                .run(config.batch_mode, tickers, &metrics.accessor(MetricKind::PegRatio))
                .await?;
            let pe_report = aggregator.run(config.batch_mode, tickers, &pe_accessor).await?;
            let mut failures = peg_report.failures;
            failures.extend(pe_report.failures);
            (SectorAverages::from_series(pe_report.series, peg_report.series)?, failures)
        }
    };

    let target = fetch_target(config, metrics, aggregator).await?;

    let valuation = match early_valuation {
        Some(valuation) => valuation,
        None => compute_fair_value(&config.valuation_inputs(target.current_dividend))?,
    };

    Ok(ComparisonOutcome {
        target,
        sector,
        index_pe: config.index.pe,
        index_peg,
        valuation,
        batch_mode: config.batch_mode,
        failures,
    })
}

async fn fetch_target<S, P>(
    config: &ReportConfig,
    metrics: &MetricClient<S>,
    aggregator: &SectorAggregator<P>,
) -> Result<TargetSnapshot, AnalysisError>
where
    S: QuoteSource,
    P: Pacer,
{
    let ticker = &config.target;
    let pacer = aggregator.pacer();

    let pe = paced_fetch(pacer, metrics, MetricKind::PeRatio, ticker).await?;

    let (peg, peg_provenance) = match config.target_peg_override {
        Some(peg) => {
            tracing::warn!("{}: using manual PEG {} instead of provider value", ticker, peg);
            (peg, SeriesProvenance::ManualOverride)
        }
        None => (
            paced_fetch(pacer, metrics, MetricKind::PegRatio, ticker).await?,
            SeriesProvenance::Fetched,
        ),
    };

    let (current_dividend, dividend_provenance) = match config.current_dividend {
        Some(dividend) => (dividend, SeriesProvenance::ManualOverride),
        None => (
            paced_fetch(pacer, metrics, MetricKind::DividendPerShare, ticker).await?,
            SeriesProvenance::Fetched,
        ),
    };

    // Price only feeds the upside figure, so collect mode tolerates its absence
    let price = match paced_fetch(pacer, metrics, MetricKind::Price, ticker).await {
        Ok(price) => Some(price),
        Err(e) if config.batch_mode == BatchMode::Collect => {
            tracing::warn!("{}: price unavailable, skipping upside: {}", ticker, e);
            None
        }
        Err(e) => return Err(e),
    };

    Ok(TargetSnapshot {
        ticker: ticker.clone(),
        price,
        pe,
        peg,
        peg_provenance,
        current_dividend,
        dividend_provenance,
    })
}

async fn paced_fetch<S, P>(
    pacer: &P,
    metrics: &MetricClient<S>,
    metric: MetricKind,
    ticker: &Ticker,
) -> Result<f64, AnalysisError>
where
    S: QuoteSource,
    P: Pacer,
{
    pacer.before_call().await;
    let value = metrics.fetch_metric(metric, ticker).await?;
    tracing::info!("{}: successful, {}: {}", ticker, metric, value);
    pacer.after_call().await;
    Ok(value)
}
