//! valuation-report: compare a target stock's P/E and PEG against a peer group
//! and an index, and price it with a dividend discount model.
//!
//! Usage:
//!   cargo run -p valuation-report            # settings from the environment / .env
//!
//! Required settings: ALPHA_VANTAGE_API_KEY, TARGET_TICKER, COMPARISON_TICKERS,
//! DIVIDEND_GROWTH_RATE, EQUITY_VALUE, DEBT_VALUE, COST_OF_EQUITY and one of
//! COST_OF_DEBT / INTEREST_EXPENSE.

use alpha_vantage_client::{AlphaVantageClient, MetricClient};
use anyhow::{Context, Result};
use fundamental_analysis::SectorAggregator;

mod chart;
mod config;
mod pipeline;
mod report;

use chart::ComparisonChart;
use config::ReportConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    let config = ReportConfig::from_env().context("Invalid configuration")?;
    tracing::info!("Configuration loaded");
    tracing::info!("  Target: {}", config.target);
    tracing::info!("  Comparison tickers: {}", config.comparison_tickers.len());
    tracing::info!("  Pacing: {:?}", config.pacing);
    tracing::info!("  Batch mode: {}", config.batch_mode);

    let client = AlphaVantageClient::with_options(
        config.api_key.clone(),
        config.base_url.clone(),
        config.http_timeout,
    )?;
    let metrics = MetricClient::new(client);
    let aggregator = SectorAggregator::new(config.pacing.build());

    let outcome = pipeline::run_comparison(&config, &metrics, &aggregator)
        .await
        .context("Comparison run failed")?;

    println!("{}", report::render_report(&outcome));

    if let Some(path) = &config.chart_output {
        let chart = ComparisonChart::from_outcome(&outcome);
        for point in chart.clipped_points() {
            tracing::warn!(
                "{} (PE {:.2}, PEG {:.2}) falls outside the chart range",
                point.label,
                point.pe,
                point.peg
            );
        }
        chart.write_json(path)?;
        tracing::info!("Chart dataset written to {}", path.display());
    }

    Ok(())
}
