use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::AnalysisError;

/// Provider symbol for a tradable security, passed verbatim into requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    pub fn new(symbol: impl Into<String>) -> Result<Self, AnalysisError> {
        let symbol = symbol.into();
        if symbol.trim().is_empty() {
            return Err(AnalysisError::EmptyInput("ticker symbol is empty".to_string()));
        }
        Ok(Self(symbol))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Ticker {
    type Error = AnalysisError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Ticker::new(value)
    }
}

impl From<Ticker> for String {
    fn from(ticker: Ticker) -> Self {
        ticker.0
    }
}

/// Endpoint mode of the data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderFunction {
    /// Latest trade snapshot, nested under "Global Quote"
    GlobalQuote,
    /// Flat company fundamentals document
    Overview,
}

impl ProviderFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderFunction::GlobalQuote => "GLOBAL_QUOTE",
            ProviderFunction::Overview => "OVERVIEW",
        }
    }
}

/// One fact to retrieve: ticker, endpoint mode and field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricQuery {
    pub ticker: Ticker,
    pub function: ProviderFunction,
    pub primary_key: String,
    pub secondary_key: Option<String>,
}

impl MetricQuery {
    pub fn new(ticker: Ticker, function: ProviderFunction, primary_key: impl Into<String>) -> Self {
        Self {
            ticker,
            function,
            primary_key: primary_key.into(),
            secondary_key: None,
        }
    }

    pub fn with_secondary_key(mut self, key: impl Into<String>) -> Self {
        self.secondary_key = Some(key.into());
        self
    }

    /// Human-readable field path, e.g. `Global Quote/05. price`.
    pub fn path(&self) -> String {
        match &self.secondary_key {
            Some(secondary) => format!("{}/{}", self.primary_key, secondary),
            None => self.primary_key.clone(),
        }
    }
}

/// The four fundamental metrics the toolkit knows how to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    Price,
    PeRatio,
    PegRatio,
    DividendPerShare,
}

impl MetricKind {
    /// Builds the provider query for this metric. Function and key path
    /// depend only on the metric, never on the ticker.
    pub fn query(&self, ticker: &Ticker) -> MetricQuery {
        let ticker = ticker.clone();
        match self {
            MetricKind::Price => MetricQuery::new(ticker, ProviderFunction::GlobalQuote, "Global Quote")
                .with_secondary_key("05. price"),
            MetricKind::PeRatio => MetricQuery::new(ticker, ProviderFunction::Overview, "PERatio"),
            MetricKind::PegRatio => MetricQuery::new(ticker, ProviderFunction::Overview, "PEGRatio"),
            MetricKind::DividendPerShare => {
                MetricQuery::new(ticker, ProviderFunction::Overview, "DividendPerShare")
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::Price => "Price",
            MetricKind::PeRatio => "PE",
            MetricKind::PegRatio => "PEG",
            MetricKind::DividendPerShare => "Dividend",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Where the values of a series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeriesProvenance {
    Fetched,
    ManualOverride,
}

/// Ordered metric values, index-aligned with the tickers they were fetched for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    pub metric: MetricKind,
    pub provenance: SeriesProvenance,
    tickers: Vec<Ticker>,
    values: Vec<f64>,
}

impl MetricSeries {
    pub fn new(metric: MetricKind) -> Self {
        Self {
            metric,
            provenance: SeriesProvenance::Fetched,
            tickers: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Builds a manually supplied series. Lengths must match.
    pub fn manual(metric: MetricKind, tickers: &[Ticker], values: Vec<f64>) -> Result<Self, AnalysisError> {
        if tickers.len() != values.len() {
            return Err(AnalysisError::InvalidModelState(format!(
                "manual {} series has {} values for {} tickers",
                metric,
                values.len(),
                tickers.len()
            )));
        }
        Ok(Self {
            metric,
            provenance: SeriesProvenance::ManualOverride,
            tickers: tickers.to_vec(),
            values,
        })
    }

    pub fn push(&mut self, ticker: Ticker, value: f64) {
        self.tickers.push(ticker);
        self.values.push(value);
    }

    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, ticker: &Ticker) -> Option<f64> {
        self.tickers
            .iter()
            .position(|t| t == ticker)
            .map(|i| self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Ticker, f64)> {
        self.tickers.iter().zip(self.values.iter().copied())
    }

    pub fn mean(&self) -> Result<f64, AnalysisError> {
        mean(&self.values)
    }
}

/// Arithmetic mean; an empty slice has no mean.
pub fn mean(values: &[f64]) -> Result<f64, AnalysisError> {
    if values.is_empty() {
        return Err(AnalysisError::EmptyInput(
            "cannot average an empty series".to_string(),
        ));
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Market index reference figures
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexBenchmark {
    pub pe: f64,
    /// Expected EPS growth in percent (8.69 means 8.69%)
    pub eps_growth: f64,
}

impl IndexBenchmark {
    pub fn peg(&self) -> Result<f64, AnalysisError> {
        if self.eps_growth == 0.0 || !self.eps_growth.is_finite() {
            return Err(AnalysisError::InvalidModelState(format!(
                "index EPS growth must be a non-zero number, got {}",
                self.eps_growth
            )));
        }
        Ok(self.pe / self.eps_growth)
    }
}

/// How the caller supplies the cost of debt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CostOfDebt {
    /// Rate given directly (0.05 = 5%)
    Direct(f64),
    /// Annual interest expense, divided by debt value to get the rate
    FromInterestExpense(f64),
}

/// Caller-supplied inputs to the dividend discount valuation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuationInputs {
    /// Market value of equity
    pub equity_value: f64,
    /// Market value of debt
    pub debt_value: f64,
    pub cost_of_equity: f64,
    pub cost_of_debt: CostOfDebt,
    pub tax_rate: f64,
    /// Expected perpetual dividend growth rate (0.04 = 4%)
    pub growth_rate: f64,
    /// Current annual dividend per share
    pub current_dividend: f64,
}

/// Output of a valuation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    pub cost_of_debt: f64,
    pub equity_weight: f64,
    pub debt_weight: f64,
    /// Weighted average cost of capital, used as the discount rate
    pub discount_rate: f64,
    pub projected_dividend: f64,
    pub fair_value: f64,
    pub computed_at: DateTime<Utc>,
}

impl ValuationResult {
    /// Fair value relative to a market price (0.1 = 10% upside).
    pub fn implied_upside(&self, price: f64) -> Option<f64> {
        if price > 0.0 {
            Some(self.fair_value / price - 1.0)
        } else {
            None
        }
    }
}
