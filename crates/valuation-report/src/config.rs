use analysis_core::{CostOfDebt, IndexBenchmark, Pacer, Ticker, ValuationInputs};
use anyhow::{anyhow, bail, Context, Result};
use fundamental_analysis::{BatchMode, FixedDelay, SlidingWindowLimiter};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// How provider calls are spaced out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PacingMode {
    /// Sleep a fixed delay after every call
    Fixed(Duration),
    /// At most N calls per rolling minute
    Window { per_minute: usize },
}

impl PacingMode {
    pub fn build(&self) -> Box<dyn Pacer> {
        match *self {
            PacingMode::Fixed(delay) => Box::new(FixedDelay::new(delay)),
            PacingMode::Window { per_minute } => Box::new(SlidingWindowLimiter::per_minute(per_minute)),
        }
    }
}

/// Everything a run needs, read once at startup.
#[derive(Clone)]
pub struct ReportConfig {
    pub api_key: String,
    pub base_url: String,
    pub http_timeout: Duration,

    pub target: Ticker,
    pub comparison_tickers: Vec<Ticker>,
    pub comparison_peg_override: Option<Vec<f64>>,
    pub target_peg_override: Option<f64>,

    pub index: IndexBenchmark,

    // Valuation inputs
    pub growth_rate: f64,
    pub current_dividend: Option<f64>,
    pub equity_value: f64,
    pub debt_value: f64,
    pub cost_of_equity: f64,
    pub cost_of_debt: CostOfDebt,
    pub tax_rate: f64,

    pub pacing: PacingMode,
    pub batch_mode: BatchMode,
    pub chart_output: Option<PathBuf>,
}

impl fmt::Debug for ReportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("target", &self.target)
            .field("comparison_tickers", &self.comparison_tickers)
            .field("pacing", &self.pacing)
            .field("batch_mode", &self.batch_mode)
            .finish_non_exhaustive()
    }
}

impl ReportConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| get(key).ok_or_else(|| anyhow!("{} not set", key));

        let api_key = required("ALPHA_VANTAGE_API_KEY")?;
        let base_url = get("ALPHA_VANTAGE_BASE_URL")
            .unwrap_or_else(|| alpha_vantage_client::DEFAULT_BASE_URL.to_string());
        let timeout_secs: u64 = parse_or(&get, "HTTP_TIMEOUT_SECS", 30)?;
        if timeout_secs == 0 {
            bail!("HTTP_TIMEOUT_SECS must be at least 1 second");
        }
        let http_timeout = Duration::from_secs(timeout_secs);

        let target = Ticker::new(required("TARGET_TICKER")?).context("TARGET_TICKER")?;
        let comparison_tickers = parse_list::<String>("COMPARISON_TICKERS", &required("COMPARISON_TICKERS")?)?
            .into_iter()
            .map(Ticker::new)
            .collect::<Result<Vec<_>, _>>()
            .context("COMPARISON_TICKERS")?;
        if comparison_tickers.is_empty() {
            bail!("COMPARISON_TICKERS must name at least one ticker");
        }

        let comparison_peg_override = get("COMPARISON_PEG_OVERRIDE")
            .map(|raw| parse_list::<f64>("COMPARISON_PEG_OVERRIDE", &raw))
            .transpose()?;
        if let Some(values) = &comparison_peg_override {
            if values.len() != comparison_tickers.len() {
                bail!(
                    "COMPARISON_PEG_OVERRIDE has {} values for {} comparison tickers",
                    values.len(),
                    comparison_tickers.len()
                );
            }
        }
        let target_peg_override = parse_opt(&get, "TARGET_PEG_OVERRIDE")?;

        let index = IndexBenchmark {
            pe: parse_or(&get, "INDEX_PE", 23.46)?,
            eps_growth: parse_or(&get, "INDEX_EPS_GROWTH", 8.69)?,
        };

        let cost_of_debt = match (
            parse_opt::<f64, _>(&get, "COST_OF_DEBT")?,
            parse_opt::<f64, _>(&get, "INTEREST_EXPENSE")?,
        ) {
            (Some(rate), None) => CostOfDebt::Direct(rate),
            (None, Some(expense)) => CostOfDebt::FromInterestExpense(expense),
            (Some(_), Some(_)) => bail!("set only one of COST_OF_DEBT or INTEREST_EXPENSE"),
            (None, None) => bail!("one of COST_OF_DEBT or INTEREST_EXPENSE must be set"),
        };

        let pacing = match get("PACING_MODE").as_deref().map(str::trim) {
            None | Some("fixed") => {
                let secs: f64 = parse_or(&get, "PACING_DELAY_SECS", 8.0)?;
                if !secs.is_finite() || secs < 0.0 {
                    bail!("PACING_DELAY_SECS must be a non-negative number, got {}", secs);
                }
                PacingMode::Fixed(Duration::from_secs_f64(secs))
            }
            Some("window") => PacingMode::Window {
                per_minute: parse_or(&get, "RATE_LIMIT_PER_MINUTE", 5)?,
            },
            Some(other) => bail!("PACING_MODE must be 'fixed' or 'window', got '{}'", other),
        };

        let batch_mode = match get("BATCH_MODE") {
            Some(raw) => raw.parse::<BatchMode>()?,
            None => BatchMode::FailFast,
        };

        Ok(Self {
            api_key,
            base_url,
            http_timeout,
            target,
            comparison_tickers,
            comparison_peg_override,
            target_peg_override,
            index,
            growth_rate: parse_required(&get, "DIVIDEND_GROWTH_RATE")?,
            current_dividend: parse_opt(&get, "CURRENT_DIVIDEND")?,
            equity_value: parse_required(&get, "EQUITY_VALUE")?,
            debt_value: parse_required(&get, "DEBT_VALUE")?,
            cost_of_equity: parse_required(&get, "COST_OF_EQUITY")?,
            cost_of_debt,
            tax_rate: parse_or(&get, "TAX_RATE", 0.21)?,
            pacing,
            batch_mode,
            chart_output: get("CHART_OUTPUT_PATH").map(PathBuf::from),
        })
    }

    pub fn valuation_inputs(&self, current_dividend: f64) -> ValuationInputs {
        ValuationInputs {
            equity_value: self.equity_value,
            debt_value: self.debt_value,
            cost_of_equity: self.cost_of_equity,
            cost_of_debt: self.cost_of_debt,
            tax_rate: self.tax_rate,
            growth_rate: self.growth_rate,
            current_dividend,
        }
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| anyhow!("{} has invalid value '{}': {}", key, raw, e))
}

fn parse_opt<T, G>(get: &G, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    get(key).map(|raw| parse_value(key, &raw)).transpose()
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    Ok(parse_opt(get, key)?.unwrap_or(default))
}

fn parse_required<T, G>(get: &G, key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    parse_opt(get, key)?.ok_or_else(|| anyhow!("{} not set", key))
}

fn parse_list<T>(key: &str, raw: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_value(key, s))
        .collect()
}
