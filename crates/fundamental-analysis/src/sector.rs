use analysis_core::{AnalysisError, MetricKind, MetricSeries, SeriesProvenance, Ticker};
use serde::{Deserialize, Serialize};

/// Sector-average P/E and PEG over the comparison tickers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorAverages {
    pe: MetricSeries,
    peg: MetricSeries,
    mean_pe: f64,
    mean_peg: f64,
}

impl SectorAverages {
    pub fn from_series(pe: MetricSeries, peg: MetricSeries) -> Result<Self, AnalysisError> {
        check_metric(&pe, MetricKind::PeRatio)?;
        check_metric(&peg, MetricKind::PegRatio)?;
        let mean_pe = pe.mean()?;
        let mean_peg = peg.mean()?;
        Ok(Self {
            pe,
            peg,
            mean_pe,
            mean_peg,
        })
    }

    pub fn mean_pe(&self) -> f64 {
        self.mean_pe
    }

    pub fn mean_peg(&self) -> f64 {
        self.mean_peg
    }

    pub fn pe_series(&self) -> &MetricSeries {
        &self.pe
    }

    pub fn peg_series(&self) -> &MetricSeries {
        &self.peg
    }

    /// Build averages from a fetched P/E series and a manually supplied PEG
    /// list, for when the provider's PEG field cannot be fetched at all.
    ///
    /// `values` must be index-aligned with `tickers`.
    pub fn with_manual_peg(pe: MetricSeries, tickers: &[Ticker], values: Vec<f64>) -> Result<Self, AnalysisError> {
        check_metric(&pe, MetricKind::PeRatio)?;
        let mean_pe = pe.mean()?;
        let (peg, mean_peg) = manual_peg(tickers, values)?;
        tracing::warn!(
            "Using manual PEG values ({} values, mean {:.3}) in place of provider data",
            peg.len(),
            mean_peg
        );
        Ok(Self {
            pe,
            peg,
            mean_pe,
            mean_peg,
        })
    }

    /// Replace the fetched PEG series with manually supplied values.
    ///
    /// `values` must be index-aligned with `tickers`. The replacement is
    /// marked [`SeriesProvenance::ManualOverride`] and the mean recomputed.
    pub fn override_peg(&mut self, tickers: &[Ticker], values: Vec<f64>) -> Result<(), AnalysisError> {
        let (replacement, new_mean) = manual_peg(tickers, values)?;
        tracing::warn!(
            "Overriding fetched PEG series ({} values, mean {:.3}) with manual values ({} values, mean {:.3})",
            self.peg.len(),
            self.mean_peg,
            replacement.len(),
            new_mean
        );
        self.peg = replacement;
        self.mean_peg = new_mean;
        Ok(())
    }

    pub fn peg_provenance(&self) -> SeriesProvenance {
        self.peg.provenance
    }

    /// (ticker, P/E, PEG) for every ticker present in both series, in P/E order.
    pub fn paired_points(&self) -> Vec<(Ticker, f64, f64)> {
        self.pe
            .iter()
            .filter_map(|(ticker, pe)| self.peg.get(ticker).map(|peg| (ticker.clone(), pe, peg)))
            .collect()
    }
}

fn manual_peg(tickers: &[Ticker], values: Vec<f64>) -> Result<(MetricSeries, f64), AnalysisError> {
    let series = MetricSeries::manual(MetricKind::PegRatio, tickers, values)?;
    let mean = series.mean()?;
    Ok((series, mean))
}

fn check_metric(series: &MetricSeries, expected: MetricKind) -> Result<(), AnalysisError> {
    if series.metric != expected {
        return Err(AnalysisError::InvalidModelState(format!(
            "expected a {} series, got {}",
            expected, series.metric
        )));
    }
    Ok(())
}
