use analysis_core::SeriesProvenance;

use crate::pipeline::ComparisonOutcome;

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn provenance_note(provenance: SeriesProvenance) -> &'static str {
    match provenance {
        SeriesProvenance::Fetched => "",
        SeriesProvenance::ManualOverride => " (manual)",
    }
}

fn format_list(values: &[f64]) -> String {
    let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", items.join(", "))
}

/// Plain-text summary of a comparison run.
pub fn render_report(outcome: &ComparisonOutcome) -> String {
    let sector = &outcome.sector;
    let target = &outcome.target;
    let valuation = &outcome.valuation;

    let mut lines = vec![
        format!("Comparative ticker PE Ratios: {}", format_list(sector.pe_series().values())),
        format!(
            "Comparative ticker PEG Ratios{}: {}",
            provenance_note(sector.peg_provenance()),
            format_list(sector.peg_series().values())
        ),
        String::new(),
        format!("Comparative Sector PE: {}", round_to(sector.mean_pe(), 3)),
        format!("Index Average PE: {}", round_to(outcome.index_pe, 3)),
        format!("Comparative Sector PEG: {}", round_to(sector.mean_peg(), 3)),
        format!("Index Average PEG: {}", round_to(outcome.index_peg, 3)),
        String::new(),
        format!("{:<8} {:>10} {:>10}", "Ticker", "PE", "PEG"),
    ];

    for (ticker, pe, peg) in sector.paired_points() {
        lines.push(format!("{:<8} {:>10.2} {:>10.2}", ticker, pe, peg));
    }

    lines.extend([
        format!(
            "{:<8} {:>10.2} {:>10.2}{}",
            target.ticker,
            target.pe,
            target.peg,
            provenance_note(target.peg_provenance)
        ),
        String::new(),
        format!("Comparative Sector PE: {}", round_to(sector.mean_pe(), 2)),
        format!("{} PE: {}", target.ticker, target.pe),
        format!("Comparative Sector PEG: {}", round_to(sector.mean_peg(), 2)),
        format!("{} PEG: {}{}", target.ticker, target.peg, provenance_note(target.peg_provenance)),
        String::new(),
        format!(
            "Cost of debt: {:.2}% | Equity weight: {:.1}% | Debt weight: {:.1}%",
            valuation.cost_of_debt * 100.0,
            valuation.equity_weight * 100.0,
            valuation.debt_weight * 100.0
        ),
        format!("Discount rate (WACC): {:.2}%", valuation.discount_rate * 100.0),
        format!(
            "Current dividend{}: {} -> projected: {}",
            provenance_note(target.dividend_provenance),
            target.current_dividend,
            round_to(valuation.projected_dividend, 4)
        ),
        format!(
            "The DDM model prices {} stock at: {}",
            target.ticker,
            round_to(valuation.fair_value, 2)
        ),
    ]);

    if let Some(price) = target.price {
        lines.push(match valuation.implied_upside(price) {
            Some(upside) => format!(
                "Current price: {} (implied upside {:+.1}%)",
                round_to(price, 2),
                upside * 100.0
            ),
            None => format!("Current price: {}", round_to(price, 2)),
        });
    }

    if !outcome.failures.is_empty() {
        lines.push(String::new());
        lines.push(format!("Skipped ({} mode):", outcome.batch_mode));
        for failure in &outcome.failures {
            lines.push(format!("  {}: {}", failure.ticker, failure.error));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pipeline::TargetSnapshot;
    use analysis_core::{AnalysisError, MetricKind, MetricSeries, Ticker, ValuationResult};
    use chrono::Utc;
    use fundamental_analysis::{BatchMode, SectorAverages, TickerFailure};

    fn ticker(s: &str) -> Ticker {
        Ticker::new(s).unwrap()
    }

    pub(crate) fn sample_outcome() -> ComparisonOutcome {
        let mut pe = MetricSeries::new(MetricKind::PeRatio);
        pe.push(ticker("JPM"), 12.0);
        pe.push(ticker("GS"), 15.0);
        let mut peg = MetricSeries::new(MetricKind::PegRatio);
        peg.push(ticker("JPM"), 1.92);
        peg.push(ticker("GS"), 1.35);

        ComparisonOutcome {
            target: TargetSnapshot {
                ticker: ticker("MS"),
                price: Some(100.0),
                pe: 15.9,
                peg: 2.44,
                peg_provenance: SeriesProvenance::ManualOverride,
                current_dividend: 3.4,
                dividend_provenance: SeriesProvenance::Fetched,
            },
            sector: SectorAverages::from_series(pe, peg).unwrap(),
            index_pe: 23.46,
            index_peg: 23.46 / 8.69,
            valuation: ValuationResult {
                cost_of_debt: 0.050136,
                equity_weight: 0.376233,
                debt_weight: 0.623767,
                discount_rate: 0.069252,
                projected_dividend: 3.536,
                fair_value: 120.882,
                computed_at: Utc::now(),
            },
            batch_mode: BatchMode::Collect,
            failures: vec![TickerFailure {
                ticker: ticker("ZZZZ"),
                error: AnalysisError::CoercionFailure {
                    ticker: "ZZZZ".to_string(),
                    path: "PEGRatio".to_string(),
                    raw: "\"None\"".to_string(),
                },
            }],
        }
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 3), 1.235);
        assert_eq!(round_to(120.882, 2), 120.88);
        assert_eq!(round_to(2.0, 2), 2.0);
    }

    #[test]
    fn test_report_contents() {
        let report = render_report(&sample_outcome());

        assert!(report.contains("Comparative ticker PE Ratios: [12, 15]"));
        assert!(report.contains("Comparative ticker PEG Ratios: [1.92, 1.35]"));
        assert!(report.contains("Comparative Sector PE: 13.5"));
        assert!(report.contains("Comparative Sector PEG: 1.635"));
        assert!(report.contains("Index Average PEG: 2.7"));
        assert!(report.contains("MS PEG: 2.44 (manual)"));
        assert!(report.contains("Discount rate (WACC): 6.93%"));
        assert!(report.contains("The DDM model prices MS stock at: 120.88"));
        assert!(report.contains("Current price: 100 (implied upside +20.9%)"));
        assert!(report.contains("Skipped (collect mode):"));
        assert!(report.contains("ZZZZ: Coercion failure"));
    }

    #[test]
    fn test_report_line_layout() {
        let report = render_report(&sample_outcome());
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines[0], "Comparative ticker PE Ratios: [12, 15]");
        let header = lines.iter().position(|l| l.starts_with("Ticker")).unwrap();
        assert!(lines[header + 1].starts_with("JPM"));
        assert!(lines[header + 2].starts_with("GS"));
        assert!(lines[header + 3].starts_with("MS") && lines[header + 3].ends_with("(manual)"));
        assert!(!report.ends_with('\n'));
    }

    #[test]
    fn test_report_without_failures_or_price() {
        let mut outcome = sample_outcome();
        outcome.failures.clear();
        outcome.target.price = None;

        let report = render_report(&outcome);
        assert!(!report.contains("Skipped"));
        assert!(!report.contains("Current price"));
    }
}
