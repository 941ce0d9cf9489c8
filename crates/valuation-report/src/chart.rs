use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::pipeline::ComparisonOutcome;

const X_RANGE: (f64, f64) = (0.0, 70.0);
const Y_RANGE: (f64, f64) = (0.0, 3.5);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub pe: f64,
    pub peg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterSeries {
    pub name: String,
    pub color: String,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineOrientation {
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLine {
    pub name: String,
    pub color: String,
    pub orientation: LineOrientation,
    pub value: f64,
}

/// P/E vs PEG scatter handed to an external renderer as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub series: Vec<ScatterSeries>,
    pub reference_lines: Vec<ReferenceLine>,
}

impl ComparisonChart {
    pub fn from_outcome(outcome: &ComparisonOutcome) -> Self {
        let target = &outcome.target;

        let comparison_points = outcome
            .sector
            .paired_points()
            .into_iter()
            .map(|(ticker, pe, peg)| ChartPoint {
                label: ticker.to_string(),
                pe,
                peg,
            })
            .collect();

        Self {
            title: format!("{} vs Comparative Sector vs Index PE/PEG Ratios", target.ticker),
            x_label: "PE Ratio".to_string(),
            y_label: "PEG Ratio".to_string(),
            x_range: X_RANGE,
            y_range: Y_RANGE,
            series: vec![
                ScatterSeries {
                    name: "Comparative Stocks".to_string(),
                    color: "black".to_string(),
                    points: comparison_points,
                },
                ScatterSeries {
                    name: target.ticker.to_string(),
                    color: "green".to_string(),
                    points: vec![ChartPoint {
                        label: target.ticker.to_string(),
                        pe: target.pe,
                        peg: target.peg,
                    }],
                },
            ],
            reference_lines: vec![
                ReferenceLine {
                    name: "Index PE Ratio".to_string(),
                    color: "red".to_string(),
                    orientation: LineOrientation::Vertical,
                    value: outcome.index_pe,
                },
                ReferenceLine {
                    name: "Index PEG Ratio".to_string(),
                    color: "red".to_string(),
                    orientation: LineOrientation::Horizontal,
                    value: outcome.index_peg,
                },
            ],
        }
    }

    /// Points that fall outside the fixed display range.
    pub fn clipped_points(&self) -> Vec<&ChartPoint> {
        self.series
            .iter()
            .flat_map(|s| s.points.iter())
            .filter(|p| {
                p.pe < self.x_range.0 || p.pe > self.x_range.1 || p.peg < self.y_range.0 || p.peg > self.y_range.1
            })
            .collect()
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize chart dataset")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write chart dataset to {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample_outcome;

    #[test]
    fn test_chart_layout() {
        let chart = ComparisonChart::from_outcome(&sample_outcome());

        assert_eq!(chart.x_range, (0.0, 70.0));
        assert_eq!(chart.y_range, (0.0, 3.5));
        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[0].points.len(), 2);
        assert_eq!(chart.series[0].points[0].label, "JPM");
        assert_eq!(chart.series[1].points[0], ChartPoint { label: "MS".to_string(), pe: 15.9, peg: 2.44 });

        let vertical = &chart.reference_lines[0];
        assert_eq!(vertical.orientation, LineOrientation::Vertical);
        assert_eq!(vertical.value, 23.46);
        assert_eq!(chart.reference_lines[1].orientation, LineOrientation::Horizontal);
        assert!(chart.clipped_points().is_empty());
    }

    #[test]
    fn test_clipped_points() {
        let mut chart = ComparisonChart::from_outcome(&sample_outcome());
        chart.series[0].points.push(ChartPoint {
            label: "SPGI".to_string(),
            pe: 85.0,
            peg: 2.47,
        });
        let clipped = chart.clipped_points();
        assert_eq!(clipped.len(), 1);
        assert_eq!(clipped[0].label, "SPGI");
    }

    #[test]
    fn test_write_json_round_trip() {
        let chart = ComparisonChart::from_outcome(&sample_outcome());
        let path = std::env::temp_dir().join(format!("comparison-chart-{}.json", std::process::id()));

        chart.write_json(&path).unwrap();
        let parsed: ComparisonChart = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(parsed.title, chart.title);
        assert_eq!(parsed.series, chart.series);
    }
}
