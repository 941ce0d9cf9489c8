use analysis_core::{AnalysisError, CostOfDebt, ValuationInputs, ValuationResult};
use chrono::Utc;

/// Pre-tax cost of debt, either given directly or as interest expense / debt value.
pub fn cost_of_debt(inputs: &ValuationInputs) -> Result<f64, AnalysisError> {
    match inputs.cost_of_debt {
        CostOfDebt::Direct(rate) => Ok(rate),
        CostOfDebt::FromInterestExpense(interest_expense) => {
            if inputs.debt_value <= 0.0 {
                return Err(AnalysisError::InvalidModelState(format!(
                    "cannot derive cost of debt from interest expense with debt value {}",
                    inputs.debt_value
                )));
            }
            Ok(interest_expense / inputs.debt_value)
        }
    }
}

/// Weighted average cost of capital with market-value weights and
/// tax-adjusted debt cost.
pub fn weighted_cost_of_capital(inputs: &ValuationInputs) -> Result<f64, AnalysisError> {
    let (equity_weight, debt_weight) = capital_weights(inputs)?;
    let debt_rate = cost_of_debt(inputs)?;
    Ok(equity_weight * inputs.cost_of_equity + debt_weight * debt_rate * (1.0 - inputs.tax_rate))
}

fn capital_weights(inputs: &ValuationInputs) -> Result<(f64, f64), AnalysisError> {
    if inputs.equity_value < 0.0 || inputs.debt_value < 0.0 {
        return Err(AnalysisError::InvalidModelState(format!(
            "equity ({}) and debt ({}) values must not be negative",
            inputs.equity_value, inputs.debt_value
        )));
    }
    let capital = inputs.equity_value + inputs.debt_value;
    if capital <= 0.0 {
        return Err(AnalysisError::InvalidModelState(
            "total capital (equity + debt) must be positive".to_string(),
        ));
    }
    Ok((inputs.equity_value / capital, inputs.debt_value / capital))
}

/// Single-stage Gordon growth valuation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DividendDiscountModel;

impl DividendDiscountModel {
    pub fn new() -> Self {
        Self
    }

    /// Discounts next year's dividend at `discount_rate`, growing at `growth_rate` forever.
    pub fn fair_value(
        &self,
        next_dividend: f64,
        discount_rate: f64,
        growth_rate: f64,
    ) -> Result<f64, AnalysisError> {
        let spread = discount_rate - growth_rate;
        if spread <= 0.0 {
            return Err(AnalysisError::InvalidModelState(format!(
                "growth rate {:.4} must be below discount rate {:.4}",
                growth_rate, discount_rate
            )));
        }
        Ok(next_dividend / spread)
    }

    pub fn evaluate(&self, inputs: &ValuationInputs) -> Result<ValuationResult, AnalysisError> {
        check_finite(inputs)?;

        let (equity_weight, debt_weight) = capital_weights(inputs)?;
        let debt_rate = cost_of_debt(inputs)?;
        let discount_rate = weighted_cost_of_capital(inputs)?;
        let projected_dividend = inputs.current_dividend * (1.0 + inputs.growth_rate);
        let fair_value = self.fair_value(projected_dividend, discount_rate, inputs.growth_rate)?;

        tracing::debug!(
            discount_rate,
            projected_dividend,
            fair_value,
            "Dividend discount valuation computed"
        );

        Ok(ValuationResult {
            cost_of_debt: debt_rate,
            equity_weight,
            debt_weight,
            discount_rate,
            projected_dividend,
            fair_value,
            computed_at: Utc::now(),
        })
    }
}

pub fn compute_fair_value(inputs: &ValuationInputs) -> Result<ValuationResult, AnalysisError> {
    DividendDiscountModel::new().evaluate(inputs)
}

fn check_finite(inputs: &ValuationInputs) -> Result<(), AnalysisError> {
    let debt_input = match inputs.cost_of_debt {
        CostOfDebt::Direct(v) | CostOfDebt::FromInterestExpense(v) => v,
    };
    let fields = [
        ("equity value", inputs.equity_value),
        ("debt value", inputs.debt_value),
        ("cost of equity", inputs.cost_of_equity),
        ("cost of debt", debt_input),
        ("tax rate", inputs.tax_rate),
        ("growth rate", inputs.growth_rate),
        ("current dividend", inputs.current_dividend),
    ];
    for (name, value) in fields {
        if !value.is_finite() {
            return Err(AnalysisError::InvalidModelState(format!(
                "{} is not a finite number",
                name
            )));
        }
    }
    Ok(())
}
