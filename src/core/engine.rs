use super::types::{Inputs, MonthRecord, ProjectionSummary};

#[derive(Debug, Clone, Copy)]
pub(crate) struct MonthlyRates {
    growth: f64,
    dividend: f64,
    dividend_kept: f64,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct MonthAccrual {
    pub(crate) net_dividends: f64,
    pub(crate) growth: f64,
    pub(crate) closing_capital: f64,
}

impl MonthlyRates {
    pub(crate) fn from_inputs(inputs: &Inputs) -> Self {
        Self {
            growth: inputs.annual_return_rate / 100.0 / 12.0,
            dividend: inputs.annual_dividend_rate / 100.0 / 12.0,
            dividend_kept: 1.0 - inputs.withholding_rate / 100.0,
        }
    }

    // The contribution lands before the month's accrual; dividends and price
    // growth both compound on the post-contribution balance, and dividends are
    // reinvested net of withholding.
    pub(crate) fn accrue(self, opening_capital: f64, contribution: f64) -> MonthAccrual {
        let invested = opening_capital + contribution;
        let net_dividends = invested * self.dividend * self.dividend_kept;
        let growth = invested * self.growth;

        MonthAccrual {
            net_dividends,
            growth,
            closing_capital: invested + net_dividends + growth,
        }
    }
}

pub fn run_projection(inputs: &Inputs) -> Vec<MonthRecord> {
    let rates = MonthlyRates::from_inputs(inputs);
    let mut records = Vec::with_capacity(inputs.horizon_months as usize);
    let mut capital = inputs.initial_capital;

    for month in 1..=inputs.horizon_months {
        let accrual = rates.accrue(capital, inputs.monthly_contribution);
        records.push(MonthRecord {
            month,
            opening_capital: capital,
            contribution: inputs.monthly_contribution,
            net_dividends: accrual.net_dividends,
            growth: accrual.growth,
            closing_capital: accrual.closing_capital,
        });
        capital = accrual.closing_capital;
    }

    records
}

pub fn summarize_projection(inputs: &Inputs, records: &[MonthRecord]) -> ProjectionSummary {
    let total_invested = inputs.initial_capital + inputs.monthly_contribution * records.len() as f64;
    let final_capital = records
        .last()
        .map(|r| r.closing_capital)
        .unwrap_or(inputs.initial_capital);
    let gain = final_capital - total_invested;
    let total_return_pct = if total_invested > 0.0 {
        (final_capital / total_invested - 1.0) * 100.0
    } else {
        0.0
    };

    ProjectionSummary {
        total_invested,
        final_capital,
        gain,
        total_return_pct,
    }
}
