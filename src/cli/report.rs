use super::ui;
use crate::core::currency::CurrencyCode;
use crate::core::period::Period;
use crate::core::tax::{Aggregation, TaxRates};
use comfy_table::Cell;

impl Aggregation {
    pub fn display_as_table(&self, home_currency: CurrencyCode, rates: &TaxRates) -> String {
        let currency = home_currency
            .symbol()
            .map(str::to_string)
            .unwrap_or_else(|| home_currency.to_string());

        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell(""),
            ui::header_cell(&format!("Amount ({currency})")),
        ]);

        let taxes = &self.totals.taxes;
        table.add_row(vec![Cell::new("Income"), ui::amount_cell(self.totals.income)]);
        table.add_row(vec![
            Cell::new(format!("General tax ({:.1}%)", rates.general * 100.0)),
            ui::amount_cell(taxes.general),
        ]);
        table.add_row(vec![
            Cell::new(format!("Military tax ({:.1}%)", rates.military * 100.0)),
            ui::amount_cell(taxes.military),
        ]);
        table.add_row(vec![Cell::new("Total tax"), ui::total_cell(taxes.total)]);

        table.to_string()
    }
}

/// Renders the report for `period`, listing failed banks below the totals.
pub fn render(
    aggregation: &Aggregation,
    period: &Period,
    home_currency: CurrencyCode,
    rates: &TaxRates,
) -> String {
    let mut output = format!(
        "Income and taxes for the last {}\n\n",
        ui::style_text(&period.to_string(), ui::StyleType::Title)
    );
    output.push_str(&aggregation.display_as_table(home_currency, rates));

    if aggregation.is_partial() {
        output.push_str(&format!(
            "\n\n{}\n",
            ui::style_text("Totals exclude failed banks:", ui::StyleType::TotalLabel)
        ));
        for failure in &aggregation.failures {
            output.push_str(&format!(
                "  {} {}\n",
                ui::style_text(&failure.bank_id, ui::StyleType::Error),
                ui::style_text(&failure.error.to_string(), ui::StyleType::Subtle)
            ));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::Error;
    use crate::core::tax::{BankFailure, IncomeAndTaxes, Taxes};

    fn aggregation(failures: Vec<BankFailure>) -> Aggregation {
        Aggregation {
            totals: IncomeAndTaxes {
                income: 1200.0,
                taxes: Taxes {
                    general: 60.0,
                    military: 12.0,
                    total: 72.0,
                },
            },
            failures,
        }
    }

    #[test]
    fn test_report_lists_totals() {
        let output = render(
            &aggregation(Vec::new()),
            &Period::Months(3.0),
            CurrencyCode::UAH,
            &TaxRates::default(),
        );

        assert!(output.contains("Amount (UAH)"));
        assert!(output.contains("1200.00"));
        assert!(output.contains("60.00"));
        assert!(output.contains("12.00"));
        assert!(output.contains("72.00"));
        assert!(output.contains("General tax (5.0%)"));
        assert!(!output.contains("failed banks"));
    }

    #[test]
    fn test_report_lists_failed_banks() {
        let failures = vec![BankFailure {
            bank_id: "mono-second".to_string(),
            error: Error::EligibleAccountsNotFound,
        }];
        let output = render(
            &aggregation(failures),
            &Period::Years(1.0),
            CurrencyCode(999),
            &TaxRates::default(),
        );

        assert!(output.contains("Amount (999)"));
        assert!(output.contains("Totals exclude failed banks"));
        assert!(output.contains("mono-second"));
        assert!(output.contains("No business accounts in a foreign currency found"));
    }
}
