//! Balance report output
//!
//! Renders [`AccountReport`]s either as the human-readable lines the
//! demonstration prints between steps, or as a CSV balance table.
//!
//! Text:
//!
//! ```text
//! Account: Creator
//!   * 9.9980 ALGO
//!   * 1 LOL1
//! ```
//!
//! CSV, one row per account and balance:
//!
//! ```text
//! account,asset_id,symbol,balance
//! Creator,,ALGO,9.9980
//! Creator,1,LOL1,1
//! ```

use std::io::Write;

use clap::ValueEnum;
use serde::Serialize;

use crate::core::account::AccountReport;
use crate::types::amount::CURRENCY_SYMBOL;
use crate::types::ExchangeError;

/// Output format for balance reports
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Csv,
}

#[derive(Debug, Serialize)]
struct BalanceRow<'a> {
    account: &'a str,
    asset_id: Option<u64>,
    symbol: &'a str,
    balance: String,
}

/// Write reports in the requested format
pub fn write_report(
    reports: &[AccountReport],
    format: ReportFormat,
    output: &mut dyn Write,
) -> Result<(), ExchangeError> {
    match format {
        ReportFormat::Text => write_report_text(reports, output),
        ReportFormat::Csv => write_report_csv(reports, output),
    }
}

/// Write one `Account:` block per report
pub fn write_report_text(reports: &[AccountReport], output: &mut dyn Write) -> Result<(), ExchangeError> {
    for report in reports {
        writeln!(output, "Account: {}", report.name)?;
        writeln!(output, "  * {}", report.native)?;
        for (_, symbol, balance) in &report.assets {
            writeln!(output, "  * {} {}", balance, symbol)?;
        }
    }
    output.flush()?;
    Ok(())
}

/// Write a CSV balance table
///
/// Native balances are written in whole units with four decimals, asset
/// holdings as unit counts, and a missing holding slot as `NULL`. Rows keep
/// the order of `reports`.
pub fn write_report_csv(reports: &[AccountReport], output: &mut dyn Write) -> Result<(), ExchangeError> {
    let mut writer = csv::Writer::from_writer(output);

    for report in reports {
        writer.serialize(BalanceRow {
            account: &report.name,
            asset_id: None,
            symbol: CURRENCY_SYMBOL,
            balance: format!("{:.4}", report.native.display_units()),
        })?;

        for (asset_id, symbol, balance) in &report.assets {
            writer.serialize(BalanceRow {
                account: &report.name,
                asset_id: Some(asset_id.0),
                symbol,
                balance: balance.to_string(),
            })?;
        }
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AssetBalance, AssetId, MicroAlgos};
    use rstest::rstest;

    fn reports() -> Vec<AccountReport> {
        vec![
            AccountReport {
                name: "Creator".to_string(),
                native: MicroAlgos(9_998_000),
                assets: vec![(AssetId(1), "LOL1".to_string(), AssetBalance::Held(1))],
            },
            AccountReport {
                name: "Buyer".to_string(),
                native: MicroAlgos(10_000_000),
                assets: vec![(AssetId(1), "LOL1".to_string(), AssetBalance::NotOptedIn)],
            },
        ]
    }

    #[rstest]
    #[case::text(
        ReportFormat::Text,
        "Account: Creator\n  * 9.9980 ALGO\n  * 1 LOL1\nAccount: Buyer\n  * 10.0000 ALGO\n  * NULL LOL1\n"
    )]
    #[case::csv(
        ReportFormat::Csv,
        "account,asset_id,symbol,balance\nCreator,,ALGO,9.9980\nCreator,1,LOL1,1\nBuyer,,ALGO,10.0000\nBuyer,1,LOL1,NULL\n"
    )]
    fn test_write_report(#[case] format: ReportFormat, #[case] expected: &str) {
        let mut output = Vec::new();
        write_report(&reports(), format, &mut output).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), expected);
    }

    #[test]
    fn test_empty_report_writes_nothing() {
        let mut output = Vec::new();
        write_report(&[], ReportFormat::Csv, &mut output).unwrap();
        assert!(output.is_empty());
    }
}
