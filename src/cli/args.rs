use crate::core::submitter::SubmitConfig;
use crate::io::ReportFormat;
use crate::scenario::ScenarioConfig;
use crate::types::{ExchangeError, MicroAlgos};
use clap::Parser;
use rust_decimal::Decimal;

/// Create, mint and sell an NFT on an in-process development ledger
#[derive(Parser, Debug)]
#[command(name = "nft-exchange")]
#[command(about = "Create, mint and sell an NFT between two test accounts", long_about = None)]
pub struct CliArgs {
    /// Funding of each test account, in whole units
    #[arg(
        long = "starting-balance",
        value_name = "UNITS",
        default_value = "10",
        help = "Funding of each test account in whole units (default: 10)"
    )]
    pub starting_balance: Decimal,

    /// Asking price of the NFT, in whole units
    #[arg(
        long = "price",
        value_name = "UNITS",
        default_value = "5",
        help = "Price the creator asks for the NFT in whole units (default: 5)"
    )]
    pub price: Decimal,

    #[arg(long = "asset-name", value_name = "NAME", default_value = "Laughing Out Loud")]
    pub asset_name: String,

    #[arg(long = "unit-name", value_name = "SYMBOL", default_value = "LOL1")]
    pub unit_name: String,

    #[arg(long = "note", value_name = "TEXT", default_value = "Edition 1 of 1")]
    pub note: String,

    /// Rounds to wait for each confirmation
    #[arg(
        long = "wait-rounds",
        value_name = "ROUNDS",
        default_value_t = 10,
        help = "Rounds to wait for each transaction to be confirmed (default: 10)"
    )]
    pub wait_rounds: u64,

    /// Worker threads of the runtime
    #[arg(
        long = "worker-threads",
        value_name = "COUNT",
        help = "Worker threads driving the participants (default: CPU cores)"
    )]
    pub worker_threads: Option<usize>,

    /// Output format
    #[arg(
        long = "format",
        value_name = "FORMAT",
        default_value = "text",
        help = "Output format: 'text' narrates every step, 'csv' prints the final balance table"
    )]
    pub format: ReportFormat,

    /// Demonstrate opting out and back in before the sale
    #[arg(long = "demo-opt-out")]
    pub demo_opt_out: bool,
}

impl CliArgs {
    /// Create a ScenarioConfig from CLI arguments
    ///
    /// Zero values for the wait bound, funding and thread count are replaced
    /// with defaults (with a warning).
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if a unit amount is negative or finer than a
    /// micro-unit.
    pub fn to_scenario_config(&self) -> Result<ScenarioConfig, ExchangeError> {
        let default = ScenarioConfig::default();

        Ok(ScenarioConfig {
            starting_balance: MicroAlgos::from_units(self.starting_balance)?,
            price: MicroAlgos::from_units(self.price)?,
            asset_name: self.asset_name.clone(),
            unit_name: self.unit_name.clone(),
            note: self.note.clone(),
            worker_threads: self.worker_threads.unwrap_or(default.worker_threads),
            demo_opt_out: self.demo_opt_out,
            format: self.format,
            submit: SubmitConfig::new(self.wait_rounds),
            ledger: default.ledger,
        }
        .validated())
    }
}
