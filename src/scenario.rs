//! End-to-end demonstration flow
//!
//! Runs the whole NFT lifecycle against a fresh [`DevLedger`] and the
//! in-process [`TradeProgram`]:
//!
//! ```text
//! fund Creator + Buyer ─▶ create NFT ─▶ mint to Creator ─▶ Buyer opts in
//!       ─▶ (optional opt-out / opt-in again) ─▶ negotiate sale ─▶ final balances
//! ```
//!
//! In text mode every step is narrated to the output; in CSV mode only the
//! final balance table is written and the steps go to the log.

use std::io::Write;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::contract::TradeProgram;
use crate::core::account::{Account, AccountReport};
use crate::core::negotiation::{Negotiation, NegotiationEvent, NegotiationOutcome, SaleTerms};
use crate::core::nft::Nft;
use crate::core::submitter::{SubmitConfig, Submitter};
use crate::io::{write_report, ReportFormat};
use crate::ledger::{DevLedger, LedgerConfig};
use crate::types::{AssetId, ExchangeError, MicroAlgos, MICRO_PER_UNIT};

/// Everything the demonstration can be tuned with
#[derive(Clone, Debug)]
pub struct ScenarioConfig {
    /// Amount each test account is funded with
    pub starting_balance: MicroAlgos,

    /// Price the seller asks for the NFT
    pub price: MicroAlgos,

    pub asset_name: String,
    pub unit_name: String,
    pub note: String,

    /// Worker threads of the runtime driving the participants
    pub worker_threads: usize,

    /// Show opting out (closing back to the creator) and in again before the sale
    pub demo_opt_out: bool,

    pub format: ReportFormat,
    pub submit: SubmitConfig,
    pub ledger: LedgerConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            starting_balance: MicroAlgos(10 * MICRO_PER_UNIT),
            price: MicroAlgos(5 * MICRO_PER_UNIT),
            asset_name: "Laughing Out Loud".to_string(),
            unit_name: "LOL1".to_string(),
            note: "Edition 1 of 1".to_string(),
            worker_threads: num_cpus::get(),
            demo_opt_out: false,
            format: ReportFormat::Text,
            submit: SubmitConfig::default(),
            ledger: LedgerConfig::default(),
        }
    }
}

impl ScenarioConfig {
    /// Replace zero funding or thread counts with the defaults
    pub fn validated(mut self) -> Self {
        let default = Self::default();

        if self.starting_balance == MicroAlgos::ZERO {
            warn!(
                default = %default.starting_balance,
                "Invalid starting_balance (0), using default"
            );
            self.starting_balance = default.starting_balance;
        }
        if self.worker_threads == 0 {
            warn!(
                default = default.worker_threads,
                "Invalid worker_threads (0), using default"
            );
            self.worker_threads = default.worker_threads;
        }

        self
    }
}

/// What the demonstration ended with
#[derive(Debug, Clone)]
pub struct ScenarioSummary {
    pub asset_id: AssetId,
    pub outcome: NegotiationOutcome,
    pub final_balances: Vec<AccountReport>,
}

/// Narrates steps in text mode, logs them otherwise
struct Narrator<'a> {
    format: ReportFormat,
    output: &'a mut dyn Write,
}

impl Narrator<'_> {
    fn say(&mut self, line: &str) -> Result<(), ExchangeError> {
        info!("{}", line);
        if self.format == ReportFormat::Text {
            writeln!(self.output, "{}", line)?;
        }
        Ok(())
    }

    fn negotiation(
        &mut self,
        event: NegotiationEvent,
        seller: &Account,
        buyer: &Account,
    ) -> Result<(), ExchangeError> {
        match event {
            NegotiationEvent::Proposed { price, .. } => {
                self.say(&format!("{} proposes price of {}", seller.name(), price))
            }
            NegotiationEvent::Accepted { price } => {
                self.say(&format!("{} accepts price of {}", buyer.name(), price))
            }
        }
    }

    fn balances(&mut self, reports: &[AccountReport]) -> Result<(), ExchangeError> {
        if self.format == ReportFormat::Text {
            write_report(reports, ReportFormat::Text, self.output)?;
        }
        Ok(())
    }
}

/// The demonstration flow
#[derive(Debug, Clone)]
pub struct Scenario {
    config: ScenarioConfig,
}

impl Scenario {
    pub fn new(config: ScenarioConfig) -> Self {
        Self {
            config: config.validated(),
        }
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Run the demonstration on a dedicated multi-threaded runtime
    pub fn run(&self, output: &mut dyn Write) -> Result<ScenarioSummary, ExchangeError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.worker_threads)
            .build()
            .map_err(|e| ExchangeError::IoError {
                message: format!("Failed to create tokio runtime: {}", e),
            })?;

        runtime.block_on(self.execute(output))
    }

    /// Run the demonstration on the current runtime
    pub async fn execute(&self, output: &mut dyn Write) -> Result<ScenarioSummary, ExchangeError> {
        let config = &self.config;
        let mut narrator = Narrator {
            format: config.format,
            output,
        };

        let ledger = Arc::new(DevLedger::new(config.ledger.clone()));
        let submitter = Submitter::new(ledger.clone(), config.submit.clone());
        let program = Arc::new(TradeProgram::new());

        let creator = Arc::new(
            Account::create(&submitter, ledger.as_ref(), "Creator", config.starting_balance).await?,
        );
        let buyer = Arc::new(
            Account::create(&submitter, ledger.as_ref(), "Buyer", config.starting_balance).await?,
        );
        narrator.balances(&[
            creator.balance_report(&[]).await?,
            buyer.balance_report(&[]).await?,
        ])?;

        let nft = Nft::create(&creator, &config.asset_name, &config.unit_name, &config.note).await?;
        narrator.say(&format!(
            "Created asset {} with id {}",
            nft.symbol(),
            nft.asset_id()
        ))?;

        nft.mint(&creator).await?;
        narrator.say(&format!("Minted {} {} to {}", nft.total_units(), nft.symbol(), creator.name()))?;

        buyer.opt_in(&nft).await?;
        narrator.say(&format!("{} opted in to {}", buyer.name(), nft.symbol()))?;
        narrator.balances(&[
            creator.balance_report(&[&nft]).await?,
            buyer.balance_report(&[&nft]).await?,
        ])?;

        if config.demo_opt_out {
            buyer.opt_out(&nft, &creator).await?;
            narrator.say(&format!("{} opted out of {}", buyer.name(), nft.symbol()))?;
            narrator.balances(&[buyer.balance_report(&[&nft]).await?])?;

            buyer.opt_in(&nft).await?;
            narrator.say(&format!("{} opted in to {} again", buyer.name(), nft.symbol()))?;
        }

        let terms = SaleTerms {
            asset_id: nft.asset_id(),
            price: config.price,
        };
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let negotiation = Negotiation::new(program).with_events(events_tx);
        let sale = negotiation.run(Arc::clone(&creator), Arc::clone(&buyer), terms);
        tokio::pin!(sale);

        let outcome = loop {
            tokio::select! {
                biased;
                Some(event) = events_rx.recv() => {
                    narrator.negotiation(event, &creator, &buyer)?;
                }
                result = &mut sale => break result?,
            }
        };
        while let Ok(event) = events_rx.try_recv() {
            narrator.negotiation(event, &creator, &buyer)?;
        }

        let final_balances = vec![
            creator.balance_report(&[&nft]).await?,
            buyer.balance_report(&[&nft]).await?,
        ];
        write_report(&final_balances, config.format, narrator.output)?;

        Ok(ScenarioSummary {
            asset_id: nft.asset_id(),
            outcome,
            final_balances,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AssetBalance;

    #[test]
    fn test_zero_values_fall_back_to_defaults() {
        let config = ScenarioConfig {
            starting_balance: MicroAlgos::ZERO,
            worker_threads: 0,
            ..Default::default()
        }
        .validated();

        assert_eq!(config.starting_balance, MicroAlgos(10_000_000));
        assert_eq!(config.worker_threads, num_cpus::get());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_text_narration() {
        let mut output = Vec::new();
        let summary = Scenario::new(ScenarioConfig::default())
            .execute(&mut output)
            .await
            .unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.starts_with("Account: Creator\n  * 10.0000 ALGO\nAccount: Buyer\n  * 10.0000 ALGO\n"));
        assert!(text.contains(&format!("Created asset LOL1 with id {}\n", summary.asset_id)));
        let proposed = text.find("Creator proposes price of 5.0000 ALGO\n").unwrap();
        let accepted = text.find("Buyer accepts price of 5.0000 ALGO\n").unwrap();
        assert!(proposed < accepted);
        assert!(!text.contains("opted out"));

        let buyer = &summary.final_balances[1];
        assert_eq!(buyer.assets[0].2, AssetBalance::Held(1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_csv_mode_writes_only_the_table() {
        let mut output = Vec::new();
        let config = ScenarioConfig {
            format: ReportFormat::Csv,
            demo_opt_out: true,
            ..Default::default()
        };

        Scenario::new(config).execute(&mut output).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "account,asset_id,symbol,balance");
        assert_eq!(lines.len(), 5);
        assert!(lines[2].ends_with(",LOL1,0"));
        assert!(lines[4].ends_with(",LOL1,1"));
    }
}
