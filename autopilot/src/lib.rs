//! Headless aviatron player.
//!
//! Activates the engine, then plays a fixed number of rounds: request a
//! prediction, stake the preset bet, launch the flight, and let the armed
//! automatic cashout settle the wager. Rounds where the balance cannot
//! cover the bet are spectated instead of skipped.

use anyhow::{anyhow, Result};
use aviatron_engine::{Engine, EngineConfig, Event};
use aviatron_types::{Credentials, FlightConfig, GateConfig, STARTING_CHIPS};
use commonware_runtime::{Clock, Metrics, Spawner};
use futures::StreamExt;
use std::env;
use tracing::{info, warn};

/// Configuration for an autopilot deployment (from config file).
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Config {
    /// Credentials; any field left unset falls back to the corresponding
    /// `AVIATRON_*` environment variable.
    #[serde(default)]
    pub activation_code: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub gate: GateConfig,
    pub risk: RiskPreset,
    pub rounds: u64,
    pub seed: u64,
    pub log_level: String,
    pub worker_threads: usize,
}

impl Config {
    /// Assemble credentials from the config, falling back to the
    /// environment for unset fields.
    pub fn resolve_credentials(&self) -> Credentials {
        let field = |configured: &Option<String>, var: &str| {
            configured
                .clone()
                .or_else(|| env::var(var).ok())
                .unwrap_or_default()
        };
        Credentials::new(
            field(&self.activation_code, "AVIATRON_ACTIVATION_CODE"),
            field(&self.account_id, "AVIATRON_ACCOUNT_ID"),
            field(&self.api_key, "AVIATRON_API_KEY"),
        )
    }
}

/// Bet size and automatic cashout threshold, bundled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskPreset {
    Low,
    Medium,
    High,
    Extreme,
}

impl RiskPreset {
    /// Chips staked per round.
    pub fn bet_amount(&self) -> u64 {
        match self {
            Self::Low => 25,
            Self::Medium => 50,
            Self::High => 100,
            Self::Extreme => 200,
        }
    }

    /// Automatic cashout threshold in hundredths.
    pub fn auto_cashout(&self) -> u64 {
        match self {
            Self::Low => 150,
            Self::Medium => 250,
            Self::High => 500,
            Self::Extreme => 800,
        }
    }
}

/// Drives the engine through `config.rounds` rounds.
pub struct Autopilot<E: Clock + Spawner + Metrics + Clone> {
    context: E,
    config: Config,
}

impl<E: Clock + Spawner + Metrics + Clone> Autopilot<E> {
    pub fn new(context: E, config: Config) -> Self {
        Self { context, config }
    }

    pub async fn run(self) -> Result<()> {
        let flight = FlightConfig::default();
        flight
            .validate()
            .map_err(|err| anyhow!("invalid flight config: {err}"))?;
        let preset = self.config.risk;
        let (engine, mut mailbox, mut events) = Engine::new(
            self.context.clone(),
            EngineConfig {
                gate: self.config.gate.clone(),
                flight,
                starting_chips: STARTING_CHIPS,
                auto_cashout: Some(preset.auto_cashout()),
                mailbox_size: 64,
                seed: self.config.seed,
            },
        );
        self.context.with_label("engine").spawn(|_| engine.run());

        let credentials = self.config.resolve_credentials();
        mailbox
            .activate(credentials)
            .await?
            .map_err(|err| anyhow!("activation failed: {err}"))?;

        for round in 1..=self.config.rounds {
            let balance = mailbox.balance().await?;
            let bet = preset.bet_amount();

            mailbox
                .request_prediction()
                .await?
                .map_err(|err| anyhow!("prediction request failed: {err}"))?;
            let prediction = loop {
                match events.next().await.ok_or_else(|| anyhow!("engine stopped"))? {
                    Event::PredictionReady(prediction) => break prediction,
                    _ => continue,
                }
            };

            if bet <= balance {
                mailbox
                    .place_bet(bet)
                    .await?
                    .map_err(|err| anyhow!("bet rejected: {err}"))?;
            } else {
                warn!(round, balance, bet, "insufficient chips; spectating");
            }

            let flight_id = mailbox
                .start_flight()
                .await?
                .map_err(|err| anyhow!("flight rejected: {err}"))?;

            let mut payout = 0;
            let final_live = loop {
                match events.next().await.ok_or_else(|| anyhow!("engine stopped"))? {
                    Event::CashedOut { payout: amount, .. } => payout = amount,
                    Event::FlightResolved { flight_id: id, live } if id == flight_id => break live,
                    _ => continue,
                }
            };
            info!(
                round,
                flight_id,
                target = prediction.multiplier,
                confidence = prediction.confidence,
                final_live,
                payout,
                "round complete"
            );
        }

        let stats = mailbox.stats().await?;
        let balance = mailbox.balance().await?;
        info!(
            rounds = stats.rounds,
            wins = stats.wins,
            losses = stats.losses,
            net = stats.net(),
            balance,
            "autopilot finished"
        );
        Ok(())
    }
}
