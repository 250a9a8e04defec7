//! Flight/prediction/betting state machine behind an actor mailbox.
//!
//! All mutable state (gate, prediction session, flight controller, wager
//! ledger, round stats) lives inside a single [Engine] task. Callers send
//! commands through a cloneable [Mailbox] and observe progress on an event
//! stream. The engine reads time exclusively from the runtime clock, so
//! the whole lifecycle replays deterministically under the deterministic
//! runtime.

use aviatron_types::{
    FlightConfig, FlightError, FlightPhase, GateConfig, LedgerError, Prediction, RoundRecord,
    RoundStats, ServiceError, GENERATION_LATENCY_MAX_MS, GENERATION_LATENCY_MIN_MS,
    STARTING_CHIPS,
};
use commonware_macros::select;
use commonware_runtime::Clock;
use futures::{
    channel::mpsc,
    future::Either,
    SinkExt, StreamExt,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

mod flight;
mod gate;
mod ledger;
mod mailbox;
mod predictor;

pub use flight::{FlightController, FlightEvent};
pub use gate::{ActivationGate, Unlocked};
pub use ledger::WagerLedger;
pub use mailbox::{Closed, Mailbox, Message};
pub use predictor::{generate, PredictionSession};

/// Re-sleep interval while nothing is scheduled.
const IDLE_WAIT: Duration = Duration::from_secs(60);

/// Observable engine progress, emitted in occurrence order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    PredictionReady(Prediction),
    FlightStarted { flight_id: u64, target: u64 },
    Tick { flight_id: u64, live: u64 },
    CashedOut { flight_id: u64, live: u64, payout: u64 },
    FlightResolved { flight_id: u64, live: u64 },
}

/// Configuration for the engine actor.
pub struct EngineConfig {
    pub gate: GateConfig,
    pub flight: FlightConfig,
    pub starting_chips: u64,
    /// Automatic cashout threshold (hundredths), armed from the start.
    pub auto_cashout: Option<u64>,
    pub mailbox_size: usize,
    /// Seed for the engine's RNG (outcomes, latencies, tick increments).
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gate: GateConfig::default(),
            flight: FlightConfig::default(),
            starting_chips: STARTING_CHIPS,
            auto_cashout: None,
            mailbox_size: 64,
            seed: 0,
        }
    }
}

/// The engine actor. Construct with [Engine::new], then drive with
/// [Engine::run] on a spawned task.
pub struct Engine<E: Clock> {
    context: E,
    gate: ActivationGate,
    session: PredictionSession,
    flight: FlightController,
    ledger: WagerLedger,
    stats: RoundStats,
    auto_cashout: Option<u64>,
    rng: ChaCha20Rng,
    mailbox: mpsc::Receiver<Message>,
    events: mpsc::Sender<Event>,
}

impl<E: Clock> Engine<E> {
    pub fn new(context: E, config: EngineConfig) -> (Self, Mailbox, mpsc::Receiver<Event>) {
        let (sender, receiver) = mpsc::channel(config.mailbox_size);
        let (events, event_receiver) = mpsc::channel(config.mailbox_size);
        (
            Self {
                context,
                gate: ActivationGate::new(config.gate),
                session: PredictionSession::new(),
                flight: FlightController::new(config.flight),
                ledger: WagerLedger::new(config.starting_chips),
                stats: RoundStats::default(),
                auto_cashout: config.auto_cashout,
                rng: ChaCha20Rng::seed_from_u64(config.seed),
                mailbox: receiver,
                events,
            },
            Mailbox::new(sender),
            event_receiver,
        )
    }

    /// Process commands and timers until the mailbox closes.
    pub async fn run(mut self) {
        loop {
            let now_ms = epoch_ms(self.context.current());
            self.advance(now_ms).await;

            let sleep = match self.next_deadline() {
                Some(at) => Either::Left(
                    self.context
                        .sleep_until(UNIX_EPOCH + Duration::from_millis(at)),
                ),
                None => Either::Right(self.context.sleep(IDLE_WAIT)),
            };
            let message = select! {
                message = self.mailbox.next() => {
                    match message {
                        Some(message) => message,
                        None => {
                            debug!("mailbox closed; engine stopping");
                            self.flight.cancel();
                            return;
                        }
                    }
                },
                _ = sleep => {
                    continue;
                }
            };
            self.handle(message).await;
        }
    }

    /// The next instant at which [Self::advance] has work to do.
    fn next_deadline(&self) -> Option<u64> {
        let pending = self.session.pending().map(|(_, due_at_ms)| due_at_ms);
        match (pending, self.flight.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Fire everything due at or before `now_ms`: prediction completions,
    /// flight ticks (with automatic cashout), and flight resolution.
    async fn advance(&mut self, now_ms: u64) {
        if let Some((sequence, due_at_ms)) = self.session.pending() {
            if due_at_ms <= now_ms {
                let prediction = predictor::generate(&mut self.rng, now_ms, sequence);
                if self.session.complete(sequence, prediction.clone()) {
                    info!(
                        sequence,
                        multiplier = prediction.multiplier,
                        confidence = prediction.confidence,
                        "prediction ready"
                    );
                    self.emit(Event::PredictionReady(prediction)).await;
                }
            }
        }

        for event in self.flight.advance(now_ms, &mut self.rng) {
            match event {
                FlightEvent::Tick { flight_id, live } => {
                    self.emit(Event::Tick { flight_id, live }).await;
                    if let Some(payout) = self.ledger.try_auto_cashout(live, self.auto_cashout) {
                        info!(flight_id, live, payout, "auto cashout");
                        self.emit(Event::CashedOut {
                            flight_id,
                            live,
                            payout,
                        })
                        .await;
                    }
                }
                FlightEvent::Resolved {
                    flight_id,
                    target,
                    live,
                } => {
                    let wager = self.ledger.resolve_flight();
                    let (wagered, payout, cashed_out) = wager
                        .map(|wager| (wager.amount, wager.payout, wager.settled))
                        .unwrap_or((0, 0, false));
                    self.stats.record(RoundRecord {
                        flight_id,
                        target,
                        final_live: live,
                        wagered,
                        payout,
                        cashed_out,
                        resolved_at_ms: now_ms,
                    });
                    self.session.invalidate();
                    self.emit(Event::FlightResolved { flight_id, live }).await;
                }
            }
        }
    }

    async fn handle(&mut self, message: Message) {
        match message {
            Message::Activate {
                credentials,
                response,
            } => {
                let _ = response.send(self.gate.activate(&credentials));
            }
            Message::RequestPrediction { response } => {
                let result = if !self.gate.is_unlocked() {
                    Err(ServiceError::Unavailable {
                        reason: "not activated",
                    })
                } else {
                    let now_ms = epoch_ms(self.context.current());
                    let latency = self
                        .rng
                        .gen_range(GENERATION_LATENCY_MIN_MS..=GENERATION_LATENCY_MAX_MS);
                    Ok(self.session.begin_request(now_ms.saturating_add(latency)))
                };
                let _ = response.send(result);
            }
            Message::StartFlight { response } => {
                let target = self.session.current().map(|p| p.multiplier);
                let result = match target {
                    None => Err(FlightError::NoPrediction),
                    Some(target) => {
                        let now_ms = epoch_ms(self.context.current());
                        self.flight
                            .start(target, now_ms)
                            .map(|flight_id| (flight_id, target))
                    }
                };
                match result {
                    Ok((flight_id, target)) => {
                        self.ledger.bind_flight(flight_id);
                        let _ = response.send(Ok(flight_id));
                        self.emit(Event::FlightStarted { flight_id, target }).await;
                    }
                    Err(err) => {
                        let _ = response.send(Err(err));
                    }
                }
            }
            Message::PlaceBet { amount, response } => {
                let _ = response.send(self.ledger.place_bet(amount, self.flight.phase()));
            }
            Message::Cashout { response } => {
                let result = match (self.flight.flight_id(), self.flight.live_multiplier()) {
                    (Some(flight_id), Some(live)) => self
                        .ledger
                        .cashout(live, FlightPhase::Ascending)
                        .map(|payout| (flight_id, live, payout)),
                    _ => Err(LedgerError::NotFlying),
                };
                match result {
                    Ok((flight_id, live, payout)) => {
                        let _ = response.send(Ok(payout));
                        self.emit(Event::CashedOut {
                            flight_id,
                            live,
                            payout,
                        })
                        .await;
                    }
                    Err(err) => {
                        let _ = response.send(Err(err));
                    }
                }
            }
            Message::SetAutoCashout { threshold } => {
                self.auto_cashout = threshold;
            }
            Message::Balance { response } => {
                let _ = response.send(self.ledger.balance());
            }
            Message::Stats { response } => {
                let _ = response.send(self.stats.clone());
            }
        }
    }

    async fn emit(&mut self, event: Event) {
        if self.events.send(event).await.is_err() {
            debug!("event receiver dropped");
        }
    }
}

fn epoch_ms(now: SystemTime) -> u64 {
    now.duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use aviatron_types::{Credentials, ValidationError, MULTIPLIER_SCALE};
    use commonware_macros::test_traced;
    use commonware_runtime::{deterministic, Metrics, Runner, Spawner};

    fn credentials() -> Credentials {
        Credentials::new("XXXX-XXXX-XXXX".into(), "acct-1".into(), "sk-1".into())
    }

    fn spawn_engine(
        context: &deterministic::Context,
        config: EngineConfig,
    ) -> (Mailbox, mpsc::Receiver<Event>) {
        let (engine, mailbox, events) = Engine::new(context.clone(), config);
        context.with_label("engine").spawn(|_| engine.run());
        (mailbox, events)
    }

    async fn await_prediction(events: &mut mpsc::Receiver<Event>) -> Prediction {
        loop {
            match events.next().await.expect("event stream closed") {
                Event::PredictionReady(prediction) => return prediction,
                _ => continue,
            }
        }
    }

    #[test_traced("INFO")]
    fn test_locked_engine_refuses_predictions() {
        let runner = deterministic::Runner::seeded(1);
        runner.start(|context| async move {
            let (mut mailbox, _events) = spawn_engine(&context, EngineConfig::default());

            let err = mailbox
                .activate(Credentials::new("AB".into(), "".into(), "".into()))
                .await
                .unwrap()
                .unwrap_err();
            assert!(matches!(err, ValidationError::InvalidCode { len: 2, .. }));

            let err = mailbox.request_prediction().await.unwrap().unwrap_err();
            assert!(matches!(err, ServiceError::Unavailable { .. }));

            // Activation after a failure proceeds normally.
            assert!(mailbox.activate(credentials()).await.unwrap().is_ok());
            assert!(mailbox.request_prediction().await.unwrap().is_ok());
        });
    }

    #[test_traced("INFO")]
    fn test_flight_requires_prediction() {
        let runner = deterministic::Runner::seeded(2);
        runner.start(|context| async move {
            let (mut mailbox, _events) = spawn_engine(&context, EngineConfig::default());
            mailbox.activate(credentials()).await.unwrap().unwrap();

            let err = mailbox.start_flight().await.unwrap().unwrap_err();
            assert_eq!(err, FlightError::NoPrediction);
        });
    }

    #[test_traced("INFO")]
    fn test_full_round_with_auto_cashout() {
        let runner = deterministic::Runner::seeded(3);
        runner.start(|context| async move {
            let config = EngineConfig {
                auto_cashout: Some(110),
                ..EngineConfig::default()
            };
            let (mut mailbox, mut events) = spawn_engine(&context, config);
            mailbox.activate(credentials()).await.unwrap().unwrap();

            mailbox.request_prediction().await.unwrap().unwrap();
            let prediction = await_prediction(&mut events).await;
            assert!(prediction.multiplier >= 120);

            mailbox.place_bet(100).await.unwrap().unwrap();
            assert_eq!(mailbox.balance().await.unwrap(), 900);

            let flight_id = mailbox.start_flight().await.unwrap().unwrap();

            // Betting is locked during ascent.
            assert_eq!(
                mailbox.place_bet(50).await.unwrap(),
                Err(LedgerError::FlightInProgress)
            );

            // The 1.10x threshold is crossed within a few ticks; the wager
            // settles exactly once and a manual cashout afterwards fails.
            let mut cashed_out = None;
            let mut resolved = None;
            while resolved.is_none() {
                match events.next().await.expect("event stream closed") {
                    Event::FlightStarted { flight_id: id, .. } => assert_eq!(id, flight_id),
                    Event::CashedOut { live, payout, .. } => {
                        assert!(cashed_out.is_none());
                        assert!(live >= 110);
                        assert_eq!(payout, 100 * live / MULTIPLIER_SCALE);
                        cashed_out = Some(payout);
                    }
                    Event::FlightResolved { live, .. } => resolved = Some(live),
                    Event::Tick { .. } | Event::PredictionReady(_) => {}
                }
            }
            let payout = cashed_out.expect("auto cashout never fired");
            assert_eq!(mailbox.balance().await.unwrap(), 900 + payout);
            assert_eq!(
                mailbox.cashout().await.unwrap(),
                Err(LedgerError::NotFlying)
            );

            let stats = mailbox.stats().await.unwrap();
            assert_eq!(stats.rounds, 1);
            assert_eq!(stats.wins, 1);
            assert_eq!(stats.losses, 0);
            assert_eq!(stats.recent()[0].flight_id, flight_id);
            assert!(stats.recent()[0].cashed_out);
        });
    }

    #[test_traced("INFO")]
    fn test_auto_cashout_armed_and_disarmed_at_runtime() {
        let runner = deterministic::Runner::seeded(7);
        runner.start(|context| async move {
            let (mut mailbox, mut events) = spawn_engine(&context, EngineConfig::default());
            mailbox.activate(credentials()).await.unwrap().unwrap();

            // Arm the threshold mid-session. 1.10x is always reached: the
            // shortest flight still runs 17 ticks of at least 0.01x each.
            mailbox.set_auto_cashout(Some(110)).await.unwrap();

            mailbox.request_prediction().await.unwrap().unwrap();
            await_prediction(&mut events).await;
            mailbox.place_bet(100).await.unwrap().unwrap();
            mailbox.start_flight().await.unwrap().unwrap();

            let mut cashed_out = None;
            loop {
                match events.next().await.expect("event stream closed") {
                    Event::CashedOut { live, payout, .. } => {
                        assert!(cashed_out.is_none());
                        assert!(live >= 110);
                        cashed_out = Some(payout);
                    }
                    Event::FlightResolved { .. } => break,
                    _ => {}
                }
            }
            let payout = cashed_out.expect("armed threshold never fired");
            assert_eq!(mailbox.balance().await.unwrap(), 900 + payout);

            // Disarm; the next wager rides to resolution untouched.
            mailbox.set_auto_cashout(None).await.unwrap();
            mailbox.request_prediction().await.unwrap().unwrap();
            await_prediction(&mut events).await;
            mailbox.place_bet(100).await.unwrap().unwrap();
            mailbox.start_flight().await.unwrap().unwrap();
            loop {
                match events.next().await.expect("event stream closed") {
                    Event::CashedOut { .. } => panic!("threshold was disarmed"),
                    Event::FlightResolved { .. } => break,
                    _ => {}
                }
            }
            assert_eq!(mailbox.balance().await.unwrap(), 800 + payout);
        });
    }

    #[test_traced("INFO")]
    fn test_forfeit_when_riding_to_resolution() {
        let runner = deterministic::Runner::seeded(4);
        runner.start(|context| async move {
            let (mut mailbox, mut events) = spawn_engine(&context, EngineConfig::default());
            mailbox.activate(credentials()).await.unwrap().unwrap();

            mailbox.request_prediction().await.unwrap().unwrap();
            await_prediction(&mut events).await;
            mailbox.place_bet(100).await.unwrap().unwrap();
            mailbox.start_flight().await.unwrap().unwrap();

            loop {
                match events.next().await.expect("event stream closed") {
                    Event::FlightResolved { .. } => break,
                    Event::CashedOut { .. } => panic!("no cashout was requested"),
                    _ => {}
                }
            }

            assert_eq!(mailbox.balance().await.unwrap(), 900);
            let stats = mailbox.stats().await.unwrap();
            assert_eq!(stats.losses, 1);
            assert_eq!(stats.net(), -100);

            // The prediction was consumed with the round.
            assert_eq!(
                mailbox.start_flight().await.unwrap(),
                Err(FlightError::NoPrediction)
            );
        });
    }

    #[test_traced("INFO")]
    fn test_superseded_prediction_yields_single_ready() {
        let runner = deterministic::Runner::seeded(5);
        runner.start(|context| async move {
            let (mut mailbox, mut events) = spawn_engine(&context, EngineConfig::default());
            mailbox.activate(credentials()).await.unwrap().unwrap();

            let first = mailbox.request_prediction().await.unwrap().unwrap();
            let second = mailbox.request_prediction().await.unwrap().unwrap();
            assert!(second > first);

            let prediction = await_prediction(&mut events).await;
            assert_eq!(prediction.sequence, second);

            // No second completion arrives; the next event is unrelated.
            mailbox.start_flight().await.unwrap().unwrap();
            match events.next().await.expect("event stream closed") {
                Event::FlightStarted { .. } => {}
                event => panic!("unexpected event: {event:?}"),
            }
        });
    }

    #[test_traced("INFO")]
    fn test_manual_cashout_mid_flight() {
        let runner = deterministic::Runner::seeded(6);
        runner.start(|context| async move {
            let (mut mailbox, mut events) = spawn_engine(&context, EngineConfig::default());
            mailbox.activate(credentials()).await.unwrap().unwrap();

            mailbox.request_prediction().await.unwrap().unwrap();
            await_prediction(&mut events).await;
            mailbox.place_bet(200).await.unwrap().unwrap();
            mailbox.start_flight().await.unwrap().unwrap();

            // Wait for a couple of ticks, then cash out manually.
            let mut ticks = 0;
            while ticks < 3 {
                if let Event::Tick { .. } = events.next().await.expect("event stream closed") {
                    ticks += 1;
                }
            }
            let payout = mailbox.cashout().await.unwrap().unwrap();
            assert!(payout >= 200);
            assert_eq!(
                mailbox.cashout().await.unwrap(),
                Err(LedgerError::AlreadySettled)
            );
            assert_eq!(mailbox.balance().await.unwrap(), 800 + payout);
        });
    }
}
