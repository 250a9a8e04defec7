//! Timed flight controller.
//!
//! A flight is a pure function of the clock readings fed to it: `start`
//! schedules the tick cadence and the resolution deadline from the target
//! multiplier, and `advance` replays every deadline that has elapsed up to
//! `now`. Time never reaches the controller except as an explicit
//! millisecond argument, so tests drive it without sleeping.

use aviatron_types::{FlightConfig, FlightError, FlightPhase, MULTIPLIER_SCALE};
use rand::Rng;
use tracing::{debug, info};

/// Observable outcome of advancing the controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlightEvent {
    /// The live multiplier advanced one tick.
    Tick { flight_id: u64, live: u64 },
    /// The flight reached its resolution deadline and the controller
    /// returned to idle.
    Resolved {
        flight_id: u64,
        target: u64,
        live: u64,
    },
}

#[derive(Clone, Copy, Debug)]
enum FlightState {
    Idle,
    Ascending {
        flight_id: u64,
        target: u64,
        live: u64,
        next_tick_at_ms: u64,
        resolves_at_ms: u64,
    },
    Resolved,
}

/// Drives at most one flight at a time through its timed lifecycle.
pub struct FlightController {
    config: FlightConfig,
    next_flight_id: u64,
    state: FlightState,
}

impl FlightController {
    pub fn new(config: FlightConfig) -> Self {
        Self {
            config,
            next_flight_id: 1,
            state: FlightState::Idle,
        }
    }

    pub fn phase(&self) -> FlightPhase {
        match self.state {
            FlightState::Idle => FlightPhase::Idle,
            FlightState::Ascending { .. } => FlightPhase::Ascending,
            FlightState::Resolved => FlightPhase::Resolved,
        }
    }

    /// The flight currently ascending, if any.
    pub fn flight_id(&self) -> Option<u64> {
        match self.state {
            FlightState::Ascending { flight_id, .. } => Some(flight_id),
            FlightState::Idle | FlightState::Resolved => None,
        }
    }

    /// The live multiplier (hundredths) of the ascending flight, if any.
    pub fn live_multiplier(&self) -> Option<u64> {
        match self.state {
            FlightState::Ascending { live, .. } => Some(live),
            FlightState::Idle | FlightState::Resolved => None,
        }
    }

    /// Launch a flight against `target` (hundredths). Returns the flight id.
    pub fn start(&mut self, target: u64, now_ms: u64) -> Result<u64, FlightError> {
        if matches!(self.state, FlightState::Ascending { .. }) {
            return Err(FlightError::AlreadyAscending);
        }
        let flight_id = self.next_flight_id;
        self.next_flight_id += 1;
        self.state = FlightState::Ascending {
            flight_id,
            target,
            live: MULTIPLIER_SCALE,
            next_tick_at_ms: now_ms.saturating_add(self.config.tick_ms),
            resolves_at_ms: now_ms.saturating_add(self.config.duration_ms(target)),
        };
        info!(flight_id, target, "flight started");
        Ok(flight_id)
    }

    /// The next instant at which [Self::advance] will produce an event.
    pub fn next_deadline(&self) -> Option<u64> {
        match self.state {
            FlightState::Ascending {
                next_tick_at_ms,
                resolves_at_ms,
                ..
            } => Some(next_tick_at_ms.min(resolves_at_ms)),
            FlightState::Idle | FlightState::Resolved => None,
        }
    }

    /// Replay every elapsed deadline up to `now_ms`, in order. Ticks due at
    /// the resolution instant land before the resolution itself. A
    /// `Resolved` phase left by an earlier call clears back to idle.
    pub fn advance<R: Rng>(&mut self, now_ms: u64, rng: &mut R) -> Vec<FlightEvent> {
        let mut events = Vec::new();
        loop {
            match &mut self.state {
                FlightState::Idle => break,
                FlightState::Resolved => {
                    self.state = FlightState::Idle;
                    break;
                }
                FlightState::Ascending {
                    flight_id,
                    target,
                    live,
                    next_tick_at_ms,
                    resolves_at_ms,
                } => {
                    if *next_tick_at_ms <= *resolves_at_ms && *next_tick_at_ms <= now_ms {
                        let increment = rng.gen_range(
                            self.config.tick_increment_min..=self.config.tick_increment_max,
                        );
                        *live = live.saturating_add(increment);
                        *next_tick_at_ms = next_tick_at_ms.saturating_add(self.config.tick_ms);
                        events.push(FlightEvent::Tick {
                            flight_id: *flight_id,
                            live: *live,
                        });
                    } else if *resolves_at_ms <= now_ms {
                        events.push(FlightEvent::Resolved {
                            flight_id: *flight_id,
                            target: *target,
                            live: *live,
                        });
                        info!(flight_id = *flight_id, live = *live, "flight resolved");
                        self.state = FlightState::Resolved;
                        break;
                    } else {
                        break;
                    }
                }
            }
        }
        events
    }

    /// Abort any ascending flight without resolving it.
    pub fn cancel(&mut self) {
        if let FlightState::Ascending { flight_id, .. } = self.state {
            debug!(flight_id, "flight cancelled");
        }
        self.state = FlightState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn controller() -> FlightController {
        FlightController::new(FlightConfig::default())
    }

    #[test]
    fn test_start_while_ascending_rejected() {
        let mut flight = controller();
        let id = flight.start(300, 0).unwrap();
        assert_eq!(id, 1);
        assert_eq!(flight.start(300, 0), Err(FlightError::AlreadyAscending));
        assert_eq!(flight.phase(), FlightPhase::Ascending);
    }

    #[test]
    fn test_full_flight_tick_count() {
        let mut flight = controller();
        let mut rng = ChaCha20Rng::seed_from_u64(11);

        // 3.00x target: 500 lead-in + 1000 base + 600 = 2100 ms, so 21
        // ticks at 100 ms cadence, then resolution.
        let id = flight.start(300, 0).unwrap();
        let mut ticks = 0;
        let mut resolved = None;
        let mut now_ms = 0;
        while let Some(deadline) = flight.next_deadline() {
            now_ms = deadline;
            for event in flight.advance(now_ms, &mut rng) {
                match event {
                    FlightEvent::Tick { flight_id, live } => {
                        assert_eq!(flight_id, id);
                        assert!(live > MULTIPLIER_SCALE);
                        ticks += 1;
                    }
                    FlightEvent::Resolved { flight_id, live, .. } => {
                        assert_eq!(flight_id, id);
                        resolved = Some(live);
                    }
                }
            }
        }
        assert_eq!(ticks, 21);
        assert_eq!(now_ms, 2_100);
        let live = resolved.unwrap();
        // 21 ticks of [1, 4] hundredths on top of 1.00x.
        assert!((121..=184).contains(&live));
        assert_eq!(flight.phase(), FlightPhase::Resolved);
        assert_eq!(flight.live_multiplier(), None);
    }

    #[test]
    fn test_resolved_phase_reported_then_cleared() {
        let mut flight = controller();
        let mut rng = ChaCha20Rng::seed_from_u64(13);
        flight.start(300, 0).unwrap();
        flight.advance(10_000, &mut rng);

        // Resolution leaves the completed phase visible with no deadlines.
        assert_eq!(flight.phase(), FlightPhase::Resolved);
        assert_eq!(flight.flight_id(), None);
        assert_eq!(flight.next_deadline(), None);

        // The next advance clears it; a new launch also proceeds from it.
        assert!(flight.advance(10_100, &mut rng).is_empty());
        assert_eq!(flight.phase(), FlightPhase::Idle);

        flight.start(300, 20_000).unwrap();
        flight.advance(30_000, &mut rng);
        assert_eq!(flight.phase(), FlightPhase::Resolved);
        flight.start(300, 40_000).unwrap();
        assert_eq!(flight.phase(), FlightPhase::Ascending);
    }

    #[test]
    fn test_catch_up_replays_all_deadlines() {
        let mut flight = controller();
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        flight.start(300, 0).unwrap();

        // A single late advance past resolution yields every tick and the
        // resolution, in order.
        let events = flight.advance(10_000, &mut rng);
        assert_eq!(events.len(), 22);
        assert!(matches!(events[0], FlightEvent::Tick { .. }));
        assert!(matches!(events[21], FlightEvent::Resolved { .. }));
        assert!(flight.advance(20_000, &mut rng).is_empty());
    }

    #[test]
    fn test_flight_ids_monotonic() {
        let mut flight = controller();
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let first = flight.start(120, 0).unwrap();
        flight.advance(100_000, &mut rng);
        let second = flight.start(120, 100_000).unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_cancel_clears_state() {
        let mut flight = controller();
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        flight.start(300, 0).unwrap();
        flight.cancel();
        assert_eq!(flight.phase(), FlightPhase::Idle);
        assert_eq!(flight.next_deadline(), None);
        assert!(flight.advance(10_000, &mut rng).is_empty());
    }
}
