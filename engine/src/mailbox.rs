//! Command channel into the engine actor.

use aviatron_types::{
    Credentials, FlightError, LedgerError, RoundStats, ServiceError, ValidationError,
};
use futures::{
    channel::{mpsc, oneshot},
    SinkExt,
};
use thiserror::Error as ThisError;

use crate::gate::Unlocked;

/// The engine actor has shut down and can no longer take commands.
#[derive(Debug, ThisError, PartialEq, Eq)]
#[error("engine mailbox closed")]
pub struct Closed;

/// Commands accepted by the engine actor.
pub enum Message {
    Activate {
        credentials: Credentials,
        response: oneshot::Sender<Result<Unlocked, ValidationError>>,
    },
    /// Begin generating a prediction; resolves with the assigned sequence
    /// number once the request is queued (not once it completes).
    RequestPrediction {
        response: oneshot::Sender<Result<u64, ServiceError>>,
    },
    /// Launch a flight against the current prediction; resolves with the
    /// flight id.
    StartFlight {
        response: oneshot::Sender<Result<u64, FlightError>>,
    },
    PlaceBet {
        amount: u64,
        response: oneshot::Sender<Result<(), LedgerError>>,
    },
    /// Settle the open wager at the live multiplier; resolves with the
    /// payout in chips.
    Cashout {
        response: oneshot::Sender<Result<u64, LedgerError>>,
    },
    /// Arm (or disarm, with `None`) the automatic cashout threshold.
    SetAutoCashout {
        threshold: Option<u64>,
    },
    Balance {
        response: oneshot::Sender<u64>,
    },
    Stats {
        response: oneshot::Sender<RoundStats>,
    },
}

/// Cloneable handle for sending commands to the engine actor.
#[derive(Clone)]
pub struct Mailbox {
    sender: mpsc::Sender<Message>,
}

impl Mailbox {
    pub(crate) fn new(sender: mpsc::Sender<Message>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &mut self,
        message: Message,
        receiver: oneshot::Receiver<T>,
    ) -> Result<T, Closed> {
        self.sender.send(message).await.map_err(|_| Closed)?;
        receiver.await.map_err(|_| Closed)
    }

    pub async fn activate(
        &mut self,
        credentials: Credentials,
    ) -> Result<Result<Unlocked, ValidationError>, Closed> {
        let (response, receiver) = oneshot::channel();
        self.request(
            Message::Activate {
                credentials,
                response,
            },
            receiver,
        )
        .await
    }

    pub async fn request_prediction(&mut self) -> Result<Result<u64, ServiceError>, Closed> {
        let (response, receiver) = oneshot::channel();
        self.request(Message::RequestPrediction { response }, receiver)
            .await
    }

    pub async fn start_flight(&mut self) -> Result<Result<u64, FlightError>, Closed> {
        let (response, receiver) = oneshot::channel();
        self.request(Message::StartFlight { response }, receiver)
            .await
    }

    pub async fn place_bet(&mut self, amount: u64) -> Result<Result<(), LedgerError>, Closed> {
        let (response, receiver) = oneshot::channel();
        self.request(Message::PlaceBet { amount, response }, receiver)
            .await
    }

    pub async fn cashout(&mut self) -> Result<Result<u64, LedgerError>, Closed> {
        let (response, receiver) = oneshot::channel();
        self.request(Message::Cashout { response }, receiver).await
    }

    pub async fn set_auto_cashout(&mut self, threshold: Option<u64>) -> Result<(), Closed> {
        self.sender
            .send(Message::SetAutoCashout { threshold })
            .await
            .map_err(|_| Closed)
    }

    pub async fn balance(&mut self) -> Result<u64, Closed> {
        let (response, receiver) = oneshot::channel();
        self.request(Message::Balance { response }, receiver).await
    }

    pub async fn stats(&mut self) -> Result<RoundStats, Closed> {
        let (response, receiver) = oneshot::channel();
        self.request(Message::Stats { response }, receiver).await
    }
}
