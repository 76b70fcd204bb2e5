//! The roll lifecycle, from user intent to a settled, displayed face.
//!
//! The lifecycle runs on a spawned task so the render loop keeps
//! animating through the confirmation wait; the task reports each
//! stage back over a channel and the [`RollPhase`] machine is the only
//! place those reports are applied. Polling of player state is
//! suspended for as long as [`RollPhase::freeze`] holds, which is
//! exactly while a roll cycle exists; a freeze without a roll cycle
//! cannot be expressed.

use crate::{
    gateway::{
        ContractGateway,
        DICE_ROLLED_EVENT,
        TxReceipt,
    },
    types::{
        Address,
        DIE_FACES,
        FREEZE_WINDOW,
        SETTLE_DELAY,
    },
};
use rand::Rng;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time,
};
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RollKind {
    Normal,
    Extra,
}

/// Orchestrator states for one roll cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RollPhase {
    Idle,
    /// Spin started locally; submission racing the animation.
    Rolling { visual: u8 },
    /// Accepted by the chain, waiting for block inclusion.
    Submitted { visual: u8 },
    /// Included; logs not yet decoded.
    Confirmed { visual: u8 },
    /// Face value committed to the die; spin flags still set so the
    /// face lands before the spin stops.
    Decoded { value: u8 },
    /// Spin stopped on the final face; player-state polling stays
    /// suspended until the post-settle window elapses.
    Settled { value: u8 },
    Failed { message: String },
}

/// Stage reports from the roll task, applied in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RollUpdate {
    Started { visual: u8 },
    Submitted,
    Confirmed,
    Decoded { value: u8 },
    Settled,
    FreezeElapsed,
    Failed { message: String },
}

/// A stage report tagged with its cycle, so a stale report from an
/// earlier cycle can never advance the current one.
#[derive(Clone, Debug)]
pub struct RollMessage {
    pub cycle: u64,
    pub update: RollUpdate,
}

impl RollPhase {
    /// A transaction is being driven; no second roll may start.
    pub fn in_flight(&self) -> bool {
        matches!(
            self,
            RollPhase::Rolling { .. }
                | RollPhase::Submitted { .. }
                | RollPhase::Confirmed { .. }
                | RollPhase::Decoded { .. }
        )
    }

    /// The die is visually spinning.
    pub fn is_spinning(&self) -> bool {
        matches!(
            self,
            RollPhase::Rolling { .. }
                | RollPhase::Submitted { .. }
                | RollPhase::Confirmed { .. }
                | RollPhase::Decoded { .. }
        )
    }

    /// Player-state polling must stay suspended.
    pub fn freeze(&self) -> bool {
        self.in_flight() || matches!(self, RollPhase::Settled { .. })
    }

    /// Face currently shown on the die, if this cycle has one.
    pub fn displayed_face(&self) -> Option<u8> {
        match self {
            RollPhase::Rolling { visual }
            | RollPhase::Submitted { visual }
            | RollPhase::Confirmed { visual } => Some(*visual),
            RollPhase::Decoded { value } | RollPhase::Settled { value } => {
                Some(*value)
            }
            RollPhase::Idle | RollPhase::Failed { .. } => None,
        }
    }

    /// Transition function. Reports that do not apply to the current
    /// state leave it unchanged.
    pub fn apply(&self, update: &RollUpdate) -> RollPhase {
        match (self, update) {
            (_, RollUpdate::Failed { message }) => RollPhase::Failed {
                message: message.clone(),
            },
            (
                RollPhase::Idle | RollPhase::Failed { .. } | RollPhase::Settled { .. },
                RollUpdate::Started { visual },
            ) => RollPhase::Rolling { visual: *visual },
            (RollPhase::Rolling { visual }, RollUpdate::Submitted) => {
                RollPhase::Submitted { visual: *visual }
            }
            (RollPhase::Submitted { visual }, RollUpdate::Confirmed) => {
                RollPhase::Confirmed { visual: *visual }
            }
            (RollPhase::Confirmed { .. }, RollUpdate::Decoded { value }) => {
                RollPhase::Decoded { value: *value }
            }
            (RollPhase::Decoded { value }, RollUpdate::Settled) => {
                RollPhase::Settled { value: *value }
            }
            (RollPhase::Settled { .. }, RollUpdate::FreezeElapsed) => RollPhase::Idle,
            (current, _) => current.clone(),
        }
    }
}

/// The local face shown while the transaction is in flight, and the
/// documented fallback when the confirmed receipt carries no roll
/// event.
pub fn local_visual_face() -> u8 {
    rand::rng().random_range(1..=DIE_FACES)
}

/// Scan a receipt's logs for the roll event emitted by the game
/// contract and decode the face value.
pub fn decode_roll_value(receipt: &TxReceipt, contract: Address) -> Option<u8> {
    receipt
        .logs
        .iter()
        .filter(|log| log.address == contract && log.event == DICE_ROLLED_EVENT)
        .find_map(|log| log.data.get("value").and_then(|v| v.as_u64()))
        .and_then(|v| u8::try_from(v).ok())
        .filter(|v| (1..=DIE_FACES).contains(v))
}

/// Drive one full roll cycle against the gateway, reporting each stage
/// tagged with `cycle`. Exactly one of these runs at a time; the caller
/// gates the trigger on [`RollPhase::in_flight`], generates `visual`
/// up front, and applies the `Started` report synchronously so a second
/// trigger in the same breath finds the gate already closed.
pub fn spawn_roll<G: ContractGateway>(
    gateway: G,
    room_id: u64,
    kind: RollKind,
    cycle: u64,
    visual: u8,
    updates: mpsc::UnboundedSender<RollMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let send = |update: RollUpdate| {
            let _ = updates.send(RollMessage { cycle, update });
        };

        send(RollUpdate::Started { visual });

        let submitted = match kind {
            RollKind::Normal => gateway.roll_dice(room_id).await,
            RollKind::Extra => gateway.extra_roll(room_id).await,
        };
        let pending = match submitted {
            Ok(pending) => {
                send(RollUpdate::Submitted);
                pending
            }
            Err(err) => {
                send(RollUpdate::Failed {
                    message: err.to_string(),
                });
                return;
            }
        };

        let receipt = match gateway.await_receipt(&pending).await {
            Ok(receipt) => {
                send(RollUpdate::Confirmed);
                receipt
            }
            Err(err) => {
                send(RollUpdate::Failed {
                    message: err.to_string(),
                });
                return;
            }
        };

        let value = match decode_roll_value(&receipt, gateway.contract_address()) {
            Some(value) => value,
            None => {
                warn!(
                    tx_hash = %receipt.tx_hash,
                    fallback = visual,
                    "confirmed roll carried no roll event; keeping the local face"
                );
                visual
            }
        };
        send(RollUpdate::Decoded { value });

        time::sleep(SETTLE_DELAY).await;
        send(RollUpdate::Settled);

        time::sleep(FREEZE_WINDOW).await;
        send(RollUpdate::FreezeElapsed);
    })
}
