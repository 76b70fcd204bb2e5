//! The contract gateway: typed reads and writes against the room
//! contract, behind a capability trait so the client can run against
//! the HTTP bridge or a fully local in-process chain.

use crate::types::{
    Address,
    PlayerInfo,
    Room,
};
use std::fmt;
use tokio::sync::broadcast;

pub mod fake;
pub mod http;

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Failure taxonomy. Read failures are recovered by keeping stale
/// cached data; submission failures end the action and wait for the
/// user to retry; rejections carry the contract's own message verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GatewayError {
    Read(String),
    Submission(String),
    Rejected(String),
}

impl GatewayError {
    pub fn message(&self) -> &str {
        match self {
            GatewayError::Read(msg)
            | GatewayError::Submission(msg)
            | GatewayError::Rejected(msg) => msg,
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Read(msg) => write!(f, "read failed: {msg}"),
            GatewayError::Submission(msg) => {
                write!(f, "submission failed: {msg}")
            }
            GatewayError::Rejected(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for GatewayError {}

/// Name of the event the contract emits for every processed roll.
pub const DICE_ROLLED_EVENT: &str = "DiceRolled";

/// One event log emitted by a confirmed transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventLog {
    /// Contract that emitted the log.
    pub address: Address,
    pub event: String,
    pub data: serde_json::Value,
}

/// A transaction accepted by the chain but not yet confirmed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingTx {
    pub tx_hash: String,
}

/// Receipt of a confirmed transaction, with its emitted logs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: String,
    pub logs: Vec<EventLog>,
}

/// Push notification that a room's state changed. Backends that cannot
/// push simply never produce these and the interval poller carries the
/// whole load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoomSignal {
    pub room_id: u64,
}

/// Typed access to the room contract, bound to one connected address.
///
/// Reads mirror the contract's view functions. Mutating calls split
/// into submit (acceptance) and [`ContractGateway::await_receipt`]
/// (confirmation) so callers can observe both stages.
pub trait ContractGateway: Clone + Send + Sync + 'static {
    /// The contract whose logs count during receipt decoding.
    fn contract_address(&self) -> Address;

    /// The wallet this gateway signs for.
    fn connected_address(&self) -> Address;

    /// Optional push feed for a room; `None` means poll-only.
    fn subscribe(&self, _room_id: u64) -> Option<broadcast::Receiver<RoomSignal>> {
        None
    }

    fn room_info(
        &self,
        room_id: u64,
    ) -> impl Future<Output = GatewayResult<Room>> + Send;

    fn room_players(
        &self,
        room_id: u64,
    ) -> impl Future<Output = GatewayResult<Vec<Address>>> + Send;

    fn player_info(
        &self,
        room_id: u64,
        player: Address,
    ) -> impl Future<Output = GatewayResult<PlayerInfo>> + Send;

    /// Zero address while no player may act (room idle or finished).
    fn current_player(
        &self,
        room_id: u64,
    ) -> impl Future<Output = GatewayResult<Address>> + Send;

    fn create_room(
        &self,
        required_participants: u32,
        stake_amount: u128,
        metadata_uri: String,
    ) -> impl Future<Output = GatewayResult<u64>> + Send;

    fn participate(
        &self,
        room_id: u64,
    ) -> impl Future<Output = GatewayResult<TxReceipt>> + Send;

    /// Submit a regular roll for the connected address.
    fn roll_dice(
        &self,
        room_id: u64,
    ) -> impl Future<Output = GatewayResult<PendingTx>> + Send;

    /// Submit the bonus roll granted after rolling the maximum face.
    /// Whether one is granted is the contract's call; a refusal comes
    /// back as [`GatewayError::Rejected`] with the contract's message.
    fn extra_roll(
        &self,
        room_id: u64,
    ) -> impl Future<Output = GatewayResult<PendingTx>> + Send;

    /// Wait for a submitted transaction to be included and return its
    /// receipt. Unbounded, like the underlying RPC's confirmation wait.
    fn await_receipt(
        &self,
        tx: &PendingTx,
    ) -> impl Future<Output = GatewayResult<TxReceipt>> + Send;
}
