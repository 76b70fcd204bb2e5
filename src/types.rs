use color_eyre::eyre::{
    Result,
    eyre,
};
use serde::{
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};
use std::{
    fmt,
    str::FromStr,
    time::Duration,
};

/// Seconds per roll slot. A player may roll at most once per slot.
pub const SLOT_DURATION_SECS: i64 = 300;
/// Cadence of the background room poller.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);
/// One board cell per animation tick.
pub const ANIMATION_TICK: Duration = Duration::from_millis(300);
/// Gap between committing the decoded face and stopping the spin, so the
/// face value lands before the spin-stop repaint.
pub const SETTLE_DELAY: Duration = Duration::from_millis(50);
/// How long player-info polling stays suspended after a roll settles,
/// leaving the animator room to walk the token to its destination.
pub const FREEZE_WINDOW: Duration = Duration::from_secs(3);
/// Countdown repaint cadence.
pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

pub const DIE_FACES: u8 = 6;
pub const BOARD_CELLS: u16 = 100;
pub const START_CELL: u16 = 1;

/// A 20-byte account address. Parsing lowercases the hex representation,
/// so two renderings of the same address always compare equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn new(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Abbreviated form for labels: `0x1234..cdef`.
    pub fn short(&self) -> String {
        let full = self.to_string();
        format!("{}..{}", &full[..6], &full[full.len() - 4..])
    }
}

impl FromStr for Address {
    type Err = color_eyre::eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim().trim_start_matches("0x").trim_start_matches("0X");
        let raw = hex::decode(trimmed)
            .map_err(|e| eyre!("invalid address '{s}': {e}"))?;
        let bytes: [u8; 20] = raw
            .try_into()
            .map_err(|_| eyre!("address '{s}' is not 20 bytes"))?;
        Ok(Address(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.short())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// On-chain room metadata. `started` flips irreversibly once enough
/// participants have joined; `winner` is set exactly once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Room {
    pub id: u64,
    pub creator: Address,
    pub required_participants: u32,
    pub max_participants: u32,
    pub stake_amount: u128,
    pub started: bool,
    /// Epoch seconds; zero until the room starts.
    pub game_start_time: i64,
    pub winner: Option<Address>,
    pub metadata_uri: String,
}

impl Room {
    pub fn is_over(&self) -> bool {
        self.winner.is_some()
    }
}

/// Per-player contract state for one room. `current_position` is the
/// authoritative, snake/ladder-adjusted cell; it changes only when the
/// contract processes a confirmed roll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerInfo {
    pub last_position: u16,
    pub current_position: u16,
    pub last_roll_slot: u64,
    pub last_roll_value: u8,
    pub prasad_meter: u32,
}

impl Default for PlayerInfo {
    fn default() -> Self {
        PlayerInfo {
            last_position: START_CELL,
            current_position: START_CELL,
            last_roll_slot: 0,
            last_roll_value: 0,
            prasad_meter: 0,
        }
    }
}

impl PlayerInfo {
    pub fn has_rolled(&self) -> bool {
        self.last_roll_value != 0
    }
}
