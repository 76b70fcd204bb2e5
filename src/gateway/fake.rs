//! In-process gateway implementing the room contract's semantics:
//! slot gating, turn rotation, the extra-roll rule, snake/ladder
//! movement, and winner detection. Backs the test suite and the
//! `--offline` demo mode, and exercises the push side of the feed
//! capability (state changes are broadcast as room signals).

use crate::{
    gateway::{
        ContractGateway,
        DICE_ROLLED_EVENT,
        EventLog,
        GatewayError,
        GatewayResult,
        PendingTx,
        RoomSignal,
        TxReceipt,
    },
    timer,
    types::{
        Address,
        BOARD_CELLS,
        DIE_FACES,
        PlayerInfo,
        Room,
        SLOT_DURATION_SECS,
    },
};
use chrono::Utc;
use serde_json::json;
use sha2::{
    Digest,
    Sha256,
};
use std::{
    collections::{
        HashMap,
        VecDeque,
    },
    sync::{
        Arc,
        Mutex,
    },
    time::Duration,
};
use tokio::sync::broadcast;

/// Simulated block-inclusion wait.
const CONFIRMATION_LATENCY: Duration = Duration::from_millis(400);

#[derive(Clone)]
pub struct FakeGateway {
    player: Address,
    contract: Address,
    chain: Arc<Mutex<FakeChain>>,
    signals: broadcast::Sender<RoomSignal>,
}

#[derive(Default)]
struct FakeChain {
    next_room_id: u64,
    next_tx: u64,
    rooms: HashMap<u64, FakeRoom>,
    receipts: HashMap<String, TxReceipt>,
}

struct FakeRoom {
    creator: Address,
    required_participants: u32,
    max_participants: u32,
    stake_amount: u128,
    started: bool,
    game_start_time: i64,
    winner: Option<Address>,
    metadata_uri: String,
    players: Vec<Address>,
    infos: HashMap<Address, PlayerInfo>,
    turn_index: usize,
    extra_roll_for: Option<Address>,
    scripted_faces: VecDeque<u8>,
    nonce: u64,
}

#[derive(Clone, Copy)]
enum RollKind {
    Normal,
    Extra,
}

/// Ladder feet/snake heads and where they land. Landing on an entry
/// cell immediately moves the token to the mapped cell.
fn board_jump(cell: u16) -> u16 {
    match cell {
        // ladders
        4 => 14,
        9 => 31,
        20 => 38,
        28 => 84,
        40 => 59,
        51 => 67,
        63 => 81,
        71 => 91,
        // snakes
        17 => 7,
        54 => 34,
        62 => 19,
        64 => 60,
        87 => 24,
        93 => 73,
        95 => 75,
        99 => 78,
        other => other,
    }
}

impl FakeGateway {
    pub fn new(player: Address) -> Self {
        let (signals, _) = broadcast::channel(64);
        FakeGateway {
            player,
            contract: Address::new([0xfa; 20]),
            chain: Arc::new(Mutex::new(FakeChain::default())),
            signals,
        }
    }

    /// A gateway over the same chain, signing for a different address.
    pub fn for_player(&self, player: Address) -> Self {
        FakeGateway {
            player,
            contract: self.contract,
            chain: Arc::clone(&self.chain),
            signals: self.signals.clone(),
        }
    }

    /// Queue the faces the next rolls will produce, in order. Rolls
    /// fall back to the pseudo-VRF once the queue drains.
    pub fn set_next_faces(&self, room_id: u64, faces: impl IntoIterator<Item = u8>) {
        let mut chain = self.chain.lock().expect("fake chain lock poisoned");
        if let Some(room) = chain.rooms.get_mut(&room_id) {
            room.scripted_faces.extend(faces);
        }
    }

    /// Shift the room's start time one slot into the past, opening a
    /// fresh roll slot without waiting out the real slot duration.
    pub fn advance_slot(&self, room_id: u64) {
        let mut chain = self.chain.lock().expect("fake chain lock poisoned");
        if let Some(room) = chain.rooms.get_mut(&room_id) {
            room.game_start_time -= SLOT_DURATION_SECS;
        }
    }

    fn notify(&self, room_id: u64) {
        let _ = self.signals.send(RoomSignal { room_id });
    }

    fn record_receipt(chain: &mut FakeChain, logs: Vec<EventLog>) -> TxReceipt {
        chain.next_tx += 1;
        let receipt = TxReceipt {
            tx_hash: format!("0xfake{:08x}", chain.next_tx),
            logs,
        };
        chain
            .receipts
            .insert(receipt.tx_hash.clone(), receipt.clone());
        receipt
    }

    fn submit_roll(
        &self,
        room_id: u64,
        kind: RollKind,
    ) -> GatewayResult<PendingTx> {
        let caller = self.player;
        let now = Utc::now().timestamp();
        let mut chain = self.chain.lock().expect("fake chain lock poisoned");
        let room = chain
            .rooms
            .get_mut(&room_id)
            .ok_or_else(|| GatewayError::Rejected("room does not exist".into()))?;

        if !room.started {
            return Err(GatewayError::Rejected("game has not started".into()));
        }
        if room.winner.is_some() {
            return Err(GatewayError::Rejected("game is over".into()));
        }
        if room.players.get(room.turn_index) != Some(&caller) {
            return Err(GatewayError::Rejected("not your turn".into()));
        }
        match kind {
            RollKind::Normal => {
                if room.extra_roll_for == Some(caller) {
                    return Err(GatewayError::Rejected(
                        "must use the extra roll".into(),
                    ));
                }
                let slot = timer::slot_index(room.game_start_time, now)
                    .unwrap_or(0) as u64;
                let info = room.infos.entry(caller).or_default();
                if info.has_rolled() && info.last_roll_slot == slot {
                    return Err(GatewayError::Rejected(
                        "already rolled in this slot".into(),
                    ));
                }
            }
            RollKind::Extra => {
                if room.extra_roll_for != Some(caller) {
                    return Err(GatewayError::Rejected(
                        "no extra roll granted".into(),
                    ));
                }
            }
        }

        let slot = timer::slot_index(room.game_start_time, now).unwrap_or(0) as u64;
        let face = room.draw_face(room_id, slot, caller);
        let info = room.infos.entry(caller).or_default();
        info.last_position = info.current_position;
        let target = info.current_position + u16::from(face);
        if target <= BOARD_CELLS {
            info.current_position = board_jump(target);
        }
        info.last_roll_slot = slot;
        info.last_roll_value = face;
        info.prasad_meter += 1;
        let landed = info.current_position;

        if landed == BOARD_CELLS {
            room.winner = Some(caller);
            room.extra_roll_for = None;
        } else if face == DIE_FACES {
            room.extra_roll_for = Some(caller);
        } else {
            room.extra_roll_for = None;
            room.turn_index = (room.turn_index + 1) % room.players.len();
        }

        let log = EventLog {
            address: self.contract,
            event: DICE_ROLLED_EVENT.to_string(),
            data: json!({
                "player": caller.to_string(),
                "value": face,
                "position": landed,
            }),
        };
        let receipt = Self::record_receipt(&mut chain, vec![log]);
        drop(chain);
        self.notify(room_id);
        Ok(PendingTx {
            tx_hash: receipt.tx_hash,
        })
    }
}

impl FakeRoom {
    fn draw_face(&mut self, room_id: u64, slot: u64, caller: Address) -> u8 {
        if let Some(face) = self.scripted_faces.pop_front() {
            return face.clamp(1, DIE_FACES);
        }
        self.nonce += 1;
        let mut hasher = Sha256::new();
        hasher.update(room_id.to_le_bytes());
        hasher.update(slot.to_le_bytes());
        hasher.update(caller.as_bytes());
        hasher.update(self.nonce.to_le_bytes());
        let digest = hasher.finalize();
        digest[0] % DIE_FACES + 1
    }

    fn as_room(&self, id: u64) -> Room {
        Room {
            id,
            creator: self.creator,
            required_participants: self.required_participants,
            max_participants: self.max_participants,
            stake_amount: self.stake_amount,
            started: self.started,
            game_start_time: self.game_start_time,
            winner: self.winner,
            metadata_uri: self.metadata_uri.clone(),
        }
    }
}

impl ContractGateway for FakeGateway {
    fn contract_address(&self) -> Address {
        self.contract
    }

    fn connected_address(&self) -> Address {
        self.player
    }

    fn subscribe(&self, _room_id: u64) -> Option<broadcast::Receiver<RoomSignal>> {
        Some(self.signals.subscribe())
    }

    async fn room_info(&self, room_id: u64) -> GatewayResult<Room> {
        let chain = self.chain.lock().expect("fake chain lock poisoned");
        chain
            .rooms
            .get(&room_id)
            .map(|room| room.as_room(room_id))
            .ok_or_else(|| GatewayError::Read("room not found".into()))
    }

    async fn room_players(&self, room_id: u64) -> GatewayResult<Vec<Address>> {
        let chain = self.chain.lock().expect("fake chain lock poisoned");
        chain
            .rooms
            .get(&room_id)
            .map(|room| room.players.clone())
            .ok_or_else(|| GatewayError::Read("room not found".into()))
    }

    async fn player_info(
        &self,
        room_id: u64,
        player: Address,
    ) -> GatewayResult<PlayerInfo> {
        let chain = self.chain.lock().expect("fake chain lock poisoned");
        let room = chain
            .rooms
            .get(&room_id)
            .ok_or_else(|| GatewayError::Read("room not found".into()))?;
        Ok(room.infos.get(&player).copied().unwrap_or_default())
    }

    async fn current_player(&self, room_id: u64) -> GatewayResult<Address> {
        let chain = self.chain.lock().expect("fake chain lock poisoned");
        let room = chain
            .rooms
            .get(&room_id)
            .ok_or_else(|| GatewayError::Read("room not found".into()))?;
        if !room.started || room.winner.is_some() {
            return Ok(Address::ZERO);
        }
        Ok(room
            .players
            .get(room.turn_index)
            .copied()
            .unwrap_or(Address::ZERO))
    }

    async fn create_room(
        &self,
        required_participants: u32,
        stake_amount: u128,
        metadata_uri: String,
    ) -> GatewayResult<u64> {
        if required_participants < 2 {
            return Err(GatewayError::Rejected(
                "a room needs at least two participants".into(),
            ));
        }
        let creator = self.player;
        let mut chain = self.chain.lock().expect("fake chain lock poisoned");
        chain.next_room_id += 1;
        let room_id = chain.next_room_id;
        let mut room = FakeRoom {
            creator,
            required_participants,
            max_participants: required_participants,
            stake_amount,
            started: false,
            game_start_time: 0,
            winner: None,
            metadata_uri,
            players: vec![creator],
            infos: HashMap::new(),
            turn_index: 0,
            extra_roll_for: None,
            scripted_faces: VecDeque::new(),
            nonce: 0,
        };
        room.infos.insert(creator, PlayerInfo::default());
        chain.rooms.insert(room_id, room);
        drop(chain);
        self.notify(room_id);
        Ok(room_id)
    }

    async fn participate(&self, room_id: u64) -> GatewayResult<TxReceipt> {
        let caller = self.player;
        let mut chain = self.chain.lock().expect("fake chain lock poisoned");
        let room = chain
            .rooms
            .get_mut(&room_id)
            .ok_or_else(|| GatewayError::Rejected("room does not exist".into()))?;
        if room.started {
            return Err(GatewayError::Rejected("game already started".into()));
        }
        if room.players.contains(&caller) {
            return Err(GatewayError::Rejected("already joined".into()));
        }
        if room.players.len() as u32 >= room.max_participants {
            return Err(GatewayError::Rejected("room is full".into()));
        }
        room.players.push(caller);
        room.infos.insert(caller, PlayerInfo::default());
        if room.players.len() as u32 == room.required_participants {
            room.started = true;
            room.game_start_time = Utc::now().timestamp();
            room.turn_index = 0;
        }
        let receipt = Self::record_receipt(&mut chain, Vec::new());
        drop(chain);
        self.notify(room_id);
        Ok(receipt)
    }

    async fn roll_dice(&self, room_id: u64) -> GatewayResult<PendingTx> {
        self.submit_roll(room_id, RollKind::Normal)
    }

    async fn extra_roll(&self, room_id: u64) -> GatewayResult<PendingTx> {
        self.submit_roll(room_id, RollKind::Extra)
    }

    async fn await_receipt(&self, tx: &PendingTx) -> GatewayResult<TxReceipt> {
        tokio::time::sleep(CONFIRMATION_LATENCY).await;
        let chain = self.chain.lock().expect("fake chain lock poisoned");
        chain
            .receipts
            .get(&tx.tx_hash)
            .cloned()
            .ok_or_else(|| {
                GatewayError::Submission(format!(
                    "unknown transaction {}",
                    tx.tx_hash
                ))
            })
    }
}
