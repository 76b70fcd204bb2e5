//! Gateway implementation over the JSON bridge exposed by the game's
//! RPC relay. Submissions return a transaction hash immediately; the
//! receipt endpoint blocks until the transaction is included.

use crate::{
    gateway::{
        ContractGateway,
        GatewayError,
        GatewayResult,
        PendingTx,
        TxReceipt,
    },
    types::{
        Address,
        PlayerInfo,
        Room,
    },
};
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use reqwest::StatusCode;
use serde::{
    Deserialize,
    Serialize,
};
use std::fmt;

#[derive(Clone)]
pub struct HttpGateway {
    base_url: String,
    contract: Address,
    player: Address,
    http: reqwest::Client,
}

impl HttpGateway {
    pub fn new(
        base_url: impl Into<String>,
        contract: Address,
        player: Address,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .build()
            .wrap_err("failed to build HTTP client for the gateway bridge")?;
        Ok(HttpGateway {
            base_url,
            contract,
            player,
            http,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: String,
    ) -> GatewayResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let res = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| GatewayError::Read(format!("GET {url}: {e}")))?;
        let status = res.status();
        if !status.is_success() {
            let body = read_error_body(res).await;
            return Err(GatewayError::Read(format!(
                "gateway responded with {status} for {url}: {body}"
            )));
        }
        res.json::<T>()
            .await
            .map_err(|e| GatewayError::Read(format!("invalid payload from {url}: {e}")))
    }

    async fn post_json<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: String,
        body: &B,
    ) -> GatewayResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let res = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Submission(format!("POST {url}: {e}")))?;
        let status = res.status();
        if !status.is_success() {
            let body = read_error_body(res).await;
            // The bridge relays contract reverts as 409; everything
            // else is a transport/submission problem.
            if status == StatusCode::CONFLICT {
                return Err(GatewayError::Rejected(body));
            }
            return Err(GatewayError::Submission(format!(
                "gateway responded with {status} for {url}: {body}"
            )));
        }
        res.json::<T>().await.map_err(|e| {
            GatewayError::Submission(format!("invalid payload from {url}: {e}"))
        })
    }
}

/// Prefer the bridge's structured `{"error": ...}` body, fall back to
/// raw text.
async fn read_error_body(res: reqwest::Response) -> String {
    let text = res
        .text()
        .await
        .unwrap_or_else(|_| "<unavailable body>".to_string());
    serde_json::from_str::<ErrorDto>(&text)
        .map(|dto| dto.error)
        .unwrap_or(text)
}

impl ContractGateway for HttpGateway {
    fn contract_address(&self) -> Address {
        self.contract
    }

    fn connected_address(&self) -> Address {
        self.player
    }

    async fn room_info(&self, room_id: u64) -> GatewayResult<Room> {
        let dto: RoomDto = self.get_json(format!("/rooms/{room_id}")).await?;
        dto.try_into()
    }

    async fn room_players(&self, room_id: u64) -> GatewayResult<Vec<Address>> {
        let raw: Vec<String> =
            self.get_json(format!("/rooms/{room_id}/players")).await?;
        raw.iter()
            .map(|s| parse_address(s))
            .collect::<GatewayResult<Vec<_>>>()
    }

    async fn player_info(
        &self,
        room_id: u64,
        player: Address,
    ) -> GatewayResult<PlayerInfo> {
        let dto: PlayerInfoDto = self
            .get_json(format!("/rooms/{room_id}/players/{player}"))
            .await?;
        Ok(dto.into())
    }

    async fn current_player(&self, room_id: u64) -> GatewayResult<Address> {
        let dto: CurrentPlayerDto = self
            .get_json(format!("/rooms/{room_id}/current-player"))
            .await?;
        parse_address(&dto.address)
    }

    async fn create_room(
        &self,
        required_participants: u32,
        stake_amount: u128,
        metadata_uri: String,
    ) -> GatewayResult<u64> {
        let body = CreateRoomBody {
            creator: self.player.to_string(),
            required_participants,
            stake_amount,
            metadata_uri,
        };
        let dto: CreatedRoomDto = self.post_json("/rooms".to_string(), &body).await?;
        Ok(dto.room_id)
    }

    async fn participate(&self, room_id: u64) -> GatewayResult<TxReceipt> {
        let body = PlayerBody {
            player: self.player.to_string(),
        };
        let dto: ReceiptDto = self
            .post_json(format!("/rooms/{room_id}/participate"), &body)
            .await?;
        dto.try_into()
    }

    async fn roll_dice(&self, room_id: u64) -> GatewayResult<PendingTx> {
        let body = PlayerBody {
            player: self.player.to_string(),
        };
        let dto: SubmittedDto = self
            .post_json(format!("/rooms/{room_id}/roll"), &body)
            .await?;
        Ok(PendingTx {
            tx_hash: dto.tx_hash,
        })
    }

    async fn extra_roll(&self, room_id: u64) -> GatewayResult<PendingTx> {
        let body = PlayerBody {
            player: self.player.to_string(),
        };
        let dto: SubmittedDto = self
            .post_json(format!("/rooms/{room_id}/extra-roll"), &body)
            .await?;
        Ok(PendingTx {
            tx_hash: dto.tx_hash,
        })
    }

    async fn await_receipt(&self, tx: &PendingTx) -> GatewayResult<TxReceipt> {
        let dto: ReceiptDto = self
            .get_json(format!("/transactions/{}/receipt", tx.tx_hash))
            .await
            .map_err(|e| GatewayError::Submission(e.message().to_string()))?;
        dto.try_into()
    }
}

fn parse_address(raw: &str) -> GatewayResult<Address> {
    raw.parse()
        .map_err(|e| GatewayError::Read(format!("{e}")))
}

#[derive(Deserialize)]
struct ErrorDto {
    error: String,
}

#[derive(Deserialize)]
struct RoomDto {
    id: u64,
    creator: String,
    required_participants: u32,
    max_participants: u32,
    stake_amount: u128,
    started: bool,
    game_start_time: i64,
    winner: Option<String>,
    metadata_uri: String,
}

#[derive(Deserialize)]
struct PlayerInfoDto {
    last_position: u16,
    current_position: u16,
    last_roll_slot: u64,
    last_roll_value: u8,
    prasad_meter: u32,
}

#[derive(Deserialize)]
struct CurrentPlayerDto {
    address: String,
}

#[derive(Serialize)]
struct PlayerBody {
    player: String,
}

#[derive(Serialize)]
struct CreateRoomBody {
    creator: String,
    required_participants: u32,
    stake_amount: u128,
    metadata_uri: String,
}

#[derive(Deserialize)]
struct CreatedRoomDto {
    room_id: u64,
}

#[derive(Deserialize)]
struct SubmittedDto {
    tx_hash: String,
}

#[derive(Deserialize)]
struct ReceiptDto {
    tx_hash: String,
    logs: Vec<LogDto>,
}

#[derive(Deserialize)]
struct LogDto {
    address: String,
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl TryFrom<RoomDto> for Room {
    type Error = GatewayError;

    fn try_from(dto: RoomDto) -> GatewayResult<Room> {
        let winner = match dto.winner {
            Some(raw) => {
                let parsed = parse_address(&raw)?;
                (!parsed.is_zero()).then_some(parsed)
            }
            None => None,
        };
        Ok(Room {
            id: dto.id,
            creator: parse_address(&dto.creator)?,
            required_participants: dto.required_participants,
            max_participants: dto.max_participants,
            stake_amount: dto.stake_amount,
            started: dto.started,
            game_start_time: dto.game_start_time,
            winner,
            metadata_uri: dto.metadata_uri,
        })
    }
}

impl From<PlayerInfoDto> for PlayerInfo {
    fn from(dto: PlayerInfoDto) -> Self {
        PlayerInfo {
            last_position: dto.last_position,
            current_position: dto.current_position,
            last_roll_slot: dto.last_roll_slot,
            last_roll_value: dto.last_roll_value,
            prasad_meter: dto.prasad_meter,
        }
    }
}

impl TryFrom<ReceiptDto> for TxReceipt {
    type Error = GatewayError;

    fn try_from(dto: ReceiptDto) -> GatewayResult<TxReceipt> {
        let logs = dto
            .logs
            .into_iter()
            .map(|log| {
                Ok(crate::gateway::EventLog {
                    address: parse_address(&log.address)?,
                    event: log.event,
                    data: log.data,
                })
            })
            .collect::<GatewayResult<Vec<_>>>()?;
        Ok(TxReceipt {
            tx_hash: dto.tx_hash,
            logs,
        })
    }
}

impl fmt::Display for HttpGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_url)
    }
}
