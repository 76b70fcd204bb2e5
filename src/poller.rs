//! Background room-state poller.
//!
//! Fetches room info, the player list, per-player info, and the
//! current player on a fixed interval, each read independent of the
//! others. Player-sensitive reads are skipped while the roll
//! orchestrator holds the freeze, so a settle animation is never
//! snapped forward by a mid-animation refetch. A push signal from the
//! gateway (when the backend supports one) triggers an immediate
//! fetch round; the interval remains the fallback.

use crate::{
    gateway::{
        ContractGateway,
        RoomSignal,
    },
    types::{
        Address,
        PlayerInfo,
        Room,
    },
};
use color_eyre::eyre::{
    Result,
    eyre,
};
use std::time::Duration;
use tokio::{
    sync::{
        broadcast,
        mpsc,
        watch,
    },
    time,
};
use tracing::warn;

pub enum PollerCommand {
    FetchNow,
    Shutdown,
}

/// One independently fetched slice of room state. A slice that failed
/// to fetch is simply not sent; the consumer keeps its cached copy.
#[derive(Clone, Debug)]
pub enum RoomEvent {
    Info(Room),
    Players(Vec<Address>),
    PlayerInfos(Vec<(Address, PlayerInfo)>),
    CurrentPlayer(Address),
}

pub async fn room_poller<G: ContractGateway>(
    gateway: G,
    room_id: u64,
    poll_interval: Duration,
    freeze: watch::Receiver<bool>,
    mut commands: mpsc::UnboundedReceiver<PollerCommand>,
    events: mpsc::UnboundedSender<RoomEvent>,
) -> Result<()> {
    if room_id == 0 {
        return Err(eyre!("polling requires a positive room id"));
    }

    let mut push = gateway.subscribe(room_id);
    let mut ticker = time::interval(poll_interval);
    let mut known_players: Vec<Address> = Vec::new();

    fetch_round(&gateway, room_id, &freeze, &mut known_players, &events).await?;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                fetch_round(&gateway, room_id, &freeze, &mut known_players, &events)
                    .await?;
            }
            signal = next_signal(&mut push, room_id) => {
                match signal {
                    Some(changed_room) if changed_room == room_id => {
                        fetch_round(
                            &gateway,
                            room_id,
                            &freeze,
                            &mut known_players,
                            &events,
                        )
                        .await?;
                    }
                    Some(_) => {}
                    None => {
                        // Push feed gone; interval polling carries on.
                        push = None;
                    }
                }
            }
            cmd = commands.recv() => {
                let Some(cmd) = cmd else {
                    break;
                };
                match cmd {
                    PollerCommand::FetchNow => {
                        fetch_round(
                            &gateway,
                            room_id,
                            &freeze,
                            &mut known_players,
                            &events,
                        )
                        .await?;
                    }
                    PollerCommand::Shutdown => break,
                }
            }
        }
    }
    Ok(())
}

/// Resolve the next push signal, or pend forever when the backend has
/// no push feed.
async fn next_signal(
    push: &mut Option<broadcast::Receiver<RoomSignal>>,
    room_id: u64,
) -> Option<u64> {
    match push {
        Some(rx) => match rx.recv().await {
            Ok(signal) => Some(signal.room_id),
            // Missed signals still mean "something changed" here.
            Err(broadcast::error::RecvError::Lagged(_)) => Some(room_id),
            Err(broadcast::error::RecvError::Closed) => None,
        },
        None => std::future::pending().await,
    }
}

async fn fetch_round<G: ContractGateway>(
    gateway: &G,
    room_id: u64,
    freeze: &watch::Receiver<bool>,
    known_players: &mut Vec<Address>,
    events: &mpsc::UnboundedSender<RoomEvent>,
) -> Result<()> {
    let send = |event: RoomEvent| {
        events
            .send(event)
            .map_err(|_| eyre!("room event receiver dropped"))
    };

    match gateway.room_info(room_id).await {
        Ok(info) => send(RoomEvent::Info(info))?,
        Err(err) => warn!(room_id, %err, "room info fetch failed"),
    }

    match gateway.room_players(room_id).await {
        Ok(players) => {
            *known_players = players.clone();
            send(RoomEvent::Players(players))?;
        }
        Err(err) => warn!(room_id, %err, "room players fetch failed"),
    }

    if *freeze.borrow() {
        return Ok(());
    }

    match gateway.current_player(room_id).await {
        Ok(current) => send(RoomEvent::CurrentPlayer(current))?,
        Err(err) => warn!(room_id, %err, "current player fetch failed"),
    }

    let mut infos = Vec::with_capacity(known_players.len());
    for player in known_players.iter() {
        match gateway.player_info(room_id, *player).await {
            Ok(info) => infos.push((*player, info)),
            Err(err) => {
                warn!(room_id, player = %player, %err, "player info fetch failed");
            }
        }
    }
    if !infos.is_empty() {
        send(RoomEvent::PlayerInfos(infos))?;
    }
    Ok(())
}
