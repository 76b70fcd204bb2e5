#![allow(non_snake_case)]

//! Room poller behavior against the in-process gateway: independent
//! state slices, the freeze suspension, the poll gate on room ids, and
//! push-triggered fetch rounds.

use moksha_patam::{
    gateway::{
        ContractGateway,
        fake::FakeGateway,
    },
    poller::{
        self,
        PollerCommand,
        RoomEvent,
    },
    types::Address,
};
use std::time::Duration;
use tokio::sync::{
    mpsc,
    watch,
};

fn addr(n: u8) -> Address {
    Address::new([n; 20])
}

async fn recv_event(
    rx: &mut mpsc::UnboundedReceiver<RoomEvent>,
) -> RoomEvent {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for a room event")
        .expect("poller event channel closed")
}

fn kind(event: &RoomEvent) -> &'static str {
    match event {
        RoomEvent::Info(_) => "info",
        RoomEvent::Players(_) => "players",
        RoomEvent::CurrentPlayer(_) => "current",
        RoomEvent::PlayerInfos(_) => "infos",
    }
}

#[tokio::test]
async fn room_poller__emits_every_state_slice_for_a_started_room() {
    // given
    let alice = FakeGateway::new(addr(1));
    let bob = alice.for_player(addr(2));
    let room_id = alice.create_room(2, 100, String::new()).await.unwrap();
    bob.participate(room_id).await.unwrap();

    let (_freeze_tx, freeze_rx) = watch::channel(false);
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(poller::room_poller(
        alice,
        room_id,
        Duration::from_secs(3600),
        freeze_rx,
        cmd_rx,
        event_tx,
    ));

    // when the initial fetch round lands
    let round: Vec<RoomEvent> = [
        recv_event(&mut event_rx).await,
        recv_event(&mut event_rx).await,
        recv_event(&mut event_rx).await,
        recv_event(&mut event_rx).await,
    ]
    .into();

    // then every slice arrived, in fetch order
    assert_eq!(
        round.iter().map(kind).collect::<Vec<_>>(),
        vec!["info", "players", "current", "infos"]
    );
    let RoomEvent::Players(players) = &round[1] else {
        unreachable!()
    };
    assert_eq!(players, &vec![addr(1), addr(2)]);
    let RoomEvent::CurrentPlayer(current) = &round[2] else {
        unreachable!()
    };
    assert_eq!(*current, addr(1));
    let RoomEvent::PlayerInfos(infos) = &round[3] else {
        unreachable!()
    };
    assert_eq!(infos.len(), 2);

    let _ = cmd_tx.send(PollerCommand::Shutdown);
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn room_poller__freeze_suspends_player_sensitive_reads() {
    // given a frozen client
    let alice = FakeGateway::new(addr(1));
    let bob = alice.for_player(addr(2));
    let room_id = alice.create_room(2, 100, String::new()).await.unwrap();
    bob.participate(room_id).await.unwrap();

    let (freeze_tx, freeze_rx) = watch::channel(true);
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(poller::room_poller(
        alice,
        room_id,
        Duration::from_secs(3600),
        freeze_rx,
        cmd_rx,
        event_tx,
    ));

    // when three fetch rounds run while frozen (the initial round, the
    // interval's immediate first tick, and an explicit fetch)
    let _ = cmd_tx.send(PollerCommand::FetchNow);
    let mut seen = Vec::new();
    for _ in 0..6 {
        seen.push(recv_event(&mut event_rx).await);
    }

    // then only room info and the player list ever arrive
    assert_eq!(
        seen.iter().map(kind).collect::<Vec<_>>(),
        vec!["info", "players", "info", "players", "info", "players"]
    );

    // and lifting the freeze brings the player reads back
    freeze_tx.send_replace(false);
    let _ = cmd_tx.send(PollerCommand::FetchNow);
    let next = [
        recv_event(&mut event_rx).await,
        recv_event(&mut event_rx).await,
        recv_event(&mut event_rx).await,
        recv_event(&mut event_rx).await,
    ];
    assert_eq!(
        next.iter().map(kind).collect::<Vec<_>>(),
        vec!["info", "players", "current", "infos"]
    );

    let _ = cmd_tx.send(PollerCommand::Shutdown);
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn room_poller__refuses_a_zero_room_id() {
    let alice = FakeGateway::new(addr(1));
    let (_freeze_tx, freeze_rx) = watch::channel(false);
    let (_cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (event_tx, _event_rx) = mpsc::unbounded_channel();

    let result = poller::room_poller(
        alice,
        0,
        Duration::from_secs(1),
        freeze_rx,
        cmd_rx,
        event_tx,
    )
    .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn room_poller__push_signal_triggers_an_immediate_round() {
    // given a poller whose interval is effectively never
    let alice = FakeGateway::new(addr(1));
    let bob = alice.for_player(addr(2));
    let room_id = alice.create_room(2, 100, String::new()).await.unwrap();

    let (_freeze_tx, freeze_rx) = watch::channel(false);
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(poller::room_poller(
        alice,
        room_id,
        Duration::from_secs(3600),
        freeze_rx,
        cmd_rx,
        event_tx,
    ));

    // drain the startup rounds: the pre-loop fetch plus the interval's
    // immediate first tick, four slices each
    let mut initial = Vec::new();
    for _ in 0..8 {
        initial.push(recv_event(&mut event_rx).await);
    }
    assert!(initial.iter().all(|e| {
        !matches!(e, RoomEvent::Info(room) if room.started)
    }));

    // when another player joins, pushing a room signal
    bob.participate(room_id).await.unwrap();

    // then a fresh round arrives without waiting out the interval
    let event = recv_event(&mut event_rx).await;
    assert_eq!(kind(&event), "info");
    let RoomEvent::Info(room) = event else {
        unreachable!()
    };
    assert!(room.started);

    let _ = cmd_tx.send(PollerCommand::Shutdown);
    handle.await.unwrap().unwrap();
}
