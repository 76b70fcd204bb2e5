//! Controller and main loop for the board session.
//!
//! The controller owns every cache the UI renders from: polled room
//! state, the roll cycle, the animator, and the status/error strip.
//! Workers feed it over channels; it is the only writer of the freeze
//! flag, which the poller reads to know when player-state fetches must
//! pause.

use crate::{
    animator::Animator,
    gateway::{
        ContractGateway,
        fake::FakeGateway,
        http::HttpGateway,
    },
    poller::{
        self,
        PollerCommand,
        RoomEvent,
    },
    positions::PositionStore,
    profiles,
    roll::{
        self,
        RollKind,
        RollMessage,
        RollPhase,
        RollUpdate,
    },
    timer,
    turn::{
        self,
        TurnStatus,
    },
    types::{
        ANIMATION_TICK,
        Address,
        COUNTDOWN_TICK,
        DIE_FACES,
        POLL_INTERVAL,
        PlayerInfo,
        Room,
    },
    ui,
};
use chrono::Utc;
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use rand::Rng;
use std::{
    collections::HashMap,
    path::{
        Path,
        PathBuf,
    },
    time::Duration,
};
use tokio::{
    sync::{
        mpsc,
        watch,
    },
    time,
};
use tracing::{
    debug,
    error,
    warn,
};

const MAX_KEPT_ERRORS: usize = 50;
const SHOWN_ERRORS: usize = 5;
const OFFLINE_ROOM_SIZE: u32 = 3;
const OFFLINE_STAKE: u128 = 1_000;
const BOT_TICK: Duration = Duration::from_secs(3);

#[derive(Clone, Debug)]
pub enum GatewayTargetConfig {
    Http { base_url: String, contract: Address },
    Offline,
}

#[derive(Clone, Debug)]
pub enum RoomAction {
    /// Play in a room this address already belongs to.
    Enter(u64),
    /// Join the room, then play.
    Join(u64),
    /// Create a fresh room (the creator is its first participant).
    Create {
        required_participants: u32,
        stake_amount: u128,
        metadata_uri: String,
    },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub target: GatewayTargetConfig,
    pub address: Address,
    pub room: RoomAction,
    pub data_root: PathBuf,
}

/// What the UI paints. Derived from controller state on every redraw.
#[derive(Clone, Debug)]
pub struct AppSnapshot {
    pub room_id: u64,
    pub room: Option<Room>,
    pub players: Vec<PlayerRow>,
    pub turn: TurnStatus,
    pub dice_face: Option<u8>,
    pub dice_spinning: bool,
    pub dice_enabled: bool,
    pub extra_roll_hint: bool,
    pub countdown: Option<String>,
    pub status: String,
    pub errors: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct PlayerRow {
    pub address: Address,
    pub name: String,
    pub display_position: u16,
    pub authoritative_position: u16,
    pub last_roll_value: u8,
    pub prasad_meter: u32,
    pub is_me: bool,
    pub is_current: bool,
}

pub struct AppController<G> {
    gateway: G,
    me: Address,
    room_id: u64,
    room: Option<Room>,
    players: Vec<Address>,
    player_infos: HashMap<Address, PlayerInfo>,
    current_player: Option<Address>,
    roll_phase: RollPhase,
    roll_cycle: u64,
    prev_server_roll: Option<u8>,
    last_decoded: Option<u8>,
    animator: Animator,
    store: PositionStore,
    status: String,
    errors: Vec<String>,
    freeze_tx: watch::Sender<bool>,
}

impl<G: ContractGateway> AppController<G> {
    pub fn new(gateway: G, room_id: u64, data_root: &Path) -> Result<Self> {
        let store = PositionStore::open(data_root)?;
        let saved = store.load(room_id).unwrap_or_else(|err| {
            warn!(room_id, %err, "discarding unreadable display positions");
            Default::default()
        });
        let me = gateway.connected_address();
        let (freeze_tx, _) = watch::channel(false);
        Ok(AppController {
            gateway,
            me,
            room_id,
            room: None,
            players: Vec::new(),
            player_infos: HashMap::new(),
            current_player: None,
            roll_phase: RollPhase::Idle,
            roll_cycle: 0,
            prev_server_roll: None,
            last_decoded: None,
            animator: Animator::from_saved(saved),
            store,
            status: String::from("Ready"),
            errors: Vec::new(),
            freeze_tx,
        })
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn room_id(&self) -> u64 {
        self.room_id
    }

    pub fn freeze_receiver(&self) -> watch::Receiver<bool> {
        self.freeze_tx.subscribe()
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
        self.errors.clear();
    }

    fn push_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!("{message}");
        self.errors.push(message);
        if self.errors.len() > MAX_KEPT_ERRORS {
            let drain = self.errors.len() - MAX_KEPT_ERRORS;
            self.errors.drain(0..drain);
        }
    }

    pub fn turn_status(&self) -> TurnStatus {
        turn::resolve(self.room.as_ref(), self.current_player, self.me)
    }

    pub fn can_roll(&self) -> bool {
        turn::dice_enabled(self.turn_status(), self.roll_phase.in_flight())
    }

    /// Open the next roll cycle. Stage reports from older cycles are
    /// ignored from here on.
    pub fn begin_cycle(&mut self) -> u64 {
        self.roll_cycle += 1;
        self.roll_cycle
    }

    /// Apply one polled slice of room state. Returns true when a
    /// display position changed and the persisted map should be saved.
    pub fn ingest(&mut self, event: RoomEvent) -> bool {
        match event {
            RoomEvent::Info(room) => {
                let newly_started =
                    room.started && !self.room.as_ref().is_some_and(|r| r.started);
                let new_winner = room
                    .winner
                    .filter(|_| !self.room.as_ref().is_some_and(Room::is_over));
                self.room = Some(room);
                if newly_started {
                    self.set_status("Game on! The first slot is open.");
                }
                if let Some(winner) = new_winner {
                    self.set_status(format!(
                        "{} reaches moksha and wins!",
                        profiles::display_name(winner)
                    ));
                }
                false
            }
            RoomEvent::Players(players) => {
                self.players = players;
                false
            }
            RoomEvent::CurrentPlayer(current) => {
                if self.roll_phase.freeze() {
                    debug!("dropping current-player update during freeze");
                    return false;
                }
                self.current_player =
                    (!current.is_zero()).then_some(current);
                false
            }
            RoomEvent::PlayerInfos(infos) => {
                if self.roll_phase.freeze() {
                    debug!("dropping player-info update during freeze");
                    return false;
                }
                let mut display_changed = false;
                for (player, info) in infos {
                    self.reconcile_own_roll(player, &info);
                    self.player_infos.insert(player, info);
                    display_changed |=
                        self.animator.observe(player, info.current_position);
                }
                display_changed
            }
        }
    }

    /// The displayed face came from the receipt (or its fallback); flag
    /// the rare case where the server ends up recording a different
    /// value for the same roll.
    fn reconcile_own_roll(&self, player: Address, info: &PlayerInfo) {
        if player == self.me
            && let Some(decoded) = self.last_decoded
            && info.has_rolled()
            && Some(info.last_roll_value) != self.prev_server_roll
            && info.last_roll_value != decoded
        {
            warn!(
                decoded,
                server = info.last_roll_value,
                "displayed roll value disagrees with server state"
            );
        }
    }

    /// Apply one stage report from the roll task. Returns true when the
    /// caller should request an immediate poll round.
    pub fn apply_roll(&mut self, message: RollMessage) -> bool {
        if message.cycle != self.roll_cycle {
            debug!(
                stale = message.cycle,
                current = self.roll_cycle,
                "ignoring stage report from a finished roll cycle"
            );
            return false;
        }
        let mut request_fetch = false;
        match &message.update {
            RollUpdate::Started { .. } => {
                self.prev_server_roll = self
                    .player_infos
                    .get(&self.me)
                    .filter(|info| info.has_rolled())
                    .map(|info| info.last_roll_value);
                self.last_decoded = None;
                self.set_status("Rolling...");
            }
            RollUpdate::Submitted => {
                self.set_status("Roll submitted; waiting for confirmation...");
            }
            RollUpdate::Confirmed => {}
            RollUpdate::Decoded { value } => {
                self.last_decoded = Some(*value);
                if *value == DIE_FACES {
                    self.set_status(format!("Rolled a {value}!"));
                } else {
                    self.set_status(format!("Rolled a {value}"));
                }
            }
            RollUpdate::Settled => {}
            RollUpdate::FreezeElapsed => {
                request_fetch = true;
            }
            RollUpdate::Failed { message } => {
                self.status = String::from("Roll failed");
                self.push_error(message.clone());
            }
        }
        self.roll_phase = self.roll_phase.apply(&message.update);
        self.freeze_tx.send_replace(self.roll_phase.freeze());
        request_fetch
    }

    /// One animation tick. Returns true when any token moved.
    pub fn step_animations(&mut self) -> bool {
        self.animator.tick()
    }

    pub fn persist_positions(&self) {
        if let Err(err) = self.store.save(self.room_id, self.animator.positions()) {
            warn!(room_id = self.room_id, %err, "failed to persist display positions");
        }
    }

    pub fn countdown_running(&self) -> bool {
        self.room
            .as_ref()
            .is_some_and(|room| room.started && !room.is_over() && room.game_start_time > 0)
    }

    pub fn build_snapshot(&self, now: i64) -> AppSnapshot {
        let turn_status = self.turn_status();
        let my_info = self.player_infos.get(&self.me);
        let dice_face = self
            .roll_phase
            .displayed_face()
            .or_else(|| my_info.filter(|i| i.has_rolled()).map(|i| i.last_roll_value));
        let extra_roll_hint = matches!(turn_status, TurnStatus::Mine)
            && !self.roll_phase.in_flight()
            && my_info.is_some_and(|info| info.last_roll_value == DIE_FACES);

        let countdown = self
            .room
            .as_ref()
            .filter(|_| self.countdown_running())
            .and_then(|room| timer::seconds_remaining(room.game_start_time, now))
            .map(timer::format_countdown);

        let players = self
            .players
            .iter()
            .map(|&address| {
                let info = self.player_infos.get(&address).copied().unwrap_or_default();
                PlayerRow {
                    address,
                    name: profiles::display_name(address),
                    display_position: self
                        .animator
                        .display_position(address)
                        .unwrap_or(info.current_position),
                    authoritative_position: info.current_position,
                    last_roll_value: info.last_roll_value,
                    prasad_meter: info.prasad_meter,
                    is_me: address == self.me,
                    is_current: self.current_player == Some(address),
                }
            })
            .collect();

        AppSnapshot {
            room_id: self.room_id,
            room: self.room.clone(),
            players,
            turn: turn_status,
            dice_face,
            dice_spinning: self.roll_phase.is_spinning(),
            dice_enabled: self.can_roll(),
            extra_roll_hint,
            countdown,
            status: self.status.clone(),
            errors: self.errors.iter().rev().take(SHOWN_ERRORS).cloned().collect(),
        }
    }
}

pub async fn run_app(config: AppConfig) -> Result<()> {
    match config.target {
        GatewayTargetConfig::Http { base_url, contract } => {
            let gateway = HttpGateway::new(base_url, contract, config.address)?;
            let room_id = prepare_room(&gateway, &config.room).await?;
            run_session(gateway, room_id, &config.data_root).await
        }
        GatewayTargetConfig::Offline => {
            let me = if config.address.is_zero() {
                ephemeral_address()
            } else {
                config.address
            };
            profiles::remember(me, "You");
            let gateway = FakeGateway::new(me);
            let (room_id, bots) = seed_offline_room(&gateway).await?;
            let bot_driver = spawn_bot_driver(gateway.clone(), room_id, bots);
            let result = run_session(gateway, room_id, &config.data_root).await;
            bot_driver.abort();
            result
        }
    }
}

async fn prepare_room<G: ContractGateway>(
    gateway: &G,
    action: &RoomAction,
) -> Result<u64> {
    match action {
        RoomAction::Enter(room_id) if *room_id > 0 => Ok(*room_id),
        RoomAction::Enter(_) => Err(eyre!("a positive room id is required")),
        RoomAction::Join(room_id) => {
            gateway
                .participate(*room_id)
                .await
                .wrap_err_with(|| format!("joining room {room_id} failed"))?;
            tracing::info!(room_id, "joined room");
            Ok(*room_id)
        }
        RoomAction::Create {
            required_participants,
            stake_amount,
            metadata_uri,
        } => {
            let room_id = gateway
                .create_room(
                    *required_participants,
                    *stake_amount,
                    metadata_uri.clone(),
                )
                .await
                .wrap_err("creating a room failed")?;
            tracing::info!(room_id, "created room");
            Ok(room_id)
        }
    }
}

async fn run_session<G: ContractGateway>(
    gateway: G,
    room_id: u64,
    data_root: &Path,
) -> Result<()> {
    let mut controller = AppController::new(gateway, room_id, data_root)?;
    let mut ui_state = ui::UiState::default();
    let mut input_events = ui::input_event_stream();

    tracing::info!(room_id, "starting board session");
    ui::terminal_enter(&mut ui_state)?;
    let res = run_loop(&mut controller, &mut ui_state, &mut input_events).await;
    ui::terminal_exit()?;
    res
}

async fn run_loop<G: ContractGateway>(
    controller: &mut AppController<G>,
    ui_state: &mut ui::UiState,
    input_events: &mut ui::InputEvents,
) -> Result<()> {
    let gateway = controller.gateway().clone();
    let room_id = controller.room_id();

    let (poll_cmd_tx, poll_cmd_rx) = mpsc::unbounded_channel();
    let (room_tx, mut room_rx) = mpsc::unbounded_channel();
    let poller_handle = tokio::spawn(poller::room_poller(
        gateway.clone(),
        room_id,
        POLL_INTERVAL,
        controller.freeze_receiver(),
        poll_cmd_rx,
        room_tx,
    ));
    let (roll_tx, mut roll_rx) = mpsc::unbounded_channel();

    let mut anim_tick = time::interval(ANIMATION_TICK);
    let mut clock_tick = time::interval(COUNTDOWN_TICK);

    draw_now(controller, ui_state)?;

    loop {
        tokio::select! {
            maybe_event = room_rx.recv() => {
                let Some(event) = maybe_event else {
                    warn!("room poller channel closed");
                    break;
                };
                if controller.ingest(event) {
                    controller.persist_positions();
                }
                draw_now(controller, ui_state)?;
            }
            Some(message) = roll_rx.recv() => {
                if controller.apply_roll(message) {
                    let _ = poll_cmd_tx.send(PollerCommand::FetchNow);
                }
                draw_now(controller, ui_state)?;
            }
            _ = anim_tick.tick() => {
                if controller.step_animations() {
                    controller.persist_positions();
                    draw_now(controller, ui_state)?;
                }
            }
            _ = clock_tick.tick() => {
                if controller.countdown_running() {
                    draw_now(controller, ui_state)?;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                let _ = poll_cmd_tx.send(PollerCommand::Shutdown);
                break;
            }
            raw = ui::next_raw_event(input_events) => {
                let event = raw?;
                let Some(ev) = ui::interpret_event(ui_state, event) else {
                    continue;
                };
                match ev {
                    ui::UserEvent::Quit => {
                        let _ = poll_cmd_tx.send(PollerCommand::Shutdown);
                        break;
                    }
                    ui::UserEvent::Roll => {
                        trigger_roll(controller, RollKind::Normal, &roll_tx);
                        draw_now(controller, ui_state)?;
                    }
                    ui::UserEvent::ExtraRoll => {
                        trigger_roll(controller, RollKind::Extra, &roll_tx);
                        draw_now(controller, ui_state)?;
                    }
                    ui::UserEvent::Redraw => {
                        draw_now(controller, ui_state)?;
                    }
                }
            }
        }
    }

    let _ = poll_cmd_tx.send(PollerCommand::Shutdown);
    match poller_handle.await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(err).wrap_err("room poller failed"),
        Err(err) => Err(eyre!(err)).wrap_err("room poller panicked"),
    }
}

/// Start a roll cycle if the dice control is enabled. A trigger while a
/// roll is in flight, or out of turn, is a no-op: the gate is the
/// predicate itself, not just the greyed-out control.
fn trigger_roll<G: ContractGateway>(
    controller: &mut AppController<G>,
    kind: RollKind,
    roll_tx: &mpsc::UnboundedSender<RollMessage>,
) {
    if !controller.can_roll() {
        debug!("roll trigger ignored; dice control is disabled");
        return;
    }
    let cycle = controller.begin_cycle();
    let visual = roll::local_visual_face();
    // Applied here, not via the channel, so the gate is already closed
    // before this function returns.
    controller.apply_roll(RollMessage {
        cycle,
        update: RollUpdate::Started { visual },
    });
    roll::spawn_roll(
        controller.gateway().clone(),
        controller.room_id(),
        kind,
        cycle,
        visual,
        roll_tx.clone(),
    );
}

fn draw_now<G: ContractGateway>(
    controller: &AppController<G>,
    ui_state: &mut ui::UiState,
) -> Result<()> {
    let snapshot = controller.build_snapshot(Utc::now().timestamp());
    ui::draw(ui_state, &snapshot).wrap_err("drawing the board failed")
}

fn ephemeral_address() -> Address {
    Address::new(rand::rng().random())
}

/// A started demo room: the local player plus two simulated opponents.
async fn seed_offline_room(gateway: &FakeGateway) -> Result<(u64, Vec<Address>)> {
    let room_id = gateway
        .create_room(OFFLINE_ROOM_SIZE, OFFLINE_STAKE, "demo://moksha".into())
        .await
        .wrap_err("seeding the offline room failed")?;
    let mut bots = Vec::new();
    for _ in 1..OFFLINE_ROOM_SIZE {
        let bot = ephemeral_address();
        profiles::remember(bot, fakeit::name::first());
        gateway
            .for_player(bot)
            .participate(room_id)
            .await
            .wrap_err("seeding an offline opponent failed")?;
        bots.push(bot);
    }
    Ok((room_id, bots))
}

/// Rolls for the simulated opponents whenever the turn is theirs. The
/// demo nudges the slot clock along instead of idling out a real slot.
fn spawn_bot_driver(
    gateway: FakeGateway,
    room_id: u64,
    bots: Vec<Address>,
) -> tokio::task::JoinHandle<()> {
    use crate::gateway::GatewayError;

    tokio::spawn(async move {
        let mut ticker = time::interval(BOT_TICK);
        loop {
            ticker.tick().await;
            let Ok(current) = gateway.current_player(room_id).await else {
                continue;
            };
            if current.is_zero() || !bots.contains(&current) {
                continue;
            }
            let bot = gateway.for_player(current);
            let submitted = match bot.roll_dice(room_id).await {
                Err(GatewayError::Rejected(msg)) if msg == "must use the extra roll" => {
                    bot.extra_roll(room_id).await
                }
                Err(GatewayError::Rejected(msg))
                    if msg == "already rolled in this slot" =>
                {
                    gateway.advance_slot(room_id);
                    bot.roll_dice(room_id).await
                }
                other => other,
            };
            match submitted {
                Ok(pending) => {
                    let _ = bot.await_receipt(&pending).await;
                }
                Err(err) => warn!(%err, "bot roll failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use tempdir::TempDir;

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    fn info_at(position: u16) -> PlayerInfo {
        PlayerInfo {
            last_position: position,
            current_position: position,
            last_roll_slot: 0,
            last_roll_value: 2,
            prasad_meter: 1,
        }
    }

    fn controller() -> (AppController<FakeGateway>, TempDir) {
        let root = TempDir::new("client").unwrap();
        let gateway = FakeGateway::new(addr(1));
        let controller = AppController::new(gateway, 1, root.path()).unwrap();
        (controller, root)
    }

    fn message(cycle: u64, update: RollUpdate) -> RollMessage {
        RollMessage { cycle, update }
    }

    #[test]
    fn ingest__player_infos_are_dropped_while_frozen() {
        // given a controller with an in-flight roll
        let (mut controller, _root) = controller();
        let cycle = controller.begin_cycle();
        controller.apply_roll(message(cycle, RollUpdate::Started { visual: 2 }));
        assert!(*controller.freeze_receiver().borrow());

        // when a player-info poll result lands mid-freeze
        let changed = controller
            .ingest(RoomEvent::PlayerInfos(vec![(addr(1), info_at(42))]));

        // then nothing is applied
        assert!(!changed);
        assert!(controller.player_infos.is_empty());
        assert_eq!(controller.animator.display_position(addr(1)), None);
    }

    #[test]
    fn ingest__player_infos_apply_once_the_freeze_clears() {
        let (mut controller, _root) = controller();
        let cycle = controller.begin_cycle();
        for update in [
            RollUpdate::Started { visual: 2 },
            RollUpdate::Submitted,
            RollUpdate::Confirmed,
            RollUpdate::Decoded { value: 3 },
            RollUpdate::Settled,
            RollUpdate::FreezeElapsed,
        ] {
            controller.apply_roll(message(cycle, update));
        }
        assert!(!*controller.freeze_receiver().borrow());

        let changed = controller
            .ingest(RoomEvent::PlayerInfos(vec![(addr(1), info_at(42))]));

        assert!(changed);
        assert_eq!(controller.animator.display_position(addr(1)), Some(42));
    }

    #[test]
    fn apply_roll__stale_cycle_reports_are_ignored() {
        // given a controller already on its second cycle
        let (mut controller, _root) = controller();
        let first = controller.begin_cycle();
        controller.apply_roll(message(first, RollUpdate::Started { visual: 1 }));
        let second = controller.begin_cycle();
        controller.apply_roll(message(second, RollUpdate::Started { visual: 4 }));
        controller.apply_roll(message(second, RollUpdate::Submitted));

        // when a leftover report from the first cycle arrives
        controller.apply_roll(message(first, RollUpdate::FreezeElapsed));

        // then the current cycle is untouched
        assert_eq!(controller.roll_phase, RollPhase::Submitted { visual: 4 });
        assert!(*controller.freeze_receiver().borrow());
    }

    #[test]
    fn apply_roll__failure_clears_the_freeze_and_keeps_the_message() {
        let (mut controller, _root) = controller();
        let cycle = controller.begin_cycle();
        controller.apply_roll(message(cycle, RollUpdate::Started { visual: 2 }));

        controller.apply_roll(message(
            cycle,
            RollUpdate::Failed {
                message: "not your turn".into(),
            },
        ));

        assert!(!*controller.freeze_receiver().borrow());
        assert_eq!(controller.status, "Roll failed");
        assert_eq!(controller.errors, vec!["not your turn".to_string()]);
        assert!(!controller.roll_phase.in_flight());
    }

    #[test]
    fn apply_roll__freeze_elapsed_requests_a_fetch() {
        let (mut controller, _root) = controller();
        let cycle = controller.begin_cycle();
        let mut requested = false;
        for update in [
            RollUpdate::Started { visual: 2 },
            RollUpdate::Submitted,
            RollUpdate::Confirmed,
            RollUpdate::Decoded { value: 5 },
            RollUpdate::Settled,
            RollUpdate::FreezeElapsed,
        ] {
            requested = controller.apply_roll(message(cycle, update));
        }
        assert!(requested);
        assert_eq!(controller.roll_phase, RollPhase::Idle);
    }

    #[test]
    fn can_roll__false_while_a_roll_is_in_flight() {
        // given it is my turn in a started room
        let (mut controller, _root) = controller();
        controller.ingest(RoomEvent::Info(Room {
            id: 1,
            creator: addr(1),
            required_participants: 2,
            max_participants: 2,
            stake_amount: 1,
            started: true,
            game_start_time: 1000,
            winner: None,
            metadata_uri: String::new(),
        }));
        controller.ingest(RoomEvent::CurrentPlayer(addr(1)));
        assert!(controller.can_roll());

        // when a roll starts
        let cycle = controller.begin_cycle();
        controller.apply_roll(message(cycle, RollUpdate::Started { visual: 3 }));

        // then the control gate closes
        assert!(!controller.can_roll());
    }

    #[test]
    fn build_snapshot__prefers_the_cycle_face_over_server_state() {
        let (mut controller, _root) = controller();
        controller.ingest(RoomEvent::Players(vec![addr(1)]));
        controller.ingest(RoomEvent::PlayerInfos(vec![(addr(1), info_at(10))]));

        let resting = controller.build_snapshot(0);
        assert_eq!(resting.dice_face, Some(2));
        assert!(!resting.dice_spinning);

        let cycle = controller.begin_cycle();
        controller.apply_roll(message(cycle, RollUpdate::Started { visual: 5 }));
        let spinning = controller.build_snapshot(0);
        assert_eq!(spinning.dice_face, Some(5));
        assert!(spinning.dice_spinning);
    }
}
