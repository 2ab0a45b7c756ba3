//! A room: one game's players, host, engine, and message mailbox.
//!
//! Grounded on `private_poker::table::actor::{TableActor, TableHandle}` —
//! an actor task owning an `mpsc` inbox, driven by a `tokio::select!` loop
//! that interleaves incoming messages with its own scheduled timers, with a
//! cheap `Clone`able handle the hub and connection tasks use to talk to it.

use crate::autoplay::AutoPlayStrategy;
use crate::card::Card;
use crate::constants::{
    AUTO_PLAY_DELIBERATION, DEAL_DELAY, END_OF_GAME_DELAY, RECONNECT_WINDOW,
    SCORING_TO_REFILL_DELAY,
};
use crate::engine::events::EngineEvent;
use crate::engine::{Engine, EngineState};
use crate::error::RoomError;
use crate::messages::{
    AutoReason, EngineStateName, PlayerSnapshot, ServerEvent, ShowdownResult,
};
use crate::session::{PlayerId, PlayerSession, RoomId, Transport};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tokio::task::AbortHandle;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RoomLifecycle {
    Waiting,
    Ready,
    Playing,
    Finished,
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum RoomTimer {
    Deal,
    Refill,
    EndOfGame,
    AutoPlay(PlayerId),
}

pub(crate) enum RoomMessage {
    Join {
        player_id: PlayerId,
        name: String,
        guest_id: Option<String>,
        transport: Transport,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Reconnect {
        player_id: PlayerId,
        name: String,
        transport: Transport,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Leave(PlayerId),
    SetReady(PlayerId, bool),
    StartGame(PlayerId),
    RestartGame(PlayerId),
    DealerCall(PlayerId, u8),
    SelectFirstDealerCard(PlayerId, Card),
    PlayCards(PlayerId, Vec<Card>),
    SetAuto(PlayerId, bool),
    Ping(PlayerId),
    Disconnect(PlayerId),
    Timer(RoomTimer),
    IdleSweep {
        reply: oneshot::Sender<SweepOutcome>,
    },
    GetStats {
        reply: oneshot::Sender<RoomStats>,
    },
}

pub struct SweepOutcome {
    pub should_drop: bool,
}

/// Summary of one room, used by the server's `/stats` sidecar endpoint.
#[derive(Clone, Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStats {
    pub room_id: RoomId,
    pub game_mode: String,
    pub player_count: usize,
    pub state: String,
    pub age_seconds: u64,
}

/// A cheap, cloneable reference to a running room actor.
#[derive(Clone)]
pub struct RoomHandle {
    pub room_id: RoomId,
    sender: mpsc::Sender<RoomMessage>,
}

impl RoomHandle {
    async fn send(&self, msg: RoomMessage) {
        let _ = self.sender.send(msg).await;
    }

    pub async fn join(&self, player_id: PlayerId, name: String, guest_id: Option<String>, transport: Transport) -> Result<(), RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomMessage::Join { player_id, name, guest_id, transport, reply }).await;
        rx.await.unwrap_or(Err(RoomError::NotFound))
    }

    pub async fn reconnect(&self, player_id: PlayerId, name: String, transport: Transport) -> Result<(), RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomMessage::Reconnect { player_id, name, transport, reply }).await;
        rx.await.unwrap_or(Err(RoomError::NotFound))
    }

    pub async fn leave(&self, player_id: PlayerId) {
        self.send(RoomMessage::Leave(player_id)).await;
    }

    pub async fn set_ready(&self, player_id: PlayerId, ready: bool) {
        self.send(RoomMessage::SetReady(player_id, ready)).await;
    }

    pub async fn start_game(&self, player_id: PlayerId) {
        self.send(RoomMessage::StartGame(player_id)).await;
    }

    pub async fn restart_game(&self, player_id: PlayerId) {
        self.send(RoomMessage::RestartGame(player_id)).await;
    }

    pub async fn dealer_call(&self, player_id: PlayerId, cards_to_play: u8) {
        self.send(RoomMessage::DealerCall(player_id, cards_to_play)).await;
    }

    pub async fn select_first_dealer_card(&self, player_id: PlayerId, card: Card) {
        self.send(RoomMessage::SelectFirstDealerCard(player_id, card)).await;
    }

    pub async fn play_cards(&self, player_id: PlayerId, cards: Vec<Card>) {
        self.send(RoomMessage::PlayCards(player_id, cards)).await;
    }

    pub async fn set_auto(&self, player_id: PlayerId, is_auto: bool) {
        self.send(RoomMessage::SetAuto(player_id, is_auto)).await;
    }

    pub async fn ping(&self, player_id: PlayerId) {
        self.send(RoomMessage::Ping(player_id)).await;
    }

    pub async fn disconnect(&self, player_id: PlayerId) {
        self.send(RoomMessage::Disconnect(player_id)).await;
    }

    pub async fn idle_sweep(&self) -> SweepOutcome {
        let (reply, rx) = oneshot::channel();
        self.send(RoomMessage::IdleSweep { reply }).await;
        rx.await.unwrap_or(SweepOutcome { should_drop: true })
    }

    pub async fn stats(&self) -> RoomStats {
        let (reply, rx) = oneshot::channel();
        self.send(RoomMessage::GetStats { reply }).await;
        rx.await.unwrap_or(RoomStats {
            room_id: self.room_id,
            game_mode: String::new(),
            player_count: 0,
            state: "gone".to_string(),
            age_seconds: 0,
        })
    }
}

pub struct RoomConfig {
    pub game_mode: String,
    pub max_players: usize,
}

pub struct RoomActor {
    pub room_id: RoomId,
    config: RoomConfig,
    state: RoomLifecycle,
    /// Insertion order; also seat order while `Playing`.
    seat_order: Vec<PlayerId>,
    players: HashMap<PlayerId, PlayerSession>,
    disconnected_players: HashMap<PlayerId, PlayerSession>,
    host_id: Option<PlayerId>,
    engine: Option<Engine>,
    strategy: Arc<dyn AutoPlayStrategy>,
    restart_acks: std::collections::HashSet<PlayerId>,
    created_at: Instant,
    last_activity_at: Instant,
    inbox: mpsc::Receiver<RoomMessage>,
    self_sender: mpsc::Sender<RoomMessage>,
    round_timer: Option<AbortHandle>,
    auto_timers: HashMap<PlayerId, AbortHandle>,
}

impl RoomActor {
    pub fn spawn(room_id: RoomId, config: RoomConfig, strategy: Arc<dyn AutoPlayStrategy>) -> RoomHandle {
        let (tx, rx) = mpsc::channel(128);
        let actor = RoomActor {
            room_id,
            config,
            state: RoomLifecycle::Waiting,
            seat_order: Vec::new(),
            players: HashMap::new(),
            disconnected_players: HashMap::new(),
            host_id: None,
            engine: None,
            strategy,
            restart_acks: std::collections::HashSet::new(),
            created_at: Instant::now(),
            last_activity_at: Instant::now(),
            inbox: rx,
            self_sender: tx.clone(),
            round_timer: None,
            auto_timers: HashMap::new(),
        };
        tokio::spawn(actor.run());
        RoomHandle { room_id, sender: tx }
    }

    async fn run(mut self) {
        while let Some(msg) = self.inbox.recv().await {
            self.handle_message(msg);
        }
        self.abort_all_timers();
    }

    fn touch(&mut self) {
        self.last_activity_at = Instant::now();
    }

    fn handle_message(&mut self, msg: RoomMessage) {
        match msg {
            RoomMessage::Join { player_id, name, guest_id, transport, reply } => {
                let _ = reply.send(self.handle_join(player_id, name, guest_id, transport));
            }
            RoomMessage::Reconnect { player_id, name, transport, reply } => {
                let _ = reply.send(self.handle_reconnect(player_id, name, transport));
            }
            RoomMessage::Leave(player_id) => self.handle_leave(player_id),
            RoomMessage::SetReady(player_id, ready) => self.handle_set_ready(player_id, ready),
            RoomMessage::StartGame(player_id) => self.handle_start_game(player_id),
            RoomMessage::RestartGame(player_id) => self.handle_restart_game(player_id),
            RoomMessage::DealerCall(player_id, n) => self.handle_dealer_call(player_id, n),
            RoomMessage::SelectFirstDealerCard(player_id, card) => {
                self.handle_select_first_dealer_card(player_id, card)
            }
            RoomMessage::PlayCards(player_id, cards) => self.handle_play_cards(player_id, cards),
            RoomMessage::SetAuto(player_id, is_auto) => self.handle_set_auto(player_id, is_auto, AutoReason::Manual),
            RoomMessage::Ping(player_id) => self.handle_ping(player_id),
            RoomMessage::Disconnect(player_id) => self.handle_disconnect(player_id),
            RoomMessage::Timer(timer) => self.handle_timer(timer),
            RoomMessage::IdleSweep { reply } => {
                let outcome = self.handle_idle_sweep();
                let _ = reply.send(outcome);
            }
            RoomMessage::GetStats { reply } => {
                let (game_mode, player_count, state) = self.info();
                let _ = reply.send(RoomStats {
                    room_id: self.room_id,
                    game_mode,
                    player_count,
                    state: format!("{state:?}"),
                    age_seconds: self.created_at.elapsed().as_secs(),
                });
            }
        }
    }

    // ---- room operations ----

    /// Smallest seat index not currently held by a live or disconnected-but-reconnectable
    /// player, so a departed seat is reused only once it's truly vacant.
    fn next_free_seat_index(&self) -> usize {
        let occupied: HashSet<usize> = self
            .players
            .values()
            .chain(self.disconnected_players.values())
            .map(|s| s.seat_index)
            .collect();
        (0..self.config.max_players).find(|i| !occupied.contains(i)).unwrap_or(occupied.len())
    }

    fn handle_join(&mut self, player_id: PlayerId, name: String, guest_id: Option<String>, transport: Transport) -> Result<(), RoomError> {
        if self.state == RoomLifecycle::Playing {
            return Err(RoomError::AlreadyPlaying);
        }
        if self.players.len() >= self.config.max_players {
            return Err(RoomError::Full);
        }
        let seat_index = self.next_free_seat_index();
        let mut session = PlayerSession::new(name, guest_id, seat_index, transport);
        session.player_id = player_id;
        session.room_id = Some(self.room_id);
        let is_host = self.host_id.is_none();
        session.is_host = is_host;
        if is_host {
            self.host_id = Some(player_id);
        }

        let info = session.info();
        session.send(ServerEvent::RoomJoined {
            room_id: self.room_id,
            player_id,
            my_player_id_in_room: player_id,
            host_id: self.host_id.expect("just assigned or pre-existing"),
            players: self.players.values().map(PlayerSession::info).collect(),
            max_players: self.config.max_players,
        });

        self.seat_order.push(player_id);
        self.players.insert(player_id, session);
        self.broadcast(ServerEvent::PlayerJoined { player: info }, Some(player_id));
        self.recompute_lifecycle();
        self.touch();
        Ok(())
    }

    fn handle_reconnect(&mut self, player_id: PlayerId, name: String, transport: Transport) -> Result<(), RoomError> {
        if self.state != RoomLifecycle::Playing && self.state != RoomLifecycle::Finished {
            return Err(RoomError::NothingToReconnect);
        }
        let mut session = self.disconnected_players.remove(&player_id).ok_or(RoomError::NothingToReconnect)?;
        session.transport = transport;
        session.is_connected = true;
        session.name = name;
        session.update_heartbeat();
        let hand = self
            .engine
            .as_ref()
            .and_then(|e| e.hand_of(player_id))
            .map(|h| h.iter().map(|c| c.byte()).collect())
            .unwrap_or_default();

        session.send(ServerEvent::ReconnectSuccess {
            room_id: self.room_id,
            player_id,
            hand_cards: hand,
            players: self.players.values().map(PlayerSession::info).collect(),
        });
        self.players.insert(player_id, session);
        self.broadcast(
            ServerEvent::PlayerJoined { player: self.players[&player_id].info() },
            Some(player_id),
        );
        if let Some(snapshot) = self.snapshot() {
            self.send_to(player_id, snapshot.into_event());
        }
        self.handle_set_auto(player_id, false, AutoReason::Manual);
        self.touch();
        Ok(())
    }

    fn send_to(&self, player_id: PlayerId, event: ServerEvent) {
        if let Some(session) = self.players.get(&player_id) {
            session.send(event);
        }
    }

    fn handle_leave(&mut self, player_id: PlayerId) {
        let Some(session) = self.players.remove(&player_id) else { return };
        let was_host = session.is_host;
        self.seat_order.retain(|&id| id != player_id);
        self.broadcast(ServerEvent::PlayerLeft { player_id }, None);

        if was_host {
            if let Some(&new_host) = self.seat_order.first() {
                self.host_id = Some(new_host);
                if let Some(new_host_session) = self.players.get_mut(&new_host) {
                    new_host_session.is_host = true;
                }
                self.broadcast(ServerEvent::HostChanged { new_host_id: new_host }, None);
            } else {
                self.host_id = None;
            }
        }
        self.recompute_lifecycle();
        self.touch();
    }

    fn handle_set_ready(&mut self, player_id: PlayerId, ready: bool) {
        if let Some(session) = self.players.get_mut(&player_id) {
            session.is_ready = ready;
        } else {
            return;
        }
        self.broadcast(ServerEvent::PlayerReady { player_id, is_ready: ready }, None);
        self.recompute_lifecycle();
        self.touch();
    }

    fn is_all_ready(&self) -> bool {
        self.players.len() >= 2 && self.players.values().all(|p| p.is_ready)
    }

    fn recompute_lifecycle(&mut self) {
        self.state = match self.state {
            RoomLifecycle::Playing => RoomLifecycle::Playing,
            RoomLifecycle::Finished => RoomLifecycle::Finished,
            _ => {
                if self.is_all_ready() {
                    RoomLifecycle::Ready
                } else {
                    RoomLifecycle::Waiting
                }
            }
        };
    }

    fn handle_start_game(&mut self, player_id: PlayerId) {
        if Some(player_id) != self.host_id {
            self.send_error(player_id, RoomError::NotHost.into());
            return;
        }
        if !matches!(self.state, RoomLifecycle::Waiting | RoomLifecycle::Ready) {
            self.send_error(player_id, RoomError::AlreadyPlaying.into());
            return;
        }
        if !self.is_all_ready() {
            self.send_error(player_id, RoomError::NotAllReady.into());
            return;
        }
        self.state = RoomLifecycle::Playing;
        self.engine = Some(Engine::new(self.seat_order.clone(), Arc::clone(&self.strategy)));
        self.broadcast(
            ServerEvent::GameStart { players: self.players.values().map(PlayerSession::info).collect() },
            None,
        );
        self.schedule_round_timer(DEAL_DELAY, RoomTimer::Deal);
        self.touch();
    }

    fn handle_restart_game(&mut self, player_id: PlayerId) {
        if self.state != RoomLifecycle::Finished {
            return;
        }
        self.restart_acks.insert(player_id);
        if let Some(session) = self.players.get_mut(&player_id) {
            session.is_ready = true;
        }
        if self.restart_acks.len() >= self.players.len() && !self.players.is_empty() {
            self.engine = None;
            self.restart_acks.clear();
            self.state = RoomLifecycle::Ready;
        }
        self.touch();
    }

    fn handle_dealer_call(&mut self, player_id: PlayerId, cards_to_play: u8) {
        let Some(engine) = self.engine.as_mut() else {
            self.send_error(player_id, RoomError::AlreadyPlaying.into());
            return;
        };
        match engine.dealer_call(player_id, cards_to_play) {
            Ok(events) => self.dispatch_engine_events(events),
            Err(e) => self.send_error(player_id, e.into()),
        }
        self.arm_auto_timers();
        self.touch();
    }

    fn handle_select_first_dealer_card(&mut self, player_id: PlayerId, card: Card) {
        let owned = self.engine.as_ref().and_then(|e| e.hand_of(player_id)).is_some_and(|h| h.contains(&card));
        if !owned {
            self.send_error(player_id, crate::error::ValidationError::CardsNotOwned.into());
            return;
        }
        let Some(engine) = self.engine.as_mut() else { return };
        match engine.select_first_dealer_card(player_id, card) {
            Ok(events) => self.dispatch_engine_events(events),
            Err(e) => self.send_error(player_id, e.into()),
        }
        self.arm_auto_timers();
        self.touch();
    }

    fn handle_play_cards(&mut self, player_id: PlayerId, cards: Vec<Card>) {
        let Some(engine) = self.engine.as_mut() else {
            self.send_error(player_id, RoomError::AlreadyPlaying.into());
            return;
        };
        match engine.play_cards(player_id, cards) {
            Ok(events) => self.dispatch_engine_events(events),
            Err(e) => self.send_error(player_id, e.into()),
        }
        self.arm_auto_timers();
        self.touch();
    }

    fn handle_set_auto(&mut self, player_id: PlayerId, is_auto: bool, reason: AutoReason) {
        if let Some(engine) = self.engine.as_mut() {
            engine.set_auto(player_id, is_auto);
        }
        self.broadcast(ServerEvent::PlayerAutoChanged { player_id, is_auto, reason }, None);
        if is_auto {
            self.arm_auto_timers();
        } else if let Some(handle) = self.auto_timers.remove(&player_id) {
            handle.abort();
        }
    }

    fn handle_ping(&mut self, player_id: PlayerId) {
        if let Some(session) = self.players.get_mut(&player_id) {
            session.update_heartbeat();
            session.send(ServerEvent::Pong {});
        }
    }

    fn handle_disconnect(&mut self, player_id: PlayerId) {
        let Some(mut session) = self.players.remove(&player_id) else { return };
        if self.state == RoomLifecycle::Playing {
            session.is_connected = false;
            self.disconnected_players.insert(player_id, session);
            self.broadcast(ServerEvent::PlayerLeft { player_id }, None);
            self.handle_set_auto(player_id, true, AutoReason::Disconnect);
        } else {
            let was_host = session.is_host;
            self.seat_order.retain(|&id| id != player_id);
            self.broadcast(ServerEvent::PlayerLeft { player_id }, None);
            if was_host {
                if let Some(&new_host) = self.seat_order.first() {
                    self.host_id = Some(new_host);
                    if let Some(s) = self.players.get_mut(&new_host) {
                        s.is_host = true;
                    }
                    self.broadcast(ServerEvent::HostChanged { new_host_id: new_host }, None);
                } else {
                    self.host_id = None;
                }
            }
            self.recompute_lifecycle();
        }
        self.touch();
    }

    fn handle_idle_sweep(&mut self) -> SweepOutcome {
        use crate::constants::{DISCONNECT_TIMEOUT, ROOM_IDLE_TIMEOUT};

        let stale_live: Vec<PlayerId> = self
            .players
            .iter()
            .filter(|(_, s)| s.is_timed_out(DISCONNECT_TIMEOUT))
            .map(|(id, _)| *id)
            .collect();
        for id in stale_live {
            self.handle_disconnect(id);
        }

        let expired_disconnects: Vec<PlayerId> = self
            .disconnected_players
            .iter()
            .filter(|(_, s)| s.is_timed_out(RECONNECT_WINDOW))
            .map(|(id, _)| *id)
            .collect();
        for id in expired_disconnects {
            self.disconnected_players.remove(&id);
            self.seat_order.retain(|&sid| sid != id);
        }

        let empty = self.players.is_empty() && self.disconnected_players.is_empty();
        let idle_too_long = self.last_activity_at.elapsed() > ROOM_IDLE_TIMEOUT;
        SweepOutcome { should_drop: empty || idle_too_long }
    }

    // ---- timers ----

    fn schedule_round_timer(&mut self, delay: std::time::Duration, timer: RoomTimer) {
        if let Some(handle) = self.round_timer.take() {
            handle.abort();
        }
        let tx = self.self_sender.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(RoomMessage::Timer(timer)).await;
        });
        self.round_timer = Some(handle.abort_handle());
    }

    fn arm_auto_timers(&mut self) {
        let Some(engine) = self.engine.as_ref() else { return };
        for player_id in engine.pending_actors() {
            let is_auto = self.players.get(&player_id).map(|_| true).unwrap_or(false)
                && engine.players.get(&player_id).is_some_and(|p| p.is_auto);
            if !is_auto {
                continue;
            }
            if let Some(handle) = self.auto_timers.remove(&player_id) {
                handle.abort();
            }
            let tx = self.self_sender.clone();
            let handle = tokio::spawn(async move {
                tokio::time::sleep(AUTO_PLAY_DELIBERATION).await;
                let _ = tx.send(RoomMessage::Timer(RoomTimer::AutoPlay(player_id))).await;
            });
            self.auto_timers.insert(player_id, handle.abort_handle());
        }
    }

    fn handle_timer(&mut self, timer: RoomTimer) {
        match timer {
            RoomTimer::Deal => {
                if let Some(engine) = self.engine.as_mut() {
                    let events = engine.deal();
                    self.dispatch_engine_events(events);
                    self.arm_auto_timers();
                }
            }
            RoomTimer::Refill => {
                if let Some(engine) = self.engine.as_mut() {
                    let events = engine.refill();
                    let now_over = matches!(engine.state, EngineState::GameOver);
                    self.dispatch_engine_events(events);
                    if now_over {
                        self.state = RoomLifecycle::Finished;
                        self.schedule_round_timer(END_OF_GAME_DELAY, RoomTimer::EndOfGame);
                    } else {
                        self.arm_auto_timers();
                    }
                }
            }
            RoomTimer::EndOfGame => {
                // A unanimous restart_game ack may have already moved the room to Ready.
                if self.state == RoomLifecycle::Finished {
                    for session in self.players.values_mut() {
                        session.is_ready = false;
                    }
                    self.restart_acks.clear();
                    self.state = RoomLifecycle::Waiting;
                }
            }
            RoomTimer::AutoPlay(player_id) => self.run_auto_play(player_id),
        }
        self.touch();
    }

    fn run_auto_play(&mut self, player_id: PlayerId) {
        let Some(engine) = self.engine.as_ref() else { return };
        if !engine.pending_actors().contains(&player_id) {
            return;
        }
        let strategy = engine.strategy();
        let hand = engine.hand_of(player_id).map(|h| h.to_vec()).unwrap_or_default();
        let community = engine.community_cards.clone();

        match engine.state {
            EngineState::FirstDealerSelection => {
                let card = strategy.select_first_dealer_card(&hand);
                self.handle_select_first_dealer_card(player_id, card);
            }
            EngineState::DealerCall => {
                let n = strategy.dealer_call(&hand, &community);
                self.handle_dealer_call(player_id, n);
            }
            EngineState::PlayerSelection => {
                let to_play = self.engine.as_ref().and_then(|e| e.current_round.as_ref()).map(|r| r.cards_to_play).unwrap_or(1);
                let cards = strategy.select_play_cards(&hand, to_play);
                self.handle_play_cards(player_id, cards);
            }
            _ => {}
        }
    }

    fn abort_all_timers(&mut self) {
        if let Some(handle) = self.round_timer.take() {
            handle.abort();
        }
        for (_, handle) in self.auto_timers.drain() {
            handle.abort();
        }
    }

    // ---- event/error fan-out ----

    fn broadcast(&self, event: ServerEvent, exclude: Option<PlayerId>) {
        for (id, session) in &self.players {
            if Some(*id) == exclude {
                continue;
            }
            session.send(event.clone());
        }
    }

    fn send_error(&self, player_id: PlayerId, error: crate::error::CommandError) {
        if let Some(session) = self.players.get(&player_id) {
            session.send(ServerEvent::Error { code: error.code(), message: error.message() });
        }
    }

    fn dispatch_engine_events(&mut self, events: Vec<EngineEvent>) {
        for event in events {
            self.dispatch_one(event);
        }
    }

    fn dispatch_one(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::CommunityCardsRevealed { cards } => {
                self.broadcast(
                    ServerEvent::CommunityCards {
                        cards: cards.iter().map(|c| c.byte()).collect(),
                        game_state: current_state_name(&self.engine),
                    },
                    None,
                );
            }
            EngineEvent::HandDealt { player_id, hand, deck_size } => {
                if let Some(session) = self.players.get(&player_id) {
                    session.send(ServerEvent::DealCards {
                        player_id,
                        hand_cards: hand.iter().map(|c| c.byte()).collect(),
                        deck_size,
                    });
                }
            }
            EngineEvent::WaitingForFirstDealerSelection => {
                self.broadcast(
                    ServerEvent::RequestFirstDealerSelection { game_state: current_state_name(&self.engine) },
                    None,
                );
            }
            EngineEvent::PlayerSelectedCard { player_id } => {
                self.broadcast(ServerEvent::PlayerSelectedCard { player_id }, None);
            }
            EngineEvent::FirstDealerRevealed { selections, dealer_id } => {
                self.broadcast(
                    ServerEvent::FirstDealerReveal {
                        selections: selections.into_iter().map(|(id, c)| (id, c.byte())).collect(),
                        dealer_id,
                        game_state: current_state_name(&self.engine),
                    },
                    None,
                );
            }
            EngineEvent::DealerAssigned { dealer_id, round_number } => {
                self.broadcast(
                    ServerEvent::DealerSelected { dealer_id, round_number, game_state: current_state_name(&self.engine) },
                    None,
                );
            }
            EngineEvent::DealerCalled { dealer_id, cards_to_play } => {
                self.broadcast(
                    ServerEvent::DealerCalled { dealer_id, cards_to_play, game_state: current_state_name(&self.engine) },
                    None,
                );
            }
            EngineEvent::PlayerPlayed { player_id, card_count } => {
                self.broadcast(ServerEvent::PlayerPlayed { player_id, card_count }, None);
            }
            EngineEvent::ShowdownResolved { results } => {
                let view = results
                    .into_iter()
                    .map(|(player_id, result, is_winner)| ShowdownResult {
                        player_id,
                        cards: result.cards.iter().map(|c| c.byte()).collect(),
                        hand_type: result.hand_type,
                        hand_type_name: result.hand_type.to_string(),
                        score: result.hand_type.base_score() + if is_winner { 1 } else { 0 },
                        is_winner,
                    })
                    .collect();
                self.broadcast(
                    ServerEvent::Showdown { results: view, game_state: current_state_name(&self.engine) },
                    None,
                );
            }
            EngineEvent::RoundEnded { winner_id, loser_id, scores } => {
                self.broadcast(
                    ServerEvent::RoundEnd { winner_id, loser_id, scores, game_state: current_state_name(&self.engine) },
                    None,
                );
                self.schedule_round_timer(SCORING_TO_REFILL_DELAY, RoomTimer::Refill);
            }
            EngineEvent::HandsRefilled { hands, deck_size } => {
                for (player_id, hand) in hands {
                    if let Some(session) = self.players.get(&player_id) {
                        session.send(ServerEvent::DealCards {
                            player_id,
                            hand_cards: hand.iter().map(|c| c.byte()).collect(),
                            deck_size,
                        });
                    }
                }
            }
            EngineEvent::GameOver { winner_id, scores, total_rounds } => {
                self.broadcast(ServerEvent::GameOver { winner_id, scores, total_rounds }, None);
            }
        }
    }

    /// Snapshot sufficient for `game_state_update`, used on reconnect / resync.
    pub fn snapshot(&self) -> Option<RoomSnapshot> {
        let engine = self.engine.as_ref()?;
        let round = engine.current_round.as_ref();
        let players = self
            .seat_order
            .iter()
            .map(|id| PlayerSnapshot {
                id: *id,
                card_count: engine.hand_of(*id).map(|h| h.len()).unwrap_or(0),
                is_ready: self.players.get(id).map(|s| s.is_ready).unwrap_or(false),
                is_turn: engine.pending_actors().contains(id),
                seat_index: self.players.get(id).map(|s| s.seat_index).unwrap_or(0),
            })
            .collect();
        Some(RoomSnapshot {
            state: current_state_name(&self.engine),
            round_number: round.map_or(0, |r| r.round_number),
            dealer_id: round.map(|r| r.dealer_id),
            cards_to_play: round.and_then(|r| (r.cards_to_play != 0).then_some(r.cards_to_play)),
            deck_size: engine.deck.remaining(),
            players,
        })
    }

    pub fn info(&self) -> (String, usize, RoomLifecycle) {
        (self.config.game_mode.clone(), self.players.len(), self.state)
    }
}

/// Full per-room state, handed to a reconnecting player so its client can
/// resync whose turn it is without replaying every event since disconnect.
pub struct RoomSnapshot {
    pub state: EngineStateName,
    pub round_number: u32,
    pub dealer_id: Option<PlayerId>,
    pub cards_to_play: Option<u8>,
    pub deck_size: usize,
    pub players: Vec<PlayerSnapshot>,
}

impl RoomSnapshot {
    fn into_event(self) -> ServerEvent {
        ServerEvent::GameStateUpdate {
            state: self.state,
            round_number: self.round_number,
            dealer_id: self.dealer_id,
            cards_to_play: self.cards_to_play,
            deck_size: self.deck_size,
            players: self.players,
        }
    }
}

fn current_state_name(engine: &Option<Engine>) -> EngineStateName {
    match engine.as_ref().map(|e| e.state) {
        Some(EngineState::Setup) | None => EngineStateName::Setup,
        Some(EngineState::FirstDealerSelection) => EngineStateName::FirstDealerSelection,
        Some(EngineState::DealerCall) => EngineStateName::DealerCall,
        Some(EngineState::PlayerSelection) => EngineStateName::PlayerSelection,
        Some(EngineState::Showdown) => EngineStateName::Showdown,
        Some(EngineState::Scoring) => EngineStateName::Scoring,
        Some(EngineState::Refill) => EngineStateName::Refill,
        Some(EngineState::GameOver) => EngineStateName::GameOver,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autoplay::Conservative;

    fn bare_actor(max_players: usize) -> RoomActor {
        let (tx, rx) = mpsc::channel(128);
        RoomActor {
            room_id: RoomId::new_v4(),
            config: RoomConfig { game_mode: "classic".to_string(), max_players },
            state: RoomLifecycle::Waiting,
            seat_order: Vec::new(),
            players: HashMap::new(),
            disconnected_players: HashMap::new(),
            host_id: None,
            engine: None,
            strategy: Arc::new(Conservative),
            restart_acks: HashSet::new(),
            created_at: Instant::now(),
            last_activity_at: Instant::now(),
            inbox: rx,
            self_sender: tx,
            round_timer: None,
            auto_timers: HashMap::new(),
        }
    }

    fn seat(actor: &mut RoomActor, name: &str) -> PlayerId {
        let player_id = PlayerId::new_v4();
        let (transport, _rx) = mpsc::unbounded_channel();
        actor.handle_join(player_id, name.to_string(), None, transport).unwrap();
        player_id
    }

    /// A stale `EndOfGame` timer firing after every player already acked
    /// `restart_game` (moving the room to `Ready`) must not regress it back to
    /// `Waiting` or wipe the ready flags the acks just set.
    #[test]
    fn stale_end_of_game_timer_does_not_clobber_a_room_already_moved_to_ready() {
        let mut actor = bare_actor(2);
        let a = seat(&mut actor, "A");
        let b = seat(&mut actor, "B");
        actor.state = RoomLifecycle::Finished;

        actor.handle_restart_game(a);
        actor.handle_restart_game(b);
        assert_eq!(actor.state, RoomLifecycle::Ready);
        assert!(actor.players[&a].is_ready);
        assert!(actor.players[&b].is_ready);

        actor.handle_timer(RoomTimer::EndOfGame);

        assert_eq!(actor.state, RoomLifecycle::Ready, "stale timer must not regress an already-Ready room");
        assert!(actor.players[&a].is_ready, "stale timer must not clear ready flags set by restart acks");
        assert!(actor.players[&b].is_ready);
    }

    /// When the timer legitimately wins the race (no acks yet), it still does
    /// its normal job: reset readiness and send the room back to `Waiting`.
    #[test]
    fn end_of_game_timer_resets_room_when_no_restart_acks_came_in_first() {
        let mut actor = bare_actor(2);
        let a = seat(&mut actor, "A");
        let b = seat(&mut actor, "B");
        actor.state = RoomLifecycle::Finished;

        actor.handle_timer(RoomTimer::EndOfGame);

        assert_eq!(actor.state, RoomLifecycle::Waiting);
        assert!(!actor.players[&a].is_ready);
        assert!(!actor.players[&b].is_ready);
    }
}
