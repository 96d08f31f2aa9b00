// WebSocket sessions: one per connected player. Client messages become room events;
// encoded world updates and status changes flow back out.

use crate::domain::PlayerInput;
use crate::interface_adapters::http::error_response;
use crate::interface_adapters::net::handshake::{self, Rejection};
use crate::interface_adapters::protocol::{ClientMessage, ServerMessage};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::ids::{next_player_id, next_session_id};
use crate::use_cases::{GameEvent, RoomHandle, RoomStatus};

use axum::{
    extract::{
        Query, State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{Instrument, Span, debug, info, info_span, warn};

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;

#[derive(Debug)]
enum NetError {
    Handshake(Rejection),
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    InputClosed,
    WorldUpdatesClosed,
    StatusClosed,
}

#[derive(Debug, serde::Deserialize)]
pub struct RoomQuery {
    #[serde(default)]
    room_id: Option<String>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<RoomQuery>,
) -> impl IntoResponse {
    let room_id = query
        .room_id
        .unwrap_or_else(|| state.default_room_id.to_string());

    match state.room_registry.get_room(&room_id).await {
        Some(room) => ws.on_upgrade(move |socket| handle_socket(socket, room)),
        None => error_response(StatusCode::NOT_FOUND, "room not found"),
    }
}

/// Receivers taken before the join completes, so no update published meanwhile is lost.
struct Feeds {
    world_bytes_rx: broadcast::Receiver<Utf8Bytes>,
    world_latest_rx: watch::Receiver<Utf8Bytes>,
    status_rx: watch::Receiver<RoomStatus>,
}

impl Feeds {
    fn subscribe(room: &RoomHandle) -> Self {
        Self {
            world_bytes_rx: room.world_bytes_tx.subscribe(),
            world_latest_rx: room.world_latest_tx.subscribe(),
            status_rx: room.status_tx.subscribe(),
        }
    }
}

/// Rate limit for a repetitive warning.
struct Throttle {
    last: Instant,
}

impl Throttle {
    fn new() -> Self {
        Self {
            last: Instant::now()
                .checked_sub(LOG_THROTTLE)
                .unwrap_or_else(Instant::now),
        }
    }

    fn ready(&mut self) -> bool {
        if self.last.elapsed() < LOG_THROTTLE {
            return false;
        }
        self.last = Instant::now();
        true
    }
}

#[derive(Debug, Default)]
struct Traffic {
    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,
    invalid_json: u32,
    resyncs: u64,
}

enum Flow {
    Continue,
    /// End the session, optionally telling the client why.
    Close(Option<CloseFrame>),
}

fn close(code: u16, reason: &'static str) -> Flow {
    Flow::Close(Some(CloseFrame {
        code,
        reason: reason.into(),
    }))
}

async fn handle_socket(socket: WebSocket, room: RoomHandle) {
    let span = info_span!(
        "session",
        session_id = next_session_id(),
        room_id = %room.room_id,
        player_id = tracing::field::Empty
    );
    serve(socket, room).instrument(span).await;
}

async fn serve(mut socket: WebSocket, room: RoomHandle) {
    let mut feeds = Feeds::subscribe(&room);
    let mut session = match Session::open(&mut socket, &room, &feeds).await {
        Ok(session) => session,
        Err(NetError::Handshake(Rejection::Closed)) => {
            info!("client disconnected before join");
            return;
        }
        Err(NetError::Handshake(rejection)) => {
            warn!(reason = %rejection, "join rejected");
            shutdown(&mut socket, rejection.close_frame()).await;
            return;
        }
        Err(e) => {
            warn!(error = ?e, "session rejected");
            let frame = CloseFrame {
                code: close_code::ERROR,
                reason: "join failed".into(),
            };
            shutdown(&mut socket, Some(frame)).await;
            return;
        }
    };
    Span::current().record("player_id", session.player_id);

    if let Err(e) = session.run(&mut socket, &mut feeds).await {
        warn!(error = ?e, "session ended with error");
    }
    session.finish().await;
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let len = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(len)
}

async fn shutdown(socket: &mut WebSocket, frame: Option<CloseFrame>) {
    if let Some(frame) = frame {
        let _ = socket.send(Message::Close(Some(frame))).await;
    }
    if let Err(e) = socket.close().await {
        debug!(error = ?e, "socket close error");
    }
}

struct Session {
    player_id: u64,
    input_tx: mpsc::Sender<GameEvent>,
    traffic: Traffic,
    input_full_log: Throttle,
    invalid_log: Throttle,
    lag_log: Throttle,
}

impl Session {
    /// Join handshake, identity, then the room's current status.
    async fn open(
        socket: &mut WebSocket,
        room: &RoomHandle,
        feeds: &Feeds,
    ) -> Result<Self, NetError> {
        let join = handshake::read_join(socket)
            .await
            .map_err(NetError::Handshake)?;

        let player_id = next_player_id();
        let display_name = join
            .display_name
            .as_deref()
            .and_then(handshake::sanitize_display_name)
            .unwrap_or_else(|| format!("player-{player_id}"));

        send_message(
            socket,
            &ServerMessage::Identity {
                player_id: player_id.to_string(),
            },
        )
        .await?;

        room.input_tx
            .send(GameEvent::Join {
                player_id,
                display_name: display_name.clone(),
                bot_mode: join.bot_mode,
            })
            .await
            .map_err(|_| NetError::InputClosed)?;

        let session = Self {
            player_id,
            input_tx: room.input_tx.clone(),
            traffic: Traffic {
                msgs_in: 1,
                bytes_in: join.bytes_in,
                ..Traffic::default()
            },
            input_full_log: Throttle::new(),
            invalid_log: Throttle::new(),
            lag_log: Throttle::new(),
        };

        // The player is in the room now; undo that if the client is already unreachable.
        let status = *feeds.status_rx.borrow();
        if let Err(e) = send_message(socket, &ServerMessage::RoomStatus(status.into())).await {
            session.finish().await;
            return Err(e);
        }

        info!(
            player_id,
            display_name = %display_name,
            bot_mode = join.bot_mode,
            "player session opened"
        );
        Ok(session)
    }

    async fn run(&mut self, socket: &mut WebSocket, feeds: &mut Feeds) -> Result<(), NetError> {
        loop {
            let flow = tokio::select! {
                incoming = socket.recv() => self.on_incoming(incoming)?,

                world = feeds.world_bytes_rx.recv() => match world {
                    Ok(bytes) => self.send_world(socket, bytes).await,
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        if self.lag_log.ready() {
                            warn!(missed, "world updates lagged; resending latest");
                        }
                        let latest = feeds.world_latest_rx.borrow().clone();
                        if latest.is_empty() {
                            Flow::Continue
                        } else {
                            self.traffic.resyncs += 1;
                            self.send_world(socket, latest).await
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(NetError::WorldUpdatesClosed);
                    }
                },

                changed = feeds.status_rx.changed() => {
                    if changed.is_err() {
                        return Err(NetError::StatusClosed);
                    }
                    let status = *feeds.status_rx.borrow();
                    match self.send_status(socket, status).await {
                        Flow::Continue if status == RoomStatus::Stopped => {
                            close(close_code::AWAY, "room closed")
                        }
                        flow => flow,
                    }
                }
            };

            if let Flow::Close(frame) = flow {
                shutdown(socket, frame).await;
                return Ok(());
            }
        }
    }

    fn on_incoming(
        &mut self,
        incoming: Option<Result<Message, axum::Error>>,
    ) -> Result<Flow, NetError> {
        let message = match incoming {
            Some(Ok(message)) => message,
            Some(Err(e)) => {
                warn!(error = %e, "websocket recv error");
                return Ok(Flow::Close(None));
            }
            None => return Ok(Flow::Close(None)),
        };
        match message {
            Message::Text(text) => {
                self.traffic.msgs_in += 1;
                self.traffic.bytes_in += text.len() as u64;
                self.on_text(&text)
            }
            Message::Binary(_) => Ok(close(
                close_code::UNSUPPORTED,
                "binary messages not supported",
            )),
            Message::Ping(_) | Message::Pong(_) => Ok(Flow::Continue),
            Message::Close(_) => Ok(Flow::Close(None)),
        }
    }

    fn on_text(&mut self, text: &str) -> Result<Flow, NetError> {
        let player_id = self.player_id;
        let event = match serde_json::from_str::<ClientMessage>(text) {
            Ok(ClientMessage::Join(_)) => {
                if self.invalid_log.ready() {
                    warn!(player_id, "repeated join ignored");
                }
                return Ok(Flow::Continue);
            }
            Ok(ClientMessage::Input(dto)) => match PlayerInput::try_from(dto) {
                Ok(input) => GameEvent::Input { player_id, input },
                Err(_) => {
                    if self.invalid_log.ready() {
                        warn!(player_id, "non-finite input dropped");
                    }
                    return Ok(Flow::Continue);
                }
            },
            Ok(ClientMessage::SetBotMode(payload)) => GameEvent::SetBotMode {
                player_id,
                enabled: payload.enabled,
            },
            Err(e) => {
                self.traffic.invalid_json += 1;
                if self.invalid_log.ready() {
                    warn!(
                        player_id,
                        bytes = text.len(),
                        error = %e,
                        "unparseable client message"
                    );
                }
                if self.traffic.invalid_json > MAX_INVALID_JSON {
                    return Ok(close(close_code::POLICY, "too many invalid messages"));
                }
                return Ok(Flow::Continue);
            }
        };
        self.forward(event)
    }

    /// Never waits on the room: a full queue drops the event.
    fn forward(&mut self, event: GameEvent) -> Result<Flow, NetError> {
        match self.input_tx.try_send(event) {
            Ok(()) => Ok(Flow::Continue),
            Err(TrySendError::Full(_)) => {
                if self.input_full_log.ready() {
                    warn!(player_id = self.player_id, "room input queue full; dropping event");
                }
                Ok(Flow::Continue)
            }
            Err(TrySendError::Closed(_)) => Err(NetError::InputClosed),
        }
    }

    async fn send_world(&mut self, socket: &mut WebSocket, bytes: Utf8Bytes) -> Flow {
        let len = bytes.len() as u64;
        match socket.send(Message::Text(bytes)).await {
            Ok(()) => {
                self.traffic.msgs_out += 1;
                self.traffic.bytes_out += len;
                Flow::Continue
            }
            Err(e) => {
                debug!(error = ?e, "failed to send world update");
                Flow::Close(None)
            }
        }
    }

    async fn send_status(&mut self, socket: &mut WebSocket, status: RoomStatus) -> Flow {
        match send_message(socket, &ServerMessage::RoomStatus(status.into())).await {
            Ok(len) => {
                self.traffic.msgs_out += 1;
                self.traffic.bytes_out += len as u64;
                Flow::Continue
            }
            Err(e) => {
                debug!(error = ?e, "failed to send room status");
                Flow::Close(None)
            }
        }
    }

    /// Removes the player from the room. A closed room needs no Leave.
    async fn finish(self) {
        let Traffic {
            msgs_in,
            msgs_out,
            bytes_in,
            bytes_out,
            invalid_json,
            resyncs,
        } = self.traffic;
        debug!(
            msgs_in,
            msgs_out,
            bytes_in,
            bytes_out,
            invalid_json,
            resyncs,
            "session traffic"
        );
        info!(player_id = self.player_id, "player session closed");

        let leave = GameEvent::Leave {
            player_id: self.player_id,
        };
        if self.input_tx.send(leave).await.is_err() {
            debug!(player_id = self.player_id, "room gone before leave");
        }
    }
}
