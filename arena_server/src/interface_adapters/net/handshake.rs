// First exchange on a new socket: the client must open with a Join before anything else.

use crate::interface_adapters::protocol::ClientMessage;

use axum::extract::ws::{CloseFrame, Message, WebSocket, close_code};
use std::fmt;
use std::time::Duration;
use tokio::time::timeout;

pub const JOIN_TIMEOUT: Duration = Duration::from_secs(5);
pub const MAX_DISPLAY_NAME_LEN: usize = 32;

#[derive(Debug)]
pub struct JoinRequest {
    pub display_name: Option<String>,
    pub bot_mode: bool,
    pub bytes_in: u64,
}

/// Why a socket never got past the join step.
#[derive(Debug)]
pub enum Rejection {
    Timeout,
    NotJoin,
    InvalidPayload(serde_json::Error),
    Binary,
    /// The peer went away; nothing is left to answer.
    Closed,
    Ws(axum::Error),
}

impl Rejection {
    pub fn close_frame(&self) -> Option<CloseFrame> {
        let (code, reason) = match self {
            Rejection::Timeout => (close_code::POLICY, "join timeout"),
            Rejection::NotJoin => (close_code::POLICY, "join required"),
            Rejection::InvalidPayload(_) => (close_code::POLICY, "invalid join payload"),
            Rejection::Binary => (close_code::UNSUPPORTED, "binary messages not supported"),
            Rejection::Closed | Rejection::Ws(_) => return None,
        };
        Some(CloseFrame {
            code,
            reason: reason.into(),
        })
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Timeout => write!(f, "no join within {}s", JOIN_TIMEOUT.as_secs()),
            Rejection::NotJoin => f.write_str("first message was not a join"),
            Rejection::InvalidPayload(e) => write!(f, "invalid join payload: {e}"),
            Rejection::Binary => f.write_str("binary frame before join"),
            Rejection::Closed => f.write_str("peer closed before join"),
            Rejection::Ws(e) => write!(f, "websocket error before join: {e}"),
        }
    }
}

/// Waits for the opening Join. Pings and pongs in front of it are skipped.
pub async fn read_join(socket: &mut WebSocket) -> Result<JoinRequest, Rejection> {
    timeout(JOIN_TIMEOUT, next_join(socket))
        .await
        .unwrap_or(Err(Rejection::Timeout))
}

async fn next_join(socket: &mut WebSocket) -> Result<JoinRequest, Rejection> {
    while let Some(incoming) = socket.recv().await {
        let text = match incoming.map_err(Rejection::Ws)? {
            Message::Text(text) => text,
            Message::Binary(_) => return Err(Rejection::Binary),
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Close(_) => return Err(Rejection::Closed),
        };
        return match serde_json::from_str::<ClientMessage>(&text) {
            Ok(ClientMessage::Join(payload)) => Ok(JoinRequest {
                display_name: payload.display_name,
                bot_mode: payload.bot_mode,
                bytes_in: text.len() as u64,
            }),
            Ok(_) => Err(Rejection::NotJoin),
            Err(e) => Err(Rejection::InvalidPayload(e)),
        };
    }
    Err(Rejection::Closed)
}

/// Trims, drops control characters and caps the length. Blank names become `None`.
pub fn sanitize_display_name(name: &str) -> Option<String> {
    let name: String = name
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_DISPLAY_NAME_LEN)
        .collect();
    if name.is_empty() { None } else { Some(name) }
}
