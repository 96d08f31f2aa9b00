use crate::interface_adapters::http::error_response;
use crate::interface_adapters::net::serializer::spawn_room_serializer;
use crate::interface_adapters::state::AppState;
use crate::use_cases::{MapConfig, RoomError};

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

#[derive(Debug, serde::Deserialize)]
pub struct RoomInitRequest {
    room_id: String,
    // Optional map override; the server's configured map is used when absent.
    #[serde(default)]
    map: Option<MapConfig>,
}

#[derive(Debug, serde::Serialize)]
struct RoomInitResponse {
    room_id: String,
}

#[derive(Debug, serde::Serialize)]
struct RoomListResponse {
    room_ids: Vec<String>,
}

pub async fn create_room_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RoomInitRequest>,
) -> impl IntoResponse {
    let room_id = payload.room_id.trim().to_string();
    if room_id.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "room_id is required");
    }

    match state
        .room_registry
        .create_room(room_id.clone(), payload.map)
        .await
    {
        Ok(room) => {
            // Create serializers so clients can subscribe immediately.
            spawn_room_serializer(&room);
            (StatusCode::CREATED, Json(RoomInitResponse { room_id })).into_response()
        }
        Err(RoomError::AlreadyExists(_)) => {
            error_response(StatusCode::CONFLICT, "room already exists")
        }
        Err(RoomError::InitFailed(e)) => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("room initialization failed: {e:?}"),
        ),
        Err(RoomError::NotFound(_)) => error_response(StatusCode::NOT_FOUND, "room not found"),
    }
}

pub async fn list_rooms_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let room_ids = state.room_registry.room_ids().await;
    Json(RoomListResponse { room_ids })
}

pub async fn dispose_room_handler(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> impl IntoResponse {
    if room_id == *state.default_room_id {
        return error_response(StatusCode::FORBIDDEN, "default room cannot be disposed");
    }
    match state.room_registry.dispose_room(&room_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(_) => error_response(StatusCode::NOT_FOUND, "room not found"),
    }
}
