//! HTTP JSON endpoints consumed by the surrounding admin UI.
//!
//! Every state-changing verb has the same effect as the equivalent
//! administrator socket command and goes through the same room lock. All
//! replies use the `{status: "ok", ...}` / `{status: "error", message}`
//! envelope.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::game::{self, Actor};
use crate::protocol::{GameError, Question};
use crate::server::{Departure, TrivionServer};

pub fn router() -> Router<Arc<TrivionServer>> {
    Router::new()
        .route("/api/rooms", get(list_rooms))
        .route("/api/rooms/{code}", delete(delete_room))
        .route(
            "/api/rooms/{code}/questions",
            get(list_questions).post(add_question).delete(clear_questions),
        )
        .route("/api/rooms/{code}/questions/{index}", delete(delete_question))
        .route("/api/rooms/{code}/game/start", post(start_game))
        .route("/api/rooms/{code}/game/next", post(next_phase))
        .route("/api/rooms/{code}/game/end", post(end_game))
        .route("/api/rooms/{code}/game/back-to-lobby", post(back_to_lobby))
        .route("/api/rooms/{code}/game/state", get(game_state))
        .route("/api/rooms/{code}/members/{id}", delete(remove_member))
}

fn ok() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

fn error(e: &GameError) -> Json<Value> {
    Json(json!({"status": "error", "message": e.to_string()}))
}

fn from_result(result: Result<(), GameError>) -> Json<Value> {
    match result {
        Ok(()) => ok(),
        Err(e) => error(&e),
    }
}

async fn list_rooms(State(server): State<Arc<TrivionServer>>) -> Json<Value> {
    let rooms = server.registry().list_public().await;
    Json(json!({"status": "ok", "rooms": rooms}))
}

async fn list_questions(
    State(server): State<Arc<TrivionServer>>,
    Path(code): Path<String>,
) -> Json<Value> {
    let Some(shared) = server.registry().find(&code).await else {
        return error(&GameError::RoomNotFound);
    };
    let room = shared.lock().await;
    Json(json!({"status": "ok", "questions": room.questions.list()}))
}

async fn add_question(
    State(server): State<Arc<TrivionServer>>,
    Path(code): Path<String>,
    Json(question): Json<Question>,
) -> Json<Value> {
    let Some(shared) = server.registry().find(&code).await else {
        return error(&GameError::RoomNotFound);
    };
    let mut room = shared.lock().await;
    let phase = room.game.phase;
    let config = room.config().game.clone();
    from_result(room.questions.append(question, phase, &config))
}

async fn clear_questions(
    State(server): State<Arc<TrivionServer>>,
    Path(code): Path<String>,
) -> Json<Value> {
    let Some(shared) = server.registry().find(&code).await else {
        return error(&GameError::RoomNotFound);
    };
    let mut room = shared.lock().await;
    let phase = room.game.phase;
    from_result(room.questions.clear(phase))
}

async fn delete_question(
    State(server): State<Arc<TrivionServer>>,
    Path((code, index)): Path<(String, usize)>,
) -> Json<Value> {
    let Some(shared) = server.registry().find(&code).await else {
        return error(&GameError::RoomNotFound);
    };
    let mut room = shared.lock().await;
    let phase = room.game.phase;
    from_result(room.questions.remove(index, phase).map(|_| ()))
}

async fn start_game(
    State(server): State<Arc<TrivionServer>>,
    Path(code): Path<String>,
) -> Json<Value> {
    from_result(game::start_game(server.registry(), &code, Actor::System).await)
}

async fn next_phase(
    State(server): State<Arc<TrivionServer>>,
    Path(code): Path<String>,
) -> Json<Value> {
    from_result(game::advance(server.registry(), &code, Actor::System).await)
}

async fn end_game(
    State(server): State<Arc<TrivionServer>>,
    Path(code): Path<String>,
) -> Json<Value> {
    from_result(game::end_game(server.registry(), &code, Actor::System).await)
}

async fn back_to_lobby(
    State(server): State<Arc<TrivionServer>>,
    Path(code): Path<String>,
) -> Json<Value> {
    from_result(game::back_to_lobby(server.registry(), &code, Actor::System).await)
}

async fn game_state(
    State(server): State<Arc<TrivionServer>>,
    Path(code): Path<String>,
) -> Json<Value> {
    let Some(shared) = server.registry().find(&code).await else {
        return error(&GameError::RoomNotFound);
    };
    let room = shared.lock().await;
    Json(json!({"status": "ok", "state": room.state_payload()}))
}

async fn delete_room(
    State(server): State<Arc<TrivionServer>>,
    Path(code): Path<String>,
) -> Json<Value> {
    if server.registry().find(&code).await.is_none() {
        return error(&GameError::RoomNotFound);
    }
    server.close_room(&code).await;
    ok()
}

async fn remove_member(
    State(server): State<Arc<TrivionServer>>,
    Path((code, id)): Path<(String, String)>,
) -> Json<Value> {
    let Ok(member_id) = Uuid::parse_str(&id) else {
        return error(&GameError::NotConnected);
    };
    from_result(
        server
            .remove_member(
                &code,
                member_id,
                Departure::Removed {
                    by: Actor::System,
                    reason: "Removed by the administrator".to_string(),
                },
            )
            .await,
    )
}
