//! Admin HTTP API tests, driven through the router without a listener.

mod test_helpers;

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use serde_json::{json, Value};
use tower::util::ServiceExt;
use uuid::Uuid;

use trivion::protocol::Role;
use trivion::server::TrivionServer;

use test_helpers::{create_test_server, test_config};

async fn api(server: &Arc<TrivionServer>, method: &str, uri: &str, body: Option<Value>) -> Value {
    let app = trivion::websocket::create_router("*").with_state(server.clone());
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.oneshot(request).await.expect("request handled");
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body read");
    serde_json::from_slice(&bytes).expect("JSON body")
}

fn question_body(time_limit: u64) -> Value {
    json!({
        "text": "2+2",
        "options": ["3", "4", "5", "6"],
        "correct": 1,
        "time_limit": time_limit,
    })
}

/// Create a room with an administrator and one player seated.
async fn seeded_room(server: &Arc<TrivionServer>) -> String {
    let (code, shared) = server
        .registry()
        .create("Math", true, None)
        .await
        .expect("room created");
    let mut room = shared.lock().await;
    let config = room.config().game.clone();
    room.members
        .add("Host", Role::Administrator, Uuid::new_v4(), false, &config)
        .unwrap();
    room.members
        .add("Alice", Role::Player, Uuid::new_v4(), false, &config)
        .unwrap();
    code
}

#[tokio::test]
async fn question_crud_respects_deadline_bounds_and_phase() {
    let server = create_test_server(test_config());
    let code = seeded_room(&server).await;

    // Deadline boundaries: 5 and 60 accepted, 4 and 61 rejected.
    for (time_limit, accepted) in [(5, true), (60, true), (4, false), (61, false)] {
        let reply = api(
            &server,
            "POST",
            &format!("/api/rooms/{code}/questions"),
            Some(question_body(time_limit)),
        )
        .await;
        let expected = if accepted { "ok" } else { "error" };
        assert_eq!(reply["status"], expected, "time_limit={time_limit}");
    }

    let reply = api(&server, "GET", &format!("/api/rooms/{code}/questions"), None).await;
    assert_eq!(reply["status"], "ok");
    assert_eq!(reply["questions"].as_array().unwrap().len(), 2);

    // Remove the second question.
    let reply = api(
        &server,
        "DELETE",
        &format!("/api/rooms/{code}/questions/1"),
        None,
    )
    .await;
    assert_eq!(reply["status"], "ok");
    let reply = api(&server, "GET", &format!("/api/rooms/{code}/questions"), None).await;
    assert_eq!(reply["questions"].as_array().unwrap().len(), 1);

    // Once the game starts the bank is frozen.
    let reply = api(&server, "POST", &format!("/api/rooms/{code}/game/start"), None).await;
    assert_eq!(reply["status"], "ok");
    let reply = api(
        &server,
        "POST",
        &format!("/api/rooms/{code}/questions"),
        Some(question_body(20)),
    )
    .await;
    assert_eq!(reply["status"], "error");
    assert!(reply["message"].as_str().unwrap().contains("lobby"));
}

#[tokio::test]
async fn game_controls_mirror_the_socket_commands() {
    let server = create_test_server(test_config());
    let code = seeded_room(&server).await;

    // Starting an empty bank fails.
    let reply = api(&server, "POST", &format!("/api/rooms/{code}/game/start"), None).await;
    assert_eq!(reply["status"], "error");

    let reply = api(
        &server,
        "POST",
        &format!("/api/rooms/{code}/questions"),
        Some(question_body(10)),
    )
    .await;
    assert_eq!(reply["status"], "ok");

    let reply = api(&server, "POST", &format!("/api/rooms/{code}/game/start"), None).await;
    assert_eq!(reply["status"], "ok");
    let reply = api(&server, "GET", &format!("/api/rooms/{code}/game/state"), None).await;
    assert_eq!(reply["state"]["phase"], "countdown");

    // `next` is illegal outside results.
    let reply = api(&server, "POST", &format!("/api/rooms/{code}/game/next"), None).await;
    assert_eq!(reply["status"], "error");

    // `end` returns the room to the lobby from any phase.
    let reply = api(&server, "POST", &format!("/api/rooms/{code}/game/end"), None).await;
    assert_eq!(reply["status"], "ok");
    let reply = api(&server, "GET", &format!("/api/rooms/{code}/game/state"), None).await;
    assert_eq!(reply["state"]["phase"], "lobby");

    // back-to-lobby only applies on the leaderboard.
    let reply = api(
        &server,
        "POST",
        &format!("/api/rooms/{code}/game/back-to-lobby"),
        None,
    )
    .await;
    assert_eq!(reply["status"], "error");
}

#[tokio::test]
async fn room_listing_and_deletion() {
    let server = create_test_server(test_config());
    let code = seeded_room(&server).await;

    let reply = api(&server, "GET", "/api/rooms", None).await;
    assert_eq!(reply["status"], "ok");
    let rooms = reply["rooms"].as_array().unwrap();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0]["code"].as_str().unwrap(), code);
    assert_eq!(rooms[0]["players"], 1);

    let reply = api(&server, "DELETE", &format!("/api/rooms/{code}"), None).await;
    assert_eq!(reply["status"], "ok");
    assert!(server.registry().find(&code).await.is_none());

    // Gone means gone.
    let reply = api(&server, "DELETE", &format!("/api/rooms/{code}"), None).await;
    assert_eq!(reply["status"], "error");
    assert!(reply["message"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn member_removal_via_api() {
    let server = create_test_server(test_config());
    let code = seeded_room(&server).await;

    let (alice_id, host_id) = {
        let shared = server.registry().find(&code).await.unwrap();
        let room = shared.lock().await;
        (
            room.members.find_by_name("Alice").unwrap().id,
            room.members.find_by_name("Host").unwrap().id,
        )
    };

    // The administrator cannot be removed through this endpoint.
    let reply = api(
        &server,
        "DELETE",
        &format!("/api/rooms/{code}/members/{host_id}"),
        None,
    )
    .await;
    assert_eq!(reply["status"], "error");

    let reply = api(
        &server,
        "DELETE",
        &format!("/api/rooms/{code}/members/{alice_id}"),
        None,
    )
    .await;
    assert_eq!(reply["status"], "ok");

    let shared = server.registry().find(&code).await.unwrap();
    let room = shared.lock().await;
    assert!(room.members.find(alice_id).is_none());
    assert!(room.members.find(host_id).is_some());
}
