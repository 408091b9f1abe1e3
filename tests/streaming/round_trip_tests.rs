//! WebSocket round trips against a server on an ephemeral port

use std::time::Duration;

use serde_json::json;

use crate::common::{
    assert_message_type, frame_message, spawn_server, WsClient, DOWN, MID, MISALIGNED, UP,
};

// ============================================================================
// SESSION LIFECYCLE
// ============================================================================

#[tokio::test]
async fn test_full_session_over_websocket() {
    let (addr, _mux) = spawn_server().await;
    let mut client = WsClient::connect(addr).await;

    let started = client
        .request(&json!({"type": "start_session", "session_id": "ws-1"}))
        .await;
    assert_message_type(&started, "session_started");
    assert_eq!(started["session_id"], "ws-1");
    assert_eq!(started["options"]["min_depth_angle"], 90.0);
    assert_eq!(started["options"]["min_extension_angle"], 140.0);

    let down = client.request(&frame_message(DOWN, 0.0)).await;
    assert_message_type(&down, "pose_detected");
    assert_eq!(down["analysis"]["phase"], "down");
    assert_eq!(down["rep_count"], 0);
    assert!(down.get("rep_completed").is_none());

    let up = client.request(&frame_message(UP, 0.0)).await;
    assert_message_type(&up, "pose_detected");
    assert_eq!(up["analysis"]["phase"], "up");
    assert_eq!(up["rep_count"], 1);
    assert_eq!(up["valid_rep_count"], 1);
    assert_eq!(up["rep_completed"], 1);

    let ended = client.request(&json!({"type": "end_session"})).await;
    assert_message_type(&ended, "session_ended");
    let summary = &ended["summary"];
    assert_eq!(summary["session_id"], "ws-1");
    assert_eq!(summary["total_reps"], 1);
    assert_eq!(summary["valid_reps"], 1);
    assert_eq!(summary["total_frames"], 2);
    assert_eq!(summary["valid_frames"], 2);
    assert_eq!(summary["accuracy"], 100.0);
    assert_eq!(summary["feedback"], json!(["Rep 1 completed!"]));

    client.close().await;
}

#[tokio::test]
async fn test_invalid_up_frame_blocks_rep() {
    let (addr, _mux) = spawn_server().await;
    let mut client = WsClient::connect(addr).await;

    client
        .request(&json!({"type": "start_session", "session_id": "ws-invalid"}))
        .await;
    client.request(&frame_message(DOWN, 0.0)).await;
    let up = client.request(&frame_message(UP, MISALIGNED)).await;
    assert_eq!(up["analysis"]["phase"], "up");
    assert_eq!(up["analysis"]["is_valid_pose"], false);
    assert_eq!(up["rep_count"], 0);

    let ended = client.request(&json!({"type": "end_session"})).await;
    assert_eq!(ended["summary"]["total_reps"], 0);
    assert_eq!(ended["summary"]["accuracy"], 50.0);
}

#[tokio::test]
async fn test_transition_between_down_and_up_does_not_count() {
    let (addr, _mux) = spawn_server().await;
    let mut client = WsClient::connect(addr).await;

    client.request(&json!({"type": "start_session"})).await;
    for angle in [DOWN, MID, UP] {
        client.request(&frame_message(angle, 0.0)).await;
    }
    let ended = client.request(&json!({"type": "end_session"})).await;
    assert_eq!(ended["summary"]["total_reps"], 0);
}

#[tokio::test]
async fn test_session_options_change_classification() {
    let (addr, _mux) = spawn_server().await;
    let mut client = WsClient::connect(addr).await;

    let started = client
        .request(&json!({
            "type": "start_session",
            "options": {"min_depth_angle": 60.0, "min_extension_angle": 160.0}
        }))
        .await;
    assert_eq!(started["options"]["min_depth_angle"], 60.0);
    let session_id = started["session_id"].as_str().unwrap().to_string();
    assert!(session_id.starts_with("session_"));

    // 70 degrees is not deep enough for this session
    let frame = client.request(&frame_message(DOWN, 0.0)).await;
    assert_eq!(frame["analysis"]["phase"], "transition");
}

// ============================================================================
// PROTOCOL VIOLATIONS
// ============================================================================

#[tokio::test]
async fn test_frame_without_session_is_rejected() {
    let (addr, mux) = spawn_server().await;
    let mut client = WsClient::connect(addr).await;

    let reply = client.request(&frame_message(DOWN, 0.0)).await;
    assert_message_type(&reply, "pose_error");
    assert_eq!(reply["code"], "no_active_session");
    assert_eq!(mux.engine().service_status().active_sessions, 0);
}

#[tokio::test]
async fn test_end_without_session_is_rejected() {
    let (addr, _mux) = spawn_server().await;
    let mut client = WsClient::connect(addr).await;

    let reply = client.request(&json!({"type": "end_session"})).await;
    assert_message_type(&reply, "error");
    assert_eq!(reply["code"], "no_active_session");
    assert_eq!(reply["status"], 400);
}

#[tokio::test]
async fn test_garbage_does_not_close_connection() {
    let (addr, _mux) = spawn_server().await;
    let mut client = WsClient::connect(addr).await;

    client.send_text("not json".to_string()).await;
    let reply = client.recv_json().await;
    assert_message_type(&reply, "error");
    assert_eq!(reply["code"], "invalid_message");

    let reply = client.request(&json!({"type": "teleport"})).await;
    assert_eq!(reply["code"], "invalid_message");

    let pong = client.request(&json!({"type": "ping"})).await;
    assert_message_type(&pong, "pong");
}

#[tokio::test]
async fn test_estimator_failure_keeps_session() {
    let (addr, _mux) = spawn_server().await;
    let mut client = WsClient::connect(addr).await;

    client
        .request(&json!({"type": "start_session", "session_id": "img"}))
        .await;
    client.request(&frame_message(DOWN, 0.0)).await;

    // The passthrough estimator cannot decode images
    let reply = client
        .request(&json!({"type": "frame", "frame": {"kind": "image", "data": "aGk="}}))
        .await;
    assert_message_type(&reply, "pose_error");
    assert_eq!(reply["code"], "estimator_failure");

    // Counters and last phase are untouched, so the rep still completes
    let up = client.request(&frame_message(UP, 0.0)).await;
    assert_eq!(up["rep_count"], 1);
}

#[tokio::test]
async fn test_empty_landmarks_are_no_pose() {
    let (addr, _mux) = spawn_server().await;
    let mut client = WsClient::connect(addr).await;

    client.request(&json!({"type": "start_session"})).await;
    let reply = client
        .request(&json!({"type": "frame", "frame": {"kind": "landmarks", "landmarks": []}}))
        .await;
    assert_message_type(&reply, "pose_detected");
    assert_eq!(reply["analysis"]["phase"], serde_json::Value::Null);
    assert_eq!(reply["analysis"]["is_valid_pose"], false);
    assert_eq!(reply["analysis"]["feedback"], json!(["No pose detected"]));
}

// ============================================================================
// CONNECTION SCOPE
// ============================================================================

#[tokio::test]
async fn test_disconnect_cleans_up_session() {
    let (addr, mux) = spawn_server().await;
    let mut client = WsClient::connect(addr).await;

    client
        .request(&json!({"type": "start_session", "session_id": "leaving"}))
        .await;
    client.request(&frame_message(DOWN, 0.0)).await;
    assert!(mux.engine().registry().contains("leaving"));

    client.close().await;

    let mut cleaned = false;
    for _ in 0..100 {
        if !mux.engine().registry().contains("leaving") {
            cleaned = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(cleaned, "session survived its connection");
    assert_eq!(mux.bound_connections(), 0);
}

#[tokio::test]
async fn test_results_only_reach_originating_connection() {
    let (addr, _mux) = spawn_server().await;
    let mut alice = WsClient::connect(addr).await;
    let mut bob = WsClient::connect(addr).await;

    alice
        .request(&json!({"type": "start_session", "session_id": "alice"}))
        .await;
    alice.request(&frame_message(DOWN, 0.0)).await;
    alice.request(&frame_message(UP, 0.0)).await;

    // Bob's first message back is the reply to his own ping
    let reply = bob.request(&json!({"type": "ping"})).await;
    assert_message_type(&reply, "pong");

    let reply = bob.request(&frame_message(DOWN, 0.0)).await;
    assert_eq!(reply["code"], "no_active_session");
}

#[tokio::test]
async fn test_query_over_websocket() {
    let (addr, _mux) = spawn_server().await;
    let mut client = WsClient::connect(addr).await;

    client
        .request(&json!({"type": "start_session", "session_id": "q"}))
        .await;
    client.request(&frame_message(DOWN, 0.0)).await;

    let reply = client
        .request(&json!({
            "type": "query",
            "id": 3,
            "method": "get_session_status",
            "params": {"session_id": "q"}
        }))
        .await;
    assert_message_type(&reply, "response");
    assert_eq!(reply["id"], 3);
    assert_eq!(reply["result"]["last_phase"], "down");
    assert_eq!(reply["result"]["total_frames"], 1);

    let reply = client
        .request(&json!({"type": "query", "id": 4, "method": "get_service_status"}))
        .await;
    assert_eq!(reply["result"]["active_sessions"], 1);
    assert_eq!(reply["result"]["estimator"], "passthrough");

    let reply = client
        .request(&json!({"type": "query", "id": 5, "method": "list_sessions"}))
        .await;
    assert_eq!(reply["result"][0]["session_id"], "q");
}
