use httpmock::prelude::*;
use serde_json::json;

use snitch::secrets::ApiToken;
use snitch::slack::{ClientSettings, SlackClient};

fn client(server: &MockServer) -> SlackClient {
    let settings = ClientSettings {
        api_base: server.base_url(),
        request_timeout_ms: 2_000,
        retry_max_attempts: 3,
        retry_base_delay_ms: 1,
    };
    SlackClient::new(ApiToken::new("xoxb-test").unwrap(), settings).unwrap()
}

#[tokio::test]
async fn test_fetch_history_follows_cursor() {
    let server = MockServer::start();
    let first = server.mock(|when, then| {
        when.method(GET)
            .path("/conversations.history")
            .header("authorization", "Bearer xoxb-test")
            .query_param("channel", "C1")
            .query_param("limit", "3");
        then.status(200).json_body(json!({
            "ok": true,
            "messages": [
                {"type": "message", "user": "U1", "ts": "1700000002.000100"},
                {"type": "message", "user": "U2", "ts": "1700000001.000100"}
            ],
            "has_more": true,
            "response_metadata": {"next_cursor": "page2"}
        }));
    });
    let second = server.mock(|when, then| {
        when.method(GET)
            .path("/conversations.history")
            .query_param("cursor", "page2")
            .query_param("limit", "1");
        then.status(200).json_body(json!({
            "ok": true,
            "messages": [
                {"type": "message", "user": "U1", "ts": "1700000000.000100"}
            ],
            "has_more": false,
            "response_metadata": {"next_cursor": ""}
        }));
    });

    let history = client(&server)
        .fetch_history("C1", 1_699_000_000.0, 3)
        .await
        .unwrap();

    assert_eq!(first.calls(), 1);
    assert_eq!(second.calls(), 1);
    assert_eq!(history.messages.len(), 3);
    assert!(!history.has_more);
}

#[tokio::test]
async fn test_fetch_history_stops_at_cap() {
    let server = MockServer::start();
    let page = server.mock(|when, then| {
        when.method(GET).path("/conversations.history");
        then.status(200).json_body(json!({
            "ok": true,
            "messages": [
                {"type": "message", "user": "U1", "ts": "1700000002.000100"},
                {"type": "message", "user": "U2", "ts": "1700000001.000100"}
            ],
            "has_more": true,
            "response_metadata": {"next_cursor": "page2"}
        }));
    });

    let history = client(&server)
        .fetch_history("C1", 1_699_000_000.0, 2)
        .await
        .unwrap();

    assert_eq!(page.calls(), 1);
    assert_eq!(history.messages.len(), 2);
    assert!(history.has_more);
}

#[tokio::test]
async fn test_fetch_history_rejects_zero_cap() {
    let server = MockServer::start();
    let page = server.mock(|when, then| {
        when.method(GET).path("/conversations.history");
        then.status(200)
            .json_body(json!({"ok": true, "messages": [], "has_more": true}));
    });

    let err = client(&server)
        .fetch_history("C1", 1_699_000_000.0, 0)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("at least 1"));
    assert_eq!(page.calls(), 0);
}

#[tokio::test]
async fn test_fetch_history_surfaces_api_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/conversations.history");
        then.status(200)
            .json_body(json!({"ok": false, "error": "channel_not_found"}));
    });

    let err = client(&server)
        .fetch_history("C404", 0.0, 10)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("channel_not_found"));
}

#[tokio::test]
async fn test_post_message_retries_after_rate_limit() {
    let server = MockServer::start();
    let limited = server.mock(|when, then| {
        when.method(POST)
            .path("/chat.postMessage")
            .header("x-snitch-retry-attempt", "0");
        then.status(429)
            .header("retry-after", "0")
            .body("rate limited");
    });
    let accepted = server.mock(|when, then| {
        when.method(POST)
            .path("/chat.postMessage")
            .header("x-snitch-retry-attempt", "1")
            .body_includes("\"channel\":\"C2\"")
            .body_includes("\"username\":\"SnitchBot\"");
        then.status(200).json_body(json!({
            "ok": true,
            "channel": "C2",
            "ts": "1700000000.000200"
        }));
    });

    let ts = client(&server)
        .post_message("C2", "report body", Some("SnitchBot"))
        .await
        .unwrap();

    assert_eq!(limited.calls(), 1);
    assert_eq!(accepted.calls(), 1);
    assert_eq!(ts, "1700000000.000200");
}

#[tokio::test]
async fn test_post_message_gives_up_on_client_error() {
    let server = MockServer::start();
    let rejected = server.mock(|when, then| {
        when.method(POST).path("/chat.postMessage");
        then.status(403).body("forbidden");
    });

    let result = client(&server).post_message("C2", "report body", None).await;

    assert!(result.is_err());
    assert_eq!(rejected.calls(), 1);
}

#[tokio::test]
async fn test_list_users_skips_deleted_members() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/users.list");
        then.status(200).json_body(json!({
            "ok": true,
            "members": [
                {"id": "U1", "name": "alice", "real_name": "Alice Adams"},
                {"id": "U2", "name": "gone", "real_name": "Gone Person", "deleted": true},
                {"id": "U3", "name": "bob", "profile": {"real_name": "Bob Brown"}}
            ],
            "response_metadata": {"next_cursor": ""}
        }));
    });

    let users = client(&server).list_users().await.unwrap();

    let ids: Vec<&str> = users.iter().map(|u| u.user_id.as_str()).collect();
    assert_eq!(ids, vec!["U1", "U3"]);
    assert_eq!(users[1].real_name, "Bob Brown");
}
