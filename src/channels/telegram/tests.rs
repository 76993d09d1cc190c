use super::handler::parse_update;
use super::*;
use crate::channels::traits::Channel;
use crate::identity::ChatId;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn channel(server: &MockServer) -> TelegramChannel {
    TelegramChannel::new("123:ABC".into()).with_api_base(server.uri())
}

#[test]
fn telegram_channel_name() {
    let ch = TelegramChannel::new("fake-token".into());
    assert_eq!(ch.name(), "telegram");
    assert_eq!(ch.max_message_length(), 4096);
}

#[test]
fn telegram_api_url() {
    let ch = TelegramChannel::new("123:ABC".into());
    assert_eq!(
        ch.api_url("getMe"),
        "https://api.telegram.org/bot123:ABC/getMe"
    );
}

#[test]
fn parse_update_extracts_chat_text_and_message_id() {
    let update = json!({
        "update_id": 10,
        "message": {
            "message_id": 55,
            "date": 1_700_000_000,
            "chat": {"id": -100_200, "type": "group"},
            "from": {"id": 7, "username": "alice"},
            "text": "/start hunter2"
        }
    });

    let msg = parse_update(&update).unwrap();
    assert_eq!(msg.chat, ChatId(-100_200));
    assert_eq!(msg.content, "/start hunter2");
    assert_eq!(msg.message_id.as_deref(), Some("55"));
    assert_eq!(msg.timestamp, 1_700_000_000);
    assert_eq!(msg.channel, "telegram");
}

#[test]
fn parse_update_skips_non_text_messages() {
    let sticker = json!({"update_id": 1, "message": {"chat": {"id": 1}, "sticker": {}}});
    let edited = json!({"update_id": 2, "edited_message": {"chat": {"id": 1}, "text": "x"}});
    assert!(parse_update(&sticker).is_none());
    assert!(parse_update(&edited).is_none());
}

#[tokio::test]
async fn send_posts_plain_text_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:ABC/sendMessage"))
        .and(body_partial_json(json!({"chat_id": "42", "text": "hello"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    channel(&server).send("hello", "42").await.unwrap();
}

#[tokio::test]
async fn send_failure_includes_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("bot was blocked by the user"))
        .mount(&server)
        .await;

    let err = channel(&server).send("hello", "42").await.unwrap_err();
    let text = err.to_string();
    assert!(text.contains("403"));
    assert!(text.contains("blocked"));
}

#[tokio::test]
async fn send_chunked_splits_long_messages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:ABC/sendMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(2)
        .mount(&server)
        .await;

    let long = "x".repeat(5000);
    channel(&server).send_chunked(&long, "42").await.unwrap();
}

#[tokio::test]
async fn delete_message_sends_numeric_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:ABC/deleteMessage"))
        .and(body_json(json!({"chat_id": "42", "message_id": 55})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": true})))
        .expect(1)
        .mount(&server)
        .await;

    channel(&server).delete_message("42", "55").await.unwrap();
}

#[tokio::test]
async fn health_check_uses_get_me() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bot123:ABC/getMe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    assert!(channel(&server).health_check().await);

    let unreachable = TelegramChannel::new("t".into()).with_api_base("http://127.0.0.1:9");
    assert!(!unreachable.health_check().await);
}

#[tokio::test]
async fn listen_delivers_updates_and_advances_offset() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:ABC/getUpdates"))
        .and(body_partial_json(json!({"offset": 0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": [{
                "update_id": 500,
                "message": {"message_id": 1, "chat": {"id": 9}, "text": "/help"}
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bot123:ABC/getUpdates"))
        .and(body_partial_json(json!({"offset": 501})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"ok": true, "result": []}))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let (tx, mut rx) = tokio::sync::mpsc::channel(4);
    let ch = channel(&server);
    let listener = tokio::spawn(async move { ch.listen(tx).await });

    let msg = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(msg.chat, ChatId(9));
    assert_eq!(msg.content, "/help");

    tokio::time::sleep(Duration::from_millis(100)).await;
    listener.abort();

    let offsets: Vec<serde_json::Value> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter_map(|r| serde_json::from_slice::<serde_json::Value>(&r.body).ok())
        .filter_map(|body| body.get("offset").cloned())
        .collect();
    assert!(offsets.contains(&json!(501)));
}
