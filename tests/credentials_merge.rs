use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pipeline_pilot::config::OverrideSource;
use pipeline_pilot::identity::ChatId;
use pipeline_pilot::persistence::CredentialStore;
use pipeline_pilot::pipeline::{AutorunAction, PipelineTrigger, TriggerClient, TriggerOutcome};

fn client_for(store: &Arc<CredentialStore>, env: &[(&str, &str)]) -> TriggerClient {
    let overrides: HashMap<String, String> = env
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    TriggerClient::new(
        reqwest::Client::new(),
        Arc::clone(store),
        Arc::new(overrides) as Arc<dyn OverrideSource>,
        Duration::from_secs(5),
    )
}

#[test]
fn merges_are_additive_and_survive_reload() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("secrets.json");
    let store = CredentialStore::load(&path);

    let first = store.merge(&json!({"youtube": {"key": "A"}}));
    assert_eq!(first.updated, vec!["youtube.key"]);
    let second = store.merge(&json!({"video-platform": {"other": "B"}}));
    assert_eq!(second.updated, vec!["youtube.other"]);

    let ignored = store.merge(&json!({"unknown-section": {"x": 1}}));
    assert_eq!(ignored.ignored, vec!["unknown-section"]);
    assert!(ignored.updated.is_empty());

    let reloaded = CredentialStore::load(&path);
    let youtube = reloaded.section("youtube").unwrap();
    assert_eq!(youtube["key"], json!("A"));
    assert_eq!(youtube["other"], json!("B"));
    assert!(reloaded.section("unknown-section").is_none());
}

#[tokio::test]
async fn merged_webhook_is_used_by_the_next_trigger() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook/start"))
        .and(header("authorization", "Bearer merged"))
        .and(body_json(json!({"trigger": "manual", "chat_id": 42})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let store = Arc::new(CredentialStore::load(tmp.path().join("secrets.json")));
    let trigger = client_for(&store, &[]);

    assert_eq!(trigger.trigger_start(ChatId(42)).await, TriggerOutcome::NotConfigured);

    let report = store.merge(&json!({
        "n8n": {
            "webhook_start": format!("{}/webhook/start", server.uri()),
            "auth": "Bearer merged"
        }
    }));
    assert!(report.errors.is_empty());

    assert_eq!(
        trigger.trigger_start(ChatId(42)).await,
        TriggerOutcome::Delivered { status: 200 }
    );
}

#[tokio::test]
async fn environment_override_beats_stored_webhook() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/from-env"))
        .and(body_json(json!({"chat_id": 7, "action": "start", "minutes": 30})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/from-store"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let store = Arc::new(CredentialStore::load(tmp.path().join("secrets.json")));
    store.merge(&json!({"n8n": {"webhook_autorun": format!("{}/from-store", server.uri())}}));
    let env_url = format!("{}/from-env", server.uri());
    let trigger = client_for(&store, &[("N8N_AUTORUN_URL", env_url.as_str())]);

    let outcome = trigger
        .trigger_autorun(ChatId(7), AutorunAction::Start, Some(30))
        .await;
    assert!(outcome.is_success(), "{outcome}");
}

#[test]
fn redacted_view_masks_values() {
    let tmp = TempDir::new().unwrap();
    let store = CredentialStore::load(tmp.path().join("secrets.json"));
    store.merge(&json!({"gemini": {"api_key": "AIzaSyVerySecretValue1234"}}));

    let entries = store.redacted();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, "gemini.api_key");
    assert!(!entries[0].1.contains("VerySecret"));
    assert!(entries[0].1.ends_with("1234"));
}
