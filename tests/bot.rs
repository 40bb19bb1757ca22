//! Telegram front end against a mock Bot API and a mock issuu.

#![cfg(feature = "bot")]

mod common;

use common::MockServer;
use issuu2pdf::bot::telegram::{Chat, Message, TelegramClient};
use issuu2pdf::bot::{
    handle_message, BotConfig, BotError, DOWNLOADING_REPLY, GREETING, INVALID_URL_REPLY,
};

const TOKEN: &str = "123:abc";
const CHAT: i64 = 42;

fn setup(server: &MockServer) -> (TelegramClient, BotConfig) {
    for method in ["sendMessage", "sendDocument"] {
        server.route(
            &format!("/bot{TOKEN}/{method}"),
            200,
            r#"{"ok":true,"result":{"message_id":1}}"#,
        );
    }
    let mut config = BotConfig::new(TOKEN);
    config.api_base_url = server.base_url();
    config.fetcher = server.fetcher_config();
    (TelegramClient::new(&config).unwrap(), config)
}

fn message(text: &str) -> Message {
    Message {
        message_id: 7,
        chat: Chat { id: CHAT },
        text: Some(text.to_string()),
    }
}

/// `text` of every `sendMessage` call, in order.
fn replies(server: &MockServer) -> Vec<String> {
    server
        .requests_to(&format!("/bot{TOKEN}/sendMessage"))
        .iter()
        .map(|body| {
            let json: serde_json::Value = serde_json::from_slice(body).unwrap();
            assert_eq!(json["chat_id"], CHAT);
            json["text"].as_str().unwrap().to_string()
        })
        .collect()
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[tokio::test]
async fn start_gets_greeting() {
    let server = MockServer::start().await;
    let (client, config) = setup(&server);

    handle_message(&client, &config.fetcher, message("/start")).await;

    assert_eq!(replies(&server), vec![GREETING]);
}

#[tokio::test]
async fn plain_text_gets_usage_hint() {
    let server = MockServer::start().await;
    let (client, config) = setup(&server);

    handle_message(&client, &config.fetcher, message("what is this?")).await;
    handle_message(&client, &config.fetcher, message("/help")).await;

    assert_eq!(replies(&server), vec![INVALID_URL_REPLY]);
}

#[tokio::test]
async fn document_link_is_answered_with_pdf() {
    let server = MockServer::start().await;
    let (client, config) = setup(&server);
    let pages = vec![
        Some(server.image("p1.jpg", 10, 20)),
        Some(server.image("p2.jpg", 30, 40)),
    ];
    server.manifest("acme", "report2024", &pages);

    handle_message(
        &client,
        &config.fetcher,
        message("https://issuu.com/acme/docs/report2024"),
    )
    .await;

    assert_eq!(replies(&server), vec![DOWNLOADING_REPLY]);
    let uploads = server.requests_to(&format!("/bot{TOKEN}/sendDocument"));
    assert_eq!(uploads.len(), 1);
    let body = &uploads[0];
    assert!(contains(body, b"filename=\"acme_report2024.pdf\""));
    assert!(contains(body, b"%PDF-"));
    assert!(contains(body, CHAT.to_string().as_bytes()));
}

#[tokio::test]
async fn failed_download_is_reported_in_chat() {
    let server = MockServer::start().await;
    let (client, config) = setup(&server);

    handle_message(
        &client,
        &config.fetcher,
        message("https://issuu.com/acme/docs/missing"),
    )
    .await;

    let replies = replies(&server);
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0], DOWNLOADING_REPLY);
    assert!(
        replies[1].starts_with("Failed to download: "),
        "{}",
        replies[1]
    );
    assert!(server
        .requests_to(&format!("/bot{TOKEN}/sendDocument"))
        .is_empty());
}

#[tokio::test]
async fn get_updates_returns_messages() {
    let server = MockServer::start().await;
    let (client, _) = setup(&server);
    server.route(
        &format!("/bot{TOKEN}/getUpdates"),
        200,
        r#"{"ok":true,"result":[
            {"update_id":5,"message":{"message_id":1,"chat":{"id":42},"text":"hi"}},
            {"update_id":6,"channel_post":{}}
        ]}"#,
    );

    let updates = client.get_updates(0, 0).await.unwrap();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].update_id, 5);
    assert_eq!(
        updates[0].message.as_ref().and_then(|m| m.text.as_deref()),
        Some("hi")
    );
    assert!(updates[1].message.is_none());

    let request: serde_json::Value = serde_json::from_slice(
        &server.requests_to(&format!("/bot{TOKEN}/getUpdates"))[0],
    )
    .unwrap();
    assert_eq!(request["offset"], 0);
}

#[tokio::test]
async fn api_rejection_carries_description() {
    let server = MockServer::start().await;
    let (client, _) = setup(&server);
    server.route(
        &format!("/bot{TOKEN}/sendMessage"),
        401,
        r#"{"ok":false,"error_code":401,"description":"Unauthorized"}"#,
    );

    let err = client.send_message(CHAT, "hello").await.unwrap_err();
    match err {
        BotError::Api {
            method,
            description,
        } => {
            assert_eq!(method, "sendMessage");
            assert_eq!(description, "Unauthorized");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}
