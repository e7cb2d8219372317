//! End-to-end tests against real instances.
//!
//! Every test binds an ephemeral loopback port, connects a
//! `tokio-tungstenite` client to the session endpoint, and drives the
//! instance through the [`ServerInstance`] facade. All waits are bounded
//! so a regression fails instead of hanging.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chatsim_server::{InstanceHub, ServerInstance, SimConfig};
use chatsim_types::{
    DEFAULT_BOT_ID, DEFAULT_DIRECT_CHANNEL_ID, MessageEnvelope, PLAYGROUND_CHANNEL_ID,
    SECRET_GROUP_ID,
};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

async fn start() -> (ServerInstance, Arc<InstanceHub>) {
    let hub = Arc::new(InstanceHub::new());
    let server = ServerInstance::start_with_hub(SimConfig::default(), Arc::clone(&hub))
        .await
        .expect("instance should start");
    (server, hub)
}

async fn connect(server: &ServerInstance) -> Client {
    let (client, _) = tokio::time::timeout(WAIT, connect_async(server.ws_url()))
        .await
        .expect("connect timed out")
        .expect("connect failed");
    client
}

/// Next text frame from the server, skipping transport control frames.
async fn recv_text(client: &mut Client) -> String {
    tokio::time::timeout(WAIT, async {
        loop {
            match client.next().await {
                Some(Ok(Message::Text(text))) => return text.as_str().to_owned(),
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                other => panic!("expected a text frame, got {other:?}"),
            }
        }
    })
    .await
    .expect("no text frame within timeout")
}

async fn recv_json(client: &mut Client) -> Value {
    serde_json::from_str(&recv_text(client).await).unwrap()
}

async fn send_json(client: &mut Client, value: &Value) {
    client
        .send(Message::text(value.to_string()))
        .await
        .expect("client write failed");
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not met within timeout");
}

fn chat_message(channel: &str, text: &str) -> Value {
    serde_json::json!({ "type": "message", "channel": channel, "text": text })
}

// ---------------------------------------------------------------------------
// Delivery
// ---------------------------------------------------------------------------

#[tokio::test]
async fn mention_reaches_connected_client() {
    let (server, _hub) = start().await;
    let mut client = connect(&server).await;

    server.inject_mention_to_bot("C1", "hello");

    let msg: MessageEnvelope = serde_json::from_str(&recv_text(&mut client).await).unwrap();
    assert_eq!(msg.kind, "message");
    assert_eq!(msg.channel, "C1");
    assert_eq!(msg.text, format!("<@{DEFAULT_BOT_ID}> hello"));
    assert!(server.was_delivered(&msg.text));

    server.stop().await;
}

#[tokio::test]
async fn direct_message_uses_direct_channel() {
    let (server, _hub) = start().await;
    let mut client = connect(&server).await;

    server.inject_direct_to_bot("psst");

    let msg: MessageEnvelope = serde_json::from_str(&recv_text(&mut client).await).unwrap();
    assert_eq!(msg.channel, DEFAULT_DIRECT_CHANNEL_ID);
    assert_eq!(msg.text, "psst");

    server.stop().await;
}

#[tokio::test]
async fn messages_queued_before_connect_arrive_in_order() {
    let (server, _hub) = start().await;
    for n in 0..20 {
        server.inject_to_channel("C1", &format!("m{n}"));
    }
    assert_eq!(server.pending_deliveries(), 20);

    let mut client = connect(&server).await;
    for n in 0..20 {
        let msg: MessageEnvelope = serde_json::from_str(&recv_text(&mut client).await).unwrap();
        assert_eq!(msg.text, format!("m{n}"));
    }
    assert_eq!(server.pending_deliveries(), 0);
    assert_eq!(server.all_delivered().len(), 20);

    server.stop().await;
}

#[tokio::test]
async fn raw_events_are_forwarded_verbatim() {
    let (server, _hub) = start().await;
    let mut client = connect(&server).await;

    let event = serde_json::json!({ "type": "user_typing", "channel": "C1", "user": "U1" });
    server.inject_raw(&event);

    assert_eq!(recv_json(&mut client).await, event);
    assert_eq!(server.all_delivered(), [event.to_string()]);

    server.stop().await;
}

#[tokio::test]
async fn channel_and_group_invites() {
    let (server, _hub) = start().await;
    let mut client = connect(&server).await;

    server.inject_channel_invite();
    let joined = recv_json(&mut client).await;
    assert_eq!(joined["type"], "channel_joined");
    assert_eq!(joined["channel"]["id"], PLAYGROUND_CHANNEL_ID);
    assert_eq!(joined["channel"]["name"], "bot-playground");

    server.inject_group_invite();
    let joined = recv_json(&mut client).await;
    assert_eq!(joined["type"], "group_joined");
    assert_eq!(joined["channel"]["id"], SECRET_GROUP_ID);
    assert_eq!(joined["channel"]["is_group"], true);

    server.stop().await;
}

#[tokio::test]
async fn posted_message_is_pushed_to_session() {
    let (server, _hub) = start().await;
    let mut client = connect(&server).await;

    let http = reqwest::Client::new();
    let ack: Value = http
        .post(format!("{}chat.postMessage", server.api_url()))
        .form(&[("channel", "C1"), ("text", "from the bot")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ack["ok"], true);

    let msg: MessageEnvelope = serde_json::from_str(&recv_text(&mut client).await).unwrap();
    assert_eq!(msg.text, "from the bot");
    assert_eq!(msg.ts, ack["ts"]);
    assert!(server.was_delivered("from the bot"));

    server.stop().await;
}

#[tokio::test]
async fn competing_sessions_never_share_a_message() {
    let (server, _hub) = start().await;
    let mut a = connect(&server).await;
    let mut b = connect(&server).await;

    for n in 0..10 {
        server.inject_to_channel("C1", &format!("m{n}"));
    }

    let mut received = Vec::new();
    tokio::time::timeout(WAIT, async {
        while received.len() < 10 {
            let frame = tokio::select! {
                frame = a.next() => frame,
                frame = b.next() => frame,
            };
            if let Some(Ok(Message::Text(text))) = frame {
                let msg: MessageEnvelope = serde_json::from_str(text.as_str()).unwrap();
                received.push(msg.text);
            }
        }
    })
    .await
    .expect("not every message was delivered");

    let unique: HashSet<&String> = received.iter().collect();
    assert_eq!(unique.len(), 10);

    // Nothing is left over for a second delivery.
    let extra = tokio::time::timeout(Duration::from_millis(200), async {
        tokio::select! {
            frame = a.next() => frame,
            frame = b.next() => frame,
        }
    })
    .await;
    assert!(extra.is_err());

    server.stop().await;
}

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

#[tokio::test]
async fn client_messages_are_seen() {
    let (server, _hub) = start().await;
    let mut feed = server.subscribe_seen();
    let mut client = connect(&server).await;

    send_json(&mut client, &chat_message("C1", "bye")).await;

    let observed = tokio::time::timeout(WAIT, feed.recv()).await.unwrap().unwrap();
    let msg: MessageEnvelope = serde_json::from_str(&observed).unwrap();
    assert_eq!(msg.text, "bye");
    assert!(server.was_seen("bye"));
    assert!(!server.was_seen("by"));
    assert!(!server.was_delivered("bye"));

    server.stop().await;
}

#[tokio::test]
async fn ping_is_answered_and_not_recorded() {
    let (server, _hub) = start().await;
    let mut client = connect(&server).await;

    send_json(&mut client, &serde_json::json!({ "type": "ping", "id": 7 })).await;

    let pong = recv_json(&mut client).await;
    assert_eq!(pong["type"], "pong");
    assert_eq!(pong["reply_to"], 7);

    send_json(&mut client, &chat_message("C1", "marker")).await;
    wait_until(|| server.was_seen("marker")).await;
    assert_eq!(server.all_seen().len(), 1);

    server.stop().await;
}

#[tokio::test]
async fn malformed_frame_does_not_end_session() {
    let (server, _hub) = start().await;
    let mut client = connect(&server).await;

    client.send(Message::text("{not json")).await.unwrap();
    send_json(&mut client, &chat_message("C1", "still here")).await;
    wait_until(|| server.was_seen("still here")).await;
    assert_eq!(server.all_seen().len(), 1);

    server.inject_to_channel("C1", "and back");
    let msg: MessageEnvelope = serde_json::from_str(&recv_text(&mut client).await).unwrap();
    assert_eq!(msg.text, "and back");

    server.stop().await;
}

#[tokio::test]
async fn frames_with_non_numeric_ids_are_recorded() {
    let (server, _hub) = start().await;
    let mut feed = server.subscribe_seen();
    let mut client = connect(&server).await;

    for id in [serde_json::json!("abc"), Value::Null, serde_json::json!(-3)] {
        send_json(
            &mut client,
            &serde_json::json!({ "type": "message", "channel": "C1", "text": "odd id", "id": id }),
        )
        .await;
    }
    wait_until(|| server.all_seen().len() == 3).await;
    assert!(server.was_seen("odd id"));

    for _ in 0..3 {
        let observed = tokio::time::timeout(WAIT, feed.recv()).await.unwrap().unwrap();
        assert!(observed.contains("odd id"));
    }

    server.stop().await;
}

#[tokio::test]
async fn ping_with_bad_id_is_dropped() {
    let (server, _hub) = start().await;
    let mut client = connect(&server).await;

    send_json(&mut client, &serde_json::json!({ "type": "ping", "id": "abc" })).await;
    send_json(&mut client, &serde_json::json!({ "type": "ping", "id": 9 })).await;

    let pong = recv_json(&mut client).await;
    assert_eq!(pong["reply_to"], 9);
    assert!(server.all_seen().is_empty());

    server.stop().await;
}

#[tokio::test]
async fn non_message_events_are_recorded_but_not_matched() {
    let (server, _hub) = start().await;
    let mut client = connect(&server).await;

    send_json(&mut client, &serde_json::json!({ "type": "typing", "channel": "C1" })).await;
    wait_until(|| server.all_seen().len() == 1).await;
    assert!(!server.was_seen(""));

    server.stop().await;
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stop_closes_open_sessions_and_frees_address() {
    let (server, hub) = start().await;
    let address = server.address().to_owned();
    let mut client = connect(&server).await;
    assert!(hub.contains(&address));

    server.stop().await;
    assert!(!hub.contains(&address));

    let ended = tokio::time::timeout(WAIT, async {
        loop {
            match client.next().await {
                Some(Ok(Message::Close(_)) | Err(_)) | None => return,
                Some(Ok(_)) => {}
            }
        }
    })
    .await;
    assert!(ended.is_ok());
}

#[tokio::test]
async fn upgrade_is_refused_for_unregistered_instance() {
    let (server, hub) = start().await;
    hub.deregister(server.address());

    let result = tokio::time::timeout(WAIT, connect_async(server.ws_url()))
        .await
        .expect("connect timed out");
    match result {
        Err(WsError::Http(response)) => assert_eq!(response.status().as_u16(), 500),
        Err(e) => panic!("expected an HTTP 500 refusal, got {e}"),
        Ok(_) => panic!("upgrade was accepted for an unregistered instance"),
    }

    server.stop().await;
}

#[tokio::test]
async fn dropping_instance_frees_address() {
    let (server, hub) = start().await;
    let address = server.address().to_owned();
    drop(server);
    assert!(!hub.contains(&address));
}

#[tokio::test]
async fn instances_are_isolated() {
    let first = ServerInstance::start(SimConfig::default()).await.unwrap();
    let second = ServerInstance::start(SimConfig::default().with_bot_name("Other"))
        .await
        .unwrap();
    assert_ne!(first.address(), second.address());

    first.inject_to_channel("C1", "only first");
    assert!(first.was_delivered("only first"));
    assert!(!second.was_delivered("only first"));
    assert_eq!(second.pending_deliveries(), 0);
    assert_eq!(second.bot_name(), "Other");

    let ack: Value = reqwest::Client::new()
        .post(format!("{}chat.postMessage", second.api_url()))
        .form(&[("channel", "C2"), ("text", "only second")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ack["ok"], true);
    assert!(second.was_delivered("only second"));
    assert!(!first.was_delivered("only second"));
    assert_eq!(first.pending_deliveries(), 1);
    assert_eq!(second.pending_deliveries(), 1);

    first.stop().await;
    second.stop().await;
}

#[tokio::test]
async fn bootstrap_over_http_points_at_session() {
    let (server, _hub) = start().await;
    server.set_bot_name("Renamed");

    let info: Value = reqwest::get(format!("{}rtm.start", server.api_url()))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(info["url"], server.ws_url());
    assert_eq!(info["self"]["name"], "Renamed");
    assert_eq!(info["channels"].as_array().unwrap().len(), server.channels().len());

    server.stop().await;
}
