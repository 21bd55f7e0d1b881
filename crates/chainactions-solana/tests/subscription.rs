//! Subscription lifecycle against a local websocket node.

use chainactions_core::{
    AccountCandidate, CandidateEvent, DecodeError, DispatchContext, Network, TokenConfig,
};
use chainactions_solana::decode::account_update;
use chainactions_solana::wire::{
    encode_notification, KeyedAccount, NotificationContext, NotificationEnvelope,
    ProgramNotification, ProgramSubscribeRequest, UiAccount,
};
use chainactions_solana::{
    AccountData, AccountEncoding, SolanaAccountSource, SubscriptionConfig, SubscriptionError,
    SubscriptionManager, SubscriptionState,
};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use std::future::Future;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

const PROGRAM: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
const SUBSCRIPTION: u64 = 24040;

type Ws = WebSocketStream<TcpStream>;

/// Accept one websocket connection and hand it to `node`.
async fn serve<F, Fut>(node: F) -> String
where
    F: FnOnce(Ws) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let ws = accept_async(tcp).await.unwrap();
        node(ws).await;
    });
    format!("ws://{addr}")
}

fn manager(url: String) -> SubscriptionManager {
    SubscriptionManager::new(
        url,
        SubscriptionConfig {
            connect_timeout_ms: 2_000,
            handshake_timeout_ms: 2_000,
            close_timeout_ms: 500,
            ..SubscriptionConfig::default()
        },
    )
}

async fn read_subscribe(ws: &mut Ws) -> ProgramSubscribeRequest {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return serde_json::from_str(&text).unwrap(),
            Some(Ok(_)) => continue,
            other => panic!("expected subscribe request, got {other:?}"),
        }
    }
}

async fn ack(ws: &mut Ws) {
    let request = read_subscribe(ws).await;
    assert_eq!(request.method, "programSubscribe");
    assert_eq!(request.params.0, PROGRAM);
    let reply = serde_json::json!({ "jsonrpc": "2.0", "result": SUBSCRIPTION, "id": request.id });
    ws.send(Message::Text(reply.to_string())).await.unwrap();
}

fn notification(slot: u64) -> Message {
    let envelope = NotificationEnvelope::new(
        SUBSCRIPTION,
        ProgramNotification {
            context: NotificationContext { slot },
            value: KeyedAccount {
                pubkey: format!("account-{slot}"),
                account: UiAccount {
                    lamports: 1_000 + slot,
                    data: AccountData::Encoded("AQID".into(), "base64".into()),
                    owner: PROGRAM.into(),
                    executable: false,
                    rent_epoch: 361,
                },
            },
        },
    );
    Message::Text(encode_notification(&envelope).unwrap())
}

/// Keep reading until the client goes away, then report it.
async fn drain(mut ws: Ws, released: oneshot::Sender<()>) {
    while let Some(Ok(_)) = ws.next().await {}
    let _ = released.send(());
}

#[tokio::test]
async fn handshake_error_fails_open() {
    let url = serve(|mut ws| async move {
        let request = read_subscribe(&mut ws).await;
        let reply = serde_json::json!({
            "jsonrpc": "2.0",
            "id": request.id,
            "error": { "code": -32602, "message": "Invalid Request: program not found" }
        });
        ws.send(Message::Text(reply.to_string())).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    })
    .await;

    let err = manager(url).open(PROGRAM).await.err().unwrap();
    assert!(matches!(
        err,
        SubscriptionError::Handshake { code: -32602, ref message } if message.contains("program not found")
    ));
}

#[tokio::test]
async fn ack_for_another_request_fails_open() {
    let url = serve(|mut ws| async move {
        read_subscribe(&mut ws).await;
        let reply = serde_json::json!({ "jsonrpc": "2.0", "result": 5, "id": 99 });
        ws.send(Message::Text(reply.to_string())).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    })
    .await;

    let err = manager(url).open(PROGRAM).await.err().unwrap();
    assert!(matches!(err, SubscriptionError::Uncorrelated { .. }));
}

#[tokio::test]
async fn silent_node_times_out_handshake() {
    let url = serve(|mut ws| async move {
        read_subscribe(&mut ws).await;
        tokio::time::sleep(Duration::from_secs(5)).await;
    })
    .await;

    let manager = SubscriptionManager::new(
        url,
        SubscriptionConfig {
            handshake_timeout_ms: 200,
            close_timeout_ms: 200,
            ..SubscriptionConfig::default()
        },
    );
    let err = manager.open(PROGRAM).await.err().unwrap();
    assert!(matches!(err, SubscriptionError::HandshakeTimeout { ms: 200 }));
}

#[tokio::test]
async fn delivers_notifications_in_order_then_closes() {
    const N: u64 = 50;
    let (released_tx, released_rx) = oneshot::channel();
    let url = serve(move |mut ws| async move {
        ack(&mut ws).await;
        for slot in 0..N {
            ws.send(notification(slot)).await.unwrap();
        }
        drain(ws, released_tx).await;
    })
    .await;

    let (subscription, mut rx) = manager(url).open(PROGRAM).await.unwrap();
    assert_eq!(subscription.id(), SUBSCRIPTION);
    assert_eq!(subscription.state(), SubscriptionState::Streaming);

    for expected in 0..N {
        let item = rx.recv().await.unwrap().unwrap();
        assert_eq!(item.subscription, SUBSCRIPTION);
        assert_eq!(item.result.context.slot, expected);
        assert_eq!(item.result.value.pubkey, format!("account-{expected}"));
    }

    subscription.close().await.unwrap();
    assert_eq!(subscription.state(), SubscriptionState::Closed);
    assert!(rx.recv().await.is_none());

    timeout(Duration::from_secs(2), released_rx)
        .await
        .expect("node never saw the connection close")
        .unwrap();

    // Second close is a no-op.
    subscription.close().await.unwrap();
}

#[tokio::test]
async fn close_after_protocol_error_does_not_block() {
    let url = serve(|mut ws| async move {
        ack(&mut ws).await;
        ws.send(notification(1)).await.unwrap();
        ws.send(Message::Text("{not json".into())).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    })
    .await;

    let (subscription, mut rx) = manager(url).open(PROGRAM).await.unwrap();
    assert_eq!(rx.recv().await.unwrap().unwrap().result.context.slot, 1);
    assert!(matches!(rx.recv().await, Some(Err(SubscriptionError::Decode(_)))));
    assert!(rx.recv().await.is_none());

    timeout(Duration::from_secs(2), subscription.close())
        .await
        .expect("close blocked after a protocol error")
        .unwrap();
    timeout(Duration::from_secs(2), subscription.close())
        .await
        .expect("second close blocked")
        .unwrap();
    assert_eq!(subscription.state(), SubscriptionState::Closed);
}

#[tokio::test]
async fn peer_close_ends_the_stream() {
    let url = serve(|mut ws| async move {
        ack(&mut ws).await;
        ws.send(notification(3)).await.unwrap();
        ws.close(None).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    })
    .await;

    let (subscription, mut rx) = manager(url).open(PROGRAM).await.unwrap();
    assert_eq!(rx.recv().await.unwrap().unwrap().result.context.slot, 3);
    assert!(rx.recv().await.unwrap().is_err());
    assert!(rx.recv().await.is_none());

    timeout(Duration::from_secs(2), subscription.closed())
        .await
        .expect("subscription never reached Closed");
    subscription.close().await.unwrap();
}

#[tokio::test]
async fn unresponsive_peer_bounds_close() {
    let url = serve(|mut ws| async move {
        ack(&mut ws).await;
        // Never read again, so the close handshake never completes.
        tokio::time::sleep(Duration::from_secs(10)).await;
        drop(ws);
    })
    .await;

    let (subscription, _rx) = manager(url).open(PROGRAM).await.unwrap();
    let err = timeout(Duration::from_secs(3), subscription.close())
        .await
        .expect("close exceeded its bound")
        .unwrap_err();
    assert!(matches!(err, SubscriptionError::CloseTimeout { .. }));
    assert_eq!(subscription.state(), SubscriptionState::Closed);
}

#[tokio::test]
async fn dropping_the_subscription_releases_the_connection() {
    let (released_tx, released_rx) = oneshot::channel();
    let url = serve(move |mut ws| async move {
        ack(&mut ws).await;
        drain(ws, released_tx).await;
    })
    .await;

    let (subscription, _rx) = manager(url).open(PROGRAM).await.unwrap();
    drop(subscription);

    timeout(Duration::from_secs(2), released_rx)
        .await
        .expect("connection outlived its subscription")
        .unwrap();
}

fn account(item: Option<Result<CandidateEvent, SubscriptionError>>) -> AccountCandidate {
    match item {
        Some(Ok(CandidateEvent::Solana(account))) => account,
        other => panic!("expected an account candidate, got {other:?}"),
    }
}

#[tokio::test]
async fn parsed_account_data_is_skipped_per_item() {
    let url = serve(|mut ws| async move {
        ack(&mut ws).await;
        let parsed = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "programNotification",
            "params": {
                "result": {
                    "context": { "slot": 1 },
                    "value": {
                        "pubkey": "token-account",
                        "account": {
                            "data": { "program": "spl-token", "parsed": { "type": "account" }, "space": 165 },
                            "executable": false,
                            "lamports": 2_039_280,
                            "owner": PROGRAM,
                            "rentEpoch": 361
                        }
                    }
                },
                "subscription": SUBSCRIPTION
            }
        });
        ws.send(Message::Text(parsed.to_string())).await.unwrap();
        ws.send(notification(2)).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    })
    .await;

    let manager = SubscriptionManager::new(
        url,
        SubscriptionConfig {
            encoding: AccountEncoding::JsonParsed,
            close_timeout_ms: 500,
            ..SubscriptionConfig::default()
        },
    );
    let (subscription, rx) = manager.open(PROGRAM).await.unwrap();
    let mut candidates = SolanaAccountSource::new().candidates(rx);
    let ctx = DispatchContext {
        network: Network::Solana,
        token: TokenConfig::default(),
        observed_at: Utc::now(),
    };

    let parsed = account(candidates.next().await);
    assert_eq!(parsed.slot, 1);
    assert!(matches!(
        account_update(&parsed, &ctx),
        Err(DecodeError::UnsupportedEncoding(e)) if e == "jsonParsed"
    ));

    let encoded = account(candidates.next().await);
    assert_eq!(encoded.slot, 2);
    assert_eq!(account_update(&encoded, &ctx).unwrap().data.as_ref(), &[1u8, 2, 3]);

    subscription.close().await.unwrap();
}
