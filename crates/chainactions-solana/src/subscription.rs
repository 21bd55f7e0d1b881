//! `SubscriptionManager`: one `programSubscribe` per websocket connection.
//!
//! Lifecycle:
//! 1. dial the endpoint (bounded by `connect_timeout_ms`)
//! 2. send the subscribe request and wait for exactly one correlated ack
//!    (bounded by `handshake_timeout_ms`); any failure closes the socket
//! 3. spawn the streaming task: a reader task pushes raw frames onto an
//!    unbounded channel and reports the first read error on a oneshot, while
//!    the loop decodes frames and forwards them in arrival order
//! 4. on `close()` the loop sends a normal close frame and waits (bounded by
//!    `close_timeout_ms`) for the reader to observe the socket closing
//!
//! The notification receiver ends after the first error item. `close()` is
//! idempotent and never blocks past its timeout, even after a protocol error.
//!
//! # Usage
//! ```no_run
//! # async fn example() -> Result<(), chainactions_solana::SubscriptionError> {
//! use chainactions_solana::{SubscriptionConfig, SubscriptionManager};
//!
//! let manager = SubscriptionManager::new("wss://api.mainnet-beta.solana.com", SubscriptionConfig::default());
//! let (subscription, mut notifications) = manager.open("11111111111111111111111111111111").await?;
//! while let Some(item) = notifications.recv().await {
//!     println!("{:?}", item?);
//! }
//! subscription.close().await?;
//! # Ok(()) }
//! ```

use crate::error::SubscriptionError;
use crate::wire::{
    self, AccountEncoding, AccountNotification, Commitment, ProgramSubscribeRequest, SubscribeAck,
    SubscribeOptions,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{
    self,
    protocol::{frame::coding::CloseCode, CloseFrame},
    Message,
};
use tracing::{debug, error, info, warn};

/// Request id of the subscribe call; one subscription per connection.
const SUBSCRIBE_REQUEST_ID: u64 = 1;

/// Decoded notifications, in arrival order. Ends after the first error.
pub type NotificationReceiver = mpsc::Receiver<Result<AccountNotification, SubscriptionError>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    #[serde(default)]
    pub encoding: AccountEncoding,
    #[serde(default)]
    pub commitment: Commitment,
    /// Buffered notifications between the streaming task and the consumer
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,
    #[serde(default = "default_close_timeout_ms")]
    pub close_timeout_ms: u64,
}

fn default_channel_capacity() -> usize { 1024 }
fn default_connect_timeout_ms() -> u64 { 10_000 }
fn default_handshake_timeout_ms() -> u64 { 10_000 }
fn default_close_timeout_ms() -> u64 { 5_000 }

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            encoding: AccountEncoding::default(),
            commitment: Commitment::default(),
            channel_capacity: default_channel_capacity(),
            connect_timeout_ms: default_connect_timeout_ms(),
            handshake_timeout_ms: default_handshake_timeout_ms(),
            close_timeout_ms: default_close_timeout_ms(),
        }
    }
}

/// Lifecycle of a subscription.
///
/// `Connecting` and `Subscribing` are only reported in logs while
/// [`SubscriptionManager::open`] runs; a [`Subscription`] handle starts at
/// `Streaming`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Connecting,
    Subscribing,
    Streaming,
    Closing,
    Closed,
}

pub struct SubscriptionManager {
    endpoint: String,
    config: SubscriptionConfig,
}

impl SubscriptionManager {
    pub fn new(endpoint: impl Into<String>, config: SubscriptionConfig) -> Self {
        Self {
            endpoint: endpoint.into(),
            config,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn config(&self) -> &SubscriptionConfig {
        &self.config
    }

    /// Dial the endpoint and subscribe to every account owned by `program_id`.
    pub async fn open(
        &self,
        program_id: &str,
    ) -> Result<(Subscription, NotificationReceiver), SubscriptionError> {
        let ms = self.config.connect_timeout_ms;
        info!(url = %self.endpoint, state = ?SubscriptionState::Connecting, "connecting to Solana websocket");

        let (socket, _) = timeout(Duration::from_millis(ms), connect_async(self.endpoint.as_str()))
            .await
            .map_err(|_| {
                error!(url = %self.endpoint, timeout_ms = ms, "websocket connect timed out");
                SubscriptionError::ConnectTimeout { ms }
            })?
            .map_err(|e| {
                error!(url = %self.endpoint, error = %e, "websocket connect failed");
                SubscriptionError::Connect {
                    url: self.endpoint.clone(),
                    reason: e.to_string(),
                }
            })?;

        open_on(socket, self.endpoint.clone(), program_id, &self.config).await
    }
}

/// Subscribe over an already established websocket.
pub async fn open_on<S>(
    mut socket: S,
    endpoint: impl Into<String>,
    program_id: &str,
    config: &SubscriptionConfig,
) -> Result<(Subscription, NotificationReceiver), SubscriptionError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>>
        + Sink<Message, Error = tungstenite::Error>
        + Send
        + Unpin
        + 'static,
{
    let endpoint = endpoint.into();
    let close_timeout = Duration::from_millis(config.close_timeout_ms);
    debug!(url = %endpoint, program_id, state = ?SubscriptionState::Subscribing, "sending programSubscribe");

    let id = match handshake(&mut socket, program_id, config).await {
        Ok(id) => id,
        Err(e) => {
            warn!(url = %endpoint, program_id, error = %e, "program subscription failed");
            if timeout(close_timeout, socket.close()).await.is_err() {
                debug!(url = %endpoint, "socket close timed out after failed handshake");
            }
            return Err(e);
        }
    };
    info!(url = %endpoint, program_id, subscription = id, "program subscription established");

    let (state_tx, state_rx) = watch::channel(SubscriptionState::Streaming);
    let (out_tx, out_rx) = mpsc::channel(config.channel_capacity.max(1));
    let (close_tx, close_rx) = oneshot::channel();
    let (sink, stream) = socket.split();

    let (raw_tx, raw_rx) = mpsc::unbounded_channel();
    let (err_tx, err_rx) = oneshot::channel();
    let reader = tokio::spawn(read_frames(stream, raw_tx, err_tx));
    let reader_abort = reader.abort_handle();

    let task = tokio::spawn(stream_notifications(
        sink,
        Reader {
            handle: reader,
            raw_rx,
            err_rx,
        },
        out_tx,
        close_rx,
        state_tx,
        close_timeout,
    ));

    let subscription = Subscription {
        id,
        endpoint,
        state: state_rx,
        control: Mutex::new(Control {
            close_tx: Some(close_tx),
            task: Some(task),
            reader: reader_abort,
        }),
        close_timeout,
    };
    Ok((subscription, out_rx))
}

async fn handshake<S>(
    socket: &mut S,
    program_id: &str,
    config: &SubscriptionConfig,
) -> Result<u64, SubscriptionError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>>
        + Sink<Message, Error = tungstenite::Error>
        + Unpin,
{
    let request = ProgramSubscribeRequest::new(
        SUBSCRIBE_REQUEST_ID,
        program_id,
        SubscribeOptions {
            encoding: config.encoding,
            commitment: config.commitment,
        },
    );
    socket.send(Message::Text(wire::encode_subscribe(&request)?)).await?;

    let ms = config.handshake_timeout_ms;
    let ack = timeout(Duration::from_millis(ms), read_ack(socket))
        .await
        .map_err(|_| SubscriptionError::HandshakeTimeout { ms })??;
    ack.into_subscription_id(&request.id)
}

/// The first data frame after the request is the ack.
async fn read_ack<S>(socket: &mut S) -> Result<SubscribeAck, SubscriptionError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    loop {
        let text = match socket.next().await {
            None | Some(Ok(Message::Close(_))) => return Err(SubscriptionError::Closed),
            Some(Err(e)) => return Err(e.into()),
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Binary(bytes))) => String::from_utf8(bytes)
                .map_err(|e| SubscriptionError::MalformedAck(e.to_string()))?,
            Some(Ok(_)) => continue,
        };
        return wire::decode_ack(&text).map_err(|e| SubscriptionError::MalformedAck(e.to_string()));
    }
}

enum Exit {
    CloseRequested,
    Finished,
}

/// The reader task and the channels it feeds.
struct Reader {
    handle: JoinHandle<()>,
    raw_rx: mpsc::UnboundedReceiver<String>,
    err_rx: oneshot::Receiver<tungstenite::Error>,
}

async fn stream_notifications<W>(
    mut sink: W,
    reader: Reader,
    out_tx: mpsc::Sender<Result<AccountNotification, SubscriptionError>>,
    mut close_rx: oneshot::Receiver<()>,
    state: watch::Sender<SubscriptionState>,
    close_timeout: Duration,
) -> Result<(), SubscriptionError>
where
    W: Sink<Message, Error = tungstenite::Error> + Send + Unpin,
{
    let Reader {
        handle: mut reader,
        mut raw_rx,
        mut err_rx,
    } = reader;
    let mut reader_done = false;

    // A dropped `Subscription` also resolves `close_rx`.
    let exit = loop {
        tokio::select! {
            biased;

            _ = &mut close_rx => break Exit::CloseRequested,

            raw = raw_rx.recv() => {
                let item = match raw {
                    Some(text) => wire::decode_notification(&text)
                        .map(|envelope| envelope.params)
                        .map_err(|e| {
                            error!(error = %e, "undecodable program notification");
                            SubscriptionError::from(e)
                        }),
                    None => {
                        let err = if reader_done {
                            SubscriptionError::Closed
                        } else {
                            reader_done = true;
                            err_rx.try_recv().map_or(SubscriptionError::Closed, SubscriptionError::from)
                        };
                        info!(reason = %err, "Solana websocket stream ended");
                        Err(err)
                    }
                };

                let fatal = item.is_err();
                tokio::select! {
                    biased;
                    _ = &mut close_rx => break Exit::CloseRequested,
                    sent = out_tx.send(item) => {
                        if sent.is_err() {
                            debug!("notification receiver dropped");
                            break Exit::Finished;
                        }
                    }
                }
                if fatal {
                    break Exit::Finished;
                }
            }

            read = &mut err_rx, if !reader_done => {
                reader_done = true;
                if let Ok(e) = read {
                    warn!(error = %e, "Solana websocket read failed");
                    tokio::select! {
                        biased;
                        _ = &mut close_rx => break Exit::CloseRequested,
                        _ = out_tx.send(Err(e.into())) => break Exit::Finished,
                    }
                }
            }
        }
    };

    let result = match exit {
        Exit::CloseRequested => {
            state.send_replace(SubscriptionState::Closing);
            info!("closing program subscription");
            close_socket(&mut sink, &mut reader, close_timeout).await
        }
        Exit::Finished => Ok(()),
    };

    reader.abort();
    drop(sink);
    drop(out_tx);
    state.send_replace(SubscriptionState::Closed);
    debug!("program subscription task finished");
    result
}

/// Send a normal close frame and wait for the reader to see the socket close.
async fn close_socket<W>(
    sink: &mut W,
    reader: &mut JoinHandle<()>,
    wait: Duration,
) -> Result<(), SubscriptionError>
where
    W: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let frame = CloseFrame {
        code: CloseCode::Normal,
        reason: "".into(),
    };
    let shutdown = async {
        sink.send(Message::Close(Some(frame))).await?;
        reader.await.map_err(|e| {
            warn!(error = %e, "websocket reader task failed");
            SubscriptionError::Task(e.to_string())
        })
    };

    match timeout(wait, shutdown).await {
        Ok(result) => result,
        Err(_) => {
            let ms = wait.as_millis() as u64;
            warn!(timeout_ms = ms, "peer did not complete the close handshake");
            Err(SubscriptionError::CloseTimeout { ms })
        }
    }
}

/// Sole reader of the socket.
async fn read_frames<R>(
    mut stream: R,
    raw_tx: mpsc::UnboundedSender<String>,
    err_tx: oneshot::Sender<tungstenite::Error>,
) where
    R: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => {
                    debug!("skipping non-UTF-8 binary frame");
                    continue;
                }
            },
            Ok(Message::Close(frame)) => {
                debug!(?frame, "received close frame");
                continue;
            }
            Ok(_) => continue,
            Err(e) => {
                let _ = err_tx.send(e);
                return;
            }
        };
        if raw_tx.send(text).is_err() {
            return;
        }
    }
}

#[derive(Debug)]
struct Control {
    close_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<Result<(), SubscriptionError>>>,
    /// Aborting the streaming task does not reach the reader it spawned.
    reader: AbortHandle,
}

/// Handle to a live program subscription.
///
/// Dropping it requests a close in the background; call [`Subscription::close`]
/// to wait for the connection to be released.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    endpoint: String,
    state: watch::Receiver<SubscriptionState>,
    control: Mutex<Control>,
    close_timeout: Duration,
}

impl Subscription {
    /// Subscription id assigned by the node.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn state(&self) -> SubscriptionState {
        *self.state.borrow()
    }

    /// Wait until the streaming task has released the connection.
    pub async fn closed(&self) {
        let mut state = self.state.clone();
        let _ = state.wait_for(|s| *s == SubscriptionState::Closed).await;
    }

    /// Close the connection and wait for the streaming task to finish.
    ///
    /// Safe to call repeatedly and after the stream has failed; only the first
    /// call does any work.
    pub async fn close(&self) -> Result<(), SubscriptionError> {
        let mut control = self.control.lock().await;
        let Some(mut task) = control.task.take() else {
            return Ok(());
        };
        if let Some(close_tx) = control.close_tx.take() {
            let _ = close_tx.send(());
        }

        // The task bounds its own close handshake; this is the backstop.
        let grace = self.close_timeout * 2;
        match timeout(grace, &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(SubscriptionError::Task(e.to_string())),
            Err(_) => {
                warn!(timeout_ms = grace.as_millis() as u64, "subscription task did not stop, aborting");
                task.abort();
                control.reader.abort();
                Err(SubscriptionError::CloseTimeout {
                    ms: grace.as_millis() as u64,
                })
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(close_tx) = self.control.get_mut().close_tx.take() {
            let _ = close_tx.send(());
        }
    }
}
