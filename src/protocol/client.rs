use super::events::{ProtocolEvent, TransportEvent};
use super::message::{IncomingMessage, ProtocolRequest};
use crate::error::{DebuggerError, Result};
use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

/// Request/response access to the debuggee. Everything above the transport
/// talks to the remote debugger through this trait.
#[async_trait]
pub trait ProtocolClient: Send + Sync {
    async fn call(&self, method: &str, params: Value) -> Result<Value>;
}

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value>>>>>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TargetInfo {
    #[serde(default)]
    web_socket_debugger_url: Option<String>,
}

/// WebSocket client for the inspector endpoint of a running debuggee.
pub struct InspectorClient {
    next_id: AtomicU64,
    pending: PendingMap,
    sink: tokio::sync::Mutex<Option<SplitSink<Socket, Message>>>,
    reader: Mutex<Option<JoinHandle<()>>>,
    events: mpsc::UnboundedSender<TransportEvent>,
}

impl InspectorClient {
    pub fn new(events: mpsc::UnboundedSender<TransportEvent>) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            pending: Arc::new(Mutex::new(HashMap::new())),
            sink: tokio::sync::Mutex::new(None),
            reader: Mutex::new(None),
            events,
        }
    }

    /// Looks up the debuggee's WebSocket URL and opens the connection.
    pub async fn connect(&self, host: &str, port: u16) -> Result<()> {
        let url = discover_websocket_url(host, port).await?;
        self.connect_url(&url).await
    }

    pub async fn connect_url(&self, url: &str) -> Result<()> {
        debug!(%url, "opening inspector websocket");
        let (socket, _) = connect_async(url).await?;
        let (sink, stream) = socket.split();

        *self.sink.lock().await = Some(sink);
        let handle = tokio::spawn(read_loop(stream, self.pending.clone(), self.events.clone()));
        let previous = self
            .reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
        Ok(())
    }

    /// Drops the connection and fails every outstanding call. Once this
    /// returns, the old connection delivers no further events.
    pub async fn reset(&self) {
        let reader = self
            .reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(reader) = reader {
            reader.abort();
            let _ = reader.await;
        }
        if let Some(mut sink) = self.sink.lock().await.take() {
            let _ = sink.close().await;
        }
        fail_pending(&self.pending);
    }

    pub async fn is_connected(&self) -> bool {
        self.sink.lock().await.is_some()
    }

    fn forget(&self, id: u64) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }
}

#[async_trait]
impl ProtocolClient for InspectorClient {
    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let text = serde_json::to_string(&ProtocolRequest { id, method, params })?;
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, tx);

        {
            let mut sink = self.sink.lock().await;
            let Some(sink) = sink.as_mut() else {
                self.forget(id);
                return Err(DebuggerError::TransportClosed);
            };
            if let Err(err) = sink.send(Message::Text(text)).await {
                self.forget(id);
                return Err(err.into());
            }
        }

        debug!(id, method, "request sent");
        rx.await.map_err(|_| DebuggerError::TransportClosed)?
    }
}

async fn discover_websocket_url(host: &str, port: u16) -> Result<String> {
    let authority = if host.contains(':') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    };
    let targets: Vec<TargetInfo> = reqwest::get(format!("http://{}/json/list", authority))
        .await?
        .json()
        .await?;

    targets
        .into_iter()
        .find_map(|target| target.web_socket_debugger_url)
        .ok_or_else(|| {
            DebuggerError::Connection(format!("no debuggable target at {}", authority))
        })
}

async fn read_loop(
    mut stream: SplitStream<Socket>,
    pending: PendingMap,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(err) => {
                warn!(error = %err, "inspector socket failed");
                break;
            }
        };

        match IncomingMessage::parse(&text) {
            Ok(IncomingMessage::Response { id, result, error }) => {
                let waiter = pending
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(&id);
                let Some(waiter) = waiter else {
                    warn!(id, "response for unknown request");
                    continue;
                };
                let outcome = match error {
                    Some(err) => Err(DebuggerError::Protocol {
                        code: err.code,
                        message: err.message,
                    }),
                    None => Ok(result.unwrap_or(Value::Null)),
                };
                let _ = waiter.send(outcome);
            }
            Ok(IncomingMessage::Event { method, params }) => {
                match ProtocolEvent::parse(&method, params) {
                    Ok(event) => {
                        if events.send(TransportEvent::Event(event)).is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!(%method, error = %err, "dropping malformed event"),
                }
            }
            Err(err) => warn!(error = %err, "dropping unparseable message"),
        }
    }

    fail_pending(&pending);
    let _ = events.send(TransportEvent::Closed);
}

fn fail_pending(pending: &PendingMap) {
    let waiters: Vec<_> = pending
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .drain()
        .map(|(_, waiter)| waiter)
        .collect();
    for waiter in waiters {
        let _ = waiter.send(Err(DebuggerError::TransportClosed));
    }
}
