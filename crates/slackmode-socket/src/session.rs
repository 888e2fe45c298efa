//! Socket Mode session: handshake, steady-state serve loop, teardown.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use slackmode_api::{Ack, Envelope, Hello, TYPE_HELLO};
use slackmode_client::Client;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::chain;
use crate::errors::{SocketError, preview};
use crate::registry::Registry;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type SocketSink = SplitSink<WsStream, Message>;
type SocketReader = SplitStream<WsStream>;

/// One open Socket Mode connection and its three dispatch levels.
///
/// Registries are populated between [`Session::open`] and
/// [`Session::serve`]; once the serve loop starts they are treated as
/// read-only. A session whose connection has closed never becomes
/// usable again; reopen instead.
pub struct Session {
    envelope_types: Arc<Registry>,
    event_types: Arc<Registry>,
    notification_types: Arc<Registry>,

    writer: Arc<Mutex<SocketSink>>,
    reader: Option<SocketReader>,

    fatal_tx: mpsc::Sender<SocketError>,
    fatal_rx: Option<mpsc::Receiver<SocketError>>,

    closed: Arc<AtomicBool>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

impl Session {
    /// Negotiate an endpoint, connect, and validate the greeting.
    ///
    /// Every failure after the connection is dialed closes it before
    /// returning, leaving no leaked connection. The returned session has its
    /// three levels wired together and warn-only fallbacks installed;
    /// unknown-but-harmless traffic never breaks the session.
    pub async fn open(client: &Client) -> Result<Self, SocketError> {
        let negotiated = client.connections_open().await?;

        if let Err(source) = Url::parse(&negotiated.url) {
            return Err(SocketError::InvalidEndpoint {
                url: negotiated.url,
                source,
            });
        }

        let (socket, _response) =
            connect_async(negotiated.url.as_str())
                .await
                .map_err(|source| SocketError::Connect {
                    url: negotiated.url.clone(),
                    source,
                })?;
        let (mut writer, mut reader) = socket.split();

        let hello = match read_greeting(&mut reader).await {
            Ok(hello) => hello,
            Err(err) => {
                let _ = writer.close().await;
                return Err(err);
            }
        };
        debug!(
            app_id = %hello.connection_info.app_id,
            connections = hello.num_connections,
            "socket connected"
        );

        let envelope_types = Arc::new(Registry::new());
        let event_types = Arc::new(Registry::new());
        let notification_types = Arc::new(Registry::new());
        install_warn_fallback(&envelope_types, "envelope");
        install_warn_fallback(&event_types, "event");
        install_warn_fallback(&notification_types, "notification");
        chain::wire(&envelope_types, &event_types, &notification_types);

        let (fatal_tx, fatal_rx) = mpsc::channel(1);
        Ok(Self {
            envelope_types,
            event_types,
            notification_types,
            writer: Arc::new(Mutex::new(writer)),
            reader: Some(reader),
            fatal_tx,
            fatal_rx: Some(fatal_rx),
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    /// The outermost level, keyed by the envelope's own discriminator.
    pub fn envelope_types(&self) -> &Registry {
        &self.envelope_types
    }

    /// The middle level, keyed by the event wrapper's discriminator.
    pub fn event_types(&self) -> &Registry {
        &self.event_types
    }

    /// The innermost level, where domain handlers are registered.
    pub fn notification_types(&self) -> &Registry {
        &self.notification_types
    }

    /// Close the connection. Idempotent; safe to call concurrently.
    pub async fn close(&self) {
        close_socket(&self.writer, &self.closed).await;
    }

    /// Run the read→route→acknowledge loop until the session ends.
    ///
    /// Returns `Ok(())` on cooperative cancellation (a watcher
    /// force-closes the connection to unblock the read, and the
    /// resulting connection-closed error class is graceful
    /// termination). Any other read failure, a frame that is not an
    /// envelope, or an acknowledgment write failure from a prior
    /// handling unit terminates the loop with that error. Per-message
    /// handler failures are logged and never surface here. The
    /// connection is closed by the time `serve` returns.
    pub async fn serve(&mut self, cancel: CancellationToken) -> Result<(), SocketError> {
        let reader = self.reader.take().ok_or(SocketError::Closed)?;
        let mut fatal_rx = self.fatal_rx.take().ok_or(SocketError::Closed)?;

        let watcher = tokio::spawn({
            let cancel = cancel.clone();
            let writer = Arc::clone(&self.writer);
            let closed = Arc::clone(&self.closed);
            async move {
                cancel.cancelled().await;
                close_socket(&writer, &closed).await;
            }
        });

        let result = self.read_loop(reader, &mut fatal_rx).await;
        watcher.abort();
        // The session is over either way; leave no open connection behind.
        self.close().await;
        result
    }

    async fn read_loop(
        &self,
        mut reader: SocketReader,
        fatal_rx: &mut mpsc::Receiver<SocketError>,
    ) -> Result<(), SocketError> {
        loop {
            let frame = reader.next().await;

            // A fatal failure from a prior handling unit wins over
            // whatever this read produced.
            if let Ok(err) = fatal_rx.try_recv() {
                return Err(err);
            }

            let message = match frame {
                None => return Ok(()),
                Some(Err(err)) if is_connection_closed(&err) => return Ok(()),
                Some(Err(err)) => return Err(SocketError::Read(err)),
                Some(Ok(message)) => message,
            };
            let text = match message {
                Message::Text(text) => text,
                // Control and close frames are the transport's concern;
                // keep reading until the stream ends.
                _ => continue,
            };

            let envelope: Envelope =
                serde_json::from_str(&text).map_err(|source| SocketError::Frame {
                    preview: preview(&text),
                    source,
                })?;
            debug!(
                envelope_id = %envelope.envelope_id,
                discriminator = %envelope.kind,
                "envelope received"
            );

            self.spawn_handling_unit(envelope);
        }
    }

    /// Dispatch and acknowledge one envelope in its own task, so slow
    /// or blocked handlers never delay reading of subsequent frames.
    fn spawn_handling_unit(&self, envelope: Envelope) {
        let envelope_types = Arc::clone(&self.envelope_types);
        let writer = Arc::clone(&self.writer);
        let fatal_tx = self.fatal_tx.clone();
        let closed = Arc::clone(&self.closed);

        let _ = tokio::spawn(async move {
            let Envelope {
                envelope_id,
                kind,
                payload,
                ..
            } = envelope;

            if let Err(err) = envelope_types.dispatch(&kind, &payload).await {
                warn!(discriminator = %kind, error = %err, "envelope dispatch failed");
            }

            // Frames without an identifier are not acknowledged.
            if envelope_id.is_empty() {
                return;
            }

            let ack = Ack {
                envelope_id,
                payload: None,
            };
            let text = match serde_json::to_string(&ack) {
                Ok(text) => text,
                Err(err) => {
                    warn!(envelope_id = %ack.envelope_id, error = %err, "encoding acknowledgment");
                    return;
                }
            };

            let sent = writer.lock().await.send(Message::Text(text.into())).await;
            match sent {
                Ok(()) => debug!(envelope_id = %ack.envelope_id, "envelope acknowledged"),
                Err(source) => {
                    // One fatal cause is enough; if the slot is already
                    // occupied the new error is dropped. Closing the
                    // socket unblocks the main read loop.
                    let _ = fatal_tx.try_send(SocketError::Ack {
                        envelope_id: ack.envelope_id,
                        source,
                    });
                    close_socket(&writer, &closed).await;
                }
            }
        });
    }
}

/// Read data frames until the greeting arrives, skipping transport
/// control frames. Anything other than a well-formed `hello` is fatal.
async fn read_greeting(reader: &mut SocketReader) -> Result<Hello, SocketError> {
    loop {
        let message = match reader.next().await {
            None => return Err(SocketError::GreetingClosed),
            Some(Err(source)) => return Err(SocketError::GreetingRead { source }),
            Some(Ok(message)) => message,
        };
        let text = match message {
            Message::Text(text) => text,
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Close(_) => return Err(SocketError::GreetingClosed),
            _ => return Err(SocketError::GreetingNotText),
        };

        let hello: Hello =
            serde_json::from_str(&text).map_err(|source| SocketError::GreetingDecode {
                preview: preview(&text),
                source,
            })?;
        if hello.kind != TYPE_HELLO {
            return Err(SocketError::UnexpectedGreeting { got: hello.kind });
        }
        return Ok(hello);
    }
}

fn install_warn_fallback(registry: &Registry, level: &'static str) {
    registry.set_fallback(move |discriminator: String, payload: Value| async move {
        warn!(%discriminator, %payload, "unhandled {level} type");
        Ok(())
    });
}

async fn close_socket(writer: &Arc<Mutex<SocketSink>>, closed: &AtomicBool) {
    if closed.swap(true, Ordering::SeqCst) {
        return;
    }
    if let Err(err) = writer.lock().await.close().await {
        if !is_connection_closed(&err) {
            debug!(error = %err, "closing socket");
        }
    }
}

/// The error class produced by reading a connection we closed
/// ourselves; translated to graceful termination by the serve loop.
fn is_connection_closed(err: &tungstenite::Error) -> bool {
    matches!(
        err,
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed
    )
}
