use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use super::{Transport, TransportEvent, TransportEvents};
use crate::error::{Error, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Tuning knobs for [`WebSocketTransport`].
#[derive(Debug, Clone)]
pub struct WebSocketConfig {
	/// Upper bound for a single connect attempt.
	pub connect_timeout: Duration,
	/// Pause between reconnect attempts after an unclean close.
	pub reconnect_delay: Duration,
	/// Reconnect automatically when the peer drops the channel uncleanly.
	pub reconnect: bool,
	/// How long [`Transport::stop`] waits for the close handshake.
	pub close_timeout: Duration,
}

impl WebSocketConfig {
	pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
	pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(2);
	pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(1);
}

impl Default for WebSocketConfig {
	fn default() -> Self {
		Self {
			connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
			reconnect_delay: Self::DEFAULT_RECONNECT_DELAY,
			reconnect: true,
			close_timeout: Self::DEFAULT_CLOSE_TIMEOUT,
		}
	}
}

enum Outbound {
	Frame(String),
	Close,
}

enum SessionEnd {
	/// Close requested locally.
	Requested,
	/// Peer closed with a normal close code.
	Clean,
	Unclean(String),
}

/// WebSocket client transport.
///
/// Received text frames are queued until drained with
/// [`Transport::poll_incoming`]; every enqueued frame is announced with
/// [`TransportEvent::FrameReady`].
pub struct WebSocketTransport {
	config: WebSocketConfig,
	open: Arc<AtomicBool>,
	outbound: Mutex<Option<mpsc::UnboundedSender<Outbound>>>,
	intake: Mutex<Option<mpsc::UnboundedReceiver<String>>>,
	session: Mutex<Option<JoinHandle<()>>>,
}

impl WebSocketTransport {
	pub fn new() -> Self {
		Self::with_config(WebSocketConfig::default())
	}

	pub fn with_config(config: WebSocketConfig) -> Self {
		Self {
			config,
			open: Arc::new(AtomicBool::new(false)),
			outbound: Mutex::new(None),
			intake: Mutex::new(None),
			session: Mutex::new(None),
		}
	}

	pub fn config(&self) -> &WebSocketConfig {
		&self.config
	}
}

impl Default for WebSocketTransport {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Transport for WebSocketTransport {
	async fn start(&self, url: &str, events: TransportEvents) -> Result<()> {
		if self.session.lock().is_some() {
			self.stop().await;
		}

		let ws = open(url, self.config.connect_timeout).await?;
		info!(target = "vts.transport", url, "websocket connected");

		let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
		let (intake_tx, intake_rx) = mpsc::unbounded_channel();
		*self.outbound.lock() = Some(outbound_tx);
		*self.intake.lock() = Some(intake_rx);
		self.open.store(true, Ordering::SeqCst);
		let _ = events.send(TransportEvent::Connected);

		let session = Session {
			url: url.to_string(),
			config: self.config.clone(),
			open: Arc::clone(&self.open),
			outbound_rx,
			intake_tx,
			events,
		};
		*self.session.lock() = Some(tokio::spawn(session.run(ws)));
		Ok(())
	}

	async fn stop(&self) {
		self.open.store(false, Ordering::SeqCst);
		if let Some(outbound) = self.outbound.lock().take() {
			let _ = outbound.send(Outbound::Close);
		}
		let task = self.session.lock().take();
		if let Some(mut task) = task {
			if tokio::time::timeout(self.config.close_timeout, &mut task)
				.await
				.is_err()
			{
				debug!(target = "vts.transport", "close handshake timed out");
				task.abort();
			}
		}
	}

	fn send(&self, text: String) -> Result<()> {
		if !self.is_open() {
			return Err(Error::Transport("websocket is not open".into()));
		}
		let outbound = self.outbound.lock();
		let sender = outbound
			.as_ref()
			.ok_or_else(|| Error::Transport("websocket is not open".into()))?;
		sender
			.send(Outbound::Frame(text))
			.map_err(|_| Error::ChannelClosed)
	}

	fn poll_incoming(&self) -> Option<String> {
		self.intake.lock().as_mut()?.try_recv().ok()
	}

	fn is_open(&self) -> bool {
		self.open.load(Ordering::SeqCst)
	}
}

impl Drop for WebSocketTransport {
	fn drop(&mut self) {
		if let Some(task) = self.session.get_mut().take() {
			task.abort();
		}
	}
}

async fn open(url: &str, timeout: Duration) -> Result<WsStream> {
	match tokio::time::timeout(timeout, connect_async(url)).await {
		Ok(Ok((ws, _))) => Ok(ws),
		Ok(Err(e)) => Err(Error::ConnectionFailed(format!("{url}: {e}"))),
		Err(_) => Err(Error::Timeout(format!(
			"connecting to {url} took longer than {}s",
			timeout.as_secs()
		))),
	}
}

struct Session {
	url: String,
	config: WebSocketConfig,
	open: Arc<AtomicBool>,
	outbound_rx: mpsc::UnboundedReceiver<Outbound>,
	intake_tx: mpsc::UnboundedSender<String>,
	events: TransportEvents,
}

impl Session {
	async fn run(mut self, mut ws: WsStream) {
		loop {
			let end = self.pump(ws).await;
			self.open.store(false, Ordering::SeqCst);
			let _ = self.events.send(TransportEvent::Disconnected);

			let reason = match end {
				SessionEnd::Requested => {
					debug!(target = "vts.transport", "websocket closed locally");
					return;
				}
				SessionEnd::Clean => {
					info!(target = "vts.transport", "websocket closed by peer");
					return;
				}
				SessionEnd::Unclean(reason) => reason,
			};

			warn!(target = "vts.transport", %reason, "websocket dropped");
			if !self.config.reconnect {
				return;
			}
			match self.reconnect().await {
				Some(next) => ws = next,
				None => return,
			}
		}
	}

	/// Moves frames in both directions until the channel ends.
	async fn pump(&mut self, ws: WsStream) -> SessionEnd {
		let (mut sink, mut stream) = ws.split();
		loop {
			tokio::select! {
				outbound = self.outbound_rx.recv() => match outbound {
					Some(Outbound::Frame(text)) => {
						if let Err(e) = sink.send(WsMessage::Text(text.into())).await {
							return SessionEnd::Unclean(e.to_string());
						}
					}
					Some(Outbound::Close) | None => {
						let _ = sink.send(WsMessage::Close(None)).await;
						let _ = sink.close().await;
						return SessionEnd::Requested;
					}
				},
				inbound = stream.next() => match inbound {
					Some(Ok(WsMessage::Text(text))) => self.enqueue(text.to_string()),
					Some(Ok(WsMessage::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
						Ok(text) => self.enqueue(text),
						Err(_) => debug!(target = "vts.transport", "dropping non-UTF-8 binary frame"),
					},
					Some(Ok(WsMessage::Close(frame))) => {
						let normal = frame
							.as_ref()
							.is_none_or(|frame| frame.code == CloseCode::Normal);
						return if normal {
							SessionEnd::Clean
						} else {
							SessionEnd::Unclean(format!("close frame {frame:?}"))
						};
					}
					Some(Ok(_)) => {}
					Some(Err(e)) => return SessionEnd::Unclean(e.to_string()),
					None => return SessionEnd::Unclean("stream ended".into()),
				},
			}
		}
	}

	fn enqueue(&self, text: String) {
		if self.intake_tx.send(text).is_ok() {
			let _ = self.events.send(TransportEvent::FrameReady);
		}
	}

	/// Retries until connected or until a local close is requested.
	async fn reconnect(&mut self) -> Option<WsStream> {
		loop {
			tokio::select! {
				_ = tokio::time::sleep(self.config.reconnect_delay) => {}
				outbound = self.outbound_rx.recv() => match outbound {
					Some(Outbound::Frame(_)) => continue,
					Some(Outbound::Close) | None => return None,
				},
			}

			match open(&self.url, self.config.connect_timeout).await {
				Ok(ws) => {
					info!(target = "vts.transport", url = %self.url, "websocket reconnected");
					self.open.store(true, Ordering::SeqCst);
					let _ = self.events.send(TransportEvent::Connected);
					return Some(ws);
				}
				Err(e) => {
					debug!(target = "vts.transport", error = %e, "reconnect attempt failed");
					let _ = self.events.send(TransportEvent::Error(e.to_string()));
				}
			}
		}
	}
}
