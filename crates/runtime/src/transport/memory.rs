use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::Value;
use vts_protocol::{Envelope, decode_envelope};

use super::{Transport, TransportEvent, TransportEvents};
use crate::error::{Error, Result};

/// Scripted peer behaviour: maps each outbound request to the frames the peer
/// answers with.
pub type Responder = Arc<dyn Fn(&Envelope<Value>) -> Vec<String> + Send + Sync>;

/// Builds a reply frame echoing the correlation ID of `request`.
pub fn respond_to<T: Serialize>(request: &Envelope<Value>, message_type: &str, data: &T) -> String {
	let data = serde_json::to_value(data).unwrap_or(Value::Null);
	Envelope::new(message_type, data)
		.with_request_id(request.request_id.clone())
		.to_text()
		.unwrap_or_default()
}

/// In-process transport backed by queues.
///
/// Outbound frames are recorded and optionally answered by a [`Responder`];
/// inbound frames are injected with [`MemoryTransport::push_incoming`].
/// Lifecycle changes are simulated explicitly.
#[derive(Default)]
pub struct MemoryTransport {
	open: AtomicBool,
	fail_sends: AtomicBool,
	fail_start: AtomicBool,
	events: Mutex<Option<TransportEvents>>,
	incoming: Mutex<VecDeque<String>>,
	sent: Mutex<Vec<String>>,
	started: Mutex<Vec<String>>,
	responder: RwLock<Option<Responder>>,
}

impl MemoryTransport {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a transport whose peer answers every request via `responder`.
	pub fn with_responder(
		responder: impl Fn(&Envelope<Value>) -> Vec<String> + Send + Sync + 'static,
	) -> Self {
		let transport = Self::new();
		transport.set_responder(responder);
		transport
	}

	pub fn set_responder(
		&self,
		responder: impl Fn(&Envelope<Value>) -> Vec<String> + Send + Sync + 'static,
	) {
		*self.responder.write() = Some(Arc::new(responder));
	}

	/// Injects a frame as if the peer had sent it.
	pub fn push_incoming(&self, text: impl Into<String>) {
		self.incoming.lock().push_back(text.into());
		self.emit(TransportEvent::FrameReady);
	}

	/// Injects an envelope as if the peer had sent it.
	pub fn push_envelope<T: Serialize>(&self, envelope: &Envelope<T>) -> Result<()> {
		self.push_incoming(envelope.to_text()?);
		Ok(())
	}

	/// Every frame sent so far, in order.
	pub fn sent_frames(&self) -> Vec<String> {
		self.sent.lock().clone()
	}

	/// Every frame sent so far, decoded.
	pub fn sent_envelopes(&self) -> Vec<Envelope<Value>> {
		self.sent
			.lock()
			.iter()
			.filter_map(|text| decode_envelope(text).ok())
			.collect()
	}

	/// Number of sent frames with the given discriminator.
	pub fn sent_count(&self, message_type: &str) -> usize {
		self.sent_envelopes()
			.iter()
			.filter(|envelope| envelope.message_type == message_type)
			.count()
	}

	/// URLs passed to [`Transport::start`], in order.
	pub fn started_urls(&self) -> Vec<String> {
		self.started.lock().clone()
	}

	/// Makes every subsequent `send` fail.
	pub fn fail_sends(&self, fail: bool) {
		self.fail_sends.store(fail, Ordering::SeqCst);
	}

	/// Makes every subsequent `start` fail.
	pub fn fail_start(&self, fail: bool) {
		self.fail_start.store(fail, Ordering::SeqCst);
	}

	/// Drops the channel as if the peer went away.
	pub fn simulate_disconnect(&self) {
		self.open.store(false, Ordering::SeqCst);
		self.emit(TransportEvent::Disconnected);
	}

	/// Reopens the channel as if the transport reconnected on its own.
	pub fn simulate_reconnect(&self) {
		self.open.store(true, Ordering::SeqCst);
		self.emit(TransportEvent::Connected);
	}

	fn emit(&self, event: TransportEvent) {
		if let Some(events) = self.events.lock().as_ref() {
			let _ = events.send(event);
		}
	}
}

#[async_trait]
impl Transport for MemoryTransport {
	async fn start(&self, url: &str, events: TransportEvents) -> Result<()> {
		self.started.lock().push(url.to_string());
		if self.fail_start.load(Ordering::SeqCst) {
			return Err(Error::ConnectionFailed(format!("{url}: refused")));
		}
		*self.events.lock() = Some(events);
		self.open.store(true, Ordering::SeqCst);
		self.emit(TransportEvent::Connected);
		Ok(())
	}

	async fn stop(&self) {
		if self.open.swap(false, Ordering::SeqCst) {
			self.emit(TransportEvent::Disconnected);
		}
		self.events.lock().take();
	}

	fn send(&self, text: String) -> Result<()> {
		if !self.is_open() {
			return Err(Error::Transport("memory transport is closed".into()));
		}
		if self.fail_sends.load(Ordering::SeqCst) {
			return Err(Error::Transport("send failed".into()));
		}

		let replies = match (self.responder.read().clone(), decode_envelope(&text)) {
			(Some(responder), Ok(request)) => responder(&request),
			_ => Vec::new(),
		};
		self.sent.lock().push(text);
		for reply in replies {
			self.push_incoming(reply);
		}
		Ok(())
	}

	fn poll_incoming(&self) -> Option<String> {
		self.incoming.lock().pop_front()
	}

	fn is_open(&self) -> bool {
		self.open.load(Ordering::SeqCst)
	}
}
