//! Request/response correlation and inbound frame routing.
//!
//! The [`Connection`] sits between callers and the [`Transport`]. It handles:
//! - Stamping correlation IDs (`RequestID`) on outbound requests
//! - Holding one completion slot per in-flight request
//! - Routing each inbound frame to an event subscription or a pending request
//!
//! # Message Flow
//!
//! 1. Caller invokes [`Connection::send`] with an envelope
//! 2. Connection assigns a correlation ID and registers a oneshot slot
//! 3. The encoded envelope is handed to the transport
//! 4. Caller awaits the slot
//! 5. [`Connection::drain`] pulls frames from the transport one at a time
//! 6. Each frame is decoded via the [`SchemaRegistry`] and routed:
//!    active subscription first, then pending request, otherwise dropped
//! 7. Caller receives the decoded [`Message`] or an [`Error`]

mod subscriptions;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::{ReentrantMutex, RwLock};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use vts_protocol::{Envelope, ErrorId, Message, Payload, SchemaRegistry, decode_envelope};

pub use subscriptions::{ErrorHandler, EventHandler, EventSubscription, SubscriptionTable};

use crate::error::{Error, Result};
use crate::transport::Transport;

/// One registered request. `tag` is unique per registration, so a reused
/// correlation ID never aliases an older slot.
struct PendingSlot {
	tag: u64,
	tx: oneshot::Sender<Result<Message>>,
}

/// Pending request slots keyed by correlation ID.
type PendingMap = Arc<DashMap<String, PendingSlot>>;

/// RAII guard removing the pending slot when a request future is dropped
/// before its response arrives.
struct CancelGuard {
	request_id: String,
	tag: u64,
	pending: PendingMap,
	completed: bool,
}

impl CancelGuard {
	fn new(request_id: String, tag: u64, pending: PendingMap) -> Self {
		Self {
			request_id,
			tag,
			pending,
			completed: false,
		}
	}

	fn complete(&mut self) {
		self.completed = true;
	}
}

impl Drop for CancelGuard {
	fn drop(&mut self) {
		if self.completed {
			return;
		}
		let tag = self.tag;
		if self
			.pending
			.remove_if(&self.request_id, |_, slot| slot.tag == tag)
			.is_some()
		{
			debug!(request_id = %self.request_id, "CancelGuard: removed orphaned request");
		}
	}
}

/// Future returned by [`Connection::send`] with automatic cancellation cleanup.
struct ResponseFuture {
	rx: oneshot::Receiver<Result<Message>>,
	guard: CancelGuard,
}

impl Future for ResponseFuture {
	type Output = Result<Message>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match Pin::new(&mut self.rx).poll(cx) {
			Poll::Ready(result) => {
				self.guard.complete();
				Poll::Ready(result.map_err(|_| Error::ChannelClosed).and_then(|r| r))
			}
			Poll::Pending => Poll::Pending,
		}
	}
}

/// Outcome of routing one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
	/// Delivered to the event handler of an active subscription.
	Event { event_name: String },
	/// Failed to decode; delivered to the subscription's error handler.
	SubscriptionError { event_name: String },
	/// Completed a pending request.
	Response { request_id: String, is_error: bool },
	/// No subscription or pending request matched; dropped.
	Unroutable {
		message_type: String,
		request_id: String,
	},
	/// Undecodable and unclaimed; dropped.
	Malformed,
}

/// Session engine for one VTube Studio connection.
///
/// `send` may be called from any task. Inbound frames are consumed by a single
/// logical dispatcher via [`Connection::drain`], in arrival order.
///
/// Handlers run on the draining thread with the dispatch lock held. The lock
/// is reentrant, so a handler may itself call [`Connection::drain`] or
/// [`Connection::dispatch_frame`]; the nested call routes the frames that
/// follow before the outer one resumes.
pub struct Connection {
	last_id: AtomicU64,
	last_tag: AtomicU64,
	pending: PendingMap,
	subscriptions: SubscriptionTable,
	transport: RwLock<Option<Arc<dyn Transport>>>,
	registry: Arc<SchemaRegistry>,
	dispatch_lock: ReentrantMutex<()>,
}

impl Connection {
	/// Creates a connection decoding with the standard schema table.
	pub fn new() -> Self {
		Self::with_registry(Arc::new(SchemaRegistry::with_standard_schemas()))
	}

	pub fn with_registry(registry: Arc<SchemaRegistry>) -> Self {
		Self {
			last_id: AtomicU64::new(0),
			last_tag: AtomicU64::new(0),
			pending: Arc::new(DashMap::new()),
			subscriptions: SubscriptionTable::new(),
			transport: RwLock::new(None),
			registry,
			dispatch_lock: ReentrantMutex::new(()),
		}
	}

	/// Attaches the transport used for subsequent sends and drains.
	pub fn attach(&self, transport: Arc<dyn Transport>) {
		*self.transport.write() = Some(transport);
	}

	pub fn detach(&self) -> Option<Arc<dyn Transport>> {
		self.transport.write().take()
	}

	pub fn transport(&self) -> Option<Arc<dyn Transport>> {
		self.transport.read().clone()
	}

	pub fn is_attached(&self) -> bool {
		self.transport.read().is_some()
	}

	pub fn subscriptions(&self) -> &SubscriptionTable {
		&self.subscriptions
	}

	pub fn registry(&self) -> &SchemaRegistry {
		&self.registry
	}

	/// Number of requests awaiting a response.
	pub fn pending_count(&self) -> usize {
		self.pending.len()
	}

	pub fn is_pending(&self, request_id: &str) -> bool {
		self.pending.contains_key(request_id)
	}

	/// Sends a request and awaits the matching response.
	///
	/// An empty `RequestID` is replaced by a fresh one. `APIError` answers are
	/// returned as [`Error::Api`]. Dropping the returned future forgets the
	/// request; a late response is then dropped as unroutable.
	pub async fn send(&self, mut request: Envelope<Value>) -> Result<Message> {
		let transport = self.transport().ok_or(Error::NotAttached)?;

		let (tag, rx) = self.register(&mut request)?;
		let guard = CancelGuard::new(request.request_id.clone(), tag, Arc::clone(&self.pending));

		debug!(
			request_id = %request.request_id,
			message_type = %request.message_type,
			"sending request"
		);

		let text = request.to_text()?;
		transport.send(text)?;

		ResponseFuture { rx, guard }.await
	}

	fn register(&self, request: &mut Envelope<Value>) -> Result<(u64, oneshot::Receiver<Result<Message>>)> {
		let (tx, rx) = oneshot::channel();
		let tag = self.last_tag.fetch_add(1, Ordering::Relaxed);
		let slot = PendingSlot { tag, tx };

		if !request.request_id.is_empty() {
			match self.pending.entry(request.request_id.clone()) {
				Entry::Occupied(_) => {
					return Err(Error::DuplicateRequestId(request.request_id.clone()));
				}
				Entry::Vacant(entry) => {
					entry.insert(slot);
				}
			}
			return Ok((tag, rx));
		}

		loop {
			let id = self.last_id.fetch_add(1, Ordering::SeqCst).to_string();
			if let Entry::Vacant(entry) = self.pending.entry(id.clone()) {
				entry.insert(slot);
				request.request_id = id;
				return Ok((tag, rx));
			}
		}
	}

	/// Routes every frame currently queued in the transport. Returns the number
	/// of frames processed.
	pub fn drain(&self) -> usize {
		let Some(transport) = self.transport() else {
			return 0;
		};

		let _serial = self.dispatch_lock.lock();
		let mut count = 0;
		while let Some(frame) = transport.poll_incoming() {
			self.route(&frame);
			count += 1;
		}
		count
	}

	/// Routes a single inbound frame.
	pub fn dispatch_frame(&self, text: &str) -> Dispatch {
		let _serial = self.dispatch_lock.lock();
		self.route(text)
	}

	fn route(&self, text: &str) -> Dispatch {
		let envelope = match decode_envelope(text) {
			Ok(envelope) => envelope,
			Err(e) => {
				warn!(error = %e, "dropping undecodable frame");
				return Dispatch::Malformed;
			}
		};

		let message_type = envelope.message_type.clone();
		let request_id = envelope.request_id.clone();
		let decoded = self.registry.decode(envelope);

		if let Some(subscription) = self.subscriptions.get(&message_type) {
			return match decoded {
				Ok(message) => {
					debug!(event = %message_type, "dispatching event");
					(subscription.on_event)(message);
					Dispatch::Event {
						event_name: message_type,
					}
				}
				Err(source) => {
					warn!(event = %message_type, error = %source, "failed to decode event");
					(subscription.on_error)(Error::Api {
						error_id: ErrorId::INTERNAL_SERVER_ERROR,
						message: format!("Failed to decode {message_type}: {source}"),
						request_id,
					});
					Dispatch::SubscriptionError {
						event_name: message_type,
					}
				}
			};
		}

		if let Some((_, slot)) = self.pending.remove(&request_id) {
			let result = match decoded {
				Ok(message) => response_result(message),
				Err(source) => Err(Error::Decode {
					message_type,
					source,
				}),
			};
			let is_error = result.is_err();
			debug!(request_id = %request_id, is_error, "completing request");
			let _ = slot.tx.send(result);
			return Dispatch::Response {
				request_id,
				is_error,
			};
		}

		match decoded {
			Ok(_) => {
				debug!(
					message_type = %message_type,
					request_id = %request_id,
					"dropping unroutable frame"
				);
				Dispatch::Unroutable {
					message_type,
					request_id,
				}
			}
			Err(e) => {
				warn!(message_type = %message_type, error = %e, "dropping undecodable frame");
				Dispatch::Malformed
			}
		}
	}
}

impl Default for Connection {
	fn default() -> Self {
		Self::new()
	}
}

/// Converts a decoded response into the caller's result.
fn response_result(message: Message) -> Result<Message> {
	match message.data {
		Payload::ApiError(error) => Err(Error::Api {
			error_id: error.error_id,
			message: error.message,
			request_id: message.request_id,
		}),
		_ => Ok(message),
	}
}
