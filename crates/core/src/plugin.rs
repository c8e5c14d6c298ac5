//! Host-facing plugin facade.
//!
//! A [`Plugin`] owns one logical connection to VTube Studio. Connecting runs a
//! sequential pipeline:
//!
//! 1. start the transport towards the current [`ConnectionTarget`]
//! 2. run the [`AuthGate`]
//! 3. replay every registered event subscription
//! 4. publish [`SessionEvent::Connected`] and resolve [`Plugin::connect`]
//!
//! The same pipeline runs again whenever the transport reconnects on its own.
//! A background event loop drains inbound frames into the [`Connection`]
//! whenever the transport reports [`TransportEvent::FrameReady`].

use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use vts_protocol::{Envelope, EventSubscriptionResponse, Message, SchemaRegistry};
use vts_runtime::{
	Connection, ConnectionTarget, DiscoveredPeer, DiscoveryService, Error, Result, Transport,
	TransportEvent, WebSocketTransport,
};

use crate::api::request;
use crate::auth::{AuthGate, AuthState};
use crate::config::PluginConfig;
use crate::events::{EventConfig, EventRegistry};
use crate::session::{SessionEvent, SessionEvents};
use crate::token::{FileTokenStore, MemoryTokenStore, TokenStore};

const SESSION_EVENT_CAPACITY: usize = 64;

/// Builder for [`Plugin`], used to swap in custom collaborators.
pub struct PluginBuilder {
	config: PluginConfig,
	transport: Option<Arc<dyn Transport>>,
	token_store: Option<Arc<dyn TokenStore>>,
	discovery: Option<Arc<DiscoveryService>>,
	registry: Option<Arc<SchemaRegistry>>,
}

impl PluginBuilder {
	pub fn new(config: PluginConfig) -> Self {
		Self {
			config,
			transport: None,
			token_store: None,
			discovery: None,
			registry: None,
		}
	}

	pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
		self.transport = Some(transport);
		self
	}

	pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
		self.token_store = Some(store);
		self
	}

	/// Shares a discovery service with other plugins of the process.
	pub fn discovery(mut self, discovery: Arc<DiscoveryService>) -> Self {
		self.discovery = Some(discovery);
		self
	}

	pub fn schema_registry(mut self, registry: Arc<SchemaRegistry>) -> Self {
		self.registry = Some(registry);
		self
	}

	pub fn build(self) -> Result<Plugin> {
		self.config.validate()?;

		let token_store = match self.token_store {
			Some(store) => store,
			None => default_token_store(&self.config),
		};
		let transport = self
			.transport
			.unwrap_or_else(|| Arc::new(WebSocketTransport::new()));
		let discovery = self
			.discovery
			.unwrap_or_else(|| Arc::new(DiscoveryService::new()));
		let connection = Arc::new(match self.registry {
			Some(registry) => Connection::with_registry(registry),
			None => Connection::new(),
		});
		let (session_tx, _) = broadcast::channel(SESSION_EVENT_CAPACITY);

		Ok(Plugin {
			inner: Arc::new(Inner {
				auth: AuthGate::new(&self.config, token_store),
				events: EventRegistry::new(Arc::clone(&connection)),
				target: RwLock::new(self.config.target()),
				config: self.config,
				connection,
				transport,
				discovery,
				session_tx,
				pending_connect: Mutex::new(None),
				generation: AtomicU64::new(0),
				event_loop: Mutex::new(None),
				pipeline: Mutex::new(None),
			}),
		})
	}
}

fn default_token_store(config: &PluginConfig) -> Arc<dyn TokenStore> {
	match config.token_path.clone().or_else(FileTokenStore::default_path) {
		Some(path) => Arc::new(FileTokenStore::new(path)),
		None => {
			warn!("no config directory available, keeping the token in memory");
			Arc::new(MemoryTokenStore::new())
		}
	}
}

/// A VTube Studio plugin session. Cheap to clone.
#[derive(Clone)]
pub struct Plugin {
	inner: Arc<Inner>,
}

struct Inner {
	config: PluginConfig,
	connection: Arc<Connection>,
	transport: Arc<dyn Transport>,
	auth: AuthGate,
	events: EventRegistry,
	discovery: Arc<DiscoveryService>,
	target: RwLock<ConnectionTarget>,
	session_tx: broadcast::Sender<SessionEvent>,
	pending_connect: Mutex<Option<oneshot::Sender<Result<()>>>>,
	/// Bumped per connect; events from older transport runs are ignored.
	generation: AtomicU64,
	event_loop: Mutex<Option<JoinHandle<()>>>,
	pipeline: Mutex<Option<JoinHandle<()>>>,
}

impl Plugin {
	pub fn builder(config: PluginConfig) -> PluginBuilder {
		PluginBuilder::new(config)
	}

	/// Builds a plugin with the WebSocket transport and file token store.
	pub fn new(config: PluginConfig) -> Result<Self> {
		PluginBuilder::new(config).build()
	}

	pub fn config(&self) -> &PluginConfig {
		&self.inner.config
	}

	pub fn connection(&self) -> &Arc<Connection> {
		&self.inner.connection
	}

	pub fn discovery(&self) -> &Arc<DiscoveryService> {
		&self.inner.discovery
	}

	pub fn events(&self) -> &EventRegistry {
		&self.inner.events
	}

	pub fn auth_state(&self) -> AuthState {
		self.inner.auth.state()
	}

	pub fn is_authenticated(&self) -> bool {
		self.inner.auth.is_authenticated()
	}

	pub fn is_connected(&self) -> bool {
		self.inner.transport.is_open()
	}

	pub fn token_store(&self) -> &Arc<dyn TokenStore> {
		self.inner.auth.token_store()
	}

	/// Subscribes to session lifecycle notifications.
	pub fn session_events(&self) -> SessionEvents {
		SessionEvents::new(self.inner.session_tx.subscribe())
	}

	/// Opens the channel, authenticates, and replays subscriptions.
	///
	/// Resolves once the session is usable, or with the first failure.
	pub async fn connect(&self) -> Result<()> {
		let (done_tx, done_rx) = oneshot::channel();
		if let Some(previous) = self.inner.pending_connect.lock().replace(done_tx) {
			let _ = previous.send(Err(Error::ConnectionFailed("superseded by a new connect".into())));
		}

		let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
		let (events_tx, events_rx) = mpsc::unbounded_channel();
		let event_loop = tokio::spawn(run_event_loop(
			Arc::downgrade(&self.inner),
			generation,
			events_rx,
		));
		if let Some(previous) = self.inner.event_loop.lock().replace(event_loop) {
			previous.abort();
		}

		self.inner.connection.attach(Arc::clone(&self.inner.transport));
		let url = self.target().url();
		info!(%url, "connecting to VTube Studio");

		if let Err(e) = self.inner.transport.start(&url, events_tx).await {
			self.inner.pending_connect.lock().take();
			return Err(e);
		}

		let result = done_rx.await.unwrap_or(Err(Error::ChannelClosed));
		if result.is_err() && self.inner.transport.is_open() {
			self.inner.transport.stop().await;
		}
		result
	}

	/// Closes the channel. Subscriptions stay registered for the next connect.
	pub async fn disconnect(&self) {
		info!("disconnecting from VTube Studio");
		self.inner.transport.stop().await;
		self.inner.auth.reset();
		if let Some(pipeline) = self.inner.pipeline.lock().take() {
			pipeline.abort();
		}
	}

	/// Sends a raw request through the session engine.
	pub async fn send(&self, request: Envelope<Value>) -> Result<Message> {
		self.inner.connection.send(request).await
	}

	/// Sends `data` as a request of the given type.
	pub async fn request<T: Serialize>(&self, message_type: &str, data: &T) -> Result<Message> {
		self.send(request(message_type, data)?).await
	}

	/// Subscribes to a pushed event; re-subscribing with the same name replaces
	/// the previous handlers.
	pub async fn subscribe<F, E>(
		&self,
		event_name: impl AsRef<str>,
		config: Option<Value>,
		on_event: F,
		on_error: E,
	) -> Result<EventSubscriptionResponse>
	where
		F: Fn(Message) + Send + Sync + 'static,
		E: Fn(Error) + Send + Sync + 'static,
	{
		self.inner
			.events
			.subscribe(
				event_name.as_ref(),
				config,
				Arc::new(on_event),
				Arc::new(on_error),
			)
			.await
	}

	/// Subscribes using a typed event config.
	pub async fn subscribe_with<C, F, E>(
		&self,
		config: &C,
		on_event: F,
		on_error: E,
	) -> Result<EventSubscriptionResponse>
	where
		C: EventConfig,
		F: Fn(Message) + Send + Sync + 'static,
		E: Fn(Error) + Send + Sync + 'static,
	{
		self.subscribe(C::KIND, config.to_config()?, on_event, on_error)
			.await
	}

	pub async fn unsubscribe(&self, event_name: impl AsRef<str>) -> Result<EventSubscriptionResponse> {
		self.inner.events.unsubscribe(event_name.as_ref()).await
	}

	pub async fn unsubscribe_all(&self) -> Result<EventSubscriptionResponse> {
		self.inner.events.unsubscribe_all().await
	}

	/// Target of the next connect.
	pub fn target(&self) -> ConnectionTarget {
		*self.inner.target.read()
	}

	/// Selects a discovered API port for the next connect.
	///
	/// Returns false, leaving the target unchanged, unless a broadcast for
	/// `port` has been seen.
	pub fn set_port(&self, port: u16) -> bool {
		if !self.inner.discovery.contains_port(port) {
			return false;
		}
		self.inner.target.write().port = port;
		debug!(port, "connection port updated");
		true
	}

	/// Sets the address for the next connect. Returns false unless `address`
	/// is an IP literal.
	pub fn set_ip_address(&self, address: &str) -> bool {
		match address.trim().parse::<IpAddr>() {
			Ok(address) => {
				self.inner.target.write().address = address;
				debug!(%address, "connection address updated");
				true
			}
			Err(_) => false,
		}
	}

	/// Harvests pending discovery broadcasts; binds the listener on first use.
	pub fn poll_discovery(&self) -> Result<Option<u16>> {
		self.inner.discovery.poll()
	}

	/// Snapshot of the discovered peers.
	pub fn peers(&self) -> Vec<DiscoveredPeer> {
		self.inner.discovery.peers().into_values().collect()
	}
}

impl Inner {
	fn publish(&self, event: SessionEvent) {
		let _ = self.session_tx.send(event);
	}

	fn on_connected(self: &Arc<Self>) {
		let inner = Arc::clone(self);
		let pipeline = tokio::spawn(async move {
			let result = inner.establish().await;
			match &result {
				Ok(()) => inner.publish(SessionEvent::Connected),
				Err(e) => {
					warn!(error = %e, "connect pipeline failed");
					inner.publish(SessionEvent::Error(e.to_string()));
				}
			}
			if let Some(done) = inner.pending_connect.lock().take() {
				let _ = done.send(result);
			}
		});
		if let Some(previous) = self.pipeline.lock().replace(pipeline) {
			previous.abort();
		}
	}

	async fn establish(&self) -> Result<()> {
		self.auth.authenticate(&self.connection).await?;
		let replayed = self.events.resubscribe_all().await;
		info!(replayed, "session established");
		Ok(())
	}

	fn on_disconnected(&self) {
		self.auth.reset();
		if let Some(pipeline) = self.pipeline.lock().take() {
			pipeline.abort();
		}
		self.publish(SessionEvent::Disconnected);
		if let Some(done) = self.pending_connect.lock().take() {
			let _ = done.send(Err(Error::ConnectionFailed(
				"disconnected before the session was established".into(),
			)));
		}
	}
}

impl Drop for Inner {
	fn drop(&mut self) {
		if let Some(task) = self.event_loop.get_mut().take() {
			task.abort();
		}
		if let Some(task) = self.pipeline.get_mut().take() {
			task.abort();
		}
	}
}

async fn run_event_loop(
	inner: Weak<Inner>,
	generation: u64,
	mut events: mpsc::UnboundedReceiver<TransportEvent>,
) {
	while let Some(event) = events.recv().await {
		let Some(inner) = inner.upgrade() else {
			break;
		};
		if inner.generation.load(Ordering::SeqCst) != generation {
			debug!(generation, "stale transport events, stopping event loop");
			break;
		}
		match event {
			TransportEvent::FrameReady => {
				inner.connection.drain();
			}
			TransportEvent::Connected => {
				info!("transport connected");
				inner.on_connected();
			}
			TransportEvent::Disconnected => {
				info!("transport disconnected");
				inner.on_disconnected();
			}
			TransportEvent::Error(message) => {
				warn!(%message, "transport error");
				inner.publish(SessionEvent::Error(message));
			}
		}
	}
	debug!("event loop finished");
}
