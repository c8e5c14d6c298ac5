//! Table of active push-event subscriptions keyed by event name.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use vts_protocol::Message;

use crate::error::Error;

/// Callback receiving decoded event frames.
///
/// Runs on the thread draining the connection, in arrival order. Re-entering
/// `drain` from a handler is allowed and routes the next queued frames first.
pub type EventHandler = Arc<dyn Fn(Message) + Send + Sync>;

/// Callback receiving decode or replay failures for a subscription.
pub type ErrorHandler = Arc<dyn Fn(Error) + Send + Sync>;

/// One active subscription, with everything needed to replay it.
#[derive(Clone)]
pub struct EventSubscription {
	pub event_name: String,
	pub config: Option<Value>,
	pub on_event: EventHandler,
	pub on_error: ErrorHandler,
}

impl fmt::Debug for EventSubscription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EventSubscription")
			.field("event_name", &self.event_name)
			.field("config", &self.config)
			.finish_non_exhaustive()
	}
}

/// Shared, cloneable handle to the subscription table.
///
/// Readers get snapshots (cloned entries), so callbacks always run with the
/// lock released.
#[derive(Clone, Default)]
pub struct SubscriptionTable {
	entries: Arc<RwLock<HashMap<String, EventSubscription>>>,
}

impl SubscriptionTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Installs `subscription`, returning the entry it replaced.
	pub fn insert(&self, subscription: EventSubscription) -> Option<EventSubscription> {
		self.entries
			.write()
			.insert(subscription.event_name.clone(), subscription)
	}

	pub fn remove(&self, event_name: &str) -> Option<EventSubscription> {
		self.entries.write().remove(event_name)
	}

	pub fn clear(&self) {
		self.entries.write().clear();
	}

	pub fn get(&self, event_name: &str) -> Option<EventSubscription> {
		self.entries.read().get(event_name).cloned()
	}

	pub fn contains(&self, event_name: &str) -> bool {
		self.entries.read().contains_key(event_name)
	}

	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}

	/// Copies every entry out of the table.
	pub fn snapshot(&self) -> Vec<EventSubscription> {
		self.entries.read().values().cloned().collect()
	}

	/// Subscribed event names, sorted.
	pub fn names(&self) -> Vec<String> {
		let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
		names.sort();
		names
	}
}

impl fmt::Debug for SubscriptionTable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SubscriptionTable")
			.field("events", &self.names())
			.finish()
	}
}
