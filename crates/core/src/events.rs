//! Push-event subscriptions.
//!
//! [`EventRegistry`] performs the subscribe/unsubscribe round-trips and keeps
//! the local [`SubscriptionTable`] in step with what the peer acknowledged.
//! Entries outlive the transport: after every reconnect the plugin replays them
//! with [`EventRegistry::resubscribe_all`] before reporting the session as
//! connected.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use vts_protocol::events::EventSubscriptionRequest;
use vts_protocol::{EventSubscriptionResponse, Payload, message_type};
use vts_runtime::{
	Connection, Error, ErrorHandler, EventHandler, EventSubscription, Result, SubscriptionTable,
};

use crate::api::request;

/// Events VTube Studio can push to a plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
	Test,
	ModelLoaded,
	TrackingStatusChanged,
	BackgroundChanged,
	ModelConfigChanged,
	ModelMoved,
	ModelOutline,
}

impl EventKind {
	pub const ALL: [EventKind; 7] = [
		EventKind::Test,
		EventKind::ModelLoaded,
		EventKind::TrackingStatusChanged,
		EventKind::BackgroundChanged,
		EventKind::ModelConfigChanged,
		EventKind::ModelMoved,
		EventKind::ModelOutline,
	];

	/// Wire name, which is also the `MessageType` of the pushed frames.
	pub fn name(self) -> &'static str {
		match self {
			EventKind::Test => message_type::TEST_EVENT,
			EventKind::ModelLoaded => message_type::MODEL_LOADED_EVENT,
			EventKind::TrackingStatusChanged => message_type::TRACKING_STATUS_CHANGED_EVENT,
			EventKind::BackgroundChanged => message_type::BACKGROUND_CHANGED_EVENT,
			EventKind::ModelConfigChanged => message_type::MODEL_CONFIG_CHANGED_EVENT,
			EventKind::ModelMoved => message_type::MODEL_MOVED_EVENT,
			EventKind::ModelOutline => message_type::MODEL_OUTLINE_EVENT,
		}
	}
}

impl AsRef<str> for EventKind {
	fn as_ref(&self) -> &str {
		self.name()
	}
}

impl fmt::Display for EventKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl FromStr for EventKind {
	type Err = Error;

	/// Accepts the wire name with or without the `Event` suffix, any case.
	fn from_str(s: &str) -> Result<Self> {
		let wanted = s.trim().to_ascii_lowercase();
		let wanted = wanted.strip_suffix("event").unwrap_or(&wanted);
		EventKind::ALL
			.into_iter()
			.find(|kind| {
				let name = kind.name().to_ascii_lowercase();
				name.strip_suffix("event").unwrap_or(&name) == wanted
			})
			.ok_or_else(|| Error::InvalidConfig(format!("unknown event '{s}'")))
	}
}

/// Typed subscription config for one event.
pub trait EventConfig: Serialize {
	const KIND: EventKind;

	fn to_config(&self) -> Result<Option<Value>> {
		Ok(Some(serde_json::to_value(self)?))
	}
}

/// Config for `TestEvent`: the peer echoes the message once per second.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TestEventConfig {
	pub test_message_for_event: String,
}

impl EventConfig for TestEventConfig {
	const KIND: EventKind = EventKind::Test;
}

/// Config for `ModelLoadedEvent`. Empty `model_id` means any model.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModelLoadedEventConfig {
	#[serde(rename = "ModelID")]
	pub model_id: Vec<String>,
}

impl EventConfig for ModelLoadedEventConfig {
	const KIND: EventKind = EventKind::ModelLoaded;
}

/// Config for `ModelOutlineEvent`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModelOutlineEventConfig {
	/// Ask VTube Studio to draw the outline on screen.
	pub draw: bool,
}

impl EventConfig for ModelOutlineEventConfig {
	const KIND: EventKind = EventKind::ModelOutline;
}

/// Subscribe/unsubscribe round-trips plus replay after reconnect.
#[derive(Clone)]
pub struct EventRegistry {
	connection: Arc<Connection>,
}

impl EventRegistry {
	pub fn new(connection: Arc<Connection>) -> Self {
		Self { connection }
	}

	fn table(&self) -> &SubscriptionTable {
		self.connection.subscriptions()
	}

	/// Subscribes to `event_name`, replacing any existing registration on
	/// acknowledgement.
	pub async fn subscribe(
		&self,
		event_name: &str,
		config: Option<Value>,
		on_event: EventHandler,
		on_error: ErrorHandler,
	) -> Result<EventSubscriptionResponse> {
		let response = self
			.round_trip(EventSubscriptionRequest::subscribe(event_name, config.clone()))
			.await?;

		let replaced = self.table().insert(EventSubscription {
			event_name: event_name.to_string(),
			config,
			on_event,
			on_error,
		});
		debug!(
			target = "vts.events",
			event = event_name,
			replaced = replaced.is_some(),
			"subscribed"
		);
		Ok(response)
	}

	/// Unsubscribes from `event_name`; the local entry goes once acknowledged.
	pub async fn unsubscribe(&self, event_name: &str) -> Result<EventSubscriptionResponse> {
		let response = self
			.round_trip(EventSubscriptionRequest::unsubscribe(event_name))
			.await?;
		self.table().remove(event_name);
		debug!(target = "vts.events", event = event_name, "unsubscribed");
		Ok(response)
	}

	/// Drops every subscription of this session.
	///
	/// Sent as an unsubscribe without an event name, which VTube Studio treats
	/// as "all events".
	pub async fn unsubscribe_all(&self) -> Result<EventSubscriptionResponse> {
		let response = self
			.round_trip(EventSubscriptionRequest::unsubscribe_all())
			.await?;
		self.table().clear();
		debug!(target = "vts.events", "unsubscribed from all events");
		Ok(response)
	}

	/// Replays every registered subscription concurrently. Returns how many
	/// were acknowledged.
	///
	/// Failures go to the subscription's error handler; the entry is kept.
	pub async fn resubscribe_all(&self) -> usize {
		let subscriptions = self.table().snapshot();
		if subscriptions.is_empty() {
			return 0;
		}
		debug!(target = "vts.events", count = subscriptions.len(), "replaying subscriptions");

		let replays = subscriptions.into_iter().map(|subscription| async move {
			let request = EventSubscriptionRequest::subscribe(
				subscription.event_name.clone(),
				subscription.config.clone(),
			);
			match self.round_trip(request).await {
				Ok(_) => true,
				Err(e) => {
					warn!(
						target = "vts.events",
						event = %subscription.event_name,
						error = %e,
						"replay failed"
					);
					(subscription.on_error)(e);
					false
				}
			}
		});

		join_all(replays).await.into_iter().filter(|ok| *ok).count()
	}

	pub fn is_subscribed(&self, event_name: &str) -> bool {
		self.table().contains(event_name)
	}

	/// Names of the active subscriptions, sorted.
	pub fn active(&self) -> Vec<String> {
		self.table().names()
	}

	async fn round_trip(&self, data: EventSubscriptionRequest) -> Result<EventSubscriptionResponse> {
		let message = self
			.connection
			.send(request(message_type::EVENT_SUBSCRIPTION_REQUEST, &data)?)
			.await?;
		match message.data {
			Payload::EventSubscription(response) => Ok(response),
			other => Err(Error::UnexpectedResponse {
				expected: "EventSubscriptionResponse",
				actual: other.kind().to_string(),
			}),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn event_kind_parses_loose_names() {
		assert_eq!("TestEvent".parse::<EventKind>().unwrap(), EventKind::Test);
		assert_eq!("modelloaded".parse::<EventKind>().unwrap(), EventKind::ModelLoaded);
		assert_eq!(
			"TrackingStatusChangedEvent".parse::<EventKind>().unwrap(),
			EventKind::TrackingStatusChanged
		);
		assert!("Nope".parse::<EventKind>().is_err());
	}

	#[test]
	fn typed_configs_use_wire_names() {
		let config = TestEventConfig {
			test_message_for_event: "ping".into(),
		}
		.to_config()
		.unwrap()
		.unwrap();
		assert_eq!(config["TestMessageForEvent"], "ping");

		let config = ModelLoadedEventConfig {
			model_id: vec!["abc".into()],
		}
		.to_config()
		.unwrap()
		.unwrap();
		assert_eq!(config["ModelID"][0], "abc");
		assert_eq!(ModelOutlineEventConfig::KIND.name(), "ModelOutlineEvent");
	}
}
