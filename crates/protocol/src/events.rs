//! Event subscription requests and pushed event payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::ModelPosition;

/// `EventSubscriptionRequest` payload.
///
/// An absent `EventName` with `Subscribe = false` asks the peer to drop every
/// subscription held by this session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventSubscriptionRequest {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub event_name: Option<String>,
	pub subscribe: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub config: Option<Value>,
}

impl EventSubscriptionRequest {
	pub fn subscribe(event_name: impl Into<String>, config: Option<Value>) -> Self {
		Self {
			event_name: Some(event_name.into()),
			subscribe: true,
			config,
		}
	}

	pub fn unsubscribe(event_name: impl Into<String>) -> Self {
		Self {
			event_name: Some(event_name.into()),
			subscribe: false,
			config: None,
		}
	}

	pub fn unsubscribe_all() -> Self {
		Self {
			event_name: None,
			subscribe: false,
			config: None,
		}
	}
}

/// `EventSubscriptionResponse` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct EventSubscriptionResponse {
	pub subscribed_event_count: i32,
	pub subscribed_events: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TestEvent {
	pub your_test_message: String,
	pub counter: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ModelLoadedEvent {
	pub model_loaded: bool,
	pub model_name: String,
	#[serde(rename = "ModelID")]
	pub model_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TrackingStatusChangedEvent {
	pub face_found: bool,
	pub left_hand_found: bool,
	pub right_hand_found: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BackgroundChangedEvent {
	pub background_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ModelConfigChangedEvent {
	#[serde(rename = "ModelID")]
	pub model_id: String,
	pub model_name: String,
	pub hotkey_config_changed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ModelMovedEvent {
	#[serde(rename = "ModelID")]
	pub model_id: String,
	pub model_name: String,
	pub model_position: ModelPosition,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Point {
	pub x: f32,
	pub y: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ModelOutlineEvent {
	pub model_name: String,
	#[serde(rename = "ModelID")]
	pub model_id: String,
	pub convex_hull: Vec<Point>,
	pub convex_hull_center: Point,
	pub window_size: Point,
}

/// Typed payload of a pushed event frame. Serializes as the inner payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventPayload {
	Test(TestEvent),
	ModelLoaded(ModelLoadedEvent),
	TrackingStatusChanged(TrackingStatusChangedEvent),
	BackgroundChanged(BackgroundChangedEvent),
	ModelConfigChanged(ModelConfigChangedEvent),
	ModelMoved(ModelMovedEvent),
	ModelOutline(ModelOutlineEvent),
}
