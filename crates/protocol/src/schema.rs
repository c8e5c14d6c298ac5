//! Discriminator → payload decoder table.
//!
//! Decoding is two-staged: the outer [`Envelope`] is decoded with an untyped
//! payload first, then the `MessageType` is looked up here to decode `Data`
//! into the matching [`Payload`] variant. The table is built once; hosts that
//! need additional schemas register them on their own registry instance.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::*;
use crate::broadcast::BroadcastData;
use crate::envelope::{Envelope, ErrorData};
use crate::events::*;
use crate::message_type as mt;

/// A fully decoded frame.
pub type Message = Envelope<Payload>;

/// Decodes the `Data` member of a frame into a [`Payload`].
pub type DecodeFn = fn(Value) -> serde_json::Result<Payload>;

/// Tagged payload of a decoded frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
	ApiError(ErrorData),
	ApiState(ApiStateResponse),
	ApiStateBroadcast(BroadcastData),
	AuthenticationToken(AuthTokenResponse),
	Authentication(AuthenticationResponse),
	Statistics(StatisticsResponse),
	FolderInfo(FolderInfoResponse),
	CurrentModel(CurrentModelResponse),
	AvailableModels(AvailableModelsResponse),
	ModelLoad(ModelLoadResponse),
	Hotkeys(HotkeysResponse),
	HotkeyTrigger(HotkeyTriggerResponse),
	ExpressionState(ExpressionStateResponse),
	InputParameterList(InputParameterListResponse),
	ParameterValue(Parameter),
	ParameterCreation(ParameterCreationResponse),
	ParameterDeletion(ParameterDeletionResponse),
	ItemList(ItemListResponse),
	ItemLoad(ItemLoadResponse),
	ItemUnload(ItemUnloadResponse),
	ItemMove(ItemMoveResponse),
	ItemAnimationControl(ItemAnimationControlResponse),
	EventSubscription(EventSubscriptionResponse),
	Event(EventPayload),
	/// Acknowledgement without a meaningful body.
	Empty,
	/// Payload of a discriminator with no registered schema.
	Untyped(Value),
}

impl Payload {
	/// Short name of the variant, for diagnostics.
	pub fn kind(&self) -> &'static str {
		match self {
			Payload::ApiError(_) => "ApiError",
			Payload::ApiState(_) => "ApiState",
			Payload::ApiStateBroadcast(_) => "ApiStateBroadcast",
			Payload::AuthenticationToken(_) => "AuthenticationToken",
			Payload::Authentication(_) => "Authentication",
			Payload::Statistics(_) => "Statistics",
			Payload::FolderInfo(_) => "FolderInfo",
			Payload::CurrentModel(_) => "CurrentModel",
			Payload::AvailableModels(_) => "AvailableModels",
			Payload::ModelLoad(_) => "ModelLoad",
			Payload::Hotkeys(_) => "Hotkeys",
			Payload::HotkeyTrigger(_) => "HotkeyTrigger",
			Payload::ExpressionState(_) => "ExpressionState",
			Payload::InputParameterList(_) => "InputParameterList",
			Payload::ParameterValue(_) => "ParameterValue",
			Payload::ParameterCreation(_) => "ParameterCreation",
			Payload::ParameterDeletion(_) => "ParameterDeletion",
			Payload::ItemList(_) => "ItemList",
			Payload::ItemLoad(_) => "ItemLoad",
			Payload::ItemUnload(_) => "ItemUnload",
			Payload::ItemMove(_) => "ItemMove",
			Payload::ItemAnimationControl(_) => "ItemAnimationControl",
			Payload::EventSubscription(_) => "EventSubscription",
			Payload::Event(_) => "Event",
			Payload::Empty => "Empty",
			Payload::Untyped(_) => "Untyped",
		}
	}
}

fn typed<T: DeserializeOwned>(data: Value) -> serde_json::Result<T> {
	match data {
		Value::Null => serde_json::from_value(Value::Object(Default::default())),
		data => serde_json::from_value(data),
	}
}

/// Explicit `MessageType` → decoder table.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
	decoders: HashMap<String, DecodeFn>,
}

static STANDARD: LazyLock<SchemaRegistry> = LazyLock::new(SchemaRegistry::with_standard_schemas);

impl SchemaRegistry {
	/// Creates an empty registry; every frame decodes to [`Payload::Untyped`].
	pub fn new() -> Self {
		Self::default()
	}

	/// Shared registry holding every schema this crate models.
	pub fn standard() -> &'static SchemaRegistry {
		&STANDARD
	}

	/// Builds a fresh registry holding every schema this crate models.
	pub fn with_standard_schemas() -> Self {
		let mut registry = Self::new();
		registry.register(mt::API_ERROR, |d| typed(d).map(Payload::ApiError));
		registry.register(mt::API_STATE_RESPONSE, |d| typed(d).map(Payload::ApiState));
		registry.register(mt::API_STATE_BROADCAST, |d| {
			typed(d).map(Payload::ApiStateBroadcast)
		});
		registry.register(mt::AUTHENTICATION_TOKEN_RESPONSE, |d| {
			typed(d).map(Payload::AuthenticationToken)
		});
		registry.register(mt::AUTHENTICATION_RESPONSE, |d| {
			typed(d).map(Payload::Authentication)
		});
		registry.register(mt::STATISTICS_RESPONSE, |d| typed(d).map(Payload::Statistics));
		registry.register(mt::FOLDER_INFO_RESPONSE, |d| typed(d).map(Payload::FolderInfo));
		registry.register(mt::CURRENT_MODEL_RESPONSE, |d| {
			typed(d).map(Payload::CurrentModel)
		});
		registry.register(mt::AVAILABLE_MODELS_RESPONSE, |d| {
			typed(d).map(Payload::AvailableModels)
		});
		registry.register(mt::MODEL_LOAD_RESPONSE, |d| typed(d).map(Payload::ModelLoad));
		registry.register(mt::HOTKEYS_IN_CURRENT_MODEL_RESPONSE, |d| {
			typed(d).map(Payload::Hotkeys)
		});
		registry.register(mt::HOTKEY_TRIGGER_RESPONSE, |d| {
			typed(d).map(Payload::HotkeyTrigger)
		});
		registry.register(mt::EXPRESSION_STATE_RESPONSE, |d| {
			typed(d).map(Payload::ExpressionState)
		});
		registry.register(mt::EXPRESSION_ACTIVATION_RESPONSE, |_| Ok(Payload::Empty));
		registry.register(mt::INPUT_PARAMETER_LIST_RESPONSE, |d| {
			typed(d).map(Payload::InputParameterList)
		});
		registry.register(mt::PARAMETER_VALUE_RESPONSE, |d| {
			typed(d).map(Payload::ParameterValue)
		});
		registry.register(mt::INJECT_PARAMETER_DATA_RESPONSE, |_| Ok(Payload::Empty));
		registry.register(mt::PARAMETER_CREATION_RESPONSE, |d| {
			typed(d).map(Payload::ParameterCreation)
		});
		registry.register(mt::PARAMETER_DELETION_RESPONSE, |d| {
			typed(d).map(Payload::ParameterDeletion)
		});
		registry.register(mt::ITEM_LIST_RESPONSE, |d| typed(d).map(Payload::ItemList));
		registry.register(mt::ITEM_LOAD_RESPONSE, |d| typed(d).map(Payload::ItemLoad));
		registry.register(mt::ITEM_UNLOAD_RESPONSE, |d| typed(d).map(Payload::ItemUnload));
		registry.register(mt::ITEM_MOVE_RESPONSE, |d| typed(d).map(Payload::ItemMove));
		registry.register(mt::ITEM_ANIMATION_CONTROL_RESPONSE, |d| {
			typed(d).map(Payload::ItemAnimationControl)
		});
		registry.register(mt::EVENT_SUBSCRIPTION_RESPONSE, |d| {
			typed(d).map(Payload::EventSubscription)
		});
		registry.register(mt::TEST_EVENT, |d| {
			typed(d).map(|e| Payload::Event(EventPayload::Test(e)))
		});
		registry.register(mt::MODEL_LOADED_EVENT, |d| {
			typed(d).map(|e| Payload::Event(EventPayload::ModelLoaded(e)))
		});
		registry.register(mt::TRACKING_STATUS_CHANGED_EVENT, |d| {
			typed(d).map(|e| Payload::Event(EventPayload::TrackingStatusChanged(e)))
		});
		registry.register(mt::BACKGROUND_CHANGED_EVENT, |d| {
			typed(d).map(|e| Payload::Event(EventPayload::BackgroundChanged(e)))
		});
		registry.register(mt::MODEL_CONFIG_CHANGED_EVENT, |d| {
			typed(d).map(|e| Payload::Event(EventPayload::ModelConfigChanged(e)))
		});
		registry.register(mt::MODEL_MOVED_EVENT, |d| {
			typed(d).map(|e| Payload::Event(EventPayload::ModelMoved(e)))
		});
		registry.register(mt::MODEL_OUTLINE_EVENT, |d| {
			typed(d).map(|e| Payload::Event(EventPayload::ModelOutline(e)))
		});
		registry
	}

	/// Registers (or replaces) the decoder for a discriminator.
	pub fn register(&mut self, message_type: impl Into<String>, decode: DecodeFn) {
		self.decoders.insert(message_type.into(), decode);
	}

	/// Looks up the decoder for a discriminator.
	pub fn resolve(&self, message_type: &str) -> Option<DecodeFn> {
		self.decoders.get(message_type).copied()
	}

	pub fn is_registered(&self, message_type: &str) -> bool {
		self.decoders.contains_key(message_type)
	}

	/// Decodes the payload of an envelope.
	///
	/// Unregistered discriminators yield [`Payload::Untyped`] with the raw data.
	pub fn decode(&self, envelope: Envelope<Value>) -> serde_json::Result<Message> {
		match self.resolve(&envelope.message_type) {
			Some(decode) => {
				let Envelope {
					api_name,
					timestamp,
					api_version,
					request_id,
					message_type,
					data,
				} = envelope;
				Ok(Envelope {
					api_name,
					timestamp,
					api_version,
					request_id,
					message_type,
					data: decode(data)?,
				})
			}
			None => Ok(envelope.map(Payload::Untyped)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::envelope::{ErrorId, decode_envelope};

	fn decode(text: &str) -> serde_json::Result<Message> {
		SchemaRegistry::standard().decode(decode_envelope(text).unwrap())
	}

	#[test]
	fn error_frames_decode_to_api_error() {
		let message = decode(
			r#"{"RequestID":"7","MessageType":"APIError","Data":{"ErrorID":50,"Message":"denied"}}"#,
		)
		.unwrap();

		assert_eq!(message.request_id, "7");
		match message.data {
			Payload::ApiError(error) => {
				assert_eq!(error.error_id, ErrorId::TOKEN_REQUEST_DENIED);
				assert_eq!(error.message, "denied");
			}
			other => panic!("Expected ApiError, got {}", other.kind()),
		}
	}

	#[test]
	fn event_frames_decode_to_typed_events() {
		let message = decode(
			r#"{"MessageType":"ModelLoadedEvent","Data":{"ModelLoaded":true,"ModelName":"Akari","ModelID":"m1"}}"#,
		)
		.unwrap();

		assert_eq!(
			message.data,
			Payload::Event(EventPayload::ModelLoaded(ModelLoadedEvent {
				model_loaded: true,
				model_name: "Akari".into(),
				model_id: "m1".into(),
			}))
		);
	}

	#[test]
	fn unregistered_discriminator_stays_untyped() {
		let message = decode(r#"{"MessageType":"SceneColorOverlayInfoResponse","Data":{"Active":true}}"#)
			.unwrap();
		assert_eq!(
			message.data,
			Payload::Untyped(serde_json::json!({"Active": true}))
		);
	}

	#[test]
	fn missing_data_decodes_with_defaults() {
		let message = decode(r#"{"MessageType":"AuthenticationResponse"}"#).unwrap();
		assert_eq!(
			message.data,
			Payload::Authentication(AuthenticationResponse::default())
		);
	}

	#[test]
	fn schema_mismatch_is_a_decode_error() {
		let result = decode(r#"{"MessageType":"TestEvent","Data":{"Counter":"not a number"}}"#);
		assert!(result.is_err());
	}

	#[test]
	fn custom_registry_overrides_decoders() {
		let mut registry = SchemaRegistry::new();
		registry.register("PingResponse", |_| Ok(Payload::Empty));

		let envelope = decode_envelope(r#"{"MessageType":"PingResponse","Data":{"x":1}}"#).unwrap();
		assert_eq!(registry.decode(envelope).unwrap().data, Payload::Empty);
		assert!(!registry.is_registered(mt::API_ERROR));
	}
}
