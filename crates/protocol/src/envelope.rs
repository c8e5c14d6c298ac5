//! The outer message envelope shared by requests, responses, events, and
//! discovery broadcasts.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message_type;

/// Value of the `APIName` field on every outbound frame.
pub const API_NAME: &str = "VTubeStudioPublicAPI";

/// Value of the `APIVersion` field on every outbound frame.
pub const API_VERSION: &str = "1.0";

/// Schema-independent wrapper around every frame.
///
/// Field names follow the PascalCase wire format. The camelCase spelling used
/// by some VTube Studio builds is accepted on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
	serialize = "T: Serialize",
	deserialize = "T: Deserialize<'de> + Default"
))]
pub struct Envelope<T> {
	#[serde(rename = "APIName", alias = "apiName", default = "default_api_name")]
	pub api_name: String,
	/// Milliseconds since the Unix epoch.
	#[serde(rename = "Timestamp", alias = "timestamp", default)]
	pub timestamp: i64,
	#[serde(
		rename = "APIVersion",
		alias = "apiVersion",
		default = "default_api_version"
	)]
	pub api_version: String,
	/// Correlation ID, echoed verbatim by the peer on the matching response.
	#[serde(rename = "RequestID", alias = "requestID", default)]
	pub request_id: String,
	/// Discriminator naming the payload schema.
	#[serde(rename = "MessageType", alias = "messageType")]
	pub message_type: String,
	#[serde(rename = "Data", alias = "data", default)]
	pub data: T,
}

fn default_api_name() -> String {
	API_NAME.to_string()
}

fn default_api_version() -> String {
	API_VERSION.to_string()
}

fn now_millis() -> i64 {
	std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.map(|elapsed| elapsed.as_millis() as i64)
		.unwrap_or_default()
}

impl<T> Envelope<T> {
	/// Creates an envelope stamped with the current time and no correlation ID.
	///
	/// The session engine assigns a correlation ID at send time when none is set.
	pub fn new(message_type: impl Into<String>, data: T) -> Self {
		Self {
			api_name: API_NAME.to_string(),
			timestamp: now_millis(),
			api_version: API_VERSION.to_string(),
			request_id: String::new(),
			message_type: message_type.into(),
			data,
		}
	}

	/// Sets an explicit correlation ID.
	pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
		self.request_id = request_id.into();
		self
	}

	/// Replaces the payload, keeping the routing metadata.
	pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
		Envelope {
			api_name: self.api_name,
			timestamp: self.timestamp,
			api_version: self.api_version,
			request_id: self.request_id,
			message_type: self.message_type,
			data: f(self.data),
		}
	}

	/// Returns true if the discriminator denotes a peer error frame.
	pub fn is_error(&self) -> bool {
		self.message_type == message_type::API_ERROR
	}
}

impl Envelope<Value> {
	/// Builds an outbound request from any serializable payload.
	pub fn request<T: Serialize>(
		message_type: impl Into<String>,
		data: &T,
	) -> serde_json::Result<Self> {
		Ok(Self::new(message_type, serde_json::to_value(data)?))
	}

	/// Decodes the payload as `T`, treating an absent `Data` as an empty object.
	pub fn decode_data<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
		match &self.data {
			Value::Null => serde_json::from_value(Value::Object(Default::default())),
			data => serde_json::from_value(data.clone()),
		}
	}
}

impl<T: Serialize> Envelope<T> {
	/// Encodes the envelope as wire text.
	pub fn to_text(&self) -> serde_json::Result<String> {
		serde_json::to_string(self)
	}
}

/// Decodes the outer envelope of a frame, leaving the payload untyped.
pub fn decode_envelope(text: &str) -> serde_json::Result<Envelope<Value>> {
	serde_json::from_str(text)
}

/// Numeric error code carried by `APIError` frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorId(pub i32);

impl ErrorId {
	pub const INTERNAL_SERVER_ERROR: Self = Self(0);
	pub const API_NAME_INVALID: Self = Self(1);
	pub const API_VERSION_INVALID: Self = Self(2);
	pub const REQUEST_ID_INVALID: Self = Self(3);
	pub const REQUEST_TYPE_MISSING_OR_EMPTY: Self = Self(4);
	pub const REQUEST_TYPE_UNKNOWN: Self = Self(5);
	pub const REQUEST_REQUIRES_AUTHENTICATION: Self = Self(8);
	pub const REQUEST_REQUIRES_PERMISSION: Self = Self(9);
	pub const TOKEN_REQUEST_DENIED: Self = Self(50);
	pub const TOKEN_REQUEST_CURRENTLY_ONGOING: Self = Self(51);
	pub const TOKEN_REQUEST_PLUGIN_NAME_INVALID: Self = Self(52);
	pub const TOKEN_REQUEST_DEVELOPER_NAME_INVALID: Self = Self(53);
	pub const TOKEN_REQUEST_PLUGIN_ICON_INVALID: Self = Self(54);
	pub const AUTHENTICATION_TOKEN_MISSING: Self = Self(100);
	pub const AUTHENTICATION_PLUGIN_NAME_MISSING: Self = Self(101);
	pub const AUTHENTICATION_PLUGIN_DEVELOPER_MISSING: Self = Self(102);
}

impl fmt::Display for ErrorId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Payload of an `APIError` frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ErrorData {
	#[serde(rename = "ErrorID", alias = "errorID")]
	pub error_id: ErrorId,
	#[serde(alias = "message")]
	pub message: String,
}
