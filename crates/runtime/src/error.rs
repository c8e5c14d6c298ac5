//! Error types for the VTube Studio session engine.

use thiserror::Error;
use vts_protocol::ErrorId;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to VTube Studio.
#[derive(Debug, Error)]
pub enum Error {
	/// No transport has been attached to the connection yet.
	#[error("No transport attached to the connection")]
	NotAttached,

	/// Failed to open the channel to the peer.
	#[error("Failed to connect to VTube Studio: {0}")]
	ConnectionFailed(String),

	/// Transport-level error (WebSocket I/O, closed channel).
	#[error("Transport error: {0}")]
	Transport(String),

	/// `APIError` frame returned by the peer.
	#[error("API error {error_id}: {message}")]
	Api {
		error_id: ErrorId,
		message: String,
		/// Correlation ID of the request the error answers.
		request_id: String,
	},

	/// Frame payload did not match the schema registered for its discriminator.
	#[error("Failed to decode {message_type}: {source}")]
	Decode {
		message_type: String,
		#[source]
		source: serde_json::Error,
	},

	/// A caller-supplied correlation ID is already awaiting a response.
	#[error("Request ID '{0}' is already pending")]
	DuplicateRequestId(String),

	/// The peer refused the plugin after a fresh token was acquired.
	#[error("Authentication rejected: {0}")]
	AuthenticationRejected(String),

	/// The peer answered with a payload of an unexpected type.
	#[error("Unexpected response: expected {expected}, got {actual}")]
	UnexpectedResponse {
		expected: &'static str,
		actual: String,
	},

	/// Invalid configuration or argument.
	#[error("Invalid configuration: {0}")]
	InvalidConfig(String),

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// Channel closed unexpectedly.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,

	/// Timeout waiting for operation.
	#[error("Timeout: {0}")]
	Timeout(String),
}

impl Error {
	/// Returns the peer error code if this is an [`Error::Api`].
	pub fn error_id(&self) -> Option<ErrorId> {
		match self {
			Error::Api { error_id, .. } => Some(*error_id),
			_ => None,
		}
	}

	/// Returns true if this error originated below the protocol layer.
	pub fn is_transport(&self) -> bool {
		matches!(
			self,
			Error::NotAttached
				| Error::ConnectionFailed(_)
				| Error::Transport(_)
				| Error::ChannelClosed
				| Error::Timeout(_)
				| Error::Io(_)
		)
	}

	/// Returns true if the peer refused the request for lack of authentication.
	pub fn is_unauthenticated(&self) -> bool {
		matches!(
			self.error_id(),
			Some(ErrorId::REQUEST_REQUIRES_AUTHENTICATION)
		) || matches!(self, Error::AuthenticationRejected(_))
	}
}
