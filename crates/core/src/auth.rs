//! Authentication gate run on every (re)connect.
//!
//! VTube Studio only serves a plugin after it presents a token it issued
//! earlier. The gate reuses a stored token when it has one and acquires a
//! fresh token otherwise (which prompts the user inside VTube Studio).
//!
//! A rejected token is deleted and the whole cycle runs once more with a fresh
//! token. A second rejection is terminal for the attempt.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};
use vts_protocol::api::{AuthTokenRequest, AuthenticationRequest};
use vts_protocol::{Payload, message_type};
use vts_runtime::{Connection, Error, Result};

use crate::api::request;
use crate::config::PluginConfig;
use crate::token::TokenStore;

/// Progress of the authentication gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
	#[default]
	Unauthenticated,
	AcquiringToken,
	Authenticating,
	Authenticated,
}

enum AttemptError {
	/// The peer refused the token or the token request.
	Rejected(String),
	/// Anything else; aborts the flow.
	Failed(Error),
}

impl From<Error> for AttemptError {
	fn from(error: Error) -> Self {
		match error {
			Error::Api { .. } => AttemptError::Rejected(error.to_string()),
			other => AttemptError::Failed(other),
		}
	}
}

/// Drives the token exchange over a [`Connection`].
pub struct AuthGate {
	plugin_name: String,
	plugin_developer: String,
	plugin_icon: Option<String>,
	store: Arc<dyn TokenStore>,
	token: Mutex<Option<String>>,
	state: RwLock<AuthState>,
}

impl AuthGate {
	/// Authentication attempts per connect.
	pub const MAX_ATTEMPTS: usize = 2;

	pub fn new(config: &PluginConfig, store: Arc<dyn TokenStore>) -> Self {
		Self {
			plugin_name: config.plugin_name.clone(),
			plugin_developer: config.plugin_developer.clone(),
			plugin_icon: config.plugin_icon.clone(),
			store,
			token: Mutex::new(None),
			state: RwLock::new(AuthState::Unauthenticated),
		}
	}

	pub fn state(&self) -> AuthState {
		*self.state.read()
	}

	pub fn is_authenticated(&self) -> bool {
		self.state() == AuthState::Authenticated
	}

	pub fn token_store(&self) -> &Arc<dyn TokenStore> {
		&self.store
	}

	/// Marks the session unauthenticated, e.g. after a disconnect.
	pub fn reset(&self) {
		self.set_state(AuthState::Unauthenticated);
	}

	fn set_state(&self, state: AuthState) {
		let previous = std::mem::replace(&mut *self.state.write(), state);
		if previous != state {
			debug!(target = "vts.auth", ?previous, ?state, "auth state changed");
		}
	}

	/// Runs the gate to completion.
	pub async fn authenticate(&self, connection: &Connection) -> Result<()> {
		self.set_state(AuthState::Unauthenticated);
		let cached = self.store.load()?;
		*self.token.lock() = cached;

		let mut reason = String::new();
		for attempt in 1..=Self::MAX_ATTEMPTS {
			match self.attempt(connection).await {
				Ok(()) => {
					self.set_state(AuthState::Authenticated);
					info!(target = "vts.auth", attempt, "authenticated");
					return Ok(());
				}
				Err(AttemptError::Rejected(why)) => {
					warn!(target = "vts.auth", attempt, reason = %why, "token rejected");
					self.token.lock().take();
					if let Err(e) = self.store.delete() {
						self.set_state(AuthState::Unauthenticated);
						return Err(e.into());
					}
					reason = why;
				}
				Err(AttemptError::Failed(e)) => {
					self.set_state(AuthState::Unauthenticated);
					return Err(e);
				}
			}
		}

		self.set_state(AuthState::Unauthenticated);
		Err(Error::AuthenticationRejected(reason))
	}

	async fn attempt(&self, connection: &Connection) -> std::result::Result<(), AttemptError> {
		let cached = self.token.lock().clone();
		let token = match cached {
			Some(token) => token,
			None => {
				let token = self.acquire_token(connection).await?;
				self.store.save(&token).map_err(|e| AttemptError::Failed(e.into()))?;
				*self.token.lock() = Some(token.clone());
				token
			}
		};

		self.set_state(AuthState::Authenticating);
		let message = connection
			.send(request(
				message_type::AUTHENTICATION_REQUEST,
				&AuthenticationRequest {
					plugin_name: self.plugin_name.clone(),
					plugin_developer: self.plugin_developer.clone(),
					authentication_token: token,
				},
			)?)
			.await?;

		match message.data {
			Payload::Authentication(response) if response.authenticated => Ok(()),
			Payload::Authentication(response) => Err(AttemptError::Rejected(response.reason)),
			other => Err(AttemptError::Failed(Error::UnexpectedResponse {
				expected: "AuthenticationResponse",
				actual: other.kind().to_string(),
			})),
		}
	}

	async fn acquire_token(&self, connection: &Connection) -> std::result::Result<String, AttemptError> {
		self.set_state(AuthState::AcquiringToken);
		debug!(target = "vts.auth", "requesting a new token");

		let message = connection
			.send(request(
				message_type::AUTHENTICATION_TOKEN_REQUEST,
				&AuthTokenRequest {
					plugin_name: self.plugin_name.clone(),
					plugin_developer: self.plugin_developer.clone(),
					plugin_icon: self.plugin_icon.clone(),
				},
			)?)
			.await?;

		match message.data {
			Payload::AuthenticationToken(response) if !response.authentication_token.is_empty() => {
				Ok(response.authentication_token)
			}
			Payload::AuthenticationToken(_) => Err(AttemptError::Rejected("empty token issued".into())),
			other => Err(AttemptError::Failed(Error::UnexpectedResponse {
				expected: "AuthenticationTokenResponse",
				actual: other.kind().to_string(),
			})),
		}
	}
}
