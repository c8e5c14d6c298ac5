//! Scripted VTube Studio peer for plugin tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{Value, json};
use vts::protocol::api::{AuthTokenResponse, AuthenticationResponse};
use vts::protocol::{EventSubscriptionResponse, message_type};
use vts::{
	DiscoveryService, Envelope, MemoryTokenStore, MemoryTransport, Plugin, PluginConfig,
	respond_to,
};

pub const WAIT: Duration = Duration::from_secs(2);

/// How the fake peer treats authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPolicy {
	/// Accept tokens this peer issued.
	IssuedOnly,
	/// Reject every token.
	RejectAll,
}

#[derive(Default)]
struct State {
	issued: Vec<String>,
	subscribed: Vec<String>,
	canned: HashMap<String, (String, Value)>,
}

/// Peer state shared with the transport responder.
#[derive(Clone)]
pub struct FakeVts {
	policy: AuthPolicy,
	state: Arc<Mutex<State>>,
}

impl FakeVts {
	pub fn new(policy: AuthPolicy) -> Self {
		Self {
			policy,
			state: Arc::default(),
		}
	}

	/// Answers every `request_type` with a `response_type` frame carrying `data`.
	pub fn answer(&self, request_type: &str, response_type: &str, data: Value) {
		self.state
			.lock()
			.canned
			.insert(request_type.to_string(), (response_type.to_string(), data));
	}

	/// Accepts `token` as if this peer had issued it.
	pub fn accept_token(&self, token: &str) {
		self.state.lock().issued.push(token.to_string());
	}

	pub fn issued(&self) -> Vec<String> {
		self.state.lock().issued.clone()
	}

	pub fn subscribed(&self) -> Vec<String> {
		self.state.lock().subscribed.clone()
	}

	pub fn transport(&self) -> Arc<MemoryTransport> {
		let peer = self.clone();
		Arc::new(MemoryTransport::with_responder(move |request| {
			peer.respond(request)
		}))
	}

	fn respond(&self, request: &Envelope<Value>) -> Vec<String> {
		let mut state = self.state.lock();
		let reply = match request.message_type.as_str() {
			message_type::AUTHENTICATION_TOKEN_REQUEST => {
				let token = format!("token-{}", state.issued.len() + 1);
				state.issued.push(token.clone());
				respond_to(
					request,
					message_type::AUTHENTICATION_TOKEN_RESPONSE,
					&AuthTokenResponse {
						authentication_token: token,
					},
				)
			}
			message_type::AUTHENTICATION_REQUEST => {
				let token = request.data["AuthenticationToken"].as_str().unwrap_or_default();
				let authenticated = self.policy == AuthPolicy::IssuedOnly
					&& state.issued.iter().any(|issued| issued == token);
				respond_to(
					request,
					message_type::AUTHENTICATION_RESPONSE,
					&AuthenticationResponse {
						authenticated,
						reason: if authenticated {
							String::new()
						} else {
							"Token invalid".into()
						},
					},
				)
			}
			message_type::EVENT_SUBSCRIPTION_REQUEST => {
				let name = request.data["EventName"].as_str().map(str::to_string);
				let subscribe = request.data["Subscribe"].as_bool().unwrap_or(false);
				match (name, subscribe) {
					(Some(name), true) => {
						if !state.subscribed.contains(&name) {
							state.subscribed.push(name);
						}
					}
					(Some(name), false) => state.subscribed.retain(|event| *event != name),
					(None, _) => state.subscribed.clear(),
				}
				respond_to(
					request,
					message_type::EVENT_SUBSCRIPTION_RESPONSE,
					&EventSubscriptionResponse {
						subscribed_event_count: state.subscribed.len() as i32,
						subscribed_events: state.subscribed.clone(),
					},
				)
			}
			other => match state.canned.get(other) {
				Some((response_type, data)) => respond_to(request, response_type, data),
				None => respond_to(
					request,
					message_type::API_ERROR,
					&json!({"ErrorID": 5, "Message": format!("unknown request {other}")}),
				),
			},
		};
		vec![reply]
	}
}

pub fn config() -> PluginConfig {
	PluginConfig::new("Test Plugin", "Test Developer")
}

/// Builds a plugin wired to `transport`, with a private discovery listener.
pub fn plugin(transport: Arc<MemoryTransport>, store: Arc<MemoryTokenStore>) -> Plugin {
	Plugin::builder(config())
		.transport(transport)
		.token_store(store)
		.discovery(Arc::new(DiscoveryService::with_port(0)))
		.build()
		.unwrap()
}

/// Builds a frame for a pushed event.
pub fn event_frame(event_type: &str, data: Value) -> String {
	Envelope::new(event_type, data).to_text().unwrap()
}
