mod common;

use std::net::SocketAddr;
use std::sync::Arc;

use common::{AuthPolicy, FakeVts, WAIT, event_frame, plugin};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::timeout;
use vts::protocol::message_type;
use vts::{AuthState, Error, EventPayload, MemoryTokenStore, Payload, SessionEvent, TokenStore};

#[tokio::test]
async fn cached_token_skips_token_request() {
	let peer = FakeVts::new(AuthPolicy::IssuedOnly);
	peer.accept_token("remembered");
	let transport = peer.transport();
	let store = Arc::new(MemoryTokenStore::with_token("remembered"));
	let plugin = plugin(Arc::clone(&transport), Arc::clone(&store));

	plugin.connect().await.unwrap();

	assert!(plugin.is_authenticated());
	assert_eq!(transport.sent_count(message_type::AUTHENTICATION_TOKEN_REQUEST), 0);
	assert_eq!(transport.sent_count(message_type::AUTHENTICATION_REQUEST), 1);
	assert_eq!(transport.started_urls(), vec!["ws://127.0.0.1:8001".to_string()]);
}

#[tokio::test]
async fn stale_token_is_replaced() {
	let peer = FakeVts::new(AuthPolicy::IssuedOnly);
	let transport = peer.transport();
	let store = Arc::new(MemoryTokenStore::with_token("stale"));
	let plugin = plugin(Arc::clone(&transport), Arc::clone(&store));

	plugin.connect().await.unwrap();

	assert_eq!(plugin.auth_state(), AuthState::Authenticated);
	assert_eq!(transport.sent_count(message_type::AUTHENTICATION_TOKEN_REQUEST), 1);
	assert_eq!(transport.sent_count(message_type::AUTHENTICATION_REQUEST), 2);
	assert_eq!(store.load().unwrap().as_deref(), Some("token-1"));
}

#[tokio::test]
async fn second_rejection_fails_connect() {
	let peer = FakeVts::new(AuthPolicy::RejectAll);
	let transport = peer.transport();
	let store = Arc::new(MemoryTokenStore::new());
	let plugin = plugin(Arc::clone(&transport), Arc::clone(&store));
	let mut session = plugin.session_events();

	let err = plugin.connect().await.unwrap_err();

	assert!(matches!(err, Error::AuthenticationRejected(ref reason) if reason == "Token invalid"));
	assert_eq!(transport.sent_count(message_type::AUTHENTICATION_REQUEST), 2);
	assert_eq!(transport.sent_count(message_type::AUTHENTICATION_TOKEN_REQUEST), 2);
	assert_eq!(store.load().unwrap(), None);
	assert!(!plugin.is_authenticated());
	assert!(matches!(
		timeout(WAIT, session.recv()).await.unwrap(),
		Some(SessionEvent::Error(_))
	));
}

#[tokio::test]
async fn refused_transport_fails_connect() {
	let peer = FakeVts::new(AuthPolicy::IssuedOnly);
	let transport = peer.transport();
	transport.fail_start(true);
	let plugin = plugin(Arc::clone(&transport), Arc::new(MemoryTokenStore::new()));

	let err = plugin.connect().await.unwrap_err();

	assert!(matches!(err, Error::ConnectionFailed(_)));
	assert!(transport.sent_frames().is_empty());
}

#[tokio::test]
async fn events_reach_the_subscribed_handler() {
	let peer = FakeVts::new(AuthPolicy::IssuedOnly);
	let transport = peer.transport();
	let plugin = plugin(Arc::clone(&transport), Arc::new(MemoryTokenStore::new()));
	plugin.connect().await.unwrap();

	let (tx, mut rx) = mpsc::unbounded_channel();
	let response = plugin
		.subscribe(
			"TestEvent",
			Some(json!({"TestMessageForEvent": "hello"})),
			move |message| {
				let _ = tx.send(message);
			},
			|_| {},
		)
		.await
		.unwrap();
	assert_eq!(response.subscribed_events, vec!["TestEvent".to_string()]);

	transport.push_incoming(event_frame(
		message_type::TEST_EVENT,
		json!({"YourTestMessage": "hello", "Counter": 3}),
	));

	let message = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
	match message.data {
		Payload::Event(EventPayload::Test(event)) => {
			assert_eq!(event.your_test_message, "hello");
			assert_eq!(event.counter, 3);
		}
		other => panic!("unexpected payload {other:?}"),
	}
}

#[tokio::test]
async fn resubscribing_replaces_the_handler() {
	let peer = FakeVts::new(AuthPolicy::IssuedOnly);
	let transport = peer.transport();
	let plugin = plugin(Arc::clone(&transport), Arc::new(MemoryTokenStore::new()));
	plugin.connect().await.unwrap();

	let (first_tx, mut first_rx) = mpsc::unbounded_channel::<()>();
	let (second_tx, mut second_rx) = mpsc::unbounded_channel::<()>();
	plugin
		.subscribe(
			"ModelLoadedEvent",
			None,
			move |_| {
				let _ = first_tx.send(());
			},
			|_| {},
		)
		.await
		.unwrap();
	plugin
		.subscribe(
			"ModelLoadedEvent",
			None,
			move |_| {
				let _ = second_tx.send(());
			},
			|_| {},
		)
		.await
		.unwrap();

	transport.push_incoming(event_frame(
		message_type::MODEL_LOADED_EVENT,
		json!({"ModelLoaded": true, "ModelName": "Akari", "ModelID": "m-1"}),
	));

	timeout(WAIT, second_rx.recv()).await.unwrap().unwrap();
	assert!(first_rx.try_recv().is_err());
	assert_eq!(plugin.events().active(), vec!["ModelLoadedEvent".to_string()]);
}

#[tokio::test]
async fn reconnect_replays_subscriptions_before_reporting_connected() {
	let peer = FakeVts::new(AuthPolicy::IssuedOnly);
	let transport = peer.transport();
	let plugin = plugin(Arc::clone(&transport), Arc::new(MemoryTokenStore::new()));
	plugin.connect().await.unwrap();

	let (tx, mut rx) = mpsc::unbounded_channel();
	plugin
		.subscribe(
			"TestEvent",
			None,
			move |message| {
				let _ = tx.send(message);
			},
			|_| {},
		)
		.await
		.unwrap();
	plugin
		.subscribe("BackgroundChangedEvent", None, |_| {}, |_| {})
		.await
		.unwrap();
	assert_eq!(transport.sent_count(message_type::EVENT_SUBSCRIPTION_REQUEST), 2);

	let mut session = plugin.session_events();
	transport.simulate_disconnect();
	assert_eq!(
		timeout(WAIT, session.recv()).await.unwrap(),
		Some(SessionEvent::Disconnected)
	);
	assert!(!plugin.is_authenticated());

	transport.simulate_reconnect();
	transport.push_incoming(event_frame(
		message_type::TEST_EVENT,
		json!({"YourTestMessage": "after", "Counter": 1}),
	));

	assert_eq!(
		timeout(WAIT, session.recv()).await.unwrap(),
		Some(SessionEvent::Connected)
	);
	assert_eq!(transport.sent_count(message_type::EVENT_SUBSCRIPTION_REQUEST), 4);
	assert!(plugin.is_authenticated());
	assert!(timeout(WAIT, rx.recv()).await.unwrap().is_some());
}

#[tokio::test]
async fn unsubscribe_drops_local_entries() {
	let peer = FakeVts::new(AuthPolicy::IssuedOnly);
	let transport = peer.transport();
	let plugin = plugin(Arc::clone(&transport), Arc::new(MemoryTokenStore::new()));
	plugin.connect().await.unwrap();

	for event in ["TestEvent", "ModelMovedEvent", "ModelOutlineEvent"] {
		plugin.subscribe(event, None, |_| {}, |_| {}).await.unwrap();
	}

	plugin.unsubscribe("TestEvent").await.unwrap();
	assert!(!plugin.events().is_subscribed("TestEvent"));
	assert_eq!(plugin.events().active().len(), 2);

	let response = plugin.unsubscribe_all().await.unwrap();
	assert_eq!(response.subscribed_event_count, 0);
	assert!(plugin.events().active().is_empty());
	assert!(peer.subscribed().is_empty());

	let last = transport.sent_envelopes().pop().unwrap();
	assert_eq!(last.message_type, message_type::EVENT_SUBSCRIPTION_REQUEST);
	assert!(last.data.get("EventName").is_none());
	assert_eq!(last.data["Subscribe"], false);
}

#[tokio::test]
async fn failed_subscribe_keeps_table_unchanged() {
	let peer = FakeVts::new(AuthPolicy::IssuedOnly);
	let transport = peer.transport();
	let plugin = plugin(Arc::clone(&transport), Arc::new(MemoryTokenStore::new()));
	plugin.connect().await.unwrap();

	transport.fail_sends(true);
	let err = plugin
		.subscribe("TestEvent", None, |_| {}, |_| {})
		.await
		.unwrap_err();

	assert!(err.is_transport());
	assert!(!plugin.events().is_subscribed("TestEvent"));
	assert_eq!(plugin.connection().pending_count(), 0);
}

#[tokio::test]
async fn port_changes_require_a_discovered_peer() {
	let peer = FakeVts::new(AuthPolicy::IssuedOnly);
	let plugin = plugin(peer.transport(), Arc::new(MemoryTokenStore::new()));

	assert!(!plugin.set_port(999));
	assert_eq!(plugin.target().port, 8001);

	let broadcast = json!({
		"APIName": "VTubeStudioPublicAPI",
		"Timestamp": 1,
		"APIVersion": "1.0",
		"RequestID": "",
		"MessageType": "VTubeStudioAPIStateBroadcast",
		"Data": {"Active": true, "Port": 999, "InstanceID": "abc", "WindowTitle": "VTube Studio"}
	});
	let sender: SocketAddr = "192.168.1.20:47779".parse().unwrap();
	plugin
		.discovery()
		.ingest(broadcast.to_string().as_bytes(), sender)
		.unwrap();

	assert!(plugin.set_port(999));
	assert_eq!(plugin.target().port, 999);
	assert_eq!(plugin.peers().len(), 1);
	assert_eq!(plugin.peers()[0].instance_id, "abc");
}

#[tokio::test]
async fn address_must_be_an_ip_literal() {
	let peer = FakeVts::new(AuthPolicy::IssuedOnly);
	let transport = peer.transport();
	let plugin = plugin(Arc::clone(&transport), Arc::new(MemoryTokenStore::new()));

	assert!(!plugin.set_ip_address("vts.local"));
	assert!(plugin.set_ip_address("10.0.0.7"));
	plugin.connect().await.unwrap();

	assert_eq!(transport.started_urls(), vec!["ws://10.0.0.7:8001".to_string()]);
}

#[tokio::test]
async fn disconnect_keeps_subscriptions() {
	let peer = FakeVts::new(AuthPolicy::IssuedOnly);
	let transport = peer.transport();
	let plugin = plugin(Arc::clone(&transport), Arc::new(MemoryTokenStore::new()));
	plugin.connect().await.unwrap();
	plugin.subscribe("TestEvent", None, |_| {}, |_| {}).await.unwrap();

	plugin.disconnect().await;

	assert!(!plugin.is_connected());
	assert!(!plugin.is_authenticated());
	assert!(plugin.events().is_subscribed("TestEvent"));

	plugin.connect().await.unwrap();
	assert_eq!(transport.sent_count(message_type::EVENT_SUBSCRIPTION_REQUEST), 2);
}

#[tokio::test]
async fn transport_loss_leaves_requests_and_subscriptions_untouched() {
	let peer = FakeVts::new(AuthPolicy::IssuedOnly);
	let transport = peer.transport();
	let plugin = Arc::new(plugin(Arc::clone(&transport), Arc::new(MemoryTokenStore::new())));
	plugin.connect().await.unwrap();

	let (error_tx, mut error_rx) = mpsc::unbounded_channel();
	plugin
		.subscribe("TestEvent", None, |_| {}, move |error| {
			let _ = error_tx.send(error);
		})
		.await
		.unwrap();

	transport.set_responder(|_| Vec::new());
	let request = {
		let plugin = Arc::clone(&plugin);
		tokio::spawn(async move { plugin.request(message_type::STATISTICS_REQUEST, &json!({})).await })
	};
	timeout(WAIT, async {
		while plugin.connection().pending_count() < 1 {
			tokio::task::yield_now().await;
		}
	})
	.await
	.unwrap();

	let mut session = plugin.session_events();
	transport.simulate_disconnect();
	assert_eq!(
		timeout(WAIT, session.recv()).await.unwrap(),
		Some(SessionEvent::Disconnected)
	);
	tokio::time::sleep(std::time::Duration::from_millis(50)).await;

	assert_eq!(plugin.connection().pending_count(), 1);
	assert!(!request.is_finished());
	assert!(error_rx.try_recv().is_err());
	assert!(plugin.events().is_subscribed("TestEvent"));

	request.abort();
}
