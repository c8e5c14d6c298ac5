mod common;

use std::sync::Arc;

use common::{AuthPolicy, FakeVts, plugin};
use serde_json::json;
use vts::protocol::ErrorId;
use vts::protocol::api::{InjectionMode, ItemListRequest, MotionCurve, ParameterInjection};
use vts::protocol::message_type;
use vts::{
	CustomParameter, Error, ItemAnimationOptions, ItemLoadOptions, ItemMoveOptions, ItemUnloadOptions,
	MemoryTokenStore,
};

async fn connected(peer: &FakeVts) -> (vts::Plugin, Arc<vts::MemoryTransport>) {
	let transport = peer.transport();
	let plugin = plugin(Arc::clone(&transport), Arc::new(MemoryTokenStore::new()));
	plugin.connect().await.unwrap();
	(plugin, transport)
}

#[tokio::test]
async fn api_state_is_decoded() {
	let peer = FakeVts::new(AuthPolicy::IssuedOnly);
	peer.answer(
		message_type::API_STATE_REQUEST,
		message_type::API_STATE_RESPONSE,
		json!({"Active": true, "VTubeStudioVersion": "1.28.0", "CurrentSessionAuthenticated": true}),
	);
	let (plugin, _) = connected(&peer).await;

	let state = plugin.api_state().await.unwrap();

	assert!(state.active);
	assert_eq!(state.vtube_studio_version, "1.28.0");
	assert!(state.current_session_authenticated);
}

#[tokio::test]
async fn current_model_uses_wire_names() {
	let peer = FakeVts::new(AuthPolicy::IssuedOnly);
	peer.answer(
		message_type::CURRENT_MODEL_REQUEST,
		message_type::CURRENT_MODEL_RESPONSE,
		json!({
			"ModelLoaded": true,
			"ModelName": "Akari",
			"ModelID": "m-1",
			"VTSModelName": "Akari.vtube.json",
			"Live2DModelName": "akari.model3.json",
			"ModelPosition": {"PositionX": 0.1, "PositionY": -0.2, "Rotation": 5.0, "Size": -40.0}
		}),
	);
	let (plugin, _) = connected(&peer).await;

	let model = plugin.current_model().await.unwrap();

	assert_eq!(model.model.model_id, "m-1");
	assert_eq!(model.model.vts_model_name, "Akari.vtube.json");
	assert_eq!(model.live2d_model_name, "akari.model3.json");
	assert_eq!(model.model_position.rotation, 5.0);
}

#[tokio::test]
async fn api_error_is_surfaced() {
	let peer = FakeVts::new(AuthPolicy::IssuedOnly);
	let (plugin, _) = connected(&peer).await;

	let err = plugin.statistics().await.unwrap_err();

	match err {
		Error::Api { error_id, .. } => assert_eq!(error_id, ErrorId::REQUEST_TYPE_UNKNOWN),
		other => panic!("unexpected error {other}"),
	}
}

#[tokio::test]
async fn mismatched_response_type_is_rejected() {
	let peer = FakeVts::new(AuthPolicy::IssuedOnly);
	peer.answer(
		message_type::FOLDER_INFO_REQUEST,
		message_type::STATISTICS_RESPONSE,
		json!({"Uptime": 10}),
	);
	let (plugin, _) = connected(&peer).await;

	let err = plugin.folder_info().await.unwrap_err();

	assert!(matches!(err, Error::UnexpectedResponse { expected: "FolderInfo", .. }));
}

#[tokio::test]
async fn hotkey_trigger_sends_optional_item() {
	let peer = FakeVts::new(AuthPolicy::IssuedOnly);
	peer.answer(
		message_type::HOTKEY_TRIGGER_REQUEST,
		message_type::HOTKEY_TRIGGER_RESPONSE,
		json!({"HotkeyID": "wave"}),
	);
	let (plugin, transport) = connected(&peer).await;

	let response = plugin.trigger_hotkey("wave", None).await.unwrap();
	assert_eq!(response.hotkey_id, "wave");
	plugin.trigger_hotkey("wave", Some("item-7")).await.unwrap();

	let sent: Vec<_> = transport
		.sent_envelopes()
		.into_iter()
		.filter(|envelope| envelope.message_type == message_type::HOTKEY_TRIGGER_REQUEST)
		.collect();
	assert!(sent[0].data.get("ItemInstanceID").is_none());
	assert_eq!(sent[1].data["ItemInstanceID"], "item-7");
}

#[tokio::test]
async fn parameter_injection_requires_values() {
	let peer = FakeVts::new(AuthPolicy::IssuedOnly);
	peer.answer(
		message_type::INJECT_PARAMETER_DATA_REQUEST,
		message_type::INJECT_PARAMETER_DATA_RESPONSE,
		json!({}),
	);
	let (plugin, transport) = connected(&peer).await;

	let err = plugin
		.inject_parameter_values(true, InjectionMode::Set, Vec::new())
		.await
		.unwrap_err();
	assert!(matches!(err, Error::InvalidConfig(_)));

	plugin
		.inject_parameter_values(
			false,
			InjectionMode::Add,
			vec![ParameterInjection {
				id: "FaceAngleX".into(),
				value: 12.5,
				weight: Some(0.5),
			}],
		)
		.await
		.unwrap();

	let sent = transport.sent_envelopes().pop().unwrap();
	assert_eq!(sent.data["Mode"], "add");
	assert_eq!(sent.data["ParameterValues"][0]["Id"], "FaceAngleX");
}

#[tokio::test]
async fn item_requests_are_validated_before_sending() {
	let peer = FakeVts::new(AuthPolicy::IssuedOnly);
	peer.answer(
		message_type::ITEM_MOVE_REQUEST,
		message_type::ITEM_MOVE_RESPONSE,
		json!({"MovedItems": [{"ItemInstanceID": "item-1", "Success": true, "ErrorID": -1}]}),
	);
	peer.answer(
		message_type::ITEM_ANIMATION_CONTROL_REQUEST,
		message_type::ITEM_ANIMATION_CONTROL_RESPONSE,
		json!({"Frame": 4, "AnimationPlaying": false}),
	);
	let (plugin, transport) = connected(&peer).await;

	let bad = ItemMoveOptions::new("item-1").size(3.0);
	assert!(plugin.move_item(&[bad]).await.is_err());
	assert_eq!(transport.sent_count(message_type::ITEM_MOVE_REQUEST), 0);

	let moved = plugin
		.move_item(&[ItemMoveOptions::new("item-1")
			.over(0.5, MotionCurve::Overshoot)
			.position(0.0, 0.5)])
		.await
		.unwrap();
	assert!(moved.moved_items[0].success);

	let animation = plugin
		.animate_item(&ItemAnimationOptions {
			frame: Some(4),
			playing: Some(false),
			..ItemAnimationOptions::new("item-1")
		})
		.await
		.unwrap();
	assert_eq!(animation.frame, 4);
	assert!(!animation.animation_playing);

	let sent = transport.sent_envelopes().pop().unwrap();
	assert_eq!(sent.data["SetAnimationPlayState"], true);
}

#[tokio::test]
async fn custom_parameters_are_created_and_removed() {
	let peer = FakeVts::new(AuthPolicy::IssuedOnly);
	peer.answer(
		message_type::PARAMETER_CREATION_REQUEST,
		message_type::PARAMETER_CREATION_RESPONSE,
		json!({"ParameterName": "MyNewParam"}),
	);
	peer.answer(
		message_type::PARAMETER_DELETION_REQUEST,
		message_type::PARAMETER_DELETION_RESPONSE,
		json!({"ParameterName": "MyNewParam"}),
	);
	let (plugin, transport) = connected(&peer).await;

	let invalid = CustomParameter::new("My Param", -1.0, 1.0, 0.0);
	let err = plugin.add_custom_parameter(&invalid).await.unwrap_err();
	assert!(matches!(err, Error::InvalidConfig(_)));
	assert_eq!(transport.sent_count(message_type::PARAMETER_CREATION_REQUEST), 0);

	let parameter = CustomParameter::new("MyNewParam", -30.0, 30.0, 0.0).explanation("Head tilt");
	let created = plugin.add_custom_parameter(&parameter).await.unwrap();
	assert_eq!(created.parameter_name, "MyNewParam");

	let sent = transport.sent_envelopes().pop().unwrap();
	assert_eq!(sent.data["ParameterName"], "MyNewParam");
	assert_eq!(sent.data["Explanation"], "Head tilt");
	assert_eq!(sent.data["Min"], -30.0);
	assert_eq!(sent.data["DefaultValue"], 0.0);

	let removed = plugin.remove_custom_parameter("MyNewParam").await.unwrap();
	assert_eq!(removed.parameter_name, "MyNewParam");
	assert!(plugin.remove_custom_parameter("x").await.is_err());
	assert_eq!(transport.sent_count(message_type::PARAMETER_DELETION_REQUEST), 1);
}

#[tokio::test]
async fn item_list_reports_scene_items() {
	let peer = FakeVts::new(AuthPolicy::IssuedOnly);
	peer.answer(
		message_type::ITEM_LIST_REQUEST,
		message_type::ITEM_LIST_RESPONSE,
		json!({
			"ItemsInSceneCount": 1,
			"TotalItemsAllowedCount": 75,
			"CanLoadItemsRightNow": true,
			"ItemInstancesInScene": [{"FileName": "hat.png", "InstanceID": "i-1", "Order": 4}],
			"AvailableItemFiles": [{"FileName": "hat.png", "Type": "PNG", "LoadedCount": 1}]
		}),
	);
	let (plugin, transport) = connected(&peer).await;

	let filter = ItemListRequest {
		include_item_instances_in_scene: true,
		include_available_item_files: true,
		..Default::default()
	};
	let list = plugin.item_list(&filter).await.unwrap();
	assert_eq!(list.items_in_scene_count, 1);
	assert!(list.can_load_items_right_now);
	assert_eq!(list.item_instances_in_scene[0].instance_id, "i-1");
	assert_eq!(list.available_item_files[0].item_type, "PNG");

	let sent = transport.sent_envelopes().pop().unwrap();
	assert_eq!(sent.data["IncludeAvailableSpots"], false);
	assert_eq!(sent.data["IncludeItemInstancesInScene"], true);
	assert!(sent.data.get("OnlyItemsWithFileName").is_none());
}

#[tokio::test]
async fn loaded_item_instance_can_be_unloaded() {
	let peer = FakeVts::new(AuthPolicy::IssuedOnly);
	peer.answer(
		message_type::ITEM_LOAD_REQUEST,
		message_type::ITEM_LOAD_RESPONSE,
		json!({"InstanceID": "i-9", "FileName": "hat.png"}),
	);
	peer.answer(
		message_type::ITEM_UNLOAD_REQUEST,
		message_type::ITEM_UNLOAD_RESPONSE,
		json!({"UnloadedItems": [{"InstanceID": "i-9", "FileName": "hat.png"}]}),
	);
	let (plugin, transport) = connected(&peer).await;

	assert!(plugin.load_item("", &ItemLoadOptions::default()).await.is_err());
	let options = ItemLoadOptions {
		position: (0.5, -0.25),
		locked: true,
		..ItemLoadOptions::default()
	};
	let loaded = plugin.load_item("hat.png", &options).await.unwrap();
	assert_eq!(loaded.instance_id, "i-9");
	assert_eq!(transport.sent_count(message_type::ITEM_LOAD_REQUEST), 1);

	let sent = transport.sent_envelopes().pop().unwrap();
	assert_eq!(sent.data["FileName"], "hat.png");
	assert_eq!(sent.data["PositionX"], 0.5);
	assert_eq!(sent.data["Locked"], true);
	assert_eq!(sent.data["UnloadWhenPluginDisconnects"], true);

	let err = plugin.unload_items(&ItemUnloadOptions::default()).await.unwrap_err();
	assert!(matches!(err, Error::InvalidConfig(_)));

	let unloaded = plugin
		.unload_items(&ItemUnloadOptions::instances([loaded.instance_id.as_str()]))
		.await
		.unwrap();
	assert_eq!(unloaded.unloaded_items.len(), 1);
	assert_eq!(unloaded.unloaded_items[0].file_name, "hat.png");

	let sent = transport.sent_envelopes().pop().unwrap();
	assert_eq!(sent.data["InstanceIDs"], json!(["i-9"]));
	assert_eq!(sent.data["UnloadAllLoadedByThisPlugin"], false);
}
