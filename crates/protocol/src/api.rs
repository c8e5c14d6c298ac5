//! Request and response payloads for the general API surface.
//!
//! Only the `Data` member of each frame is modeled here; the envelope is
//! [`crate::Envelope`]. Response structs default every field so that peers
//! omitting optional members still decode.

use serde::{Deserialize, Serialize};

use crate::envelope::ErrorId;

/// `AuthenticationTokenRequest` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthTokenRequest {
	pub plugin_name: String,
	pub plugin_developer: String,
	/// Base64-encoded 128x128 PNG or JPEG.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub plugin_icon: Option<String>,
}

/// `AuthenticationTokenResponse` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AuthTokenResponse {
	#[serde(alias = "authenticationToken")]
	pub authentication_token: String,
}

/// `AuthenticationRequest` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthenticationRequest {
	pub plugin_name: String,
	pub plugin_developer: String,
	pub authentication_token: String,
}

/// `AuthenticationResponse` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AuthenticationResponse {
	#[serde(alias = "authenticated")]
	pub authenticated: bool,
	#[serde(alias = "reason")]
	pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ApiStateResponse {
	pub active: bool,
	#[serde(rename = "VTubeStudioVersion")]
	pub vtube_studio_version: String,
	pub current_session_authenticated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct StatisticsResponse {
	pub uptime: i64,
	pub framerate: i32,
	#[serde(rename = "VTubeStudioVersion")]
	pub vtube_studio_version: String,
	pub allowed_plugins: i32,
	pub connected_plugins: i32,
	pub started_with_steam: bool,
	pub window_width: i32,
	pub window_height: i32,
	pub window_is_fullscreen: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct FolderInfoResponse {
	pub models: String,
	pub backgrounds: String,
	pub items: String,
	pub config: String,
	pub logs: String,
	pub backup: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ModelPosition {
	pub position_x: f32,
	pub position_y: f32,
	pub rotation: f32,
	pub size: f32,
}

/// Summary shared by model-centric responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ModelInfo {
	pub model_loaded: bool,
	pub model_name: String,
	#[serde(rename = "ModelID")]
	pub model_id: String,
	#[serde(rename = "VTSModelName")]
	pub vts_model_name: String,
	#[serde(rename = "VTSModelIconName")]
	pub vts_model_icon_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CurrentModelResponse {
	#[serde(flatten)]
	pub model: ModelInfo,
	#[serde(rename = "Live2DModelName")]
	pub live2d_model_name: String,
	pub model_load_time: i64,
	pub time_since_model_loaded: i64,
	#[serde(rename = "NumberOfLive2DParameters")]
	pub number_of_live2d_parameters: i32,
	#[serde(rename = "NumberOfLive2DArtmeshes")]
	pub number_of_live2d_artmeshes: i32,
	pub has_physics_file: bool,
	pub number_of_textures: i32,
	pub texture_resolution: i32,
	pub model_position: ModelPosition,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AvailableModelsResponse {
	pub number_of_models: i32,
	pub available_models: Vec<ModelInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModelLoadRequest {
	#[serde(rename = "ModelID")]
	pub model_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ModelLoadResponse {
	#[serde(rename = "ModelID")]
	pub model_id: String,
}

/// `HotkeysInCurrentModelRequest` payload. Set one of the two selectors, or
/// neither for the current model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HotkeysRequest {
	#[serde(rename = "ModelID", skip_serializing_if = "Option::is_none")]
	pub model_id: Option<String>,
	#[serde(rename = "Live2DItemFileName", skip_serializing_if = "Option::is_none")]
	pub live2d_item_file_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Hotkey {
	pub name: String,
	#[serde(rename = "Type")]
	pub kind: String,
	pub description: String,
	pub file: String,
	#[serde(rename = "HotkeyID")]
	pub hotkey_id: String,
	pub key_combination: Vec<String>,
	pub on_screen_button_id: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct HotkeysResponse {
	pub model_loaded: bool,
	pub model_name: String,
	#[serde(rename = "ModelID")]
	pub model_id: String,
	pub available_hotkeys: Vec<Hotkey>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HotkeyTriggerRequest {
	#[serde(rename = "HotkeyID")]
	pub hotkey_id: String,
	#[serde(rename = "ItemInstanceID", skip_serializing_if = "Option::is_none")]
	pub item_instance_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct HotkeyTriggerResponse {
	#[serde(rename = "HotkeyID")]
	pub hotkey_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExpressionStateRequest {
	pub details: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub expression_file: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ExpressionState {
	pub name: String,
	pub file: String,
	pub active: bool,
	pub deactivate_when_key_is_let_go: bool,
	pub auto_deactivate_after_seconds: bool,
	pub seconds_remaining: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ExpressionStateResponse {
	pub model_loaded: bool,
	pub model_name: String,
	#[serde(rename = "ModelID")]
	pub model_id: String,
	pub expressions: Vec<ExpressionState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExpressionActivationRequest {
	pub expression_file: String,
	pub active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Parameter {
	pub name: String,
	pub added_by: String,
	pub value: f32,
	pub min: f32,
	pub max: f32,
	pub default_value: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct InputParameterListResponse {
	pub model_loaded: bool,
	pub model_name: String,
	#[serde(rename = "ModelID")]
	pub model_id: String,
	pub custom_parameters: Vec<Parameter>,
	pub default_parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParameterValueRequest {
	pub name: String,
}

/// How injected values combine with the tracking value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InjectionMode {
	#[default]
	#[serde(rename = "set")]
	Set,
	#[serde(rename = "add")]
	Add,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParameterInjection {
	#[serde(rename = "Id")]
	pub id: String,
	pub value: f32,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub weight: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InjectParameterDataRequest {
	pub face_found: bool,
	pub mode: InjectionMode,
	pub parameter_values: Vec<ParameterInjection>,
}

/// `ParameterCreationRequest` payload. Creating a parameter that this plugin
/// already created updates it in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParameterCreationRequest {
	pub parameter_name: String,
	pub explanation: String,
	pub min: f32,
	pub max: f32,
	pub default_value: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ParameterCreationResponse {
	pub parameter_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParameterDeletionRequest {
	pub parameter_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ParameterDeletionResponse {
	pub parameter_name: String,
}

/// Fade curve used when moving items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MotionCurve {
	#[default]
	Linear,
	EaseIn,
	EaseOut,
	EaseBoth,
	Overshoot,
	Zip,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemListRequest {
	pub include_available_spots: bool,
	pub include_item_instances_in_scene: bool,
	pub include_available_item_files: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub only_items_with_file_name: Option<String>,
	#[serde(rename = "OnlyItemsWithInstanceID", skip_serializing_if = "Option::is_none")]
	pub only_items_with_instance_id: Option<String>,
}

/// An item currently placed in the scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ItemInstance {
	pub file_name: String,
	#[serde(rename = "InstanceID")]
	pub instance_id: String,
	pub order: i32,
	#[serde(rename = "Type")]
	pub item_type: String,
	pub censored: bool,
	pub flipped: bool,
	pub locked: bool,
	pub smoothing: f32,
	pub framerate: f32,
	pub frame_count: i32,
	pub current_frame: i32,
	pub pinned_to_model: bool,
	#[serde(rename = "PinnedModelID")]
	pub pinned_model_id: String,
	#[serde(rename = "PinnedArtMeshID")]
	pub pinned_art_mesh_id: String,
	pub group_name: String,
	pub scene_name: String,
	pub from_workshop: bool,
}

/// An item file that can be loaded into the scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ItemFile {
	pub file_name: String,
	#[serde(rename = "Type")]
	pub item_type: String,
	pub loaded_count: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ItemListResponse {
	pub items_in_scene_count: i32,
	pub total_items_allowed_count: i32,
	pub can_load_items_right_now: bool,
	pub available_spots: Vec<i32>,
	pub item_instances_in_scene: Vec<ItemInstance>,
	pub available_item_files: Vec<ItemFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemLoadRequest {
	pub file_name: String,
	pub position_x: f32,
	pub position_y: f32,
	pub size: f32,
	pub rotation: f32,
	pub fade_time: f32,
	pub order: i32,
	pub fail_if_order_taken: bool,
	pub smoothing: f32,
	pub censored: bool,
	pub flipped: bool,
	pub locked: bool,
	pub unload_when_plugin_disconnects: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ItemLoadResponse {
	#[serde(rename = "InstanceID")]
	pub instance_id: String,
	pub file_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemUnloadRequest {
	pub unload_all_in_scene: bool,
	pub unload_all_loaded_by_this_plugin: bool,
	pub allow_unloading_items_loaded_by_user_or_other_plugins: bool,
	#[serde(rename = "InstanceIDs")]
	pub instance_ids: Vec<String>,
	pub file_names: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct UnloadedItem {
	#[serde(rename = "InstanceID")]
	pub instance_id: String,
	pub file_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ItemUnloadResponse {
	pub unloaded_items: Vec<UnloadedItem>,
}

/// One entry of an `ItemMoveRequest`. `None` fields leave the item's current
/// value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemToMove {
	#[serde(rename = "ItemInstanceID")]
	pub item_instance_id: String,
	pub time_in_seconds: f32,
	pub fade_mode: MotionCurve,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub position_x: Option<f32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub position_y: Option<f32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub size: Option<f32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub rotation: Option<f32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub order: Option<i32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub flip: Option<bool>,
	pub user_can_stop: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemMoveRequest {
	pub items_to_move: Vec<ItemToMove>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MovedItem {
	#[serde(rename = "ItemInstanceID")]
	pub item_instance_id: String,
	pub success: bool,
	#[serde(rename = "ErrorID")]
	pub error_id: ErrorId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ItemMoveResponse {
	pub moved_items: Vec<MovedItem>,
}

/// `ItemAnimationControlRequest` payload. `None` fields leave the current
/// animation setting untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemAnimationControlRequest {
	#[serde(rename = "ItemInstanceID")]
	pub item_instance_id: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub framerate: Option<i32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub frame: Option<i32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub brightness: Option<f32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub opacity: Option<f32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub auto_stop_frames: Option<Vec<i32>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub animation_play_state: Option<bool>,
}

impl ItemAnimationControlRequest {
	/// Wire form with the `Set*` flags VTube Studio uses for the list/bool
	/// members.
	pub fn to_wire(&self) -> serde_json::Value {
		let mut value = serde_json::to_value(self).unwrap_or_default();
		if let Some(object) = value.as_object_mut() {
			object.insert(
				"SetAutoStopFrames".into(),
				self.auto_stop_frames.is_some().into(),
			);
			object.insert(
				"SetAnimationPlayState".into(),
				self.animation_play_state.is_some().into(),
			);
		}
		value
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ItemAnimationControlResponse {
	pub frame: i32,
	pub animation_playing: bool,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn icon_is_omitted_when_absent() {
		let request = AuthTokenRequest {
			plugin_name: "Plugin".into(),
			plugin_developer: "Dev".into(),
			plugin_icon: None,
		};
		let json = serde_json::to_string(&request).unwrap();
		assert_eq!(json, r#"{"PluginName":"Plugin","PluginDeveloper":"Dev"}"#);
	}

	#[test]
	fn item_move_skips_untouched_fields() {
		let item = ItemToMove {
			item_instance_id: "item-1".into(),
			time_in_seconds: 0.5,
			position_x: Some(0.25),
			..Default::default()
		};
		let json = serde_json::to_value(&item).unwrap();
		assert_eq!(json["ItemInstanceID"], "item-1");
		assert_eq!(json["FadeMode"], "linear");
		assert_eq!(json["PositionX"], 0.25);
		assert!(json.get("PositionY").is_none());
		assert!(json.get("Order").is_none());
	}

	#[test]
	fn animation_request_sets_flags_from_options() {
		let request = ItemAnimationControlRequest {
			item_instance_id: "item-1".into(),
			animation_play_state: Some(false),
			..Default::default()
		};
		let wire = request.to_wire();
		assert_eq!(wire["SetAnimationPlayState"], true);
		assert_eq!(wire["SetAutoStopFrames"], false);
		assert_eq!(wire["AnimationPlayState"], false);
		assert!(wire.get("Framerate").is_none());
	}

	#[test]
	fn item_list_decodes_scene_and_files() {
		let json = serde_json::json!({
			"ItemsInSceneCount": 1,
			"TotalItemsAllowedCount": 75,
			"CanLoadItemsRightNow": true,
			"AvailableSpots": [-5, -4, 2],
			"ItemInstancesInScene": [{
				"FileName": "hat.png",
				"InstanceID": "i-1",
				"Order": 3,
				"Type": "PNG",
				"PinnedToModel": true,
				"PinnedModelID": "m-1",
				"PinnedArtMeshID": "ArtMesh12"
			}],
			"AvailableItemFiles": [{"FileName": "hat.png", "Type": "PNG", "LoadedCount": 1}]
		});
		let response: ItemListResponse = serde_json::from_value(json).unwrap();
		assert_eq!(response.available_spots, vec![-5, -4, 2]);
		let item = &response.item_instances_in_scene[0];
		assert_eq!(item.instance_id, "i-1");
		assert_eq!(item.item_type, "PNG");
		assert_eq!(item.pinned_art_mesh_id, "ArtMesh12");
		assert!(!item.locked);
		assert_eq!(response.available_item_files[0].loaded_count, 1);
	}

	#[test]
	fn item_list_filters_are_optional() {
		let request = ItemListRequest {
			include_item_instances_in_scene: true,
			only_items_with_instance_id: Some("i-1".into()),
			..Default::default()
		};
		let json = serde_json::to_value(&request).unwrap();
		assert_eq!(json["IncludeItemInstancesInScene"], true);
		assert_eq!(json["OnlyItemsWithInstanceID"], "i-1");
		assert!(json.get("OnlyItemsWithFileName").is_none());
	}

	#[test]
	fn current_model_flattens_model_info() {
		let json = serde_json::json!({
			"ModelLoaded": true,
			"ModelName": "Akari",
			"ModelID": "abc",
			"Live2DModelName": "akari.model3.json",
			"ModelPosition": {"PositionX": 0.1, "PositionY": -0.2, "Rotation": 0.0, "Size": -50.0}
		});
		let response: CurrentModelResponse = serde_json::from_value(json).unwrap();
		assert!(response.model.model_loaded);
		assert_eq!(response.model.model_id, "abc");
		assert_eq!(response.live2d_model_name, "akari.model3.json");
		assert_eq!(response.model_position.size, -50.0);
	}
}
