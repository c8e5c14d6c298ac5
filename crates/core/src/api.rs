//! Typed wrappers for the request/response API.
//!
//! Each wrapper is one [`Plugin::send`] with a typed payload; the response is
//! unpacked from the matching [`Payload`] variant.

use serde::Serialize;
use serde_json::Value;
use vts_protocol::api::*;
use vts_protocol::{Envelope, Payload, message_type};
use vts_runtime::{Error, Result};

use crate::plugin::Plugin;

/// Builds an outbound request envelope.
pub(crate) fn request<T: Serialize>(message_type: &str, data: &T) -> Result<Envelope<Value>> {
	Ok(Envelope::request(message_type, data)?)
}

fn no_data() -> Value {
	Value::Object(Default::default())
}

macro_rules! expect_payload {
	($message:expr, $variant:ident) => {
		match $message.data {
			Payload::$variant(data) => Ok(data),
			other => Err(Error::UnexpectedResponse {
				expected: stringify!($variant),
				actual: other.kind().to_string(),
			}),
		}
	};
}

/// Options for moving one item. `None` fields leave the current value as is.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemMoveOptions {
	pub item_instance_id: String,
	pub time_in_seconds: f32,
	pub fade_mode: MotionCurve,
	pub position: Option<(f32, f32)>,
	pub size: Option<f32>,
	pub rotation: Option<f32>,
	pub order: Option<i32>,
	pub flip: Option<bool>,
	pub user_can_stop: bool,
}

impl ItemMoveOptions {
	pub const MAX_TIME_IN_SECONDS: f32 = 30.0;
	pub const SIZE_RANGE: (f32, f32) = (0.0, 1.0);
	pub const POSITION_RANGE: (f32, f32) = (-1000.0, 1000.0);

	pub fn new(item_instance_id: impl Into<String>) -> Self {
		Self {
			item_instance_id: item_instance_id.into(),
			time_in_seconds: 0.0,
			fade_mode: MotionCurve::Linear,
			position: None,
			size: None,
			rotation: None,
			order: None,
			flip: None,
			user_can_stop: true,
		}
	}

	pub fn over(mut self, seconds: f32, fade_mode: MotionCurve) -> Self {
		self.time_in_seconds = seconds;
		self.fade_mode = fade_mode;
		self
	}

	pub fn position(mut self, x: f32, y: f32) -> Self {
		self.position = Some((x, y));
		self
	}

	pub fn size(mut self, size: f32) -> Self {
		self.size = Some(size);
		self
	}

	pub fn rotation(mut self, degrees: f32) -> Self {
		self.rotation = Some(degrees);
		self
	}

	pub fn order(mut self, order: i32) -> Self {
		self.order = Some(order);
		self
	}

	pub fn flip(mut self, flip: bool) -> Self {
		self.flip = Some(flip);
		self
	}

	pub fn validate(&self) -> Result<()> {
		if self.item_instance_id.is_empty() {
			return Err(Error::InvalidConfig("item instance id is empty".into()));
		}
		if !(0.0..=Self::MAX_TIME_IN_SECONDS).contains(&self.time_in_seconds) {
			return Err(Error::InvalidConfig(format!(
				"move time must be within 0-{}s",
				Self::MAX_TIME_IN_SECONDS
			)));
		}
		if let Some(size) = self.size {
			let (min, max) = Self::SIZE_RANGE;
			if !(min..=max).contains(&size) {
				return Err(Error::InvalidConfig(format!("size must be within {min}-{max}")));
			}
		}
		if let Some((x, y)) = self.position {
			let (min, max) = Self::POSITION_RANGE;
			if !(min..=max).contains(&x) || !(min..=max).contains(&y) {
				return Err(Error::InvalidConfig(format!("position must be within {min}-{max}")));
			}
		}
		Ok(())
	}

	fn to_wire(&self) -> ItemToMove {
		ItemToMove {
			item_instance_id: self.item_instance_id.clone(),
			time_in_seconds: self.time_in_seconds,
			fade_mode: self.fade_mode,
			position_x: self.position.map(|(x, _)| x),
			position_y: self.position.map(|(_, y)| y),
			size: self.size,
			rotation: self.rotation,
			order: self.order,
			flip: self.flip,
			user_can_stop: self.user_can_stop,
		}
	}
}

/// Options for controlling an animated item. `None` fields leave the current
/// setting as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemAnimationOptions {
	pub item_instance_id: String,
	pub framerate: Option<i32>,
	pub frame: Option<i32>,
	pub brightness: Option<f32>,
	pub opacity: Option<f32>,
	pub auto_stop_frames: Option<Vec<i32>>,
	pub playing: Option<bool>,
}

impl ItemAnimationOptions {
	pub const FRAMERATE_RANGE: (i32, i32) = (1, 120);

	pub fn new(item_instance_id: impl Into<String>) -> Self {
		Self {
			item_instance_id: item_instance_id.into(),
			..Self::default()
		}
	}

	pub fn validate(&self) -> Result<()> {
		if self.item_instance_id.is_empty() {
			return Err(Error::InvalidConfig("item instance id is empty".into()));
		}
		if let Some(framerate) = self.framerate {
			let (min, max) = Self::FRAMERATE_RANGE;
			if !(min..=max).contains(&framerate) {
				return Err(Error::InvalidConfig(format!("framerate must be within {min}-{max}")));
			}
		}
		for (name, value) in [("brightness", self.brightness), ("opacity", self.opacity)] {
			if value.is_some_and(|v| !(0.0..=1.0).contains(&v)) {
				return Err(Error::InvalidConfig(format!("{name} must be within 0-1")));
			}
		}
		if self.frame.is_some_and(|frame| frame < 0) {
			return Err(Error::InvalidConfig("frame must not be negative".into()));
		}
		Ok(())
	}

	fn to_wire(&self) -> ItemAnimationControlRequest {
		ItemAnimationControlRequest {
			item_instance_id: self.item_instance_id.clone(),
			framerate: self.framerate,
			frame: self.frame,
			brightness: self.brightness,
			opacity: self.opacity,
			auto_stop_frames: self.auto_stop_frames.clone(),
			animation_play_state: self.playing,
		}
	}
}

/// A custom tracking parameter this plugin creates on the VTube Studio side.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomParameter {
	pub name: String,
	pub explanation: String,
	pub min: f32,
	pub max: f32,
	pub default_value: f32,
}

impl CustomParameter {
	pub const NAME_LENGTH: (usize, usize) = (4, 32);
	pub const VALUE_LIMIT: f32 = 1_000_000.0;

	pub fn new(name: impl Into<String>, min: f32, max: f32, default_value: f32) -> Self {
		Self {
			name: name.into(),
			explanation: String::new(),
			min,
			max,
			default_value,
		}
	}

	pub fn explanation(mut self, explanation: impl Into<String>) -> Self {
		self.explanation = explanation.into();
		self
	}

	pub fn validate(&self) -> Result<()> {
		validate_parameter_name(&self.name)?;
		for value in [self.min, self.max, self.default_value] {
			if !(-Self::VALUE_LIMIT..=Self::VALUE_LIMIT).contains(&value) {
				return Err(Error::InvalidConfig(format!(
					"parameter values must be within +-{}",
					Self::VALUE_LIMIT
				)));
			}
		}
		if self.min >= self.max {
			return Err(Error::InvalidConfig("parameter min must be below max".into()));
		}
		if !(self.min..=self.max).contains(&self.default_value) {
			return Err(Error::InvalidConfig(
				"parameter default must lie between min and max".into(),
			));
		}
		Ok(())
	}

	fn to_wire(&self) -> ParameterCreationRequest {
		ParameterCreationRequest {
			parameter_name: self.name.clone(),
			explanation: self.explanation.clone(),
			min: self.min,
			max: self.max,
			default_value: self.default_value,
		}
	}
}

/// 4-32 characters of ASCII letters, digits and underscores.
fn validate_parameter_name(name: &str) -> Result<()> {
	let (min, max) = CustomParameter::NAME_LENGTH;
	if !(min..=max).contains(&name.len()) {
		return Err(Error::InvalidConfig(format!(
			"parameter name must be {min}-{max} characters"
		)));
	}
	if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
		return Err(Error::InvalidConfig(format!(
			"parameter name {name:?} must be alphanumeric"
		)));
	}
	Ok(())
}

/// Placement of an item loaded into the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemLoadOptions {
	pub position: (f32, f32),
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

impl ItemLoadOptions {
	pub const DEFAULT_SIZE: f32 = 0.32;
	pub const DEFAULT_ORDER: i32 = 1;
	pub const MAX_FADE_TIME: f32 = 2.0;

	pub fn validate(&self) -> Result<()> {
		let (min, max) = ItemMoveOptions::SIZE_RANGE;
		if !(min..=max).contains(&self.size) {
			return Err(Error::InvalidConfig(format!("size must be within {min}-{max}")));
		}
		let (min, max) = ItemMoveOptions::POSITION_RANGE;
		let (x, y) = self.position;
		if !(min..=max).contains(&x) || !(min..=max).contains(&y) {
			return Err(Error::InvalidConfig(format!("position must be within {min}-{max}")));
		}
		if !(0.0..=Self::MAX_FADE_TIME).contains(&self.fade_time) {
			return Err(Error::InvalidConfig(format!(
				"fade time must be within 0-{}s",
				Self::MAX_FADE_TIME
			)));
		}
		if !(0.0..=1.0).contains(&self.smoothing) {
			return Err(Error::InvalidConfig("smoothing must be within 0-1".into()));
		}
		Ok(())
	}

	fn to_wire(&self, file_name: String) -> ItemLoadRequest {
		ItemLoadRequest {
			file_name,
			position_x: self.position.0,
			position_y: self.position.1,
			size: self.size,
			rotation: self.rotation,
			fade_time: self.fade_time,
			order: self.order,
			fail_if_order_taken: self.fail_if_order_taken,
			smoothing: self.smoothing,
			censored: self.censored,
			flipped: self.flipped,
			locked: self.locked,
			unload_when_plugin_disconnects: self.unload_when_plugin_disconnects,
		}
	}
}

impl Default for ItemLoadOptions {
	fn default() -> Self {
		Self {
			position: (0.0, 0.0),
			size: Self::DEFAULT_SIZE,
			rotation: 0.0,
			fade_time: 0.0,
			order: Self::DEFAULT_ORDER,
			fail_if_order_taken: false,
			smoothing: 0.0,
			censored: false,
			flipped: false,
			locked: false,
			unload_when_plugin_disconnects: true,
		}
	}
}

/// Which items an `ItemUnloadRequest` removes. Selections add up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemUnloadOptions {
	pub instance_ids: Vec<String>,
	pub file_names: Vec<String>,
	pub all_in_scene: bool,
	pub all_loaded_by_this_plugin: bool,
	pub allow_foreign_items: bool,
}

impl ItemUnloadOptions {
	pub fn instances<I, S>(ids: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			instance_ids: ids.into_iter().map(Into::into).collect(),
			..Self::default()
		}
	}

	pub fn loaded_by_this_plugin() -> Self {
		Self {
			all_loaded_by_this_plugin: true,
			..Self::default()
		}
	}

	pub fn validate(&self) -> Result<()> {
		if self.instance_ids.is_empty()
			&& self.file_names.is_empty()
			&& !self.all_in_scene
			&& !self.all_loaded_by_this_plugin
		{
			return Err(Error::InvalidConfig("no items selected to unload".into()));
		}
		Ok(())
	}

	fn to_wire(&self) -> ItemUnloadRequest {
		ItemUnloadRequest {
			unload_all_in_scene: self.all_in_scene,
			unload_all_loaded_by_this_plugin: self.all_loaded_by_this_plugin,
			allow_unloading_items_loaded_by_user_or_other_plugins: self.allow_foreign_items,
			instance_ids: self.instance_ids.clone(),
			file_names: self.file_names.clone(),
		}
	}
}

impl Plugin {
	pub async fn api_state(&self) -> Result<ApiStateResponse> {
		let message = self.request(message_type::API_STATE_REQUEST, &no_data()).await?;
		expect_payload!(message, ApiState)
	}

	pub async fn statistics(&self) -> Result<StatisticsResponse> {
		let message = self.request(message_type::STATISTICS_REQUEST, &no_data()).await?;
		expect_payload!(message, Statistics)
	}

	pub async fn folder_info(&self) -> Result<FolderInfoResponse> {
		let message = self.request(message_type::FOLDER_INFO_REQUEST, &no_data()).await?;
		expect_payload!(message, FolderInfo)
	}

	pub async fn current_model(&self) -> Result<CurrentModelResponse> {
		let message = self.request(message_type::CURRENT_MODEL_REQUEST, &no_data()).await?;
		expect_payload!(message, CurrentModel)
	}

	pub async fn available_models(&self) -> Result<AvailableModelsResponse> {
		let message = self
			.request(message_type::AVAILABLE_MODELS_REQUEST, &no_data())
			.await?;
		expect_payload!(message, AvailableModels)
	}

	pub async fn load_model(&self, model_id: impl Into<String>) -> Result<ModelLoadResponse> {
		let data = ModelLoadRequest {
			model_id: model_id.into(),
		};
		let message = self.request(message_type::MODEL_LOAD_REQUEST, &data).await?;
		expect_payload!(message, ModelLoad)
	}

	/// Hotkeys of the current model, or of `model_id` when given.
	pub async fn hotkeys_in_current_model(&self, model_id: Option<&str>) -> Result<HotkeysResponse> {
		let data = HotkeysRequest {
			model_id: model_id.map(str::to_string),
			live2d_item_file_name: None,
		};
		let message = self
			.request(message_type::HOTKEYS_IN_CURRENT_MODEL_REQUEST, &data)
			.await?;
		expect_payload!(message, Hotkeys)
	}

	pub async fn trigger_hotkey(
		&self,
		hotkey_id: impl Into<String>,
		item_instance_id: Option<&str>,
	) -> Result<HotkeyTriggerResponse> {
		let data = HotkeyTriggerRequest {
			hotkey_id: hotkey_id.into(),
			item_instance_id: item_instance_id.map(str::to_string),
		};
		let message = self.request(message_type::HOTKEY_TRIGGER_REQUEST, &data).await?;
		expect_payload!(message, HotkeyTrigger)
	}

	pub async fn expression_states(
		&self,
		details: bool,
		expression_file: Option<&str>,
	) -> Result<ExpressionStateResponse> {
		let data = ExpressionStateRequest {
			details,
			expression_file: expression_file.map(str::to_string),
		};
		let message = self.request(message_type::EXPRESSION_STATE_REQUEST, &data).await?;
		expect_payload!(message, ExpressionState)
	}

	pub async fn set_expression_state(
		&self,
		expression_file: impl Into<String>,
		active: bool,
	) -> Result<()> {
		let data = ExpressionActivationRequest {
			expression_file: expression_file.into(),
			active,
		};
		self.request(message_type::EXPRESSION_ACTIVATION_REQUEST, &data)
			.await?;
		Ok(())
	}

	pub async fn input_parameters(&self) -> Result<InputParameterListResponse> {
		let message = self
			.request(message_type::INPUT_PARAMETER_LIST_REQUEST, &no_data())
			.await?;
		expect_payload!(message, InputParameterList)
	}

	pub async fn parameter_value(&self, name: impl Into<String>) -> Result<Parameter> {
		let data = ParameterValueRequest { name: name.into() };
		let message = self.request(message_type::PARAMETER_VALUE_REQUEST, &data).await?;
		expect_payload!(message, ParameterValue)
	}

	pub async fn inject_parameter_values(
		&self,
		face_found: bool,
		mode: InjectionMode,
		values: Vec<ParameterInjection>,
	) -> Result<()> {
		if values.is_empty() {
			return Err(Error::InvalidConfig("no parameter values to inject".into()));
		}
		let data = InjectParameterDataRequest {
			face_found,
			mode,
			parameter_values: values,
		};
		self.request(message_type::INJECT_PARAMETER_DATA_REQUEST, &data)
			.await?;
		Ok(())
	}

	/// Creates or updates a custom parameter owned by this plugin.
	pub async fn add_custom_parameter(
		&self,
		parameter: &CustomParameter,
	) -> Result<ParameterCreationResponse> {
		parameter.validate()?;
		let message = self
			.request(message_type::PARAMETER_CREATION_REQUEST, &parameter.to_wire())
			.await?;
		expect_payload!(message, ParameterCreation)
	}

	pub async fn remove_custom_parameter(
		&self,
		name: impl Into<String>,
	) -> Result<ParameterDeletionResponse> {
		let data = ParameterDeletionRequest {
			parameter_name: name.into(),
		};
		validate_parameter_name(&data.parameter_name)?;
		let message = self
			.request(message_type::PARAMETER_DELETION_REQUEST, &data)
			.await?;
		expect_payload!(message, ParameterDeletion)
	}

	pub async fn item_list(&self, filter: &ItemListRequest) -> Result<ItemListResponse> {
		let message = self.request(message_type::ITEM_LIST_REQUEST, filter).await?;
		expect_payload!(message, ItemList)
	}

	/// Loads `file_name` (as listed in `AvailableItemFiles`) into the scene.
	pub async fn load_item(
		&self,
		file_name: impl Into<String>,
		options: &ItemLoadOptions,
	) -> Result<ItemLoadResponse> {
		let file_name = file_name.into();
		if file_name.is_empty() {
			return Err(Error::InvalidConfig("item file name is empty".into()));
		}
		options.validate()?;
		let data = options.to_wire(file_name);
		let message = self.request(message_type::ITEM_LOAD_REQUEST, &data).await?;
		expect_payload!(message, ItemLoad)
	}

	pub async fn unload_items(&self, options: &ItemUnloadOptions) -> Result<ItemUnloadResponse> {
		options.validate()?;
		let message = self
			.request(message_type::ITEM_UNLOAD_REQUEST, &options.to_wire())
			.await?;
		expect_payload!(message, ItemUnload)
	}

	pub async fn move_item(&self, items: &[ItemMoveOptions]) -> Result<ItemMoveResponse> {
		for item in items {
			item.validate()?;
		}
		let data = ItemMoveRequest {
			items_to_move: items.iter().map(ItemMoveOptions::to_wire).collect(),
		};
		let message = self.request(message_type::ITEM_MOVE_REQUEST, &data).await?;
		expect_payload!(message, ItemMove)
	}

	pub async fn animate_item(
		&self,
		options: &ItemAnimationOptions,
	) -> Result<ItemAnimationControlResponse> {
		options.validate()?;
		let data = options.to_wire().to_wire();
		let message = self
			.request(message_type::ITEM_ANIMATION_CONTROL_REQUEST, &data)
			.await?;
		expect_payload!(message, ItemAnimationControl)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn move_options_leave_unset_fields_out() {
		let wire = ItemMoveOptions::new("item-1")
			.over(1.5, MotionCurve::EaseBoth)
			.position(0.25, -0.5)
			.to_wire();
		let json = serde_json::to_value(&wire).unwrap();

		assert_eq!(json["ItemInstanceID"], "item-1");
		assert_eq!(json["FadeMode"], "easeBoth");
		assert_eq!(json["PositionX"], 0.25);
		assert!(json.get("Size").is_none());
		assert!(json.get("Rotation").is_none());
	}

	#[test]
	fn move_options_are_validated() {
		assert!(ItemMoveOptions::new("i").over(31.0, MotionCurve::Linear).validate().is_err());
		assert!(ItemMoveOptions::new("i").size(2.0).validate().is_err());
		assert!(ItemMoveOptions::new("").validate().is_err());
		assert!(ItemMoveOptions::new("i").size(0.5).position(10.0, 10.0).validate().is_ok());
	}

	#[test]
	fn custom_parameters_are_validated() {
		assert!(CustomParameter::new("MyParam", 0.0, 1.0, 0.5).validate().is_ok());
		assert!(CustomParameter::new("abc", 0.0, 1.0, 0.5).validate().is_err());
		assert!(CustomParameter::new("has space", 0.0, 1.0, 0.5).validate().is_err());
		assert!(CustomParameter::new("x".repeat(33), 0.0, 1.0, 0.5).validate().is_err());
		assert!(CustomParameter::new("MyParam", 1.0, 1.0, 1.0).validate().is_err());
		assert!(CustomParameter::new("MyParam", 0.0, 1.0, 2.0).validate().is_err());
		assert!(CustomParameter::new("MyParam", 0.0, 2e6, 0.0).validate().is_err());
	}

	#[test]
	fn item_load_defaults_are_valid() {
		let options = ItemLoadOptions::default();
		options.validate().unwrap();
		let json = serde_json::to_value(options.to_wire("hat.png".into())).unwrap();
		assert_eq!(json["Size"], serde_json::json!(ItemLoadOptions::DEFAULT_SIZE));
		assert_eq!(json["Order"], 1);
		assert_eq!(json["UnloadWhenPluginDisconnects"], true);

		let slow = ItemLoadOptions {
			fade_time: 3.0,
			..ItemLoadOptions::default()
		};
		assert!(slow.validate().is_err());
	}

	#[test]
	fn unload_needs_a_selection() {
		assert!(ItemUnloadOptions::default().validate().is_err());
		assert!(ItemUnloadOptions::loaded_by_this_plugin().validate().is_ok());

		let json = serde_json::to_value(ItemUnloadOptions::instances(["i-1"]).to_wire()).unwrap();
		assert_eq!(json["InstanceIDs"], serde_json::json!(["i-1"]));
		assert_eq!(json["UnloadAllInScene"], false);
	}

	#[test]
	fn animation_options_set_flags() {
		let options = ItemAnimationOptions {
			playing: Some(false),
			..ItemAnimationOptions::new("anim")
		};
		options.validate().unwrap();
		let wire = options.to_wire().to_wire();

		assert_eq!(wire["SetAnimationPlayState"], true);
		assert_eq!(wire["AnimationPlayState"], false);
		assert_eq!(wire["SetAutoStopFrames"], false);
		assert!(wire.get("Framerate").is_none());

		let bad = ItemAnimationOptions {
			opacity: Some(1.5),
			..ItemAnimationOptions::new("anim")
		};
		assert!(bad.validate().is_err());
	}
}
