//! `MessageType` discriminators.
//!
//! Requests and their responses use distinct discriminators (`...Request` /
//! `...Response`); pushed events are named after the event itself.

pub const API_ERROR: &str = "APIError";

pub const API_STATE_REQUEST: &str = "APIStateRequest";
pub const API_STATE_RESPONSE: &str = "APIStateResponse";
pub const API_STATE_BROADCAST: &str = "VTubeStudioAPIStateBroadcast";

pub const AUTHENTICATION_TOKEN_REQUEST: &str = "AuthenticationTokenRequest";
pub const AUTHENTICATION_TOKEN_RESPONSE: &str = "AuthenticationTokenResponse";
pub const AUTHENTICATION_REQUEST: &str = "AuthenticationRequest";
pub const AUTHENTICATION_RESPONSE: &str = "AuthenticationResponse";

pub const STATISTICS_REQUEST: &str = "StatisticsRequest";
pub const STATISTICS_RESPONSE: &str = "StatisticsResponse";
pub const FOLDER_INFO_REQUEST: &str = "VTSFolderInfoRequest";
pub const FOLDER_INFO_RESPONSE: &str = "VTSFolderInfoResponse";

pub const CURRENT_MODEL_REQUEST: &str = "CurrentModelRequest";
pub const CURRENT_MODEL_RESPONSE: &str = "CurrentModelResponse";
pub const AVAILABLE_MODELS_REQUEST: &str = "AvailableModelsRequest";
pub const AVAILABLE_MODELS_RESPONSE: &str = "AvailableModelsResponse";
pub const MODEL_LOAD_REQUEST: &str = "ModelLoadRequest";
pub const MODEL_LOAD_RESPONSE: &str = "ModelLoadResponse";

pub const HOTKEYS_IN_CURRENT_MODEL_REQUEST: &str = "HotkeysInCurrentModelRequest";
pub const HOTKEYS_IN_CURRENT_MODEL_RESPONSE: &str = "HotkeysInCurrentModelResponse";
pub const HOTKEY_TRIGGER_REQUEST: &str = "HotkeyTriggerRequest";
pub const HOTKEY_TRIGGER_RESPONSE: &str = "HotkeyTriggerResponse";

pub const EXPRESSION_STATE_REQUEST: &str = "ExpressionStateRequest";
pub const EXPRESSION_STATE_RESPONSE: &str = "ExpressionStateResponse";
pub const EXPRESSION_ACTIVATION_REQUEST: &str = "ExpressionActivationRequest";
pub const EXPRESSION_ACTIVATION_RESPONSE: &str = "ExpressionActivationResponse";

pub const INPUT_PARAMETER_LIST_REQUEST: &str = "InputParameterListRequest";
pub const INPUT_PARAMETER_LIST_RESPONSE: &str = "InputParameterListResponse";
pub const PARAMETER_VALUE_REQUEST: &str = "ParameterValueRequest";
pub const PARAMETER_VALUE_RESPONSE: &str = "ParameterValueResponse";
pub const INJECT_PARAMETER_DATA_REQUEST: &str = "InjectParameterDataRequest";
pub const INJECT_PARAMETER_DATA_RESPONSE: &str = "InjectParameterDataResponse";
pub const PARAMETER_CREATION_REQUEST: &str = "ParameterCreationRequest";
pub const PARAMETER_CREATION_RESPONSE: &str = "ParameterCreationResponse";
pub const PARAMETER_DELETION_REQUEST: &str = "ParameterDeletionRequest";
pub const PARAMETER_DELETION_RESPONSE: &str = "ParameterDeletionResponse";

pub const ITEM_LIST_REQUEST: &str = "ItemListRequest";
pub const ITEM_LIST_RESPONSE: &str = "ItemListResponse";
pub const ITEM_LOAD_REQUEST: &str = "ItemLoadRequest";
pub const ITEM_LOAD_RESPONSE: &str = "ItemLoadResponse";
pub const ITEM_UNLOAD_REQUEST: &str = "ItemUnloadRequest";
pub const ITEM_UNLOAD_RESPONSE: &str = "ItemUnloadResponse";
pub const ITEM_MOVE_REQUEST: &str = "ItemMoveRequest";
pub const ITEM_MOVE_RESPONSE: &str = "ItemMoveResponse";
pub const ITEM_ANIMATION_CONTROL_REQUEST: &str = "ItemAnimationControlRequest";
pub const ITEM_ANIMATION_CONTROL_RESPONSE: &str = "ItemAnimationControlResponse";

pub const EVENT_SUBSCRIPTION_REQUEST: &str = "EventSubscriptionRequest";
pub const EVENT_SUBSCRIPTION_RESPONSE: &str = "EventSubscriptionResponse";

pub const TEST_EVENT: &str = "TestEvent";
pub const MODEL_LOADED_EVENT: &str = "ModelLoadedEvent";
pub const TRACKING_STATUS_CHANGED_EVENT: &str = "TrackingStatusChangedEvent";
pub const BACKGROUND_CHANGED_EVENT: &str = "BackgroundChangedEvent";
pub const MODEL_CONFIG_CHANGED_EVENT: &str = "ModelConfigChangedEvent";
pub const MODEL_MOVED_EVENT: &str = "ModelMovedEvent";
pub const MODEL_OUTLINE_EVENT: &str = "ModelOutlineEvent";
