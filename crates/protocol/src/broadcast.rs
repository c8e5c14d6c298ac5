//! UDP discovery broadcast payload.

use serde::{Deserialize, Serialize};

/// Well-known UDP port VTube Studio broadcasts its API state on.
pub const DISCOVERY_PORT: u16 = 47779;

/// `VTubeStudioAPIStateBroadcast` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BroadcastData {
	#[serde(alias = "active")]
	pub active: bool,
	#[serde(alias = "port")]
	pub port: u16,
	#[serde(rename = "InstanceID", alias = "instanceID")]
	pub instance_id: String,
	#[serde(alias = "windowTitle")]
	pub window_title: String,
}
