//! Plugin identity and connection settings.

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use vts_runtime::{ConnectionTarget, Error, Result};

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Identity presented to VTube Studio and the default connection target.
///
/// Plugin name and developer must be 3 to 32 characters long. The optional
/// icon is a base64-encoded 128x128 PNG shown in the permission prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
	pub plugin_name: String,
	pub plugin_developer: String,
	pub plugin_icon: Option<String>,
	pub address: IpAddr,
	pub port: u16,
	/// Where the authentication token is kept. `None` uses the user config dir.
	pub token_path: Option<PathBuf>,
}

impl PluginConfig {
	pub const MIN_NAME_LEN: usize = 3;
	pub const MAX_NAME_LEN: usize = 32;
	pub const DEFAULT_PLUGIN_NAME: &'static str = "vts-rs plugin";
	pub const DEFAULT_PLUGIN_DEVELOPER: &'static str = "vts-rs";

	pub fn new(plugin_name: impl Into<String>, plugin_developer: impl Into<String>) -> Self {
		Self {
			plugin_name: plugin_name.into(),
			plugin_developer: plugin_developer.into(),
			..Self::default()
		}
	}

	/// Sets the icon from raw PNG bytes.
	pub fn with_icon_png(mut self, png: &[u8]) -> Self {
		self.plugin_icon = Some(STANDARD.encode(png));
		self
	}

	pub fn with_target(mut self, target: ConnectionTarget) -> Self {
		self.address = target.address;
		self.port = target.port;
		self
	}

	pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.token_path = Some(path.into());
		self
	}

	pub fn target(&self) -> ConnectionTarget {
		ConnectionTarget::new(self.address, self.port)
	}

	/// Loads and validates a JSON config file.
	pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let text = std::fs::read_to_string(path)?;
		let config: Self = serde_json::from_str(&text).map_err(|e| {
			Error::InvalidConfig(format!("{}: {e}", path.display()))
		})?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<()> {
		check_name("plugin_name", &self.plugin_name)?;
		check_name("plugin_developer", &self.plugin_developer)?;

		if let Some(icon) = &self.plugin_icon {
			let bytes = STANDARD
				.decode(icon)
				.map_err(|e| Error::InvalidConfig(format!("plugin_icon is not valid base64: {e}")))?;
			if !bytes.starts_with(PNG_SIGNATURE) {
				return Err(Error::InvalidConfig("plugin_icon must be a PNG image".into()));
			}
		}

		if self.port == 0 {
			return Err(Error::InvalidConfig("port must be non-zero".into()));
		}
		Ok(())
	}
}

fn check_name(field: &str, value: &str) -> Result<()> {
	let len = value.chars().count();
	if !(PluginConfig::MIN_NAME_LEN..=PluginConfig::MAX_NAME_LEN).contains(&len) {
		return Err(Error::InvalidConfig(format!(
			"{field} must be {}-{} characters, got {len}",
			PluginConfig::MIN_NAME_LEN,
			PluginConfig::MAX_NAME_LEN
		)));
	}
	Ok(())
}

impl Default for PluginConfig {
	fn default() -> Self {
		let target = ConnectionTarget::default();
		Self {
			plugin_name: Self::DEFAULT_PLUGIN_NAME.to_string(),
			plugin_developer: Self::DEFAULT_PLUGIN_DEVELOPER.to_string(),
			plugin_icon: None,
			address: target.address,
			port: target.port,
			token_path: None,
		}
	}
}
