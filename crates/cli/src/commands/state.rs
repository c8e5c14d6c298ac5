use anyhow::Result;
use serde_json::json;
use vts::PluginConfig;

use super::{connect, print_json};

pub async fn run(config: &PluginConfig, json: bool) -> Result<()> {
	let plugin = connect(config).await?;
	let state = plugin.api_state().await?;
	let stats = plugin.statistics().await?;
	plugin.disconnect().await;

	if json {
		return print_json(&json!({ "state": state, "statistics": stats }));
	}

	println!("VTube Studio {}", state.vtube_studio_version);
	println!("  api active:      {}", state.active);
	println!("  authenticated:   {}", state.current_session_authenticated);
	println!("  uptime:          {}s", stats.uptime / 1000);
	println!("  framerate:       {}", stats.framerate);
	println!(
		"  plugins:         {} connected, {} allowed",
		stats.connected_plugins, stats.allowed_plugins
	);
	println!(
		"  window:          {}x{}{}",
		stats.window_width,
		stats.window_height,
		if stats.window_is_fullscreen { " fullscreen" } else { "" }
	);
	Ok(())
}
