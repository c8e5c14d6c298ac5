use anyhow::{Result, bail};
use vts::PluginConfig;

use super::{connect, print_json};
use crate::cli::HotkeysArgs;

pub async fn run(config: &PluginConfig, args: HotkeysArgs, json: bool) -> Result<()> {
	let plugin = connect(config).await?;
	let hotkeys = plugin.hotkeys_in_current_model(None).await?;

	let Some(wanted) = args.trigger else {
		plugin.disconnect().await;
		if json {
			return print_json(&hotkeys.available_hotkeys);
		}
		for hotkey in &hotkeys.available_hotkeys {
			println!("{}  {}  [{}]", hotkey.hotkey_id, hotkey.name, hotkey.kind);
		}
		return Ok(());
	};

	// Names are accepted too, VTube Studio resolves them server side.
	let known = hotkeys
		.available_hotkeys
		.iter()
		.any(|hotkey| hotkey.hotkey_id == wanted || hotkey.name == wanted);
	if !known {
		plugin.disconnect().await;
		bail!("model '{}' has no hotkey '{wanted}'", hotkeys.model_name);
	}

	let response = plugin.trigger_hotkey(wanted, None).await;
	plugin.disconnect().await;
	let response = response?;

	if json {
		return print_json(&response);
	}
	println!("Triggered {}", response.hotkey_id);
	Ok(())
}
