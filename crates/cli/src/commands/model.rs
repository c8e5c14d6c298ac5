use anyhow::Result;
use vts::PluginConfig;

use super::{connect, print_json};

pub async fn run(config: &PluginConfig, json: bool) -> Result<()> {
	let plugin = connect(config).await?;
	let model = plugin.current_model().await?;
	plugin.disconnect().await;

	if json {
		return print_json(&model);
	}
	if !model.model.model_loaded {
		println!("No model loaded.");
		return Ok(());
	}

	println!("{} ({})", model.model.model_name, model.model.model_id);
	println!("  live2d model:  {}", model.live2d_model_name);
	println!(
		"  parameters:    {}, artmeshes: {}",
		model.number_of_live2d_parameters, model.number_of_live2d_artmeshes
	);
	let position = &model.model_position;
	println!(
		"  position:      x={:.3} y={:.3} rotation={:.1} size={:.1}",
		position.position_x, position.position_y, position.rotation, position.size
	);
	Ok(())
}
