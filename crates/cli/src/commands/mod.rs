mod discover;
mod events;
mod hotkeys;
mod model;
mod state;
mod token;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;
use vts::{Plugin, PluginConfig};

use crate::cli::{Cli, Commands, PluginArgs};

pub async fn dispatch(cli: Cli) -> Result<()> {
	let json = cli.json;
	let plugin = &cli.plugin;

	// Discovery only listens for broadcasts and never loads a plugin config.
	match cli.command {
		Commands::Discover(args) => discover::run(args, json).await,
		Commands::State => state::run(&plugin_config(plugin)?, json).await,
		Commands::Model => model::run(&plugin_config(plugin)?, json).await,
		Commands::Hotkeys(args) => hotkeys::run(&plugin_config(plugin)?, args, json).await,
		Commands::Events(args) => events::run(&plugin_config(plugin)?, args, json).await,
		Commands::Token(args) => token::run(&plugin_config(plugin)?, args, json),
	}
}

/// Config file first, then flag and environment overrides.
pub fn plugin_config(args: &PluginArgs) -> Result<PluginConfig> {
	let mut config = match &args.config {
		Some(path) => PluginConfig::from_json_file(path)
			.with_context(|| format!("loading plugin config {}", path.display()))?,
		None => PluginConfig::default(),
	};

	if let Some(name) = &args.name {
		config.plugin_name = name.clone();
	}
	if let Some(developer) = &args.developer {
		config.plugin_developer = developer.clone();
	}
	if let Some(address) = args.address {
		config.address = address;
	}
	if let Some(port) = args.port {
		config.port = port;
	}
	if let Some(path) = &args.token_path {
		config.token_path = Some(path.clone());
	}

	config.validate().context("invalid plugin config")?;
	Ok(config)
}

/// Builds a plugin and runs the full connect pipeline.
async fn connect(config: &PluginConfig) -> Result<Plugin> {
	let plugin = Plugin::new(config.clone())?;
	info!(target = "vts.cli", url = %plugin.target().url(), "connecting");
	plugin
		.connect()
		.await
		.with_context(|| format!("connecting to {}", plugin.target().url()))?;
	Ok(plugin)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
	println!("{}", serde_json::to_string_pretty(value)?);
	Ok(())
}
