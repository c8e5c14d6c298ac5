
use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::styles::cli_styles;

/// Root CLI for vts.
#[derive(Parser, Debug)]
#[command(name = "vts")]
#[command(about = "Talk to VTube Studio through its public plugin API")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Print results as JSON
	#[arg(long, global = true)]
	pub json: bool,

	#[command(flatten)]
	pub plugin: PluginArgs,

	#[command(subcommand)]
	pub command: Commands,
}

/// Plugin identity and connection overrides, applied on top of `--config`.
#[derive(Args, Debug, Clone, Default)]
pub struct PluginArgs {
	/// JSON plugin config file.
	#[arg(long, global = true, value_name = "FILE", env = "VTS_CONFIG")]
	pub config: Option<PathBuf>,

	/// Plugin name shown in VTube Studio.
	#[arg(long, global = true, value_name = "NAME", env = "VTS_PLUGIN_NAME")]
	pub name: Option<String>,

	/// Plugin developer shown in VTube Studio.
	#[arg(long, global = true, value_name = "NAME", env = "VTS_PLUGIN_DEVELOPER")]
	pub developer: Option<String>,

	/// Address of the VTube Studio host.
	#[arg(long, global = true, value_name = "IP", env = "VTS_ADDRESS")]
	pub address: Option<IpAddr>,

	/// API port of the VTube Studio instance.
	#[arg(long, global = true, value_name = "PORT", env = "VTS_PORT")]
	pub port: Option<u16>,

	/// Where the authentication token is stored.
	#[arg(long, global = true, value_name = "FILE", env = "VTS_TOKEN_PATH")]
	pub token_path: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Listen for VTube Studio discovery broadcasts.
	Discover(DiscoverArgs),
	/// Connect, authenticate, and print API state and statistics.
	State,
	/// Print the currently loaded model.
	Model,
	/// List or trigger hotkeys of the current model.
	Hotkeys(HotkeysArgs),
	/// Subscribe to an event and print what arrives.
	Events(EventsArgs),
	/// Manage the stored authentication token.
	Token(TokenArgs),
}

#[derive(Args, Debug, Clone)]
pub struct DiscoverArgs {
	/// How long to listen.
	#[arg(long, value_name = "SECONDS", default_value_t = 3)]
	pub seconds: u64,
}

#[derive(Args, Debug, Clone)]
pub struct HotkeysArgs {
	/// Hotkey ID or name to trigger instead of listing.
	#[arg(long, value_name = "HOTKEY")]
	pub trigger: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct EventsArgs {
	/// Event name, e.g. ModelLoaded or TestEvent.
	#[arg(value_name = "EVENT")]
	pub event: String,

	/// JSON subscription config.
	#[arg(long, value_name = "JSON")]
	pub event_config: Option<String>,

	/// Stop after this many events.
	#[arg(long, value_name = "N")]
	pub count: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct TokenArgs {
	#[command(subcommand)]
	pub action: TokenAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TokenAction {
	/// Print where the token is stored and whether one exists.
	Show,
	/// Delete the stored token so the next connect asks for permission again.
	Clear,
}
