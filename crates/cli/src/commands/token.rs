use anyhow::{Context, Result};
use serde_json::json;
use vts::{FileTokenStore, PluginConfig, TokenStore};

use super::print_json;
use crate::cli::{TokenAction, TokenArgs};

pub fn run(config: &PluginConfig, args: TokenArgs, json: bool) -> Result<()> {
	let path = config
		.token_path
		.clone()
		.or_else(FileTokenStore::default_path)
		.context("no token path given and no config directory available")?;
	let store = FileTokenStore::new(path);

	match args.action {
		TokenAction::Show => {
			let stored = store
				.load()
				.with_context(|| format!("reading {}", store.path().display()))?
				.is_some();
			if json {
				return print_json(&json!({ "path": store.path(), "stored": stored }));
			}
			let status = if stored { "present" } else { "absent" };
			println!("{} ({status})", store.path().display());
		}
		TokenAction::Clear => {
			store
				.delete()
				.with_context(|| format!("deleting {}", store.path().display()))?;
			if json {
				return print_json(&json!({ "path": store.path(), "cleared": true }));
			}
			println!("Cleared {}", store.path().display());
		}
	}
	Ok(())
}
