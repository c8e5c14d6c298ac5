use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::json;
use tokio::time::{Instant, interval};
use tracing::debug;
use vts::{DiscoveredPeer, DiscoveryService};

use super::print_json;
use crate::cli::DiscoverArgs;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub async fn run(args: DiscoverArgs, json: bool) -> Result<()> {
	let discovery = DiscoveryService::new();
	let local = discovery
		.bind()
		.with_context(|| format!("binding discovery port {}", discovery.port()))?;
	debug!(target = "vts.cli", %local, seconds = args.seconds, "listening for broadcasts");

	let deadline = Instant::now() + Duration::from_secs(args.seconds);
	let mut ticks = interval(POLL_INTERVAL);
	while Instant::now() < deadline {
		ticks.tick().await;
		while let Some(port) = discovery.poll()? {
			debug!(target = "vts.cli", port, "instance seen");
		}
	}

	let peers: Vec<DiscoveredPeer> = discovery.peers().into_values().collect();
	if json {
		let peers: Vec<_> = peers
			.iter()
			.map(|peer| {
				json!({
					"address": peer.address,
					"port": peer.port,
					"instanceId": peer.instance_id,
					"windowTitle": peer.window_title,
					"active": peer.active,
				})
			})
			.collect();
		return print_json(&peers);
	}

	if peers.is_empty() {
		println!("No VTube Studio instances found.");
		return Ok(());
	}
	for peer in &peers {
		println!(
			"{}  {}  {}{}",
			peer.target().url(),
			peer.instance_id,
			peer.window_title,
			if peer.active { "" } else { "  (API off)" }
		);
	}
	Ok(())
}
