use anyhow::{Context, Result};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::warn;
use vts::{EventKind, Message, Payload, PluginConfig, SessionEvent};

use super::connect;
use crate::cli::EventsArgs;

enum Received {
	Event(Message),
	Failed(String),
}

pub async fn run(config: &PluginConfig, args: EventsArgs, json: bool) -> Result<()> {
	let kind: EventKind = args.event.parse()?;
	let event_config = args
		.event_config
		.as_deref()
		.map(serde_json::from_str::<Value>)
		.transpose()
		.context("--event-config must be JSON")?;

	let plugin = connect(config).await?;
	let mut session = plugin.session_events();

	let (tx, mut rx) = mpsc::unbounded_channel();
	let errors = tx.clone();
	plugin
		.subscribe(
			kind,
			event_config,
			move |message| {
				let _ = tx.send(Received::Event(message));
			},
			move |error| {
				let _ = errors.send(Received::Failed(error.to_string()));
			},
		)
		.await
		.with_context(|| format!("subscribing to {kind}"))?;
	eprintln!("Subscribed to {kind}, waiting for events (Ctrl-C to stop)");

	let mut seen = 0usize;
	loop {
		tokio::select! {
			received = rx.recv() => match received {
				Some(Received::Event(message)) => {
					print_event(&message, json)?;
					seen += 1;
					if args.count.is_some_and(|count| seen >= count) {
						break;
					}
				}
				Some(Received::Failed(error)) => warn!(target = "vts.cli", %error, "event delivery failed"),
				None => break,
			},
			event = session.recv() => match event {
				Some(SessionEvent::Disconnected) => eprintln!("Disconnected, waiting for reconnect"),
				Some(SessionEvent::Connected) => eprintln!("Reconnected"),
				Some(SessionEvent::Error(error)) => warn!(target = "vts.cli", %error, "session error"),
				None => break,
			},
			_ = tokio::signal::ctrl_c() => break,
		}
	}

	if let Err(e) = plugin.unsubscribe(kind).await {
		warn!(target = "vts.cli", error = %e, "unsubscribe failed");
	}
	plugin.disconnect().await;
	Ok(())
}

fn print_event(message: &Message, json: bool) -> Result<()> {
	let data = match &message.data {
		Payload::Event(event) => serde_json::to_value(event)?,
		Payload::Untyped(value) => value.clone(),
		other => json!({ "kind": other.kind() }),
	};

	if json {
		let line = json!({
			"type": message.message_type,
			"timestamp": message.timestamp,
			"data": data,
		});
		println!("{}", serde_json::to_string(&line)?);
	} else {
		println!("{}  {}", message.message_type, data);
	}
	Ok(())
}
