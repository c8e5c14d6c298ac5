//! Session lifecycle notifications.

use tokio::sync::broadcast;

/// Lifecycle change of a [`Plugin`](crate::Plugin) session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
	/// Authenticated and every subscription replayed.
	Connected,
	/// The transport closed. Pending requests are not failed.
	Disconnected,
	/// A transport or connect-pipeline failure.
	Error(String),
}

/// Stream of [`SessionEvent`]s with lag handling.
pub struct SessionEvents {
	rx: broadcast::Receiver<SessionEvent>,
}

impl SessionEvents {
	pub(crate) fn new(rx: broadcast::Receiver<SessionEvent>) -> Self {
		Self { rx }
	}

	/// Receives the next event, or `None` once the plugin is gone.
	pub async fn recv(&mut self) -> Option<SessionEvent> {
		loop {
			match self.rx.recv().await {
				Ok(event) => return Some(event),
				Err(broadcast::error::RecvError::Lagged(n)) => {
					tracing::warn!(dropped = n, "Session event stream lagged, dropped events");
				}
				Err(broadcast::error::RecvError::Closed) => return None,
			}
		}
	}

	/// Takes an already-published event without waiting.
	pub fn try_recv(&mut self) -> Option<SessionEvent> {
		loop {
			match self.rx.try_recv() {
				Ok(event) => return Some(event),
				Err(broadcast::error::TryRecvError::Lagged(n)) => {
					tracing::warn!(dropped = n, "Session event stream lagged, dropped events");
				}
				Err(
					broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed,
				) => return None,
			}
		}
	}
}
