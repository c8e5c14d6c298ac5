//! UDP discovery of running VTube Studio instances.
//!
//! VTube Studio periodically broadcasts a `VTubeStudioAPIStateBroadcast`
//! envelope on UDP port [`DISCOVERY_PORT`]. [`DiscoveryService`] binds that
//! port once (with address reuse, so several processes can listen) and keeps
//! the latest broadcast per advertised API port.
//!
//! Discovery is advisory: nothing here opens a connection. Hosts read the
//! peer table and decide which [`ConnectionTarget`] to use.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use futures_util::FutureExt;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use vts_protocol::broadcast::DISCOVERY_PORT;
use vts_protocol::{BroadcastData, Envelope, message_type};

use crate::error::{Error, Result};

/// Largest broadcast datagram accepted.
const MAX_DATAGRAM: usize = 8 * 1024;

type ReceiveTask = JoinHandle<io::Result<(Vec<u8>, SocketAddr)>>;

/// Address and port of the next connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTarget {
	pub address: IpAddr,
	pub port: u16,
}

impl ConnectionTarget {
	pub const DEFAULT_ADDRESS: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
	pub const DEFAULT_PORT: u16 = 8001;

	pub fn new(address: IpAddr, port: u16) -> Self {
		Self { address, port }
	}

	pub fn socket_addr(&self) -> SocketAddr {
		SocketAddr::new(self.address, self.port)
	}

	/// WebSocket URL of the VTube Studio API at this target.
	pub fn url(&self) -> String {
		format!("ws://{}", self.socket_addr())
	}
}

impl Default for ConnectionTarget {
	fn default() -> Self {
		Self::new(Self::DEFAULT_ADDRESS, Self::DEFAULT_PORT)
	}
}

/// Latest broadcast seen for one advertised API port.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveredPeer {
	/// Sender address of the datagram.
	pub address: IpAddr,
	pub port: u16,
	pub instance_id: String,
	pub window_title: String,
	pub active: bool,
	/// The broadcast frame as received.
	pub frame: Envelope<BroadcastData>,
}

impl DiscoveredPeer {
	pub fn target(&self) -> ConnectionTarget {
		ConnectionTarget::new(self.address, self.port)
	}
}

/// Listener for discovery broadcasts, shared between plugins via `Arc`.
pub struct DiscoveryService {
	port: u16,
	socket: Mutex<Option<Arc<UdpSocket>>>,
	receive: Mutex<Option<ReceiveTask>>,
	peers: RwLock<HashMap<u16, DiscoveredPeer>>,
}

impl DiscoveryService {
	pub fn new() -> Self {
		Self::with_port(DISCOVERY_PORT)
	}

	/// Listens on a custom UDP port; `0` picks an ephemeral one.
	pub fn with_port(port: u16) -> Self {
		Self {
			port,
			socket: Mutex::new(None),
			receive: Mutex::new(None),
			peers: RwLock::new(HashMap::new()),
		}
	}

	pub fn port(&self) -> u16 {
		self.port
	}

	pub fn is_bound(&self) -> bool {
		self.socket.lock().is_some()
	}

	/// Address the listening socket is bound to, once bound.
	pub fn local_addr(&self) -> Option<SocketAddr> {
		self.socket.lock().as_ref()?.local_addr().ok()
	}

	/// Binds the shared receiving endpoint. Later calls are no-ops.
	///
	/// Must be called from within a Tokio runtime.
	pub fn bind(&self) -> Result<SocketAddr> {
		let mut slot = self.socket.lock();
		if let Some(socket) = slot.as_ref() {
			return Ok(socket.local_addr()?);
		}

		if tokio::runtime::Handle::try_current().is_err() {
			return Err(Error::InvalidConfig(
				"discovery must be bound inside a Tokio runtime".into(),
			));
		}

		let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
		let socket = socket2::Socket::new(
			socket2::Domain::IPV4,
			socket2::Type::DGRAM,
			Some(socket2::Protocol::UDP),
		)?;
		socket.set_reuse_address(true)?;
		socket.bind(&addr.into())?;
		socket.set_nonblocking(true)?;

		let socket = UdpSocket::from_std(socket.into())?;
		let local = socket.local_addr()?;
		info!(target = "vts.discovery", %local, "listening for broadcasts");
		*slot = Some(Arc::new(socket));
		Ok(local)
	}

	/// Harvests the outstanding receive, if finished, and re-arms it.
	///
	/// Binds on first use. Returns the advertised port of a broadcast ingested
	/// during this call.
	pub fn poll(&self) -> Result<Option<u16>> {
		self.bind()?;
		let socket = self
			.socket
			.lock()
			.clone()
			.ok_or_else(|| Error::InvalidConfig("discovery socket is not bound".into()))?;

		let mut receive = self.receive.lock();
		let mut ingested = None;

		let finished = if receive.as_ref().is_some_and(|task| task.is_finished()) {
			receive.take()
		} else {
			None
		};
		if let Some(task) = finished {
			match task.now_or_never() {
				Some(Ok(Ok((datagram, sender)))) => match self.ingest(&datagram, sender) {
					Ok(port) => ingested = Some(port),
					Err(e) => debug!(target = "vts.discovery", %sender, error = %e, "ignoring datagram"),
				},
				Some(Ok(Err(e))) => debug!(target = "vts.discovery", error = %e, "receive faulted"),
				Some(Err(e)) => debug!(target = "vts.discovery", error = %e, "receive cancelled"),
				None => {}
			}
		}

		if receive.is_none() {
			*receive = Some(tokio::spawn(async move {
				let mut buffer = vec![0u8; MAX_DATAGRAM];
				let (len, sender) = socket.recv_from(&mut buffer).await?;
				buffer.truncate(len);
				Ok((buffer, sender))
			}));
		}

		Ok(ingested)
	}

	/// Decodes one broadcast datagram and upserts the peer table.
	///
	/// Returns the advertised API port.
	pub fn ingest(&self, datagram: &[u8], sender: SocketAddr) -> Result<u16> {
		let frame: Envelope<BroadcastData> =
			serde_json::from_slice(datagram).map_err(|source| Error::Decode {
				message_type: message_type::API_STATE_BROADCAST.to_string(),
				source,
			})?;
		if frame.message_type != message_type::API_STATE_BROADCAST {
			return Err(Error::UnexpectedResponse {
				expected: message_type::API_STATE_BROADCAST,
				actual: frame.message_type,
			});
		}

		let peer = DiscoveredPeer {
			address: sender.ip(),
			port: frame.data.port,
			instance_id: frame.data.instance_id.clone(),
			window_title: frame.data.window_title.clone(),
			active: frame.data.active,
			frame,
		};
		let port = peer.port;
		debug!(
			target = "vts.discovery",
			port,
			instance = %peer.instance_id,
			"broadcast received"
		);
		self.peers.write().insert(port, peer);
		Ok(port)
	}

	/// Snapshot of every known peer, ordered by port.
	pub fn peers(&self) -> BTreeMap<u16, DiscoveredPeer> {
		self.peers
			.read()
			.iter()
			.map(|(port, peer)| (*port, peer.clone()))
			.collect()
	}

	pub fn peer(&self, port: u16) -> Option<DiscoveredPeer> {
		self.peers.read().get(&port).cloned()
	}

	pub fn contains_port(&self, port: u16) -> bool {
		self.peers.read().contains_key(&port)
	}
}

impl Default for DiscoveryService {
	fn default() -> Self {
		Self::new()
	}
}

impl Drop for DiscoveryService {
	fn drop(&mut self) {
		if let Some(task) = self.receive.get_mut().take() {
			task.abort();
		}
	}
}
