//! UDP event exchange: broadcast local events, listen for remote ones.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::config::ExchangeSettings;
use crate::error::Result;
use crate::event::Event;
use crate::ratelimit::CounterRegistry;

use super::peers::PeerSet;
use super::wire;

/// Receive buffer size. Event datagrams are 16 bytes; the slack absorbs
/// whatever else lands on the port.
const RECV_BUFFER_LEN: usize = 1024;

/// Best-effort propagation of event occurrences between nodes.
///
/// One socket serves both directions: the background listener blocks on it
/// for peer datagrams while `broadcast` sends through it. Received events
/// are force-recorded into the shared registry under the receiver's own
/// clock; a message only means "an event was seen elsewhere, about now",
/// not a claim about exact remote timing.
pub struct EventExchange {
    registry: Arc<CounterRegistry>,
    socket: Arc<UdpSocket>,
    peers: PeerSet,
    port: u16,
    node_id: String,
    active: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    listener: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl EventExchange {
    /// Bind the exchange socket.
    ///
    /// Bind failures are fatal: without the socket the node can neither
    /// hear its peers nor be heard. With port 0 the effective port is read
    /// back from the socket.
    pub async fn bind(
        settings: &ExchangeSettings,
        peers: PeerSet,
        registry: Arc<CounterRegistry>,
    ) -> Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", settings.port)).await?;
        let port = socket.local_addr()?.port();

        info!(
            node_id = %settings.node_id,
            port,
            peers = peers.len(),
            "event exchange bound"
        );

        Ok(Self {
            registry,
            socket: Arc::new(socket),
            peers,
            port,
            node_id: settings.node_id.clone(),
            active: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(Notify::new()),
            listener: parking_lot::Mutex::new(None),
        })
    }

    /// Spawn the background listener task.
    pub fn start(&self) {
        self.active.store(true, Ordering::Release);

        let socket = Arc::clone(&self.socket);
        let registry = Arc::clone(&self.registry);
        let active = Arc::clone(&self.active);
        let shutdown = Arc::clone(&self.shutdown);

        let handle = tokio::spawn(async move {
            Self::listen(socket, registry, active, shutdown).await;
        });

        *self.listener.lock() = Some(handle);
        debug!(node_id = %self.node_id, "event exchange listener started");
    }

    async fn listen(
        socket: Arc<UdpSocket>,
        registry: Arc<CounterRegistry>,
        active: Arc<AtomicBool>,
        shutdown: Arc<Notify>,
    ) {
        let mut buf = [0u8; RECV_BUFFER_LEN];

        while active.load(Ordering::Acquire) {
            tokio::select! {
                _ = shutdown.notified() => break,
                received = socket.recv_from(&mut buf) => match received {
                    Ok((len, from)) => match wire::decode(&buf[..len]) {
                        Ok(remote) => {
                            // The peer already counted this event; mirror it
                            // here under our clock, full counter or not.
                            let event = Event::now(remote.key);
                            registry.counter(remote.key).force_record(event);
                            trace!(key = remote.key, peer = %from, "recorded remote event");
                        }
                        Err(e) => {
                            warn!(peer = %from, error = %e, "discarding undecodable datagram");
                        }
                    },
                    Err(e) => {
                        if !active.load(Ordering::Acquire) {
                            break;
                        }
                        warn!(error = %e, "receive failed");
                    }
                },
            }
        }

        debug!("event exchange listener stopped");
    }

    /// Stop the listener and wait for it to exit.
    pub async fn stop(&self) {
        self.active.store(false, Ordering::Release);
        // notify_one stores a permit, so a listener not yet parked in
        // notified() still observes the shutdown on its next iteration.
        self.shutdown.notify_one();

        let handle = self.listener.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "listener did not stop cleanly");
            }
        }

        info!(node_id = %self.node_id, "event exchange stopped");
    }

    /// Send one datagram per peer announcing `event`.
    ///
    /// Individual send failures are logged and skipped; an unreachable peer
    /// never aborts the rest of the broadcast and never fails the call.
    pub async fn broadcast(&self, event: Event) {
        let message = wire::encode(&event);

        for peer in self.peers.iter() {
            if let Err(e) = self.socket.send_to(&message, peer.endpoint(self.port)).await {
                warn!(peer = %peer, error = %e, "failed to send event");
            }
        }
    }

    /// The port the socket actually bound to.
    pub fn local_port(&self) -> u16 {
        self.port
    }

    /// This node's identifier, for log correlation.
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// The configured peers.
    pub fn peers(&self) -> &PeerSet {
        &self.peers
    }
}
