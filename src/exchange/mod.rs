//! Peer-to-peer event propagation over UDP.
//!
//! Nodes announce event occurrences to each other with fire-and-forget
//! datagrams. The transport gives no delivery, ordering, or deduplication
//! guarantee; the admission protocol is designed to tolerate all three.

mod peers;
mod udp;
mod wire;

pub use peers::{Peer, PeerSet};
pub use udp::EventExchange;
pub use wire::{decode, encode, WireError, MESSAGE_LEN};
