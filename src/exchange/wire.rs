//! Fixed binary wire format for event datagrams.

use thiserror::Error;

use crate::event::Event;

/// Size of an event message: two big-endian `i64`s, key then event time.
/// There is no header, length prefix, checksum, or version.
pub const MESSAGE_LEN: usize = 16;

/// Decode failures for received datagrams.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("datagram too short: {0} of 16 bytes")]
    Truncated(usize),
}

/// Encode an event into its 16-byte wire representation.
pub fn encode(event: &Event) -> [u8; MESSAGE_LEN] {
    let mut buf = [0u8; MESSAGE_LEN];
    buf[..8].copy_from_slice(&event.key.to_be_bytes());
    buf[8..].copy_from_slice(&event.event_time.to_be_bytes());
    buf
}

/// Decode the first [`MESSAGE_LEN`] bytes of a datagram.
///
/// Trailing bytes are ignored; a well-formed sender writes exactly 16.
pub fn decode(data: &[u8]) -> Result<Event, WireError> {
    if data.len() < MESSAGE_LEN {
        return Err(WireError::Truncated(data.len()));
    }

    let mut word = [0u8; 8];
    word.copy_from_slice(&data[..8]);
    let key = i64::from_be_bytes(word);
    word.copy_from_slice(&data[8..MESSAGE_LEN]);
    let event_time = i64::from_be_bytes(word);

    Ok(Event::new(key, event_time))
}
