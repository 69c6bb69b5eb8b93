use kwire_transport::Transport;
use tracing::debug;

use crate::codec::REQUEST_HEADER_SIZE;
use crate::error::Result;

/// Transmit an encoded request frame (blocking).
///
/// Fails with a connection error if the transport accepts zero bytes.
pub fn write_request<T: Transport + ?Sized>(transport: &mut T, frame: &[u8]) -> Result<usize> {
    let written = transport.send_bytes(frame)?;
    if frame.len() >= REQUEST_HEADER_SIZE {
        debug!(
            device_id = u16::from_be_bytes([frame[4], frame[5]]),
            command_id = u16::from_be_bytes([frame[6], frame[7]]),
            payload_len = frame.len() - REQUEST_HEADER_SIZE,
            "request frame sent"
        );
    }
    Ok(written)
}
