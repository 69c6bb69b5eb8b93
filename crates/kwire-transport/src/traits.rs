use std::io::{ErrorKind, Read, Write};

use crate::error::{Result, TransportError};

/// A duplex byte stream as seen by the protocol layers.
///
/// Implemented for every `Read + Write` type. Buffering, socket options and
/// timeouts are the concern of the underlying stream, not of this trait.
pub trait Transport {
    /// Write every byte of `buf`, returning the number of bytes written.
    ///
    /// Fails with [`TransportError::ConnectionClosed`] if the stream accepts
    /// zero bytes.
    fn send_bytes(&mut self, buf: &[u8]) -> Result<usize>;

    /// Read exactly `n` bytes, looping over partial reads.
    ///
    /// Fails with [`TransportError::ConnectionClosed`] if the peer closes
    /// before `n` bytes have arrived.
    fn recv_exact(&mut self, n: usize) -> Result<Vec<u8>>;
}

impl<S: Read + Write> Transport for S {
    fn send_bytes(&mut self, buf: &[u8]) -> Result<usize> {
        let mut offset = 0usize;
        while offset < buf.len() {
            match Write::write(self, &buf[offset..]) {
                Ok(0) => return Err(TransportError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        loop {
            match Write::flush(self) {
                Ok(()) => return Ok(offset),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    fn recv_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        let mut filled = 0usize;
        while filled < n {
            match Read::read(self, &mut buf[filled..]) {
                Ok(0) => return Err(TransportError::ConnectionClosed),
                Ok(read) => filled += read,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
        Ok(buf)
    }
}
