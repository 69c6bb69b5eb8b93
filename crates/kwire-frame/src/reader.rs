use bytes::Bytes;
use kwire_transport::Transport;
use tracing::{debug, warn};

use crate::codec::{decode_envelope_header, FrameConfig, ENVELOPE_HEADER_SIZE};
use crate::error::{FrameError, Result};

/// Read one complete response envelope and return its payload (blocking).
///
/// A non-zero reserved field or a length above `config.max_payload_size`
/// means the stream is desynchronized; the connection must be discarded.
pub fn read_envelope<T: Transport + ?Sized>(transport: &mut T, config: &FrameConfig) -> Result<Bytes> {
    let raw = transport.recv_exact(ENVELOPE_HEADER_SIZE)?;
    let mut header = [0u8; ENVELOPE_HEADER_SIZE];
    header.copy_from_slice(&raw);

    let length = decode_envelope_header(&header).inspect_err(|err| {
        warn!(%err, "malformed response envelope");
    })?;

    let max = config.max_payload_size as u64;
    if length > max {
        warn!(length, max, "response envelope exceeds payload limit");
        return Err(FrameError::PayloadTooLarge { size: length, max });
    }

    let payload = transport.recv_exact(length as usize)?;
    debug!(length, "response envelope received");
    Ok(Bytes::from(payload))
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read, Write};

    use bytes::{BufMut, BytesMut};
    use kwire_transport::TransportError;

    use super::*;
    use crate::codec::encode_envelope;

    /// Serves scripted input and swallows writes.
    struct Scripted(Cursor<Vec<u8>>);

    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.0.read(buf)
        }
    }

    impl Write for Scripted {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn scripted(bytes: impl Into<Vec<u8>>) -> Scripted {
        Scripted(Cursor::new(bytes.into()))
    }

    #[test]
    fn reads_payload() {
        let mut wire = BytesMut::new();
        encode_envelope(b"payload", &mut wire);
        let mut stream = scripted(wire.to_vec());

        let payload = read_envelope(&mut stream, &FrameConfig::default()).unwrap();
        assert_eq!(payload.as_ref(), b"payload");
    }

    #[test]
    fn reads_consecutive_envelopes() {
        let mut wire = BytesMut::new();
        encode_envelope(b"one", &mut wire);
        encode_envelope(b"", &mut wire);
        encode_envelope(b"three", &mut wire);
        let mut stream = scripted(wire.to_vec());
        let config = FrameConfig::default();

        assert_eq!(read_envelope(&mut stream, &config).unwrap().as_ref(), b"one");
        assert!(read_envelope(&mut stream, &config).unwrap().is_empty());
        assert_eq!(read_envelope(&mut stream, &config).unwrap().as_ref(), b"three");
    }

    #[test]
    fn nonzero_reserved_field_is_fatal() {
        let mut wire = BytesMut::new();
        wire.put_u32(0xDEAD);
        wire.put_u64(0);
        let mut stream = scripted(wire.to_vec());

        let err = read_envelope(&mut stream, &FrameConfig::default()).unwrap_err();
        assert!(matches!(err, FrameError::ReservedNonZero(0xDEAD)));
    }

    #[test]
    fn oversized_envelope_rejected_before_reading_payload() {
        let mut wire = BytesMut::new();
        wire.put_u32(0);
        wire.put_u64(1024);
        let mut stream = scripted(wire.to_vec());
        let config = FrameConfig {
            max_payload_size: 16,
        };

        let err = read_envelope(&mut stream, &config).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 1024, max: 16 }));
    }

    #[test]
    fn truncated_payload_is_connection_error() {
        let mut wire = BytesMut::new();
        wire.put_u32(0);
        wire.put_u64(10);
        wire.put_slice(b"short");
        let mut stream = scripted(wire.to_vec());

        let err = read_envelope(&mut stream, &FrameConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Transport(TransportError::ConnectionClosed)
        ));
    }

    #[test]
    fn truncated_header_is_connection_error() {
        let mut stream = scripted(vec![0u8; 5]);
        let err = read_envelope(&mut stream, &FrameConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Transport(TransportError::ConnectionClosed)
        ));
    }

    #[test]
    #[cfg(unix)]
    fn roundtrip_over_socket_pair() {
        let (mut server, mut client) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut wire = BytesMut::new();
        encode_envelope(&[1, 2, 3], &mut wire);
        server.write_all(&wire).unwrap();

        let payload = read_envelope(&mut client, &FrameConfig::default()).unwrap();
        assert_eq!(payload.as_ref(), [1, 2, 3]);
    }
}
