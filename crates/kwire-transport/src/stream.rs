use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TransportError};

/// Default `SO_RCVBUF` applied to TCP connections.
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 16 * 1024;

/// Socket options applied when a [`KStream`] is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Read timeout for blocking operations. `None` blocks indefinitely.
    pub read_timeout: Option<Duration>,
    /// Write timeout for blocking operations. `None` blocks indefinitely.
    pub write_timeout: Option<Duration>,
    /// Disable Nagle's algorithm on TCP connections.
    pub nodelay: bool,
    /// Receive buffer size for TCP connections (Unix only).
    pub recv_buffer_size: Option<usize>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            read_timeout: None,
            write_timeout: None,
            nodelay: true,
            recv_buffer_size: Some(DEFAULT_RECV_BUFFER_SIZE),
        }
    }
}

/// A connected command-server stream implementing `Read + Write`.
pub struct KStream {
    inner: KStreamInner,
}

enum KStreamInner {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl Read for KStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            KStreamInner::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            KStreamInner::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for KStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            KStreamInner::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            KStreamInner::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            KStreamInner::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            KStreamInner::Unix(stream) => stream.flush(),
        }
    }
}

impl KStream {
    /// Connect to a command server over TCP (blocking).
    ///
    /// Each resolved address is tried in turn. On Unix the receive buffer
    /// is sized before `connect` so it takes part in window negotiation.
    pub fn connect_tcp(host: &str, port: u16, config: &TransportConfig) -> Result<Self> {
        let endpoint = format!("{host}:{port}");
        let connect_error = |source| TransportError::Connect {
            endpoint: endpoint.clone(),
            source,
        };

        let mut last_err = None;
        let mut connected = None;
        for addr in (host, port).to_socket_addrs().map_err(connect_error)? {
            match open_tcp(addr, config) {
                Ok(stream) => {
                    connected = Some(stream);
                    break;
                }
                Err(err) => last_err = Some(err),
            }
        }
        let stream = connected.ok_or_else(|| {
            connect_error(last_err.unwrap_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "host resolved to no addresses",
                )
            }))
        })?;

        stream.set_nodelay(config.nodelay)?;

        let stream = Self {
            inner: KStreamInner::Tcp(stream),
        };
        stream.apply_timeouts(config)?;
        debug!(
            %endpoint,
            nodelay = config.nodelay,
            recv_buffer_size = config.recv_buffer_size,
            "connected over tcp"
        );
        Ok(stream)
    }

    /// Connect to a command server over a Unix domain socket (blocking).
    #[cfg(unix)]
    pub fn connect_unix(path: impl AsRef<Path>, config: &TransportConfig) -> Result<Self> {
        let path = path.as_ref();
        let stream = std::os::unix::net::UnixStream::connect(path).map_err(|source| {
            TransportError::Connect {
                endpoint: path.display().to_string(),
                source,
            }
        })?;

        let stream = Self {
            inner: KStreamInner::Unix(stream),
        };
        stream.apply_timeouts(config)?;
        debug!(?path, "connected over unix domain socket");
        Ok(stream)
    }

    /// Unix domain sockets are unavailable on this platform.
    #[cfg(not(unix))]
    pub fn connect_unix(path: impl AsRef<Path>, _config: &TransportConfig) -> Result<Self> {
        Err(TransportError::Connect {
            endpoint: path.as_ref().display().to_string(),
            source: std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "unix domain sockets are not supported on this platform",
            ),
        })
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            KStreamInner::Tcp(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
            #[cfg(unix)]
            KStreamInner::Unix(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
        }
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            KStreamInner::Tcp(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
            #[cfg(unix)]
            KStreamInner::Unix(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
        }
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        match &self.inner {
            KStreamInner::Tcp(_) => "tcp",
            #[cfg(unix)]
            KStreamInner::Unix(_) => "unix-domain-socket",
        }
    }

    fn apply_timeouts(&self, config: &TransportConfig) -> Result<()> {
        self.set_read_timeout(config.read_timeout)?;
        self.set_write_timeout(config.write_timeout)
    }
}

impl std::fmt::Debug for KStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KStream")
            .field("type", &self.transport_name())
            .finish()
    }
}

#[cfg(not(unix))]
fn open_tcp(addr: SocketAddr, _config: &TransportConfig) -> std::io::Result<TcpStream> {
    TcpStream::connect(addr)
}

#[cfg(unix)]
fn open_tcp(addr: SocketAddr, config: &TransportConfig) -> std::io::Result<TcpStream> {
    let Some(size) = config.recv_buffer_size else {
        return TcpStream::connect(addr);
    };

    let socket = new_tcp_socket(&addr)?;
    set_recv_buffer_size(&socket, size)?;
    connect_socket(&socket, &addr)?;
    Ok(TcpStream::from(socket))
}

#[cfg(unix)]
fn new_tcp_socket(addr: &SocketAddr) -> std::io::Result<std::os::fd::OwnedFd> {
    use std::os::fd::FromRawFd;

    let domain = match addr {
        SocketAddr::V4(_) => libc::AF_INET,
        SocketAddr::V6(_) => libc::AF_INET6,
    };

    // SAFETY: plain socket(2) call; the result is checked before use.
    let fd = unsafe { libc::socket(domain, libc::SOCK_STREAM, 0) };
    if fd < 0 {
        return Err(std::io::Error::last_os_error());
    }
    // SAFETY: `fd` is a freshly created descriptor owned by nobody else.
    let socket = unsafe { std::os::fd::OwnedFd::from_raw_fd(fd) };

    // SAFETY: `fd` is valid for the lifetime of `socket`.
    if unsafe { libc::fcntl(fd, libc::F_SETFD, libc::FD_CLOEXEC) } < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(socket)
}

#[cfg(unix)]
fn connect_socket(socket: &std::os::fd::OwnedFd, addr: &SocketAddr) -> std::io::Result<()> {
    use std::os::fd::AsRawFd;

    // SAFETY: all-zero bytes are a valid value for the plain C sockaddr
    // structs; every field the kernel reads is set below.
    let rc = match addr {
        SocketAddr::V4(v4) => {
            let mut raw: libc::sockaddr_in = unsafe { std::mem::zeroed() };
            raw.sin_family = libc::AF_INET as libc::sa_family_t;
            raw.sin_port = v4.port().to_be();
            raw.sin_addr.s_addr = u32::from_ne_bytes(v4.ip().octets());
            // SAFETY: `raw` is a live sockaddr_in and the length matches it.
            unsafe {
                libc::connect(
                    socket.as_raw_fd(),
                    (&raw as *const libc::sockaddr_in).cast::<libc::sockaddr>(),
                    std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
                )
            }
        }
        SocketAddr::V6(v6) => {
            let mut raw: libc::sockaddr_in6 = unsafe { std::mem::zeroed() };
            raw.sin6_family = libc::AF_INET6 as libc::sa_family_t;
            raw.sin6_port = v6.port().to_be();
            raw.sin6_flowinfo = v6.flowinfo();
            raw.sin6_addr.s6_addr = v6.ip().octets();
            raw.sin6_scope_id = v6.scope_id();
            // SAFETY: `raw` is a live sockaddr_in6 and the length matches it.
            unsafe {
                libc::connect(
                    socket.as_raw_fd(),
                    (&raw as *const libc::sockaddr_in6).cast::<libc::sockaddr>(),
                    std::mem::size_of::<libc::sockaddr_in6>() as libc::socklen_t,
                )
            }
        }
    };

    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(unix)]
fn set_recv_buffer_size(socket: &impl std::os::fd::AsRawFd, size: usize) -> std::io::Result<()> {
    let value = libc::c_int::try_from(size).unwrap_or(libc::c_int::MAX);

    // SAFETY: `value` is a valid readable c_int for the given length, and the
    // descriptor is owned by the caller for the duration of the call.
    let rc = unsafe {
        libc::setsockopt(
            socket.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_RCVBUF,
            (&value as *const libc::c_int).cast::<libc::c_void>(),
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };

    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}
