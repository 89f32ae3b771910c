use log::debug;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

/// The sending half of a UDP socket, owned by exactly one send session.
pub trait DatagramSocket: Send {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize>;

    /// Returns an error the OS queued on the socket outside of a send call,
    /// such as an ICMP unreachable report.
    fn take_error(&self) -> io::Result<Option<io::Error>> {
        Ok(None)
    }
}

/// Opens a fresh socket for every send session.
pub trait SocketFactory: Send + Sync {
    fn open(&self, destination: SocketAddr) -> io::Result<Box<dyn DatagramSocket>>;
}

pub struct UdpSocketFactory;

impl SocketFactory for UdpSocketFactory {
    fn open(&self, destination: SocketAddr) -> io::Result<Box<dyn DatagramSocket>> {
        Ok(Box::new(open_broadcast_socket(destination)?))
    }
}

/// Creates a UDP socket of the same family as `destination`, with
/// SO_BROADCAST set, bound to an ephemeral port.
pub fn open_broadcast_socket(destination: SocketAddr) -> io::Result<UdpSocket> {
    let (domain, local) = match destination {
        SocketAddr::V4(_) => (
            Domain::IPV4,
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
        ),
        SocketAddr::V6(_) => (
            Domain::IPV6,
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
        ),
    };
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_broadcast(true)?;
    socket.bind(&local.into())?;
    debug!("opened {:?} socket for {}", domain, destination);
    Ok(socket.into())
}

impl DatagramSocket for UdpSocket {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize> {
        UdpSocket::send_to(self, buf, addr)
    }

    fn take_error(&self) -> io::Result<Option<io::Error>> {
        UdpSocket::take_error(self)
    }
}
