use crate::wol::socket::{DatagramSocket, SocketFactory};
use log::info;
use std::io;
use std::net::SocketAddr;

pub struct LogOnlySocket;

impl DatagramSocket for LogOnlySocket {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize> {
        info!("faking datagram to {}: {}", addr, hex::encode(buf));
        Ok(buf.len())
    }
}

pub struct LogOnlyFactory;

impl SocketFactory for LogOnlyFactory {
    fn open(&self, destination: SocketAddr) -> io::Result<Box<dyn DatagramSocket>> {
        info!("faking socket for {}", destination);
        Ok(Box::new(LogOnlySocket))
    }
}
