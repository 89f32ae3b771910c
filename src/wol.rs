pub mod noop;
pub mod packet;
pub mod sender;
pub mod socket;

pub use packet::{MacAddress, MagicPacket};
pub use sender::{
    SendConfig, Sender, DEFAULT_DESTINATION, DEFAULT_REPETITION, DEFAULT_WAIT, WOL_PORT,
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid MAC address {0:?}")]
    InvalidMacAddress(String),
    #[error("Invalid destination address {0:?}")]
    InvalidDestinationAddress(String),
    #[error("Socket error: {0}")]
    SocketError(#[from] std::io::Error),
}

/// Builds the magic packet for `mac_address` without touching the network.
pub fn magic_packet(mac_address: &str) -> Result<MagicPacket, Error> {
    mac_address.parse()
}

/// Broadcasts magic packets for `mac_address` on a background thread and
/// calls `on_done` once the last packet is out or sending failed.
pub fn send<F>(mac_address: &str, config: &SendConfig, on_done: F)
where
    F: FnOnce(Result<(), Error>) + Send + 'static,
{
    Sender::default().send(mac_address, config, on_done)
}

/// Wakes `mac_address` with the default options, blocking until done.
pub fn wake(mac_address: &str) -> Result<(), Error> {
    Sender::default().send_blocking(mac_address, &SendConfig::default())
}
