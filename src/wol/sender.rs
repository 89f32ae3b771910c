use crate::wol::packet::MagicPacket;
use crate::wol::socket::{DatagramSocket, SocketFactory, UdpSocketFactory};
use crate::wol::Error;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

/// The limited broadcast address.
pub const DEFAULT_DESTINATION: IpAddr = IpAddr::V4(Ipv4Addr::BROADCAST);
/// Discard protocol port, the usual Wake-on-LAN target.
pub const WOL_PORT: u16 = 9;
pub const DEFAULT_REPETITION: i32 = 5;
pub const DEFAULT_WAIT: Duration = Duration::from_millis(100);

/// Options for one send invocation. Missing fields in a serialized config
/// fall back to the defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SendConfig {
    /// IPv4 or IPv6 literal each datagram is sent to.
    pub destination: String,
    pub port: u16,
    /// Number of datagrams to send. Anything below 1 still sends one.
    pub repetition: i32,
    /// Delay between datagrams, in milliseconds.
    #[serde(rename = "wait")]
    pub wait_ms: u64,
}

impl Default for SendConfig {
    fn default() -> Self {
        SendConfig {
            destination: DEFAULT_DESTINATION.to_string(),
            port: WOL_PORT,
            repetition: DEFAULT_REPETITION,
            wait_ms: DEFAULT_WAIT.as_millis() as u64,
        }
    }
}

impl SendConfig {
    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, Error> {
        let ip: IpAddr = self
            .destination
            .parse()
            .map_err(|_| Error::InvalidDestinationAddress(self.destination.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

enum State {
    Sending { remaining: i32 },
    Done(Result<(), Error>),
}

// Owns the socket for the lifetime of one invocation; dropping the session
// closes it.
struct Session {
    socket: Box<dyn DatagramSocket>,
    packet: MagicPacket,
    destination: SocketAddr,
    sent: usize,
}

impl Session {
    fn step(&mut self, remaining: i32) -> State {
        // Counted before the stop check, so repetition <= 0 still sends once.
        let remaining = remaining.saturating_sub(1);
        if let Err(err) = self.socket.send_to(self.packet.as_bytes(), self.destination) {
            warn!("send {} to {} failed: {}", self.sent + 1, self.destination, err);
            return State::Done(Err(err.into()));
        }
        self.sent += 1;
        debug!("sent magic packet {} to {}", self.sent, self.destination);
        match self.socket.take_error() {
            Ok(None) => {}
            Ok(Some(err)) | Err(err) => {
                warn!("socket error after send {}: {}", self.sent, err);
                return State::Done(Err(err.into()));
            }
        }
        if remaining <= 0 {
            State::Done(Ok(()))
        } else {
            State::Sending { remaining }
        }
    }

    fn run(
        mut self,
        repetition: i32,
        wait: Duration,
        mut sleep: impl FnMut(Duration),
    ) -> Result<(), Error> {
        let mut state = State::Sending {
            remaining: repetition,
        };
        loop {
            state = match state {
                State::Sending { remaining } => {
                    let next = self.step(remaining);
                    if let State::Sending { .. } = next {
                        sleep(wait);
                    }
                    next
                }
                State::Done(result) => {
                    debug!(
                        "closing socket for {} after {} packet(s)",
                        self.destination, self.sent
                    );
                    return result;
                }
            };
        }
    }
}

// Hands the result to the caller's callback, at most once.
fn complete<F>(slot: &Mutex<Option<F>>, result: Result<(), Error>)
where
    F: FnOnce(Result<(), Error>),
{
    let on_done = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(on_done) = on_done {
        on_done(result);
    }
}

/// Sends magic packets through sockets from a [`SocketFactory`]. Each
/// invocation gets its own socket, so concurrent sends never share state.
#[derive(Clone)]
pub struct Sender {
    factory: Arc<dyn SocketFactory>,
}

impl Default for Sender {
    fn default() -> Self {
        Sender::new(Arc::new(UdpSocketFactory))
    }
}

impl Sender {
    pub fn new(factory: Arc<dyn SocketFactory>) -> Self {
        Sender { factory }
    }

    fn prepare(
        mac_address: &str,
        config: &SendConfig,
    ) -> Result<(MagicPacket, SocketAddr), Error> {
        let packet: MagicPacket = mac_address.parse()?;
        let destination = config.socket_addr()?;
        Ok((packet, destination))
    }

    fn run(
        &self,
        packet: MagicPacket,
        destination: SocketAddr,
        repetition: i32,
        wait: Duration,
    ) -> Result<(), Error> {
        let target = packet.target();
        let socket = self.factory.open(destination)?;
        let session = Session {
            socket,
            packet,
            destination,
            sent: 0,
        };
        let result = session.run(repetition, wait, thread::sleep);
        match &result {
            Ok(()) => info!("woke {} via {}", target, destination),
            Err(err) => warn!("waking {} via {} failed: {}", target, destination, err),
        }
        result
    }

    /// Sends on the calling thread and returns once the sequence is over.
    pub fn send_blocking(&self, mac_address: &str, config: &SendConfig) -> Result<(), Error> {
        let (packet, destination) = Self::prepare(mac_address, config)?;
        self.run(packet, destination, config.repetition, config.wait())
    }

    /// Starts a send sequence on its own thread and returns immediately.
    ///
    /// `on_done` is called exactly once: inline if `mac_address` or the
    /// configured destination does not parse, otherwise from the sending
    /// thread after the last datagram or the first error.
    pub fn send<F>(&self, mac_address: &str, config: &SendConfig, on_done: F)
    where
        F: FnOnce(Result<(), Error>) + Send + 'static,
    {
        let (packet, destination) = match Self::prepare(mac_address, config) {
            Ok(prepared) => prepared,
            Err(err) => return on_done(Err(err)),
        };
        let repetition = config.repetition;
        let wait = config.wait();
        let sender = self.clone();
        let slot = Arc::new(Mutex::new(Some(on_done)));
        let inner_slot = slot.clone();
        let spawned = thread::Builder::new()
            .name(format!("wol {}", packet.target()))
            .spawn(move || {
                let result = sender.run(packet, destination, repetition, wait);
                complete(&inner_slot, result);
            });
        if let Err(err) = spawned {
            warn!("could not start send thread: {}", err);
            complete(&slot, Err(err.into()));
        }
    }
}
