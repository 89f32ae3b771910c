use crate::wol::Error;
use std::fmt;
use std::str::FromStr;

/// Leading six bytes of every magic packet.
pub const SYNCHRONIZATION_STREAM: [u8; 6] = [0xff; 6];
/// How many times the target MAC follows the synchronization stream.
pub const MAC_REPETITIONS: usize = 16;
pub const MAGIC_PACKET_LEN: usize = SYNCHRONIZATION_STREAM.len() + MAC_REPETITIONS * 6;

/// A 48-bit hardware address.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub const fn new(octets: [u8; 6]) -> Self {
        MacAddress(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

// Groups of `width` hex digits joined by a single `sep`.
fn grouped(b: &[u8], width: usize, sep: u8) -> bool {
    b.iter().enumerate().all(|(i, c)| {
        if (i + 1) % (width + 1) == 0 {
            *c == sep
        } else {
            c.is_ascii_hexdigit()
        }
    })
}

// 00:11:22:33:44:55, 00-11-22-33-44-55, 0011.2233.4455 or 001122334455.
fn is_well_formed(s: &str) -> bool {
    let b = s.as_bytes();
    match b.len() {
        12 => b.iter().all(u8::is_ascii_hexdigit),
        14 => grouped(b, 4, b'.'),
        17 => grouped(b, 2, b':') || grouped(b, 2, b'-'),
        _ => false,
    }
}

/// Validates `s` and returns its 12 hex digits, lowercase, without separators.
pub fn normalize_mac(s: &str) -> Result<String, Error> {
    if !is_well_formed(s) {
        return Err(Error::InvalidMacAddress(s.to_string()));
    }
    let digits: String = s
        .chars()
        .filter(char::is_ascii_hexdigit)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if digits.len() != 12 {
        return Err(Error::InvalidMacAddress(s.to_string()));
    }
    Ok(digits)
}

impl FromStr for MacAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = normalize_mac(s)?;
        let octets: [u8; 6] = hex::decode(&digits)
            .map_err(|_| Error::InvalidMacAddress(s.to_string()))?
            .try_into()
            .map_err(|_| Error::InvalidMacAddress(s.to_string()))?;
        Ok(MacAddress(octets))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// The 102-byte Wake-on-LAN payload for a single target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MagicPacket([u8; MAGIC_PACKET_LEN]);

impl MagicPacket {
    pub fn new(mac_address: MacAddress) -> Self {
        let mut data = [0u8; MAGIC_PACKET_LEN];
        data[..SYNCHRONIZATION_STREAM.len()].copy_from_slice(&SYNCHRONIZATION_STREAM);
        for chunk in data[SYNCHRONIZATION_STREAM.len()..].chunks_exact_mut(6) {
            chunk.copy_from_slice(&mac_address.0);
        }
        MagicPacket(data)
    }

    /// Checks that `payload` is a well formed magic packet, e.g. one
    /// captured off the wire.
    pub fn from_bytes(payload: &[u8]) -> Option<Self> {
        let data: [u8; MAGIC_PACKET_LEN] = payload.try_into().ok()?;
        let (header, body) = data.split_at(SYNCHRONIZATION_STREAM.len());
        if header != &SYNCHRONIZATION_STREAM[..] {
            return None;
        }
        let first = &body[..6];
        if !body.chunks_exact(6).all(|chunk| chunk == first) {
            return None;
        }
        Some(MagicPacket(data))
    }

    pub fn target(&self) -> MacAddress {
        let start = SYNCHRONIZATION_STREAM.len();
        let mut octets = [0u8; 6];
        octets.copy_from_slice(&self.0[start..start + 6]);
        MacAddress(octets)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> [u8; MAGIC_PACKET_LEN] {
        self.0
    }
}

impl AsRef<[u8]> for MagicPacket {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for MagicPacket {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(MagicPacket::new(s.parse()?))
    }
}

#[cfg(test)]
mod tests {
    use crate::wol::packet::*;

    macro_rules! test_mac_ok {
        ($name:ident, $s:expr, $o:expr) => {
            #[test]
            fn $name() {
                let mac: MacAddress = $s.parse().unwrap();
                assert_eq!(mac.octets(), $o);
            }
        };
    }

    macro_rules! test_mac_err {
        ($name:ident, $s:expr) => {
            #[test]
            fn $name() {
                match $s.parse::<MacAddress>() {
                    Err(Error::InvalidMacAddress(input)) => assert_eq!(input, $s),
                    other => panic!("expected InvalidMacAddress, got {:?}", other),
                }
            }
        };
    }

    const OCTETS: [u8; 6] = [0x00, 0x11, 0x22, 0x33, 0x44, 0x55];

    test_mac_ok! {colons, "00:11:22:33:44:55", OCTETS}
    test_mac_ok! {dashes, "00-11-22-33-44-55", OCTETS}
    test_mac_ok! {bare, "001122334455", OCTETS}
    test_mac_ok! {dotted, "0011.2233.4455", OCTETS}
    test_mac_ok! {upper_case, "AA:BB:CC:DD:EE:FF", [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]}
    test_mac_ok! {mixed_case, "aA-bB-cC-dD-eE-fF", [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]}

    test_mac_err! {not_a_mac, "not-a-mac"}
    test_mac_err! {empty, ""}
    test_mac_err! {too_short, "00:11:22:33:44"}
    test_mac_err! {too_long, "00:11:22:33:44:55:66"}
    test_mac_err! {bare_too_short, "00112233445"}
    test_mac_err! {bare_too_long, "0011223344556"}
    test_mac_err! {non_hex, "00:11:22:33:44:gg"}
    test_mac_err! {mixed_separators, "00:11-22:33:44:55"}
    test_mac_err! {misplaced_separator, "001:12:23:34:45:5"}
    test_mac_err! {surrounding_whitespace, " 00:11:22:33:44:55"}

    #[test]
    fn test_normalize_mac() {
        assert_eq!(normalize_mac("AA:BB:CC:00:11:22").unwrap(), "aabbcc001122");
        assert_eq!(normalize_mac("aabb.cc00.1122").unwrap(), "aabbcc001122");
        assert!(normalize_mac("aabbcc00112").is_err());
    }

    #[test]
    fn test_display() {
        let mac = MacAddress::new([0x24, 0x4b, 0xfe, 0x55, 0x78, 0x94]);
        assert_eq!(mac.to_string(), "24:4b:fe:55:78:94");
        assert_eq!(mac.to_string().parse::<MacAddress>().unwrap(), mac);
    }

    #[test]
    fn test_magic_packet_layout() {
        let packet: MagicPacket = "00:11:22:33:44:55".parse().unwrap();
        let bytes = packet.as_bytes();
        assert_eq!(bytes.len(), 102);
        assert_eq!(&bytes[..6], &[0xff; 6]);
        for i in 0..16 {
            assert_eq!(&bytes[6 + 6 * i..12 + 6 * i], &OCTETS, "repetition {}", i);
        }
    }

    #[test]
    fn test_magic_packet_hex() {
        let packet: MagicPacket = "00:11:22:33:44:55".parse().unwrap();
        let expected = format!("ffffffffffff{}", "001122334455".repeat(16));
        assert_eq!(hex::encode(packet.as_bytes()), expected);
    }

    #[test]
    fn test_notations_give_same_packet() {
        let colons: MagicPacket = "00:11:22:33:44:55".parse().unwrap();
        let dashes: MagicPacket = "00-11-22-33-44-55".parse().unwrap();
        let bare: MagicPacket = "001122334455".parse().unwrap();
        assert_eq!(colons, dashes);
        assert_eq!(colons, bare);
    }

    #[test]
    fn test_magic_packet_target() {
        let mac = MacAddress::new([0x64, 0x95, 0x6c, 0x06, 0x84, 0x98]);
        assert_eq!(MagicPacket::new(mac).target(), mac);
    }

    #[test]
    fn test_from_bytes() {
        let packet = MagicPacket::new(MacAddress::new(OCTETS));
        assert_eq!(MagicPacket::from_bytes(packet.as_bytes()), Some(packet.clone()));

        let mut bytes = packet.into_bytes();
        assert_eq!(MagicPacket::from_bytes(&bytes[..101]), None);
        bytes[60] ^= 0x01;
        assert_eq!(MagicPacket::from_bytes(&bytes), None);
        bytes[60] ^= 0x01;
        bytes[0] = 0x00;
        assert_eq!(MagicPacket::from_bytes(&bytes), None);
    }
}
