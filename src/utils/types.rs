use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use serde::Serialize;

/// Position on the hash ring.
pub type Key = u64;

/// Stored filenames, each mapped to its ring position.
pub type DataStore = HashMap<String, Key>;

/// Network identity of a node. The canonical text form `host/ip:port`
/// is both the wire serialization and the input to the node's key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Address {
    pub host: String,
    pub ip: IpAddr,
    pub port: u16,
}

impl Address {
    pub fn new(host: &str, ip: IpAddr, port: u16) -> Self {
        Address {
            host: host.to_string(),
            ip,
            port,
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.host, self.ip, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAddressError;

impl fmt::Display for ParseAddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed address, expected host/ip:port")
    }
}

impl Error for ParseAddressError {}

impl FromStr for Address {
    type Err = ParseAddressError;

    /// The hostname ends at the FIRST `/`, the port starts after the
    /// LAST `:`; the literal address sits in between.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let slash = s.find('/').ok_or(ParseAddressError)?;
        let colon = s.rfind(':').ok_or(ParseAddressError)?;
        if colon <= slash + 1 || slash == 0 {
            return Err(ParseAddressError);
        }
        let ip: IpAddr = s[slash + 1..colon].parse().map_err(|_| ParseAddressError)?;
        let port: u16 = s[colon + 1..].parse().map_err(|_| ParseAddressError)?;
        Ok(Address::new(&s[..slash], ip, port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_roundtrips_through_its_text_form() {
        let address = Address::new("localhost", "127.0.0.1".parse().unwrap(), 8100);
        assert_eq!(address.to_string(), "localhost/127.0.0.1:8100");
        assert_eq!(address.to_string().parse::<Address>().unwrap(), address);
    }

    #[test]
    fn address_parsing_splits_on_first_slash_and_last_colon() {
        let address: Address = "node-3/10.0.0.7:9000".parse().unwrap();
        assert_eq!(address.host, "node-3");
        assert_eq!(address.ip, "10.0.0.7".parse::<IpAddr>().unwrap());
        assert_eq!(address.port, 9000);
    }

    #[test]
    fn malformed_addresses_are_rejected() {
        assert!("127.0.0.1:8100".parse::<Address>().is_err());
        assert!("localhost/127.0.0.1".parse::<Address>().is_err());
        assert!("/127.0.0.1:8100".parse::<Address>().is_err());
        assert!("localhost/not-an-ip:8100".parse::<Address>().is_err());
        assert!("localhost/127.0.0.1:notaport".parse::<Address>().is_err());
    }
}
