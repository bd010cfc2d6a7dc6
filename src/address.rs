use std::fmt;
use std::net::SocketAddr;

use crate::record::{Address, AddressType};

/// Transport-level address of a call's remote endpoint.
///
/// `Other` covers every non-IP transport (in-process channels, custom
/// transports); it carries the address's own textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TransportAddress {
    Inet(SocketAddr),
    Other(String),
}

impl From<SocketAddr> for TransportAddress {
    fn from(addr: SocketAddr) -> Self {
        TransportAddress::Inet(addr)
    }
}

impl fmt::Display for TransportAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportAddress::Inet(addr) => write!(f, "{}", addr),
            TransportAddress::Other(text) => f.write_str(text),
        }
    }
}

/// Convert a peer address into its structured [`Address`] form.
///
/// IPv6 addresses are rendered in RFC 5952 canonical form (lower-case,
/// longest zero run compressed); scope ids are not part of the output.
/// `None` yields [`Address::default`].
pub fn address_to_structured(peer: Option<&TransportAddress>) -> Address {
    match peer {
        None => Address::default(),
        Some(TransportAddress::Inet(SocketAddr::V4(v4))) => Address {
            address_type: AddressType::Ipv4,
            address: v4.ip().to_string(),
            ip_port: Some(v4.port()),
        },
        Some(TransportAddress::Inet(SocketAddr::V6(v6))) => Address {
            address_type: AddressType::Ipv6,
            address: v6.ip().to_string(),
            ip_port: Some(v6.port()),
        },
        Some(other @ TransportAddress::Other(_)) => Address {
            address_type: AddressType::Unknown,
            address: other.to_string(),
            ip_port: None,
        },
    }
}
