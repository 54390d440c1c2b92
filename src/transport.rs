use core::{fmt, str::FromStr};
use std::net::{AddrParseError, IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};

use cheap_clone::CheapClone;
use smol_str_0_3::{SmolStr, format_smolstr};

/// A resolved peer address: an ip address and a numeric port.
///
/// This is the only thing a caller needs to open a socket to a peer, and it
/// converts losslessly to and from [`SocketAddr`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransportEndpoint {
  address: IpAddr,
  port: u16,
}

impl CheapClone for TransportEndpoint {}

impl TransportEndpoint {
  /// Creates a new transport endpoint.
  #[inline]
  pub const fn new(address: IpAddr, port: u16) -> Self {
    Self { address, port }
  }

  /// Returns the ip address.
  #[inline]
  pub const fn address(&self) -> IpAddr {
    self.address
  }

  /// Returns the port.
  #[inline]
  pub const fn port(&self) -> u16 {
    self.port
  }

  /// Returns `true` if the address is an IPv4 address.
  #[inline]
  pub const fn is_ipv4(&self) -> bool {
    self.address.is_ipv4()
  }

  /// Returns `true` if the address is an IPv6 address.
  #[inline]
  pub const fn is_ipv6(&self) -> bool {
    self.address.is_ipv6()
  }

  /// Converts into a [`SocketAddr`].
  #[inline]
  pub const fn to_socket_addr(&self) -> SocketAddr {
    match self.address {
      IpAddr::V4(ip) => SocketAddr::V4(SocketAddrV4::new(ip, self.port)),
      IpAddr::V6(ip) => SocketAddr::V6(SocketAddrV6::new(ip, self.port, 0, 0)),
    }
  }
}

impl fmt::Display for TransportEndpoint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(&self.to_socket_addr(), f)
  }
}

impl FromStr for TransportEndpoint {
  type Err = AddrParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    s.parse::<SocketAddr>().map(Into::into)
  }
}

impl From<SocketAddr> for TransportEndpoint {
  #[inline]
  fn from(addr: SocketAddr) -> Self {
    Self::new(addr.ip(), addr.port())
  }
}

impl From<SocketAddrV4> for TransportEndpoint {
  #[inline]
  fn from(addr: SocketAddrV4) -> Self {
    Self::new(IpAddr::V4(*addr.ip()), addr.port())
  }
}

impl From<SocketAddrV6> for TransportEndpoint {
  #[inline]
  fn from(addr: SocketAddrV6) -> Self {
    Self::new(IpAddr::V6(*addr.ip()), addr.port())
  }
}

impl From<(IpAddr, u16)> for TransportEndpoint {
  #[inline]
  fn from((address, port): (IpAddr, u16)) -> Self {
    Self::new(address, port)
  }
}

impl From<(Ipv4Addr, u16)> for TransportEndpoint {
  #[inline]
  fn from((address, port): (Ipv4Addr, u16)) -> Self {
    Self::new(IpAddr::V4(address), port)
  }
}

impl From<(Ipv6Addr, u16)> for TransportEndpoint {
  #[inline]
  fn from((address, port): (Ipv6Addr, u16)) -> Self {
    Self::new(IpAddr::V6(address), port)
  }
}

impl From<TransportEndpoint> for SocketAddr {
  #[inline]
  fn from(ep: TransportEndpoint) -> Self {
    ep.to_socket_addr()
  }
}

#[cfg(feature = "serde")]
const _: () = {
  impl serde::Serialize for TransportEndpoint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
      S: serde::Serializer,
    {
      self.to_socket_addr().serialize(serializer)
    }
  }

  impl<'de> serde::Deserialize<'de> for TransportEndpoint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
      D: serde::Deserializer<'de>,
    {
      SocketAddr::deserialize(deserializer).map(Into::into)
    }
  }
};

/// One candidate of an asynchronous resolution.
///
/// Besides the [`TransportEndpoint`] itself, an entry remembers the host name
/// and the service name it was resolved from. Literal address endpoints
/// render their address and port as these names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedEntry {
  endpoint: TransportEndpoint,
  host_name: SmolStr,
  service_name: SmolStr,
}

impl CheapClone for ResolvedEntry {}

impl ResolvedEntry {
  /// Creates a new entry.
  #[inline]
  pub fn new(
    endpoint: TransportEndpoint,
    host_name: impl Into<SmolStr>,
    service_name: impl Into<SmolStr>,
  ) -> Self {
    Self {
      endpoint,
      host_name: host_name.into(),
      service_name: service_name.into(),
    }
  }

  /// Creates an entry whose names are the canonical rendering of the endpoint's
  /// own address and port.
  pub fn literal(endpoint: TransportEndpoint) -> Self {
    Self {
      host_name: format_smolstr!("{}", endpoint.address()),
      service_name: format_smolstr!("{}", endpoint.port()),
      endpoint,
    }
  }

  /// Returns the resolved endpoint.
  #[inline]
  pub const fn endpoint(&self) -> TransportEndpoint {
    self.endpoint
  }

  /// Returns the host name this entry was resolved from.
  #[inline]
  pub fn host_name(&self) -> &str {
    self.host_name.as_str()
  }

  /// Returns the service name this entry was resolved from.
  #[inline]
  pub fn service_name(&self) -> &str {
    self.service_name.as_str()
  }

  /// Consumes the entry and returns the resolved endpoint.
  #[inline]
  pub fn into_endpoint(self) -> TransportEndpoint {
    self.endpoint
  }
}

impl From<ResolvedEntry> for TransportEndpoint {
  #[inline]
  fn from(entry: ResolvedEntry) -> Self {
    entry.endpoint
  }
}
