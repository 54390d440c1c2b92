use core::{
  fmt::{Debug, Display},
  hash::Hash,
};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddrV4, SocketAddrV6};

use cheap_clone::CheapClone;
use futures::future::{Ready, ready};

use crate::{
  AsyncResolver, Completion, Flags, Protocol, Resolution, ResolveError, ResolvedEntry, Resolver,
  TransportEndpoint, service::parse_port,
};

mod sealed {
  pub trait Sealed {}

  impl Sealed for std::net::Ipv4Addr {}
  impl Sealed for std::net::Ipv6Addr {}
}

/// An ip address family: [`Ipv4Addr`] or [`Ipv6Addr`].
pub trait IpFamily:
  sealed::Sealed
  + Copy
  + Eq
  + Ord
  + Hash
  + Debug
  + Display
  + Into<IpAddr>
  + Send
  + Sync
  + 'static
{
  /// The protocol addresses of this family belong to.
  const PROTOCOL: Protocol;
}

impl IpFamily for Ipv4Addr {
  const PROTOCOL: Protocol = Protocol::V4;
}

impl IpFamily for Ipv6Addr {
  const PROTOCOL: Protocol = Protocol::V6;
}

/// An endpoint backed by a literal ip address, with an optional port.
///
/// Resolution never touches the resolver: with an explicit port the default
/// service is ignored, without one the default service must be a decimal
/// port. The resolver, protocol and flags arguments only exist so literal
/// and hostname endpoints can be resolved the same way.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IpEndpoint<A> {
  address: A,
  port: Option<u16>,
}

impl<A: IpFamily> CheapClone for IpEndpoint<A> {}

/// A literal IPv4 endpoint.
pub type Ipv4Endpoint = IpEndpoint<Ipv4Addr>;

/// A literal IPv6 endpoint.
pub type Ipv6Endpoint = IpEndpoint<Ipv6Addr>;

impl<A: IpFamily> IpEndpoint<A> {
  /// Creates a new literal endpoint.
  #[inline]
  pub const fn new(address: A, port: Option<u16>) -> Self {
    Self { address, port }
  }

  /// Returns the address.
  #[inline]
  pub fn address(&self) -> A {
    self.address
  }

  /// Returns the explicit port, if any.
  #[inline]
  pub const fn port(&self) -> Option<u16> {
    self.port
  }

  /// Returns the protocol of the address family.
  #[inline]
  pub const fn protocol(&self) -> Protocol {
    A::PROTOCOL
  }

  /// Set the port in builder pattern
  #[inline]
  pub fn with_port(mut self, port: u16) -> Self {
    self.port = Some(port);
    self
  }

  /// Computes the transport endpoint, parsing `default_service` only when the
  /// endpoint has no explicit port.
  fn transport_endpoint<E>(&self, default_service: &str) -> Result<TransportEndpoint, ResolveError<E>> {
    let port = match self.port {
      Some(port) => port,
      None => parse_port(default_service)
        .map_err(|e| ResolveError::invalid_service(default_service, e))?,
    };
    Ok(TransportEndpoint::new(self.address.into(), port))
  }

  fn entries<E>(&self, default_service: &str) -> Completion<E> {
    self
      .transport_endpoint(default_service)
      .map(|ep| vec![ResolvedEntry::literal(ep)])
  }

  /// Resolves the endpoint without any resolver access.
  ///
  /// Fails with [`ResolveError::InvalidServiceFormat`] only when the endpoint
  /// has no explicit port and `default_service` is not a decimal port.
  pub fn resolve<R: Resolver>(
    &self,
    _resolver: &R,
    _protocol: Protocol,
    _flags: Flags,
    default_service: &str,
  ) -> Result<TransportEndpoint, ResolveError<R::Error>> {
    self.transport_endpoint(default_service)
  }

  /// Resolves the endpoint, yielding a single entry. The returned future is
  /// ready on first poll.
  pub fn resolve_async<R: AsyncResolver>(
    &self,
    _resolver: &R,
    _protocol: Protocol,
    _flags: Flags,
    default_service: &str,
  ) -> Ready<Completion<R::Error>> {
    ready(self.entries(default_service))
  }

  /// Resolves the endpoint and hands the single-entry result to `on_complete`
  /// before returning. The returned [`Resolution`] is already complete.
  pub fn async_resolve<'a, R, F>(
    &self,
    _resolver: &'a R,
    _protocol: Protocol,
    _flags: Flags,
    default_service: &str,
    on_complete: F,
  ) -> Resolution<'a, R::Error>
  where
    R: AsyncResolver,
    F: FnOnce(Completion<R::Error>) + Send + 'a,
  {
    #[cfg(feature = "tracing")]
    tracing::trace!(target = "peercraft.endpoint", "resolving literal endpoint {}", self.address);

    Resolution::ready(self.entries(default_service), on_complete)
  }
}

impl core::fmt::Display for IpEndpoint<Ipv4Addr> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self.port {
      Some(port) => Display::fmt(&SocketAddrV4::new(self.address, port), f),
      None => Display::fmt(&self.address, f),
    }
  }
}

impl core::fmt::Display for IpEndpoint<Ipv6Addr> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self.port {
      Some(port) => Display::fmt(&SocketAddrV6::new(self.address, port, 0, 0), f),
      None => write!(f, "[{}]", self.address),
    }
  }
}

impl<A: IpFamily> From<A> for IpEndpoint<A> {
  #[inline]
  fn from(address: A) -> Self {
    Self::new(address, None)
  }
}

impl From<SocketAddrV4> for IpEndpoint<Ipv4Addr> {
  #[inline]
  fn from(addr: SocketAddrV4) -> Self {
    Self::new(*addr.ip(), Some(addr.port()))
  }
}

impl From<SocketAddrV6> for IpEndpoint<Ipv6Addr> {
  #[inline]
  fn from(addr: SocketAddrV6) -> Self {
    Self::new(*addr.ip(), Some(addr.port()))
  }
}
