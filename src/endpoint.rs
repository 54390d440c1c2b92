use core::{future::Future, str::FromStr};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use cheap_clone::CheapClone;
use futures::future::Either;
use smol_str_0_3::SmolStr;

use crate::{
  AsyncResolver, Completion, Flags, ParseEndpointError, Protocol, Resolution, ResolveError,
  ResolveOptions, Resolver, TransportEndpoint, service::parse_port,
};

mod hostname;
mod ip;

pub use hostname::{Hostname, HostnameEndpoint};
pub use ip::{IpEndpoint, IpFamily, Ipv4Endpoint, Ipv6Endpoint};

/// A peer endpoint as given by a user or a configuration file.
///
/// An endpoint is either a literal address, resolved without any resolver
/// access, or a hostname, resolved by delegating to a resolver. Both kinds
/// are resolved through the same methods, synchronously with
/// [`Endpoint::resolve`] or asynchronously with [`Endpoint::resolve_async`]
/// and [`Endpoint::async_resolve`].
///
/// e.g. Valid format
/// 1. `127.0.0.1`, `127.0.0.1:12000`
/// 2. `::1`, `[::1]`, `[::1]:12000`
/// 3. `peer.example.org`, `peer.example.org:12000`, `peer.example.org:freelan`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Endpoint {
  /// A literal IPv4 endpoint.
  V4(Ipv4Endpoint),
  /// A literal IPv6 endpoint.
  V6(Ipv6Endpoint),
  /// A hostname endpoint.
  Hostname(HostnameEndpoint),
}

impl CheapClone for Endpoint {}

impl Endpoint {
  /// Returns `true` if the endpoint is a literal address.
  #[inline]
  pub const fn is_literal(&self) -> bool {
    !matches!(self, Self::Hostname(_))
  }

  /// Returns the ip address of a literal endpoint.
  #[inline]
  pub fn ip(&self) -> Option<IpAddr> {
    match self {
      Self::V4(ep) => Some(IpAddr::V4(ep.address())),
      Self::V6(ep) => Some(IpAddr::V6(ep.address())),
      Self::Hostname(_) => None,
    }
  }

  /// Returns the explicit port of a literal endpoint.
  #[inline]
  pub const fn port(&self) -> Option<u16> {
    match self {
      Self::V4(ep) => ep.port(),
      Self::V6(ep) => ep.port(),
      Self::Hostname(_) => None,
    }
  }

  /// Returns the hostname of a hostname endpoint.
  #[inline]
  pub const fn hostname(&self) -> Option<&Hostname> {
    match self {
      Self::Hostname(ep) => Some(ep.hostname()),
      _ => None,
    }
  }

  /// Resolves the endpoint synchronously.
  ///
  /// Literal endpoints return immediately without touching the resolver.
  /// Hostname endpoints block on the resolver and return its first candidate.
  pub fn resolve<R: Resolver>(
    &self,
    resolver: &R,
    protocol: Protocol,
    flags: Flags,
    default_service: &str,
  ) -> Result<TransportEndpoint, ResolveError<R::Error>> {
    match self {
      Self::V4(ep) => ep.resolve(resolver, protocol, flags, default_service),
      Self::V6(ep) => ep.resolve(resolver, protocol, flags, default_service),
      Self::Hostname(ep) => ep.resolve(resolver, protocol, flags, default_service),
    }
  }

  /// Resolves the endpoint synchronously with the given options.
  #[inline]
  pub fn resolve_with<R: Resolver>(
    &self,
    resolver: &R,
    opts: &ResolveOptions,
  ) -> Result<TransportEndpoint, ResolveError<R::Error>> {
    self.resolve(resolver, opts.protocol(), opts.flags(), opts.default_service())
  }

  /// Resolves the endpoint asynchronously, returning every candidate.
  ///
  /// Literal endpoints yield a single entry and the future is ready on first
  /// poll. Hostname endpoints yield the resolver's candidates in order.
  pub fn resolve_async<'a, R: AsyncResolver>(
    &self,
    resolver: &'a R,
    protocol: Protocol,
    flags: Flags,
    default_service: &str,
  ) -> impl Future<Output = Completion<R::Error>> + Send + use<'a, R> {
    match self {
      Self::V4(ep) => Either::Left(ep.resolve_async(resolver, protocol, flags, default_service)),
      Self::V6(ep) => Either::Left(ep.resolve_async(resolver, protocol, flags, default_service)),
      Self::Hostname(ep) => {
        Either::Right(ep.resolve_async(resolver, protocol, flags, default_service))
      }
    }
  }

  /// Resolves the endpoint asynchronously with the given options.
  #[inline]
  pub fn resolve_async_with<'a, R: AsyncResolver>(
    &self,
    resolver: &'a R,
    opts: &ResolveOptions,
  ) -> impl Future<Output = Completion<R::Error>> + Send + use<'a, R> {
    self.resolve_async(resolver, opts.protocol(), opts.flags(), opts.default_service())
  }

  /// Starts an asynchronous resolution whose result is handed to `on_complete`
  /// exactly once.
  ///
  /// For literal endpoints `on_complete` runs before this method returns.
  /// For hostname endpoints the returned [`Resolution`] must be driven by the
  /// caller's event loop, and can be cancelled; see [`Resolution`].
  pub fn async_resolve<'a, R, F>(
    &self,
    resolver: &'a R,
    protocol: Protocol,
    flags: Flags,
    default_service: &str,
    on_complete: F,
  ) -> Resolution<'a, R::Error>
  where
    R: AsyncResolver,
    F: FnOnce(Completion<R::Error>) + Send + 'a,
  {
    match self {
      Self::V4(ep) => ep.async_resolve(resolver, protocol, flags, default_service, on_complete),
      Self::V6(ep) => ep.async_resolve(resolver, protocol, flags, default_service, on_complete),
      Self::Hostname(ep) => {
        ep.async_resolve(resolver, protocol, flags, default_service, on_complete)
      }
    }
  }

  /// Starts an asynchronous resolution with the given options.
  #[inline]
  pub fn async_resolve_with<'a, R, F>(
    &self,
    resolver: &'a R,
    opts: &ResolveOptions,
    on_complete: F,
  ) -> Resolution<'a, R::Error>
  where
    R: AsyncResolver,
    F: FnOnce(Completion<R::Error>) + Send + 'a,
  {
    self.async_resolve(
      resolver,
      opts.protocol(),
      opts.flags(),
      opts.default_service(),
      on_complete,
    )
  }
}

impl core::fmt::Display for Endpoint {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self {
      Self::V4(ep) => core::fmt::Display::fmt(ep, f),
      Self::V6(ep) => core::fmt::Display::fmt(ep, f),
      Self::Hostname(ep) => core::fmt::Display::fmt(ep, f),
    }
  }
}

impl FromStr for Endpoint {
  type Err = ParseEndpointError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if s.is_empty() {
      return Err(ParseEndpointError::Empty);
    }

    if let Some(rest) = s.strip_prefix('[') {
      let (addr, rest) = rest
        .split_once(']')
        .ok_or(ParseEndpointError::InvalidIpv6)?;
      let addr: Ipv6Addr = addr.parse().map_err(|_| ParseEndpointError::InvalidIpv6)?;
      let port = match rest {
        "" => None,
        rest => {
          let port = rest
            .strip_prefix(':')
            .ok_or(ParseEndpointError::InvalidIpv6)?;
          Some(parse_port(port)?)
        }
      };
      return Ok(Self::V6(IpEndpoint::new(addr, port)));
    }

    if let Ok(addr) = s.parse::<Ipv4Addr>() {
      return Ok(Self::V4(addr.into()));
    }

    if let Ok(addr) = s.parse::<Ipv6Addr>() {
      return Ok(Self::V6(addr.into()));
    }

    let Some((host, service)) = s.rsplit_once(':') else {
      return Hostname::try_from(s)
        .map(|hostname| Self::Hostname(hostname.into()))
        .map_err(Into::into);
    };

    if let Ok(addr) = host.parse::<Ipv4Addr>() {
      return Ok(Self::V4(IpEndpoint::new(addr, Some(parse_port(service)?))));
    }

    if service.is_empty() {
      return Err(ParseEndpointError::EmptyService);
    }

    let hostname = Hostname::try_from(host)?;
    Ok(Self::Hostname(HostnameEndpoint::new(
      hostname,
      Some(SmolStr::new(service)),
    )))
  }
}

impl TryFrom<&str> for Endpoint {
  type Error = ParseEndpointError;

  fn try_from(value: &str) -> Result<Self, Self::Error> {
    Self::from_str(value)
  }
}

impl TryFrom<String> for Endpoint {
  type Error = ParseEndpointError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    Self::from_str(value.as_str())
  }
}

#[cfg(feature = "serde")]
const _: () = {
  impl serde::Serialize for Endpoint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
      S: serde::Serializer,
    {
      serializer.collect_str(self)
    }
  }

  impl<'de> serde::Deserialize<'de> for Endpoint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
      D: serde::Deserializer<'de>,
    {
      <String as serde::Deserialize>::deserialize(deserializer)
        .and_then(|s| Self::from_str(&s).map_err(<D::Error as serde::de::Error>::custom))
    }
  }
};

impl From<SocketAddr> for Endpoint {
  fn from(addr: SocketAddr) -> Self {
    match addr {
      SocketAddr::V4(addr) => Self::V4(addr.into()),
      SocketAddr::V6(addr) => Self::V6(addr.into()),
    }
  }
}

impl From<IpAddr> for Endpoint {
  fn from(addr: IpAddr) -> Self {
    match addr {
      IpAddr::V4(addr) => Self::V4(addr.into()),
      IpAddr::V6(addr) => Self::V6(addr.into()),
    }
  }
}

impl From<Ipv4Addr> for Endpoint {
  #[inline]
  fn from(addr: Ipv4Addr) -> Self {
    Self::V4(addr.into())
  }
}

impl From<Ipv6Addr> for Endpoint {
  #[inline]
  fn from(addr: Ipv6Addr) -> Self {
    Self::V6(addr.into())
  }
}

impl From<Ipv4Endpoint> for Endpoint {
  #[inline]
  fn from(ep: Ipv4Endpoint) -> Self {
    Self::V4(ep)
  }
}

impl From<Ipv6Endpoint> for Endpoint {
  #[inline]
  fn from(ep: Ipv6Endpoint) -> Self {
    Self::V6(ep)
  }
}

impl From<HostnameEndpoint> for Endpoint {
  #[inline]
  fn from(ep: HostnameEndpoint) -> Self {
    Self::Hostname(ep)
  }
}

impl From<Hostname> for Endpoint {
  #[inline]
  fn from(hostname: Hostname) -> Self {
    Self::Hostname(hostname.into())
  }
}
