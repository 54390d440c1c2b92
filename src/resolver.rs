use core::future::Future;
use std::net::{IpAddr, SocketAddr};

use smol_str_0_3::SmolStr;

mod impls;
pub use impls::*;

/// The address family a resolution is restricted to.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Protocol {
  /// Any address family.
  #[default]
  Unspecified,
  /// IPv4 only.
  V4,
  /// IPv6 only.
  V6,
}

impl Protocol {
  /// Returns `true` if the given address belongs to this protocol.
  #[inline]
  pub const fn matches(&self, addr: &IpAddr) -> bool {
    match self {
      Self::Unspecified => true,
      Self::V4 => addr.is_ipv4(),
      Self::V6 => addr.is_ipv6(),
    }
  }
}

bitflags::bitflags! {
  /// Flags controlling how a [`Query`] is resolved.
  ///
  /// Resolvers honor the flags they understand and ignore the others.
  #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
  #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
  #[cfg_attr(feature = "serde", serde(transparent))]
  pub struct Flags: u32 {
    /// Request the canonical name of the host.
    const CANONICAL_NAME = 0x0002;
    /// The endpoint is meant to be bound locally: an empty host resolves to
    /// the unspecified address.
    const PASSIVE = 0x0001;
    /// The host must be a numeric address, no name lookup is performed.
    const NUMERIC_HOST = 0x0004;
    /// The service must be a numeric port, no service lookup is performed.
    const NUMERIC_SERVICE = 0x0400;
    /// When restricted to IPv6 and no IPv6 address is found, return
    /// IPv4-mapped IPv6 addresses.
    const V4_MAPPED = 0x0008;
    /// Combined with `V4_MAPPED`, return both IPv6 and IPv4-mapped addresses.
    const ALL_MATCHING = 0x0010;
    /// Only return address families configured on the local system.
    const ADDRESS_CONFIGURED = 0x0020;
  }
}

impl Default for Flags {
  #[inline]
  fn default() -> Self {
    Self::ADDRESS_CONFIGURED
  }
}

/// A host/service resolution query handed to a [`Resolver`] or an
/// [`AsyncResolver`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
  host: SmolStr,
  service: SmolStr,
  protocol: Protocol,
  flags: Flags,
}

impl Query {
  /// Creates a new query.
  pub fn new(
    host: impl Into<SmolStr>,
    service: impl Into<SmolStr>,
    protocol: Protocol,
    flags: Flags,
  ) -> Self {
    Self {
      host: host.into(),
      service: service.into(),
      protocol,
      flags,
    }
  }

  /// Returns the host to resolve.
  #[inline]
  pub fn host(&self) -> &str {
    self.host.as_str()
  }

  /// Returns the service to resolve.
  #[inline]
  pub fn service(&self) -> &str {
    self.service.as_str()
  }

  /// Returns the protocol the result is restricted to.
  #[inline]
  pub const fn protocol(&self) -> Protocol {
    self.protocol
  }

  /// Returns the query flags.
  #[inline]
  pub const fn flags(&self) -> Flags {
    self.flags
  }
}

impl core::fmt::Display for Query {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    write!(f, "{}:{}", self.host, self.service)
  }
}

/// Resolves a [`Query`] into candidate [`SocketAddr`]s, blocking the calling thread.
///
/// Candidates are returned in order of preference.
pub trait Resolver {
  /// The error type returned by the resolver.
  type Error: std::error::Error + Send + Sync + 'static;

  /// Resolves the given query.
  fn resolve(&self, query: &Query) -> Result<Vec<SocketAddr>, Self::Error>;
}

/// Resolves a [`Query`] into candidate [`SocketAddr`]s in async style.
///
/// Dropping the returned future cancels the in-flight lookup.
pub trait AsyncResolver: Send + Sync {
  /// The error type returned by the resolver.
  type Error: std::error::Error + Send + Sync + 'static;

  /// Resolves the given query.
  fn resolve(
    &self,
    query: Query,
  ) -> impl Future<Output = Result<Vec<SocketAddr>, Self::Error>> + Send;
}

impl<R: Resolver + ?Sized> Resolver for &R {
  type Error = R::Error;

  #[inline]
  fn resolve(&self, query: &Query) -> Result<Vec<SocketAddr>, Self::Error> {
    (**self).resolve(query)
  }
}

impl<R: Resolver + ?Sized> Resolver for std::sync::Arc<R> {
  type Error = R::Error;

  #[inline]
  fn resolve(&self, query: &Query) -> Result<Vec<SocketAddr>, Self::Error> {
    (**self).resolve(query)
  }
}

impl<R: AsyncResolver> AsyncResolver for std::sync::Arc<R> {
  type Error = R::Error;

  #[inline]
  fn resolve(
    &self,
    query: Query,
  ) -> impl Future<Output = Result<Vec<SocketAddr>, Self::Error>> + Send {
    (**self).resolve(query)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_protocol_matches() {
    let v4: IpAddr = "10.0.0.1".parse().unwrap();
    let v6: IpAddr = "fe80::1".parse().unwrap();
    assert!(Protocol::Unspecified.matches(&v4));
    assert!(Protocol::Unspecified.matches(&v6));
    assert!(Protocol::V4.matches(&v4));
    assert!(!Protocol::V4.matches(&v6));
    assert!(Protocol::V6.matches(&v6));
    assert!(!Protocol::V6.matches(&v4));
  }

  #[test]
  fn test_query() {
    let q = Query::new("example.org", "1234", Protocol::V4, Flags::default());
    assert_eq!(q.host(), "example.org");
    assert_eq!(q.service(), "1234");
    assert_eq!(q.protocol(), Protocol::V4);
    assert_eq!(q.flags(), Flags::ADDRESS_CONFIGURED);
    assert_eq!(q.to_string(), "example.org:1234");
  }
}
