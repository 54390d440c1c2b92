use core::marker::PhantomData;
use std::{
  io,
  net::{IpAddr, SocketAddr, ToSocketAddrs},
};

use smol_str_0_3::SmolStr;

use super::{super::{AsyncResolver, Flags, Query, Resolver}, ServiceError, empty_host, select, service_port};

/// Errors that can occur when resolving with the [`SystemResolver`].
#[derive(Debug, thiserror::Error)]
pub enum SystemResolverError {
  /// Returns when the system lookup fails.
  #[error("{0}")]
  Io(#[from] io::Error),
  /// Returns when the service cannot be turned into a port.
  #[error(transparent)]
  Service(#[from] ServiceError),
  /// Returns when [`Flags::NUMERIC_HOST`] is set and the host is not a numeric address.
  #[error("host {0:?} is not a numeric address")]
  NotNumericHost(SmolStr),
}

/// A resolver which uses the operating system's name service through
/// [`ToSocketAddrs`], i.e. `getaddrinfo` on most platforms.
///
/// Services may be numeric ports or well-known service names, see
/// [`service`](crate::service).
///
/// `R` is the async runtime the blocking lookup is handed to, e.g.
/// `agnostic::tokio::TokioRuntime`. The synchronous [`Resolver`] works for
/// any `R`; [`SystemResolver::new`] picks `()` for callers that never
/// resolve asynchronously. Dropping the future returned by
/// [`AsyncResolver::resolve`] cancels the resolution: the lookup still runs
/// to completion on the runtime's blocking pool, but its result is discarded.
pub struct SystemResolver<R = ()> {
  _runtime: PhantomData<fn() -> R>,
}

impl SystemResolver {
  /// Creates a new [`SystemResolver`] for synchronous resolution.
  #[inline]
  pub const fn new() -> Self {
    Self::with_runtime()
  }
}

impl<R> SystemResolver<R> {
  /// Creates a new [`SystemResolver`] which runs asynchronous lookups on the runtime `R`.
  #[inline]
  pub const fn with_runtime() -> Self {
    Self {
      _runtime: PhantomData,
    }
  }
}

impl<R> Default for SystemResolver<R> {
  fn default() -> Self {
    Self::with_runtime()
  }
}

impl<R> Clone for SystemResolver<R> {
  fn clone(&self) -> Self {
    *self
  }
}

impl<R> Copy for SystemResolver<R> {}

impl<R> core::fmt::Debug for SystemResolver<R> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_str("SystemResolver")
  }
}

fn lookup(query: &Query) -> Result<Vec<SocketAddr>, SystemResolverError> {
  let port = service_port(query)?;
  let host = query.host();
  let protocol = query.protocol();
  let flags = query.flags();

  let ips = if host.is_empty() {
    empty_host(protocol, flags)
  } else if let Ok(ip) = host.parse::<IpAddr>() {
    vec![ip]
  } else if flags.contains(Flags::NUMERIC_HOST) {
    return Err(SystemResolverError::NotNumericHost(SmolStr::new(host)));
  } else {
    (host, port)
      .to_socket_addrs()?
      .map(|addr| addr.ip())
      .collect()
  };

  Ok(
    select(ips, protocol, flags)
      .into_iter()
      .map(|ip| SocketAddr::new(ip, port))
      .collect(),
  )
}

impl<R> Resolver for SystemResolver<R> {
  type Error = SystemResolverError;

  fn resolve(&self, query: &Query) -> Result<Vec<SocketAddr>, Self::Error> {
    lookup(query)
  }
}

#[cfg(feature = "agnostic")]
impl<R: agnostic::Runtime> AsyncResolver for SystemResolver<R> {
  type Error = SystemResolverError;

  async fn resolve(&self, query: Query) -> Result<Vec<SocketAddr>, Self::Error> {
    let (tx, rx) = futures::channel::oneshot::channel();

    R::spawn_blocking_detach(move || {
      if tx.send(lookup(&query)).is_err() {
        #[cfg(feature = "tracing")]
        tracing::debug!(
          target = "peercraft.resolver.system",
          "discarding resolution of {}: receiver dropped",
          query,
        );
      }
    });

    rx.await
      .map_err(|e| io::Error::new(io::ErrorKind::BrokenPipe, e))?
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Protocol;
  #[cfg(feature = "agnostic")]
  use agnostic::tokio::TokioRuntime;

  #[test]
  fn test_numeric_host() {
    let q = Query::new("10.1.2.3", "4000", Protocol::Unspecified, Flags::default());
    let addrs = Resolver::resolve(&SystemResolver::new(), &q).unwrap();
    assert_eq!(addrs, vec!["10.1.2.3:4000".parse::<SocketAddr>().unwrap()]);
  }

  #[test]
  fn test_numeric_host_flag() {
    let q = Query::new("localhost", "4000", Protocol::Unspecified, Flags::NUMERIC_HOST);
    let err = Resolver::resolve(&SystemResolver::new(), &q).unwrap_err();
    assert!(matches!(err, SystemResolverError::NotNumericHost(_)));
  }

  #[test]
  fn test_symbolic_service() {
    let q = Query::new("::1", "domain", Protocol::Unspecified, Flags::default());
    let addrs = Resolver::resolve(&SystemResolver::new(), &q).unwrap();
    assert_eq!(addrs, vec!["[::1]:53".parse::<SocketAddr>().unwrap()]);

    let q = Query::new("::1", "gopher", Protocol::Unspecified, Flags::default());
    let err = Resolver::resolve(&SystemResolver::new(), &q).unwrap_err();
    assert!(matches!(err, SystemResolverError::Service(ServiceError::Unknown(_))));
  }

  #[test]
  fn test_protocol_mismatch() {
    let q = Query::new("10.1.2.3", "4000", Protocol::V6, Flags::default());
    assert!(Resolver::resolve(&SystemResolver::new(), &q).unwrap().is_empty());
  }

  #[test]
  fn test_passive_empty_host() {
    let q = Query::new("", "12000", Protocol::V4, Flags::PASSIVE);
    let addrs = Resolver::resolve(&SystemResolver::new(), &q).unwrap();
    assert_eq!(addrs, vec!["0.0.0.0:12000".parse::<SocketAddr>().unwrap()]);
  }

  #[cfg(feature = "agnostic")]
  #[tokio::test]
  async fn test_async_matches_sync() {
    let resolver = SystemResolver::<TokioRuntime>::default();
    let q = Query::new("127.0.0.1", "ntp", Protocol::Unspecified, Flags::default());
    let sync = Resolver::resolve(&resolver, &q).unwrap();
    let not_sync = AsyncResolver::resolve(&resolver, q).await.unwrap();
    assert_eq!(sync, not_sync);
  }

  #[cfg(feature = "agnostic")]
  #[tokio::test]
  async fn test_localhost() {
    let resolver = SystemResolver::<TokioRuntime>::with_runtime();
    let q = Query::new("localhost", "12000", Protocol::Unspecified, Flags::default());
    let addrs = AsyncResolver::resolve(&resolver, q).await.unwrap();
    assert!(!addrs.is_empty());
    assert!(addrs.iter().all(|addr| addr.ip().is_loopback() && addr.port() == 12000));
  }
}

#[cfg(all(test, feature = "agnostic"))]
mod concurrency_tests {
  use super::*;
  use crate::Protocol;
  use agnostic::tokio::TokioRuntime;

  #[tokio::test]
  async fn test_concurrent_lookups_share_runtime() {
    let resolver = SystemResolver::<TokioRuntime>::default();
    let lookups = (0..64u16).map(|i| {
      let q = Query::new("127.0.0.1", (10000 + i).to_string(), Protocol::V4, Flags::default());
      AsyncResolver::resolve(&resolver, q)
    });
    let results = futures::future::join_all(lookups).await;
    for (i, res) in results.into_iter().enumerate() {
      let addrs = res.unwrap();
      assert_eq!(addrs, vec![SocketAddr::from(([127, 0, 0, 1], 10000 + i as u16))]);
    }
  }

  #[tokio::test]
  async fn test_dropped_lookup_is_discarded() {
    let resolver = SystemResolver::<TokioRuntime>::default();
    let q = Query::new("localhost", "12000", Protocol::Unspecified, Flags::default());
    drop(AsyncResolver::resolve(&resolver, q));

    let q = Query::new("127.0.0.1", "12000", Protocol::V4, Flags::default());
    let addrs = AsyncResolver::resolve(&resolver, q).await.unwrap();
    assert_eq!(addrs, vec![SocketAddr::from(([127, 0, 0, 1], 12000))]);
  }
}
