use std::net::{IpAddr, SocketAddr};

pub use agnostic::net::dns::*;
use agnostic::Runtime;
use hickory_resolver::error::ResolveErrorKind;
use smol_str_0_3::SmolStr;

use super::{
  super::{AsyncResolver, Flags, Query},
  ServiceError, empty_host, select, service_port,
};

/// Errors that can occur when resolving with the [`DnsResolver`].
#[derive(Debug, thiserror::Error)]
pub enum DnsResolverError {
  /// Returns when there is an error when resolving a host
  #[error("{0}")]
  Resolve(#[from] hickory_resolver::error::ResolveError),
  /// Returns when the service cannot be turned into a port.
  #[error(transparent)]
  Service(#[from] ServiceError),
  /// Returns when [`Flags::NUMERIC_HOST`] is set and the host is not a numeric address.
  #[error("host {0:?} is not a numeric address")]
  NotNumericHost(SmolStr),
}

/// The options used to construct a [`DnsResolver`].
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DnsResolverOptions {
  resolver_opts: ResolverOpts,
  resolver_config: ResolverConfig,
}

impl DnsResolverOptions {
  /// Create a new [`DnsResolverOptions`] with the default DNS configurations.
  pub fn new() -> Self {
    Self::default()
  }

  /// Set the dns configuration in builder pattern
  pub fn with_resolver_config(mut self, c: ResolverConfig) -> Self {
    self.resolver_config = c;
    self
  }

  /// Set the dns configuration
  pub fn set_resolver_config(&mut self, c: ResolverConfig) {
    self.resolver_config = c;
  }

  /// Returns the resolver configuration
  pub fn resolver_config(&self) -> &ResolverConfig {
    &self.resolver_config
  }

  /// Set the resolver options in builder pattern
  pub fn with_resolver_opts(mut self, o: ResolverOpts) -> Self {
    self.resolver_opts = o;
    self
  }

  /// Set the resolver options
  pub fn set_resolver_opts(&mut self, o: ResolverOpts) {
    self.resolver_opts = o;
  }

  /// Returns the resolver options
  pub fn resolver_opts(&self) -> &ResolverOpts {
    &self.resolver_opts
  }
}

/// A resolver which sends DNS queries with [`hickory_resolver`], driven by the
/// async runtime `R`.
///
/// Services may be numeric ports or well-known service names, see
/// [`service`](crate::service). Dropping the future returned by
/// [`AsyncResolver::resolve`] cancels the in-flight DNS query.
///
/// Results are never cached, every resolution sends fresh queries.
pub struct DnsResolver<R: Runtime> {
  dns: Dns<R>,
}

impl<R: Runtime> core::fmt::Debug for DnsResolver<R> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("DnsResolver").finish_non_exhaustive()
  }
}

impl<R: Runtime> DnsResolver<R> {
  /// Create a new [`DnsResolver`] with the given options.
  pub fn new(opts: DnsResolverOptions) -> Self {
    Self {
      dns: Dns::new(
        opts.resolver_config,
        opts.resolver_opts,
        AsyncConnectionProvider::new(),
      ),
    }
  }

  /// Create a new [`DnsResolver`] from the system configuration, e.g. `/etc/resolv.conf`.
  pub fn from_system_conf() -> Result<Self, DnsResolverError> {
    let (config, opts) = hickory_resolver::system_conf::read_system_conf()?;
    Ok(Self::new(
      DnsResolverOptions::new()
        .with_resolver_config(config)
        .with_resolver_opts(opts),
    ))
  }
}

impl<R: Runtime> AsyncResolver for DnsResolver<R> {
  type Error = DnsResolverError;

  async fn resolve(&self, query: Query) -> Result<Vec<SocketAddr>, Self::Error> {
    let port = service_port(&query)?;
    let host = query.host();

    let ips = if host.is_empty() {
      empty_host(query.protocol(), query.flags())
    } else if let Ok(ip) = host.parse::<IpAddr>() {
      vec![ip]
    } else if query.flags().contains(Flags::NUMERIC_HOST) {
      return Err(DnsResolverError::NotNumericHost(SmolStr::new(host)));
    } else {
      match self.dns.lookup_ip(host).await {
        Ok(lookup) => lookup.iter().collect(),
        Err(e) if matches!(e.kind(), ResolveErrorKind::NoRecordsFound { .. }) => {
          #[cfg(feature = "tracing")]
          tracing::debug!(
            target = "peercraft.resolver.dns",
            "no records found for {}",
            host,
          );
          Vec::new()
        }
        Err(e) => return Err(e.into()),
      }
    };

    Ok(
      select(ips, query.protocol(), query.flags())
        .into_iter()
        .map(|ip| SocketAddr::new(ip, port))
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Protocol;
  use agnostic::tokio::TokioRuntime;

  #[tokio::test]
  async fn test_numeric_host_skips_lookup() {
    let resolver = DnsResolver::<TokioRuntime>::new(Default::default());
    let q = Query::new("10.0.0.7", "wireguard", Protocol::Unspecified, Flags::default());
    let addrs = resolver.resolve(q).await.unwrap();
    assert_eq!(addrs, vec!["10.0.0.7:51820".parse::<SocketAddr>().unwrap()]);
  }

  #[tokio::test]
  async fn test_numeric_host_flag() {
    let resolver = DnsResolver::<TokioRuntime>::new(Default::default());
    let q = Query::new("example.org", "1234", Protocol::Unspecified, Flags::NUMERIC_HOST);
    let err = resolver.resolve(q).await.unwrap_err();
    assert!(matches!(err, DnsResolverError::NotNumericHost(_)));
  }

  #[test]
  fn test_options() {
    let opts = DnsResolverOptions::new().with_resolver_config(ResolverConfig::cloudflare());
    assert_eq!(
      opts.resolver_config().name_servers().len(),
      ResolverConfig::cloudflare().name_servers().len()
    );
  }
}
