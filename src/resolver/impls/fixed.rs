use std::{
  collections::HashMap,
  net::{IpAddr, SocketAddr},
};

use smol_str_0_3::SmolStr;

use super::{
  super::{AsyncResolver, Query, Resolver},
  ServiceError, empty_host, select, service_port,
};

/// A resolver answering from a fixed host table, without any network access.
///
/// Numeric hosts resolve to themselves, known hosts resolve to their table
/// entries, and unknown hosts resolve to no candidate at all. Useful for
/// static peer lists and tests.
///
/// If you want to query the name service of the operating system, see
/// [`SystemResolver`](crate::resolver::system::SystemResolver).
#[derive(Debug, Default, Clone)]
pub struct FixedResolver {
  hosts: HashMap<SmolStr, Vec<IpAddr>>,
}

impl FixedResolver {
  /// Creates an empty [`FixedResolver`].
  #[inline]
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds an entry in builder pattern.
  pub fn with_host<I>(mut self, host: impl Into<SmolStr>, addrs: I) -> Self
  where
    I: IntoIterator<Item = IpAddr>,
  {
    self.insert(host, addrs);
    self
  }

  /// Adds addresses for a host, after the addresses already known for it.
  pub fn insert<I>(&mut self, host: impl Into<SmolStr>, addrs: I) -> &mut Self
  where
    I: IntoIterator<Item = IpAddr>,
  {
    let host = host.into();
    let key = SmolStr::new(host.trim_end_matches('.').to_ascii_lowercase());
    self.hosts.entry(key).or_default().extend(addrs);
    self
  }

  /// Returns the addresses known for a host.
  pub fn get(&self, host: &str) -> Option<&[IpAddr]> {
    self
      .hosts
      .get(host.trim_end_matches('.').to_ascii_lowercase().as_str())
      .map(Vec::as_slice)
  }

  fn lookup(&self, query: &Query) -> Result<Vec<SocketAddr>, ServiceError> {
    let port = service_port(query)?;
    let host = query.host();
    let ips = if host.is_empty() {
      empty_host(query.protocol(), query.flags())
    } else if let Ok(ip) = host.parse::<IpAddr>() {
      vec![ip]
    } else {
      self.get(host).map(<[IpAddr]>::to_vec).unwrap_or_default()
    };

    Ok(
      select(ips, query.protocol(), query.flags())
        .into_iter()
        .map(|ip| SocketAddr::new(ip, port))
        .collect(),
    )
  }
}

impl Resolver for FixedResolver {
  type Error = ServiceError;

  fn resolve(&self, query: &Query) -> Result<Vec<SocketAddr>, Self::Error> {
    self.lookup(query)
  }
}

impl AsyncResolver for FixedResolver {
  type Error = ServiceError;

  async fn resolve(&self, query: Query) -> Result<Vec<SocketAddr>, Self::Error> {
    self.lookup(&query)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{Flags, Protocol};

  fn resolver() -> FixedResolver {
    FixedResolver::new()
      .with_host("Peer.Example.org.", ["10.0.0.1".parse().unwrap()])
      .with_host("peer.example.org", ["fe80::1".parse().unwrap()])
  }

  #[test]
  fn test_lookup() {
    let r = resolver();
    assert_eq!(r.get("peer.example.org").unwrap().len(), 2);

    let q = Query::new("PEER.example.org", "1234", Protocol::Unspecified, Flags::default());
    let addrs = Resolver::resolve(&r, &q).unwrap();
    assert_eq!(
      addrs,
      vec![
        "10.0.0.1:1234".parse::<SocketAddr>().unwrap(),
        "[fe80::1]:1234".parse::<SocketAddr>().unwrap(),
      ]
    );

    let q = Query::new("peer.example.org", "1234", Protocol::V6, Flags::default());
    assert_eq!(Resolver::resolve(&r, &q).unwrap().len(), 1);
  }

  #[test]
  fn test_unknown_host() {
    let q = Query::new("nowhere.example.org", "1234", Protocol::Unspecified, Flags::default());
    assert!(Resolver::resolve(&resolver(), &q).unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_async() {
    let q = Query::new("9.0.0.1", "stun", Protocol::Unspecified, Flags::default());
    let addrs = AsyncResolver::resolve(&resolver(), q).await.unwrap();
    assert_eq!(addrs, vec!["9.0.0.1:3478".parse::<SocketAddr>().unwrap()]);
  }
}
