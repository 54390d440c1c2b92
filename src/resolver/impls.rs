use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use smol_str_0_3::SmolStr;

use super::{Flags, Protocol, Query};

/// Async DNS resolver
#[cfg(feature = "dns")]
#[cfg_attr(docsrs, doc(cfg(feature = "dns")))]
pub mod dns;

/// Resolver backed by a fixed host table
pub mod fixed;

/// Resolver backed by the operating system
pub mod system;

/// An error which can be returned when a query's service cannot be turned into a port.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
  /// Returned if the service is neither numeric nor a well-known service name.
  #[error("unknown service {0:?}")]
  Unknown(SmolStr),
  /// Returned if [`Flags::NUMERIC_SERVICE`] is set and the service is not numeric.
  #[error("service {0:?} is not numeric")]
  NotNumeric(SmolStr),
}

/// Turns the service of the query into a port, honoring [`Flags::NUMERIC_SERVICE`].
pub(crate) fn service_port(query: &Query) -> Result<u16, ServiceError> {
  let service = query.service();
  if query.flags().contains(Flags::NUMERIC_SERVICE) {
    return crate::service::parse_port(service)
      .map_err(|_| ServiceError::NotNumeric(SmolStr::new(service)));
  }

  crate::service::resolve(service).ok_or_else(|| ServiceError::Unknown(SmolStr::new(service)))
}

/// Addresses an empty host stands for.
pub(crate) fn empty_host(protocol: Protocol, flags: Flags) -> Vec<IpAddr> {
  let (v4, v6) = if flags.contains(Flags::PASSIVE) {
    (Ipv4Addr::UNSPECIFIED, Ipv6Addr::UNSPECIFIED)
  } else {
    (Ipv4Addr::LOCALHOST, Ipv6Addr::LOCALHOST)
  };

  match protocol {
    Protocol::Unspecified => vec![IpAddr::V4(v4), IpAddr::V6(v6)],
    Protocol::V4 => vec![IpAddr::V4(v4)],
    Protocol::V6 => vec![IpAddr::V6(v6)],
  }
}

/// Filters looked up addresses by protocol, applies the v4-mapping flags and
/// removes duplicates, keeping the lookup order.
pub(crate) fn select<I>(addrs: I, protocol: Protocol, flags: Flags) -> Vec<IpAddr>
where
  I: IntoIterator<Item = IpAddr>,
{
  let mut selected = Vec::new();
  let mut mapped = Vec::new();
  for addr in addrs {
    match (protocol, addr) {
      (Protocol::V6, IpAddr::V4(v4)) => mapped.push(IpAddr::V6(v4.to_ipv6_mapped())),
      (protocol, addr) if protocol.matches(&addr) => selected.push(addr),
      _ => {}
    }
  }

  if protocol == Protocol::V6 && flags.contains(Flags::V4_MAPPED) {
    if flags.contains(Flags::ALL_MATCHING) || selected.is_empty() {
      selected.extend(mapped);
    }
  }

  let mut seen = Vec::with_capacity(selected.len());
  selected.retain(|addr| {
    if seen.contains(addr) {
      false
    } else {
      seen.push(*addr);
      true
    }
  });
  selected
}
