use core::num::ParseIntError;

use smol_str_0_3::SmolStr;

/// Errors that can occur when resolving an [`Endpoint`](crate::Endpoint).
///
/// `E` is the error type of the resolver used for the resolution. Every
/// failure is surfaced exactly once: either returned from a synchronous
/// resolution, or handed to the completion of an asynchronous one.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError<E> {
  /// Returned when a literal address endpoint has no explicit port and the
  /// default service is not a base-10 unsigned 16-bit integer.
  #[error("invalid service format {service:?}: {source}")]
  InvalidServiceFormat {
    /// The rejected default service.
    service: SmolStr,
    /// The underlying parse error.
    source: ParseIntError,
  },
  /// Returned when the resolver returned no candidate on the synchronous path.
  #[error("resolving {host} returned no endpoint")]
  EmptyResult {
    /// The host that was queried.
    host: SmolStr,
  },
  /// Returned when the resolver failed.
  #[error("{0}")]
  Resolution(E),
  /// Returned when an in-flight asynchronous resolution was cancelled.
  #[error("resolution cancelled")]
  Cancelled,
}

impl<E> ResolveError<E> {
  /// Returns `true` if the error is [`ResolveError::Cancelled`].
  #[inline]
  pub const fn is_cancelled(&self) -> bool {
    matches!(self, Self::Cancelled)
  }

  /// Returns the resolver error, if this error was surfaced from the resolver.
  #[inline]
  pub const fn resolver_error(&self) -> Option<&E> {
    match self {
      Self::Resolution(e) => Some(e),
      _ => None,
    }
  }

  /// Maps the resolver error type.
  pub fn map_resolution<F, T>(self, f: F) -> ResolveError<T>
  where
    F: FnOnce(E) -> T,
  {
    match self {
      Self::InvalidServiceFormat { service, source } => {
        ResolveError::InvalidServiceFormat { service, source }
      }
      Self::EmptyResult { host } => ResolveError::EmptyResult { host },
      Self::Resolution(e) => ResolveError::Resolution(f(e)),
      Self::Cancelled => ResolveError::Cancelled,
    }
  }

  pub(crate) fn invalid_service(service: &str, source: ParseIntError) -> Self {
    Self::InvalidServiceFormat {
      service: SmolStr::new(service),
      source,
    }
  }
}

/// The provided input could not be parsed because
/// it is not a syntactically-valid hostname.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid hostname")]
pub struct ParseHostnameError;

impl ParseHostnameError {
  /// Returns the error message.
  #[inline]
  pub const fn as_str(&self) -> &'static str {
    "invalid hostname"
  }
}

/// An error which can be returned when parsing an [`Endpoint`](crate::Endpoint).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseEndpointError {
  /// Returned if the provided str is empty.
  #[error("endpoint is empty")]
  Empty,
  /// Returned if the port following a literal address is not a valid port.
  #[error("invalid port: {0}")]
  InvalidPort(#[from] ParseIntError),
  /// Returned if a `host:` form has an empty service.
  #[error("service is empty")]
  EmptyService,
  /// Returned if a bracketed IPv6 literal is malformed.
  #[error("invalid IPv6 literal")]
  InvalidIpv6,
  /// Returned if the host part is not a valid hostname.
  #[error(transparent)]
  Hostname(#[from] ParseHostnameError),
}
