use core::future::Future;

use cheap_clone::CheapClone;
use idna::{
  AsciiDenyList,
  uts46::{DnsLength, Hyphens, Uts46},
};
use smol_str_0_3::SmolStr;

use crate::{
  AsyncResolver, Completion, Flags, ParseHostnameError, Protocol, Query, Resolution, ResolveError,
  ResolvedEntry, Resolver, TransportEndpoint,
};

/// A syntactically valid hostname.
///
/// Non-ASCII names are converted to their ASCII (punycode) form on
/// construction, so [`Hostname::as_str`] is always what is sent to a resolver.
/// A trailing dot is kept as given.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hostname(SmolStr);

impl CheapClone for Hostname {}

#[cfg(feature = "serde")]
const _: () = {
  impl serde::Serialize for Hostname {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
      S: serde::Serializer,
    {
      self.as_str().serialize(serializer)
    }
  }

  impl<'de> serde::Deserialize<'de> for Hostname {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
      D: serde::Deserializer<'de>,
    {
      let s = String::deserialize(deserializer)?;
      s.try_into().map_err(serde::de::Error::custom)
    }
  }
};

impl core::fmt::Display for Hostname {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    core::fmt::Display::fmt(self.as_str(), f)
  }
}

impl AsRef<str> for Hostname {
  fn as_ref(&self) -> &str {
    self.as_str()
  }
}

impl Hostname {
  /// Returns the str representation.
  #[inline]
  pub fn as_str(&self) -> &str {
    self.0.as_str()
  }

  fn try_from_inner(hostname: &[u8]) -> Result<Self, ParseHostnameError> {
    if hostname.is_ascii() {
      validate(hostname)?;
      let hostname = core::str::from_utf8(hostname).map_err(|_| ParseHostnameError)?;
      return Ok(Self(SmolStr::new(hostname)));
    }

    let ascii = Uts46::new()
      .to_ascii(
        hostname,
        AsciiDenyList::URL,
        Hyphens::Allow,
        DnsLength::VerifyAllowRootDot,
      )
      .map_err(|_| ParseHostnameError)?;
    validate(ascii.as_bytes())?;
    Ok(Self(SmolStr::new(ascii)))
  }
}

impl TryFrom<String> for Hostname {
  type Error = ParseHostnameError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    Self::try_from_inner(value.as_bytes())
  }
}

impl<'a> TryFrom<&'a str> for Hostname {
  type Error = ParseHostnameError;

  fn try_from(value: &'a str) -> Result<Self, Self::Error> {
    Self::try_from_inner(value.as_bytes())
  }
}

impl core::str::FromStr for Hostname {
  type Err = ParseHostnameError;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    value.try_into()
  }
}

/// Validates an ASCII hostname.
///
/// Labels are at most 63 bytes of letters, digits, `-` and `_`, do not start
/// or end with `-`, and the last label is not purely numeric (that would be
/// an address, not a name).
const fn validate(input: &[u8]) -> Result<(), ParseHostnameError> {
  enum State {
    Start,
    Next,
    NumericOnly { len: usize },
    NextAfterNumericOnly,
    Subsequent { len: usize },
    Hyphen { len: usize },
  }

  use State::*;

  /// "Labels must be 63 characters or less."
  const MAX_LABEL_LENGTH: usize = 63;

  /// 253 characters, not counting the optional root dot.
  const MAX_NAME_LENGTH: usize = 253;

  let len = input.len();
  if len == 0 {
    return Err(ParseHostnameError);
  }

  let max = if input[len - 1] == b'.' {
    MAX_NAME_LENGTH + 1
  } else {
    MAX_NAME_LENGTH
  };
  if len > max {
    return Err(ParseHostnameError);
  }

  let mut state = Start;
  let mut i = 0;
  while i < len {
    let ch = input[i];
    state = match (state, ch) {
      (Start | Next | NextAfterNumericOnly | Hyphen { .. }, b'.') => {
        return Err(ParseHostnameError);
      }
      (Subsequent { .. }, b'.') => Next,
      (NumericOnly { .. }, b'.') => NextAfterNumericOnly,
      (Subsequent { len } | NumericOnly { len } | Hyphen { len }, _) if len >= MAX_LABEL_LENGTH => {
        return Err(ParseHostnameError);
      }
      (Start | Next | NextAfterNumericOnly, b'0'..=b'9') => NumericOnly { len: 1 },
      (NumericOnly { len }, b'0'..=b'9') => NumericOnly { len: len + 1 },
      (Start | Next | NextAfterNumericOnly, b'a'..=b'z' | b'A'..=b'Z' | b'_') => {
        Subsequent { len: 1 }
      }
      (Subsequent { len } | NumericOnly { len } | Hyphen { len }, b'-') => Hyphen { len: len + 1 },
      (
        Subsequent { len } | NumericOnly { len } | Hyphen { len },
        b'a'..=b'z' | b'A'..=b'Z' | b'_' | b'0'..=b'9',
      ) => Subsequent { len: len + 1 },
      _ => return Err(ParseHostnameError),
    };
    i += 1;
  }

  match state {
    // `Next` is a trailing root dot
    Next | Subsequent { .. } => Ok(()),
    _ => Err(ParseHostnameError),
  }
}

/// An endpoint naming its peer by hostname, with an optional service.
///
/// Resolution always goes through the resolver: the query carries the
/// endpoint's own service, or the default service when it has none. The
/// service may be a numeric port or a symbolic service name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HostnameEndpoint {
  hostname: Hostname,
  service: Option<SmolStr>,
}

impl CheapClone for HostnameEndpoint {}

impl HostnameEndpoint {
  /// Creates a new hostname endpoint.
  #[inline]
  pub const fn new(hostname: Hostname, service: Option<SmolStr>) -> Self {
    Self { hostname, service }
  }

  /// Returns the hostname.
  #[inline]
  pub const fn hostname(&self) -> &Hostname {
    &self.hostname
  }

  /// Returns the service, if the endpoint carries one.
  #[inline]
  pub fn service(&self) -> Option<&str> {
    self.service.as_deref()
  }

  /// Set the service in builder pattern
  #[inline]
  pub fn with_service(mut self, service: impl Into<SmolStr>) -> Self {
    self.service = Some(service.into());
    self
  }

  /// Builds the query sent to the resolver.
  pub fn query(&self, protocol: Protocol, flags: Flags, default_service: &str) -> Query {
    let service = match &self.service {
      Some(service) => service.cheap_clone(),
      None => SmolStr::new(default_service),
    };
    Query::new(self.hostname.0.cheap_clone(), service, protocol, flags)
  }

  /// Resolves the endpoint, blocking on the resolver.
  ///
  /// Returns the first candidate in resolver order, or
  /// [`ResolveError::EmptyResult`] if there is none.
  pub fn resolve<R: Resolver>(
    &self,
    resolver: &R,
    protocol: Protocol,
    flags: Flags,
    default_service: &str,
  ) -> Result<TransportEndpoint, ResolveError<R::Error>> {
    let query = self.query(protocol, flags, default_service);
    #[cfg(feature = "tracing")]
    tracing::trace!(target = "peercraft.endpoint", "resolving {}", query);

    resolver
      .resolve(&query)
      .map_err(ResolveError::Resolution)?
      .into_iter()
      .next()
      .map(TransportEndpoint::from)
      .ok_or_else(|| ResolveError::EmptyResult {
        host: self.hostname.0.cheap_clone(),
      })
  }

  /// Resolves the endpoint asynchronously, returning every candidate in
  /// resolver order.
  ///
  /// The returned future borrows the resolver only; dropping it cancels the
  /// resolver's lookup.
  pub fn resolve_async<'a, R: AsyncResolver>(
    &self,
    resolver: &'a R,
    protocol: Protocol,
    flags: Flags,
    default_service: &str,
  ) -> impl Future<Output = Completion<R::Error>> + Send + use<'a, R> {
    let query = self.query(protocol, flags, default_service);
    async move {
      #[cfg(feature = "tracing")]
      tracing::trace!(target = "peercraft.endpoint", "resolving {} asynchronously", query);

      let host = SmolStr::new(query.host());
      let service = SmolStr::new(query.service());
      let addrs = resolver
        .resolve(query)
        .await
        .map_err(ResolveError::Resolution)?;
      Ok(
        addrs
          .into_iter()
          .map(|addr| ResolvedEntry::new(addr.into(), host.cheap_clone(), service.cheap_clone()))
          .collect(),
      )
    }
  }

  /// Starts an asynchronous resolution whose result is handed to `on_complete`.
  ///
  /// The returned [`Resolution`] must be driven by the caller's event loop.
  /// `on_complete` runs exactly once: with the resolver's candidates, with
  /// its error, or with [`ResolveError::Cancelled`] if the resolution is
  /// cancelled or dropped first.
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
    Resolution::pending(
      self.resolve_async(resolver, protocol, flags, default_service),
      on_complete,
    )
  }
}

impl core::fmt::Display for HostnameEndpoint {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match &self.service {
      Some(service) => write!(f, "{}:{}", self.hostname, service),
      None => write!(f, "{}", self.hostname),
    }
  }
}

impl From<Hostname> for HostnameEndpoint {
  #[inline]
  fn from(hostname: Hostname) -> Self {
    Self::new(hostname, None)
  }
}

#[cfg(feature = "quickcheck")]
const _: () = {
  use quickcheck::{Arbitrary, Gen};

  impl Arbitrary for Hostname {
    fn arbitrary(g: &mut Gen) -> Self {
      const ALPHA: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
      const REST: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789-";

      let labels = (usize::arbitrary(g) % 3) + 1;
      let mut hostname = String::new();
      for i in 0..labels {
        if i > 0 {
          hostname.push('.');
        }
        let len = (usize::arbitrary(g) % 16) + 1;
        hostname.push(*g.choose(ALPHA).unwrap_or(&b'a') as char);
        for _ in 1..len {
          hostname.push(*g.choose(REST).unwrap_or(&b'a') as char);
        }
        if hostname.ends_with('-') {
          hostname.push('x');
        }
      }

      match Hostname::try_from(hostname) {
        Ok(hostname) => hostname,
        Err(_) => Hostname(SmolStr::new_static("localhost")),
      }
    }
  }
};

#[cfg(test)]
mod tests {
  use super::*;

  use std::sync::Mutex;

  use crate::resolver::fixed::FixedResolver;

  /// Records every query and answers with a fixed candidate list.
  #[derive(Default)]
  struct Recorder {
    queries: Mutex<Vec<Query>>,
    answer: Vec<std::net::SocketAddr>,
  }

  impl Resolver for Recorder {
    type Error = std::io::Error;

    fn resolve(&self, query: &Query) -> Result<Vec<std::net::SocketAddr>, Self::Error> {
      self.queries.lock().unwrap().push(query.clone());
      Ok(self.answer.clone())
    }
  }

  /// Never completes, for cancellation tests.
  struct Stalled;

  impl AsyncResolver for Stalled {
    type Error = std::io::Error;

    async fn resolve(&self, _query: Query) -> Result<Vec<std::net::SocketAddr>, Self::Error> {
      futures::future::pending().await
    }
  }

  #[test]
  fn test_validate() {
    for valid in [
      "localhost",
      "example.org",
      "example.org.",
      "_service.example.org",
      "a-b.c0",
      "1.example.org",
      "xn--bcher-kva.example",
    ] {
      assert!(Hostname::try_from(valid).is_ok(), "{valid}");
    }

    for invalid in [
      "",
      ".",
      "-example.org",
      "example-.org",
      "example..org",
      "1.2.3.4",
      "example.org:80",
      "exa mple.org",
      "::1",
    ] {
      assert!(Hostname::try_from(invalid).is_err(), "{invalid}");
    }

    let long_label = "a".repeat(64);
    assert!(Hostname::try_from(long_label.as_str()).is_err());
    let max_label = "a".repeat(63);
    assert!(Hostname::try_from(max_label.as_str()).is_ok());
  }

  #[test]
  fn test_name_length() {
    let label = "a".repeat(63);
    let name = |last: usize| format!("{label}.{label}.{label}.{}", "a".repeat(last));

    let max = name(61);
    assert_eq!(max.len(), 253);
    assert!(Hostname::try_from(max.as_str()).is_ok());
    assert!(Hostname::try_from(format!("{max}.")).is_ok());

    let too_long = name(62);
    assert_eq!(too_long.len(), 254);
    assert!(Hostname::try_from(too_long.as_str()).is_err());
    assert!(Hostname::try_from(format!("{too_long}.")).is_err());
  }

  #[cfg(feature = "serde")]
  #[test]
  fn test_serde_owned_input() {
    let hostname: Hostname = serde_json::from_str("\"\\u0065xample.org\"").unwrap();
    assert_eq!(hostname.as_str(), "example.org");

    let hostname: Hostname = serde_json::from_reader(&b"\"peer.example.org\""[..]).unwrap();
    assert_eq!(hostname.as_str(), "peer.example.org");
    assert_eq!(serde_json::to_string(&hostname).unwrap(), "\"peer.example.org\"");

    assert!(serde_json::from_str::<Hostname>("\"-bad.example\"").is_err());
  }

  #[test]
  fn test_idna() {
    let hostname = Hostname::try_from("bücher.example").unwrap();
    assert_eq!(hostname.as_str(), "xn--bcher-kva.example");
  }

  #[test]
  fn test_query_uses_default_service() {
    let ep = HostnameEndpoint::from(Hostname::try_from("example.org").unwrap());
    let q = ep.query(Protocol::V4, Flags::empty(), "1234");
    assert_eq!(q.host(), "example.org");
    assert_eq!(q.service(), "1234");
    assert_eq!(q.protocol(), Protocol::V4);

    let ep = ep.with_service("ntp");
    let q = ep.query(Protocol::V4, Flags::empty(), "1234");
    assert_eq!(q.service(), "ntp");
  }

  #[test]
  fn test_resolve_empty_result() {
    let resolver = Recorder::default();
    let ep = HostnameEndpoint::from(Hostname::try_from("example.org").unwrap());
    let err = ep
      .resolve(&resolver, Protocol::Unspecified, Flags::default(), "1234")
      .unwrap_err();
    assert!(matches!(err, ResolveError::EmptyResult { ref host } if host == "example.org"));

    let queries = resolver.queries.lock().unwrap();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].host(), "example.org");
    assert_eq!(queries[0].service(), "1234");
  }

  #[test]
  fn test_resolve_first_candidate() {
    let resolver = Recorder {
      answer: vec!["10.0.0.2:1234".parse().unwrap(), "10.0.0.1:1234".parse().unwrap()],
      ..Default::default()
    };
    let ep = HostnameEndpoint::from(Hostname::try_from("example.org").unwrap());
    let ep = ep
      .resolve(&resolver, Protocol::Unspecified, Flags::default(), "1234")
      .unwrap();
    assert_eq!(ep, "10.0.0.2:1234".parse::<TransportEndpoint>().unwrap());
  }

  #[tokio::test]
  async fn test_resolve_async_keeps_order() {
    let resolver = FixedResolver::new().with_host(
      "peer.example.org",
      ["10.0.0.2".parse().unwrap(), "fe80::2".parse().unwrap()],
    );
    let ep = HostnameEndpoint::new(Hostname::try_from("peer.example.org").unwrap(), None);
    let entries = ep
      .resolve_async(&resolver, Protocol::Unspecified, Flags::default(), "stun")
      .await
      .unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].endpoint().to_string(), "10.0.0.2:3478");
    assert_eq!(entries[1].endpoint().to_string(), "[fe80::2]:3478");
    assert_eq!(entries[0].host_name(), "peer.example.org");
    assert_eq!(entries[0].service_name(), "stun");

    let sync = ep
      .resolve(&resolver, Protocol::Unspecified, Flags::default(), "stun")
      .unwrap();
    assert_eq!(sync, entries[0].endpoint());
  }

  #[tokio::test]
  async fn test_async_resolve_cancel() {
    let ep = HostnameEndpoint::new(Hostname::try_from("example.org").unwrap(), None);
    let (tx, rx) = futures::channel::oneshot::channel();
    let resolution = ep.async_resolve(
      &Stalled,
      Protocol::Unspecified,
      Flags::default(),
      "1234",
      move |res| {
        let _ = tx.send(res);
      },
    );
    let handle = resolution.cancel_handle();

    let driver = async {
      resolution.await;
    };
    let canceller = async {
      tokio::task::yield_now().await;
      handle.cancel();
    };
    tokio::join!(driver, canceller);

    let res = rx.await.unwrap();
    assert!(res.unwrap_err().is_cancelled());
  }

  #[tokio::test]
  async fn test_async_resolve_error_delivered() {
    let ep = HostnameEndpoint::new(Hostname::try_from("peer.example.org").unwrap(), None);
    let (tx, rx) = futures::channel::oneshot::channel();
    ep.async_resolve(
      &FixedResolver::new(),
      Protocol::Unspecified,
      Flags::NUMERIC_SERVICE,
      "stun",
      move |res| {
        let _ = tx.send(res);
      },
    )
    .await;
    let err = rx.await.unwrap().unwrap_err();
    assert!(matches!(err, ResolveError::Resolution(_)));
  }
}
