//! Service name to port mapping.
//!
//! Resolvers accept a service either as a decimal port or as a symbolic name.
//! Symbolic names are looked up in a table of well-known UDP services, the
//! ones a tunnel peer is realistically configured with.

use core::num::ParseIntError;

/// Well-known UDP services, sorted by name.
const WELL_KNOWN: &[(&str, u16)] = &[
  ("bootpc", 68),
  ("bootps", 67),
  ("domain", 53),
  ("freelan", 12000),
  ("http", 80),
  ("https", 443),
  ("ipsec-nat-t", 4500),
  ("isakmp", 500),
  ("l2tp", 1701),
  ("mdns", 5353),
  ("netbios-dgm", 138),
  ("netbios-ns", 137),
  ("ntp", 123),
  ("openvpn", 1194),
  ("radius", 1812),
  ("radius-acct", 1813),
  ("rip", 520),
  ("sip", 5060),
  ("snmp", 161),
  ("snmp-trap", 162),
  ("stun", 3478),
  ("syslog", 514),
  ("tftp", 69),
  ("wireguard", 51820),
];

/// Parses a numeric service: a base-10 unsigned 16-bit integer, nothing else.
///
/// Unlike [`str::parse`], a leading `+` is rejected.
pub fn parse_port(service: &str) -> Result<u16, ParseIntError> {
  match service.as_bytes().first() {
    // `u16::from_str` accepts a leading `+`. `ParseIntError` has no public
    // constructor, so parsing a lone sign yields the `InvalidDigit` error.
    Some(b'+') => "-".parse::<u16>(),
    _ => service.parse::<u16>(),
  }
}

/// Looks up the port of a well-known service name (case-insensitive).
pub fn lookup(name: &str) -> Option<u16> {
  WELL_KNOWN
    .binary_search_by(|(n, _)| {
      n.bytes()
        .map(|b| b.to_ascii_lowercase())
        .cmp(name.bytes().map(|b| b.to_ascii_lowercase()))
    })
    .ok()
    .map(|idx| WELL_KNOWN[idx].1)
}

/// Resolves a service that is either numeric or a well-known name.
pub fn resolve(service: &str) -> Option<u16> {
  parse_port(service).ok().or_else(|| lookup(service))
}
