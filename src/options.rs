use smol_str_0_3::SmolStr;

use crate::{Flags, Protocol};

/// The default service, the conventional port of a tunnel peer.
pub const DEFAULT_SERVICE: &str = "12000";

fn default_service() -> SmolStr {
  SmolStr::new_static(DEFAULT_SERVICE)
}

/// The options used to resolve an [`Endpoint`](crate::Endpoint).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ResolveOptions {
  protocol: Protocol,
  flags: Flags,
  default_service: SmolStr,
}

impl Default for ResolveOptions {
  fn default() -> Self {
    Self {
      protocol: Protocol::default(),
      flags: Flags::default(),
      default_service: default_service(),
    }
  }
}

impl ResolveOptions {
  /// Create a new [`ResolveOptions`] with the defaults: any protocol,
  /// [`Flags::ADDRESS_CONFIGURED`] and [`DEFAULT_SERVICE`].
  pub fn new() -> Self {
    Self::default()
  }

  /// Set the protocol in builder pattern
  pub fn with_protocol(mut self, protocol: Protocol) -> Self {
    self.protocol = protocol;
    self
  }

  /// Set the protocol
  pub fn set_protocol(&mut self, protocol: Protocol) -> &mut Self {
    self.protocol = protocol;
    self
  }

  /// Returns the protocol
  pub const fn protocol(&self) -> Protocol {
    self.protocol
  }

  /// Set the flags in builder pattern
  pub fn with_flags(mut self, flags: Flags) -> Self {
    self.flags = flags;
    self
  }

  /// Set the flags
  pub fn set_flags(&mut self, flags: Flags) -> &mut Self {
    self.flags = flags;
    self
  }

  /// Returns the flags
  pub const fn flags(&self) -> Flags {
    self.flags
  }

  /// Set the default service in builder pattern
  pub fn with_default_service(mut self, service: impl Into<SmolStr>) -> Self {
    self.default_service = service.into();
    self
  }

  /// Set the default service
  pub fn set_default_service(&mut self, service: impl Into<SmolStr>) -> &mut Self {
    self.default_service = service.into();
    self
  }

  /// Returns the default service
  pub fn default_service(&self) -> &str {
    self.default_service.as_str()
  }
}
