#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(docsrs, allow(unused_attributes))]

mod completion;
mod endpoint;
mod error;
mod options;
mod transport;

pub use completion::*;
pub use endpoint::*;
pub use error::*;
pub use options::*;
pub use transport::*;

/// Resolver traits and the bundled resolvers.
pub mod resolver;

pub use resolver::{AsyncResolver, Flags, Protocol, Query, Resolver};

pub mod service;

pub use cheap_clone::CheapClone;
pub use futures;
