//! # eureka-client
//!
//! Client-side membership tracking for an Eureka style service
//! registry cluster.
//!
//! - [`RegistryClient`]: keeps a local membership view fresh by
//!   querying any reachable cluster member, and dispatches toward the
//!   leader
//! - [`Cluster`]: the local view of ordered member addresses plus the
//!   pinned leader index
//! - [`Transport`]: the wire seam, with [`HttpTransport`] as the
//!   pooled production implementation
//! - [`RegistryConfig`]: file loadable configuration covering seed
//!   endpoints, dial timeout, keepalive period, and consistency mode
//!
//! A synchronization pass scans candidates in preference order and
//! commits the first fully read response wholesale, so one reachable
//! member is enough to recover the authoritative list. Dead members
//! cost one bounded dial timeout each and are skipped.
//!
//! The crate never installs a tracing subscriber; diagnostics go to
//! whatever dispatcher the embedding application provides.
//!
//! TLS for `https` members rides on rustls with the aws-lc-rs provider
//! pinned through this crate's dependency features. An application
//! that wants a different provider installs it process wide before the
//! first request.

pub mod client;
pub mod cluster;
pub mod config;
pub mod error;
pub mod status;
pub mod transport;

pub use crate::client::RegistryClient;
pub use crate::cluster::{Cluster, derive_leader, parse_member_list};
pub use crate::config::{RegistryConfig, RegistryConfigBuilder};
pub use crate::error::{RegistryError, TransportError};
pub use crate::status::InstanceStatus;
pub use crate::transport::{
    ConnectionPolicy, HttpTransport, KeepAliveConfigurable, Transport,
    DEFAULT_DIAL_TIMEOUT, DEFAULT_KEEPALIVE_PERIOD,
};
