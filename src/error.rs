use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the registry client and its cluster view.
///
/// Transport failures inside a synchronization pass never show up
/// here: the pass swallows them and moves to the next candidate.
/// Everything in this enum is either a construction problem the
/// caller must fix or an accessor called against an invalid view.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Client construction needs at least one seed machine to
    /// bootstrap from.
    #[error("no seed machines provided")]
    NoSeedMachines,

    /// A candidate address could not be turned into a query URL.
    /// There is no recovery for an unparseable address, so this
    /// aborts the whole pass instead of skipping the candidate.
    #[error("machine address '{addr}' is not a valid base url: {reason}")]
    InvalidMachineAddr { addr: String, reason: String },

    /// The view has no members, so there is no leader to hand out.
    #[error("cluster has no members")]
    EmptyCluster,

    /// Attempt to pin the leader outside the member list.
    #[error("leader index {index} out of range for cluster of {len} machines")]
    LeaderOutOfRange { index: usize, len: usize },

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Config file could not be read or deserialized.
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl RegistryError {
    pub fn invalid_machine_addr(addr: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidMachineAddr {
            addr: addr.into(),
            reason: reason.into(),
        }
    }
}

/// Per-connection-attempt failures raised by a [`Transport`].
///
/// The synchronization loop treats any of these as "try the next
/// candidate"; they only reach callers wrapped in
/// [`RegistryError::Transport`] when raised outside a pass, e.g.
/// while binding the connection policy at construction.
///
/// [`Transport`]: crate::transport::Transport
#[derive(Debug, Error)]
pub enum TransportError {
    /// The dial phase exceeded the configured timeout.
    #[error("dial timed out after {timeout:?}")]
    DialTimeout { timeout: Duration },

    /// The transport has no keepalive capability but the connection
    /// policy requires keepalive probing.
    #[error("transport does not support keepalive configuration")]
    KeepAliveUnsupported,

    /// Connection or request failure other than a dial timeout.
    #[error("connection failed: {reason}")]
    Connect { reason: String },

    /// The response arrived but its body could not be fully read.
    #[error("failed to read response body: {reason}")]
    Read { reason: String },

    /// The underlying HTTP client could not be constructed.
    #[error("failed to initialize transport: {reason}")]
    Init { reason: String },
}

impl TransportError {
    /// Whether a later attempt against the same or another machine
    /// could succeed. Capability and construction problems are
    /// permanent.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TransportError::DialTimeout { .. }
                | TransportError::Connect { .. }
                | TransportError::Read { .. }
        )
    }

    pub fn connect(reason: impl Into<String>) -> Self {
        Self::Connect {
            reason: reason.into(),
        }
    }

    pub fn read(reason: impl Into<String>) -> Self {
        Self::Read {
            reason: reason.into(),
        }
    }

    pub fn init(reason: impl Into<String>) -> Self {
        Self::Init {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_context() {
        let err = RegistryError::LeaderOutOfRange { index: 3, len: 2 };
        assert!(err.to_string().contains("index 3"));
        assert!(err.to_string().contains("2 machines"));

        let err = RegistryError::invalid_machine_addr("10.0.0.2:8080", "bad port");
        assert!(err.to_string().contains("10.0.0.2:8080"));
    }

    #[test]
    fn test_transport_error_wraps_into_registry_error() {
        let err: RegistryError = TransportError::KeepAliveUnsupported.into();
        assert!(matches!(
            err,
            RegistryError::Transport(TransportError::KeepAliveUnsupported)
        ));
    }

    #[test]
    fn test_transient_classification() {
        assert!(TransportError::connect("refused").is_transient());
        assert!(TransportError::read("reset").is_transient());
        assert!(
            TransportError::DialTimeout {
                timeout: Duration::from_secs(1)
            }
            .is_transient()
        );

        assert!(!TransportError::KeepAliveUnsupported.is_transient());
        assert!(!TransportError::init("no resolver").is_transient());
    }

    #[test]
    fn test_dial_timeout_display() {
        let err = TransportError::DialTimeout {
            timeout: Duration::from_secs(1),
        };
        assert!(err.to_string().contains("1s"));
    }
}
