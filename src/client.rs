use crate::cluster::{Cluster, parse_member_list};
use crate::config::RegistryConfig;
use crate::error::{RegistryError, TransportError};
use crate::transport::{HttpTransport, Transport};
use parking_lot::RwLock;
use tracing::{debug, trace};
use url::Url;

/// Fixed membership-query path served by every registry member.
const MEMBERSHIP_PATH: &str = "machines";

type ChangeCallback = Box<dyn Fn(&[String]) + Send + Sync>;

/// Client-side membership tracker for an Eureka style registry cluster.
///
/// Keeps a local [`Cluster`] view fresh by asking any reachable member
/// for the authoritative list, and pins the preferred request target
/// ("leader") by the registry convention that the first listed member
/// leads. Synchronization mutates the view in place, so passes go
/// through `&mut self`; a client shared across tasks lives behind
/// whatever lock the caller picks.
pub struct RegistryClient {
    config: RegistryConfig,
    cluster: Cluster,
    transport: Box<dyn Transport>,
    callbacks: RwLock<Vec<ChangeCallback>>,
}

impl std::fmt::Debug for RegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryClient")
            .field("config", &self.config)
            .field("cluster", &self.cluster)
            .finish()
    }
}

impl RegistryClient {
    /// Creates a client over the given seed machines with default
    /// configuration: 1s dial timeout, keepalive probing at a 1s
    /// period, no consistency mode.
    pub fn new(machines: Vec<String>) -> Result<RegistryClient, RegistryError> {
        Self::with_config(machines, RegistryConfig::default())
    }

    /// Creates a client over the given seed machines with explicit
    /// configuration. The seeds override `config.endpoints`.
    pub fn with_config(
        machines: Vec<String>,
        mut config: RegistryConfig,
    ) -> Result<RegistryClient, RegistryError> {
        config.endpoints = machines;
        Self::from_config(&config)
    }

    /// Creates a client from a full configuration, seeds included,
    /// e.g. one loaded with [`RegistryConfig::load`].
    pub fn from_config(config: &RegistryConfig) -> Result<RegistryClient, RegistryError> {
        let transport = HttpTransport::new(&config.policy())?;

        Self::bind(config.clone(), Box::new(transport))
    }

    /// Creates a client over a caller-supplied transport. The seeds
    /// override `config.endpoints`.
    pub fn with_transport(
        machines: Vec<String>,
        mut config: RegistryConfig,
        transport: Box<dyn Transport>,
    ) -> Result<RegistryClient, RegistryError> {
        config.endpoints = machines;
        Self::bind(config, transport)
    }

    /// Binds configuration to transport. When the policy asks for
    /// keepalive probing, the transport must surface the capability
    /// or construction fails with
    /// [`TransportError::KeepAliveUnsupported`].
    fn bind(
        config: RegistryConfig,
        mut transport: Box<dyn Transport>,
    ) -> Result<RegistryClient, RegistryError> {
        config.validate()?;

        if let Some(period) = config.keepalive {
            match transport.keepalive() {
                Some(ka) => ka.enable_keepalive(period)?,
                None => {
                    return Err(RegistryError::Transport(TransportError::KeepAliveUnsupported));
                }
            }
        }

        let cluster = Cluster::new(config.endpoints.clone());

        Ok(RegistryClient {
            config,
            cluster,
            transport,
            callbacks: RwLock::new(Vec::new()),
        })
    }

    /// Synchronizes the view against the given machine list instead of
    /// the current membership. On failure of every candidate the
    /// previous view stays in place, seed list included.
    pub async fn set_cluster(&mut self, machines: &[String]) -> Result<bool, RegistryError> {
        self.sync_with(machines.to_vec()).await
    }

    /// Runs a synchronization pass against the current membership list.
    ///
    /// Candidates are tried in listed order; the first fully read
    /// response body wins and replaces the view wholesale, with the
    /// leader pinned to the first entry of the fetched list. Returns
    /// `Ok(false)` when every candidate failed, leaving the view
    /// untouched. `Err` is reserved for candidates whose address does
    /// not parse at all, which aborts the pass.
    ///
    /// A reachable member answering with an empty body commits an
    /// empty view and still counts as success; [`leader`] then fails
    /// with [`RegistryError::EmptyCluster`] until a later pass
    /// restores membership.
    ///
    /// [`leader`]: RegistryClient::leader
    pub async fn sync_cluster(&mut self) -> Result<bool, RegistryError> {
        let machines = self.cluster.machines().to_vec();

        self.sync_with(machines).await
    }

    /// One left-to-right scan over `machines`. Transport failures skip
    /// to the next candidate; the first readable body commits.
    async fn sync_with(&mut self, machines: Vec<String>) -> Result<bool, RegistryError> {
        for machine in &machines {
            let url = request_url(machine, MEMBERSHIP_PATH)?;

            let fetched = self.transport.fetch(url).await;
            let body = match fetched {
                Ok(body) => body,
                Err(e) => {
                    trace!("Skipping unreachable machine {}: {}", machine, e);
                    continue;
                }
            };

            let members = parse_member_list(&String::from_utf8_lossy(&body));
            self.cluster.replace_members(members);

            debug!(
                "Synced cluster membership: {}",
                self.cluster.machines().join(", ")
            );
            self.notify_change();

            return Ok(true);
        }

        Ok(false)
    }

    /// The current leader's address.
    pub fn leader(&self) -> Result<&str, RegistryError> {
        self.cluster.leader()
    }

    /// Builds a request url for `path` against the current leader,
    /// the preferred target for registry calls.
    pub fn leader_endpoint(&self, path: &str) -> Result<Url, RegistryError> {
        let leader = self.cluster.leader()?;

        request_url(leader, path)
    }

    pub fn cluster(&self) -> &Cluster {
        &self.cluster
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Registers a callback invoked with the freshly committed
    /// membership after every successful synchronization pass.
    /// Multiple callbacks are supported; they run in registration
    /// order on the synchronizing task.
    pub fn on_change(&self, cb: ChangeCallback) {
        self.callbacks.write().push(cb);
    }

    fn notify_change(&self) {
        let cbs = self.callbacks.read();

        for cb in cbs.iter() {
            trace!("Invoking membership change callback");

            cb(self.cluster.machines());
        }
    }
}

/// Builds a request url by joining `path` onto a machine's base
/// address. Addresses without a scheme get `http`; an address that
/// does not parse as a url is a configuration error.
fn request_url(machine: &str, path: &str) -> Result<Url, RegistryError> {
    let base = if machine.contains("://") {
        machine.to_string()
    } else {
        format!("http://{}", machine)
    };

    let mut url = Url::parse(&base)
        .map_err(|e| RegistryError::invalid_machine_addr(machine, e.to_string()))?;

    url.path_segments_mut()
        .map_err(|_| RegistryError::invalid_machine_addr(machine, "cannot be a base url"))?
        .pop_if_empty()
        .extend(path.split('/').filter(|segment| !segment.is_empty()));

    Ok(url)
}
