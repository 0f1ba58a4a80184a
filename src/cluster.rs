use crate::error::RegistryError;
use serde::{Deserialize, Serialize};

/// Position of the preferred member in a fetched membership list.
///
/// The registry orders every membership response with the current
/// leader first, so the head of the list wins. The sync loop pins
/// the leader through this function only; swapping the convention
/// means changing one place.
pub fn derive_leader(machines: &[String]) -> Option<usize> {
    if machines.is_empty() { None } else { Some(0) }
}

/// Splits a raw membership payload into member addresses.
///
/// The wire format is a single comma separated line, e.g.
/// `"10.0.0.5:8080, 10.0.0.6:8080"`. Tokens are trimmed and empty
/// tokens dropped, so an empty body parses to an empty list.
pub fn parse_member_list(body: &str) -> Vec<String> {
    body.split(',')
        .map(str::trim)
        .filter(|machine| !machine.is_empty())
        .map(str::to_string)
        .collect()
}

/// The client's local view of cluster membership.
///
/// Holds the ordered member addresses plus the index of the member
/// preferred for subsequent requests. The list is only ever replaced
/// wholesale, never patched, so a failed refresh leaves the previous
/// view fully intact. Duplicates are tolerated; deduplication is the
/// caller's concern.
///
/// Invariant: whenever a leader is set it references a valid position
/// in `machines`. Mutations that replace the list re-derive or clear
/// the leader themselves, and deserialized snapshots pass the same
/// bounds check before they become a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ClusterSnapshot")]
pub struct Cluster {
    machines: Vec<String>,
    leader: Option<usize>,
}

/// Raw serialized form of [`Cluster`]. Conversion bounds-checks the
/// leader index and re-derives a missing leader from the machine
/// order.
#[derive(Deserialize)]
struct ClusterSnapshot {
    machines: Vec<String>,
    leader: Option<usize>,
}

impl TryFrom<ClusterSnapshot> for Cluster {
    type Error = RegistryError;

    fn try_from(snapshot: ClusterSnapshot) -> Result<Cluster, RegistryError> {
        match snapshot.leader {
            Some(index) if index >= snapshot.machines.len() => {
                Err(RegistryError::LeaderOutOfRange {
                    index,
                    len: snapshot.machines.len(),
                })
            }
            Some(index) => Ok(Cluster {
                machines: snapshot.machines,
                leader: Some(index),
            }),
            None => Ok(Cluster::new(snapshot.machines)),
        }
    }
}

impl Cluster {
    /// Builds a view over an initial machine list, preferring the
    /// first entry when there is one.
    pub fn new(machines: Vec<String>) -> Cluster {
        let leader = derive_leader(&machines);

        Cluster { machines, leader }
    }

    /// Swaps in a whole new membership list. The leader resets to the
    /// first entry of the new list, or clears when the list is empty,
    /// so it can never dangle past the end of `machines`.
    pub fn replace_members(&mut self, machines: Vec<String>) {
        self.leader = derive_leader(&machines);
        self.machines = machines;
    }

    /// Pins the leader to `index`. Fails without touching the view
    /// when `index` is not a valid position.
    pub fn set_leader(&mut self, index: usize) -> Result<(), RegistryError> {
        if index >= self.machines.len() {
            return Err(RegistryError::LeaderOutOfRange {
                index,
                len: self.machines.len(),
            });
        }

        self.leader = Some(index);
        Ok(())
    }

    /// Address of the member preferred for subsequent requests.
    pub fn leader(&self) -> Result<&str, RegistryError> {
        match self.leader {
            Some(index) => Ok(self.machines[index].as_str()),
            None => Err(RegistryError::EmptyCluster),
        }
    }

    pub fn leader_index(&self) -> Option<usize> {
        self.leader
    }

    pub fn machines(&self) -> &[String] {
        &self.machines
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }
}
