//! Domain entities (spec.md §3): namespaces, CRQs, pods, PVCs, services.
//!
//! These are plain data — the orchestrator is the sole owner of their
//! lifecycle (spec.md §3 "Ownership and lifecycle"). Nothing here performs
//! I/O; that is [`crate::orchestrator::OrchestratorClient`]'s job.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::quantity::Quantity;
use crate::selector::LabelSelector;

/// A namespace: a unique name plus its current labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    /// The namespace's unique name.
    pub name: String,
    /// Current label set.
    pub labels: BTreeMap<String, String>,
}

impl Namespace {
    /// Construct a namespace with the given name and labels.
    #[must_use]
    pub fn new(name: impl Into<String>, labels: BTreeMap<String, String>) -> Self {
        Self {
            name: name.into(),
            labels,
        }
    }
}

/// A cluster-scoped `ClusterResourceQuota` policy object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterResourceQuota {
    /// The CRQ's name.
    pub name: String,
    /// The namespace-selector predicate. `None` means the CRQ is inert
    /// (selects no namespaces).
    pub selector: Option<LabelSelector>,
    /// Hard caps, keyed by canonical resource name.
    pub hard: BTreeMap<String, Quantity>,
    /// The observed-status namespace list. `None` means "never reconciled";
    /// `Some(vec![])` means "reconciled, currently selects nothing" — the
    /// two are distinguished deliberately (spec.md §4.3).
    pub status_namespaces: Option<Vec<String>>,
}

impl ClusterResourceQuota {
    /// Construct a CRQ with no selector and no hard caps.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selector: None,
            hard: BTreeMap::new(),
            status_namespaces: None,
        }
    }

    /// Attach a namespace selector.
    #[must_use]
    pub fn with_selector(mut self, selector: LabelSelector) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Declare a hard cap for a resource.
    #[must_use]
    pub fn with_hard(mut self, resource: impl Into<String>, cap: Quantity) -> Self {
        self.hard.insert(resource.into(), cap);
        self
    }

    /// Record the observed-status namespace list.
    #[must_use]
    pub fn with_status_namespaces(mut self, namespaces: Vec<String>) -> Self {
        self.status_namespaces = Some(namespaces);
        self
    }
}

/// The lifecycle phase of a pod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PodPhase {
    /// Not yet scheduled/running.
    Pending,
    /// Running.
    Running,
    /// Completed successfully — terminal.
    Succeeded,
    /// Completed with failure — terminal.
    Failed,
    /// Phase could not be determined.
    Unknown,
}

impl PodPhase {
    /// `true` for `Succeeded`/`Failed` — a terminal pod contributes zero to
    /// usage once aggregated (spec.md §3, §4.4).
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// The runtime state of a single container, as reported in pod status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerState {
    /// Currently running.
    Running,
    /// Waiting to start.
    Waiting,
    /// Has exited (successfully or not) — excluded from usage aggregation.
    Terminated,
}

impl ContainerState {
    /// `true` iff the container has terminated (spec.md §4.4 step 2).
    #[must_use]
    pub const fn is_terminated(self) -> bool {
        matches!(self, Self::Terminated)
    }
}

/// A container's declared resource requests/limits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequirements {
    /// Requested resources, keyed by bare resource name.
    pub requests: BTreeMap<String, Quantity>,
    /// Resource limits, keyed by bare resource name.
    pub limits: BTreeMap<String, Quantity>,
}

impl ResourceRequirements {
    /// Read a quantity from `requests`, defaulting to zero.
    #[must_use]
    pub fn request(&self, name: &str) -> Quantity {
        self.requests.get(name).copied().unwrap_or_default()
    }

    /// Read a quantity from `limits`, defaulting to zero.
    #[must_use]
    pub fn limit(&self, name: &str) -> Quantity {
        self.limits.get(name).copied().unwrap_or_default()
    }
}

/// A single container within a pod spec, plus its last-observed state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    /// Container name (unique within the pod).
    pub name: String,
    /// Declared resource requests/limits.
    pub resources: ResourceRequirements,
    /// Last-observed runtime state; `None` if not yet reported.
    pub state: Option<ContainerState>,
}

impl Container {
    /// `true` iff this container's last-observed state is `Terminated`.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.state.is_some_and(ContainerState::is_terminated)
    }
}

/// A pod spec plus its last-observed status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pod {
    /// Pod name.
    pub name: String,
    /// Regular containers.
    pub containers: Vec<Container>,
    /// Init containers, run sequentially before `containers` start.
    pub init_containers: Vec<Container>,
    /// Pod-level overhead (sandbox/runtime tax), added once to usage.
    pub overhead: BTreeMap<String, Quantity>,
    /// Current lifecycle phase.
    pub phase: PodPhase,
}

impl Pod {
    /// `true` iff `phase` is `Succeeded` or `Failed`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Deep structural equality over the parts of a pod that affect usage
    /// (containers, init containers, overhead) — used by the update path to
    /// skip re-validation when the spec has not actually changed (spec.md
    /// §4.4 `spec_equal`, §9 Open Questions).
    ///
    /// Both `None` compares equal; exactly one `None` compares unequal.
    #[must_use]
    pub fn spec_equal(old: Option<&Self>, new: Option<&Self>) -> bool {
        match (old, new) {
            (None, None) => true,
            (Some(_), None) | (None, Some(_)) => false,
            (Some(a), Some(b)) => {
                a.containers == b.containers && a.init_containers == b.init_containers && a.overhead == b.overhead
            }
        }
    }
}

/// A persistent-volume-claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistentVolumeClaim {
    /// PVC name.
    pub name: String,
    /// Storage class name. `None`/empty means "unclassed".
    pub storage_class: Option<String>,
    /// Requested storage size.
    pub storage_request: Quantity,
}

impl PersistentVolumeClaim {
    /// The storage class, normalising empty-string to `None` (spec.md §3).
    #[must_use]
    pub fn storage_class(&self) -> Option<&str> {
        self.storage_class.as_deref().filter(|s| !s.is_empty())
    }
}

/// The subtype of a `Service`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ServiceSubtype {
    /// Default cluster-internal service.
    ClusterIp,
    /// Exposed via a per-node port.
    NodePort,
    /// Exposed via an external load balancer.
    LoadBalancer,
    /// A DNS CNAME with no selector/ports.
    ExternalName,
}

/// A service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// Service name.
    pub name: String,
    /// Service subtype.
    pub subtype: ServiceSubtype,
}

/// A generic countable object (configmap, secret, deployment, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Object name.
    pub name: String,
    /// The canonical resource-name kind this object counts under.
    pub kind: String,
}
