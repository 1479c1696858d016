//! Canonical resource-name taxonomy (C1).
//!
//! Recognises the bare, `requests.`/`limits.`-prefixed, and storage-class
//! scoped resource-name families spec.md §4.1 enumerates, and classifies any
//! name into the tagged [`ResourceKind`] the router (C8) dispatches on —
//! replacing the repeated string-prefix tests a naive implementation would
//! scatter across every calculator (spec.md §9).

use std::fmt;

const STORAGE_CLASS_SUFFIX_STORAGE: &str = ".storageclass.storage.k8s.io/requests.storage";
const STORAGE_CLASS_SUFFIX_PVC: &str = ".storageclass.storage.k8s.io/persistentvolumeclaims";

const COMPUTE_BARE: &[&str] = &["cpu", "memory", "ephemeral-storage"];

const OBJECT_KINDS: &[&str] = &[
    "pods",
    "persistentvolumeclaims",
    "configmaps",
    "secrets",
    "replicationcontrollers",
    "deployments.apps",
    "statefulsets.apps",
    "daemonsets.apps",
    "jobs.batch",
    "cronjobs.batch",
    "horizontalpodautoscalers.autoscaling",
    "ingresses.networking.k8s.io",
];

/// An owned, canonical resource name (e.g. `"requests.cpu"`,
/// `"premium-ssd.storageclass.storage.k8s.io/requests.storage"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ResourceName(String);

impl ResourceName {
    /// Wrap a raw resource-name string. Any string is accepted — unknown
    /// names are legal and simply count as zero (spec.md §7).
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the raw name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Strip at most one leading `requests.` or `limits.` prefix.
    ///
    /// Prefix-like substrings anywhere but the start are left alone, e.g.
    /// `"my.requests.thing"` is returned unchanged.
    #[must_use]
    pub fn base(&self) -> ResourceName {
        if let Some(stripped) = self.0.strip_prefix("requests.") {
            return ResourceName::new(stripped);
        }
        if let Some(stripped) = self.0.strip_prefix("limits.") {
            return ResourceName::new(stripped);
        }
        self.clone()
    }

    /// Classify this name into the tagged variant the router dispatches on.
    #[must_use]
    pub fn classify(&self) -> ResourceKind {
        let name = self.0.as_str();

        if let Some(class) = name.strip_suffix(STORAGE_CLASS_SUFFIX_STORAGE) {
            return ResourceKind::Storage(StorageScope::ByClass(class.to_string()));
        }
        if let Some(class) = name.strip_suffix(STORAGE_CLASS_SUFFIX_PVC) {
            return ResourceKind::PvCount(StorageScope::ByClass(class.to_string()));
        }
        if name == "requests.storage" || name == "storage" {
            return ResourceKind::Storage(StorageScope::Unscoped);
        }
        if name == "persistentvolumeclaims" {
            return ResourceKind::PvCount(StorageScope::Unscoped);
        }

        if name == "pods" {
            return ResourceKind::Pods;
        }

        if let Some(kind) = compute_kind(name) {
            return ResourceKind::Compute(kind);
        }

        if name == "services" {
            return ResourceKind::ServiceTotal;
        }
        if name == "services.loadbalancers" {
            return ResourceKind::ServiceSubtype(ServiceSubtypeResource::LoadBalancer);
        }
        if name == "services.nodeports" {
            return ResourceKind::ServiceSubtype(ServiceSubtypeResource::NodePort);
        }

        if OBJECT_KINDS.contains(&name) {
            return ResourceKind::ObjectKind(name.to_string());
        }

        ResourceKind::Unknown
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ResourceName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ResourceName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Which side of a compute resource is being read: the pod/container
/// `requests` map or the `limits` map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComputePhase {
    /// Value comes from `requests`.
    Requests,
    /// Value comes from `limits`.
    Limits,
}

/// A single compute-family resource: the bare name (`cpu`, `memory`,
/// `nvidia.com/gpu`, `hugepages-2Mi`, ...) plus which phase it reads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComputeKind {
    /// Bare (unprefixed) resource name.
    pub bare_name: String,
    /// `requests.` or `limits.` phase.
    pub phase: ComputePhase,
}

/// Whether a storage-family query is unscoped or scoped to one storage class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StorageScope {
    /// Applies across every PVC regardless of storage class.
    Unscoped,
    /// Applies only to PVCs whose storage class equals this name.
    ByClass(String),
}

/// Which service subtype a `services.*` resource name counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceSubtypeResource {
    /// `services.loadbalancers`.
    LoadBalancer,
    /// `services.nodeports`.
    NodePort,
}

/// The tagged sum a resource name classifies into (spec.md §9 Design Note).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A compute resource (`requests.cpu`, `limits.memory`, extended
    /// resources, hugepages — bare or prefixed).
    Compute(ComputeKind),
    /// The `pods` count resource.
    Pods,
    /// `requests.storage`/`storage`, unscoped or storage-class scoped.
    Storage(StorageScope),
    /// `persistentvolumeclaims`, unscoped or storage-class scoped.
    PvCount(StorageScope),
    /// `services`.
    ServiceTotal,
    /// `services.loadbalancers` / `services.nodeports`.
    ServiceSubtype(ServiceSubtypeResource),
    /// A generic C7-recognised object kind (`configmaps`, `deployments.apps`, ...).
    ObjectKind(String),
    /// Not recognised by the taxonomy at all.
    Unknown,
}

/// Classify a bare compute name into a [`ComputeKind`], honouring the
/// special-cased requests/limits pairs spec.md §4.4 lists before falling
/// back to the generic "requests. then limits." rule for extended resources.
fn compute_kind(name: &str) -> Option<ComputeKind> {
    match name {
        "requests.cpu" | "requests.memory" | "requests.ephemeral-storage" => Some(ComputeKind {
            bare_name: name.trim_start_matches("requests.").to_string(),
            phase: ComputePhase::Requests,
        }),
        "limits.cpu" | "limits.memory" | "limits.ephemeral-storage" => Some(ComputeKind {
            bare_name: name.trim_start_matches("limits.").to_string(),
            phase: ComputePhase::Limits,
        }),
        _ if COMPUTE_BARE.contains(&name) => Some(ComputeKind {
            bare_name: name.to_string(),
            phase: ComputePhase::Requests,
        }),
        _ if name.starts_with("requests.") => Some(ComputeKind {
            bare_name: name.trim_start_matches("requests.").to_string(),
            phase: ComputePhase::Requests,
        }),
        _ if is_extended_or_hugepage(name) => Some(ComputeKind {
            bare_name: name.to_string(),
            phase: ComputePhase::Requests,
        }),
        _ if name.starts_with("limits.") && is_extended_or_hugepage(name.trim_start_matches("limits.")) => {
            Some(ComputeKind {
                bare_name: name.trim_start_matches("limits.").to_string(),
                phase: ComputePhase::Limits,
            })
        }
        _ => None,
    }
}

fn is_extended_or_hugepage(name: &str) -> bool {
    name.starts_with("hugepages-") || name.contains('/')
}
