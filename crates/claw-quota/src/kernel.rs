//! Enforcement kernel (C10): Resolve -> Read-Cap -> Aggregate -> Compare ->
//! Admit/Deny, plus the kind-to-deltas adapters and the per-kind admission
//! entry points (spec.md §4.10, §6, §11).

use tracing::{debug, warn};

use crate::calculators::pod::single_pod_usage;
use crate::calculators::router::CalculatorRouter;
use crate::conflict;
use crate::error::{QuotaError, Result};
use crate::model::{ClusterResourceQuota, Namespace, PersistentVolumeClaim, Pod, Service, ServiceSubtype};
use crate::orchestrator::{Deadline, OrchestratorClient};
use crate::quantity::Quantity;
use crate::registry;
use crate::resource::ResourceName;

/// The kind of change being admitted. Delete always admits (spec.md §6):
/// removing demand never needs a quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// A brand-new object.
    Create,
    /// An existing object's spec changed.
    Update,
    /// The object is being removed.
    Delete,
}

/// The outcome of an admission check.
#[derive(Debug)]
pub enum AdmissionDecision {
    /// The request passes, with zero or more advisory warnings. Warnings are
    /// additive only — they never change a pass into a denial (spec.md §11).
    Admit {
        /// Human-readable advisories (e.g. approaching a cap).
        warnings: Vec<String>,
    },
    /// The request is rejected with a structured reason.
    Deny {
        /// Why the request was denied.
        reason: QuotaError,
    },
}

/// Quantities at or above this fraction of a cap attach an advisory warning
/// to an otherwise-passing admission (spec.md §11).
const HEADROOM_NUMERATOR: u64 = 9;
const HEADROOM_DENOMINATOR: u64 = 10;

async fn resolve_namespace(client: &dyn OrchestratorClient, deadline: &Deadline, name: &str) -> Result<Namespace> {
    client
        .get_namespace(name, deadline)
        .await?
        .ok_or_else(|| QuotaError::NamespaceNotFound(name.to_string()))
}

/// The single-`(resource, delta)` check: spec.md §4.10's state machine,
/// `Resolve -> Read-Cap -> Aggregate -> Compare -> {Admit|Deny}`.
async fn check_one(
    client: &dyn OrchestratorClient,
    deadline: &Deadline,
    router: &CalculatorRouter,
    namespace: &Namespace,
    resource: &ResourceName,
    delta: Quantity,
) -> Result<AdmissionDecision> {
    let Some(crq) = registry::owning_crq(client, deadline, namespace).await? else {
        debug!("namespace has no owning CRQ, admitting");
        return Ok(AdmissionDecision::Admit { warnings: Vec::new() });
    };

    let Some(cap) = crq.hard.get(resource.as_str()).copied() else {
        debug!(crq = %crq.name, "resource has no declared cap, admitting");
        return Ok(AdmissionDecision::Admit { warnings: Vec::new() });
    };

    let Some(selector) = crq.selector.as_ref() else {
        return Ok(AdmissionDecision::Admit { warnings: Vec::new() });
    };

    let namespaces = selector.selected(client, deadline).await?;
    let mut used = Quantity::zero();
    for ns in &namespaces {
        used = used + router.usage(client, ns, resource, deadline).await?;
    }

    let total = used + delta;
    if total > cap {
        warn!(crq = %crq.name, %used, %delta, %cap, %total, "quota exceeded");
        return Ok(AdmissionDecision::Deny {
            reason: QuotaError::QuotaExceeded {
                crq_name: crq.name.clone(),
                resource: resource.to_string(),
                requested: delta,
                used,
                cap,
                total,
            },
        });
    }

    let warnings = if total.at_least_ratio_of(cap, HEADROOM_NUMERATOR, HEADROOM_DENOMINATOR) {
        vec![format!(
            "{crq_name} is within {pct}% of its {resource} cap ({total} of {cap})",
            crq_name = crq.name,
            pct = HEADROOM_NUMERATOR * 100 / HEADROOM_DENOMINATOR,
        )]
    } else {
        Vec::new()
    };

    Ok(AdmissionDecision::Admit { warnings })
}

/// Run every `(resource, delta)` pair against `check_one` in the order
/// given, short-circuiting on the first denial (spec.md §5 "ordering
/// guarantees"). Warnings from pairs that passed before a later pair denies
/// are discarded along with the denied decision.
async fn evaluate_pairs(
    client: &dyn OrchestratorClient,
    deadline: &Deadline,
    router: &CalculatorRouter,
    namespace: &Namespace,
    pairs: Vec<(ResourceName, Quantity)>,
) -> Result<AdmissionDecision> {
    let mut warnings = Vec::new();
    for (resource, delta) in pairs {
        match check_one(client, deadline, router, namespace, &resource, delta).await? {
            AdmissionDecision::Deny { reason } => return Ok(AdmissionDecision::Deny { reason }),
            AdmissionDecision::Admit { warnings: w } => warnings.extend(w),
        }
    }
    Ok(AdmissionDecision::Admit { warnings })
}

fn pod_deltas(operation: Operation, old: Option<&Pod>, new: Option<&Pod>) -> Vec<(ResourceName, Quantity)> {
    const COMPUTE_NAMES: [&str; 4] = ["requests.cpu", "requests.memory", "limits.cpu", "limits.memory"];

    let mut pairs = Vec::with_capacity(COMPUTE_NAMES.len() + 1);
    for name in COMPUTE_NAMES {
        let new_usage = new.map_or_else(Quantity::zero, |pod| single_pod_usage(pod, name));
        let delta = match operation {
            Operation::Create => new_usage,
            Operation::Update => {
                let old_usage = old.map_or_else(Quantity::zero, |pod| single_pod_usage(pod, name));
                new_usage.saturating_sub(old_usage)
            }
            Operation::Delete => Quantity::zero(),
        };
        if !delta.is_zero() {
            pairs.push((ResourceName::new(name), delta));
        }
    }

    // Always emitted, even with a zero delta on update, so the boundary
    // `Used = Cap` is still re-checked (spec.md §8 boundary behaviours).
    let pod_count_delta = if operation == Operation::Create {
        Quantity::from_count(1)
    } else {
        Quantity::zero()
    };
    pairs.push((ResourceName::new("pods"), pod_count_delta));

    pairs
}

fn pvc_deltas(
    operation: Operation,
    old: Option<&PersistentVolumeClaim>,
    new: Option<&PersistentVolumeClaim>,
) -> Vec<(ResourceName, Quantity)> {
    let mut pairs = Vec::new();

    let new_request = new.map_or_else(Quantity::zero, |pvc| pvc.storage_request);
    let storage_delta = match operation {
        Operation::Create => new_request,
        Operation::Update => {
            let old_request = old.map_or_else(Quantity::zero, |pvc| pvc.storage_request);
            // A shrinking update can never push usage over a cap; admit it
            // without a check rather than running one with a zero delta
            // (spec.md §9 Open Questions).
            new_request.saturating_sub(old_request)
        }
        Operation::Delete => Quantity::zero(),
    };
    if !storage_delta.is_zero() {
        pairs.push((ResourceName::new("requests.storage"), storage_delta));
    }

    let count_delta = if operation == Operation::Create {
        Quantity::from_count(1)
    } else {
        Quantity::zero()
    };
    pairs.push((ResourceName::new("persistentvolumeclaims"), count_delta));

    let storage_class = new
        .and_then(PersistentVolumeClaim::storage_class)
        .or_else(|| old.and_then(PersistentVolumeClaim::storage_class));
    if let Some(class) = storage_class {
        if !storage_delta.is_zero() {
            pairs.push((
                ResourceName::new(format!("{class}.storageclass.storage.k8s.io/requests.storage")),
                storage_delta,
            ));
        }
        pairs.push((
            ResourceName::new(format!("{class}.storageclass.storage.k8s.io/persistentvolumeclaims")),
            count_delta,
        ));
    }

    pairs
}

fn service_deltas(operation: Operation, new: Option<&Service>) -> Vec<(ResourceName, Quantity)> {
    let count_delta = if operation == Operation::Create {
        Quantity::from_count(1)
    } else {
        Quantity::zero()
    };

    let mut pairs = vec![(ResourceName::new("services"), count_delta)];

    let subtype_name = new.and_then(|svc| match svc.subtype {
        ServiceSubtype::LoadBalancer => Some("services.loadbalancers"),
        ServiceSubtype::NodePort => Some("services.nodeports"),
        ServiceSubtype::ClusterIp | ServiceSubtype::ExternalName => None,
    });
    if let Some(name) = subtype_name {
        pairs.push((ResourceName::new(name), count_delta));
    }

    pairs
}

fn object_deltas(operation: Operation, kind: &str) -> Vec<(ResourceName, Quantity)> {
    let delta = if operation == Operation::Create {
        Quantity::from_count(1)
    } else {
        Quantity::zero()
    };
    vec![(ResourceName::new(kind), delta)]
}

/// Admit or deny a pod create/update. `dry_run` is accepted and logged for
/// observability only — it never changes the decision (spec.md §11).
///
/// # Errors
///
/// Propagates [`QuotaError::ListError`], [`QuotaError::NamespaceNotFound`],
/// or [`QuotaError::MultipleOwnersError`] from the underlying lookups.
pub async fn admit_pod(
    client: &dyn OrchestratorClient,
    deadline: &Deadline,
    operation: Operation,
    namespace: &str,
    old: Option<&Pod>,
    new: Option<&Pod>,
    dry_run: bool,
) -> Result<AdmissionDecision> {
    if operation == Operation::Delete {
        return Ok(AdmissionDecision::Admit { warnings: Vec::new() });
    }
    debug!(dry_run, "admitting pod");
    let ns = resolve_namespace(client, deadline, namespace).await?;
    let router = CalculatorRouter::default();
    evaluate_pairs(client, deadline, &router, &ns, pod_deltas(operation, old, new)).await
}

/// Admit or deny a PVC create/update.
///
/// # Errors
///
/// See [`admit_pod`].
pub async fn admit_persistent_volume_claim(
    client: &dyn OrchestratorClient,
    deadline: &Deadline,
    operation: Operation,
    namespace: &str,
    old: Option<&PersistentVolumeClaim>,
    new: Option<&PersistentVolumeClaim>,
    dry_run: bool,
) -> Result<AdmissionDecision> {
    if operation == Operation::Delete {
        return Ok(AdmissionDecision::Admit { warnings: Vec::new() });
    }
    debug!(dry_run, "admitting persistentvolumeclaim");
    let ns = resolve_namespace(client, deadline, namespace).await?;
    let router = CalculatorRouter::default();
    evaluate_pairs(client, deadline, &router, &ns, pvc_deltas(operation, old, new)).await
}

/// Admit or deny a service create/update.
///
/// # Errors
///
/// See [`admit_pod`].
pub async fn admit_service(
    client: &dyn OrchestratorClient,
    deadline: &Deadline,
    operation: Operation,
    namespace: &str,
    new: Option<&Service>,
    dry_run: bool,
) -> Result<AdmissionDecision> {
    if operation == Operation::Delete {
        return Ok(AdmissionDecision::Admit { warnings: Vec::new() });
    }
    debug!(dry_run, "admitting service");
    let ns = resolve_namespace(client, deadline, namespace).await?;
    let router = CalculatorRouter::default();
    evaluate_pairs(client, deadline, &router, &ns, service_deltas(operation, new)).await
}

/// Admit or deny a generic C7-recognised object create/update.
///
/// # Errors
///
/// See [`admit_pod`].
pub async fn admit_object(
    client: &dyn OrchestratorClient,
    deadline: &Deadline,
    operation: Operation,
    namespace: &str,
    kind: &str,
    dry_run: bool,
) -> Result<AdmissionDecision> {
    if operation == Operation::Delete {
        return Ok(AdmissionDecision::Admit { warnings: Vec::new() });
    }
    debug!(dry_run, "admitting object");
    let ns = resolve_namespace(client, deadline, namespace).await?;
    let router = CalculatorRouter::default();
    evaluate_pairs(client, deadline, &router, &ns, object_deltas(operation, kind)).await
}

fn decision_from_validation(result: Result<()>) -> Result<AdmissionDecision> {
    match result {
        Ok(()) => Ok(AdmissionDecision::Admit { warnings: Vec::new() }),
        Err(err) if err.is_denial() => Ok(AdmissionDecision::Deny { reason: err }),
        Err(err) => Err(err),
    }
}

/// Admit or deny a `ClusterResourceQuota` create/update, routing to C9's
/// [`conflict::validate_crq`].
///
/// # Errors
///
/// Propagates [`QuotaError::ListError`].
pub async fn admit_cluster_resource_quota(
    client: &dyn OrchestratorClient,
    deadline: &Deadline,
    operation: Operation,
    candidate: &ClusterResourceQuota,
    dry_run: bool,
) -> Result<AdmissionDecision> {
    if operation == Operation::Delete {
        return Ok(AdmissionDecision::Admit { warnings: Vec::new() });
    }
    debug!(dry_run, "admitting clusterresourcequota");
    decision_from_validation(conflict::validate_crq(client, deadline, candidate).await)
}

/// Admit or deny a namespace create/relabel, routing to C9's
/// [`conflict::validate_namespace`].
///
/// # Errors
///
/// Propagates [`QuotaError::ListError`].
pub async fn admit_namespace(
    client: &dyn OrchestratorClient,
    deadline: &Deadline,
    operation: Operation,
    namespace: &Namespace,
    dry_run: bool,
) -> Result<AdmissionDecision> {
    if operation == Operation::Delete {
        return Ok(AdmissionDecision::Admit { warnings: Vec::new() });
    }
    debug!(dry_run, "admitting namespace");
    decision_from_validation(conflict::validate_namespace(client, deadline, namespace).await)
}
