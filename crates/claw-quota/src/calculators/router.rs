//! Calculator router (C8): dispatches a `(namespace, resource-name)` query
//! to the right family calculator.
//!
//! Resolution to [`crate::error::QuotaError::UnsupportedResourceError`]:
//! spec.md §4.1 and §7 are explicit that declaring a hard cap on a resource
//! name outside the taxonomy "yields a cap that is never breached, not an
//! error" — so [`CalculatorRouter::usage`] returns zero, not an error, for
//! [`crate::resource::ResourceKind::Unknown`]. `UnsupportedResourceError` is
//! kept in the error enum for API completeness (spec.md §7's table lists it
//! as a distinct kind) but is reserved for a router implementation bug —
//! "a malformed router mapping is a bug" (spec.md §4.8) — rather than a
//! reachable path for a legitimately unrecognised resource name.

use crate::calculators::objects::ObjectCalculator;
use crate::calculators::pod::PodCalculator;
use crate::calculators::service::ServiceCalculator;
use crate::calculators::storage::StorageCalculator;
use crate::calculators::UsageCalculator;
use crate::error::Result;
use crate::orchestrator::{Deadline, OrchestratorClient};
use crate::quantity::Quantity;
use crate::resource::{ResourceKind, ResourceName};

/// Holds one instance of each family calculator and dispatches by resource
/// name, per spec.md §9's design note.
#[derive(Debug, Default, Clone, Copy)]
pub struct CalculatorRouter {
    pod: PodCalculator,
    storage: StorageCalculator,
    service: ServiceCalculator,
    object: ObjectCalculator,
}

impl CalculatorRouter {
    /// Current usage of `resource` in `namespace`, routed to whichever
    /// family calculator owns it. Resource names the taxonomy does not
    /// recognise return zero, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::QuotaError::ListError`] if the underlying
    /// orchestrator listing call fails.
    pub async fn usage(
        &self,
        client: &dyn OrchestratorClient,
        namespace: &str,
        resource: &ResourceName,
        deadline: &Deadline,
    ) -> Result<Quantity> {
        match resource.classify() {
            ResourceKind::Storage(_) | ResourceKind::PvCount(_) => {
                self.storage.usage(client, namespace, resource, deadline).await
            }
            ResourceKind::Pods | ResourceKind::Compute(_) => self.pod.usage(client, namespace, resource, deadline).await,
            ResourceKind::ServiceTotal | ResourceKind::ServiceSubtype(_) => {
                self.service.usage(client, namespace, resource, deadline).await
            }
            ResourceKind::ObjectKind(_) => self.object.usage(client, namespace, resource, deadline).await,
            ResourceKind::Unknown => Ok(Quantity::zero()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Container, ContainerState, Pod, PodPhase, ResourceRequirements};
    use crate::orchestrator::test_support::FakeOrchestrator;
    use std::collections::BTreeMap;

    fn pod_with_cpu(cpu: &str) -> Pod {
        let mut requests = BTreeMap::new();
        requests.insert("cpu".to_string(), Quantity::parse(cpu).unwrap());
        Pod {
            name: "p".to_string(),
            containers: vec![Container {
                name: "app".to_string(),
                resources: ResourceRequirements { requests, limits: BTreeMap::new() },
                state: Some(ContainerState::Running),
            }],
            init_containers: vec![],
            overhead: BTreeMap::new(),
            phase: PodPhase::Running,
        }
    }

    #[tokio::test]
    async fn routes_compute_names_to_pod_calculator() {
        let client = FakeOrchestrator::new().with_pods("ns1", vec![pod_with_cpu("100m")]);
        let router = CalculatorRouter::default();
        let usage = router
            .usage(&client, "ns1", &ResourceName::new("requests.cpu"), &Deadline::none())
            .await
            .unwrap();
        assert_eq!(usage.to_string(), "100m");
    }

    #[tokio::test]
    async fn routes_storage_class_scoped_names_to_storage_calculator() {
        let client = FakeOrchestrator::new();
        let router = CalculatorRouter::default();
        let usage = router
            .usage(
                &client,
                "ns1",
                &ResourceName::new("premium-ssd.storageclass.storage.k8s.io/requests.storage"),
                &Deadline::none(),
            )
            .await
            .unwrap();
        assert!(usage.is_zero());
    }

    #[tokio::test]
    async fn unrecognised_name_is_zero_not_an_error() {
        let client = FakeOrchestrator::new();
        let router = CalculatorRouter::default();
        let usage = router
            .usage(&client, "ns1", &ResourceName::new("not-a-real-resource"), &Deadline::none())
            .await
            .unwrap();
        assert!(usage.is_zero());
    }
}
