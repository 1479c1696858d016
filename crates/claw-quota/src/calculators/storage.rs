//! Storage usage calculator (C5): PVC storage-request sums and PVC counts,
//! unscoped and per storage class.

use crate::calculators::UsageCalculator;
use crate::model::PersistentVolumeClaim;
use crate::orchestrator::{Deadline, OrchestratorClient};
use crate::quantity::Quantity;
use crate::resource::{ResourceKind, ResourceName, StorageScope};

const FIXED_RESOURCE_NAMES: &[&str] = &["requests.storage", "persistentvolumeclaims"];

/// The storage-family usage calculator.
#[derive(Debug, Default, Clone, Copy)]
pub struct StorageCalculator;

impl UsageCalculator for StorageCalculator {
    fn usage<'a>(
        &'a self,
        client: &'a dyn OrchestratorClient,
        namespace: &'a str,
        resource: &'a ResourceName,
        deadline: &'a Deadline,
    ) -> crate::calculators::BoxFuture<'a, Quantity> {
        Box::pin(async move {
            let pvcs = client.list_pvcs(namespace, deadline).await?;

            Ok(match resource.classify() {
                ResourceKind::Storage(scope) => sum_storage(&pvcs, &scope),
                ResourceKind::PvCount(scope) => count_pvcs(&pvcs, &scope),
                _ => Quantity::zero(),
            })
        })
    }

    fn fixed_resource_names(&self) -> &'static [&'static str] {
        FIXED_RESOURCE_NAMES
    }
}

fn sum_storage(pvcs: &[PersistentVolumeClaim], scope: &StorageScope) -> Quantity {
    pvcs.iter()
        .filter(|pvc| scope_matches(pvc, scope))
        .map(|pvc| pvc.storage_request)
        .sum()
}

fn count_pvcs(pvcs: &[PersistentVolumeClaim], scope: &StorageScope) -> Quantity {
    Quantity::from_count(pvcs.iter().filter(|pvc| scope_matches(pvc, scope)).count() as u64)
}

fn scope_matches(pvc: &PersistentVolumeClaim, scope: &StorageScope) -> bool {
    match scope {
        StorageScope::Unscoped => true,
        StorageScope::ByClass(class) => pvc.storage_class() == Some(class.as_str()),
    }
}
