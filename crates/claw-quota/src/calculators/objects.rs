//! Object-count calculator (C7): counts generic countable object kinds
//! (configmaps, secrets, deployments.apps, ...) by canonical resource name.

use crate::calculators::UsageCalculator;
use crate::orchestrator::{Deadline, ObjectKind as OrchestratorObjectKind, OrchestratorClient};
use crate::quantity::Quantity;
use crate::resource::{ResourceKind, ResourceName};

/// The object-count-family usage calculator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjectCalculator;

impl UsageCalculator for ObjectCalculator {
    fn usage<'a>(
        &'a self,
        client: &'a dyn OrchestratorClient,
        namespace: &'a str,
        resource: &'a ResourceName,
        deadline: &'a Deadline,
    ) -> crate::calculators::BoxFuture<'a, Quantity> {
        Box::pin(async move {
            let ResourceKind::ObjectKind(kind) = resource.classify() else {
                return Ok(Quantity::zero());
            };
            let objects = client
                .list_objects(namespace, &OrchestratorObjectKind(kind), deadline)
                .await?;
            Ok(Quantity::from_count(objects.len() as u64))
        })
    }

    fn fixed_resource_names(&self) -> &'static [&'static str] {
        // Object kinds have no single fixed set worth enumerating by default;
        // callers ask for a specific kind via `usage`.
        &[]
    }
}
