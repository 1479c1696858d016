//! Service usage calculator (C6): total service count plus per-subtype
//! counts.

use std::collections::BTreeMap;

use crate::calculators::UsageCalculator;
use crate::model::{Service, ServiceSubtype};
use crate::orchestrator::{Deadline, OrchestratorClient};
use crate::quantity::Quantity;
use crate::resource::{ResourceKind, ResourceName, ServiceSubtypeResource};

const FIXED_RESOURCE_NAMES: &[&str] = &["services", "services.loadbalancers", "services.nodeports"];

/// The service-family usage calculator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ServiceCalculator;

impl ServiceCalculator {
    /// List services in `namespace` and return the total count plus a
    /// per-subtype breakdown.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::QuotaError::ListError`] if listing services fails.
    pub async fn count_by_subtype(
        &self,
        client: &dyn OrchestratorClient,
        namespace: &str,
        deadline: &Deadline,
    ) -> crate::error::Result<(u64, BTreeMap<ServiceSubtype, u64>)> {
        let services = client.list_services(namespace, deadline).await?;
        let mut by_subtype: BTreeMap<ServiceSubtype, u64> = BTreeMap::new();
        for svc in &services {
            *by_subtype.entry(svc.subtype).or_insert(0) += 1;
        }
        Ok((services.len() as u64, by_subtype))
    }
}

impl UsageCalculator for ServiceCalculator {
    fn usage<'a>(
        &'a self,
        client: &'a dyn OrchestratorClient,
        namespace: &'a str,
        resource: &'a ResourceName,
        deadline: &'a Deadline,
    ) -> crate::calculators::BoxFuture<'a, Quantity> {
        Box::pin(async move {
            let (total, by_subtype) = self.count_by_subtype(client, namespace, deadline).await?;

            Ok(match resource.classify() {
                ResourceKind::ServiceTotal => Quantity::from_count(total),
                ResourceKind::ServiceSubtype(ServiceSubtypeResource::LoadBalancer) => {
                    Quantity::from_count(by_subtype.get(&ServiceSubtype::LoadBalancer).copied().unwrap_or(0))
                }
                ResourceKind::ServiceSubtype(ServiceSubtypeResource::NodePort) => {
                    Quantity::from_count(by_subtype.get(&ServiceSubtype::NodePort).copied().unwrap_or(0))
                }
                _ => Quantity::zero(),
            })
        })
    }

    fn fixed_resource_names(&self) -> &'static [&'static str] {
        FIXED_RESOURCE_NAMES
    }
}
