//! Per-resource-family usage calculators (C4-C7) and their router (C8).
//!
//! Each family satisfies the same external shape — `usage` and
//! `total_usage` — behind the [`UsageCalculator`] capability, per spec.md
//! §9's design note replacing a polymorphic "calculator interface"
//! hierarchy with distinct concrete implementations the router dispatches
//! to by resource-name variant.

pub mod objects;
pub mod pod;
pub mod router;
pub mod service;
pub mod storage;

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use crate::error::Result;
use crate::orchestrator::{Deadline, OrchestratorClient};
use crate::quantity::Quantity;
use crate::resource::ResourceName;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// The shape every family calculator satisfies.
pub trait UsageCalculator: Send + Sync {
    /// Current usage of `resource` in `namespace`.
    fn usage<'a>(
        &'a self,
        client: &'a dyn OrchestratorClient,
        namespace: &'a str,
        resource: &'a ResourceName,
        deadline: &'a Deadline,
    ) -> BoxFuture<'a, Quantity>;

    /// The fixed set of canonical resource names this family reports in
    /// [`UsageCalculator::total_usage`].
    fn fixed_resource_names(&self) -> &'static [&'static str];

    /// Convenience aggregate over [`UsageCalculator::fixed_resource_names`].
    fn total_usage<'a>(
        &'a self,
        client: &'a dyn OrchestratorClient,
        namespace: &'a str,
        deadline: &'a Deadline,
    ) -> BoxFuture<'a, BTreeMap<String, Quantity>> {
        Box::pin(async move {
            let mut totals = BTreeMap::new();
            for name in self.fixed_resource_names() {
                let resource = ResourceName::new(*name);
                let value = self.usage(client, namespace, &resource, deadline).await?;
                totals.insert((*name).to_string(), value);
            }
            Ok(totals)
        })
    }
}
