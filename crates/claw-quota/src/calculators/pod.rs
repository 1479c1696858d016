//! Pod usage calculator (C4).
//!
//! Per spec.md §4.4: a single pod's usage for resource `R` is
//! `overhead(R) + max(sum(non-terminated containers), max(non-terminated
//! init containers))`. Init containers run sequentially, so their peak
//! simultaneous demand is a `max`, not a `sum`; once the pod is running the
//! regular containers run concurrently, so they sum. Terminal pods
//! (`Succeeded`/`Failed`) are excluded entirely at the per-namespace
//! aggregation step, not inside the single-pod calculation — calling
//! [`single_pod_usage`] directly on a terminal pod still returns its
//! would-be usage.

use std::collections::BTreeMap;

use crate::calculators::UsageCalculator;
use crate::error::Result;
use crate::model::{Container, Pod};
use crate::orchestrator::{Deadline, OrchestratorClient};
use crate::quantity::Quantity;
use crate::resource::ResourceName;

const FIXED_RESOURCE_NAMES: &[&str] = &[
    "requests.cpu",
    "requests.memory",
    "limits.cpu",
    "limits.memory",
    "requests.ephemeral-storage",
    "limits.ephemeral-storage",
    "pods",
];

/// The pod-family usage calculator.
#[derive(Debug, Default, Clone, Copy)]
pub struct PodCalculator;

impl PodCalculator {
    /// Number of non-terminal pods in `namespace`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::QuotaError::ListError`] if listing pods fails.
    pub async fn pod_count(&self, client: &dyn OrchestratorClient, namespace: &str, deadline: &Deadline) -> Result<u64> {
        let pods = client.list_pods(namespace, deadline).await?;
        Ok(pods.iter().filter(|p| !p.is_terminal()).count() as u64)
    }
}

impl UsageCalculator for PodCalculator {
    fn usage<'a>(
        &'a self,
        client: &'a dyn OrchestratorClient,
        namespace: &'a str,
        resource: &'a ResourceName,
        deadline: &'a Deadline,
    ) -> crate::calculators::BoxFuture<'a, Quantity> {
        Box::pin(async move {
            let pods = client.list_pods(namespace, deadline).await?;
            let non_terminal: Vec<&Pod> = pods.iter().filter(|p| !p.is_terminal()).collect();

            if resource.as_str() == "pods" {
                return Ok(Quantity::from_count(non_terminal.len() as u64));
            }

            Ok(non_terminal
                .into_iter()
                .map(|pod| single_pod_usage(pod, resource.as_str()))
                .sum())
        })
    }

    fn fixed_resource_names(&self) -> &'static [&'static str] {
        FIXED_RESOURCE_NAMES
    }
}

/// A single pod's usage for resource `R`, ignoring whether the pod itself is
/// terminal (the exclusion is applied by the caller, at aggregation).
#[must_use]
pub fn single_pod_usage(pod: &Pod, resource: &str) -> Quantity {
    let overhead = overhead_for(pod, resource);

    let app_sum: Quantity = pod
        .containers
        .iter()
        .filter(|c| !c.is_terminated())
        .map(|c| container_contribution(c, resource))
        .sum();

    let max_init: Quantity = pod
        .init_containers
        .iter()
        .filter(|c| !c.is_terminated())
        .map(|c| container_contribution(c, resource))
        .max()
        .unwrap_or_default();

    overhead + app_sum.max(max_init)
}

/// The fixed-resource-name summary for a single pod (not namespace-aggregated).
#[must_use]
pub fn single_pod_total_usage(pod: &Pod) -> BTreeMap<String, Quantity> {
    FIXED_RESOURCE_NAMES
        .iter()
        .filter(|name| **name != "pods")
        .map(|name| ((*name).to_string(), single_pod_usage(pod, name)))
        .collect()
}

fn overhead_for(pod: &Pod, resource: &str) -> Quantity {
    if let Some(q) = pod.overhead.get(resource) {
        return *q;
    }
    let base = ResourceName::new(resource).base();
    pod.overhead.get(base.as_str()).copied().unwrap_or_default()
}

/// Per-container contribution for resource `R`, per spec.md §4.4.
fn container_contribution(container: &Container, resource: &str) -> Quantity {
    match resource {
        "requests.cpu" => container.resources.request("cpu"),
        "requests.memory" => container.resources.request("memory"),
        "requests.ephemeral-storage" => container.resources.request("ephemeral-storage"),
        "limits.cpu" => container.resources.limit("cpu"),
        "limits.memory" => container.resources.limit("memory"),
        _ => {
            if let Some(stripped) = resource.strip_prefix("requests.") {
                container.resources.request(stripped)
            } else {
                container
                    .resources
                    .requests
                    .get(resource)
                    .copied()
                    .unwrap_or_else(|| container.resources.limit(resource))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContainerState, PodPhase, ResourceRequirements};
    use crate::orchestrator::test_support::FakeOrchestrator;

    fn requests(pairs: &[(&str, &str)]) -> ResourceRequirements {
        ResourceRequirements {
            requests: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), Quantity::parse(v).unwrap()))
                .collect(),
            limits: BTreeMap::new(),
        }
    }

    fn container(name: &str, state: Option<ContainerState>, cpu: &str) -> Container {
        Container {
            name: name.to_string(),
            resources: requests(&[("cpu", cpu)]),
            state,
        }
    }

    fn pod(containers: Vec<Container>, init_containers: Vec<Container>, phase: PodPhase) -> Pod {
        Pod {
            name: "p".to_string(),
            containers,
            init_containers,
            overhead: BTreeMap::new(),
            phase,
        }
    }

    #[test]
    fn terminated_container_excluded_from_sum() {
        // spec.md §8 scenario 3
        let p = pod(
            vec![
                container("app", Some(ContainerState::Running), "200m"),
                container("sidecar", Some(ContainerState::Terminated), "500m"),
            ],
            vec![],
            PodPhase::Running,
        );
        assert_eq!(single_pod_usage(&p, "requests.cpu").to_string(), "200m");
    }

    #[test]
    fn init_container_peak_not_sum() {
        // spec.md §8 scenario 4
        let p = pod(
            vec![container("app", None, "150m")],
            vec![container("init-a", None, "200m"), container("init-b", None, "100m")],
            PodPhase::Running,
        );
        assert_eq!(single_pod_usage(&p, "requests.cpu").to_string(), "200m");
    }

    #[test]
    fn overhead_added_once_with_base_name_fallback() {
        let mut p = pod(vec![container("app", None, "100m")], vec![], PodPhase::Running);
        p.overhead.insert("cpu".to_string(), Quantity::parse("50m").unwrap());
        // requests.cpu should pick up overhead declared as bare "cpu"
        assert_eq!(single_pod_usage(&p, "requests.cpu").to_string(), "150m");
    }

    #[test]
    fn terminated_init_container_excluded_from_max() {
        let p = pod(
            vec![container("app", None, "50m")],
            vec![container("init-a", Some(ContainerState::Terminated), "999m")],
            PodPhase::Running,
        );
        assert_eq!(single_pod_usage(&p, "requests.cpu").to_string(), "50m");
    }

    #[tokio::test]
    async fn terminal_pods_excluded_at_aggregation() {
        let running = pod(vec![container("app", None, "100m")], vec![], PodPhase::Running);
        let mut succeeded = pod(vec![container("app", None, "999m")], vec![], PodPhase::Succeeded);
        succeeded.name = "done".to_string();

        let client = FakeOrchestrator::new().with_pods("ns1", vec![running, succeeded]);
        let calc = PodCalculator;
        let usage = calc
            .usage(&client, "ns1", &ResourceName::new("requests.cpu"), &Deadline::none())
            .await
            .unwrap();
        assert_eq!(usage.to_string(), "100m");
    }

    #[tokio::test]
    async fn pod_count_excludes_terminal_pods() {
        let running = pod(vec![], vec![], PodPhase::Running);
        let mut failed = pod(vec![], vec![], PodPhase::Failed);
        failed.name = "failed".to_string();

        let client = FakeOrchestrator::new().with_pods("ns1", vec![running, failed]);
        let calc = PodCalculator;
        let count = calc.pod_count(&client, "ns1", &Deadline::none()).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn scenario_one_admit_within_cpu_cap() {
        // spec.md §8 scenario 1
        let ns1_pod = pod(vec![container("app", None, "100m")], vec![], PodPhase::Running);
        let client = FakeOrchestrator::new().with_pods("ns1", vec![ns1_pod]);
        let calc = PodCalculator;
        let used = calc
            .usage(&client, "ns1", &ResourceName::new("requests.cpu"), &Deadline::none())
            .await
            .unwrap();
        assert_eq!(used.to_string(), "100m");
        let total = used + Quantity::parse("150m").unwrap();
        assert_eq!(total.to_string(), "250m");
        assert!(total <= Quantity::parse("300m").unwrap());
    }
}
