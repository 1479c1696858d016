//! CRQ conflict validator (C9).
//!
//! A namespace may be owned by at most one `ClusterResourceQuota` (spec.md
//! §3, §4.3). [`validate_crq`] rejects a proposed CRQ (create or update)
//! whose selector would claim a namespace some other CRQ already selects.
//! [`validate_namespace`] rejects a namespace whose current labels are
//! matched by more than one CRQ, covering the symmetric case where a
//! namespace's labels change under CRQs that were not in conflict before.

use std::collections::BTreeMap;

use crate::error::{QuotaError, Result};
use crate::model::{ClusterResourceQuota, Namespace};
use crate::orchestrator::{Deadline, OrchestratorClient};
use crate::registry;

/// Validate a proposed `ClusterResourceQuota` (create or update) against
/// every other CRQ already known to the orchestrator.
///
/// A CRQ being updated in place is identified by name and excluded from the
/// comparison set — a CRQ never conflicts with its own prior selector.
///
/// # Errors
///
/// Returns [`QuotaError::ListError`] if listing CRQs or namespaces fails, or
/// [`QuotaError::ConflictError`] naming every namespace the candidate would
/// poach and which CRQs already own it.
pub async fn validate_crq(
    client: &dyn OrchestratorClient,
    deadline: &Deadline,
    candidate: &ClusterResourceQuota,
) -> Result<()> {
    let Some(selector) = candidate.selector.as_ref() else {
        return Ok(());
    };

    let candidate_namespaces = selector.selected(client, deadline).await?;
    if candidate_namespaces.is_empty() {
        return Ok(());
    }

    let others: Vec<ClusterResourceQuota> = registry::list_all(client, deadline)
        .await?
        .into_iter()
        .filter(|crq| crq.name != candidate.name)
        .collect();

    let mut conflicts: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for other in &others {
        let Some(other_selector) = other.selector.as_ref() else {
            continue;
        };
        let other_namespaces = other_selector.selected(client, deadline).await?;
        for ns in &candidate_namespaces {
            if other_namespaces.contains(ns) {
                conflicts.entry(ns.clone()).or_default().push(other.name.clone());
            }
        }
    }

    if conflicts.is_empty() {
        return Ok(());
    }

    let mut conflicts: Vec<(String, Vec<String>)> = conflicts.into_iter().collect();
    for (_, names) in &mut conflicts {
        names.sort();
    }
    Err(QuotaError::ConflictError { conflicts })
}

/// Validate that `namespace`'s current labels are matched by at most one
/// `ClusterResourceQuota`.
///
/// # Errors
///
/// Returns [`QuotaError::ListError`] if listing CRQs fails, or
/// [`QuotaError::MultipleOwnersError`] if more than one CRQ matches.
pub async fn validate_namespace(client: &dyn OrchestratorClient, deadline: &Deadline, namespace: &Namespace) -> Result<()> {
    registry::owning_crq(client, deadline, namespace).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::test_support::FakeOrchestrator;
    use crate::selector::LabelSelector;

    fn selector(pairs: &[(&str, &str)]) -> LabelSelector {
        LabelSelector::build(
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            vec![],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn no_conflict_when_selectors_are_disjoint() {
        let client = FakeOrchestrator::new()
            .with_namespace("fe-1", &[("team", "frontend")])
            .with_namespace("be-1", &[("team", "backend")])
            .with_crq(ClusterResourceQuota::new("backend-quota").with_selector(selector(&[("team", "backend")])));

        let candidate = ClusterResourceQuota::new("frontend-quota").with_selector(selector(&[("team", "frontend")]));
        validate_crq(&client, &Deadline::none(), &candidate).await.unwrap();
    }

    #[tokio::test]
    async fn scenario_five_conflicting_selector_is_denied() {
        // spec.md §8 scenario 5: a new CRQ's selector overlaps an existing CRQ's namespaces.
        let client = FakeOrchestrator::new()
            .with_namespace("shared", &[("team", "frontend"), ("env", "prod")])
            .with_crq(ClusterResourceQuota::new("frontend-quota").with_selector(selector(&[("team", "frontend")])));

        let candidate = ClusterResourceQuota::new("prod-quota").with_selector(selector(&[("env", "prod")]));
        let err = validate_crq(&client, &Deadline::none(), &candidate).await.unwrap_err();
        match err {
            QuotaError::ConflictError { conflicts } => {
                assert_eq!(conflicts, vec![("shared".to_string(), vec!["frontend-quota".to_string()])]);
            }
            other => panic!("expected ConflictError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn updating_a_crq_in_place_does_not_conflict_with_itself() {
        let client = FakeOrchestrator::new()
            .with_namespace("fe-1", &[("team", "frontend")])
            .with_crq(ClusterResourceQuota::new("frontend-quota").with_selector(selector(&[("team", "frontend")])));

        let updated =
            ClusterResourceQuota::new("frontend-quota").with_selector(selector(&[("team", "frontend")]));
        validate_crq(&client, &Deadline::none(), &updated).await.unwrap();
    }

    #[tokio::test]
    async fn crq_with_no_selector_never_conflicts() {
        let client = FakeOrchestrator::new();
        let candidate = ClusterResourceQuota::new("inert");
        validate_crq(&client, &Deadline::none(), &candidate).await.unwrap();
    }

    #[tokio::test]
    async fn validate_namespace_passes_with_zero_or_one_owner() {
        let client = FakeOrchestrator::new()
            .with_crq(ClusterResourceQuota::new("a").with_selector(selector(&[("team", "frontend")])));
        let ns = Namespace::new(
            "fe-1",
            [("team".to_string(), "frontend".to_string())].into_iter().collect(),
        );
        validate_namespace(&client, &Deadline::none(), &ns).await.unwrap();
    }

    #[tokio::test]
    async fn validate_namespace_fails_when_two_crqs_match() {
        let client = FakeOrchestrator::new()
            .with_crq(ClusterResourceQuota::new("a").with_selector(selector(&[("team", "frontend")])))
            .with_crq(ClusterResourceQuota::new("b").with_selector(selector(&[("env", "prod")])));
        let ns = Namespace::new(
            "fe-1",
            [("team".to_string(), "frontend".to_string()), ("env".to_string(), "prod".to_string())]
                .into_iter()
                .collect(),
        );
        let err = validate_namespace(&client, &Deadline::none(), &ns).await.unwrap_err();
        assert!(matches!(err, QuotaError::MultipleOwnersError { .. }));
    }
}
