//! CRQ registry (C3): finding the unique CRQ that owns a namespace, and the
//! reverse relation.

use crate::error::{QuotaError, Result};
use crate::model::ClusterResourceQuota;
use crate::orchestrator::{Deadline, OrchestratorClient};

/// List every `ClusterResourceQuota` known to the orchestrator.
///
/// # Errors
///
/// Returns [`QuotaError::ListError`] if the listing call fails.
pub async fn list_all(client: &dyn OrchestratorClient, deadline: &Deadline) -> Result<Vec<ClusterResourceQuota>> {
    client.list_crqs(deadline).await
}

/// `true` iff `crq`'s selector matches `labels`. A CRQ with no selector
/// matches nothing.
#[must_use]
pub fn matches(labels: &std::collections::BTreeMap<String, String>, crq: &ClusterResourceQuota) -> bool {
    crq.selector.as_ref().is_some_and(|sel| sel.matches(labels))
}

/// Find the unique CRQ whose selector matches `namespace`'s labels.
///
/// Returns `Ok(None)` if zero CRQs match. Returns
/// [`QuotaError::MultipleOwnersError`] naming every matching CRQ if two or
/// more match — ownership of a namespace must be unique (spec.md §3, §4.3).
///
/// # Errors
///
/// Returns [`QuotaError::ListError`] if listing CRQs fails, or
/// [`QuotaError::MultipleOwnersError`] if ownership is ambiguous.
pub async fn owning_crq(
    client: &dyn OrchestratorClient,
    deadline: &Deadline,
    namespace: &crate::model::Namespace,
) -> Result<Option<ClusterResourceQuota>> {
    let crqs = list_all(client, deadline).await?;
    let mut owners: Vec<ClusterResourceQuota> =
        crqs.into_iter().filter(|crq| matches(&namespace.labels, crq)).collect();

    match owners.len() {
        0 => Ok(None),
        1 => Ok(owners.pop()),
        _ => {
            let mut crq_names: Vec<String> = owners.into_iter().map(|crq| crq.name).collect();
            crq_names.sort();
            Err(QuotaError::MultipleOwnersError {
                namespace: namespace.name.clone(),
                crq_names,
            })
        }
    }
}

/// The observed-status namespace list recorded on a CRQ.
///
/// `None` means "never reconciled"; `Some(vec![])` means "reconciled,
/// currently selects nothing" — the caller is expected to distinguish these
/// (spec.md §4.3).
#[must_use]
pub fn status_namespaces(crq: &ClusterResourceQuota) -> Option<&[String]> {
    crq.status_namespaces.as_deref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::test_support::FakeOrchestrator;
    use crate::selector::LabelSelector;
    use std::collections::BTreeMap;

    fn selector(pairs: &[(&str, &str)]) -> LabelSelector {
        LabelSelector::build(
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            vec![],
        )
        .unwrap()
    }

    fn ns(name: &str, pairs: &[(&str, &str)]) -> crate::model::Namespace {
        crate::model::Namespace::new(
            name,
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        )
    }

    #[tokio::test]
    async fn owning_crq_returns_none_for_zero_matches() {
        let client = FakeOrchestrator::new();
        let result = owning_crq(&client, &Deadline::none(), &ns("ns1", &[])).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn owning_crq_returns_the_sole_match() {
        let crq = ClusterResourceQuota::new("a").with_selector(selector(&[("team", "frontend")]));
        let client = FakeOrchestrator::new().with_crq(crq);
        let result = owning_crq(&client, &Deadline::none(), &ns("ns1", &[("team", "frontend")]))
            .await
            .unwrap();
        assert_eq!(result.unwrap().name, "a");
    }

    #[tokio::test]
    async fn owning_crq_fails_on_ambiguity() {
        let a = ClusterResourceQuota::new("a").with_selector(selector(&[("team", "frontend")]));
        let b = ClusterResourceQuota::new("b").with_selector(selector(&[("env", "test")]));
        let client = FakeOrchestrator::new().with_crq(a).with_crq(b);

        let target = ns("ns-fe", &[("team", "frontend"), ("env", "test")]);
        let err = owning_crq(&client, &Deadline::none(), &target).await.unwrap_err();
        match err {
            QuotaError::MultipleOwnersError { namespace, crq_names } => {
                assert_eq!(namespace, "ns-fe");
                assert_eq!(crq_names, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("expected MultipleOwnersError, got {other:?}"),
        }
    }

    #[test]
    fn matches_is_false_without_a_selector() {
        let crq = ClusterResourceQuota::new("a");
        assert!(!matches(&BTreeMap::new(), &crq));
    }

    #[test]
    fn status_namespaces_distinguishes_absent_from_empty() {
        let never_reconciled = ClusterResourceQuota::new("a");
        assert_eq!(status_namespaces(&never_reconciled), None);

        let reconciled_empty = ClusterResourceQuota::new("a").with_status_namespaces(vec![]);
        assert_eq!(status_namespaces(&reconciled_empty), Some(&[][..]));
    }
}
