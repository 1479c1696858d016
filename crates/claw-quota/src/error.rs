//! Error types for the claw-quota crate.

use thiserror::Error;

use crate::quantity::Quantity;

/// Errors that can occur while evaluating or enforcing cluster resource quotas.
#[derive(Debug, Error)]
pub enum QuotaError {
    /// A namespace-selector predicate was syntactically invalid at construction time.
    #[error("invalid namespace selector: {0}")]
    SelectorBuildError(String),

    /// An orchestrator listing call failed.
    #[error("failed to list {resource} from orchestrator: {source}")]
    ListError {
        /// What was being listed (e.g. "namespaces", "pods in ns/foo").
        resource: String,
        /// The underlying transport/IO failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// More than one `ClusterResourceQuota` matches a namespace; ownership must be unique.
    #[error("namespace {namespace} is matched by multiple ClusterResourceQuotas: {}", .crq_names.join(", "))]
    MultipleOwnersError {
        /// The namespace with ambiguous ownership.
        namespace: String,
        /// Every CRQ that matches it.
        crq_names: Vec<String>,
    },

    /// A proposed CRQ's selector would poach namespaces already owned by other CRQs.
    #[error("namespace selector conflicts: {}", format_conflicts(.conflicts))]
    ConflictError {
        /// `(namespace, crq names that would also claim it)` pairs.
        conflicts: Vec<(String, Vec<String>)>,
    },

    /// Admitting the proposed delta would push aggregate usage above the CRQ's hard cap.
    #[error(
        "exceeded quota {crq_name}: resource {resource} requested {requested}, used {used}, \
         cap {cap} would total {total}"
    )]
    QuotaExceeded {
        /// The CRQ whose cap was hit.
        crq_name: String,
        /// The resource name that was over budget.
        resource: String,
        /// The quantity this admission would add.
        requested: Quantity,
        /// Current aggregate usage across the CRQ's selected namespaces.
        used: Quantity,
        /// The CRQ's hard cap for this resource.
        cap: Quantity,
        /// `used + requested`.
        total: Quantity,
    },

    /// The router was asked to compute current usage for a resource name it cannot classify,
    /// and the caller required a definite number rather than a silent zero.
    #[error("unsupported resource name for usage lookup: {0}")]
    UnsupportedResourceError(String),

    /// A target namespace referenced by an admission request does not exist.
    #[error("namespace not found: {0}")]
    NamespaceNotFound(String),
}

fn format_conflicts(conflicts: &[(String, Vec<String>)]) -> String {
    conflicts
        .iter()
        .map(|(ns, names)| format!("{ns} -> [{}]", names.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

impl QuotaError {
    /// Build a [`QuotaError::ListError`] from any boxed-able cause.
    pub fn list_error(
        resource: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ListError {
            resource: resource.into(),
            source: Box::new(source),
        }
    }

    /// `true` for errors that represent an admission denial rather than an
    /// infrastructure failure (per spec §7's propagation-policy table).
    #[must_use]
    pub const fn is_denial(&self) -> bool {
        matches!(
            self,
            Self::MultipleOwnersError { .. } | Self::ConflictError { .. } | Self::QuotaExceeded { .. }
        )
    }
}

/// Result type for claw-quota operations.
pub type Result<T> = std::result::Result<T, QuotaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_exceeded_display_includes_all_fields() {
        let err = QuotaError::QuotaExceeded {
            crq_name: "team-a".to_string(),
            resource: "requests.cpu".to_string(),
            requested: Quantity::parse("150m").unwrap_or_default(),
            used: Quantity::parse("200m").unwrap_or_default(),
            cap: Quantity::parse("300m").unwrap_or_default(),
            total: Quantity::parse("350m").unwrap_or_default(),
        };
        let msg = err.to_string();
        assert!(msg.contains("team-a"));
        assert!(msg.contains("requests.cpu"));
        assert!(msg.contains("150m"));
        assert!(msg.contains("200m"));
        assert!(msg.contains("300m"));
        assert!(msg.contains("350m"));
    }

    #[test]
    fn multiple_owners_display_lists_every_crq() {
        let err = QuotaError::MultipleOwnersError {
            namespace: "ns-fe".to_string(),
            crq_names: vec!["a".to_string(), "b".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("ns-fe"));
        assert!(msg.contains('a'));
        assert!(msg.contains('b'));
    }

    #[test]
    fn is_denial_classifies_correctly() {
        let denial = QuotaError::ConflictError { conflicts: vec![] };
        assert!(denial.is_denial());

        let infra = QuotaError::SelectorBuildError("bad key".to_string());
        assert!(!infra.is_denial());
    }
}
