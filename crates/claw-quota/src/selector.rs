//! Namespace selector engine (C2).
//!
//! A [`LabelSelector`] compiles its predicate once, at construction, into a
//! read-only matcher (spec.md §9 "Selector caching" / §5 "a constructed
//! selector is safe to share across threads"). `selected()` lists and
//! filters the live namespace set; `diff()` computes deterministic,
//! deduplicated added/removed sets against a caller-supplied previous list.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{QuotaError, Result};
use crate::model::Namespace;
use crate::orchestrator::{Deadline, OrchestratorClient};

/// Label keys: an optional DNS-subdomain prefix, a slash, and a name segment
/// of alphanumerics/`-_.`, matching Kubernetes' label-key grammar closely
/// enough to reject the malformed inputs spec.md §3 calls out.
static LABEL_KEY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-z0-9A-Z]([a-z0-9A-Z\-\.]*[a-z0-9A-Z])?/)?[a-z0-9A-Z]([a-z0-9A-Z\-_\.]*[a-z0-9A-Z])?$")
        .unwrap_or_else(|_| unreachable!())
});

/// Label values: empty, or alphanumerics/`-_.` bounded by alphanumerics.
static LABEL_VALUE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^$|^[a-z0-9A-Z]([a-z0-9A-Z\-_\.]*[a-z0-9A-Z])?$").unwrap_or_else(|_| unreachable!()));

/// One set-based selector requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operator")]
pub enum SelectorRequirement {
    /// The label's value must be one of `values`.
    In {
        /// Label key.
        key: String,
        /// Acceptable values.
        values: Vec<String>,
    },
    /// The label, if present, must not have one of `values`.
    NotIn {
        /// Label key.
        key: String,
        /// Forbidden values.
        values: Vec<String>,
    },
    /// The label key must be present (any value).
    Exists {
        /// Label key.
        key: String,
    },
    /// The label key must be absent.
    DoesNotExist {
        /// Label key.
        key: String,
    },
}

impl SelectorRequirement {
    fn key(&self) -> &str {
        match self {
            Self::In { key, .. } | Self::NotIn { key, .. } | Self::Exists { key } | Self::DoesNotExist { key } => key,
        }
    }

    fn values(&self) -> &[String] {
        match self {
            Self::In { values, .. } | Self::NotIn { values, .. } => values,
            Self::Exists { .. } | Self::DoesNotExist { .. } => &[],
        }
    }

    fn matches(&self, labels: &std::collections::BTreeMap<String, String>) -> bool {
        match self {
            Self::In { key, values } => labels.get(key).is_some_and(|v| values.contains(v)),
            Self::NotIn { key, values } => !labels.get(key).is_some_and(|v| values.contains(v)),
            Self::Exists { key } => labels.contains_key(key),
            Self::DoesNotExist { key } => !labels.contains_key(key),
        }
    }
}

/// A label predicate: a conjunction of exact-equality requirements and
/// set-based requirements. An empty predicate (no requirements at all)
/// matches nothing by design (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSelector {
    match_labels: std::collections::BTreeMap<String, String>,
    match_expressions: Vec<SelectorRequirement>,
}

impl LabelSelector {
    /// Compile a predicate from exact-match labels and set-based
    /// requirements, validating every key/value against label-syntax rules.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::SelectorBuildError`] if any key or value is
    /// syntactically invalid.
    pub fn build(
        match_labels: std::collections::BTreeMap<String, String>,
        match_expressions: Vec<SelectorRequirement>,
    ) -> Result<Self> {
        for (key, value) in &match_labels {
            validate_key(key)?;
            validate_value(value)?;
        }
        for req in &match_expressions {
            validate_key(req.key())?;
            for value in req.values() {
                validate_value(value)?;
            }
        }
        Ok(Self {
            match_labels,
            match_expressions,
        })
    }

    /// An empty selector — matches nothing (spec.md §3, §8 boundary behaviour).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            match_labels: std::collections::BTreeMap::new(),
            match_expressions: Vec::new(),
        }
    }

    /// `true` iff this predicate has no requirements at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.match_labels.is_empty() && self.match_expressions.is_empty()
    }

    /// Evaluate the compiled predicate against a namespace's labels.
    ///
    /// An empty predicate matches nothing, by design.
    #[must_use]
    pub fn matches(&self, labels: &std::collections::BTreeMap<String, String>) -> bool {
        if self.is_empty() {
            return false;
        }
        self.match_labels.iter().all(|(k, v)| labels.get(k) == Some(v))
            && self.match_expressions.iter().all(|req| req.matches(labels))
    }

    /// List every namespace currently matching this predicate, sorted and
    /// deduplicated.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::ListError`] if the namespace listing itself fails.
    pub async fn selected(&self, client: &dyn OrchestratorClient, deadline: &Deadline) -> Result<Vec<String>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        let namespaces = client.list_namespaces(None, deadline).await?;
        let matched: BTreeSet<String> = namespaces
            .into_iter()
            .filter(|ns: &Namespace| self.matches(&ns.labels))
            .map(|ns| ns.name)
            .collect();
        Ok(matched.into_iter().collect())
    }

    /// Compute `(added, removed)` against a previous namespace list.
    ///
    /// The previous list is deduplicated before comparison; both output
    /// vectors are sorted and deduplicated regardless of duplicates in
    /// either input.
    pub async fn diff(
        &self,
        client: &dyn OrchestratorClient,
        deadline: &Deadline,
        previous: &[String],
    ) -> Result<(Vec<String>, Vec<String>)> {
        let current: BTreeSet<String> = self.selected(client, deadline).await?.into_iter().collect();
        let previous: BTreeSet<String> = previous.iter().cloned().collect();

        let added = current.difference(&previous).cloned().collect();
        let removed = previous.difference(&current).cloned().collect();
        Ok((added, removed))
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() || key.len() > 317 || !LABEL_KEY_REGEX.is_match(key) {
        return Err(QuotaError::SelectorBuildError(format!("invalid label key: {key:?}")));
    }
    Ok(())
}

fn validate_value(value: &str) -> Result<()> {
    if value.len() > 63 || !LABEL_VALUE_REGEX.is_match(value) {
        return Err(QuotaError::SelectorBuildError(format!("invalid label value: {value:?}")));
    }
    Ok(())
}
