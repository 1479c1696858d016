//! The external orchestrator read interface (spec.md §6, §12).
//!
//! `OrchestratorClient` is written the way the teacher workspace writes
//! dyn-compatible async traits (see `claw-compute::container::runtime::ContainerRuntime`):
//! each method returns a boxed, pinned future instead of using `async fn` in
//! the trait, so the trait stays object-safe and callers can hold
//! `&dyn OrchestratorClient` without knowing the concrete transport. Every
//! method takes a [`Deadline`] so callers can honour spec.md §5's
//! cancellation/timeout requirement without this crate depending on a
//! specific async runtime.

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::model::{ClusterResourceQuota, Namespace, PersistentVolumeClaim, Pod, Service};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// A deadline and cancellation signal threaded through every orchestrator
/// query (spec.md §5 "Suspension points" / "Cancellation and timeouts").
#[derive(Debug, Clone)]
pub struct Deadline {
    expires_at: Option<Instant>,
}

impl Deadline {
    /// No deadline at all.
    #[must_use]
    pub const fn none() -> Self {
        Self { expires_at: None }
    }

    /// A deadline `timeout` from now.
    #[must_use]
    pub fn after(timeout: Duration) -> Self {
        Self {
            expires_at: Instant::now().checked_add(timeout),
        }
    }

    /// `true` once the deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// A generic object-count kind (C7), identified by its canonical resource
/// name (e.g. `"configmaps"`, `"deployments.apps"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKind(pub String);

/// Read access to live orchestrator state. No method caches or mutates
/// anything; every call reflects the orchestrator's state at the moment it
/// runs (spec.md §5 "Shared-resource policy").
pub trait OrchestratorClient: Send + Sync {
    /// List namespaces, optionally filtered by a raw label-selector string.
    fn list_namespaces<'a>(
        &'a self,
        label_selector: Option<&'a str>,
        deadline: &'a Deadline,
    ) -> BoxFuture<'a, Vec<Namespace>>;

    /// Get a single namespace by name, or `None` if it does not exist.
    fn get_namespace<'a>(&'a self, name: &'a str, deadline: &'a Deadline) -> BoxFuture<'a, Option<Namespace>>;

    /// List every `ClusterResourceQuota`.
    fn list_crqs<'a>(&'a self, deadline: &'a Deadline) -> BoxFuture<'a, Vec<ClusterResourceQuota>>;

    /// List pods in a namespace.
    fn list_pods<'a>(&'a self, namespace: &'a str, deadline: &'a Deadline) -> BoxFuture<'a, Vec<Pod>>;

    /// List PVCs in a namespace.
    fn list_pvcs<'a>(
        &'a self,
        namespace: &'a str,
        deadline: &'a Deadline,
    ) -> BoxFuture<'a, Vec<PersistentVolumeClaim>>;

    /// List services in a namespace.
    fn list_services<'a>(&'a self, namespace: &'a str, deadline: &'a Deadline) -> BoxFuture<'a, Vec<Service>>;

    /// List objects of a given C7-recognised kind in a namespace.
    fn list_objects<'a>(
        &'a self,
        namespace: &'a str,
        kind: &'a ObjectKind,
        deadline: &'a Deadline,
    ) -> BoxFuture<'a, Vec<crate::model::ObjectRef>>;
}

/// An in-memory [`OrchestratorClient`] used by this crate's own tests, and
/// suitable as a template for integration tests of callers that embed this
/// crate.
#[cfg(test)]
pub(crate) mod test_support {
    use super::{BoxFuture, Deadline, ObjectKind, OrchestratorClient};
    use crate::error::Result;
    use crate::model::{ClusterResourceQuota, Namespace, ObjectRef, PersistentVolumeClaim, Pod, Service};
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct State {
        namespaces: Vec<Namespace>,
        crqs: Vec<ClusterResourceQuota>,
        pods: BTreeMap<String, Vec<Pod>>,
        pvcs: BTreeMap<String, Vec<PersistentVolumeClaim>>,
        services: BTreeMap<String, Vec<Service>>,
        objects: BTreeMap<(String, String), Vec<ObjectRef>>,
    }

    /// A fully in-memory orchestrator double. Every setter takes `self` by
    /// value and returns it, mirroring the builder style the teacher
    /// workspace uses for its own test fixtures and quota builders.
    #[derive(Debug, Default)]
    pub(crate) struct FakeOrchestrator {
        state: Mutex<State>,
    }

    impl FakeOrchestrator {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn with_namespace(self, name: &str, labels: &[(&str, &str)]) -> Self {
            let ns = Namespace::new(
                name,
                labels.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            );
            self.state.lock().unwrap_or_else(|e| e.into_inner()).namespaces.push(ns);
            self
        }

        pub(crate) fn with_crq(self, crq: ClusterResourceQuota) -> Self {
            self.state.lock().unwrap_or_else(|e| e.into_inner()).crqs.push(crq);
            self
        }

        pub(crate) fn with_pods(self, namespace: &str, pods: Vec<Pod>) -> Self {
            self.state
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .pods
                .entry(namespace.to_string())
                .or_default()
                .extend(pods);
            self
        }

        pub(crate) fn with_pvcs(self, namespace: &str, pvcs: Vec<PersistentVolumeClaim>) -> Self {
            self.state
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .pvcs
                .entry(namespace.to_string())
                .or_default()
                .extend(pvcs);
            self
        }

        pub(crate) fn with_services(self, namespace: &str, services: Vec<Service>) -> Self {
            self.state
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .services
                .entry(namespace.to_string())
                .or_default()
                .extend(services);
            self
        }

        pub(crate) fn with_objects(self, namespace: &str, kind: &str, objects: Vec<ObjectRef>) -> Self {
            self.state
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .objects
                .entry((namespace.to_string(), kind.to_string()))
                .or_default()
                .extend(objects);
            self
        }
    }

    impl OrchestratorClient for FakeOrchestrator {
        fn list_namespaces<'a>(
            &'a self,
            _label_selector: Option<&'a str>,
            _deadline: &'a Deadline,
        ) -> BoxFuture<'a, Vec<Namespace>> {
            Box::pin(async move {
                Ok(self.state.lock().unwrap_or_else(|e| e.into_inner()).namespaces.clone())
            })
        }

        fn get_namespace<'a>(&'a self, name: &'a str, _deadline: &'a Deadline) -> BoxFuture<'a, Option<Namespace>> {
            Box::pin(async move {
                Ok(self
                    .state
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .namespaces
                    .iter()
                    .find(|ns| ns.name == name)
                    .cloned())
            })
        }

        fn list_crqs<'a>(&'a self, _deadline: &'a Deadline) -> BoxFuture<'a, Vec<ClusterResourceQuota>> {
            Box::pin(async move { Ok(self.state.lock().unwrap_or_else(|e| e.into_inner()).crqs.clone()) })
        }

        fn list_pods<'a>(&'a self, namespace: &'a str, _deadline: &'a Deadline) -> BoxFuture<'a, Vec<Pod>> {
            Box::pin(async move {
                Ok(self
                    .state
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .pods
                    .get(namespace)
                    .cloned()
                    .unwrap_or_default())
            })
        }

        fn list_pvcs<'a>(
            &'a self,
            namespace: &'a str,
            _deadline: &'a Deadline,
        ) -> BoxFuture<'a, Vec<PersistentVolumeClaim>> {
            Box::pin(async move {
                Ok(self
                    .state
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .pvcs
                    .get(namespace)
                    .cloned()
                    .unwrap_or_default())
            })
        }

        fn list_services<'a>(&'a self, namespace: &'a str, _deadline: &'a Deadline) -> BoxFuture<'a, Vec<Service>> {
            Box::pin(async move {
                Ok(self
                    .state
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .services
                    .get(namespace)
                    .cloned()
                    .unwrap_or_default())
            })
        }

        fn list_objects<'a>(
            &'a self,
            namespace: &'a str,
            kind: &'a ObjectKind,
            _deadline: &'a Deadline,
        ) -> BoxFuture<'a, Vec<ObjectRef>> {
            Box::pin(async move {
                Ok(self
                    .state
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .objects
                    .get(&(namespace.to_string(), kind.0.clone()))
                    .cloned()
                    .unwrap_or_default())
            })
        }
    }
}
