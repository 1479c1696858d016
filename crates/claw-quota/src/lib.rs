//! # claw-quota
//!
//! Cluster-wide resource quota enforcement for Clawbernetes.
//!
//! A `ClusterResourceQuota` (CRQ) claims a set of namespaces by label
//! selector and caps the aggregate usage of those namespaces against a
//! shared pool of resources — compute requests, pod count, storage,
//! services, and arbitrary countable object kinds. Unlike a per-namespace
//! `ResourceQuota`, one CRQ's cap is enforced against the sum of usage
//! across every namespace it selects.
//!
//! ## Pipeline
//!
//! - [`selector`] (C2) — label selector matching and namespace diffing
//! - [`registry`] (C3) — CRQ lookup: which CRQ (if any) owns a namespace
//! - [`calculators`] (C4-C7) — per-resource-family usage calculators, and
//!   [`calculators::router`] (C8), which dispatches a resource name to the
//!   right one
//! - [`conflict`] (C9) — rejects CRQs or namespace relabels that would give
//!   a namespace more than one owning CRQ
//! - [`kernel`] (C10) — the admission entry points: resolve the owning CRQ,
//!   read its cap, aggregate usage across every selected namespace, compare,
//!   admit or deny
//!
//! [`model`] holds the orchestrator object types the above operate on, and
//! [`orchestrator`] defines the [`orchestrator::OrchestratorClient`] trait
//! the caller implements to supply them.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod calculators;
pub mod conflict;
pub mod error;
pub mod kernel;
pub mod model;
pub mod orchestrator;
pub mod quantity;
pub mod registry;
pub mod resource;
pub mod selector;

pub use error::{QuotaError, Result};
pub use kernel::{AdmissionDecision, Operation};
pub use quantity::Quantity;
pub use resource::ResourceName;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
