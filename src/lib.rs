//! chop - ClickHouseInstallation manifest compiler
//!
//! Compiles a declarative ClickHouseInstallation (clusters, shards, replicas
//! and reusable templates) into the Kubernetes objects that run it: one
//! headless Service, one macros ConfigMap and one single-pod StatefulSet per
//! replica, plus an installation-wide Service and a shared ConfigMap.
//!
//! # Architecture
//!
//! Compilation is a pure, synchronous transformation. Names are derived from
//! topology coordinates, so compiling an unchanged installation always yields
//! an identical object set. Applying the objects to a cluster is left to the
//! caller.
//!
//! # Modules
//!
//! - [`crd`] - The ClickHouseInstallation Custom Resource Definition
//! - [`compiler`] - Topology walker, template resolver and manifest builders
//! - [`config`] - XML config fragments mounted into every replica
//! - [`workload`] - Kubernetes object types (Service, ConfigMap, StatefulSet)
//! - [`naming`] - Resource names, hostnames and config paths
//! - [`error`] - Error types for the compiler

#![deny(missing_docs)]

pub mod compiler;
pub mod config;
pub mod crd;
pub mod error;
pub mod naming;
pub mod workload;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Labels
// =============================================================================
// Every generated object carries the generated-by and installation labels so
// a reconciler can find and garbage-collect the objects of an installation.

/// Marks objects generated by this compiler
pub const LABEL_CHOP: &str = "clickhouse.altinity.com/chop";

/// Value of [`LABEL_CHOP`]
pub const LABEL_CHOP_VALUE: &str = "chop";

/// Name of the installation an object belongs to
pub const LABEL_CHI: &str = "clickhouse.altinity.com/chi";

/// StatefulSet a pod belongs to; per-replica Services select on it
pub const LABEL_APP: &str = "clickhouse.altinity.com/app";
