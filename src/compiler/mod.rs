//! Installation compiler
//!
//! This module compiles a ClickHouseInstallation into the Kubernetes objects
//! that run it.
//!
//! # Architecture
//!
//! Compilation is a single synchronous pass:
//! 1. [`Topology`] walks clusters, shards and replicas and assigns every
//!    replica a [`DeploymentId`]
//! 2. [`TemplateIndex`] indexes the named pod and volume-claim templates
//! 3. [`FingerprintIndex`] resolves each deployment's template selection
//! 4. [`crate::config`] renders the shared and per-deployment config fragments
//! 5. The builders ([`ServiceBuilder`], [`ConfigMapBuilder`],
//!    [`StatefulSetBuilder`]) turn the immutable [`CompileContext`] into objects
//!
//! # Usage
//!
//! ```text
//! let output = ChiCompiler::new(&chi).with_namespace("analytics").compile()?;
//! // output.services, output.config_maps, output.stateful_sets
//! ```
//!
//! # Determinism
//!
//! Every keyed intermediate is a `BTreeMap` and deployments are emitted in
//! [`DeploymentId`] order, so an unchanged installation always compiles to
//! the same object list.

mod config_map;
mod context;
mod fingerprint;
mod service;
mod stateful_set;
mod templates;
mod topology;

use serde::Serialize;
use tracing::info;

use crate::crd::ClickHouseInstallation;
use crate::error::Error;
use crate::naming::DEFAULT_IMAGE;
use crate::workload::{ConfigMap, Service, StatefulSet};
use crate::Result;

pub use config_map::ConfigMapBuilder;
pub use context::CompileContext;
pub use fingerprint::{Fingerprint, FingerprintIndex, TemplateSelection, SHORT_FINGERPRINT_LEN};
pub use service::ServiceBuilder;
pub use stateful_set::StatefulSetBuilder;
pub use templates::{
    ClaimName, PodTemplateData, PodTemplateIndex, TemplateIndex, VolumeClaimTemplateData,
    VolumeClaimTemplateIndex, USE_DEFAULT_NAME_PLACEHOLDER,
};
pub use topology::{
    ClusterTopology, DeploymentId, MacrosData, ReplicaTopology, ShardDescription, ShardTopology,
    Topology,
};

/// Objects generated for one installation
#[derive(Clone, Debug, Default)]
pub struct GeneratedObjects {
    /// Installation Service, then one per deployment
    pub services: Vec<Service>,
    /// Shared ConfigMap, then one macros ConfigMap per deployment
    pub config_maps: Vec<ConfigMap>,
    /// One StatefulSet per deployment
    pub stateful_sets: Vec<StatefulSet>,
    /// Every deployment, sorted
    pub deployment_ids: Vec<DeploymentId>,
}

impl GeneratedObjects {
    /// Total count of generated objects
    pub fn resource_count(&self) -> usize {
        self.services.len() + self.config_maps.len() + self.stateful_sets.len()
    }

    /// Check if any objects were generated
    pub fn is_empty(&self) -> bool {
        self.resource_count() == 0
    }

    /// Every object as a multi-document YAML stream
    ///
    /// Services come first, then ConfigMaps, then StatefulSets, so that
    /// applying the stream in order creates what each pod mounts before the
    /// pod itself.
    pub fn to_yaml(&self) -> Result<String> {
        let mut documents = Vec::with_capacity(self.resource_count());
        push_documents(&mut documents, &self.services)?;
        push_documents(&mut documents, &self.config_maps)?;
        push_documents(&mut documents, &self.stateful_sets)?;
        Ok(documents.join("---\n"))
    }
}

fn push_documents<T: Serialize>(documents: &mut Vec<String>, objects: &[T]) -> Result<()> {
    for object in objects {
        let document =
            serde_yaml::to_string(object).map_err(|e| Error::serialization(e.to_string()))?;
        documents.push(document);
    }
    Ok(())
}

/// Compiles a ClickHouseInstallation into Kubernetes objects
pub struct ChiCompiler<'a> {
    chi: &'a ClickHouseInstallation,
    namespace: Option<String>,
    default_image: String,
}

impl<'a> ChiCompiler<'a> {
    /// Create a compiler for an installation
    pub fn new(chi: &'a ClickHouseInstallation) -> Self {
        Self {
            chi,
            namespace: None,
            default_image: DEFAULT_IMAGE.to_string(),
        }
    }

    /// Generate into `namespace` instead of the resource's own namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Image of the container synthesized for deployments without a pod template
    pub fn with_default_image(mut self, image: impl Into<String>) -> Self {
        self.default_image = image.into();
        self
    }

    /// Namespace objects will be generated into
    ///
    /// Explicit override, then `metadata.namespace`, then `default`.
    pub fn namespace(&self) -> String {
        self.namespace
            .clone()
            .unwrap_or_else(|| self.chi.namespace_or_default())
    }

    /// Build the compile context without generating objects
    pub fn context(&self) -> Result<CompileContext> {
        let name = self
            .chi
            .metadata
            .name
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::validation("ClickHouseInstallation must have metadata.name"))?;
        self.chi.spec.validate()?;

        Ok(CompileContext::new(
            name,
            self.namespace(),
            &self.default_image,
            &self.chi.spec,
        ))
    }

    /// Compile the installation
    ///
    /// Generates:
    /// - Services: `chi-{installation}` plus `chi-service-{deployment}` each
    /// - ConfigMaps: `chi-{installation}-common-configd` plus
    ///   `chi-{installation}-deploy-confd-{deployment}` each
    /// - StatefulSets: `chi-{deployment}` each
    pub fn compile(&self) -> Result<GeneratedObjects> {
        let ctx = self.context()?;

        let services = ServiceBuilder::new(&ctx).build();
        let config_maps = ConfigMapBuilder::new(&ctx).build()?;
        let stateful_sets = StatefulSetBuilder::new(&ctx).build()?;

        info!(
            chi = %ctx.chi_name,
            namespace = %ctx.namespace,
            deployments = ctx.deployment_ids.len(),
            services = services.len(),
            config_maps = config_maps.len(),
            stateful_sets = stateful_sets.len(),
            "compiled installation"
        );

        Ok(GeneratedObjects {
            services,
            config_maps,
            stateful_sets,
            deployment_ids: ctx.deployment_ids,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
