//! Read-only state shared by the manifest builders

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::{compose_macros, CommonConfigSections};
use crate::crd::ClickHouseInstallationSpec;
use crate::naming::create_config_map_common_name;

use super::fingerprint::FingerprintIndex;
use super::templates::TemplateIndex;
use super::topology::{DeploymentId, Topology};

/// Everything derived from an installation before any object is built
///
/// Built once per compile; builders only borrow it.
#[derive(Debug)]
pub struct CompileContext {
    /// Installation name
    pub chi_name: String,
    /// Namespace objects are generated into
    pub namespace: String,
    /// Image of the synthesized default container
    pub default_image: String,
    /// Walked topology
    pub topology: Topology,
    /// Named templates
    pub templates: TemplateIndex,
    /// Template selection per deployment
    pub fingerprints: FingerprintIndex,
    /// Shared config fragments
    pub common_sections: CommonConfigSections,
    /// Macros fragment per deployment
    pub macros: BTreeMap<DeploymentId, String>,
    /// All deployments, sorted
    pub deployment_ids: Vec<DeploymentId>,
}

impl CompileContext {
    /// Run the walker, resolver, fingerprint index and config composer
    pub fn new(
        chi_name: impl Into<String>,
        namespace: impl Into<String>,
        default_image: impl Into<String>,
        spec: &ClickHouseInstallationSpec,
    ) -> Self {
        let chi_name = chi_name.into();
        let namespace = namespace.into();

        let topology = Topology::walk(spec);
        let templates = TemplateIndex::build(&spec.templates);
        let fingerprints = FingerprintIndex::build(&topology, &templates);
        let common_sections = CommonConfigSections::compose(&chi_name, &namespace, spec, &topology);
        let macros = compose_macros(&chi_name, &topology.macros_data());
        let deployment_ids = topology.deployment_ids();

        debug!(
            chi = %chi_name,
            deployments = deployment_ids.len(),
            fingerprints = fingerprints.distinct_fingerprints(),
            sections = common_sections.len(),
            "compile context ready"
        );

        Self {
            chi_name,
            namespace,
            default_image: default_image.into(),
            topology,
            templates,
            fingerprints,
            common_sections,
            macros,
            deployment_ids,
        }
    }

    /// Name of the shared ConfigMap
    pub fn common_config_map_name(&self) -> String {
        create_config_map_common_name(&self.chi_name)
    }
}
