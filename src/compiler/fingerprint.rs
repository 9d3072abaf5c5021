//! Template-combination fingerprints and the per-deployment fingerprint index

use std::collections::BTreeMap;
use std::fmt;

use aws_lc_rs::digest::{digest, SHA256};
use tracing::warn;

use crate::crd::DeploymentSpec;

use super::templates::TemplateIndex;
use super::topology::{DeploymentId, Topology};

/// Hex characters of a fingerprint embedded in deployment identifiers
pub const SHORT_FINGERPRINT_LEN: usize = 6;

/// Identifies one combination of (pod template, volume claim template)
///
/// Deployments with equal fingerprints selected the same templates and may
/// share everything derived from them.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint of a template selection
    ///
    /// SHA-256 over a length-prefixed encoding of both names, so that an
    /// unset name and an empty name hash differently.
    pub fn of(selection: &DeploymentSpec) -> Self {
        let mut data = String::new();
        for name in [&selection.pod_template, &selection.volume_claim_template] {
            match name {
                Some(name) => {
                    data.push_str(&name.len().to_string());
                    data.push(':');
                    data.push_str(name);
                }
                None => data.push('-'),
            }
            data.push(';');
        }

        let hash = digest(&SHA256, data.as_bytes());
        Self(
            hash.as_ref()
                .iter()
                .map(|b| format!("{:02x}", b))
                .collect(),
        )
    }

    /// Full lowercase hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix used inside deployment identifiers
    pub fn short(&self) -> &str {
        &self.0[..SHORT_FINGERPRINT_LEN]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Templates a fingerprint resolves to
///
/// Names are only kept when the template library actually declares them;
/// `None` selects the built-in default.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TemplateSelection {
    /// Pod template to copy containers and volumes from
    pub pod_template: Option<String>,
    /// Claim template to attach
    pub volume_claim_template: Option<String>,
}

/// Maps each deployment to the template combination selected for it
#[derive(Clone, Debug, Default)]
pub struct FingerprintIndex {
    by_deployment: BTreeMap<DeploymentId, Fingerprint>,
    selections: BTreeMap<Fingerprint, TemplateSelection>,
}

impl FingerprintIndex {
    /// Index every walked replica, resolving template names against the library
    ///
    /// A name the library does not declare degrades to the default with a
    /// warning rather than failing the compile.
    pub fn build(topology: &Topology, templates: &TemplateIndex) -> Self {
        let mut index = Self::default();

        for (_, _, replica) in topology.replicas() {
            let fingerprint = replica.fingerprint.clone();
            if !index.selections.contains_key(&fingerprint) {
                let selection = resolve_selection(&replica.deployment, templates, &replica.id);
                index.selections.insert(fingerprint.clone(), selection);
            }
            index.by_deployment.insert(replica.id.clone(), fingerprint);
        }

        index
    }

    /// Fingerprint of a deployment
    pub fn fingerprint(&self, id: &DeploymentId) -> Option<&Fingerprint> {
        self.by_deployment.get(id)
    }

    /// Resolved templates of a deployment
    pub fn selection(&self, id: &DeploymentId) -> Option<&TemplateSelection> {
        self.fingerprint(id)
            .and_then(|fingerprint| self.selections.get(fingerprint))
    }

    /// Indexed deployments in ascending order
    pub fn deployment_ids(&self) -> impl Iterator<Item = &DeploymentId> {
        self.by_deployment.keys()
    }

    /// Number of indexed deployments
    pub fn len(&self) -> usize {
        self.by_deployment.len()
    }

    /// True if no deployment was indexed
    pub fn is_empty(&self) -> bool {
        self.by_deployment.is_empty()
    }

    /// Number of distinct template combinations
    pub fn distinct_fingerprints(&self) -> usize {
        self.selections.len()
    }
}

fn resolve_selection(
    deployment: &DeploymentSpec,
    templates: &TemplateIndex,
    id: &DeploymentId,
) -> TemplateSelection {
    let pod_template = deployment.pod_template.as_ref().and_then(|name| {
        if templates.pods.get(name).is_some() {
            Some(name.clone())
        } else {
            warn!(
                deployment = %id,
                template = %name,
                "pod template not declared, using default container"
            );
            None
        }
    });

    let volume_claim_template = deployment.volume_claim_template.as_ref().and_then(|name| {
        if templates.volume_claims.get(name).is_some() {
            Some(name.clone())
        } else {
            warn!(
                deployment = %id,
                template = %name,
                "volume claim template not declared, using no claim"
            );
            None
        }
    });

    TemplateSelection {
        pod_template,
        volume_claim_template,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{ChiCluster, ChiLayout, ClickHouseInstallationSpec, PodTemplate};

    fn selection(pod: Option<&str>, vc: Option<&str>) -> DeploymentSpec {
        DeploymentSpec {
            pod_template: pod.map(str::to_string),
            volume_claim_template: vc.map(str::to_string),
        }
    }

    fn spec_with_cluster(deployment: DeploymentSpec) -> ClickHouseInstallationSpec {
        let mut spec = ClickHouseInstallationSpec::default();
        spec.configuration.clusters.push(ChiCluster {
            name: "events".to_string(),
            layout: ChiLayout {
                shards_count: Some(2),
                replicas_count: Some(2),
                ..Default::default()
            },
            deployment,
        });
        spec
    }

    #[test]
    fn story_fingerprint_is_stable_hex() {
        let a = Fingerprint::of(&selection(Some("big"), Some("data")));
        let b = Fingerprint::of(&selection(Some("big"), Some("data")));

        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(a.short().len(), SHORT_FINGERPRINT_LEN);
        assert!(a.as_str().starts_with(a.short()));
    }

    #[test]
    fn story_fingerprint_distinguishes_combinations() {
        let none = Fingerprint::of(&selection(None, None));
        let empty = Fingerprint::of(&selection(Some(""), None));
        let swapped_a = Fingerprint::of(&selection(Some("x"), None));
        let swapped_b = Fingerprint::of(&selection(None, Some("x")));

        assert_ne!(none, empty);
        assert_ne!(swapped_a, swapped_b);
    }

    /// Story: all replicas of a uniform cluster share one fingerprint
    #[test]
    fn story_uniform_cluster_shares_one_selection() {
        let mut spec = spec_with_cluster(selection(Some("big"), None));
        spec.templates.pod_templates.push(PodTemplate {
            name: "big".to_string(),
            containers: vec![],
            volumes: vec![],
        });

        let topology = Topology::walk(&spec);
        let templates = TemplateIndex::build(&spec.templates);
        let index = FingerprintIndex::build(&topology, &templates);

        assert_eq!(index.len(), 4);
        assert_eq!(index.distinct_fingerprints(), 1);
        for id in index.deployment_ids() {
            let selected = index.selection(id).unwrap();
            assert_eq!(selected.pod_template.as_deref(), Some("big"));
            assert_eq!(selected.volume_claim_template, None);
        }
    }

    /// Story: a template name the library lacks degrades to the default
    #[test]
    fn story_undeclared_template_resolves_to_default() {
        let spec = spec_with_cluster(selection(Some("missing"), Some("also-missing")));

        let topology = Topology::walk(&spec);
        let templates = TemplateIndex::build(&spec.templates);
        let index = FingerprintIndex::build(&topology, &templates);

        let id = index.deployment_ids().next().unwrap().clone();
        assert_eq!(index.selection(&id), Some(&TemplateSelection::default()));
    }

    #[test]
    fn story_unknown_deployment_has_no_selection() {
        let index = FingerprintIndex::default();
        assert!(index.is_empty());
        let id = Topology::walk(&spec_with_cluster(DeploymentSpec::default()))
            .deployment_ids()
            .remove(0);
        assert!(index.fingerprint(&id).is_none());
        assert!(index.selection(&id).is_none());
    }
}
