//! Template resolver
//!
//! Indexes the named pod and volume-claim templates of an installation so the
//! StatefulSet builder can look them up by name.

use std::collections::BTreeMap;

use tracing::warn;

use crate::crd::{ChiTemplates, PodTemplate, VolumeClaimTemplate};
use crate::naming::DEFAULT_DATA_VOLUME_NAME;
use crate::workload::{ClaimMeta, Container, PersistentVolumeClaim, Volume};

/// Reserved claim name selecting the default data volume
pub const USE_DEFAULT_NAME_PLACEHOLDER: &str = "USE_DEFAULT_NAME";

/// How a claim template names its volume
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClaimName {
    /// Volume is named `clickhouse-data` and mounted at the data directory
    UseDefault,
    /// Volume keeps its declared name; containers mount it themselves
    Explicit(String),
}

impl ClaimName {
    /// Resolve a declared claim name
    pub fn resolve(declared: Option<&str>) -> Self {
        match declared {
            None | Some(USE_DEFAULT_NAME_PLACEHOLDER) => Self::UseDefault,
            Some(name) => Self::Explicit(name.to_string()),
        }
    }

    /// Name of the volume the claim produces
    pub fn volume_name(&self) -> &str {
        match self {
            Self::UseDefault => DEFAULT_DATA_VOLUME_NAME,
            Self::Explicit(name) => name,
        }
    }
}

/// Containers and volumes of a pod template
#[derive(Clone, Debug, PartialEq)]
pub struct PodTemplateData {
    /// Containers, copied into the pod
    pub containers: Vec<Container>,
    /// Volumes, copied into the pod
    pub volumes: Vec<Volume>,
}

/// A claim template ready to attach to a StatefulSet
#[derive(Clone, Debug, PartialEq)]
pub struct VolumeClaimTemplateData {
    /// Claim with its resolved name
    pub claim: PersistentVolumeClaim,
    /// Name resolution of the declared claim
    pub claim_name: ClaimName,
}

impl VolumeClaimTemplateData {
    /// True if the claim backs the default data directory
    pub fn use_default_name(&self) -> bool {
        self.claim_name == ClaimName::UseDefault
    }
}

impl From<&VolumeClaimTemplate> for VolumeClaimTemplateData {
    fn from(template: &VolumeClaimTemplate) -> Self {
        let declared = &template.persistent_volume_claim;
        let claim_name = ClaimName::resolve(declared.metadata.name.as_deref());
        Self {
            claim: PersistentVolumeClaim {
                metadata: ClaimMeta {
                    name: claim_name.volume_name().to_string(),
                    labels: declared.metadata.labels.clone(),
                },
                spec: declared.spec.clone(),
            },
            claim_name,
        }
    }
}

impl From<&PodTemplate> for PodTemplateData {
    fn from(template: &PodTemplate) -> Self {
        Self {
            containers: template.containers.clone(),
            volumes: template.volumes.clone(),
        }
    }
}

/// Pod templates by name
#[derive(Clone, Debug, Default)]
pub struct PodTemplateIndex(BTreeMap<String, PodTemplateData>);

impl PodTemplateIndex {
    /// Look up a template
    pub fn get(&self, name: &str) -> Option<&PodTemplateData> {
        self.0.get(name)
    }

    /// Number of templates
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if there are no templates
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Volume claim templates by name
#[derive(Clone, Debug, Default)]
pub struct VolumeClaimTemplateIndex(BTreeMap<String, VolumeClaimTemplateData>);

impl VolumeClaimTemplateIndex {
    /// Look up a template
    pub fn get(&self, name: &str) -> Option<&VolumeClaimTemplateData> {
        self.0.get(name)
    }

    /// Number of templates
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if there are no templates
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Both template indices of an installation
#[derive(Clone, Debug, Default)]
pub struct TemplateIndex {
    /// Pod templates
    pub pods: PodTemplateIndex,
    /// Volume claim templates
    pub volume_claims: VolumeClaimTemplateIndex,
}

impl TemplateIndex {
    /// Index the template library. A later declaration replaces an earlier
    /// one with the same name.
    pub fn build(templates: &ChiTemplates) -> Self {
        let mut pods = BTreeMap::new();
        for template in &templates.pod_templates {
            if pods
                .insert(template.name.clone(), PodTemplateData::from(template))
                .is_some()
            {
                warn!(template = %template.name, "duplicate pod template, last declaration wins");
            }
        }

        let mut volume_claims = BTreeMap::new();
        for template in &templates.volume_claim_templates {
            if volume_claims
                .insert(template.name.clone(), VolumeClaimTemplateData::from(template))
                .is_some()
            {
                warn!(
                    template = %template.name,
                    "duplicate volume claim template, last declaration wins"
                );
            }
        }

        Self {
            pods: PodTemplateIndex(pods),
            volume_claims: VolumeClaimTemplateIndex(volume_claims),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{ClaimTemplate, ClaimTemplateMeta};
    use crate::workload::PersistentVolumeClaimSpec;

    fn claim_template(name: &str, claim_name: Option<&str>) -> VolumeClaimTemplate {
        VolumeClaimTemplate {
            name: name.to_string(),
            persistent_volume_claim: ClaimTemplate {
                metadata: ClaimTemplateMeta {
                    name: claim_name.map(str::to_string),
                    labels: BTreeMap::new(),
                },
                spec: PersistentVolumeClaimSpec {
                    access_modes: Some(vec!["ReadWriteOnce".to_string()]),
                    ..Default::default()
                },
            },
        }
    }

    fn pod_template(name: &str, image: &str) -> PodTemplate {
        PodTemplate {
            name: name.to_string(),
            containers: vec![Container {
                name: "clickhouse".to_string(),
                image: Some(image.to_string()),
                ..Default::default()
            }],
            volumes: vec![],
        }
    }

    mod claim_name {
        use super::*;

        #[test]
        fn test_placeholder_and_omitted_use_default() {
            assert_eq!(ClaimName::resolve(Some("USE_DEFAULT_NAME")), ClaimName::UseDefault);
            assert_eq!(ClaimName::resolve(None), ClaimName::UseDefault);
            assert_eq!(ClaimName::UseDefault.volume_name(), "clickhouse-data");
        }

        #[test]
        fn test_explicit_name_is_kept() {
            let name = ClaimName::resolve(Some("ssd"));
            assert_eq!(name, ClaimName::Explicit("ssd".to_string()));
            assert_eq!(name.volume_name(), "ssd");
        }
    }

    /// Story: placeholder claims are renamed to the default data volume
    #[test]
    fn story_default_claim_is_renamed() {
        let templates = ChiTemplates {
            pod_templates: vec![],
            volume_claim_templates: vec![
                claim_template("default-storage", Some(USE_DEFAULT_NAME_PLACEHOLDER)),
                claim_template("fast", Some("fast-data")),
            ],
        };
        let index = TemplateIndex::build(&templates);

        let default = index.volume_claims.get("default-storage").unwrap();
        assert!(default.use_default_name());
        assert_eq!(default.claim.metadata.name, DEFAULT_DATA_VOLUME_NAME);
        assert_eq!(
            default.claim.spec.access_modes,
            Some(vec!["ReadWriteOnce".to_string()])
        );

        let fast = index.volume_claims.get("fast").unwrap();
        assert!(!fast.use_default_name());
        assert_eq!(fast.claim.metadata.name, "fast-data");
    }

    #[test]
    fn story_lookup_of_unknown_name_is_none() {
        let index = TemplateIndex::build(&ChiTemplates::default());
        assert!(index.pods.is_empty());
        assert!(index.volume_claims.is_empty());
        assert!(index.pods.get("anything").is_none());
        assert!(index.volume_claims.get("anything").is_none());
    }

    /// Story: a repeated name keeps the last declaration
    #[test]
    fn story_duplicate_names_last_wins() {
        let templates = ChiTemplates {
            pod_templates: vec![
                pod_template("ch", "yandex/clickhouse-server:18.16.1"),
                pod_template("ch", "yandex/clickhouse-server:18.16.2"),
            ],
            volume_claim_templates: vec![],
        };
        let index = TemplateIndex::build(&templates);

        assert_eq!(index.pods.len(), 1);
        assert_eq!(
            index.pods.get("ch").unwrap().containers[0].image.as_deref(),
            Some("yandex/clickhouse-server:18.16.2")
        );
    }
}
