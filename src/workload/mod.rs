//! Kubernetes resource types emitted by the compiler
//!
//! This module defines the subset of the Kubernetes API the compiler produces:
//! - Service: installation-wide and per-replica network endpoints
//! - ConfigMap: shared and per-replica configuration bundles
//! - StatefulSet: one single-replica workload per deployment
//!
//! Containers, volumes and claim specs double as the payload of named
//! templates in the `ClickHouseInstallation` resource. They are the upstream
//! `k8s-openapi` types so templates pass through without losing fields.
//!
//! For generation, use [`crate::compiler::ChiCompiler`].

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ConfigMapVolumeSource;
use serde::{Deserialize, Serialize};

use crate::naming::NamedPort;
use crate::{LABEL_APP, LABEL_CHI, LABEL_CHOP, LABEL_CHOP_VALUE};

pub use k8s_openapi::api::core::v1::{
    Container, ContainerPort, PersistentVolumeClaimSpec, Volume, VolumeMount,
};

// =============================================================================
// Metadata
// =============================================================================

/// Standard Kubernetes ObjectMeta
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Resource name
    pub name: String,
    /// Resource namespace
    pub namespace: String,
    /// Labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Annotations
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    /// Create metadata carrying the ownership labels of an installation
    ///
    /// The reconciler uses these two labels to find and garbage-collect
    /// objects of an installation.
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        chi_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            labels: installation_labels(chi_name),
            annotations: BTreeMap::new(),
        }
    }

    /// Add a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}

/// Ownership labels attached to every generated object
pub fn installation_labels(chi_name: impl Into<String>) -> BTreeMap<String, String> {
    BTreeMap::from([
        (LABEL_CHOP.to_string(), LABEL_CHOP_VALUE.to_string()),
        (LABEL_CHI.to_string(), chi_name.into()),
    ])
}

/// Label selector
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    /// Match labels
    pub match_labels: BTreeMap<String, String>,
}

impl LabelSelector {
    /// Select the pod of one StatefulSet by its app label
    pub fn app(stateful_set_name: impl Into<String>) -> Self {
        Self {
            match_labels: BTreeMap::from([(LABEL_APP.to_string(), stateful_set_name.into())]),
        }
    }
}

// =============================================================================
// ConfigMap
// =============================================================================

/// Kubernetes ConfigMap
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMap {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// String data, keyed by config filename
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
}

impl ConfigMap {
    /// Create a new ConfigMap
    pub fn new(metadata: ObjectMeta) -> Self {
        Self {
            api_version: "v1".to_string(),
            kind: "ConfigMap".to_string(),
            metadata,
            data: BTreeMap::new(),
        }
    }

    /// Add a data entry
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

// =============================================================================
// Service
// =============================================================================

/// Kubernetes Service
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Spec
    pub spec: ServiceSpec,
}

/// Service spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    /// Selector
    pub selector: BTreeMap<String, String>,
    /// Ports
    pub ports: Vec<ServicePort>,
    /// Cluster IP ("None" for headless)
    #[serde(rename = "clusterIP", default, skip_serializing_if = "Option::is_none")]
    pub cluster_ip: Option<String>,
    /// Service type
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
}

/// Service port
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServicePort {
    /// Port name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Port number
    pub port: u16,
    /// Target port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_port: Option<u16>,
    /// Protocol
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

impl From<NamedPort> for ServicePort {
    fn from(port: NamedPort) -> Self {
        Self {
            name: Some(port.name.to_string()),
            port: port.number,
            target_port: None,
            protocol: None,
        }
    }
}

// =============================================================================
// StatefulSet
// =============================================================================

/// Kubernetes StatefulSet
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatefulSet {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Spec
    pub spec: StatefulSetSpec,
}

/// StatefulSet spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatefulSetSpec {
    /// Number of replicas
    pub replicas: u32,
    /// Governing Service
    pub service_name: String,
    /// Label selector
    pub selector: LabelSelector,
    /// Pod template
    pub template: PodTemplateSpec,
    /// Persistent volume claim templates
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_claim_templates: Vec<PersistentVolumeClaim>,
}

/// Pod template spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodTemplateSpec {
    /// Pod metadata
    pub metadata: PodMeta,
    /// Pod spec
    pub spec: PodSpec,
}

/// Pod metadata (subset of ObjectMeta)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodMeta {
    /// Pod name
    pub name: String,
    /// Labels
    pub labels: BTreeMap<String, String>,
}

/// Pod spec
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    /// Containers
    pub containers: Vec<Container>,
    /// Volumes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
}

// =============================================================================
// Pod payload
// =============================================================================
// Containers, volumes and claim specs come verbatim from user templates, so
// they use the full upstream API types rather than a subset.

/// Mount a single key of a ConfigMap volume as a file
pub fn file_mount(
    name: impl Into<String>,
    mount_path: impl Into<String>,
    sub_path: impl Into<String>,
) -> VolumeMount {
    VolumeMount {
        name: name.into(),
        mount_path: mount_path.into(),
        sub_path: Some(sub_path.into()),
        ..Default::default()
    }
}

/// Mount a whole volume at a directory
pub fn dir_mount(name: impl Into<String>, mount_path: impl Into<String>) -> VolumeMount {
    VolumeMount {
        name: name.into(),
        mount_path: mount_path.into(),
        ..Default::default()
    }
}

/// Volume backed by a ConfigMap of the same name
pub fn config_map_volume(name: impl Into<String>) -> Volume {
    let name = name.into();
    Volume {
        config_map: Some(ConfigMapVolumeSource {
            name: name.clone(),
            ..Default::default()
        }),
        name,
        ..Default::default()
    }
}

impl From<NamedPort> for ContainerPort {
    fn from(port: NamedPort) -> Self {
        Self {
            name: Some(port.name.to_string()),
            container_port: i32::from(port.number),
            ..Default::default()
        }
    }
}

// =============================================================================
// PersistentVolumeClaim
// =============================================================================

/// PersistentVolumeClaim as used in `volumeClaimTemplates`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeClaim {
    /// Claim metadata
    pub metadata: ClaimMeta,
    /// Claim spec, copied from the template
    pub spec: PersistentVolumeClaimSpec,
}

/// Metadata of a claim template
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClaimMeta {
    /// Claim name, also the volume name containers mount
    pub name: String,
    /// Labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}
