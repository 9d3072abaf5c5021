//! Supporting types for the ClickHouseInstallation CRD

use std::collections::BTreeMap;
use std::fmt;

use schemars::gen::SchemaGenerator;
use schemars::schema::{ArrayValidation, InstanceType, Schema, SchemaObject};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::workload::{Container, PersistentVolumeClaimSpec, Volume};

// =============================================================================
// Deployment selection
// =============================================================================

/// Template selection for a replica
///
/// Can be set at installation defaults, cluster, shard and replica level.
/// A field set at a deeper level overrides the same field above it.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSpec {
    /// Name of a pod template from `spec.templates.podTemplates`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_template: Option<String>,

    /// Name of a claim template from `spec.templates.volumeClaimTemplates`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_claim_template: Option<String>,
}

impl DeploymentSpec {
    /// Returns this selection with unset fields taken from `parent`
    pub fn merged_over(&self, parent: &DeploymentSpec) -> DeploymentSpec {
        DeploymentSpec {
            pod_template: self
                .pod_template
                .clone()
                .or_else(|| parent.pod_template.clone()),
            volume_claim_template: self
                .volume_claim_template
                .clone()
                .or_else(|| parent.volume_claim_template.clone()),
        }
    }
}

/// Installation-wide defaults
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChiDefaults {
    /// Address replicas by FQDN in `remote_servers.xml` instead of Service name
    #[serde(rename = "replicasUseFQDN", default)]
    pub replicas_use_fqdn: bool,

    /// Deployment every replica starts from
    #[serde(default)]
    pub deployment: DeploymentSpec,
}

// =============================================================================
// Topology
// =============================================================================

/// Cluster layout kind
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[non_exhaustive]
pub enum LayoutType {
    /// `shardsCount` x `replicasCount` uniform replicas
    #[default]
    Standard,
    /// Explicitly listed shards and replicas
    Advanced,
}

/// A logical cluster
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChiCluster {
    /// Cluster name, used as the element name in `remote_servers.xml`
    pub name: String,

    /// Shard/replica layout
    #[serde(default)]
    pub layout: ChiLayout,

    /// Deployment applied to every replica of the cluster
    #[serde(default)]
    pub deployment: DeploymentSpec,
}

/// Shard/replica layout of a cluster
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChiLayout {
    /// Layout kind
    #[serde(rename = "type", default)]
    pub type_: LayoutType,

    /// Number of shards (Standard layout, default 1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shards_count: Option<u32>,

    /// Replicas per shard (Standard layout, default for Advanced shards)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas_count: Option<u32>,

    /// Explicit shards (Advanced layout)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shards: Vec<ChiShard>,
}

/// An explicitly declared shard
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChiShard {
    /// Shard weight for distributed inserts (default 1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,

    /// Write to one replica and let replication do the rest (default true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_replication: Option<bool>,

    /// Deployment applied to every replica of the shard
    #[serde(default)]
    pub deployment: DeploymentSpec,

    /// Number of default replicas when `replicas` is empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas_count: Option<u32>,

    /// Explicit replicas
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replicas: Vec<ChiReplica>,
}

/// An explicitly declared replica
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChiReplica {
    /// Client port advertised in `remote_servers.xml` (default 9000)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Deployment of this replica
    #[serde(default)]
    pub deployment: DeploymentSpec,
}

// =============================================================================
// Configuration
// =============================================================================

/// Server configuration shared by all replicas
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChiConfiguration {
    /// Coordination service
    #[serde(default)]
    pub zookeeper: ZookeeperConfig,

    /// User accounts, keyed by slash-separated path (`alice/password`)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub users: Settings,

    /// Settings profiles, keyed by path (`default/max_memory_usage`)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub profiles: Settings,

    /// Quotas, keyed by path (`default/interval/duration`)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub quotas: Settings,

    /// Global server settings, keyed by path
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub settings: Settings,

    /// Logical clusters
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clusters: Vec<ChiCluster>,
}

/// Coordination service connection
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct ZookeeperConfig {
    /// Ensemble members
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<ZookeeperNode>,
}

/// One coordination service member
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct ZookeeperNode {
    /// Hostname
    pub host: String,
    /// Client port (default 2181)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// Path-keyed configuration values
pub type Settings = BTreeMap<String, Setting>;

/// A configuration value
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(untagged)]
pub enum Setting {
    /// `true` / `false`
    Bool(bool),
    /// Integer value
    Integer(i64),
    /// Integer above `i64::MAX`
    Unsigned(u64),
    /// Floating point value
    Float(f64),
    /// String value
    Text(String),
    /// Repeated element, e.g. `networks/ip`
    List(Vec<String>),
}

impl Setting {
    /// Values in element order; scalars yield one value
    pub fn values(&self) -> Vec<String> {
        match self {
            Self::List(items) => items.clone(),
            scalar => vec![scalar.to_string()],
        }
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Unsigned(u) => write!(f, "{u}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::List(items) => write!(f, "{}", items.join(",")),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Library of named templates
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChiTemplates {
    /// Named pod templates
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pod_templates: Vec<PodTemplate>,

    /// Named persistent volume claim templates
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_claim_templates: Vec<VolumeClaimTemplate>,
}

/// Containers and volumes replacing the default container
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct PodTemplate {
    /// Template name
    pub name: String,

    /// Containers, copied verbatim into the pod
    #[serde(default)]
    #[schemars(schema_with = "raw_object_list_schema")]
    pub containers: Vec<Container>,

    /// Volumes, copied verbatim into the pod
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[schemars(schema_with = "raw_object_list_schema")]
    pub volumes: Vec<Volume>,
}

/// Persistent storage request attached to a StatefulSet
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct VolumeClaimTemplate {
    /// Template name
    pub name: String,

    /// The claim
    #[serde(rename = "template")]
    pub persistent_volume_claim: ClaimTemplate,
}

/// Declared claim
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct ClaimTemplate {
    /// Claim metadata
    #[serde(default)]
    pub metadata: ClaimTemplateMeta,

    /// Claim spec
    #[serde(default)]
    #[schemars(schema_with = "raw_object_schema")]
    pub spec: PersistentVolumeClaimSpec,
}

/// Declared claim metadata
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct ClaimTemplateMeta {
    /// Claim name; `USE_DEFAULT_NAME` or unset selects the default data volume
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

/// Schema of an embedded Kubernetes object the API server stores as given
pub fn raw_object_schema(_: &mut SchemaGenerator) -> Schema {
    let mut schema = SchemaObject {
        instance_type: Some(InstanceType::Object.into()),
        ..Default::default()
    };
    schema.extensions.insert(
        "x-kubernetes-preserve-unknown-fields".to_string(),
        serde_json::Value::Bool(true),
    );
    Schema::Object(schema)
}

/// Schema of a list of embedded Kubernetes objects
pub fn raw_object_list_schema(generator: &mut SchemaGenerator) -> Schema {
    Schema::Object(SchemaObject {
        instance_type: Some(InstanceType::Array.into()),
        array: Some(Box::new(ArrayValidation {
            items: Some(raw_object_schema(generator).into()),
            ..Default::default()
        })),
        ..Default::default()
    })
}
