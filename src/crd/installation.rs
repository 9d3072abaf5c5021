//! ClickHouseInstallation Custom Resource Definition
//!
//! A ClickHouseInstallation describes one installation: its clusters, shards
//! and replicas, the configuration shared by every replica, and a library of
//! named pod and volume-claim templates.

use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::is_valid_element_name;
use crate::Error;

use super::types::{ChiConfiguration, ChiDefaults, ChiTemplates};

/// Namespace used when the resource does not carry one
pub const DEFAULT_NAMESPACE: &str = "default";

/// Specification for a ClickHouseInstallation
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "clickhouse.altinity.com",
    version = "v1",
    kind = "ClickHouseInstallation",
    plural = "clickhouseinstallations",
    shortname = "chi",
    namespaced,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ClickHouseInstallationSpec {
    /// Installation-wide defaults
    #[serde(default)]
    pub defaults: ChiDefaults,

    /// Shared configuration and cluster topology
    #[serde(default)]
    pub configuration: ChiConfiguration,

    /// Named templates
    #[serde(default)]
    pub templates: ChiTemplates,
}

impl ClickHouseInstallationSpec {
    /// Check the parts of the spec that end up as config element names
    ///
    /// Cluster names become `remote_servers.xml` elements and part of the
    /// `{cluster}-shard` macro, so they must be usable as XML names.
    pub fn validate(&self) -> crate::Result<()> {
        for cluster in &self.configuration.clusters {
            if !is_valid_element_name(&cluster.name) {
                return Err(Error::validation(format!(
                    "cluster name '{}' must start with a letter or '_' and contain only \
                     letters, digits, '_', '-' and '.'",
                    cluster.name
                )));
            }
        }
        Ok(())
    }

    /// Upper bound on the number of deployments this spec produces
    ///
    /// Sums `shards x replicas` per cluster from the declared counts. Only
    /// used to pre-size collections, so it may overshoot.
    pub fn max_deployment_count(&self) -> usize {
        self.configuration
            .clusters
            .iter()
            .map(|cluster| {
                let layout = &cluster.layout;
                let default_replicas = layout.replicas_count.unwrap_or(1) as usize;
                let standard = layout.shards_count.unwrap_or(1) as usize * default_replicas;
                let advanced: usize = layout
                    .shards
                    .iter()
                    .map(|shard| {
                        shard
                            .replicas
                            .len()
                            .max(shard.replicas_count.map_or(default_replicas, |n| n as usize))
                    })
                    .sum();
                standard.max(advanced)
            })
            .sum()
    }
}

impl ClickHouseInstallation {
    /// Namespace objects are generated into
    pub fn namespace_or_default(&self) -> String {
        self.namespace().unwrap_or_else(|| DEFAULT_NAMESPACE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::types::LayoutType;

    /// Story: User declares a small replicated installation in YAML
    #[test]
    fn story_yaml_manifest_defines_installation() {
        let yaml = r#"
apiVersion: clickhouse.altinity.com/v1
kind: ClickHouseInstallation
metadata:
  name: demo
  namespace: analytics
spec:
  defaults:
    replicasUseFQDN: true
    deployment:
      volumeClaimTemplate: default-storage
  configuration:
    zookeeper:
      nodes:
        - host: zookeeper-0.zookeepers.zoo
          port: 2181
    users:
      test/password: qwerty
    clusters:
      - name: events
        layout:
          shardsCount: 2
          replicasCount: 2
  templates:
    volumeClaimTemplates:
      - name: default-storage
        template:
          metadata:
            name: USE_DEFAULT_NAME
          spec:
            accessModes: [ReadWriteOnce]
"#;
        let chi: ClickHouseInstallation = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(chi.name_any(), "demo");
        assert_eq!(chi.namespace_or_default(), "analytics");
        assert!(chi.spec.defaults.replicas_use_fqdn);
        assert_eq!(chi.spec.configuration.zookeeper.nodes.len(), 1);
        assert_eq!(chi.spec.configuration.clusters[0].layout.type_, LayoutType::Standard);
        assert_eq!(chi.spec.templates.volume_claim_templates.len(), 1);
        assert_eq!(chi.spec.max_deployment_count(), 4);
    }

    #[test]
    fn story_namespace_falls_back_to_default() {
        let chi = ClickHouseInstallation::new("demo", ClickHouseInstallationSpec::default());
        assert_eq!(chi.namespace_or_default(), DEFAULT_NAMESPACE);
        assert_eq!(chi.spec.max_deployment_count(), 0);
    }

    #[test]
    fn story_cluster_names_must_be_element_names() {
        let yaml = r#"
configuration:
  clusters:
    - name: events
    - name: my cluster
"#;
        let spec: ClickHouseInstallationSpec = serde_yaml::from_str(yaml).unwrap();
        match spec.validate() {
            Err(Error::Validation(msg)) => assert!(msg.contains("my cluster")),
            other => panic!("expected Validation, got {other:?}"),
        }

        let spec: ClickHouseInstallationSpec =
            serde_yaml::from_str("configuration: {clusters: [{name: events-2.eu}]}").unwrap();
        assert!(spec.validate().is_ok());
        assert!(ClickHouseInstallationSpec::default().validate().is_ok());
    }

    #[test]
    fn story_spec_survives_yaml_roundtrip() {
        let yaml = r#"
configuration:
  settings:
    compression/case/method: zstd
  clusters:
    - name: c1
      layout:
        type: Advanced
        shards:
          - replicasCount: 2
          - replicas:
              - port: 9001
"#;
        let spec: ClickHouseInstallationSpec = serde_yaml::from_str(yaml).unwrap();
        let rendered = serde_yaml::to_string(&spec).unwrap();
        let parsed: ClickHouseInstallationSpec = serde_yaml::from_str(&rendered).unwrap();

        assert_eq!(spec, parsed, "Spec should survive roundtrip");
        assert_eq!(spec.max_deployment_count(), 3);
    }

    #[test]
    fn story_crd_is_namespaced_with_short_name() {
        use kube::CustomResourceExt;

        let crd = ClickHouseInstallation::crd();
        assert_eq!(
            crd.metadata.name.as_deref(),
            Some("clickhouseinstallations.clickhouse.altinity.com")
        );
        assert_eq!(crd.spec.scope, "Namespaced");
        assert_eq!(crd.spec.names.short_names, Some(vec!["chi".to_string()]));
    }
}
