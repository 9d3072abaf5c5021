//! Topology walker
//!
//! Enumerates every replica of every shard of every cluster and assigns it a
//! [`DeploymentId`] derived from its coordinates and selected templates.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::crd::{ChiCluster, ClickHouseInstallationSpec, DeploymentSpec, LayoutType};
use crate::naming::RPC_PORT;

use super::fingerprint::Fingerprint;

/// Identifies one physical replica
///
/// Format: `{fingerprint prefix}-{cluster}-{shard}-{replica}` with zero-based
/// indices, e.g. `1eb454-0-2-0`. The coordinates make it unique within an
/// installation; the fingerprint prefix makes a template change visible in
/// every derived name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeploymentId(String);

impl DeploymentId {
    fn new(fingerprint: &Fingerprint, cluster: usize, shard: usize, replica: usize) -> Self {
        Self(format!(
            "{}-{}-{}-{}",
            fingerprint.short(),
            cluster,
            shard,
            replica
        ))
    }

    /// String form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeploymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DeploymentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Shard coordinates a replica serves, rendered into its macros
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShardDescription {
    /// Cluster name
    pub cluster_name: String,
    /// Zero-based shard index within the cluster
    pub shard_index: usize,
}

/// Shard descriptions per deployment
pub type MacrosData = BTreeMap<DeploymentId, Vec<ShardDescription>>;

/// A walked cluster
#[derive(Clone, Debug)]
pub struct ClusterTopology {
    /// Cluster name
    pub name: String,
    /// Shards in declaration order
    pub shards: Vec<ShardTopology>,
}

/// A walked shard
#[derive(Clone, Debug)]
pub struct ShardTopology {
    /// Zero-based index within the cluster
    pub index: usize,
    /// Distributed insert weight
    pub weight: u32,
    /// Whether replication is left to the replicated table engine
    pub internal_replication: bool,
    /// Replicas in declaration order
    pub replicas: Vec<ReplicaTopology>,
}

/// A walked replica
#[derive(Clone, Debug)]
pub struct ReplicaTopology {
    /// Deployment identifier
    pub id: DeploymentId,
    /// Zero-based index within the shard
    pub index: usize,
    /// Client port advertised to other replicas
    pub port: u16,
    /// Effective template selection after the defaults cascade
    pub deployment: DeploymentSpec,
    /// Fingerprint of `deployment`
    pub fingerprint: Fingerprint,
}

/// Every replica of an installation, grouped by cluster and shard
#[derive(Clone, Debug, Default)]
pub struct Topology {
    clusters: Vec<ClusterTopology>,
    capacity: usize,
}

/// Shard as produced by either layout, before replicas get identifiers
struct ShardPlan {
    weight: u32,
    internal_replication: bool,
    replicas: Vec<(u16, DeploymentSpec)>,
}

impl Topology {
    /// Walk the installation
    pub fn walk(spec: &ClickHouseInstallationSpec) -> Self {
        let capacity = spec.max_deployment_count();
        let defaults = &spec.defaults.deployment;

        let clusters = spec
            .configuration
            .clusters
            .iter()
            .enumerate()
            .map(|(cluster_index, cluster)| {
                let shards = plan_shards(cluster, defaults)
                    .into_iter()
                    .enumerate()
                    .map(|(shard_index, plan)| ShardTopology {
                        index: shard_index,
                        weight: plan.weight,
                        internal_replication: plan.internal_replication,
                        replicas: plan
                            .replicas
                            .into_iter()
                            .enumerate()
                            .map(|(replica_index, (port, deployment))| {
                                let fingerprint = Fingerprint::of(&deployment);
                                let id = DeploymentId::new(
                                    &fingerprint,
                                    cluster_index,
                                    shard_index,
                                    replica_index,
                                );
                                debug!(
                                    deployment = %id,
                                    cluster = %cluster.name,
                                    shard = shard_index,
                                    replica = replica_index,
                                    "walked replica"
                                );
                                ReplicaTopology {
                                    id,
                                    index: replica_index,
                                    port,
                                    deployment,
                                    fingerprint,
                                }
                            })
                            .collect(),
                    })
                    .collect();

                ClusterTopology {
                    name: cluster.name.clone(),
                    shards,
                }
            })
            .collect();

        Self { clusters, capacity }
    }

    /// Walked clusters in declaration order
    pub fn clusters(&self) -> &[ClusterTopology] {
        &self.clusters
    }

    /// Every replica with its cluster and shard
    pub fn replicas(
        &self,
    ) -> impl Iterator<Item = (&ClusterTopology, &ShardTopology, &ReplicaTopology)> {
        self.clusters.iter().flat_map(|cluster| {
            cluster.shards.iter().flat_map(move |shard| {
                shard
                    .replicas
                    .iter()
                    .map(move |replica| (cluster, shard, replica))
            })
        })
    }

    /// All deployment identifiers, sorted
    pub fn deployment_ids(&self) -> Vec<DeploymentId> {
        let mut ids = Vec::with_capacity(self.capacity);
        ids.extend(self.replicas().map(|(_, _, r)| r.id.clone()));
        ids.sort();
        ids
    }

    /// Upper bound on the number of deployments, for pre-sizing
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Shard descriptions each deployment renders into its macros
    pub fn macros_data(&self) -> MacrosData {
        let mut data = MacrosData::new();
        for (cluster, shard, replica) in self.replicas() {
            data.entry(replica.id.clone())
                .or_default()
                .push(ShardDescription {
                    cluster_name: cluster.name.clone(),
                    shard_index: shard.index,
                });
        }
        data
    }
}

/// Expand a cluster's layout into shards with effective replica deployments
fn plan_shards(cluster: &ChiCluster, defaults: &DeploymentSpec) -> Vec<ShardPlan> {
    let layout = &cluster.layout;
    let cluster_deployment = cluster.deployment.merged_over(defaults);
    let default_replicas = layout.replicas_count.unwrap_or(1);

    match layout.type_ {
        LayoutType::Standard => (0..layout.shards_count.unwrap_or(1))
            .map(|_| ShardPlan {
                weight: 1,
                internal_replication: true,
                replicas: (0..default_replicas)
                    .map(|_| (RPC_PORT.number, cluster_deployment.clone()))
                    .collect(),
            })
            .collect(),
        LayoutType::Advanced => layout
            .shards
            .iter()
            .map(|shard| {
                let shard_deployment = shard.deployment.merged_over(&cluster_deployment);
                let replicas = if shard.replicas.is_empty() {
                    (0..shard.replicas_count.unwrap_or(default_replicas))
                        .map(|_| (RPC_PORT.number, shard_deployment.clone()))
                        .collect()
                } else {
                    shard
                        .replicas
                        .iter()
                        .map(|replica| {
                            (
                                replica.port.unwrap_or(RPC_PORT.number),
                                replica.deployment.merged_over(&shard_deployment),
                            )
                        })
                        .collect()
                };
                ShardPlan {
                    weight: shard.weight.unwrap_or(1),
                    internal_replication: shard.internal_replication.unwrap_or(true),
                    replicas,
                }
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{ChiLayout, ChiReplica, ChiShard};

    fn standard_cluster(name: &str, shards: u32, replicas: u32) -> ChiCluster {
        ChiCluster {
            name: name.to_string(),
            layout: ChiLayout {
                shards_count: Some(shards),
                replicas_count: Some(replicas),
                ..Default::default()
            },
            deployment: DeploymentSpec::default(),
        }
    }

    fn spec_with(clusters: Vec<ChiCluster>) -> ClickHouseInstallationSpec {
        let mut spec = ClickHouseInstallationSpec::default();
        spec.configuration.clusters = clusters;
        spec
    }

    // =========================================================================
    // Story: Every replica becomes one deployment
    // =========================================================================

    #[test]
    fn story_standard_layout_enumerates_shards_times_replicas() {
        let spec = spec_with(vec![standard_cluster("events", 2, 3)]);
        let topology = Topology::walk(&spec);

        assert_eq!(topology.clusters().len(), 1);
        assert_eq!(topology.clusters()[0].shards.len(), 2);
        assert_eq!(topology.replicas().count(), 6);
        assert_eq!(topology.deployment_ids().len(), 6);
        assert!(topology.capacity() >= 6);
    }

    #[test]
    fn story_deployment_ids_are_allocated_once() {
        let spec = spec_with(vec![
            standard_cluster("events", 2, 3),
            standard_cluster("archive", 1, 2),
        ]);
        let topology = Topology::walk(&spec);

        let ids = topology.deployment_ids();
        assert_eq!(ids.len(), 8);
        assert_eq!(topology.capacity(), 8);
        assert!(ids.capacity() >= topology.capacity());
    }

    #[test]
    fn story_standard_layout_defaults_to_one_replica() {
        let spec = spec_with(vec![ChiCluster {
            name: "single".to_string(),
            layout: ChiLayout::default(),
            deployment: DeploymentSpec::default(),
        }]);
        let topology = Topology::walk(&spec);

        assert_eq!(topology.replicas().count(), 1);
        let (_, shard, replica) = topology.replicas().next().unwrap();
        assert_eq!(shard.weight, 1);
        assert!(shard.internal_replication);
        assert_eq!(replica.port, 9000);
    }

    #[test]
    fn story_zero_clusters_yield_zero_deployments() {
        let topology = Topology::walk(&ClickHouseInstallationSpec::default());
        assert!(topology.deployment_ids().is_empty());
        assert!(topology.macros_data().is_empty());
        assert_eq!(topology.capacity(), 0);
    }

    // =========================================================================
    // Story: Identifiers come from coordinates
    // =========================================================================

    #[test]
    fn story_ids_encode_coordinates() {
        let spec = spec_with(vec![standard_cluster("a", 1, 1), standard_cluster("b", 2, 2)]);
        let topology = Topology::walk(&spec);

        let fingerprint = Fingerprint::of(&DeploymentSpec::default());
        let expected = format!("{}-1-1-0", fingerprint.short());
        assert!(topology
            .deployment_ids()
            .iter()
            .any(|id| id.as_str() == expected));
    }

    #[test]
    fn story_ids_are_unique_and_sorted() {
        let spec = spec_with(vec![standard_cluster("a", 3, 4), standard_cluster("b", 12, 1)]);
        let ids = Topology::walk(&spec).deployment_ids();

        let mut deduped = ids.clone();
        deduped.dedup();
        assert_eq!(ids.len(), 24);
        assert_eq!(deduped.len(), ids.len());
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn story_walk_is_deterministic() {
        let spec = spec_with(vec![standard_cluster("a", 2, 2)]);
        assert_eq!(
            Topology::walk(&spec).deployment_ids(),
            Topology::walk(&spec).deployment_ids()
        );
    }

    // =========================================================================
    // Story: Deployment defaults cascade down the tree
    // =========================================================================

    #[test]
    fn story_deployment_cascade_in_advanced_layout() {
        let mut spec = spec_with(vec![ChiCluster {
            name: "tiered".to_string(),
            layout: ChiLayout {
                type_: LayoutType::Advanced,
                shards: vec![ChiShard {
                    weight: Some(3),
                    internal_replication: Some(false),
                    deployment: DeploymentSpec {
                        pod_template: Some("shard-pod".to_string()),
                        volume_claim_template: None,
                    },
                    replicas_count: None,
                    replicas: vec![
                        ChiReplica::default(),
                        ChiReplica {
                            port: Some(9440),
                            deployment: DeploymentSpec {
                                pod_template: Some("replica-pod".to_string()),
                                volume_claim_template: None,
                            },
                        },
                    ],
                }],
                ..Default::default()
            },
            deployment: DeploymentSpec::default(),
        }]);
        spec.defaults.deployment.volume_claim_template = Some("data".to_string());

        let topology = Topology::walk(&spec);
        let shard = &topology.clusters()[0].shards[0];
        assert_eq!(shard.weight, 3);
        assert!(!shard.internal_replication);

        let first = &shard.replicas[0];
        assert_eq!(first.deployment.pod_template.as_deref(), Some("shard-pod"));
        assert_eq!(first.deployment.volume_claim_template.as_deref(), Some("data"));
        assert_eq!(first.port, 9000);

        let second = &shard.replicas[1];
        assert_eq!(second.deployment.pod_template.as_deref(), Some("replica-pod"));
        assert_eq!(second.deployment.volume_claim_template.as_deref(), Some("data"));
        assert_eq!(second.port, 9440);
        assert_ne!(first.fingerprint, second.fingerprint);
    }

    #[test]
    fn story_advanced_shard_falls_back_to_replica_counts() {
        let spec = spec_with(vec![ChiCluster {
            name: "mixed".to_string(),
            layout: ChiLayout {
                type_: LayoutType::Advanced,
                replicas_count: Some(2),
                shards: vec![
                    ChiShard::default(),
                    ChiShard {
                        replicas_count: Some(3),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            },
            deployment: DeploymentSpec::default(),
        }]);

        let topology = Topology::walk(&spec);
        let shards = &topology.clusters()[0].shards;
        assert_eq!(shards[0].replicas.len(), 2);
        assert_eq!(shards[1].replicas.len(), 3);
        assert!(topology.capacity() >= 5);
    }

    // =========================================================================
    // Story: Macros data records shard coordinates
    // =========================================================================

    #[test]
    fn story_macros_data_has_one_entry_per_replica() {
        let spec = spec_with(vec![standard_cluster("events", 2, 1)]);
        let topology = Topology::walk(&spec);
        let data = topology.macros_data();

        assert_eq!(data.len(), 2);
        for (_, shard, replica) in topology.replicas() {
            assert_eq!(
                data[&replica.id],
                vec![ShardDescription {
                    cluster_name: "events".to_string(),
                    shard_index: shard.index,
                }]
            );
        }
    }
}
