//! `remote_servers.xml`

use crate::compiler::{ReplicaTopology, Topology};
use crate::naming::{create_pod_fqdn, create_pod_service_name};

use super::xml::XmlWriter;

/// How replicas are addressed in the cluster definition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplicaAddressing<'a> {
    /// Per-replica Service name, resolved through the pod's search domains
    ServiceName,
    /// Fully qualified name within the given namespace
    Fqdn {
        /// Namespace the Services live in
        namespace: &'a str,
    },
}

impl ReplicaAddressing<'_> {
    fn host(&self, replica: &ReplicaTopology) -> String {
        match self {
            Self::ServiceName => create_pod_service_name(replica.id.as_str()),
            Self::Fqdn { namespace } => create_pod_fqdn(namespace, replica.id.as_str()),
        }
    }
}

/// Render one `<cluster>` element per walked cluster
///
/// Empty when the installation has no clusters.
pub fn generate_remote_servers(topology: &Topology, addressing: ReplicaAddressing<'_>) -> String {
    if topology.clusters().is_empty() {
        return String::new();
    }

    let mut w = XmlWriter::document();
    w.open("remote_servers");
    for cluster in topology.clusters() {
        w.open(&cluster.name);
        for shard in &cluster.shards {
            w.open("shard")
                .element("internal_replication", shard.internal_replication)
                .element("weight", shard.weight);
            for replica in &shard.replicas {
                w.open("replica")
                    .element("host", addressing.host(replica))
                    .element("port", replica.port)
                    .close("replica");
            }
            w.close("shard");
        }
        w.close(&cluster.name);
    }
    w.close("remote_servers");
    w.finish()
}
