//! Resource names, hostnames and config paths
//!
//! Every name the compiler emits is derived here from topology coordinates
//! through a fixed pattern. Functions are pure: identical inputs always give
//! identical outputs.
//!
//! | Function | Pattern |
//! |----------|---------|
//! | [`create_config_map_common_name`] | `chi-{installation}-common-configd` |
//! | [`create_config_map_macros_name`] | `chi-{installation}-deploy-confd-{deployment}` |
//! | [`create_chi_service_name`] | `chi-{installation}` |
//! | [`create_pod_service_name`] | `chi-service-{deployment}` |
//! | [`create_stateful_set_name`] | `chi-{deployment}` |
//! | [`create_pod_hostname`] | `chi-{deployment}-0` |
//! | [`create_namespace_domain_name`] | `.{namespace}.svc.cluster.local` |
//! | [`create_pod_fqdn`] | `chi-service-{deployment}.{namespace}.svc.cluster.local` |
//! | [`create_config_full_path`] | `/etc/clickhouse-server/config.d/{filename}` |

// =============================================================================
// Config files
// =============================================================================

/// Directory inside the container where config fragments are mounted
pub const CONFIG_DIR: &str = "/etc/clickhouse-server/config.d/";

/// Cluster topology for distributed tables
pub const FILENAME_REMOTE_SERVERS_XML: &str = "remote_servers.xml";
/// Coordination service connection
pub const FILENAME_ZOOKEEPER_XML: &str = "zookeeper.xml";
/// User accounts
pub const FILENAME_USERS_XML: &str = "users.xml";
/// Settings profiles
pub const FILENAME_PROFILES_XML: &str = "profiles.xml";
/// Resource quotas
pub const FILENAME_QUOTAS_XML: &str = "quotas.xml";
/// Global server settings
pub const FILENAME_SETTINGS_XML: &str = "settings.xml";
/// Per-replica macros
pub const FILENAME_MACROS_XML: &str = "macros.xml";

// =============================================================================
// Data volume
// =============================================================================

/// Volume name used for claims declared with the default name
pub const DEFAULT_DATA_VOLUME_NAME: &str = "clickhouse-data";

/// Mount path of the default data volume
pub const DATA_DIR: &str = "/var/lib/clickhouse";

// =============================================================================
// Ports and image
// =============================================================================

/// A named port exposed by every replica and every Service
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NamedPort {
    /// Port name
    pub name: &'static str,
    /// Port number
    pub number: u16,
}

/// Native client protocol
pub const RPC_PORT: NamedPort = NamedPort {
    name: "rpc",
    number: 9000,
};

/// Replication traffic between replicas
pub const INTERSERVER_PORT: NamedPort = NamedPort {
    name: "interserver",
    number: 9009,
};

/// HTTP interface
pub const REST_PORT: NamedPort = NamedPort {
    name: "rest",
    number: 8123,
};

/// Port layout shared by Services and the default container
pub const PORTS: [NamedPort; 3] = [RPC_PORT, INTERSERVER_PORT, REST_PORT];

/// Image of the synthesized default container
pub const DEFAULT_IMAGE: &str = "yandex/clickhouse-server:latest";

/// Default coordination service client port
pub const DEFAULT_ZOOKEEPER_PORT: u16 = 2181;

/// `clusterIP` of per-replica Services
pub const HEADLESS_CLUSTER_IP: &str = "None";

// =============================================================================
// Name formatters
// =============================================================================

/// Name of the ConfigMap shared by every replica of an installation
pub fn create_config_map_common_name(chi_name: &str) -> String {
    format!("chi-{chi_name}-common-configd")
}

/// Name of the private (macros) ConfigMap of one deployment
pub fn create_config_map_macros_name(chi_name: &str, deployment_id: &str) -> String {
    format!("chi-{chi_name}-deploy-confd-{deployment_id}")
}

/// Name of the installation-wide Service
pub fn create_chi_service_name(chi_name: &str) -> String {
    format!("chi-{chi_name}")
}

/// Name of the per-replica Service
pub fn create_pod_service_name(deployment_id: &str) -> String {
    format!("chi-service-{deployment_id}")
}

/// Name of the StatefulSet of one deployment
pub fn create_stateful_set_name(deployment_id: &str) -> String {
    format!("chi-{deployment_id}")
}

/// Hostname of the single pod of a deployment's StatefulSet
pub fn create_pod_hostname(deployment_id: &str) -> String {
    format!("chi-{deployment_id}-0")
}

/// Domain suffix of a namespace, e.g. `.my-ns.svc.cluster.local`
pub fn create_namespace_domain_name(namespace: &str) -> String {
    format!(".{namespace}.svc.cluster.local")
}

/// Fully qualified domain name a replica is reachable at
pub fn create_pod_fqdn(namespace: &str, deployment_id: &str) -> String {
    format!(
        "{}{}",
        create_pod_service_name(deployment_id),
        create_namespace_domain_name(namespace)
    )
}

/// Absolute in-container path of a config fragment
pub fn create_config_full_path(filename: &str) -> String {
    format!("{CONFIG_DIR}{filename}")
}
