//! Config composer
//!
//! Produces the XML fragments mounted into `/etc/clickhouse-server/config.d/`:
//! the bundle shared by every replica of an installation, and one macros
//! fragment per deployment.
//!
//! | File | Source | Present when |
//! |------|--------|--------------|
//! | `remote_servers.xml` | walked topology | at least one cluster |
//! | `zookeeper.xml` | `configuration.zookeeper` | at least one node |
//! | `users.xml` | `configuration.users` | non-empty |
//! | `profiles.xml` | `configuration.profiles` | non-empty |
//! | `quotas.xml` | `configuration.quotas` | non-empty |
//! | `settings.xml` | `configuration.settings` | non-empty |
//! | `macros.xml` | shard descriptions of one deployment | always |

mod macros;
mod remote_servers;
mod settings;
mod xml;
mod zookeeper;

use std::collections::BTreeMap;

use tracing::debug;

use crate::compiler::{DeploymentId, MacrosData, Topology};
use crate::crd::ClickHouseInstallationSpec;
use crate::naming::{
    FILENAME_PROFILES_XML, FILENAME_QUOTAS_XML, FILENAME_REMOTE_SERVERS_XML,
    FILENAME_SETTINGS_XML, FILENAME_USERS_XML, FILENAME_ZOOKEEPER_XML,
};

pub use macros::generate_macros;
pub use remote_servers::{generate_remote_servers, ReplicaAddressing};
pub use settings::{
    generate_profiles, generate_quotas, generate_settings, generate_settings_section,
    generate_users,
};
pub use xml::{escape, is_valid_element_name, XmlWriter, ROOT_ELEMENT};
pub use zookeeper::{distributed_ddl_path, generate_zookeeper};

/// Shared config fragments keyed by filename
///
/// Only non-empty fragments are ever stored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommonConfigSections(BTreeMap<String, String>);

impl CommonConfigSections {
    /// Generate every shared fragment of an installation
    pub fn compose(
        chi_name: &str,
        namespace: &str,
        spec: &ClickHouseInstallationSpec,
        topology: &Topology,
    ) -> Self {
        let configuration = &spec.configuration;
        let addressing = if spec.defaults.replicas_use_fqdn {
            ReplicaAddressing::Fqdn { namespace }
        } else {
            ReplicaAddressing::ServiceName
        };

        let mut sections = Self::default();
        sections.include_non_empty(
            FILENAME_REMOTE_SERVERS_XML,
            generate_remote_servers(topology, addressing),
        );
        sections.include_non_empty(
            FILENAME_ZOOKEEPER_XML,
            generate_zookeeper(chi_name, &configuration.zookeeper),
        );
        sections.include_non_empty(FILENAME_USERS_XML, generate_users(&configuration.users));
        sections.include_non_empty(
            FILENAME_PROFILES_XML,
            generate_profiles(&configuration.profiles),
        );
        sections.include_non_empty(FILENAME_QUOTAS_XML, generate_quotas(&configuration.quotas));
        sections.include_non_empty(
            FILENAME_SETTINGS_XML,
            generate_settings(&configuration.settings),
        );
        sections
    }

    /// Store `content` under `filename` unless it is empty
    pub fn include_non_empty(&mut self, filename: &str, content: String) {
        if content.is_empty() {
            debug!(filename, "config section empty, skipping");
            return;
        }
        self.0.insert(filename.to_string(), content);
    }

    /// Filenames in ascending order
    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Fragment stored under `filename`
    pub fn get(&self, filename: &str) -> Option<&str> {
        self.0.get(filename).map(String::as_str)
    }

    /// Number of fragments
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no fragment was generated
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fragments as ConfigMap data
    pub fn to_data(&self) -> BTreeMap<String, String> {
        self.0.clone()
    }
}

/// Macros fragment of every deployment
pub fn compose_macros(chi_name: &str, macros: &MacrosData) -> BTreeMap<DeploymentId, String> {
    macros
        .iter()
        .map(|(id, shards)| (id.clone(), generate_macros(chi_name, id, shards)))
        .collect()
}
