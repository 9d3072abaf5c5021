//! `zookeeper.xml`

use crate::crd::ZookeeperConfig;
use crate::naming::DEFAULT_ZOOKEEPER_PORT;

use super::xml::XmlWriter;

/// Path of the distributed DDL queue of an installation
pub fn distributed_ddl_path(chi_name: &str) -> String {
    format!("/clickhouse/{chi_name}/task_queue/ddl")
}

/// Render coordination service nodes and the distributed DDL queue path
///
/// Empty when no nodes are configured.
pub fn generate_zookeeper(chi_name: &str, zookeeper: &ZookeeperConfig) -> String {
    if zookeeper.nodes.is_empty() {
        return String::new();
    }

    let mut w = XmlWriter::document();
    w.open("zookeeper");
    for node in &zookeeper.nodes {
        w.open("node")
            .element("host", &node.host)
            .element("port", node.port.unwrap_or(DEFAULT_ZOOKEEPER_PORT))
            .close("node");
    }
    w.close("zookeeper");

    w.open("distributed_ddl")
        .element("path", distributed_ddl_path(chi_name))
        .close("distributed_ddl");
    w.finish()
}
