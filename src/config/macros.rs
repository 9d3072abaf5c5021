//! `macros.xml`, the only per-deployment config fragment

use crate::compiler::{DeploymentId, ShardDescription};

use super::xml::XmlWriter;

/// Render the macros of one deployment
///
/// Always non-empty: `<installation>` and `<replica>` are written even when
/// the deployment has no shard descriptions.
pub fn generate_macros(chi_name: &str, id: &DeploymentId, shards: &[ShardDescription]) -> String {
    let mut w = XmlWriter::document();
    w.open("macros");
    w.element("installation", chi_name);
    for shard in shards {
        w.element(&format!("{}-shard", shard.cluster_name), shard.shard_index);
    }
    w.element("replica", id);
    w.close("macros");
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Topology;
    use crate::crd::{ChiCluster, ChiLayout, ClickHouseInstallationSpec, DeploymentSpec};

    #[test]
    fn story_macros_name_shard_and_replica() {
        let mut spec = ClickHouseInstallationSpec::default();
        spec.configuration.clusters.push(ChiCluster {
            name: "events".to_string(),
            layout: ChiLayout {
                shards_count: Some(2),
                ..Default::default()
            },
            deployment: DeploymentSpec::default(),
        });
        let topology = Topology::walk(&spec);
        let data = topology.macros_data();
        let (id, shards) = data.iter().last().unwrap();

        let xml = generate_macros("demo", id, shards);
        assert_eq!(
            xml,
            format!(
                "<yandex>\n\
                 \x20   <macros>\n\
                 \x20       <installation>demo</installation>\n\
                 \x20       <events-shard>1</events-shard>\n\
                 \x20       <replica>{id}</replica>\n\
                 \x20   </macros>\n\
                 </yandex>\n"
            )
        );
    }
}
