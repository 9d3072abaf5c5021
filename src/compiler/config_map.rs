//! ConfigMap builder

use tracing::debug;

use crate::error::Error;
use crate::naming::{create_config_map_macros_name, FILENAME_MACROS_XML};
use crate::workload::{ConfigMap, ObjectMeta};
use crate::Result;

use super::context::CompileContext;
use super::topology::DeploymentId;

/// Builds the shared ConfigMap and one macros ConfigMap per deployment
pub struct ConfigMapBuilder<'a> {
    ctx: &'a CompileContext,
}

impl<'a> ConfigMapBuilder<'a> {
    /// Create a builder over a compile context
    pub fn new(ctx: &'a CompileContext) -> Self {
        Self { ctx }
    }

    /// Shared ConfigMap first, then macros ConfigMaps in id order
    pub fn build(&self) -> Result<Vec<ConfigMap>> {
        let mut config_maps = Vec::with_capacity(1 + self.ctx.deployment_ids.len());
        config_maps.push(self.common());
        for id in &self.ctx.deployment_ids {
            config_maps.push(self.macros(id)?);
        }
        Ok(config_maps)
    }

    fn common(&self) -> ConfigMap {
        let name = self.ctx.common_config_map_name();
        debug!(
            config_map = %name,
            sections = self.ctx.common_sections.len(),
            "building common config map"
        );
        let mut config_map =
            ConfigMap::new(ObjectMeta::new(name, &self.ctx.namespace, &self.ctx.chi_name));
        config_map.data = self.ctx.common_sections.to_data();
        config_map
    }

    fn macros(&self, id: &DeploymentId) -> Result<ConfigMap> {
        let xml = self
            .ctx
            .macros
            .get(id)
            .ok_or_else(|| Error::invariant(format!("deployment {id} has no macros")))?;
        let name = create_config_map_macros_name(&self.ctx.chi_name, id.as_str());
        debug!(config_map = %name, deployment = %id, "building macros config map");
        let meta = ObjectMeta::new(name, &self.ctx.namespace, &self.ctx.chi_name);
        Ok(ConfigMap::new(meta).with_data(FILENAME_MACROS_XML, xml.as_str()))
    }
}
