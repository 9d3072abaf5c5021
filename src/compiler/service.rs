//! Service builder

use std::collections::BTreeMap;

use tracing::debug;

use crate::naming::{
    create_chi_service_name, create_pod_service_name, create_stateful_set_name,
    HEADLESS_CLUSTER_IP, PORTS,
};
use crate::workload::{LabelSelector, ObjectMeta, Service, ServicePort, ServiceSpec};
use crate::LABEL_CHI;

use super::context::CompileContext;
use super::topology::DeploymentId;

/// Builds the installation Service and one headless Service per deployment
pub struct ServiceBuilder<'a> {
    ctx: &'a CompileContext,
}

impl<'a> ServiceBuilder<'a> {
    /// Create a builder over a compile context
    pub fn new(ctx: &'a CompileContext) -> Self {
        Self { ctx }
    }

    /// Installation Service first, then per-deployment Services in id order
    pub fn build(&self) -> Vec<Service> {
        let mut services = Vec::with_capacity(1 + self.ctx.deployment_ids.len());
        services.push(self.installation_service());
        services.extend(self.ctx.deployment_ids.iter().map(|id| self.pod_service(id)));
        services
    }

    /// Load-balanced entry point selecting every pod of the installation
    fn installation_service(&self) -> Service {
        let name = create_chi_service_name(&self.ctx.chi_name);
        debug!(service = %name, "building installation service");
        service(
            ObjectMeta::new(name, &self.ctx.namespace, &self.ctx.chi_name),
            ServiceSpec {
                selector: BTreeMap::from([(LABEL_CHI.to_string(), self.ctx.chi_name.clone())]),
                ports: ports(),
                cluster_ip: None,
                type_: Some("LoadBalancer".to_string()),
            },
        )
    }

    /// Headless Service giving one pod a stable DNS name
    fn pod_service(&self, id: &DeploymentId) -> Service {
        let name = create_pod_service_name(id.as_str());
        debug!(service = %name, deployment = %id, "building pod service");
        service(
            ObjectMeta::new(name, &self.ctx.namespace, &self.ctx.chi_name),
            ServiceSpec {
                selector: LabelSelector::app(create_stateful_set_name(id.as_str())).match_labels,
                ports: ports(),
                cluster_ip: Some(HEADLESS_CLUSTER_IP.to_string()),
                type_: Some("ClusterIP".to_string()),
            },
        )
    }
}

fn service(metadata: ObjectMeta, spec: ServiceSpec) -> Service {
    Service {
        api_version: "v1".to_string(),
        kind: "Service".to_string(),
        metadata,
        spec,
    }
}

fn ports() -> Vec<ServicePort> {
    PORTS.iter().copied().map(ServicePort::from).collect()
}
