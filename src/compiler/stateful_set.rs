//! StatefulSet builder
//!
//! Each deployment runs as a single-pod StatefulSet. The pod gets its
//! containers from the selected pod template, or a synthesized default
//! container, and always mounts the shared and per-deployment config
//! fragments.

use tracing::debug;

use crate::error::Error;
use crate::naming::{
    create_config_full_path, create_config_map_macros_name, create_pod_service_name,
    create_stateful_set_name, DATA_DIR, DEFAULT_DATA_VOLUME_NAME, FILENAME_MACROS_XML, PORTS,
};
use crate::workload::{
    config_map_volume, dir_mount, file_mount, Container, ContainerPort, LabelSelector,
    ObjectMeta, PodMeta, PodSpec, PodTemplateSpec, StatefulSet, StatefulSetSpec, VolumeMount,
};
use crate::{Result, LABEL_APP};

use super::context::CompileContext;
use super::topology::DeploymentId;

/// Builds one StatefulSet per deployment
pub struct StatefulSetBuilder<'a> {
    ctx: &'a CompileContext,
    common_mounts: Vec<VolumeMount>,
}

impl<'a> StatefulSetBuilder<'a> {
    /// Create a builder over a compile context
    pub fn new(ctx: &'a CompileContext) -> Self {
        let common_name = ctx.common_config_map_name();
        let common_mounts = ctx
            .common_sections
            .filenames()
            .map(|filename| file_mount(&common_name, create_config_full_path(filename), filename))
            .collect();
        Self { ctx, common_mounts }
    }

    /// StatefulSets in id order
    pub fn build(&self) -> Result<Vec<StatefulSet>> {
        self.ctx
            .deployment_ids
            .iter()
            .map(|id| self.build_one(id))
            .collect()
    }

    fn build_one(&self, id: &DeploymentId) -> Result<StatefulSet> {
        let ctx = self.ctx;
        let selection = ctx.fingerprints.selection(id).ok_or_else(|| {
            Error::invariant(format!("deployment {id} missing from fingerprint index"))
        })?;

        let name = create_stateful_set_name(id.as_str());
        let macros_name = create_config_map_macros_name(&ctx.chi_name, id.as_str());
        let mounts = self.mounts(&macros_name);

        let mut pod = PodSpec::default();
        match &selection.pod_template {
            Some(template_name) => {
                let template = ctx.templates.pods.get(template_name).ok_or_else(|| {
                    Error::invariant(format!(
                        "pod template '{template_name}' selected for {id} is not indexed"
                    ))
                })?;
                if template.containers.is_empty() {
                    return Err(Error::empty_pod_template(template_name, id.as_str()));
                }
                pod.volumes = template.volumes.clone();
                pod.containers = template.containers.clone();
                for container in &mut pod.containers {
                    container
                        .volume_mounts
                        .get_or_insert_with(Vec::new)
                        .extend(mounts.iter().cloned());
                }
                debug!(stateful_set = %name, template = %template_name, "using pod template");
            }
            None => {
                pod.containers.push(self.default_container(&name, mounts));
                debug!(stateful_set = %name, "using default container");
            }
        }

        pod.volumes.push(config_map_volume(ctx.common_config_map_name()));
        pod.volumes.push(config_map_volume(&macros_name));

        let mut volume_claim_templates = Vec::new();
        if let Some(template_name) = &selection.volume_claim_template {
            let template = ctx.templates.volume_claims.get(template_name).ok_or_else(|| {
                Error::invariant(format!(
                    "volume claim template '{template_name}' selected for {id} is not indexed"
                ))
            })?;
            volume_claim_templates.push(template.claim.clone());

            if template.use_default_name() {
                if let Some(first) = pod.containers.first_mut() {
                    first
                        .volume_mounts
                        .get_or_insert_with(Vec::new)
                        .push(dir_mount(DEFAULT_DATA_VOLUME_NAME, DATA_DIR));
                }
            }
            debug!(stateful_set = %name, template = %template_name, "using volume claim template");
        }

        let meta = ObjectMeta::new(&name, &ctx.namespace, &ctx.chi_name);
        let pod_labels = meta.clone().with_label(LABEL_APP, &name).labels;

        Ok(StatefulSet {
            api_version: "apps/v1".to_string(),
            kind: "StatefulSet".to_string(),
            metadata: meta,
            spec: StatefulSetSpec {
                replicas: 1,
                service_name: create_pod_service_name(id.as_str()),
                selector: LabelSelector::app(&name),
                template: PodTemplateSpec {
                    metadata: PodMeta {
                        name: name.clone(),
                        labels: pod_labels,
                    },
                    spec: pod,
                },
                volume_claim_templates,
            },
        })
    }

    /// Shared config mounts in filename order, then the macros mount
    fn mounts(&self, macros_name: &str) -> Vec<VolumeMount> {
        let mut mounts = self.common_mounts.clone();
        mounts.push(file_mount(
            macros_name,
            create_config_full_path(FILENAME_MACROS_XML),
            FILENAME_MACROS_XML,
        ));
        mounts
    }

    fn default_container(&self, name: &str, volume_mounts: Vec<VolumeMount>) -> Container {
        Container {
            name: name.to_string(),
            image: Some(self.ctx.default_image.clone()),
            ports: Some(PORTS.iter().copied().map(ContainerPort::from).collect()),
            volume_mounts: Some(volume_mounts),
            ..Default::default()
        }
    }
}
