//! Custom Resource Definition of a ClickHouse installation
//!
//! This module contains the ClickHouseInstallation CRD and its supporting types.

mod installation;
mod types;

pub use installation::{ClickHouseInstallation, ClickHouseInstallationSpec, DEFAULT_NAMESPACE};
pub use types::{
    ChiCluster, ChiConfiguration, ChiDefaults, ChiLayout, ChiReplica, ChiShard, ChiTemplates,
    ClaimTemplate, ClaimTemplateMeta, DeploymentSpec, LayoutType, PodTemplate, Setting, Settings,
    VolumeClaimTemplate, ZookeeperConfig, ZookeeperNode,
};
