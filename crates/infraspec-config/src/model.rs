//! Typed infrastructure configuration records.

use serde::{Deserialize, Serialize};

/// Fully resolved configuration for one environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfrastructureSpec {
    /// Environment name the spec was resolved for.
    pub name: String,
    /// Cloud account identifier.
    pub account: String,
    /// Deployment region.
    pub region: String,
    #[serde(default)]
    pub vpc: NetworkSettings,
    #[serde(default)]
    pub ec2: ComputeSettings,
    #[serde(default)]
    pub workstation: WorkstationSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub endpoints: EndpointSettings,
    #[serde(default)]
    pub access: AccessControlSettings,
}

/// VPC layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSettings {
    #[serde(default = "default_cidr")]
    pub cidr: String,
    #[serde(default = "default_max_azs")]
    pub max_azs: u32,
    #[serde(default = "default_subnet_mask")]
    pub subnet_mask: u32,
    #[serde(default = "default_nat_gateways")]
    pub nat_gateways: u32,
    #[serde(default = "default_true")]
    pub enable_dns_hostnames: bool,
    #[serde(default = "default_true")]
    pub enable_dns_support: bool,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            cidr: default_cidr(),
            max_azs: default_max_azs(),
            subnet_mask: default_subnet_mask(),
            nat_gateways: default_nat_gateways(),
            enable_dns_hostnames: true,
            enable_dns_support: true,
        }
    }
}

fn default_cidr() -> String {
    "10.0.0.0/16".to_string()
}

fn default_max_azs() -> u32 {
    2
}

fn default_subnet_mask() -> u32 {
    24
}

fn default_nat_gateways() -> u32 {
    1
}

/// Compute instance defaults shared by stacks that launch hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeSettings {
    #[serde(default = "default_instance_type")]
    pub instance_type: String,
    /// Pinned machine image; stacks pick the latest image when unset.
    #[serde(default)]
    pub ami_id: Option<String>,
    /// SSH key pair name; instances are launched without one when unset.
    #[serde(default)]
    pub key_name: Option<String>,
}

impl Default for ComputeSettings {
    fn default() -> Self {
        Self {
            instance_type: default_instance_type(),
            ami_id: None,
            key_name: None,
        }
    }
}

fn default_instance_type() -> String {
    "t3.micro".to_string()
}

/// Remote desktop workstation host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkstationSettings {
    #[serde(default = "default_architecture")]
    pub architecture: String,
    #[serde(default = "default_instance_class")]
    pub instance_class: String,
    #[serde(default = "default_instance_size")]
    pub instance_size: String,
    /// Root volume size in GiB.
    #[serde(default = "default_root_volume_size")]
    pub root_volume_size: u32,
    #[serde(default = "default_root_volume_type")]
    pub root_volume_type: String,
    #[serde(default = "default_guacamole_port")]
    pub guacamole_port: u32,
    #[serde(default = "default_vnc_port")]
    pub vnc_port: u32,
    #[serde(default = "default_true")]
    pub install_docker: bool,
    #[serde(default = "default_true")]
    pub install_vscode: bool,
    #[serde(default)]
    pub install_intellij: bool,
}

impl Default for WorkstationSettings {
    fn default() -> Self {
        Self {
            architecture: default_architecture(),
            instance_class: default_instance_class(),
            instance_size: default_instance_size(),
            root_volume_size: default_root_volume_size(),
            root_volume_type: default_root_volume_type(),
            guacamole_port: default_guacamole_port(),
            vnc_port: default_vnc_port(),
            install_docker: true,
            install_vscode: true,
            install_intellij: false,
        }
    }
}

fn default_architecture() -> String {
    "x86_64".to_string()
}

fn default_instance_class() -> String {
    "T3".to_string()
}

fn default_instance_size() -> String {
    "LARGE".to_string()
}

fn default_root_volume_size() -> u32 {
    50
}

fn default_root_volume_type() -> String {
    "GP3".to_string()
}

fn default_guacamole_port() -> u32 {
    8080
}

fn default_vnc_port() -> u32 {
    5901
}

/// Log retention and flow log settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    #[serde(default = "default_true")]
    pub flow_logs_enabled: bool,
    #[serde(default = "default_log_group_name")]
    pub log_group_name: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            retention_days: default_retention_days(),
            flow_logs_enabled: true,
            log_group_name: default_log_group_name(),
        }
    }
}

fn default_log_level() -> String {
    "INFO".to_string()
}

fn default_retention_days() -> u32 {
    7
}

fn default_log_group_name() -> String {
    "/aws/vpc/flowlogs".to_string()
}

/// Interface endpoints created inside the VPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSettings {
    #[serde(default = "default_endpoint_services")]
    pub services: Vec<String>,
    #[serde(default = "default_true")]
    pub private_dns_enabled: bool,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            services: default_endpoint_services(),
            private_dns_enabled: true,
        }
    }
}

/// Endpoints Session Manager needs in a VPC without NAT.
fn default_endpoint_services() -> Vec<String> {
    ["ssm", "ssmmessages", "ec2messages"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Ingress restrictions for public entry points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AccessControlSettings {
    #[serde(default)]
    pub allowed_cidrs: Vec<String>,
    /// ISO 3166 country codes rejected at the edge.
    #[serde(default)]
    pub blocked_countries: Vec<String>,
    #[serde(default)]
    pub enable_waf: bool,
    #[serde(default)]
    pub domain_name: Option<String>,
}

fn default_true() -> bool {
    true
}
