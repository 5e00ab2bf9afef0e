//! KF-001: Cluster manifest schema and structural validation.
//!
//! Every field is optional at decode time so that a bare `{}` document loads;
//! `validate` is where required fields are enforced, after any Terraform
//! overlay has filled in provisioner-owned values.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

// ============================================================================
// Top-level kubeforge.yaml
// ============================================================================

/// Root manifest — the desired shape of the cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Cluster name
    #[serde(default)]
    pub name: String,

    /// Control-plane hosts
    #[serde(default)]
    pub hosts: Vec<HostConfig>,

    /// Kubernetes API endpoint
    #[serde(default)]
    pub apiserver: ApiServerConfig,

    /// Cloud provider
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Component versions
    #[serde(default)]
    pub versions: VersionConfig,

    /// Cluster networking
    #[serde(default)]
    pub network: NetworkConfig,

    /// Worker pools (order-preserving)
    #[serde(default)]
    pub workers: Vec<WorkerConfig>,

    /// Provider credentials passed through to the cluster
    #[serde(default)]
    pub credentials: IndexMap<String, String>,
}

// ============================================================================
// Hosts
// ============================================================================

/// A control-plane machine reachable over SSH.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(default)]
    pub id: usize,

    #[serde(default)]
    pub public_address: String,

    #[serde(default)]
    pub private_address: String,

    #[serde(default)]
    pub hostname: String,

    #[serde(default = "default_ssh_port")]
    pub ssh_port: u16,

    #[serde(default = "default_ssh_username")]
    pub ssh_username: String,

    #[serde(default)]
    pub ssh_private_key_file: String,

    #[serde(default)]
    pub ssh_agent_socket: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            id: 0,
            public_address: String::new(),
            private_address: String::new(),
            hostname: String::new(),
            ssh_port: default_ssh_port(),
            ssh_username: default_ssh_username(),
            ssh_private_key_file: String::new(),
            ssh_agent_socket: String::new(),
        }
    }
}

pub(crate) fn default_ssh_port() -> u16 {
    22
}

pub(crate) fn default_ssh_username() -> String {
    "root".to_string()
}

// ============================================================================
// Cluster-wide settings
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiServerConfig {
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider name (aws, digitalocean, openstack, ...)
    #[serde(default)]
    pub name: String,

    /// Raw cloud-config handed to the cloud controller
    #[serde(default)]
    pub cloud_config: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionConfig {
    #[serde(default)]
    pub kubernetes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_pod_subnet")]
    pub pod_subnet: String,

    #[serde(default = "default_service_subnet")]
    pub service_subnet: String,

    #[serde(default)]
    pub node_port_range: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            pod_subnet: default_pod_subnet(),
            service_subnet: default_service_subnet(),
            node_port_range: String::new(),
        }
    }
}

fn default_pod_subnet() -> String {
    "10.244.0.0/16".to_string()
}

fn default_service_subnet() -> String {
    "10.96.0.0/12".to_string()
}

// ============================================================================
// Workers
// ============================================================================

/// A named pool of worker machines created by the machine controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub name: String,

    #[serde(default)]
    pub replicas: i64,

    /// Provider-specific machine spec, passed through untouched
    #[serde(default)]
    pub spec: serde_json::Value,
}

// ============================================================================
// Validation
// ============================================================================

/// Validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^v?\d+\.\d+\.\d+$").unwrap_or_else(|e| panic!("invalid version regex: {e}"))
    })
}

/// Validate a fully resolved manifest. Returns a list of errors (empty = valid).
pub fn validate(manifest: &Manifest) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if manifest.name.is_empty() {
        errors.push(ValidationError::new("name must not be empty"));
    }

    if manifest.hosts.is_empty() {
        errors.push(ValidationError::new("no hosts defined"));
    }

    for (i, host) in manifest.hosts.iter().enumerate() {
        if host.public_address.is_empty() {
            errors.push(ValidationError::new(format!(
                "host {} has no public_address",
                i
            )));
        }
        if host.ssh_username.is_empty() {
            errors.push(ValidationError::new(format!("host {} has no ssh_username", i)));
        }
    }

    if manifest.apiserver.address.is_empty() {
        errors.push(ValidationError::new("apiserver.address must not be empty"));
    }

    let version = &manifest.versions.kubernetes;
    if !version_pattern().is_match(version) {
        errors.push(ValidationError::new(format!(
            "versions.kubernetes must look like 1.2.3, got \"{}\"",
            version
        )));
    }

    let mut seen = HashSet::new();
    for worker in &manifest.workers {
        if !seen.insert(worker.name.as_str()) {
            errors.push(ValidationError::new(format!(
                "worker pool '{}' is defined more than once",
                worker.name
            )));
        }
        if worker.replicas < 0 {
            errors.push(ValidationError::new(format!(
                "worker pool '{}' has negative replicas",
                worker.name
            )));
        }
    }

    errors
}
