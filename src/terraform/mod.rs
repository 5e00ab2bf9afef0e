//! KF-002: Terraform output parsing and manifest overlay.
//!
//! Reads the document produced by `terraform output -json` and writes the
//! provisioner-owned values (API endpoint, control-plane hosts, worker pools)
//! onto a loaded manifest. All fallible conversions happen while parsing, so
//! `Config::apply` cannot fail.

use crate::manifest::{default_ssh_port, HostConfig, Manifest, WorkerConfig};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

/// Parsed Terraform output.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub kubeone_api: Output<ApiOutput>,

    #[serde(default)]
    pub kubeone_hosts: Output<HostsOutput>,

    #[serde(default)]
    pub kubeone_workers: Output<IndexMap<String, WorkerOutput>>,
}

/// Terraform wraps every output in `{ "value": ..., "sensitive": ..., "type": ... }`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Output<T> {
    #[serde(default)]
    pub value: T,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApiOutput {
    #[serde(default)]
    pub endpoint: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HostsOutput {
    #[serde(default)]
    pub control_plane: Vec<ControlPlane>,
}

/// One control-plane group as emitted by the provisioner.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ControlPlane {
    #[serde(default)]
    pub cluster_name: String,

    #[serde(default)]
    pub public_address: Vec<String>,

    #[serde(default)]
    pub private_address: Vec<String>,

    #[serde(default)]
    pub hostnames: Vec<String>,

    #[serde(default)]
    pub ssh_user: String,

    #[serde(default, deserialize_with = "port_from_string_or_number")]
    pub ssh_port: Option<u16>,

    #[serde(default)]
    pub ssh_private_key_file: String,

    #[serde(default)]
    pub ssh_agent_socket: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WorkerOutput {
    #[serde(default)]
    pub replicas: i64,

    #[serde(default)]
    pub spec: serde_json::Value,
}

/// Terraform renders ports as strings; hand-written outputs often use numbers.
fn port_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Option::<Port>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Port::Number(n)) => Ok(Some(n)),
        Some(Port::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Port::Text(s)) => s
            .trim()
            .parse::<u16>()
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid ssh_port \"{}\": {}", s, e))),
    }
}

impl Config {
    /// Parse `terraform output -json` bytes.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Overlay provisioner values onto `manifest`, in place.
    pub fn apply(&self, manifest: &mut Manifest) {
        let endpoint = &self.kubeone_api.value.endpoint;
        if !endpoint.is_empty() {
            manifest.apiserver.address.clone_from(endpoint);
        }

        if let Some(cp) = self.kubeone_hosts.value.control_plane.first() {
            if !cp.cluster_name.is_empty() {
                manifest.name.clone_from(&cp.cluster_name);
            }
            let hosts = cp.hosts();
            if !hosts.is_empty() {
                manifest.hosts = hosts;
            }
        }

        for (name, pool) in &self.kubeone_workers.value {
            let worker = WorkerConfig {
                name: name.clone(),
                replicas: pool.replicas,
                spec: pool.spec.clone(),
            };
            match manifest.workers.iter_mut().find(|w| w.name == *name) {
                Some(existing) => *existing = worker,
                None => manifest.workers.push(worker),
            }
        }
    }
}

impl ControlPlane {
    /// Expand the per-address lists into one host entry per public address.
    fn hosts(&self) -> Vec<HostConfig> {
        self.public_address
            .iter()
            .enumerate()
            .map(|(i, public)| {
                let private = self
                    .private_address
                    .get(i)
                    .filter(|p| !p.is_empty())
                    .unwrap_or(public);
                let mut host = HostConfig {
                    id: i,
                    public_address: public.clone(),
                    private_address: private.clone(),
                    hostname: self.hostnames.get(i).cloned().unwrap_or_default(),
                    ssh_port: self.ssh_port.unwrap_or_else(default_ssh_port),
                    ssh_private_key_file: self.ssh_private_key_file.clone(),
                    ssh_agent_socket: self.ssh_agent_socket.clone(),
                    ..HostConfig::default()
                };
                if !self.ssh_user.is_empty() {
                    host.ssh_username.clone_from(&self.ssh_user);
                }
                host
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const OUTPUT: &str = r#"{
  "kubeone_api": {"sensitive": false, "type": "map", "value": {"endpoint": "lb.example.com"}},
  "kubeone_hosts": {"value": {"control_plane": [{
    "cluster_name": "prod",
    "public_address": ["203.0.113.10", "203.0.113.11"],
    "private_address": ["10.0.0.10"],
    "hostnames": ["cp-0", "cp-1"],
    "ssh_user": "ubuntu",
    "ssh_port": "2222",
    "ssh_private_key_file": "/home/me/.ssh/id_rsa",
    "ssh_agent_socket": "env:SSH_AUTH_SOCK"
  }]}},
  "kubeone_workers": {"value": {
    "pool-a": {"replicas": 3, "spec": {"instanceType": "t3.medium"}}
  }}
}"#;

    #[test]
    fn test_kf002_parse_full_output() {
        let cfg = Config::from_json(OUTPUT.as_bytes()).unwrap();
        assert_eq!(cfg.kubeone_api.value.endpoint, "lb.example.com");
        let cp = &cfg.kubeone_hosts.value.control_plane[0];
        assert_eq!(cp.ssh_port, Some(2222));
        assert_eq!(cfg.kubeone_workers.value["pool-a"].replicas, 3);
    }

    #[test]
    fn test_kf002_parse_empty_object() {
        let cfg = Config::from_json(b"{}").unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn test_kf002_parse_invalid_json() {
        assert!(Config::from_json(b"not json").is_err());
        assert!(Config::from_json(b"").is_err());
    }

    #[test]
    fn test_kf002_numeric_port_accepted() {
        let json = r#"{"kubeone_hosts": {"value": {"control_plane": [{"ssh_port": 22}]}}}"#;
        let cfg = Config::from_json(json.as_bytes()).unwrap();
        assert_eq!(cfg.kubeone_hosts.value.control_plane[0].ssh_port, Some(22));
    }

    #[test]
    fn test_kf002_bad_port_is_parse_error() {
        let json = r#"{"kubeone_hosts": {"value": {"control_plane": [{"ssh_port": "ssh"}]}}}"#;
        assert!(Config::from_json(json.as_bytes()).is_err());
    }

    #[test]
    fn test_kf002_apply_sets_fields() {
        let cfg = Config::from_json(OUTPUT.as_bytes()).unwrap();
        let mut m = Manifest::default();
        cfg.apply(&mut m);

        assert_eq!(m.name, "prod");
        assert_eq!(m.apiserver.address, "lb.example.com");
        assert_eq!(m.hosts.len(), 2);
        assert_eq!(m.hosts[0].private_address, "10.0.0.10");
        // missing private address falls back to the public one
        assert_eq!(m.hosts[1].private_address, "203.0.113.11");
        assert_eq!(m.hosts[1].hostname, "cp-1");
        assert_eq!(m.hosts[1].id, 1);
        assert_eq!(m.hosts[0].ssh_port, 2222);
        assert_eq!(m.hosts[0].ssh_username, "ubuntu");
        assert_eq!(m.workers.len(), 1);
        assert_eq!(m.workers[0].spec["instanceType"], "t3.medium");
    }

    #[test]
    fn test_kf002_apply_keeps_manifest_values_when_output_empty() {
        let mut m = Manifest {
            name: "keep".to_string(),
            ..Manifest::default()
        };
        m.apiserver.address = "10.1.1.1".to_string();
        let before = m.clone();
        Config::default().apply(&mut m);
        assert_eq!(m, before);
    }

    #[test]
    fn test_kf002_apply_replaces_worker_by_name() {
        let mut m = Manifest::default();
        m.workers.push(WorkerConfig {
            name: "pool-a".to_string(),
            replicas: 1,
            spec: serde_json::Value::Null,
        });
        m.workers.push(WorkerConfig {
            name: "pool-b".to_string(),
            replicas: 5,
            spec: serde_json::Value::Null,
        });
        let cfg = Config::from_json(OUTPUT.as_bytes()).unwrap();
        cfg.apply(&mut m);
        assert_eq!(m.workers.len(), 2);
        assert_eq!(m.workers[0].name, "pool-a");
        assert_eq!(m.workers[0].replicas, 3);
        assert_eq!(m.workers[1].replicas, 5);
    }

    #[test]
    fn test_kf002_default_ssh_user_kept() {
        let json = r#"{"kubeone_hosts": {"value": {"control_plane": [{"public_address": ["1.1.1.1"]}]}}}"#;
        let cfg = Config::from_json(json.as_bytes()).unwrap();
        let mut m = Manifest::default();
        cfg.apply(&mut m);
        assert_eq!(m.hosts[0].ssh_username, "root");
        assert_eq!(m.hosts[0].ssh_port, 22);
    }

    fn arb_config() -> impl Strategy<Value = Config> {
        (
            "[a-z.]{0,12}",
            "[a-z-]{0,8}",
            prop::collection::vec("[0-9.]{1,15}", 0..4),
            prop::collection::vec("[0-9.]{0,15}", 0..4),
            prop::collection::vec(("[a-c]", 0i64..10), 0..4),
        )
            .prop_map(|(endpoint, cluster_name, public, private, pools)| {
                let mut workers = IndexMap::new();
                for (name, replicas) in pools {
                    workers.insert(
                        name,
                        WorkerOutput {
                            replicas,
                            spec: serde_json::Value::Null,
                        },
                    );
                }
                Config {
                    kubeone_api: Output {
                        value: ApiOutput { endpoint },
                    },
                    kubeone_hosts: Output {
                        value: HostsOutput {
                            control_plane: vec![ControlPlane {
                                cluster_name,
                                public_address: public,
                                private_address: private,
                                ..ControlPlane::default()
                            }],
                        },
                    },
                    kubeone_workers: Output { value: workers },
                }
            })
    }

    proptest! {
        #[test]
        fn prop_kf002_apply_is_idempotent(cfg in arb_config(), name in "[a-z]{0,6}") {
            let mut base = Manifest { name, ..Manifest::default() };
            base.workers.push(WorkerConfig {
                name: "b".to_string(),
                replicas: 7,
                spec: serde_json::Value::Null,
            });

            let mut once = base.clone();
            cfg.apply(&mut once);
            let mut twice = base;
            cfg.apply(&mut twice);
            cfg.apply(&mut twice);
            prop_assert_eq!(once, twice);
        }
    }
}
