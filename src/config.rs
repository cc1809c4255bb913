//! Configuration file handling

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// A cluster to track, identified by a user-chosen name
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ClusterSettings {
    pub name: String,
    pub kubeconfig: PathBuf,
}

/// Runtime settings, loaded from TOML and overridden from the command line
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub clusters: Vec<ClusterSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            clusters: Vec::new(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn add_cluster(&mut self, name: impl Into<String>, kubeconfig: impl Into<PathBuf>) {
        self.clusters.push(ClusterSettings {
            name: name.into(),
            kubeconfig: kubeconfig.into(),
        });
    }

    /// Check the settings describe something that can run
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            bail!("poll interval must be at least one second");
        }
        if self.request_timeout_secs == 0 {
            bail!("request timeout must be at least one second");
        }
        if self.clusters.is_empty() {
            bail!("no clusters configured, pass --kubeconfig or list clusters in --config");
        }

        let mut seen = HashSet::new();
        for cluster in &self.clusters {
            let name = cluster.name.trim();
            if name.is_empty() {
                bail!("cluster for {} has an empty name", cluster.kubeconfig.display());
            }
            if !seen.insert(name) {
                bail!("cluster name '{}' is used more than once", name);
            }
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.poll_interval(), Duration::from_secs(30));
        assert_eq!(settings.request_timeout(), Duration::from_secs(10));
        assert!(settings.clusters.is_empty());
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
poll_interval_secs = 60

[[clusters]]
name = "home"
kubeconfig = "/config/kubeconfig_home.yaml"

[[clusters]]
name = "lab"
kubeconfig = "/config/kubeconfig_lab.yaml"
"#
        )
        .unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.poll_interval_secs, 60);
        assert_eq!(settings.request_timeout_secs, 10);
        assert_eq!(settings.clusters.len(), 2);
        assert_eq!(
            settings.clusters[1],
            ClusterSettings {
                name: "lab".to_string(),
                kubeconfig: PathBuf::from("/config/kubeconfig_lab.yaml"),
            }
        );
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "poll_interval_secs = \"soon\"").unwrap();
        assert!(Settings::load(file.path()).is_err());
    }

    #[test]
    fn test_validate_requires_clusters() {
        let settings = Settings::default();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_names() {
        let mut settings = Settings::default();
        settings.add_cluster("home", "/a.yaml");
        settings.add_cluster(" home ", "/b.yaml");
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("'home'"));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut settings = Settings::default();
        settings.add_cluster("home", "/a.yaml");
        settings.poll_interval_secs = 0;
        assert!(settings.validate().is_err());
    }
}
