use anyhow::Context;
use roadlenscore::SyncConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub sync: SyncConfig,
    /// Timeout for lookout calls; zero disables it.
    pub request_timeout_ms: u64,
}

impl DashboardConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading dashboard config {}", path_ref.display()))?;
        let config: DashboardConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing dashboard config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Flag or environment values win over the file.
    pub fn with_overrides(mut self, server_domain: Option<String>, secure: bool) -> Self {
        if let Some(domain) = server_domain {
            self.sync.server_domain = domain;
        }
        if secure {
            self.sync.secure = true;
        }
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"sync:\n  server_domain: 10.0.0.5:8000\n  retry_delay_ms: 250\nrequest_timeout_ms: 3000\n")
            .unwrap();
        let path = temp.into_temp_path();
        let cfg = DashboardConfig::load(&path).unwrap();
        assert_eq!(cfg.sync.server_domain, "10.0.0.5:8000");
        assert_eq!(cfg.sync.retry_delay(), Duration::from_millis(250));
        assert!(!cfg.sync.secure);
        assert_eq!(cfg.request_timeout(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn overrides_replace_domain_and_scheme() {
        let cfg = DashboardConfig::default().with_overrides(Some("roadlens.example:443".into()), true);
        assert_eq!(cfg.sync.server_domain, "roadlens.example:443");
        assert!(cfg.sync.secure);
        assert_eq!(cfg.request_timeout(), None);
    }
}
