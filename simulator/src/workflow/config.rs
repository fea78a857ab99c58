use crate::generator::profile::GeneratorConfig;
use anyhow::Context;
use roadlenscore::feed::{AppMetadata, PersonInfo};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub bind: SocketAddr,
    /// Pause between generated events.
    pub interval_ms: u64,
    pub generator: GeneratorConfig,
    /// Lookout lists served before any client edits them.
    pub lookout: AppMetadata,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
            interval_ms: 750,
            generator: GeneratorConfig::default(),
            lookout: AppMetadata {
                lookout_vehicles: vec!["BA 2 PA 4455".into()],
                lookout_persons: vec!["SITA.JPG".into()],
                person_infos: vec![PersonInfo {
                    name: "Sita Sharma".into(),
                    img_name: "SITA.JPG".into(),
                }],
            },
        }
    }
}

impl SimulatorConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading simulator config {}", path_ref.display()))?;
        let config: SimulatorConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing simulator config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Command-line values win over the file.
    pub fn with_overrides(
        mut self,
        bind: Option<SocketAddr>,
        interval_ms: Option<u64>,
        seed: Option<u64>,
    ) -> Self {
        if let Some(bind) = bind {
            self.bind = bind;
        }
        if let Some(interval_ms) = interval_ms {
            self.interval_ms = interval_ms;
        }
        if let Some(seed) = seed {
            self.generator.seed = seed;
        }
        self
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadlenscore::Category;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"bind: 0.0.0.0:9100\ninterval_ms: 200\ngenerator:\n  seed: 5\n  categories: [pothole, wrongWay]\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = SimulatorConfig::load(&path).unwrap();
        assert_eq!(cfg.bind.port(), 9100);
        assert_eq!(cfg.generator.seed, 5);
        assert_eq!(
            cfg.generator.categories,
            vec![Category::Pothole, Category::WrongWay]
        );
        assert_eq!(cfg.lookout, SimulatorConfig::default().lookout);
    }

    #[test]
    fn overrides_replace_file_values() {
        let cfg = SimulatorConfig::default().with_overrides(None, Some(0), Some(9));
        assert_eq!(cfg.interval(), Duration::from_millis(1));
        assert_eq!(cfg.generator.seed, 9);
        assert_eq!(cfg.bind.port(), 8000);
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = SimulatorConfig::load("/nonexistent/simulator.yaml").unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/simulator.yaml"));
    }
}
