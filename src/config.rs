use crate::session::{BuildOptions, SuperClassPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct CpgConfig {
    /// Phase-1 worker threads; all cores when unset
    pub workers: Option<usize>,
    pub superclass_policy: SuperClassPolicy,
    /// Node capacity of each unit's graph
    pub max_nodes: Option<usize>,
    /// Gitignore-style patterns skipped during discovery
    pub exclude: Vec<String>,
}

impl CpgConfig {
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            super_class_policy: self.superclass_policy,
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("cpg.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<CpgConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: CpgConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &CpgConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(load_config(Some(&dir.path().join("cpg.toml"))).unwrap().is_none());
    }

    #[test]
    fn test_load_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cpg.toml");
        std::fs::write(
            &path,
            "workers = 4\nsuperclass_policy = \"ignore\"\nexclude = [\"*_test.go\"]\n",
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(config.workers, Some(4));
        assert_eq!(config.max_nodes, None);
        assert_eq!(config.exclude, vec!["*_test.go".to_string()]);
        assert_eq!(config.build_options().super_class_policy, SuperClassPolicy::Ignore);
    }

    #[test]
    fn test_write_config_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cpg.toml");
        let config = CpgConfig {
            max_nodes: Some(10_000),
            ..CpgConfig::default()
        };

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();
        assert_eq!(load_config(Some(&path)).unwrap(), Some(config));
    }
}
