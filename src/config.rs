use anyhow::{bail, Context, Result};
use globset::Glob;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub index: IndexConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RepositoryConfig {
    /// Revision that history and blame are computed against.
    #[serde(default = "default_reference")]
    pub reference: String,
    /// Empty means every tracked path.
    #[serde(default)]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    /// Keep only the newest N commits in each file's history. A capped
    /// history is shorter than the full list of commits touching the path,
    /// and blame lines may name commits older than the cap. Unset keeps the
    /// full history.
    #[serde(default)]
    pub max_history: Option<usize>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            reference: default_reference(),
            include_globs: Vec::new(),
            exclude_globs: Vec::new(),
            max_history: None,
        }
    }
}

fn default_reference() -> String {
    "HEAD".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_index_url")]
    pub url: String,
    #[serde(default = "default_index_name")]
    pub name: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            url: default_index_url(),
            name: default_index_name(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_index_url() -> String {
    "http://localhost:9200".to_string()
}
fn default_index_name() -> String {
    "git-metadata".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.repository.reference.trim().is_empty() {
            bail!("repository.reference must not be empty");
        }
        if self.repository.max_history == Some(0) {
            bail!("repository.max_history must be > 0 when set");
        }
        for pattern in self
            .repository
            .include_globs
            .iter()
            .chain(&self.repository.exclude_globs)
        {
            Glob::new(pattern).with_context(|| format!("Invalid glob pattern: '{}'", pattern))?;
        }

        if self.index.name.trim().is_empty() {
            bail!("index.name must not be empty");
        }
        if self.index.timeout_secs == 0 {
            bail!("index.timeout_secs must be > 0");
        }
        let url = reqwest::Url::parse(&self.index.url)
            .with_context(|| format!("index.url is not a valid URL: '{}'", self.index.url))?;
        match url.scheme() {
            "http" | "https" => {}
            other => bail!("index.url must use http or https, got '{}'", other),
        }

        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}
