//! Plugin configuration: model, endpoint and prompt settings.
//!
//! User-level config: `~/.gptcomplete/config.yaml`
//! Project-level config: `.gptcomplete/config.yaml` (overrides the user file, safe to commit)
//!
//! Resolution: defaults → user file → project file → env vars → CLI flags.
//! Secrets never live here; see [`crate::keystore`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const MODEL_ENV: &str = "GPTCOMPLETE_MODEL";
pub const BASE_URL_ENV: &str = "GPTCOMPLETE_BASE_URL";

/// Effective configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub model: String,
    pub base_url: String,
    /// Language named in prompts.
    pub language: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// Credential group the API key is stored under.
    pub key_group: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".into(),
            base_url: "https://api.openai.com".into(),
            language: "swift".into(),
            max_tokens: 1024,
            timeout_secs: 60,
            key_group: "com.mcmurryapps.GPTComplete".into(),
        }
    }
}

/// One config file; every field optional so files can override selectively.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    key_group: Option<String>,
}

/// Path to `~/.gptcomplete/`.
pub fn dirs_path() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE")
            .ok()
            .map(|p| PathBuf::from(p).join(".gptcomplete"))
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME")
            .ok()
            .map(|p| PathBuf::from(p).join(".gptcomplete"))
    }
}

impl Config {
    /// Load from the user and project files, then apply env overrides.
    pub fn load() -> Self {
        let user = dirs_path().map(|p| p.join("config.yaml"));
        let project = PathBuf::from(".gptcomplete/config.yaml");
        let mut config = Self::load_from(user.as_deref(), Some(&project));
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Layer the given files over the defaults, later files winning.
    /// Missing files are skipped; unreadable ones are logged and skipped.
    pub fn load_from(user: Option<&Path>, project: Option<&Path>) -> Self {
        let mut config = Self::default();
        for path in [user, project].into_iter().flatten() {
            if let Some(file) = read_config_file(path) {
                config.merge(file);
            }
        }
        config
    }

    fn merge(&mut self, file: ConfigFile) {
        if let Some(model) = file.model {
            self.model = model;
        }
        if let Some(base_url) = file.base_url {
            self.base_url = base_url;
        }
        if let Some(language) = file.language {
            self.language = language;
        }
        if let Some(max_tokens) = file.max_tokens {
            self.max_tokens = max_tokens;
        }
        if let Some(timeout_secs) = file.timeout_secs {
            self.timeout_secs = timeout_secs;
        }
        if let Some(key_group) = file.key_group {
            self.key_group = key_group;
        }
    }

    /// Apply `GPTCOMPLETE_*` overrides through `lookup` (normally `std::env::var`).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(model) = lookup(MODEL_ENV).filter(|v| !v.is_empty()) {
            self.model = model;
        }
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|v| !v.is_empty()) {
            self.base_url = base_url;
        }
    }

    /// Save to `~/.gptcomplete/config.yaml`.
    pub fn save(&self) -> Result<PathBuf, String> {
        let Some(dir) = dirs_path() else {
            return Err("Cannot determine home directory".into());
        };
        let path = dir.join("config.yaml");
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| format!("Failed to create {}: {e}", dir.display()))?;
        }
        let yaml = serde_yaml::to_string(self).map_err(|e| format!("YAML serialize error: {e}"))?;
        std::fs::write(path, yaml).map_err(|e| format!("Failed to write {}: {e}", path.display()))
    }
}

fn read_config_file(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match serde_yaml::from_str(&content) {
        Ok(file) => Some(file),
        Err(e) => {
            warn!("ignoring malformed config {}: {e}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.model, "gpt-3.5-turbo");
        assert_eq!(config.language, "swift");
        assert_eq!(config.max_tokens, 1024);
    }

    #[test]
    fn project_file_overrides_user_file() {
        let dir = TempDir::new().unwrap();
        let user = dir.path().join("user.yaml");
        let project = dir.path().join("project.yaml");
        std::fs::write(&user, "model: gpt-4o\nlanguage: rust\ntimeout_secs: 10\n").unwrap();
        std::fs::write(&project, "language: swift\n").unwrap();

        let config = Config::load_from(Some(&user), Some(&project));
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.language, "swift");
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.base_url, "https://api.openai.com");
    }

    #[test]
    fn missing_and_malformed_files_fall_back() {
        let dir = TempDir::new().unwrap();
        let bad = dir.path().join("bad.yaml");
        std::fs::write(&bad, "max_tokens: [not, a, number]\n").unwrap();
        let missing = dir.path().join("missing.yaml");

        let config = Config::load_from(Some(&missing), Some(&bad));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn env_overrides() {
        let mut config = Config::default();
        config.apply_env(|key| match key {
            MODEL_ENV => Some("local-model".into()),
            BASE_URL_ENV => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.model, "local-model");
        // empty values are ignored
        assert_eq!(config.base_url, "https://api.openai.com");
    }

    #[test]
    fn save_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let config = Config {
            model: "gpt-4o-mini".into(),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(Some(&path), None);
        assert_eq!(loaded, config);
    }
}
