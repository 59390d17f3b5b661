//! Credential store for the API key and organization, persisted per group.
//!
//! Each group is one YAML map at `~/.gptcomplete/keys/<group>.yaml`, written
//! atomically and readable only by the owner on Unix.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

pub const API_KEY: &str = "apiKey";
pub const ORGANIZATION_KEY: &str = "organizationKey";

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const ORGANIZATION_ENV: &str = "OPENAI_ORGANIZATION";

#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("key file {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("cannot determine home directory")]
    NoHomeDir,
}

pub type KeyStoreResult<T> = Result<T, KeyStoreError>;

/// String values stored by key, persisted outside the process.
pub trait KeyStore {
    fn get(&self, key: &str) -> KeyStoreResult<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> KeyStoreResult<()>;
}

/// YAML-file backed store for one group.
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    path: PathBuf,
}

impl FileKeyStore {
    /// Store for `group` under the user's home directory.
    pub fn for_group(group: &str) -> KeyStoreResult<Self> {
        let dir = crate::config::dirs_path().ok_or(KeyStoreError::NoHomeDir)?;
        Ok(Self::at(dir.join("keys").join(format!("{}.yaml", file_stem(group)))))
    }

    /// Store backed by an explicit file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> KeyStoreResult<BTreeMap<String, String>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_yaml::from_str(&content).map_err(|source| KeyStoreError::Serialize {
            path: self.path.clone(),
            source,
        })
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> KeyStoreResult<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;
        let yaml = serde_yaml::to_string(values).map_err(|source| KeyStoreError::Serialize {
            path: self.path.clone(),
            source,
        })?;

        // NamedTempFile is created 0600 on Unix, and persist() keeps the mode.
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(yaml.as_bytes())?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl KeyStore for FileKeyStore {
    fn get(&self, key: &str) -> KeyStoreResult<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> KeyStoreResult<()> {
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values)?;
        debug!(key, path = %self.path.display(), "stored credential");
        Ok(())
    }
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyStore {
    values: BTreeMap<String, String>,
}

impl KeyStore for MemoryKeyStore {
    fn get(&self, key: &str) -> KeyStoreResult<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> KeyStoreResult<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Credentials for the completion API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub organization: Option<String>,
}

impl Credentials {
    /// Read from the store, falling back to `lookup` (normally the
    /// environment) for values the store doesn't have. Empty strings count
    /// as absent.
    pub fn load<S>(store: &S, lookup: impl Fn(&str) -> Option<String>) -> KeyStoreResult<Self>
    where
        S: KeyStore + ?Sized,
    {
        let pick = |key: &str, env: &str| -> KeyStoreResult<Option<String>> {
            let stored = store.get(key)?.filter(|v| !v.is_empty());
            Ok(stored.or_else(|| lookup(env).filter(|v| !v.is_empty())))
        };
        Ok(Self {
            api_key: pick(API_KEY, API_KEY_ENV)?,
            organization: pick(ORGANIZATION_KEY, ORGANIZATION_ENV)?,
        })
    }

    /// API key with all but the last four characters hidden.
    pub fn masked_api_key(&self) -> Option<String> {
        self.api_key.as_deref().map(mask)
    }
}

fn mask(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 8 {
        return "*".repeat(count);
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("{}{tail}", "*".repeat(count - 4))
}

/// Group identifiers become file names; keep them to a safe alphabet.
fn file_stem(group: &str) -> String {
    group
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
