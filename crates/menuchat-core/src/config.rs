use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use tracing::debug;

use crate::model::ChatModel;

pub const API_KEY_PREF: &str = "OpenAI_API_Key";
pub const MODEL_PREF: &str = "ChatGPT_Model";

/// Environment variable that takes precedence over the stored API key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Named string values that outlive the process
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;

    /// Persists immediately
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

impl<S: PreferenceStore + ?Sized> PreferenceStore for Box<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Flat JSON object on disk, rewritten on every `set`
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            return Ok(Self::empty(path));
        }

        let content = fs::read_to_string(&path)?;
        let values: BTreeMap<String, String> = serde_json::from_str(&content)?;
        Ok(Self { path, values })
    }

    /// Store at `path` that starts with no values, ignoring any existing file
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("menuchat").join("preferences.json"))
    }

    fn save(&self) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, content)?;
        debug!(path = %self.path.display(), "preferences saved");
        Ok(())
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.save()
    }
}

/// Typed access to the API key and model choice
#[derive(Debug, Clone)]
pub struct Preferences<S: PreferenceStore> {
    store: S,
}

impl<S: PreferenceStore> Preferences<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Stored key, or an empty string when none has been saved
    pub fn api_key(&self) -> String {
        self.store.get(API_KEY_PREF).unwrap_or_default()
    }

    pub fn set_api_key(&mut self, api_key: &str) -> Result<()> {
        self.store.set(API_KEY_PREF, api_key)
    }

    /// Selected model; an unknown stored identifier reads as the default
    pub fn model(&self) -> ChatModel {
        self.store
            .get(MODEL_PREF)
            .and_then(|raw| ChatModel::from_str(&raw))
            .unwrap_or_default()
    }

    pub fn set_model(&mut self, model: ChatModel) -> Result<()> {
        self.store.set(MODEL_PREF, model.as_str())
    }
}

/// Non-empty `OPENAI_API_KEY`, if set
pub fn env_api_key() -> Option<String> {
    std::env::var(API_KEY_ENV).ok().filter(|key| !key.is_empty())
}

/// API key the front-end should use: a non-empty `OPENAI_API_KEY` wins over the stored one
pub fn resolve_api_key<S: PreferenceStore>(prefs: &Preferences<S>) -> String {
    choose_api_key(env_api_key(), prefs.api_key())
}

fn choose_api_key(env_key: Option<String>, stored: String) -> String {
    env_key.filter(|key| !key.is_empty()).unwrap_or(stored)
}
