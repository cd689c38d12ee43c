//! Configuration store (JSON file > env fallback > defaults).
//!
//! The store is the single owner of the process-wide chat configuration.
//! Readers take copies with [`ConfigStore::get`]; writers go through
//! [`ConfigStore::update`], which persists the file and notifies every
//! [`ConfigStore::subscribe`] receiver so agent graphs can be rebuilt.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::Display;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{ParleyError, Result};

/// File name used inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "llm-config.json";

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL_ID: &str = "qwen/qwen-2.5-3b-instruct";

const MASK: &str = "******";

/// Required configuration fields, named as they appear in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ConfigField {
    #[strum(serialize = "apiKey")]
    ApiKey,
    #[strum(serialize = "baseURL")]
    BaseUrl,
    #[strum(serialize = "modelId")]
    ModelId,
}

/// Settings for the web search tools.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchToolConfig {
    #[serde(rename = "TAVILY_API_KEY", default)]
    pub tavily_api_key: String,
}

/// Chat configuration as stored on disk.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(rename = "apiKey", default)]
    pub api_key: String,
    #[serde(rename = "baseURL", default)]
    pub base_url: String,
    #[serde(rename = "modelId", default)]
    pub model_id: String,
    #[serde(default)]
    pub search_tool: SearchToolConfig,
}

impl ChatConfig {
    /// Built-in defaults used when no file exists. Keys are left empty.
    pub fn defaults() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            search_tool: SearchToolConfig::default(),
        }
    }

    /// Fill every empty field of `self` from `base`.
    pub fn merged_over(mut self, base: &ChatConfig) -> Self {
        fill_if_blank(&mut self.api_key, &base.api_key);
        fill_if_blank(&mut self.base_url, &base.base_url);
        fill_if_blank(&mut self.model_id, &base.model_id);
        fill_if_blank(
            &mut self.search_tool.tavily_api_key,
            &base.search_tool.tavily_api_key,
        );
        self
    }

    /// Copy with secrets replaced, for display and for model-facing tools.
    pub fn masked(&self) -> Self {
        let mut copy = self.clone();
        if !copy.api_key.is_empty() {
            copy.api_key = MASK.to_string();
        }
        if !copy.search_tool.tavily_api_key.is_empty() {
            copy.search_tool.tavily_api_key = MASK.to_string();
        }
        copy
    }

    /// The Tavily key, if one is set.
    pub fn tavily_api_key(&self) -> Option<&str> {
        let key = self.search_tool.tavily_api_key.trim();
        (!key.is_empty()).then_some(key)
    }
}

impl fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatConfig")
            .field("base_url", &self.base_url)
            .field("model_id", &self.model_id)
            .field("has_api_key", &!self.api_key.trim().is_empty())
            .field("has_tavily_key", &self.tavily_api_key().is_some())
            .finish()
    }
}

impl fmt::Debug for SearchToolConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchToolConfig")
            .field("has_tavily_key", &!self.tavily_api_key.trim().is_empty())
            .finish()
    }
}

fn fill_if_blank(target: &mut String, fallback: &str) {
    if target.trim().is_empty() && !fallback.trim().is_empty() {
        *target = fallback.to_string();
    }
}

/// Check that every required field is present.
///
/// Pure: reports each empty field in file order (apiKey, baseURL, modelId).
pub fn validate(config: &ChatConfig) -> Result<()> {
    let missing: Vec<ConfigField> = [
        (ConfigField::ApiKey, &config.api_key),
        (ConfigField::BaseUrl, &config.base_url),
        (ConfigField::ModelId, &config.model_id),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(field, _)| field)
    .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ParleyError::ConfigIncomplete { missing })
    }
}

/// Partial update; empty or absent fields are left untouched.
#[derive(Debug, Clone, Default, Builder)]
pub struct ConfigUpdate {
    #[builder(into)]
    pub api_key: Option<String>,
    #[builder(into)]
    pub base_url: Option<String>,
    #[builder(into)]
    pub model_id: Option<String>,
    #[builder(into)]
    pub tavily_api_key: Option<String>,
}

impl ConfigUpdate {
    /// Update that only switches the model.
    pub fn model(model_id: impl Into<String>) -> Self {
        Self {
            model_id: Some(model_id.into()),
            ..Self::default()
        }
    }

    fn apply_to(&self, config: &mut ChatConfig) {
        fn set(target: &mut String, value: &Option<String>) {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                *target = v.to_string();
            }
        }
        set(&mut config.api_key, &self.api_key);
        set(&mut config.base_url, &self.base_url);
        set(&mut config.model_id, &self.model_id);
        set(&mut config.search_tool.tavily_api_key, &self.tavily_api_key);
    }
}

/// Outcome of a successful [`ConfigStore::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    /// Whether the config file was written.
    pub persisted: bool,
    /// Soft warning when the file could not be written; the update still applies.
    pub warning: Option<String>,
}

/// Process-wide configuration store.
///
/// Keeps the file layer apart from the environment layer: the environment
/// fills gaps in memory but is never written back to the file.
pub struct ConfigStore {
    path: Option<PathBuf>,
    env: ChatConfig,
    defaults: ChatConfig,
    /// File layer; the lock also serializes updates.
    saved: Mutex<ChatConfig>,
    state: watch::Sender<ChatConfig>,
}

impl fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("path", &self.path)
            .field("config", &*self.state.borrow())
            .finish()
    }
}

impl ConfigStore {
    /// Open a store backed by `path`, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::open_layered(path.into(), None)
    }

    /// Like [`open`](Self::open), with environment variables (`.env`
    /// honoured) filling fields the file leaves empty, ahead of defaults.
    pub fn open_with_env(path: impl Into<PathBuf>) -> Self {
        Self::open_layered(path.into(), Some(env_config()))
    }

    fn open_layered(path: PathBuf, env: Option<ChatConfig>) -> Self {
        let saved = Self::load(&path).unwrap_or_else(|| {
            warn!(path = %path.display(), "No saved configuration, using defaults");
            ChatConfig::default()
        });
        Self::with_layers(Some(path), saved, env.unwrap_or_default(), ChatConfig::defaults())
    }

    /// Open the store at the platform default location, with env fallback.
    pub fn open_default() -> Self {
        Self::open_with_env(Self::default_path())
    }

    /// A store that never touches the filesystem. `config` is used as is.
    pub fn in_memory(config: ChatConfig) -> Self {
        Self::with_layers(None, config, ChatConfig::default(), ChatConfig::default())
    }

    fn with_layers(
        path: Option<PathBuf>,
        saved: ChatConfig,
        env: ChatConfig,
        defaults: ChatConfig,
    ) -> Self {
        let (state, _) = watch::channel(saved.clone().merged_over(&env).merged_over(&defaults));
        Self {
            path,
            env,
            defaults,
            saved: Mutex::new(saved),
            state,
        }
    }

    /// File layer, then environment, then defaults.
    fn effective(&self, saved: &ChatConfig) -> ChatConfig {
        saved
            .clone()
            .merged_over(&self.env)
            .merged_over(&self.defaults)
    }

    /// What gets written to the file: the file layer over defaults. Fields
    /// the environment supplies stay blank so the environment keeps
    /// applying on the next start.
    fn file_view(&self, saved: &ChatConfig) -> ChatConfig {
        let mut defaults = self.defaults.clone();
        if !self.env.base_url.trim().is_empty() {
            defaults.base_url.clear();
        }
        if !self.env.model_id.trim().is_empty() {
            defaults.model_id.clear();
        }
        saved.clone().merged_over(&defaults)
    }

    /// Platform-appropriate writable location of the config file.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("", "", "parley")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(".parley").join(CONFIG_FILE_NAME))
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read and parse a config file. Never fails: problems are logged and
    /// reported as `None`.
    pub fn load(path: &Path) -> Option<ChatConfig> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Config file does not exist");
                return None;
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Failed to read config file");
                return None;
            }
        };
        match serde_json::from_str::<ChatConfig>(&raw) {
            Ok(config) => {
                info!(
                    path = %path.display(),
                    base_url = %config.base_url,
                    model_id = %config.model_id,
                    has_api_key = !config.api_key.is_empty(),
                    "Loaded saved configuration"
                );
                Some(config)
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Config file is corrupt, ignoring it");
                None
            }
        }
    }

    /// Current configuration.
    pub fn get(&self) -> ChatConfig {
        self.state.borrow().clone()
    }

    /// Current configuration with secrets masked.
    pub fn masked(&self) -> ChatConfig {
        self.state.borrow().masked()
    }

    /// Validate the current configuration.
    pub fn validate_current(&self) -> Result<()> {
        validate(&self.state.borrow())
    }

    /// Receive the configuration every time it changes.
    pub fn subscribe(&self) -> watch::Receiver<ChatConfig> {
        self.state.subscribe()
    }

    /// Merge `update` into the current config, persist it, and notify
    /// subscribers.
    ///
    /// The merged config is applied in memory even when the file cannot be
    /// written (see [`UpdateReport::warning`]) and even when it is
    /// incomplete, in which case `ConfigIncomplete` is returned.
    ///
    /// Concurrent updates are applied one at a time, each on top of the
    /// previous one.
    pub fn update(&self, update: ConfigUpdate) -> Result<UpdateReport> {
        let mut saved = self.saved.lock().unwrap_or_else(PoisonError::into_inner);
        update.apply_to(&mut saved);
        let next = self.effective(&saved);

        let report = match &self.path {
            Some(path) => match persist(path, &self.file_view(&saved)) {
                Ok(()) => {
                    info!(path = %path.display(), model_id = %next.model_id, "Configuration saved");
                    UpdateReport {
                        persisted: true,
                        warning: None,
                    }
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Failed to save configuration; applying to this session only");
                    UpdateReport {
                        persisted: false,
                        warning: Some(format!(
                            "configuration applied but not saved to {}: {err}",
                            path.display()
                        )),
                    }
                }
            },
            None => UpdateReport {
                persisted: false,
                warning: None,
            },
        };

        let changed = self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next.clone();
                true
            }
        });
        drop(saved);
        debug!(changed, "Configuration updated");

        validate(&next)?;
        Ok(report)
    }
}

fn persist(path: &Path, config: &ChatConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let serialized = serde_json::to_string_pretty(config)?;
    fs::write(path, serialized)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(err) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
            warn!(path = %path.display(), error = %err, "Could not restrict config file permissions");
        }
    }
    Ok(())
}

fn env_config() -> ChatConfig {
    let _ = dotenvy::dotenv();
    let first = |names: &[&str]| {
        names
            .iter()
            .find_map(|name| std::env::var(name).ok().filter(|v| !v.trim().is_empty()))
            .unwrap_or_default()
    };
    ChatConfig {
        api_key: first(&["PARLEY_API_KEY", "OPENAI_API_KEY"]),
        base_url: first(&["PARLEY_BASE_URL", "OPENAI_BASE_URL"]),
        model_id: first(&["PARLEY_MODEL_ID"]),
        search_tool: SearchToolConfig {
            tavily_api_key: first(&["TAVILY_API_KEY"]),
        },
    }
}
