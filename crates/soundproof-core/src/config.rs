//! Layered configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (nested keys separated by `__`, e.g. `APP_SEARCH__TOP_K=3`). Provides helpers
//! to expand `~` and `${VAR}` and to resolve relative paths against a known
//! base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::corpus::FieldMapping;
use crate::error::{Error, Result};

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_SNIPPET_CHARS: usize = 200;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub corpus: CorpusSettings,
    pub search: SearchSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusSettings {
    pub path: String,
    /// Fallback directory for a relative `path` missing from the working
    /// directory. Unset means the directory holding the running executable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<String>,
    pub id_field: String,
    pub text_field: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub top_k: usize,
    pub snippet_chars: usize,
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self {
            path: "data/solutions.json".to_string(),
            base_dir: None,
            id_field: "id".to_string(),
            text_field: "faiblesses".to_string(),
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { top_k: DEFAULT_TOP_K, snippet_chars: DEFAULT_SNIPPET_CHARS }
    }
}

impl CorpusSettings {
    pub fn mapping(&self) -> FieldMapping {
        FieldMapping { id_field: self.id_field.clone(), text_field: self.text_field.clone() }
    }

    /// Expanded corpus path plus the expanded fallback base directory.
    pub fn resolved_paths(&self) -> (PathBuf, PathBuf) {
        let base = match &self.base_dir {
            Some(dir) => expand_path(dir),
            None => executable_dir(),
        };
        (expand_path(&self.path), base)
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.search.top_k == 0 {
            return Err(Error::InvalidConfig("search.top_k must be at least 1".to_string()));
        }
        if self.corpus.id_field.trim().is_empty() {
            return Err(Error::InvalidConfig("corpus.id_field must not be empty".to_string()));
        }
        if self.corpus.text_field.trim().is_empty() {
            return Err(Error::InvalidConfig("corpus.text_field must not be empty".to_string()));
        }
        Ok(())
    }
}

pub struct Config {
    figment: Figment,
    env_name: String,
}

impl Config {
    /// Loads configuration files from the current working directory.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    pub fn load_from(dir: &Path) -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(dir, &env_name)
    }

    pub fn load_for_env(dir: &Path, env_name: &str) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(dir.join("config.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            other => tracing::warn!(env = other, "unknown RUST_ENV, using base configuration only"),
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment, env_name: env_name.to_string() };
        config.settings()?;
        Ok(config)
    }

    pub fn env_name(&self) -> &str {
        &self.env_name
    }

    /// Extracts and validates the typed settings.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self.figment.extract()?;
        settings.validate()?;
        Ok(settings)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Directory of the running executable, or `.` when it cannot be determined.
pub fn executable_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
